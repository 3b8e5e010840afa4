//! # Ingestion Flows
//!
//! Discovery → walk → parse queue → parser, over in-memory adapters.

#[cfg(test)]
mod tests {
    use crate::harness::EngineHarness;
    use shared_types::test_utils::{block_hash, make_block, make_chain, make_tx, tx_id};
    use shared_types::{Hash, OutPoint, ZERO_HASH};
    use tg_01_tx_store::{NewTrackedTransaction, TransactionStore};
    use tg_02_block_ingestion::{BlockIngestionApi, IngestionConfig, ParseOutcome, WalkStop};

    fn heights(harness: &EngineHarness) -> Vec<Hash> {
        harness.parse_log.iter().map(|(_, hash)| *hash).collect()
    }

    #[tokio::test]
    async fn test_backfill_parses_ancestors_first() {
        let mut harness = EngineHarness::for_testing();
        harness.publish_chain(&make_chain(5));
        harness.announce(block_hash(0, 0)).await;

        let outcome = harness.announce(block_hash(5, 0)).await;

        assert_eq!(outcome.stop, WalkStop::Connected);
        let expected: Vec<Hash> = (0..=5).map(|h| block_hash(h, 0)).collect();
        assert_eq!(heights(&harness), expected);
    }

    #[tokio::test]
    async fn test_duplicate_discovery_stores_each_block_once() {
        let mut harness = EngineHarness::for_testing();
        harness.publish_chain(&make_chain(3));

        let tip = block_hash(3, 0);
        let (a, b) = tokio::join!(
            harness.coordinator.ingest_block(tip),
            harness.coordinator.ingest_block(tip)
        );
        a.unwrap();
        b.unwrap();
        harness.coordinator.ingest_block(tip).await.unwrap();
        harness.pump().await;

        assert_eq!(harness.store.block_count(), 4);
        assert_eq!(harness.parse_log.len(), 4);
    }

    #[tokio::test]
    async fn test_deep_branch_walk_is_bounded() {
        let config = IngestionConfig {
            max_fork_depth: 5,
            ..IngestionConfig::for_testing()
        };
        let mut harness =
            EngineHarness::new(config, tg_03_double_spend::DoubleSpendConfig::for_testing());
        let main = make_chain(20);
        harness.publish_chain(&main);

        let mut prev = main[9].hash();
        for height in 10..=16 {
            let block = make_block(height, 1, prev, vec![]);
            prev = block.hash();
            harness.publish_chain(&[block]);
        }

        let outcome = harness.announce(block_hash(16, 1)).await;

        assert_eq!(
            outcome.stop,
            WalkStop::ForkTooDeep {
                height: 14,
                best_height: 20
            }
        );
        assert_eq!(harness.store.block_count(), 2);
        assert_eq!(heights(&harness), vec![block_hash(15, 1), block_hash(16, 1)]);
        assert!(harness.block(&block_hash(14, 1)).await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_recovers_block_after_node_outage() {
        let mut harness = EngineHarness::for_testing();
        harness.publish_chain(&make_chain(3));
        harness.coordinator.ingest_block(block_hash(3, 0)).await.unwrap();

        harness.gateway.make_unavailable(block_hash(2, 0));
        let outcomes = harness.pump().await;
        assert_eq!(outcomes.iter().filter(|o| o.is_err()).count(), 1);
        let stranded = harness.block(&block_hash(2, 0)).await.unwrap();
        assert!(!stranded.is_fully_parsed());

        harness.gateway.make_available(&block_hash(2, 0));
        let sweep = harness.run_sweep().await;

        assert_eq!(sweep.requeued, 1);
        assert!(harness.block(&block_hash(2, 0)).await.unwrap().is_fully_parsed());
    }

    #[tokio::test]
    async fn test_malformed_block_stays_queued_for_sweep() {
        let mut harness = EngineHarness::for_testing();
        harness.publish_chain(&make_chain(1));
        harness.gateway.make_malformed(block_hash(1, 0));

        harness.coordinator.ingest_block(block_hash(1, 0)).await.unwrap();
        let outcomes = harness.pump().await;

        assert!(matches!(outcomes.last(), Some(Ok(ParseOutcome::Malformed(_)))));
        let record = harness.block(&block_hash(1, 0)).await.unwrap();
        assert!(record.parsed_for_merkle_at.is_none());
        assert_eq!(harness.run_sweep().await.requeued, 1);
    }

    #[tokio::test]
    async fn test_merkle_proof_announced_once_per_block() {
        let mut harness = EngineHarness::for_testing();
        harness
            .store
            .insert_tracked_transaction(NewTrackedTransaction {
                txid: tx_id(1),
                merkle_proof_format: Some("tsc".to_string()),
                inputs: vec![OutPoint::new(tx_id(100), 0)],
                ..NewTrackedTransaction::default()
            })
            .await
            .unwrap();

        let genesis = make_block(0, 0, ZERO_HASH, vec![]);
        let main = make_block(1, 0, genesis.hash(), vec![make_tx(tx_id(1), vec![])]);
        let sibling = make_block(1, 1, genesis.hash(), vec![make_tx(tx_id(1), vec![])]);
        harness.publish_chain(&[genesis, main.clone(), sibling.clone()]);

        harness.announce(main.hash()).await;
        harness.announce(main.hash()).await;
        harness.run_sweep().await;
        let first = harness.merkle_notifications();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].block_hash, main.hash());

        harness.announce(sibling.hash()).await;
        let second = harness.merkle_notifications();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].block_hash, sibling.hash());
    }
}
