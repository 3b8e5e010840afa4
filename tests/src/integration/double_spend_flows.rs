//! # Double-Spend Flows
//!
//! Block scans, pool conflicts and evictions driven through the whole
//! ingestion pipeline.

#[cfg(test)]
mod tests {
    use crate::harness::EngineHarness;
    use shared_bus::{PoolConflictSignal, PoolEvictionSignal, RejectCode};
    use shared_types::test_utils::{block_hash, label_hash, make_block, make_chain, make_tx, tx_id};
    use shared_types::{BlockContent, Hash, OutPoint, ZERO_HASH};
    use tg_01_tx_store::TransactionStore;
    use tg_02_block_ingestion::IngestionConfig;
    use tg_03_double_spend::{DoubleSpendApi, DoubleSpendConfig};

    fn outpoint() -> OutPoint {
        OutPoint::new(label_hash("shared-output"), 0)
    }

    fn conflict(rejected: Hash, colliding: Vec<Hash>) -> PoolConflictSignal {
        PoolConflictSignal {
            rejected_txid: rejected,
            reject_code: RejectCode::MempoolConflict,
            colliding_txids: colliding,
            raw_payload: Some(rejected[..4].to_vec()),
        }
    }

    /// Genesis, `main` at height 1 mining `tx_id(1)` and `fork` at height 1
    /// mining `tx_id(2)`, both spending `outpoint()`.
    fn split_at_one() -> (BlockContent, BlockContent, BlockContent) {
        let genesis = make_block(0, 0, ZERO_HASH, vec![]);
        let main = make_block(1, 0, genesis.hash(), vec![make_tx(tx_id(1), vec![outpoint()])]);
        let fork = make_block(1, 1, genesis.hash(), vec![make_tx(tx_id(2), vec![outpoint()])]);
        (genesis, main, fork)
    }

    #[tokio::test]
    async fn test_competing_branch_reports_conflict_once() {
        let mut harness =
            EngineHarness::new(IngestionConfig::default(), DoubleSpendConfig::for_testing());
        let chain = make_chain(9);
        let tip = chain[9].hash();
        let b1 = make_block(10, 0, tip, vec![make_tx(tx_id(1), vec![outpoint()])]);
        let b2 = make_block(10, 1, tip, vec![]);
        let b3 = make_block(11, 1, b2.hash(), vec![make_tx(tx_id(2), vec![outpoint()])]);
        harness.publish_chain(&chain);
        harness.publish_chain(&[b1.clone(), b2.clone(), b3.clone()]);
        harness.track(tx_id(1), vec![outpoint()], true).await;
        harness.track(tx_id(2), vec![outpoint()], true).await;

        harness.announce(tip).await;
        harness.announce(b1.hash()).await;
        assert!(harness.double_spend_notifications().is_empty());

        let outcome = harness.announce(b3.hash()).await;
        assert_eq!(outcome.inserted.len(), 2);

        let sent = harness.double_spend_notifications();
        assert_eq!(sent.len(), 1);
        let stored = harness.block(&b3.hash()).await.unwrap();
        assert_eq!(sent[0].txid, tx_id(1));
        assert_eq!(sent[0].conflicting_txid, tx_id(2));
        assert_eq!(sent[0].block, Some((stored.id, b3.hash())));
        assert_eq!(sent[0].payload, Some(b3.transactions[0].raw.clone()));
        assert_eq!(harness.store.block_double_spends().len(), 1);

        harness.run_sweep().await;
        harness.announce(b3.hash()).await;
        assert!(harness.double_spend_notifications().is_empty());
    }

    #[tokio::test]
    async fn test_conflict_below_window_is_not_scanned() {
        let mut harness =
            EngineHarness::new(IngestionConfig::default(), DoubleSpendConfig::for_testing());
        let mut chain = make_chain(19);
        let stale_fork = make_block(5, 1, chain[4].hash(), vec![]);
        let spender = make_block(
            20,
            0,
            chain[19].hash(),
            vec![make_tx(tx_id(2), vec![outpoint()])],
        );
        chain.push(spender.clone());
        harness.publish_chain(&chain);
        harness.publish_chain(&[stale_fork.clone()]);
        harness.track(tx_id(1), vec![outpoint()], true).await;

        harness.announce(block_hash(19, 0)).await;
        harness.announce(stale_fork.hash()).await;
        harness.announce(spender.hash()).await;

        assert!(harness.block(&spender.hash()).await.unwrap().is_fully_parsed());
        assert!(harness.double_spend_notifications().is_empty());
        assert!(harness.store.block_double_spends().is_empty());
    }

    #[tokio::test]
    async fn test_pool_conflict_is_idempotent_per_conflicting_tx() {
        let mut harness = EngineHarness::for_testing();
        harness.track(tx_id(1), vec![outpoint()], true).await;

        let first = harness
            .detector
            .handle_pool_conflict(&conflict(tx_id(2), vec![tx_id(1)]))
            .await
            .unwrap();
        let repeat = harness
            .detector
            .handle_pool_conflict(&conflict(tx_id(2), vec![tx_id(1)]))
            .await
            .unwrap();
        let other = harness
            .detector
            .handle_pool_conflict(&conflict(tx_id(5), vec![tx_id(1)]))
            .await
            .unwrap();

        assert_eq!(first.notifications, 1);
        assert_eq!(repeat.notifications, 0);
        assert_eq!(other.notifications, 1);
        let sent = harness.double_spend_notifications();
        let conflicting: Vec<Hash> = sent.iter().map(|n| n.conflicting_txid).collect();
        assert_eq!(conflicting, vec![tx_id(2), tx_id(5)]);
        assert_eq!(harness.store.pool_double_spend_attempts().len(), 2);
    }

    #[tokio::test]
    async fn test_pool_conflict_on_unconfirmed_ancestor() {
        let mut harness = EngineHarness::for_testing();
        let ancestor = label_hash("ancestor");
        harness
            .store
            .insert_unconfirmed_ancestor(ancestor, vec![outpoint()])
            .await
            .unwrap();
        harness.track(tx_id(3), vec![OutPoint::new(ancestor, 0)], true).await;
        harness.track(tx_id(4), vec![OutPoint::new(tx_id(3), 1)], false).await;

        let outcome = harness
            .detector
            .handle_pool_conflict(&conflict(tx_id(2), vec![ancestor]))
            .await
            .unwrap();

        assert_eq!(outcome.notifications, 1);
        let sent = harness.double_spend_notifications();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].txid, tx_id(3));
        assert_eq!(sent[0].block, None);
    }

    #[tokio::test]
    async fn test_pool_attempt_then_confirmed_conflict() {
        let mut harness = EngineHarness::for_testing();
        harness.track(tx_id(1), vec![outpoint()], true).await;
        let (genesis, main, fork) = split_at_one();
        harness.publish_chain(&[genesis, main.clone(), fork.clone()]);

        harness
            .detector
            .handle_pool_conflict(&conflict(tx_id(2), vec![tx_id(1)]))
            .await
            .unwrap();
        harness.announce(main.hash()).await;
        harness.announce(fork.hash()).await;

        let sent = harness.double_spend_notifications();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].block, None);
        assert_eq!(sent[1].block.map(|(_, hash)| hash), Some(fork.hash()));
        assert!(sent.iter().all(|n| n.conflicting_txid == tx_id(2)));
    }

    #[tokio::test]
    async fn test_eviction_then_scan_does_not_notify_twice() {
        let mut harness = EngineHarness::for_testing();
        harness.track(tx_id(1), vec![outpoint()], true).await;
        let (genesis, main, fork) = split_at_one();
        harness.publish_chain(&[genesis, main.clone(), fork.clone()]);
        harness.announce(main.hash()).await;

        let signal = PoolEvictionSignal {
            evicted_txid: tx_id(1),
            block_hash: fork.hash(),
            colliding_txid: tx_id(2),
            colliding_payload: fork.transactions[0].raw.clone(),
        };
        let outcome = harness.detector.handle_pool_eviction(&signal).await.unwrap();
        assert_eq!(outcome.blocks_ingested, 1);
        assert_eq!(outcome.notifications, 1);

        let parsed = harness.pump().await;
        assert_eq!(parsed.len(), 1);
        assert!(harness.block(&fork.hash()).await.unwrap().is_fully_parsed());

        let sent = harness.double_spend_notifications();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload, Some(signal.colliding_payload));
        assert_eq!(harness.store.block_double_spends().len(), 1);
    }
}
