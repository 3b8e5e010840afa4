//! # Runtime Flows
//!
//! Node signals published on the bus of a running engine, observed through
//! the notification stream.

#[cfg(test)]
mod tests {
    use gateway_runtime::{EngineConfig, EngineRuntime};
    use shared_bus::{EventPublisher, GatewayEvent, PoolConflictSignal, RejectCode, Subscription};
    use shared_types::test_utils::{label_hash, make_block, make_tx, tx_id};
    use shared_types::{Hash, InMemoryChainGateway, OutPoint, ZERO_HASH};
    use std::sync::Arc;
    use std::time::Duration;
    use tg_01_tx_store::{InMemoryTransactionStore, NewTrackedTransaction, TransactionStore};

    async fn expect_event(subscription: &mut Subscription) -> GatewayEvent {
        tokio::time::timeout(Duration::from_secs(5), subscription.recv())
            .await
            .expect("no notification within timeout")
            .expect("bus closed")
    }

    async fn discover(
        runtime: &EngineRuntime<InMemoryTransactionStore, InMemoryChainGateway>,
        hash: Hash,
    ) {
        runtime
            .bus()
            .publish(GatewayEvent::NewBlockDiscovered {
                block_hash: hash,
                timestamp: 0,
            })
            .await;
    }

    #[tokio::test]
    async fn test_fork_discovery_to_double_spend_notification() {
        let spent = OutPoint::new(label_hash("shared-output"), 0);
        let genesis = make_block(0, 0, ZERO_HASH, vec![]);
        let main = make_block(1, 0, genesis.hash(), vec![make_tx(tx_id(1), vec![spent])]);
        let fork = make_block(1, 1, genesis.hash(), vec![make_tx(tx_id(2), vec![spent])]);

        let store = Arc::new(InMemoryTransactionStore::new());
        store
            .insert_tracked_transaction(NewTrackedTransaction {
                txid: tx_id(1),
                double_spend_check: true,
                merkle_proof_format: Some("tsc".to_string()),
                inputs: vec![spent],
                ..NewTrackedTransaction::default()
            })
            .await
            .unwrap();
        let gateway = Arc::new(InMemoryChainGateway::new());
        for block in [&genesis, &main, &fork] {
            gateway.add_block(block.clone());
        }

        let runtime = EngineRuntime::start(&EngineConfig::for_testing(), store.clone(), gateway);
        let mut notifications = runtime.subscribe_notifications();

        discover(&runtime, main.hash()).await;
        match expect_event(&mut notifications).await {
            GatewayEvent::MerkleProofReady(n) => assert_eq!(n.block_hash, main.hash()),
            other => panic!("unexpected event: {other:?}"),
        }

        discover(&runtime, fork.hash()).await;
        match expect_event(&mut notifications).await {
            GatewayEvent::DoubleSpendDetected(n) => {
                assert_eq!(n.txid, tx_id(1));
                assert_eq!(n.conflicting_txid, tx_id(2));
                assert_eq!(n.block.map(|(_, hash)| hash), Some(fork.hash()));
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let pending = runtime
            .notification_reader()
            .pending_double_spend_notifications()
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_signals_after_shutdown_are_not_handled() {
        let store = Arc::new(InMemoryTransactionStore::new());
        store
            .insert_tracked_transaction(NewTrackedTransaction {
                txid: tx_id(1),
                double_spend_check: true,
                ..NewTrackedTransaction::default()
            })
            .await
            .unwrap();
        let runtime = EngineRuntime::start(
            &EngineConfig::for_testing(),
            store.clone(),
            Arc::new(InMemoryChainGateway::new()),
        );
        let bus = runtime.bus();
        runtime.shutdown().await;

        bus.publish(GatewayEvent::PoolConflict(PoolConflictSignal {
            rejected_txid: tx_id(2),
            reject_code: RejectCode::MempoolConflict,
            colliding_txids: vec![tx_id(1)],
            raw_payload: None,
        }))
        .await;
        tokio::task::yield_now().await;

        assert!(store.pool_double_spend_attempts().is_empty());
    }
}
