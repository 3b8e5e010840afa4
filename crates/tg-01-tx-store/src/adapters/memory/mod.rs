//! # In-Memory Store
//!
//! `TransactionStore` over plain maps behind one `RwLock`. Every trait call
//! takes the lock once and never awaits while holding it, so each operation
//! is atomic with respect to the others.


use crate::algorithms::{has_recent_fork, SpendGraph};
use crate::domain::{
    BlockDoubleSpend, BlockRecord, BlockScanOutcome, BlockTxLink, ConflictedSpend,
    DoubleSpendKey, DoubleSpendKind, DoubleSpendRecord, LinkedTransaction, MerkleProofRecord,
    NewBlock, NewTrackedTransaction, PoolDoubleSpendAttempt, StoreError, TrackedInput,
    TrackedTransaction,
};
use crate::ports::TransactionStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{now_secs, short_hex, BlockId, Hash, InputTriple, OutPoint, TxId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, trace};

type BlockDoubleSpendKey = (TxId, BlockId, Hash);
type PoolAttemptKey = (TxId, Hash);

#[derive(Default)]
struct StoreState {
    next_block_id: u64,
    next_tx_id: u64,
    blocks: BTreeMap<BlockId, BlockRecord>,
    block_ids: HashMap<Hash, BlockId>,
    transactions: BTreeMap<TxId, TrackedTransaction>,
    tx_ids: HashMap<Hash, TxId>,
    /// Keyed by (tx, block) so a transaction's links are one range.
    links: BTreeMap<(TxId, BlockId), BlockTxLink>,
    block_double_spends: BTreeMap<BlockDoubleSpendKey, BlockDoubleSpend>,
    pool_attempts: BTreeMap<PoolAttemptKey, PoolDoubleSpendAttempt>,
}

impl StoreState {
    fn block(&self, id: BlockId) -> Result<&BlockRecord, StoreError> {
        self.blocks
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("{id}")))
    }

    fn block_mut(&mut self, id: BlockId) -> Result<&mut BlockRecord, StoreError> {
        self.blocks
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("{id}")))
    }

    fn tracked(&self, txid: &Hash) -> Option<&TrackedTransaction> {
        self.tx_ids.get(txid).and_then(|id| self.transactions.get(id))
    }

    fn spend_graph(&self) -> SpendGraph {
        SpendGraph::from_spends(
            self.transactions
                .values()
                .map(|tx| (tx.txid, tx.inputs.iter().map(|input| &input.prev_txid))),
        )
    }

    /// Whether `candidate` is `block` or one of its stored ancestors.
    fn ancestry_contains(&self, block: &BlockRecord, candidate: BlockId) -> bool {
        let floor = self.blocks.get(&candidate).and_then(|b| b.height);
        let mut current = Some(block);
        // Bounded by the block count in case stored links ever form a cycle.
        for _ in 0..=self.blocks.len() {
            let Some(record) = current else {
                return false;
            };
            if record.id == candidate {
                return true;
            }
            if let (Some(floor), Some(height)) = (floor, record.height) {
                if height <= floor {
                    return false;
                }
            }
            current = self
                .block_ids
                .get(&record.prev_hash)
                .and_then(|id| self.blocks.get(id));
        }
        false
    }

    fn insert_block_double_spend(&mut self, record: BlockDoubleSpend) -> bool {
        let key = (record.tx_id, record.block_id, record.conflicting_txid);
        if self.block_double_spends.contains_key(&key) {
            return false;
        }
        self.block_double_spends.insert(key, record);
        true
    }

    fn record_view(&self, key: &DoubleSpendKey) -> Option<DoubleSpendRecord> {
        let tx = self.transactions.get(&key.tx_id())?;
        match key {
            DoubleSpendKey::Block {
                tx_id,
                block_id,
                conflicting_txid,
            } => {
                let record = self
                    .block_double_spends
                    .get(&(*tx_id, *block_id, *conflicting_txid))?;
                Some(DoubleSpendRecord {
                    key: *key,
                    txid: tx.txid,
                    block_hash: self.blocks.get(block_id).map(|b| b.hash),
                    payload: record.payload.clone(),
                    callback: tx.callback.clone(),
                    notification_sent_at: record.notification_sent_at,
                })
            }
            DoubleSpendKey::Pool {
                tx_id,
                conflicting_txid,
            } => {
                let record = self.pool_attempts.get(&(*tx_id, *conflicting_txid))?;
                Some(DoubleSpendRecord {
                    key: *key,
                    txid: tx.txid,
                    block_hash: None,
                    payload: record.payload.clone(),
                    callback: tx.callback.clone(),
                    notification_sent_at: record.notification_sent_at,
                })
            }
        }
    }
}

fn tracked_inputs(inputs: &[OutPoint]) -> Vec<TrackedInput> {
    inputs
        .iter()
        .enumerate()
        .map(|(index, outpoint)| TrackedInput {
            index: index as u32,
            prev_txid: outpoint.txid,
            prev_vout: outpoint.vout,
        })
        .collect()
}

/// In-memory `TransactionStore`.
///
/// Used by the runtime binary and by tests. `inject_transient_failures`
/// makes the next calls fail with `StoreError::Database`.
#[derive(Default)]
pub struct InMemoryTransactionStore {
    state: RwLock<StoreState>,
    pending_faults: AtomicU32,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` operations with a transient error.
    pub fn inject_transient_failures(&self, count: u32) {
        self.pending_faults.store(count, Ordering::SeqCst);
    }

    pub fn block_count(&self) -> usize {
        self.state.read().blocks.len()
    }

    pub fn tracked_count(&self) -> usize {
        self.state.read().transactions.len()
    }

    /// Stored blocks at `height`, in insertion order.
    pub fn blocks_at_height(&self, height: u64) -> Vec<BlockRecord> {
        self.state
            .read()
            .blocks
            .values()
            .filter(|b| b.height == Some(height))
            .cloned()
            .collect()
    }

    /// Every block/transaction link.
    pub fn links(&self) -> Vec<BlockTxLink> {
        self.state.read().links.values().cloned().collect()
    }

    /// Every block-level double-spend record.
    pub fn block_double_spends(&self) -> Vec<BlockDoubleSpend> {
        self.state.read().block_double_spends.values().cloned().collect()
    }

    /// Every pool-level double-spend attempt.
    pub fn pool_double_spend_attempts(&self) -> Vec<PoolDoubleSpendAttempt> {
        self.state.read().pool_attempts.values().cloned().collect()
    }

    fn check_fault(&self, op: &str) -> Result<(), StoreError> {
        let injected = self
            .pending_faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Database(format!("injected failure in {op}")));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert_block(&self, block: NewBlock) -> Result<Option<BlockId>, StoreError> {
        self.check_fault("insert_block")?;
        let mut state = self.state.write();
        if state.block_ids.contains_key(&block.hash) {
            return Ok(None);
        }

        state.next_block_id += 1;
        let id = BlockId(state.next_block_id);
        state.block_ids.insert(block.hash, id);
        state.blocks.insert(
            id,
            BlockRecord {
                id,
                hash: block.hash,
                prev_hash: block.prev_hash,
                height: block.height,
                timestamp: block.timestamp,
                on_active_chain: true,
                inserted_at: now_secs(),
                parsed_for_merkle_at: None,
                parsed_for_double_spend_at: None,
            },
        );
        trace!(block_hash = %short_hex(&block.hash), %id, "Block row inserted");
        Ok(Some(id))
    }

    async fn get_block(&self, hash: &Hash) -> Result<Option<BlockRecord>, StoreError> {
        self.check_fault("get_block")?;
        let state = self.state.read();
        Ok(state
            .block_ids
            .get(hash)
            .and_then(|id| state.blocks.get(id))
            .cloned())
    }

    async fn get_block_by_id(&self, id: BlockId) -> Result<Option<BlockRecord>, StoreError> {
        self.check_fault("get_block_by_id")?;
        Ok(self.state.read().blocks.get(&id).cloned())
    }

    async fn get_unparsed_blocks(
        &self,
        inserted_before: u64,
    ) -> Result<Vec<BlockRecord>, StoreError> {
        self.check_fault("get_unparsed_blocks")?;
        let state = self.state.read();
        let mut blocks: Vec<BlockRecord> = state
            .blocks
            .values()
            .filter(|b| !b.is_fully_parsed() && b.inserted_at <= inserted_before)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| (b.height.unwrap_or(u64::MAX), b.id));
        Ok(blocks)
    }

    async fn set_block_parsed_for_merkle(&self, id: BlockId) -> Result<(), StoreError> {
        self.check_fault("set_block_parsed_for_merkle")?;
        let mut state = self.state.write();
        state.block_mut(id)?.parsed_for_merkle_at.get_or_insert_with(now_secs);
        Ok(())
    }

    async fn set_block_parsed_for_double_spend(&self, id: BlockId) -> Result<(), StoreError> {
        self.check_fault("set_block_parsed_for_double_spend")?;
        let mut state = self.state.write();
        state
            .block_mut(id)?
            .parsed_for_double_spend_at
            .get_or_insert_with(now_secs);
        Ok(())
    }

    async fn link_transactions_to_block(
        &self,
        block_id: BlockId,
        txids: &[Hash],
    ) -> Result<Vec<LinkedTransaction>, StoreError> {
        self.check_fault("link_transactions_to_block")?;
        let mut state = self.state.write();
        let block = state.block(block_id)?.clone();

        let mut seen = HashSet::new();
        let mut linked = Vec::new();
        for txid in txids.iter().filter(|txid| seen.insert(**txid)) {
            let Some(tx) = state.tracked(txid).cloned() else {
                continue;
            };
            let on_ancestry = state
                .links
                .range((tx.id, BlockId(0))..=(tx.id, BlockId(u64::MAX)))
                .any(|((_, linked_block), _)| state.ancestry_contains(&block, *linked_block));
            if on_ancestry {
                continue;
            }

            state.links.insert(
                (tx.id, block_id),
                BlockTxLink {
                    block_id,
                    tx_id: tx.id,
                    merkle_proof_sent_at: None,
                },
            );
            linked.push(LinkedTransaction {
                tx_id: tx.id,
                txid: tx.txid,
                merkle_proof_requested: tx.merkle_proof_requested(),
                callback: tx.callback,
            });
        }
        Ok(linked)
    }

    async fn get_pending_merkle_proofs(&self) -> Result<Vec<MerkleProofRecord>, StoreError> {
        self.check_fault("get_pending_merkle_proofs")?;
        let state = self.state.read();
        let pending = state
            .links
            .values()
            .filter(|link| link.merkle_proof_sent_at.is_none())
            .filter_map(|link| {
                let tx = state.transactions.get(&link.tx_id)?;
                let block = state.blocks.get(&link.block_id)?;
                tx.merkle_proof_requested().then(|| MerkleProofRecord {
                    tx_id: tx.id,
                    txid: tx.txid,
                    block_id: block.id,
                    block_hash: block.hash,
                    callback: tx.callback.clone(),
                })
            })
            .collect();
        Ok(pending)
    }

    async fn mark_merkle_proof_sent(
        &self,
        tx_id: TxId,
        block_id: BlockId,
        at: u64,
    ) -> Result<bool, StoreError> {
        self.check_fault("mark_merkle_proof_sent")?;
        let mut state = self.state.write();
        match state.links.get_mut(&(tx_id, block_id)) {
            Some(link) if link.merkle_proof_sent_at.is_none() => {
                link.merkle_proof_sent_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_tracked_transaction(
        &self,
        tx: NewTrackedTransaction,
    ) -> Result<TxId, StoreError> {
        self.check_fault("insert_tracked_transaction")?;
        let mut state = self.state.write();

        if let Some(id) = state.tx_ids.get(&tx.txid).copied() {
            let existing = state
                .transactions
                .get_mut(&id)
                .ok_or_else(|| StoreError::Corrupt(format!("dangling index for {id}")))?;
            if existing.unconfirmed_ancestor {
                existing.payload = tx.payload;
                existing.double_spend_check = tx.double_spend_check;
                existing.merkle_proof_format = tx.merkle_proof_format;
                existing.callback = tx.callback;
                existing.received_at = tx.received_at;
                existing.unconfirmed_ancestor = false;
                if !tx.inputs.is_empty() {
                    existing.inputs = tracked_inputs(&tx.inputs);
                }
                debug!(txid = %short_hex(&tx.txid), %id, "Unconfirmed ancestor promoted");
            }
            return Ok(id);
        }

        state.next_tx_id += 1;
        let id = TxId(state.next_tx_id);
        state.tx_ids.insert(tx.txid, id);
        state.transactions.insert(
            id,
            TrackedTransaction {
                id,
                txid: tx.txid,
                payload: tx.payload,
                double_spend_check: tx.double_spend_check,
                merkle_proof_format: tx.merkle_proof_format,
                callback: tx.callback,
                received_at: tx.received_at,
                unconfirmed_ancestor: false,
                inputs: tracked_inputs(&tx.inputs),
            },
        );
        Ok(id)
    }

    async fn insert_unconfirmed_ancestor(
        &self,
        txid: Hash,
        inputs: Vec<OutPoint>,
    ) -> Result<TxId, StoreError> {
        self.check_fault("insert_unconfirmed_ancestor")?;
        let mut state = self.state.write();
        if let Some(id) = state.tx_ids.get(&txid) {
            return Ok(*id);
        }

        state.next_tx_id += 1;
        let id = TxId(state.next_tx_id);
        state.tx_ids.insert(txid, id);
        state.transactions.insert(
            id,
            TrackedTransaction {
                id,
                txid,
                payload: None,
                double_spend_check: false,
                merkle_proof_format: None,
                callback: Default::default(),
                received_at: now_secs(),
                unconfirmed_ancestor: true,
                inputs: tracked_inputs(&inputs),
            },
        );
        Ok(id)
    }

    async fn get_tracked_transaction(
        &self,
        txid: &Hash,
    ) -> Result<Option<TrackedTransaction>, StoreError> {
        self.check_fault("get_tracked_transaction")?;
        Ok(self.state.read().tracked(txid).cloned())
    }

    async fn get_tracked_transaction_by_id(
        &self,
        id: TxId,
    ) -> Result<Option<TrackedTransaction>, StoreError> {
        self.check_fault("get_tracked_transaction_by_id")?;
        Ok(self.state.read().transactions.get(&id).cloned())
    }

    async fn get_double_spend_check_descendants(
        &self,
        roots: &[Hash],
        conflicting_txid: &Hash,
    ) -> Result<Vec<TrackedTransaction>, StoreError> {
        self.check_fault("get_double_spend_check_descendants")?;
        let state = self.state.read();
        let graph = state.spend_graph();

        let mut seen = HashSet::new();
        let ordered = roots
            .iter()
            .copied()
            .chain(graph.descendants(roots))
            .filter(|txid| seen.insert(*txid));

        let found = ordered
            .filter(|txid| txid != conflicting_txid)
            .filter_map(|txid| state.tracked(&txid))
            .filter(|tx| tx.double_spend_check)
            .filter(|tx| !state.pool_attempts.contains_key(&(tx.id, *conflicting_txid)))
            .cloned()
            .collect();
        Ok(found)
    }

    async fn scan_and_insert_block_double_spends(
        &self,
        triples: &[InputTriple],
        delta_height: u64,
        block_id: BlockId,
    ) -> Result<BlockScanOutcome, StoreError> {
        self.check_fault("scan_and_insert_block_double_spends")?;
        let mut state = self.state.write();
        let block = state.block(block_id)?;
        let Some(height) = block.height else {
            return Ok(BlockScanOutcome::skipped());
        };

        let heights = state.blocks.values().filter_map(|b| b.height);
        if !has_recent_fork(heights, height, delta_height) {
            trace!(height, delta_height, "No recent fork, block scan skipped");
            return Ok(BlockScanOutcome::skipped());
        }

        let mut spenders: HashMap<OutPoint, Vec<Hash>> = HashMap::new();
        for triple in triples {
            let entry = spenders.entry(triple.outpoint()).or_default();
            if !entry.contains(&triple.txid) {
                entry.push(triple.txid);
            }
        }

        let mut conflicted = Vec::new();
        let mut candidates = Vec::new();
        for tx in state.transactions.values() {
            for input in &tx.inputs {
                let Some(spent_by) = spenders.get(&input.outpoint()) else {
                    continue;
                };
                for other in spent_by.iter().filter(|other| **other != tx.txid) {
                    let conflict = ConflictedSpend {
                        txid: tx.txid,
                        conflicting_txid: *other,
                    };
                    if conflicted.contains(&conflict) {
                        continue;
                    }
                    conflicted.push(conflict);
                    if tx.double_spend_check {
                        candidates.push((tx.id, *other));
                    }
                }
            }
        }

        let mut inserted = Vec::new();
        for (tx_id, conflicting_txid) in candidates {
            let record = BlockDoubleSpend {
                tx_id,
                block_id,
                conflicting_txid,
                payload: None,
                notification_sent_at: None,
            };
            if state.insert_block_double_spend(record.clone()) {
                inserted.push(record);
            }
        }

        debug!(
            height,
            conflicted = conflicted.len(),
            inserted = inserted.len(),
            "Block scanned for double spends"
        );
        Ok(BlockScanOutcome {
            scanned: true,
            conflicted,
            inserted,
        })
    }

    async fn insert_block_double_spends_for_descendants(
        &self,
        ancestor_txid: &Hash,
        block_id: BlockId,
        conflicting_txid: &Hash,
    ) -> Result<Vec<BlockDoubleSpend>, StoreError> {
        self.check_fault("insert_block_double_spends_for_descendants")?;
        let mut state = self.state.write();
        state.block(block_id)?;

        let descendants: Vec<TxId> = state
            .spend_graph()
            .descendants(&[*ancestor_txid])
            .into_iter()
            .filter(|txid| txid != conflicting_txid)
            .filter_map(|txid| state.tracked(&txid))
            .filter(|tx| tx.double_spend_check)
            .map(|tx| tx.id)
            .collect();

        let mut inserted = Vec::new();
        for tx_id in descendants {
            let record = BlockDoubleSpend {
                tx_id,
                block_id,
                conflicting_txid: *conflicting_txid,
                payload: None,
                notification_sent_at: None,
            };
            if state.insert_block_double_spend(record.clone()) {
                inserted.push(record);
            }
        }
        Ok(inserted)
    }

    async fn insert_block_double_spend(
        &self,
        tx_id: TxId,
        block_hash: &Hash,
        conflicting_txid: &Hash,
        payload: Vec<u8>,
    ) -> Result<u64, StoreError> {
        self.check_fault("insert_block_double_spend")?;
        let mut state = self.state.write();
        if !state.transactions.contains_key(&tx_id) {
            return Err(StoreError::NotFound(format!("{tx_id}")));
        }
        let Some(block_id) = state.block_ids.get(block_hash).copied() else {
            return Ok(0);
        };

        let inserted = state.insert_block_double_spend(BlockDoubleSpend {
            tx_id,
            block_id,
            conflicting_txid: *conflicting_txid,
            payload: Some(payload),
            notification_sent_at: None,
        });
        Ok(u64::from(inserted))
    }

    async fn insert_pool_double_spend_attempt(
        &self,
        tx_id: TxId,
        conflicting_txid: &Hash,
        payload: Option<Vec<u8>>,
    ) -> Result<u64, StoreError> {
        self.check_fault("insert_pool_double_spend_attempt")?;
        let mut state = self.state.write();
        if !state.transactions.contains_key(&tx_id) {
            return Err(StoreError::NotFound(format!("{tx_id}")));
        }
        let key = (tx_id, *conflicting_txid);
        if state.pool_attempts.contains_key(&key) {
            return Ok(0);
        }
        state.pool_attempts.insert(
            key,
            PoolDoubleSpendAttempt {
                tx_id,
                conflicting_txid: *conflicting_txid,
                payload,
                notification_sent_at: None,
            },
        );
        Ok(1)
    }

    async fn get_double_spends_without_payload(
        &self,
        kind: DoubleSpendKind,
    ) -> Result<Vec<DoubleSpendKey>, StoreError> {
        self.check_fault("get_double_spends_without_payload")?;
        let state = self.state.read();
        let keys = match kind {
            DoubleSpendKind::Block => state
                .block_double_spends
                .values()
                .filter(|r| r.payload.is_none())
                .map(BlockDoubleSpend::key)
                .collect(),
            DoubleSpendKind::Pool => state
                .pool_attempts
                .values()
                .filter(|r| r.payload.is_none())
                .map(PoolDoubleSpendAttempt::key)
                .collect(),
        };
        Ok(keys)
    }

    async fn update_double_spend_payload(
        &self,
        key: &DoubleSpendKey,
        payload: Vec<u8>,
    ) -> Result<u64, StoreError> {
        self.check_fault("update_double_spend_payload")?;
        let mut state = self.state.write();
        let slot = match key {
            DoubleSpendKey::Block {
                tx_id,
                block_id,
                conflicting_txid,
            } => state
                .block_double_spends
                .get_mut(&(*tx_id, *block_id, *conflicting_txid))
                .map(|r| &mut r.payload),
            DoubleSpendKey::Pool {
                tx_id,
                conflicting_txid,
            } => state
                .pool_attempts
                .get_mut(&(*tx_id, *conflicting_txid))
                .map(|r| &mut r.payload),
        };
        match slot {
            Some(slot) if slot.is_none() => {
                *slot = Some(payload);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn get_double_spend(
        &self,
        key: &DoubleSpendKey,
    ) -> Result<Option<DoubleSpendRecord>, StoreError> {
        self.check_fault("get_double_spend")?;
        Ok(self.state.read().record_view(key))
    }

    async fn get_pending_double_spends(&self) -> Result<Vec<DoubleSpendRecord>, StoreError> {
        self.check_fault("get_pending_double_spends")?;
        let state = self.state.read();
        let block_keys = state
            .block_double_spends
            .values()
            .filter(|r| r.notification_sent_at.is_none())
            .map(BlockDoubleSpend::key);
        let pool_keys = state
            .pool_attempts
            .values()
            .filter(|r| r.notification_sent_at.is_none())
            .map(PoolDoubleSpendAttempt::key);
        Ok(block_keys
            .chain(pool_keys)
            .filter_map(|key| state.record_view(&key))
            .collect())
    }

    async fn mark_double_spend_sent(
        &self,
        key: &DoubleSpendKey,
        at: u64,
    ) -> Result<bool, StoreError> {
        self.check_fault("mark_double_spend_sent")?;
        let mut state = self.state.write();
        let slot = match key {
            DoubleSpendKey::Block {
                tx_id,
                block_id,
                conflicting_txid,
            } => state
                .block_double_spends
                .get_mut(&(*tx_id, *block_id, *conflicting_txid))
                .map(|r| &mut r.notification_sent_at),
            DoubleSpendKey::Pool {
                tx_id,
                conflicting_txid,
            } => state
                .pool_attempts
                .get_mut(&(*tx_id, *conflicting_txid))
                .map(|r| &mut r.notification_sent_at),
        };
        match slot {
            Some(slot) if slot.is_none() => {
                *slot = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
