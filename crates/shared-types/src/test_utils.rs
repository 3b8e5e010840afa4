//! Deterministic fixtures for building chains in tests.

use crate::entities::{BlockContent, BlockHeader, ChainTransaction, Hash, OutPoint, ZERO_HASH};
use sha2::{Digest, Sha256};

/// Hash of an arbitrary label.
pub fn label_hash(label: &str) -> Hash {
    Sha256::digest(label.as_bytes()).into()
}

/// Hash of the block at `height` on fork `fork` (0 = main chain).
pub fn block_hash(height: u64, fork: u8) -> Hash {
    label_hash(&format!("block-{fork}-{height}"))
}

/// Hash of the `n`th test transaction.
pub fn tx_id(n: u64) -> Hash {
    label_hash(&format!("tx-{n}"))
}

pub fn make_tx(txid: Hash, inputs: Vec<OutPoint>) -> ChainTransaction {
    ChainTransaction {
        txid,
        inputs,
        raw: txid[..8].to_vec(),
    }
}

/// Block at `height` on `fork`, whose hash is `block_hash(height, fork)`.
///
/// A `prev_hash` of [`ZERO_HASH`] produces a genesis header (`prev_hash: None`).
pub fn make_block(
    height: u64,
    fork: u8,
    prev_hash: Hash,
    txs: Vec<ChainTransaction>,
) -> BlockContent {
    BlockContent {
        header: BlockHeader {
            hash: block_hash(height, fork),
            height,
            prev_hash: (prev_hash != ZERO_HASH).then_some(prev_hash),
            timestamp: 1_700_000_000 + height * 600,
        },
        transactions: txs,
    }
}

/// Linear main chain `0..=tip` with empty blocks.
pub fn make_chain(tip: u64) -> Vec<BlockContent> {
    let mut prev = ZERO_HASH;
    (0..=tip)
        .map(|height| {
            let block = make_block(height, 0, prev, vec![]);
            prev = block.hash();
            block
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_links() {
        let chain = make_chain(3);
        assert_eq!(chain.len(), 4);
        assert_eq!(chain[0].header.prev_hash, None);
        assert_eq!(chain[3].header.prev_hash, Some(chain[2].hash()));
        assert_ne!(block_hash(1, 0), block_hash(1, 1));
    }
}
