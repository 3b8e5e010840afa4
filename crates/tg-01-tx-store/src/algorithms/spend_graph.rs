//! # Spend Graph
//!
//! Adjacency from a transaction to the transactions spending its outputs.
//! Descendant queries are iterative breadth-first walks, so arbitrarily deep
//! chains of unconfirmed spends cannot overflow the stack.

use shared_types::Hash;
use std::collections::{HashMap, HashSet, VecDeque};

/// Parent -> children adjacency over transaction ids.
#[derive(Debug, Clone, Default)]
pub struct SpendGraph {
    children: HashMap<Hash, Vec<Hash>>,
}

impl SpendGraph {
    /// Build the graph from `(txid, spent prev_txids)` pairs.
    pub fn from_spends<'a, I, P>(spends: I) -> Self
    where
        I: IntoIterator<Item = (Hash, P)>,
        P: IntoIterator<Item = &'a Hash>,
    {
        let mut graph = Self::default();
        for (txid, parents) in spends {
            for parent in parents {
                graph.add_edge(*parent, txid);
            }
        }
        graph
    }

    /// Record that `child` spends an output of `parent`.
    pub fn add_edge(&mut self, parent: Hash, child: Hash) {
        let children = self.children.entry(parent).or_default();
        if !children.contains(&child) {
            children.push(child);
        }
    }

    /// Direct spenders of `parent`.
    pub fn children(&self, parent: &Hash) -> &[Hash] {
        self.children.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every transaction transitively spending an output of any root, in
    /// breadth-first order. Roots are excluded unless one descends from
    /// another root.
    pub fn descendants(&self, roots: &[Hash]) -> Vec<Hash> {
        let mut visited: HashSet<Hash> = roots.iter().copied().collect();
        let mut queue: VecDeque<Hash> = roots.iter().copied().collect();
        let mut found = Vec::new();

        while let Some(current) = queue.pop_front() {
            for child in self.children(&current) {
                if visited.insert(*child) {
                    found.push(*child);
                    queue.push_back(*child);
                }
            }
        }

        // A root reachable from another root is still a descendant.
        for root in roots {
            if !found.contains(root)
                && roots
                    .iter()
                    .any(|other| other != root && self.reaches(other, root))
            {
                found.push(*root);
            }
        }
        found
    }

    fn reaches(&self, from: &Hash, to: &Hash) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([*from]);
        while let Some(current) = queue.pop_front() {
            for child in self.children(&current) {
                if child == to {
                    return true;
                }
                if visited.insert(*child) {
                    queue.push_back(*child);
                }
            }
        }
        false
    }
}
