//! Batched edge updates.
//!
//! A batch is applied by partitioning its actions by source vertex. Every
//! partition is owned by one worker, which applies its actions in their batch
//! order; partitions run in parallel with no ordering between them.

pub use generate::{generate_actions, random_batches};
pub use session::{BatchSession, SessionState};

mod generate;
mod session;

use crate::{
    error::{Error, Result},
    sort::{radix_sort_pairs, DEFAULT_RADIX_BITS},
    store::{BlockAllocator, EdgeChange, Graph},
    tools::GroupBy,
    types::{EType, Timestamp, VId, Weight},
};
use derive_more::{Add, AddAssign, Display};
use log::debug;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Delete,
}

/// One edge update inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchAction {
    pub source: VId,
    pub destination: VId,
    pub weight: Weight,
    pub time: Timestamp,
    pub operation: Operation,
}

impl BatchAction {
    pub fn insert(source: VId, destination: VId, weight: Weight, time: Timestamp) -> Self {
        Self {
            source,
            destination,
            weight,
            time,
            operation: Operation::Insert,
        }
    }

    pub fn delete(source: VId, destination: VId, time: Timestamp) -> Self {
        Self {
            source,
            destination,
            weight: 0,
            time,
            operation: Operation::Delete,
        }
    }

    /// The same action with its endpoints swapped.
    pub fn reversed(&self) -> Self {
        Self {
            source: self.destination,
            destination: self.source,
            ..*self
        }
    }

    pub fn is_delete(&self) -> bool {
        self.operation == Operation::Delete
    }
}

/// An ordered group of actions applied under one edge type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub actions: Vec<BatchAction>,
    /// Also apply every action with its endpoints swapped.
    pub make_undirected: bool,
    pub etype: EType,
    /// Cleared on the sender's last batch.
    pub keep_alive: bool,
}

impl Batch {
    pub fn new(actions: Vec<BatchAction>) -> Self {
        Self {
            actions,
            make_undirected: false,
            etype: 0,
            keep_alive: true,
        }
    }

    /// The terminal, empty batch closing a session.
    pub fn last() -> Self {
        Self::new(vec![]).keep_alive(false)
    }

    pub fn undirected(mut self, make_undirected: bool) -> Self {
        self.make_undirected = make_undirected;
        self
    }

    pub fn etype(mut self, etype: EType) -> Self {
        self.etype = etype;
        self
    }

    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// The actions to apply, mirrored copies placed right after their originals.
    fn expand(&self) -> Vec<BatchAction> {
        if !self.make_undirected {
            return self.actions.clone();
        }
        let mut out = Vec::with_capacity(2 * self.actions.len());
        for action in self.actions.iter() {
            out.push(*action);
            if action.source != action.destination {
                out.push(action.reversed());
            }
        }
        out
    }
}

/// Tally of what a batch did to the store.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Add, AddAssign)]
#[display(
    fmt = "inserted: {} updated: {} removed: {} ignored: {}",
    inserted,
    updated,
    removed,
    ignored
)]
pub struct BatchAck {
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
    /// Deletions of edges that did not exist.
    pub ignored: usize,
}

impl BatchAck {
    pub fn applied(&self) -> usize {
        self.inserted + self.updated + self.removed + self.ignored
    }
}

impl<A: BlockAllocator> Graph<A> {
    /// Applies `batch`, returning what changed.
    ///
    /// Endpoints and the edge type are checked before any action is applied,
    /// so a rejected batch leaves the store untouched.
    pub fn apply_batch(&self, batch: &Batch) -> Result<BatchAck> {
        let actions = batch.expand();
        self.check_etype(batch.etype)?;
        for action in actions.iter() {
            self.check_vertex(action.source)?;
            self.check_vertex(action.destination)?;
        }

        let mut keys: Vec<(i64, i64)> = actions
            .iter()
            .enumerate()
            .map(|(i, a)| (a.source, i as i64))
            .collect();
        radix_sort_pairs(&mut keys, DEFAULT_RADIX_BITS);
        let partitions: Vec<&[(i64, i64)]> = GroupBy::new(&keys, |&(s, _)| s).map(|(_, p)| p).collect();
        debug!(
            "applying {} actions over {} sources",
            actions.len(),
            partitions.len()
        );

        partitions
            .par_iter()
            .map(|partition| {
                let mut ack = BatchAck::default();
                for &(_, i) in partition.iter() {
                    let action = &actions[i as usize];
                    match action.operation {
                        Operation::Insert => {
                            match self.insert_edge(
                                batch.etype,
                                action.source,
                                action.destination,
                                action.weight,
                                action.time,
                            )? {
                                EdgeChange::Inserted => ack.inserted += 1,
                                EdgeChange::Updated => ack.updated += 1,
                            }
                        }
                        Operation::Delete => {
                            if self.remove_edge(batch.etype, action.source, action.destination)? {
                                ack.removed += 1;
                            } else {
                                ack.ignored += 1;
                            }
                        }
                    }
                }
                Ok::<_, Error>(ack)
            })
            .try_reduce(BatchAck::default, |a, b| Ok(a + b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;

    #[test]
    fn test_apply_batch() {
        let graph = Graph::new(GraphConfig::new(8).num_etypes(2));
        let batch = Batch::new(vec![
            BatchAction::insert(1, 2, 1, 1),
            BatchAction::insert(3, 2, 1, 2),
            BatchAction::insert(1, 2, 5, 3),
            BatchAction::delete(3, 2, 4),
            BatchAction::delete(3, 4, 5),
            BatchAction::insert(3, 2, 7, 6),
        ])
        .etype(1);
        let ack = graph.apply_batch(&batch).unwrap();
        assert_eq!(
            ack,
            BatchAck {
                inserted: 3,
                updated: 1,
                removed: 1,
                ignored: 1
            }
        );
        assert_eq!(ack.applied(), 6);
        let edge = graph.edge(1, 1, 2).unwrap().unwrap();
        assert_eq!((edge.weight, edge.time_first, edge.time_recent), (5, 1, 3));
        let edge = graph.edge(1, 3, 2).unwrap().unwrap();
        assert_eq!((edge.weight, edge.time_first), (7, 6));
        assert_eq!(graph.edges_of_type(0).unwrap(), 0);
    }

    #[test]
    fn test_undirected_batch_mirrors_inserts_and_deletes() {
        let graph = Graph::new(GraphConfig::new(4).num_etypes(1));
        let batch = Batch::new(vec![
            BatchAction::insert(0, 1, 1, 1),
            BatchAction::insert(2, 2, 1, 2),
        ])
        .undirected(true);
        assert_eq!(graph.apply_batch(&batch).unwrap().inserted, 3);
        assert!(graph.has_edge(0, 1, 0).unwrap());
        let batch = Batch::new(vec![BatchAction::delete(1, 0, 3)]).undirected(true);
        assert_eq!(graph.apply_batch(&batch).unwrap().removed, 2);
        assert_eq!(graph.total_edges(), 1);
    }

    #[test]
    fn test_rejected_batch_leaves_store_untouched() {
        let graph = Graph::new(GraphConfig::new(4).num_etypes(1));
        let batch = Batch::new(vec![BatchAction::insert(0, 1, 1, 1), BatchAction::insert(0, 9, 1, 2)]);
        assert!(matches!(graph.apply_batch(&batch), Err(Error::VertexOutOfRange { vertex: 9, .. })));
        assert!(matches!(
            graph.apply_batch(&Batch::new(vec![]).etype(3)),
            Err(Error::EdgeTypeOutOfRange { .. })
        ));
        assert_eq!(graph.total_edges(), 0);
    }

    #[test]
    fn test_per_source_order_preserved() {
        let graph = Graph::new(GraphConfig::new(64).num_etypes(1));
        let mut actions = Vec::new();
        for round in 0..20 {
            for s in 0..64 {
                let d = (s + round) % 64;
                actions.push(BatchAction::insert(s, 0, d, round));
                if round % 2 == 1 {
                    actions.push(BatchAction::delete(s, 0, round));
                }
            }
        }
        let ack = graph.apply_batch(&Batch::new(actions)).unwrap();
        assert_eq!(ack.removed, 64 * 10);
        // Odd rounds end with a delete.
        assert_eq!(graph.total_edges(), 0);
        let actions = (0..64).map(|s| BatchAction::insert(s, 1, s, 100)).collect();
        graph.apply_batch(&Batch::new(actions)).unwrap();
        for s in 0..64 {
            assert_eq!(graph.edge(0, s, 1).unwrap().unwrap().weight, s);
        }
    }
}
