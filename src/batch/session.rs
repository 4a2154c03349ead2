use super::{Batch, BatchAck};
use crate::{
    error::{Error, Result},
    store::{BlockAllocator, BumpAllocator, Graph},
};
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// The receiving end of one batch producer.
///
/// The session stays open until a batch with `keep_alive` cleared has been
/// applied; later batches are refused with `SessionClosed`.
pub struct BatchSession<'g, A: BlockAllocator = BumpAllocator> {
    graph: &'g Graph<A>,
    state: SessionState,
    batches: usize,
    totals: BatchAck,
}

impl<'g, A: BlockAllocator> BatchSession<'g, A> {
    pub fn new(graph: &'g Graph<A>) -> Self {
        Self {
            graph,
            state: SessionState::Open,
            batches: 0,
            totals: BatchAck::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn batches_applied(&self) -> usize {
        self.batches
    }

    /// Sum of the acknowledgements of every applied batch.
    pub fn totals(&self) -> BatchAck {
        self.totals
    }

    /// Applies `batch` and acknowledges it. A failed batch leaves the session open.
    pub fn receive(&mut self, batch: &Batch) -> Result<BatchAck> {
        if self.state == SessionState::Closed {
            warn!("batch of {} actions received after close", batch.actions.len());
            return Err(Error::SessionClosed);
        }
        let ack = self.graph.apply_batch(batch)?;
        self.batches += 1;
        self.totals += ack;
        debug!("batch {}: {}", self.batches, ack);
        if !batch.keep_alive {
            self.state = SessionState::Closed;
            info!("session closed after {} batches: {}", self.batches, self.totals);
        }
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{batch::BatchAction, config::GraphConfig};

    #[test]
    fn test_open_then_closed() {
        let graph = Graph::new(GraphConfig::new(4).num_etypes(1));
        let mut session = BatchSession::new(&graph);
        let batch = Batch::new(vec![BatchAction::insert(0, 1, 1, 1)]);
        assert_eq!(session.receive(&batch).unwrap().inserted, 1);
        assert!(session.is_open());
        let last = Batch::new(vec![BatchAction::insert(1, 2, 1, 2)]).keep_alive(false);
        assert_eq!(session.receive(&last).unwrap().inserted, 1);
        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(session.receive(&batch), Err(Error::SessionClosed)));
        assert_eq!(session.batches_applied(), 2);
        assert_eq!(session.totals().inserted, 2);
        assert_eq!(graph.total_edges(), 2);
    }

    #[test]
    fn test_failed_batch_keeps_session_open() {
        let graph = Graph::new(GraphConfig::new(4).num_etypes(1));
        let mut session = BatchSession::new(&graph);
        let bad = Batch::new(vec![BatchAction::insert(0, 7, 1, 1)]).keep_alive(false);
        assert!(session.receive(&bad).is_err());
        assert!(session.is_open());
        session.receive(&Batch::last()).unwrap();
        assert!(!session.is_open());
    }
}
