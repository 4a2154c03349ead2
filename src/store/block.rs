use crate::types::{BlockId, EType, Timestamp, VId, Weight, EDGE_BLOCK_SIZE, NO_BLOCK};

/// Occupancy of one edge slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Never used since the block was handed out or compacted.
    Empty,
    Live,
    /// Logically deleted; reusable by a later insert into the same chain.
    Tombstone,
}

impl Default for SlotState {
    fn default() -> Self {
        SlotState::Empty
    }
}

/// One directed edge as seen from its source vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Edge {
    pub neighbor: VId,
    pub weight: Weight,
    /// Set once, when the edge is created.
    pub time_first: Timestamp,
    pub time_recent: Timestamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Slot {
    pub state: SlotState,
    pub edge: Edge,
}

impl Slot {
    pub fn is_live(&self) -> bool {
        self.state == SlotState::Live
    }
}

/// How an update changes the weight of an existing edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WeightUpdate {
    Replace(Weight),
    Add(Weight),
}

impl WeightUpdate {
    pub fn initial(self) -> Weight {
        match self {
            WeightUpdate::Replace(w) | WeightUpdate::Add(w) => w,
        }
    }

    fn apply(self, old: Weight) -> Weight {
        match self {
            WeightUpdate::Replace(w) => w,
            WeightUpdate::Add(w) => old.wrapping_add(w),
        }
    }
}

/// A fixed-capacity run of edges belonging to one (vertex, edge type) chain.
///
/// `high` bounds every scan: slots at or above it are `Empty`. The stamps are
/// a cached summary; deletions leave them conservative.
#[derive(Debug, Clone)]
pub struct EdgeBlock {
    etype: EType,
    next: BlockId,
    num_edges: usize,
    high: usize,
    small_stamp: Timestamp,
    large_stamp: Timestamp,
    slots: [Slot; EDGE_BLOCK_SIZE],
}

impl Default for EdgeBlock {
    fn default() -> Self {
        Self::new(0, NO_BLOCK)
    }
}

impl EdgeBlock {
    pub fn new(etype: EType, next: BlockId) -> Self {
        Self {
            etype,
            next,
            num_edges: 0,
            high: 0,
            small_stamp: Timestamp::MAX,
            large_stamp: Timestamp::MIN,
            slots: [Slot::default(); EDGE_BLOCK_SIZE],
        }
    }

    pub fn etype(&self) -> EType {
        self.etype
    }

    pub fn next(&self) -> BlockId {
        self.next
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn high(&self) -> usize {
        self.high
    }

    pub fn small_stamp(&self) -> Timestamp {
        self.small_stamp
    }

    pub fn large_stamp(&self) -> Timestamp {
        self.large_stamp
    }

    pub fn slot_state(&self, k: usize) -> SlotState {
        self.slots[k].state
    }

    /// Live edges with their slot index.
    pub fn live_edges(&self) -> impl Iterator<Item = (usize, &Edge)> + '_ {
        self.slots[..self.high]
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_live())
            .map(|(k, slot)| (k, &slot.edge))
    }

    pub(crate) fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    pub(crate) fn find(&self, neighbor: VId) -> Option<usize> {
        self.slots[..self.high]
            .iter()
            .position(|slot| slot.is_live() && slot.edge.neighbor == neighbor)
    }

    /// First reusable slot below the high-water mark.
    pub(crate) fn hole(&self) -> Option<usize> {
        if self.num_edges == self.high {
            return None;
        }
        self.slots[..self.high].iter().position(|slot| !slot.is_live())
    }

    pub(crate) fn can_extend(&self) -> bool {
        self.high < EDGE_BLOCK_SIZE
    }

    /// Writes `edge` into slot `k`, which must not be live.
    pub(crate) fn claim(&mut self, k: usize, edge: Edge) {
        debug_assert!(!self.slots[k].is_live(), "slot {} already live", k);
        self.slots[k] = Slot {
            state: SlotState::Live,
            edge,
        };
        self.num_edges += 1;
        self.high = self.high.max(k + 1);
        self.small_stamp = self.small_stamp.min(edge.time_first);
        self.large_stamp = self.large_stamp.max(edge.time_recent);
    }

    pub(crate) fn update(&mut self, k: usize, update: WeightUpdate, timestamp: Timestamp) -> Edge {
        let edge = &mut self.slots[k].edge;
        edge.weight = update.apply(edge.weight);
        edge.time_recent = edge.time_recent.max(timestamp);
        self.large_stamp = self.large_stamp.max(edge.time_recent);
        *edge
    }

    pub(crate) fn tombstone(&mut self, k: usize) -> Edge {
        debug_assert!(self.slots[k].is_live(), "slot {} not live", k);
        self.slots[k].state = SlotState::Tombstone;
        self.num_edges -= 1;
        self.slots[k].edge
    }

    /// Recomputes the cached summary from the slots, turning tombstones into
    /// empty slots. Returns the number of tombstones reclaimed.
    pub(crate) fn rebuild_summary(&mut self) -> usize {
        let mut reclaimed = 0;
        self.num_edges = 0;
        self.high = 0;
        self.small_stamp = Timestamp::MAX;
        self.large_stamp = Timestamp::MIN;
        for (k, slot) in self.slots.iter_mut().enumerate() {
            match slot.state {
                SlotState::Live => {
                    self.num_edges += 1;
                    self.high = k + 1;
                    self.small_stamp = self.small_stamp.min(slot.edge.time_first);
                    self.large_stamp = self.large_stamp.max(slot.edge.time_recent);
                }
                SlotState::Tombstone => {
                    *slot = Slot::default();
                    reclaimed += 1;
                }
                SlotState::Empty => (),
            }
        }
        reclaimed
    }
}
