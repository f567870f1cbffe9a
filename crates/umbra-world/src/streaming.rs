//! Column lifecycle states and the pending queues that move columns between them.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;
use umbra_voxel::ChunkCoord;

/// Where a column is in its load/unload lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Not in memory and not queued.
    Absent,
    /// Visible, no saved data, waiting for terrain generation.
    PendingLoad,
    /// Voxels and light are in memory.
    Resident,
    /// Still in memory but no longer visible; waiting to be saved and dropped.
    PendingUnload,
}

/// Deduplicating queue of column coordinates, lowest priority value first.
///
/// Removal is lazy: [`PendingQueue::remove`] and [`PendingQueue::retain`]
/// only touch the membership set, and stale heap entries are skipped when
/// dequeued.
#[derive(Debug, Default)]
pub struct PendingQueue {
    heap: BinaryHeap<Reverse<(u64, ChunkCoord)>>,
    pending: FxHashSet<ChunkCoord>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `coord`. Returns `false` if it was already pending.
    pub fn enqueue(&mut self, coord: ChunkCoord, priority: u64) -> bool {
        if self.pending.insert(coord) {
            self.heap.push(Reverse((priority, coord)));
            true
        } else {
            false
        }
    }

    /// Pops the pending coordinate with the lowest priority value.
    pub fn dequeue(&mut self) -> Option<ChunkCoord> {
        while let Some(Reverse((_, coord))) = self.heap.pop() {
            if self.pending.remove(&coord) {
                return Some(coord);
            }
        }
        None
    }

    /// The coordinate [`PendingQueue::dequeue`] would return next.
    pub fn peek(&mut self) -> Option<ChunkCoord> {
        while let Some(&Reverse((_, coord))) = self.heap.peek() {
            if self.pending.contains(&coord) {
                return Some(coord);
            }
            self.heap.pop();
        }
        None
    }

    /// Recomputes the priority of every pending coordinate.
    ///
    /// Also drops the stale heap entries left behind by lazy removal.
    pub fn reprioritize(&mut self, mut priority: impl FnMut(ChunkCoord) -> u64) {
        self.heap = self
            .pending
            .iter()
            .map(|&coord| Reverse((priority(coord), coord)))
            .collect();
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.pending.contains(&coord)
    }

    /// Drops `coord` from the queue. Returns `true` if it was pending.
    pub fn remove(&mut self, coord: ChunkCoord) -> bool {
        self.pending.remove(&coord)
    }

    /// Keeps only the coordinates for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(ChunkCoord) -> bool) {
        self.pending.retain(|&coord| keep(coord));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending coordinates in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.pending.iter().copied()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.pending.clear();
    }
}

/// Every coordinate within Chebyshev distance `radius` of `center`.
pub fn visible_square(center: ChunkCoord, radius: u32) -> FxHashSet<ChunkCoord> {
    let r = radius as i32;
    let mut visible = FxHashSet::default();
    for dz in -r..=r {
        for dx in -r..=r {
            visible.insert(center.offset(dx, dz));
        }
    }
    visible
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
