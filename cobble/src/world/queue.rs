//! Dirty-chunk work queues.
//!
//! Enqueue never fails and queue length is unbounded; only the drain rate
//! is capped, by the tick driver. Idempotence comes from the chunk's own
//! dirty bit: a queue maintains "bit set iff an entry is pending", so
//! marking an already-pending chunk is a no-op.

use std::collections::VecDeque;

use crate::world::chunk::ChunkFlags;
use crate::world::frame::{ChunkSlot, Frame};

/// Reload services per tick.
pub const RELOAD_CAP: usize = 16;
/// Recompile services per tick.
pub const RECOMPILE_CAP: usize = 1024;

/// A FIFO of chunk slots awaiting one kind of service, tied to the dirty
/// bit that tracks membership.
#[derive(Debug)]
pub struct WorkQueue {
    slots: VecDeque<ChunkSlot>,
    flag: ChunkFlags,
}

impl WorkQueue {
    pub fn new(flag: ChunkFlags) -> Self {
        Self {
            slots: VecDeque::new(),
            flag,
        }
    }

    /// Queues `slot` unless its chunk already carries this queue's dirty
    /// bit. Returns whether an entry was added.
    pub fn mark(&mut self, frame: &mut Frame, slot: ChunkSlot) -> bool {
        let chunk = frame.chunk_mut(slot);
        if chunk.flags().contains(self.flag) {
            return false;
        }
        chunk.set_flag(self.flag);
        self.slots.push_back(slot);
        true
    }

    /// Takes the oldest pending slot. The dirty bit stays set until the
    /// service routine completes and clears it, so a crash mid-service
    /// leaves the chunk visibly dirty.
    pub fn pop(&mut self) -> Option<ChunkSlot> {
        self.slots.pop_front()
    }

    /// Puts a slot whose service failed back at the tail. Its dirty bit is
    /// still set, so `mark` keeps refusing duplicates.
    pub fn requeue(&mut self, slot: ChunkSlot) {
        self.slots.push_back(slot);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
