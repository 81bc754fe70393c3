//! The engine core: chunks, the sliding frame, exposure tracking, dirty
//! queues and mesh compilation, tied together by [`World`].

pub mod block;
pub mod chunk;
pub mod entity;
pub mod exposure;
pub mod face;
pub mod frame;
pub mod generator;
pub mod mesher;
pub mod queue;

use glam::IVec3;
use log::{debug, warn};
use smallvec::SmallVec;

use cobble_util::Aabb;

use crate::world::block::Block;
use crate::world::chunk::{Chunk, ChunkFlags, CHUNK_SIZE};
use crate::world::entity::EntityId;
use crate::world::exposure::compute_exposure;
use crate::world::face::FACES;
use crate::world::frame::{ChunkSlot, Frame};
use crate::world::generator::TerrainSource;
use crate::world::queue::{WorkQueue, RECOMPILE_CAP, RELOAD_CAP};

/// One complete simulated world: the chunk window, the two dirty queues
/// and the terrain source. All engine state lives here; independent worlds
/// never share anything.
pub struct World {
    frame: Frame,
    reloads: WorkQueue,
    recompiles: WorkQueue,
    terrain: Box<dyn TerrainSource>,
}

impl World {
    /// `region_offset` is the world chunk coordinate of the window's
    /// minimum corner. Every chunk starts queued for reload; terrain
    /// streams in over the following ticks.
    pub fn new(terrain: Box<dyn TerrainSource>, region_offset: IVec3) -> Self {
        let mut world = Self {
            frame: Frame::new(region_offset),
            reloads: WorkQueue::new(ChunkFlags::NEEDS_RELOAD),
            recompiles: WorkQueue::new(ChunkFlags::NEEDS_RECOMPILE),
            terrain,
        };
        for slot in Frame::slots() {
            world.reloads.mark(&mut world.frame, slot);
        }
        world
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn chunk(&self, slot: ChunkSlot) -> &Chunk {
        self.frame.chunk(slot)
    }

    pub fn reloads_pending(&self) -> usize {
        self.reloads.len()
    }

    pub fn recompiles_pending(&self) -> usize {
        self.recompiles.len()
    }

    /// One simulation step: service up to [`RELOAD_CAP`] reloads, then up
    /// to [`RECOMPILE_CAP`] recompiles, oldest first. Excess work stays
    /// queued for the next tick, bounding per-tick cost no matter how much
    /// became dirty at once.
    pub fn tick(&mut self) {
        let mut reloaded = 0;
        for _ in 0..RELOAD_CAP {
            let Some(slot) = self.reloads.pop() else { break };
            self.service_reload(slot);
            reloaded += 1;
        }

        let mut recompiled = 0;
        for _ in 0..RECOMPILE_CAP {
            let Some(slot) = self.recompiles.pop() else { break };
            match mesher::compile_chunk(&mut self.frame, slot) {
                Ok(()) => {
                    self.frame
                        .chunk_mut(slot)
                        .clear_flag(ChunkFlags::NEEDS_RECOMPILE);
                    recompiled += 1;
                }
                Err(error) => {
                    warn!("recompile of chunk {slot:?} failed, requeueing: {error}");
                    self.recompiles.requeue(slot);
                }
            }
        }

        if reloaded > 0 || recompiled > 0 {
            debug!(
                "tick: {reloaded} reloads, {recompiled} recompiles, {} / {} pending",
                self.reloads.len(),
                self.recompiles.len()
            );
        }
    }

    fn service_reload(&mut self, slot: ChunkSlot) {
        let base = self.frame.chunk(slot).rpos() * CHUNK_SIZE as i32;
        let terrain = self.terrain.as_ref();
        let chunk = self.frame.chunk_mut(slot);
        chunk.clear_block_entities();
        chunk.fill_blocks(|local| terrain.block_at(base + local.as_ivec3()));
        chunk.clear_flag(ChunkFlags::NEEDS_RELOAD);

        let touched = compute_exposure(&mut self.frame, slot);
        for neighbor in touched {
            self.recompiles.mark(&mut self.frame, neighbor);
        }
        self.recompiles.mark(&mut self.frame, slot);
    }

    /// The block at an absolute world position, or VOID outside the
    /// window.
    pub fn block_at(&self, world_pos: IVec3) -> Block {
        let fpos = self.frame.world_to_frame(world_pos);
        if Frame::in_bounds(fpos) {
            self.frame.block_at(fpos)
        } else {
            block::VOID
        }
    }

    /// Writes a block and refreshes exposure around it. Affected chunks
    /// (the block's own, plus face neighbors when the block sits on a
    /// chunk boundary) are queued for recompilation. Returns false for
    /// positions outside the window.
    pub fn set_block(&mut self, world_pos: IVec3, value: Block) -> bool {
        let fpos = self.frame.world_to_frame(world_pos);
        if !Frame::in_bounds(fpos) {
            return false;
        }
        self.frame.set_block(fpos, value);

        let mut slots: SmallVec<[ChunkSlot; 4]> = SmallVec::new();
        slots.push(Frame::slot_of(fpos));
        for face in FACES {
            let npos = fpos + face.offset();
            if Frame::in_bounds(npos) && !slots.contains(&Frame::slot_of(npos)) {
                slots.push(Frame::slot_of(npos));
            }
        }
        for slot in slots {
            let touched = compute_exposure(&mut self.frame, slot);
            self.recompiles.mark(&mut self.frame, slot);
            for neighbor in touched {
                self.recompiles.mark(&mut self.frame, neighbor);
            }
        }
        true
    }

    /// Slides the window by whole chunks; entering regions are queued for
    /// reload and stream in over subsequent ticks.
    pub fn pan(&mut self, delta: IVec3) {
        let stale = self.frame.pan(delta);
        debug!("pan by {delta}: {} chunks queued for reload", stale.len());
        for slot in stale {
            self.reloads.mark(&mut self.frame, slot);
        }
    }

    pub fn spawn_entity(&mut self, aabb: Aabb) -> EntityId {
        self.frame.entities.spawn(aabb)
    }

    pub fn despawn_entity(&mut self, id: EntityId) -> Option<Aabb> {
        self.frame.entities.despawn(id)
    }

    pub fn relocate_entity(&mut self, id: EntityId, aabb: Aabb) -> bool {
        self.frame.entities.relocate(id, aabb)
    }

    /// Broad-phase query: entities whose indexed regions overlap `aabb`.
    pub fn entities_in(&self, aabb: &Aabb) -> Vec<EntityId> {
        let mut out = Vec::new();
        self.frame.entities.query(aabb, &mut out);
        out
    }

    /// Binds an entity to the block at `world_pos`, raising the block's
    /// has-entity flag.
    pub fn attach_block_entity(&mut self, world_pos: IVec3, id: EntityId) -> bool {
        let fpos = self.frame.world_to_frame(world_pos);
        if !Frame::in_bounds(fpos) {
            return false;
        }
        let local = Frame::local_of(fpos);
        self.frame
            .chunk_mut(Frame::slot_of(fpos))
            .attach_block_entity(local, id);
        true
    }

    pub fn detach_block_entity(&mut self, world_pos: IVec3) -> Option<EntityId> {
        let fpos = self.frame.world_to_frame(world_pos);
        if !Frame::in_bounds(fpos) {
            return None;
        }
        let local = Frame::local_of(fpos);
        self.frame
            .chunk_mut(Frame::slot_of(fpos))
            .detach_block_entity(local)
    }
}
