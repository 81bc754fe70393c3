//! The sliding world window: an 8x8x8 ring of chunks plus the entity index.
//!
//! Three coordinate spaces meet here. *World* positions are signed and
//! unbounded. *Frame* positions are signed block coordinates relative to
//! the window center, valid in `-HALF_FRAME..HALF_FRAME` per axis. *Slot*
//! indices are unsigned chunk-grid coordinates in `0..FRAME_SIZE`. All
//! conversions are mask-and-shift; the extents are powers of two.

use glam::{IVec3, UVec3};

use cobble_util::RingGrid3;

use crate::world::block::{self, Block};
use crate::world::chunk::{Chunk, CHUNK_BITS, CHUNK_MASK, CHUNK_SIZE};
use crate::world::entity::EntityStore;
use crate::world::face::Face;

pub const FRAME_BITS: u32 = 3;
/// Chunks per frame axis.
pub const FRAME_SIZE: u32 = 1 << FRAME_BITS;
/// Blocks per frame axis.
pub const FULL_FRAME: u32 = CHUNK_SIZE * FRAME_SIZE;
pub const HALF_FRAME: i32 = (FULL_FRAME / 2) as i32;

/// Logical chunk-grid coordinates of one of the frame's 512 chunk slots.
/// Slots name window positions, not chunks: after a pan the same slot
/// addresses whichever chunk now occupies that place in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkSlot(pub UVec3);

pub struct Frame {
    chunks: RingGrid3<Chunk>,
    /// World chunk coordinates of slot (0, 0, 0), the window's minimum
    /// corner.
    region_offset: IVec3,
    pub entities: EntityStore,
}

impl Frame {
    pub fn new(region_offset: IVec3) -> Self {
        Self {
            chunks: RingGrid3::new(FRAME_SIZE, |slot| {
                Chunk::new(region_offset + slot.as_ivec3())
            }),
            region_offset,
            entities: EntityStore::new(FULL_FRAME),
        }
    }

    pub fn region_offset(&self) -> IVec3 {
        self.region_offset
    }

    pub fn chunk(&self, slot: ChunkSlot) -> &Chunk {
        self.chunks.get(slot.0)
    }

    pub fn chunk_mut(&mut self, slot: ChunkSlot) -> &mut Chunk {
        self.chunks.get_mut(slot.0)
    }

    pub fn slots() -> impl Iterator<Item = ChunkSlot> {
        (0..FRAME_SIZE).flat_map(|z| {
            (0..FRAME_SIZE).flat_map(move |y| {
                (0..FRAME_SIZE).map(move |x| ChunkSlot(UVec3::new(x, y, z)))
            })
        })
    }

    /// The absolute region a chunk in `slot` is expected to hold.
    pub fn slot_region(&self, slot: ChunkSlot) -> IVec3 {
        self.region_offset + slot.0.as_ivec3()
    }

    /// Whether a frame position lies inside the window proper. Positions
    /// outside still address storage (they alias after masking); this is
    /// the true signed bound the neighbor helpers test first.
    pub fn in_bounds(fpos: IVec3) -> bool {
        fpos.cmpge(IVec3::splat(-HALF_FRAME)).all() && fpos.cmplt(IVec3::splat(HALF_FRAME)).all()
    }

    /// Unsigned window coordinates of a frame position, masked into range.
    fn array_pos(fpos: IVec3) -> UVec3 {
        let shifted = fpos + IVec3::splat(HALF_FRAME);
        UVec3::new(
            shifted.x as u32 & (FULL_FRAME - 1),
            shifted.y as u32 & (FULL_FRAME - 1),
            shifted.z as u32 & (FULL_FRAME - 1),
        )
    }

    /// Chunk slot holding a frame position.
    pub fn slot_of(fpos: IVec3) -> ChunkSlot {
        ChunkSlot(Self::array_pos(fpos) >> CHUNK_BITS)
    }

    /// Chunk-local coordinates of a frame position.
    pub fn local_of(fpos: IVec3) -> UVec3 {
        Self::array_pos(fpos) & UVec3::splat(CHUNK_MASK)
    }

    /// Minimum-corner frame position of a slot; adding a chunk-local
    /// offset recovers the block's frame position.
    pub fn slot_origin(slot: ChunkSlot) -> IVec3 {
        (slot.0 << CHUNK_BITS).as_ivec3() - IVec3::splat(HALF_FRAME)
    }

    pub fn frame_to_world(&self, fpos: IVec3) -> IVec3 {
        self.region_offset * CHUNK_SIZE as i32 + fpos + IVec3::splat(HALF_FRAME)
    }

    pub fn world_to_frame(&self, world: IVec3) -> IVec3 {
        world - self.region_offset * CHUNK_SIZE as i32 - IVec3::splat(HALF_FRAME)
    }

    /// Block at a frame position. Tolerates positions one step outside the
    /// window: they alias into the backing array after masking, never
    /// fault. Callers needing the true boundary semantics use
    /// [`Frame::neighbor_block`].
    pub fn block_at(&self, fpos: IVec3) -> Block {
        self.chunk(Self::slot_of(fpos)).block(Self::local_of(fpos))
    }

    /// Writes a block without touching dirty state; exposure and recompile
    /// bookkeeping live in the world layer.
    pub fn set_block(&mut self, fpos: IVec3, value: Block) {
        let local = Self::local_of(fpos);
        self.chunk_mut(Self::slot_of(fpos)).set_block(local, value);
    }

    /// The block across `face` from `fpos`, or VOID when that position
    /// falls outside the window bound.
    pub fn neighbor_block(&self, fpos: IVec3, face: Face) -> Block {
        let npos = fpos + face.offset();
        if Self::in_bounds(npos) {
            self.block_at(npos)
        } else {
            block::VOID
        }
    }

    /// Slides the window by `delta` chunks. Chunks whose stored region no
    /// longer matches their slot's expected region are stale; they are
    /// retargeted in place and their slots returned. Queueing the reloads
    /// is the caller's job; the frame does not touch dirty bits.
    pub fn pan(&mut self, delta: IVec3) -> Vec<ChunkSlot> {
        self.region_offset += delta;
        self.chunks.shift(delta);

        let mut stale = Vec::new();
        for slot in Self::slots() {
            let expected = self.slot_region(slot);
            let chunk = self.chunk_mut(slot);
            if chunk.rpos() != expected {
                chunk.retarget(expected);
                stale.push(slot);
            }
        }
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{ivec3, uvec3};

    #[test]
    fn slot_and_local_round_trip_over_the_window() {
        for z in -HALF_FRAME..HALF_FRAME {
            for x in [-HALF_FRAME, -1, 0, 7, HALF_FRAME - 1] {
                let fpos = ivec3(x, 5, z);
                let slot = Frame::slot_of(fpos);
                let local = Frame::local_of(fpos);
                assert_eq!(
                    Frame::slot_origin(slot) + local.as_ivec3(),
                    fpos,
                    "round trip failed at {fpos}"
                );
            }
        }
    }

    #[test]
    fn set_block_then_block_at_is_identity() {
        let mut frame = Frame::new(IVec3::ZERO);
        let positions = [
            ivec3(0, 0, 0),
            ivec3(-HALF_FRAME, -HALF_FRAME, -HALF_FRAME),
            ivec3(HALF_FRAME - 1, HALF_FRAME - 1, HALF_FRAME - 1),
            ivec3(7, -8, 15),
        ];
        for (i, &fpos) in positions.iter().enumerate() {
            let value = block::Block(0x4100 + i as u16);
            frame.set_block(fpos, value);
            assert_eq!(frame.block_at(fpos), value);
        }
    }

    #[test]
    fn out_of_window_positions_alias_instead_of_faulting() {
        let mut frame = Frame::new(IVec3::ZERO);
        // One step past the top edge wraps to the bottom slab.
        frame.set_block(ivec3(0, 0, HALF_FRAME), block::STONE);
        assert_eq!(frame.block_at(ivec3(0, 0, -HALF_FRAME)), block::STONE);
    }

    #[test]
    fn neighbor_reads_return_void_past_the_window_bound() {
        let mut frame = Frame::new(IVec3::ZERO);
        let top = ivec3(0, 0, HALF_FRAME - 1);
        frame.set_block(top, block::STONE);
        frame.set_block(ivec3(0, 0, -HALF_FRAME), block::STONE);

        assert_eq!(frame.neighbor_block(top, Face::Up), block::VOID);
        assert_eq!(
            frame.neighbor_block(ivec3(0, 0, -HALF_FRAME), Face::Down),
            block::VOID
        );
        assert_eq!(
            frame.neighbor_block(ivec3(0, 0, -HALF_FRAME + 1), Face::Down),
            block::STONE
        );
    }

    #[test]
    fn world_and_frame_coordinates_invert() {
        let frame = Frame::new(ivec3(3, -2, 0));
        for fpos in [ivec3(0, 0, 0), ivec3(-32, 17, -5)] {
            assert_eq!(frame.world_to_frame(frame.frame_to_world(fpos)), fpos);
        }
        // region_offset (-4,-4,-4) centers the window on the origin.
        let centered = Frame::new(IVec3::splat(-4));
        assert_eq!(centered.frame_to_world(ivec3(1, 2, 3)), ivec3(1, 2, 3));
    }

    #[test]
    fn pan_flags_exactly_the_entering_slabs() {
        let mut frame = Frame::new(IVec3::ZERO);
        let stale = frame.pan(ivec3(1, 0, 0));

        // One slab of 8x8 chunks enters along +x.
        assert_eq!(stale.len(), (FRAME_SIZE * FRAME_SIZE) as usize);
        for slot in &stale {
            assert_eq!(slot.0.x, FRAME_SIZE - 1);
            assert_eq!(frame.chunk(*slot).rpos(), frame.slot_region(*slot));
        }

        // Surviving chunks keep their region assignment.
        let kept = ChunkSlot(uvec3(0, 3, 3));
        assert_eq!(frame.chunk(kept).rpos(), frame.slot_region(kept));
    }

    #[test]
    fn pan_round_trip_leaves_no_stale_chunks_after_reload_marks() {
        let mut frame = Frame::new(IVec3::ZERO);
        frame.pan(ivec3(0, 2, 0));
        // Panning back re-exposes the original chunks; the slots that left
        // and returned still hold their matching regions.
        let stale = frame.pan(ivec3(0, -2, 0));
        assert_eq!(stale.len(), 2 * (FRAME_SIZE * FRAME_SIZE) as usize);
    }
}
