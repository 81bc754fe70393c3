use bitflags::bitflags;
use glam::{IVec3, UVec3};

use crate::world::block::{self, Block, BF_HAS_ENTITY};
use crate::world::entity::EntityId;
use crate::world::face::FaceMask;
use crate::world::mesher::MeshBuffer;

pub const CHUNK_BITS: u32 = 3;
pub const CHUNK_SIZE: u32 = 1 << CHUNK_BITS;
pub const CHUNK_MASK: u32 = CHUNK_SIZE - 1;
pub const CHUNK_VOLUME: usize = 1 << (3 * CHUNK_BITS);

bitflags! {
    /// Dirty-state word. The two bits are independent: a chunk can need a
    /// reload (terrain stale) and a recompile (mesh stale) at once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChunkFlags: u8 {
        const NEEDS_RELOAD = 1 << 0;
        const NEEDS_RECOMPILE = 1 << 1;
    }
}

/// Linearizes a chunk-local position. Mask+shift only; callers guarantee
/// each component is below `CHUNK_SIZE` (debug-asserted).
pub fn block_index(local: UVec3) -> usize {
    debug_assert!(local.max_element() < CHUNK_SIZE, "local {local} out of chunk");
    (local.x | local.y << CHUNK_BITS | local.z << (2 * CHUNK_BITS)) as usize
}

/// An 8x8x8 cell of the world window: block values, their per-face exposure
/// masks, the two compiled mesh layers and the dirty-state word.
///
/// Chunks are allocated once per frame slot and live as long as the frame;
/// panning the window reassigns a slot's region position and reloads it in
/// place rather than replacing the chunk.
pub struct Chunk {
    blocks: Box<[Block; CHUNK_VOLUME]>,
    exposure: Box<[FaceMask; CHUNK_VOLUME]>,
    flags: ChunkFlags,
    rpos: IVec3,
    pub opaque: MeshBuffer,
    pub translucent: MeshBuffer,
    block_entities: Vec<(UVec3, EntityId)>,
}

impl Chunk {
    /// A void-filled chunk destined for region `rpos`. The world queues it
    /// for reload; dirty bits track queue membership and are set only by
    /// the marking path.
    pub fn new(rpos: IVec3) -> Self {
        Self {
            blocks: Box::new([block::VOID; CHUNK_VOLUME]),
            exposure: Box::new([FaceMask::empty(); CHUNK_VOLUME]),
            flags: ChunkFlags::empty(),
            rpos,
            opaque: MeshBuffer::default(),
            translucent: MeshBuffer::default(),
            block_entities: Vec::new(),
        }
    }

    /// The absolute region position this chunk's contents belong to. When
    /// the window pans this may disagree with the slot the chunk sits in,
    /// which is exactly the staleness test.
    pub fn rpos(&self) -> IVec3 {
        self.rpos
    }

    /// Retargets the chunk at a new region. Old blocks stay readable until
    /// the caller queues and services the reload.
    pub fn retarget(&mut self, rpos: IVec3) {
        self.rpos = rpos;
    }

    pub fn flags(&self) -> ChunkFlags {
        self.flags
    }

    pub fn set_flag(&mut self, flag: ChunkFlags) {
        self.flags |= flag;
    }

    pub fn clear_flag(&mut self, flag: ChunkFlags) {
        self.flags &= !flag;
    }

    pub fn block(&self, local: UVec3) -> Block {
        self.blocks[block_index(local)]
    }

    pub fn set_block(&mut self, local: UVec3, block: Block) {
        self.blocks[block_index(local)] = block;
    }

    pub fn exposure(&self, local: UVec3) -> FaceMask {
        self.exposure[block_index(local)]
    }

    /// Stores a block's exposed-face mask and keeps the block's summary
    /// exposed flag in sync ("any face exposed").
    pub fn set_exposure(&mut self, local: UVec3, mask: FaceMask) {
        let index = block_index(local);
        self.exposure[index] = mask;
        self.blocks[index] = self.blocks[index].set_exposed(!mask.is_empty());
    }

    /// Regenerates every block from `source` and resets the exposure masks;
    /// the caller recomputes exposure afterwards.
    pub fn fill_blocks(&mut self, mut source: impl FnMut(UVec3) -> Block) {
        for (index, slot) in self.blocks.iter_mut().enumerate() {
            let index = index as u32;
            let local = UVec3::new(
                index & CHUNK_MASK,
                index >> CHUNK_BITS & CHUNK_MASK,
                index >> (2 * CHUNK_BITS) & CHUNK_MASK,
            );
            *slot = source(local);
        }
        self.exposure.fill(FaceMask::empty());
    }

    pub fn block_entity(&self, local: UVec3) -> Option<EntityId> {
        self.block_entities
            .iter()
            .find(|(pos, _)| *pos == local)
            .map(|&(_, id)| id)
    }

    /// Attaches an entity handle to a block and raises its has-entity flag.
    /// Replaces any previous attachment at that position.
    pub fn attach_block_entity(&mut self, local: UVec3, id: EntityId) {
        self.detach_block_entity(local);
        let index = block_index(local);
        self.blocks[index] = Block(self.blocks[index].0 | BF_HAS_ENTITY);
        self.block_entities.push((local, id));
    }

    pub fn detach_block_entity(&mut self, local: UVec3) -> Option<EntityId> {
        let slot = self.block_entities.iter().position(|(pos, _)| *pos == local)?;
        let (_, id) = self.block_entities.swap_remove(slot);
        let index = block_index(local);
        self.blocks[index] = Block(self.blocks[index].0 & !BF_HAS_ENTITY);
        Some(id)
    }

    /// Entity handles attached to blocks of this chunk. Cleared on reload
    /// by the world, not by the chunk itself.
    pub fn block_entities(&self) -> &[(UVec3, EntityId)] {
        &self.block_entities
    }

    pub fn clear_block_entities(&mut self) {
        self.block_entities.clear();
    }
}
