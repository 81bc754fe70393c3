//! Mesh compilation: exposure masks to vertex/index buffers.
//!
//! A counting pass sizes both layers before any vertex is written, so the
//! buffers are reserved exactly once; emission then walks exposed blocks
//! and re-checks occlusion against live neighbor values, because block
//! edits can land between an exposure pass and the recompile that services
//! it.

use bytemuck::{Pod, Zeroable};
use glam::UVec3;
use itertools::iproduct;
use log::trace;

use crate::error::Error;
use crate::world::block::Block;
use crate::world::chunk::CHUNK_SIZE;
use crate::world::face::{Face, FACES, UV_CORNERS};
use crate::world::frame::{ChunkSlot, Frame};

/// Block-texture atlas extent, in cells per row/column.
pub const ATLAS_WIDTH: u16 = 32;
pub const ATLAS_HEIGHT: u16 = 32;

/// Offset into a block's four atlas cells (top, front, sides, bottom) for
/// each face code; the IN/OUT pseudo-faces reuse the sides cell.
const FACE_TC_OFFSET: [u16; 8] = [0, 1, 2, 3, 3, 3, 3, 3];

/// One corner of a block face, ready for GPU upload as plain bytes.
/// Positions are chunk-local; the renderer offsets whole chunks.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [i16; 3],
    pub normal: [i16; 3],
    pub uv: [i16; 2],
}

/// A compiled vertex/index buffer pair for one translucency layer of one
/// chunk. Indices describe two triangles per face; two of each face's four
/// corners are referenced twice rather than duplicated.
#[derive(Debug, Clone, Default)]
pub struct MeshBuffer {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshBuffer {
    /// A buffer sized for `blocks` fully-exposed blocks: 24 vertices and
    /// 36 indices each. Reserved exactly, up front; the only recoverable
    /// failure in the compile path.
    fn for_block_count(blocks: usize) -> Result<Self, Error> {
        let vertex_count = blocks * 24;
        let mut vertices = Vec::new();
        vertices
            .try_reserve_exact(vertex_count)
            .map_err(|source| Error::MeshAllocation {
                vertices: vertex_count,
                source,
            })?;
        let mut indices = Vec::new();
        indices
            .try_reserve_exact(blocks * 36)
            .map_err(|source| Error::MeshAllocation {
                vertices: vertex_count,
                source,
            })?;
        Ok(Self { vertices, indices })
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn face_count(&self) -> usize {
        self.indices.len() / 6
    }

    fn push_face(&mut self, local: UVec3, face: Face, block: Block) {
        let base = self.vertices.len() as u32;
        let normal = face.normal();

        let tex_face = block.rotated_face(face as u8);
        let cell = ((block.id() as u16) << 2) + FACE_TC_OFFSET[tex_face as usize];
        let s = (cell % ATLAS_WIDTH) as i16;
        let t = ((cell / ATLAS_WIDTH) % ATLAS_HEIGHT) as i16;

        for (corner, uv) in face.corners().iter().zip(UV_CORNERS) {
            self.vertices.push(Vertex {
                position: [
                    local.x as i16 + corner[0],
                    local.y as i16 + corner[1],
                    local.z as i16 + corner[2],
                ],
                normal,
                uv: [s + uv[0], t + uv[1]],
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// True when the neighbor fully occludes a face of `here` right now,
/// regardless of the cached exposure bit. Out-of-window neighbors read as
/// VOID and never occlude.
fn occludes(here: Block, neighbor: Block) -> bool {
    !neighbor.is_void()
        && (neighbor.is_opaque() || (here.is_translucent() && here.shares_translucency(neighbor)))
}

/// Rebuilds both mesh layers of a chunk from its exposure masks. A chunk
/// with no exposed visible blocks skips compilation and just clears its
/// buffers.
pub fn compile_chunk(frame: &mut Frame, slot: ChunkSlot) -> Result<(), Error> {
    let chunk = frame.chunk(slot);
    let mut opaque_blocks = 0usize;
    let mut translucent_blocks = 0usize;
    for (z, y, x) in iproduct!(0..CHUNK_SIZE, 0..CHUNK_SIZE, 0..CHUNK_SIZE) {
        let local = UVec3::new(x, y, z);
        let block = chunk.block(local);
        if block.is_invisible() || chunk.exposure(local).is_empty() {
            continue;
        }
        if block.is_translucent() {
            translucent_blocks += 1;
        } else {
            opaque_blocks += 1;
        }
    }

    if opaque_blocks == 0 && translucent_blocks == 0 {
        let chunk = frame.chunk_mut(slot);
        chunk.opaque.clear();
        chunk.translucent.clear();
        return Ok(());
    }

    let mut opaque = MeshBuffer::for_block_count(opaque_blocks)?;
    let mut translucent = MeshBuffer::for_block_count(translucent_blocks)?;

    let origin = Frame::slot_origin(slot);
    for (z, y, x) in iproduct!(0..CHUNK_SIZE, 0..CHUNK_SIZE, 0..CHUNK_SIZE) {
        let local = UVec3::new(x, y, z);
        let block = chunk.block(local);
        let mask = chunk.exposure(local);
        if block.is_invisible() || mask.is_empty() {
            continue;
        }
        let target = if block.is_translucent() {
            &mut translucent
        } else {
            &mut opaque
        };
        for face in FACES {
            if !mask.contains(face.mask()) {
                continue;
            }
            let neighbor = frame.neighbor_block(origin + local.as_ivec3(), face);
            if occludes(block, neighbor) {
                continue;
            }
            target.push_face(local, face, block);
        }
    }
    trace!(
        "compiled chunk {:?}: {} opaque faces, {} translucent faces",
        slot,
        opaque.face_count(),
        translucent.face_count()
    );

    let chunk = frame.chunk_mut(slot);
    chunk.opaque = opaque;
    chunk.translucent = translucent;
    Ok(())
}
