//! Per-block face-exposure computation.
//!
//! Exposure is a pairwise relation, so recomputing one chunk can change
//! blocks in its six face neighbors. Cross-block writes are batched into a
//! pending list during a read-only scan and applied afterwards; the caller
//! gets back the neighbor slots whose exposure actually changed and is
//! responsible for queueing them for recompilation.

use glam::{IVec3, UVec3};
use itertools::iproduct;
use smallvec::SmallVec;

use crate::world::chunk::{block_index, CHUNK_SIZE, CHUNK_VOLUME};
use crate::world::face::{Face, FaceMask, FACES};
use crate::world::frame::{ChunkSlot, Frame};

/// Neighbor chunk slots to queue for recompilation after an exposure pass.
pub type PendingRecompiles = SmallVec<[ChunkSlot; 6]>;

enum Update {
    /// Unconditionally expose the target's face: an invisible block always
    /// reveals whatever borders it.
    Force,
    /// Re-derive the target's face bit from its own occlusion test; only a
    /// changed bit counts as a modification.
    Mirror,
}

struct Pending {
    fpos: IVec3,
    face: Face,
    update: Update,
}

/// Recomputes the 6-bit exposure mask of every block in `slot`.
///
/// Per block `b` and face with neighbor `n` (VOID beyond the window edge):
/// invisible `b` gets no mask bits of its own but force-exposes each
/// in-window neighbor's opposite face; translucent `b` exposes a face iff
/// `n` is not opaque and does not share `b`'s translucency class, mirroring
/// the bit onto cross-chunk neighbors; anything else exposes a face iff `n`
/// is not opaque.
pub fn compute_exposure(frame: &mut Frame, slot: ChunkSlot) -> PendingRecompiles {
    let origin = Frame::slot_origin(slot);
    let mut masks = [FaceMask::empty(); CHUNK_VOLUME];
    let mut pending = Vec::new();

    let chunk = frame.chunk(slot);
    for (z, y, x) in iproduct!(0..CHUNK_SIZE, 0..CHUNK_SIZE, 0..CHUNK_SIZE) {
        let local = UVec3::new(x, y, z);
        let fpos = origin + local.as_ivec3();
        let block = chunk.block(local);

        let mut mask = FaceMask::empty();
        for face in FACES {
            let npos = fpos + face.offset();
            if block.is_invisible() {
                if Frame::in_bounds(npos) {
                    pending.push(Pending {
                        fpos: npos,
                        face: face.opposite(),
                        update: Update::Force,
                    });
                }
                continue;
            }

            let neighbor = frame.neighbor_block(fpos, face);
            let exposed = if block.is_translucent() {
                !neighbor.is_opaque() && !block.shares_translucency(neighbor)
            } else {
                !neighbor.is_opaque()
            };
            mask.set(face.mask(), exposed);

            if block.is_translucent() && Frame::in_bounds(npos) && Frame::slot_of(npos) != slot {
                pending.push(Pending {
                    fpos: npos,
                    face: face.opposite(),
                    update: Update::Mirror,
                });
            }
        }
        masks[block_index(local)] = mask;
    }

    let chunk = frame.chunk_mut(slot);
    for (z, y, x) in iproduct!(0..CHUNK_SIZE, 0..CHUNK_SIZE, 0..CHUNK_SIZE) {
        let local = UVec3::new(x, y, z);
        chunk.set_exposure(local, masks[block_index(local)]);
    }

    let mut touched = PendingRecompiles::new();
    for update in pending {
        if apply(frame, &update) {
            let target = Frame::slot_of(update.fpos);
            if target != slot && !touched.contains(&target) {
                touched.push(target);
            }
        }
    }
    touched
}

/// Applies one batched neighbor update; true when the target's mask changed.
fn apply(frame: &mut Frame, update: &Pending) -> bool {
    let target_slot = Frame::slot_of(update.fpos);
    let local = Frame::local_of(update.fpos);

    let exposed = match update.update {
        Update::Force => true,
        Update::Mirror => {
            let target = frame.block_at(update.fpos);
            if target.is_invisible() {
                // Invisible blocks carry no exposure of their own.
                return false;
            }
            let back = frame.neighbor_block(update.fpos, update.face);
            if target.is_translucent() {
                !back.is_opaque() && !target.shares_translucency(back)
            } else {
                !back.is_opaque()
            }
        }
    };

    let chunk = frame.chunk_mut(target_slot);
    let old = chunk.exposure(local);
    let mut new = old;
    new.set(update.face.mask(), exposed);
    if new != old {
        chunk.set_exposure(local, new);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::block;
    use glam::ivec3;

    fn frame_with(blocks: &[(IVec3, block::Block)]) -> Frame {
        let mut frame = Frame::new(IVec3::ZERO);
        for &(fpos, value) in blocks {
            frame.set_block(fpos, value);
        }
        frame
    }

    #[test]
    fn isolated_solid_block_is_exposed_on_all_six_faces() {
        let mut frame = frame_with(&[(ivec3(2, 2, 2), block::STONE)]);
        let slot = Frame::slot_of(ivec3(2, 2, 2));
        compute_exposure(&mut frame, slot);

        let mask = frame.chunk(slot).exposure(Frame::local_of(ivec3(2, 2, 2)));
        assert_eq!(mask, FaceMask::all());
        assert!(frame.block_at(ivec3(2, 2, 2)).is_exposed());
    }

    #[test]
    fn touching_opaque_faces_are_hidden() {
        let a = ivec3(2, 2, 2);
        let b = ivec3(2, 2, 3);
        let mut frame = frame_with(&[(a, block::STONE), (b, block::DIRT)]);
        let slot = Frame::slot_of(a);
        compute_exposure(&mut frame, slot);

        let chunk = frame.chunk(slot);
        assert!(!chunk.exposure(Frame::local_of(a)).contains(Face::Up.mask()));
        assert!(!chunk.exposure(Frame::local_of(b)).contains(Face::Down.mask()));
        assert!(chunk.exposure(Frame::local_of(a)).contains(Face::Down.mask()));
        assert!(chunk.exposure(Frame::local_of(b)).contains(Face::Up.mask()));
    }

    #[test]
    fn translucency_class_suppresses_internal_liquid_faces() {
        let glass = ivec3(0, 0, 0);
        let still = ivec3(1, 0, 0);
        let flow = ivec3(2, 0, 0);
        let mut frame = frame_with(&[
            (still, block::WATER),
            (flow, block::WATER_FLOW),
            (glass, block::GLASS),
        ]);
        let slot = Frame::slot_of(still);
        compute_exposure(&mut frame, slot);

        let chunk = frame.chunk(slot);
        // Still and flowing water form one volume: no face between them.
        assert!(!chunk.exposure(Frame::local_of(still)).contains(Face::East.mask()));
        assert!(!chunk.exposure(Frame::local_of(flow)).contains(Face::West.mask()));
        // Water against glass is a class boundary: both sides render.
        assert!(chunk.exposure(Frame::local_of(still)).contains(Face::West.mask()));
        assert!(chunk.exposure(Frame::local_of(glass)).contains(Face::East.mask()));
        // Water against air renders.
        assert!(chunk.exposure(Frame::local_of(flow)).contains(Face::East.mask()));
    }

    #[test]
    fn opaque_liquid_occludes_like_a_solid() {
        let water = ivec3(3, 3, 3);
        let lava = ivec3(3, 3, 4);
        let mut frame = frame_with(&[(water, block::WATER), (lava, block::LAVA)]);
        let slot = Frame::slot_of(water);
        compute_exposure(&mut frame, slot);

        let chunk = frame.chunk(slot);
        assert!(!chunk.exposure(Frame::local_of(water)).contains(Face::Up.mask()));
        // Lava against translucent water still renders its underside.
        assert!(chunk.exposure(Frame::local_of(lava)).contains(Face::Down.mask()));
    }

    #[test]
    fn cross_chunk_masks_agree_and_stay_stable() {
        // Adjacent blocks across the x = 8 chunk boundary.
        let west = ivec3(7, 0, 0);
        let east = ivec3(8, 0, 0);
        let mut frame = frame_with(&[(west, block::GLASS), (east, block::WATER)]);
        let slot_w = Frame::slot_of(west);
        let slot_e = Frame::slot_of(east);
        assert_ne!(slot_w, slot_e);

        let touched = compute_exposure(&mut frame, slot_w);
        assert!(touched.contains(&slot_e));
        compute_exposure(&mut frame, slot_e);

        // Class boundary: both sides exposed, from either perspective.
        assert!(frame
            .chunk(slot_w)
            .exposure(Frame::local_of(west))
            .contains(Face::East.mask()));
        assert!(frame
            .chunk(slot_e)
            .exposure(Frame::local_of(east))
            .contains(Face::West.mask()));

        // Recomputing in either order changes nothing further.
        compute_exposure(&mut frame, slot_w);
        compute_exposure(&mut frame, slot_e);
        assert!(frame
            .chunk(slot_w)
            .exposure(Frame::local_of(west))
            .contains(Face::East.mask()));
        assert!(frame
            .chunk(slot_e)
            .exposure(Frame::local_of(east))
            .contains(Face::West.mask()));
    }

    #[test]
    fn invisible_neighbor_chunk_forces_the_boundary_face() {
        // Stone sits at the east edge of its chunk; the neighbor chunk is
        // all air. Running exposure on the air chunk must reveal the
        // stone's east face and report the stone's chunk for recompile.
        let stone = ivec3(7, 0, 0);
        let mut frame = frame_with(&[(stone, block::STONE)]);
        let slot_w = Frame::slot_of(stone);
        let slot_e = Frame::slot_of(ivec3(8, 0, 0));

        let touched = compute_exposure(&mut frame, slot_e);
        assert!(touched.contains(&slot_w));
        assert!(frame
            .chunk(slot_w)
            .exposure(Frame::local_of(stone))
            .contains(Face::East.mask()));
    }

    #[test]
    fn window_edge_suppresses_neighbor_updates_but_exposes_the_face() {
        let top = ivec3(0, 0, 31);
        let mut frame = frame_with(&[(top, block::STONE)]);
        let slot = Frame::slot_of(top);
        compute_exposure(&mut frame, slot);

        // The void above the window counts as not-opaque.
        assert!(frame
            .chunk(slot)
            .exposure(Frame::local_of(top))
            .contains(Face::Up.mask()));
    }
}
