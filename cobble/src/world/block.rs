//! 16-bit packed block values.
//!
//! The high byte is the type ID, the low byte carries flags and a 3-bit
//! data field. Type IDs are assigned in contiguous ranges so that all the
//! classification predicates reduce to integer comparisons against the
//! `limits` constants; adding a block type means picking a slot consistent
//! with those ranges.

/// Dynamic flag: any face of this block is exposed.
pub const BF_EXPOSED: u16 = 1 << 7;
/// Reserved for future use.
pub const BF_RESERVED: u16 = 1 << 6;
/// Generic on/off state.
pub const BF_ON_OFF: u16 = 1 << 5;
/// Static flag: the data field holds an orientation.
pub const BF_ORIENTABLE: u16 = 1 << 4;
/// Static flag: a block entity is attached.
pub const BF_HAS_ENTITY: u16 = 1 << 3;

/// Mask for the 3-bit data field (orientation / face / liquid flow).
pub const BR_DATA: u16 = 0x0007;
/// Mask for the type ID byte.
pub const BR_ID: u16 = 0xff00;

pub mod limits {
    //! Classification boundaries. Together the five ranges tile the whole
    //! 16-bit space; the low byte never matters because every boundary sits
    //! on an ID edge.

    /// The last invisible block.
    pub const MAX_INVISIBLE: u16 = 0x02ff;
    /// The last translucent liquid block.
    pub const MAX_T_LIQUID: u16 = 0x3cff;
    /// The first opaque liquid block.
    pub const MIN_O_LIQUID: u16 = 0x3d00;
    /// The first solid block.
    pub const MIN_SOLID: u16 = 0x4000;
    /// The first translucent solid block.
    pub const MIN_TRANSLUCENT: u16 = 0xff00;
}

/// Block orientation / face codes stored in the data field.
pub mod data {
    pub const ORI_UP: u8 = 0x0;
    pub const ORI_DOWN: u8 = 0x1;
    pub const ORI_NORTH: u8 = 0x2;
    pub const ORI_SOUTH: u8 = 0x3;
    pub const ORI_EAST: u8 = 0x4;
    pub const ORI_WEST: u8 = 0x5;
    pub const ORI_IN: u8 = 0x6;
    pub const ORI_OUT: u8 = 0x7;
}

/// Maps `[facing][nominal face]` to the actual face after rotation.
/// Identity when facing north; the IN/OUT pseudo-faces never rotate.
pub const ROTATE_FACE: [[u8; 8]; 8] = [
    // Facing up:
    [2, 3, 1, 0, 4, 5, 6, 7],
    // Facing down:
    [3, 2, 0, 1, 4, 5, 6, 7],
    // Facing north (identity):
    [0, 1, 2, 3, 4, 5, 6, 7],
    // Facing south:
    [0, 1, 3, 2, 5, 4, 6, 7],
    // Facing east:
    [0, 1, 5, 4, 2, 3, 6, 7],
    // Facing west:
    [0, 1, 4, 5, 3, 2, 6, 7],
    // Facing in:
    [0, 1, 2, 3, 4, 5, 6, 7],
    // Facing out:
    [0, 1, 2, 3, 4, 5, 6, 7],
];

/// A single voxel cell's packed type + flags + data value. Any `u16` is
/// structurally valid; unregistered IDs simply classify by range.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Block(pub u16);

// Invisible blocks:
pub const VOID: Block = Block(0x0000);
pub const AIR: Block = Block(0x0100);
pub const ETHER: Block = Block(0x0200);

// Translucent liquids (still/flowing pairs share an even/odd ID pair):
pub const WATER: Block = Block(0x0400);
pub const WATER_FLOW: Block = Block(0x0500);

// Opaque liquids:
pub const QUICKSAND: Block = Block(0x3d00);
pub const LAVA: Block = Block(0x3e00);
pub const LAVA_FLOW: Block = Block(0x3f00);

// Opaque solids:
pub const BOUNDARY: Block = Block(0x4000);
pub const STONE: Block = Block(0x4100);
pub const DIRT: Block = Block(0x4200);
pub const GRASS: Block = Block(0x4300);
pub const SAND: Block = Block(0x4400);

// Translucent solids:
pub const GLASS: Block = Block(0xff00);

/// The five disjoint classification ranges over the type-ID byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Invisible,
    TranslucentLiquid,
    OpaqueLiquid,
    SolidOpaque,
    SolidTranslucent,
}

impl Block {
    pub const fn id(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn from_id(id: u8) -> Self {
        Block((id as u16) << 8)
    }

    pub const fn data(self) -> u8 {
        (self.0 & BR_DATA) as u8
    }

    pub const fn with_data(self, value: u8) -> Self {
        Block((self.0 & !BR_DATA) | (value as u16 & BR_DATA))
    }

    pub const fn is_exposed(self) -> bool {
        self.0 & BF_EXPOSED != 0
    }

    pub const fn set_exposed(self, exposed: bool) -> Self {
        if exposed {
            Block(self.0 | BF_EXPOSED)
        } else {
            Block(self.0 & !BF_EXPOSED)
        }
    }

    pub const fn is_orientable(self) -> bool {
        self.0 & BF_ORIENTABLE != 0
    }

    pub const fn has_entity(self) -> bool {
        self.0 & BF_HAS_ENTITY != 0
    }

    pub const fn is_void(self) -> bool {
        self.0 & BR_ID == VOID.0
    }

    pub const fn is_invisible(self) -> bool {
        self.0 <= limits::MAX_INVISIBLE
    }

    pub const fn is_translucent_liquid(self) -> bool {
        self.0 > limits::MAX_INVISIBLE && self.0 <= limits::MAX_T_LIQUID
    }

    pub const fn is_opaque_liquid(self) -> bool {
        self.0 >= limits::MIN_O_LIQUID && self.0 < limits::MIN_SOLID
    }

    pub const fn is_liquid(self) -> bool {
        self.is_translucent_liquid() || self.is_opaque_liquid()
    }

    pub const fn is_solid(self) -> bool {
        self.0 >= limits::MIN_SOLID
    }

    pub const fn is_translucent(self) -> bool {
        self.is_translucent_liquid() || self.0 >= limits::MIN_TRANSLUCENT
    }

    pub const fn is_opaque(self) -> bool {
        self.0 >= limits::MIN_O_LIQUID && self.0 < limits::MIN_TRANSLUCENT
    }

    /// Whether two blocks render as one visual volume (e.g. still and
    /// flowing water). Type IDs are compared after forcing the low ID bit,
    /// pairing each even ID with its odd successor.
    pub const fn shares_translucency(self, other: Block) -> bool {
        (self.id() | 1) == (other.id() | 1)
    }

    /// The actual face occupying `nominal_face` (a `data::ORI_*` code)
    /// given this block's orientation; non-orientable blocks pass through.
    pub fn rotated_face(self, nominal_face: u8) -> u8 {
        if self.is_orientable() {
            ROTATE_FACE[self.data() as usize][nominal_face as usize]
        } else {
            nominal_face
        }
    }

    pub fn classify(self) -> Class {
        if self.is_invisible() {
            Class::Invisible
        } else if self.is_translucent_liquid() {
            Class::TranslucentLiquid
        } else if self.is_opaque_liquid() {
            Class::OpaqueLiquid
        } else if self.0 < limits::MIN_TRANSLUCENT {
            Class::SolidOpaque
        } else {
            Class::SolidTranslucent
        }
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Block({:#06x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every 16-bit value falls in exactly one classification range once
    /// the flag/data byte is masked out.
    #[test]
    fn classification_ranges_partition_the_id_space() {
        for id in 0..=u8::MAX {
            let b = Block::from_id(id);
            let memberships = [
                b.is_invisible(),
                b.is_translucent_liquid(),
                b.is_opaque_liquid(),
                b.is_solid() && !b.is_translucent(),
                b.is_solid() && b.is_translucent(),
            ];
            assert_eq!(
                memberships.iter().filter(|&&m| m).count(),
                1,
                "id {id:#04x} must be in exactly one class"
            );
        }
    }

    #[test]
    fn flags_do_not_disturb_classification() {
        for b in [AIR, WATER, LAVA, STONE, GLASS] {
            let flagged = Block(b.0 | BF_EXPOSED | BF_ON_OFF | BR_DATA);
            assert_eq!(b.classify(), flagged.classify());
        }
    }

    #[test]
    fn registered_blocks_classify_as_named() {
        assert_eq!(VOID.classify(), Class::Invisible);
        assert_eq!(AIR.classify(), Class::Invisible);
        assert_eq!(ETHER.classify(), Class::Invisible);
        assert_eq!(WATER.classify(), Class::TranslucentLiquid);
        assert_eq!(WATER_FLOW.classify(), Class::TranslucentLiquid);
        assert_eq!(QUICKSAND.classify(), Class::OpaqueLiquid);
        assert_eq!(LAVA.classify(), Class::OpaqueLiquid);
        assert_eq!(STONE.classify(), Class::SolidOpaque);
        assert_eq!(GLASS.classify(), Class::SolidTranslucent);

        assert!(WATER.is_liquid() && !WATER.is_opaque());
        assert!(LAVA.is_liquid() && LAVA.is_opaque());
        assert!(STONE.is_solid() && STONE.is_opaque());
        assert!(GLASS.is_solid() && GLASS.is_translucent());
        assert!(!AIR.is_opaque() && !AIR.is_solid());
    }

    #[test]
    fn translucency_grouping_pairs_even_with_odd_successor() {
        for id in 0..=u8::MAX {
            let b = Block::from_id(id);
            assert!(b.shares_translucency(b));
        }
        for k in 0..128u8 {
            let even = Block::from_id(2 * k);
            let odd = Block::from_id(2 * k + 1);
            assert!(even.shares_translucency(odd));
            assert!(odd.shares_translucency(even));
            if k < 127 {
                let next_even = Block::from_id(2 * k + 2);
                assert!(!odd.shares_translucency(next_even));
            }
        }
        assert!(WATER.shares_translucency(WATER_FLOW));
        assert!(LAVA.shares_translucency(LAVA_FLOW));
        assert!(!WATER.shares_translucency(LAVA));
    }

    #[test]
    fn exposed_flag_round_trips_without_touching_the_id() {
        let b = STONE.set_exposed(true);
        assert!(b.is_exposed());
        assert_eq!(b.id(), STONE.id());
        assert!(!b.set_exposed(false).is_exposed());
    }

    #[test]
    fn rotation_is_identity_when_facing_north() {
        for face in 0..8 {
            assert_eq!(ROTATE_FACE[data::ORI_NORTH as usize][face as usize], face);
        }
    }

    #[test]
    fn in_and_out_faces_never_rotate() {
        for facing in 0..8usize {
            assert_eq!(ROTATE_FACE[facing][data::ORI_IN as usize], data::ORI_IN);
            assert_eq!(ROTATE_FACE[facing][data::ORI_OUT as usize], data::ORI_OUT);
        }
    }

    #[test]
    fn rotation_only_applies_to_orientable_blocks() {
        let plain = STONE.with_data(data::ORI_DOWN);
        assert_eq!(plain.rotated_face(data::ORI_UP), data::ORI_UP);

        let oriented = Block(STONE.0 | BF_ORIENTABLE).with_data(data::ORI_DOWN);
        // Facing down, the nominal top face shows the block's back.
        assert_eq!(oriented.rotated_face(data::ORI_UP), data::ORI_SOUTH);
    }
}
