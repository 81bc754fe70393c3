use bitflags::bitflags;
use glam::IVec3;

use crate::world::block;

/// One of the six cube faces. The discriminants match the orientation
/// codes a block stores in its data field, so [`block::ROTATE_FACE`]
/// lookups and face iteration use the same numbering.
///
/// Axes: +z is up, +y is north, +x is east.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Face {
    Up = 0,
    Down = 1,
    North = 2,
    South = 3,
    East = 4,
    West = 5,
}

pub const FACES: [Face; 6] = [
    Face::Up,
    Face::Down,
    Face::North,
    Face::South,
    Face::East,
    Face::West,
];

impl Face {
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn opposite(self) -> Face {
        match self {
            Face::Up => Face::Down,
            Face::Down => Face::Up,
            Face::North => Face::South,
            Face::South => Face::North,
            Face::East => Face::West,
            Face::West => Face::East,
        }
    }

    /// Unit step towards the neighbor across this face.
    pub const fn offset(self) -> IVec3 {
        match self {
            Face::Up => IVec3::new(0, 0, 1),
            Face::Down => IVec3::new(0, 0, -1),
            Face::North => IVec3::new(0, 1, 0),
            Face::South => IVec3::new(0, -1, 0),
            Face::East => IVec3::new(1, 0, 0),
            Face::West => IVec3::new(-1, 0, 0),
        }
    }

    pub const fn normal(self) -> [i16; 3] {
        match self {
            Face::Up => [0, 0, 1],
            Face::Down => [0, 0, -1],
            Face::North => [0, 1, 0],
            Face::South => [0, -1, 0],
            Face::East => [1, 0, 0],
            Face::West => [-1, 0, 0],
        }
    }

    /// Unit-cube corner offsets of this face in emission order
    /// (bottom-left, top-left, top-right, bottom-right as seen from
    /// outside the block), giving counter-clockwise winding for an
    /// outward-facing triangle pair.
    pub const fn corners(self) -> [[i16; 3]; 4] {
        match self {
            Face::Up => [[0, 0, 1], [0, 1, 1], [1, 1, 1], [1, 0, 1]],
            Face::Down => [[1, 0, 0], [1, 1, 0], [0, 1, 0], [0, 0, 0]],
            Face::North => [[1, 1, 0], [1, 1, 1], [0, 1, 1], [0, 1, 0]],
            Face::South => [[0, 0, 0], [0, 0, 1], [1, 0, 1], [1, 0, 0]],
            Face::East => [[1, 0, 0], [1, 0, 1], [1, 1, 1], [1, 1, 0]],
            Face::West => [[0, 1, 0], [0, 1, 1], [0, 0, 1], [0, 0, 0]],
        }
    }

    pub const fn mask(self) -> FaceMask {
        FaceMask::from_bits_truncate(1 << self as u8)
    }

    /// Converts an orientation code back to a face. The IN/OUT pseudo-faces
    /// (6 and 7) and anything larger have no cube face.
    pub const fn from_data(code: u8) -> Option<Face> {
        match code {
            block::data::ORI_UP => Some(Face::Up),
            block::data::ORI_DOWN => Some(Face::Down),
            block::data::ORI_NORTH => Some(Face::North),
            block::data::ORI_SOUTH => Some(Face::South),
            block::data::ORI_EAST => Some(Face::East),
            block::data::ORI_WEST => Some(Face::West),
            _ => None,
        }
    }
}

/// Texture-cell corner offsets matching [`Face::corners`] order.
pub const UV_CORNERS: [[i16; 2]; 4] = [[0, 1], [0, 0], [1, 0], [1, 1]];

bitflags! {
    /// Per-block exposure, one bit per face, indexed by [`Face`]
    /// discriminant.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FaceMask: u8 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
        const NORTH = 1 << 2;
        const SOUTH = 1 << 3;
        const EAST = 1 << 4;
        const WEST = 1 << 5;
    }
}
