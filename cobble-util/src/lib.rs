pub mod bbox;
pub mod grid;
pub mod octree;

pub use bbox::Aabb;
pub use grid::RingGrid3;
pub use octree::{LeafId, Octree};
