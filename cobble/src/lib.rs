//! A chunked voxel-world core: block storage, procedural loading, face
//! exposure tracking and mesh compilation over a sliding world window.
//!
//! The crate stops at compiled vertex/index buffers; window management,
//! rendering and physics integration are consumers, not residents.

pub mod error;
pub mod world;

pub use error::Error;
pub use world::block::Block;
pub use world::face::{Face, FaceMask};
pub use world::frame::{ChunkSlot, Frame};
pub use world::generator::{NoiseTerrain, TerrainSource};
pub use world::mesher::{MeshBuffer, Vertex};
pub use world::World;
