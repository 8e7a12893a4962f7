//! CPU-side meshes, materials and textures, and their GPU counterparts

mod material;
mod mesh;
mod texture;

pub use material::*;
pub use mesh::*;
pub use texture::*;
