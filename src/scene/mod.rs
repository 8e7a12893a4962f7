//! Scene graph, camera and picking

mod camera;
mod light;
mod node;
mod orbit;
mod ray;
mod rig;
mod transform;

pub use camera::*;
pub use light::*;
pub use node::*;
pub use orbit::*;
pub use ray::*;
pub use rig::*;
pub use transform::*;
