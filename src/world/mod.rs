//! The rainforest clearing: configuration, scatter placement and scene construction

mod builder;
mod config;
mod placement;

pub use builder::*;
pub use config::*;
pub use placement::*;
