//! Crate-level error types

use thiserror::Error;

use crate::backend::BackendError;
use crate::config::ConfigError;

/// A tag was registered twice, in the scene graph or the surface registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("tag {tag:?} is already registered")]
pub struct DuplicateTagError {
    pub tag: String,
}

/// Top-level error for mounting and running the stage
#[derive(Error, Debug)]
pub enum EngineError {
    /// No 3D context could be created; the stage cannot run at all
    #[error("Failed to initialize: {0}")]
    Initialization(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Registry(#[from] DuplicateTagError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type EngineResult<T> = Result<T, EngineError>;
