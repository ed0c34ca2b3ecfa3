//! Pipeline error types.

use std::fmt;

use crate::buffer::BufferError;
use crate::extent::ExtentError;
use crate::fetch::FetchError;
use crate::mbtiles::StoreError;
use crate::renderer::RendererError;

/// Step of the pipeline that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extent,
    Buffer,
    Fetch,
    Package,
    Render,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extent => "extent",
            Stage::Buffer => "buffer",
            Stage::Fetch => "fetch",
            Stage::Package => "package",
            Stage::Render => "render",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying cause of a pipeline failure.
#[derive(Debug)]
pub enum StageError {
    Extent(ExtentError),
    /// Input parsed fine but holds no feature to map
    EmptyExtent,
    /// Stage needs a setting that was never given
    NotConfigured(&'static str),
    Buffer(BufferError),
    Fetch(FetchError),
    Store(StoreError),
    Renderer(RendererError),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::Extent(e) => write!(f, "{}", e),
            StageError::EmptyExtent => write!(f, "Input contains no features"),
            StageError::NotConfigured(what) => write!(f, "{} is not configured", what),
            StageError::Buffer(e) => write!(f, "{}", e),
            StageError::Fetch(e) => write!(f, "{}", e),
            StageError::Store(e) => write!(f, "{}", e),
            StageError::Renderer(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StageError::Extent(e) => Some(e),
            StageError::EmptyExtent | StageError::NotConfigured(_) => None,
            StageError::Buffer(e) => Some(e),
            StageError::Fetch(e) => Some(e),
            StageError::Store(e) => Some(e),
            StageError::Renderer(e) => Some(e),
        }
    }
}

/// A failure tagged with the stage it happened in.
#[derive(Debug)]
pub struct PipelineError {
    pub stage: Stage,
    pub cause: StageError,
}

impl PipelineError {
    pub fn new(stage: Stage, cause: impl Into<StageError>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.cause)
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

impl From<ExtentError> for StageError {
    fn from(e: ExtentError) -> Self {
        StageError::Extent(e)
    }
}

impl From<BufferError> for StageError {
    fn from(e: BufferError) -> Self {
        StageError::Buffer(e)
    }
}

impl From<FetchError> for StageError {
    fn from(e: FetchError) -> Self {
        StageError::Fetch(e)
    }
}

impl From<StoreError> for StageError {
    fn from(e: StoreError) -> Self {
        StageError::Store(e)
    }
}

impl From<RendererError> for StageError {
    fn from(e: RendererError) -> Self {
        StageError::Renderer(e)
    }
}
