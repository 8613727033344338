//! Error type shared by every fallible operation in the library.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VisionError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VisionError {
    #[error("cannot build a color sample from {0} channels (expected 3 or 4)")]
    ChannelCount(usize),

    #[error("buffer holds {actual} bytes but a {width}x{height} grid needs {expected}")]
    BufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("invalid configuration value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("row {y} is outside a grid of height {height}")]
    RowOutOfBounds { y: u32, height: u32 },

    #[error("worker pool is not accepting tasks: {0}")]
    WorkerUnavailable(&'static str),
}
