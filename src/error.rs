//! Error types for metafile decoding and replay
//!
//! Decode errors mean "this is not a usable metafile" and abort the whole
//! parse. Replay errors mean "the metafile is well formed but references an
//! object or saved state that does not exist"; they abort one replay call and
//! leave the parsed picture untouched.

use thiserror::Error;

/// Errors raised while turning a byte stream into a [`crate::Picture`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("not a windows metafile (offset {offset}): {reason}")]
    InvalidHeader { offset: usize, reason: String },

    #[error("truncated stream at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    TruncatedStream {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("invalid record size at offset {offset}: {size_words} words")]
    InvalidRecordSize { offset: usize, size_words: u32 },

    #[error("invalid field at offset {offset}: {reason}")]
    InvalidField { offset: usize, reason: String },
}

/// Abort signal raised by a [`crate::Canvas`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("canvas aborted: {message}")]
pub struct CanvasError {
    pub message: String,
}

impl CanvasError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What went wrong while replaying a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayErrorKind {
    #[error("handle table exhausted (capacity {capacity})")]
    HandleTableExhausted { capacity: usize },

    #[error("invalid object handle {handle}")]
    InvalidHandle { handle: u16 },

    #[error("cannot restore saved state {requested} with stack depth {depth}")]
    RestoreUnderflow { requested: i16, depth: usize },

    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// A replay failure, tagged with the index of the offending record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("replay failed at record {record_index}: {kind}")]
pub struct ReplayError {
    pub record_index: usize,
    pub kind: ReplayErrorKind,
}

impl ReplayError {
    pub fn new(record_index: usize, kind: ReplayErrorKind) -> Self {
        Self { record_index, kind }
    }
}

/// Umbrella error for the conversion helpers.
#[derive(Error, Debug)]
pub enum WmfError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("replay error: {0}")]
    Replay(#[from] ReplayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(String),
}

impl From<image::ImageError> for WmfError {
    fn from(err: image::ImageError) -> Self {
        WmfError::Image(err.to_string())
    }
}

/// Result type alias for decode operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type alias for replay operations
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Result type alias for canvas calls
pub type CanvasResult = Result<(), CanvasError>;

/// Result type alias for conversion helpers
pub type WmfResult<T> = Result<T, WmfError>;

#[cfg(feature = "python")]
impl From<WmfError> for pyo3::PyErr {
    fn from(err: WmfError) -> Self {
        match err {
            WmfError::Io(e) => pyo3::PyErr::new::<pyo3::exceptions::PyIOError, _>(e.to_string()),
            other => pyo3::PyErr::new::<pyo3::exceptions::PyValueError, _>(other.to_string()),
        }
    }
}
