use thiserror::Error;

/// Error kinds the load/save pipelines distinguish.
///
/// Every fallible operation in this crate returns a `NemoError`; the first
/// error raised anywhere in a pipeline phase aborts that pipeline (see
/// `pipeline::load` / `pipeline::save`).
#[derive(Error, Debug)]
pub enum NemoError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid signature: expected \"Nemo Fi\\0\"")]
    InvalidSignature,

    #[error("unsupported file version {0} (expected 2..=9)")]
    UnsupportedVersion(u32),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("unexpected end of stream: {0}")]
    Eof(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("compression error: {0}")]
    CompressionError(String),

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid pipeline state: {0}")]
    InvalidState(String),

    #[error("validation failed for class {class_id:#x}: {message}")]
    ValidationFailed {
        class_id: u32,
        message: String,
        #[source]
        source: Option<Box<NemoError>>,
    },

    #[error("missing required plugin: category {category} guid {guid:?}")]
    MissingPlugin { category: u32, guid: crate::guid::Guid },
}

pub type Result<T> = std::result::Result<T, NemoError>;

impl NemoError {
    pub fn validation(class_id: u32, message: impl Into<String>) -> Self {
        NemoError::ValidationFailed {
            class_id,
            message: message.into(),
            source: None,
        }
    }

    pub fn validation_with_source(
        class_id: u32,
        message: impl Into<String>,
        source: NemoError,
    ) -> Self {
        NemoError::ValidationFailed {
            class_id,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
