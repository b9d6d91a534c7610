//! Error types for Info-ZIP operations

use crate::status::{UnzipStatus, ZipStatus};

/// Result type for Info-ZIP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Info-ZIP operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Empty archive name, empty mask list, or a string the engine cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine library could not be loaded or lacks an entry point
    #[error("Native library {library} unavailable: {reason}")]
    LibraryUnavailable {
        /// Path or file name that was tried
        library: String,
        /// Loader error message
        reason: String,
    },

    /// `ZpInit` rejected the callback table
    #[error("Zip engine initialization failed")]
    InitializationFailed,

    /// The zip engine reported a failure status
    #[error("Zip engine error (code {code}): {0}", code = .0.code())]
    Zip(ZipStatus),

    /// The unzip engine reported a failure status
    #[error("Unzip engine error (code {code}): {0}", code = .0.code())]
    Unzip(UnzipStatus),

    /// The engine or this crate could not allocate memory for the result
    #[error("Memory allocation failed")]
    MemoryAllocation,

    /// Text has no single-byte representation, or a password does not fit the engine's buffer
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

impl Error {
    /// Native status code carried by this error, if any
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::Zip(status) => Some(status.code()),
            Error::Unzip(status) => Some(status.code()),
            _ => None,
        }
    }

    /// Translate a zip engine return code into a Result
    pub(crate) fn from_zip_code(code: i32) -> Result<()> {
        match ZipStatus::from_code(code) {
            ZipStatus::Ok => Ok(()),
            status => Err(Error::Zip(status)),
        }
    }

    /// Convert a non-success unzip status into an error
    pub(crate) fn from_unzip_status(status: UnzipStatus) -> Result<()> {
        match status {
            UnzipStatus::Ok => Ok(()),
            status if status.is_memory_error() => Err(Error::MemoryAllocation),
            status => Err(Error::Unzip(status)),
        }
    }
}
