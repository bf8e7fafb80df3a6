//! The closed error taxonomy returned by every `recman` operation.
//!
//! Each variant carries the stable numeric identity of the original
//! record-manager status code, exposed via [`BtrieveError::code`] so a
//! caller emulating the legacy call surface can return it verbatim.

use thiserror::Error;

/// Errors returned by `recman` operations.
///
/// The variant set is closed: no operation in this crate returns an error
/// outside this enum. Unmappable underlying engine errors surface as
/// [`BtrieveError::IoError`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BtrieveError {
    #[error("unknown operation code")]
    InvalidOperation,
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("handle does not refer to an open store")]
    FileNotOpen,
    #[error("keyed query produced no row")]
    KeyValueNotFound,
    #[error("insert/update violates a unique key")]
    DuplicateKeyValue,
    #[error("key number {0} out of range")]
    InvalidKeyNumber(u16),
    #[error("step past the first/last row")]
    InvalidPositioning,
    #[error("next/previous past either end")]
    EndOfFile,
    #[error("update attempts to change a non-modifiable key")]
    NonModifiableKeyValue,
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("key buffer smaller than key length (need {need}, got {got})")]
    KeyBufferTooShort { need: usize, got: usize },
    #[error("data buffer smaller than record body (need {need}, got {got})")]
    DataBufferLengthOverrun { need: usize, got: usize },
    #[error("bad record length: {0}")]
    BadRecordLength(String),
    #[error("bad key length: {0}")]
    BadKeyLength(String),
    #[error("not a supported legacy record-manager file: {0}")]
    NotBtrieveFile(String),
    #[error("no record at position {0}")]
    InvalidRecordAddress(u32),
    #[error("ACS required but not supplied, or invalid ACS page")]
    InvalidACS,
    #[error("file already exists: {0}")]
    FileAlreadyExists(String),
}

impl BtrieveError {
    /// The stable numeric status code of this error, matching the legacy
    /// record-manager's status code table.
    pub fn code(&self) -> i32 {
        match self {
            BtrieveError::InvalidOperation => 1,
            BtrieveError::IoError(_) => 2,
            BtrieveError::FileNotOpen => 3,
            BtrieveError::KeyValueNotFound => 4,
            BtrieveError::DuplicateKeyValue => 5,
            BtrieveError::InvalidKeyNumber(_) => 6,
            BtrieveError::InvalidPositioning => 8,
            BtrieveError::EndOfFile => 9,
            BtrieveError::NonModifiableKeyValue => 10,
            BtrieveError::FileNotFound(_) => 12,
            BtrieveError::KeyBufferTooShort { .. } => 21,
            BtrieveError::DataBufferLengthOverrun { .. } => 22,
            BtrieveError::BadRecordLength(_) => 28,
            BtrieveError::BadKeyLength(_) => 29,
            BtrieveError::NotBtrieveFile(_) => 30,
            BtrieveError::InvalidRecordAddress(_) => 43,
            BtrieveError::InvalidACS => 45,
            BtrieveError::FileAlreadyExists(_) => 59,
        }
    }
}

impl From<std::io::Error> for BtrieveError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => BtrieveError::FileNotFound(e.to_string()),
            _ => BtrieveError::IoError(e.to_string()),
        }
    }
}

impl From<rusqlite::Error> for BtrieveError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                BtrieveError::DuplicateKeyValue
            }
            rusqlite::Error::QueryReturnedNoRows => BtrieveError::KeyValueNotFound,
            _ => BtrieveError::IoError(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BtrieveError>;
