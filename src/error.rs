//! Error type shared by every codec and the `ItemIndex` facade.

use thiserror::Error;

/// Errors raised while building, opening or querying an index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// Input handed to a bulk builder violates the strictly ascending contract.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialized bytes do not satisfy a structural invariant of the format.
    #[error("Corrupt data: {0}")]
    CorruptData(String),

    /// Positional access past the end of the set.
    #[error("Position {pos} out of range for index of size {size}")]
    OutOfRange {
        /// Requested position.
        pos: u32,
        /// Number of ids in the index.
        size: u32,
    },

    /// Type tag or discriminant that no codec answers to.
    #[error("Unsupported index type: {0}")]
    UnsupportedType(String),
}

impl IndexError {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        IndexError::CorruptData(msg.into())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, IndexError>;
