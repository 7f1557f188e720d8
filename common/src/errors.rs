//! Module with common error types.

use serde_json::Error as JsonError;
use std::io::Error as IoError;
use thiserror::Error;

/// An error in loading or parsing a truffle network table.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// An IO error occurred when loading a network table from disk.
    #[error("failed to open contract artifact file: {0}")]
    Io(#[from] IoError),

    /// A JSON error occurred while parsing a network table.
    #[error("failed to parse contract artifact JSON: {0}")]
    Json(#[from] JsonError),
}

/// An error parsing a contract interface description.
#[derive(Debug, Error)]
pub enum InterfaceError {
    /// The interface was not valid JSON.
    #[error("failed to parse contract ABI JSON: {0}")]
    Json(#[from] JsonError),

    /// The interface JSON was not an array of entries.
    #[error("contract ABI must be a JSON array of entries")]
    NotAnArray,

    /// An entry of a known type could not be parsed.
    #[error("invalid {kind} entry at index {index}: {source}")]
    InvalidEntry {
        /// The `type` of the offending entry.
        kind: String,
        /// The position of the entry in the ABI.
        index: usize,
        /// The underlying parse error.
        source: JsonError,
    },
}

/// An error reading bytecode string representation.
#[derive(Debug, Error)]
pub enum BytecodeError {
    /// Bytecode string is not an even length.
    #[error("invalid bytecode length")]
    InvalidLength,

    /// Invalid hex digit
    #[error("invalid hex digit '{0}'")]
    InvalidHexDigit(char),

    /// Bytecode still contains library placeholders and cannot be converted
    /// to raw bytes. Analogous to "undefinied symbol" error for traditional
    /// linkers.
    #[error("undefined library {0}")]
    UndefinedLibrary(String),
}

impl From<hex::FromHexError> for BytecodeError {
    fn from(err: hex::FromHexError) -> Self {
        match err {
            hex::FromHexError::InvalidHexCharacter { c, .. } => BytecodeError::InvalidHexDigit(c),
            _ => BytecodeError::InvalidLength,
        }
    }
}
