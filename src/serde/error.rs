//! Serde error types for colfer serialization/deserialization.

use std::fmt::Display;

use crate::error::{DecodeError, EncodeError, SchemaError};

/// Error type for serde serialization/deserialization operations.
#[derive(Debug, thiserror::Error)]
pub enum SerdeError {
    /// The Rust value does not fit the schema field kind.
    #[error("type mismatch for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// An integer does not fit the width of the schema field.
    #[error("value {value} out of range for {kind} field '{field}'")]
    OutOfRange {
        field: String,
        kind: &'static str,
        value: i128,
    },

    /// The type is not supported for colfer serialization.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Custom error message.
    #[error("{0}")]
    Custom(String),
}

impl serde::ser::Error for SerdeError {
    fn custom<T: Display>(msg: T) -> Self {
        SerdeError::Custom(msg.to_string())
    }
}

impl serde::de::Error for SerdeError {
    fn custom<T: Display>(msg: T) -> Self {
        SerdeError::Custom(msg.to_string())
    }
}
