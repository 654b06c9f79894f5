/// Errors from building or querying a schema model.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("redefined type '{name}'")]
    DuplicateType { name: String },

    #[error("duplicate field '{field_name}' in type '{type_name}'")]
    DuplicateField {
        type_name: String,
        field_name: String,
    },

    #[error("type '{type_name}' has {count} fields; the maximum is 127")]
    TooManyFields { type_name: String, count: usize },

    #[error("undefined type '{type_name}' referenced by '{referenced_by}'")]
    UndefinedType {
        type_name: String,
        referenced_by: String,
    },

    #[error("invalid name '{0}'")]
    InvalidName(String),

    #[error("unknown field '{field_name}' in type '{type_name}'")]
    UnknownField {
        type_name: String,
        field_name: String,
    },

    #[error("kind mismatch for field '{field}': expected {expected}, got {actual}")]
    KindMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("unknown type '{0}'")]
    UnknownType(String),
}

/// Coarse classification shared by encode and decode failures.
///
/// Lets callers tell "give me a bigger buffer" from "this is not valid data
/// for this schema" from "the data itself exceeds policy" without matching on
/// every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The destination buffer is too small.
    Capacity,
    /// The source buffer ended before a complete record was read.
    Underflow,
    /// A size or count exceeds the configured [`Limits`](crate::limits::Limits).
    LimitExceeded,
    /// A header byte matches no remaining field and is not the sentinel.
    SchemaMismatch,
    /// Anything else that makes the value or data unusable.
    InvalidData,
}

/// Errors from the binary encoder.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("buffer overflow: need {needed} bytes, have {capacity}")]
    BufferOverflow { needed: usize, capacity: usize },

    #[error("serial exceeds {max} bytes")]
    SerialSizeExceeded { max: usize },

    #[error("field '{field}' size {size} exceeds {max} bytes")]
    FieldSizeExceeded {
        field: String,
        size: usize,
        max: usize,
    },

    #[error("field '{field}' length {len} exceeds {max} elements")]
    ListLengthExceeded {
        field: String,
        len: usize,
        max: usize,
    },

    #[error("type mismatch for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("record type mismatch: expected '{expected}', got '{actual}'")]
    RecordTypeMismatch { expected: String, actual: String },

    #[error("records nested deeper than {max} levels")]
    DepthExceeded { max: usize },

    #[error("type '{type_name}' does not belong to the codec's schema")]
    ForeignType { type_name: String },
}

impl EncodeError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EncodeError::BufferOverflow { .. } => ErrorKind::Capacity,
            EncodeError::SerialSizeExceeded { .. }
            | EncodeError::FieldSizeExceeded { .. }
            | EncodeError::ListLengthExceeded { .. }
            | EncodeError::DepthExceeded { .. } => ErrorKind::LimitExceeded,
            EncodeError::TypeMismatch { .. }
            | EncodeError::RecordTypeMismatch { .. }
            | EncodeError::ForeignType { .. } => ErrorKind::InvalidData,
        }
    }
}

/// Errors from the binary decoder.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("buffer underflow: need {needed} bytes, have {available}")]
    Underflow { needed: usize, available: usize },

    #[error("serial exceeds {max} bytes")]
    SerialSizeExceeded { max: usize },

    #[error("field '{field}' size {size} exceeds {max} bytes")]
    FieldSizeExceeded {
        field: String,
        size: usize,
        max: usize,
    },

    #[error("field '{field}' length {len} exceeds {max} elements")]
    ListLengthExceeded {
        field: String,
        len: usize,
        max: usize,
    },

    #[error("unknown header 0x{header:02x} at byte {offset}")]
    UnknownHeader { header: u8, offset: usize },

    #[error("invalid utf-8 string in field '{field}': {source}")]
    InvalidUtf8 {
        field: String,
        source: std::str::Utf8Error,
    },

    #[error("data continuation at byte {offset} of {len}")]
    TrailingData { offset: usize, len: usize },

    #[error("records nested deeper than {max} levels at byte {offset}")]
    DepthExceeded { max: usize, offset: usize },

    #[error("type '{type_name}' does not belong to the codec's schema")]
    ForeignType { type_name: String },
}

impl DecodeError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::Underflow { .. } => ErrorKind::Underflow,
            DecodeError::SerialSizeExceeded { .. }
            | DecodeError::FieldSizeExceeded { .. }
            | DecodeError::ListLengthExceeded { .. }
            | DecodeError::DepthExceeded { .. } => ErrorKind::LimitExceeded,
            DecodeError::UnknownHeader { .. } => ErrorKind::SchemaMismatch,
            DecodeError::InvalidUtf8 { .. }
            | DecodeError::TrailingData { .. }
            | DecodeError::ForeignType { .. } => ErrorKind::InvalidData,
        }
    }
}

/// Top-level error type that wraps all sub-errors.
#[derive(Debug, thiserror::Error)]
pub enum ColferError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ColferError {
    /// Returns the coarse classification, or `None` for schema errors.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ColferError::Schema(_) => None,
            ColferError::Encode(e) => Some(e.kind()),
            ColferError::Decode(e) => Some(e.kind()),
        }
    }
}

/// Result type alias for colfer operations.
pub type Result<T> = std::result::Result<T, ColferError>;
