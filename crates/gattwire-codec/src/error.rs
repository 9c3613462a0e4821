use crate::codec::DroppedField;

/// Errors that can occur while building schemas or converting values.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Two fields in one schema share a name.
    #[error("duplicate field '{field}' in schema {schema}")]
    DuplicateField { schema: String, field: String },

    /// A field range is reversed, too long for a packet, or the wrong width
    /// for its kind.
    #[error("invalid range {start}..={end} for field '{field}'")]
    InvalidRange {
        field: String,
        start: usize,
        end: usize,
    },

    /// A schema or value document could not be parsed.
    #[error("invalid document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    /// A value does not fit the declared field kind.
    #[error("invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Input is not a valid hex string.
    #[error("invalid hex input: {0}")]
    InvalidHex(String),

    /// Strict encoding refused a lossy result.
    #[error("encoding {schema} dropped {} field(s): {}", .dropped.len(), describe_dropped(.dropped))]
    Incomplete {
        schema: String,
        dropped: Vec<DroppedField>,
    },
}

fn describe_dropped(dropped: &[DroppedField]) -> String {
    dropped
        .iter()
        .map(|d| format!("{} ({})", d.name, d.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, CodecError>;
