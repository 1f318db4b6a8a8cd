//! Error types for Layerpack operations

/// Broad failure classes every [`CodecError`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Magic bytes or revision mismatch; detected before any further parsing
    Format,
    /// A marker, index, or declared length disagrees with the data
    Integrity,
    /// No registered handler claims a type id, or none can save a picture
    UnsupportedType,
    /// A layer handler moved the stream position backwards or not at all
    HandlerContract,
    /// The in-memory picture cannot be represented in the format
    InvalidInput,
    /// Underlying stream failure, including truncation
    Io,
}

/// Errors that can occur while saving or loading a container
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// Magic bytes do not identify a Layerpack container
    #[error("Invalid magic bytes: expected LP, got {0:02x?}")]
    BadMagic([u8; 2]),

    /// Revision byte is not the one this build understands
    #[error("Unsupported format revision: {0}")]
    UnsupportedRevision(u8),

    /// Layer record does not start with the layer marker
    #[error("Invalid layer marker for layer {index}: got {found:#010x}")]
    BadLayerMarker {
        /// Position of the record in the layer sequence.
        index: u32,
        /// The value found where the marker was expected.
        found: i32,
    },

    /// Layer record carries the wrong sequence index
    #[error("Layer index mismatch: expected {expected}, got {found}")]
    LayerIndexMismatch {
        /// The expected position.
        expected: u32,
        /// The index stored in the record.
        found: i32,
    },

    /// Property block does not start with the property marker
    #[error("Invalid property marker: got {0:#010x}")]
    BadPropertyMarker(i32),

    /// Property block length is below the floor or above the configured limit
    #[error("Implausible property block length: {0}")]
    ImplausiblePropertyBlock(i32),

    /// Name length does not account for the rest of the property block
    #[error("Name length mismatch: block leaves {expected} bytes, name claims {actual}")]
    NameLengthMismatch {
        /// Bytes left in the block after the fixed fields.
        expected: i64,
        /// Declared name length.
        actual: i32,
    },

    /// Layer name is not valid UTF-8
    #[error("Layer name is not valid UTF-8")]
    InvalidName,

    /// A header field that must be non-negative is negative
    #[error("Negative header field {field}: {value}")]
    NegativeHeaderField {
        /// Name of the field.
        field: &'static str,
        /// The decoded value.
        value: i32,
    },

    /// A decoded count exceeds the configured limit
    #[error("{what} {value} exceeds limit {limit}")]
    LimitExceeded {
        /// What was being counted.
        what: &'static str,
        /// The decoded value.
        value: u64,
        /// The configured maximum.
        limit: u64,
    },

    /// An offset table entry is out of order or out of bounds
    #[error("Invalid offset for layer {index}: {offset}")]
    InvalidOffset {
        /// Position of the layer whose span could not be computed.
        index: u32,
        /// The offending offset.
        offset: i64,
    },

    /// A record did not end where the offset table says it does
    #[error("Record length mismatch for layer {index}: expected end {expected}, got {actual}")]
    RecordLengthMismatch {
        /// Position of the layer.
        index: u32,
        /// End position computed from the offset table.
        expected: u64,
        /// Actual stream position after decoding.
        actual: u64,
    },

    /// Checksum mismatch inside a handler body
    #[error("Checksum mismatch: expected {expected:x}, got {actual:x}")]
    ChecksumMismatch {
        /// The stored checksum.
        expected: u32,
        /// The checksum computed over the data read.
        actual: u32,
    },

    /// A handler body is internally inconsistent
    #[error("Invalid layer body: {0}")]
    InvalidBody(String),

    /// No container handler claims the type id found in the header
    #[error("Unsupported container type: {0}")]
    UnsupportedContainerType(i32),

    /// No layer handler claims the type id found in a record
    #[error("Unsupported layer type: {0}")]
    UnsupportedLayerType(i32),

    /// No container handler can save this picture under the requested extension
    #[error("No save handler for extension {requested:?} (tried: {tried:?})")]
    NoSaveHandler {
        /// Extension of the target path, if any.
        requested: Option<String>,
        /// Extensions declared by the handlers that were consulted.
        tried: Vec<String>,
    },

    /// No layer handler accepts the content of a layer
    #[error("No layer encoder for layer {0}")]
    NoLayerEncoder(u32),

    /// A layer handler left the stream at or before its start, or behind the safe position
    #[error(
        "Handler contract violation on layer {index}: started at {start}, ended at {end}, safe position {safe}"
    )]
    HandlerContractViolation {
        /// Position of the layer being written.
        index: u32,
        /// Stream position before the handler ran.
        start: u64,
        /// Stream position after the handler returned.
        end: u64,
        /// Last position known to hold completely written data.
        safe: u64,
    },

    /// The picture cannot be represented in the format
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error during read/write
    #[error("IO error: {0}")]
    Io(String),
}

impl CodecError {
    /// Failure class of this error
    pub fn class(&self) -> ErrorClass {
        match self {
            CodecError::BadMagic(_) | CodecError::UnsupportedRevision(_) => ErrorClass::Format,
            CodecError::BadLayerMarker { .. }
            | CodecError::LayerIndexMismatch { .. }
            | CodecError::BadPropertyMarker(_)
            | CodecError::ImplausiblePropertyBlock(_)
            | CodecError::NameLengthMismatch { .. }
            | CodecError::InvalidName
            | CodecError::NegativeHeaderField { .. }
            | CodecError::LimitExceeded { .. }
            | CodecError::InvalidOffset { .. }
            | CodecError::RecordLengthMismatch { .. }
            | CodecError::ChecksumMismatch { .. }
            | CodecError::InvalidBody(_) => ErrorClass::Integrity,
            CodecError::UnsupportedContainerType(_)
            | CodecError::UnsupportedLayerType(_)
            | CodecError::NoSaveHandler { .. }
            | CodecError::NoLayerEncoder(_) => ErrorClass::UnsupportedType,
            CodecError::HandlerContractViolation { .. } => ErrorClass::HandlerContract,
            CodecError::InvalidInput(_) => ErrorClass::InvalidInput,
            CodecError::Io(_) => ErrorClass::Io,
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes() {
        assert_eq!(CodecError::BadMagic([0, 0]).class(), ErrorClass::Format);
        assert_eq!(CodecError::UnsupportedRevision(9).class(), ErrorClass::Format);
        assert_eq!(CodecError::BadPropertyMarker(0).class(), ErrorClass::Integrity);
        assert_eq!(
            CodecError::UnsupportedLayerType(42).class(),
            ErrorClass::UnsupportedType
        );
        assert_eq!(
            CodecError::HandlerContractViolation {
                index: 0,
                start: 10,
                end: 10,
                safe: 10
            }
            .class(),
            ErrorClass::HandlerContract
        );
    }

    #[test]
    fn test_io_conversion() {
        let err: CodecError =
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read").into();
        assert_eq!(err.class(), ErrorClass::Io);
        assert!(err.to_string().contains("short read"));
    }

    #[test]
    fn test_no_save_handler_lists_extensions() {
        let err = CodecError::NoSaveHandler {
            requested: Some("png".into()),
            tried: vec!["lpk".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("png"));
        assert!(msg.contains("lpk"));
    }
}
