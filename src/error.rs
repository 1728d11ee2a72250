//! Unified error types for amf-rs

use std::fmt;

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for all codec operations
#[derive(Debug)]
pub enum Error {
    /// AMF encoding/decoding error
    Amf(AmfError),
    /// Script data (FLV/RTMP metadata) error
    Media(MediaError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Amf(e) => write!(f, "AMF error: {}", e),
            Error::Media(e) => write!(f, "Media error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Amf(e) => Some(e),
            Error::Media(e) => Some(e),
        }
    }
}

impl From<AmfError> for Error {
    fn from(err: AmfError) -> Self {
        Error::Amf(err)
    }
}

impl From<MediaError> for Error {
    fn from(err: MediaError) -> Self {
        Error::Media(err)
    }
}

/// AMF encoding/decoding errors
///
/// Every variant is terminal for the top-level call that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum AmfError {
    /// Unknown or unimplemented type marker
    MalformedTag(u8),
    /// Object body not closed by the empty-key/object-end pair, or an
    /// object-end marker where no terminator was expected
    ProtocolViolation(&'static str),
    /// Reference index outside the table built so far
    ReferenceOutOfRange { index: u16, len: usize },
    /// Value cannot be written with the requested or inferred marker
    UnrepresentableValue(String),
    /// Read past the end of the buffer
    UnexpectedEof { offset: usize, needed: usize },
    /// String bytes are not valid UTF-8
    InvalidUtf8 { offset: usize },
    /// Composite nesting exceeds the configured depth
    NestingTooDeep,
}

impl fmt::Display for AmfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmfError::MalformedTag(m) => write!(f, "Unknown AMF marker: 0x{:02x}", m),
            AmfError::ProtocolViolation(msg) => write!(f, "AMF protocol violation: {}", msg),
            AmfError::ReferenceOutOfRange { index, len } => {
                write!(f, "Invalid AMF reference: {} (table has {} entries)", index, len)
            }
            AmfError::UnrepresentableValue(msg) => write!(f, "Unrepresentable AMF value: {}", msg),
            AmfError::UnexpectedEof { offset, needed } => {
                write!(f, "Unexpected end of AMF data: needed {} bytes at offset {}", needed, offset)
            }
            AmfError::InvalidUtf8 { offset } => {
                write!(f, "Invalid UTF-8 in AMF string at offset {}", offset)
            }
            AmfError::NestingTooDeep => write!(f, "AMF nesting too deep"),
        }
    }
}

impl std::error::Error for AmfError {}

/// Script data errors
#[derive(Debug, Clone, PartialEq)]
pub enum MediaError {
    /// Script tag body does not start with a string handler name
    InvalidScriptData(String),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::InvalidScriptData(msg) => write!(f, "Invalid script data: {}", msg),
        }
    }
}

impl std::error::Error for MediaError {}
