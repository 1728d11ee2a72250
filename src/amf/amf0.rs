//! AMF0 convenience functions
//!
//! AMF0 is the original Action Message Format used in Flash/RTMP and in FLV
//! script tags.
//! Reference: AMF0 File Format Specification (amf0-file-format-specification.pdf)
//!
//! Type Markers:
//! ```text
//! 0x00 - Number (IEEE 754 double)
//! 0x01 - Boolean
//! 0x02 - String (UTF-8, 16-bit length prefix)
//! 0x03 - Object (key-value pairs until 0x000009)
//! 0x04 - MovieClip (reserved, not supported)
//! 0x05 - Null
//! 0x06 - Undefined
//! 0x07 - Reference (16-bit index)
//! 0x08 - ECMA Array (32-bit count hint + object body)
//! 0x09 - Object End (0x000009 sequence)
//! 0x0A - Strict Array (32-bit count + values)
//! 0x0B - Date (double + timezone)
//! 0x0C - Long String (not supported)
//! 0x0D - Unsupported (not supported)
//! 0x0E - RecordSet (reserved, not supported)
//! 0x0F - XML Document (not supported)
//! 0x10 - Typed Object (class name + object body)
//! 0x11 - AVM+ (switch to AMF3, not supported)
//! ```

use bytes::{Bytes, BytesMut};

use super::cursor::Cursor;
use super::decoder::Amf0Decoder;
use super::encoder::Amf0Encoder;
use super::value::AmfValue;
use crate::error::AmfError;

/// Convenience function to encode a single value
pub fn encode(value: &AmfValue) -> Result<Bytes, AmfError> {
    Amf0Encoder::new().to_bytes(value)
}

/// Convenience function to encode multiple values
pub fn encode_all(values: &[AmfValue]) -> Result<Bytes, AmfError> {
    let mut buf = BytesMut::new();
    Amf0Encoder::new().encode_all(&mut buf, values, &mut Cursor::new())?;
    Ok(buf.freeze())
}

/// Convenience function to decode a single value at the start of `data`
pub fn decode(data: &[u8]) -> Result<AmfValue, AmfError> {
    Amf0Decoder::new().decode(data, &mut Cursor::new())
}

/// Convenience function to decode all values
pub fn decode_all(data: &[u8]) -> Result<Vec<AmfValue>, AmfError> {
    Amf0Decoder::new().decode_all(data, &mut Cursor::new())
}
