//! FLV script tags and AMF0 data messages
//!
//! A script tag body (FLV tag type 18) and an RTMP AMF0 data message share
//! one layout: a String handler name followed by zero or more AMF0 values.
//!
//! ```text
//! +----------------+----------------+-----+
//! | name (String)  | value 1        | ... |
//! +----------------+----------------+-----+
//! ```
//!
//! Encoders publishing over RTMP wrap metadata as
//! `@setDataFrame, "onMetaData", {...}`; FLV files carry `onMetaData, {...}`.

use bytes::{Bytes, BytesMut};

use crate::amf::{Amf0Decoder, Amf0Encoder, AmfValue, Cursor};
use crate::error::{MediaError, Result};

/// Handler name used by publishers to set stream metadata
pub const SCRIPT_SET_DATA_FRAME: &str = "@setDataFrame";

/// Handler name of the metadata script tag
pub const SCRIPT_ON_METADATA: &str = "onMetaData";

/// Empty key plus object end marker, left behind by some muxers
const STRAY_END_MARKER: [u8; 3] = [0x00, 0x00, 0x09];

/// Parsed script tag body
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptData {
    /// Handler name (e.g., "@setDataFrame", "onMetaData")
    pub name: String,
    /// Data values
    pub values: Vec<AmfValue>,
}

impl ScriptData {
    pub fn new(name: impl Into<String>, values: Vec<AmfValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Parse a script tag body
    ///
    /// Some muxers append a stray object end marker (`00 00 09`) after the
    /// last value; exactly that trailer is skipped. Any other truncated or
    /// malformed value fails the whole parse.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let decoder = Amf0Decoder::new();
        let mut cursor = Cursor::new();

        let name = match decoder.decode(data, &mut cursor)? {
            AmfValue::String(s) => s,
            other => {
                return Err(MediaError::InvalidScriptData(format!(
                    "handler name is {:?}, expected a string",
                    other.marker()
                ))
                .into())
            }
        };

        let mut values = Vec::new();
        while cursor.offset < data.len() {
            if data[cursor.offset..] == STRAY_END_MARKER {
                tracing::debug!(
                    name = %name,
                    offset = cursor.offset,
                    "Ignoring stray end marker after script data"
                );
                break;
            }
            values.push(decoder.decode(data, &mut cursor)?);
        }

        Ok(Self { name, values })
    }

    /// Encode to a script tag body
    pub fn encode(&self) -> Result<Bytes> {
        let encoder = Amf0Encoder::new();
        let mut buf = BytesMut::new();
        let mut cursor = Cursor::new();
        encoder.encode(&mut buf, &AmfValue::String(self.name.clone()), &mut cursor)?;
        encoder.encode_all(&mut buf, &self.values, &mut cursor)?;
        Ok(buf.freeze())
    }

    /// Metadata value, looking past the `@setDataFrame` wrapper
    pub fn metadata(&self) -> Option<&AmfValue> {
        match self.name.as_str() {
            SCRIPT_ON_METADATA => self.values.first(),
            SCRIPT_SET_DATA_FRAME => match self.values.first() {
                Some(AmfValue::String(name)) if name == SCRIPT_ON_METADATA => self.values.get(1),
                _ => None,
            },
            _ => None,
        }
    }

    /// Well-known `onMetaData` fields, if this tag carries metadata
    pub fn stream_metadata(&self) -> Option<StreamMetadata> {
        StreamMetadata::from_value(self.metadata()?)
    }
}

/// Well-known `onMetaData` properties
///
/// Absent or mistyped properties are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamMetadata {
    /// Duration in seconds (0 for live streams)
    pub duration: Option<f64>,
    /// Video width
    pub width: Option<u32>,
    /// Video height
    pub height: Option<u32>,
    /// Video framerate
    pub framerate: Option<f64>,
    /// Video codec ID (FLV codec id or FOURCC as a number)
    pub video_codec_id: Option<u32>,
    /// Video bitrate in kbps
    pub video_data_rate: Option<f64>,
    /// Audio codec ID
    pub audio_codec_id: Option<u32>,
    /// Audio bitrate in kbps
    pub audio_data_rate: Option<f64>,
    /// Audio sample rate in Hz
    pub audio_sample_rate: Option<u32>,
    /// Audio sample size in bits
    pub audio_sample_size: Option<u32>,
    /// Stereo audio
    pub stereo: Option<bool>,
    /// Encoder name
    pub encoder: Option<String>,
    /// File size in bytes
    pub file_size: Option<f64>,
}

impl StreamMetadata {
    /// Read fields from an object or ECMA array; `None` for other values
    pub fn from_value(value: &AmfValue) -> Option<Self> {
        if !matches!(value, AmfValue::Object(_) | AmfValue::EcmaArray(_)) {
            return None;
        }
        let int = |key: &str| {
            value
                .get_number(key)
                .filter(|n| n.is_finite() && *n >= 0.0 && *n <= u32::MAX as f64)
                .map(|n| n as u32)
        };

        Some(Self {
            duration: value.get_number("duration"),
            width: int("width"),
            height: int("height"),
            framerate: value.get_number("framerate"),
            video_codec_id: int("videocodecid"),
            video_data_rate: value.get_number("videodatarate"),
            audio_codec_id: int("audiocodecid"),
            audio_data_rate: value.get_number("audiodatarate"),
            audio_sample_rate: int("audiosamplerate"),
            audio_sample_size: int("audiosamplesize"),
            stereo: value.get_bool("stereo"),
            encoder: value.get_string("encoder"),
            file_size: value.get_number("filesize"),
        })
    }
}
