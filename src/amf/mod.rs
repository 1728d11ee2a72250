//! AMF (Action Message Format) implementation
//!
//! AMF is Adobe's binary serialization format used in RTMP for encoding
//! command parameters and in FLV files for stream metadata. This module
//! implements AMF0. The AMF3 escape marker (0x11) is recognised but its
//! payload is not decoded.

pub mod amf0;
pub(crate) mod buffer;
pub mod cursor;
pub mod decoder;
pub mod encoder;
pub mod marker;
pub(crate) mod references;
pub mod value;

pub use amf0::{decode, decode_all, encode, encode_all};
pub use cursor::Cursor;
pub use decoder::Amf0Decoder;
pub use encoder::Amf0Encoder;
pub use marker::Marker;
pub use value::{AmfObject, AmfValue, ArrayKey, ArrayRef, EcmaArray, EcmaArrayRef, ObjectRef};
