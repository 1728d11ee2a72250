//! amf-rs: AMF0 encoder/decoder
//!
//! This library provides:
//! - Decoding and encoding of every implemented AMF0 type
//! - Shared-instance preservation through the AMF0 reference table
//! - Offset/cursor based reads and writes so several values can be chained
//!   over one buffer
//! - FLV script tag and `onMetaData` helpers
//!
//! # Example
//!
//! ```
//! use amf_rs::amf::{self, AmfValue};
//!
//! let inner = AmfValue::object([("bar", AmfValue::Number(2.5))]);
//! let outer = AmfValue::object([("0", inner.clone()), ("1", inner)]);
//!
//! let bytes = amf::encode(&outer)?;
//! let decoded = amf::decode(&bytes)?;
//!
//! // The shared instance comes back shared
//! assert!(decoded.get("0").unwrap().ptr_eq(&decoded.get("1").unwrap()));
//! # Ok::<(), amf_rs::AmfError>(())
//! ```

pub mod amf;
pub mod config;
pub mod error;
pub mod media;

// Re-export main types for convenience
pub use amf::{Amf0Decoder, Amf0Encoder, AmfValue, Cursor, Marker};
pub use config::CodecConfig;
pub use error::{AmfError, Error, MediaError, Result};
