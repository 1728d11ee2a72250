//! Media payloads carrying AMF0
//!
//! This module provides:
//! - FLV script tag / RTMP data message parsing and generation
//! - `onMetaData` field extraction

pub mod script;

pub use script::{ScriptData, StreamMetadata, SCRIPT_ON_METADATA, SCRIPT_SET_DATA_FRAME};
