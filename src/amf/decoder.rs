//! AMF0 decoder
//!
//! Each top-level [`Amf0Decoder::decode`] call starts a fresh reference table
//! and threads the caller's [`Cursor`] through every nested read. Objects and
//! arrays are registered in the table before their members are read, so a
//! member may refer back to a container that is still being filled.

use std::cell::RefCell;
use std::rc::Rc;

use super::buffer;
use super::cursor::Cursor;
use super::marker::Marker;
use super::references::ReferenceTable;
use super::value::{AmfObject, AmfValue, ArrayKey, EcmaArray};
use crate::config::CodecConfig;
use crate::error::AmfError;

/// AMF0 decoder
#[derive(Debug, Clone, Default)]
pub struct Amf0Decoder {
    config: CodecConfig,
}

impl Amf0Decoder {
    /// Create a new decoder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder with explicit settings
    pub fn with_config(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Decode a single AMF0 value at `cursor.offset`
    ///
    /// On success the cursor sits just past the value and `bytes_consumed`
    /// holds its encoded size. On error the cursor is left where it started.
    pub fn decode(&self, buf: &[u8], cursor: &mut Cursor) -> Result<AmfValue, AmfError> {
        let start = cursor.offset;
        cursor.begin();
        let mut refs = ReferenceTable::new();

        let result = self
            .read_value(buf, cursor, &mut refs, 0)
            .and_then(|value| match value {
                AmfValue::ObjectEnd => Err(AmfError::ProtocolViolation(
                    "object end marker outside an object body",
                )),
                value => Ok(value),
            });

        match result {
            Ok(value) => {
                tracing::trace!(
                    offset = start,
                    bytes = cursor.bytes_consumed,
                    references = refs.len(),
                    "Decoded AMF0 value"
                );
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(offset = start, error = %e, "AMF0 decode failed");
                cursor.rewind(start);
                Err(e)
            }
        }
    }

    /// Decode consecutive top-level values until the buffer is exhausted
    ///
    /// Every value is its own top-level call, so references never span
    /// values. `bytes_consumed` ends up as the total for all of them.
    pub fn decode_all(&self, buf: &[u8], cursor: &mut Cursor) -> Result<Vec<AmfValue>, AmfError> {
        let mut values = Vec::new();
        let mut total = 0;
        while cursor.offset < buf.len() {
            values.push(self.decode(buf, cursor)?);
            total += cursor.bytes_consumed;
        }
        cursor.bytes_consumed = total;
        Ok(values)
    }

    fn enter(&self, depth: usize) -> Result<usize, AmfError> {
        if depth >= self.config.max_depth {
            return Err(AmfError::NestingTooDeep);
        }
        Ok(depth + 1)
    }

    /// Read one tagged value; may return the `ObjectEnd` sentinel
    fn read_value(
        &self,
        buf: &[u8],
        cursor: &mut Cursor,
        refs: &mut ReferenceTable,
        depth: usize,
    ) -> Result<AmfValue, AmfError> {
        let tag = buffer::read_u8(buf, cursor.offset)?;
        cursor.advance(1);
        let marker = Marker::try_from(tag)?;

        match marker {
            Marker::Number => {
                let n = buffer::read_f64(buf, cursor.offset)?;
                cursor.advance(8);
                Ok(AmfValue::Number(n))
            }
            Marker::Boolean => {
                let b = buffer::read_u8(buf, cursor.offset)?;
                cursor.advance(1);
                Ok(AmfValue::Boolean(b != 0))
            }
            Marker::String => Ok(AmfValue::String(read_utf8(buf, cursor)?)),
            Marker::Null => Ok(AmfValue::Null),
            Marker::Undefined => Ok(AmfValue::Undefined),
            Marker::Reference => self.read_reference(buf, cursor, refs),
            Marker::Object => self.read_object(buf, cursor, refs, depth, AmfObject::new()),
            Marker::TypedObject => {
                let class_name = read_utf8(buf, cursor)?;
                self.read_object(buf, cursor, refs, depth, AmfObject::typed(class_name))
            }
            Marker::EcmaArray => self.read_ecma_array(buf, cursor, refs, depth),
            Marker::StrictArray => self.read_strict_array(buf, cursor, refs, depth),
            Marker::Date => {
                let millis = buffer::read_f64(buf, cursor.offset)?;
                let timezone = buffer::read_i16(buf, cursor.offset + 8)?;
                cursor.advance(10);
                Ok(AmfValue::Date { millis, timezone })
            }
            Marker::ObjectEnd => Ok(AmfValue::ObjectEnd),
            Marker::MovieClip
            | Marker::LongString
            | Marker::Unsupported
            | Marker::Recordset
            | Marker::XmlDocument
            | Marker::AvmPlus => Err(AmfError::MalformedTag(tag)),
        }
    }

    fn read_reference(
        &self,
        buf: &[u8],
        cursor: &mut Cursor,
        refs: &ReferenceTable,
    ) -> Result<AmfValue, AmfError> {
        let index = buffer::read_u16(buf, cursor.offset)?;
        cursor.advance(2);
        refs.get(index).ok_or(AmfError::ReferenceOutOfRange {
            index,
            len: refs.len(),
        })
    }

    fn read_object(
        &self,
        buf: &[u8],
        cursor: &mut Cursor,
        refs: &mut ReferenceTable,
        depth: usize,
        obj: AmfObject,
    ) -> Result<AmfValue, AmfError> {
        let depth = self.enter(depth)?;
        let obj = Rc::new(RefCell::new(obj));
        let value = AmfValue::Object(obj.clone());
        refs.insert(&value);

        self.read_body(buf, cursor, refs, depth, |key, member| {
            obj.borrow_mut().insert(key, member);
        })?;
        Ok(value)
    }

    fn read_ecma_array(
        &self,
        buf: &[u8],
        cursor: &mut Cursor,
        refs: &mut ReferenceTable,
        depth: usize,
    ) -> Result<AmfValue, AmfError> {
        let depth = self.enter(depth)?;
        // Count hint, not always accurate
        let count = buffer::read_u32(buf, cursor.offset)?;
        cursor.advance(4);

        let arr = Rc::new(RefCell::new(EcmaArray::new()));
        let value = AmfValue::EcmaArray(arr.clone());
        refs.insert(&value);

        let members = self.read_body(buf, cursor, refs, depth, |key, member| {
            arr.borrow_mut().insert(ArrayKey::parse(&key), member);
        })?;
        if members != count as usize {
            tracing::trace!(count, members, "ECMA array count hint differs from members read");
        }
        Ok(value)
    }

    fn read_strict_array(
        &self,
        buf: &[u8],
        cursor: &mut Cursor,
        refs: &mut ReferenceTable,
        depth: usize,
    ) -> Result<AmfValue, AmfError> {
        let depth = self.enter(depth)?;
        let arr = Rc::new(RefCell::new(Vec::new()));
        let value = AmfValue::StrictArray(arr.clone());
        refs.insert(&value);

        let count = buffer::read_u32(buf, cursor.offset)? as usize;
        cursor.advance(4);
        arr.borrow_mut().reserve(count.min(1024)); // Cap initial allocation

        for _ in 0..count {
            let element = self.read_value(buf, cursor, refs, depth)?;
            if matches!(element, AmfValue::ObjectEnd) {
                return Err(AmfError::ProtocolViolation(
                    "object end marker inside a strict array",
                ));
            }
            arr.borrow_mut().push(element);
        }
        Ok(value)
    }

    /// Read key/value pairs up to and including the empty-key/end pair,
    /// returning the number of members handed to `insert`
    fn read_body<F>(
        &self,
        buf: &[u8],
        cursor: &mut Cursor,
        refs: &mut ReferenceTable,
        depth: usize,
        mut insert: F,
    ) -> Result<usize, AmfError>
    where
        F: FnMut(String, AmfValue),
    {
        let mut members = 0;
        loop {
            if cursor.offset >= buf.len() {
                return Err(AmfError::ProtocolViolation(
                    "object body ended without an end marker",
                ));
            }
            let key = read_utf8(buf, cursor)?;
            let value = self.read_value(buf, cursor, refs, depth)?;

            match (key.is_empty(), value) {
                (true, AmfValue::ObjectEnd) => return Ok(members),
                (true, _) => {
                    return Err(AmfError::ProtocolViolation(
                        "empty property key not followed by an end marker",
                    ))
                }
                (false, AmfValue::ObjectEnd) => {
                    return Err(AmfError::ProtocolViolation(
                        "end marker after a non-empty property key",
                    ))
                }
                (false, value) => {
                    insert(key, value);
                    members += 1;
                }
            }
        }
    }
}

/// Read UTF-8 string with 16-bit length prefix (no type marker)
fn read_utf8(buf: &[u8], cursor: &mut Cursor) -> Result<String, AmfError> {
    let len = buffer::read_u16(buf, cursor.offset)? as usize;
    let s = buffer::read_utf8(buf, cursor.offset + 2, len)?;
    cursor.advance(2 + len);
    Ok(s)
}
