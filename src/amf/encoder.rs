//! AMF0 encoder
//!
//! Writes at `cursor.offset` into a `BytesMut`, growing it as needed. Each
//! top-level call starts a fresh reference table: the second and later
//! appearances of the same composite instance are written as `Reference`,
//! while structurally equal but distinct instances are written in full.

use bytes::{Bytes, BytesMut};

use super::buffer;
use super::cursor::Cursor;
use super::marker::Marker;
use super::references::ReferenceTable;
use super::value::AmfValue;
use crate::config::CodecConfig;
use crate::error::AmfError;

/// AMF0 encoder
#[derive(Debug, Clone, Default)]
pub struct Amf0Encoder {
    config: CodecConfig,
}

impl Amf0Encoder {
    /// Create a new encoder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with explicit settings
    pub fn with_config(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Encode a single value with the marker its variant implies
    ///
    /// A bare `ObjectEnd` is rejected; only `encode_as` with
    /// `Marker::ObjectEnd` writes the lone terminator byte.
    pub fn encode(
        &self,
        buf: &mut BytesMut,
        value: &AmfValue,
        cursor: &mut Cursor,
    ) -> Result<(), AmfError> {
        self.encode_top_level(buf, value, cursor, None)
    }

    /// Encode a single value with an explicit marker
    ///
    /// Besides each variant's own marker this accepts `Date` for a number,
    /// `Object` for a typed object or ECMA array, and `EcmaArray` for an
    /// object or strict array. Anything else is `UnrepresentableValue`.
    pub fn encode_as(
        &self,
        buf: &mut BytesMut,
        value: &AmfValue,
        cursor: &mut Cursor,
        marker: Marker,
    ) -> Result<(), AmfError> {
        self.encode_top_level(buf, value, cursor, Some(marker))
    }

    /// Encode values back to back, each as its own top-level call
    ///
    /// `bytes_consumed` ends up as the total written.
    pub fn encode_all(
        &self,
        buf: &mut BytesMut,
        values: &[AmfValue],
        cursor: &mut Cursor,
    ) -> Result<(), AmfError> {
        let mut total = 0;
        for value in values {
            self.encode(buf, value, cursor)?;
            total += cursor.bytes_consumed;
        }
        cursor.bytes_consumed = total;
        Ok(())
    }

    /// Encode a single value into a fresh buffer
    pub fn to_bytes(&self, value: &AmfValue) -> Result<Bytes, AmfError> {
        let mut buf = BytesMut::with_capacity(self.config.initial_capacity);
        self.encode(&mut buf, value, &mut Cursor::new())?;
        Ok(buf.freeze())
    }

    fn encode_top_level(
        &self,
        buf: &mut BytesMut,
        value: &AmfValue,
        cursor: &mut Cursor,
        marker: Option<Marker>,
    ) -> Result<(), AmfError> {
        let start = cursor.offset;
        let len_before = buf.len();
        cursor.begin();
        let mut refs = ReferenceTable::new();

        let result = match (marker, value) {
            (Some(marker), _) => self.write_as(buf, value, marker, cursor, &mut refs, 0),
            (None, AmfValue::ObjectEnd) => Err(AmfError::UnrepresentableValue(
                "object end marker outside an object body".into(),
            )),
            (None, _) => self.write_value(buf, value, cursor, &mut refs, 0),
        };

        match result {
            Ok(()) => {
                tracing::trace!(
                    offset = start,
                    bytes = cursor.bytes_consumed,
                    references = refs.len(),
                    "Encoded AMF0 value"
                );
                Ok(())
            }
            Err(e) => {
                tracing::debug!(offset = start, error = %e, "AMF0 encode failed");
                buf.truncate(len_before);
                cursor.rewind(start);
                Err(e)
            }
        }
    }

    fn enter(&self, depth: usize) -> Result<usize, AmfError> {
        if depth >= self.config.max_depth {
            return Err(AmfError::NestingTooDeep);
        }
        Ok(depth + 1)
    }

    /// Write a nested value, as a reference if this instance was seen before
    fn write_value(
        &self,
        buf: &mut BytesMut,
        value: &AmfValue,
        cursor: &mut Cursor,
        refs: &mut ReferenceTable,
        depth: usize,
    ) -> Result<(), AmfError> {
        if let Some(index) = refs.position(value) {
            write_reference(buf, index, cursor);
            return Ok(());
        }
        self.write_as(buf, value, value.marker(), cursor, refs, depth)
    }

    fn write_as(
        &self,
        buf: &mut BytesMut,
        value: &AmfValue,
        marker: Marker,
        cursor: &mut Cursor,
        refs: &mut ReferenceTable,
        depth: usize,
    ) -> Result<(), AmfError> {
        match (marker, value) {
            (Marker::Number, AmfValue::Number(n)) => {
                write_marker(buf, Marker::Number, cursor);
                buffer::write_f64(buf, cursor.offset, *n);
                cursor.advance(8);
            }
            (Marker::Boolean, AmfValue::Boolean(b)) => {
                write_marker(buf, Marker::Boolean, cursor);
                buffer::write_u8(buf, cursor.offset, u8::from(*b));
                cursor.advance(1);
            }
            (Marker::String, AmfValue::String(s)) => {
                check_utf8_len(s)?;
                write_marker(buf, Marker::String, cursor);
                write_utf8(buf, s, cursor)?;
            }
            (Marker::Null, AmfValue::Null) => write_marker(buf, Marker::Null, cursor),
            (Marker::Undefined, AmfValue::Undefined) => {
                write_marker(buf, Marker::Undefined, cursor)
            }
            (Marker::ObjectEnd, AmfValue::ObjectEnd) => {
                write_marker(buf, Marker::ObjectEnd, cursor)
            }
            (Marker::Date, AmfValue::Date { millis, timezone }) => {
                write_date(buf, *millis, *timezone, cursor)
            }
            (Marker::Date, AmfValue::Number(millis)) => write_date(buf, *millis, 0, cursor),
            (Marker::Reference, _) => match refs.position(value) {
                Some(index) => write_reference(buf, index, cursor),
                None => {
                    return Err(AmfError::UnrepresentableValue(
                        "reference marker needs an instance already written in this call".into(),
                    ))
                }
            },
            (Marker::Object, AmfValue::Object(obj)) => {
                let depth = self.enter(depth)?;
                refs.insert(value);
                write_marker(buf, Marker::Object, cursor);
                let obj = obj.borrow();
                self.write_body(buf, obj.iter(), cursor, refs, depth)?;
            }
            (Marker::TypedObject, AmfValue::Object(obj)) if obj.borrow().class_name().is_some() => {
                let depth = self.enter(depth)?;
                let obj = obj.borrow();
                let class_name = obj.class_name().unwrap_or_default();
                check_utf8_len(class_name)?;
                refs.insert(value);
                write_marker(buf, Marker::TypedObject, cursor);
                write_utf8(buf, class_name, cursor)?;
                self.write_body(buf, obj.iter(), cursor, refs, depth)?;
            }
            (Marker::Object, AmfValue::EcmaArray(arr)) => {
                let depth = self.enter(depth)?;
                refs.insert(value);
                write_marker(buf, Marker::Object, cursor);
                let arr = arr.borrow();
                let entries = arr.iter().map(|(k, v)| (k.as_wire_str(), v));
                self.write_body(buf, entries, cursor, refs, depth)?;
            }
            (Marker::EcmaArray, AmfValue::EcmaArray(arr)) => {
                let depth = self.enter(depth)?;
                let arr = arr.borrow();
                let count = element_count(arr.entry_count())?;
                refs.insert(value);
                write_marker(buf, Marker::EcmaArray, cursor);
                write_count(buf, count, cursor);
                let entries = arr.iter().map(|(k, v)| (k.as_wire_str(), v));
                self.write_body(buf, entries, cursor, refs, depth)?;
            }
            (Marker::EcmaArray, AmfValue::Object(obj)) => {
                let depth = self.enter(depth)?;
                let obj = obj.borrow();
                let count = element_count(obj.len())?;
                refs.insert(value);
                write_marker(buf, Marker::EcmaArray, cursor);
                write_count(buf, count, cursor);
                self.write_body(buf, obj.iter(), cursor, refs, depth)?;
            }
            (Marker::EcmaArray, AmfValue::StrictArray(arr)) => {
                let depth = self.enter(depth)?;
                let arr = arr.borrow();
                let count = element_count(arr.len())?;
                refs.insert(value);
                write_marker(buf, Marker::EcmaArray, cursor);
                write_count(buf, count, cursor);
                let entries = arr.iter().enumerate().map(|(i, v)| (i.to_string(), v));
                self.write_body(buf, entries, cursor, refs, depth)?;
            }
            (Marker::StrictArray, AmfValue::StrictArray(arr)) => {
                let depth = self.enter(depth)?;
                let arr = arr.borrow();
                let count = element_count(arr.len())?;
                refs.insert(value);
                write_marker(buf, Marker::StrictArray, cursor);
                write_count(buf, count, cursor);
                for element in arr.iter() {
                    if matches!(element, AmfValue::ObjectEnd) {
                        return Err(AmfError::UnrepresentableValue(
                            "object end marker inside a strict array".into(),
                        ));
                    }
                    self.write_value(buf, element, cursor, refs, depth)?;
                }
            }
            (marker, value) => {
                return Err(AmfError::UnrepresentableValue(format!(
                    "{:?} value cannot be written as {:?}",
                    value.marker(),
                    marker
                )))
            }
        }
        Ok(())
    }

    /// Write key/value pairs followed by the empty-key/end pair
    fn write_body<'v, K, I>(
        &self,
        buf: &mut BytesMut,
        entries: I,
        cursor: &mut Cursor,
        refs: &mut ReferenceTable,
        depth: usize,
    ) -> Result<(), AmfError>
    where
        K: AsRef<str>,
        I: Iterator<Item = (K, &'v AmfValue)>,
    {
        for (key, member) in entries {
            let key = key.as_ref();
            if key.is_empty() {
                return Err(AmfError::UnrepresentableValue(
                    "empty property key collides with the object end marker".into(),
                ));
            }
            if matches!(member, AmfValue::ObjectEnd) {
                return Err(AmfError::UnrepresentableValue(format!(
                    "object end marker as the value of property {:?}",
                    key
                )));
            }
            write_utf8(buf, key, cursor)?;
            self.write_value(buf, member, cursor, refs, depth)?;
        }
        write_utf8(buf, "", cursor)?;
        write_marker(buf, Marker::ObjectEnd, cursor);
        Ok(())
    }
}

fn write_marker(buf: &mut BytesMut, marker: Marker, cursor: &mut Cursor) {
    buffer::write_u8(buf, cursor.offset, marker.as_u8());
    cursor.advance(1);
}

fn write_reference(buf: &mut BytesMut, index: u16, cursor: &mut Cursor) {
    write_marker(buf, Marker::Reference, cursor);
    buffer::write_u16(buf, cursor.offset, index);
    cursor.advance(2);
}

fn write_date(buf: &mut BytesMut, millis: f64, timezone: i16, cursor: &mut Cursor) {
    write_marker(buf, Marker::Date, cursor);
    buffer::write_f64(buf, cursor.offset, millis);
    buffer::write_i16(buf, cursor.offset + 8, timezone);
    cursor.advance(10);
}

fn write_count(buf: &mut BytesMut, count: u32, cursor: &mut Cursor) {
    buffer::write_u32(buf, cursor.offset, count);
    cursor.advance(4);
}

fn element_count(len: usize) -> Result<u32, AmfError> {
    u32::try_from(len).map_err(|_| {
        AmfError::UnrepresentableValue(format!("{} elements exceed the 32-bit count", len))
    })
}

/// Long strings need the 0x0C marker, which this codec does not write
fn check_utf8_len(s: &str) -> Result<(), AmfError> {
    let len = buffer::utf8_len(s);
    if len > u16::MAX as usize {
        return Err(AmfError::UnrepresentableValue(format!(
            "string of {} bytes exceeds the 16-bit length prefix",
            len
        )));
    }
    Ok(())
}

/// Write UTF-8 string with 16-bit length prefix (no type marker)
fn write_utf8(buf: &mut BytesMut, s: &str, cursor: &mut Cursor) -> Result<(), AmfError> {
    check_utf8_len(s)?;
    let len = buffer::utf8_len(s);
    buffer::write_u16(buf, cursor.offset, len as u16);
    buffer::write_bytes(buf, cursor.offset + 2, s.as_bytes());
    cursor.advance(2 + len);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::approx_constant)] // 3.14 fixture from the reference encoding
mod tests {
    use super::*;
    use crate::amf::value::{AmfObject, EcmaArray};

    fn encode(value: &AmfValue) -> Result<Bytes, AmfError> {
        Amf0Encoder::new().to_bytes(value)
    }

    fn encode_as(value: &AmfValue, marker: Marker) -> Result<Bytes, AmfError> {
        let mut buf = BytesMut::new();
        Amf0Encoder::new().encode_as(&mut buf, value, &mut Cursor::new(), marker)?;
        Ok(buf.freeze())
    }

    #[test]
    fn test_encode_scalars() {
        assert_eq!(
            &encode(&AmfValue::Number(3.5)).unwrap()[..],
            &[0x00, 0x40, 0x0C, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(&encode(&AmfValue::Boolean(true)).unwrap()[..], &[0x01, 0x01]);
        assert_eq!(&encode(&AmfValue::Boolean(false)).unwrap()[..], &[0x01, 0x00]);
        assert_eq!(&encode(&AmfValue::Null).unwrap()[..], &[0x05]);
        assert_eq!(&encode(&AmfValue::Undefined).unwrap()[..], &[0x06]);
    }

    #[test]
    fn test_encode_string_counts_utf8_bytes() {
        let encoded = encode(&AmfValue::from("this is a テスト")).unwrap();
        assert_eq!(&encoded[..3], &[0x02, 0x00, 0x13]);
        assert_eq!(&encoded[3..], "this is a テスト".as_bytes());
    }

    #[test]
    fn test_encode_object_in_insertion_order() {
        let value = AmfValue::object([
            ("bar", AmfValue::Number(3.14)),
            ("foo", AmfValue::from("baz")),
        ]);
        let expected = [
            0x03, //
            0x00, 0x03, b'b', b'a', b'r', 0x00, 0x40, 0x09, 0x1E, 0xB8, 0x51, 0xEB, 0x85, 0x1F, //
            0x00, 0x03, b'f', b'o', b'o', 0x02, 0x00, 0x03, b'b', b'a', b'z', //
            0x00, 0x00, 0x09,
        ];
        assert_eq!(&encode(&value).unwrap()[..], &expected);
    }

    #[test]
    fn test_encode_shared_instance_as_reference() {
        let inner = AmfValue::object([
            ("bar", AmfValue::Number(3.14)),
            ("foo", AmfValue::from("baz")),
        ]);
        let outer = AmfValue::object([("0", inner.clone()), ("1", inner)]);

        let encoded = encode(&outer).unwrap();
        assert_eq!(encoded.len(), 42);
        // Second property: key "1" then a reference to table entry 1
        assert_eq!(&encoded[33..42], &[0x00, 0x01, b'1', 0x07, 0x00, 0x01, 0x00, 0x00, 0x09]);
    }

    #[test]
    fn test_distinct_equal_instances_written_in_full() {
        let a = AmfValue::object([("x", AmfValue::Number(1.0))]);
        let b = AmfValue::object([("x", AmfValue::Number(1.0))]);
        let outer = AmfValue::strict_array(vec![a, b]);

        let encoded = encode(&outer).unwrap();
        assert!(!encoded.contains(&Marker::Reference.as_u8()));
        // 5 byte header + two 16 byte objects
        assert_eq!(encoded.len(), 5 + 16 + 16);
    }

    #[test]
    fn test_encode_self_reference() {
        let obj = AmfValue::from(AmfObject::new());
        obj.as_object()
            .unwrap()
            .borrow_mut()
            .insert("self", obj.clone());

        let encoded = encode(&obj).unwrap();
        assert_eq!(
            &encoded[..],
            &[0x03, 0x00, 0x04, b's', b'e', b'l', b'f', 0x07, 0x00, 0x00, 0x00, 0x00, 0x09]
        );
    }

    #[test]
    fn test_encode_typed_object() {
        let value = AmfValue::typed_object("a.B", [("x", AmfValue::Null)]);
        assert_eq!(
            &encode(&value).unwrap()[..],
            &[0x10, 0x00, 0x03, b'a', b'.', b'B', 0x00, 0x01, b'x', 0x05, 0x00, 0x00, 0x09]
        );

        // Explicit Object marker drops the class name
        assert_eq!(
            &encode_as(&value, Marker::Object).unwrap()[..],
            &[0x03, 0x00, 0x01, b'x', 0x05, 0x00, 0x00, 0x09]
        );

        let plain = AmfValue::object([("x", AmfValue::Null)]);
        assert!(matches!(
            encode_as(&plain, Marker::TypedObject),
            Err(AmfError::UnrepresentableValue(_))
        ));
    }

    #[test]
    fn test_encode_ecma_array() {
        let mut arr = EcmaArray::new();
        arr.push(AmfValue::from("a"));
        arr.insert("name", AmfValue::Boolean(true));
        let value = AmfValue::from(arr);

        assert_eq!(
            &encode(&value).unwrap()[..],
            &[
                0x08, 0x00, 0x00, 0x00, 0x02, //
                0x00, 0x01, b'0', 0x02, 0x00, 0x01, b'a', //
                0x00, 0x04, b'n', b'a', b'm', b'e', 0x01, 0x01, //
                0x00, 0x00, 0x09,
            ]
        );
    }

    #[test]
    fn test_encode_strict_array() {
        let value = AmfValue::strict_array(vec![AmfValue::Null, AmfValue::Boolean(false)]);
        assert_eq!(
            &encode(&value).unwrap()[..],
            &[0x0A, 0x00, 0x00, 0x00, 0x02, 0x05, 0x01, 0x00]
        );
    }

    #[test]
    fn test_encode_date() {
        let value = AmfValue::Date {
            millis: 1_234_567_890_000.0,
            timezone: -60,
        };
        assert_eq!(
            &encode(&value).unwrap()[..],
            &[0x0B, 0x42, 0x71, 0xF7, 0x1F, 0xB0, 0x45, 0x00, 0x00, 0xFF, 0xC4]
        );

        let from_number = encode_as(&AmfValue::Number(0.0), Marker::Date).unwrap();
        assert_eq!(&from_number[..], &[0x0B, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_explicit_marker_coercions() {
        let obj = AmfValue::object([("k", AmfValue::Null)]);
        let as_ecma = encode_as(&obj, Marker::EcmaArray).unwrap();
        assert_eq!(
            &as_ecma[..],
            &[0x08, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, b'k', 0x05, 0x00, 0x00, 0x09]
        );

        let arr = AmfValue::strict_array(vec![AmfValue::Null]);
        let as_ecma = encode_as(&arr, Marker::EcmaArray).unwrap();
        assert_eq!(
            &as_ecma[..],
            &[0x08, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, b'0', 0x05, 0x00, 0x00, 0x09]
        );

        let ecma = AmfValue::ecma_array([("k", AmfValue::Null)]);
        let as_object = encode_as(&ecma, Marker::Object).unwrap();
        assert_eq!(&as_object[..], &[0x03, 0x00, 0x01, b'k', 0x05, 0x00, 0x00, 0x09]);
    }

    #[test]
    fn test_unrepresentable_values() {
        let cases = [
            (AmfValue::from("x"), Marker::Number),
            (AmfValue::Number(1.0), Marker::StrictArray),
            (AmfValue::Null, Marker::LongString),
            (AmfValue::Null, Marker::AvmPlus),
            (AmfValue::Null, Marker::MovieClip),
            (AmfValue::object([("a", AmfValue::Null)]), Marker::Reference),
        ];
        for (value, marker) in cases {
            assert!(
                matches!(encode_as(&value, marker), Err(AmfError::UnrepresentableValue(_))),
                "{:?} as {:?}",
                value,
                marker
            );
        }
    }

    #[test]
    fn test_long_string_rejected() {
        let value = AmfValue::String("x".repeat(70000));
        assert!(matches!(encode(&value), Err(AmfError::UnrepresentableValue(_))));

        let max = AmfValue::String("x".repeat(0xFFFF));
        assert_eq!(encode(&max).unwrap().len(), 3 + 0xFFFF);
    }

    #[test]
    fn test_invalid_members_rejected() {
        let empty_key = AmfValue::object([("", AmfValue::Null)]);
        assert!(matches!(encode(&empty_key), Err(AmfError::UnrepresentableValue(_))));

        let end_member = AmfValue::object([("a", AmfValue::ObjectEnd)]);
        assert!(matches!(encode(&end_member), Err(AmfError::UnrepresentableValue(_))));

        let end_element = AmfValue::strict_array(vec![AmfValue::ObjectEnd]);
        assert!(matches!(encode(&end_element), Err(AmfError::UnrepresentableValue(_))));
    }

    #[test]
    fn test_top_level_object_end() {
        assert!(matches!(
            encode(&AmfValue::ObjectEnd),
            Err(AmfError::UnrepresentableValue(_))
        ));
        let lone = encode_as(&AmfValue::ObjectEnd, Marker::ObjectEnd).unwrap();
        assert_eq!(&lone[..], &[0x09]);

        let encoder = Amf0Encoder::new();
        let mut buf = BytesMut::new();
        let mut cursor = Cursor::new();
        let values = [AmfValue::Null, AmfValue::ObjectEnd];
        assert!(encoder.encode_all(&mut buf, &values, &mut cursor).is_err());
        assert_eq!(&buf[..], &[0x05]);
    }

    #[test]
    fn test_failed_encode_leaves_buffer_untouched() {
        let encoder = Amf0Encoder::new();
        let mut buf = BytesMut::new();
        let mut cursor = Cursor::new();
        encoder.encode(&mut buf, &AmfValue::Null, &mut cursor).unwrap();

        let bad = AmfValue::object([("ok", AmfValue::Number(1.0)), ("", AmfValue::Null)]);
        assert!(encoder.encode(&mut buf, &bad, &mut cursor).is_err());
        assert_eq!(&buf[..], &[0x05]);
        assert_eq!(cursor.offset, 1);
        assert_eq!(cursor.bytes_consumed, 0);
    }

    #[test]
    fn test_encode_at_offset_overwrites() {
        let encoder = Amf0Encoder::new();
        let mut buf = BytesMut::from(&[0xAA, 0xBB, 0xCC, 0xDD][..]);
        let mut cursor = Cursor::at(1);
        encoder.encode(&mut buf, &AmfValue::Boolean(true), &mut cursor).unwrap();
        assert_eq!(&buf[..], &[0xAA, 0x01, 0x01, 0xDD]);
        assert_eq!(cursor.offset, 3);
        assert_eq!(cursor.bytes_consumed, 2);
    }

    #[test]
    fn test_encode_all_sequential() {
        let encoder = Amf0Encoder::new();
        let mut buf = BytesMut::new();
        let mut cursor = Cursor::new();
        let shared = AmfValue::object([("a", AmfValue::Null)]);
        encoder
            .encode_all(&mut buf, &[shared.clone(), shared], &mut cursor)
            .unwrap();

        // References never span top-level calls: both written in full
        assert_eq!(
            &buf[..],
            &[
                0x03, 0x00, 0x01, b'a', 0x05, 0x00, 0x00, 0x09, //
                0x03, 0x00, 0x01, b'a', 0x05, 0x00, 0x00, 0x09,
            ]
        );
        assert_eq!(cursor.bytes_consumed, 16);
    }

    #[test]
    fn test_nesting_too_deep() {
        let nested = AmfValue::strict_array(vec![AmfValue::strict_array(vec![])]);
        let encoder = Amf0Encoder::with_config(CodecConfig::default().max_depth(1));
        assert_eq!(encoder.to_bytes(&nested), Err(AmfError::NestingTooDeep));

        let encoder = Amf0Encoder::with_config(CodecConfig::default().max_depth(2));
        assert!(encoder.to_bytes(&nested).is_ok());
    }
}
