//! Offset-addressed big-endian buffer access
//!
//! Reads take an immutable slice and an absolute offset; writes target a
//! `BytesMut` at an absolute offset and grow it when the write runs past the
//! current end (any gap is zero filled).

use bytes::{Buf, BufMut, BytesMut};

use crate::error::AmfError;

fn slice(buf: &[u8], offset: usize, needed: usize) -> Result<&[u8], AmfError> {
    offset
        .checked_add(needed)
        .and_then(|end| buf.get(offset..end))
        .ok_or(AmfError::UnexpectedEof { offset, needed })
}

pub fn read_u8(buf: &[u8], offset: usize) -> Result<u8, AmfError> {
    Ok(slice(buf, offset, 1)?.get_u8())
}

pub fn read_u16(buf: &[u8], offset: usize) -> Result<u16, AmfError> {
    Ok(slice(buf, offset, 2)?.get_u16())
}

pub fn read_u32(buf: &[u8], offset: usize) -> Result<u32, AmfError> {
    Ok(slice(buf, offset, 4)?.get_u32())
}

pub fn read_i16(buf: &[u8], offset: usize) -> Result<i16, AmfError> {
    Ok(slice(buf, offset, 2)?.get_i16())
}

pub fn read_f64(buf: &[u8], offset: usize) -> Result<f64, AmfError> {
    Ok(slice(buf, offset, 8)?.get_f64())
}

/// Read `len` bytes at `offset` as a UTF-8 string
pub fn read_utf8(buf: &[u8], offset: usize, len: usize) -> Result<String, AmfError> {
    let bytes = slice(buf, offset, len)?;
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| AmfError::InvalidUtf8 { offset })
}

/// Number of bytes in the UTF-8 encoding of `s`
pub fn utf8_len(s: &str) -> usize {
    s.len()
}

/// Mutable window of `len` bytes at `offset`, growing the buffer as needed
fn window(buf: &mut BytesMut, offset: usize, len: usize) -> &mut [u8] {
    let end = offset + len;
    if buf.len() < end {
        buf.resize(end, 0);
    }
    &mut buf[offset..end]
}

pub fn write_u8(buf: &mut BytesMut, offset: usize, v: u8) {
    window(buf, offset, 1).put_u8(v);
}

pub fn write_u16(buf: &mut BytesMut, offset: usize, v: u16) {
    window(buf, offset, 2).put_u16(v);
}

pub fn write_u32(buf: &mut BytesMut, offset: usize, v: u32) {
    window(buf, offset, 4).put_u32(v);
}

pub fn write_i16(buf: &mut BytesMut, offset: usize, v: i16) {
    window(buf, offset, 2).put_i16(v);
}

pub fn write_f64(buf: &mut BytesMut, offset: usize, v: f64) {
    window(buf, offset, 8).put_f64(v);
}

pub fn write_bytes(buf: &mut BytesMut, offset: usize, src: &[u8]) {
    window(buf, offset, src.len()).copy_from_slice(src);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_at_offset() {
        let data = [0xFF, 0x12, 0x34, 0x56, 0x78, 0xFF, 0xFE];
        assert_eq!(read_u8(&data, 0).unwrap(), 0xFF);
        assert_eq!(read_u16(&data, 1).unwrap(), 0x1234);
        assert_eq!(read_u32(&data, 1).unwrap(), 0x1234_5678);
        assert_eq!(read_i16(&data, 5).unwrap(), -2);
    }

    #[test]
    fn test_read_past_end() {
        let data = [0x00, 0x01];
        assert_eq!(
            read_u32(&data, 0),
            Err(AmfError::UnexpectedEof { offset: 0, needed: 4 })
        );
        assert_eq!(
            read_u8(&data, 2),
            Err(AmfError::UnexpectedEof { offset: 2, needed: 1 })
        );
        assert!(read_u8(&data, usize::MAX).is_err());
    }

    #[test]
    fn test_read_utf8() {
        let data = "this is a テスト".as_bytes();
        assert_eq!(read_utf8(data, 10, 9).unwrap(), "テスト");
        assert_eq!(utf8_len("テスト"), 9);

        let bad = [0xC3, 0x28];
        assert_eq!(read_utf8(&bad, 0, 2), Err(AmfError::InvalidUtf8 { offset: 0 }));
    }

    #[test]
    fn test_writes_grow_and_overwrite() {
        let mut buf = BytesMut::new();
        write_f64(&mut buf, 0, 3.5);
        assert_eq!(&buf[..], &[0x40, 0x0C, 0, 0, 0, 0, 0, 0]);

        write_u16(&mut buf, 10, 0xABCD);
        assert_eq!(buf.len(), 12);
        assert_eq!(&buf[8..], &[0, 0, 0xAB, 0xCD]);

        write_u8(&mut buf, 0, 0x11);
        assert_eq!(buf[0], 0x11);
        assert_eq!(buf.len(), 12);

        write_bytes(&mut buf, 12, b"ok");
        write_i16(&mut buf, 14, -1);
        write_u32(&mut buf, 16, 1);
        assert_eq!(&buf[12..], &[b'o', b'k', 0xFF, 0xFF, 0, 0, 0, 1]);
    }
}
