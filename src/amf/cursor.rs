//! Read/write position threaded through the codec

/// Position in a buffer plus the byte count of the last top-level call
///
/// One cursor can be reused across sequential top-level calls on the same
/// buffer: each call starts at `offset`, leaves `offset` just past the value
/// it handled and records the value's size in `bytes_consumed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Absolute byte offset into the buffer
    pub offset: usize,
    /// Bytes read or written by the most recent top-level call
    pub bytes_consumed: usize,
}

impl Cursor {
    /// Cursor at the start of a buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor at an explicit offset
    pub fn at(offset: usize) -> Self {
        Self {
            offset,
            bytes_consumed: 0,
        }
    }

    /// Start a top-level call
    pub(crate) fn begin(&mut self) {
        self.bytes_consumed = 0;
    }

    /// Record `n` bytes read or written at the current offset
    pub(crate) fn advance(&mut self, n: usize) {
        self.offset += n;
        self.bytes_consumed += n;
    }

    /// Undo a failed top-level call that started at `offset`
    pub(crate) fn rewind(&mut self, offset: usize) {
        self.offset = offset;
        self.bytes_consumed = 0;
    }
}
