//! Bounds-checked little-endian reads over an immutable byte buffer.
//!
//! Every read returns `None` when the requested bytes would run past the end
//! of the buffer (or when the offset arithmetic itself overflows). Callers
//! treat `None` as "truncated" and abort only the lookup they were doing.

/// Borrow `width` bytes starting at `offset`, or `None` if they don't fit.
pub fn read_bytes(buf: &[u8], offset: usize, width: usize) -> Option<&[u8]> {
    let end = offset.checked_add(width)?;
    buf.get(offset..end)
}

/// Read a single byte.
pub fn read_u8(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

/// Read a little-endian `u16`.
pub fn read_u16_le(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes = read_bytes(buf, offset, 2)?;
    Some(u16::from_le_bytes(bytes.try_into().ok()?))
}

/// Read a little-endian `u32`.
pub fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = read_bytes(buf, offset, 4)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

/// Read a little-endian `i32`.
pub fn read_i32_le(buf: &[u8], offset: usize) -> Option<i32> {
    let bytes = read_bytes(buf, offset, 4)?;
    Some(i32::from_le_bytes(bytes.try_into().ok()?))
}

/// A read position over a buffer, for walking fixed-layout records field by field.
///
/// The cursor only advances when a read succeeds, so a failed read leaves it
/// where it was.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether `len` more bytes are available from the current position.
    pub fn has(&self, len: usize) -> bool {
        self.pos
            .checked_add(len)
            .is_some_and(|end| end <= self.buf.len())
    }

    pub fn skip(&mut self, len: usize) -> Option<()> {
        let next = self.pos.checked_add(len)?;
        if next > self.buf.len() {
            return None;
        }
        self.pos = next;
        Some(())
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        let value = read_u8(self.buf, self.pos)?;
        self.pos += 1;
        Some(value)
    }

    pub fn read_u16(&mut self) -> Option<u16> {
        let value = read_u16_le(self.buf, self.pos)?;
        self.pos += 2;
        Some(value)
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        let value = read_u32_le(self.buf, self.pos)?;
        self.pos += 4;
        Some(value)
    }
}
