use crate::error::Result;
use crate::section::Section;

/// Sink for encoded operations. Implementations keep call order per
/// (section, column, page) and reject out-of-range coordinates.
pub trait Writer {
    fn write_bytes(&mut self, bytes: &[u8], section: Section, column: u8, page: u32) -> Result<()>;

    /// Bytes written so far to one run.
    fn written(&self, section: Section, column: u8, page: u32) -> usize;

    fn write_words(&mut self, words: &[u32], section: Section, column: u8, page: u32) -> Result<()> {
        let mut buf = Vec::with_capacity(words.len() * 4);
        for w in words {
            buf.extend_from_slice(&w.to_le_bytes());
        }
        self.write_bytes(&buf, section, column, page)
    }

    fn write_padding(&mut self, len: usize, section: Section, column: u8, page: u32) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        self.write_bytes(&vec![0; len], section, column, page)
    }
}

/// Sequential source of storage units. Exhaustion is reported as `None`.
pub trait Reader {
    /// Page-relative offset of the next unread byte.
    fn position(&self) -> u32;
    fn remaining(&self) -> usize;
    fn peek_u8(&self) -> Option<u8>;
    fn read_u8(&mut self) -> Option<u8>;
    fn read_u16(&mut self) -> Option<u16>;
    fn read_u32(&mut self) -> Option<u32>;
    /// Moves to a page-relative offset inside the stream.
    fn seek(&mut self, offset: u32) -> Option<()>;
}

/// Little-endian reader over one run.
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    bytes: &'a [u8],
    base: u32,
    pos: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_base(bytes, 0)
    }

    /// `base` is the page offset of `bytes[0]` (DATA runs start after TEXT).
    pub fn with_base(bytes: &'a [u8], base: u32) -> Self {
        Self { bytes, base, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let chunk: [u8; N] = self.bytes.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(chunk)
    }
}

impl Reader for SliceReader<'_> {
    fn position(&self) -> u32 {
        self.base + self.pos as u32
    }
    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
    fn peek_u8(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }
    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|b| b[0])
    }
    fn read_u16(&mut self) -> Option<u16> {
        self.take::<2>().map(u16::from_le_bytes)
    }
    fn read_u32(&mut self) -> Option<u32> {
        self.take::<4>().map(u32::from_le_bytes)
    }
    fn seek(&mut self, offset: u32) -> Option<()> {
        let rel = offset.checked_sub(self.base)? as usize;
        if rel > self.bytes.len() {
            return None;
        }
        self.pos = rel;
        Some(())
    }
}
