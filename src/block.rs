use std::fmt;

/// Size in bytes of the header stored in front of every payload.
pub const HEADER_SIZE: usize = 8;

/// Largest payload a single header can describe.
pub const MAX_BLOCK_SIZE: usize = u16::MAX as usize;

/// Decoded block header.
///
/// On the arena a header occupies [`HEADER_SIZE`] bytes:
///
/// ```text
///   0        2             4              5          8
///   ┌────────┬─────────────┬──────────────┬──────────┐
///   │  size  │  prev_size  │ is_available │ padding  │
///   │  u16   │    u16      │      u8      │  3 bytes │
///   └────────┴─────────────┴──────────────┴──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
  pub size: usize,
  pub prev_size: usize,
  pub is_available: bool,
}

impl Header {
  pub fn new(
    size: usize,
    prev_size: usize,
    is_available: bool,
  ) -> Self {
    Self {
      size,
      prev_size,
      is_available,
    }
  }

  /// Reads a header from the first [`HEADER_SIZE`] bytes of `bytes`.
  pub fn read(bytes: &[u8]) -> Self {
    let size = u16::from_ne_bytes([bytes[0], bytes[1]]);
    let prev_size = u16::from_ne_bytes([bytes[2], bytes[3]]);
    Self::new(size as usize, prev_size as usize, bytes[4] != 0)
  }

  /// Writes the header into the first [`HEADER_SIZE`] bytes of `bytes`.
  pub fn write(
    &self,
    bytes: &mut [u8],
  ) {
    debug_assert!(self.size <= MAX_BLOCK_SIZE, "block size {} overflows header", self.size);
    debug_assert!(self.prev_size <= MAX_BLOCK_SIZE);

    bytes[0..2].copy_from_slice(&(self.size as u16).to_ne_bytes());
    bytes[2..4].copy_from_slice(&(self.prev_size as u16).to_ne_bytes());
    bytes[4] = self.is_available as u8;
    bytes[5..HEADER_SIZE].fill(0);
  }
}

/// A snapshot of one block, as yielded by [`ArenaAllocator::blocks`](crate::ArenaAllocator::blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  /// Offset of the block header from the arena start.
  pub offset: usize,
  /// Payload capacity in bytes.
  pub size: usize,
  /// Payload capacity of the preceding block, 0 for the first block.
  pub prev_size: usize,
  /// Whether the block is free.
  pub is_available: bool,
}

impl BlockInfo {
  pub(crate) fn from_header(
    offset: usize,
    header: Header,
  ) -> Self {
    Self {
      offset,
      size: header.size,
      prev_size: header.prev_size,
      is_available: header.is_available,
    }
  }

  /// Offset of the first payload byte.
  pub fn payload_offset(&self) -> usize {
    self.offset + HEADER_SIZE
  }

  /// Offset one past the last payload byte; the next header starts here.
  pub fn end(&self) -> usize {
    self.payload_offset() + self.size
  }
}

impl fmt::Display for BlockInfo {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    let flag = if self.is_available { '+' } else { '-' };
    write!(f, "{} {:#06x} {}", flag, self.offset, self.size)
  }
}
