use std::{cmp, fmt};

use crate::{
  align,
  align::{ALIGNMENT, is_aligned},
  arena::RawArena,
  block::{BlockInfo, HEADER_SIZE, Header, MAX_BLOCK_SIZE},
  config::ArenaConfig,
  error::AllocError,
};


/// Payload address handed out by an [`ArenaAllocator`].
///
/// An `Addr` is the offset of the payload's first byte from the arena start and
/// is only meaningful for the allocator that returned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Addr(pub(crate) usize);

impl Addr {
  pub fn offset(self) -> usize {
    self.0
  }
}

impl fmt::Display for Addr {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{:#x}", self.0)
  }
}

/// A boundary-tag, first-fit allocator over one fixed arena.
///
/// Blocks tile the arena back to back. Each one starts with a [`HEADER_SIZE`]
/// header that stores its own payload size and the payload size of its
/// predecessor, so both neighbours are reachable without a separate list.
pub struct ArenaAllocator {
  arena: RawArena,
  /// Header bytes of every block plus payload bytes of allocated blocks.
  used: usize,
}

impl ArenaAllocator {
  /// Reserves an arena of `total_size` bytes holding a single free block.
  pub fn new(total_size: usize) -> Result<Self, AllocError> {
    if !is_aligned(total_size) {
      aerror!("Arena size {} is not {} byte aligned", total_size, ALIGNMENT);
      return Err(AllocError::Misaligned {
        size: total_size,
        alignment: ALIGNMENT,
      });
    }
    if total_size < HEADER_SIZE {
      return Err(AllocError::TooSmall {
        size: total_size,
        minimum: HEADER_SIZE,
      });
    }
    if total_size - HEADER_SIZE > MAX_BLOCK_SIZE {
      return Err(AllocError::TooLarge {
        size: total_size,
        maximum: MAX_BLOCK_SIZE + HEADER_SIZE,
      });
    }

    let arena = RawArena::reserve(total_size)?;
    let mut allocator = Self { arena, used: 0 };
    allocator.reset();

    ainfo!("Reserved a {} byte arena at {:p}", total_size, allocator.arena.as_ptr());
    Ok(allocator)
  }

  /// Builds an allocator from `config`, switching on logging if it asks for it.
  pub fn with_config(config: &ArenaConfig) -> Result<Self, AllocError> {
    if config.logging {
      crate::enable_logging();
    }
    Self::new(config.total_size)
  }

  /// Total arena capacity in bytes.
  pub fn total_size(&self) -> usize {
    self.arena.len()
  }

  /// Bytes taken by headers and allocated payloads.
  pub fn used(&self) -> usize {
    self.used
  }

  /// Bytes not accounted to any header or allocated payload.
  pub fn available(&self) -> usize {
    self.total_size() - self.used
  }

  /// Allocates at least `size` bytes, rounded up to [`ALIGNMENT`].
  ///
  /// Returns `Ok(None)` when no free block is large enough.
  #[must_use = "Returned address must be released with free"]
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<Option<Addr>, AllocError> {
    if size == 0 {
      return Err(AllocError::ZeroSize);
    }
    // The raw check keeps `align!` from overflowing on absurd requests.
    if size > self.available() || align!(size) > self.available() {
      adebug!("Not enough room for {} bytes, {} available", size, self.available());
      return Ok(None);
    }
    let size = align!(size);

    let Some(at) = self.find(size) else {
      awarn!("No free block of {} bytes, arena is fragmented", size);
      return Ok(None);
    };

    self.split(at, size);
    atrace!("Allocated {} bytes at {:#x}", size, at + HEADER_SIZE);
    Ok(Some(Addr(at + HEADER_SIZE)))
  }

  /// Releases the block at `addr` and merges it with free neighbours.
  pub fn free(
    &mut self,
    addr: Addr,
  ) -> Result<(), AllocError> {
    let at = self.locate(addr)?;

    let mut header = self.header(at);
    header.is_available = true;
    self.write_header(at, header);
    self.used -= header.size;

    let merged = self.coalesce(at);
    atrace!("Freed {} at {:#x}, merged block at {:#x}", header.size, addr.0, merged);
    Ok(())
  }

  /// Changes the size of the block at `addr`.
  ///
  /// Free neighbours are absorbed when they make enough room, which can move
  /// the payload backwards into the predecessor. Otherwise the contents are
  /// copied to a fresh block and the old one is freed. A `new_size` of 0 frees
  /// the block.
  ///
  /// Returns `Ok(None)` when the block was freed or no room was found. In the
  /// latter case `addr` stays allocated and untouched.
  pub fn resize(
    &mut self,
    addr: Addr,
    new_size: usize,
  ) -> Result<Option<Addr>, AllocError> {
    let at = self.locate(addr)?;

    if new_size == 0 {
      self.free(addr)?;
      return Ok(None);
    }
    if new_size > MAX_BLOCK_SIZE {
      awarn!("Cannot resize {} to {} bytes, larger than any block", addr, new_size);
      return Ok(None);
    }
    let new_size = align!(new_size);

    let header = self.header(at);
    let prev = self.free_prev(at, header);
    let next = self.free_next(at, header);
    let prev_room = prev.map_or(0, |p| self.header(p).size + HEADER_SIZE);
    let next_room = next.map_or(0, |n| self.header(n).size + HEADER_SIZE);

    if prev_room + next_room + header.size >= new_size {
      let addr = self.resize_in_place(at, header, prev, next, new_size);
      adebug!("Resized {} to {} bytes in place", addr, new_size);
      Ok(Some(addr))
    } else {
      self.relocate(addr, header.size, new_size)
    }
  }

  /// Drops every block and starts over with one free block spanning the arena.
  ///
  /// Addresses handed out before the reset are invalid afterwards.
  pub fn reset(&mut self) {
    let size = self.total_size() - HEADER_SIZE;
    self.write_header(0, Header::new(size, 0, true));
    self.used = HEADER_SIZE;
    adebug!("Arena reset to a single {} byte block", size);
  }

  /// Whether some block's payload starts at `addr`.
  pub fn validate(
    &self,
    addr: Addr,
  ) -> bool {
    self.block_at(addr).is_some()
  }

  /// Iterates over every block in address order.
  pub fn blocks(&self) -> Blocks<'_> {
    Blocks {
      allocator: self,
      offset: 0,
    }
  }

  /// The payload bytes of the allocated block at `addr`.
  pub fn payload(
    &self,
    addr: Addr,
  ) -> Result<&[u8], AllocError> {
    let at = self.locate(addr)?;
    let size = self.header(at).size;
    Ok(&self.arena[addr.0..addr.0 + size])
  }

  /// Mutable payload bytes of the allocated block at `addr`.
  pub fn payload_mut(
    &mut self,
    addr: Addr,
  ) -> Result<&mut [u8], AllocError> {
    let at = self.locate(addr)?;
    let size = self.header(at).size;
    Ok(&mut self.arena[addr.0..addr.0 + size])
  }

  /// Raw pointer to the payload at `addr`. Invalidated by any later call that
  /// frees, moves or resets the block.
  pub fn as_mut_ptr(
    &mut self,
    addr: Addr,
  ) -> Result<*mut u8, AllocError> {
    self.locate(addr)?;
    // SAFETY: `addr` is a payload offset inside the arena.
    Ok(unsafe { self.arena.as_mut_ptr().add(addr.0) })
  }

  /// Occupancy table of the arena, for diagnostics.
  pub fn dump(&self) -> Dump<'_> {
    Dump(self)
  }

  pub fn print_dump(&self) {
    println!("{}", self.dump());
  }

  fn header(
    &self,
    at: usize,
  ) -> Header {
    Header::read(&self.arena[at..at + HEADER_SIZE])
  }

  fn write_header(
    &mut self,
    at: usize,
    header: Header,
  ) {
    header.write(&mut self.arena[at..at + HEADER_SIZE]);
  }

  fn next_of(
    at: usize,
    header: Header,
  ) -> usize {
    at + HEADER_SIZE + header.size
  }

  fn prev_of(
    at: usize,
    header: Header,
  ) -> Option<usize> {
    (at != 0).then(|| at - HEADER_SIZE - header.prev_size)
  }

  fn free_prev(
    &self,
    at: usize,
    header: Header,
  ) -> Option<usize> {
    Self::prev_of(at, header).filter(|&prev| self.header(prev).is_available)
  }

  fn free_next(
    &self,
    at: usize,
    header: Header,
  ) -> Option<usize> {
    let next = Self::next_of(at, header);
    (next < self.total_size() && self.header(next).is_available).then_some(next)
  }

  /// Copies the size of the block at `at` into its successor's `prev_size`.
  fn link_next(
    &mut self,
    at: usize,
  ) {
    let header = self.header(at);
    let next = Self::next_of(at, header);
    if next < self.total_size() {
      let mut successor = self.header(next);
      successor.prev_size = header.size;
      self.write_header(next, successor);
    }
  }

  fn block_at(
    &self,
    addr: Addr,
  ) -> Option<BlockInfo> {
    self.blocks().find(|block| block.payload_offset() == addr.0)
  }

  /// Header offset of the allocated block whose payload starts at `addr`.
  fn locate(
    &self,
    addr: Addr,
  ) -> Result<usize, AllocError> {
    match self.block_at(addr) {
      Some(block) if !block.is_available => Ok(block.offset),
      Some(_) => {
        aerror!("Address {} points at a free block", addr);
        Err(AllocError::NotAllocated(addr.0))
      }
      None => {
        aerror!("Address {} is not a block payload", addr);
        Err(AllocError::InvalidAddress(addr.0))
      }
    }
  }

  fn find(
    &self,
    size: usize,
  ) -> Option<usize> {
    self
      .blocks()
      .find(|block| block.is_available && block.size >= size)
      .map(|block| block.offset)
  }

  /// Marks the free block at `at` allocated with `chunk` bytes, carving the
  /// rest into a new free block when it can hold a header.
  fn split(
    &mut self,
    at: usize,
    chunk: usize,
  ) {
    let mut header = self.header(at);
    let block_size = header.size;
    debug_assert!(header.is_available && block_size >= chunk);
    header.is_available = false;

    if block_size - chunk >= HEADER_SIZE {
      header.size = chunk;
      self.write_header(at, header);

      let remainder_at = at + HEADER_SIZE + chunk;
      let remainder = Header::new(block_size - chunk - HEADER_SIZE, chunk, true);
      self.write_header(remainder_at, remainder);
      self.used += chunk + HEADER_SIZE;
      self.link_next(remainder_at);
    } else {
      // Too small for a header of its own, hand out the whole span.
      self.write_header(at, header);
      self.used += block_size;
      self.link_next(at);
    }
  }

  /// Merges the free block at `at` with a free predecessor and successor.
  /// Returns the offset of the merged block.
  fn coalesce(
    &mut self,
    at: usize,
  ) -> usize {
    let mut at = at;
    let mut header = self.header(at);

    if let Some(prev_at) = self.free_prev(at, header) {
      let mut prev = self.header(prev_at);
      prev.size += header.size + HEADER_SIZE;
      self.used -= HEADER_SIZE;
      at = prev_at;
      header = prev;
    }
    if let Some(next_at) = self.free_next(at, header) {
      header.size += HEADER_SIZE + self.header(next_at).size;
      self.used -= HEADER_SIZE;
    }

    self.write_header(at, header);
    self.link_next(at);
    at
  }

  fn resize_in_place(
    &mut self,
    at: usize,
    header: Header,
    prev: Option<usize>,
    next: Option<usize>,
    new_size: usize,
  ) -> Addr {
    let next_size = next.map(|n| self.header(n).size);
    // Split recounts the payload it hands out.
    self.used -= header.size;

    let mut at = at;
    let mut block = Header::new(header.size, header.prev_size, true);

    if let Some(prev_at) = prev {
      let prev_header = self.header(prev_at);
      let payload = at + HEADER_SIZE..at + HEADER_SIZE + header.size;
      self.arena.copy_within(payload, prev_at + HEADER_SIZE);

      block.size += prev_header.size + HEADER_SIZE;
      block.prev_size = prev_header.prev_size;
      self.used -= HEADER_SIZE;
      at = prev_at;
    }
    if let Some(size) = next_size {
      block.size += size + HEADER_SIZE;
      self.used -= HEADER_SIZE;
    }

    self.write_header(at, block);
    self.split(at, new_size);
    Addr(at + HEADER_SIZE)
  }

  /// Moves the block to a fresh allocation. The old block is released only
  /// once the new one exists.
  fn relocate(
    &mut self,
    addr: Addr,
    old_size: usize,
    new_size: usize,
  ) -> Result<Option<Addr>, AllocError> {
    let Some(new_addr) = self.allocate(new_size)? else {
      awarn!("Relocating {} to {} bytes failed, keeping the original", addr, new_size);
      return Ok(None);
    };

    let len = cmp::min(old_size, new_size);
    self.arena.copy_within(addr.0..addr.0 + len, new_addr.0);
    self.free(addr)?;

    ainfo!("Relocated {} to {} ({} bytes)", addr, new_addr, new_size);
    Ok(Some(new_addr))
  }
}

impl fmt::Debug for ArenaAllocator {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("ArenaAllocator")
      .field("arena", &self.arena)
      .field("used", &self.used)
      .field("blocks", &self.blocks().count())
      .finish()
  }
}

/// Iterator over the blocks of an [`ArenaAllocator`], in address order.
#[derive(Debug)]
pub struct Blocks<'a> {
  allocator: &'a ArenaAllocator,
  offset: usize,
}

impl Iterator for Blocks<'_> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<BlockInfo> {
    if self.offset + HEADER_SIZE > self.allocator.total_size() {
      return None;
    }
    let block = BlockInfo::from_header(self.offset, self.allocator.header(self.offset));
    self.offset = block.end();
    Some(block)
  }
}

/// Printable occupancy table returned by [`ArenaAllocator::dump`].
///
/// ```text
/// Total size: 1024
/// Used: 528
/// Header size: 8
/// - 0x0000 512
/// + 0x0208 496
/// ```
#[derive(Debug)]
pub struct Dump<'a>(&'a ArenaAllocator);

impl fmt::Display for Dump<'_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "Total size: {}", self.0.total_size())?;
    writeln!(f, "Used: {}", self.0.used())?;
    writeln!(f, "Header size: {}", HEADER_SIZE)?;
    for block in self.0.blocks() {
      writeln!(f, "{}", block)?;
    }
    Ok(())
  }
}
