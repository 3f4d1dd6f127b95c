/// Errors returned by [`ArenaAllocator`](crate::ArenaAllocator).
///
/// Running out of space is not an error: `allocate` and `resize` report it by
/// returning `Ok(None)`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
  #[error("Arena size {size} is not a multiple of {alignment}")]
  Misaligned { size: usize, alignment: usize },
  #[error("Arena size {size} cannot hold a block header, need at least {minimum} bytes")]
  TooSmall { size: usize, minimum: usize },
  #[error("Arena size {size} exceeds the largest representable arena of {maximum} bytes")]
  TooLarge { size: usize, maximum: usize },
  #[error("Requested an allocation of 0 bytes")]
  ZeroSize,
  #[error("Failed to reserve {size} bytes for the arena")]
  ReserveFailed { size: usize },
  #[error("Address {0:#x} is not the payload start of any block")]
  InvalidAddress(usize),
  #[error("Address {0:#x} points at a free block")]
  NotAllocated(usize),
}
