//! Backing storage for the allocator.
//!
//! The arena is reserved from the C heap exactly once and handed back as a
//! whole when it is dropped.

use std::{
  fmt,
  ops::{Deref, DerefMut},
  ptr::NonNull,
  slice,
};

use crate::error::AllocError;

/// A fixed-size, zero-initialized byte buffer obtained with `calloc(3)`.
pub(crate) struct RawArena {
  ptr: NonNull<u8>,
  len: usize,
}

impl RawArena {
  /// Reserves `len` zeroed bytes.
  pub fn reserve(len: usize) -> Result<Self, AllocError> {
    // SAFETY: calloc accepts any element count and returns either null or a
    // pointer to `len` zeroed bytes.
    let raw = unsafe { libc::calloc(len, 1) } as *mut u8;

    match NonNull::new(raw) {
      Some(ptr) => Ok(Self { ptr, len }),
      None => Err(AllocError::ReserveFailed { size: len }),
    }
  }

  pub fn as_ptr(&self) -> *const u8 {
    self.ptr.as_ptr()
  }

  pub fn as_mut_ptr(&mut self) -> *mut u8 {
    self.ptr.as_ptr()
  }
}

impl Deref for RawArena {
  type Target = [u8];

  fn deref(&self) -> &[u8] {
    // SAFETY: `ptr` owns `len` initialized bytes for the lifetime of `self`.
    unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
  }
}

impl DerefMut for RawArena {
  fn deref_mut(&mut self) -> &mut [u8] {
    // SAFETY: as above, and `&mut self` guarantees exclusive access.
    unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
  }
}

impl Drop for RawArena {
  fn drop(&mut self) {
    // SAFETY: `ptr` came from calloc and is released only here.
    unsafe { libc::free(self.ptr.as_ptr().cast()) };
  }
}

impl fmt::Debug for RawArena {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("RawArena")
      .field("ptr", &self.ptr)
      .field("len", &self.len)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_reserve_zeroed() {
    let arena = RawArena::reserve(64).expect("Failed to reserve arena");

    assert_eq!(arena.len(), 64);
    assert!(arena.iter().all(|&b| b == 0));
  }

  #[test]
  fn test_write_through_slice() {
    let mut arena = RawArena::reserve(16).expect("Failed to reserve arena");
    arena[3] = 0xAB;
    arena.copy_within(0..4, 8);

    assert_eq!(arena[11], 0xAB);
    assert_eq!(unsafe { *arena.as_ptr().add(3) }, 0xAB);
  }
}
