/// Alignment unit of every payload size handed out by the arena, in bytes.
pub const ALIGNMENT: usize = 4;

/// Rounds the given size up to the arena's alignment unit.
///
/// Sizes that are already a multiple of [`ALIGNMENT`] are left unchanged.
///
/// # Examples
///
/// ```rust
/// use rallocator::align;
///
/// assert_eq!(align!(13), 16);
/// assert_eq!(align!(12), 12);
/// assert_eq!(align!(1), 4);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::ALIGNMENT - 1) & !($crate::align::ALIGNMENT - 1)
  };
}

/// Whether `size` is a multiple of [`ALIGNMENT`].
pub const fn is_aligned(size: usize) -> bool {
  size % ALIGNMENT == 0
}
