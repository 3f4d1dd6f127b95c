//! # rallocator - A Fixed Arena Memory Allocator
//!
//! This crate provides a general-purpose **boundary-tag allocator** that carves
//! allocations out of a single arena reserved once at construction. After that
//! it never asks the system for memory again; the arena is handed back as a
//! whole when the allocator is dropped.
//!
//! ## Overview
//!
//! The arena is tiled by blocks. Every block is a header followed by its payload,
//! and the last payload ends exactly at the arena end:
//!
//! ```text
//!   Arena (1024 bytes) after allocate(512), allocate(256):
//!
//!   ┌────┬──────────────────┬────┬──────────┬────┬──────────────┐
//!   │ H  │   512 (used)     │ H  │256 (used)│ H  │  232 (free)  │
//!   └────┴──────────────────┴────┴──────────┴────┴──────────────┘
//!   0    8                  520  528        784  792         1024
//!        ▲                       ▲
//!        └── Addr(8)             └── Addr(528)
//! ```
//!
//! Each header records the payload size of its own block and of the block
//! before it, so the allocator can step to either neighbour:
//!
//! ```text
//!   next header = this header + HEADER_SIZE + size
//!   prev header = this header - HEADER_SIZE - prev_size
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rallocator
//!   ├── align      - Alignment unit and the align! macro
//!   ├── allocator  - ArenaAllocator: allocate, free, resize, reset, dump
//!   ├── arena      - calloc-backed storage (internal)
//!   ├── block      - Header encoding and BlockInfo
//!   ├── config     - ArenaConfig and environment overrides
//!   └── error      - AllocError
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rallocator::ArenaAllocator;
//!
//! let mut allocator = ArenaAllocator::new(1024).unwrap();
//!
//! let addr = allocator.allocate(10).unwrap().expect("arena is empty");
//! allocator.payload_mut(addr).unwrap()[..5].copy_from_slice(b"hello");
//!
//! let addr = allocator.resize(addr, 100).unwrap().expect("room to grow");
//! assert_eq!(&allocator.payload(addr).unwrap()[..5], b"hello");
//!
//! allocator.free(addr).unwrap();
//! assert_eq!(allocator.blocks().count(), 1);
//! ```
//!
//! ## How It Works
//!
//! - **Allocation** rounds the request up to [`ALIGNMENT`] and takes the first
//!   free block large enough (first-fit). Whatever is left over becomes a new
//!   free block when it can hold a header.
//! - **Freeing** merges the block with a free predecessor and a free successor,
//!   so two free blocks are never adjacent.
//! - **Resizing** absorbs free neighbours when that makes enough room, moving the
//!   payload backwards if the predecessor is taken over. Otherwise the block is
//!   copied into a fresh allocation; the original is only released once the copy
//!   exists.
//! - **Reset** forgets every block and returns to one free block.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **Bounded blocks**: Sizes are stored in 16 bits, so arenas are capped at
//!   [`MAX_BLOCK_SIZE`] + [`HEADER_SIZE`] bytes
//! - **Best-effort validation**: Addresses are checked against the block list,
//!   but an address from another arena can still match a block here

#[macro_use]
#[allow(unused_macros)]
pub(crate) mod alog;

pub mod align;
mod allocator;
mod arena;
mod block;
pub mod config;
mod error;

use std::sync::atomic::{AtomicBool, Ordering};

pub use align::ALIGNMENT;
pub use allocator::{Addr, ArenaAllocator, Blocks, Dump};
pub use block::{BlockInfo, HEADER_SIZE, MAX_BLOCK_SIZE};
pub use config::ArenaConfig;
pub use error::AllocError;

pub(crate) static ALLOC_LOG: AtomicBool = AtomicBool::new(false);

/// Enables logging for the allocator.
pub fn enable_logging() {
  ALLOC_LOG.store(true, Ordering::Relaxed);
}

/// Disables logging for the allocator
pub fn disable_logging() {
  ALLOC_LOG.store(false, Ordering::Relaxed);
}

pub(crate) fn should_log() -> bool {
  ALLOC_LOG.load(Ordering::Relaxed)
}
