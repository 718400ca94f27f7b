//! Disk-backed caching for registry lookups
//!
//! This module provides a single-slot cache cell that persists a refreshed
//! value to the filesystem and serves it back under a layered degradation
//! policy: prefer a fresh refresh, fall back to the stale disk copy when the
//! refresh fails, and seed cold caches from an optional bootstrap file. The
//! cache root is resolved per platform with an environment override.

mod cell;
mod dir;

pub use cell::{CacheCell, CacheError, ReadError, RefreshError, WriteError};
pub use dir::{cache_root, CACHE_DIR_ENV};
