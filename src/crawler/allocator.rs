//! Shared page-number source

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out strictly increasing page numbers to concurrent workers
///
/// Every call to [`next`](Self::next) returns a value no other call has
/// seen. Numbers are never given back; a worker retrying a page simply keeps
/// the number it already holds.
#[derive(Debug)]
pub struct PageAllocator {
    next: AtomicU64,
}

impl PageAllocator {
    /// Creates an allocator whose first page is `origin`
    pub fn new(origin: u64) -> Self {
        Self {
            next: AtomicU64::new(origin),
        }
    }

    /// Claims the next page number
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for PageAllocator {
    fn default() -> Self {
        Self::new(1)
    }
}
