//! Upper bounds on serial sizes, list lengths and record nesting.
//!
//! Every encode and decode call is checked against a [`Limits`] value. The
//! convenience entry points use the process-wide values, which start at the
//! compiled defaults and may be adjusted with [`set_size_max`],
//! [`set_list_max`] and [`set_depth_max`]. Set them once at startup: calls
//! already in flight keep the snapshot they took.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default upper limit for serial byte sizes: 16 MiB.
pub const DEFAULT_SIZE_MAX: usize = 16 * 1024 * 1024;

/// Default upper limit for the number of elements in a list.
pub const DEFAULT_LIST_MAX: usize = 64 * 1024;

/// Default upper limit for records nested below the top-level record.
pub const DEFAULT_DEPTH_MAX: usize = 100;

static SIZE_MAX: AtomicUsize = AtomicUsize::new(DEFAULT_SIZE_MAX);
static LIST_MAX: AtomicUsize = AtomicUsize::new(DEFAULT_LIST_MAX);
static DEPTH_MAX: AtomicUsize = AtomicUsize::new(DEFAULT_DEPTH_MAX);

/// Ceilings consulted by the encoder and decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum serial size of one record, and of any single text or binary payload.
    pub size_max: usize,
    /// Maximum number of elements in one list field.
    pub list_max: usize,
    /// Maximum nesting of records, through references and list elements,
    /// below the record being encoded or decoded. Bounds recursion on
    /// self-referencing types.
    pub depth_max: usize,
}

impl Limits {
    /// Size and list limits with the default nesting depth.
    pub const fn new(size_max: usize, list_max: usize) -> Self {
        Limits {
            size_max,
            list_max,
            depth_max: DEFAULT_DEPTH_MAX,
        }
    }

    pub const fn with_depth_max(mut self, depth_max: usize) -> Self {
        self.depth_max = depth_max;
        self
    }

    /// Snapshot of the process-wide limits.
    pub fn current() -> Self {
        Limits {
            size_max: SIZE_MAX.load(Ordering::Relaxed),
            list_max: LIST_MAX.load(Ordering::Relaxed),
            depth_max: DEPTH_MAX.load(Ordering::Relaxed),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits::new(DEFAULT_SIZE_MAX, DEFAULT_LIST_MAX)
    }
}

/// Current process-wide serial size limit.
pub fn size_max() -> usize {
    SIZE_MAX.load(Ordering::Relaxed)
}

/// Current process-wide list length limit.
pub fn list_max() -> usize {
    LIST_MAX.load(Ordering::Relaxed)
}

/// Current process-wide nesting depth limit.
pub fn depth_max() -> usize {
    DEPTH_MAX.load(Ordering::Relaxed)
}

/// Adjust the process-wide serial size limit, returning the previous value.
pub fn set_size_max(max: usize) -> usize {
    let prev = SIZE_MAX.swap(max, Ordering::Relaxed);
    log::debug!("colfer: serial size limit changed from {} to {}", prev, max);
    prev
}

/// Adjust the process-wide list length limit, returning the previous value.
pub fn set_list_max(max: usize) -> usize {
    let prev = LIST_MAX.swap(max, Ordering::Relaxed);
    log::debug!("colfer: list length limit changed from {} to {}", prev, max);
    prev
}

/// Adjust the process-wide nesting depth limit, returning the previous value.
pub fn set_depth_max(max: usize) -> usize {
    let prev = DEPTH_MAX.swap(max, Ordering::Relaxed);
    log::debug!("colfer: nesting depth limit changed from {} to {}", prev, max);
    prev
}
