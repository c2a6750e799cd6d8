//! Rotation cursor shared by the rotation-style strategies.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically advancing counter.
///
/// The cursor is never reset; it wraps only through the modulo applied by
/// callers (and through `u64` overflow, which `fetch_add` wraps silently).
#[derive(Debug, Default)]
pub struct RotationCursor {
    position: AtomicU64,
}

impl RotationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one and return the value held before the advance.
    pub fn advance(&self) -> u64 {
        self.position.fetch_add(1, Ordering::Relaxed)
    }

    /// Current position without advancing.
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    /// Advance and reduce modulo `len`. Does not advance when `len` is zero.
    pub fn pick(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some((self.advance() % len as u64) as usize)
    }
}
