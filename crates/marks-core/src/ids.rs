//! Identifier generation
//!
//! Ids are plain integers that start out looking like millisecond Unix
//! timestamps. The generator hands out `max(now_ms, last + 1)`, so many ids
//! minted in the same millisecond never collide. Callers may rely on
//! uniqueness only, never on ordering.
//!
//! Once `i64::MAX` has been handed out or observed the generator is
//! exhausted and every further `next` fails instead of wrapping.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use crate::error::{Error, Result};

/// Process-wide unique id source
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return an id distinct from every id this generator produced before
    pub fn next(&self) -> Result<i64> {
        let now = Utc::now().timestamp_millis();
        self.last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                last.checked_add(1).map(|n| now.max(n))
            })
            .map(|prev| now.max(prev.saturating_add(1)))
            .map_err(|last| {
                Error::validation(format!("No identifiers left after {}", last))
            })
    }

    /// Make sure future ids are greater than `id`
    ///
    /// Called with the largest id of a loaded snapshot so ids stay unique
    /// across restarts even if the clock went backwards.
    pub fn observe(&self, id: i64) {
        self.last.fetch_max(id, Ordering::SeqCst);
    }
}
