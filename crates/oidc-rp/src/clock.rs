//! Wall clock.

use oidc_rp_core::Clock;
use std::time::{SystemTime, UNIX_EPOCH};

/// [`Clock`] over [`SystemTime`].
///
/// A system time before the epoch reads as 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
