//! Wall clock for browser and edge runtimes.

use oidc_rp_core::Clock;

/// [`Clock`] over `Date.now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebClock;

impl Clock for WebClock {
    fn now_secs(&self) -> u64 {
        (js_sys::Date::now() / 1000.0) as u64
    }
}
