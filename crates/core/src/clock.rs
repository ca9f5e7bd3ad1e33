//! Time source abstraction.
//!
//! The store stamps `updated_at` and the scheduler compares idle durations
//! against the same clock, so both receive one shared `Arc<dyn Clock>`.

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
