//! Auto-close scheduling for tickets that go unanswered.

mod config;
mod runner;

pub use config::AutoCloseConfig;
pub use runner::{AutoCloseScheduler, TickSummary};
