//! Notification dispatch to the chat transport layer.

mod events;
mod handle;

pub use events::NotifyEvent;
pub use handle::{create_notifier, Notification, NotifierHandle};
