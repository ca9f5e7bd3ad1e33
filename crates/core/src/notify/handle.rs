use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::ticket::Actor;

use super::NotifyEvent;

/// A notification addressed to one side of a ticket conversation.
#[derive(Debug, Clone)]
pub struct Notification {
    pub timestamp: DateTime<Utc>,
    /// Which role the transport should deliver this to.
    pub recipient: Actor,
    pub event: NotifyEvent,
}

/// Handle for emitting notifications to the transport layer.
///
/// Cheaply cloneable and shareable across tasks. Notifications travel through
/// an async channel; the transport layer owns the receiving side.
#[derive(Clone)]
pub struct NotifierHandle {
    tx: mpsc::Sender<Notification>,
}

impl NotifierHandle {
    /// Create a new handle from a channel sender.
    pub fn new(tx: mpsc::Sender<Notification>) -> Self {
        Self { tx }
    }

    /// Emit a notification asynchronously.
    ///
    /// If the channel is full or closed, the error is logged but the caller
    /// is not blocked or failed; the underlying state transition has already
    /// committed and must not be rolled back.
    pub async fn emit(&self, recipient: Actor, event: NotifyEvent) {
        let notification = Notification {
            timestamp: Utc::now(),
            recipient,
            event,
        };
        if let Err(e) = self.tx.send(notification).await {
            tracing::error!("Failed to emit notification: {}", e);
        }
    }

    /// Try to emit a notification without blocking.
    ///
    /// Returns true if it was queued successfully.
    pub fn try_emit(&self, recipient: Actor, event: NotifyEvent) -> bool {
        let notification = Notification {
            timestamp: Utc::now(),
            recipient,
            event,
        };
        match self.tx.try_send(notification) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to emit notification: {}", e);
                false
            }
        }
    }
}

/// Create a notification channel.
///
/// Returns:
/// - `NotifierHandle` - for emitting notifications (clone to share)
/// - `mpsc::Receiver<Notification>` - drained by the chat transport layer
pub fn create_notifier(buffer_size: usize) -> (NotifierHandle, mpsc::Receiver<Notification>) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (NotifierHandle::new(tx), rx)
}
