use serde::{Deserialize, Serialize};

use crate::ticket::{Actor, CloseReason, TicketStatus};

/// Events delivered to the chat transport layer.
///
/// The engine emits exactly one `StatusChanged` per committed status
/// transition; message events additionally produce one `NewMessage` addressed
/// to the other side of the conversation. Rendering, localization, and
/// delivery are the transport's concern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifyEvent {
    /// A ticket moved to a new status.
    StatusChanged {
        ticket_id: String,
        from_status: TicketStatus,
        to_status: TicketStatus,
        /// Close reason, when the transition entered `Closed`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<CloseReason>,
        /// Who caused the transition.
        actor: Actor,
    },

    /// A new message was appended to a ticket thread.
    NewMessage {
        ticket_id: String,
        sender: Actor,
        body: String,
    },
}

impl NotifyEvent {
    /// Returns the event kind as a string.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StatusChanged { .. } => "status_changed",
            Self::NewMessage { .. } => "new_message",
        }
    }

    /// The ticket this event refers to.
    pub fn ticket_id(&self) -> &str {
        match self {
            Self::StatusChanged { ticket_id, .. } | Self::NewMessage { ticket_id, .. } => ticket_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_strings() {
        let event = NotifyEvent::StatusChanged {
            ticket_id: "t-1".to_string(),
            from_status: TicketStatus::New,
            to_status: TicketStatus::InProgress,
            reason: None,
            actor: Actor::Support,
        };
        assert_eq!(event.event_type(), "status_changed");
        assert_eq!(event.ticket_id(), "t-1");

        let event = NotifyEvent::NewMessage {
            ticket_id: "t-2".to_string(),
            sender: Actor::User,
            body: "hello".to_string(),
        };
        assert_eq!(event.event_type(), "new_message");
        assert_eq!(event.ticket_id(), "t-2");
    }

    #[test]
    fn test_status_changed_serialization() {
        let event = NotifyEvent::StatusChanged {
            ticket_id: "t-1".to_string(),
            from_status: TicketStatus::InProgress,
            to_status: TicketStatus::Closed,
            reason: Some(CloseReason::AutoTimeout),
            actor: Actor::Support,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"status_changed""#));
        assert!(json.contains(r#""reason":"auto_timeout""#));

        let deserialized: NotifyEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn test_status_changed_skips_empty_reason() {
        let event = NotifyEvent::StatusChanged {
            ticket_id: "t-1".to_string(),
            from_status: TicketStatus::New,
            to_status: TicketStatus::InProgress,
            reason: None,
            actor: Actor::Support,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("reason"));
    }

    #[test]
    fn test_new_message_serialization() {
        let event = NotifyEvent::NewMessage {
            ticket_id: "t-3".to_string(),
            sender: Actor::Support,
            body: "We shipped a fix".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"new_message""#));

        let deserialized: NotifyEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }
}
