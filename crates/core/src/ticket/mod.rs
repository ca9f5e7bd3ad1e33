//! Ticket records and their storage.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTicketStore;
pub use store::{
    CreateTicketRequest, StoreStats, TicketError, TicketFilter, TicketMutation, TicketPolicy,
    TicketStore,
};
pub use types::{Actor, CloseReason, ThreadMessage, Ticket, TicketStatus};
