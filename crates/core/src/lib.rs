pub mod autoclose;
pub mod clock;
pub mod config;
pub mod lifecycle;
pub mod metrics;
pub mod notify;
pub mod testing;
pub mod ticket;

pub use autoclose::{AutoCloseConfig, AutoCloseScheduler, TickSummary};
pub use clock::{Clock, SystemClock};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    ServerConfig, TicketsConfig,
};
pub use lifecycle::{apply_event, TicketEvent, TicketLifecycle};
pub use notify::{create_notifier, Notification, NotifierHandle, NotifyEvent};
pub use ticket::{
    Actor, CloseReason, CreateTicketRequest, SqliteTicketStore, StoreStats, ThreadMessage, Ticket,
    TicketError, TicketFilter, TicketMutation, TicketPolicy, TicketStatus, TicketStore,
};
