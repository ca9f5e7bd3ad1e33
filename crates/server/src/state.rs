use std::sync::Arc;

use frontdesk_core::{AutoCloseScheduler, Config, TicketLifecycle, TicketStore};

/// Shared application state
pub struct AppState {
    config: Config,
    ticket_store: Arc<dyn TicketStore>,
    lifecycle: Arc<TicketLifecycle>,
    scheduler: Option<Arc<AutoCloseScheduler>>,
}

impl AppState {
    pub fn new(
        config: Config,
        ticket_store: Arc<dyn TicketStore>,
        lifecycle: Arc<TicketLifecycle>,
        scheduler: Option<Arc<AutoCloseScheduler>>,
    ) -> Self {
        Self {
            config,
            ticket_store,
            lifecycle,
            scheduler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ticket_store(&self) -> &dyn TicketStore {
        self.ticket_store.as_ref()
    }

    pub fn lifecycle(&self) -> &TicketLifecycle {
        &self.lifecycle
    }

    pub fn scheduler(&self) -> Option<&AutoCloseScheduler> {
        self.scheduler.as_deref()
    }
}
