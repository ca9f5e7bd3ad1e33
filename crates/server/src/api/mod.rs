mod handlers;
mod routes;
mod tickets;

pub use routes::create_router;
