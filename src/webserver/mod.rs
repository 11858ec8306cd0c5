/// HTTP and WebSocket surface
///
/// A thin dispatcher: handlers validate the request, call into the topic
/// directory and broadcast hub, and map `TopicError` onto status codes.
mod server;

pub mod models;
pub mod routes;
pub mod state;
pub mod utils;
pub mod ws;

pub use server::{build_app, serve, shutdown, start_server, wait_for_shutdown};
pub use state::AppState;
