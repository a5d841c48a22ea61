//! HTTP surface: routing, gating middleware and handlers.

mod dto;
mod error;
mod middleware;
mod routes;
mod server;
mod state;

pub use error::ApiError;
pub use middleware::{ClientIdentity, UNKNOWN_IDENTITY};
pub use routes::router;
pub use server::HttpServer;
pub use state::AppState;
