//! HTTP API for the federated media index.

mod groups;
mod handlers;
mod media;
mod routes;

pub use routes::create_router;

use serde::Serialize;

/// Error body shared by all handlers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
