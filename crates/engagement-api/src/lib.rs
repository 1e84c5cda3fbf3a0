//! HTTP/SSE surface binding the domain crates to `/v1`.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod sse;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
