//! HTTP interface: JSON endpoints and the SSE progress stream.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::ApiServer;
