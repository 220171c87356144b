//! HTTP server module.
//!
//! This module provides the HTTP API that accepts send requests and hands
//! them to the dispatch service.

mod handlers;
mod server;
pub mod types;

pub use handlers::SMSGATE_PROVIDER_HEADER;
pub use server::{create_router, run_server, AppState, RequestId, SMSGATE_REQUEST_ID_HEADER};
pub use types::{Code, ResponseBody, SendRequest};
