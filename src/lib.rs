//! smsgate - Rule-based SMS gateway
//!
//! This library provides the core functionality for the smsgate server,
//! including configuration, provider selection, and vendor delivery.

pub mod config;
pub mod error;
pub mod proxy;
pub mod router;
pub mod sms;

pub use config::Config;
pub use error::{Error, Result};
