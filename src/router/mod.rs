//! Router module for provider selection.
//!
//! Turns an (application id, destination country) pair into the name of the
//! provider that should deliver the message, using the ordered routing rules.

mod selector;

pub use selector::{select, MatchContext};
