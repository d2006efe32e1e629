//! Typed error definitions for Cache Refresher.
//!
//! All errors are serializable (so the HTTP API can report them verbatim),
//! displayable for logging, and matchable by variant.

mod config;
mod refresh;

pub use config::ConfigError;
pub use refresh::RefreshError;
