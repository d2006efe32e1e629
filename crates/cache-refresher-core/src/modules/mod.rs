//! Persistence and host-side helpers.

pub mod settings;
