//! Database query modules.
//!
//! - plugin_data: key/value records scoped by plugin id
//! - transfer_history: previously recorded titles per TMDB identity

pub mod plugin_data;
pub mod transfer_history;
