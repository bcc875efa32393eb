//! GiveLink Core Library
//!
//! This crate provides the search and discovery subsystem for GiveLink,
//! a donation marketplace backend:
//! - Query planning (ranked full-text path with substring fallback)
//! - Typeahead suggestions across donations and users
//! - Best-effort search logging, per-user history, and popular terms
//! - Admin analytics over the search log
//! - Storage (SQLite with versioned migrations)
//!
//! Surrounding concerns of the marketplace (authentication, donation CRUD,
//! uploads, rate limiting, HTTP routing) live in other services; this crate
//! only reads their records and exposes the search surface.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::search::{SearchRequest, SearchService};
    pub use crate::error::{Error, Result};
}
