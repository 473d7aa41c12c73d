//! therapist-core: settings and database session lifecycle
//!
//! Everything an HTTP handler needs before it can touch the database:
//! a validated [`Settings`] value and a [`SessionProvider`] that hands out
//! scoped sessions from a bounded pool.

pub mod config;
pub mod db;
pub mod error;

pub use config::Settings;
pub use db::{ScopedSession, SessionProvider};
pub use error::{ConfigError, DbError};
