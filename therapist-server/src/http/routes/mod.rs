//! Route handlers
//!
//! - root: service banner
//! - health: database-backed health check
//! - info: static API information

pub mod health;
pub mod info;
pub mod root;
