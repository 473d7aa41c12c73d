//! Database layer - connection pool and scoped sessions
//!
//! - One pool per process, created from [`DatabaseSettings`](crate::config::DatabaseSettings)
//! - One [`ScopedSession`] per request, released on drop
//! - No implicit commits; transactions are caller-driven

pub mod pool;
pub mod session;

pub use pool::{PoolSizing, SessionProvider, PROBE_QUERY};
pub use session::{ScopedSession, SessionStats};
