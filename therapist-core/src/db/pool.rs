//! Connection pool and session provider
//!
//! The pool is built lazily: constructing a [`SessionProvider`] never
//! touches the network, so an unreachable database first shows up on
//! [`SessionProvider::acquire`] or [`SessionProvider::probe`].
//!
//! Exhaustion policy: once `base + overflow` connections are checked out,
//! `acquire` waits up to `acquire_timeout` for one to come back and then
//! fails with [`DbError::AcquireTimeout`].
//!
//! Liveness checks ([`SessionProvider::check`], [`SessionProvider::probe`])
//! run under the much shorter `check_timeout`: sqlx retries a refused
//! connection until the acquire deadline, and a health check must answer
//! well before that.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use tracing::{debug, error, info};

use super::session::{ScopedSession, SessionCounters, SessionStats};
use crate::config::DatabaseSettings;
use crate::error::DbError;

/// Connections kept open while idle
pub const DEFAULT_POOL_BASE: u32 = 10;

/// Extra connections allowed under load, reaped once idle
pub const DEFAULT_POOL_OVERFLOW: u32 = 20;

const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

/// Trivial statement used for liveness checks
pub const PROBE_QUERY: &str = "SELECT 1";

/// Pool sizing and timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSizing {
    pub base: u32,
    pub overflow: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    /// Deadline for one liveness check (acquire + trivial query)
    pub check_timeout: Duration,
}

impl Default for PoolSizing {
    fn default() -> Self {
        Self {
            base: DEFAULT_POOL_BASE,
            overflow: DEFAULT_POOL_OVERFLOW,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }
}

impl PoolSizing {
    /// Upper bound on concurrently checked-out connections
    pub fn max_connections(&self) -> u32 {
        self.base + self.overflow
    }
}

/// Owns the pool and hands out scoped sessions.
///
/// Cheap to clone; clones share the pool and the session counters.
#[derive(Debug, Clone)]
pub struct SessionProvider {
    pool: PgPool,
    sizing: PoolSizing,
    target: Arc<str>,
    counters: Arc<SessionCounters>,
}

impl SessionProvider {
    /// Build the provider with the default sizing (10 + 20 overflow).
    ///
    /// Must be called from within a Tokio runtime. `debug` turns on SQL
    /// statement logging (emitted at `debug` level by sqlx).
    pub fn initialize(settings: &DatabaseSettings, debug: bool) -> Self {
        Self::initialize_with(settings, debug, PoolSizing::default())
    }

    /// Build the provider with explicit sizing.
    pub fn initialize_with(settings: &DatabaseSettings, debug: bool, sizing: PoolSizing) -> Self {
        let mut options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(settings.password.expose())
            .database(&settings.service);
        if !debug {
            options = options.disable_statement_logging();
        }

        Self::build(options, sizing, settings.target())
    }

    /// Build the provider from a `postgres://` URL.
    pub fn from_url(url: &str, debug: bool, sizing: PoolSizing) -> Result<Self, DbError> {
        let mut options: PgConnectOptions = url.parse()?;
        if !debug {
            options = options.disable_statement_logging();
        }

        let target = format!(
            "{}@{}:{}/{}",
            options.get_username(),
            options.get_host(),
            options.get_port(),
            options.get_database().unwrap_or_default()
        );
        Ok(Self::build(options, sizing, target))
    }

    fn build(options: PgConnectOptions, sizing: PoolSizing, target: String) -> Self {
        let pool = PgPoolOptions::new()
            .min_connections(sizing.base)
            .max_connections(sizing.max_connections())
            .acquire_timeout(sizing.acquire_timeout)
            .idle_timeout(sizing.idle_timeout)
            .test_before_acquire(true)
            .connect_lazy_with(options);

        debug!(
            database = %target,
            base = sizing.base,
            overflow = sizing.overflow,
            "Database pool configured"
        );

        Self {
            pool,
            sizing,
            target: target.into(),
            counters: Arc::new(SessionCounters::default()),
        }
    }

    /// Check out one connection as a scoped session.
    ///
    /// # Errors
    ///
    /// [`DbError::AcquireTimeout`] when the pool stays exhausted (or the
    /// server stays unreachable) past the acquisition timeout,
    /// [`DbError::PoolClosed`] after [`close`](Self::close), and
    /// [`DbError::Connection`] for any other driver failure.
    pub async fn acquire(&self) -> Result<ScopedSession, DbError> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| DbError::from_acquire(e, self.sizing.acquire_timeout.as_secs()))?;

        Ok(ScopedSession::new(conn, &self.counters))
    }

    /// Check out a session and run [`PROBE_QUERY`] on it, all within
    /// `check_timeout`. The session is released before returning.
    ///
    /// # Errors
    ///
    /// [`DbError::CheckTimeout`] when the deadline passes first, otherwise
    /// whatever [`acquire`](Self::acquire) or the query reported.
    pub async fn check(&self) -> Result<(), DbError> {
        let deadline = self.sizing.check_timeout;
        let attempt = async {
            let mut session = self.acquire().await?;
            sqlx::query_scalar::<_, i32>(PROBE_QUERY)
                .fetch_one(&mut *session)
                .await?;
            Ok::<(), DbError>(())
        };

        tokio::time::timeout(deadline, attempt)
            .await
            .map_err(|_| DbError::CheckTimeout {
                timeout_ms: deadline.as_millis() as u64,
            })?
    }

    /// Run [`check`](Self::check) and report whether it worked. Never fails.
    pub async fn probe(&self) -> bool {
        match self.check().await {
            Ok(()) => {
                info!(database = %self.target, "Database connection successful");
                true
            }
            Err(e) => {
                error!(database = %self.target, "Database connection failed: {}", e);
                false
            }
        }
    }

    /// Session counters (opened / released)
    pub fn stats(&self) -> SessionStats {
        self.counters.snapshot()
    }

    pub fn sizing(&self) -> PoolSizing {
        self.sizing
    }

    /// Password-free connection target, for logs
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Close every connection. Later acquisitions fail with
    /// [`DbError::PoolClosed`].
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
