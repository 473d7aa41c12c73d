//! Scoped sessions
//!
//! A [`ScopedSession`] owns one pooled connection for the span of a single
//! request. Dropping it hands the connection back to the pool, whatever
//! path the caller leaves by (return, `?`, panic). Nothing is committed on
//! the caller's behalf: writes go through [`ScopedSession::begin`] and roll
//! back unless the returned transaction is committed.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sqlx::pool::PoolConnection;
use sqlx::{Connection, PgConnection, Postgres, Transaction};
use tracing::trace;

use crate::error::DbError;

/// Point-in-time session counters for one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub opened: u64,
    pub released: u64,
}

impl SessionStats {
    /// Sessions currently checked out
    pub fn in_use(&self) -> u64 {
        self.opened - self.released
    }
}

#[derive(Debug, Default)]
pub(crate) struct SessionCounters {
    opened: AtomicU64,
    released: AtomicU64,
}

impl SessionCounters {
    pub(crate) fn snapshot(&self) -> SessionStats {
        // Read released first so in_use() never underflows
        let released = self.released.load(Ordering::Acquire);
        let opened = self.opened.load(Ordering::Acquire);
        SessionStats { opened, released }
    }
}

/// Bookkeeping token: counts one open on creation and one release on drop.
#[derive(Debug)]
pub(crate) struct Lease {
    counters: Arc<SessionCounters>,
    id: u64,
}

impl Lease {
    pub(crate) fn open(counters: &Arc<SessionCounters>) -> Self {
        let id = counters.opened.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(session = id, "session opened");
        Self {
            counters: Arc::clone(counters),
            id,
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::AcqRel);
        trace!(session = self.id, "session released");
    }
}

/// One request's unit of work, bound to a single pooled connection.
///
/// Derefs to [`PgConnection`], so queries run as
/// `sqlx::query("...").execute(&mut *session)`.
#[derive(Debug)]
pub struct ScopedSession {
    // Field order matters: the connection goes back to the pool before
    // the lease records the release.
    conn: PoolConnection<Postgres>,
    lease: Lease,
}

impl ScopedSession {
    pub(crate) fn new(conn: PoolConnection<Postgres>, counters: &Arc<SessionCounters>) -> Self {
        Self {
            conn,
            lease: Lease::open(counters),
        }
    }

    /// Sequence number of this session within its provider
    pub fn id(&self) -> u64 {
        self.lease.id
    }

    /// Round-trip to the server on this session's connection.
    pub async fn ping(&mut self) -> Result<(), DbError> {
        Connection::ping(&mut *self.conn).await?;
        Ok(())
    }

    /// Start an explicit transaction. It rolls back on drop unless
    /// [`Transaction::commit`] is called.
    pub async fn begin(&mut self) -> Result<Transaction<'_, Postgres>, DbError> {
        Ok(Connection::begin(&mut *self.conn).await?)
    }

    /// Hand the connection back to the pool now rather than at scope end.
    pub fn release(self) {
        drop(self);
    }
}

impl Deref for ScopedSession {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        &self.conn
    }
}

impl DerefMut for ScopedSession {
    fn deref_mut(&mut self) -> &mut PgConnection {
        &mut self.conn
    }
}
