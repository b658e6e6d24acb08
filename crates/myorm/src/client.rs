//! The database collaborator seam.
//!
//! The core never talks to a socket: everything it needs from the engine goes
//! through [`DbClient`], a narrow synchronous contract (describe a table,
//! execute a statement, fetch rows, report the last inserted id). Connection
//! lifetime is scoped through [`Session`], and reconnect-on-error is an explicit
//! caller-parameterized [`RetryPolicy`] wrapper rather than hidden retry logic.

use crate::error::OrmResult;
use crate::row::Row;
use crate::schema::ColumnInfo;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

/// Minimum contract a database collaborator must provide.
///
/// Implementations are synchronous and blocking; cancellation and timeouts
/// belong to the transport, not this layer.
pub trait DbClient {
    /// Ensure a live connection. Idempotent.
    fn connect(&mut self) -> OrmResult<()>;

    /// Close the connection if open. Idempotent.
    fn disconnect(&mut self);

    /// Whether a live connection exists.
    fn is_connected(&self) -> bool;

    /// Schema metadata for one table, in column order.
    ///
    /// Failures (unknown table, connectivity loss) surface as the
    /// collaborator's database error, never swallowed.
    fn describe(&mut self, table: &str) -> OrmResult<Vec<ColumnInfo>>;

    /// Execute a statement string.
    fn execute(&mut self, statement: &str) -> OrmResult<()>;

    /// All rows produced by the last executed statement.
    fn fetch_all(&mut self) -> OrmResult<Vec<Row>>;

    /// Next row produced by the last executed statement, if any.
    fn fetch_one(&mut self) -> OrmResult<Option<Row>>;

    /// Id generated by the last INSERT.
    fn last_insert_id(&mut self) -> OrmResult<u64>;
}

/// Scoped connection guard: opening ensures a live connection, dropping closes
/// it on every exit path, error or not.
///
/// # Example
/// ```ignore
/// let mut session = Session::open(&mut client)?;
/// session.execute(&sql)?;
/// let rows = session.fetch_all()?;
/// // connection closed when `session` drops
/// ```
pub struct Session<'a, C: DbClient + ?Sized> {
    client: &'a mut C,
}

impl<'a, C: DbClient + ?Sized> Session<'a, C> {
    /// Connect and hand back the guard.
    pub fn open(client: &'a mut C) -> OrmResult<Self> {
        client.connect()?;
        Ok(Self { client })
    }
}

impl<C: DbClient + ?Sized> Deref for Session<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.client
    }
}

impl<C: DbClient + ?Sized> DerefMut for Session<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.client
    }
}

impl<C: DbClient + ?Sized> Drop for Session<'_, C> {
    fn drop(&mut self) {
        self.client.disconnect();
    }
}

/// Reconnect-and-retry policy for statement execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1).
    pub max_attempts: u32,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    /// One reconnect-and-retry after the initial attempt.
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_millis(50),
        }
    }
}

/// Execute a statement, reconnecting and retrying per `policy` on database
/// errors. The final failure propagates unchanged.
pub fn execute_with_retry<C: DbClient + ?Sized>(
    client: &mut C,
    statement: &str,
    policy: &RetryPolicy,
) -> OrmResult<()> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match client.execute(statement) {
            Ok(()) => return Ok(()),
            Err(err) if attempt < attempts => {
                tracing::warn!(%err, attempt, "statement failed, reconnecting and retrying");
                if !policy.backoff.is_zero() {
                    std::thread::sleep(policy.backoff);
                }
                client.disconnect();
                client.connect()?;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
