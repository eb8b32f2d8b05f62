use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;
use thiserror::Error;

use crate::models::{Day, ScoreRecord, ServerId, UserId};

pub mod schema;
pub mod scores;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a score for user {user} on server {server} for day {day} already exists")]
    DuplicateKey { user: UserId, server: ServerId, day: Day },

    #[error("storage fault: {0}")]
    Fault(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable mapping of (user, server, day) to a result.
///
/// Implementations must keep at most one record per key, and `record` must
/// perform its duplicate check and write as a single atomic step.
pub trait ScoreStore: Send + Sync {
    fn exists(&self, user: UserId, server: ServerId, day: Day) -> StoreResult<bool>;

    /// Inserts a record, failing with [`StoreError::DuplicateKey`] if its key is taken.
    fn insert(&self, record: &ScoreRecord) -> StoreResult<()>;

    /// Inserts a record unless its key is taken.
    /// Returns `true` if it was newly added, false otherwise.
    fn record(&self, record: &ScoreRecord) -> StoreResult<bool>;

    /// Every record for the user on the server, newest day first.
    fn all_records(&self, user: UserId, server: ServerId) -> StoreResult<Vec<ScoreRecord>>;

    /// Solved records for the user on the server, newest day first.
    fn non_failed_records(&self, user: UserId, server: ServerId) -> StoreResult<Vec<ScoreRecord>>;

    /// Mean result per user over solved records with a result of at least 1.
    ///
    /// First-guess solves (0) are left out here but not in a user's own average.
    fn server_averages(&self, server: ServerId) -> StoreResult<HashMap<UserId, f64>>;
}

/// [`ScoreStore`] backed by a SQLite database.
pub struct SqliteScoreStore {
    connection: Mutex<Connection>,
}

impl SqliteScoreStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        log::debug!("[open] Opening score database at {}", path.as_ref().display());
        Self::initialize(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(connection: Connection) -> StoreResult<Self> {
        log::debug!("[initialize] creating Scores table...");
        connection.execute(schema::SCORES_SCHEMA, [])?;

        Ok(Self { connection: Mutex::new(connection) })
    }

    /// The connection is only ever held for the span of one statement,
    /// so a poisoned lock still guards a usable connection.
    fn connect(&self) -> MutexGuard<'_, Connection> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Turns a uniqueness violation into `Ok(false)`; any other error is passed through.
pub(crate) fn swallow_constraint_violation(err: rusqlite::Error) -> StoreResult<bool> {
    if is_unique_violation(&err) {
        log::trace!("[swallow_constraint_violation] Row already present: {err}");
        Ok(false)
    } else {
        Err(err.into())
    }
}
