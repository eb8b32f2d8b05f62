use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

pub type UserId = u64;
pub type ServerId = u64;
pub type Day = u32;

/// Value stored in the `score` column for a failed attempt.
pub const FAILED_SENTINEL: i64 = -1;

/// Number of guesses the game allows.
pub const MAX_GUESSES: u8 = 6;

/// The outcome of a single day's puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guesses {
    /// Solved in this many guesses (0..=6).
    Solved(u8),
    /// Not solved, shared as "X/6".
    Failed,
}

impl Guesses {
    pub fn is_failed(&self) -> bool {
        matches!(self, Guesses::Failed)
    }

    /// The solve count, or `None` for a failed attempt.
    pub fn solved(&self) -> Option<u8> {
        match self {
            Guesses::Solved(n) => Some(*n),
            Guesses::Failed => None,
        }
    }
}

impl std::fmt::Display for Guesses {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Guesses::Solved(n) => write!(f, "{n}/{MAX_GUESSES}"),
            Guesses::Failed => write!(f, "X/{MAX_GUESSES}"),
        }
    }
}

impl ToSql for Guesses {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Guesses::Solved(n) => i64::from(*n),
            Guesses::Failed => FAILED_SENTINEL,
        };
        Ok(ToSqlOutput::from(value))
    }
}

impl FromSql for Guesses {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_i64()? {
            FAILED_SENTINEL => Ok(Guesses::Failed),
            n @ 0..=6 => Ok(Guesses::Solved(n as u8)),
            n => Err(FromSqlError::OutOfRange(n)),
        }
    }
}

/// One user's result for one day on one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub user_id: UserId,
    pub server_id: ServerId,
    pub day: Day,
    pub result: Guesses,
}

/// Mean of a user's solved results, along with how many went into it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Average {
    pub avg: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserServerStats {
    /// `None` when the user has no solved results on the server.
    pub avg_score: Option<f64>,
    pub submitted_count: usize,
    pub failed_count: usize,
    pub current_streak: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub avg_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_display_like_the_game() {
        assert_eq!(Guesses::Solved(3).to_string(), "3/6");
        assert_eq!(Guesses::Failed.to_string(), "X/6");
    }

    #[test]
    fn guesses_round_trip_through_sqlite() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        for guesses in [Guesses::Solved(0), Guesses::Solved(6), Guesses::Failed] {
            let back: Guesses = conn
                .query_row("SELECT ?1", [guesses], |row| row.get(0))
                .unwrap();
            assert_eq!(back, guesses);
        }

        let raw: i64 = conn
            .query_row("SELECT ?1", [Guesses::Failed], |row| row.get(0))
            .unwrap();
        assert_eq!(raw, FAILED_SENTINEL);
    }

    #[test]
    fn out_of_range_score_is_rejected() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let res: rusqlite::Result<Guesses> = conn.query_row("SELECT 9", [], |row| row.get(0));
        assert!(res.is_err());
    }
}
