use std::collections::HashMap;

use crate::{
    models::{self, Day, ServerId, UserId},
    wbdb::{self, ScoreStore, SqliteScoreStore, StoreError, StoreResult},
};

/////*============== SCORE QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::ScoreRecord {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            user_id: row.get("user_id")?,
            server_id: row.get("server_id")?,
            day: row.get("day")?,
            result: row.get("score")?,
        })
    }
}

const INSERT_SCORE: &str =
    "INSERT INTO Scores ( user_id,  day,  score,  server_id)
     VALUES             (:user_id, :day, :score, :server_id)";

impl SqliteScoreStore {
    fn query_records(
        &self,
        sql: &str,
        user: UserId,
        server: ServerId,
    ) -> StoreResult<Vec<models::ScoreRecord>> {
        let connection = self.connect();
        let query_params = rusqlite::named_params! {
                ":user_id":   user,
                ":server_id": server,
        };

        let records = connection
            .prepare(sql)?
            .query_map(query_params, |row| models::ScoreRecord::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

impl ScoreStore for SqliteScoreStore {
    fn exists(&self, user: UserId, server: ServerId, day: Day) -> StoreResult<bool> {
        log::trace!("[exists] Checking for a day {day} score from {user} on {server}");
        let connection = self.connect();

        let exists = connection
            .prepare(
                "SELECT 1 FROM Scores
                 WHERE user_id = :user_id AND server_id = :server_id AND day = :day",
            )?
            .exists(rusqlite::named_params! {
                    ":user_id":   user,
                    ":server_id": server,
                    ":day":       day,
            })?;

        Ok(exists)
    }

    fn insert(&self, record: &models::ScoreRecord) -> StoreResult<()> {
        match self.record(record)? {
            true => Ok(()),
            false => Err(StoreError::DuplicateKey {
                user: record.user_id,
                server: record.server_id,
                day: record.day,
            }),
        }
    }

    fn record(&self, record: &models::ScoreRecord) -> StoreResult<bool> {
        log::trace!(
            "[record] Inserting day {} ({}) for {} on {} into Scores...",
            record.day, record.result, record.user_id, record.server_id
        );
        let connection = self.connect();

        let query_params = rusqlite::named_params! {
                ":user_id":   record.user_id,
                ":day":       record.day,
                ":score":     record.result,
                ":server_id": record.server_id,
        };

        connection
            .prepare(INSERT_SCORE)?
            .execute(query_params)
            .map_or_else(wbdb::swallow_constraint_violation, |_| Ok(true))
    }

    fn all_records(&self, user: UserId, server: ServerId) -> StoreResult<Vec<models::ScoreRecord>> {
        log::trace!("[all_records] Querying all scores for {user} on {server}");
        self.query_records(
            "SELECT * FROM Scores
             WHERE user_id = :user_id AND server_id = :server_id
             ORDER BY day DESC",
            user,
            server,
        )
    }

    fn non_failed_records(
        &self,
        user: UserId,
        server: ServerId,
    ) -> StoreResult<Vec<models::ScoreRecord>> {
        log::trace!("[non_failed_records] Querying solved scores for {user} on {server}");
        self.query_records(
            "SELECT * FROM Scores
             WHERE user_id = :user_id AND server_id = :server_id AND score > -1
             ORDER BY day DESC",
            user,
            server,
        )
    }

    fn server_averages(&self, server: ServerId) -> StoreResult<HashMap<UserId, f64>> {
        log::trace!("[server_averages] Averaging scores on {server}");
        let connection = self.connect();

        let averages = connection
            .prepare(
                "SELECT user_id, AVG(score) AS avg_score
                 FROM Scores
                 WHERE server_id = :server_id AND score >= 1
                 GROUP BY user_id",
            )?
            .query_map(rusqlite::named_params! { ":server_id": server }, |row| {
                Ok((row.get("user_id")?, row.get("avg_score")?))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(averages)
    }
}
