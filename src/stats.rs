use std::sync::Arc;

use crate::{
    models::{Average, LeaderboardEntry, ScoreRecord, ServerId, UserId, UserServerStats},
    wbdb::{ScoreStore, StoreResult},
};

/// Length of the run of consecutive solved days ending at the newest record.
///
/// `records` must be sorted newest day first. A lone record counts as a streak
/// of one even if it was a failure, and the streak doesn't lapse when a user
/// stops submitting.
pub fn current_streak(records: &[ScoreRecord]) -> u32 {
    let (newest, older) = match records {
        [] => return 0,
        [_] => return 1,
        [newest, older @ ..] => (newest, older),
    };

    if newest.result.is_failed() {
        return 0;
    }

    let mut streak = 1;
    let mut prev = newest.day;
    for record in older {
        if record.result.is_failed() {
            break;
        }
        // Non-adjacent days are passed over, not treated as the end of the run.
        if record.day.checked_add(1) == Some(prev) {
            streak += 1;
            prev = record.day;
        }
    }

    streak
}

/// Mean of the solved results in `records`, or `None` if there are none.
pub fn average_of(records: &[ScoreRecord]) -> Option<Average> {
    let solved: Vec<u8> = records.iter().filter_map(|r| r.result.solved()).collect();
    if solved.is_empty() {
        return None;
    }

    let total: u32 = solved.iter().map(|&n| u32::from(n)).sum();
    Some(Average {
        avg: f64::from(total) / solved.len() as f64,
        count: solved.len(),
    })
}

/// Read-only statistics over a [`ScoreStore`].
#[derive(Clone)]
pub struct StatsEngine {
    store: Arc<dyn ScoreStore>,
}

impl StatsEngine {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        Self { store }
    }

    /// A user's mean result on a server, failures excluded.
    ///
    /// Returns `None` if they have no solved results there.
    pub fn average(&self, user: UserId, server: ServerId) -> StoreResult<Option<Average>> {
        Ok(average_of(&self.store.non_failed_records(user, server)?))
    }

    pub fn success_count(&self, user: UserId, server: ServerId) -> StoreResult<usize> {
        Ok(self.store.non_failed_records(user, server)?.len())
    }

    pub fn failure_count(&self, user: UserId, server: ServerId) -> StoreResult<usize> {
        Ok(self
            .store
            .all_records(user, server)?
            .iter()
            .filter(|r| r.result.is_failed())
            .count())
    }

    pub fn current_streak(&self, user: UserId, server: ServerId) -> StoreResult<u32> {
        Ok(current_streak(&self.store.all_records(user, server)?))
    }

    /// Everything shown for a user in the full leaderboard, from one read of their records.
    pub fn user_stats(&self, user: UserId, server: ServerId) -> StoreResult<UserServerStats> {
        let records = self.store.all_records(user, server)?;
        let failed_count = records.iter().filter(|r| r.result.is_failed()).count();

        Ok(UserServerStats {
            avg_score: average_of(&records).map(|a| a.avg),
            submitted_count: records.len() - failed_count,
            failed_count,
            current_streak: current_streak(&records),
        })
    }

    /// Users ranked by average result on the server, best (lowest) first.
    ///
    /// Only solved results of at least one guess count, and users without any
    /// are left out. Ties are broken by user id so the order is stable.
    pub fn leaderboard(&self, server: ServerId) -> StoreResult<Vec<LeaderboardEntry>> {
        let mut entries: Vec<LeaderboardEntry> = self
            .store
            .server_averages(server)?
            .into_iter()
            .map(|(user_id, avg_score)| LeaderboardEntry { user_id, avg_score })
            .collect();

        entries.sort_by(|a, b| {
            a.avg_score
                .total_cmp(&b.avg_score)
                .then(a.user_id.cmp(&b.user_id))
        });

        Ok(entries)
    }
}
