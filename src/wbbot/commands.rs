use std::sync::Arc;

use prettytable::format::{Alignment, FormatBuilder, LinePosition, LineSeparator, TableFormat};
use prettytable::{Cell, Row, Table};
use serenity::async_trait;

use crate::{
    models::{ScoreRecord, ServerId, UserId},
    parser::{self, NotAScore},
    stats::StatsEngine,
    wbdb::{ScoreStore, StoreResult},
};

const FULL_COLUMNS: [&str; 6] =
    ["Rank", "User", "Average Score", "Successes", "Failures", "Current Streak"];
const COMPACT_COLUMNS: [&str; 3] = ["Rank", "User", "Average Score"];

/// A chat message, stripped down to what the router needs.
#[derive(Debug, Clone, Copy)]
pub struct Incoming<'a> {
    pub author: UserId,
    pub server: ServerId,
    pub content: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    NewlyRecorded,
    AlreadyRecorded,
}

impl Reaction {
    pub fn emoji(&self) -> &'static str {
        match self {
            Reaction::NewlyRecorded => "👍",
            Reaction::AlreadyRecorded => "👌",
        }
    }
}

/// Something to do in response to a message, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Say(String),
    React(Reaction),
}

/// Resolves user ids to the names shown on the leaderboard.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn display_name(&self, user: UserId) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeaderboardStyle {
    Full,
    Compact,
}

pub struct CommandRouter {
    store: Arc<dyn ScoreStore>,
    stats: StatsEngine,
}

impl CommandRouter {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        let stats = StatsEngine::new(Arc::clone(&store));
        Self { store, stats }
    }

    /// Works out everything the bot should do about `msg`.
    ///
    /// Storage faults are logged and produce no action; nothing internal is ever
    /// echoed back into chat.
    pub async fn handle(&self, msg: &Incoming<'_>, users: &dyn UserDirectory) -> Vec<Action> {
        let content = msg.content;
        let mut actions = Vec::new();

        if content.starts_with("!help") {
            actions.push(Action::Say(Self::get_help()));
        }

        if content.starts_with("!avg") {
            log::info!("Command: !avg, User: {}", msg.author);
            actions.extend(self.avg(msg).map(Action::Say));
        } else if content.starts_with("!leaderboard") || content.starts_with("!lb") {
            log::info!("Command: !leaderboard, User: {}", msg.author);
            let style = if content.starts_with("!leaderboard") {
                LeaderboardStyle::Full
            } else {
                LeaderboardStyle::Compact
            };
            actions.extend(self.leaderboard(msg, style, users).await.map(Action::Say));
        }

        if content.starts_with("!streak") {
            log::info!("Command: !streak, User: {}", msg.author);
            actions.extend(self.streak(msg).map(Action::Say));
        } else {
            actions.extend(self.submit(msg).map(Action::React));
        }

        actions
    }

    fn avg(&self, msg: &Incoming<'_>) -> Option<String> {
        let mention = mention(msg.author);
        let average = self
            .stats
            .average(msg.author, msg.server)
            .inspect_err(|err| log::error!("[avg] Could not compute average: {err}"))
            .ok()?;

        Some(match average {
            None => format!("{mention} hasn't submitted any scores on this server yet."),
            Some(a) => format!(
                "{mention} has an average score of {:.2} with {} scores submitted!",
                a.avg, a.count
            ),
        })
    }

    fn streak(&self, msg: &Incoming<'_>) -> Option<String> {
        let streak = self
            .stats
            .current_streak(msg.author, msg.server)
            .inspect_err(|err| log::error!("[streak] Could not compute streak: {err}"))
            .ok()?;

        Some(format!("{} has a current win streak of {streak}!", mention(msg.author)))
    }

    async fn leaderboard(
        &self,
        msg: &Incoming<'_>,
        style: LeaderboardStyle,
        users: &dyn UserDirectory,
    ) -> Option<String> {
        self.render_leaderboard(msg.server, style, users)
            .await
            .inspect_err(|err| log::error!("[leaderboard] Could not build leaderboard: {err}"))
            .ok()
    }

    async fn render_leaderboard(
        &self,
        server: ServerId,
        style: LeaderboardStyle,
        users: &dyn UserDirectory,
    ) -> StoreResult<String> {
        let columns: &[&str] = match style {
            LeaderboardStyle::Full => &FULL_COLUMNS,
            LeaderboardStyle::Compact => &COMPACT_COLUMNS,
        };

        let mut table = Table::new();
        table.set_format(leaderboard_format());
        table.set_titles(Row::new(columns.iter().map(|title| centered(title)).collect()));

        let mut rank = 1;
        for entry in self.stats.leaderboard(server)? {
            let stats = self.stats.user_stats(entry.user_id, server)?;
            if stats.submitted_count == 0 {
                continue;
            }

            let mut row = vec![
                centered(&rank.to_string()),
                Cell::new_align(&users.display_name(entry.user_id).await, Alignment::LEFT),
                centered(&format!("{:.2}", entry.avg_score)),
            ];
            if style == LeaderboardStyle::Full {
                row.extend([
                    centered(&stats.submitted_count.to_string()),
                    centered(&stats.failed_count.to_string()),
                    centered(&stats.current_streak.to_string()),
                ]);
            }

            table.add_row(Row::new(row));
            rank += 1;
        }

        Ok(format!("Leaderboard:\n```\n{}\n```", table.to_string().trim_end()))
    }

    /// Records a score if the message is a submission.
    fn submit(&self, msg: &Incoming<'_>) -> Option<Reaction> {
        let parsed = match parser::parse_message(msg.content) {
            Ok(parsed) => parsed,
            Err(NotAScore) => return None,
        };

        log::info!("Adding score for user: {}", msg.author);
        let record = ScoreRecord {
            user_id: msg.author,
            server_id: msg.server,
            day: parsed.day,
            result: parsed.result,
        };

        match self.store.record(&record) {
            Ok(true) => Some(Reaction::NewlyRecorded),
            Ok(false) => {
                log::debug!("[submit] Day {} already recorded for {}", record.day, record.user_id);
                Some(Reaction::AlreadyRecorded)
            }
            Err(err) => {
                log::error!("[submit] Could not record score for {}: {err}", record.user_id);
                None
            }
        }
    }

    /// Gets a help string. Should be updated after a new command is added
    pub fn get_help() -> String {
        String::from(
            r#"```
Commands:

!help: Display this message...

!avg: Returns your average score

!leaderboard: Displays the full leaderboard

!lb: Displays a smaller leaderboard that looks better on mobile

!streak: Displays your current win streak
```"#,
        )
    }
}

/// Ruled above and below the titles and at the bottom, with no lines between rows.
fn leaderboard_format() -> TableFormat {
    FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separators(
            &[LinePosition::Top, LinePosition::Title, LinePosition::Bottom],
            LineSeparator::new('-', '+', '+', '+'),
        )
        .padding(1, 1)
        .build()
}

fn centered(text: &str) -> Cell {
    Cell::new_align(text, Alignment::CENTER)
}

fn mention(user: UserId) -> String {
    format!("<@{user}>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Guesses;
    use crate::wbdb::SqliteScoreStore;

    const SERVER: ServerId = 99;

    struct Names;

    #[async_trait]
    impl UserDirectory for Names {
        async fn display_name(&self, user: UserId) -> String {
            format!("user{user}")
        }
    }

    fn router() -> (CommandRouter, Arc<SqliteScoreStore>) {
        let store = Arc::new(SqliteScoreStore::open_in_memory().unwrap());
        (CommandRouter::new(store.clone()), store)
    }

    async fn send(router: &CommandRouter, author: UserId, content: &str) -> Vec<Action> {
        let msg = Incoming { author, server: SERVER, content };
        router.handle(&msg, &Names).await
    }

    #[tokio::test]
    async fn submission_then_resubmission() {
        let (router, store) = router();

        let first = send(&router, 7, "Wordle 412 3/6\n\n🟩🟩🟩🟩🟩").await;
        assert_eq!(first, vec![Action::React(Reaction::NewlyRecorded)]);

        let again = send(&router, 7, "Wordle 412 3/6").await;
        assert_eq!(again, vec![Action::React(Reaction::AlreadyRecorded)]);

        let records = store.all_records(7, SERVER).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].result, Guesses::Solved(3));
    }

    #[tokio::test]
    async fn chatter_is_ignored() {
        let (router, store) = router();

        assert!(send(&router, 7, "good morning").await.is_empty());
        assert!(send(&router, 7, "!unknown").await.is_empty());
        assert!(send(&router, 7, "Wordle 0 3/6").await.is_empty());
        assert!(store.all_records(7, SERVER).unwrap().is_empty());
    }

    #[tokio::test]
    async fn help_lists_commands() {
        let (router, _) = router();

        let actions = send(&router, 7, "!help").await;
        assert_eq!(actions.len(), 1);
        let Action::Say(text) = &actions[0] else { panic!("expected a reply") };
        for cmd in ["!help", "!avg", "!leaderboard", "!lb", "!streak"] {
            assert!(text.contains(cmd), "help is missing {cmd}");
        }
    }

    #[tokio::test]
    async fn avg_with_and_without_scores() {
        let (router, _) = router();

        assert_eq!(
            send(&router, 7, "!avg").await,
            vec![Action::Say(String::from(
                "<@7> hasn't submitted any scores on this server yet."
            ))]
        );

        send(&router, 7, "Wordle 1 3/6").await;
        send(&router, 7, "Wordle 2 X/6").await;
        send(&router, 7, "Wordle 3 4/6").await;

        assert_eq!(
            send(&router, 7, "!avg").await,
            vec![Action::Say(String::from(
                "<@7> has an average score of 3.50 with 2 scores submitted!"
            ))]
        );
    }

    #[tokio::test]
    async fn streak_always_replies() {
        let (router, _) = router();

        assert_eq!(
            send(&router, 7, "!streak").await,
            vec![Action::Say(String::from("<@7> has a current win streak of 0!"))]
        );

        send(&router, 7, "Wordle 10 2/6").await;
        send(&router, 7, "Wordle 11 5/6").await;

        assert_eq!(
            send(&router, 7, "!streak").await,
            vec![Action::Say(String::from("<@7> has a current win streak of 2!"))]
        );
    }

    #[tokio::test]
    async fn leaderboard_full_and_compact() {
        let (router, _) = router();

        send(&router, 1, "Wordle 1 5/6").await;
        send(&router, 1, "Wordle 2 X/6").await;
        send(&router, 2, "Wordle 1 2/6").await;
        send(&router, 2, "Wordle 2 3/6").await;
        send(&router, 3, "Wordle 1 X/6").await;

        let full = send(&router, 1, "!leaderboard").await;
        let [Action::Say(full)] = full.as_slice() else { panic!("expected one reply") };
        let expected = "\
Leaderboard:
```
+------+-------+---------------+-----------+----------+----------------+
| Rank | User  | Average Score | Successes | Failures | Current Streak |
+------+-------+---------------+-----------+----------+----------------+
|  1   | user2 |     2.50      |     2     |    0     |       2        |
|  2   | user1 |     5.00      |     1     |    1     |       0        |
+------+-------+---------------+-----------+----------+----------------+
```";
        assert_eq!(full, expected);

        let compact = send(&router, 1, "!lb").await;
        let [Action::Say(compact)] = compact.as_slice() else { panic!("expected one reply") };
        assert!(compact.contains("| Rank | User  | Average Score |\n"));
        assert!(!compact.contains("Successes"));
        assert!(!compact.contains("user3"));
    }

    #[tokio::test]
    async fn storage_fault_produces_nothing() {
        struct Broken;

        impl ScoreStore for Broken {
            fn exists(&self, _: UserId, _: ServerId, _: crate::models::Day) -> StoreResult<bool> {
                Err(rusqlite::Error::InvalidQuery.into())
            }
            fn insert(&self, _: &ScoreRecord) -> StoreResult<()> {
                Err(rusqlite::Error::InvalidQuery.into())
            }
            fn record(&self, _: &ScoreRecord) -> StoreResult<bool> {
                Err(rusqlite::Error::InvalidQuery.into())
            }
            fn all_records(&self, _: UserId, _: ServerId) -> StoreResult<Vec<ScoreRecord>> {
                Err(rusqlite::Error::InvalidQuery.into())
            }
            fn non_failed_records(&self, _: UserId, _: ServerId) -> StoreResult<Vec<ScoreRecord>> {
                Err(rusqlite::Error::InvalidQuery.into())
            }
            fn server_averages(
                &self,
                _: ServerId,
            ) -> StoreResult<std::collections::HashMap<UserId, f64>> {
                Err(rusqlite::Error::InvalidQuery.into())
            }
        }

        let router = CommandRouter::new(Arc::new(Broken));
        for content in ["Wordle 5 3/6", "!avg", "!streak", "!lb", "!leaderboard"] {
            assert!(send(&router, 1, content).await.is_empty(), "{content} should be silent");
        }
    }
}
