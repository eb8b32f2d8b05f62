/// One row per (user, server, day). Days start at 1.
/// `score` is the guess count, or -1 for a failed attempt.
pub const SCORES_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Scores (
        user_id        INTEGER     NOT NULL,
        day            INTEGER     NOT NULL    CHECK (day >= 1),
        score          INTEGER     NOT NULL    CHECK (score BETWEEN -1 AND 6),
        server_id      INTEGER     NOT NULL,

        UNIQUE (user_id, server_id, day)
    )";
