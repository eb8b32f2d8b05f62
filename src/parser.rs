use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::models::{Day, Guesses};

/// Matches the first line of a shared result, e.g. `Wordle 412 3/6`.
/// Anything after the `/6` (hard mode `*`, the emoji grid) is ignored.
static SCORE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Wordle\s+(\d+)\s+([0-6X])/6").expect("score regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedScore {
    pub day: Day,
    pub result: Guesses,
}

/// The line isn't a score submission. Not a failure, just ordinary chatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("not a score submission")]
pub struct NotAScore;

/// Parses a single line of chat text into a day and result.
pub fn parse_score(line: &str) -> Result<ParsedScore, NotAScore> {
    let caps = SCORE_LINE.captures(line).ok_or(NotAScore)?;

    // Puzzles are numbered from 1, and a day too large for `Day` can't be real.
    let day = caps[1].parse::<Day>().map_err(|_| NotAScore)?;
    if day == 0 {
        return Err(NotAScore);
    }

    let result = match &caps[2] {
        "X" => Guesses::Failed,
        n => Guesses::Solved(n.parse().map_err(|_| NotAScore)?),
    };

    Ok(ParsedScore { day, result })
}

/// Parses a whole message. Only the first line is considered.
pub fn parse_message(content: &str) -> Result<ParsedScore, NotAScore> {
    parse_score(content.lines().next().ok_or(NotAScore)?)
}
