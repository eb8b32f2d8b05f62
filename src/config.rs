use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dotenv::dotenv;

const DEFAULT_DB_PATH: &str = "wordle.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub db_path: PathBuf,
}

impl Config {
    /// Reads the configuration from the environment, loading `.env` in the
    /// project root first if there is one.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let discord_token = env::var("DISCORD_TOKEN")
            .context("Expected 'DISCORD_TOKEN=<token>' in .env in project root.")?;

        let db_path = env::var("WORDLE_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                log::debug!("$WORDLE_DB not set, using {DEFAULT_DB_PATH}");
                PathBuf::from(DEFAULT_DB_PATH)
            });

        Ok(Self { discord_token, db_path })
    }
}
