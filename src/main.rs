use anyhow::Result;

use wordlebot::{config::Config, wbbot};

#[tokio::main]
async fn main() -> Result<()> {
    // Begin logger
    env_logger::init();

    let config = Config::from_env()?;

    if let Err(why) = wbbot::run_wordlebot(config).await {
        log::error!("Client error: {why:?}");
        return Err(why);
    }

    Ok(())
}
