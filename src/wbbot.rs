use std::sync::Arc;

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::UserId as DiscordUserId;
use serenity::prelude::*;

use anyhow::{Context as _, Result};

use crate::config::Config;
use crate::models::UserId;
use crate::wbdb::SqliteScoreStore;

pub mod commands;

use commands::{Action, CommandRouter, Incoming, UserDirectory};

pub async fn run_wordlebot(config: Config) -> Result<()> {
    let store = SqliteScoreStore::open(&config.db_path)
        .with_context(|| format!("Could not open score database {}", config.db_path.display()))?;

    let handler = WordleHandler { router: CommandRouter::new(Arc::new(store)) };

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .context("Error creating client.")?;

    client.start().await?;

    Ok(())
}

/// Looks names up through Discord, falling back to the raw id.
struct DiscordUsers {
    ctx: serenity::client::Context,
}

#[async_trait]
impl UserDirectory for DiscordUsers {
    async fn display_name(&self, user: UserId) -> String {
        if user == 0 {
            return user.to_string();
        }

        match DiscordUserId::new(user).to_user(&self.ctx).await {
            Ok(found) => found.display_name().to_string(),
            Err(err) => {
                log::warn!("[display_name] Could not fetch user {user}: {err}");
                user.to_string()
            }
        }
    }
}

struct WordleHandler {
    router: CommandRouter,
}

#[async_trait]
impl EventHandler for WordleHandler {
    async fn ready(&self, _ctx: serenity::client::Context, ready: Ready) {
        log::info!("We have logged in as {}", ready.user.name);
        for guild in &ready.guilds {
            log::info!("Connected to server: {}", guild.id);
        }
    }

    async fn message(&self, ctx: serenity::client::Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        // Scores are kept per server, so direct messages have nowhere to go.
        let Some(guild_id) = msg.guild_id else { return };

        let incoming = Incoming {
            author: msg.author.id.get(),
            server: guild_id.get(),
            content: &msg.content,
        };

        let users = DiscordUsers { ctx: ctx.clone() };
        for action in self.router.handle(&incoming, &users).await {
            match action {
                Action::Say(response) => {
                    if let Err(why) = msg.channel_id.say(&ctx.http, response).await {
                        log::error!("Error sending message: {why:?}");
                    }
                }
                Action::React(reaction) => {
                    let emoji = serenity::all::ReactionType::Unicode(String::from(reaction.emoji()));
                    if let Err(why) = msg.react(&ctx.http, emoji).await {
                        log::error!("Error adding reaction: {why:?}");
                    }
                }
            }
        }
    }
}
