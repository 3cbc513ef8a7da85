//! Bot layer - Discord-specific interface for restaurant staff
//!
//! This module provides the staff interface for Comanda: slash commands for the
//! menu, tables, orders, staff and reports, the autocomplete handlers behind
//! them, and the kitchen feed that posts order changes to a channel.

/// Discord command implementations (general, menu, tables, orders, staff, report)
pub mod commands;
/// Kitchen feed - posts order events to a Discord channel
pub mod feed;
/// Discord interaction handlers (autocomplete, role checks)
pub mod handlers;

use crate::{
    core::events::{EventBus, StoreEvent},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Shared data available to all bot commands.
/// This structure holds the database connection, the event bus that order and
/// menu changes are published to, and the restaurant name used in replies.
pub struct BotData {
    /// Database connection for all database operations, shared with the API
    pub database: Arc<DatabaseConnection>,
    /// Bus shared with the customer API
    pub events: EventBus,
    /// Shown in help and report headers
    pub restaurant_name: String,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(
        database: Arc<DatabaseConnection>,
        events: EventBus,
        restaurant_name: String,
    ) -> Self {
        Self {
            database,
            events,
            restaurant_name,
        }
    }

    /// Publishes a change made from a command.
    pub fn publish(&self, event: StoreEvent) {
        self.events.publish(event);
    }
}

/// Every command the bot registers.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        commands::ping(),
        commands::help(),
        commands::menu(),
        commands::mesa(),
        commands::orden(),
        commands::staff(),
        commands::report(),
    ]
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            let reply = if error.is_user_facing() {
                format!("❌ {error}")
            } else {
                error!("Error in command `{}`: {error:?}", ctx.command().name);
                "❌ Something went wrong. Please try again later.".to_string()
            };
            if let Err(e) = ctx.say(reply).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Starts the Discord client and blocks until it stops.
///
/// When `kitchen_channel` is set, a task relaying order events to that channel
/// is spawned once the bot is connected.
#[instrument(skip(token, data))]
pub async fn run(token: String, data: BotData, kitchen_channel: Option<u64>) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                match kitchen_channel {
                    Some(channel) => {
                        let channel = serenity::ChannelId::new(channel);
                        tokio::spawn(feed::run_kitchen_feed(
                            ctx.http.clone(),
                            channel,
                            data.events.subscribe(),
                        ));
                        info!(%channel, "Kitchen feed started");
                    }
                    None => warn!("KITCHEN_CHANNEL_ID not set; kitchen feed disabled"),
                }

                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e:?}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_all_commands_registered() {
        let commands = all_commands();
        let names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            ["ping", "help", "menu", "mesa", "orden", "staff", "report"]
        );

        let orden = commands.iter().find(|c| c.name == "orden").unwrap();
        let subcommands: Vec<&str> = orden.subcommands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            subcommands,
            [
                "abiertas",
                "cocina",
                "ver",
                "lista",
                "recogido",
                "pago",
                "completar",
                "despachar",
                "cancelar"
            ]
        );
    }
}
