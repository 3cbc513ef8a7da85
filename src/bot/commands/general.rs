//! General Discord commands - ping and help.
//! These commands don't require database access or a staff role.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = format!(
            "**{} · Comanda**\n\
            Staff commands. Your Discord account must be linked to a staff user.\n\n\
            **Orders** (waiters, cooks for `cocina`/`lista`)\n\
            • `/orden abiertas` - Orders whose table has not been released\n\
            • `/orden cocina` - Kitchen queue, oldest first\n\
            • `/orden ver <orden>` - Order details\n\
            • `/orden lista|recogido|completar|despachar|cancelar <orden>` - Progress an order\n\
            • `/orden pago <orden> <tipo>` - Confirm payment\n\n\
            **Menu and tables** (admins; `list` for all staff)\n\
            • `/menu list|add|edit|availability|restock|stock|delete`\n\
            • `/mesa list|add|edit|availability|delete`\n\n\
            **Administration**\n\
            • `/staff list|add|role|active|link` - Manage staff users\n\
            • `/report ventas [days]` - Sales summary\n\n\
            **Utility**\n\
            • `/ping` - Checks if the bot is responsive.\n\
            • `/help` - Shows this help message.",
            ctx.data().restaurant_name
        );

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
