//! Staff Discord commands - `/staff` and its subcommands. Admin only.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::access},
        core::{
            events::{Action, Collection, StoreEvent},
            user,
        },
        entities::{Role, user::Model as User},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use sea_orm::DatabaseConnection;

    /// Roles offered as slash command choices.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum RoleChoice {
        #[name = "administrador"]
        Administrator,
        #[name = "mesero"]
        Waiter,
        #[name = "cocinero"]
        Cook,
    }

    impl From<RoleChoice> for Role {
        fn from(choice: RoleChoice) -> Self {
            match choice {
                RoleChoice::Administrator => Self::Administrator,
                RoleChoice::Waiter => Self::Waiter,
                RoleChoice::Cook => Self::Cook,
            }
        }
    }

    async fn find_user(db: &DatabaseConnection, email: &str) -> Result<User> {
        user::get_user_by_email(db, email)
            .await?
            .ok_or_else(|| Error::UserNotFound {
                user: email.to_string(),
            })
    }

    fn announce(ctx: poise::Context<'_, BotData, Error>, id: i64, action: Action) {
        ctx.data()
            .publish(StoreEvent::new(Collection::Users, id, action));
    }

    /// Parent command for managing staff users.
    #[poise::command(
        slash_command,
        subcommands("staff_list", "staff_add", "staff_role", "staff_active", "staff_link")
    )]
    pub async fn staff(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Staff management command. Available subcommands:\n\
            `/staff list` - Show every staff user\n\
            `/staff add` - Add a staff user\n\
            `/staff role` - Change a user's role\n\
            `/staff active` - Activate or deactivate a user\n\
            `/staff link` - Link a Discord account to a user";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Lists every staff user.
    #[poise::command(slash_command, rename = "list")]
    pub async fn staff_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        access::require_role(ctx, access::ADMIN).await?;
        let users = user::list_users(&ctx.data().database).await?;

        let fields = users.iter().take(25).map(|u| {
            let status = if u.active { "🟢" } else { "⚪" };
            let discord = u
                .discord_id
                .as_ref()
                .map_or_else(|| "not linked".to_string(), |id| format!("<@{id}>"));
            (
                format!("{status} {}", u.name),
                format!("{} · {}\n{discord}", u.email, u.role.label()),
                true,
            )
        });

        let embed = serenity::CreateEmbed::default()
            .title("👥 Staff")
            .color(0x009B_59B6)
            .fields(fields)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "{} user{}",
                users.len(),
                if users.len() == 1 { "" } else { "s" }
            )));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Adds a staff user.
    #[poise::command(slash_command, rename = "add")]
    pub async fn staff_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Email, used as the login"] email: String,
        #[description = "Display name"] name: String,
        #[description = "Role"] role: RoleChoice,
        #[description = "Discord account to link"] discord_user: Option<serenity::User>,
    ) -> Result<()> {
        access::require_role(ctx, access::ADMIN).await?;
        let created = user::create_user(
            &ctx.data().database,
            &email,
            name,
            role.into(),
            discord_user.map(|u| u.id.to_string()),
        )
        .await?;
        announce(ctx, created.id, Action::Created);

        ctx.say(format!(
            "✅ Added {} ({}) as {}.",
            created.name,
            created.email,
            created.role.label()
        ))
        .await?;
        Ok(())
    }

    /// Changes a staff user's role.
    #[poise::command(slash_command, rename = "role")]
    pub async fn staff_role(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Email of the user"] email: String,
        #[description = "New role"] role: RoleChoice,
    ) -> Result<()> {
        access::require_role(ctx, access::ADMIN).await?;
        let db = &ctx.data().database;
        let existing = find_user(db, &email).await?;

        let updated = user::set_user_role(db, existing.id, role.into()).await?;
        announce(ctx, updated.id, Action::Updated);

        ctx.say(format!("✅ {} is now {}.", updated.name, updated.role.label()))
            .await?;
        Ok(())
    }

    /// Activates or deactivates a staff user.
    #[poise::command(slash_command, rename = "active")]
    pub async fn staff_active(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Email of the user"] email: String,
        #[description = "Whether the user may use the bot"] active: bool,
    ) -> Result<()> {
        let admin = access::require_role(ctx, access::ADMIN).await?;
        let db = &ctx.data().database;
        let existing = find_user(db, &email).await?;

        if existing.id == admin.id && !active {
            return Err(Error::validation("You cannot deactivate yourself"));
        }

        let updated = user::set_user_active(db, existing.id, active).await?;
        announce(ctx, updated.id, Action::Updated);

        let state = if updated.active { "active" } else { "inactive" };
        ctx.say(format!("✅ {} is now {state}.", updated.name))
            .await?;
        Ok(())
    }

    /// Links a Discord account to a staff user.
    #[poise::command(slash_command, rename = "link")]
    pub async fn staff_link(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Email of the user"] email: String,
        #[description = "Discord account"] discord_user: serenity::User,
    ) -> Result<()> {
        access::require_role(ctx, access::ADMIN).await?;
        let db = &ctx.data().database;
        let existing = find_user(db, &email).await?;

        let updated = user::link_discord_id(db, existing.id, discord_user.id.to_string()).await?;
        announce(ctx, updated.id, Action::Updated);

        ctx.say(format!(
            "🔗 Linked <@{}> to {}.",
            discord_user.id, updated.name
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
