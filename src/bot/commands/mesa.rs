//! Table Discord commands - `/mesa` and its subcommands.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            handlers::{access, autocomplete},
        },
        core::{
            events::{Action, Collection, StoreEvent},
            table::{self, TableChanges},
        },
        entities::dining_table::Model as DiningTable,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use sea_orm::DatabaseConnection;

    async fn find_table(db: &DatabaseConnection, number: i32) -> Result<DiningTable> {
        table::get_table_by_number(db, number)
            .await?
            .ok_or_else(|| Error::TableNotFound {
                table: number.to_string(),
            })
    }

    fn announce(ctx: poise::Context<'_, BotData, Error>, id: i64, action: Action) {
        ctx.data()
            .publish(StoreEvent::new(Collection::Tables, id, action));
    }

    /// Parent command for managing tables.
    #[poise::command(
        slash_command,
        subcommands(
            "mesa_list",
            "mesa_add",
            "mesa_edit",
            "mesa_availability",
            "mesa_delete"
        )
    )]
    pub async fn mesa(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Table management command. Available subcommands:\n\
            `/mesa list` - Show every table\n\
            `/mesa add` - Add a table\n\
            `/mesa edit` - Change a table's number, seats or location\n\
            `/mesa availability` - Free or block a table by hand\n\
            `/mesa delete` - Delete a table without open orders";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Lists every table with its state.
    #[poise::command(slash_command, rename = "list")]
    pub async fn mesa_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        access::require_role(ctx, access::ANY_STAFF).await?;
        let tables = table::list_tables(&ctx.data().database).await?;

        if tables.is_empty() {
            ctx.say("No tables yet. Add one with `/mesa add`.").await?;
            return Ok(());
        }

        let free = tables.iter().filter(|t| t.available).count();
        let fields = tables.iter().take(25).map(|t| {
            let state = if t.available { "🟢 free" } else { "🔴 occupied" };
            (
                format!("Table {}", t.number),
                format!("{state}\n{} seats · {}", t.capacity, t.location),
                true,
            )
        });

        let embed = serenity::CreateEmbed::default()
            .title("🪑 Tables")
            .color(0x0034_98DB)
            .fields(fields)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "{free} of {} free",
                tables.len()
            )));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Adds a table.
    #[poise::command(slash_command, rename = "add")]
    pub async fn mesa_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Number shown on the table"]
        #[min = 1]
        number: i32,
        #[description = "Seats"]
        #[min = 1]
        capacity: i32,
        #[description = "Where it is (e.g. terraza)"] location: Option<String>,
    ) -> Result<()> {
        access::require_role(ctx, access::ADMIN).await?;
        let created = table::create_table(
            &ctx.data().database,
            number,
            capacity,
            location.unwrap_or_default(),
        )
        .await?;
        announce(ctx, created.id, Action::Created);

        ctx.say(format!(
            "✅ Added table {} ({} seats).",
            created.number, created.capacity
        ))
        .await?;
        Ok(())
    }

    /// Changes a table. Empty options are left unchanged.
    #[poise::command(slash_command, rename = "edit")]
    pub async fn mesa_edit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Table to edit"]
        #[autocomplete = "autocomplete::autocomplete_table_number"]
        number: i32,
        #[description = "New number"]
        #[min = 1]
        new_number: Option<i32>,
        #[description = "New seat count"]
        #[min = 1]
        capacity: Option<i32>,
        #[description = "New location"] location: Option<String>,
    ) -> Result<()> {
        access::require_role(ctx, access::ADMIN).await?;
        let db = &ctx.data().database;
        let existing = find_table(db, number).await?;

        let updated = table::update_table(
            db,
            existing.id,
            TableChanges {
                number: new_number,
                capacity,
                location,
            },
        )
        .await?;
        announce(ctx, updated.id, Action::Updated);

        ctx.say(format!(
            "✅ Table {}: {} seats · {}",
            updated.number, updated.capacity, updated.location
        ))
        .await?;
        Ok(())
    }

    /// Frees or blocks a table by hand.
    #[poise::command(slash_command, rename = "availability")]
    pub async fn mesa_availability(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Table"]
        #[autocomplete = "autocomplete::autocomplete_table_number"]
        number: i32,
        #[description = "Whether customers can order at it"] available: bool,
    ) -> Result<()> {
        access::require_role(ctx, access::ADMIN).await?;
        let db = &ctx.data().database;
        let existing = find_table(db, number).await?;

        let updated = table::set_table_availability(db, existing.id, available).await?;
        announce(ctx, updated.id, Action::Updated);

        let state = if updated.available { "free" } else { "occupied" };
        ctx.say(format!("✅ Table {} is now {state}.", updated.number))
            .await?;
        Ok(())
    }

    /// Deletes a table that has no open order.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn mesa_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Table to delete"]
        #[autocomplete = "autocomplete::autocomplete_table_number"]
        number: i32,
    ) -> Result<()> {
        access::require_role(ctx, access::ADMIN).await?;
        let db = &ctx.data().database;
        let existing = find_table(db, number).await?;

        let deleted = table::delete_table(db, existing.id).await?;
        announce(ctx, deleted.id, Action::Deleted);

        ctx.say(format!("🗑️ Deleted table {}.", deleted.number))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
