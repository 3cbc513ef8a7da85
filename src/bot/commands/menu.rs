//! Menu Discord commands - `/menu` and its subcommands.
//!
//! Any staff member may list the menu; every change is admin-only and is
//! published on the event bus so connected customers see it.

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
            product::{self, NewProduct, ProductChanges},
            report::format_currency,
        },
        entities::product::Model as Product,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use sea_orm::DatabaseConnection;

    async fn find_product(db: &DatabaseConnection, name: &str) -> Result<Product> {
        product::get_product_by_name(db, name)
            .await?
            .ok_or_else(|| Error::ProductNotFound {
                name: name.to_string(),
            })
    }

    fn stock_label(product: &Product) -> String {
        product
            .stock
            .map_or_else(|| "not tracked".to_string(), |n| format!("{n} left"))
    }

    fn announce(ctx: poise::Context<'_, BotData, Error>, id: i64, action: Action) {
        ctx.data()
            .publish(StoreEvent::new(Collection::Products, id, action));
    }

    /// Parent command for managing the menu.
    #[poise::command(
        slash_command,
        subcommands(
            "menu_list",
            "menu_add",
            "menu_edit",
            "menu_availability",
            "menu_restock",
            "menu_stock",
            "menu_delete"
        )
    )]
    pub async fn menu(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Menu management command. Available subcommands:\n\
            `/menu list` - Show every product\n\
            `/menu add` - Add a product\n\
            `/menu edit` - Change a product's details\n\
            `/menu availability` - Show or hide a product\n\
            `/menu restock` - Add units to a product's stock\n\
            `/menu stock` - Set or clear a product's stock count\n\
            `/menu delete` - Delete a product";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Lists every product, including hidden ones.
    #[poise::command(slash_command, rename = "list")]
    pub async fn menu_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        access::require_role(ctx, access::ANY_STAFF).await?;
        let products = product::list_products(&ctx.data().database).await?;

        if products.is_empty() {
            ctx.say("The menu is empty. Add a product with `/menu add`.")
                .await?;
            return Ok(());
        }

        let fields = products.iter().take(25).map(|p| {
            let status = if p.available { "✅" } else { "🚫" };
            (
                format!("{status} {}", p.name),
                format!(
                    "{} · {} · {}",
                    format_currency(p.price),
                    p.category,
                    stock_label(p)
                ),
                true,
            )
        });

        let embed = serenity::CreateEmbed::default()
            .title(format!("🍽️ {} menu", ctx.data().restaurant_name))
            .color(0x00E6_7E22)
            .fields(fields)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "{} product{}",
                products.len(),
                if products.len() == 1 { "" } else { "s" }
            )));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Adds a product to the menu.
    #[poise::command(slash_command, rename = "add")]
    pub async fn menu_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Unique product name"] name: String,
        #[description = "Price in pesos"] price: f64,
        #[description = "Category (e.g. bebidas, postres)"] category: String,
        #[description = "Units in stock; leave empty to not track stock"]
        #[min = 0]
        stock: Option<i64>,
        #[description = "Short description for customers"] description: Option<String>,
        #[description = "Image URL"] image_url: Option<String>,
    ) -> Result<()> {
        access::require_role(ctx, access::ADMIN).await?;
        let created = product::create_product(
            &ctx.data().database,
            NewProduct {
                name,
                price,
                category,
                description,
                image_url,
                stock,
            },
        )
        .await?;
        announce(ctx, created.id, Action::Created);

        ctx.say(format!(
            "✅ Added **{}** ({}) to {} · stock {}",
            created.name,
            format_currency(created.price),
            created.category,
            stock_label(&created)
        ))
        .await?;
        Ok(())
    }

    /// Changes a product's details. Empty options are left unchanged.
    #[poise::command(slash_command, rename = "edit")]
    pub async fn menu_edit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to edit"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product_name: String,
        #[description = "New name"] new_name: Option<String>,
        #[description = "New price"] price: Option<f64>,
        #[description = "New category"] category: Option<String>,
        #[description = "New description"] description: Option<String>,
        #[description = "New image URL"] image_url: Option<String>,
    ) -> Result<()> {
        access::require_role(ctx, access::ADMIN).await?;
        let db = &ctx.data().database;
        let existing = find_product(db, &product_name).await?;

        let updated = product::update_product(
            db,
            existing.id,
            ProductChanges {
                name: new_name,
                price,
                category,
                description,
                image_url,
            },
        )
        .await?;
        announce(ctx, updated.id, Action::Updated);

        ctx.say(format!(
            "✅ Updated **{}**: {} · {}",
            updated.name,
            format_currency(updated.price),
            updated.category
        ))
        .await?;
        Ok(())
    }

    /// Shows or hides a product on the customer menu.
    #[poise::command(slash_command, rename = "availability")]
    pub async fn menu_availability(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product_name: String,
        #[description = "Whether customers can order it"] available: bool,
    ) -> Result<()> {
        access::require_role(ctx, access::ADMIN).await?;
        let db = &ctx.data().database;
        let existing = find_product(db, &product_name).await?;

        let updated = product::set_product_availability(db, existing.id, available).await?;
        announce(ctx, updated.id, Action::Updated);

        let state = if updated.available {
            "is back on the menu"
        } else {
            "is hidden from the menu"
        };
        ctx.say(format!("✅ **{}** {state}.", updated.name)).await?;
        Ok(())
    }

    /// Adds units to a product's stock and makes it available again.
    #[poise::command(slash_command, rename = "restock")]
    pub async fn menu_restock(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product_name: String,
        #[description = "Units to add"]
        #[min = 1]
        amount: i64,
    ) -> Result<()> {
        access::require_role(ctx, access::ADMIN).await?;
        let db = &ctx.data().database;
        let existing = find_product(db, &product_name).await?;

        let updated = product::restock_product(db, existing.id, amount).await?;
        announce(ctx, updated.id, Action::Updated);

        ctx.say(format!(
            "📦 Restocked **{}**: {}",
            updated.name,
            stock_label(&updated)
        ))
        .await?;
        Ok(())
    }

    /// Sets a product's stock count, or stops tracking it.
    #[poise::command(slash_command, rename = "stock")]
    pub async fn menu_stock(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product_name: String,
        #[description = "Exact units in stock; leave empty to stop tracking"]
        #[min = 0]
        stock: Option<i64>,
    ) -> Result<()> {
        access::require_role(ctx, access::ADMIN).await?;
        let db = &ctx.data().database;
        let existing = find_product(db, &product_name).await?;

        let updated = product::set_stock(db, existing.id, stock).await?;
        announce(ctx, updated.id, Action::Updated);

        ctx.say(format!(
            "📦 **{}**: {}{}",
            updated.name,
            stock_label(&updated),
            if updated.available { "" } else { " (hidden)" }
        ))
        .await?;
        Ok(())
    }

    /// Deletes a product. Past orders keep their copy of it.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn menu_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to delete"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product_name: String,
    ) -> Result<()> {
        access::require_role(ctx, access::ADMIN).await?;
        let db = &ctx.data().database;
        let existing = find_product(db, &product_name).await?;

        let deleted = product::delete_product(db, existing.id).await?;
        announce(ctx, deleted.id, Action::Deleted);

        ctx.say(format!("🗑️ Deleted **{}**.", deleted.name)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
