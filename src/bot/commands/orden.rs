//! Order Discord commands - `/orden` and its subcommands.
//!
//! Cooks work the kitchen queue (`cocina`, `lista`). Waiters run the floor:
//! pickups, payment, completion, dispatch and cancellation. Administrators may
//! do both. Every change is published so the kitchen feed and customers follow
//! along.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            handlers::{access, autocomplete},
        },
        core::{
            events::Action,
            order::{self, FlagChange, OrderWithItems},
            report::format_currency,
        },
        entities::PaymentType,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Payment types offered as slash command choices.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum PaymentChoice {
        #[name = "efectivo"]
        Cash,
        #[name = "tarjeta"]
        Card,
        #[name = "transferencia"]
        Transfer,
    }

    impl From<PaymentChoice> for PaymentType {
        fn from(choice: PaymentChoice) -> Self {
            match choice {
                PaymentChoice::Cash => Self::Cash,
                PaymentChoice::Card => Self::Card,
                PaymentChoice::Transfer => Self::Transfer,
            }
        }
    }

    fn lines_text(order: &OrderWithItems) -> String {
        order
            .items
            .iter()
            .map(|item| {
                format!(
                    "{}× {} · {}",
                    item.quantity,
                    item.name,
                    format_currency(item.line_total)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn order_embed(order: &OrderWithItems) -> serenity::CreateEmbed {
        let o = &order.order;
        let mut embed = serenity::CreateEmbed::default()
            .title(format!("🧾 Order #{} · Table {}", o.id, o.table_number))
            .color(0x0027_AE60)
            .field("Items", lines_text(order), false)
            .field("Total", format_currency(o.total), true)
            .field("Status", order.status.label(), true)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Placed {}",
                o.created_at.format("%Y-%m-%d %H:%M UTC")
            )));

        if let Some(payment_type) = o.payment_type {
            embed = embed.field("Payment", payment_type.label(), true);
        }
        if let Some(notes) = &o.notes {
            embed = embed.field("Notes", notes, false);
        }
        embed
    }

    /// Reloads the order and publishes it when the flag operation wrote
    /// something. `frees_table` also publishes the order's table.
    async fn publish_change(
        ctx: poise::Context<'_, BotData, Error>,
        change: &FlagChange,
        frees_table: bool,
    ) -> Result<OrderWithItems> {
        let order = order::get_order_with_items(&ctx.data().database, change.order.id).await?;
        ctx.data()
            .events
            .publish_flag_change(change, order.clone(), frees_table);
        Ok(order)
    }

    /// Parent command for the order flow.
    #[poise::command(
        slash_command,
        subcommands(
            "orden_abiertas",
            "orden_cocina",
            "orden_ver",
            "orden_lista",
            "orden_recogido",
            "orden_pago",
            "orden_completar",
            "orden_despachar",
            "orden_cancelar"
        )
    )]
    pub async fn orden(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Order command. Available subcommands:\n\
            `/orden abiertas` - Orders whose table is not released\n\
            `/orden cocina` - Kitchen queue\n\
            `/orden ver` - Show one order\n\
            `/orden lista` - Mark an order ready (kitchen)\n\
            `/orden recogido` - Mark a ready order picked up\n\
            `/orden pago` - Confirm payment\n\
            `/orden completar` - Mark a paid order completed\n\
            `/orden despachar` - Release the table of a paid order\n\
            `/orden cancelar` - Cancel an unpaid order";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Lists orders whose table has not been released.
    #[poise::command(slash_command, rename = "abiertas")]
    pub async fn orden_abiertas(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        access::require_role(ctx, access::FLOOR).await?;
        let orders = order::list_open_orders(&ctx.data().database).await?;

        if orders.is_empty() {
            ctx.say("No open orders.").await?;
            return Ok(());
        }

        let fields = orders.iter().take(25).map(|o| {
            (
                format!("#{} · Table {}", o.order.id, o.order.table_number),
                format!(
                    "{} · {} · {} items",
                    o.status.label(),
                    format_currency(o.order.total),
                    o.unit_count()
                ),
                false,
            )
        });

        let embed = serenity::CreateEmbed::default()
            .title("📋 Open orders")
            .color(0x0034_98DB)
            .fields(fields)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "{} open order{}",
                orders.len(),
                if orders.len() == 1 { "" } else { "s" }
            )));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows the kitchen queue, oldest first.
    #[poise::command(slash_command, rename = "cocina")]
    pub async fn orden_cocina(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        access::require_role(ctx, access::KITCHEN).await?;
        let queue = order::list_kitchen_queue(&ctx.data().database).await?;

        if queue.is_empty() {
            ctx.say("👨‍🍳 Nothing to prepare.").await?;
            return Ok(());
        }

        let fields = queue.iter().take(25).map(|o| {
            let mut ticket = o
                .items
                .iter()
                .map(|item| format!("{}× {}", item.quantity, item.name))
                .collect::<Vec<_>>()
                .join("\n");
            if let Some(notes) = &o.order.notes {
                ticket.push_str(&format!("\n📝 {notes}"));
            }
            (
                format!(
                    "#{} · Table {} · {}",
                    o.order.id,
                    o.order.table_number,
                    o.order.created_at.format("%H:%M")
                ),
                ticket,
                false,
            )
        });

        let embed = serenity::CreateEmbed::default()
            .title("👨‍🍳 Kitchen")
            .color(0x00E6_7E22)
            .fields(fields);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows one order with its lines.
    #[poise::command(slash_command, rename = "ver")]
    pub async fn orden_ver(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order number"]
        #[autocomplete = "autocomplete::autocomplete_open_order"]
        numero: i64,
    ) -> Result<()> {
        access::require_role(ctx, access::FLOOR).await?;
        let order = order::get_order_with_items(&ctx.data().database, numero).await?;
        ctx.send(poise::CreateReply::default().embed(order_embed(&order)))
            .await?;
        Ok(())
    }

    /// Kitchen: marks an order ready for pickup.
    #[poise::command(slash_command, rename = "lista")]
    pub async fn orden_lista(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order number"]
        #[autocomplete = "autocomplete::autocomplete_open_order"]
        numero: i64,
    ) -> Result<()> {
        access::require_role(ctx, access::KITCHEN).await?;
        let change = order::mark_ready(&ctx.data().database, numero).await?;
        let order = publish_change(ctx, &change, false).await?;

        let reply = if change.changed {
            format!(
                "✅ Order #{} for table {} is ready.",
                order.order.id, order.order.table_number
            )
        } else {
            format!("Order #{} was already ready.", order.order.id)
        };
        ctx.say(reply).await?;
        Ok(())
    }

    /// Marks a ready order as picked up from the kitchen.
    #[poise::command(slash_command, rename = "recogido")]
    pub async fn orden_recogido(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order number"]
        #[autocomplete = "autocomplete::autocomplete_open_order"]
        numero: i64,
    ) -> Result<()> {
        access::require_role(ctx, access::FLOOR).await?;
        let change = order::mark_picked_up(&ctx.data().database, numero).await?;
        let order = publish_change(ctx, &change, false).await?;

        ctx.say(format!(
            "🛎️ Order #{} picked up for table {}.",
            order.order.id, order.order.table_number
        ))
        .await?;
        Ok(())
    }

    /// Confirms payment and records how the order was paid.
    #[poise::command(slash_command, rename = "pago")]
    pub async fn orden_pago(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order number"]
        #[autocomplete = "autocomplete::autocomplete_open_order"]
        numero: i64,
        #[description = "How it was paid"] tipo: PaymentChoice,
    ) -> Result<()> {
        access::require_role(ctx, access::FLOOR).await?;
        let change = order::confirm_payment(&ctx.data().database, numero, tipo.into()).await?;
        let order = publish_change(ctx, &change, false).await?;

        let paid_with = order.order.payment_type.map_or("?", PaymentType::label);
        ctx.say(format!(
            "💵 Order #{} paid: {} ({paid_with}).",
            order.order.id,
            format_currency(order.order.total)
        ))
        .await?;
        Ok(())
    }

    /// Marks a paid order completed.
    #[poise::command(slash_command, rename = "completar")]
    pub async fn orden_completar(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order number"]
        #[autocomplete = "autocomplete::autocomplete_open_order"]
        numero: i64,
    ) -> Result<()> {
        access::require_role(ctx, access::FLOOR).await?;
        let change = order::mark_completed(&ctx.data().database, numero).await?;
        let order = publish_change(ctx, &change, false).await?;

        ctx.say(format!("☑️ Order #{} completed.", order.order.id))
            .await?;
        Ok(())
    }

    /// Releases the table of a paid order.
    #[poise::command(slash_command, rename = "despachar")]
    pub async fn orden_despachar(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order number"]
        #[autocomplete = "autocomplete::autocomplete_open_order"]
        numero: i64,
    ) -> Result<()> {
        access::require_role(ctx, access::FLOOR).await?;
        let change = order::dispatch_order(&ctx.data().database, numero).await?;
        let order = publish_change(ctx, &change, true).await?;

        ctx.say(format!(
            "🚪 Order #{} dispatched. Table {} is free.",
            order.order.id, order.order.table_number
        ))
        .await?;
        Ok(())
    }

    /// Cancels an unpaid order, returning its stock and freeing its table.
    #[poise::command(slash_command, rename = "cancelar")]
    pub async fn orden_cancelar(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order number"]
        #[autocomplete = "autocomplete::autocomplete_open_order"]
        numero: i64,
    ) -> Result<()> {
        access::require_role(ctx, access::FLOOR).await?;
        let cancelled = order::cancel_order(&ctx.data().database, numero).await?;
        let (id, table_number) = (cancelled.order.id, cancelled.order.table_number);
        let products = cancelled.product_ids();
        ctx.data()
            .events
            .publish_order_change(Action::Deleted, cancelled, products, true);

        ctx.say(format!("🚫 Order #{id} for table {table_number} cancelled."))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
