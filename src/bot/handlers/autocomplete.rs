//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions are capped at 25, the Discord limit. Lookup failures yield no
//! suggestions rather than an error.

use crate::{
    bot::BotData,
    core::{order, product, report::format_currency, table},
    errors::Error,
};
use poise::serenity_prelude as serenity;

const DISCORD_LIMIT: usize = 25;

/// Suggests product names containing the partial input, case-insensitively.
pub async fn autocomplete_product_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(products) = product::list_products(&ctx.data().database).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = products
        .into_iter()
        .filter(|p| p.name.to_lowercase().contains(&partial_lower))
        .map(|p| p.name)
        .take(DISCORD_LIMIT)
        .collect();

    matching.sort();
    matching
}

/// Suggests table numbers, labelled with capacity and location.
pub async fn autocomplete_table_number(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let Ok(tables) = table::list_tables(&ctx.data().database).await else {
        return Vec::new();
    };

    tables
        .into_iter()
        .filter(|t| t.number.to_string().starts_with(partial.trim()))
        .take(DISCORD_LIMIT)
        .map(|t| {
            let state = if t.available { "free" } else { "occupied" };
            serenity::AutocompleteChoice::new(
                format!("Table {} · {} seats · {} · {state}", t.number, t.capacity, t.location),
                t.number,
            )
        })
        .collect()
}

/// Suggests open order ids with their table and total.
pub async fn autocomplete_open_order(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let Ok(orders) = order::list_open_orders(&ctx.data().database).await else {
        return Vec::new();
    };

    orders
        .into_iter()
        .filter(|o| o.order.id.to_string().starts_with(partial.trim()))
        .take(DISCORD_LIMIT)
        .map(|o| {
            serenity::AutocompleteChoice::new(
                format!(
                    "#{} · Table {} · {} · {}",
                    o.order.id,
                    o.order.table_number,
                    format_currency(o.order.total),
                    o.status.label()
                ),
                o.order.id,
            )
        })
        .collect()
}
