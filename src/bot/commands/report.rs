//! Report Discord commands - `/report ventas`. Admin only.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::access},
        core::report::{self, DailySales, SalesSummary, format_currency},
        errors::{Error, Result},
    };
    use chrono::{DateTime, Duration, Utc};
    use poise::serenity_prelude as serenity;

    const TOP_PRODUCTS: usize = 5;

    /// Start of the window covering `days` UTC calendar days, today included.
    pub(crate) fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
        let midnight = now.date_naive().and_time(chrono::NaiveTime::MIN).and_utc();
        midnight - Duration::days(i64::from(days.max(1)) - 1)
    }

    fn summary_text(summary: &SalesSummary) -> String {
        format!(
            "**Revenue:** {}\n**Paid orders:** {} of {}\n**Average ticket:** {}\n**Open orders:** {}",
            format_currency(summary.revenue),
            summary.paid_orders,
            summary.order_count,
            format_currency(summary.average_ticket),
            summary.open_orders
        )
    }

    fn payments_text(summary: &SalesSummary) -> String {
        if summary.by_payment.is_empty() {
            return "No payments yet".to_string();
        }
        summary
            .by_payment
            .iter()
            .map(|p| {
                format!(
                    "{}: {} ({} orders)",
                    p.payment_type.label(),
                    format_currency(p.revenue),
                    p.orders
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn products_text(summary: &SalesSummary) -> String {
        if summary.by_product.is_empty() {
            return "No sales yet".to_string();
        }
        summary
            .by_product
            .iter()
            .take(TOP_PRODUCTS)
            .enumerate()
            .map(|(i, p)| {
                format!(
                    "{}. {} · {} units · {}",
                    i + 1,
                    p.name,
                    p.units,
                    format_currency(p.revenue)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn days_text(days: &[DailySales]) -> String {
        if days.is_empty() {
            return "No orders".to_string();
        }
        days.iter()
            .map(|d| {
                format!(
                    "{} · {} orders · {}",
                    d.date.format("%d/%m"),
                    d.orders,
                    format_currency(d.revenue)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parent command for reports.
    #[poise::command(slash_command, subcommands("report_ventas"))]
    pub async fn report(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Report command. Available subcommands:\n`/report ventas [days]` - Sales summary")
            .await?;
        Ok(())
    }

    /// Sales summary for the last few days.
    #[poise::command(slash_command, rename = "ventas")]
    pub async fn report_ventas(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "UTC calendar days to cover, including today (default 1)"]
        #[min = 1]
        #[max = 90]
        days: Option<u32>,
    ) -> Result<()> {
        access::require_role(ctx, access::ADMIN).await?;
        let db = &ctx.data().database;

        let days = days.unwrap_or(1).clamp(1, 90);
        let to = Utc::now();
        let from = window_start(to, days);

        let summary = report::sales_summary(db, from, to).await?;
        let daily = report::daily_sales(db, from, to).await?;

        let embed = serenity::CreateEmbed::default()
            .title(format!("📊 {} · sales", ctx.data().restaurant_name))
            .description(format!(
                "{} → {}",
                from.format("%Y-%m-%d"),
                to.format("%Y-%m-%d %H:%M UTC")
            ))
            .color(0x0034_98DB)
            .field("Summary", summary_text(&summary), false)
            .field("By payment", payments_text(&summary), true)
            .field("Best sellers", products_text(&summary), true)
            .field("By day", days_text(&daily), false)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Last {days} day{}",
                if days == 1 { "" } else { "s" }
            )));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::inner::window_start;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_window_starts_at_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 18, 30, 0).unwrap();

        let today = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(window_start(now, 1), today);
        assert_eq!(window_start(now, 0), today);

        let week = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap();
        assert_eq!(window_start(now, 7), week);
    }
}
