//! Role checks for staff commands.

use crate::{
    bot::BotData,
    core::user,
    entities::{Role, user::Model as User},
    errors::{Error, Result},
};

/// Roles allowed to read menus, tables and open orders.
pub const ANY_STAFF: &[Role] = &[Role::Administrator, Role::Waiter, Role::Cook];
/// Roles allowed to run the floor: payments, pickups, dispatch.
pub const FLOOR: &[Role] = &[Role::Waiter];
/// Roles allowed to work the kitchen queue.
pub const KITCHEN: &[Role] = &[Role::Cook];
/// Administrator only.
pub const ADMIN: &[Role] = &[Role::Administrator];

/// Returns the staff user behind the command author if their role is allowed.
///
/// # Errors
/// Returns [`Error::Forbidden`] when the author is not active staff with one of
/// the `allowed` roles. Administrators are always allowed.
pub async fn require_role(
    ctx: poise::Context<'_, BotData, Error>,
    allowed: &[Role],
) -> Result<User> {
    let discord_id = ctx.author().id.to_string();
    user::authorize(&ctx.data().database, &discord_id, allowed).await
}
