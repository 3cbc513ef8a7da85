//! Staff user business logic and role checks.
//!
//! Roles gate what staff may do from the bot. [`authorize`] is the single check
//! every staff command goes through; administrators pass every check.

use crate::{
    entities::{Role, User, user},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument, warn};

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid || email.contains(char::is_whitespace) {
        return Err(Error::validation(format!("'{email}' is not a valid email")));
    }
    Ok(email)
}

fn not_found(user: impl ToString) -> Error {
    Error::UserNotFound {
        user: user.to_string(),
    }
}

/// Retrieves every user, ordered by name.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_asc(user::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a user by ID.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by email, case-insensitively.
pub async fn get_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds the user linked to a Discord account.
pub async fn get_user_by_discord_id(
    db: &DatabaseConnection,
    discord_id: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::DiscordId.eq(discord_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates an active staff user.
///
/// # Errors
/// Returns an error if the email is malformed or already used, the name is
/// empty, or the Discord ID is already linked to someone else.
#[instrument(skip(db, name))]
pub async fn create_user(
    db: &DatabaseConnection,
    email: &str,
    name: String,
    role: Role,
    discord_id: Option<String>,
) -> Result<user::Model> {
    let email = normalize_email(email)?;
    if name.trim().is_empty() {
        return Err(Error::validation("User name cannot be empty"));
    }
    if get_user_by_email(db, &email).await?.is_some() {
        return Err(Error::DuplicateUser { email });
    }
    if let Some(ref id) = discord_id {
        ensure_discord_id_free(db, id, None).await?;
    }

    let now = Utc::now();
    let user = user::ActiveModel {
        email: Set(email),
        name: Set(name.trim().to_string()),
        role: Set(role),
        active: Set(true),
        discord_id: Set(discord_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = user.insert(db).await?;
    info!(user_id = created.id, role = role.label(), "User created");
    Ok(created)
}

async fn ensure_discord_id_free(
    db: &DatabaseConnection,
    discord_id: &str,
    except_user: Option<i64>,
) -> Result<()> {
    if let Some(owner) = get_user_by_discord_id(db, discord_id).await? {
        if Some(owner.id) != except_user {
            return Err(Error::validation(format!(
                "That Discord account is already linked to {}",
                owner.email
            )));
        }
    }
    Ok(())
}

async fn load(db: &DatabaseConnection, user_id: i64) -> Result<user::ActiveModel> {
    Ok(User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| not_found(user_id))?
        .into())
}

/// Changes a user's role.
#[instrument(skip(db))]
pub async fn set_user_role(db: &DatabaseConnection, user_id: i64, role: Role) -> Result<user::Model> {
    let mut user = load(db, user_id).await?;
    user.role = Set(role);
    user.updated_at = Set(Utc::now());
    user.update(db).await.map_err(Into::into)
}

/// Activates or deactivates a user.
#[instrument(skip(db))]
pub async fn set_user_active(
    db: &DatabaseConnection,
    user_id: i64,
    active: bool,
) -> Result<user::Model> {
    let mut user = load(db, user_id).await?;
    user.active = Set(active);
    user.updated_at = Set(Utc::now());
    user.update(db).await.map_err(Into::into)
}

/// Links a Discord account to a user, replacing any previous link.
#[instrument(skip(db))]
pub async fn link_discord_id(
    db: &DatabaseConnection,
    user_id: i64,
    discord_id: String,
) -> Result<user::Model> {
    ensure_discord_id_free(db, &discord_id, Some(user_id)).await?;
    let mut user = load(db, user_id).await?;
    user.discord_id = Set(Some(discord_id));
    user.updated_at = Set(Utc::now());
    user.update(db).await.map_err(Into::into)
}

/// Returns the active user linked to `discord_id` if their role is allowed.
///
/// Administrators are always allowed.
///
/// # Errors
/// Returns [`Error::Forbidden`] if the account is unknown, inactive, or has a
/// role outside `allowed`.
pub async fn authorize(
    db: &DatabaseConnection,
    discord_id: &str,
    allowed: &[Role],
) -> Result<user::Model> {
    let Some(user) = get_user_by_discord_id(db, discord_id).await? else {
        warn!(discord_id, "Unknown staff account");
        return Err(Error::Forbidden {
            message: "your Discord account is not registered as staff".to_string(),
        });
    };

    if !user.active {
        return Err(Error::Forbidden {
            message: format!("{} is inactive", user.name),
        });
    }

    if user.role != Role::Administrator && !allowed.contains(&user.role) {
        return Err(Error::Forbidden {
            message: format!("role '{}' cannot do this", user.role.label()),
        });
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_user_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        for bad in ["", "no-at-sign", "@domain", "local@", "a b@c.d"] {
            let result = create_user(&db, bad, "Ana".to_string(), Role::Waiter, None).await;
            assert!(
                matches!(result, Err(Error::Validation { .. })),
                "accepted {bad:?}"
            );
        }

        let result = create_user(&db, "ana@x.mx", "  ".to_string(), Role::Waiter, None).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_normalizes_email() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_user(&db, " Ana@Cocina.MX ", "Ana".to_string(), Role::Cook, None).await?;

        assert_eq!(user.email, "ana@cocina.mx");
        assert!(user.active);
        assert_eq!(user.role, Role::Cook);

        let found = get_user_by_email(&db, "ANA@cocina.mx").await?.unwrap();
        assert_eq!(found.id, user.id);

        let result = create_user(&db, "ana@cocina.mx", "Otra".to_string(), Role::Waiter, None).await;
        assert!(matches!(result.unwrap_err(), Error::DuplicateUser { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_discord_id_is_exclusive() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "ana@x.mx", Role::Waiter, Some("111")).await?;
        let luis = create_test_user(&db, "luis@x.mx", Role::Cook, None).await?;

        let result = link_discord_id(&db, luis.id, "111".to_string()).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let linked = link_discord_id(&db, luis.id, "222".to_string()).await?;
        assert_eq!(linked.discord_id.as_deref(), Some("222"));

        // Re-linking the same account to the same user is fine
        link_discord_id(&db, luis.id, "222".to_string()).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_authorize_roles() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "admin@x.mx", Role::Administrator, Some("1")).await?;
        create_test_user(&db, "mesero@x.mx", Role::Waiter, Some("2")).await?;
        let cook = create_test_user(&db, "cocina@x.mx", Role::Cook, Some("3")).await?;

        assert!(authorize(&db, "1", &[Role::Cook]).await.is_ok());
        assert!(authorize(&db, "2", &[Role::Waiter]).await.is_ok());
        assert!(matches!(
            authorize(&db, "2", &[Role::Cook]).await.unwrap_err(),
            Error::Forbidden { .. }
        ));
        assert!(matches!(
            authorize(&db, "404", &[Role::Waiter]).await.unwrap_err(),
            Error::Forbidden { .. }
        ));

        set_user_active(&db, cook.id, false).await?;
        assert!(matches!(
            authorize(&db, "3", &[Role::Cook]).await.unwrap_err(),
            Error::Forbidden { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_user_role() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "ana@x.mx", Role::Waiter, Some("9")).await?;

        let promoted = set_user_role(&db, user.id, Role::Administrator).await?;
        assert_eq!(promoted.role, Role::Administrator);

        let result = set_user_role(&db, 999, Role::Cook).await;
        assert!(matches!(result.unwrap_err(), Error::UserNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_users_sorted_by_name() -> Result<()> {
        let db = setup_test_db().await?;
        create_user(&db, "z@x.mx", "Zoe".to_string(), Role::Cook, None).await?;
        create_user(&db, "a@x.mx", "Ana".to_string(), Role::Waiter, None).await?;

        let users = list_users(&db).await?;
        assert_eq!(users[0].name, "Ana");
        assert_eq!(users[1].name, "Zoe");
        Ok(())
    }
}
