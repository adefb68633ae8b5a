//! Administrator account management.
//!
//! Runs against the reconciled schema: listing existing administrators,
//! creating the initial one, and validating credentials when an
//! administrator already exists. Plaintext passwords and stored hashes never
//! leave this module's call chain and are never logged.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use chrono::Utc;
use regex::Regex;
use sea_orm::{ConnectionTrait, PaginatorTrait, QueryOrder, QuerySelect, Set, prelude::*};
use std::sync::LazyLock;
use tracing::info;
use uuid::Uuid;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;
/// Maximum number of administrators returned by a listing
pub const ADMIN_LIST_LIMIT: u64 = 10;
/// Storage quota value meaning "unlimited"
pub const UNLIMITED_QUOTA: i64 = -1;

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z_]+$").expect("username pattern is valid"));

/// Returns up to [`ADMIN_LIST_LIMIT`] administrator accounts, ordered by
/// their creation sort key ascending. Read-only.
pub async fn list_administrators<C>(db: &C) -> Result<Vec<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Role.eq(user::UserRole::Administrator))
        .order_by_asc(user::Column::SortKey)
        .limit(ADMIN_LIST_LIMIT)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counts administrator accounts; used by the finish gate.
pub async fn count_administrators<C>(db: &C) -> Result<u64>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Role.eq(user::UserRole::Administrator))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Creates the initial administrator account.
///
/// The username must be non-empty and contain only letters, digits and `_`;
/// the password must be at least [`MIN_PASSWORD_LEN`] characters. An exact
/// username match with any existing account is a conflict.
pub async fn create_administrator<C>(
    db: &C,
    username: &str,
    plaintext_password: &str,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    if !USERNAME_PATTERN.is_match(username) {
        return Err(Error::Validation {
            message: "username is required and may only contain letters, digits and '_'"
                .to_string(),
        });
    }
    if plaintext_password.len() < MIN_PASSWORD_LEN {
        return Err(Error::Validation {
            message: format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        });
    }

    let duplicates = User::find()
        .filter(user::Column::Username.eq(username))
        .count(db)
        .await?;
    if duplicates > 0 {
        return Err(Error::Conflict {
            username: username.to_string(),
        });
    }

    let now = Utc::now();
    let account = user::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        username: Set(username.to_string()),
        password_hash: Set(bcrypt::hash(plaintext_password, bcrypt::DEFAULT_COST)?),
        role: Set(user::UserRole::Administrator),
        status: Set(user::UserStatus::Ok),
        storage_quota: Set(UNLIMITED_QUOTA),
        sort_key: Set(now.timestamp_millis()),
        created_at: Set(now),
        updated_at: Set(now),
        last_access_at: Set(now),
    };

    let created = account.insert(db).await?;
    info!(username = %created.username, "created administrator account");
    Ok(created)
}

/// Validates that `username`/`plaintext_password` belong to an existing
/// administrator account and returns it.
pub async fn validate_credentials<C>(
    db: &C,
    username: &str,
    plaintext_password: &str,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    if username.is_empty() {
        return Err(Error::Validation {
            message: "username is required".to_string(),
        });
    }
    if plaintext_password.len() < MIN_PASSWORD_LEN {
        return Err(Error::Validation {
            message: format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        });
    }

    let account = User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            username: username.to_string(),
        })?;

    if !bcrypt::verify(plaintext_password, &account.password_hash)? {
        return Err(Error::Authentication);
    }

    if account.role != user::UserRole::Administrator {
        return Err(Error::Authorization {
            username: username.to_string(),
        });
    }

    Ok(account)
}
