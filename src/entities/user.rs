//! User entity - Represents an account on the vault server.
//!
//! The install wizard only ever creates administrator accounts; regular
//! accounts are managed by the account flows that take over after install.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Privilege level of an account
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum UserRole {
    /// Unauthenticated visitor
    #[sea_orm(string_value = "GUEST")]
    Guest,
    /// Ordinary account
    #[sea_orm(string_value = "USER")]
    User,
    /// Full administrative access
    #[sea_orm(string_value = "ADMINISTRATOR")]
    Administrator,
}

/// Whether an account may sign in
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum UserStatus {
    /// Active account
    #[sea_orm(string_value = "OK")]
    Ok,
    /// Locked out by an administrator
    #[sea_orm(string_value = "DISABLED")]
    Disabled,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    /// Opaque unique identifier (UUIDv4)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Login name, unique and immutable once created
    #[sea_orm(unique)]
    pub username: String,
    /// One-way bcrypt hash of the password; never exposed at the boundary
    pub password_hash: String,
    /// Privilege level
    pub role: UserRole,
    /// Account status
    pub status: UserStatus,
    /// Storage quota in bytes, -1 means unlimited
    pub storage_quota: i64,
    /// Monotonic ordering key, creation time in milliseconds
    pub sort_key: i64,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// When the account was last modified
    pub updated_at: DateTimeUtc,
    /// When the account last signed in
    pub last_access_at: DateTimeUtc,
}

/// `User` has no relationships the installer cares about
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
