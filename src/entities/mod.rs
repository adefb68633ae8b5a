//! `SeaORM` entity definitions for the tables the installer manages directly.

/// User account entity, including the administrator created by the wizard
pub mod user;

pub use user::Entity as User;
