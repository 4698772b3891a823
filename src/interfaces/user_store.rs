//! User directory interface.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Role, User};

/// Interface for account persistence.
///
/// Password hashing happens outside the store; only the opaque hash is kept.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create an account with zero balance and the `User` role.
    ///
    /// A duplicate username is reported as a uniqueness conflict.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<i64>;

    /// Fetch an account by id.
    async fn get_user(&self, user_id: i64) -> Result<User>;

    /// Fetch an account by username.
    async fn get_user_by_username(&self, username: &str) -> Result<User>;

    /// Change an account's role.
    async fn set_user_role(&self, user_id: i64, role: Role) -> Result<()>;
}
