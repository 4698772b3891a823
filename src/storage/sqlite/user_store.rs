//! SQLite UserStore implementation.

use async_trait::async_trait;
use sea_query::{Expr, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::error::{Result, StoreError};
use crate::interfaces::UserStore;
use crate::models::{Role, User};
use crate::storage::helpers::{now_timestamp, parse_status, require_text};
use crate::storage::schema::Users;

/// SQLite implementation of UserStore.
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Create a new SQLite user store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn select_users() -> sea_query::SelectStatement {
        Query::select()
            .columns([
                Users::Id,
                Users::Username,
                Users::PasswordHash,
                Users::Role,
                Users::Balance,
            ])
            .from(Users::Table)
            .to_owned()
    }

    fn from_row(row: &SqliteRow) -> Result<User> {
        let role: String = row.try_get("role")?;
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            role: parse_status(&role)?,
            balance: row.try_get("balance")?,
        })
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<i64> {
        require_text("username", username)?;
        require_text("password hash", password_hash)?;

        let query = Query::insert()
            .into_table(Users::Table)
            .columns([
                Users::Username,
                Users::PasswordHash,
                Users::Role,
                Users::Balance,
                Users::CreatedAt,
            ])
            .values_panic([
                username.trim().into(),
                password_hash.into(),
                Role::User.as_str().into(),
                0i64.into(),
                now_timestamp().into(),
            ])
            .to_string(SqliteQueryBuilder);

        // A duplicate username surfaces as a unique violation from the driver
        let result = sqlx::query(&query).execute(&self.pool).await?;
        let user_id = result.last_insert_rowid();

        info!(user_id, username, "created user");
        Ok(user_id)
    }

    async fn get_user(&self, user_id: i64) -> Result<User> {
        let query = Self::select_users()
            .and_where(Expr::col(Users::Id).eq(user_id))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(row) => Self::from_row(&row),
            None => Err(StoreError::NotFound {
                entity: "user",
                id: user_id,
            }),
        }
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User> {
        let query = Self::select_users()
            .and_where(Expr::col(Users::Username).eq(username.trim()))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(row) => Self::from_row(&row),
            None => Err(StoreError::NotFoundBy {
                entity: "user",
                key: username.to_string(),
            }),
        }
    }

    async fn set_user_role(&self, user_id: i64, role: Role) -> Result<()> {
        let query = Query::update()
            .table(Users::Table)
            .value(Users::Role, role.as_str())
            .and_where(Expr::col(Users::Id).eq(user_id))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "user",
                id: user_id,
            });
        }

        info!(user_id, role = %role, "updated user role");
        Ok(())
    }
}
