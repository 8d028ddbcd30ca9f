//! Postgres-backed user/item store.
//!
//! ## Schema
//!
//! ```sql
//! users(id BIGSERIAL PK, email TEXT UNIQUE, hashed_password TEXT, is_active BOOLEAN)
//! items(id BIGSERIAL PK, title TEXT, description TEXT NULL, owner_id BIGINT FK users)
//! ```
//!
//! `BIGSERIAL` gives the monotonic id assignment the replacement-owner rule
//! relies on.
//!
//! ## Transactions
//!
//! [`Store::begin`] wraps a `sqlx::Transaction`. Rows read inside a
//! transaction are locked with `FOR UPDATE` so two concurrent deactivations
//! cannot both pick each other as replacement owner.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use itembox_auth::{ActiveUserLookup, LookupError};
use itembox_core::{Item, ItemId, NewItem, NewUser, Page, User, UserId};

use super::r#trait::{Store, StoreError, StoreTx};

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        hashed_password TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        owner_id BIGINT NOT NULL REFERENCES users(id)
    )
    "#,
];

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, e: sqlx::Error) -> StoreError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
            StoreError::Conflict(format!("{operation}: {db}"))
        }
        _ => StoreError::Backend(format!("{operation}: {e}")),
    }
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let read = |e: sqlx::Error| StoreError::Backend(format!("failed to read user row: {e}"));
    Ok(User {
        id: UserId::new(row.try_get("id").map_err(read)?),
        email: row.try_get("email").map_err(read)?,
        is_active: row.try_get("is_active").map_err(read)?,
    })
}

fn item_from_row(row: &PgRow) -> Result<Item, StoreError> {
    let read = |e: sqlx::Error| StoreError::Backend(format!("failed to read item row: {e}"));
    Ok(Item {
        id: ItemId::new(row.try_get("id").map_err(read)?),
        title: row.try_get("title").map_err(read)?,
        description: row.try_get("description").map_err(read)?,
        owner_id: UserId::new(row.try_get("owner_id").map_err(read)?),
    })
}

fn page_bounds(page: Page) -> (i64, i64) {
    let limit = i64::try_from(page.limit).unwrap_or(i64::MAX);
    let offset = i64::try_from(page.skip).unwrap_or(i64::MAX);
    (limit, offset)
}

#[async_trait]
impl ActiveUserLookup for PostgresStore {
    async fn find_active_user(&self, user_id: UserId) -> Result<Option<User>, LookupError> {
        sqlx::query("SELECT id, email, is_active FROM users WHERE id = $1 AND is_active")
            .bind(user_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LookupError(e.to_string()))?
            .as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(|e| LookupError(e.to_string()))
    }
}

#[async_trait]
impl Store for PostgresStore {
    #[instrument(skip(self, new_user), err)]
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (email, hashed_password, is_active)
            VALUES ($1, $2, TRUE)
            RETURNING id, email, is_active
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;

        user_from_row(&row)
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        sqlx::query("SELECT id, email, is_active FROM users WHERE id = $1")
            .bind(user_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query("SELECT id, email, is_active FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user_by_email", e))?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn list_users(&self, page: Page) -> Result<Vec<User>, StoreError> {
        let (limit, offset) = page_bounds(page);
        sqlx::query("SELECT id, email, is_active FROM users ORDER BY id ASC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?
            .iter()
            .map(user_from_row)
            .collect()
    }

    #[instrument(skip(self, new_item), fields(owner_id = %owner_id), err)]
    async fn create_item(&self, owner_id: UserId, new_item: NewItem) -> Result<Item, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO items (title, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, owner_id
            "#,
        )
        .bind(&new_item.title)
        .bind(&new_item.description)
        .bind(owner_id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_item", e))?;

        item_from_row(&row)
    }

    async fn list_items(&self, page: Page) -> Result<Vec<Item>, StoreError> {
        let (limit, offset) = page_bounds(page);
        sqlx::query(
            "SELECT id, title, description, owner_id FROM items ORDER BY id ASC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_items", e))?
        .iter()
        .map(item_from_row)
        .collect()
    }

    async fn list_user_items(&self, owner_id: UserId, page: Page) -> Result<Vec<Item>, StoreError> {
        let (limit, offset) = page_bounds(page);
        sqlx::query(
            r#"
            SELECT id, title, description, owner_id
            FROM items
            WHERE owner_id = $1
            ORDER BY id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id.get())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_user_items", e))?
        .iter()
        .map(item_from_row)
        .collect()
    }

    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PostgresTx { tx }))
    }
}

struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn active_user(&mut self, user_id: UserId) -> Result<Option<User>, StoreError> {
        sqlx::query("SELECT id, email, is_active FROM users WHERE id = $1 AND is_active FOR UPDATE")
            .bind(user_id.get())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("active_user", e))?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn min_active_user_excluding(&mut self, excluded: UserId) -> Result<Option<User>, StoreError> {
        sqlx::query(
            r#"
            SELECT id, email, is_active
            FROM users
            WHERE is_active AND id <> $1
            ORDER BY id ASC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(excluded.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("min_active_user_excluding", e))?
        .as_ref()
        .map(user_from_row)
        .transpose()
    }

    async fn reassign_items(&mut self, from: UserId, to: UserId) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE items SET owner_id = $2 WHERE owner_id = $1")
            .bind(from.get())
            .bind(to.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("reassign_items", e))?;
        Ok(result.rows_affected())
    }

    async fn set_active(&mut self, user_id: UserId, is_active: bool) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1")
            .bind(user_id.get())
            .bind(is_active)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("set_active", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!("user {user_id} does not exist")));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}
