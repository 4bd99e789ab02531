use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::users::repo_types::{NewUser, User, UserPatch};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("identity already registered")]
    Conflict,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Lookup and CRUD over user records. Implementations own their concurrency discipline.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_identity(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    async fn search_by_name(&self, name: &str) -> Result<Vec<User>, StoreError>;
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;
    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<User, StoreError>;
}

const USER_COLUMNS: &str =
    "id, name, email, role, website, age, photo, password_hash, is_active, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_error(e: sqlx::Error, what: &'static str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
        _ => StoreError::Backend(anyhow::Error::new(e).context(what)),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    /// Find a user by email.
    async fn find_by_identity(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("select user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("select user by id")?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows)
    }

    async fn search_by_name(&self, name: &str) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(name) = lower($1) ORDER BY created_at ASC"
        ))
        .bind(name)
        .fetch_all(&self.db)
        .await
        .context("search users by name")?;
        Ok(rows)
    }

    /// Create a new user with an already hashed password.
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, role, website, age, photo, password_hash, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.role)
        .bind(&new.website)
        .bind(new.age)
        .bind(&new.photo)
        .bind(&new.password_hash)
        .bind(new.is_active)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_write_error(e, "insert user"))
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                name      = COALESCE($2, name),
                email     = COALESCE($3, email),
                role      = COALESCE($4, role),
                website   = COALESCE($5, website),
                age       = COALESCE($6, age),
                photo     = COALESCE($7, photo),
                is_active = COALESCE($8, is_active)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.name)
        .bind(patch.email)
        .bind(patch.role)
        .bind(patch.website)
        .bind(patch.age)
        .bind(patch.photo)
        .bind(patch.is_active)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_write_error(e, "update user"))?
        .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("delete user")?
        .ok_or(StoreError::NotFound)
    }
}
