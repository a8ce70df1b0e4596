use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::users::entity::{NewUser, UserPatch, UserResponse, UserRow};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,
    /// Anything else the storage reported, unique violations included.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence boundary for users. Nothing above this trait knows which
/// storage engine sits underneath.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> RepoResult<UserResponse>;

    async fn find_all_users(&self) -> RepoResult<Vec<UserResponse>>;

    async fn find_user_by_id(&self, id: i64) -> RepoResult<UserResponse>;

    async fn find_user_by_username(&self, username: &str) -> RepoResult<UserResponse>;

    async fn find_user_by_email(&self, email: &str) -> RepoResult<UserResponse>;

    /// Overwrites every `Some` field of the patch and refreshes `updated_at`.
    async fn update_user(&self, id: i64, patch: UserPatch) -> RepoResult<UserResponse>;

    async fn delete_user(&self, id: i64) -> RepoResult<()>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, sql: &str, key: &str, what: &'static str) -> RepoResult<UserResponse> {
        let row = sqlx::query_as::<_, UserRow>(sql)
            .bind(key)
            .fetch_optional(&self.db)
            .await
            .context(what)?;
        row.map(UserResponse::from).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, user: NewUser) -> RepoResult<UserResponse> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, password, created_at, updated_at)
            VALUES ($1, $2, $3, now(), now())
            RETURNING id, username, email, password, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_one(&self.db)
        .await
        .context("insert user")?;
        Ok(row.into())
    }

    async fn find_all_users(&self) -> RepoResult<Vec<UserResponse>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password, created_at, updated_at
              FROM users
             ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows.into_iter().map(UserResponse::from).collect())
    }

    async fn find_user_by_id(&self, id: i64) -> RepoResult<UserResponse> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password, created_at, updated_at
              FROM users
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get user by id")?;
        row.map(UserResponse::from).ok_or(RepoError::NotFound)
    }

    async fn find_user_by_username(&self, username: &str) -> RepoResult<UserResponse> {
        self.find_one(
            r#"
            SELECT id, username, email, password, created_at, updated_at
              FROM users
             WHERE username = $1
            "#,
            username,
            "get user by username",
        )
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<UserResponse> {
        self.find_one(
            r#"
            SELECT id, username, email, password, created_at, updated_at
              FROM users
             WHERE email = $1
            "#,
            email,
            "get user by email",
        )
        .await
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> RepoResult<UserResponse> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
               SET username   = COALESCE($2, username),
                   email      = COALESCE($3, email),
                   password   = COALESCE($4, password),
                   updated_at = now()
             WHERE id = $1
            RETURNING id, username, email, password, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.username)
        .bind(patch.email)
        .bind(patch.password)
        .fetch_optional(&self.db)
        .await
        .context("update user")?;
        row.map(UserResponse::from).ok_or(RepoError::NotFound)
    }

    async fn delete_user(&self, id: i64) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
pub use memory::InMemoryUserRepository;
