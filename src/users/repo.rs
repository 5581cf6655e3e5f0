use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_root: bool,
}

impl User {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, is_active, is_superuser, is_root \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, is_active, is_superuser, is_root \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    /// Inserts a new user. Root status always implies superuser status.
    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        is_active: bool,
        is_superuser: bool,
        is_root: bool,
    ) -> Result<User, sqlx::Error> {
        let is_superuser = is_superuser || is_root;
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, is_active, is_superuser, is_root) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, email, password_hash, is_active, is_superuser, is_root",
        )
        .bind(email)
        .bind(password_hash)
        .bind(is_active)
        .bind(is_superuser)
        .bind(is_root)
        .fetch_one(db)
        .await
    }

    /// Page of users plus the total account count.
    pub async fn list(
        db: &PgPool,
        skip: i64,
        limit: i64,
    ) -> Result<(Vec<User>, i64), sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await?;

        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, is_active, is_superuser, is_root \
             FROM users ORDER BY email ASC, id ASC OFFSET $1 LIMIT $2",
        )
        .bind(skip)
        .bind(limit)
        .fetch_all(db)
        .await?;

        Ok((users, count))
    }

    pub async fn update_email(db: &PgPool, id: Uuid, email: &str) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET email = $2 WHERE id = $1 \
             RETURNING id, email, password_hash, is_active, is_superuser, is_root",
        )
        .bind(id)
        .bind(email)
        .fetch_one(db)
        .await
    }

    pub async fn update_password(
        db: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Writes the merged flag set in one statement. Callers merge the patch
    /// via `UserStatusPatch::apply` so the root invariant holds here too.
    pub async fn update_status(
        db: &PgPool,
        id: Uuid,
        is_active: bool,
        is_superuser: bool,
        is_root: bool,
    ) -> Result<User, sqlx::Error> {
        let is_superuser = is_superuser || is_root;
        sqlx::query_as::<_, User>(
            "UPDATE users SET is_active = $2, is_superuser = $3, is_root = $4 WHERE id = $1 \
             RETURNING id, email, password_hash, is_active, is_superuser, is_root",
        )
        .bind(id)
        .bind(is_active)
        .bind(is_superuser)
        .bind(is_root)
        .fetch_one(db)
        .await
    }

    /// Owned expenses go with the account via the cascading foreign key.
    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
