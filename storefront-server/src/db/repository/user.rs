//! User Repository

use sqlx::SqlitePool;

use crate::db::models::User;
use crate::utils::{AppError, AppResult};
use crate::utils::time::now_rfc3339;

pub async fn create(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> AppResult<User> {
    let result = sqlx::query(
        "INSERT INTO users (name, email, password_hash, is_admin, created_at)
         VALUES (?, ?, ?, 0, ?)",
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(now_rfc3339())
    .execute(pool)
    .await;

    let result = match result {
        Ok(r) => r,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(AppError::conflict(format!("Email {} is already registered", email)));
        }
        Err(e) => return Err(e.into()),
    };

    let user = find_by_id(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| AppError::database("User row vanished after insert"))?;
    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}
