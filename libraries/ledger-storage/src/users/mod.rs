//! Local account queries

use chrono::{DateTime, Utc};
use ledger_core::types::{NewUser, User, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::{Result, StorageError};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, last_login, \
                            tutorial_seen, unique_device_id, imported";

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::SerializationError(format!("timestamp {value}: {e}")))
}

fn from_row(row: &SqliteRow) -> Result<User> {
    let created_at: String = row.get("created_at");
    let last_login: Option<String> = row.get("last_login");

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: parse_time(&created_at)?,
        last_login: last_login.as_deref().map(parse_time).transpose()?,
        tutorial_seen: row.get::<i64, _>("tutorial_seen") != 0,
        unique_device_id: row.get("unique_device_id"),
        imported: row.get::<i64, _>("imported") != 0,
    })
}

/// Create a user
///
/// # Errors
///
/// Returns a database error if the username or email is already taken
pub async fn insert(pool: &SqlitePool, user: NewUser) -> Result<User> {
    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, created_at, last_login,
                            tutorial_seen, unique_device_id, imported)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.created_at.to_rfc3339())
    .bind(user.last_login.map(|t| t.to_rfc3339()))
    .bind(user.tutorial_seen)
    .bind(&user.unique_device_id)
    .bind(user.imported)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    tracing::debug!(id, username = %user.username, imported = user.imported, "Created user");

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| StorageError::Database(sqlx::Error::RowNotFound))
}

pub async fn find_by_id(pool: &SqlitePool, id: UserId) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(from_row).transpose()
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
    let row = sqlx::query(&sql).bind(username).fetch_optional(pool).await?;
    row.as_ref().map(from_row).transpose()
}

/// Email lookup is case-insensitive
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE");
    let row = sqlx::query(&sql).bind(email).fetch_optional(pool).await?;
    row.as_ref().map(from_row).transpose()
}

/// Overwrite every field of an existing user, keyed by id
pub async fn update(pool: &SqlitePool, user: &User) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE users SET username = ?, email = ?, password_hash = ?, created_at = ?,
                          last_login = ?, tutorial_seen = ?, unique_device_id = ?, imported = ?
         WHERE id = ?",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.created_at.to_rfc3339())
    .bind(user.last_login.map(|t| t.to_rfc3339()))
    .bind(user.tutorial_seen)
    .bind(&user.unique_device_id)
    .bind(user.imported)
    .bind(user.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn touch_last_login(pool: &SqlitePool, username: &str) -> Result<()> {
    sqlx::query("UPDATE users SET last_login = ? WHERE username = ?")
        .bind(Utc::now().to_rfc3339())
        .bind(username)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, username: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE username = ?")
        .bind(username)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// All users ordered by username
pub async fn list(pool: &SqlitePool) -> Result<Vec<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username");
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}
