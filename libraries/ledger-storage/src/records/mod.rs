//! Owner-scoped record collections (work orders, expenses)
//!
//! Every function here is generic over [`OwnedRecord`]; the backing table
//! comes from the record type's collection. The identifier and owner are
//! stored in their own columns and are authoritative over whatever the JSON
//! body says.
//!
//! Scoped functions take a [`UserContext`]. With no current user they read
//! nothing and modify nothing; the `_any` variants ignore ownership.

use chrono::Utc;
use ledger_core::types::{OwnedRecord, RecordId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::context::UserContext;
use crate::error::Result;

fn table<T: OwnedRecord>() -> &'static str {
    T::COLLECTION.table()
}

fn from_row<T: OwnedRecord>(row: &SqliteRow) -> Result<T> {
    let body: String = row.get("body");
    let mut record: T = serde_json::from_str(&body)?;
    record.set_id(Some(row.get("id")));
    record.set_owner(row.get("owner"));
    Ok(record)
}

/// JSON body without the columns that live outside it
fn to_body<T: OwnedRecord>(record: &T) -> Result<String> {
    let mut body = record.clone();
    body.set_id(None);
    body.set_owner(None);
    Ok(serde_json::to_string(&body)?)
}

/// Owner to write: the current user when set, otherwise the caller's value
fn effective_owner<T: OwnedRecord>(ctx: &UserContext, record: &T) -> Option<String> {
    ctx.current_user()
        .map(str::to_string)
        .or_else(|| record.owner().map(str::to_string))
}

async fn insert_row<T: OwnedRecord>(
    pool: &SqlitePool,
    id: Option<RecordId>,
    record: &T,
) -> Result<RecordId> {
    let sql = format!(
        "INSERT INTO {} (id, owner, date, category, body) VALUES (?, ?, ?, ?, ?)",
        table::<T>()
    );

    let result = sqlx::query(&sql)
        .bind(id)
        .bind(record.owner())
        .bind(record.date())
        .bind(record.category())
        .bind(to_body(record)?)
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Owner of the row with this identifier, `None` when the row is missing
async fn owner_of<T: OwnedRecord>(
    pool: &SqlitePool,
    id: RecordId,
) -> Result<Option<Option<String>>> {
    let sql = format!("SELECT owner FROM {} WHERE id = ?", table::<T>());
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.map(|r| r.get::<Option<String>, _>("owner")))
}

/// Insert a record, assigning a fresh identifier
///
/// Any identifier on the input is ignored. The owner is stamped from the
/// context when a current user is set.
pub async fn insert<T: OwnedRecord>(
    pool: &SqlitePool,
    ctx: &UserContext,
    mut record: T,
) -> Result<T> {
    record.set_owner(effective_owner(ctx, &record));
    record.touch(Utc::now());

    let id = insert_row(pool, None, &record).await?;
    record.set_id(Some(id));

    tracing::debug!(collection = %T::COLLECTION, id, owner = ?record.owner(), "Inserted record");
    Ok(record)
}

/// Insert keeping the record's identifier when no row uses it yet
///
/// Timestamps are kept as they are; this is the import path.
pub async fn restore<T: OwnedRecord>(
    pool: &SqlitePool,
    ctx: &UserContext,
    mut record: T,
) -> Result<T> {
    record.set_owner(effective_owner(ctx, &record));

    let keep_id = match record.id() {
        Some(id) => owner_of::<T>(pool, id).await?.is_none().then_some(id),
        None => None,
    };

    let id = insert_row(pool, keep_id, &record).await?;
    record.set_id(Some(id));
    Ok(record)
}

/// All records of the current owner, in insertion order
pub async fn read_all<T: OwnedRecord>(pool: &SqlitePool, ctx: &UserContext) -> Result<Vec<T>> {
    let Some(owner) = ctx.current_user() else {
        return Ok(Vec::new());
    };

    let sql = format!(
        "SELECT id, owner, body FROM {} WHERE owner = ? ORDER BY id",
        table::<T>()
    );
    let rows = sqlx::query(&sql).bind(owner).fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// All records of every owner, in insertion order
pub async fn read_all_any<T: OwnedRecord>(pool: &SqlitePool) -> Result<Vec<T>> {
    let sql = format!("SELECT id, owner, body FROM {} ORDER BY id", table::<T>());
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// All records of a named owner, regardless of the current user
pub async fn read_owned_by<T: OwnedRecord>(pool: &SqlitePool, owner: &str) -> Result<Vec<T>> {
    read_all(pool, &UserContext::for_user(owner)).await
}

pub async fn find_by_id<T: OwnedRecord>(
    pool: &SqlitePool,
    ctx: &UserContext,
    id: RecordId,
) -> Result<Option<T>> {
    let Some(owner) = ctx.current_user() else {
        return Ok(None);
    };

    let sql = format!(
        "SELECT id, owner, body FROM {} WHERE id = ? AND owner = ?",
        table::<T>()
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn find_by_category<T: OwnedRecord>(
    pool: &SqlitePool,
    ctx: &UserContext,
    category: &str,
) -> Result<Vec<T>> {
    let Some(owner) = ctx.current_user() else {
        return Ok(Vec::new());
    };

    let sql = format!(
        "SELECT id, owner, body FROM {} WHERE owner = ? AND category = ? ORDER BY id",
        table::<T>()
    );
    let rows = sqlx::query(&sql)
        .bind(owner)
        .bind(category)
        .fetch_all(pool)
        .await?;
    rows.iter().map(from_row).collect()
}

/// Records whose date falls within `[from, to]`, both ISO dates
///
/// Instants are compared on their date part, so `to` is inclusive for the
/// whole day.
pub async fn find_in_date_range<T: OwnedRecord>(
    pool: &SqlitePool,
    ctx: &UserContext,
    from: &str,
    to: &str,
) -> Result<Vec<T>> {
    let Some(owner) = ctx.current_user() else {
        return Ok(Vec::new());
    };

    let sql = format!(
        "SELECT id, owner, body FROM {}
         WHERE owner = ? AND substr(date, 1, 10) BETWEEN ? AND ?
         ORDER BY date, id",
        table::<T>()
    );
    let rows = sqlx::query(&sql)
        .bind(owner)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;
    rows.iter().map(from_row).collect()
}

/// Replace a record by identifier inside the current owner's scope
///
/// Returns `false` without writing when the identifier is missing or the
/// record belongs to someone else.
pub async fn update<T: OwnedRecord>(
    pool: &SqlitePool,
    ctx: &UserContext,
    record: &T,
) -> Result<bool> {
    let (Some(owner), Some(id)) = (ctx.current_user(), record.id()) else {
        return Ok(false);
    };

    let mut record = record.clone();
    record.set_owner(Some(owner.to_string()));
    record.touch(Utc::now());

    let sql = format!(
        "UPDATE {} SET date = ?, category = ?, body = ? WHERE id = ? AND owner = ?",
        table::<T>()
    );
    let result = sqlx::query(&sql)
        .bind(record.date())
        .bind(record.category())
        .bind(to_body(&record)?)
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Insert or replace by identifier
///
/// A record whose identifier belongs to another owner is inserted under a
/// fresh identifier rather than overwriting that owner's row.
pub async fn upsert<T: OwnedRecord>(pool: &SqlitePool, ctx: &UserContext, record: T) -> Result<T> {
    let Some(id) = record.id() else {
        return insert(pool, ctx, record).await;
    };

    let owner = effective_owner(ctx, &record);

    match owner_of::<T>(pool, id).await? {
        None => restore(pool, ctx, record).await,
        Some(existing) if existing == owner => {
            let mut record = record;
            record.set_owner(owner.clone());
            record.touch(Utc::now());

            let sql = format!(
                "UPDATE {} SET date = ?, category = ?, body = ? WHERE id = ?",
                table::<T>()
            );
            sqlx::query(&sql)
                .bind(record.date())
                .bind(record.category())
                .bind(to_body(&record)?)
                .bind(id)
                .execute(pool)
                .await?;
            Ok(record)
        }
        Some(_) => {
            tracing::debug!(
                collection = %T::COLLECTION,
                id,
                "Identifier owned by another user, inserting under a fresh one"
            );
            insert(pool, ctx, record).await
        }
    }
}

/// Delete a record of the current owner
pub async fn delete_owned<T: OwnedRecord>(
    pool: &SqlitePool,
    ctx: &UserContext,
    id: RecordId,
) -> Result<bool> {
    let Some(owner) = ctx.current_user() else {
        return Ok(false);
    };

    let sql = format!("DELETE FROM {} WHERE id = ? AND owner = ?", table::<T>());
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a record whoever owns it
pub async fn delete_any<T: OwnedRecord>(pool: &SqlitePool, id: RecordId) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?", table::<T>());
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every record of the current owner, returning how many went
pub async fn clear_owned<T: OwnedRecord>(pool: &SqlitePool, ctx: &UserContext) -> Result<u64> {
    let Some(owner) = ctx.current_user() else {
        return Ok(0);
    };
    clear_owned_by::<T>(pool, owner).await
}

/// Delete every record of a named owner
pub async fn clear_owned_by<T: OwnedRecord>(pool: &SqlitePool, owner: &str) -> Result<u64> {
    let sql = format!("DELETE FROM {} WHERE owner = ?", table::<T>());
    let result = sqlx::query(&sql).bind(owner).execute(pool).await?;

    tracing::debug!(
        collection = %T::COLLECTION,
        owner,
        removed = result.rows_affected(),
        "Cleared owned records"
    );
    Ok(result.rows_affected())
}

/// Delete every record in the collection
pub async fn clear_any<T: OwnedRecord>(pool: &SqlitePool) -> Result<u64> {
    let sql = format!("DELETE FROM {}", table::<T>());
    let result = sqlx::query(&sql).execute(pool).await?;
    Ok(result.rows_affected())
}

pub async fn count_owned_by<T: OwnedRecord>(pool: &SqlitePool, owner: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) AS count FROM {} WHERE owner = ?", table::<T>());
    let row = sqlx::query(&sql).bind(owner).fetch_one(pool).await?;
    Ok(row.get("count"))
}

/// Whether any row of the collection uses this identifier
pub async fn id_exists<T: OwnedRecord>(pool: &SqlitePool, id: RecordId) -> Result<bool> {
    Ok(owner_of::<T>(pool, id).await?.is_some())
}
