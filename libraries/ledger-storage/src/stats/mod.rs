//! Derived per-owner aggregates

use ledger_core::types::SnapshotStats;
use sqlx::{Row, SqlitePool};

use crate::error::Result;

/// Replace the stored aggregates of an owner
pub async fn upsert(pool: &SqlitePool, owner: &str, stats: &SnapshotStats) -> Result<()> {
    sqlx::query(
        "INSERT INTO stats
            (owner, total_orders, total_expenses, total_revenue, total_expenses_amount, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT(owner) DO UPDATE SET
            total_orders = excluded.total_orders,
            total_expenses = excluded.total_expenses,
            total_revenue = excluded.total_revenue,
            total_expenses_amount = excluded.total_expenses_amount,
            updated_at = excluded.updated_at",
    )
    .bind(owner)
    .bind(stats.total_orders as i64)
    .bind(stats.total_expenses as i64)
    .bind(stats.total_revenue)
    .bind(stats.total_expenses_amount)
    .bind(chrono::Utc::now().timestamp())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get(pool: &SqlitePool, owner: &str) -> Result<Option<SnapshotStats>> {
    let row = sqlx::query(
        "SELECT total_orders, total_expenses, total_revenue, total_expenses_amount
         FROM stats WHERE owner = ?",
    )
    .bind(owner)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| SnapshotStats {
        total_orders: row.get::<i64, _>("total_orders") as usize,
        total_expenses: row.get::<i64, _>("total_expenses") as usize,
        total_revenue: row.get("total_revenue"),
        total_expenses_amount: row.get("total_expenses_amount"),
    }))
}

pub async fn delete(pool: &SqlitePool, owner: &str) -> Result<()> {
    sqlx::query("DELETE FROM stats WHERE owner = ?")
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn clear_all(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM stats").execute(pool).await?;
    Ok(result.rows_affected())
}
