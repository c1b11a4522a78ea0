use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, ToSql};
use std::time::Duration;

use crate::{
    error::Result,
    storage::{
        models::{CashOut, DatabaseStats, NewCashOut},
        query::CashOutScope,
    },
};

/// Upper bound on ids bound into a single `IN (...)` list.
const MAX_IDS_PER_STATEMENT: usize = 500;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS cash_outs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                amount_cents INTEGER NOT NULL,
                paypal_address TEXT NOT NULL,
                approved_at TEXT,
                sent_at TEXT,
                batch_id TEXT,
                sender_batch_id TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cash_outs_batch ON cash_outs(type, batch_id, sent_at)",
            [],
        )?;

        Ok(())
    }

    pub fn insert_cash_out(&self, cash_out: &NewCashOut) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO cash_outs (type, amount_cents, paypal_address, approved_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                cash_out.kind,
                cash_out.amount_cents,
                cash_out.paypal_address,
                cash_out.approved_at,
                cash_out.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_cash_out(&self, id: i64) -> Result<Option<CashOut>> {
        let sql = format!("SELECT {} FROM cash_outs WHERE id = ?1", CashOut::COLUMNS);
        let cash_out = self
            .conn
            .query_row(&sql, [id], CashOut::from_row)
            .optional()?;
        Ok(cash_out)
    }

    /// Run a listing scope.
    pub fn cash_outs(&self, scope: &CashOutScope) -> Result<Vec<CashOut>> {
        let (sql, values) = scope.to_sql(CashOut::COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        let cash_outs = stmt
            .query_map(params_from_iter(values.iter()), CashOut::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(cash_outs)
    }

    /// Approved, unsent, unbatched rows of `kind`, oldest id first.
    pub fn submission_eligible(&self, kind: &str) -> Result<Vec<CashOut>> {
        let sql = format!(
            "SELECT {} FROM cash_outs
             WHERE type = ?1
               AND approved_at IS NOT NULL
               AND sent_at IS NULL
               AND batch_id IS NULL
             ORDER BY id ASC",
            CashOut::COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let cash_outs = stmt
            .query_map([kind], CashOut::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(cash_outs)
    }

    /// Distinct batch ids still waiting for a terminal provider status.
    pub fn outstanding_batch_ids(&self, kind: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT batch_id FROM cash_outs
             WHERE type = ?1
               AND batch_id IS NOT NULL
               AND sent_at IS NULL
             ORDER BY batch_id ASC",
        )?;

        let batch_ids = stmt
            .query_map([kind], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(batch_ids)
    }

    /// Ids of rows in `batch_id` that have not been marked sent yet.
    pub fn unsent_ids_in_batch(&self, kind: &str, batch_id: &str) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM cash_outs
             WHERE type = ?1 AND batch_id = ?2 AND sent_at IS NULL
             ORDER BY id ASC",
        )?;

        let ids = stmt
            .query_map(params![kind, batch_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<i64>, _>>()?;

        Ok(ids)
    }

    /// Record the client-side label a chunk is about to be submitted under.
    pub fn assign_sender_batch_id(&self, kind: &str, ids: &[i64], label: &str) -> Result<usize> {
        self.update_ids(
            "sender_batch_id = ?1",
            "batch_id IS NULL",
            &[&label, &kind],
            ids,
        )
    }

    /// Bulk-set the provider batch id. `sent_at` is left alone.
    pub fn assign_batch_id(&self, kind: &str, ids: &[i64], batch_id: &str) -> Result<usize> {
        self.update_ids(
            "batch_id = ?1",
            "batch_id IS NULL AND sent_at IS NULL",
            &[&batch_id, &kind],
            ids,
        )
    }

    /// Bulk-set `sent_at` on unsent rows of `batch_id`. Rows already sent keep
    /// their original timestamp.
    pub fn mark_sent(
        &self,
        kind: &str,
        batch_id: &str,
        ids: &[i64],
        sent_at: DateTime<Utc>,
    ) -> Result<usize> {
        self.update_ids(
            "sent_at = ?1",
            "batch_id = ?3 AND sent_at IS NULL",
            &[&sent_at, &kind, &batch_id],
            ids,
        )
    }

    /// Return rows of a denied batch to the submission pool.
    pub fn reset_batch(&self, kind: &str, batch_id: &str, ids: &[i64]) -> Result<usize> {
        self.update_ids(
            "batch_id = NULL, sender_batch_id = NULL",
            "batch_id = ?1 AND sent_at IS NULL",
            &[&batch_id, &kind],
            ids,
        )
    }

    /// `UPDATE cash_outs SET <assignments> WHERE type = ?2 AND <guard> AND id IN (..)`.
    ///
    /// `values` bind `?1`, `?2` (the kind) and onwards; ids are bound after them.
    fn update_ids(
        &self,
        assignments: &str,
        guard: &str,
        values: &[&dyn ToSql],
        ids: &[i64],
    ) -> Result<usize> {
        let mut updated = 0;

        for chunk in ids.chunks(MAX_IDS_PER_STATEMENT) {
            let first = values.len() + 1;
            let placeholders = (first..first + chunk.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ");

            let sql = format!(
                "UPDATE cash_outs SET {} WHERE type = ?2 AND {} AND id IN ({})",
                assignments, guard, placeholders
            );

            let mut bound: Vec<&dyn ToSql> = values.to_vec();
            bound.extend(chunk.iter().map(|id| id as &dyn ToSql));

            updated += self.conn.execute(&sql, bound.as_slice())?;
        }

        Ok(updated)
    }

    pub fn get_stats(&self, kind: &str) -> Result<DatabaseStats> {
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(sql, [kind], |row| row.get(0))?;
            Ok(n as usize)
        };

        let total_cash_outs = count("SELECT COUNT(*) FROM cash_outs WHERE type = ?1")?;
        let awaiting_approval = count(
            "SELECT COUNT(*) FROM cash_outs
             WHERE type = ?1 AND approved_at IS NULL AND sent_at IS NULL AND batch_id IS NULL",
        )?;
        let ready_to_submit = count(
            "SELECT COUNT(*) FROM cash_outs
             WHERE type = ?1 AND approved_at IS NOT NULL AND sent_at IS NULL AND batch_id IS NULL",
        )?;
        let in_flight = count(
            "SELECT COUNT(*) FROM cash_outs
             WHERE type = ?1 AND batch_id IS NOT NULL AND sent_at IS NULL",
        )?;
        let sent = count("SELECT COUNT(*) FROM cash_outs WHERE type = ?1 AND sent_at IS NOT NULL")?;
        let outstanding_batches = count(
            "SELECT COUNT(DISTINCT batch_id) FROM cash_outs
             WHERE type = ?1 AND batch_id IS NOT NULL AND sent_at IS NULL",
        )?;

        let total_sent_cents: Option<i64> = self.conn.query_row(
            "SELECT SUM(amount_cents) FROM cash_outs WHERE type = ?1 AND sent_at IS NOT NULL",
            [kind],
            |row| row.get(0),
        )?;

        Ok(DatabaseStats {
            total_cash_outs,
            awaiting_approval,
            ready_to_submit,
            in_flight,
            sent,
            total_sent_cents: total_sent_cents.unwrap_or(0),
            outstanding_batches,
        })
    }
}
