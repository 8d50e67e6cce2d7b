//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! Pipeline components call store methods — they never execute SQL directly.
//! The SQL text itself (schemas, ingestion, transformation, reporting) is
//! loaded from script files by the caller and handed in as opaque strings.

use rusqlite::{named_params, params, Connection};

use crate::{
    attribution::AttributionResult, error::PipelineResult, journeys::JourneyRecord,
    types::DateWindow,
};

/// Permanent per-touchpoint credit table, keyed (conversion_id, session_id).
pub const RESULT_TABLE: &str = "attribution_customer_journey";
/// Derived channel-level report table.
pub const REPORT_TABLE: &str = "channel_reporting";

pub struct PipelineStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl PipelineStore {
    /// Open (or create) the pipeline database at `path`.
    pub fn open(path: &str) -> PipelineResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PipelineResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    /// For file-based databases, this opens the same file.
    pub fn reopen(&self) -> PipelineResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Run an opaque DDL/DML script.
    pub fn execute_batch(&self, sql: &str) -> PipelineResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Transactionally delete every row of `table`.
    pub fn purge_table(&self, table: &str) -> PipelineResult<()> {
        log::info!("purging {table}");
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(&format!("DELETE FROM {table}"), [])?;
        tx.commit()?;
        Ok(())
    }

    pub fn count_rows(&self, table: &str) -> PipelineResult<i64> {
        let count =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?;
        Ok(count)
    }

    // ── Journey extraction ─────────────────────────────────────

    /// Run the ingestion query. The script carries `:start_date` and
    /// `:end_date` named parameters; both are bound as NULL when no window
    /// is given, and the script treats a NULL bound as "no filter".
    pub fn query_journeys(
        &self,
        sql: &str,
        window: Option<&DateWindow>,
    ) -> PipelineResult<Vec<JourneyRecord>> {
        let start = window.map(DateWindow::start_param);
        let end = window.map(DateWindow::end_param);

        let mut stmt = self.conn.prepare(sql)?;
        let journeys = stmt
            .query_map(
                named_params! { ":start_date": start, ":end_date": end },
                |row| {
                    Ok(JourneyRecord {
                        conversion_id: row.get("conversion_id")?,
                        session_id: row.get("session_id")?,
                        timestamp: row.get("timestamp")?,
                        channel_label: row.get("channel_label")?,
                        holder_engagement: row.get("holder_engagement")?,
                        closer_engagement: row.get("closer_engagement")?,
                        conversion: row.get("conversion")?,
                        impression_interaction: row.get("impression_interaction")?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(journeys)
    }

    // ── Result staging ─────────────────────────────────────────

    /// Create an empty staging table shaped like the permanent result table.
    pub fn create_staging_table(&self, table: &str) -> PipelineResult<()> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE {table} (
                conversion_id TEXT NOT NULL,
                session_id    TEXT NOT NULL,
                ihc           REAL NOT NULL
            );"
        ))?;
        Ok(())
    }

    /// Insert scored rows into a staging table, all inside one transaction.
    pub fn insert_attribution_rows(
        &self,
        table: &str,
        rows: &[AttributionResult],
    ) -> PipelineResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table} (conversion_id, session_id, ihc) VALUES (?1, ?2, ?3)"
            ))?;
            for row in rows {
                stmt.execute(params![row.conversion_id, row.session_id, row.ihc])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn drop_table_if_exists(&self, table: &str) -> PipelineResult<()> {
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
        Ok(())
    }

    /// All permanent result rows, ordered by key (used by tests and the
    /// run summary).
    pub fn attribution_rows(&self) -> PipelineResult<Vec<AttributionResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT conversion_id, session_id, ihc
             FROM attribution_customer_journey
             ORDER BY conversion_id, session_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(AttributionResult {
                    conversion_id: row.get(0)?,
                    session_id: row.get(1)?,
                    ihc: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Channel report ─────────────────────────────────────────

    /// Purge and rebuild `channel_reporting` inside ONE transaction, so a
    /// failed rebuild rolls back to the prior report instead of leaving the
    /// table empty or half-written.
    pub fn rebuild_channel_report(&self, sql: &str) -> PipelineResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM channel_reporting", [])?;
        tx.execute_batch(sql)?;
        tx.commit()?;
        Ok(())
    }

    /// Run a read-only query and return its column names plus every row
    /// rendered as text, ready for CSV serialization.
    pub fn query_text_rows(&self, sql: &str) -> PipelineResult<(Vec<String>, Vec<Vec<String>>)> {
        let mut stmt = self.conn.prepare(sql)?;
        let headers: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = headers.len();

        let rows = stmt
            .query_map([], |row| {
                let mut record = Vec::with_capacity(width);
                for idx in 0..width {
                    record.push(render_value(row.get_ref(idx)?));
                }
                Ok(record)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok((headers, rows))
    }

    /// Does the named table exist? (Tests use this to check staging cleanup.)
    pub fn table_exists(&self, table: &str) -> PipelineResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

fn render_value(value: rusqlite::types::ValueRef<'_>) -> String {
    use rusqlite::types::ValueRef;
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => String::from_utf8_lossy(b).into_owned(),
    }
}
