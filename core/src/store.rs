//! SQLite audit trail.
//!
//! RULE: Only store.rs talks to the database.
//! The network never reads from here; a run is always rebuilt from its logs.

use crate::{
    config::NetworkConfig,
    error::AnomalyResult,
    event::{EventLogEntry, FlaggedPurchase},
};
use rusqlite::{params, Connection};

pub struct AuditStore {
    conn: Connection,
}

impl AuditStore {
    /// Open (or create) the audit database at `path`.
    pub fn open(path: &str) -> AnomalyResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> AnomalyResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> AnomalyResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        config: &NetworkConfig,
        started_at: &str,
    ) -> AnomalyResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, degrees, window_size, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, config.degrees, config.window as i64, started_at],
        )?;
        Ok(())
    }

    pub fn run_config(&self, run_id: &str) -> AnomalyResult<Option<NetworkConfig>> {
        let mut stmt = self
            .conn
            .prepare("SELECT degrees, window_size FROM run WHERE run_id = ?1")?;
        let mut rows = stmt.query_map(params![run_id], |row| {
            Ok(NetworkConfig {
                degrees: row.get(0)?,
                window:  row.get::<_, i64>(1)? as usize,
            })
        })?;
        let config = rows.next().transpose()?;
        Ok(config)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> AnomalyResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, phase, line, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.run_id,
                entry.phase,
                entry.line as i64,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_run(&self, run_id: &str, phase: &str) -> AnomalyResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, phase, line, event_type, payload
             FROM event_log WHERE run_id = ?1 AND phase = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id, phase], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    run_id:     row.get(1)?,
                    phase:      row.get(2)?,
                    line:       row.get::<_, i64>(3)? as u64,
                    event_type: row.get(4)?,
                    payload:    row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, run_id: &str, phase: &str) -> AnomalyResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND phase = ?2",
            params![run_id, phase],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Flagged purchases ──────────────────────────────────────

    pub fn insert_flag(&self, run_id: &str, line: u64, flag: &FlaggedPurchase) -> AnomalyResult<()> {
        self.conn.execute(
            "INSERT INTO flagged_purchase
                (run_id, line, event_type, timestamp, user_id, amount, mean, sd)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run_id,
                line as i64,
                flag.event_type,
                flag.timestamp,
                flag.id,
                flag.amount,
                flag.mean,
                flag.sd,
            ],
        )?;
        Ok(())
    }

    /// Flags in detection order.
    pub fn flags_for_run(&self, run_id: &str) -> AnomalyResult<Vec<FlaggedPurchase>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_type, timestamp, user_id, amount, mean, sd
             FROM flagged_purchase WHERE run_id = ?1
             ORDER BY id ASC",
        )?;
        let flags = stmt
            .query_map(params![run_id], |row| {
                Ok(FlaggedPurchase {
                    event_type: row.get(0)?,
                    timestamp:  row.get(1)?,
                    id:         row.get(2)?,
                    amount:     row.get(3)?,
                    mean:       row.get(4)?,
                    sd:         row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(flags)
    }
}
