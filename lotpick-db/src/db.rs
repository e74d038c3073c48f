use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::models::{HistoryEntry, HistoryStats, NewHistoryEntry, PickMethod};

/// Only the newest entries are kept.
pub const HISTORY_LIMIT: u32 = 100;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS history (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp          TEXT NOT NULL,
    method             TEXT NOT NULL,
    preset             TEXT,
    main_numbers       TEXT NOT NULL,
    secondary_numbers  TEXT NOT NULL,
    total_iterations   INTEGER,
    elapsed_seconds    REAL
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lotpick.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Cannot open database {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Migration failed")?;
    Ok(())
}

pub fn append_entry(conn: &Connection, entry: &NewHistoryEntry) -> Result<HistoryEntry> {
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let main_json = serde_json::to_string(&entry.main_numbers)?;
    let secondary_json = serde_json::to_string(&entry.secondary_numbers)?;

    let tx = conn.unchecked_transaction()
        .context("Cannot start transaction")?;
    tx.execute(
        "INSERT INTO history (timestamp, method, preset, main_numbers, secondary_numbers, total_iterations, elapsed_seconds)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            timestamp,
            entry.method.as_str(),
            entry.preset,
            main_json,
            secondary_json,
            entry.stats.as_ref().map(|s| s.total_iterations as i64),
            entry.stats.as_ref().map(|s| s.elapsed_seconds),
        ],
    ).context("Insert failed")?;
    let id = tx.last_insert_rowid();

    tx.execute(
        "DELETE FROM history WHERE id NOT IN (SELECT id FROM history ORDER BY id DESC LIMIT ?1)",
        [HISTORY_LIMIT],
    ).context("History trim failed")?;
    tx.commit().context("Commit failed")?;

    Ok(HistoryEntry {
        id,
        timestamp,
        method: entry.method,
        preset: entry.preset.clone(),
        main_numbers: entry.main_numbers.clone(),
        secondary_numbers: entry.secondary_numbers.clone(),
        stats: entry.stats.clone(),
    })
}

type RawEntry = (i64, String, String, Option<String>, String, String, Option<i64>, Option<f64>);

const SELECT_ENTRY: &str = "SELECT id, timestamp, method, preset, main_numbers, secondary_numbers, total_iterations, elapsed_seconds FROM history";

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn decode_entry(raw: RawEntry) -> Result<HistoryEntry> {
    let (id, timestamp, method, preset, main_json, secondary_json, total_iterations, elapsed_seconds) = raw;
    let method: PickMethod = method.parse()?;
    let main_numbers: Vec<u32> = serde_json::from_str(&main_json)
        .with_context(|| format!("Corrupt main numbers in entry {id}"))?;
    let secondary_numbers: Vec<u32> = serde_json::from_str(&secondary_json)
        .with_context(|| format!("Corrupt secondary numbers in entry {id}"))?;
    let stats = match (total_iterations, elapsed_seconds) {
        (Some(total_iterations), Some(elapsed_seconds)) => Some(HistoryStats {
            total_iterations: total_iterations as u64,
            elapsed_seconds,
        }),
        _ => None,
    };
    Ok(HistoryEntry {
        id,
        timestamp,
        method,
        preset,
        main_numbers,
        secondary_numbers,
        stats,
    })
}

/// Newest first.
pub fn list_entries(conn: &Connection, limit: u32) -> Result<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(&format!("{SELECT_ENTRY} ORDER BY id DESC LIMIT ?1"))?;
    let rows = stmt.query_map([limit], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(decode_entry).collect()
}

pub fn get_entry(conn: &Connection, id: i64) -> Result<Option<HistoryEntry>> {
    let raw = conn
        .query_row(&format!("{SELECT_ENTRY} WHERE id = ?1"), [id], read_row)
        .optional()?;
    raw.map(decode_entry).transpose()
}

pub fn delete_entry(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute("DELETE FROM history WHERE id = ?1", [id])
        .context("Delete failed")?;
    Ok(changed > 0)
}

pub fn clear_entries(conn: &Connection) -> Result<usize> {
    let changed = conn.execute("DELETE FROM history", [])
        .context("Clear failed")?;
    Ok(changed)
}

pub fn count_entries(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_entry(main: &[u32], secondary: &[u32]) -> NewHistoryEntry {
        NewHistoryEntry {
            method: PickMethod::Generator,
            preset: Some("powerball".to_string()),
            main_numbers: main.to_vec(),
            secondary_numbers: secondary.to_vec(),
            stats: Some(HistoryStats {
                total_iterations: 70,
                elapsed_seconds: 0.01,
            }),
        }
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_append_and_count() {
        let conn = memory_db();
        assert_eq!(count_entries(&conn).unwrap(), 0);

        let entry = append_entry(&conn, &test_entry(&[1, 2, 3, 4, 5], &[6])).unwrap();
        assert_eq!(count_entries(&conn).unwrap(), 1);
        assert!(entry.id > 0);
        assert!(!entry.timestamp.is_empty());
    }

    #[test]
    fn test_list_newest_first() {
        let conn = memory_db();
        append_entry(&conn, &test_entry(&[1], &[])).unwrap();
        append_entry(&conn, &test_entry(&[2], &[])).unwrap();
        append_entry(&conn, &test_entry(&[3], &[])).unwrap();

        let entries = list_entries(&conn, 10).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].main_numbers, vec![3]);
        assert_eq!(entries[2].main_numbers, vec![1]);
    }

    #[test]
    fn test_roundtrip_fields() {
        let conn = memory_db();
        let mut entry = test_entry(&[4, 8, 15, 16, 23], &[42]);
        entry.method = PickMethod::BallDrop;
        entry.preset = None;
        entry.stats = None;
        append_entry(&conn, &entry).unwrap();

        let stored = &list_entries(&conn, 1).unwrap()[0];
        assert_eq!(stored.method, PickMethod::BallDrop);
        assert_eq!(stored.preset, None);
        assert_eq!(stored.main_numbers, vec![4, 8, 15, 16, 23]);
        assert_eq!(stored.secondary_numbers, vec![42]);
        assert!(stored.stats.is_none());
    }

    #[test]
    fn test_trimmed_to_limit() {
        let conn = memory_db();
        for i in 0..(HISTORY_LIMIT + 5) {
            append_entry(&conn, &test_entry(&[i], &[])).unwrap();
        }
        assert_eq!(count_entries(&conn).unwrap(), HISTORY_LIMIT);

        let entries = list_entries(&conn, HISTORY_LIMIT).unwrap();
        assert_eq!(entries[0].main_numbers, vec![HISTORY_LIMIT + 4]);
        assert_eq!(entries.last().unwrap().main_numbers, vec![5]);
    }

    #[test]
    fn test_delete_entry() {
        let conn = memory_db();
        let a = append_entry(&conn, &test_entry(&[1], &[])).unwrap();
        let b = append_entry(&conn, &test_entry(&[2], &[])).unwrap();

        assert!(delete_entry(&conn, a.id).unwrap());
        assert!(!delete_entry(&conn, a.id).unwrap());

        let entries = list_entries(&conn, 10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, b.id);
        assert!(get_entry(&conn, a.id).unwrap().is_none());
        assert!(get_entry(&conn, b.id).unwrap().is_some());
    }

    #[test]
    fn test_clear_entries() {
        let conn = memory_db();
        append_entry(&conn, &test_entry(&[1], &[])).unwrap();
        append_entry(&conn, &test_entry(&[2], &[])).unwrap();

        assert_eq!(clear_entries(&conn).unwrap(), 2);
        assert_eq!(count_entries(&conn).unwrap(), 0);
    }
}
