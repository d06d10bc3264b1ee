// 🗄️ SQLite Store
// Two tables:
// - id_pairings: alternate id → persistent id, accumulated across runs
// - runs:        every comparison report, with its fingerprint
//
// Append-only: pairings already stored are never overwritten, runs are
// never updated.

use crate::engine::ComparisonReport;
use crate::entities::NationalParty;
use crate::error::Result;
use crate::pairings::IdPairings;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::info;

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS id_pairings (
            alternate_id TEXT PRIMARY KEY,
            persistent_id TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT UNIQUE NOT NULL,
            party TEXT NOT NULL,
            country TEXT,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            fingerprint TEXT NOT NULL,
            report TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_runs_fingerprint ON runs(fingerprint)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// PAIRINGS
// ============================================================================

/// Store new pairings; returns how many were not stored before
pub fn save_pairings(conn: &Connection, pairings: &IdPairings) -> Result<usize> {
    let mut inserted = 0;
    for (alternate, persistent) in pairings.iter() {
        inserted += conn.execute(
            "INSERT OR IGNORE INTO id_pairings (alternate_id, persistent_id) VALUES (?1, ?2)",
            params![alternate, persistent],
        )?;
    }
    info!("stored {} new id pairings ({} known)", inserted, pairings.len());
    Ok(inserted)
}

pub fn load_pairings(conn: &Connection) -> Result<IdPairings> {
    let mut stmt = conn.prepare(
        "SELECT alternate_id, persistent_id FROM id_pairings ORDER BY alternate_id",
    )?;

    let pairs = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(pairs.into_iter().collect())
}

// ============================================================================
// RUNS
// ============================================================================

/// A stored comparison run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRun {
    pub run_id: String,
    pub party: String,
    pub country: Option<String>,
    pub fingerprint: String,
    pub created_at: String,
    pub report: ComparisonReport,
}

/// Record a finished comparison; returns the new run id
pub fn record_run(conn: &Connection, party: &NationalParty, report: &ComparisonReport) -> Result<String> {
    let run_id = uuid::Uuid::new_v4().to_string();
    let fingerprint = report.fingerprint()?;
    let report_json = serde_json::to_string(report)?;

    conn.execute(
        "INSERT INTO runs (
            run_id, party, country, start_date, end_date, fingerprint, report, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            run_id,
            party.name,
            party.country,
            report.start_date.to_string(),
            report.end_date.to_string(),
            fingerprint,
            report_json,
            Utc::now().to_rfc3339(),
        ],
    )?;

    info!("recorded run {} (fingerprint {})", run_id, fingerprint);
    Ok(run_id)
}

/// Most recently recorded run, if any
pub fn latest_run(conn: &Connection) -> Result<Option<StoredRun>> {
    let row = conn
        .query_row(
            "SELECT run_id, party, country, fingerprint, created_at, report
             FROM runs
             ORDER BY id DESC
             LIMIT 1",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((run_id, party, country, fingerprint, created_at, report_json)) = row else {
        return Ok(None);
    };

    Ok(Some(StoredRun {
        run_id,
        party,
        country,
        fingerprint,
        created_at,
        report: serde_json::from_str(&report_json)?,
    }))
}

/// Number of stored runs whose statistics match `fingerprint`
pub fn count_runs_with_fingerprint(conn: &Connection, fingerprint: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM runs WHERE fingerprint = ?1",
        params![fingerprint],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Agreement, Diagnostics};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn create_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn sample_report() -> ComparisonReport {
        let mut per_group = BTreeMap::new();
        per_group.insert("Non-attached Members".to_string(), Agreement { same: 7, different: 3 });
        let per_group_percentages = per_group
            .iter()
            .map(|(name, agreement)| (name.clone(), agreement.percentage()))
            .collect();

        ComparisonReport {
            party: "Fidesz (Hungary)".to_string(),
            start_date: NaiveDate::from_ymd_opt(2021, 3, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2021, 3, 12).unwrap(),
            per_group,
            per_group_percentages,
            overall_average_cohesion: Some(97.5),
            non_coherent_votings: Vec::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    #[test]
    fn test_pairings_round_trip_and_append_only() {
        let conn = create_test_db();

        let mut pairings = IdPairings::new();
        pairings.observe("6401", "197490");
        pairings.observe("6402", "197491");
        assert_eq!(save_pairings(&conn, &pairings).unwrap(), 2);
        assert_eq!(save_pairings(&conn, &pairings).unwrap(), 0, "Second save inserts nothing");

        let conflicting: IdPairings = vec![("6401".to_string(), "000000".to_string())]
            .into_iter()
            .collect();
        save_pairings(&conn, &conflicting).unwrap();

        let loaded = load_pairings(&conn).unwrap();
        assert_eq!(loaded, pairings);
        assert_eq!(loaded.lookup("6401"), Some("197490"));
    }

    #[test]
    fn test_latest_run_empty_database() {
        let conn = create_test_db();
        assert!(latest_run(&conn).unwrap().is_none());
    }

    #[test]
    fn test_record_and_fetch_run() {
        let conn = create_test_db();
        let party = NationalParty::new("Fidesz", Some("Hungary"));
        let report = sample_report();

        let first = record_run(&conn, &party, &report).unwrap();
        let second = record_run(&conn, &party, &report).unwrap();
        assert_ne!(first, second, "Every run gets its own id");

        let latest = latest_run(&conn).unwrap().unwrap();
        assert_eq!(latest.run_id, second);
        assert_eq!(latest.country.as_deref(), Some("Hungary"));
        assert_eq!(latest.report, report);
        assert_eq!(latest.fingerprint, report.fingerprint().unwrap());

        assert_eq!(count_runs_with_fingerprint(&conn, &latest.fingerprint).unwrap(), 2);
    }
}
