//! Schema migrations, applied in order inside one transaction each.
//!
//! The highest applied version lives in `_migrations`.

use rusqlite::{Connection, OptionalExtension};

use super::error::DatabaseError;

/// `(version, name, sql)`; versions strictly increase.
const STEPS: &[(u32, &str, &str)] = &[
    (1, "media", include_str!("sql/001_create_media.sql")),
    (2, "jobs", include_str!("sql/002_create_jobs.sql")),
    (3, "sequences", include_str!("sql/003_create_sequences.sql")),
];

/// Latest schema version this build knows about.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |(version, _, _)| *version)
}

/// Version recorded in the database, 0 for a fresh one.
pub fn applied_version(conn: &Connection) -> Result<u32, DatabaseError> {
    let version = conn
        .query_row("SELECT MAX(version) FROM _migrations", [], |r| {
            r.get::<_, Option<u32>>(0)
        })
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

/// Brings the schema up to [`latest_version`]. Returns how many steps ran.
pub fn run_all(conn: &mut Connection) -> Result<usize, DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let from = applied_version(conn)?;
    if from > latest_version() {
        return Err(DatabaseError::Migration {
            version: from,
            reason: format!("database is newer than this build (v{})", latest_version()),
        });
    }

    let mut ran = 0;
    for &(version, name, sql) in STEPS.iter().filter(|(v, _, _)| *v > from) {
        log::info!("Applying schema v{version} ({name})");
        let failed = |e: rusqlite::Error| DatabaseError::Migration {
            version,
            reason: e.to_string(),
        };

        let tx = conn.transaction().map_err(failed)?;
        tx.execute_batch(sql).map_err(failed)?;
        tx.execute(
            "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
            rusqlite::params![version, name],
        )
        .map_err(failed)?;
        tx.commit().map_err(failed)?;
        ran += 1;
    }

    Ok(ran)
}
