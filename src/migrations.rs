//! Schema migration framework.
//!
//! Numbered SQL migrations are embedded at compile time via `include_str!`.
//! Each migration runs exactly once, tracked by the `schema_version` table.

use rusqlite::Connection;

struct Migration {
    version: i32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("migrations/001_baseline.sql"),
}];

/// Highest migration version already applied, or 0 for a fresh database.
/// Creates the tracking table on first use.
fn applied_version(conn: &Connection) -> Result<i32, String> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| format!("schema_version table: {e}"))?;

    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| format!("reading schema version: {e}"))
}

/// Apply every migration newer than what the database has seen.
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    let applied = applied_version(conn)?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        conn.execute_batch(migration.sql)
            .map_err(|e| format!("migration {}: {e}", migration.version))?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [migration.version],
        )
        .map_err(|e| format!("recording migration {}: {e}", migration.version))?;
        log::info!("Applied schema migration {}", migration.version);
    }

    Ok(())
}
