//! Database schema definitions

use rusqlite::Connection;
use tracing::info;

use crate::error::AppError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

const TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS parents (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    date_of_birth TEXT NOT NULL,
    ai_difficulty INTEGER NOT NULL DEFAULT 10,
    parent_id     INTEGER NOT NULL REFERENCES parents(id)
);
CREATE INDEX IF NOT EXISTS idx_users_name ON users(name);
CREATE INDEX IF NOT EXISTS idx_users_parent ON users(parent_id);

CREATE TABLE IF NOT EXISTS tasks (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id           INTEGER NOT NULL REFERENCES users(id),
    title             TEXT NOT NULL,
    frequency         TEXT NOT NULL,
    duration_minutes  INTEGER,
    requires_page_log INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id);

-- One row per (user_id, task_title, date) is kept by the upsert path, not by a constraint.
CREATE TABLE IF NOT EXISTS task_logs (
    id                     INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id                INTEGER NOT NULL REFERENCES users(id),
    task_title             TEXT NOT NULL,
    date                   TEXT NOT NULL,
    status                 TEXT NOT NULL,
    completion_time        TEXT,
    completed_page_numbers TEXT
);
CREATE INDEX IF NOT EXISTS idx_task_logs_key ON task_logs(user_id, task_title, date);
CREATE INDEX IF NOT EXISTS idx_task_logs_date ON task_logs(user_id, date);
"#;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<(), AppError> {
    let current_version = get_schema_version(conn)?;

    if current_version < SCHEMA_VERSION {
        info!(target: "task_tracker", from = current_version, to = SCHEMA_VERSION, "Creating database schema");
        conn.execute_batch(TABLES)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else {
        info!(target: "task_tracker", version = current_version, "Database schema is up to date");
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &Connection) -> Result<i32, AppError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;

    match conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0)) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), AppError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}
