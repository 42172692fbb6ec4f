//! SQLite persistence for parents, users, tasks and task logs.
//!
//! Plain CRUD; the only rule enforced here is that a task log is upserted by
//! (user_id, task_title, date) inside a single transaction, and that a task rename
//! carries that user's log rows along to the new title.
//!
//! ## Tables
//!
//! - `parents` - unique parent names
//! - `users` - children, owned by one parent
//! - `tasks` - recurring tasks, listed in insertion order
//! - `task_logs` - daily status rows, joined to tasks by title

pub mod schema;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::domain::{Parent, Task, TaskFields, TaskLog, TaskStatus, User};
use crate::error::AppError;

/// Values written by a task-log upsert.
#[derive(Debug, Clone)]
pub struct LogUpsert<'a> {
    pub user_id: i64,
    pub task_title: &'a str,
    pub date: &'a str,
    pub status: TaskStatus,
    pub completion_time: Option<String>,
    /// `None` leaves any stored page numbers untouched.
    pub page_numbers: Option<&'a str>,
}

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open or create the database file
    pub fn open(path: &Path) -> Result<Self, AppError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        info!(target: "task_tracker", path = %path.display(), "Opening SQLite database");

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;")?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, AppError> {
        debug!(target: "task_tracker", "Opening in-memory SQLite database");
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, AppError> {
        schema::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Connection) -> Result<T, AppError>,
    {
        let conn = self.conn.lock()
            .map_err(|e| AppError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&conn)
    }

    fn with_conn_mut<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Connection) -> Result<T, AppError>,
    {
        let mut conn = self.conn.lock()
            .map_err(|e| AppError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&mut conn)
    }

    // --- Parents ---

    /// Fetch the parent with this name, creating it on first reference.
    pub fn ensure_parent(&self, name: &str) -> Result<Parent, AppError> {
        self.with_conn(|conn| {
            conn.execute("INSERT OR IGNORE INTO parents (name) VALUES (?1)", [name])?;
            let parent = conn.query_row(
                "SELECT id, name FROM parents WHERE name = ?1",
                [name],
                |row| Ok(Parent { id: row.get(0)?, name: row.get(1)? }),
            )?;
            Ok(parent)
        })
    }

    pub fn get_parent(&self, id: i64) -> Result<Option<Parent>, AppError> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row("SELECT id, name FROM parents WHERE id = ?1", [id], |row| {
                    Ok(Parent { id: row.get(0)?, name: row.get(1)? })
                })
                .optional()?)
        })
    }

    // --- Users ---

    pub fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{USER_SELECT} ORDER BY id"))?;
            let rows = stmt.query_map([], user_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    pub fn list_users_for_parent(&self, parent_id: i64) -> Result<Vec<User>, AppError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{USER_SELECT} WHERE parent_id = ?1 ORDER BY id"))?;
            let rows = stmt.query_map([parent_id], user_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(&format!("{USER_SELECT} WHERE id = ?1"), [id], user_from_row)
                .optional()?)
        })
    }

    #[cfg(test)]
    pub fn get_user_by_name(&self, name: &str) -> Result<Option<User>, AppError> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(&format!("{USER_SELECT} WHERE name = ?1 ORDER BY id LIMIT 1"), [name], user_from_row)
                .optional()?)
        })
    }

    pub fn create_user(&self, parent_id: i64, name: &str, date_of_birth: &str, ai_difficulty: i64) -> Result<User, AppError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (name, date_of_birth, ai_difficulty, parent_id) VALUES (?1, ?2, ?3, ?4)",
                params![name, date_of_birth, ai_difficulty, parent_id],
            )?;
            Ok(User {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                date_of_birth: date_of_birth.to_string(),
                ai_difficulty,
                parent_id,
            })
        })
    }

    /// Returns false when no such user exists.
    pub fn update_user(&self, id: i64, name: &str, date_of_birth: &str, ai_difficulty: i64) -> Result<bool, AppError> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET name = ?1, date_of_birth = ?2, ai_difficulty = ?3 WHERE id = ?4",
                params![name, date_of_birth, ai_difficulty, id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn set_difficulty(&self, id: i64, ai_difficulty: i64) -> Result<bool, AppError> {
        self.with_conn(|conn| {
            let n = conn.execute("UPDATE users SET ai_difficulty = ?1 WHERE id = ?2", params![ai_difficulty, id])?;
            Ok(n > 0)
        })
    }

    // --- Tasks ---

    /// All tasks of a user in insertion order.
    pub fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>, AppError> {
        self.with_conn(|conn| list_tasks_on(conn, user_id))
    }

    pub fn find_task(&self, user_id: i64, title: &str) -> Result<Option<Task>, AppError> {
        self.with_conn(|conn| find_task_on(conn, user_id, title))
    }

    pub fn create_task(&self, user_id: i64, fields: &TaskFields) -> Result<Task, AppError> {
        self.with_conn(|conn| insert_task_on(conn, user_id, fields))
    }

    /// Edit the task currently titled `old_title`. A rename moves the user's log rows
    /// to the new title in the same transaction. Returns None when the task is missing.
    pub fn update_task(&self, user_id: i64, old_title: &str, fields: &TaskFields) -> Result<Option<Task>, AppError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let Some(existing) = find_task_on(&tx, user_id, old_title)? else {
                return Ok(None);
            };
            tx.execute(
                "UPDATE tasks SET title = ?1, frequency = ?2, duration_minutes = ?3, requires_page_log = ?4 WHERE id = ?5",
                params![fields.title, fields.frequency, fields.duration_minutes, fields.requires_page_log, existing.id],
            )?;
            if fields.title != old_title {
                let moved = tx.execute(
                    "UPDATE task_logs SET task_title = ?1 WHERE user_id = ?2 AND task_title = ?3",
                    params![fields.title, user_id, old_title],
                )?;
                debug!(target: "task_tracker", user_id, old_title, new_title = %fields.title, moved, "Task renamed; log rows moved");
            }
            tx.commit()?;
            Ok(Some(Task {
                id: existing.id,
                user_id,
                title: fields.title.clone(),
                frequency: fields.frequency.clone(),
                duration_minutes: fields.duration_minutes,
                requires_page_log: fields.requires_page_log,
            }))
        })
    }

    /// Log rows of a deleted task are kept as history.
    pub fn delete_task(&self, user_id: i64, title: &str) -> Result<bool, AppError> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM tasks WHERE user_id = ?1 AND title = ?2", params![user_id, title])?;
            Ok(n > 0)
        })
    }

    /// Append every task of `from_user` whose title `to_user` does not have yet.
    pub fn copy_tasks(&self, from_user: i64, to_user: i64) -> Result<usize, AppError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let source = list_tasks_on(&tx, from_user)?;
            let existing: Vec<String> = list_tasks_on(&tx, to_user)?.into_iter().map(|t| t.title).collect();
            let mut copied = 0;
            for t in source.iter().filter(|t| !existing.contains(&t.title)) {
                let fields = TaskFields {
                    title: t.title.clone(),
                    frequency: t.frequency.clone(),
                    duration_minutes: t.duration_minutes,
                    requires_page_log: t.requires_page_log,
                };
                insert_task_on(&tx, to_user, &fields)?;
                copied += 1;
            }
            tx.commit()?;
            Ok(copied)
        })
    }

    // --- Task logs ---

    #[cfg(test)]
    pub fn find_log(&self, user_id: i64, task_title: &str, date: &str) -> Result<Option<TaskLog>, AppError> {
        self.with_conn(|conn| find_log_on(conn, user_id, task_title, date))
    }

    pub fn logs_for_date(&self, user_id: i64, date: &str) -> Result<Vec<TaskLog>, AppError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{LOG_SELECT} WHERE user_id = ?1 AND date = ?2 ORDER BY id"))?;
            let rows = stmt.query_map(params![user_id, date], log_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    pub fn logs_for_user(&self, user_id: i64) -> Result<Vec<TaskLog>, AppError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{LOG_SELECT} WHERE user_id = ?1 ORDER BY date DESC, id"))?;
            let rows = stmt.query_map([user_id], log_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    /// Lookup-then-update-or-insert keyed by (user_id, task_title, date).
    pub fn upsert_log(&self, u: &LogUpsert<'_>) -> Result<TaskLog, AppError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let existing = find_log_on(&tx, u.user_id, u.task_title, u.date)?;
            let log = match existing {
                Some(mut log) => {
                    log.status = u.status;
                    log.completion_time = u.completion_time.clone();
                    if let Some(pages) = u.page_numbers {
                        log.completed_page_numbers = Some(pages.to_string());
                    }
                    tx.execute(
                        "UPDATE task_logs SET status = ?1, completion_time = ?2, completed_page_numbers = ?3 WHERE id = ?4",
                        params![log.status.as_str(), log.completion_time, log.completed_page_numbers, log.id],
                    )?;
                    log
                }
                None => {
                    tx.execute(
                        "INSERT INTO task_logs (user_id, task_title, date, status, completion_time, completed_page_numbers)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![u.user_id, u.task_title, u.date, u.status.as_str(), u.completion_time, u.page_numbers],
                    )?;
                    TaskLog {
                        id: tx.last_insert_rowid(),
                        user_id: u.user_id,
                        task_title: u.task_title.to_string(),
                        date: u.date.to_string(),
                        status: u.status,
                        completion_time: u.completion_time.clone(),
                        completed_page_numbers: u.page_numbers.map(str::to_string),
                    }
                }
            };
            tx.commit()?;
            Ok(log)
        })
    }
}

const USER_SELECT: &str = "SELECT id, name, date_of_birth, ai_difficulty, parent_id FROM users";
const TASK_SELECT: &str = "SELECT id, user_id, title, frequency, duration_minutes, requires_page_log FROM tasks";
const LOG_SELECT: &str =
    "SELECT id, user_id, task_title, date, status, completion_time, completed_page_numbers FROM task_logs";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        date_of_birth: row.get(2)?,
        ai_difficulty: row.get(3)?,
        parent_id: row.get(4)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        frequency: row.get(3)?,
        duration_minutes: row.get(4)?,
        requires_page_log: row.get(5)?,
    })
}

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<TaskLog> {
    let status: String = row.get(4)?;
    Ok(TaskLog {
        id: row.get(0)?,
        user_id: row.get(1)?,
        task_title: row.get(2)?,
        date: row.get(3)?,
        status: TaskStatus::parse(&status),
        completion_time: row.get(5)?,
        completed_page_numbers: row.get(6)?,
    })
}

fn list_tasks_on(conn: &Connection, user_id: i64) -> Result<Vec<Task>, AppError> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT} WHERE user_id = ?1 ORDER BY id"))?;
    let rows = stmt.query_map([user_id], task_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn find_task_on(conn: &Connection, user_id: i64, title: &str) -> Result<Option<Task>, AppError> {
    Ok(conn
        .query_row(
            &format!("{TASK_SELECT} WHERE user_id = ?1 AND title = ?2 ORDER BY id LIMIT 1"),
            params![user_id, title],
            task_from_row,
        )
        .optional()?)
}

fn insert_task_on(conn: &Connection, user_id: i64, f: &TaskFields) -> Result<Task, AppError> {
    conn.execute(
        "INSERT INTO tasks (user_id, title, frequency, duration_minutes, requires_page_log) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, f.title, f.frequency, f.duration_minutes, f.requires_page_log],
    )?;
    Ok(Task {
        id: conn.last_insert_rowid(),
        user_id,
        title: f.title.clone(),
        frequency: f.frequency.clone(),
        duration_minutes: f.duration_minutes,
        requires_page_log: f.requires_page_log,
    })
}

fn find_log_on(conn: &Connection, user_id: i64, task_title: &str, date: &str) -> Result<Option<TaskLog>, AppError> {
    Ok(conn
        .query_row(
            &format!("{LOG_SELECT} WHERE user_id = ?1 AND task_title = ?2 AND date = ?3 ORDER BY id LIMIT 1"),
            params![user_id, task_title, date],
            log_from_row,
        )
        .optional()?)
}
