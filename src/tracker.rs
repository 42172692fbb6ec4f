//! Daily task resolution, status logging, streak evaluation and history.
//!
//! A task is due on a date when its frequency is "daily" or lists that date's weekday.
//! The day's log rows are merged in by task title; tasks without a row are TODO.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::clock::{TimeProvider, DATE_FORMAT, TIME_FORMAT};
use crate::domain::{DaySummary, ResolvedTask, StarRank, Task, TaskDuration, TaskLog, TaskStatus};
use crate::error::AppError;
use crate::store::{LogUpsert, Store};

const WEEKDAY_ABBREVS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// True when a task with `frequency` is scheduled on `weekday`.
///
/// Entries are three-letter abbreviations compared case-insensitively ("mon" matches
/// Monday); full names such as "Monday" never match.
pub fn is_due(frequency: &str, weekday: Weekday) -> bool {
  let f = frequency.trim();
  if f.eq_ignore_ascii_case("daily") {
    return true;
  }
  let abbrev = WEEKDAY_ABBREVS[weekday.num_days_from_monday() as usize];
  f.split(',')
    .map(str::trim)
    .filter(|d| !d.is_empty())
    .any(|d| {
      if !is_weekday_abbrev(d) {
        debug!(target: "tracker", entry = d, "Ignoring unrecognized weekday in frequency");
      }
      d.eq_ignore_ascii_case(abbrev)
    })
}

fn is_weekday_abbrev(entry: &str) -> bool {
  WEEKDAY_ABBREVS.iter().any(|a| entry.eq_ignore_ascii_case(a))
}

/// Accepts "daily" or a comma-separated list of weekday abbreviations.
pub fn validate_frequency(frequency: &str) -> Result<(), AppError> {
  let f = frequency.trim();
  if f.is_empty() {
    return Err(AppError::validation("Frequency is required."));
  }
  if f.eq_ignore_ascii_case("daily") {
    return Ok(());
  }
  for d in f.split(',').map(str::trim) {
    if !is_weekday_abbrev(d) {
      return Err(AppError::validation(format!(
        "Unrecognized weekday '{}'. Use 'daily' or names like 'Mon, Wed, Fri'.",
        d
      )));
    }
  }
  Ok(())
}

fn merge(task: &Task, log: Option<&TaskLog>) -> ResolvedTask {
  let status = log.map(|l| l.status).unwrap_or(TaskStatus::Todo);
  ResolvedTask {
    task_id: Some(task.id),
    title: task.title.clone(),
    status,
    frequency: task.frequency.clone(),
    duration: TaskDuration::from(task.duration_minutes),
    completion_time: log
      .filter(|l| l.status == TaskStatus::Done)
      .and_then(|l| l.completion_time.clone()),
    requires_page_log: task.requires_page_log,
    completed_page_numbers: log.and_then(|l| l.completed_page_numbers.clone()),
  }
}

/// Tasks due on `date` with their status for that date, in task listing order.
#[instrument(level = "debug", skip(store), fields(%date))]
pub fn resolve(store: &Store, user_id: i64, date: NaiveDate) -> Result<Vec<ResolvedTask>, AppError> {
  let tasks = store.list_tasks(user_id)?;
  let logs = store.logs_for_date(user_id, &date.format(DATE_FORMAT).to_string())?;
  Ok(resolve_from(&tasks, &logs, date.weekday()))
}

fn resolve_from(tasks: &[Task], logs: &[TaskLog], weekday: Weekday) -> Vec<ResolvedTask> {
  tasks
    .iter()
    .filter(|t| is_due(&t.frequency, weekday))
    .map(|t| merge(t, logs.iter().find(|l| l.task_title == t.title)))
    .collect()
}

/// Record a task's status for `date`. Done stamps the current civil time; any other
/// status clears it. Page numbers are only written when provided.
#[instrument(level = "info", skip(store, clock, page_numbers), fields(%status, %date, has_pages = page_numbers.is_some()))]
pub fn mark_status(
  store: &Store,
  clock: &TimeProvider,
  user_id: i64,
  task_title: &str,
  status: TaskStatus,
  date: NaiveDate,
  page_numbers: Option<&str>,
) -> Result<TaskLog, AppError> {
  if store.find_task(user_id, task_title)?.is_none() {
    return Err(AppError::validation(format!("Unknown task '{}'.", task_title)));
  }
  let completion_time = (status == TaskStatus::Done).then(|| clock.time_of_day());
  let date_s = date.format(DATE_FORMAT).to_string();
  let log = store.upsert_log(&LogUpsert {
    user_id,
    task_title,
    date: &date_s,
    status,
    completion_time,
    page_numbers,
  })?;
  info!(target: "tracker", user_id, task = task_title, %status, time = ?log.completion_time, "Task status logged");
  Ok(log)
}

/// Decide whether every task is done, and whether it was all done before noon.
///
/// An empty list counts as all done; with no completion times there is nothing to
/// confirm "before noon", so that flag stays false.
pub fn evaluate_day(tasks: &[ResolvedTask]) -> DaySummary {
  let all_done = tasks.iter().all(|t| t.status == TaskStatus::Done);
  if !all_done {
    return DaySummary { all_done, all_done_before_noon: false };
  }

  let mut seen_any = false;
  let mut before_noon = true;
  for t in tasks {
    let Some(raw) = t.completion_time.as_deref().filter(|s| !s.trim().is_empty()) else { continue };
    seen_any = true;
    match NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT) {
      Ok(time) if time.hour() < 12 => {}
      Ok(_) => before_noon = false,
      Err(e) => {
        warn!(target: "tracker", task = %t.title, time = raw, error = %e, "Unparseable completion time; not counting as before noon");
        before_noon = false;
      }
    }
  }

  DaySummary { all_done, all_done_before_noon: seen_any && before_noon }
}

pub fn star_rank(tasks: &[ResolvedTask]) -> StarRank {
  StarRank::from(evaluate_day(tasks))
}

#[derive(Clone, Debug, Serialize)]
pub struct HistoryDay {
  pub date: String,
  pub stars: StarRank,
  pub summary: DaySummary,
  pub tasks: Vec<ResolvedTask>,
}

/// Every logged date, newest first, with that day's tasks and star rank.
///
/// Each day uses its own weekday to decide which tasks were due. Log rows for tasks
/// that were not due (or no longer exist) are listed too and count toward the rank.
#[instrument(level = "info", skip(store))]
pub fn history(store: &Store, user_id: i64) -> Result<Vec<HistoryDay>, AppError> {
  let tasks = store.list_tasks(user_id)?;
  let mut by_date: BTreeMap<String, Vec<TaskLog>> = BTreeMap::new();
  for log in store.logs_for_user(user_id)? {
    by_date.entry(log.date.clone()).or_default().push(log);
  }

  let mut days = Vec::with_capacity(by_date.len());
  for (date, logs) in by_date.into_iter().rev() {
    let mut resolved = match NaiveDate::parse_from_str(&date, DATE_FORMAT) {
      Ok(d) => resolve_from(&tasks, &logs, d.weekday()),
      Err(e) => {
        warn!(target: "tracker", %date, error = %e, "Unparseable log date; showing logged rows only");
        Vec::new()
      }
    };

    for log in &logs {
      if resolved.iter().any(|r| r.title == log.task_title) {
        continue;
      }
      let resolved_row = match tasks.iter().find(|t| t.title == log.task_title) {
        Some(task) => merge(task, Some(log)),
        None => ResolvedTask {
          task_id: None,
          title: log.task_title.clone(),
          status: log.status,
          frequency: "Unknown".into(),
          duration: TaskDuration::AsNeeded,
          completion_time: log.completion_time.clone().filter(|_| log.status == TaskStatus::Done),
          requires_page_log: false,
          completed_page_numbers: log.completed_page_numbers.clone(),
        },
      };
      resolved.push(resolved_row);
    }

    let summary = evaluate_day(&resolved);
    days.push(HistoryDay { date, stars: StarRank::from(summary), summary, tasks: resolved });
  }
  Ok(days)
}
