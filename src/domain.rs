//! Domain models: parents, users, recurring tasks, task logs, question sets and star ranks.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

pub const MIN_DIFFICULTY: i64 = 1;
pub const MAX_DIFFICULTY: i64 = 20;
pub const DEFAULT_DIFFICULTY: i64 = 10;

/// Clamp any requested difficulty into the supported range.
pub fn clamp_difficulty(value: i64) -> i64 {
  value.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Parent {
  pub id: i64,
  pub name: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct User {
  pub id: i64,
  pub name: String,
  pub date_of_birth: String, // YYYY-MM-DD
  pub ai_difficulty: i64,
  pub parent_id: i64,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Task {
  pub id: i64,
  pub user_id: i64,
  pub title: String,
  pub frequency: String, // "daily" or "Mon, Wed, Fri"
  pub duration_minutes: Option<i64>,
  pub requires_page_log: bool,
}

/// Fields accepted when creating or editing a task.
#[derive(Clone, Debug, Deserialize)]
pub struct TaskFields {
  pub title: String,
  pub frequency: String,
  #[serde(default)] pub duration_minutes: Option<i64>,
  #[serde(default)] pub requires_page_log: bool,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
  #[serde(rename = "TODO")]
  Todo,
  Done,
}

impl TaskStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      TaskStatus::Todo => "TODO",
      TaskStatus::Done => "Done",
    }
  }

  /// Anything other than the literal "Done" counts as not done.
  pub fn parse(s: &str) -> Self {
    if s == "Done" { TaskStatus::Done } else { TaskStatus::Todo }
  }
}

impl fmt::Display for TaskStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TaskLog {
  pub id: i64,
  pub user_id: i64,
  pub task_title: String,
  pub date: String, // YYYY-MM-DD
  pub status: TaskStatus,
  pub completion_time: Option<String>, // HH:MM:SS
  pub completed_page_numbers: Option<String>,
}

/// Planned duration of a task; unset durations render as "as needed".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskDuration {
  Minutes(i64),
  AsNeeded,
}

impl From<Option<i64>> for TaskDuration {
  fn from(v: Option<i64>) -> Self {
    v.map(TaskDuration::Minutes).unwrap_or(TaskDuration::AsNeeded)
  }
}

impl Serialize for TaskDuration {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    match self {
      TaskDuration::Minutes(m) => s.serialize_i64(*m),
      TaskDuration::AsNeeded => s.serialize_str("as needed"),
    }
  }
}

/// A task as it appears on a given day, merged with that day's log row.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ResolvedTask {
  pub task_id: Option<i64>,
  pub title: String,
  pub status: TaskStatus,
  pub frequency: String,
  pub duration: TaskDuration,
  pub completion_time: Option<String>,
  pub requires_page_log: bool,
  pub completed_page_numbers: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct DaySummary {
  pub all_done: bool,
  pub all_done_before_noon: bool,
}

/// Achievement rank for one day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum StarRank {
  None,
  AllDone,
  AllDoneEarly,
}

impl StarRank {
  pub fn stars(&self) -> u8 {
    match self {
      StarRank::None => 0,
      StarRank::AllDone => 1,
      StarRank::AllDoneEarly => 2,
    }
  }
}

impl From<DaySummary> for StarRank {
  fn from(s: DaySummary) -> Self {
    match (s.all_done, s.all_done_before_noon) {
      (true, true) => StarRank::AllDoneEarly,
      (true, false) => StarRank::AllDone,
      _ => StarRank::None,
    }
  }
}

impl Serialize for StarRank {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u8(self.stars())
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionHint {
  pub question: String,
  pub hint: String,
}

/// A generated practice set: an HTML list plus the matching question/hint pairs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionSet {
  pub html: String,
  pub questions: Vec<QuestionHint>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyAction {
  Increase,
  Decrease,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
  Info,
  Warning,
  Error,
}

/// User-visible message attached to a response.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Notice {
  pub level: NoticeLevel,
  pub message: String,
}

impl Notice {
  pub fn warning(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Warning, message: message.into() }
  }
  pub fn error(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Error, message: message.into() }
  }
  pub fn info(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Info, message: message.into() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn star_rank_follows_summary() {
    let none = DaySummary { all_done: false, all_done_before_noon: false };
    let done = DaySummary { all_done: true, all_done_before_noon: false };
    let early = DaySummary { all_done: true, all_done_before_noon: true };
    assert_eq!(StarRank::from(none).stars(), 0);
    assert_eq!(StarRank::from(done).stars(), 1);
    assert_eq!(StarRank::from(early).stars(), 2);
  }

  #[test]
  fn duration_serializes_sentinel() {
    assert_eq!(serde_json::to_string(&TaskDuration::from(None)).unwrap(), "\"as needed\"");
    assert_eq!(serde_json::to_string(&TaskDuration::from(Some(20))).unwrap(), "20");
  }

  #[test]
  fn status_wire_names() {
    assert_eq!(serde_json::to_string(&TaskStatus::Todo).unwrap(), "\"TODO\"");
    assert_eq!(TaskStatus::parse("Done"), TaskStatus::Done);
    assert_eq!(TaskStatus::parse("done?"), TaskStatus::Todo);
  }

  #[test]
  fn difficulty_is_clamped() {
    assert_eq!(clamp_difficulty(0), 1);
    assert_eq!(clamp_difficulty(25), 20);
    assert_eq!(clamp_difficulty(7), 7);
  }
}
