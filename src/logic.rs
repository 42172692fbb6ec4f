//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Today's task view and status changes (including page-number logging)
//!   - Practice questions: cache lookup, generation, hints
//!   - Difficulty changes
//!   - Parent management of users and task lists

use chrono::NaiveDate;
use tracing::{error, info, instrument, warn};

use crate::clock::DATE_FORMAT;
use crate::domain::{
  clamp_difficulty, DifficultyAction, Notice, QuestionSet, Task, TaskFields, TaskStatus, User, DEFAULT_DIFFICULTY,
  MAX_DIFFICULTY,
};
use crate::error::AppError;
use crate::protocol::{ParentViewOut, TodayOut};
use crate::questions::{age_on, error_payload, parse_question_set, GenerationError, QuestionLogEntry, QuestionRequest};
use crate::state::AppState;
use crate::tracker::{evaluate_day, resolve, star_rank, validate_frequency};

pub const ORIGIN_CACHE_HIT: &str = "cache_hit";
pub const ORIGIN_GENERATED: &str = "generated_new";
pub const ORIGIN_FAILED: &str = "generation_failed";

// -------- Tasks --------

#[instrument(level = "info", skip(state))]
pub fn today_view(state: &AppState, user_id: i64) -> Result<TodayOut, AppError> {
  let user = state.require_user(user_id)?;
  let today = state.clock.today();
  let tasks = resolve(&state.store, user.id, today)?;
  let summary = evaluate_day(&tasks);
  let stars = star_rank(&tasks);
  Ok(TodayOut {
    user: user.name,
    user_id: user.id,
    today: state.clock.today_header(),
    date: today.format(DATE_FORMAT).to_string(),
    difficulty: user.ai_difficulty,
    stars,
    summary,
    tasks,
    notice: None,
  })
}

/// Mark (Done) or unmark (TODO) one of today's tasks.
#[instrument(level = "info", skip(state))]
pub fn set_task_status(state: &AppState, user_id: i64, task_title: &str, status: TaskStatus) -> Result<(), AppError> {
  let user = state.require_user(user_id)?;
  crate::tracker::mark_status(&state.store, &state.clock, user.id, task_title, status, state.clock.today(), None)?;
  Ok(())
}

/// Mark a page-logging task Done today with the pages read.
#[instrument(level = "info", skip(state, page_numbers), fields(pages_len = page_numbers.len()))]
pub fn submit_page_numbers(state: &AppState, user_id: i64, task_title: &str, page_numbers: &str) -> Result<(), AppError> {
  let user = state.require_user(user_id)?;
  let pages = page_numbers.trim();
  if pages.is_empty() {
    return Err(AppError::validation("Please enter the page numbers you completed."));
  }
  let log = crate::tracker::mark_status(
    &state.store,
    &state.clock,
    user.id,
    task_title,
    TaskStatus::Done,
    state.clock.today(),
    Some(pages),
  )?;
  info!(target: "tracker", user = %user.name, task = task_title, pages, time = ?log.completion_time, "Page numbers logged");
  Ok(())
}

// -------- Practice questions --------

fn user_age(state: &AppState, user: &User, today: NaiveDate) -> u32 {
  match age_on(&user.date_of_birth, today) {
    Some(age) => age,
    None => {
      warn!(target: "questions", user = %user.name, dob = %user.date_of_birth, default_age = state.settings.default_age, "Missing or unparseable date of birth; using default age");
      state.settings.default_age
    }
  }
}

/// Today's practice set for the user at their current difficulty.
///
/// Served from the question log unless `force_refresh` is set or nothing was stored
/// today. Generation failures yield the error payload and are not stored.
#[instrument(level = "info", skip(state, user), fields(user = %user.name, difficulty = user.ai_difficulty))]
pub async fn get_questions(state: &AppState, user: &User, force_refresh: bool) -> Result<(QuestionSet, &'static str), AppError> {
  let today = state.clock.today();
  if !force_refresh {
    if let Some(hit) = state.questions.latest_for(&user.name, user.ai_difficulty, today).await? {
      info!(target: "questions", user = %user.name, difficulty = user.ai_difficulty, timestamp = %hit.timestamp, "Using cached question set");
      return Ok((hit.to_set(), ORIGIN_CACHE_HIT));
    }
  }

  let req = QuestionRequest {
    count: state.settings.question_count,
    user: user.name.clone(),
    age: user_age(state, user, today),
    difficulty: user.ai_difficulty,
  };

  let generated = match &state.generator {
    Some(source) => match source.request(&req).await {
      Ok(raw) => parse_question_set(&raw, req.count),
      Err(e) => Err(e),
    },
    None => Err(GenerationError::Disabled),
  };

  let set = match generated {
    Ok(set) => set,
    Err(e) => {
      error!(target: "questions", user = %user.name, difficulty = user.ai_difficulty, error = %e, "Question generation failed; serving error payload");
      return Ok((error_payload(), ORIGIN_FAILED));
    }
  };

  let entry = QuestionLogEntry {
    user: user.name.clone(),
    difficulty: user.ai_difficulty,
    questions_html: set.html.clone(),
    questions_and_hints: set.questions.clone(),
    timestamp: state.clock.timestamp(),
  };
  if let Err(e) = state.questions.append(&entry).await {
    error!(target: "questions", user = %user.name, error = %e, "Failed to append question set to log");
  }
  info!(target: "questions", user = %user.name, difficulty = user.ai_difficulty, count = set.questions.len(), "Generated fresh question set");
  Ok((set, ORIGIN_GENERATED))
}

/// Question text and hint for the 1-based `question_number` of today's set.
#[instrument(level = "info", skip(state, user), fields(user = %user.name))]
pub async fn get_hint(state: &AppState, user: &User, question_number: usize) -> Result<(String, String), AppError> {
  let (set, origin) = get_questions(state, user, false).await?;
  if origin == ORIGIN_FAILED {
    return Err(AppError::validation("Error fetching hint! Questions are unavailable right now."));
  }
  let qh = question_number
    .checked_sub(1)
    .and_then(|i| set.questions.get(i))
    .ok_or_else(|| AppError::validation(format!("There is no question {}.", question_number)))?;
  Ok((qh.question.clone(), qh.hint.clone()))
}

// -------- Difficulty --------

/// Clamp to [1, 20] and persist.
#[instrument(level = "info", skip(state))]
pub fn set_difficulty(state: &AppState, user_id: i64, value: i64) -> Result<i64, AppError> {
  let clamped = clamp_difficulty(value);
  if !state.store.set_difficulty(user_id, clamped)? {
    return Err(AppError::UserNotFound);
  }
  info!(target: "questions", user_id, requested = value, difficulty = clamped, "Difficulty set");
  Ok(clamped)
}

/// Step difficulty by one. Increasing at the maximum is a no-op with a warning;
/// decreasing at the minimum stays at the minimum.
#[instrument(level = "info", skip(state))]
pub fn adjust_difficulty(state: &AppState, user_id: i64, action: DifficultyAction) -> Result<(i64, Option<Notice>), AppError> {
  let user = state.require_user(user_id)?;
  let current = user.ai_difficulty;
  match action {
    DifficultyAction::Increase if current >= MAX_DIFFICULTY => {
      warn!(target: "questions", user = %user.name, difficulty = current, "Difficulty already at maximum");
      Ok((current, Some(Notice::warning(format!("Max difficulty is {}!", MAX_DIFFICULTY)))))
    }
    DifficultyAction::Increase => Ok((set_difficulty(state, user.id, current + 1)?, None)),
    DifficultyAction::Decrease => Ok((set_difficulty(state, user.id, current - 1)?, None)),
  }
}

// -------- Parent management --------

fn validate_user_fields(name: &str, date_of_birth: &str) -> Result<(), AppError> {
  if name.trim().is_empty() {
    return Err(AppError::validation("Name is required."));
  }
  if date_of_birth.trim().is_empty() {
    return Err(AppError::validation("Date of birth is required."));
  }
  NaiveDate::parse_from_str(date_of_birth.trim(), DATE_FORMAT)
    .map_err(|_| AppError::validation("Date of birth must look like YYYY-MM-DD."))?;
  Ok(())
}

fn normalized_task_fields(fields: &TaskFields) -> Result<TaskFields, AppError> {
  let title = fields.title.trim();
  if title.is_empty() {
    return Err(AppError::validation("Task title is required."));
  }
  validate_frequency(&fields.frequency)?;
  if matches!(fields.duration_minutes, Some(d) if d < 0) {
    return Err(AppError::validation("Duration cannot be negative."));
  }
  Ok(TaskFields {
    title: title.to_string(),
    frequency: fields.frequency.trim().to_string(),
    duration_minutes: fields.duration_minutes,
    requires_page_log: fields.requires_page_log,
  })
}

/// Parent page: the parent's users and the selected (or first) user's tasks.
#[instrument(level = "info", skip(state))]
pub fn parent_view(state: &AppState, parent_name: &str, selected_user_id: Option<i64>) -> Result<ParentViewOut, AppError> {
  let parent = state.store.ensure_parent(parent_name)?;
  let users = state.store.list_users_for_parent(parent.id)?;
  let selected = match selected_user_id {
    Some(id) => users.iter().find(|u| u.id == id).cloned(),
    None => users.first().cloned(),
  };
  let tasks = match &selected {
    Some(u) => state.store.list_tasks(u.id)?,
    None => Vec::new(),
  };
  Ok(ParentViewOut { parent, users, selected_user: selected, tasks })
}

/// Name of the parent owning `user_id`.
pub fn parent_name_of(state: &AppState, user_id: i64) -> Result<String, AppError> {
  let user = state.require_user(user_id)?;
  let parent = state
    .store
    .get_parent(user.parent_id)?
    .ok_or_else(|| AppError::Internal(format!("user {} has no parent row", user.id)))?;
  Ok(parent.name)
}

#[instrument(level = "info", skip(state))]
pub fn add_user(state: &AppState, parent_name: &str, name: &str, date_of_birth: &str, difficulty: Option<i64>) -> Result<User, AppError> {
  validate_user_fields(name, date_of_birth)?;
  let parent = state.store.ensure_parent(parent_name)?;
  let difficulty = clamp_difficulty(difficulty.unwrap_or(DEFAULT_DIFFICULTY));
  let user = state.store.create_user(parent.id, name.trim(), date_of_birth.trim(), difficulty)?;
  info!(target: "task_tracker", parent = %parent.name, user = %user.name, id = user.id, "User added");
  Ok(user)
}

#[instrument(level = "info", skip(state))]
pub fn edit_user(state: &AppState, user_id: i64, name: &str, date_of_birth: &str, difficulty: Option<i64>) -> Result<User, AppError> {
  validate_user_fields(name, date_of_birth)?;
  let user = state.require_user(user_id)?;
  // Leaving the level out keeps the stored one.
  let difficulty = clamp_difficulty(difficulty.unwrap_or(user.ai_difficulty));
  state.store.update_user(user.id, name.trim(), date_of_birth.trim(), difficulty)?;
  Ok(User { name: name.trim().to_string(), date_of_birth: date_of_birth.trim().to_string(), ai_difficulty: difficulty, ..user })
}

#[instrument(level = "info", skip(state, task), fields(title = %task.title))]
pub fn add_task(state: &AppState, user_id: i64, task: &TaskFields) -> Result<Task, AppError> {
  let user = state.require_user(user_id)?;
  let fields = normalized_task_fields(task)?;
  if state.store.find_task(user.id, &fields.title)?.is_some() {
    return Err(AppError::validation(format!("{} already has a task named '{}'.", user.name, fields.title)));
  }
  state.store.create_task(user.id, &fields)
}

#[instrument(level = "info", skip(state, task), fields(new_title = %task.title))]
pub fn edit_task(state: &AppState, user_id: i64, old_title: &str, task: &TaskFields) -> Result<Task, AppError> {
  let user = state.require_user(user_id)?;
  let fields = normalized_task_fields(task)?;
  if fields.title != old_title && state.store.find_task(user.id, &fields.title)?.is_some() {
    return Err(AppError::validation(format!("{} already has a task named '{}'.", user.name, fields.title)));
  }
  state
    .store
    .update_task(user.id, old_title, &fields)?
    .ok_or_else(|| AppError::validation(format!("Unknown task '{}'.", old_title)))
}

#[instrument(level = "info", skip(state))]
pub fn delete_task(state: &AppState, user_id: i64, title: &str) -> Result<(), AppError> {
  let user = state.require_user(user_id)?;
  if !state.store.delete_task(user.id, title)? {
    return Err(AppError::validation(format!("Unknown task '{}'.", title)));
  }
  Ok(())
}

/// Copy every task the target does not already have (matched by title).
#[instrument(level = "info", skip(state))]
pub fn copy_tasks(state: &AppState, from_user_id: i64, to_user_id: i64) -> Result<usize, AppError> {
  if from_user_id == to_user_id {
    return Err(AppError::validation("Pick two different users to copy tasks between."));
  }
  let from = state.require_user(from_user_id)?;
  let to = state.require_user(to_user_id)?;
  let copied = state.store.copy_tasks(from.id, to.id)?;
  info!(target: "task_tracker", from = %from.name, to = %to.name, copied, "Task list copied");
  Ok(copied)
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  use async_trait::async_trait;
  use chrono::{TimeZone, Utc};

  use crate::clock::{FixedClock, TimeProvider};
  use crate::config::Settings;
  use crate::questions::{QuestionLog, QuestionSource};
  use crate::store::Store;

  /// Fake service returning a canned reply and counting calls.
  pub struct CountingSource {
    pub calls: AtomicUsize,
    pub reply: Result<String, String>,
  }

  impl CountingSource {
    pub fn ok(count: usize) -> Self {
      let items: Vec<String> = (1..=count).map(|i| format!("<li>Question {}?</li>", i)).collect();
      let pairs: Vec<serde_json::Value> = (1..=count)
        .map(|i| serde_json::json!({"question": format!("Question {}?", i), "hint": format!("Hint {}", i)}))
        .collect();
      let body = serde_json::json!({
        "questions_html": format!("<ul>{}</ul>", items.join("\n")),
        "questions_and_hints": pairs,
      });
      Self { calls: AtomicUsize::new(0), reply: Ok(format!("```json\n{}\n```", body)) }
    }

    pub fn replying(raw: &str) -> Self {
      Self { calls: AtomicUsize::new(0), reply: Ok(raw.to_string()) }
    }

    pub fn failing() -> Self {
      Self { calls: AtomicUsize::new(0), reply: Err("connection refused".into()) }
    }

    pub fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl QuestionSource for CountingSource {
    async fn request(&self, _req: &QuestionRequest) -> Result<String, GenerationError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.reply.clone().map_err(GenerationError::Transport)
    }
  }

  pub struct Harness {
    pub state: AppState,
    pub clock: Arc<FixedClock>,
    pub source: Option<Arc<CountingSource>>,
    pub _dir: tempfile::TempDir,
  }

  /// State on an in-memory database with a parent "Shanhu" and a user "Dylan"
  /// (born 2017-03-04, difficulty 10). Clock: Friday 2026-10-16 09:30 PDT.
  pub fn harness(source: Option<CountingSource>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open_in_memory().unwrap();
    let parent = store.ensure_parent("Shanhu").unwrap();
    store.create_user(parent.id, "Dylan", "2017-03-04", 10).unwrap();

    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 16, 30, 0).unwrap()));
    let tp = TimeProvider::new(chrono_tz::America::Los_Angeles, clock.clone());
    let source = source.map(Arc::new);
    let generator = source.clone().map(|s| s as Arc<dyn QuestionSource>);
    let settings = Settings { default_parent: "Shanhu".into(), ..Settings::default() };
    let log = QuestionLog::new(dir.path().join("questions_log.jsonl"));
    Harness { state: AppState::with_parts(store, log, tp, generator, settings), clock, source, _dir: dir }
  }

  fn dylan(h: &Harness) -> User {
    h.state.store.get_user_by_name("Dylan").unwrap().unwrap()
  }

  #[tokio::test]
  async fn cached_questions_are_reused_within_a_day() {
    let h = harness(Some(CountingSource::ok(3)));
    let user = dylan(&h);

    let (first, o1) = get_questions(&h.state, &user, false).await.unwrap();
    let (second, o2) = get_questions(&h.state, &user, false).await.unwrap();
    assert_eq!(o1, ORIGIN_GENERATED);
    assert_eq!(o2, ORIGIN_CACHE_HIT);
    assert_eq!(first, second);
    assert_eq!(first.questions.len(), 3);
    assert_eq!(h.source.as_ref().unwrap().calls(), 1);
  }

  #[tokio::test]
  async fn next_day_generates_again() {
    let h = harness(Some(CountingSource::ok(3)));
    let user = dylan(&h);
    get_questions(&h.state, &user, false).await.unwrap();

    h.clock.set(Utc.with_ymd_and_hms(2026, 10, 17, 16, 30, 0).unwrap());
    let (_, origin) = get_questions(&h.state, &user, false).await.unwrap();
    assert_eq!(origin, ORIGIN_GENERATED);
    assert_eq!(h.source.as_ref().unwrap().calls(), 2);
  }

  #[tokio::test]
  async fn forced_refresh_always_calls_and_appends() {
    let h = harness(Some(CountingSource::ok(3)));
    let user = dylan(&h);
    get_questions(&h.state, &user, false).await.unwrap();
    assert_eq!(h.state.questions.len().await.unwrap(), 1);

    get_questions(&h.state, &user, true).await.unwrap();
    get_questions(&h.state, &user, true).await.unwrap();
    assert_eq!(h.source.as_ref().unwrap().calls(), 3);
    assert_eq!(h.state.questions.len().await.unwrap(), 3);
  }

  #[tokio::test]
  async fn malformed_reply_is_not_cached() {
    let h = harness(Some(CountingSource::replying(r#"{"questions_html": "<ul><li>a</li></ul>"}"#)));
    let user = dylan(&h);
    let before = h.state.questions.len().await.unwrap();

    let (set, origin) = get_questions(&h.state, &user, false).await.unwrap();
    assert_eq!(origin, ORIGIN_FAILED);
    assert_eq!(set, error_payload());
    assert_eq!(set.questions.len(), 1);
    assert_eq!(h.state.questions.len().await.unwrap(), before);
  }

  #[tokio::test]
  async fn transport_failure_and_disabled_generator_yield_error_payload() {
    let h = harness(Some(CountingSource::failing()));
    let user = dylan(&h);
    let (set, origin) = get_questions(&h.state, &user, false).await.unwrap();
    assert_eq!((set.html.as_str(), origin), (crate::questions::ERROR_HTML, ORIGIN_FAILED));

    let h = harness(None);
    let (_, origin) = get_questions(&h.state, &dylan(&h), true).await.unwrap();
    assert_eq!(origin, ORIGIN_FAILED);
    assert_eq!(h.state.questions.len().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn hint_comes_from_cached_set() {
    let h = harness(Some(CountingSource::ok(3)));
    let user = dylan(&h);
    let (q, hint) = get_hint(&h.state, &user, 2).await.unwrap();
    assert_eq!((q.as_str(), hint.as_str()), ("Question 2?", "Hint 2"));
    assert!(matches!(get_hint(&h.state, &user, 4).await, Err(AppError::Validation(_))));
    assert!(matches!(get_hint(&h.state, &user, 0).await, Err(AppError::Validation(_))));
    assert_eq!(h.source.as_ref().unwrap().calls(), 1);
  }

  #[test]
  fn difficulty_is_bounded() {
    let h = harness(None);
    let id = dylan(&h).id;

    assert_eq!(set_difficulty(&h.state, id, 42).unwrap(), 20);
    let (d, notice) = adjust_difficulty(&h.state, id, DifficultyAction::Increase).unwrap();
    assert_eq!(d, 20);
    assert_eq!(notice.map(|n| n.level), Some(crate::domain::NoticeLevel::Warning));

    assert_eq!(set_difficulty(&h.state, id, -3).unwrap(), 1);
    let (d, notice) = adjust_difficulty(&h.state, id, DifficultyAction::Decrease).unwrap();
    assert_eq!((d, notice), (1, None));

    let (d, _) = adjust_difficulty(&h.state, id, DifficultyAction::Increase).unwrap();
    assert_eq!(d, 2);
    assert_eq!(dylan(&h).ai_difficulty, 2);
  }

  #[test]
  fn unknown_user_is_reported_not_raised() {
    let h = harness(None);
    assert!(matches!(adjust_difficulty(&h.state, 999, DifficultyAction::Increase), Err(AppError::UserNotFound)));
    assert!(matches!(set_difficulty(&h.state, 999, 5), Err(AppError::UserNotFound)));
    assert!(matches!(today_view(&h.state, 999), Err(AppError::UserNotFound)));
  }

  #[test]
  fn user_creation_requires_valid_birth_date() {
    let h = harness(None);
    assert!(matches!(add_user(&h.state, "Shanhu", "Noah", "", None), Err(AppError::Validation(_))));
    assert!(matches!(add_user(&h.state, "Shanhu", "Noah", "last spring", None), Err(AppError::Validation(_))));
    assert!(matches!(add_user(&h.state, "Shanhu", " ", "2015-01-02", None), Err(AppError::Validation(_))));
    assert_eq!(h.state.store.list_users().unwrap().len(), 1);

    let noah = add_user(&h.state, "Shanhu", "Noah", "2015-01-02", Some(30)).unwrap();
    assert_eq!(noah.ai_difficulty, 20);
    let edited = edit_user(&h.state, noah.id, "Noah B", "2015-01-03", None).unwrap();
    assert_eq!(edited.ai_difficulty, 20);
    assert_eq!(h.state.store.get_user(noah.id).unwrap().unwrap().name, "Noah B");
  }

  #[test]
  fn renaming_a_user_keeps_their_difficulty() {
    let h = harness(None);
    let id = dylan(&h).id;
    set_difficulty(&h.state, id, 17).unwrap();

    let edited = edit_user(&h.state, id, "Dylan R", "2017-03-04", None).unwrap();
    assert_eq!(edited.ai_difficulty, 17);
    let stored = h.state.store.get_user(id).unwrap().unwrap();
    assert_eq!(stored.name, "Dylan R");
    assert_eq!(stored.ai_difficulty, 17);

    let edited = edit_user(&h.state, id, "Dylan R", "2017-03-04", Some(5)).unwrap();
    assert_eq!(edited.ai_difficulty, 5);
  }

  #[test]
  fn task_management_and_today_view() {
    let h = harness(None);
    let id = dylan(&h).id;
    let piano = TaskFields { title: " Piano ".into(), frequency: "daily".into(), duration_minutes: Some(15), requires_page_log: false };
    let reading = TaskFields { title: "Reading".into(), frequency: "Fri".into(), duration_minutes: None, requires_page_log: true };
    let swim = TaskFields { title: "Swim".into(), frequency: "Tue".into(), duration_minutes: None, requires_page_log: false };

    assert_eq!(add_task(&h.state, id, &piano).unwrap().title, "Piano");
    add_task(&h.state, id, &reading).unwrap();
    add_task(&h.state, id, &swim).unwrap();
    assert!(matches!(add_task(&h.state, id, &piano), Err(AppError::Validation(_))));
    let bad = TaskFields { frequency: "Someday".into(), ..swim.clone() };
    assert!(matches!(add_task(&h.state, id, &bad), Err(AppError::Validation(_))));

    // Friday: Piano and Reading are due.
    set_task_status(&h.state, id, "Piano", TaskStatus::Done).unwrap();
    submit_page_numbers(&h.state, id, "Reading", "12-20").unwrap();
    let view = today_view(&h.state, id).unwrap();
    assert_eq!(view.tasks.len(), 2);
    assert_eq!(view.date, "2026-10-16");
    assert_eq!(view.stars, crate::domain::StarRank::AllDoneEarly);
    assert_eq!(view.tasks[1].completed_page_numbers.as_deref(), Some("12-20"));
    assert_eq!(view.tasks[1].completion_time.as_deref(), Some("09:30:00"));

    assert!(matches!(submit_page_numbers(&h.state, id, "Reading", "  "), Err(AppError::Validation(_))));

    let renamed = TaskFields { title: "Piano practice".into(), ..piano };
    edit_task(&h.state, id, "Piano", &renamed).unwrap();
    let view = today_view(&h.state, id).unwrap();
    assert_eq!(view.tasks[0].title, "Piano practice");
    assert_eq!(view.tasks[0].status, TaskStatus::Done);

    delete_task(&h.state, id, "Swim").unwrap();
    assert!(matches!(delete_task(&h.state, id, "Swim"), Err(AppError::Validation(_))));
  }

  #[test]
  fn parent_view_and_copy() {
    let h = harness(None);
    let dylan_id = dylan(&h).id;
    let noah = add_user(&h.state, "Shanhu", "Noah", "2015-01-02", None).unwrap();
    let t = TaskFields { title: "Piano".into(), frequency: "daily".into(), duration_minutes: None, requires_page_log: false };
    add_task(&h.state, dylan_id, &t).unwrap();

    assert_eq!(copy_tasks(&h.state, dylan_id, noah.id).unwrap(), 1);
    assert_eq!(copy_tasks(&h.state, dylan_id, noah.id).unwrap(), 0);
    assert!(matches!(copy_tasks(&h.state, dylan_id, dylan_id), Err(AppError::Validation(_))));

    let view = parent_view(&h.state, "Shanhu", None).unwrap();
    assert_eq!(view.users.len(), 2);
    assert_eq!(view.selected_user.as_ref().map(|u| u.id), Some(dylan_id));
    let view = parent_view(&h.state, "Shanhu", Some(noah.id)).unwrap();
    assert_eq!(view.tasks.len(), 1);

    let empty = parent_view(&h.state, "Newcomer", None).unwrap();
    assert!(empty.users.is_empty() && empty.selected_user.is_none());
  }
}
