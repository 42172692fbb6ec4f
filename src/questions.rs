//! Practice-question cache: an append-only JSON Lines log plus response validation.
//!
//! Each successful generation appends one entry. The visible value for
//! (user, difficulty, day) is the matching entry with the greatest timestamp;
//! entries from earlier days stay on disk and are never read back.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::clock::DATE_FORMAT;
use crate::domain::{QuestionHint, QuestionSet};
use crate::error::AppError;
use crate::util::{list_items, strip_code_fences, trunc_for_log};

pub const ERROR_HTML: &str = "<p>Error fetching AI problems. Please try again later.</p>";

/// Parameters sent to the question generation service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionRequest {
    pub count: usize,
    pub user: String,
    pub age: u32,
    pub difficulty: i64,
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("question generation disabled (no OPENAI_API_KEY)")]
    Disabled,
    #[error("transport: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// External service producing raw question-set text (JSON, possibly fenced).
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn request(&self, req: &QuestionRequest) -> Result<String, GenerationError>;
}

/// One persisted line of the question log.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionLogEntry {
    pub user: String,
    pub difficulty: i64,
    pub questions_html: String,
    pub questions_and_hints: Vec<QuestionHint>,
    pub timestamp: String, // YYYY-MM-DD HH:MM:SS, civil time
}

impl QuestionLogEntry {
    pub fn to_set(&self) -> QuestionSet {
        QuestionSet { html: self.questions_html.clone(), questions: self.questions_and_hints.clone() }
    }
}

pub struct QuestionLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl QuestionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All readable entries in append order. A missing file is an empty log;
    /// unreadable lines are skipped.
    pub async fn entries(&self) -> Result<Vec<QuestionLogEntry>, AppError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<QuestionLogEntry>(line) {
                Ok(entry) => out.push(entry),
                Err(e) => warn!(target: "questions", line = lineno + 1, error = %e, "Skipping unreadable question log line"),
            }
        }
        Ok(out)
    }

    /// Most recent entry for (user, difficulty) stamped on `date`.
    #[instrument(level = "debug", skip(self))]
    pub async fn latest_for(&self, user: &str, difficulty: i64, date: NaiveDate) -> Result<Option<QuestionLogEntry>, AppError> {
        let prefix = date.format(DATE_FORMAT).to_string();
        let best = self
            .entries()
            .await?
            .into_iter()
            .filter(|e| e.user == user && e.difficulty == difficulty && e.timestamp.starts_with(&prefix))
            .max_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(best)
    }

    pub async fn append(&self, entry: &QuestionLogEntry) -> Result<(), AppError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }
        let mut file = tokio::fs::OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        debug!(target: "questions", user = %entry.user, difficulty = entry.difficulty, timestamp = %entry.timestamp, "Question set appended to log");
        Ok(())
    }

    #[cfg(test)]
    pub async fn len(&self) -> Result<usize, AppError> {
        Ok(self.entries().await?.len())
    }
}

#[derive(Deserialize)]
struct RawQuestionSet {
    questions_html: serde_json::Value,
    questions_and_hints: serde_json::Value,
}

/// Validate the service's raw reply and turn it into a question set.
///
/// Requires an HTML list with exactly `count` `<li>` items and exactly `count`
/// question/hint objects.
pub fn parse_question_set(raw: &str, count: usize) -> Result<QuestionSet, GenerationError> {
    let body = strip_code_fences(raw);
    let parsed: RawQuestionSet = serde_json::from_str(body)
        .map_err(|e| GenerationError::Malformed(format!("{} in {}", e, trunc_for_log(body, 80))))?;

    let html = match parsed.questions_html {
        serde_json::Value::String(s) => strip_code_fences(&s).to_string(),
        other => return Err(GenerationError::Malformed(format!("questions_html is not a string: {}", other))),
    };
    let serde_json::Value::Array(items) = parsed.questions_and_hints else {
        return Err(GenerationError::Malformed("questions_and_hints is not a list".into()));
    };
    if items.len() != count {
        return Err(GenerationError::Malformed(format!("expected {} questions, got {}", count, items.len())));
    }

    let mut questions = Vec::with_capacity(count);
    for (i, item) in items.into_iter().enumerate() {
        let qh: QuestionHint = serde_json::from_value(item)
            .map_err(|e| GenerationError::Malformed(format!("item {}: {}", i + 1, e)))?;
        if qh.question.trim().is_empty() {
            return Err(GenerationError::Malformed(format!("item {} has an empty question", i + 1)));
        }
        questions.push(qh);
    }

    let li = list_items(&html).len();
    if li != count {
        return Err(GenerationError::Malformed(format!("expected {} <li> items, got {}", count, li)));
    }

    Ok(QuestionSet { html, questions })
}

/// Single-item payload shown when generation fails.
pub fn error_payload() -> QuestionSet {
    QuestionSet {
        html: ERROR_HTML.to_string(),
        questions: vec![QuestionHint {
            question: "Error fetching AI problems.".into(),
            hint: "Please try again later.".into(),
        }],
    }
}

/// Whole years between `date_of_birth` (YYYY-MM-DD) and `today`; None when unparseable
/// or in the future.
pub fn age_on(date_of_birth: &str, today: NaiveDate) -> Option<u32> {
    let dob = NaiveDate::parse_from_str(date_of_birth.trim(), DATE_FORMAT).ok()?;
    today.years_since(dob)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json(n: usize) -> String {
        let items: Vec<String> = (1..=n).map(|i| format!("<li>Q{}?</li>", i)).collect();
        let pairs: Vec<serde_json::Value> =
            (1..=n).map(|i| serde_json::json!({"question": format!("Q{}?", i), "hint": format!("H{}", i)})).collect();
        serde_json::json!({
            "questions_html": format!("<ul>{}</ul>", items.join("")),
            "questions_and_hints": pairs,
        })
        .to_string()
    }

    fn entry(user: &str, difficulty: i64, ts: &str, html: &str) -> QuestionLogEntry {
        QuestionLogEntry {
            user: user.into(),
            difficulty,
            questions_html: html.into(),
            questions_and_hints: vec![],
            timestamp: ts.into(),
        }
    }

    #[test]
    fn parses_fenced_reply() {
        let raw = format!("```json\n{}\n```", valid_json(3));
        let set = parse_question_set(&raw, 3).unwrap();
        assert_eq!(set.questions.len(), 3);
        assert_eq!(set.questions[2].hint, "H3");
        assert!(set.html.starts_with("<ul>"));
    }

    #[test]
    fn rejects_shape_mismatches() {
        assert!(matches!(parse_question_set("not json", 3), Err(GenerationError::Malformed(_))));
        assert!(parse_question_set(r#"{"questions_html": "<ul></ul>"}"#, 3).is_err());
        assert!(parse_question_set(&valid_json(2), 3).is_err());

        let bad_hints = r#"{"questions_html": "<ul><li>a</li></ul>", "questions_and_hints": "a"}"#;
        assert!(parse_question_set(bad_hints, 1).is_err());

        let missing_hint = r#"{"questions_html": "<ul><li>a</li></ul>", "questions_and_hints": [{"question": "a"}]}"#;
        assert!(parse_question_set(missing_hint, 1).is_err());

        let html_short = r#"{"questions_html": "<ul><li>a</li></ul>", "questions_and_hints": [{"question": "a", "hint": "x"}, {"question": "b", "hint": "y"}]}"#;
        assert!(parse_question_set(html_short, 2).is_err());
    }

    #[test]
    fn computes_age_in_whole_years() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(age_on("2016-10-16", today), Some(10));
        assert_eq!(age_on("2016-10-17", today), Some(9));
        assert_eq!(age_on("", today), None);
        assert_eq!(age_on("16/10/2016", today), None);
        assert_eq!(age_on("2030-01-01", today), None);
    }

    #[tokio::test]
    async fn latest_entry_for_day_wins() {
        let dir = tempfile::tempdir().unwrap();
        let log = QuestionLog::new(dir.path().join("q.jsonl"));
        assert_eq!(log.len().await.unwrap(), 0);

        log.append(&entry("Dylan", 10, "2026-10-16 08:00:00", "early")).await.unwrap();
        log.append(&entry("Dylan", 10, "2026-10-16 19:30:00", "late")).await.unwrap();
        log.append(&entry("Dylan", 10, "2026-10-16 09:00:00", "middle")).await.unwrap();
        log.append(&entry("Dylan", 11, "2026-10-16 20:00:00", "other difficulty")).await.unwrap();
        log.append(&entry("Dylan", 10, "2026-10-15 23:00:00", "yesterday")).await.unwrap();

        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let hit = log.latest_for("Dylan", 10, day).await.unwrap().unwrap();
        assert_eq!(hit.questions_html, "late");
        assert!(log.latest_for("Noah", 10, day).await.unwrap().is_none());
        assert_eq!(log.len().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn skips_corrupt_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.jsonl");
        let good = serde_json::to_string(&entry("Noah", 12, "2026-10-16 10:00:00", "ok")).unwrap();
        std::fs::write(&path, format!("{{broken\n{}\n", good)).unwrap();

        let log = QuestionLog::new(&path);
        assert_eq!(log.entries().await.unwrap().len(), 1);
    }
}
