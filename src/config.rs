//! Loading tracker configuration (settings + prompts) from TOML.
//!
//! See `TrackerConfig`, `Settings` and `Prompts` for the expected schema. Every
//! section is optional; missing keys fall back to the defaults below.

use std::path::PathBuf;

use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{error, info, warn};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct TrackerConfig {
  #[serde(default)]
  pub tracker: Settings,
  #[serde(default)]
  pub prompts: Prompts,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// IANA timezone name all civil dates and times are expressed in.
  pub timezone: String,
  pub database_path: PathBuf,
  pub questions_log_path: PathBuf,
  pub question_count: usize,
  /// Age used when a user's date of birth is missing or unparseable.
  pub default_age: u32,
  pub default_parent: String,
  pub static_dir: PathBuf,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      timezone: "America/Los_Angeles".into(),
      database_path: PathBuf::from("data/task_tracker.db"),
      questions_log_path: PathBuf::from("data/questions_log.jsonl"),
      question_count: 3,
      default_age: 10,
      default_parent: "Parent".into(),
      static_dir: PathBuf::from("./static"),
    }
  }
}

impl Settings {
  /// Resolve the configured timezone; an unknown name falls back to the default zone.
  pub fn tz(&self) -> Tz {
    match self.timezone.parse::<Tz>() {
      Ok(tz) => tz,
      Err(e) => {
        warn!(target: "task_tracker", timezone = %self.timezone, error = %e, "Unknown timezone; using America/Los_Angeles");
        chrono_tz::America::Los_Angeles
      }
    }
  }
}

/// Prompts used by the question generator.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub question_system: String,
  pub question_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      question_system: "You are a creative educational assistant for kids. Respond ONLY with strict JSON.".into(),
      question_user_template: "Generate {count} engaging, witty and diverse math, logic or science questions for {user}, who is {age} years old, at difficulty {difficulty} on a scale of 1 to 20. Draw inspiration from examples around the world and avoid repeating common puzzles.\n\nReturn a JSON object with exactly two keys:\n- \"questions_html\": an HTML unordered list (<ul>) with one <li> per question, in order.\n- \"questions_and_hints\": a list of exactly {count} objects {\"question\": string, \"hint\": string}, in the same order as the <li> items. Hints are short and must not reveal the answer.".into(),
    }
  }
}

/// Attempt to load `TrackerConfig` from TRACKER_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_tracker_config_from_env() -> Option<TrackerConfig> {
  let path = std::env::var("TRACKER_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<TrackerConfig>(&s) {
      Ok(cfg) => {
        info!(target: "task_tracker", %path, "Loaded tracker config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "task_tracker", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "task_tracker", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
