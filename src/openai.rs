//! OpenAI chat client used as the practice-question source.
//!
//! One JSON-mode completion per question set. The raw message text goes back to the
//! question cache, which owns shape validation. Logs carry model, latency and reply
//! size only; the API key is never logged.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::config::Prompts;
use crate::questions::{GenerationError, QuestionRequest, QuestionSource};
use crate::util::fill_template;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const QUESTION_TEMPERATURE: f32 = 0.7;
const QUESTION_MAX_TOKENS: u32 = 1200;

pub struct OpenAI {
  client: reqwest::Client,
  api_key: String,
  pub base_url: String,
  pub model: String,
  prompts: Prompts,
}

impl OpenAI {
  /// `None` when OPENAI_API_KEY is unset or blank.
  pub fn from_env(prompts: Prompts) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
    let client = match reqwest::Client::builder().timeout(Duration::from_secs(30)).build() {
      Ok(c) => c,
      Err(e) => {
        error!(target: "questions", error = %e, "Could not build HTTP client; OpenAI disabled");
        return None;
      }
    };
    Some(Self { client, api_key, base_url, model, prompts })
  }

  fn render_prompts(&self, req: &QuestionRequest) -> (String, String) {
    let count = req.count.to_string();
    let age = req.age.to_string();
    let difficulty = req.difficulty.to_string();
    let vars = [
      ("count", count.as_str()),
      ("user", req.user.as_str()),
      ("age", age.as_str()),
      ("difficulty", difficulty.as_str()),
    ];
    (
      fill_template(&self.prompts.question_system, &vars),
      fill_template(&self.prompts.question_user_template, &vars),
    )
  }

  async fn complete_json(&self, system: &str, user: &str) -> Result<String, GenerationError> {
    let body = CompletionBody {
      model: &self.model,
      messages: [Turn { role: "system", content: system }, Turn { role: "user", content: user }],
      temperature: QUESTION_TEMPERATURE,
      max_tokens: QUESTION_MAX_TOKENS,
      response_format: JsonMode { kind: "json_object" },
    };
    let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "task-tracker/0.1")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&body)
      .send()
      .await
      .map_err(|e| GenerationError::Transport(e.to_string()))?;

    let status = res.status();
    if !status.is_success() {
      let text = res.text().await.unwrap_or_default();
      let msg = api_error_message(&text).unwrap_or(text);
      return Err(GenerationError::Transport(format!("HTTP {}: {}", status, msg)));
    }

    let reply: CompletionReply = res
      .json()
      .await
      .map_err(|e| GenerationError::Malformed(format!("completion body: {}", e)))?;
    if let Some(total) = reply.usage.and_then(|u| u.total_tokens) {
      debug!(target: "questions", total_tokens = total, "Token usage");
    }
    reply
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .map(|t| t.trim().to_string())
      .filter(|t| !t.is_empty())
      .ok_or_else(|| GenerationError::Malformed("empty completion".into()))
  }
}

#[async_trait]
impl QuestionSource for OpenAI {
  #[instrument(level = "info", skip(self, req), fields(model = %self.model, user = %req.user, difficulty = req.difficulty))]
  async fn request(&self, req: &QuestionRequest) -> Result<String, GenerationError> {
    let (system, user) = self.render_prompts(req);
    let started = Instant::now();
    let result = self.complete_json(&system, &user).await;
    match &result {
      Ok(text) => info!(target: "questions", elapsed = ?started.elapsed(), reply_len = text.len(), "Question set received"),
      Err(e) => error!(target: "questions", elapsed = ?started.elapsed(), error = %e, "Question generation call failed"),
    }
    result
  }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
  model: &'a str,
  messages: [Turn<'a>; 2],
  temperature: f32,
  max_tokens: u32,
  response_format: JsonMode,
}

#[derive(Serialize)]
struct Turn<'a> {
  role: &'static str,
  content: &'a str,
}

#[derive(Serialize)]
struct JsonMode {
  #[serde(rename = "type")]
  kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionReply {
  #[serde(default)]
  choices: Vec<Choice>,
  #[serde(default)]
  usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
  message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
  content: Option<String>,
}

#[derive(Deserialize)]
struct TokenUsage {
  total_tokens: Option<u32>,
}

/// `error.message` from an API error body, if it has one.
fn api_error_message(body: &str) -> Option<String> {
  let v: serde_json::Value = serde_json::from_str(body).ok()?;
  v.pointer("/error/message")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(prompts: Prompts) -> OpenAI {
    OpenAI {
      client: reqwest::Client::new(),
      api_key: "test".into(),
      base_url: DEFAULT_BASE_URL.into(),
      model: DEFAULT_MODEL.into(),
      prompts,
    }
  }

  #[test]
  fn api_errors_surface_their_message() {
    let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
    assert_eq!(api_error_message(body).as_deref(), Some("Incorrect API key provided"));
    assert_eq!(api_error_message("<html>bad gateway</html>"), None);
  }

  #[test]
  fn body_requests_json_mode() {
    let body = CompletionBody {
      model: "gpt-4o",
      messages: [Turn { role: "system", content: "s" }, Turn { role: "user", content: "u" }],
      temperature: QUESTION_TEMPERATURE,
      max_tokens: QUESTION_MAX_TOKENS,
      response_format: JsonMode { kind: "json_object" },
    };
    let v = serde_json::to_value(&body).unwrap();
    assert_eq!(v["response_format"]["type"], "json_object");
    assert_eq!(v["messages"][1]["role"], "user");
    assert_eq!(v["max_tokens"], 1200);
  }

  #[test]
  fn prompts_carry_the_request_details() {
    let prompts = Prompts {
      question_system: "Strict JSON.".into(),
      question_user_template: "{count} questions for {user}, age {age}, level {difficulty}.".into(),
    };
    let req = QuestionRequest { count: 3, user: "Dylan".into(), age: 9, difficulty: 12 };
    let (system, user) = client(prompts).render_prompts(&req);
    assert_eq!(system, "Strict JSON.");
    assert_eq!(user, "3 questions for Dylan, age 9, level 12.");
  }
}
