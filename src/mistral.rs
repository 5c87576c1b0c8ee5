//! Minimal Mistral client for our use-case.
//!
//! We only call chat.completions with a fixed three-message conversation and
//! return the assistant's raw reply text. Calls are instrumented and log model
//! names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short to avoid PII leaks.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{instrument, info};

use crate::errors::EvalError;
use crate::util::trunc_for_log;

#[derive(Clone)]
pub struct Mistral {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl Mistral {
  /// Construct the client if we find MISTRAL_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("MISTRAL_API_KEY").ok()?;
    let base_url =
      std::env::var("MISTRAL_BASE_URL").unwrap_or_else(|_| "https://api.mistral.ai/v1".into());
    let model = std::env::var("MISTRAL_MODEL").unwrap_or_else(|_| "mistral-small".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// One grading turn: system sets the grader identity, assistant sets the
  /// strictness expectations, user carries the filled instruction.
  /// Returns the assistant reply verbatim; decoding happens upstream.
  #[instrument(level = "info", skip(self, system, assistant, user), fields(model = %self.model, user_len = user.len()))]
  pub async fn grade_writing(
    &self,
    system: &str,
    assistant: &str,
    user: &str,
  ) -> Result<String, EvalError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "assistant".into(), content: assistant.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature: 0.2,
    };

    let start = std::time::Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "writelevel-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| EvalError::Transport(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_mistral_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      return Err(EvalError::Transport(format!("Mistral HTTP {}: {}", status, msg)));
    }

    let body: ChatCompletionResponse =
      res.json().await.map_err(|e| EvalError::Transport(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Mistral usage");
    }

    let text = first_choice_text(&body)?;
    info!(elapsed = ?start.elapsed(), reply_len = text.len(), "Model reply received");
    Ok(text)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// The reply lives in the first choice; a response without one counts as no reply.
fn first_choice_text(body: &ChatCompletionResponse) -> Result<String, EvalError> {
  body
    .choices
    .first()
    .and_then(|c| c.message.content.clone())
    .ok_or(EvalError::NoReply)
}

/// Try to extract a clean error message from a Mistral error body.
/// The API uses both `{"error":{"message":...}}` and flat `{"message":...}` shapes.
fn extract_mistral_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  #[derive(Deserialize)]
  struct EFlat { message: String }
  if let Ok(w) = serde_json::from_str::<EWrap>(body) {
    return Some(w.error.message);
  }
  serde_json::from_str::<EFlat>(body).ok().map(|f| f.message)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_a_typical_completion_response() {
    let raw = r#"{
      "id": "cmpl-123",
      "object": "chat.completion",
      "choices": [
        {"index": 0, "message": {"role": "assistant", "content": "{\"score\": 70}"}, "finish_reason": "stop"}
      ],
      "usage": {"prompt_tokens": 210, "completion_tokens": 64, "total_tokens": 274}
    }"#;
    let body: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
    assert_eq!(first_choice_text(&body).unwrap(), "{\"score\": 70}");
    assert_eq!(body.usage.unwrap().total_tokens, Some(274));
  }

  #[test]
  fn empty_choices_count_as_no_reply() {
    let body: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
    assert!(matches!(first_choice_text(&body), Err(EvalError::NoReply)));
  }

  #[test]
  fn null_content_counts_as_no_reply() {
    let raw = r#"{"choices": [{"message": {"content": null}}]}"#;
    let body: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
    assert!(matches!(first_choice_text(&body), Err(EvalError::NoReply)));
  }

  #[test]
  fn request_serializes_three_ordered_messages() {
    let req = ChatCompletionRequest {
      model: "mistral-small".into(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: "s".into() },
        ChatMessageReq { role: "assistant".into(), content: "a".into() },
        ChatMessageReq { role: "user".into(), content: "u".into() },
      ],
      temperature: 0.2,
    };
    let v: serde_json::Value = serde_json::to_value(&req).unwrap();
    assert_eq!(v["model"], "mistral-small");
    assert_eq!(v["messages"][0]["role"], "system");
    assert_eq!(v["messages"][1]["role"], "assistant");
    assert_eq!(v["messages"][2]["role"], "user");
  }

  #[test]
  fn error_extraction_handles_both_body_shapes() {
    let nested = r#"{"error": {"message": "Invalid model"}}"#;
    assert_eq!(extract_mistral_error(nested).as_deref(), Some("Invalid model"));
    let flat = r#"{"object": "error", "message": "Unauthorized", "type": "invalid_request_error"}"#;
    assert_eq!(extract_mistral_error(flat).as_deref(), Some("Unauthorized"));
    assert!(extract_mistral_error("not json").is_none());
  }
}
