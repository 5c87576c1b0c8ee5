//! Supabase-backed persistence for sessions and evaluation results.
//!
//! Every call runs with the caller's bearer token so row-level security stays
//! in force; the anon key only identifies the project. Failures are reported
//! as strings and left to the handlers to log, the evaluation flow itself
//! never depends on storage succeeding.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::util::trunc_for_log;

/// The user as Supabase auth reports it for a bearer token.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthUser {
  pub id: String,
  #[serde(default)]
  pub email: Option<String>,
}

/// One stored writing submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
  pub id: i64,
  pub user_id: String,
  pub level: String,
  pub response: String,
  pub created_at: DateTime<Utc>,
}

/// One stored evaluation, optionally joined with its session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationRecord {
  pub id: i64,
  pub user_id: String,
  #[serde(default)]
  pub session_id: Option<i64>,
  pub final_level: String,
  pub score: i64,
  pub feedback: String,
  pub evaluated_at: DateTime<Utc>,
  #[serde(default, rename = "user_session")]
  pub session: Option<SessionRecord>,
}

#[derive(Serialize)]
struct NewSession<'a> {
  user_id: &'a str,
  level: &'a str,
  response: &'a str,
  created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct NewEvaluation<'a> {
  user_id: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  session_id: Option<i64>,
  final_level: &'a str,
  score: i64,
  feedback: &'a str,
  evaluated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Storage {
  pub client: reqwest::Client,
  pub base_url: String,
  pub anon_key: String,
}

impl Storage {
  /// Construct the client if SUPABASE_URL and SUPABASE_ANON_KEY are set; otherwise None.
  pub fn from_env() -> Option<Self> {
    let base_url = std::env::var("SUPABASE_URL").ok()?;
    let anon_key = std::env::var("SUPABASE_ANON_KEY").ok()?;

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, base_url, anon_key })
  }

  /// Resolve a bearer token to the user it belongs to.
  #[instrument(level = "info", skip(self, bearer))]
  pub async fn authenticated_user(&self, bearer: &str) -> Result<AuthUser, String> {
    let url = format!("{}/auth/v1/user", self.base_url);
    let res = self.client.get(&url)
      .header(USER_AGENT, "writelevel-backend/0.1")
      .header("apikey", &self.anon_key)
      .header(AUTHORIZATION, format!("Bearer {}", bearer))
      .send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(format!("Supabase auth HTTP {}: {}", status, trunc_for_log(&body, 300)));
    }

    res.json::<AuthUser>().await.map_err(|e| e.to_string())
  }

  #[instrument(level = "info", skip(self, bearer, response), fields(%user_id, %level, response_len = response.len()))]
  pub async fn save_session(
    &self,
    bearer: &str,
    user_id: &str,
    level: &str,
    response: &str,
  ) -> Result<SessionRecord, String> {
    let row = NewSession { user_id, level, response, created_at: Utc::now() };
    let rows: Vec<SessionRecord> = self.insert(bearer, "user_sessions", &row).await?;
    rows
      .into_iter()
      .next()
      .ok_or_else(|| "Supabase returned no representation for user_sessions insert".to_string())
  }

  #[instrument(level = "info", skip(self, bearer, feedback), fields(%user_id, %final_level, score))]
  pub async fn save_evaluation(
    &self,
    bearer: &str,
    user_id: &str,
    session_id: Option<i64>,
    final_level: &str,
    score: i64,
    feedback: &str,
  ) -> Result<EvaluationRecord, String> {
    let row = NewEvaluation { user_id, session_id, final_level, score, feedback, evaluated_at: Utc::now() };
    let rows: Vec<EvaluationRecord> = self.insert(bearer, "evaluation_results", &row).await?;
    rows
      .into_iter()
      .next()
      .ok_or_else(|| "Supabase returned no representation for evaluation_results insert".to_string())
  }

  /// All evaluations for a user, newest first, each joined with its session.
  #[instrument(level = "info", skip(self, bearer), fields(%user_id))]
  pub async fn results_for_user(
    &self,
    bearer: &str,
    user_id: &str,
  ) -> Result<Vec<EvaluationRecord>, String> {
    let rows: Vec<EvaluationRecord> = self
      .select(bearer, &[
        ("user_id", format!("eq.{}", user_id)),
        ("select", "*,user_session:user_sessions(*)".into()),
        ("order", "evaluated_at.desc".into()),
      ])
      .await?;
    info!(target: "evaluation", rows = rows.len(), "Fetched evaluation history");
    Ok(rows)
  }

  /// One evaluation by id, still scoped to the user. None when no row matches.
  #[instrument(level = "info", skip(self, bearer), fields(%user_id, id))]
  pub async fn result_detail(
    &self,
    bearer: &str,
    user_id: &str,
    id: i64,
  ) -> Result<Option<EvaluationRecord>, String> {
    let rows: Vec<EvaluationRecord> = self
      .select(bearer, &[
        ("id", format!("eq.{}", id)),
        ("user_id", format!("eq.{}", user_id)),
        ("select", "*,user_session:user_sessions(*)".into()),
      ])
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn insert<Row: Serialize, Out: DeserializeOwned>(
    &self,
    bearer: &str,
    table: &str,
    row: &Row,
  ) -> Result<Vec<Out>, String> {
    let url = format!("{}/rest/v1/{}", self.base_url, table);
    let res = self.client.post(&url)
      .header(USER_AGENT, "writelevel-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header("apikey", &self.anon_key)
      .header(AUTHORIZATION, format!("Bearer {}", bearer))
      .header("Prefer", "return=representation")
      .json(row).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(format!("Supabase {} HTTP {}: {}", table, status, trunc_for_log(&body, 300)));
    }

    res.json::<Vec<Out>>().await.map_err(|e| e.to_string())
  }

  async fn select<Out: DeserializeOwned>(
    &self,
    bearer: &str,
    query: &[(&str, String)],
  ) -> Result<Vec<Out>, String> {
    let url = format!("{}/rest/v1/evaluation_results", self.base_url);
    let res = self.client.get(&url)
      .query(query)
      .header(USER_AGENT, "writelevel-backend/0.1")
      .header("apikey", &self.anon_key)
      .header(AUTHORIZATION, format!("Bearer {}", bearer))
      .send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(format!("Supabase evaluation_results HTTP {}: {}", status, trunc_for_log(&body, 300)));
    }

    res.json::<Vec<Out>>().await.map_err(|e| e.to_string())
  }
}
