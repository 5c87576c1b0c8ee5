//! HTTP endpoint handlers. These are thin wrappers that forward to the
//! evaluation pipeline and storage. Each handler is instrumented and logs
//! parameters and basic result info.
//!
//! Persistence is strictly best-effort on the evaluate path: a storage or
//! auth failure is logged and the evaluation is still returned.

use std::sync::Arc;
use axum::extract::{Path, Query, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::{Json, response::IntoResponse};
use tracing::{error, info, instrument};

use crate::domain::ProficiencyLevel;
use crate::evaluation::evaluate;
use crate::protocol::*;
use crate::state::AppState;
use crate::util::{validate_inputs, ValidationField, IS_NOT_EMPTY};

/// Pulls the raw token out of an `Authorization: Bearer ...` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
  headers
    .get(AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(str::to_string)
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info")]
pub async fn http_get_levels() -> impl IntoResponse {
  let levels: Vec<&'static str> = ProficiencyLevel::ALL.iter().map(|l| l.code()).collect();
  Json(LevelsOut { levels })
}

#[instrument(level = "info", skip(state), fields(level = %q.level))]
pub async fn http_get_prompts(
  State(state): State<Arc<AppState>>,
  Query(q): Query<PromptsQuery>,
) -> impl IntoResponse {
  match state.builder.catalog().lookup(&q.level) {
    Ok((level, template)) => {
      info!(target: "evaluation", %level, tasks = template.tasks.len(), "HTTP prompts served");
      Json(PromptsOut { level: level.code().to_string(), tasks: template.tasks.clone() })
        .into_response()
    }
    Err(e) => {
      (StatusCode::BAD_REQUEST, Json(ErrorOut { message: e.to_string() })).into_response()
    }
  }
}

#[instrument(level = "info", skip(state, headers, body), fields(level = %body.level, response_len = body.response.len()))]
pub async fn http_post_evaluate(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<EvaluateIn>,
) -> impl IntoResponse {
  let fields = [
    ValidationField { value: &body.level, rules: &[IS_NOT_EMPTY], field_name: "Level" },
    ValidationField { value: &body.response, rules: &[IS_NOT_EMPTY], field_name: "Response" },
  ];
  if let Err(message) = validate_inputs(&fields) {
    return (StatusCode::BAD_REQUEST, Json(ErrorOut { message })).into_response();
  }

  let result = match evaluate(&state.builder, state.mistral.as_ref(), &body.level, &body.response).await {
    Ok(r) => r,
    Err(e) => {
      return (StatusCode::BAD_REQUEST, Json(ErrorOut { message: e.to_string() })).into_response();
    }
  };

  let mut session_id = None;
  let mut result_id = None;
  if let (Some(storage), Some(token)) = (&state.storage, bearer_token(&headers)) {
    match storage.authenticated_user(&token).await {
      Ok(user) => {
        match storage.save_session(&token, &user.id, &body.level, &body.response).await {
          Ok(session) => session_id = Some(session.id),
          Err(e) => {
            error!(target: "writelevel_backend", error = %e, "Failed to save session; returning evaluation anyway");
          }
        }
        let feedback_json =
          serde_json::to_string(&result.feedback).unwrap_or_else(|_| "{}".into());
        match storage
          .save_evaluation(&token, &user.id, session_id, &body.level, result.score, &feedback_json)
          .await
        {
          Ok(record) => result_id = Some(record.id),
          Err(e) => {
            error!(target: "writelevel_backend", error = %e, "Failed to save evaluation result; returning evaluation anyway");
          }
        }
      }
      Err(e) => {
        error!(target: "writelevel_backend", error = %e, "Bearer token rejected; evaluation not persisted");
      }
    }
  }

  info!(target: "evaluation", level = %body.level, score = result.score, persisted = result_id.is_some(), "HTTP evaluation served");
  Json(EvaluateOut { result, session_id, result_id }).into_response()
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_get_results(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> impl IntoResponse {
  let Some(storage) = &state.storage else {
    return (
      StatusCode::SERVICE_UNAVAILABLE,
      Json(ErrorOut { message: "Storage backend not configured".into() }),
    )
      .into_response();
  };
  let Some(token) = bearer_token(&headers) else {
    return (
      StatusCode::UNAUTHORIZED,
      Json(ErrorOut { message: "Missing bearer token".into() }),
    )
      .into_response();
  };
  let user = match storage.authenticated_user(&token).await {
    Ok(u) => u,
    Err(e) => {
      error!(target: "writelevel_backend", error = %e, "Bearer token rejected on results fetch");
      return (StatusCode::UNAUTHORIZED, Json(ErrorOut { message: "Invalid session".into() }))
        .into_response();
    }
  };
  match storage.results_for_user(&token, &user.id).await {
    Ok(results) => {
      info!(target: "evaluation", user = %user.id, rows = results.len(), "HTTP results served");
      Json(ResultsOut { email: user.email, results }).into_response()
    }
    Err(e) => {
      error!(target: "writelevel_backend", error = %e, "Failed to fetch evaluation history");
      (StatusCode::BAD_GATEWAY, Json(ErrorOut { message: "Error fetching results".into() }))
        .into_response()
    }
  }
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_get_result_detail(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i64>,
  headers: HeaderMap,
) -> impl IntoResponse {
  let Some(storage) = &state.storage else {
    return (
      StatusCode::SERVICE_UNAVAILABLE,
      Json(ErrorOut { message: "Storage backend not configured".into() }),
    )
      .into_response();
  };
  let Some(token) = bearer_token(&headers) else {
    return (
      StatusCode::UNAUTHORIZED,
      Json(ErrorOut { message: "Missing bearer token".into() }),
    )
      .into_response();
  };
  let user = match storage.authenticated_user(&token).await {
    Ok(u) => u,
    Err(e) => {
      error!(target: "writelevel_backend", error = %e, "Bearer token rejected on result detail fetch");
      return (StatusCode::UNAUTHORIZED, Json(ErrorOut { message: "Invalid session".into() }))
        .into_response();
    }
  };
  match storage.result_detail(&token, &user.id, id).await {
    Ok(Some(record)) => Json(record).into_response(),
    Ok(None) => {
      (StatusCode::NOT_FOUND, Json(ErrorOut { message: "Result not found".into() }))
        .into_response()
    }
    Err(e) => {
      error!(target: "writelevel_backend", error = %e, id, "Failed to fetch result detail");
      (StatusCode::BAD_GATEWAY, Json(ErrorOut { message: "Error fetching results".into() }))
        .into_response()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use crate::catalog::PromptCatalog;
  use crate::config::Prompts;
  use crate::prompt::PromptBuilder;

  fn offline_state() -> Arc<AppState> {
    Arc::new(AppState {
      builder: PromptBuilder::new(
        Arc::new(PromptCatalog::from_config(&[])),
        Arc::new(Prompts::default()),
      ),
      mistral: None,
      storage: None,
    })
  }

  fn headers_with_auth(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value.parse().unwrap());
    headers
  }

  #[test]
  fn bearer_token_extraction() {
    assert_eq!(bearer_token(&headers_with_auth("Bearer abc123")).as_deref(), Some("abc123"));
    assert_eq!(bearer_token(&headers_with_auth("Bearer   abc123  ")).as_deref(), Some("abc123"));
    assert!(bearer_token(&headers_with_auth("Bearer ")).is_none());
    assert!(bearer_token(&headers_with_auth("Basic abc123")).is_none());
    assert!(bearer_token(&HeaderMap::new()).is_none());
  }

  #[tokio::test]
  async fn health_answers_ok() {
    let res = http_health().await.into_response();
    assert_eq!(res.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn levels_answers_ok() {
    let res = http_get_levels().await.into_response();
    assert_eq!(res.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn prompts_reject_unknown_levels() {
    let res = http_get_prompts(State(offline_state()), Query(PromptsQuery { level: "Z9".into() }))
      .await
      .into_response();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn prompts_serve_known_levels() {
    let res = http_get_prompts(State(offline_state()), Query(PromptsQuery { level: "B1".into() }))
      .await
      .into_response();
    assert_eq!(res.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn evaluate_rejects_blank_responses() {
    let body = EvaluateIn { level: "B1".into(), response: "   ".into() };
    let res = http_post_evaluate(State(offline_state()), HeaderMap::new(), Json(body))
      .await
      .into_response();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn evaluate_rejects_unknown_levels() {
    let body = EvaluateIn { level: "D7".into(), response: "A fine essay.".into() };
    let res = http_post_evaluate(State(offline_state()), HeaderMap::new(), Json(body))
      .await
      .into_response();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn evaluate_serves_the_fallback_without_a_model() {
    let body = EvaluateIn { level: "B1".into(), response: "A fine essay.".into() };
    let res = http_post_evaluate(State(offline_state()), HeaderMap::new(), Json(body))
      .await
      .into_response();
    assert_eq!(res.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn results_require_configured_storage() {
    let res = http_get_results(State(offline_state()), HeaderMap::new()).await.into_response();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
  }

  #[tokio::test]
  async fn result_detail_requires_configured_storage() {
    let res = http_get_result_detail(State(offline_state()), Path(7), HeaderMap::new())
      .await
      .into_response();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
  }
}
