//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::EvaluationResult;
use crate::storage::EvaluationRecord;

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct LevelsOut {
    pub levels: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct PromptsQuery {
    pub level: String,
}

#[derive(Serialize)]
pub struct PromptsOut {
    pub level: String,
    pub tasks: Vec<String>,
}

#[derive(Deserialize)]
pub struct EvaluateIn {
    pub level: String,
    pub response: String,
}

#[derive(Serialize)]
pub struct EvaluateOut {
    pub result: EvaluationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_id: Option<i64>,
}

#[derive(Serialize)]
pub struct ResultsOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub results: Vec<EvaluationRecord>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}
