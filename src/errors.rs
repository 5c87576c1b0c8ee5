//! Failure taxonomy of the evaluation pipeline.
//!
//! `UnsupportedLevel` is the only hard error: it is raised before any network
//! activity and surfaces to the caller. The soft variants (no reply, reply
//! that does not decode, transport trouble) all collapse into the fallback
//! evaluation inside the evaluator and never reach the user as errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
  /// Requested level code is not one of the six CEFR codes.
  #[error("Unsupported CEFR level: {0}")]
  UnsupportedLevel(String),

  /// The completion backend answered without any usable reply text
  /// (no choices, or a choice without a string content field).
  #[error("completion backend returned no reply text")]
  NoReply,

  /// Reply text was present but did not decode into the expected
  /// evaluation shape (invalid JSON, or missing/mistyped fields).
  #[error("reply did not match the expected evaluation shape: {0}")]
  MalformedReply(#[from] serde_json::Error),

  /// The call to the completion backend itself failed (connect, TLS,
  /// timeout, or a non-success HTTP status).
  #[error("completion backend call failed: {0}")]
  Transport(String),
}
