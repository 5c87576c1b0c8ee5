//! The evaluation pipeline: build the prompt, call the model, decode the verdict.
//!
//! Failure policy:
//!   - Unknown level codes abort before any network traffic.
//!   - Everything after that (transport, empty reply, schema mismatch) softens
//!     to `EvaluationResult::fallback()` so a grading hiccup never takes the
//!     submission flow down.

use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::domain::EvaluationResult;
use crate::errors::EvalError;
use crate::mistral::Mistral;
use crate::prompt::PromptBuilder;
use crate::util::trunc_for_log;

/// Strict decode of the model's reply. No clamping, no field repair:
/// a reply that does not match the schema is rejected whole.
pub fn decode_evaluation(reply: &str) -> Result<EvaluationResult, EvalError> {
  Ok(serde_json::from_str(reply)?)
}

/// Grade one writing submission at the requested level.
#[instrument(
  level = "info",
  skip(builder, mistral, user_response),
  fields(%level_code, response_len = user_response.len(), submission = %Uuid::new_v4())
)]
pub async fn evaluate(
  builder: &PromptBuilder,
  mistral: Option<&Mistral>,
  level_code: &str,
  user_response: &str,
) -> Result<EvaluationResult, EvalError> {
  let prompt = builder.build(level_code, user_response)?;

  let Some(client) = mistral else {
    error!(target: "evaluation", "Mistral client not configured; returning fallback evaluation");
    return Ok(EvaluationResult::fallback());
  };

  let prompts = builder.prompts();
  let user_message = format!("{}\n\n{}", prompt.instruction, prompt.schema_contract);

  match client.grade_writing(&prompts.grader_system, &prompts.grader_assistant, &user_message).await
  {
    Ok(reply) => match decode_evaluation(&reply) {
      Ok(result) => {
        info!(target: "evaluation", level = %prompt.level, score = result.score, cefr = %result.cefr, "Evaluation decoded");
        Ok(result)
      }
      Err(e) => {
        error!(
          target: "evaluation",
          error = %e,
          reply_preview = %trunc_for_log(&reply, 200),
          "Model reply did not match the evaluation schema; returning fallback"
        );
        Ok(EvaluationResult::fallback())
      }
    },
    Err(e) => {
      error!(target: "evaluation", error = %e, "Model call failed; returning fallback evaluation");
      Ok(EvaluationResult::fallback())
    }
  }
}
