//! Loading assessment configuration (prompts + optional level overrides) from TOML.
//!
//! See `AssessmentConfig` and `Prompts` for expected schema.

use serde::Deserialize;
use tracing::{info, error};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AssessmentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub levels: Vec<LevelCfg>,
}

/// Level override entry accepted in TOML configuration.
/// Either `tasks`, `rubric` or both may be filled; empty entries are ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct LevelCfg {
  pub level: String,
  #[serde(default)] pub tasks: Vec<String>,
  #[serde(default)] pub rubric: Option<String>,
}

/// Prompts used by the Mistral client. Defaults are sensible for CEFR grading.
/// You can override them in TOML if you need to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub grader_system: String,
  pub grader_assistant: String,
  pub instruction_template: String,
  pub directive: String,
  pub schema_contract: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      grader_system: "You are a teacher specialized in CEFR evaluation.".into(),
      grader_assistant: "When asked to check a student's English proficiency skills, evaluate the user response for the given task. If the user gives an inconsistent response or the response is too short, make sure this affects the evaluation results and especially the final score.".into(),
      instruction_template: "CEFR Level: {level}\nEvaluation Task: {tasks}\nUser Response: {response}\n\n{rubric}\n\n{directive}".into(),
      directive: "Provide a detailed evaluation including:\n1. Overall language proficiency score (0-100)\n2. Strengths in the response\n3. Areas for improvement\n4. Suggested CEFR sub-level (e.g., A1.1, A1.2)".into(),
      schema_contract: "Reply in JSON format according to the following schema: {\"score\": the score you suggest for the evaluated student response (100 points maximum), \"cefr\": the skill level (A1, A2, B1, B2, C1 or C2) the user has according to your evaluation, \"feedback\": {\"strengths\": what are the things the student excels at, \"areas_for_improvement\": what the student can do to improve the proficiency level, \"suggested_sub_level\": the sublevel you suggest according to your evaluation}}".into(),
    }
  }
}

/// Attempt to load `AssessmentConfig` from ASSESSMENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_assessment_config_from_env() -> Option<AssessmentConfig> {
  let path = std::env::var("ASSESSMENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AssessmentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "writelevel_backend", %path, "Loaded assessment config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "writelevel_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "writelevel_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_level_overrides_and_defaults_prompts() {
    let toml_src = r#"
      [[levels]]
      level = "B1"
      tasks = ["Write about your hometown."]
      rubric = "Evaluate coherence and vocabulary range."

      [[levels]]
      level = "C2"
    "#;
    let cfg: AssessmentConfig = toml::from_str(toml_src).unwrap();
    assert_eq!(cfg.levels.len(), 2);
    assert_eq!(cfg.levels[0].level, "B1");
    assert_eq!(cfg.levels[0].tasks, vec!["Write about your hometown.".to_string()]);
    assert_eq!(cfg.levels[0].rubric.as_deref(), Some("Evaluate coherence and vocabulary range."));
    assert!(cfg.levels[1].tasks.is_empty());
    assert!(cfg.levels[1].rubric.is_none());
    // prompts section omitted entirely -> defaults kick in
    assert!(cfg.prompts.grader_system.contains("CEFR"));
  }

  #[test]
  fn default_prompts_carry_the_evaluation_scaffolding() {
    let prompts = Prompts::default();
    assert!(prompts.instruction_template.contains("{level}"));
    assert!(prompts.instruction_template.contains("{tasks}"));
    assert!(prompts.instruction_template.contains("{response}"));
    assert!(prompts.instruction_template.contains("{rubric}"));
    assert!(prompts.instruction_template.contains("{directive}"));
    assert!(prompts.directive.contains("score (0-100)"));
    assert!(prompts.schema_contract.contains("\"score\""));
    assert!(prompts.schema_contract.contains("\"suggested_sub_level\""));
  }

  #[test]
  fn empty_document_parses_to_defaults() {
    let cfg: AssessmentConfig = toml::from_str("").unwrap();
    assert!(cfg.levels.is_empty());
    assert!(cfg.prompts.grader_assistant.contains("proficiency"));
  }
}
