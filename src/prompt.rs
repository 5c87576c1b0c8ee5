//! Assembling the grading instruction sent to the model.
//!
//! The instruction interpolates level, tasks, the student's response and the
//! level rubric into `Prompts::instruction_template`; the JSON schema contract
//! travels alongside so callers decide how to attach it to the chat turn.

use std::sync::Arc;

use crate::catalog::PromptCatalog;
use crate::config::Prompts;
use crate::domain::ProficiencyLevel;
use crate::errors::EvalError;
use crate::util::fill_template;

/// Everything needed to ask the model for one evaluation.
#[derive(Clone, Debug)]
pub struct BuiltPrompt {
  pub level: ProficiencyLevel,
  pub instruction: String,
  pub schema_contract: String,
}

/// Stateless prompt assembly over a shared catalog + prompt set.
#[derive(Clone)]
pub struct PromptBuilder {
  catalog: Arc<PromptCatalog>,
  prompts: Arc<Prompts>,
}

impl PromptBuilder {
  pub fn new(catalog: Arc<PromptCatalog>, prompts: Arc<Prompts>) -> Self {
    Self { catalog, prompts }
  }

  pub fn catalog(&self) -> &PromptCatalog {
    &self.catalog
  }

  pub fn prompts(&self) -> &Prompts {
    &self.prompts
  }

  /// Build the instruction for `level_code`. Unknown codes are hard errors;
  /// no template text is produced for them.
  pub fn build(&self, level_code: &str, user_response: &str) -> Result<BuiltPrompt, EvalError> {
    let (level, template) = self.catalog.lookup(level_code)?;
    let tasks = template.tasks.join(", ");
    let instruction = fill_template(
      &self.prompts.instruction_template,
      &[
        ("level", level.code()),
        ("tasks", &tasks),
        ("response", user_response),
        ("rubric", &template.rubric),
        ("directive", &self.prompts.directive),
      ],
    );
    Ok(BuiltPrompt { level, instruction, schema_contract: self.prompts.schema_contract.clone() })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn builder() -> PromptBuilder {
    PromptBuilder::new(
      Arc::new(PromptCatalog::from_config(&[])),
      Arc::new(Prompts::default()),
    )
  }

  #[test]
  fn instruction_interpolates_all_placeholders() {
    let b = builder();
    let built = b.build("B1", "I go to market yesterday and buy apple.").unwrap();
    assert_eq!(built.level, ProficiencyLevel::B1);
    assert!(built.instruction.contains("CEFR Level: B1"));
    assert!(built.instruction.contains("I go to market yesterday and buy apple."));
    assert!(built.instruction.contains("B1 level criteria"));
    assert!(built.instruction.contains("Suggested CEFR sub-level"));
    assert!(!built.instruction.contains('{'));
  }

  #[test]
  fn same_inputs_build_the_same_prompt() {
    let b = builder();
    let one = b.build("A2", "My family is big.").unwrap();
    let two = b.build("A2", "My family is big.").unwrap();
    assert_eq!(one.instruction, two.instruction);
    assert_eq!(one.schema_contract, two.schema_contract);
  }

  #[test]
  fn schema_contract_does_not_depend_on_level() {
    let b = builder();
    let contracts: Vec<String> = ProficiencyLevel::ALL
      .iter()
      .map(|l| b.build(l.code(), "text").unwrap().schema_contract)
      .collect();
    assert!(contracts.windows(2).all(|w| w[0] == w[1]));
  }

  #[test]
  fn unknown_level_code_is_rejected_before_any_templating() {
    let b = builder();
    match b.build("Z9", "whatever") {
      Err(EvalError::UnsupportedLevel(code)) => assert_eq!(code, "Z9"),
      other => panic!("expected UnsupportedLevel, got {:?}", other.map(|p| p.instruction)),
    }
  }

  #[test]
  fn empty_response_still_builds() {
    let b = builder();
    let built = b.build("C1", "").unwrap();
    assert!(built.instruction.contains("User Response: \n"));
  }
}
