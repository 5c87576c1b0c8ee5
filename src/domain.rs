//! Domain models used by the backend: proficiency levels, prompt templates,
//! and the decoded evaluation result.

use serde::{Deserialize, Serialize};

use crate::errors::EvalError;

/// The six CEFR proficiency levels, lowest to highest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProficiencyLevel {
  A1,
  A2,
  B1,
  B2,
  C1,
  C2,
}

impl ProficiencyLevel {
  /// Every level in ascending order. The prompt catalog is total over this set.
  pub const ALL: [ProficiencyLevel; 6] = [
    ProficiencyLevel::A1,
    ProficiencyLevel::A2,
    ProficiencyLevel::B1,
    ProficiencyLevel::B2,
    ProficiencyLevel::C1,
    ProficiencyLevel::C2,
  ];

  /// Parse a level code ("A1".."C2"). Any other string is a hard error;
  /// callers own the decision to fall back to a default, not this type.
  pub fn from_code(code: &str) -> Result<Self, EvalError> {
    match code {
      "A1" => Ok(ProficiencyLevel::A1),
      "A2" => Ok(ProficiencyLevel::A2),
      "B1" => Ok(ProficiencyLevel::B1),
      "B2" => Ok(ProficiencyLevel::B2),
      "C1" => Ok(ProficiencyLevel::C1),
      "C2" => Ok(ProficiencyLevel::C2),
      _ => Err(EvalError::UnsupportedLevel(code.to_string())),
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      ProficiencyLevel::A1 => "A1",
      ProficiencyLevel::A2 => "A2",
      ProficiencyLevel::B1 => "B1",
      ProficiencyLevel::B2 => "B2",
      ProficiencyLevel::C1 => "C1",
      ProficiencyLevel::C2 => "C2",
    }
  }
}

impl std::fmt::Display for ProficiencyLevel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.code())
  }
}

/// Writing tasks plus the grading rubric for one level. Immutable after
/// startup; content comes from the built-in table or TOML overrides.
#[derive(Clone, Debug)]
pub struct PromptTemplate {
  pub tasks: Vec<String>,
  pub rubric: String,
}

/// Decoded outcome of one evaluation.
///
/// `score` is meant to be 0-100 and `cefr` one of the six codes, but the
/// decoder does not enforce either: values come back exactly as the model
/// produced them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
  pub score: i64,
  pub cefr: String,
  pub feedback: Feedback,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
  pub strengths: Vec<String>,
  pub areas_for_improvement: Vec<String>,
  pub suggested_sub_level: String,
}

impl EvaluationResult {
  /// Sentinel returned whenever the backend yields no decodable evaluation.
  /// Plausible-looking but empty: zero score, no feedback items.
  pub fn fallback() -> Self {
    EvaluationResult {
      score: 0,
      cefr: "No CEFR level available".into(),
      feedback: Feedback {
        strengths: Vec::new(),
        areas_for_improvement: Vec::new(),
        suggested_sub_level: "No evaluation result available.".into(),
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_code_round_trips() {
    for level in ProficiencyLevel::ALL {
      let parsed = ProficiencyLevel::from_code(level.code()).expect("known code");
      assert_eq!(parsed, level);
    }
  }

  #[test]
  fn unknown_codes_are_hard_errors() {
    for code in ["Z9", "a1", "B3", "", "Level unavailable"] {
      let got = ProficiencyLevel::from_code(code);
      assert!(
        matches!(got, Err(EvalError::UnsupportedLevel(ref c)) if c == code),
        "expected UnsupportedLevel for {code:?}"
      );
    }
  }

  #[test]
  fn fallback_is_the_documented_sentinel() {
    let fb = EvaluationResult::fallback();
    assert_eq!(fb.score, 0);
    assert_eq!(fb.cefr, "No CEFR level available");
    assert!(fb.feedback.strengths.is_empty());
    assert!(fb.feedback.areas_for_improvement.is_empty());
    assert_eq!(fb.feedback.suggested_sub_level, "No evaluation result available.");
  }
}
