//! The per-level bank of writing tasks and grading rubrics.
//!
//! Built-in templates cover all six CEFR levels; TOML overrides from
//! `AssessmentConfig` can replace tasks and/or rubric per level.

use tracing::{info, error};

use crate::config::LevelCfg;
use crate::domain::{ProficiencyLevel, PromptTemplate};
use crate::errors::EvalError;

/// One template per proficiency level, indexed by the level's ordinal.
/// Every level always has a template, so lookups cannot miss.
pub struct PromptCatalog {
  templates: [PromptTemplate; 6],
}

impl PromptCatalog {
  /// Start from the built-in bank and apply any TOML overrides on top.
  /// Bad override entries are logged and skipped, never fatal.
  pub fn from_config(overrides: &[LevelCfg]) -> Self {
    let mut templates = default_templates();
    for cfg in overrides {
      let level = match ProficiencyLevel::from_code(&cfg.level) {
        Ok(l) => l,
        Err(e) => {
          error!(target: "evaluation", level = %cfg.level, error = %e, "Ignoring level override with unknown code");
          continue;
        }
      };
      let tasks: Vec<String> =
        cfg.tasks.iter().filter(|t| !t.trim().is_empty()).cloned().collect();
      let rubric = cfg.rubric.as_deref().map(str::trim);
      let mut touched = false;
      if !tasks.is_empty() {
        templates[level as usize].tasks = tasks;
        touched = true;
      }
      match rubric {
        Some(r) if !r.is_empty() => {
          templates[level as usize].rubric = r.to_string();
          touched = true;
        }
        Some(_) => {
          error!(target: "evaluation", %level, "Ignoring blank rubric override");
        }
        None => {}
      }
      if !touched {
        error!(target: "evaluation", %level, "Ignoring empty level override");
      }
    }
    for level in ProficiencyLevel::ALL {
      let tpl = &templates[level as usize];
      info!(
        target: "evaluation",
        %level,
        tasks = tpl.tasks.len(),
        overridden = overrides.iter().any(|c| c.level == level.code()),
        "Prompt template ready"
      );
    }
    Self { templates }
  }

  pub fn template(&self, level: ProficiencyLevel) -> &PromptTemplate {
    &self.templates[level as usize]
  }

  /// Resolve a raw level code to its template, rejecting unknown codes.
  pub fn lookup(&self, code: &str) -> Result<(ProficiencyLevel, &PromptTemplate), EvalError> {
    let level = ProficiencyLevel::from_code(code)?;
    Ok((level, self.template(level)))
  }
}

fn default_templates() -> [PromptTemplate; 6] {
  ProficiencyLevel::ALL.map(default_template)
}

fn default_template(level: ProficiencyLevel) -> PromptTemplate {
  let (tasks, criteria): (&[&str], &[&str]) = match level {
    ProficiencyLevel::A1 => (
      &[
        "Write a short introduction about yourself. Tell me your name, where you're from, and what you like to do.",
        "Describe your favorite day of the week and why you like it.",
      ],
      &[
        "Uses basic vocabulary",
        "Simple, short sentences",
        "Basic grammatical structures",
        "Limited but clear communication",
      ],
    ),
    ProficiencyLevel::A2 => (
      &[
        "Describe your family and your daily routine.",
        "Write about a recent holiday or trip you took.",
      ],
      &[
        "More complex sentence structures",
        "Basic connecting words",
        "Ability to describe simple scenarios",
        "Some variety in vocabulary",
      ],
    ),
    ProficiencyLevel::B1 => (
      &[
        "Describe a challenging situation you faced and how you overcame it.",
        "Discuss the pros and cons of living in a big city versus a small town.",
      ],
      &[
        "Connected, coherent paragraphs",
        "More advanced vocabulary",
        "Ability to express opinions",
        "Complex sentence structures",
      ],
    ),
    ProficiencyLevel::B2 => (
      &[
        "Write a review of a book, movie, or restaurant.",
        "Discuss a current event or social issue.",
      ],
      &[
        "Clear and well-structured arguments",
        "A wide range of vocabulary",
        "Ability to use different registers and styles",
        "Complex grammatical structures",
      ],
    ),
    ProficiencyLevel::C1 => (
      &[
        "Write a persuasive essay on a controversial topic.",
        "Imagine you are a famous historical figure. Write a diary entry about a significant event in your life.",
      ],
      &[
        "Sophisticated language use",
        "Ability to express nuanced ideas",
        "Effective use of rhetorical devices",
        "A high degree of accuracy in grammar and vocabulary",
      ],
    ),
    ProficiencyLevel::C2 => (
      &[
        "Write a formal letter or report.",
        "Write a creative piece of writing, such as a short story or poem.",
      ],
      &[
        "Mastery of the language",
        "Ability to produce clear, well-structured, and effective texts",
        "A wide range of vocabulary and grammatical structures",
        "The ability to adapt to different writing styles and registers",
      ],
    ),
  };
  let mut rubric = format!("Evaluate the response based on {} level criteria:", level.code());
  for c in criteria {
    rubric.push_str("\n- ");
    rubric.push_str(c);
  }
  PromptTemplate {
    tasks: tasks.iter().map(|t| t.to_string()).collect(),
    rubric,
  }
}
