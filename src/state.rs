//! Application state: prompt catalog, prompt builder, and optional clients.
//!
//! This module owns:
//!   - the per-level prompt catalog (built-ins merged with TOML overrides)
//!   - the prompts struct (from TOML or defaults)
//!   - optional Mistral client
//!   - optional Supabase storage client
//!
//! Both clients are optional on purpose. Without Mistral the pipeline serves
//! fallback evaluations; without Supabase nothing is persisted.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::catalog::PromptCatalog;
use crate::config::load_assessment_config_from_env;
use crate::mistral::Mistral;
use crate::prompt::PromptBuilder;
use crate::storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub builder: PromptBuilder,
    pub mistral: Option<Mistral>,
    pub storage: Option<Storage>,
}

impl AppState {
    /// Build state from env: load config, merge the catalog, init clients.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_assessment_config_from_env().unwrap_or_default();
        let catalog = Arc::new(PromptCatalog::from_config(&cfg.levels));
        let prompts = Arc::new(cfg.prompts);
        let builder = PromptBuilder::new(catalog, prompts);

        let mistral = Mistral::from_env();
        if let Some(m) = &mistral {
            info!(target: "writelevel_backend", base_url = %m.base_url, model = %m.model, "Mistral enabled.");
        } else {
            info!(target: "writelevel_backend", "Mistral disabled (no MISTRAL_API_KEY). Serving fallback evaluations.");
        }

        let storage = Storage::from_env();
        if let Some(s) = &storage {
            info!(target: "writelevel_backend", base_url = %s.base_url, "Supabase storage enabled.");
        } else {
            info!(target: "writelevel_backend", "Supabase storage disabled (no SUPABASE_URL/SUPABASE_ANON_KEY). Results will not be persisted.");
        }

        Self { builder, mistral, storage }
    }
}
