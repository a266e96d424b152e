//! Configuration types for research runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wtt_search::{RetryPolicy, SearchConfig};

use crate::error::{ResearchError, Result};
use crate::research::planner::Facet;

/// Top-level configuration for the research pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Search provider and retrieval executor settings.
    pub search: SearchConfig,
    /// Query planning settings.
    pub planner: PlannerConfig,
    /// Token budget for the research artifact.
    pub budget: BudgetConfig,
    /// Whole-pipeline deadline.
    pub pipeline: PipelineConfig,
    /// Outer build-summarize-persist retry loop.
    pub workflow: WorkflowConfig,
    /// Artifact persistence.
    pub store: StoreConfig,
}

/// Query planner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Facets to query, in priority order.
    pub facets: Vec<Facet>,
    /// Recency window for general-topic queries, in days.
    pub general_window_days: u32,
    /// Recency window for the news facet when the subject is newsworthy.
    pub news_window_days: u32,
    /// Optional domain restriction per facet tag (e.g. `documentation`).
    pub domain_filters: BTreeMap<String, Vec<String>>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            facets: Facet::ALL.to_vec(),
            general_window_days: wtt_search::types::DEFAULT_GENERAL_WINDOW_DAYS,
            news_window_days: wtt_search::types::DEFAULT_NEWS_WINDOW_DAYS,
            domain_filters: BTreeMap::new(),
        }
    }
}

/// Token budget configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Maximum tokens the combined research text may occupy.
    pub max_tokens: usize,
    /// Per-document budget. `None` splits `max_tokens` evenly across documents.
    pub per_document_tokens: Option<usize>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4_000,
            per_document_tokens: None,
        }
    }
}

/// Pipeline deadline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Deadline for retrieval across all queries, in seconds.
    ///
    /// Queries still running when it passes are cancelled and reported as
    /// failed; the artifact is built from whatever completed.
    pub timeout_seconds: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
        }
    }
}

/// Outer workflow configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Retry policy for the whole build-summarize-persist unit.
    pub retry: RetryPolicy,
}

/// Artifact store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database path. `None` uses `wtt_dirs::database_file()`.
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// The effective database path.
    pub fn database_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(crate::wtt_dirs::database_file)
    }
}

impl PlannerConfig {
    /// Validate facet list, windows and domain filter keys.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.facets.is_empty() {
            return Err(ResearchError::Config(
                "planner.facets must not be empty".into(),
            ));
        }
        let mut seen = Vec::with_capacity(self.facets.len());
        for facet in &self.facets {
            if seen.contains(facet) {
                return Err(ResearchError::Config(format!(
                    "planner.facets lists {} more than once",
                    facet.tag()
                )));
            }
            seen.push(*facet);
        }
        if self.general_window_days == 0 || self.news_window_days == 0 {
            return Err(ResearchError::Config(
                "planner recency windows must be greater than 0".into(),
            ));
        }
        if let Some(key) = self
            .domain_filters
            .keys()
            .find(|key| Facet::from_tag(key).is_none())
        {
            return Err(ResearchError::Config(format!(
                "planner.domain_filters has unknown facet: {key}"
            )));
        }
        Ok(())
    }
}

impl BudgetConfig {
    /// # Errors
    ///
    /// Returns [`ResearchError::Config`] when a budget is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(ResearchError::Config(
                "budget.max_tokens must be greater than 0".into(),
            ));
        }
        if self.per_document_tokens == Some(0) {
            return Err(ResearchError::Config(
                "budget.per_document_tokens must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// # Errors
    ///
    /// Returns [`ResearchError::Config`] when the deadline is zero.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            return Err(ResearchError::Config(
                "pipeline.timeout_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

impl WorkflowConfig {
    /// # Errors
    ///
    /// Returns [`ResearchError::Config`] for a malformed retry policy.
    pub fn validate(&self) -> Result<()> {
        self.retry
            .validate()
            .map_err(|e| ResearchError::Config(format!("workflow.retry: {e}")))
    }
}

impl ResearchConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Config`] for the first invalid section.
    pub fn validate(&self) -> Result<()> {
        self.search
            .validate()
            .map_err(|e| ResearchError::Config(format!("search: {e}")))?;
        self.planner.validate()?;
        self.budget.validate()?;
        self.pipeline.validate()?;
        self.workflow.validate()?;
        Ok(())
    }

    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ResearchError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ResearchError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/wtt/config.toml`.
    pub fn default_config_path() -> PathBuf {
        crate::wtt_dirs::config_file()
    }
}
