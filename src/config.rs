//! Configuration for the search cascade.
//!
//! One TOML file holds every tunable: the source table, cascade policy,
//! credibility and cross-reference settings, document scoring, the
//! open-web transport and the optional LLM endpoint. Every section has
//! defaults, so an empty file is a valid configuration.

use std::collections::HashSet;
use std::path::PathBuf;

use civic_web::WebSearchConfig;
use serde::{Deserialize, Serialize};

use crate::cascade::CascadeSettings;
use crate::credibility::CredibilitySettings;
use crate::crossref::CrossReferenceSettings;
use crate::documents::DocumentScoringSettings;
use crate::error::CascadeError;
use crate::llm::LlmEndpointConfig;
use crate::types::{SourceConfig, SourceType};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Source table. Order within a priority is the reporting order.
    pub sources: Vec<SourceConfig>,
    pub cascade: CascadeSettings,
    pub credibility: CredibilitySettings,
    pub cross_reference: CrossReferenceSettings,
    pub documents: DocumentScoringSettings,
    pub web: WebSearchConfig,
    /// LLM used for content-quality assessment. Absent means assessments
    /// use neutral content scores.
    pub llm: Option<LlmEndpointConfig>,
    /// TTL of the per-adapter response caches; 0 disables caching.
    pub cache_ttl_seconds: u64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            cascade: CascadeSettings::default(),
            credibility: CredibilitySettings::default(),
            cross_reference: CrossReferenceSettings::default(),
            documents: DocumentScoringSettings::default(),
            web: WebSearchConfig::default(),
            llm: None,
            cache_ttl_seconds: 300,
        }
    }
}

/// The default source table: local documents first, then the fast
/// registries, the slower registries, the open web, and deep research
/// (disabled).
pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new(SourceType::LocalIndex, 0).with_timeout_ms(2_000),
        SourceConfig::new(SourceType::LegalActs, 1),
        SourceConfig::new(SourceType::Statistics, 1),
        SourceConfig::new(SourceType::BusinessRegistry, 2).with_min_results(5),
        SourceConfig::new(SourceType::Spatial, 2).with_min_results(5),
        SourceConfig::new(SourceType::Web, 3)
            .with_timeout_ms(8_000)
            .with_min_results(5),
        SourceConfig::new(SourceType::DeepResearch, 4)
            .with_timeout_ms(30_000)
            .with_min_results(1)
            .with_enabled(false),
    ]
}

/// Check a source table: non-empty, each source at most once, non-zero
/// timeouts.
pub fn validate_sources(sources: &[SourceConfig]) -> Result<(), String> {
    if sources.is_empty() {
        return Err("at least one source must be configured".into());
    }
    let mut seen = HashSet::new();
    for source in sources {
        if !seen.insert(source.source_type) {
            return Err(format!("source {} is configured twice", source.source_type));
        }
        if source.timeout_ms == 0 {
            return Err(format!("source {} has a zero timeout", source.source_type));
        }
    }
    Ok(())
}

impl CascadeConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::Config`] naming the first invalid setting.
    pub fn validate(&self) -> crate::Result<()> {
        validate_sources(&self.sources).map_err(CascadeError::Config)?;
        self.cascade.validate().map_err(CascadeError::Config)?;
        self.credibility.validate().map_err(CascadeError::Config)?;
        self.cross_reference.validate().map_err(CascadeError::Config)?;
        self.documents.validate().map_err(CascadeError::Config)?;
        self.web
            .validate()
            .map_err(|e| CascadeError::Config(e.to_string()))?;
        Ok(())
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CascadeError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CascadeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `$XDG_CONFIG_HOME/civic-search/config.toml`, else
    /// `~/.config/civic-search/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("civic-search").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("civic-search")
                .join("config.toml")
        } else {
            PathBuf::from("civic-search.toml")
        }
    }
}
