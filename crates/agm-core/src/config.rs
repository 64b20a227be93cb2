//! AGM configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file is a
//! valid configuration:
//!
//! ```toml
//! [promotion]
//! max_rounds = 10
//! shared_label = "Shared Resources"
//! selector = "shared"
//! address = "file_stem"
//!
//! [selectors.shared]
//! kind = "priority"
//! groups = ["Shared", "Common"]
//!
//! [logging]
//! filter = "info"
//! ```

use crate::driver::MAX_PROMOTION_ROUNDS;
use crate::error::ConfigError;
use agm_asset::{
    AddressSimplifier, FileStemSimplifier, IdentitySimplifier, SHARED_RESOURCES_LABEL,
};
use agm_selector::{SelectorConfig, SelectorRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgmConfig {
    /// Promotion driver settings
    pub promotion: PromotionConfig,
    /// Named group selectors
    pub selectors: BTreeMap<String, SelectorConfig>,
    /// Log filter
    pub logging: LoggingConfig,
}

/// Promotion driver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionConfig {
    /// Round cap; never above [`MAX_PROMOTION_ROUNDS`]
    pub max_rounds: usize,
    /// Label added to every promoted asset
    pub shared_label: String,
    /// Name of the selector in [`AgmConfig::selectors`]
    pub selector: String,
    /// How promoted assets are addressed
    pub address: AddressMode,
}

/// Built-in address simplifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressMode {
    /// File name without extension
    #[default]
    FileStem,
    /// Path unchanged
    Identity,
}

impl AddressMode {
    /// Simplifier for this mode
    #[must_use]
    pub fn simplifier(self) -> Box<dyn AddressSimplifier> {
        match self {
            Self::FileStem => Box::new(FileStemSimplifier),
            Self::Identity => Box::new(IdentitySimplifier),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` env-filter directive
    pub filter: String,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            max_rounds: MAX_PROMOTION_ROUNDS,
            shared_label: SHARED_RESOURCES_LABEL.to_string(),
            selector: "shared".to_string(),
            address: AddressMode::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Default for AgmConfig {
    fn default() -> Self {
        Self {
            promotion: PromotionConfig::default(),
            selectors: BTreeMap::from([(
                "shared".to_string(),
                SelectorConfig::Constant {
                    group: "Shared".to_string(),
                },
            )]),
            logging: LoggingConfig::default(),
        }
    }
}

impl AgmConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and validate a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError`] on I/O, parse or validation failure
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// Returns [`ConfigError`] on parse or validation failure
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownSelector`] if the promotion selector is
    /// not configured, [`ConfigError::PathSelectorForPromotion`] if it is a
    /// pattern selector, or [`ConfigError::Selector`] if one cannot be built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.selectors.get(&self.promotion.selector) {
            None => return Err(ConfigError::UnknownSelector(self.promotion.selector.clone())),
            Some(SelectorConfig::Pattern { .. }) => {
                return Err(ConfigError::PathSelectorForPromotion(
                    self.promotion.selector.clone(),
                ))
            }
            Some(_) => {}
        }
        for (name, selector) in &self.selectors {
            selector.build().map_err(|source| ConfigError::Selector {
                name: name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Round cap actually used: at least one, at most [`MAX_PROMOTION_ROUNDS`]
    #[must_use]
    pub fn effective_max_rounds(&self) -> usize {
        self.promotion.max_rounds.clamp(1, MAX_PROMOTION_ROUNDS)
    }

    /// Build every configured selector
    ///
    /// # Errors
    /// Returns [`ConfigError::Selector`] for the first bad selector
    pub fn selector_registry(&self) -> Result<SelectorRegistry, ConfigError> {
        let mut registry = SelectorRegistry::new();
        for (name, config) in &self.selectors {
            let selector = config.build().map_err(|source| ConfigError::Selector {
                name: name.clone(),
                source,
            })?;
            registry.register(name.clone(), selector);
        }
        Ok(registry)
    }

    /// With round cap
    #[inline]
    #[must_use]
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.promotion.max_rounds = rounds;
        self
    }

    /// With shared label
    #[inline]
    #[must_use]
    pub fn with_shared_label(mut self, label: impl Into<String>) -> Self {
        self.promotion.shared_label = label.into();
        self
    }

    /// With a named selector, made the promotion selector
    #[must_use]
    pub fn with_selector(mut self, name: impl Into<String>, selector: SelectorConfig) -> Self {
        let name = name.into();
        self.selectors.insert(name.clone(), selector);
        self.promotion.selector = name;
        self
    }

    /// With address mode
    #[inline]
    #[must_use]
    pub fn with_address_mode(mut self, mode: AddressMode) -> Self {
        self.promotion.address = mode;
        self
    }

    /// With log filter
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.logging.filter = filter.into();
        self
    }
}
