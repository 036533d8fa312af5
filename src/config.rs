//! Configuration loading.
//!
//! The default configuration file is `oxidized-sf-audit.toml` in the current
//! working directory. Every section is optional:
//!
//! ```toml
//! [strict]
//! enabled = true            # WARNING/MODERATE issues block too
//!
//! [thresholds]              # percent below which the verdict is "warning"
//! apex = 67
//! flow = 80
//! data = 60
//!
//! [detectors]
//! disabled = ["apex/naming"]
//!
//! [penalties]               # per-check deduction overrides
//! "apex/soql-in-loop" = 15
//!
//! [budgets.apex]            # per-category max points
//! documentation = 5
//!
//! [[ratings.flow]]           # replaces the whole rating scale for a kind
//! min_percent = 85
//! label = "Ship it"
//!
//! [[ratings.flow]]
//! min_percent = 0
//! label = "Rework"
//! ```
//!
//! ```rust,no_run
//! use oxidized_sf_audit::config::Config;
//! use oxidized_sf_audit::rubric::ArtifactKind;
//!
//! let config = Config::load(None).expect("failed to load config");
//! let validator = config.validator(ArtifactKind::Apex).expect("invalid rubric");
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use crate::detectors::{self, Penalties};
use crate::engine::Validator;
use crate::error::ConfigError;
use crate::rubric::{ArtifactKind, Category, RatingScale, RatingTier, Rubric};

/// File name looked up in the current directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "oxidized-sf-audit.toml";

/// Main configuration.
///
/// All fields carry defaults so the config file can be omitted entirely.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Config {
    /// When strict mode is enabled, WARNING and MODERATE issues block.
    pub strict: StrictConfig,
    pub thresholds: ThresholdsConfig,
    pub detectors: DetectorsConfig,
    /// Per-check deduction overrides, keyed by check id.
    pub penalties: Penalties,
    pub budgets: BudgetsConfig,
    pub ratings: RatingsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct StrictConfig {
    pub enabled: bool,
}

/// Score percentage below which a non-blocked artifact gets a warning.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    pub apex: u32,
    pub flow: u32,
    pub data: u32,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        ThresholdsConfig {
            apex: 67,
            flow: 80,
            data: 60,
        }
    }
}

/// Detector toggles. Every detector defaults to enabled.
///
/// ```toml
/// [detectors]
/// disabled = ["apex/documentation", "flow/design"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct DetectorsConfig {
    pub disabled: Vec<String>,
}

/// Per-kind budget overrides, keyed by category key (`clean_code`, ...).
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct BudgetsConfig {
    pub apex: BTreeMap<String, u32>,
    pub flow: BTreeMap<String, u32>,
    pub data: BTreeMap<String, u32>,
}

impl BudgetsConfig {
    pub fn for_kind(&self, kind: ArtifactKind) -> &BTreeMap<String, u32> {
        match kind {
            ArtifactKind::Apex => &self.apex,
            ArtifactKind::Flow => &self.flow,
            ArtifactKind::Data => &self.data,
        }
    }
}

/// Per-kind rating scale replacements. Tiers are listed best first and the
/// last one must start at 0%.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct RatingsConfig {
    pub apex: Option<Vec<RatingTier>>,
    pub flow: Option<Vec<RatingTier>>,
    pub data: Option<Vec<RatingTier>>,
}

impl RatingsConfig {
    pub fn for_kind(&self, kind: ArtifactKind) -> Option<&Vec<RatingTier>> {
        match kind {
            ArtifactKind::Apex => self.apex.as_ref(),
            ArtifactKind::Flow => self.flow.as_ref(),
            ArtifactKind::Data => self.data.as_ref(),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// Resolution order:
    /// 1. If `path` is `Some`, load from that file (error if missing).
    /// 2. If `path` is `None`, try `oxidized-sf-audit.toml` in the current directory.
    /// 3. If that file does not exist either, return [`Config::default()`].
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotFound`] when the explicit path does not exist.
    /// - [`ConfigError::Read`] when the file cannot be read.
    /// - [`ConfigError::Parse`] when the TOML content fails to parse.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let config_path = match path {
            Some(p) if p.exists() => Some(p.to_path_buf()),
            Some(p) => return Err(ConfigError::NotFound(p.to_path_buf())),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                default_path.exists().then(|| default_path.to_path_buf())
            }
        };

        match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(&path).map_err(|source| {
                    ConfigError::Read {
                        path: path.clone(),
                        source,
                    }
                })?;
                toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
            }
            None => Ok(Config::default()),
        }
    }

    /// Returns `true` if the named detector is enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxidized_sf_audit::config::Config;
    ///
    /// let mut config = Config::default();
    /// assert!(config.is_detector_enabled("apex/naming"));
    /// config.detectors.disabled.push("apex/naming".into());
    /// assert!(!config.is_detector_enabled("apex/naming"));
    /// ```
    pub fn is_detector_enabled(&self, name: &str) -> bool {
        !self.detectors.disabled.iter().any(|d| d == name)
    }

    pub fn threshold(&self, kind: ArtifactKind) -> u32 {
        match kind {
            ArtifactKind::Apex => self.thresholds.apex,
            ArtifactKind::Flow => self.thresholds.flow,
            ArtifactKind::Data => self.thresholds.data,
        }
    }

    /// Builds the active rubric for `kind`: built-in tables with this
    /// config's budget, rating and penalty overrides applied.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownCategory`] for a budget key that names no
    /// category, any error from [`RatingScale::new`] for a replaced scale,
    /// or any error from [`Rubric::validate`].
    pub fn rubric(&self, kind: ArtifactKind) -> Result<Rubric, ConfigError> {
        let mut rubric = Rubric::for_kind(kind);
        for (name, points) in self.budgets.for_kind(kind) {
            let category = Category::from_key(name).ok_or_else(|| ConfigError::UnknownCategory {
                kind,
                name: name.clone(),
            })?;
            rubric.set_budget(category, *points);
        }
        if let Some(tiers) = self.ratings.for_kind(kind) {
            rubric.scale = RatingScale::new(tiers.clone())?;
        }
        rubric.penalties = self.penalties.clone();
        rubric.validate()?;
        Ok(rubric)
    }

    /// Builds a validator for `kind` with disabled detectors removed.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownDetector`] when `[detectors] disabled` names a
    /// detector that does not exist, plus everything [`Config::rubric`] and
    /// [`Validator::with_detectors`] report.
    pub fn validator(&self, kind: ArtifactKind) -> Result<Validator, ConfigError> {
        let known: Vec<&str> = detectors::all_detectors()
            .iter()
            .map(|(_, d)| d.name())
            .collect();
        if let Some(unknown) = self
            .detectors
            .disabled
            .iter()
            .find(|name| !known.contains(&name.as_str()))
        {
            return Err(ConfigError::UnknownDetector(unknown.clone()));
        }

        let enabled = detectors::detectors_for(kind)
            .into_iter()
            .filter(|d| self.is_detector_enabled(d.name()))
            .collect();
        Validator::with_detectors(self.rubric(kind)?, enabled)
    }
}
