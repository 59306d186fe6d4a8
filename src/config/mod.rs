//! Engine configuration
//!
//! Loads the policy thresholds from `commitguard.toml` or `.commitguard.json`
//! in a directory. Every field has a default, so a partial file only
//! overrides what it names.
//!
//! # Configuration Format
//!
//! ```toml
//! # commitguard.toml
//!
//! [rules]
//! sensitive_extensions = ["yml", "sh", "pem"]
//! sensitive_files_threshold = 1
//! new_files_outlier = 5
//!
//! [trust]
//! trust_threshold = 0.5
//! min_account_age_days = 180
//!
//! [anomaly]
//! kernel = "poly"
//! gamma = "auto"
//! nu = 0.1
//! ```

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "commitguard.toml";
pub const JSON_CONFIG_FILE: &str = ".commitguard.json";

/// All policy knobs, loaded once per evaluation session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub trust: TrustConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
}

/// Thresholds of the deterministic rule predicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Extensions treated as sensitive (no leading dot)
    pub sensitive_extensions: Vec<String>,
    /// Sensitive files a commit may touch before the rule trips
    pub sensitive_files_threshold: usize,
    /// Ratio for the stale-familiarity rule
    pub not_touched_files: f64,
    /// Share of repository files owned by the author among touched files
    pub owned_majority_files: f64,
    /// Added files that count as a bulk addition
    pub new_files_outlier: f64,
    /// Accumulated changed lines that make someone a major contributor to a file
    pub contributions: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            sensitive_extensions: [
                "sh", "bash", "yml", "yaml", "json", "xml", "ini", "cfg", "conf", "toml", "env",
                "pem", "key", "lock",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            sensitive_files_threshold: 1,
            not_touched_files: 0.5,
            owned_majority_files: 0.5,
            new_files_outlier: 5.0,
            contributions: 100,
        }
    }
}

/// Thresholds of the author trust predicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Minimum share of satisfied trust predicates (rounded to 1 decimal)
    pub trust_threshold: f64,
    /// Accounts this young or younger are considered recent
    pub min_account_age_days: i64,
    /// Minimum share of all repository commits
    pub few_commits_threshold: f64,
    /// Minimum share of the day's commits
    pub same_day_commits: f64,
    /// Maximum rejected pull request ratio (rounded to an integer)
    pub rejected_pr: f64,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            trust_threshold: 0.5,
            min_account_age_days: 180,
            few_commits_threshold: 0.01,
            same_day_commits: 0.5,
            rejected_pr: 0.5,
        }
    }
}

/// Kernel of the one-class model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    #[default]
    Poly,
    Rbf,
    Linear,
    Sigmoid,
}

/// Kernel coefficient
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "GammaRepr", into = "GammaRepr")]
pub enum Gamma {
    /// 1 / n_features
    #[default]
    Auto,
    /// 1 / (n_features * variance of the training values)
    Scale,
    Value(f64),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum GammaRepr {
    Name(String),
    Value(f64),
}

impl TryFrom<GammaRepr> for Gamma {
    type Error = String;

    fn try_from(repr: GammaRepr) -> Result<Self, Self::Error> {
        match repr {
            GammaRepr::Value(v) => Ok(Gamma::Value(v)),
            GammaRepr::Name(name) => match name.as_str() {
                "auto" => Ok(Gamma::Auto),
                "scale" => Ok(Gamma::Scale),
                other => Err(format!("unknown gamma '{}', expected auto, scale or a number", other)),
            },
        }
    }
}

impl From<Gamma> for GammaRepr {
    fn from(gamma: Gamma) -> Self {
        match gamma {
            Gamma::Auto => GammaRepr::Name("auto".into()),
            Gamma::Scale => GammaRepr::Name("scale".into()),
            Gamma::Value(v) => GammaRepr::Value(v),
        }
    }
}

/// One-class model hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub kernel: Kernel,
    pub gamma: Gamma,
    /// Upper bound on the fraction of training rows treated as outliers
    pub nu: f64,
    pub degree: u32,
    pub coef0: f64,
    /// Solver stopping tolerance
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            kernel: Kernel::Poly,
            gamma: Gamma::Auto,
            nu: 0.1,
            degree: 3,
            coef0: 0.0,
            tolerance: 1e-3,
            max_iterations: 100_000,
        }
    }
}

impl EngineConfig {
    /// Reject values no predicate or solver can work with
    pub fn validate(&self) -> EngineResult<()> {
        let fail = |msg: String| Err(EngineError::Config(msg));

        let ratios = [
            ("rules.not_touched_files", self.rules.not_touched_files),
            ("rules.owned_majority_files", self.rules.owned_majority_files),
            ("rules.new_files_outlier", self.rules.new_files_outlier),
            ("trust.few_commits_threshold", self.trust.few_commits_threshold),
            ("trust.same_day_commits", self.trust.same_day_commits),
            ("trust.rejected_pr", self.trust.rejected_pr),
            ("trust.trust_threshold", self.trust.trust_threshold),
        ];
        for (name, value) in ratios {
            if !value.is_finite() || value < 0.0 {
                return fail(format!("{} must be a non-negative number, got {}", name, value));
            }
        }

        let a = &self.anomaly;
        if !(a.nu > 0.0 && a.nu <= 1.0) {
            return fail(format!("anomaly.nu must be in (0, 1], got {}", a.nu));
        }
        if a.degree == 0 {
            return fail("anomaly.degree must be at least 1".into());
        }
        if let Gamma::Value(g) = a.gamma {
            if !(g > 0.0) {
                return fail(format!("anomaly.gamma must be positive, got {}", g));
            }
        }
        if !(a.tolerance > 0.0) {
            return fail(format!("anomaly.tolerance must be positive, got {}", a.tolerance));
        }
        if a.max_iterations == 0 {
            return fail("anomaly.max_iterations must be at least 1".into());
        }
        Ok(())
    }

    pub fn is_sensitive_extension(&self, ext: &str) -> bool {
        self.rules.sensitive_extensions.iter().any(|s| s == ext)
    }
}

/// Load the engine config for a directory.
///
/// Tries `commitguard.toml`, then `.commitguard.json`. A file that fails to
/// parse or validate is skipped with a warning; with no usable file the
/// defaults apply.
pub fn load_engine_config(dir: &Path) -> EngineConfig {
    let toml_path = dir.join(CONFIG_FILE);
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded engine config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    let json_path = dir.join(JSON_CONFIG_FILE);
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded engine config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", json_path.display(), e);
            }
        }
    }

    debug!("No engine config found, using defaults");
    EngineConfig::default()
}

/// Load and validate a TOML config file
pub fn load_toml_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

fn load_json_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Commented template written by `commitguard init`
pub const DEFAULT_CONFIG_TOML: &str = r#"# Commitguard configuration

[rules]
# File extensions whose modification is policy-sensitive
sensitive_extensions = ["sh", "bash", "yml", "yaml", "json", "xml", "ini", "cfg", "conf", "toml", "env", "pem", "key", "lock"]
# Sensitive files a commit may touch before the rule trips
sensitive_files_threshold = 1
# Stale-familiarity ratio
not_touched_files = 0.5
# Share of repository files owned by the author among touched files
owned_majority_files = 0.5
# Added files that count as a bulk addition
new_files_outlier = 5
# Accumulated changed lines that make someone a major contributor to a file
contributions = 100

[trust]
# Minimum share of satisfied trust predicates
trust_threshold = 0.5
# Accounts this young (days) or younger are considered recent
min_account_age_days = 180
# Minimum share of all repository commits
few_commits_threshold = 0.01
# Minimum share of the day's commits
same_day_commits = 0.5
# Maximum rejected pull request ratio
rejected_pr = 0.5

[anomaly]
# poly, rbf, linear or sigmoid
kernel = "poly"
# auto, scale or a positive number
gamma = "auto"
nu = 0.1
degree = 3
coef0 = 0.0
"#;
