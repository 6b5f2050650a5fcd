//! Configuration types for CareerGuard.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use careerguard_limiter::LimiterConfig;
use careerguard_safety::SafetyConfig;

use crate::error::GuardError;

/// Configuration for the CareerGuard facade.
///
/// Every section is optional in the TOML file; missing sections and keys
/// take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Safety Guard configuration.
    pub safety: SafetyConfig,

    /// Token Guard configuration.
    pub limiter: LimiterConfig,

    /// Local cache configuration.
    pub cache: CacheConfig,

    /// Temporary file configuration.
    pub files: FileConfig,

    /// Background sweep configuration.
    pub sweep: SweepConfig,

    /// Request pipeline settings.
    pub pipeline: PipelineConfig,
}

impl GuardConfig {
    /// Load configuration from a TOML file.
    ///
    /// A path that does not exist yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Config` if the file exists but cannot be read
    /// or parsed.
    pub fn load(path: &Path) -> Result<Self, GuardError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| GuardError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Config` on malformed TOML or invalid values.
    pub fn from_toml(content: &str) -> Result<Self, GuardError> {
        let config: Self =
            toml::from_str(content).map_err(|e| GuardError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Config` if serialization fails.
    pub fn to_toml(&self) -> Result<String, GuardError> {
        toml::to_string_pretty(self).map_err(|e| GuardError::Config(e.to_string()))
    }

    /// Reject values no component can work with.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Config` naming the offending key.
    pub fn validate(&self) -> Result<(), GuardError> {
        if self.limiter.window_secs == 0 {
            return Err(GuardError::Config("limiter.window_secs must be > 0".into()));
        }
        if self.limiter.max_tracked_users == 0 {
            return Err(GuardError::Config(
                "limiter.max_tracked_users must be > 0".into(),
            ));
        }
        if self.sweep.interval_secs == 0 {
            return Err(GuardError::Config("sweep.interval_secs must be > 0".into()));
        }
        self.cache.default_ttl()?;
        self.files.default_ttl()?;
        if self.cache.namespace.is_empty() || self.files.namespace.is_empty() {
            return Err(GuardError::Config("namespaces must not be empty".into()));
        }
        Ok(())
    }
}

/// Converts a configured lifetime, rejecting values chrono cannot hold.
///
/// # Errors
///
/// Returns `GuardError::Config` naming `key` if `secs` is out of range.
pub fn ttl_from_secs(secs: i64, key: &str) -> Result<Duration, GuardError> {
    Duration::try_seconds(secs)
        .ok_or_else(|| GuardError::Config(format!("{} out of range: {}", key, secs)))
}

/// Local cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Store directory. `None` keeps the cache in memory.
    pub path: Option<PathBuf>,

    /// Key namespace.
    pub namespace: String,

    /// Lifetime of entries written without an explicit TTL.
    pub default_ttl_secs: i64,
}

impl CacheConfig {
    /// The default entry lifetime as a duration.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Config` if the seconds value is out of range.
    pub fn default_ttl(&self) -> Result<Duration, GuardError> {
        ttl_from_secs(self.default_ttl_secs, "cache.default_ttl_secs")
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            namespace: "careerguard".to_string(),
            default_ttl_secs: careerguard_store::DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Temporary file configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Directory for temp files. `None` uses `<system temp>/careerguard/<namespace>`.
    pub root: Option<PathBuf>,

    /// Subdirectory under the system temp root.
    pub namespace: String,

    /// Lifetime of files written without an explicit TTL.
    pub default_ttl_secs: i64,
}

impl FileConfig {
    /// The default file lifetime as a duration.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Config` if the seconds value is out of range.
    pub fn default_ttl(&self) -> Result<Duration, GuardError> {
        ttl_from_secs(self.default_ttl_secs, "files.default_ttl_secs")
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            root: None,
            namespace: "uploads".to_string(),
            default_ttl_secs: careerguard_store::DEFAULT_FILE_TTL_SECS,
        }
    }
}

/// Background sweep configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Seconds between sweeps.
    pub interval_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3_600,
        }
    }
}

/// Request pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Refuse prompts that look like they carry personal data, instead of
    /// flagging them for review.
    pub block_sensitive_input: bool,

    /// Token usage percentage above which a Review flag is raised.
    pub high_usage_percent: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            block_sensitive_input: false,
            high_usage_percent: 80,
        }
    }
}
