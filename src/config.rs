//! Run configuration loaded from YAML.
//!
//! Every field has a default, so an empty file (or no file at all) is a valid
//! configuration. Command-line flags are applied on top by `main`.
//!
//! ```yaml
//! workers: 16
//! timeout_secs: 60
//! providers: [guardian, telegraph, spiegel-online]
//! max_pages_per_keyword: 50
//! api_keys:
//!   guardian: "..."
//! user_agents:
//!   daily-mail: "Mozilla/5.0 (Windows NT 10.0; Win64; x64)"
//! exclude:
//!   suffixes: [".pdf"]
//!   patterns: ['.*/video/.*']
//! ```

use crate::discovery::DiscoveryLimits;
use crate::errors::ConfigError;
use crate::filters::{
    PreFilter, all_pre, reject_url_patterns, reject_url_prefixes, reject_url_suffixes,
};
use crate::providers::ProviderId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_WORKERS: usize = 16;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Articles populated concurrently per provider.
    pub workers: usize,
    /// Per-request timeout.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// User agents sent to single providers instead of `user_agent`, keyed
    /// by provider name.
    pub user_agents: BTreeMap<String, String>,
    /// Provider names; empty or `all` selects every provider.
    pub providers: Vec<String>,
    /// Wall-clock budget for one provider's discovery.
    pub discovery_deadline_secs: Option<u64>,
    pub max_pages_per_keyword: Option<usize>,
    pub api_keys: ApiKeys,
    /// Candidate URLs dropped for every provider before population.
    pub exclude: UrlExclusions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub guardian: Option<String>,
    pub zeit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlExclusions {
    pub suffixes: Vec<String>,
    pub prefixes: Vec<String>,
    /// Regular expressions matched against the whole URL.
    pub patterns: Vec<String>,
}

impl UrlExclusions {
    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty() && self.prefixes.is_empty() && self.patterns.is_empty()
    }

    /// The exclusions as one pre-population filter, or `None` when there are
    /// none.
    pub fn pre_filter(&self) -> Result<Option<PreFilter>, ConfigError> {
        if self.is_empty() {
            return Ok(None);
        }
        let mut filters = Vec::new();
        if !self.suffixes.is_empty() {
            filters.push(reject_url_suffixes(self.suffixes.iter().cloned()));
        }
        if !self.prefixes.is_empty() {
            filters.push(reject_url_prefixes(self.prefixes.iter().cloned()));
        }
        if !self.patterns.is_empty() {
            filters.push(reject_url_patterns(&self.patterns)?);
        }
        Ok(Some(all_pre(filters)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            user_agents: BTreeMap::new(),
            providers: Vec::new(),
            discovery_deadline_secs: None,
            max_pages_per_keyword: None,
            api_keys: ApiKeys::default(),
            exclude: UrlExclusions::default(),
        }
    }
}

impl Config {
    /// Reads and validates a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: shown.clone(),
            source,
        })?;
        let config: Config = if data.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&data).map_err(|source| ConfigError::Yaml {
                path: shown.clone(),
                source,
            })?
        };
        config.validate()?;
        info!(path = %shown, workers = config.workers, "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "workers",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_pages_per_keyword == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_pages_per_keyword",
                reason: "must be at least 1 when set".to_string(),
            });
        }
        for name in self.user_agents.keys() {
            name.parse::<ProviderId>()?;
        }
        self.exclude.pre_filter()?;
        self.provider_ids().map(|_| ())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn limits(&self) -> DiscoveryLimits {
        DiscoveryLimits {
            deadline: self.discovery_deadline_secs.map(Duration::from_secs),
            max_pages: self.max_pages_per_keyword,
        }
    }

    /// The user agent configured for `id` alone, if any.
    pub fn user_agent_for(&self, id: ProviderId) -> Option<&str> {
        self.user_agents
            .iter()
            .find(|(name, _)| name.parse::<ProviderId>().is_ok_and(|named| named == id))
            .map(|(_, user_agent)| user_agent.as_str())
    }

    /// Whether the whole catalog is selected, explicitly or by omission.
    pub fn selects_all(&self) -> bool {
        self.providers.is_empty()
            || self
                .providers
                .iter()
                .any(|name| name.trim().eq_ignore_ascii_case("all"))
    }

    /// The selected providers, deduplicated, in catalog order.
    pub fn provider_ids(&self) -> Result<Vec<ProviderId>, ConfigError> {
        if self.selects_all() {
            return Ok(ProviderId::all().to_vec());
        }

        let mut ids = self
            .providers
            .iter()
            .map(|name| name.parse::<ProviderId>())
            .collect::<Result<Vec<_>, _>>()?;
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}
