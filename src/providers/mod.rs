//! The catalog of supported news providers.
//!
//! Every provider is plain data fed into the generic discovery, extraction
//! and filter machinery: a search strategy, the article page rules, optional
//! filters and an optional politeness delay. The per-provider modules only
//! build that data.
//!
//! | Provider | Search | Language |
//! |---|---|---|
//! | The Guardian | JSON API | English |
//! | Die Zeit | JSON API | German |
//! | The Telegraph, Daily Mail, Mirror | predictive | English |
//! | Daily Express | reactive | English |
//! | Der Spiegel, Spiegel Online, Stern, Süddeutsche, Tagesspiegel, FAZ | predictive | German |
//! | Welt Online | reactive | German |

use crate::config::Config;
use crate::discovery::Discovery;
use crate::errors::ConfigError;
use crate::extract::ExtractionRules;
use crate::filters::{PostFilterFactory, PreFilter};
use crate::populate::DelayHook;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

mod dailymail;
mod express;
mod faz;
mod guardian;
mod mirror;
mod spiegel;
mod stern;
mod sueddeutsche;
mod tagesspiegel;
mod telegraph;
mod welt;
mod zeit;

/// Identifies a provider in configuration, logs and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    Guardian,
    Zeit,
    Telegraph,
    DailyMail,
    Mirror,
    DailyExpress,
    Spiegel,
    SpiegelOnline,
    Stern,
    Sueddeutsche,
    Tagesspiegel,
    Welt,
    Faz,
}

impl ProviderId {
    const ALL: [ProviderId; 13] = [
        ProviderId::Guardian,
        ProviderId::Zeit,
        ProviderId::Telegraph,
        ProviderId::DailyMail,
        ProviderId::Mirror,
        ProviderId::DailyExpress,
        ProviderId::Spiegel,
        ProviderId::SpiegelOnline,
        ProviderId::Stern,
        ProviderId::Sueddeutsche,
        ProviderId::Tagesspiegel,
        ProviderId::Welt,
        ProviderId::Faz,
    ];

    pub fn all() -> &'static [ProviderId] {
        &Self::ALL
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderId::Guardian => "guardian",
            ProviderId::Zeit => "zeit",
            ProviderId::Telegraph => "telegraph",
            ProviderId::DailyMail => "daily-mail",
            ProviderId::Mirror => "mirror",
            ProviderId::DailyExpress => "daily-express",
            ProviderId::Spiegel => "spiegel",
            ProviderId::SpiegelOnline => "spiegel-online",
            ProviderId::Stern => "stern",
            ProviderId::Sueddeutsche => "sueddeutsche",
            ProviderId::Tagesspiegel => "tagesspiegel",
            ProviderId::Welt => "welt",
            ProviderId::Faz => "faz",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderId {
    type Err = ConfigError;

    /// Accepts the canonical name in any case, with `_` in place of `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownProvider(s.trim().to_string()))
    }
}

/// Everything the orchestrator needs to run one provider.
pub struct Provider {
    pub id: ProviderId,
    pub discovery: Discovery,
    /// Article page rules; `None` when discovery already yields full records.
    pub extraction: Option<Arc<ExtractionRules>>,
    pub pre_filter: Option<PreFilter>,
    pub post_filter: Option<PostFilterFactory>,
    pub delay: Option<DelayHook>,
    /// Sent instead of the global user agent.
    pub user_agent: Option<String>,
}

impl Provider {
    pub fn new(id: ProviderId, discovery: Discovery) -> Self {
        Self {
            id,
            discovery,
            extraction: None,
            pre_filter: None,
            post_filter: None,
            delay: None,
            user_agent: None,
        }
    }

    pub fn with_extraction(mut self, rules: ExtractionRules) -> Self {
        self.extraction = Some(Arc::new(rules));
        self
    }

    pub fn with_pre_filter(mut self, filter: PreFilter) -> Self {
        self.pre_filter = Some(filter);
        self
    }

    pub fn with_post_filter(mut self, factory: PostFilterFactory) -> Self {
        self.post_filter = Some(factory);
        self
    }

    pub fn with_delay(mut self, delay: DelayHook) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.id)
            .field("extraction", &self.extraction)
            .field("pre_filter", &self.pre_filter.is_some())
            .field("post_filter", &self.post_filter.is_some())
            .field("delay", &self.delay.is_some())
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

/// Builds the provider `id` from the catalog.
///
/// # Errors
///
/// Fails when a selector or pattern of the provider does not compile, or
/// when the provider needs an API key that `config` does not carry.
pub fn build(id: ProviderId, config: &Config) -> Result<Provider, ConfigError> {
    match id {
        ProviderId::Guardian => guardian::provider(require_key(
            id,
            config.api_keys.guardian.as_deref(),
        )?),
        ProviderId::Zeit => zeit::provider(require_key(id, config.api_keys.zeit.as_deref())?),
        ProviderId::Telegraph => telegraph::provider(),
        ProviderId::DailyMail => dailymail::provider(),
        ProviderId::Mirror => mirror::provider(),
        ProviderId::DailyExpress => express::provider(),
        ProviderId::Spiegel => spiegel::print_provider(),
        ProviderId::SpiegelOnline => spiegel::online_provider(),
        ProviderId::Stern => stern::provider(),
        ProviderId::Sueddeutsche => sueddeutsche::provider(),
        ProviderId::Tagesspiegel => tagesspiegel::provider(),
        ProviderId::Welt => welt::provider(),
        ProviderId::Faz => faz::provider(),
    }
}

/// Builds every provider selected by `config`.
///
/// When the whole catalog is selected, providers lacking a required parameter
/// such as an API key are skipped with a warning. A provider named
/// explicitly must build.
pub fn build_selected(config: &Config) -> Result<Vec<Provider>, ConfigError> {
    let implicit = config.selects_all();
    let mut providers = Vec::new();
    for id in config.provider_ids()? {
        match build(id, config) {
            Ok(provider) => providers.push(match config.user_agent_for(id) {
                Some(user_agent) => provider.with_user_agent(user_agent),
                None => provider,
            }),
            Err(ConfigError::MissingParameter {
                provider,
                parameter,
            }) if implicit => {
                warn!(provider, parameter, "Skipping provider without required parameter");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(providers)
}

fn require_key(id: ProviderId, key: Option<&str>) -> Result<String, ConfigError> {
    key.map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::MissingParameter {
            provider: id.name(),
            parameter: "api key",
        })
}
