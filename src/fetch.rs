//! HTTP document fetching.
//!
//! [`FetchClient`] performs exactly one GET per call, bounded by the
//! configured timeout. It never retries: a failed fetch is reported as a
//! [`FetchError`] and the caller decides what "no data" means for it.

use crate::errors::{ConfigError, FetchError};
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use url::Url;

// Bytes of a document searched for a `<meta>` charset declaration.
const META_SNIFF_LEN: usize = 4096;

static HEADER_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([A-Za-z0-9_.:-]+)"#).expect("static regex")
});

// Covers `<meta charset=..>` and `<meta http-equiv=.. content="..; charset=..">`.
static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([A-Za-z0-9_.:-]+)"#).expect("static regex")
});

fn charset_in(re: &Regex, haystack: &[u8]) -> Option<&'static Encoding> {
    let label = re.captures(haystack)?.get(1)?;
    Encoding::for_label(label.as_bytes())
}

/// Decodes an HTML body to text.
///
/// The charset of the `Content-Type` header wins, then a byte order mark,
/// then a `<meta>` declaration near the top of the document. Anything else
/// is read as UTF-8.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> String {
    let declared = content_type.and_then(|value| charset_in(&HEADER_CHARSET, value.as_bytes()));
    if let Some(encoding) = declared {
        return encoding.decode_with_bom_removal(bytes).0.into_owned();
    }
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding.decode_with_bom_removal(bytes).0.into_owned();
    }
    let head = &bytes[..bytes.len().min(META_SNIFF_LEN)];
    let encoding = charset_in(&META_CHARSET, head)
        .map(Encoding::output_encoding)
        .unwrap_or(UTF_8);
    encoding.decode_without_bom_handling(bytes).0.into_owned()
}

/// A cheaply cloneable HTTP client with per-provider header overrides.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    headers: HeaderMap,
}

impl FetchClient {
    /// Builds a client whose requests time out after `timeout` and carry
    /// `user_agent` unless a provider overrides it.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(ConfigError::Client)?;
        Ok(Self {
            http,
            headers: HeaderMap::new(),
        })
    }

    /// Returns a client that sends `user_agent` instead of the default one.
    pub fn with_user_agent(&self, user_agent: &str) -> Result<Self, ConfigError> {
        self.with_header(USER_AGENT.as_str(), user_agent)
    }

    /// Returns a client that adds `name: value` to every request.
    pub fn with_header(&self, name: &str, value: &str) -> Result<Self, ConfigError> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "header name",
                reason: e.to_string(),
            }
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidValue {
            field: "header value",
            reason: e.to_string(),
        })?;

        let mut client = self.clone();
        client.headers.insert(name, value);
        Ok(client)
    }

    /// Fetches `url` and returns the body decoded as an HTML document.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.send(url).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;
        Ok(decode_html(&bytes, content_type.as_deref()))
    }

    /// Fetches `url` and returns the raw body bytes.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.send(url).await?;
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        // Url::parse percent-encodes spaces and other characters that
        // provider templates splice into queries verbatim.
        let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let t0 = Instant::now();
        let response = self
            .http
            .get(parsed)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        debug!(
            %url,
            %status,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched document"
        );
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }
}
