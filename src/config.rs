//! Runtime configuration.
//!
//! # Environment
//!
//! [`RuntimeConfig::from_env`] reads:
//! - `PONT_BASE_URL` - base URL relative request URLs are joined onto
//! - `PONT_PROTOCOL_HEADER` - protocol marker header (default: `x-pont`)
//! - `PONT_TIMEOUT_SECS` - request timeout in seconds (default: 30)

use std::collections::BTreeMap;
use std::time::Duration;

use url::Url;

use crate::error::{PontError, Result};

/// Default protocol marker header.
pub const DEFAULT_PROTOCOL_HEADER: &str = "x-pont";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration shared with every service through the runtime context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Base URL for relative request URLs.
    pub base_url: Option<Url>,
    /// Header marking protocol requests and responses.
    pub protocol_header: String,
    /// Headers sent with every request.
    pub headers: BTreeMap<String, String>,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            protocol_header: DEFAULT_PROTOCOL_HEADER.to_string(),
            headers: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RuntimeConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `PONT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base) = lookup("PONT_BASE_URL") {
            let url = Url::parse(&base)
                .map_err(|e| PontError::Config(format!("PONT_BASE_URL is invalid: {e}")))?;
            config.base_url = Some(url);
        }

        if let Some(header) = lookup("PONT_PROTOCOL_HEADER") {
            if header.trim().is_empty() {
                return Err(PontError::Config("PONT_PROTOCOL_HEADER is empty".into()));
            }
            config.protocol_header = header.trim().to_ascii_lowercase();
        }

        if let Some(secs) = lookup("PONT_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| PontError::Config(format!("PONT_TIMEOUT_SECS is not a number: {secs}")))?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Resolve a request URL against the base URL.
    ///
    /// Absolute URLs are returned unchanged; relative URLs require a base.
    pub fn resolve_url(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => Ok(base.join(url)?),
                None => Err(PontError::Config(format!(
                    "relative URL `{url}` requires a base URL"
                ))),
            },
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.protocol_header, "x-pont");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_from_lookup() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("PONT_BASE_URL", "https://app.test/"),
            ("PONT_PROTOCOL_HEADER", "X-App"),
            ("PONT_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.base_url.unwrap().as_str(), "https://app.test/");
        assert_eq!(config.protocol_header, "x-app");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_lookup_rejects_bad_timeout() {
        let err = RuntimeConfig::from_lookup(lookup(&[("PONT_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, PontError::Config(_)));
    }

    #[test]
    fn test_from_lookup_rejects_bad_url() {
        let err = RuntimeConfig::from_lookup(lookup(&[("PONT_BASE_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, PontError::Config(_)));
    }

    #[test]
    fn test_resolve_url() {
        let mut config = RuntimeConfig::default();
        assert!(matches!(
            config.resolve_url("/users"),
            Err(PontError::Config(_))
        ));
        assert_eq!(
            config.resolve_url("https://other.test/a").unwrap().as_str(),
            "https://other.test/a"
        );

        config.base_url = Some(Url::parse("https://app.test/").unwrap());
        assert_eq!(
            config.resolve_url("/users?page=2").unwrap().as_str(),
            "https://app.test/users?page=2"
        );
    }
}
