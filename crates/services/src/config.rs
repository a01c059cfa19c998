use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

pub const API_URL_ENV: &str = "PROCTOR_API_URL";
pub const HTTP_TIMEOUT_ENV: &str = "PROCTOR_HTTP_TIMEOUT_SECS";

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Where the remote session service lives and how long to wait for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
}

impl ServiceConfig {
    /// Reads `PROCTOR_API_URL` and `PROCTOR_HTTP_TIMEOUT_SECS`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`ServiceConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(API_URL_ENV)
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());
        let mut config = Self::new(&base_url)?;

        if let Some(raw) = lookup(HTTP_TIMEOUT_ENV).filter(|raw| !raw.trim().is_empty()) {
            let secs: u64 = raw
                .trim()
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout { raw: raw.clone() })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` unless `base_url` is an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let raw = base_url.trim();
        let url = Url::parse(raw).map_err(|err| ConfigError::InvalidUrl {
            raw: raw.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                raw: raw.to_string(),
                reason: format!("unsupported scheme `{}`", url.scheme()),
            });
        }
        Ok(Self {
            base_url: url,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Joins an endpoint path onto the base URL, keeping any base path prefix.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let config = ServiceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(
            config.endpoint("/test/abc/validate"),
            "http://localhost:8000/api/test/abc/validate"
        );
    }

    #[test]
    fn reads_overrides() {
        let config = ServiceConfig::from_lookup(|name| match name {
            API_URL_ENV => Some("https://exam.example.com/api/".into()),
            HTTP_TIMEOUT_ENV => Some("30".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(
            config.endpoint("test/session/s1/question"),
            "https://exam.example.com/api/test/session/s1/question"
        );
    }

    #[test]
    fn rejects_bad_values() {
        let err = ServiceConfig::from_lookup(|name| {
            (name == API_URL_ENV).then(|| "ftp://exam.example.com".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));

        let err = ServiceConfig::from_lookup(|name| {
            (name == HTTP_TIMEOUT_ENV).then(|| "soon".to_string())
        })
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidTimeout {
                raw: "soon".into()
            }
        );
    }
}
