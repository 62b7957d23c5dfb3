use crate::error::{AppError, Result};
use std::env;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(200);

/// Runtime tunables taken from the environment (and `.env`).
///
/// Prompts and the API key live in the settings store instead; see
/// [`crate::settings`]. `fallback_credential` is only used when the store has
/// no `credential` entry.
#[derive(Clone, Debug)]
pub struct Config {
    pub endpoint: Url,
    pub model_name: String,
    pub request_deadline: Duration,
    pub settle_delay: Duration,
    pub fallback_credential: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let endpoint = lookup("AI_REWRITE_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| AppError::config(format!("Invalid AI_REWRITE_ENDPOINT '{endpoint}': {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AppError::config(format!(
                "AI_REWRITE_ENDPOINT must be an http(s) URL, got scheme '{}'",
                endpoint.scheme()
            )));
        }

        let model_name = lookup("AI_REWRITE_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let request_deadline = match lookup("AI_REWRITE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("AI_REWRITE_TIMEOUT_SECS", &raw)?),
            None => DEFAULT_DEADLINE,
        };

        let settle_delay = match lookup("AI_REWRITE_SETTLE_MS") {
            Some(raw) => Duration::from_millis(parse_positive("AI_REWRITE_SETTLE_MS", &raw)?),
            None => DEFAULT_SETTLE,
        };

        let fallback_credential = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());

        Ok(Self {
            endpoint,
            model_name,
            request_deadline,
            settle_delay,
            fallback_credential,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
            model_name: DEFAULT_MODEL.to_string(),
            request_deadline: DEFAULT_DEADLINE,
            settle_delay: DEFAULT_SETTLE,
            fallback_credential: None,
        }
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(AppError::config(format!(
            "{name} must be a positive integer, got '{raw}'"
        ))),
        Ok(value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.endpoint.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(config.model_name, DEFAULT_MODEL);
        assert_eq!(config.request_deadline, Duration::from_secs(60));
        assert_eq!(config.settle_delay, Duration::from_millis(200));
        assert!(config.fallback_credential.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("AI_REWRITE_ENDPOINT", "http://localhost:8080/v1/chat/completions"),
            ("AI_REWRITE_MODEL", "local-model"),
            ("AI_REWRITE_TIMEOUT_SECS", "15"),
            ("AI_REWRITE_SETTLE_MS", "350"),
            ("OPENAI_API_KEY", "sk-env"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint.host_str(), Some("localhost"));
        assert_eq!(config.model_name, "local-model");
        assert_eq!(config.request_deadline, Duration::from_secs(15));
        assert_eq!(config.settle_delay, Duration::from_millis(350));
        assert_eq!(config.fallback_credential.as_deref(), Some("sk-env"));
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let err = Config::from_lookup(lookup(&[("AI_REWRITE_ENDPOINT", "ftp://example.com")]));
        assert!(matches!(err, Err(AppError::Config(_))));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = Config::from_lookup(lookup(&[("AI_REWRITE_TIMEOUT_SECS", "0")]));
        assert!(matches!(err, Err(AppError::Config(_))));
    }
}
