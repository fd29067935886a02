use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // NYT Article Search
    pub nyt_api_key: String,
    pub nyt_base_url: String,
    pub article_search_api: String,
    pub article_search_endpoint: String,

    // Transport
    pub timeout_secs: u64,

    // Paging
    pub page_delay_ms: u64,
    pub max_pages: Option<u32>,
    pub rate_limit_retries: u32,
    pub rate_limit_backoff_secs: u64,
}

impl Config {
    /// Load configuration from the process environment, after reading `.env`
    /// if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let nyt_api_key = var("NYT_API_KEY")
            .or_else(|| var("API_KEY"))
            .ok_or(ConfigError::Missing("NYT_API_KEY"))?;

        Ok(Self {
            nyt_api_key,
            nyt_base_url: var("NYT_BASE_URL")
                .unwrap_or_else(|| "https://api.nytimes.com/svc/".to_string()),
            article_search_api: var("NYT_ARTICLE_SEARCH_API")
                .unwrap_or_else(|| "search/v2/".to_string()),
            article_search_endpoint: var("NYT_ARTICLE_SEARCH_ENDPOINT")
                .unwrap_or_else(|| "articlesearch.json".to_string()),
            timeout_secs: parsed(&var, "NYT_TIMEOUT_SECS")?.unwrap_or(30),
            page_delay_ms: parsed(&var, "NYT_PAGE_DELAY_MS")?.unwrap_or(0),
            max_pages: parsed(&var, "NYT_MAX_PAGES")?,
            rate_limit_retries: parsed(&var, "NYT_RATE_LIMIT_RETRIES")?.unwrap_or(0),
            rate_limit_backoff_secs: parsed(&var, "NYT_RATE_LIMIT_BACKOFF_SECS")?.unwrap_or(12),
        })
    }

    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let n = val.chars().count().min(4);
            let head: String = val.chars().take(n).collect();
            format!("{}...({} chars)", head, val.chars().count())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  NYT_API_KEY: {}", preview(&self.nyt_api_key));
        tracing::info!(
            "  Article search: {}{}{}",
            self.nyt_base_url,
            self.article_search_api,
            self.article_search_endpoint
        );
        tracing::info!("  Timeout: {}s", self.timeout_secs);
        tracing::info!(
            "  Paging: delay={}ms max_pages={:?} rate_limit_retries={} backoff={}s",
            self.page_delay_ms,
            self.max_pages,
            self.rate_limit_retries,
            self.rate_limit_backoff_secs
        );
    }
}

fn parsed<T>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_with_only_api_key() {
        let config = Config::from_lookup(lookup(&[("NYT_API_KEY", "secret")])).unwrap();

        assert_eq!(config.nyt_api_key, "secret");
        assert_eq!(config.nyt_base_url, "https://api.nytimes.com/svc/");
        assert_eq!(config.article_search_api, "search/v2/");
        assert_eq!(config.article_search_endpoint, "articlesearch.json");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.page_delay_ms, 0);
        assert_eq!(config.max_pages, None);
        assert_eq!(config.rate_limit_retries, 0);
        assert_eq!(config.rate_limit_backoff_secs, 12);
    }

    #[test]
    fn legacy_api_key_variable_is_accepted() {
        let config = Config::from_lookup(lookup(&[("API_KEY", "old")])).unwrap();
        assert_eq!(config.nyt_api_key, "old");
    }

    #[test]
    fn missing_or_blank_key_is_an_error() {
        assert_eq!(
            Config::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::Missing("NYT_API_KEY")
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("NYT_API_KEY", "  ")])).unwrap_err(),
            ConfigError::Missing("NYT_API_KEY")
        );
    }

    #[test]
    fn numeric_overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("NYT_API_KEY", "k"),
            ("NYT_TIMEOUT_SECS", "5"),
            ("NYT_PAGE_DELAY_MS", " 250 "),
            ("NYT_MAX_PAGES", "100"),
            ("NYT_RATE_LIMIT_RETRIES", "3"),
        ]))
        .unwrap();

        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.page_delay_ms, 250);
        assert_eq!(config.max_pages, Some(100));
        assert_eq!(config.rate_limit_retries, 3);
    }

    #[test]
    fn invalid_number_names_the_variable() {
        let err = Config::from_lookup(lookup(&[
            ("NYT_API_KEY", "k"),
            ("NYT_MAX_PAGES", "lots"),
        ]))
        .unwrap_err();

        match err {
            ConfigError::Invalid { key, value, .. } => {
                assert_eq!(key, "NYT_MAX_PAGES");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
