//! Process configuration.
//!
//! Built once at startup from environment variables (a local `.env` file is
//! loaded first by `main`) and passed explicitly to the components that talk
//! to the model provider or the price API.
//!
//! | Variable               | Default                                                   |
//! |------------------------|-----------------------------------------------------------|
//! | `GEMINI_API_KEY`       | required                                                  |
//! | `GEMINI_MODEL`         | `gemini-2.0-flash`                                        |
//! | `GEMINI_BASE_URL`      | `https://generativelanguage.googleapis.com/v1beta/openai` |
//! | `COINLORE_TICKERS_URL` | `https://api.coinlore.net/api/tickers/`                   |
//! | `HTTP_TIMEOUT_SECS`    | `60` (`0` disables the timeout)                           |
//! | `HOST`                 | `127.0.0.1`                                               |
//! | `PORT`                 | `8501`                                                    |

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_TICKERS_URL: &str = "https://api.coinlore.net/api/tickers/";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8501;

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the hosted model provider.
    pub gemini_api_key: String,
    /// Model variant name sent with every chat completion.
    pub model: String,
    /// Base URL of the OpenAI-compatible endpoint (no trailing slash).
    pub gemini_base_url: String,
    /// Full URL of the coin tickers listing.
    pub tickers_url: String,
    /// Timeout applied to both outbound HTTP clients. `None` means no timeout.
    pub http_timeout: Option<Duration>,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from an arbitrary set of key/value pairs.
    ///
    /// Empty values are treated as unset.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();
        let get = |name: &str| vars.get(name).map(|v| v.trim().to_string());

        let gemini_api_key = get("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                    name: "HTTP_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            gemini_api_key,
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: get("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            tickers_url: get("COINLORE_TICKERS_URL")
                .unwrap_or_else(|| DEFAULT_TICKERS_URL.to_string()),
            http_timeout,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        })
    }

    /// Address the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Shared reqwest client honouring the configured timeout.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().user_agent("crypto-price-agent/0.1");
        if let Some(timeout) = self.http_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[("GEMINI_API_KEY", "key-123")])).unwrap();
        assert_eq!(config.gemini_api_key, "key-123");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.gemini_base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.tickers_url, DEFAULT_TICKERS_URL);
        assert_eq!(config.http_timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.bind_addr(), "127.0.0.1:8501");
    }

    #[test]
    fn test_missing_api_key() {
        let err = Config::from_vars(vars(&[("GEMINI_MODEL", "x")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("GEMINI_API_KEY"));

        // Blank counts as unset
        let err = Config::from_vars(vars(&[("GEMINI_API_KEY", "   ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("GEMINI_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
            ("GEMINI_BASE_URL", "http://localhost:9000/v1/"),
            ("HTTP_TIMEOUT_SECS", "0"),
            ("PORT", "3000"),
            ("HOST", "0.0.0.0"),
        ]))
        .unwrap();
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.gemini_base_url, "http://localhost:9000/v1");
        assert_eq!(config.http_timeout, None);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_vars(vars(&[("GEMINI_API_KEY", "k"), ("PORT", "http")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                value: "http".to_string()
            }
        );
    }

    #[test]
    fn test_from_dotenv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "GEMINI_API_KEY=from-file").unwrap();
        writeln!(file, "COINLORE_TICKERS_URL=http://127.0.0.1:1/tickers").unwrap();

        let pairs = dotenvy::from_path_iter(file.path())
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let config = Config::from_vars(pairs).unwrap();
        assert_eq!(config.gemini_api_key, "from-file");
        assert_eq!(config.tickers_url, "http://127.0.0.1:1/tickers");
    }
}
