use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub tables: TableConfig,
    pub log_format: LogFormat,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip)]
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_upload_mb: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub min_rows: usize,
    pub min_columns: usize,
    pub column_gap: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format `{other}` (expected pretty or json)")),
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-3.5-turbo-16k".to_string(),
                api_key: String::new(),
                temperature: 0.0,
                max_tokens: 4096,
                request_timeout_secs: 120,
            },
            server: ServerConfig {
                bind_addr: "0.0.0.0:3000".to_string(),
                max_upload_mb: 50,
            },
            tables: TableConfig {
                min_rows: 2,
                min_columns: 2,
                column_gap: 1.0,
            },
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Not validated here: an empty key fails authentication on the first call.
        if let Some(key) = lookup("OPENAI_API_KEY") {
            config.llm.api_key = key;
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Some(model) = lookup("ESTATE_LLM_MODEL") {
            config.llm.model = model;
        }
        if let Some(max_tokens) = parse_var(&lookup, "ESTATE_LLM_MAX_TOKENS")? {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(timeout) = parse_var(&lookup, "ESTATE_LLM_TIMEOUT_SECS")? {
            config.llm.request_timeout_secs = timeout;
        }
        if let Some(addr) = lookup("ESTATE_BIND_ADDR") {
            config.server.bind_addr = addr;
        }
        if let Some(mb) = parse_var(&lookup, "ESTATE_MAX_UPLOAD_MB")? {
            config.server.max_upload_mb = mb;
        }
        if let Some(rows) = parse_var(&lookup, "ESTATE_TABLE_MIN_ROWS")? {
            config.tables.min_rows = rows;
        }
        if let Some(columns) = parse_var(&lookup, "ESTATE_TABLE_MIN_COLUMNS")? {
            config.tables.min_columns = columns;
        }
        if let Some(gap) = parse_var(&lookup, "ESTATE_TABLE_COLUMN_GAP")? {
            config.tables.column_gap = gap;
        }
        if let Some(format) = parse_var(&lookup, "ESTATE_LOG_FORMAT")? {
            config.log_format = format;
        }

        Ok(config)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("invalid value for {key}={raw}: {e}")),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_deterministic_extraction() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.llm.model, "gpt-3.5-turbo-16k");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.llm.max_tokens, 4096);
        assert!(config.llm.api_key.is_empty());
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("ESTATE_LLM_MODEL", "gpt-4o-mini"),
            ("ESTATE_LLM_TIMEOUT_SECS", "30"),
            ("ESTATE_MAX_UPLOAD_MB", "5"),
            ("ESTATE_TABLE_MIN_ROWS", "3"),
            ("ESTATE_TABLE_COLUMN_GAP", "2.5"),
            ("ESTATE_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.request_timeout_secs, 30);
        assert_eq!(config.max_upload_bytes(), 5 * 1024 * 1024);
        assert_eq!(config.tables.min_rows, 3);
        assert_eq!(config.tables.column_gap, 2.5);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_huge_upload_limit_saturates() {
        let huge = usize::MAX.to_string();
        let config = AppConfig::from_lookup(lookup(&[("ESTATE_MAX_UPLOAD_MB", huge.as_str())])).unwrap();

        assert_eq!(config.max_upload_bytes(), usize::MAX);
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("ESTATE_LLM_MAX_TOKENS", "lots")])).unwrap_err();
        assert!(err.to_string().contains("ESTATE_LLM_MAX_TOKENS"));
    }

    #[test]
    fn test_api_key_not_leaked() {
        let config = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-secret")])).unwrap();

        assert!(!format!("{:?}", config).contains("sk-secret"));
        assert!(!serde_json::to_string(&config).unwrap().contains("sk-secret"));
    }
}
