use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Which provider feeds the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Simulated,
    Http { base_url: String },
}

/// How published states are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Log,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub refresh_interval_ms: u64, // 5000
    pub quote_timeout_ms: u64,    // 5000 per fetch
    pub source: SourceKind,
    pub output: OutputFormat,
}

impl RunnerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let refresh_interval_ms: u64 = lookup("REFRESH_INTERVAL_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .context("REFRESH_INTERVAL_MS must be a whole number of milliseconds")?;

        let quote_timeout_ms: u64 = lookup("QUOTE_TIMEOUT_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .context("QUOTE_TIMEOUT_MS must be a whole number of milliseconds")?;

        let source = match lookup("QUOTE_SOURCE")
            .unwrap_or_else(|| "simulated".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "simulated" => SourceKind::Simulated,
            "http" => SourceKind::Http {
                base_url: lookup("QUOTE_SOURCE_URL")
                    .filter(|url| !url.trim().is_empty())
                    .context("QUOTE_SOURCE_URL not set (required when QUOTE_SOURCE=http)")?,
            },
            other => bail!("QUOTE_SOURCE must be 'simulated' or 'http', got '{}'", other),
        };

        let output = match lookup("SNAPSHOT_OUTPUT")
            .unwrap_or_else(|| "log".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "log" => OutputFormat::Log,
            "json" => OutputFormat::Json,
            other => bail!("SNAPSHOT_OUTPUT must be 'log' or 'json', got '{}'", other),
        };

        let config = Self {
            refresh_interval_ms,
            quote_timeout_ms,
            source,
            output,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.refresh_interval_ms == 0 {
            bail!("REFRESH_INTERVAL_MS must be greater than 0");
        }
        if self.quote_timeout_ms == 0 {
            bail!("QUOTE_TIMEOUT_MS must be greater than 0");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn quote_timeout(&self) -> Duration {
        Duration::from_millis(self.quote_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<RunnerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RunnerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_millis(5000));
        assert_eq!(config.quote_timeout(), Duration::from_millis(5000));
        assert_eq!(config.source, SourceKind::Simulated);
        assert_eq!(config.output, OutputFormat::Log);
    }

    #[test]
    fn test_http_source_requires_url() {
        let err = config_from(&[("QUOTE_SOURCE", "http")]).unwrap_err();
        assert!(err.to_string().contains("QUOTE_SOURCE_URL"));

        let config = config_from(&[
            ("QUOTE_SOURCE", "HTTP"),
            ("QUOTE_SOURCE_URL", "http://localhost:9000"),
            ("SNAPSHOT_OUTPUT", "json"),
        ])
        .unwrap();
        assert_eq!(
            config.source,
            SourceKind::Http {
                base_url: "http://localhost:9000".to_string()
            }
        );
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(config_from(&[("REFRESH_INTERVAL_MS", "0")]).is_err());
        assert!(config_from(&[("REFRESH_INTERVAL_MS", "fast")]).is_err());
        assert!(config_from(&[("QUOTE_TIMEOUT_MS", "-5")]).is_err());
        assert!(config_from(&[("QUOTE_SOURCE", "carrier-pigeon")]).is_err());
        assert!(config_from(&[("SNAPSHOT_OUTPUT", "xml")]).is_err());
    }
}
