//! Configuration management for the OmniPay core
//!
//! Loads configuration from TOML files with environment variable substitution.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub service: ServiceConfig,
    pub provider: ProviderConfig,
    pub api: ApiConfig,
    pub metrics: MetricsConfig,
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// Execution mode for the transfer path
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Quotes and transfers go through the real routing provider
    Live,
    /// Transfers are manufactured by the simulator
    Demo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub instance_id: String,
    pub environment: Environment,
    pub mode: ExecutionMode,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the routing provider API, e.g. https://li.quest/v1
    pub base_url: String,
    /// Integrator identity sent with every provider request
    pub integrator: String,
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    pub backend: LedgerBackend,
    /// Path of the JSON document for the file backend
    pub path: Option<String>,
    #[serde(default = "default_ledger_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_success_ratio")]
    pub success_ratio: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            success_ratio: default_success_ratio(),
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_ledger_capacity() -> usize {
    100
}

fn default_min_delay_ms() -> u64 {
    3_000
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_success_ratio() -> f64 {
    0.95
}

impl Settings {
    /// Load settings from configuration files
    pub fn load() -> Result<Self> {
        let config_path = env::var("OMNIPAY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.provider.base_url.is_empty() {
            anyhow::bail!("provider.base_url must not be empty");
        }
        if self.provider.integrator.is_empty() {
            anyhow::bail!("provider.integrator must not be empty");
        }
        if self.ledger.capacity == 0 {
            anyhow::bail!("ledger.capacity must be at least 1");
        }
        if self.ledger.backend == LedgerBackend::File && self.ledger.path.is_none() {
            anyhow::bail!("ledger.path is required for the file backend");
        }
        if self.simulator.min_delay_ms >= self.simulator.max_delay_ms {
            anyhow::bail!("simulator.min_delay_ms must be below simulator.max_delay_ms");
        }
        if !(0.0..=1.0).contains(&self.simulator.success_ratio) {
            anyhow::bail!("simulator.success_ratio must be within [0, 1]");
        }
        Ok(())
    }

    /// Whether diagnostic payloads may be attached to error responses
    pub fn expose_diagnostics(&self) -> bool {
        self.service.environment == Environment::Development
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [service]
        instance_id = "omnipay-1"
        environment = "development"
        mode = "demo"

        [provider]
        base_url = "https://li.quest/v1"
        integrator = "omnipay"

        [api]
        host = "127.0.0.1"
        port = 3100

        [metrics]
        enabled = false
        port = 9095

        [ledger]
        backend = "memory"
    "#;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("TEST_VAR", "test_value");
        let input = "url = \"https://api.example.com/${TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"https://api.example.com/test_value/endpoint\"");
    }

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let settings: Settings = toml::from_str(MINIMAL).unwrap();
        settings.validate().unwrap();
        assert_eq!(settings.ledger.capacity, 100);
        assert_eq!(settings.simulator.min_delay_ms, 3_000);
        assert_eq!(settings.simulator.max_delay_ms, 8_000);
        assert_eq!(settings.simulator.success_ratio, 0.95);
        assert!(settings.expose_diagnostics());
    }

    #[test]
    fn test_file_backend_requires_path() {
        let mut settings: Settings = toml::from_str(MINIMAL).unwrap();
        settings.ledger.backend = LedgerBackend::File;
        settings.ledger.path = None;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_delay_window() {
        let mut settings: Settings = toml::from_str(MINIMAL).unwrap();
        settings.simulator.min_delay_ms = 8_000;
        settings.simulator.max_delay_ms = 3_000;
        assert!(settings.validate().is_err());
    }
}
