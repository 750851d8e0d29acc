use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// TOML-backed configuration. Every field has a default, so an absent file or
/// an empty one yields a working setup against the public APIs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub registry: RegistryConfig,
    pub geo: GeoConfig,
    pub input: InputConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Minimum gap between two registry requests.
    pub min_interval_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://brasilapi.com.br/api".to_string(),
            timeout_secs: 10,
            min_interval_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeoConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://servicodados.ibge.gov.br/api/v1/localidades".to_string(),
            timeout_secs: 5,
        }
    }
}

/// Column mapping for the input spreadsheet.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub identifier_column: String,
    pub state_column: String,
    pub municipality_column: Option<String>,
    pub label_column: Option<String>,
    /// Worksheet to read; the first one when unset.
    pub sheet: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            identifier_column: "CNPJ".to_string(),
            state_column: "UF do preço".to_string(),
            municipality_column: Some("Cidade".to_string()),
            label_column: Some("Empresa".to_string()),
            sheet: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub output: PathBuf,
    pub delimiter: char,
    /// How many entries the "top" sections of the summary list.
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("relatorio_cnpj_completo.csv"),
            delimiter: ';',
            top_n: 10,
        }
    }
}

/// Resolved runtime configuration: file values with environment overrides applied.
#[derive(Debug, Clone)]
pub struct Config {
    pub registry_base_url: String,
    pub registry_timeout: Duration,
    pub min_interval: Duration,
    pub geo_base_url: String,
    pub geo_timeout: Duration,
    pub input: InputConfig,
    pub report: ReportConfig,
}

impl Config {
    /// Load from an optional TOML file, then apply `CNPJ_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file_config = match path {
            Some(path) => load_config(path)?,
            None => FileConfig::default(),
        };
        let mut config = Self::from_file_config(file_config);
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file_config(file: FileConfig) -> Self {
        Self {
            registry_base_url: file.registry.base_url,
            registry_timeout: Duration::from_secs(file.registry.timeout_secs),
            min_interval: Duration::from_millis(file.registry.min_interval_ms),
            geo_base_url: file.geo.base_url,
            geo_timeout: Duration::from_secs(file.geo.timeout_secs),
            input: file.input,
            report: file.report,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = env::var("CNPJ_REGISTRY_URL") {
            self.registry_base_url = url;
        }
        if let Ok(url) = env::var("CNPJ_GEO_URL") {
            self.geo_base_url = url;
        }
        if let Ok(ms) = env::var("CNPJ_MIN_INTERVAL_MS") {
            let ms: u64 = ms
                .trim()
                .parse()
                .with_context(|| format!("CNPJ_MIN_INTERVAL_MS must be a number, got '{ms}'"))?;
            self.min_interval = Duration::from_millis(ms);
        }
        Ok(())
    }

    /// Log the effective settings at startup.
    pub fn log(&self) {
        tracing::info!(
            registry = %self.registry_base_url,
            geo = %self.geo_base_url,
            min_interval_ms = self.min_interval.as_millis() as u64,
            registry_timeout_secs = self.registry_timeout.as_secs(),
            geo_timeout_secs = self.geo_timeout.as_secs(),
            "Configuration loaded"
        );
    }
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}
