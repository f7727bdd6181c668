use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;

use crate::error::{BatterwayError, BatterwayResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub inventory: InventoryConfig,
    pub resolution: ResolutionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Directory holding the inventory CSV tables.
    pub data_dir: String,
    pub delimiter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    pub process: Option<String>,
    pub fixed_inputs_file: Option<String>,
    /// Merged over the fixed inputs read from file.
    pub fixed_inputs: BTreeMap<String, f64>,
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("BATTERWAY").separator("__"));

        config.build()?.try_deserialize()
    }
}

impl InventoryConfig {
    /// The CSV delimiter as a single byte.
    pub fn delimiter_byte(&self) -> BatterwayResult<u8> {
        match self.delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(BatterwayError::configuration(format!(
                "inventory.delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            ))),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            data_dir: "data/dataframes".to_string(),
            delimiter: ";".to_string(),
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            process: None,
            fixed_inputs_file: None,
            fixed_inputs: BTreeMap::new(),
            output_format: OutputFormat::Text,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}
