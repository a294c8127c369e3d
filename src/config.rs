//! TOML configuration with environment overrides.
//!
//! `load` only parses; callers apply their own overrides and then `validate`.

use crate::error::{FinderError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub input: InputSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSection {
    /// Largest identifier to try. Values below 1 search nothing.
    #[serde(default = "default_max_id")]
    pub max_id: i64,

    /// Worker threads; 0 uses every available core
    #[serde(default)]
    pub workers: usize,

    /// Candidates hashed between progress updates
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSection {
    /// Header of the column holding the hashes. Unset reads one hash per line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_output_path")]
    pub path: String,

    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default = "default_hash_header")]
    pub hash_header: String,

    #[serde(default = "default_id_header")]
    pub id_header: String,
}

fn default_max_id() -> i64 {
    5_000_000
}

fn default_progress_interval() -> u64 {
    100_000
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_output_path() -> String {
    "trader_id_results.csv".to_string()
}

fn default_hash_header() -> String {
    "Trader Hash".to_string()
}

fn default_id_header() -> String {
    "Trader ID".to_string()
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            max_id: default_max_id(),
            workers: 0,
            progress_interval: default_progress_interval(),
        }
    }
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            column: None,
            delimiter: default_delimiter(),
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: OutputFormat::default(),
            hash_header: default_hash_header(),
            id_header: default_id_header(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    /// The result is not validated yet.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FinderError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut config: Config = toml::from_str(&content)?;
        config.load_from_env()?;

        Ok(config)
    }

    /// Load `path` if it exists, otherwise start from defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let mut config = Config::default();
            config.load_from_env()?;
            Ok(config)
        }
    }

    /// Environment overrides: `IDFIND_MAX_ID`, `IDFIND_WORKERS`.
    fn load_from_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("IDFIND_MAX_ID") {
            if !value.is_empty() {
                self.search.max_id = value.trim().parse().map_err(|_| {
                    FinderError::Config(format!("IDFIND_MAX_ID is not an integer: {}", value))
                })?;
            }
        }

        if let Ok(value) = std::env::var("IDFIND_WORKERS") {
            if !value.is_empty() {
                self.search.workers = value.trim().parse().map_err(|_| {
                    FinderError::Config(format!("IDFIND_WORKERS is not a count: {}", value))
                })?;
            }
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.search.progress_interval == 0 {
            return Err(FinderError::Config(
                "search.progress_interval must be >= 1".to_string(),
            ));
        }

        if let Some(column) = &self.input.column {
            if column.trim().is_empty() {
                return Err(FinderError::Config(
                    "input.column must not be empty (omit it to read one hash per line)"
                        .to_string(),
                ));
            }
        }

        let mut delimiter = self.input.delimiter.chars();
        if !matches!((delimiter.next(), delimiter.next()), (Some(c), None) if c.is_ascii()) {
            return Err(FinderError::Config(format!(
                "input.delimiter must be a single ASCII character, got {:?}",
                self.input.delimiter
            )));
        }

        if self.output.path.trim().is_empty() {
            return Err(FinderError::Config("output.path must not be empty".to_string()));
        }

        for (name, header) in [
            ("hash_header", &self.output.hash_header),
            ("id_header", &self.output.id_header),
        ] {
            if header.trim().is_empty() {
                return Err(FinderError::Config(format!("output.{} must not be empty", name)));
            }
        }

        Ok(())
    }

    /// Worker count for the search, `None` meaning every available core.
    pub fn workers(&self) -> Option<usize> {
        match self.search.workers {
            0 => None,
            n => Some(n),
        }
    }

    /// The single delimiter character. Only meaningful after `validate`.
    pub fn delimiter(&self) -> char {
        self.input.delimiter.chars().next().unwrap_or(',')
    }

    /// Create default configuration
    pub fn default_toml() -> String {
        r#"
[search]
max_id = 5_000_000
workers = 0                  # 0 = all available cores
progress_interval = 100_000

[input]
# column = "Trader Hash"     # omit to read one hash per line
delimiter = ","

[output]
path = "trader_id_results.csv"
format = "csv"               # csv | json
hash_header = "Trader Hash"
id_header = "Trader ID"
"#
        .to_string()
    }

    /// Save default config to file
    pub fn save_default(path: &Path) -> Result<()> {
        fs::write(path, Self::default_toml())?;
        Ok(())
    }
}
