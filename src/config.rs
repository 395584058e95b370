// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{CheckerError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub extraction: ExtractionConfig,
    pub verification: VerificationConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractionConfig {
    /// Separator between multiple paths stored in one cell.
    pub separator: char,
    pub header_rows: u32,
    #[serde(default)]
    pub trim_entries: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// `None` means one worker per available processing unit.
    #[serde(default)]
    pub parallel_workers: Option<usize>,
    #[serde(default)]
    pub preserve_order: bool,
    pub require_regular_file: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// `None` means the directory containing the executable.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
    pub timestamp_format: String,
    pub header: String,
    pub message: String,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let defaults = Self::default_config();
        let mut builder = config::Config::builder()
            .set_default("extraction.separator", defaults.extraction.separator.to_string())
            .and_then(|b| b.set_default("extraction.header_rows", i64::from(defaults.extraction.header_rows)))
            .and_then(|b| b.set_default("extraction.trim_entries", defaults.extraction.trim_entries))
            .and_then(|b| {
                b.set_default(
                    "verification.preserve_order",
                    defaults.verification.preserve_order,
                )
            })
            .and_then(|b| {
                b.set_default(
                    "verification.require_regular_file",
                    defaults.verification.require_regular_file,
                )
            })
            .and_then(|b| b.set_default("log.file_prefix", defaults.log.file_prefix.clone()))
            .and_then(|b| {
                b.set_default("log.timestamp_format", defaults.log.timestamp_format.clone())
            })
            .and_then(|b| b.set_default("log.header", defaults.log.header.clone()))
            .and_then(|b| b.set_default("log.message", defaults.log.message.clone()))
            .map_err(|e| CheckerError::Config(e.to_string()))?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(
                config::File::from(Path::new("config/default.toml")).required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("FILEPATH_CHECKER")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| CheckerError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| CheckerError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            extraction: ExtractionConfig {
                separator: '|',
                header_rows: 1,
                trim_entries: false,
            },
            verification: VerificationConfig {
                parallel_workers: None,
                preserve_order: false,
                require_regular_file: true,
            },
            log: LogConfig {
                directory: None,
                file_prefix: "ERRORS".to_string(),
                timestamp_format: "%m-%d-%Y %H-%M-%S".to_string(),
                header: "Error;Filepath".to_string(),
                message: "File not found".to_string(),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.extraction.separator.is_whitespace() {
            return Err(CheckerError::Config(
                "separator must not be whitespace".to_string(),
            ));
        }

        if self.verification.parallel_workers == Some(0) {
            return Err(CheckerError::Config(
                "parallel_workers must be greater than 0".to_string(),
            ));
        }

        if self.log.file_prefix.trim().is_empty() {
            return Err(CheckerError::Config(
                "log file_prefix must not be empty".to_string(),
            ));
        }

        if !self.log.header.contains(';') {
            return Err(CheckerError::Config(
                "log header must be ';'-delimited".to_string(),
            ));
        }

        Ok(())
    }
}

impl VerificationConfig {
    pub fn effective_workers(&self) -> usize {
        self.parallel_workers
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }
}

impl LogConfig {
    /// Resolves the directory log files are written to.
    pub fn resolve_directory(&self) -> PathBuf {
        if let Some(dir) = &self.directory {
            return dir.clone();
        }

        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
