// file: src/utils/validation.rs
// description: input validation for run requests and output locations
// reference: input validation patterns

use crate::error::{CheckerError, Result};
use std::path::Path;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm"];

pub struct Validator;

impl Validator {
    /// The workbook must be an existing file with an Open XML spreadsheet
    /// extension.
    pub fn validate_spreadsheet_path(path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(CheckerError::InvalidInput(
                "Please select a spreadsheet.".to_string(),
            ));
        }

        if !path.is_file() {
            return Err(CheckerError::InvalidInput(format!(
                "Spreadsheet not found: {}",
                path.display()
            )));
        }

        Self::validate_spreadsheet_extension(path)
    }

    pub fn validate_spreadsheet_extension(path: &Path) -> Result<()> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension {
            Some(ext) if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
            _ => Err(CheckerError::InvalidInput(format!(
                "Not an Excel workbook (.xlsx): {}",
                path.display()
            ))),
        }
    }

    /// Accepts an existing directory or one that does not exist yet; rejects
    /// paths that name a file.
    pub fn validate_output_directory(path: &Path) -> Result<()> {
        if path.exists() && !path.is_dir() {
            return Err(CheckerError::InvalidInput(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }
        Ok(())
    }

    pub fn validate_workers(workers: usize) -> Result<()> {
        if workers == 0 {
            return Err(CheckerError::InvalidInput(
                "Worker count must be greater than 0".to_string(),
            ));
        }

        if workers > 1024 {
            return Err(CheckerError::InvalidInput(
                "Worker count too large (max 1024)".to_string(),
            ));
        }

        Ok(())
    }
}
