// file: src/spreadsheet/column.rs
// description: column identifier parsing and cell reference synthesis
// reference: https://docs.rs/regex

use crate::error::{CheckerError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    pub static ref COLUMN_ID: Regex = Regex::new(r"^[A-Za-z]{1,3}$")
        .expect("COLUMN_ID regex is valid");

    pub static ref CELL_REFERENCE: Regex = Regex::new(r"^\$?([A-Za-z]{1,3})\$?([0-9]+)$")
        .expect("CELL_REFERENCE regex is valid");
}

/// Largest column Excel can address (`XFD`).
pub const MAX_COLUMN_NUMBER: u32 = 16_384;

/// A validated, upper-cased column identifier such as `A` or `AB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    letters: String,
    number: u32,
}

impl ColumnRef {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(CheckerError::InvalidInput(
                "Please specify a column.".to_string(),
            ));
        }

        if !COLUMN_ID.is_match(trimmed) {
            return Err(CheckerError::InvalidInput(format!(
                "'{}' is not a column identifier (expected letters such as A or AB)",
                trimmed
            )));
        }

        let letters = trimmed.to_ascii_uppercase();
        let number = column_number(&letters);

        if number > MAX_COLUMN_NUMBER {
            return Err(CheckerError::InvalidInput(format!(
                "Column {} is beyond the last spreadsheet column XFD",
                letters
            )));
        }

        Ok(Self { letters, number })
    }

    pub fn letters(&self) -> &str {
        &self.letters
    }

    /// One-based column number, `A` = 1.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Synthesizes the cell reference for this column on `row`, e.g. `B17`.
    pub fn cell_reference(&self, row: u32) -> String {
        format!("{}{}", self.letters, row)
    }

    pub fn matches_reference(&self, reference: &str, row: u32) -> bool {
        reference.eq_ignore_ascii_case(&self.cell_reference(row))
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.letters)
    }
}

/// Resolves column letters to their one-based number (`A` = 1, `AB` = 28).
/// Callers pass ASCII letters only.
pub fn column_number(letters: &str) -> u32 {
    letters
        .bytes()
        .map(|b| u32::from(b.to_ascii_uppercase() - b'A' + 1))
        .fold(0, |sum, digit| sum * 26 + digit)
}

/// Inverse of [`column_number`].
pub fn column_letters(mut number: u32) -> String {
    let mut letters = Vec::new();

    while number > 0 {
        let rem = (number - 1) % 26;
        letters.push(b'A' + rem as u8);
        number = (number - 1) / 26;
    }

    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Splits a cell reference such as `AB12` into its column letters and row.
pub fn split_reference(reference: &str) -> Option<(String, u32)> {
    let caps = CELL_REFERENCE.captures(reference)?;
    let row = caps.get(2)?.as_str().parse().ok()?;
    Some((caps.get(1)?.as_str().to_ascii_uppercase(), row))
}
