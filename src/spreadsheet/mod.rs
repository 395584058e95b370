// file: src/spreadsheet/mod.rs
// description: streaming xlsx column extraction module exports
// reference: internal module structure

pub mod column;
pub mod extractor;
pub mod package;
pub mod rows;
pub mod shared_strings;

#[cfg(test)]
pub(crate) mod fixture;

pub use column::{ColumnRef, column_number};
pub use extractor::{ColumnExtractor, Extraction};
pub use package::WorkbookPackage;
pub use shared_strings::SharedStrings;
