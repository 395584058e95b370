// file: src/exporter/mod.rs
// description: report export module exports

pub mod json;

pub use json::{ExportedReport, JsonExporter};
