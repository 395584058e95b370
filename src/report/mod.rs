// file: src/report/mod.rs
// description: run artifacts written to disk
// reference: internal module structure

pub mod miss_log;

pub use miss_log::MissLogger;
