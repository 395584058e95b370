// file: src/verifier/mod.rs
// description: existence verification module exports
// reference: internal module structure

pub mod existence;

pub use existence::{ExistenceProbe, ExistenceVerifier, Verification, filesystem_probe};
