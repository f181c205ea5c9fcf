//! Integration tests for texcube
//!
//! These tests require a TeX installation with `pdflatex` on PATH.
//! Run with: cargo test -p texcube --features integration-tests
//!
//! Tests that invoke a real engine are marked `#[ignore]`. To include them:
//!    cargo test -p texcube --features integration-tests -- --include-ignored

#![cfg(feature = "integration-tests")]

use std::fs;
use std::path::Path;

use texcube::config::Config;

mod compilation;
mod concurrency;
mod config_loading;
mod workspace_lifecycle;

const FIXTURES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Helper to get fixture file content
pub(crate) fn fixture_source(name: &str) -> Vec<u8> {
    let path = format!("{FIXTURES_PATH}/sources/{name}");
    fs::read(&path).unwrap_or_else(|e| panic!("Failed to read fixture {path}: {e}"))
}

/// Default configuration rooted at `scratch`, with engines searched on the caller's PATH.
pub(crate) fn test_config(scratch: &Path) -> Config {
    let mut config = Config::default();
    config.scratch_root = Some(scratch.to_path_buf());
    if let Ok(path) = std::env::var("PATH") {
        for engine in config.engines.values_mut() {
            engine.path = path.clone();
        }
    }
    config
}

/// Number of entries left in a scratch root
pub(crate) fn entries(dir: &Path) -> usize {
    fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
