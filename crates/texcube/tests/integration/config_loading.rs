use texcube::config::{Config, ConfigError};

use super::FIXTURES_PATH;

fn load(name: &str) -> Result<Config, ConfigError> {
    Config::from_file(format!("{FIXTURES_PATH}/configs/{name}"))
}

#[test]
fn test_load_valid_config() {
    let config = load("valid_full.toml").expect("Failed to load config");

    assert_eq!(config.max_concurrent, 2);
    assert_eq!(config.default_engine, "xelatex");
    assert!(config.engines.contains_key("pdflatex"));

    let xelatex = config.engine_or_default(None).unwrap();
    assert_eq!(xelatex.program, "/usr/bin/xelatex");
    assert_eq!(xelatex.source_name.as_str(), "document.tex");
    assert_eq!(xelatex.download_name, "paper.pdf");
    assert_eq!(xelatex.timeout, 45.0);
    assert_eq!(xelatex.env.len(), 1);

    let pdflatex = config.get_engine("pdflatex").unwrap();
    assert_eq!(pdflatex.args, vec!["-file-line-error", "-halt-on-error"]);
    assert_eq!(pdflatex.artifact_name.as_str(), "main.pdf");
}

#[test]
fn test_load_minimal_config() {
    let config = load("valid_minimal.toml").expect("Failed to load config");

    let engine = config.get_engine("tex").unwrap();
    assert_eq!(engine.program, "pdftex");
    assert_eq!(engine.timeout, 30.0);
    assert_eq!(config.max_concurrent, 4);
}

#[test]
fn test_load_missing_file() {
    let result = load("does_not_exist.toml");
    assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
}

#[test]
fn test_load_invalid_shell_escape() {
    let result = load("invalid_shell_escape.toml");
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_load_invalid_default_engine() {
    let result = load("invalid_default_engine.toml");
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_load_invalid_empty_program() {
    let result = load("invalid_empty_program.toml");
    assert!(result.is_err());
}

#[test]
fn test_load_invalid_source_name() {
    let result = load("invalid_source_name.toml");
    assert!(result.is_err());
}

#[test]
fn test_load_invalid_zero_concurrency() {
    let result = load("invalid_zero_concurrency.toml");
    assert!(result.is_err());
}

#[test]
fn test_load_invalid_huge_timeout() {
    let result = load("invalid_huge_timeout.toml");
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}
