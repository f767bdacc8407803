//! Command-line argument parsing
//!
//! Supports:
//! - Highlighting one book file block by block
//! - Overriding the dictionary and disabling strategies
//! - Text or JSON output
//! - Saving the effective strategy settings back to the config file
//! - Watch mode (re-highlight when the file, config or dictionary changes)

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Highlight an XHTML/HTML book file in the background highlighter
#[derive(Parser, Debug)]
#[command(name = "milord", version, about = "Background markup and spelling highlighter")]
pub struct CliArgs {
    /// File to highlight
    #[arg(value_name = "FILE")]
    pub path: PathBuf,

    /// Word list for spell checking (one word per line)
    #[arg(short, long, value_name = "PATH")]
    pub dictionary: Option<PathBuf>,

    /// Disable a highlighter by name (repeatable)
    #[arg(long, value_name = "NAME")]
    pub disable: Vec<String>,

    /// Use this config file instead of ~/.config/milord/config.yaml
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the effective settings (after --disable) to the config file
    #[arg(long)]
    pub save_config: bool,

    /// Print spans as JSON
    #[arg(long)]
    pub json: bool,

    /// Keep running and re-highlight on changes
    #[arg(short, long)]
    pub watch: bool,

    /// Give up waiting for highlighting after N milliseconds
    #[arg(long, value_name = "MS", default_value_t = 10_000)]
    pub timeout_ms: u64,
}

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub path: PathBuf,
    pub dictionary: Option<PathBuf>,
    pub disabled: Vec<String>,
    pub config_path: Option<PathBuf>,
    pub save_config: bool,
    pub output: OutputFormat,
    pub watch: bool,
    pub timeout: Duration,
}

impl CliArgs {
    /// Convert parsed CLI args into a run configuration
    pub fn into_config(self) -> Result<RunConfig, String> {
        if self.path.is_dir() {
            return Err(format!("{} is a directory", self.path.display()));
        }
        if self.timeout_ms == 0 {
            return Err("--timeout-ms must be greater than zero".to_string());
        }

        Ok(RunConfig {
            path: self.path,
            dictionary: self.dictionary,
            disabled: self.disable,
            config_path: self.config,
            save_config: self.save_config,
            output: if self.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            watch: self.watch,
            timeout: Duration::from_millis(self.timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(path: &str) -> CliArgs {
        CliArgs {
            path: PathBuf::from(path),
            dictionary: None,
            disable: vec![],
            config: None,
            save_config: false,
            json: false,
            watch: false,
            timeout_ms: 10_000,
        }
    }

    #[test]
    fn test_defaults() {
        let config = args("book.xhtml").into_config().unwrap();
        assert_eq!(config.output, OutputFormat::Text);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!config.watch);
        assert!(!config.save_config);
    }

    #[test]
    fn test_parse_save_config_with_path() {
        let parsed = CliArgs::try_parse_from([
            "milord",
            "book.xhtml",
            "--save-config",
            "--config",
            "custom.yaml",
        ])
        .unwrap();
        let config = parsed.into_config().unwrap();
        assert!(config.save_config);
        assert_eq!(config.config_path, Some(PathBuf::from("custom.yaml")));
    }

    #[test]
    fn test_json_flag() {
        let mut a = args("book.xhtml");
        a.json = true;
        assert_eq!(a.into_config().unwrap().output, OutputFormat::Json);
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let a = args(dir.path().to_str().unwrap());
        assert!(a.into_config().is_err());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut a = args("book.xhtml");
        a.timeout_ms = 0;
        assert!(a.into_config().is_err());
    }

    #[test]
    fn test_parse_repeated_disable() {
        let parsed = CliArgs::try_parse_from([
            "milord",
            "book.xhtml",
            "--disable",
            "spelling",
            "--disable",
            "markup",
        ])
        .unwrap();
        assert_eq!(parsed.disable, vec!["spelling", "markup"]);
    }
}
