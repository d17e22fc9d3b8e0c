//! CLI definitions for aot-collector
//!
//! This module defines the CLI structure using clap's derive macros.

use crate::config::{ConfigFlags, DEFAULT_CONFIG_LOCATION, ExpandMode};
use crate::logging::DEFAULT_LOG_FILE;
use clap::Parser;

/// AWS OTel Collector
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration location: a file path or `file:`, `env:` or `yaml:` URI.
    /// Repeat to merge several; later ones win. Ignored when
    /// AOT_CONFIG_CONTENT is set.
    #[arg(long = "config", value_name = "LOCATION", default_value = DEFAULT_CONFIG_LOCATION)]
    pub config: Vec<String>,

    /// Override a configuration property, e.g. `--set exporters.logging.loglevel=debug`.
    /// Applied after variable expansion.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Fail on `${VAR}` references to unset variables instead of leaving them as-is
    #[arg(long)]
    pub strict_expand: bool,

    /// Keep running and re-resolve when configuration files change
    #[arg(long)]
    pub watch: bool,

    /// Print the resolved configuration as YAML and exit
    #[arg(long)]
    pub print: bool,

    /// Path of the rotating collector log file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub log_file: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn config_flags(&self) -> ConfigFlags {
        let mode = if self.strict_expand {
            ExpandMode::Strict
        } else {
            ExpandMode::Permissive
        };
        ConfigFlags::new(self.config.clone())
            .with_set(self.set.clone())
            .with_expand_mode(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["aot-collector"]).unwrap();
        assert_eq!(cli.config, [DEFAULT_CONFIG_LOCATION]);
        assert!(cli.set.is_empty());
        assert_eq!(cli.log_file, DEFAULT_LOG_FILE);
        assert_eq!(cli.config_flags().expand_mode, ExpandMode::Permissive);
    }

    #[test]
    fn test_repeated_flags_keep_order() {
        let cli = Cli::try_parse_from([
            "aot-collector",
            "--config",
            "file:/a.yaml",
            "--config",
            "yaml:x: 1",
            "--set",
            "a.b=1",
            "--set",
            "a.b=2",
            "--strict-expand",
        ])
        .unwrap();
        let flags = cli.config_flags();
        assert_eq!(flags.locations, ["file:/a.yaml", "yaml:x: 1"]);
        assert_eq!(flags.set, ["a.b=1", "a.b=2"]);
        assert_eq!(flags.expand_mode, ExpandMode::Strict);
    }
}
