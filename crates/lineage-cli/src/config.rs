// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Configuration for the lineage command line
//!
//! Flags select the repository and the slice of history to replay. Stage
//! options come from an optional JSON options file, then `--threshold` and
//! any `--set FLAG=VALUE` overrides, in that order.

use std::path::PathBuf;

use clap::Parser;
use lineage_core::{ConfigValue, ConfigurationOption, Options, WalkOptions};
use lineage_plumbing::renames::CONFIG_SIMILARITY_THRESHOLD;

/// Replay git history and report per-file lifelines, following renames
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "lineage")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Path inside the git repository to analyze
    ///
    /// Defaults to the current working directory.
    #[arg(short, long, env = "LINEAGE_REPOSITORY")]
    pub repository: Option<PathBuf>,

    /// Replay only the N most recent commits
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Start from this reference instead of HEAD
    #[arg(long)]
    pub from: Option<String>,

    /// Write the compact binary encoding instead of text
    #[arg(long, default_value = "false")]
    pub binary: bool,

    /// Rename similarity threshold in percent (0-100)
    #[arg(short = 'M', long, env = "LINEAGE_THRESHOLD")]
    pub threshold: Option<i64>,

    /// JSON file with stage options
    ///
    /// Defaults to lineage/options.json under the platform config
    /// directory, which is read only if it exists.
    #[arg(short, long, env = "LINEAGE_OPTIONS")]
    pub options: Option<PathBuf>,

    /// Set a stage option, as FLAG=VALUE (repeatable)
    ///
    /// FLAG is the option's flag or full name; see --list-options.
    #[arg(short, long = "set", value_name = "FLAG=VALUE")]
    pub set: Vec<String>,

    /// Enable verbose logging (debug level)
    ///
    /// Logs go to stderr so they never mix with the report.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Print every stage option and exit
    #[arg(long, default_value = "false")]
    pub list_options: bool,
}

impl Config {
    /// Repository path, using the current directory as default
    ///
    /// Returns `None` if no repository is specified and the current
    /// directory cannot be determined.
    #[must_use]
    pub fn repository_path(&self) -> Option<PathBuf> {
        self.repository
            .clone()
            .or_else(|| std::env::current_dir().ok())
    }

    /// Options file path, using a default if not specified
    ///
    /// Default location is platform-specific:
    /// - macOS: ~/Library/Application Support/lineage/options.json
    /// - Linux: ~/.config/lineage/options.json
    /// - Windows: %APPDATA%\lineage\options.json
    #[must_use]
    pub fn options_path(&self) -> PathBuf {
        self.options.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("lineage")
                .join("options.json")
        })
    }

    /// Stage options from the options file plus command line overrides
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given options file is missing, or
    /// if the file cannot be read or parsed.
    pub fn load_options(&self) -> Result<Options, ConfigError> {
        let path = self.options_path();
        let mut options = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|err| ConfigError::OptionsRead(path.clone(), err))?;
            serde_json::from_str::<Options>(&text)
                .map_err(|err| ConfigError::OptionsParse(path.clone(), err))?
        } else if self.options.is_some() {
            return Err(ConfigError::OptionsNotFound(path));
        } else {
            Options::new()
        };
        if let Some(threshold) = self.threshold {
            options.insert(
                CONFIG_SIMILARITY_THRESHOLD.to_string(),
                ConfigValue::Int(threshold),
            );
        }
        Ok(options)
    }

    /// Apply `--set` overrides on top of `options`
    ///
    /// # Errors
    ///
    /// Returns an error if an override is not `FLAG=VALUE`, names no known
    /// option, or its value does not parse as the option's type.
    pub fn apply_overrides(
        &self,
        options: &mut Options,
        known: &[ConfigurationOption],
    ) -> Result<(), ConfigError> {
        for assignment in &self.set {
            let (flag, text) = assignment
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedOverride(assignment.clone()))?;
            let option = known
                .iter()
                .find(|option| option.flag == flag || option.name == flag)
                .ok_or_else(|| ConfigError::UnknownOption(flag.to_string()))?;
            let value = option
                .parse_value(text)
                .ok_or_else(|| ConfigError::InvalidOptionValue {
                    flag: flag.to_string(),
                    value: text.to_string(),
                    kind: option.kind.to_string(),
                })?;
            options.insert(option.name.to_string(), value);
        }
        Ok(())
    }

    /// Which commits to replay
    #[must_use]
    pub fn walk_options(&self) -> WalkOptions {
        let mut walk = WalkOptions::default().first_parent();
        walk.limit = self.limit;
        walk.from_ref = self.from.clone();
        walk
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the repository path is specified but doesn't
    /// exist, or the threshold is outside 0-100.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref repository) = self.repository {
            if !repository.exists() {
                return Err(ConfigError::RepositoryNotFound(repository.clone()));
            }
        }
        if let Some(threshold) = self.threshold {
            if !(0..=100).contains(&threshold) {
                return Err(ConfigError::ThresholdOutOfRange(threshold));
            }
        }
        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Repository path not found
    #[error("Repository path not found: {0}")]
    RepositoryNotFound(PathBuf),

    /// Threshold outside 0-100
    #[error("Similarity threshold must be between 0 and 100, got {0}")]
    ThresholdOutOfRange(i64),

    /// Explicit options file does not exist
    #[error("Options file not found: {0}")]
    OptionsNotFound(PathBuf),

    /// Options file could not be read
    #[error("Failed to read options file {0}: {1}")]
    OptionsRead(PathBuf, std::io::Error),

    /// Options file is not a JSON object of option values
    #[error("Failed to parse options file {0}: {1}")]
    OptionsParse(PathBuf, serde_json::Error),

    /// `--set` argument without `=`
    #[error("Expected FLAG=VALUE, got {0}")]
    MalformedOverride(String),

    /// `--set` names no registered option
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    /// `--set` value of the wrong type
    #[error("Option {flag} expects a {kind}, got {value}")]
    InvalidOptionValue {
        /// Flag as given
        flag: String,
        /// Value as given
        value: String,
        /// Expected type
        kind: String,
    },
}
