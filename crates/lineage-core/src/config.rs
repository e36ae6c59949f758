// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Externally settable options of pipeline items

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Option values keyed by option name
pub type Options = HashMap<String, ConfigValue>;

/// Type of an option value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigType {
    /// `true` / `false`
    Bool,
    /// Signed integer
    Int,
    /// Floating point
    Float,
    /// Free text
    String,
    /// List of strings
    StringList,
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigType::Bool => "bool",
            ConfigType::Int => "int",
            ConfigType::Float => "float",
            ConfigType::String => "string",
            ConfigType::StringList => "string list",
        };
        f.write_str(name)
    }
}

/// An option value
///
/// Deserializes from plain JSON values, so an options file reads like
/// `{"RenameAnalysis.SimilarityThreshold": 80}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Text value
    String(String),
    /// List of strings
    StringList(Vec<String>),
}

impl ConfigValue {
    /// Type of this value
    #[must_use]
    pub fn kind(&self) -> ConfigType {
        match self {
            ConfigValue::Bool(_) => ConfigType::Bool,
            ConfigValue::Int(_) => ConfigType::Int,
            ConfigValue::Float(_) => ConfigType::Float,
            ConfigValue::String(_) => ConfigType::String,
            ConfigValue::StringList(_) => ConfigType::StringList,
        }
    }

    /// The boolean, if this is one
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The integer, if this is one
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// The string list, if this is one
    #[must_use]
    pub fn as_string_list(&self) -> Option<&[String]> {
        match self {
            ConfigValue::StringList(values) => Some(values),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(value) => write!(f, "{value}"),
            ConfigValue::Int(value) => write!(f, "{value}"),
            ConfigValue::Float(value) => write!(f, "{value}"),
            ConfigValue::String(value) => write!(f, "{value:?}"),
            ConfigValue::StringList(values) => write!(f, "{values:?}"),
        }
    }
}

/// Description of one option accepted by an item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationOption {
    /// Name used as the key in [`Options`]
    pub name: &'static str,
    /// Short command line spelling, as in `--set <flag>=<value>`
    pub flag: &'static str,
    /// Help text
    pub description: &'static str,
    /// Expected value type
    pub kind: ConfigType,
    /// Value used when the option is absent or invalid
    pub default: ConfigValue,
}

impl ConfigurationOption {
    /// One help line: `name, flag <type>  description (default: value)`
    #[must_use]
    pub fn help_line(&self) -> String {
        format!(
            "{}, {} <{}>  {} (default: {})",
            self.name, self.flag, self.kind, self.description, self.default
        )
    }

    /// Parse command line text as a value of this option's type
    ///
    /// String lists are comma separated. Returns `None` if the text does
    /// not parse as the expected type.
    #[must_use]
    pub fn parse_value(&self, text: &str) -> Option<ConfigValue> {
        match self.kind {
            ConfigType::Bool => text.parse().ok().map(ConfigValue::Bool),
            ConfigType::Int => text.parse().ok().map(ConfigValue::Int),
            ConfigType::Float => text.parse().ok().map(ConfigValue::Float),
            ConfigType::String => Some(ConfigValue::String(text.to_string())),
            ConfigType::StringList => Some(ConfigValue::StringList(
                text.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
        }
    }
}

/// Read option `name` from `options`
///
/// Returns `None` when the option is absent, so the caller keeps its current
/// value. A value of the wrong type is logged and replaced by `default`.
pub fn read_option<T>(
    options: &Options,
    name: &str,
    default: T,
    read: impl FnOnce(&ConfigValue) -> Option<T>,
) -> Option<T> {
    let value = options.get(name)?;
    Some(read(value).unwrap_or_else(|| {
        warn!(option = name, %value, "unexpected option type, using the default");
        default
    }))
}
