// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use thiserror::Error;

pub const PARAMETERIZE_CONSTANTS_PARAM: &str = "EXO_OQL_PARAMETERIZE_CONSTANTS";
pub const MAX_SETTER_DEPTH_PARAM: &str = "EXO_OQL_MAX_SETTER_DEPTH";

const DEFAULT_MAX_SETTER_DEPTH: usize = 16;

pub trait Environment: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn enabled(&self, key: &str, default_value: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            Some(value) => match value.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" | "enabled" | "enable" => Ok(true),
                "false" | "0" | "no" | "off" | "disabled" | "disable" => Ok(false),
                _ => Err(ConfigError::InvalidBoolean {
                    key: key.to_string(),
                    value,
                }),
            },
            None => Ok(default_value),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error(
        "Invalid value for {key}: {value}. Expected true, 1, yes, on, enabled, enable OR false, 0, no, off, disabled, disable"
    )]
    InvalidBoolean { key: String, value: String },

    #[error("Invalid value for {key}: {value}. Expected a positive integer")]
    InvalidNumber { key: String, value: String },
}

pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Default)]
pub struct MapEnvironment {
    values: HashMap<String, String>,
}

impl Environment for MapEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for MapEnvironment {
    fn from(values: [(&str, &str); N]) -> Self {
        Self {
            values: HashMap::from_iter(
                values
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string())),
            ),
        }
    }
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Knobs that affect the shape of compiled statements.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerConfig {
    /// Compile constants to numbered parameters (`p1`, `p2`, ...) carrying their value instead
    /// of inlining them
    pub parameterize_constants: bool,
    /// How deeply construction expressions in a setter may nest
    pub max_setter_depth: usize,
}

impl CompilerConfig {
    pub fn from_env(env: &dyn Environment) -> Result<Self, ConfigError> {
        let parameterize_constants = env.enabled(PARAMETERIZE_CONSTANTS_PARAM, false)?;

        let max_setter_depth = match env.get(MAX_SETTER_DEPTH_PARAM) {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => depth,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        key: MAX_SETTER_DEPTH_PARAM.to_string(),
                        value,
                    });
                }
            },
            None => DEFAULT_MAX_SETTER_DEPTH,
        };

        Ok(Self {
            parameterize_constants,
            max_setter_depth,
        })
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            parameterize_constants: false,
            max_setter_depth: DEFAULT_MAX_SETTER_DEPTH,
        }
    }
}
