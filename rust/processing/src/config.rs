// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batch configuration loaded from environment variables.

use std::fmt;
use std::str::FromStr;

use opl_lite_core::config::{read_types_from, READ_TYPES_ENV};
use opl_lite_core::EntityBits;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const ERROR_POLICY_ENV: &str = "OPL_ERROR_POLICY";
pub const CHUNK_SIZE_ENV: &str = "OPL_CHUNK_SIZE";

/// Lines handed to one worker at a time
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// What to do with a line that fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Fail the whole batch with the first bad line
    #[default]
    Abort,
    /// Log the bad line, keep its error and carry on
    Skip,
}

impl FromStr for ErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(ErrorPolicy::Abort),
            "skip" => Ok(ErrorPolicy::Skip),
            other => Err(Error::InvalidConfig(format!(
                "unknown error policy '{}' (expected abort or skip)",
                other
            ))),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorPolicy::Abort => "abort",
            ErrorPolicy::Skip => "skip",
        })
    }
}

/// Batch parsing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Entity kinds to materialize.
    pub read_types: EntityBits,
    /// Handling of lines that fail to parse.
    pub error_policy: ErrorPolicy,
    /// Number of lines parsed by one worker before results are merged.
    pub chunk_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            read_types: EntityBits::ALL,
            error_policy: ErrorPolicy::Abort,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl BatchConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, falling back to the defaults
    /// for missing or unparseable values.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let error_policy = match lookup(ERROR_POLICY_ENV) {
            Some(value) => value.parse().unwrap_or_else(|err: Error| {
                tracing::warn!(error = %err, "Ignoring {}", ERROR_POLICY_ENV);
                defaults.error_policy
            }),
            None => defaults.error_policy,
        };
        Self {
            read_types: read_types_from(lookup(READ_TYPES_ENV).as_deref()),
            error_policy,
            chunk_size: lookup(CHUNK_SIZE_ENV)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.chunk_size),
        }
    }

    /// Reject settings the batch driver cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk size must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: FxHashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BatchConfig::from_vars(vars(&[]));
        assert_eq!(config, BatchConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_vars() {
        let config = BatchConfig::from_vars(vars(&[
            ("OPL_READ_TYPES", "wr"),
            ("OPL_ERROR_POLICY", "Skip"),
            ("OPL_CHUNK_SIZE", "64"),
        ]));
        assert_eq!(config.read_types, EntityBits::WAY | EntityBits::RELATION);
        assert_eq!(config.error_policy, ErrorPolicy::Skip);
        assert_eq!(config.chunk_size, 64);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = BatchConfig::from_vars(vars(&[
            ("OPL_READ_TYPES", "q"),
            ("OPL_ERROR_POLICY", "retry"),
            ("OPL_CHUNK_SIZE", "many"),
        ]));
        assert_eq!(config, BatchConfig::default());
    }

    #[test]
    fn test_zero_chunk_size_is_invalid() {
        let config = BatchConfig::from_vars(vars(&[("OPL_CHUNK_SIZE", "0")]));
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_policy_round_trip() {
        for policy in [ErrorPolicy::Abort, ErrorPolicy::Skip] {
            assert_eq!(policy.to_string().parse::<ErrorPolicy>().unwrap(), policy);
        }
    }
}
