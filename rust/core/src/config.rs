// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser configuration loaded from environment variables.

use crate::model::EntityBits;

/// Environment variable holding the entity kinds to read, e.g. `nwr`
pub const READ_TYPES_ENV: &str = "OPL_READ_TYPES";

/// Line parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParserConfig {
    /// Entity kinds to materialize; other kinds are skipped unparsed.
    pub read_types: EntityBits,
}

impl ParserConfig {
    /// Load configuration from environment variables.
    ///
    /// Missing or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self {
            read_types: read_types_from(std::env::var(READ_TYPES_ENV).ok().as_deref()),
        }
    }
}

/// Entity mask for an optional letter list, falling back to all kinds.
pub fn read_types_from(value: Option<&str>) -> EntityBits {
    let Some(value) = value.map(str::trim) else {
        return EntityBits::default();
    };
    match EntityBits::from_letters(value) {
        Some(bits) if !bits.is_empty() => bits,
        _ => {
            tracing::warn!(value, "Ignoring invalid {}", READ_TYPES_ENV);
            EntityBits::default()
        }
    }
}
