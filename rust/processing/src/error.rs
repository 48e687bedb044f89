// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for batch processing.

use thiserror::Error;

/// Result type alias for batch processing.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A line failed under [`ErrorPolicy::Abort`](crate::ErrorPolicy::Abort)
    #[error(transparent)]
    Parse(#[from] opl_lite_core::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
