// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batch processing on top of `opl-lite-core`: parallel parsing of many
//! lines, error policies and per-batch statistics.

pub mod batch;
pub mod config;
pub mod error;

pub use batch::{parse_batch, parse_text, BatchOutput, BatchStats};
pub use config::{BatchConfig, ErrorPolicy, DEFAULT_CHUNK_SIZE};
pub use error::{Error, Result};
