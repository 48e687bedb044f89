// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parallel batch driver
//!
//! Splits a slice of lines into chunks, parses every chunk on the rayon
//! pool into its own sink and merges the chunks back in input order, so
//! the output does not depend on the number of threads.

use std::time::Instant;

use opl_lite_core::{parse_line, Entity, EntityBits, EntityKind};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::config::{BatchConfig, ErrorPolicy};
use crate::error::Result;

/// Counters for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Lines in the batch
    pub lines: usize,
    /// Entities produced
    pub entities: usize,
    /// Empty lines, comments and filtered kinds
    pub skipped_lines: usize,
    /// Lines that failed to parse (only non-zero under the skip policy)
    pub failed_lines: usize,
    pub per_kind: FxHashMap<EntityKind, usize>,
    pub parse_time_ms: u64,
}

impl BatchStats {
    pub fn count(&self, kind: EntityKind) -> usize {
        self.per_kind.get(&kind).copied().unwrap_or(0)
    }
}

/// Result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    /// Entities in input order
    pub entities: Vec<Entity>,
    /// Errors of skipped lines in input order
    pub errors: Vec<opl_lite_core::Error>,
    pub stats: BatchStats,
}

/// Output of one worker
#[derive(Default)]
struct ChunkResult {
    entities: Vec<Entity>,
    errors: Vec<opl_lite_core::Error>,
    skipped: usize,
}

fn parse_chunk(
    lines: &[&str],
    first_line: u64,
    read_types: EntityBits,
    policy: ErrorPolicy,
) -> ChunkResult {
    let mut result = ChunkResult {
        entities: Vec::with_capacity(lines.len()),
        ..Default::default()
    };

    for (offset, line) in lines.iter().enumerate() {
        let line_number = first_line + offset as u64;
        match parse_line(line_number, line, &mut result.entities, read_types) {
            Ok(true) => {}
            Ok(false) => result.skipped += 1,
            Err(err) => {
                result.errors.push(err);
                if policy == ErrorPolicy::Abort {
                    break;
                }
            }
        }
    }

    result
}

/// Parse `lines` in parallel; `lines[0]` is line number `first_line`.
///
/// Under [`ErrorPolicy::Abort`] the error of the lowest-numbered failing
/// line is returned. Under [`ErrorPolicy::Skip`] failing lines are logged
/// and collected in [`BatchOutput::errors`].
pub fn parse_batch(lines: &[&str], first_line: u64, config: &BatchConfig) -> Result<BatchOutput> {
    config.validate()?;
    let start = Instant::now();
    let chunk_size = config.chunk_size;

    let chunks: Vec<ChunkResult> = lines
        .par_chunks(chunk_size)
        .enumerate()
        .map(|(index, chunk)| {
            let chunk_first = first_line + (index * chunk_size) as u64;
            let result = parse_chunk(chunk, chunk_first, config.read_types, config.error_policy);
            tracing::debug!(
                chunk = index,
                first_line = chunk_first,
                lines = chunk.len(),
                entities = result.entities.len(),
                errors = result.errors.len(),
                "Parsed chunk"
            );
            result
        })
        .collect();

    let mut output = BatchOutput {
        entities: Vec::with_capacity(chunks.iter().map(|c| c.entities.len()).sum()),
        ..Default::default()
    };
    output.stats.lines = lines.len();

    for mut chunk in chunks {
        if config.error_policy == ErrorPolicy::Abort {
            if let Some(err) = chunk.errors.pop() {
                tracing::debug!(line = err.line, error = %err, "Aborting batch");
                return Err(err.into());
            }
        }
        for err in &chunk.errors {
            tracing::warn!(
                line = err.line,
                column = err.column,
                error = %err.kind,
                "Skipping malformed OPL line"
            );
        }
        output.stats.skipped_lines += chunk.skipped;
        output.stats.failed_lines += chunk.errors.len();
        output.errors.append(&mut chunk.errors);
        output.entities.append(&mut chunk.entities);
    }

    let stats = &mut output.stats;
    stats.entities = output.entities.len();
    for entity in &output.entities {
        *stats.per_kind.entry(entity.kind()).or_insert(0) += 1;
    }
    stats.parse_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        lines = stats.lines,
        entities = stats.entities,
        skipped = stats.skipped_lines,
        failed = stats.failed_lines,
        parse_time_ms = stats.parse_time_ms,
        "Batch parsing complete"
    );

    Ok(output)
}

/// Split `text` into lines (`\n` or `\r\n`) and parse them as one batch
/// starting at line 1.
pub fn parse_text(text: &str, config: &BatchConfig) -> Result<BatchOutput> {
    let lines: Vec<&str> = text.lines().collect();
    parse_batch(&lines, 1, config)
}
