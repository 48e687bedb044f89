// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line dispatcher
//!
//! Looks at the first character of a line, skips empty lines, comments and
//! filtered kinds, runs the matching assembler and commits the result to
//! the caller's sink. This is the only place that knows the line number.

use crate::assemble::assemble_entity;
use crate::config::ParserConfig;
use crate::error::{ErrorKind, Result};
use crate::model::{Entity, EntityBits, EntityKind, EntitySink};
use crate::scan::Cursor;

/// Parse one line and commit at most one entity to `sink`.
///
/// Returns `Ok(true)` if an entity was committed and `Ok(false)` for empty
/// lines, `#` comments and kinds not in `read_types`. Errors carry the
/// 1-based `line_number` and the byte column of the offending character.
pub fn parse_line<S>(
    line_number: u64,
    line: &str,
    sink: &mut S,
    read_types: EntityBits,
) -> Result<bool>
where
    S: EntitySink + ?Sized,
{
    let Some(&first) = line.as_bytes().first() else {
        return Ok(false);
    };
    if first == b'#' {
        return Ok(false);
    }

    let Some(kind) = EntityKind::from_char(first) else {
        let cursor = Cursor::new(line);
        let err = cursor
            .error(ErrorKind::UnknownEntityType(cursor.current_char()))
            .on_line(line_number);
        tracing::debug!(line = line_number, error = %err, "Rejected OPL line");
        return Err(err);
    };

    if !read_types.contains(kind) {
        tracing::trace!(line = line_number, kind = %kind, "Skipping filtered entity");
        return Ok(false);
    }

    let mut cursor = Cursor::new(line);
    cursor.bump();
    let entity = assemble_entity(kind, line, &mut cursor).map_err(|e| {
        let err = e.with_entity(kind).on_line(line_number);
        tracing::debug!(
            line = err.line,
            column = err.column,
            kind = %kind,
            attribute = ?err.attribute,
            error = %err.kind,
            "Failed to parse OPL line"
        );
        err
    })?;

    tracing::trace!(line = line_number, kind = %kind, id = entity.id(), "Parsed entity");
    sink.commit(entity);
    Ok(true)
}

/// Parse a single line on its own, accepting every entity kind.
///
/// Convenience for one-off use; errors are reported on line 1.
pub fn parse_entity(line: &str) -> Result<Option<Entity>> {
    let mut out: Vec<Entity> = Vec::with_capacity(1);
    parse_line(1, line, &mut out, EntityBits::ALL)?;
    Ok(out.pop())
}

/// Line parser bound to a configuration.
///
/// Holds no state between lines, so one parser can be shared across
/// threads as long as each thread uses its own sink.
#[derive(Debug, Clone, Default)]
pub struct OplParser {
    config: ParserConfig,
}

impl OplParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parser configured from the environment (see [`ParserConfig::from_env`])
    pub fn from_env() -> Self {
        Self::new(ParserConfig::from_env())
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// See [`parse_line`].
    pub fn parse_line<S>(&self, line_number: u64, line: &str, sink: &mut S) -> Result<bool>
    where
        S: EntitySink + ?Sized,
    {
        parse_line(line_number, line, sink, self.config.read_types)
    }

    /// Parse `line` into a fresh entity, if it holds one of the configured
    /// kinds.
    pub fn parse_entity(&self, line_number: u64, line: &str) -> Result<Option<Entity>> {
        let mut out: Vec<Entity> = Vec::with_capacity(1);
        self.parse_line(line_number, line, &mut out)?;
        Ok(out.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntField;

    #[test]
    fn test_empty_and_comment_lines() {
        let mut sink: Vec<Entity> = Vec::new();
        assert!(!parse_line(1, "", &mut sink, EntityBits::ALL).unwrap());
        assert!(!parse_line(2, "#comment", &mut sink, EntityBits::ALL).unwrap());
        assert!(!parse_line(3, "# n1 v1", &mut sink, EntityBits::ALL).unwrap());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_dispatch_each_kind() {
        let mut sink: Vec<Entity> = Vec::new();
        for line in ["n1", "w2", "r3", "c4"] {
            assert!(parse_line(1, line, &mut sink, EntityBits::ALL).unwrap());
        }
        let kinds: Vec<_> = sink.iter().map(Entity::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntityKind::Node,
                EntityKind::Way,
                EntityKind::Relation,
                EntityKind::Changeset
            ]
        );
    }

    #[test]
    fn test_filter() {
        let mut sink: Vec<Entity> = Vec::new();
        assert!(!parse_line(1, "n1 v1", &mut sink, EntityBits::WAY).unwrap());
        assert!(parse_line(2, "w1 v1", &mut sink, EntityBits::WAY).unwrap());
        assert!(!parse_line(3, "c1", &mut sink, EntityBits::NWR).unwrap());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_filtered_lines_are_not_validated() {
        let mut sink: Vec<Entity> = Vec::new();
        assert!(!parse_line(1, "n1 v1 v1 garbage", &mut sink, EntityBits::WAY).unwrap());
    }

    #[test]
    fn test_unknown_type() {
        let mut sink: Vec<Entity> = Vec::new();
        let err = parse_line(7, "x1 v1", &mut sink, EntityBits::ALL).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownEntityType('x'));
        assert_eq!(err.line, 7);
        assert_eq!(err.column, 0);
        assert_eq!(err.entity, None);

        // Leading whitespace is not allowed either
        let err = parse_line(8, " n1", &mut sink, EntityBits::ALL).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownEntityType(' '));
    }

    #[test]
    fn test_error_position() {
        let mut sink: Vec<Entity> = Vec::new();
        let err = parse_line(3, "n1 v", &mut sink, EntityBits::ALL).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExpectedInteger(IntField::Version));
        assert_eq!(err.line, 3);
        assert_eq!(err.column, 4);
        assert_eq!(err.entity, Some(EntityKind::Node));
        assert_eq!(err.attribute, Some('v'));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_parse_entity() {
        let entity = parse_entity("w1 Nn1,n2,n3").unwrap().unwrap();
        let way = entity.as_way().unwrap();
        assert_eq!(way.nodes.len(), 3);
        assert!(parse_entity("#").unwrap().is_none());

        let err = parse_entity("w1 Nn1,x").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 7);
    }

    #[test]
    fn test_parser_uses_config() {
        let parser = OplParser::new(ParserConfig {
            read_types: EntityBits::CHANGESET,
        });
        assert!(parser.parse_entity(1, "n1").unwrap().is_none());
        let cs = parser.parse_entity(2, "c5 k1").unwrap().unwrap();
        assert_eq!(cs.id(), 5);
    }
}
