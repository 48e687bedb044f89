// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for OPL line parsing.

use std::fmt;

use thiserror::Error;

use crate::model::EntityKind;

/// Result type alias for OPL parsing.
pub type Result<T> = std::result::Result<T, Error>;

/// Semantic integer field an integer error refers to.
///
/// All of these are decoded by the same scanner and only differ in the
/// range they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntField {
    /// Object id (`i64`)
    Id,
    /// Changeset id (`u32`)
    Changeset,
    /// Object version (`u32`)
    Version,
    /// User id (`i32`)
    Uid,
    /// Changeset counters: number of changes and comments (`u32`)
    Count,
}

impl fmt::Display for IntField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntField::Id => "id",
            IntField::Changeset => "changeset id",
            IntField::Version => "version",
            IntField::Uid => "uid",
            IntField::Count => "counter",
        })
    }
}

/// What went wrong while scanning a line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("expected '{0}'")]
    ExpectedChar(char),

    #[error("expected space or tab character")]
    MalformedWhitespace,

    #[error("unknown attribute '{0}'")]
    UnknownAttribute(char),

    #[error("duplicate attribute: {name} ({letter})")]
    DuplicateAttribute { letter: char, name: &'static str },

    #[error("unknown type '{0}'")]
    UnknownEntityType(char),

    #[error("unknown object type '{0}'")]
    UnknownMemberType(char),

    #[error("expected integer ({0})")]
    ExpectedInteger(IntField),

    #[error("integer too long ({0})")]
    IntegerTooLong(IntField),

    #[error("integer out of range ({0})")]
    IntegerOutOfRange(IntField),

    #[error("not a hex char")]
    InvalidEscape,

    #[error("escape %{0:x}% is not a unicode scalar value")]
    InvalidCodepoint(u32),

    #[error("unterminated escape")]
    UnterminatedEscape,

    #[error("hex escape too long")]
    EscapeTooLong,

    #[error("invalid visible flag")]
    InvalidVisibilityFlag,

    #[error("can not parse timestamp")]
    InvalidTimestamp,

    #[error("can not parse coordinate")]
    InvalidCoordinate,

    #[error("unexpected end of line")]
    UnexpectedEndOfLine,
}

/// A positioned OPL parse error.
///
/// Scanners create errors carrying only the column; the line dispatcher
/// attaches the line number and the entity kind before handing the error
/// to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("OPL error: {kind} on line {line} column {column}")]
pub struct Error {
    pub kind: ErrorKind,
    /// 1-based line number (0 until the dispatcher sets it)
    pub line: u64,
    /// 0-based byte offset of the offending character from line start
    pub column: usize,
    /// Kind of entity being assembled, if any
    pub entity: Option<EntityKind>,
    /// Attribute letter whose value failed to parse, if any
    pub attribute: Option<char>,
}

impl Error {
    pub fn new(kind: ErrorKind, column: usize) -> Self {
        Self {
            kind,
            line: 0,
            column,
            entity: None,
            attribute: None,
        }
    }

    /// Attach the attribute letter, keeping one set by an inner scanner.
    pub fn with_attribute(mut self, letter: char) -> Self {
        self.attribute.get_or_insert(letter);
        self
    }

    pub fn with_entity(mut self, kind: EntityKind) -> Self {
        self.entity = Some(kind);
        self
    }

    pub fn on_line(mut self, line: u64) -> Self {
        self.line = line;
        self
    }
}
