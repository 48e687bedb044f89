// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Primitive scanners
//!
//! Every scanner takes a [`Cursor`] and either consumes exactly the text of
//! the field it decodes or fails with an error positioned at the offending
//! byte. Nothing here allocates except the caller-provided output strings.

use crate::error::{Error, ErrorKind, IntField, Result};
use crate::location::degrees_to_fixed;
use crate::timestamp::{Timestamp, TIMESTAMP_LEN};

/// Longest accepted run of decimal digits in an integer field
pub const MAX_INTEGER_DIGITS: usize = 16;

/// Longest accepted run of hex digits in a `%...%` escape
pub const MAX_ESCAPE_DIGITS: usize = 8;

/// Forward-only position within one line.
///
/// Columns reported in errors are always relative to the start of the
/// original line, including for cursors created over a deferred section.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Cursor at the start of `line`
    #[inline]
    pub fn new(line: &'a str) -> Self {
        Self {
            input: line,
            pos: 0,
        }
    }

    /// Cursor over `line[start..end]` that treats `end` as end of line.
    ///
    /// `start` and `end` must be the extent of a section found by
    /// [`skip_to_delimiter`], which always lie on character boundaries.
    #[inline]
    pub fn section(line: &'a str, start: usize, end: usize) -> Self {
        Self {
            input: &line[..end],
            pos: start,
        }
    }

    /// Byte offset from line start
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Unconsumed remainder
    #[inline]
    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Character at the cursor, decoded as UTF-8 (for error messages)
    #[inline]
    pub fn current_char(&self) -> char {
        self.rest().chars().next().unwrap_or('\0')
    }

    /// Consume one ASCII byte.
    #[inline]
    pub fn bump(&mut self) {
        self.pos += 1;
    }

    #[inline]
    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    /// Error positioned at the cursor
    #[inline]
    pub fn error(&self, kind: ErrorKind) -> Error {
        Error::new(kind, self.pos)
    }
}

#[inline(always)]
fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Consume one or more space/tab characters.
pub fn skip_required_whitespace(cursor: &mut Cursor<'_>) -> Result<()> {
    match cursor.peek() {
        Some(b) if is_blank(b) => {}
        _ => return Err(cursor.error(ErrorKind::MalformedWhitespace)),
    }
    while matches!(cursor.peek(), Some(b) if is_blank(b)) {
        cursor.bump();
    }
    Ok(())
}

/// True if the cursor is on something other than end of line, space or tab.
#[inline]
pub fn has_content(cursor: &Cursor<'_>) -> bool {
    matches!(cursor.peek(), Some(b) if !is_blank(b))
}

/// Advance to the next space, tab or end of line and return that position.
#[inline]
pub fn skip_to_delimiter(cursor: &mut Cursor<'_>) -> usize {
    let rest = cursor.rest().as_bytes();
    let len = memchr::memchr2(b' ', b'\t', rest).unwrap_or(rest.len());
    cursor.advance(len);
    cursor.position()
}

/// Consume exactly `expected`.
#[inline]
pub fn expect_char(cursor: &mut Cursor<'_>, expected: u8) -> Result<()> {
    if cursor.peek() == Some(expected) {
        cursor.bump();
        Ok(())
    } else {
        Err(cursor.error(ErrorKind::ExpectedChar(expected as char)))
    }
}

/// Decode the body of a `%hex%` escape; the cursor sits just after the
/// opening `%`. Appends the decoded character to `out`.
pub fn decode_escaped_codepoint(cursor: &mut Cursor<'_>, out: &mut String) -> Result<()> {
    let start = cursor.position();
    let mut value: u32 = 0;
    let mut digits = 0;
    loop {
        match cursor.peek() {
            None => return Err(cursor.error(ErrorKind::UnterminatedEscape)),
            Some(b'%') => {
                cursor.bump();
                let c = char::from_u32(value)
                    .ok_or_else(|| Error::new(ErrorKind::InvalidCodepoint(value), start))?;
                out.push(c);
                return Ok(());
            }
            Some(b) => {
                if digits == MAX_ESCAPE_DIGITS {
                    return Err(cursor.error(ErrorKind::EscapeTooLong));
                }
                let digit = (b as char)
                    .to_digit(16)
                    .ok_or_else(|| cursor.error(ErrorKind::InvalidEscape))?;
                value = (value << 4) | digit;
                digits += 1;
                cursor.bump();
            }
        }
    }
}

/// Decode a string field up to end of line, space, tab, `,` or `=`,
/// resolving `%hex%` escapes. Appends to `out`.
pub fn decode_string(cursor: &mut Cursor<'_>, out: &mut String) -> Result<()> {
    loop {
        let rest = cursor.rest();
        let run = rest
            .bytes()
            .position(|b| matches!(b, b' ' | b'\t' | b',' | b'=' | b'%'))
            .unwrap_or(rest.len());
        out.push_str(&rest[..run]);
        cursor.advance(run);

        if cursor.peek() != Some(b'%') {
            return Ok(());
        }
        cursor.bump();
        decode_escaped_codepoint(cursor, out)?;
    }
}

/// Decode an optionally negative decimal integer of at most
/// [`MAX_INTEGER_DIGITS`] digits into the range of `T`.
pub fn decode_bounded_integer<T>(cursor: &mut Cursor<'_>, field: IntField) -> Result<T>
where
    T: TryFrom<i64>,
{
    let start = cursor.position();
    let bytes = cursor.rest().as_bytes();
    let sign = usize::from(bytes.first() == Some(&b'-'));
    let digits = bytes[sign..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();

    if digits == 0 {
        return Err(Error::new(ErrorKind::ExpectedInteger(field), start + sign));
    }
    if digits > MAX_INTEGER_DIGITS {
        return Err(Error::new(
            ErrorKind::IntegerTooLong(field),
            start + sign + MAX_INTEGER_DIGITS,
        ));
    }

    let len = sign + digits;
    // Range errors point just past the last digit
    let out_of_range = || Error::new(ErrorKind::IntegerOutOfRange(field), start + len);
    // 16 digits always fit an i64, so this only fails on a bug upstream
    let value: i64 = lexical_core::parse(&bytes[..len]).map_err(|_| out_of_range())?;
    let value = T::try_from(value).map_err(|_| out_of_range())?;
    cursor.advance(len);
    Ok(value)
}

/// `V` is visible, `D` is deleted.
pub fn decode_visibility_flag(cursor: &mut Cursor<'_>) -> Result<bool> {
    let visible = match cursor.peek() {
        Some(b'V') => true,
        Some(b'D') => false,
        None => return Err(cursor.error(ErrorKind::UnexpectedEndOfLine)),
        Some(_) => return Err(cursor.error(ErrorKind::InvalidVisibilityFlag)),
    };
    cursor.bump();
    Ok(visible)
}

/// An empty field is the unset timestamp; anything else must be exactly
/// the 20-character `YYYY-MM-DDThh:mm:ssZ` form.
pub fn decode_timestamp(cursor: &mut Cursor<'_>) -> Result<Timestamp> {
    if !has_content(cursor) {
        return Ok(Timestamp::default());
    }
    let timestamp = cursor
        .rest()
        .get(..TIMESTAMP_LEN)
        .and_then(Timestamp::parse_iso)
        .ok_or_else(|| cursor.error(ErrorKind::InvalidTimestamp))?;
    cursor.advance(TIMESTAMP_LEN);
    Ok(timestamp)
}

/// Decode one coordinate in degrees into fixed-point units.
pub fn decode_coordinate(cursor: &mut Cursor<'_>) -> Result<i32> {
    let bytes = cursor.rest().as_bytes();
    if bytes.is_empty() {
        return Err(cursor.error(ErrorKind::UnexpectedEndOfLine));
    }
    match fast_float::parse_partial::<f64, _>(bytes) {
        Ok((value, consumed)) if consumed > 0 => {
            let fixed =
                degrees_to_fixed(value).ok_or_else(|| cursor.error(ErrorKind::InvalidCoordinate))?;
            cursor.advance(consumed);
            Ok(fixed)
        }
        _ => Err(cursor.error(ErrorKind::InvalidCoordinate)),
    }
}
