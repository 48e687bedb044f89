// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! OPL string escaping
//!
//! Inverse of [`decode_string`](crate::scan::decode_string): characters
//! outside the safe set are written as `%<lowercase hex codepoint>%`.

use std::borrow::Cow;
use std::fmt::Write;

/// Characters that can appear literally in an OPL string field.
///
/// Excludes space, `%`, `,`, `=` and `@` (which separate fields, tags and
/// member roles) as well as control characters and most of the non-Latin
/// planes.
#[inline]
pub fn is_safe_char(c: char) -> bool {
    matches!(c as u32,
        0x0021..=0x0024
        | 0x0026..=0x002b
        | 0x002d..=0x003c
        | 0x003e..=0x003f
        | 0x0041..=0x007e
        | 0x00a1..=0x00ac
        | 0x00ae..=0x05ff)
}

/// Append the escaped form of `s` to `out`.
pub fn encode_string(s: &str, out: &mut String) {
    for c in s.chars() {
        if is_safe_char(c) {
            out.push(c);
        } else {
            // Writing to a String cannot fail
            let _ = write!(out, "%{:x}%", c as u32);
        }
    }
}

/// Escaped form of `s`, borrowing when nothing needs escaping.
pub fn escape(s: &str) -> Cow<'_, str> {
    if s.chars().all(is_safe_char) {
        Cow::Borrowed(s)
    } else {
        let mut out = String::with_capacity(s.len() + 8);
        encode_string(s, &mut out);
        Cow::Owned(out)
    }
}
