// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-format timestamps: `YYYY-MM-DDThh:mm:ssZ`
//!
//! Stored as seconds since the Unix epoch in a `u32`, with 0 meaning
//! "not set" (an empty `t`, `s` or `e` field).

use std::fmt;

use chrono::{DateTime, NaiveDate};
use nom::{
    bytes::complete::take_while_m_n,
    character::complete::char,
    combinator::{all_consuming, map_res},
    sequence::{preceded, terminated, tuple},
    IResult,
};

/// Length of the textual form
pub const TIMESTAMP_LEN: usize = 20;

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Seconds since 1970-01-01T00:00:00Z, 0 = unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(u32);

impl Timestamp {
    #[inline]
    pub const fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    #[inline]
    pub fn seconds(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.0 != 0
    }

    /// Parse exactly the 20-character form. Returns `None` on any syntax or
    /// calendar error, or for dates outside the `u32` seconds range.
    pub fn parse_iso(text: &str) -> Option<Self> {
        let (_, (year, month, day, hour, minute, second)) =
            all_consuming(iso_timestamp)(text).ok()?;
        let year = i32::try_from(year).ok()?;
        let datetime = NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(hour, minute, second)?;
        u32::try_from(datetime.and_utc().timestamp()).ok().map(Self)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_set() {
            return Ok(());
        }
        match DateTime::from_timestamp(i64::from(self.0), 0) {
            Some(datetime) => write!(f, "{}", datetime.format(ISO_FORMAT)),
            None => Ok(()),
        }
    }
}

/// Fixed-width decimal field
fn digits<const N: usize>(input: &str) -> IResult<&str, u32> {
    map_res(take_while_m_n(N, N, |c: char| c.is_ascii_digit()), |s: &str| {
        s.parse::<u32>()
    })(input)
}

/// Exact shape check; chrono's own parser accepts variable-width fields.
fn iso_timestamp(input: &str) -> IResult<&str, (u32, u32, u32, u32, u32, u32)> {
    terminated(
        tuple((
            digits::<4>,
            preceded(char('-'), digits::<2>),
            preceded(char('-'), digits::<2>),
            preceded(char('T'), digits::<2>),
            preceded(char(':'), digits::<2>),
            preceded(char(':'), digits::<2>),
        )),
        char('Z'),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_values() {
        assert_eq!(
            Timestamp::parse_iso("1970-01-01T00:00:01Z"),
            Some(Timestamp::from_seconds(1))
        );
        assert_eq!(
            Timestamp::parse_iso("2020-01-01T00:00:00Z"),
            Some(Timestamp::from_seconds(1_577_836_800))
        );
        assert_eq!(
            Timestamp::parse_iso("2000-02-29T12:34:56Z"),
            Some(Timestamp::from_seconds(951_827_696))
        );
    }

    #[test]
    fn test_display_round_trip() {
        for text in [
            "2020-01-01T00:00:00Z",
            "2000-02-29T12:34:56Z",
            "2106-02-07T06:28:15Z",
        ] {
            let ts = Timestamp::parse_iso(text).unwrap();
            assert_eq!(ts.to_string(), text);
        }
        assert_eq!(Timestamp::default().to_string(), "");
    }

    #[test]
    fn test_rejects_bad_calendar() {
        assert_eq!(Timestamp::parse_iso("2019-02-29T00:00:00Z"), None);
        assert_eq!(Timestamp::parse_iso("2100-02-29T00:00:00Z"), None);
        assert!(Timestamp::parse_iso("2024-02-29T00:00:00Z").is_some());
        assert_eq!(Timestamp::parse_iso("2020-13-01T00:00:00Z"), None);
        assert_eq!(Timestamp::parse_iso("2020-04-31T00:00:00Z"), None);
        assert_eq!(Timestamp::parse_iso("2020-01-01T24:00:00Z"), None);
        assert_eq!(Timestamp::parse_iso("2020-01-01T12:60:00Z"), None);
        assert_eq!(Timestamp::parse_iso("2020-00-10T00:00:00Z"), None);
        assert_eq!(Timestamp::parse_iso("2020-01-00T00:00:00Z"), None);
        assert_eq!(Timestamp::parse_iso("1969-12-31T23:59:59Z"), None);
        assert_eq!(Timestamp::parse_iso("2106-02-07T06:28:16Z"), None);
    }

    #[test]
    fn test_rejects_bad_syntax() {
        assert_eq!(Timestamp::parse_iso("2020-01-01 00:00:00Z"), None);
        assert_eq!(Timestamp::parse_iso("2020-01-01T00:00:00"), None);
        assert_eq!(Timestamp::parse_iso("2020-1-01T00:00:00Z"), None);
        assert_eq!(Timestamp::parse_iso("2020-01-01T00:00:00Zx"), None);
    }
}
