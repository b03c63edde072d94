use std::fmt;

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

const DATE_TIME: &str = "%Y-%m-%d %H:%M:%S";
const ISO_DATE_TIME: &str = "%Y-%m-%dT%H:%M:%S";
const ISO_PARSE: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Wall-clock time at which a block was constructed.
///
/// Held as naive local time truncated to microseconds, so the persisted
/// ISO-8601 form always parses back to the identical value. The seal text
/// and the ISO form both omit the fractional part when it is zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockTimestamp(NaiveDateTime);

impl BlockTimestamp {
    /// The current local time.
    pub fn now() -> Self {
        Self::from_naive(Local::now().naive_local())
    }

    /// Wrap an explicit date-time, dropping sub-microsecond precision.
    pub fn from_naive(value: NaiveDateTime) -> Self {
        let micros = value.nanosecond() / 1_000;
        Self(value.with_nanosecond(micros * 1_000).unwrap_or(value))
    }

    /// The wrapped date-time.
    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    fn micros(&self) -> u32 {
        self.0.nanosecond() / 1_000
    }

    /// Text form fed into the seal: `YYYY-MM-DD HH:MM:SS[.ffffff]`.
    pub fn seal_text(&self) -> String {
        self.render(DATE_TIME)
    }

    /// Persisted form: `YYYY-MM-DDTHH:MM:SS[.ffffff]`.
    pub fn to_iso8601(&self) -> String {
        self.render(ISO_DATE_TIME)
    }

    /// Parse the persisted ISO-8601 form.
    pub fn parse_iso8601(value: &str) -> Result<Self, TypeError> {
        NaiveDateTime::parse_from_str(value, ISO_PARSE)
            .map(Self::from_naive)
            .map_err(|e| TypeError::InvalidTimestamp {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }

    fn render(&self, pattern: &str) -> String {
        let base = self.0.format(pattern).to_string();
        match self.micros() {
            0 => base,
            micros => format!("{base}.{micros:06}"),
        }
    }
}

impl fmt::Debug for BlockTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockTimestamp({})", self.to_iso8601())
    }
}

impl fmt::Display for BlockTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.seal_text())
    }
}

impl Serialize for BlockTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for BlockTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse_iso8601(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(micro: u32) -> BlockTimestamp {
        let value = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_micro_opt(14, 5, 7, micro)
            .unwrap();
        BlockTimestamp::from_naive(value)
    }

    #[test]
    fn seal_text_includes_micros_when_present() {
        assert_eq!(at(42).seal_text(), "2024-03-09 14:05:07.000042");
    }

    #[test]
    fn seal_text_omits_zero_micros() {
        assert_eq!(at(0).seal_text(), "2024-03-09 14:05:07");
    }

    #[test]
    fn iso_form_uses_t_separator() {
        assert_eq!(at(123_456).to_iso8601(), "2024-03-09T14:05:07.123456");
        assert_eq!(at(0).to_iso8601(), "2024-03-09T14:05:07");
    }

    #[test]
    fn iso_roundtrip_with_and_without_fraction() {
        for ts in [at(0), at(1), at(999_999)] {
            let parsed = BlockTimestamp::parse_iso8601(&ts.to_iso8601()).unwrap();
            assert_eq!(parsed, ts);
        }
    }

    #[test]
    fn nanoseconds_are_truncated() {
        let value = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_nano_opt(14, 5, 7, 123_456_789)
            .unwrap();
        assert_eq!(BlockTimestamp::from_naive(value), at(123_456));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = BlockTimestamp::parse_iso8601("yesterday").unwrap_err();
        assert!(matches!(err, TypeError::InvalidTimestamp { .. }));
    }

    #[test]
    fn serde_uses_iso_string() {
        let ts = at(500);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-03-09T14:05:07.000500\"");
        let parsed: BlockTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn now_survives_iso_roundtrip() {
        let ts = BlockTimestamp::now();
        assert_eq!(BlockTimestamp::parse_iso8601(&ts.to_iso8601()).unwrap(), ts);
    }
}
