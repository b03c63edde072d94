//! Canonical JSON encoding.
//!
//! Object keys are sorted, separators are `", "` and `": "`, and every
//! non-ASCII character is written as a `\uXXXX` escape. Two logically equal
//! values therefore always encode to the same bytes.

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};

use crate::hasher::HasherError;

/// Encode `value` in canonical form.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, HasherError> {
    // Going through `Value` sorts map keys (serde_json's map is a BTreeMap).
    let value =
        serde_json::to_value(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, CanonicalFormatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| HasherError::Serialization(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| HasherError::Serialization(e.to_string()))
}

struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keys_are_sorted() {
        let value = json!({"zeta": 1, "alpha": {"y": true, "b": null}});
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"alpha": {"b": null, "y": true}, "zeta": 1}"#
        );
    }

    #[test]
    fn arrays_use_comma_space() {
        let value = json!([1, "two", [3]]);
        assert_eq!(canonical_json(&value).unwrap(), r#"[1, "two", [3]]"#);
    }

    #[test]
    fn empty_containers() {
        assert_eq!(canonical_json(&json!([])).unwrap(), "[]");
        assert_eq!(canonical_json(&json!({})).unwrap(), "{}");
    }

    #[test]
    fn non_ascii_is_escaped() {
        let value = json!({"name": "café ☃ 𝄞"});
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"name": "caf\u00e9 \u2603 \ud834\udd1e"}"#
        );
    }

    #[test]
    fn control_characters_keep_json_escapes() {
        let value = json!("line\nbreak \"quoted\"");
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#""line\nbreak \"quoted\"""#
        );
    }

    #[test]
    fn struct_field_order_does_not_matter() {
        #[derive(serde::Serialize)]
        struct Forward {
            a: u8,
            b: u8,
        }
        #[derive(serde::Serialize)]
        struct Backward {
            b: u8,
            a: u8,
        }
        assert_eq!(
            canonical_json(&Forward { a: 1, b: 2 }).unwrap(),
            canonical_json(&Backward { b: 2, a: 1 }).unwrap()
        );
    }
}
