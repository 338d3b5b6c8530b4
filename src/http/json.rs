//! JSON serialization helpers
//!
//! Date/time values serialize through `chrono`'s serde support, which
//! normalizes them to ISO-8601 / RFC 3339 strings. The same formats are
//! accepted back by [`parse_datetime`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Serialization options for JSON responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonOptions {
    /// Pretty-print with this many spaces per level
    pub indent: Option<usize>,
    /// HTML-escape every string value before serialization
    pub escape_html: bool,
}

impl JsonOptions {
    #[must_use]
    pub const fn indent(mut self, spaces: usize) -> Self {
        self.indent = Some(spaces);
        self
    }

    #[must_use]
    pub const fn escape_html(mut self) -> Self {
        self.escape_html = true;
        self
    }
}

/// Serialize `value` to JSON bytes according to `options`
pub fn to_vec<T: Serialize + ?Sized>(value: &T, options: JsonOptions) -> Result<Vec<u8>> {
    if options.escape_html {
        let mut tree = serde_json::to_value(value)?;
        escape_strings(&mut tree);
        return write(&tree, options.indent);
    }
    write(value, options.indent)
}

fn write<T: Serialize + ?Sized>(value: &T, indent: Option<usize>) -> Result<Vec<u8>> {
    let Some(width) = indent else {
        return Ok(serde_json::to_vec(value)?);
    };

    let indent = " ".repeat(width);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Escape HTML special characters in all string values, keys are left alone
pub fn escape_strings(value: &mut Value) {
    match value {
        Value::String(s) => *s = escape_html(s),
        Value::Array(items) => items.iter_mut().for_each(escape_strings),
        Value::Object(map) => map.values_mut().for_each(escape_strings),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Parse a date, time or datetime string as produced by the serializer
///
/// Dates map to midnight, bare times to the Unix epoch date.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = s.parse::<NaiveDateTime>() {
        return Some(dt);
    }
    if let Ok(date) = s.parse::<NaiveDate>() {
        return date.and_hms_opt(0, 0, 0);
    }
    let time = s.parse::<NaiveTime>().ok()?;
    NaiveDate::from_ymd_opt(1970, 1, 1).map(|epoch| epoch.and_time(time))
}
