//! Route pattern module
//!
//! Patterns are slash-separated literal segments and typed placeholders:
//! `/factorial/<int:value>` or `/users/<name>`, written `<type:name>` or
//! `<name>`. Placeholder types are `str` (default), `int`, `float` and `bool`.

use std::fmt;

use percent_encoding::percent_decode_str;

use crate::error::{Error, Result};

/// Placeholder conversion type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderType {
    Str,
    Int,
    Float,
    Bool,
}

impl PlaceholderType {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "str" => Ok(Self::Str),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "bool" => Ok(Self::Bool),
            other => Err(Error::InvalidPlaceholderType(other.to_string())),
        }
    }

    fn convert(self, raw: &str) -> Option<PathValue> {
        match self {
            Self::Str => Some(PathValue::Str(raw.to_string())),
            Self::Int => raw.parse().ok().map(PathValue::Int),
            Self::Float => raw.parse().ok().map(PathValue::Float),
            Self::Bool => parse_bool(raw).map(PathValue::Bool),
        }
    }
}

/// Parse `1/0`, `true/false`, `yes/no` and `on/off`, case-insensitively
pub fn parse_bool(raw: &str) -> Option<bool> {
    if let Ok(number) = raw.parse::<i64>() {
        return Some(number != 0);
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Value captured by a placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum PathValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl PathValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for PathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder { name: String, kind: PlaceholderType },
}

/// Parsed route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
    trailing_slash: bool,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if !pattern.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut segments: Vec<Segment> = Vec::new();
        for node in split_path(pattern) {
            let segment = match node.strip_prefix('<') {
                Some(inner) => {
                    let inner = inner
                        .strip_suffix('>')
                        .ok_or_else(|| invalid("unterminated placeholder"))?;
                    let (name, kind) = match inner.split_once(':') {
                        Some((kind, name)) => (name, PlaceholderType::parse(kind)?),
                        None => (inner, PlaceholderType::Str),
                    };
                    if name.is_empty() {
                        return Err(invalid("placeholder without a name"));
                    }
                    if segments.iter().any(
                        |s| matches!(s, Segment::Placeholder { name: n, .. } if n == name),
                    ) {
                        return Err(invalid("duplicate placeholder name"));
                    }
                    Segment::Placeholder {
                        name: name.to_string(),
                        kind,
                    }
                }
                None if node.contains(['<', '>']) => {
                    return Err(invalid("placeholder must span a whole segment"))
                }
                None => Segment::Literal(node.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            source: pattern.to_string(),
            trailing_slash: pattern.len() > 1 && pattern.ends_with('/'),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match `path`, returning the captured placeholders in pattern order
    ///
    /// With `strict_slashes` the presence of a trailing slash must agree with
    /// the pattern; otherwise it is ignored.
    pub fn match_path(&self, path: &str, strict_slashes: bool) -> Option<Vec<(String, PathValue)>> {
        if strict_slashes {
            let has_slash = path.len() > 1 && path.ends_with('/');
            if has_slash != self.trailing_slash {
                return None;
            }
        }

        let nodes: Vec<&str> = split_path(path).collect();
        if nodes.len() != self.segments.len() {
            return None;
        }

        let mut vars = Vec::new();
        for (node, segment) in nodes.into_iter().zip(&self.segments) {
            let decoded = percent_decode_str(node).decode_utf8().ok()?;
            match segment {
                Segment::Literal(literal) => {
                    if decoded != literal.as_str() {
                        return None;
                    }
                }
                Segment::Placeholder { name, kind } => {
                    vars.push((name.clone(), kind.convert(&decoded)?));
                }
            }
        }
        Some(vars)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|node| !node.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_placeholder() {
        let pattern = RoutePattern::parse("/factorial/<int:value>").unwrap();
        assert_eq!(
            pattern.match_path("/factorial/12", false),
            Some(vec![("value".to_string(), PathValue::Int(12))])
        );
        assert_eq!(pattern.match_path("/factorial/twelve", false), None);
        assert_eq!(pattern.match_path("/factorial", false), None);
        assert_eq!(pattern.match_path("/factorial/12/extra", false), None);
        assert_eq!(pattern.match_path("/fact/12", false), None);
    }

    #[test]
    fn test_default_str_and_decoding() {
        let pattern = RoutePattern::parse("/users/<name>/posts/<float:score>").unwrap();
        let vars = pattern.match_path("/users/J%C3%BCrgen/posts/2.5", false).unwrap();
        assert_eq!(vars[0], ("name".to_string(), PathValue::Str("Jürgen".to_string())));
        assert_eq!(vars[1], ("score".to_string(), PathValue::Float(2.5)));
    }

    #[test]
    fn test_bool_placeholder() {
        let pattern = RoutePattern::parse("/flags/<bool:on>").unwrap();
        assert_eq!(
            pattern.match_path("/flags/yes", false),
            Some(vec![("on".to_string(), PathValue::Bool(true))])
        );
        assert_eq!(
            pattern.match_path("/flags/0", false),
            Some(vec![("on".to_string(), PathValue::Bool(false))])
        );
        assert_eq!(pattern.match_path("/flags/maybe", false), None);
    }

    #[test]
    fn test_trailing_slashes() {
        let pattern = RoutePattern::parse("/items").unwrap();
        assert!(pattern.match_path("/items/", false).is_some());
        assert!(pattern.match_path("/items/", true).is_none());
        assert!(pattern.match_path("/items", true).is_some());

        let root = RoutePattern::parse("/").unwrap();
        assert_eq!(root.match_path("/", true), Some(vec![]));
        assert_eq!(root.match_path("/x", false), None);
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            RoutePattern::parse("/x/<uuid:id>"),
            Err(Error::InvalidPlaceholderType(t)) if t == "uuid"
        ));
        assert!(matches!(
            RoutePattern::parse("x"),
            Err(Error::InvalidPattern { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/x/<id"),
            Err(Error::InvalidPattern { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/x/a<id>"),
            Err(Error::InvalidPattern { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/<a>/<a>"),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("2"), Some(true));
        assert_eq!(parse_bool("nah"), None);
    }
}
