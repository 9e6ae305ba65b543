//! Token model for tokensync.
//!
//! A token is the canonical, transformation-stage form of one design value.
//! Tokens are built once per upstream record and never mutated afterwards.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::tokens::path;

/// Data type of a token or store entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenType {
    Color,
    Number,
    String,
    Boolean,
}

impl TokenType {
    /// Lowercase name used in storage and export output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }

    /// Parse a type declared upstream.
    ///
    /// Accepts the four type names in any case plus the common aliases
    /// found in token sheets. Returns `None` for anything else so the
    /// caller can fall back to inference.
    #[must_use]
    pub fn from_declared(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "color" | "colour" => Some(Self::Color),
            "number" | "float" | "dimension" | "size" => Some(Self::Number),
            "string" | "text" => Some(Self::String),
            "boolean" | "bool" => Some(Self::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TokenType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_declared(s).ok_or_else(|| format!("Unknown token type: {s}"))
    }
}

/// A literal token value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// True for an empty text scalar.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// The value of a token: a literal or a reference to another token's path.
///
/// The bracket syntax (`{path}` and `{path}||fallback`) is only produced by
/// `Display` and only read by [`TokenValue::parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Scalar(Scalar),
    Alias { target: String },
    AliasWithFallback { target: String, fallback: Scalar },
}

impl TokenValue {
    /// Shorthand for a text scalar.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Text(s.into()))
    }

    /// Parse a value that may use the bracket alias syntax.
    ///
    /// The alias target is canonicalized. Text that only looks partially
    /// like an alias (unclosed brace, empty target, trailing junk) is kept as
    /// a plain text scalar.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let Some(rest) = trimmed.strip_prefix('{') else {
            return Self::text(raw);
        };
        let Some(close) = rest.find('}') else {
            return Self::text(raw);
        };

        let target = path::canonical(&rest[..close]);
        if target.is_empty() {
            return Self::text(raw);
        }

        let tail = &rest[close + 1..];
        if tail.trim().is_empty() {
            return Self::Alias { target };
        }
        match tail.strip_prefix("||") {
            Some(fallback) if !fallback.trim().is_empty() => Self::AliasWithFallback {
                target,
                fallback: Scalar::Text(fallback.trim().to_string()),
            },
            Some(_) => Self::Alias { target },
            None => Self::text(raw),
        }
    }

    /// Whether this value references another token.
    #[must_use]
    pub const fn is_alias(&self) -> bool {
        !matches!(self, Self::Scalar(_))
    }

    /// Canonical path of the referenced token, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Scalar(_) => None,
            Self::Alias { target } | Self::AliasWithFallback { target, .. } => Some(target),
        }
    }

    /// The literal carried by this value: the scalar itself or the fallback.
    #[must_use]
    pub const fn literal(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) | Self::AliasWithFallback { fallback: s, .. } => Some(s),
            Self::Alias { .. } => None,
        }
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Alias { target } => write!(f, "{{{target}}}"),
            Self::AliasWithFallback { target, fallback } => write!(f, "{{{target}}}||{fallback}"),
        }
    }
}

impl Serialize for TokenValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(s) => s.serialize(serializer),
            _ => serializer.collect_str(self),
        }
    }
}

/// One canonical design value produced from one upstream record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    /// Opaque upstream identifier.
    pub id: String,
    /// Leaf segment, trimmed and non-empty.
    pub name: String,
    /// Path segments above `name`.
    pub group: Vec<String>,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub value: TokenValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Token {
    /// Canonical `group/name` path, the identity key used for matching.
    #[must_use]
    pub fn full_name(&self) -> String {
        path::join(&self.group, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_alias() {
        assert_eq!(
            TokenValue::parse("{Color / Primary}"),
            TokenValue::Alias {
                target: "Color/Primary".into()
            }
        );
    }

    #[test]
    fn test_parse_alias_with_fallback() {
        let value = TokenValue::parse("{Color:Primary}||#ff0000");
        assert_eq!(
            value,
            TokenValue::AliasWithFallback {
                target: "Color/Primary".into(),
                fallback: Scalar::Text("#ff0000".into()),
            }
        );
        assert_eq!(value.to_string(), "{Color/Primary}||#ff0000");
    }

    #[test]
    fn test_parse_non_alias_text() {
        assert_eq!(TokenValue::parse("{}"), TokenValue::text("{}"));
        assert_eq!(TokenValue::parse("{open"), TokenValue::text("{open"));
        assert_eq!(TokenValue::parse("{a} b"), TokenValue::text("{a} b"));
        assert_eq!(TokenValue::parse("plain"), TokenValue::text("plain"));
    }

    #[test]
    fn test_full_name_is_canonical() {
        let token = Token {
            id: "p1".into(),
            name: "Blue".into(),
            group: vec!["Color".into(), "Primary".into()],
            token_type: TokenType::Color,
            value: TokenValue::text("#0000ff"),
            description: None,
        };
        assert_eq!(token.full_name(), "Color/Primary/Blue");

        let ungrouped = Token {
            group: Vec::new(),
            ..token
        };
        assert_eq!(ungrouped.full_name(), "Blue");
    }

    #[test]
    fn test_declared_type_aliases() {
        assert_eq!(TokenType::from_declared(" COLOR "), Some(TokenType::Color));
        assert_eq!(TokenType::from_declared("Float"), Some(TokenType::Number));
        assert_eq!(TokenType::from_declared("bool"), Some(TokenType::Boolean));
        assert_eq!(TokenType::from_declared("gradient"), None);
    }

    #[test]
    fn test_serialize_token_value() {
        let json = serde_json::to_string(&TokenValue::Scalar(Scalar::Number(16.0))).unwrap();
        assert_eq!(json, "16.0");
        let json = serde_json::to_string(&TokenValue::Alias {
            target: "Space/M".into(),
        })
        .unwrap();
        assert_eq!(json, "\"{Space/M}\"");
    }
}
