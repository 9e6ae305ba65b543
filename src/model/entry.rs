//! Store-side models: collections, entries and their native values.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::token::{Scalar, TokenType};
use crate::error::{Error, Result};
use crate::tokens::{color, infer};

/// A color with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

/// A named group of entries in the variable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
}

/// A value as the variable store holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreValue {
    Color(Rgba),
    Number { value: f64 },
    Boolean { value: bool },
    String { value: String },
    /// Reference to another entry by store id.
    Alias { id: String },
}

impl StoreValue {
    /// Convert a token literal into the store representation for `ty`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidValue` when the literal cannot be read as `ty`.
    pub fn from_scalar(scalar: &Scalar, ty: TokenType) -> Result<Self> {
        let invalid = || Error::InvalidValue {
            expected: ty.to_string(),
            value: scalar.to_string(),
        };

        match (ty, scalar) {
            (TokenType::Number, Scalar::Number(n)) => Ok(Self::Number { value: *n }),
            (TokenType::Number, Scalar::Text(s)) => infer::parse_number(s)
                .map(|value| Self::Number { value })
                .ok_or_else(invalid),
            (TokenType::Boolean, Scalar::Boolean(b)) => Ok(Self::Boolean { value: *b }),
            (TokenType::Boolean, Scalar::Text(s)) => infer::parse_bool(s)
                .map(|value| Self::Boolean { value })
                .ok_or_else(invalid),
            (TokenType::Color, Scalar::Text(s)) => {
                color::parse(s).map(Self::Color).ok_or_else(invalid)
            }
            (TokenType::String, s) => Ok(Self::String {
                value: s.to_string(),
            }),
            _ => Err(invalid()),
        }
    }

    /// The type a literal value carries; `None` for aliases.
    #[must_use]
    pub const fn literal_type(&self) -> Option<TokenType> {
        match self {
            Self::Color(_) => Some(TokenType::Color),
            Self::Number { .. } => Some(TokenType::Number),
            Self::Boolean { .. } => Some(TokenType::Boolean),
            Self::String { .. } => Some(TokenType::String),
            Self::Alias { .. } => None,
        }
    }

    /// Whether this value can be stored in an entry of type `ty`.
    ///
    /// Aliases are checked against their target by the store.
    #[must_use]
    pub fn fits(&self, ty: TokenType) -> bool {
        self.literal_type().is_none_or(|t| t == ty)
    }
}

impl fmt::Display for StoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(rgba) => f.write_str(&color::format(rgba)),
            Self::Number { value } => write!(f, "{value}"),
            Self::Boolean { value } => write!(f, "{value}"),
            Self::String { value } => f.write_str(value),
            Self::Alias { id } => write!(f, "-> {id}"),
        }
    }
}

/// One existing item in the variable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub collection_id: String,
    /// `group/name` path as stored.
    pub full_name: String,
    #[serde(rename = "type")]
    pub entry_type: TokenType,
    /// `None` until a value has been written.
    pub value: Option<StoreValue>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_with_unit_converts() {
        let value = StoreValue::from_scalar(&Scalar::Text("16px".into()), TokenType::Number).unwrap();
        assert_eq!(value, StoreValue::Number { value: 16.0 });
    }

    #[test]
    fn test_color_converts_to_channels() {
        let value = StoreValue::from_scalar(&Scalar::Text("#ff0000".into()), TokenType::Color).unwrap();
        assert_eq!(value, StoreValue::Color(Rgba::new(1.0, 0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_boolean_text_converts() {
        let value = StoreValue::from_scalar(&Scalar::Text("TRUE".into()), TokenType::Boolean).unwrap();
        assert_eq!(value, StoreValue::Boolean { value: true });
    }

    #[test]
    fn test_mismatched_literal_is_rejected() {
        let err = StoreValue::from_scalar(&Scalar::Text("wide".into()), TokenType::Number).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
        let err = StoreValue::from_scalar(&Scalar::Boolean(true), TokenType::Color).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }

    #[test]
    fn test_string_accepts_any_literal() {
        let value = StoreValue::from_scalar(&Scalar::Number(2.5), TokenType::String).unwrap();
        assert_eq!(
            value,
            StoreValue::String {
                value: "2.5".into()
            }
        );
    }

    #[test]
    fn test_fits() {
        assert!(StoreValue::Number { value: 1.0 }.fits(TokenType::Number));
        assert!(!StoreValue::Number { value: 1.0 }.fits(TokenType::String));
        assert!(StoreValue::Alias { id: "var_1".into() }.fits(TokenType::Color));
    }
}
