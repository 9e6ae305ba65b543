//! Token type inference.
//!
//! Precedence, first match wins:
//! 1. actual boolean → `Boolean`
//! 2. actual number → `Number`
//! 3. hex or `rgb()`/`rgba()` pattern → `Color`
//! 4. text that parses fully as a number → `Number`
//! 5. number immediately followed by a known unit → `Number`
//! 6. `"true"` / `"false"` in any case → `Boolean`
//! 7. anything else → `String`
//!
//! Colors are tested before numbers so `#100` never reads as a number.

use regex::Regex;
use std::sync::LazyLock;

use super::color;
use crate::model::{Scalar, TokenType};

/// Unit suffixes accepted after a number.
pub const UNITS: &[&str] = &[
    "px", "rem", "em", "%", "pt", "vh", "vw", "vmin", "vmax", "ch", "ex", "cm", "mm", "in", "pc",
    "deg", "rad", "turn", "s", "ms",
];

static NUMBER_WITH_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    let units = UNITS.join("|");
    Regex::new(&format!(r"^([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)({units})$"))
        .expect("valid unit regex")
});

/// Infer the type of a scalar.
#[must_use]
pub fn infer(value: &Scalar) -> TokenType {
    match value {
        Scalar::Boolean(_) => TokenType::Boolean,
        Scalar::Number(_) => TokenType::Number,
        Scalar::Text(text) => infer_text(text),
    }
}

fn infer_text(text: &str) -> TokenType {
    let s = text.trim();
    if color::is_color_pattern(s) {
        TokenType::Color
    } else if parse_plain_number(s).is_some() || NUMBER_WITH_UNIT.is_match(s) {
        TokenType::Number
    } else if parse_bool(s).is_some() {
        TokenType::Boolean
    } else {
        TokenType::String
    }
}

fn parse_plain_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Read a number, with or without a unit suffix.
///
/// `"16"`, `"1.5rem"` and `"-2px"` all parse; the unit is dropped.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    parse_plain_number(s).or_else(|| {
        let caps = NUMBER_WITH_UNIT.captures(s)?;
        parse_plain_number(&caps[1])
    })
}

/// Read `true`/`false` case-insensitively.
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    let s = raw.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Scalar {
        Scalar::Text(s.to_string())
    }

    #[test]
    fn test_infer_precedence() {
        assert_eq!(infer(&text("#FF5733")), TokenType::Color);
        assert_eq!(infer(&text("42")), TokenType::Number);
        assert_eq!(infer(&text("16px")), TokenType::Number);
        assert_eq!(infer(&text("true")), TokenType::Boolean);
        assert_eq!(infer(&text("hello")), TokenType::String);
    }

    #[test]
    fn test_hex_before_number() {
        assert_eq!(infer(&text("#100")), TokenType::Color);
        assert_eq!(infer(&text("rgb(0, 0, 0)")), TokenType::Color);
    }

    #[test]
    fn test_native_scalars() {
        assert_eq!(infer(&Scalar::Boolean(false)), TokenType::Boolean);
        assert_eq!(infer(&Scalar::Number(0.5)), TokenType::Number);
    }

    #[test]
    fn test_units() {
        for s in ["1.5rem", "-2px", "100%", "90deg", "200ms", ".5s", "12vmin"] {
            assert_eq!(infer(&text(s)), TokenType::Number, "value {s}");
        }
        assert_eq!(infer(&text("16 px")), TokenType::String);
        assert_eq!(infer(&text("16furlongs")), TokenType::String);
    }

    #[test]
    fn test_boolean_any_case() {
        assert_eq!(infer(&text("FALSE")), TokenType::Boolean);
        assert_eq!(infer(&text("True")), TokenType::Boolean);
    }

    #[test]
    fn test_non_finite_is_not_number() {
        assert_eq!(infer(&text("NaN")), TokenType::String);
        assert_eq!(infer(&text("inf")), TokenType::String);
    }

    #[test]
    fn test_parse_number_drops_unit() {
        assert_eq!(parse_number("1.5rem"), Some(1.5));
        assert_eq!(parse_number(" 8 "), Some(8.0));
        assert_eq!(parse_number("wide"), None);
    }
}
