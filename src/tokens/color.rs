//! Color parsing and hex formatting.
//!
//! Accepted inputs:
//! - `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA` (`#` optional on the 6/8-digit forms)
//! - `rgb()` / `rgba()` with comma- or space-separated channels, 0-255 or
//!   percentages, alpha as 0-1 or a percentage after a comma or `/`
//! - `hsl()` / `hsla()` with hue in degrees and percentage saturation/lightness
//!
//! Output is lowercase hex; alpha is emitted only when it is not exactly 1.

use regex::Regex;
use std::sync::LazyLock;

use crate::model::Rgba;

static HEX_LONG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#?([0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("valid hex regex")
});

static HEX_SHORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9a-fA-F]{3,4})$").expect("valid short hex regex"));

static HEX_HASHED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("valid hex regex")
});

static RGB_FN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^rgba?\(\s*(.*?)\s*\)$").expect("valid rgb regex"));

static HSL_FN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^hsla?\(\s*(.*?)\s*\)$").expect("valid hsl regex"));

/// Whether `raw` has the shape of a `#`-prefixed hex or `rgb()`/`rgba()` color.
///
/// This is the test used by type inference. Bare digit runs such as
/// `123456` do not match here even though [`parse`] accepts them.
#[must_use]
pub fn is_color_pattern(raw: &str) -> bool {
    let s = raw.trim();
    HEX_HASHED.is_match(s) || RGB_FN.is_match(s)
}

/// Whether `raw` should be rewritten to hex before type resolution.
#[must_use]
pub fn looks_like_color(raw: &str) -> bool {
    is_color_pattern(raw) || HSL_FN.is_match(raw.trim())
}

/// Parse a color string into normalized channels.
///
/// Returns `None` for anything that is not a recognized color.
#[must_use]
pub fn parse(raw: &str) -> Option<Rgba> {
    let s = raw.trim();

    if let Some(caps) = HEX_LONG.captures(s) {
        return parse_hex_digits(&caps[1], 2);
    }
    if let Some(caps) = HEX_SHORT.captures(s) {
        return parse_hex_digits(&caps[1], 1);
    }
    if let Some(caps) = RGB_FN.captures(s) {
        return parse_rgb_args(&caps[1]);
    }
    if let Some(caps) = HSL_FN.captures(s) {
        return parse_hsl_args(&caps[1]);
    }
    None
}

/// Format channels as `#rrggbb`, or `#rrggbbaa` when alpha is not exactly 1.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn format(color: &Rgba) -> String {
    let mut out = format!(
        "#{:02x}{:02x}{:02x}",
        to_byte(color.r),
        to_byte(color.g),
        to_byte(color.b)
    );
    if color.a != 1.0 {
        out.push_str(&format!("{:02x}", to_byte(color.a)));
    }
    out
}

/// Normalize a color string to hex, leaving anything else unchanged.
#[must_use]
pub fn normalize(raw: &str) -> String {
    parse(raw).map_or_else(|| raw.to_string(), |c| format(&c))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_byte(channel: f64) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn percent_to_unit(pct: f64) -> f64 {
    (pct.clamp(0.0, 100.0) * 2.55).round() / 255.0
}

/// Expand 1- or 2-digit hex groups into channels.
fn parse_hex_digits(digits: &str, width: usize) -> Option<Rgba> {
    let mut channels = Vec::with_capacity(4);
    let bytes = digits.as_bytes();
    for chunk in bytes.chunks(width) {
        let text = std::str::from_utf8(chunk).ok()?;
        let value = u8::from_str_radix(text, 16).ok()?;
        // #abc expands to #aabbcc
        let value = if width == 1 { value * 17 } else { value };
        channels.push(f64::from(value) / 255.0);
    }
    match channels.as_slice() {
        [r, g, b] => Some(Rgba::new(*r, *g, *b, 1.0)),
        [r, g, b, a] => Some(Rgba::new(*r, *g, *b, *a)),
        _ => None,
    }
}

/// Split function arguments into channel parts and an optional alpha part.
///
/// Handles `1, 2, 3`, `1 2 3`, `1, 2, 3, 0.5` and `1 2 3 / 50%`.
fn split_args(args: &str) -> Option<(Vec<&str>, Option<&str>)> {
    let (channels, slash_alpha) = match args.split_once('/') {
        Some((c, a)) => (c, Some(a.trim())),
        None => (args, None),
    };

    let mut parts: Vec<&str> = channels
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();

    let alpha = match (slash_alpha, parts.len()) {
        (Some(a), 3) => Some(a),
        (None, 4) => parts.pop(),
        (None, 3) => None,
        _ => return None,
    };
    Some((parts, alpha))
}

fn parse_alpha(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if let Some(pct) = raw.strip_suffix('%') {
        let pct: f64 = pct.trim().parse().ok()?;
        return Some(percent_to_unit(pct));
    }
    let value: f64 = raw.parse().ok()?;
    Some(value.clamp(0.0, 1.0))
}

fn parse_rgb_channel(raw: &str) -> Option<f64> {
    if let Some(pct) = raw.strip_suffix('%') {
        let pct: f64 = pct.trim().parse().ok()?;
        return Some(percent_to_unit(pct));
    }
    let value: f64 = raw.parse().ok()?;
    Some(value.clamp(0.0, 255.0).round() / 255.0)
}

fn parse_rgb_args(args: &str) -> Option<Rgba> {
    let (parts, alpha) = split_args(args)?;
    let r = parse_rgb_channel(parts[0])?;
    let g = parse_rgb_channel(parts[1])?;
    let b = parse_rgb_channel(parts[2])?;
    let a = match alpha {
        Some(a) => parse_alpha(a)?,
        None => 1.0,
    };
    Some(Rgba::new(r, g, b, a))
}

fn parse_percent(raw: &str) -> Option<f64> {
    let raw = raw.strip_suffix('%').unwrap_or(raw).trim();
    let value: f64 = raw.parse().ok()?;
    Some(value.clamp(0.0, 100.0) / 100.0)
}

fn parse_hsl_args(args: &str) -> Option<Rgba> {
    let (parts, alpha) = split_args(args)?;
    let hue_text = parts[0].strip_suffix("deg").unwrap_or(parts[0]);
    let hue: f64 = hue_text.trim().parse().ok()?;
    let saturation = parse_percent(parts[1])?;
    let lightness = parse_percent(parts[2])?;
    let a = match alpha {
        Some(a) => parse_alpha(a)?,
        None => 1.0,
    };

    let (r, g, b) = hsl_to_rgb(hue, saturation, lightness);
    Some(Rgba::new(r, g, b, a))
}

/// Hue-sector conversion; inputs are degrees and 0-1 fractions.
fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (f64, f64, f64) {
    let h = hue.rem_euclid(360.0);
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let second = chroma * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let offset = lightness - chroma / 2.0;

    let (r, g, b) = match h {
        h if h < 60.0 => (chroma, second, 0.0),
        h if h < 120.0 => (second, chroma, 0.0),
        h if h < 180.0 => (0.0, chroma, second),
        h if h < 240.0 => (0.0, second, chroma),
        h if h < 300.0 => (second, 0.0, chroma),
        _ => (chroma, 0.0, second),
    };

    // Snap to byte precision so formatting is stable.
    let snap = |v: f64| f64::from(to_byte(v + offset)) / 255.0;
    (snap(r), snap(g), snap(b))
}
