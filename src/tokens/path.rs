//! Path normalization.
//!
//! Upstream names and groups use `/`, `:` or `>` as separators with
//! arbitrary spacing. Every identity comparison (matching, deduplication,
//! alias-target lookup) goes through [`canonical`] first.

/// Split a raw path into trimmed, non-empty segments.
///
/// `"A//B"`, `"A / B"` and `"A:B"` all yield `["A", "B"]`.
#[must_use]
pub fn normalize_path(raw: &str) -> Vec<String> {
    raw.split(['/', ':', '>'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Normalize a leaf name (trim only).
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_string()
}

/// Canonical `/`-joined form of a raw path.
#[must_use]
pub fn canonical(raw: &str) -> String {
    normalize_path(raw).join("/")
}

/// Canonical full name for a group and leaf name.
#[must_use]
pub fn join(group: &[String], name: &str) -> String {
    group
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(name))
        .flat_map(normalize_path)
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path("Color//Primary/ Blue "),
            vec!["Color", "Primary", "Blue"]
        );
        assert_eq!(normalize_path("A:B>C"), vec!["A", "B", "C"]);
        assert!(normalize_path(" / : ").is_empty());
    }

    #[test]
    fn test_normalize_name_only_trims() {
        assert_eq!(normalize_name("  Primary/Blue "), "Primary/Blue");
    }

    #[test]
    fn test_join() {
        let group = vec!["Color".to_string(), "Primary".to_string()];
        assert_eq!(join(&group, " Blue"), "Color/Primary/Blue");
        assert_eq!(join(&[], "Space > M"), "Space/M");
    }
}
