// src/normalize.rs
//! Place-name normalization so the registry, ZUJ and code-table extracts can be
//! joined on plain name equality.

use once_cell::sync::Lazy;
use regex::Regex;

/// Honorific marker of the capital city, e.g. "Hlavní město Praha".
pub const CAPITAL_PREFIX: &str = "Hlavní město ";

/// Administrative prefixes, most specific first. Only the first match is stripped.
pub const ADMINISTRATIVE_PREFIXES: [&str; 5] = [
    CAPITAL_PREFIX,
    "Statutární město ",
    "Město ",
    "Městys ",
    "Obec ",
];

static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-\s*").unwrap());

/// Strips one leading administrative prefix ("Obec Lhota" -> "Lhota") and trims.
pub fn normalize_name(raw: &str) -> String {
    let trimmed = raw.trim();
    for prefix in ADMINISTRATIVE_PREFIXES {
        if let Some(stripped) = trimmed.strip_prefix(prefix) {
            return stripped.trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Collapses whitespace-hyphen-whitespace into a bare hyphen ("Brno - město" -> "Brno-město").
pub fn normalize_separators(raw: &str) -> String {
    SEPARATOR_RE.replace_all(raw.trim(), "-").into_owned()
}

/// Bare form of a capital-city name, if the name carries the capital honorific.
pub fn capital_short_name(name: &str) -> Option<&str> {
    name.trim()
        .strip_prefix(CAPITAL_PREFIX)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_stripping() {
        assert_eq!(normalize_name("Obec Lhota"), "Lhota");
        assert_eq!(normalize_name("Město Kolín"), "Kolín");
        assert_eq!(normalize_name("Městys Křivoklát"), "Křivoklát");
        assert_eq!(normalize_name("Statutární město Brno"), "Brno");
        assert_eq!(normalize_name("  Hlavní město Praha "), "Praha");
        assert_eq!(normalize_name("Kutná Hora"), "Kutná Hora");
    }

    #[test]
    fn test_only_one_prefix_is_stripped() {
        // "Obec Město" is a name, not two prefixes.
        assert_eq!(normalize_name("Obec Město Albrechtice"), "Město Albrechtice");
    }

    #[test]
    fn test_prefix_requires_word_boundary() {
        assert_eq!(normalize_name("Městyska"), "Městyska");
        assert_eq!(normalize_name("Obecnice"), "Obecnice");
    }

    #[test]
    fn test_normalizing_twice_eats_a_name_word() {
        // Town whose real name starts with a prefix word: stored names must never be re-normalized.
        let once = normalize_name("Město Město Touškov");
        assert_eq!(once, "Město Touškov");
        assert_eq!(normalize_name(&once), "Touškov");
        assert_eq!(normalize_name("Obec Lhota"), normalize_name(&normalize_name("Obec Lhota")));
    }

    #[test]
    fn test_separator_normalization() {
        assert_eq!(normalize_separators("Brno - město"), "Brno-město");
        assert_eq!(normalize_separators("Praha  -  východ"), "Praha-východ");
        assert_eq!(normalize_separators(" Frýdek-Místek "), "Frýdek-Místek");
        assert_eq!(normalize_separators("Plzeň-jih"), "Plzeň-jih");
        let once = normalize_separators("Ostrava - město");
        assert_eq!(normalize_separators(&once), once);
    }

    #[test]
    fn test_capital_short_name() {
        assert_eq!(capital_short_name("Hlavní město Praha"), Some("Praha"));
        assert_eq!(capital_short_name("Praha"), None);
        assert_eq!(capital_short_name("Statutární město Brno"), None);
    }
}
