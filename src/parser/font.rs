//! Typeface hints from PostScript font names.
//!
//! PDF font resources carry names like `ABCDEF+Arial-BoldMT`. The heuristics
//! here recover a family, a numeric weight and a slant from such names.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{FontFace, FontStyle};

/// Weight keywords, most specific first. The first hit wins.
const WEIGHTS: &[(&str, u16)] = &[
    ("extrabold", 800),
    ("ultrabold", 800),
    ("semibold", 600),
    ("demibold", 600),
    ("black", 900),
    ("heavy", 900),
    ("bold", 700),
    ("medium", 500),
    ("book", 500),
    ("light", 300),
    ("thin", 200),
];

const SLANTS: &[&str] = &["italic", "oblique", "slant"];

/// Words that never belong to a family name.
const STYLE_WORDS: &[&str] = &[
    "bold",
    "black",
    "heavy",
    "medium",
    "book",
    "light",
    "thin",
    "regular",
    "normal",
    "italic",
    "oblique",
    "slant",
    "condensed",
    "extended",
    "narrow",
    "compressed",
    "expanded",
];

/// Vendor suffixes that trail PostScript names (`ArialMT`, `TimesNewRomanPSMT`).
const VENDOR_SUFFIXES: &[&str] = &["MT", "PS", "PSMT"];

fn subset_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{6}\+").expect("valid subset prefix regex"))
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Derive typeface hints from a raw font name.
///
/// Every field of the result is optional. An empty or unrecognizable name
/// yields an empty [`FontFace`].
pub fn parse_font_name(raw: &str) -> FontFace {
    let name = subset_prefix().replace(raw.trim(), "");
    let name = name.replace(['.', '_'], " ");
    let name = whitespace().replace_all(name.trim(), " ").into_owned();
    if name.is_empty() {
        return FontFace::default();
    }

    let lower = name.to_lowercase();
    let weight = WEIGHTS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, weight)| *weight);
    let style = SLANTS
        .iter()
        .any(|slant| lower.contains(slant))
        .then_some(FontStyle::Italic);

    FontFace {
        family: family_name(&name),
        weight,
        style,
    }
}

fn family_name(name: &str) -> Option<String> {
    let words: Vec<String> = name
        .split(|c: char| !c.is_alphabetic())
        .filter(|token| !token.is_empty())
        .filter(|token| {
            let lower = token.to_lowercase();
            !STYLE_WORDS.iter().any(|word| lower.contains(word))
        })
        .flat_map(split_camel_case)
        .filter(|word| !VENDOR_SUFFIXES.contains(&word.as_str()))
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

/// Split at lower-to-upper transitions and at the end of an uppercase run
/// that is followed by a lowercase letter (`PSMTFoo` -> `PSMT`, `Foo`).
fn split_camel_case(token: &str) -> Vec<String> {
    let chars: Vec<char> = token.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subset_bold_mt() {
        let face = parse_font_name("ABCDEF+Arial-BoldMT");
        assert_eq!(face.family.as_deref(), Some("Arial"));
        assert_eq!(face.weight, Some(700));
        assert_eq!(face.style, None);
    }

    #[test]
    fn test_italic_without_weight() {
        let face = parse_font_name("Times-Italic");
        assert_eq!(face.family.as_deref(), Some("Times"));
        assert_eq!(face.weight, None);
        assert_eq!(face.style, Some(FontStyle::Italic));
    }

    #[test]
    fn test_plain_family() {
        let face = parse_font_name("Helvetica");
        assert_eq!(face.family.as_deref(), Some("Helvetica"));
        assert!(face.weight.is_none());
        assert!(face.style.is_none());
    }

    #[test]
    fn test_camel_case_family() {
        let face = parse_font_name("TimesNewRomanPSMT");
        assert_eq!(face.family.as_deref(), Some("Times New Roman"));

        let face = parse_font_name("ArialMT");
        assert_eq!(face.family.as_deref(), Some("Arial"));
    }

    #[test]
    fn test_specific_weights_win() {
        assert_eq!(parse_font_name("MyriadPro-Semibold").weight, Some(600));
        assert_eq!(parse_font_name("Inter-ExtraBold").weight, Some(800));
        assert_eq!(parse_font_name("Helvetica-Black").weight, Some(900));
        assert_eq!(parse_font_name("Roboto-Light").weight, Some(300));
        assert_eq!(parse_font_name("Roboto-Thin").weight, Some(200));
    }

    #[test]
    fn test_oblique_and_separators() {
        let face = parse_font_name("Helvetica_Neue.BoldOblique");
        assert_eq!(face.family.as_deref(), Some("Helvetica Neue"));
        assert_eq!(face.weight, Some(700));
        assert_eq!(face.style, Some(FontStyle::Italic));
    }

    #[test]
    fn test_style_only_name_has_no_family() {
        let face = parse_font_name("BoldItalic");
        assert!(face.family.is_none());
        assert_eq!(face.weight, Some(700));
        assert_eq!(face.style, Some(FontStyle::Italic));
    }

    #[test]
    fn test_empty_name() {
        assert!(parse_font_name("").is_empty());
        assert!(parse_font_name("   ").is_empty());
    }
}
