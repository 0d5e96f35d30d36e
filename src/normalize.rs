//! Shared pattern library for track, artist and album name parsing.
//! Used by the track normalizer, the track-set resolver and the album cleaner.
//!
//! CRITICAL: rule order in CLEAN_PATTERNS is load-bearing. Run tests after changes.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Cosmetic rewrite rules (applied in order, to title and artist in lock-step).
pub static CLEAN_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        // "hi -bye" → "hi - bye"
        (Regex::new(r" -(\S)").unwrap(), " - $1"),
        // "hi- bye" → "hi - bye"
        (Regex::new(r"(\S)- ").unwrap(), "$1 - "),
        // "hi  bye" → "hi bye"
        (Regex::new(r"\s{2,}").unwrap(), " "),
        // "hi ( bye)" → "hi (bye)"
        (Regex::new(r"\( +").unwrap(), "("),
        // "hi (bye )" → "hi (bye)", "hi (bye))" → "hi (bye)"
        (Regex::new(r" \)+|\)+$").unwrap(), ")"),
        // "\"bye\"" → "bye", "hi - \"bye\"" → "hi - bye"
        (Regex::new(r#"(^|- )"([^"]+)"( \(|$)"#).unwrap(), "$1$2$3"),
        // "(b - hi edit)" → "(b-hi edit)"
        (Regex::new(r"([\[(][^(-]+) - ([^\]()]+[\])])").unwrap(), "$1-$2"),
        // "bye - Reworked" → "bye (Reworked)"
        (Regex::new(r"- Reworked").unwrap(), "(Reworked)"),
        // Edition and download tokens: "[EP]", "(LP)", "(Free Download)", "[Free DL]"
        (Regex::new(r"(?i)\s*[\[(](?:EP|LP|free\s*(?:download|dl))[\])]").unwrap(), ""),
    ]
});

/// Digital-only / bonus markers, stripped in order.
pub static DIGI_ONLY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // "DIGI 1. Title", "DIGITAL 2 - Title", "Bonus -- Title"
        Regex::new(r"^(DIGI(TAL)? ?[\d.]+|Bonus\W{2,})\W*").unwrap(),
        // "Title (Digital Only)", "Title - Bandcamp Exclusive"
        Regex::new(r"(?i)[^\w)]+(bandcamp[^-]+|digi(tal)?)(\W*(\W+|only|bonus|exclusive)\W*$)").unwrap(),
        // "Title (Bonus Track)", "Title [Bandcamp Exclusive Bonus]"
        Regex::new(r"(?i)[^\w)]+(bandcamp exclusive )?bonus( track)?(\]\W*|\W*$)").unwrap(),
    ]
});

/// Single non-word character surrounded by spaces: "hi | bye", "hi - bye".
pub static DELIMITER: Lazy<Regex> = Lazy::new(|| Regex::new(r" ([^\w&()+/\[\] ]) ").unwrap());

/// Remix or edit annotation: "hi (Bye Remix)", "hi (Someone Edit)".
pub static REMIXER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\W*\( *([^)]+) (?:(?:re)?mix|edit)\)").unwrap());

/// Featuring annotation candidate: "ft. Hello", "(ft. Hello)", "[feat. Hello]".
/// A bracketed annotation must close; the remix exclusion is checked in `find_featuring`.
pub static FEATURING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i) *(?:([\[(])f(?:ea)?t(?:[. ]|uring)([^\]\[()]+)[\])]| f(?:ea)?t(?:[. ]|uring)([^\]\[()]+)) *",
    )
    .unwrap()
});

/// Embedded album name: "Title [Some Album EP]".
pub static ELP_ALBUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[- ]*\[([^\]]+ [EL]P)\]+").unwrap());

/// Vinyl side / alternate track identifier at the start: "B2 - Title", "A1. Title".
pub static TRACK_ALT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^([A-H]{1,3}[0-6])\W+").unwrap());

/// Remix, edit or featuring annotation and everything after it.
pub static REMIX_OR_FT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" [\[(].*(?i:mix|edit|f(?:ea)?t(?:\.|uring)?).*").unwrap());

/// Catalog number body: "PRH-002", "BLCKLPS009", "EDLX.051", "MCVA003".
const CATNUM: &str = r"[A-Z]{2,}[A-Z.$]*[-_]?\d{2,}[A-Z]?";

/// Catalog number as a standalone token.
pub static CATNUM_ANYWHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\b({CATNUM})\b")).unwrap());

/// Catalog number in brackets or leading the name before a separator:
/// "Title [PRH-002]", "(CAT001) Title", "CAT001 - Title".
pub static CATNUM_DELIMITED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\s*[\[(]({CATNUM})[\])]|^({CATNUM}) - ")).unwrap()
});

/// Multi-artist separators: ", ", " & ", " x ", " vs ", " and ", " with ", ...
pub static ARTIST_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i), - |, | (?:[&x+/]|vs\.?|and|with) ").unwrap()
});

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Apply every cosmetic rule to the name and the artist candidate, rule by rule.
/// Later rules rely on earlier ones having run on both strings.
pub fn clean_lockstep(name: &str, artist: &str) -> (String, String) {
    let mut name = name.to_string();
    let mut artist = artist.to_string();
    for (pattern, repl) in CLEAN_PATTERNS.iter() {
        name = pattern.replace_all(&name, *repl).to_string();
        artist = pattern.replace_all(&artist, *repl).to_string();
    }
    (name, artist)
}

/// Strip every digital-only marker from a track name.
/// e.g., "Title (Digital Bonus)" → "Title", "DIGI 1. Title" → "Title"
pub fn strip_digi_only(name: &str) -> String {
    DIGI_ONLY_PATTERNS
        .iter()
        .fold(name.to_string(), |acc, pattern| pattern.replace_all(&acc, "").to_string())
}

/// Return the first delimiter candidate in a track name, if any.
pub fn find_delimiter(name: &str) -> Option<char> {
    DELIMITER
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().chars().next())
}

/// Return the remixer named in a "(X Remix)" / "(X Edit)" annotation.
pub fn find_remixer(name: &str) -> Option<String> {
    REMIXER
        .captures(name)
        .map(|caps| caps[1].to_string())
}

/// Remove every remix annotation.
pub fn strip_remixer(text: &str) -> String {
    REMIXER.replace_all(text, "").to_string()
}

/// Remove a trailing remix / featuring annotation from a title.
/// e.g., "Title (Someone Remix)" → "Title", "Title (feat. Other)" → "Title"
pub fn strip_remix_or_ft(title: &str) -> String {
    REMIX_OR_FT.replace(title, "").to_string()
}

/// A featuring annotation located in some text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatMatch {
    /// Byte range of the whole annotation, including surrounding spaces.
    pub range: Range<usize>,
    /// The featured artist name as written.
    pub name: String,
}

impl FeatMatch {
    /// The annotation without surrounding spaces and brackets: "ft. Hello".
    pub fn annotation<'a>(&self, text: &'a str) -> &'a str {
        text[self.range.clone()].trim_matches(|c| matches!(c, ' ' | '(' | ')' | '[' | ']'))
    }
}

/// Find the first featuring annotation that is not part of a remix credit.
///
/// The text following the "ft." marker, up to the next parenthesis, must not
/// mention "mix"; a bare annotation is also rejected when it runs into a " - "
/// separator.
/// e.g., "Title (ft. Hello)" → "Hello"; "Title (Someone ft. Other Remix)" → None
pub fn find_featuring(text: &str) -> Option<FeatMatch> {
    let mut start = 0;
    while start <= text.len() {
        let caps = FEATURING.captures_at(text, start)?;
        let whole = caps.get(0)?;
        let bracketed = caps.get(1).is_some();
        let name = caps.get(2).or_else(|| caps.get(3))?;

        let tail = &text[name.start()..];
        let upto_paren = tail.split(['(', ')']).next().unwrap_or("").to_lowercase();
        let remix_credit =
            upto_paren.contains("mix") || (!bracketed && upto_paren.contains("- "));

        if !remix_credit {
            return Some(FeatMatch {
                range: whole.range(),
                name: name.as_str().trim().to_string(),
            });
        }
        start = whole.start() + text[whole.start()..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// Catalog number from a standalone token: "[PRH-002]" → "PRH-002".
pub fn catalognum_anywhere(word: &str) -> Option<String> {
    CATNUM_ANYWHERE
        .captures(word)
        .map(|caps| caps[1].to_string())
}

/// Delimited catalog number and the span to remove from the name.
pub fn catalognum_delimited(name: &str) -> Option<(Range<usize>, String)> {
    let caps = CATNUM_DELIMITED.captures(name)?;
    let catnum = caps.get(1).or_else(|| caps.get(2))?;
    Some((caps.get(0)?.range(), catnum.as_str().to_string()))
}

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Lowercase and strip diacritics via NFKD decomposition.
/// e.g., "Électro" → "electro", "Ｔｅｃｈｎｏ" → "techno"
pub fn fold_diacritics(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Split artist strings on common multi-artist delimiters.
/// Order is preserved; duplicates are dropped case-insensitively, keeping the
/// first spelling seen. Empty parts and the literal "more" are dropped.
/// e.g., ["A, B & C", "b"] → ["A", "B", "C"]
pub fn split_artists<'a, I>(artists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut result = Vec::new();
    for artist in artists {
        for part in ARTIST_SEPARATOR.split(artist) {
            let part = part.trim();
            if part.is_empty() || part == "more" {
                continue;
            }
            if seen.insert(part.to_lowercase()) {
                result.push(part.to_string());
            }
        }
    }
    result
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(name: &str) -> String {
        clean_lockstep(name, "").0
    }

    #[test]
    fn test_clean_dash_spacing() {
        assert_eq!(clean("hi -bye"), "hi - bye");
        assert_eq!(clean("hi- bye"), "hi - bye");
        assert_eq!(clean("hi  bye"), "hi bye");
    }

    #[test]
    fn test_clean_brackets_and_quotes() {
        assert_eq!(clean("hi ( bye)"), "hi (bye)");
        assert_eq!(clean("hi (bye )"), "hi (bye)");
        assert_eq!(clean("hi (bye))"), "hi (bye)");
        assert_eq!(clean("\"bye\""), "bye");
        assert_eq!(clean("hi - \"bye\""), "hi - bye");
        assert_eq!(clean("hi - \"bye\" (edit)"), "hi - bye (edit)");
        assert_eq!(clean("hi (b - hi edit)"), "hi (b-hi edit)");
    }

    #[test]
    fn test_clean_reworked_and_edition_tokens() {
        assert_eq!(clean("bye - Reworked"), "bye (Reworked)");
        assert_eq!(clean("Title [EP]"), "Title");
        assert_eq!(clean("Title (Free Download)"), "Title");
        assert_eq!(clean("Title [free dl]"), "Title");
    }

    #[test]
    fn test_clean_applies_to_artist_too() {
        let (name, artist) = clean_lockstep("hi -bye", "Some  One");
        assert_eq!(name, "hi - bye");
        assert_eq!(artist, "Some One");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let names = [
            "hi -bye",
            "hi- bye",
            "hi ( bye )",
            "hi - \"bye\"",
            "A - B (b - hi edit)",
            "bye - Reworked",
            "Title  [EP]  (Free Download)",
            "O)))Bow 1",
            "Artist - Title (Someone Remix)",
        ];
        for name in names {
            let once = clean(name);
            assert_eq!(clean(&once), once, "rules re-matched their output for {name:?}");
        }
    }

    #[test]
    fn test_strip_digi_only() {
        assert_eq!(strip_digi_only("DIGI 1. Title"), "Title");
        assert_eq!(strip_digi_only("DIGITAL 12 - Title"), "Title");
        assert_eq!(strip_digi_only("Title (Digital Only)"), "Title");
        assert_eq!(strip_digi_only("Title - Bandcamp Exclusive"), "Title");
        assert_eq!(strip_digi_only("Title (Bonus Track)"), "Title");
        assert_eq!(strip_digi_only("Title [Bandcamp Exclusive Bonus]"), "Title");
        assert_eq!(strip_digi_only("Digital Love"), "Digital Love");
        assert_eq!(strip_digi_only("Bonus"), "Bonus");
    }

    #[test]
    fn test_find_delimiter() {
        assert_eq!(find_delimiter("hi | bye"), Some('|'));
        assert_eq!(find_delimiter("hi - bye"), Some('-'));
        assert_eq!(find_delimiter("hi & bye"), None);
        assert_eq!(find_delimiter("hi / bye"), None);
        assert_eq!(find_delimiter("hi-bye"), None);
    }

    #[test]
    fn test_find_remixer() {
        assert_eq!(find_remixer("hi (Bye Remix)"), Some("Bye".to_string()));
        assert_eq!(find_remixer("hi (Some One edit)"), Some("Some One".to_string()));
        assert_eq!(find_remixer("hi (Bye Mix)"), Some("Bye".to_string()));
        assert_eq!(find_remixer("hi (Bye)"), None);
    }

    #[test]
    fn test_find_featuring() {
        let text = "Title (ft. Hello)";
        let m = find_featuring(text).unwrap();
        assert_eq!(m.name, "Hello");
        assert_eq!(m.annotation(text), "ft. Hello");

        let text = "Title [feat. Hello]";
        assert_eq!(find_featuring(text).unwrap().annotation(text), "feat. Hello");

        let text = "Title featuring Hello";
        assert_eq!(find_featuring(text).unwrap().name, "Hello");

        let text = "(bye ft. Hello)";
        let m = find_featuring(text).unwrap();
        assert_eq!(m.name, "Hello");
        assert_eq!(&text[m.range.clone()], " ft. Hello");
    }

    #[test]
    fn test_find_featuring_skips_remix_credits() {
        assert_eq!(find_featuring("Title (Someone Remix)"), None);
        assert_eq!(find_featuring("Title (Someone ft. Other Remix)"), None);
        assert_eq!(find_featuring("Title ft. Other - Some Mix"), None);
        assert_eq!(find_featuring("Title (ft. Hello"), None);
        assert_eq!(find_featuring("Left Behind"), None);
    }

    #[test]
    fn test_catalognum() {
        assert_eq!(catalognum_anywhere("[PRH-002]"), Some("PRH-002".to_string()));
        assert_eq!(catalognum_anywhere("BLCKLPS009"), Some("BLCKLPS009".to_string()));
        assert_eq!(catalognum_anywhere("EDLX.051"), Some("EDLX.051".to_string()));
        assert_eq!(catalognum_anywhere("Title"), None);
        assert_eq!(catalognum_anywhere("MP3"), None);
        assert_eq!(catalognum_anywhere("2021"), None);

        let name = "Title [CAT001]";
        let (range, catnum) = catalognum_delimited(name).unwrap();
        assert_eq!(catnum, "CAT001");
        assert_eq!(&name[range], " [CAT001]");

        let (range, catnum) = catalognum_delimited("CAT001 - Artist - Title").unwrap();
        assert_eq!(catnum, "CAT001");
        assert_eq!(range, 0..9);
        assert_eq!(catalognum_delimited("Artist - Title"), None);
    }

    #[test]
    fn test_strip_remix_or_ft() {
        assert_eq!(strip_remix_or_ft("Title (Someone Remix)"), "Title");
        assert_eq!(strip_remix_or_ft("Title [feat. Other]"), "Title");
        assert_eq!(strip_remix_or_ft("Title (Original)"), "Title (Original)");
    }

    #[test]
    fn test_fold_diacritics() {
        assert_eq!(fold_diacritics("Électro"), "electro");
        assert_eq!(fold_diacritics("Música Clásica"), "musica clasica");
        assert_eq!(fold_diacritics("Ｔｅｃｈｎｏ"), "techno");
        assert_eq!(fold_diacritics("drum and bass"), "drum and bass");
    }

    #[test]
    fn test_split_artists() {
        assert_eq!(split_artists(["A, B & C"]), vec!["A", "B", "C"]);
        assert_eq!(split_artists(["A x B", "b"]), vec!["A", "B"]);
        assert_eq!(split_artists(["A vs. B", "C and D"]), vec!["A", "B", "C", "D"]);
        assert_eq!(split_artists(["A, more"]), vec!["A"]);
        assert_eq!(split_artists(["Xander"]), vec!["Xander"]);
        assert!(split_artists([""]).is_empty());
    }
}
