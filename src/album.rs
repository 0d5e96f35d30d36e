//! Album title cleaning.

use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// "VA Album", "Various Artists - Album", "Various Artist: Album"
static VA_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:va\b\W*|various artists?\s*[^\w\s]+\s*)").unwrap());

/// "Album VA", "Album - Various Artists". "Album VA001" does not match.
static VA_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\W*\b(?:various artists?|va)$").unwrap());

/// "Album [EP]" / "Album (LP)"; the dotted "E.P." is a title word and stays.
static BRACKETED_EDITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*[\[(](EP|LP)[\])]").unwrap());

/// Marketing annotations, removed wherever they appear.
static MARKETING: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // "(limited edition)", "(FREE DL)", "(Free Download)", "[Vinyl]", "(Single)"
        Regex::new(
            r"(?i)\s*[\[(](?:limited edition|free\s*(?:download|dl)|single|vinyl|free|bonus tracks?)[\])]",
        )
        .unwrap(),
        // "Album Incl. Remix", "Album (Incl. some Remixes)"
        Regex::new(r"(?i)\s*[\[(]?\bincl\.?\s[^\])]*[\])]?$").unwrap(),
    ]
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

// ============================================================================
// CLEANING
// ============================================================================

/// Clean a raw release title.
///
/// Each of `extras` (artists, catalog number, ...) is cut out together with the
/// separator punctuation around it. Various-artists markers go only when they
/// open or close the title. Bracketed edition markers become plain words and
/// marketing annotations are dropped. A leading label ("[Label] Album",
/// "Label | Album") is removed, other label mentions stay.
/// e.g., "Artist - Album [EP]" with extras ["Artist"] → "Album EP"
pub fn clean<S: AsRef<str>>(name: &str, extras: &[S], label: &str) -> String {
    let mut name = name.to_string();
    for extra in extras {
        name = remove_extra(&name, extra.as_ref());
    }
    let name = remove_leading_label(&name, label);
    let name = BRACKETED_EDITION.replace_all(&name, " $1").to_string();
    let name = MARKETING
        .iter()
        .fold(name, |acc, pattern| pattern.replace_all(&acc, "").to_string());

    let name = trim_separators(&name);
    let name = VA_START.replace(&name, "");
    let name = VA_END.replace(&name, "");
    trim_separators(&WHITESPACE.replace_all(&name, " "))
}

/// Cut one literal out of the title, along with the punctuation around it.
/// Apostrophes and opening brackets after it are kept: "hi'Hello" → " 'Hello".
fn remove_extra(name: &str, extra: &str) -> String {
    let extra = extra.trim();
    if extra.is_empty() {
        return name.to_string();
    }
    let starts_word = extra.chars().next().is_some_and(is_word_char);
    let ends_word = extra.chars().last().is_some_and(is_word_char);
    let pattern = format!(
        r"(?i)(?:[^'\])\w]|_)*{}{}{}(?:[^'(\[\w]|_|\d+$)*",
        if starts_word { r"\b" } else { "" },
        regex::escape(extra),
        if ends_word { r"\b" } else { "" },
    );
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(name, " ").to_string(),
        Err(_) => name.to_string(),
    }
}

/// "[Label] Album", "Label - Album", "Label | Album" → "Album".
/// "Label-Album" and "Album (Label Refix)" are left alone.
fn remove_leading_label(name: &str, label: &str) -> String {
    if label.is_empty() {
        return name.to_string();
    }
    let label = regex::escape(label);
    let pattern = format!(r"(?i)^(?:\[{label}\]|{label}\s*[-|:])\s+");
    match Regex::new(&pattern) {
        Ok(re) => re.replace(name, "").to_string(),
        Err(_) => name.to_string(),
    }
}

fn trim_separators(name: &str) -> String {
    name.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '|' | ':' | '"' | ','))
        .to_string()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// ============================================================================
// TESTS
// ============================================================================
