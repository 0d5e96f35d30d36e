//! Genre resolution from freeform release keywords.
//!
//! Keywords are normalized and checked against a bundled genre vocabulary.
//! How multi-word keywords are treated depends on [`GenreMode`].

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::error::{ExtractError, Result};
use crate::normalize::fold_diacritics;

// ============================================================================
// Vocabulary and Patterns
// ============================================================================

/// Bundled genre names, normalized the same way as keywords. Hyphenated
/// names are also stored with spaces: "hip-hop" and "hip hop".
static VOCABULARY: Lazy<FxHashSet<String>> = Lazy::new(|| {
    include_str!("genres.txt")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(normalize_keyword)
        .flat_map(|name| [unhyphenate(&name), name])
        .collect()
});

/// Several genres in one keyword: "ambient. techno", "#House #Techno", "house/techno"
static KEYWORD_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\. | #|[,;|/]").unwrap());

fn is_genre(word: &str) -> bool {
    VOCABULARY.contains(word) || (word.contains('-') && VOCABULARY.contains(&unhyphenate(word)))
}

/// "Hip-Hop" and "hip hop" name the same genre.
fn unhyphenate(name: &str) -> String {
    name.split(['-', ' '])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Configuration
// ============================================================================

/// How multi-word keywords may qualify as genres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenreMode {
    /// Only keywords that are known genres as a whole: "tech house"
    Classical,
    /// Also keywords made entirely of known genres: "techno house"
    #[default]
    Progressive,
    /// Also the last word of a keyword, when it is a known genre: "crazy techno" → "techno"
    Psychedelic,
}

impl FromStr for GenreMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classical" => Ok(GenreMode::Classical),
            "progressive" => Ok(GenreMode::Progressive),
            "psychedelic" => Ok(GenreMode::Psychedelic),
            other => Err(format!(
                "unknown genre mode {other:?} (expected classical, progressive or psychedelic)"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenreConfig {
    pub mode: GenreMode,
    /// Regex patterns; a matching keyword is always included as-is
    pub always_include: Vec<String>,
    pub capitalize: bool,
    /// Cap on keyword genres, 0 = unlimited
    pub maximum: usize,
}

// ============================================================================
// Resolver
// ============================================================================

#[derive(Debug, Clone)]
pub struct GenreResolver {
    mode: GenreMode,
    always_include: Vec<Regex>,
    capitalize: bool,
    maximum: usize,
}

impl GenreResolver {
    pub fn new(config: &GenreConfig) -> Result<Self> {
        let always_include = config
            .always_include
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ExtractError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            mode: config.mode,
            always_include,
            capitalize: config.capitalize,
            maximum: config.maximum,
        })
    }

    /// Genres found in the keywords, in keyword order, de-duplicated.
    pub fn get_genre<S: AsRef<str>>(&self, keywords: &[S]) -> Vec<String> {
        let candidates = keywords
            .iter()
            .flat_map(|keyword| split_keyword(keyword.as_ref()))
            .filter_map(|keyword| self.contribution(&keyword))
            .collect();
        dedupe_genres(candidates)
    }

    /// What a single normalized keyword contributes under the current mode.
    fn contribution(&self, keyword: &str) -> Option<String> {
        if is_genre(keyword) || self.always_include.iter().any(|re| re.is_match(keyword)) {
            return Some(keyword.to_string());
        }
        let words: Vec<&str> = keyword.split(' ').collect();
        if words.len() < 2 {
            return None;
        }
        match self.mode {
            GenreMode::Classical => None,
            GenreMode::Progressive | GenreMode::Psychedelic
                if words.iter().all(|word| is_genre(word)) =>
            {
                Some(keyword.to_string())
            }
            GenreMode::Progressive => None,
            GenreMode::Psychedelic => words
                .last()
                .filter(|word| is_genre(word))
                .map(|word| word.to_string()),
        }
    }

    /// Style from a canonical tag URL or slug.
    /// e.g., "https://bandcamp.com/tag/drum-and-bass" → "drum and bass"
    pub fn style(&self, tag: Option<&str>) -> Option<String> {
        let slug = tag?.trim_end_matches('/').rsplit('/').next()?;
        let style = normalize_keyword(&slug.replace('-', " "));
        (!style.is_empty()).then(|| self.format(style))
    }

    /// Final genre string: the style first, then keyword genres up to the cap.
    /// None when there is nothing to report.
    pub fn genre<S: AsRef<str>>(&self, keywords: &[S], style: Option<&str>) -> Option<String> {
        let style_key = style.map(str::to_lowercase);
        let mut keyword_genres: Vec<String> = self
            .get_genre(keywords)
            .into_iter()
            .filter(|genre| style_key.as_deref() != Some(genre.as_str()))
            .collect();
        if self.maximum > 0 {
            keyword_genres.truncate(self.maximum);
        }

        let genres: Vec<String> = style
            .map(String::from)
            .into_iter()
            .chain(keyword_genres.into_iter().map(|genre| self.format(genre)))
            .collect();
        (!genres.is_empty()).then(|| genres.join(", "))
    }

    fn format(&self, genre: String) -> String {
        if self.capitalize {
            capitalize_first(&genre)
        } else {
            genre
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Lowercase, fold diacritics, drop '.' and '#', spell out '&'.
/// e.g., "Drum & Bass" → "drum and bass", "E.B.M" → "ebm"
pub fn normalize_keyword(keyword: &str) -> String {
    fold_diacritics(keyword)
        .replace(['.', '#'], "")
        .replace('&', " and ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn split_keyword(keyword: &str) -> Vec<String> {
    KEYWORD_SEPARATOR
        .split(keyword)
        .map(normalize_keyword)
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Drop repeated genres, and genres already covered by a longer one:
/// "house" next to "garage house", "hardtrance" next to "hard trance".
fn dedupe_genres(candidates: Vec<String>) -> Vec<String> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let unique: Vec<String> = candidates
        .into_iter()
        .filter(|genre| seen.insert(genre.to_lowercase()))
        .collect();
    unique
        .iter()
        .filter(|genre| !unique.iter().any(|other| other != *genre && covers(other, genre)))
        .cloned()
        .collect()
}

fn covers(other: &str, genre: &str) -> bool {
    let squashed: String = other.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    format!(" {other} ").contains(&format!(" {genre} ")) || squashed == genre
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
