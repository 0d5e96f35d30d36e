//! Track name normalization.
//!
//! A raw track name goes through a fixed sequence of stages, each returning the
//! remaining name plus whatever it extracted. Stage order is load-bearing: every
//! stage assumes the earlier ones already removed their target substrings.
//!
//! Derived values (title, artist, digital-only flag) are computed from the
//! post-parse name on demand.

use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;

use crate::models::{RawTrackRecord, TrackInfo};
use crate::normalize::{
    catalognum_delimited, clean_lockstep, find_featuring, find_remixer, split_artists,
    strip_digi_only, strip_remix_or_ft, strip_remixer, ELP_ALBUM, TRACK_ALT,
};

/// Canonical artist / title separator.
pub const SEPARATOR: &str = " - ";

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

// ============================================================================
// Name Parsing
// ============================================================================

/// Release-level context a track name is parsed against.
#[derive(Clone, Copy, Debug)]
pub struct TrackContext<'a> {
    pub delimiter: char,
    /// Release-wide catalog number, empty when none was found
    pub catalognum: &'a str,
    pub label: &'a str,
    /// 1-based position in the release
    pub index: u32,
}

/// Fields extracted from one raw track name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedName {
    /// Name left after every extraction stage
    pub name: String,
    /// Artist from page metadata, cleaned in lock-step with the name
    pub artist: String,
    /// Featuring annotation as written: "ft. Someone"
    pub featuring: String,
    /// Embedded album: "Some Album EP"
    pub album: String,
    pub catalognum: String,
    pub remixer: String,
    pub track_alt: Option<String>,
}

/// Parse a raw track name into its fields.
pub fn parse_name(name: &str, artist: &str, ctx: &TrackContext) -> ParsedName {
    let name = unify_delimiter(name, ctx.delimiter);
    let name = strip_label(&name, ctx.label);

    let (name, artist) = clean_lockstep(&name, artist);
    let name = name.trim().trim_start_matches('-').to_string();

    let (name, track_alt) = take_track_alt(name);
    let (name, catalognum) = if ctx.catalognum.is_empty() {
        take_catalognum(name)
    } else {
        (name, ctx.catalognum.to_string())
    };
    let name = strip_index(name, ctx.index);
    let remixer = find_remixer(&name).unwrap_or_default();
    let (name, album) = take_album(name);
    let (name, artist, featuring) = take_featuring(name, artist);

    ParsedName {
        name,
        artist,
        featuring,
        album,
        catalognum,
        remixer,
        track_alt,
    }
}

/// "A | B" → "A - B" when the release delimiter is '|'.
fn unify_delimiter(name: &str, delimiter: char) -> String {
    name.replace(&format!(" {delimiter} "), SEPARATOR)
}

/// "Artist - Title - Label" → "Artist - Title"
fn strip_label(name: &str, label: &str) -> String {
    if label.is_empty() {
        return name.to_string();
    }
    match name.strip_suffix(label) {
        Some(rest) => rest.trim_end_matches([' ', '-']).to_string(),
        None => name.to_string(),
    }
}

/// "B2 - Artist - Title" → ("Artist - Title", Some("B2"))
fn take_track_alt(name: String) -> (String, Option<String>) {
    let found = TRACK_ALT
        .captures(&name)
        .and_then(|caps| Some((caps.get(0)?.end(), caps[1].to_string())));
    match found {
        Some((end, alt)) => (name[end..].to_string(), Some(alt)),
        None => (name, None),
    }
}

/// "Artist - Title [CAT001]" → ("Artist - Title", "CAT001")
fn take_catalognum(name: String) -> (String, String) {
    match catalognum_delimited(&name) {
        Some((range, catnum)) => {
            let mut rest = name;
            rest.replace_range(range, "");
            (rest, catnum)
        }
        None => (name, String::new()),
    }
}

/// Strip a leading "01. " / "1 - " matching this track's position.
/// The number stays when the separator is followed by a digit ("1.5 Title"),
/// and "0100 Club" keeps its name since the index must end at a non-word char.
fn strip_index(name: String, index: u32) -> String {
    let Ok(prefix_re) = Regex::new(&format!(r"^0*{index}(\W+)")) else {
        return name;
    };
    let bounds = prefix_re
        .captures(&name)
        .and_then(|caps| Some((caps.get(0)?.end(), caps.get(1)?.start())));
    let Some((end, sep_start)) = bounds else {
        return name;
    };
    if name[sep_start..].chars().nth(1).is_some_and(|c| c.is_ascii_digit()) {
        return name;
    }
    name[end..].to_string()
}

/// "Title [Some Album EP]" → ("Title", "Some Album EP")
fn take_album(name: String) -> (String, String) {
    let found = ELP_ALBUM
        .captures(&name)
        .map(|caps| (caps[0].to_string(), caps[1].to_string()));
    match found {
        Some((whole, album)) => (name.replace(&whole, ""), album),
        None => (name, String::new()),
    }
}

/// Remove a featuring annotation from the name, or failing that from the
/// artist. The annotation is kept unless the featured name already appears in
/// the artist.
fn take_featuring(name: String, artist: String) -> (String, String, String) {
    let mut fields = [name, artist];
    let mut featuring = String::new();
    for idx in 0..fields.len() {
        let Some(m) = find_featuring(&fields[idx]) else {
            continue;
        };
        let span = fields[idx][m.range.clone()].trim_end().to_string();
        let annotation = m.annotation(&fields[idx]).to_string();
        fields[idx] = fields[idx].replace(&span, "");
        if !fields[1].contains(&m.name) {
            featuring = annotation;
        }
        break;
    }
    let [name, artist] = fields;
    (name, artist, featuring)
}

/// Parse "P00H03M21S"-style durations into seconds. Anything unexpected,
/// including a total that does not fit in `u32`, is 0.
pub fn parse_duration(text: &str) -> u32 {
    let Some(parts) = DIGITS
        .find_iter(text)
        .map(|m| m.as_str().parse::<u64>().ok())
        .collect::<Option<Vec<u64>>>()
    else {
        return 0;
    };
    let seconds = match parts.as_slice() {
        [h, m, s] => h
            .checked_mul(3600)
            .and_then(|h| m.checked_mul(60)?.checked_add(h))
            .and_then(|hm| hm.checked_add(*s)),
        [m, s] => m.checked_mul(60).and_then(|m| m.checked_add(*s)),
        _ => None,
    };
    seconds.and_then(|s| u32::try_from(s).ok()).unwrap_or(0)
}

// ============================================================================
// Track
// ============================================================================

/// One parsed track of a release.
#[derive(Clone, Debug)]
pub struct Track {
    pub track_id: String,
    /// 1-based
    pub index: u32,
    /// Post-parse raw name
    pub name: String,
    /// Artist from page metadata
    pub meta_artist: String,
    pub featuring: String,
    pub album: String,
    pub catalognum: String,
    pub remixer: String,
    pub track_alt: Option<String>,
    pub single: Option<bool>,
    pub duration_seconds: u32,
    pub lyrics: String,

    artist_override: Option<String>,
    title_override: Option<String>,
    digi_only_name: OnceCell<String>,
}

impl Track {
    pub fn from_record(
        record: &RawTrackRecord,
        name: &str,
        delimiter: char,
        catalognum: &str,
        label: &str,
    ) -> Self {
        let index = record.position.unwrap_or(1);
        let ctx = TrackContext {
            delimiter,
            catalognum,
            label,
            index,
        };
        let parsed = parse_name(name, record.artist(), &ctx);
        Self {
            track_id: record.id.clone(),
            index,
            name: parsed.name,
            meta_artist: parsed.artist,
            featuring: parsed.featuring,
            album: parsed.album,
            catalognum: parsed.catalognum,
            remixer: parsed.remixer,
            track_alt: parsed.track_alt,
            single: None,
            duration_seconds: record.duration.as_deref().map_or(0, parse_duration),
            lyrics: record.lyrics(),
            artist_override: None,
            title_override: None,
            digi_only_name: OnceCell::new(),
        }
    }

    /// The name with digital-only markers removed.
    pub fn digi_only_name(&self) -> &str {
        self.digi_only_name.get_or_init(|| strip_digi_only(&self.name))
    }

    /// The digi-only name, prefixed with the metadata artist when the name
    /// itself carries no artist.
    pub fn full_name(&self) -> String {
        let name = self.digi_only_name();
        if !self.meta_artist.is_empty() && !name.contains(SEPARATOR) {
            format!("{}{}{}", self.meta_artist, SEPARATOR, name).trim().to_string()
        } else {
            name.trim().to_string()
        }
    }

    pub fn is_digital_only(&self) -> bool {
        self.full_name() != self.digi_only_name()
    }

    /// Last non-empty " - " segment of the full name, with any trailing empty
    /// segments kept.
    fn parsed_title(&self) -> String {
        let full = self.full_name();
        let parts: Vec<&str> = full.split(SEPARATOR).collect();
        for (idx, part) in parts.iter().enumerate().rev() {
            if !part.trim_matches([' ', '-']).is_empty() {
                return parts[idx..].join(SEPARATOR);
            }
        }
        full
    }

    pub fn title(&self) -> String {
        self.title_override
            .clone()
            .unwrap_or_else(|| self.parsed_title())
    }

    /// Everything before the title, without remix annotations or the remixer.
    pub fn artist(&self) -> String {
        if let Some(artist) = &self.artist_override {
            return artist.clone();
        }
        let full = self.full_name();
        let title = self.parsed_title();
        let artist = full.strip_suffix(title.as_str()).unwrap_or(&full);
        let mut artist = strip_remixer(artist.trim_matches([',', ' ', '-']));
        if !self.remixer.is_empty() {
            let mut split = split_artists([artist.as_str()]);
            if split.len() > 1 {
                if let Some(pos) = split.iter().position(|a| *a == self.remixer) {
                    split.remove(pos);
                    artist = split.join(", ");
                }
            }
        }
        artist.trim_matches([' ', '-']).to_string()
    }

    pub fn artists(&self) -> Vec<String> {
        let artist = self.artist();
        split_artists(artist.split(", "))
    }

    /// Title without a trailing remix / featuring annotation.
    pub fn main_title(&self) -> String {
        strip_remix_or_ft(&self.title())
    }

    /// Replace the derived artist and, optionally, the title.
    pub(crate) fn set_artist(&mut self, artist: String, title: Option<String>) {
        self.artist_override = Some(artist);
        if title.is_some() {
            self.title_override = title;
        }
    }

    pub fn info(&self) -> TrackInfo {
        let single = self.single == Some(true);
        let index = (!single).then_some(self.index);
        let artist = self.artist();
        TrackInfo {
            track_id: self.track_id.clone(),
            index,
            medium_index: index,
            artist: if self.featuring.is_empty() {
                artist
            } else {
                format!("{} {}", artist, self.featuring)
            },
            title: self.title(),
            length: self.duration_seconds,
            track_alt: self.track_alt.clone(),
            lyrics: self.lyrics.clone(),
            catalognum: (!self.catalognum.is_empty()).then(|| self.catalognum.clone()),
            digital_only: self.is_digital_only(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(index: u32) -> TrackContext<'static> {
        TrackContext {
            delimiter: '-',
            catalognum: "",
            label: "Label",
            index,
        }
    }

    fn track(name: &str, artist: &str, index: u32) -> Track {
        let record: RawTrackRecord = serde_json::from_value(json!({
            "@id": format!("t{index}"),
            "name": name,
            "position": index,
            "byArtist": {"name": artist},
        }))
        .unwrap();
        Track::from_record(&record, name, '-', "", "Label")
    }

    #[test]
    fn test_parse_name_index_prefix() {
        let parsed = parse_name("1. A - B", "", &ctx(1));
        assert_eq!(parsed.name, "A - B");

        let parsed = parse_name("01 - A - B", "", &ctx(1));
        assert_eq!(parsed.name, "A - B");

        // index must match this track's position
        let parsed = parse_name("2. A - B", "", &ctx(1));
        assert_eq!(parsed.name, "2. A - B");
    }

    #[test]
    fn test_parse_name_keeps_numbers_in_names() {
        let parsed = parse_name("0100 Club - Title", "", &ctx(1));
        assert_eq!(parsed.name, "0100 Club - Title");

        let parsed = parse_name("1.5 Degrees - Title", "", &ctx(1));
        assert_eq!(parsed.name, "1.5 Degrees - Title");
    }

    #[test]
    fn test_parse_name_track_alt() {
        let parsed = parse_name("B2 - Artist - Title", "", &ctx(5));
        assert_eq!(parsed.track_alt.as_deref(), Some("B2"));
        assert_eq!(parsed.name, "Artist - Title");

        let parsed = parse_name("Artist - Title", "", &ctx(5));
        assert_eq!(parsed.track_alt, None);
    }

    #[test]
    fn test_parse_name_catalognum() {
        let parsed = parse_name("Artist - Title [CAT001]", "", &ctx(1));
        assert_eq!(parsed.catalognum, "CAT001");
        assert_eq!(parsed.name, "Artist - Title");

        // a release-wide catalog number wins and nothing else is extracted
        let known = TrackContext {
            catalognum: "CAT002",
            ..ctx(1)
        };
        let parsed = parse_name("Artist - Title [CAT001]", "", &known);
        assert_eq!(parsed.catalognum, "CAT002");
        assert_eq!(parsed.name, "Artist - Title [CAT001]");
    }

    #[test]
    fn test_parse_name_delimiter_and_label() {
        let pipe = TrackContext {
            delimiter: '|',
            ..ctx(1)
        };
        assert_eq!(parse_name("A | B", "", &pipe).name, "A - B");
        assert_eq!(parse_name("Artist - Title - Label", "", &ctx(1)).name, "Artist - Title");
    }

    #[test]
    fn test_parse_name_remixer_kept_in_name() {
        let parsed = parse_name("Artist - Title (Someone Remix)", "", &ctx(1));
        assert_eq!(parsed.remixer, "Someone");
        assert_eq!(parsed.name, "Artist - Title (Someone Remix)");
        assert_eq!(parsed.featuring, "");
    }

    #[test]
    fn test_parse_name_album() {
        let parsed = parse_name("Artist - Title [Some Album EP]", "", &ctx(1));
        assert_eq!(parsed.album, "Some Album EP");
        assert_eq!(parsed.name, "Artist - Title");
    }

    #[test]
    fn test_parse_name_featuring() {
        let parsed = parse_name("Artist - Title (ft. Other)", "", &ctx(1));
        assert_eq!(parsed.name, "Artist - Title");
        assert_eq!(parsed.featuring, "ft. Other");

        // found in the artist when the name has none
        let parsed = parse_name("Title", "Artist feat. Other", &ctx(1));
        assert_eq!(parsed.name, "Title");
        assert_eq!(parsed.artist, "Artist");
        assert_eq!(parsed.featuring, "feat. Other");

        // already credited as an artist
        let parsed = parse_name("Title (feat. B)", "A & B", &ctx(1));
        assert_eq!(parsed.name, "Title");
        assert_eq!(parsed.featuring, "");
    }

    #[test]
    fn test_parse_name_featuring_not_inside_remix() {
        let parsed = parse_name("Artist - Title (Someone Remix)", "", &ctx(1));
        assert_eq!(parsed.featuring, "");
        let parsed = parse_name("Artist - Title (Someone ft. Other Remix)", "", &ctx(1));
        assert_eq!(parsed.featuring, "");
        assert_eq!(parsed.name, "Artist - Title (Someone ft. Other Remix)");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("P00H03M21S"), 201);
        assert_eq!(parse_duration("P01H00M01S"), 3601);
        assert_eq!(parse_duration("03:21"), 201);
        assert_eq!(parse_duration(""), 0);
        assert_eq!(parse_duration("P9999999H00M00S"), 0);
        assert_eq!(parse_duration("P99999999999999999999H00M00S"), 0);
        assert_eq!(parse_duration("P1193046H28M15S"), u32::MAX);
    }

    #[test]
    fn test_track_artist_title() {
        let t = track("A - B", "", 1);
        assert_eq!(t.artist(), "A");
        assert_eq!(t.title(), "B");

        let t = track("A - B - C", "", 1);
        assert_eq!(t.artist(), "A - B");
        assert_eq!(t.title(), "C");

        // metadata artist is used when the name carries none
        let t = track("Title", "Artist", 1);
        assert_eq!(t.full_name(), "Artist - Title");
        assert_eq!(t.artist(), "Artist");
        assert_eq!(t.title(), "Title");
    }

    #[test]
    fn test_track_remixer_removed_from_artist() {
        let t = track("Artist, Someone - Title (Someone Remix)", "", 1);
        assert_eq!(t.remixer, "Someone");
        assert_eq!(t.artist(), "Artist");
        assert_eq!(t.title(), "Title (Someone Remix)");
        assert_eq!(t.main_title(), "Title");
        assert_eq!(t.artists(), vec!["Artist"]);
    }

    #[test]
    fn test_track_digital_only_markers() {
        let t = track("Artist - Title (Digital Bonus)", "", 1);
        assert_eq!(t.digi_only_name(), "Artist - Title");
        assert_eq!(t.title(), "Title");
        assert!(!t.is_digital_only());
    }

    #[test]
    fn test_digital_only_compares_full_and_stripped_name() {
        let t = track("Title", "Artist", 1);
        assert_eq!(t.digi_only_name(), "Title");
        assert!(t.is_digital_only());
    }

    #[test]
    fn test_track_info() {
        let mut t = track("Artist - Title (ft. Other)", "", 3);
        let info = t.info();
        assert_eq!(info.index, Some(3));
        assert_eq!(info.artist, "Artist ft. Other");
        assert_eq!(info.title, "Title");
        assert_eq!(info.catalognum, None);
        assert_eq!(info.length, 0);

        t.single = Some(true);
        assert_eq!(t.info().index, None);
    }

    #[test]
    fn test_set_artist_overrides_derived_fields() {
        let mut t = track("Artist-Title", "", 1);
        assert_eq!(t.artist(), "");
        t.set_artist("Artist".to_string(), Some("Title".to_string()));
        assert_eq!(t.artist(), "Artist");
        assert_eq!(t.title(), "Title");
    }
}
