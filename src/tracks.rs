//! Release track-set resolution.
//!
//! Delimiters and catalog numbers are release-wide conventions, so they are
//! inferred from all track names before any single track is parsed. After
//! parsing, a repair pass fills in artists that failed to parse, using what
//! the sibling tracks produced.

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::models::RawTrackRecord;
use crate::normalize::{catalognum_anywhere, find_delimiter};
use crate::track::Track;

/// Fallback delimiter when no candidate dominates the release.
pub const DEFAULT_DELIMITER: char = '-';

/// Delimiter in effect for the release: the most common first delimiter
/// candidate, if it splits more than half of the names (or the only name).
/// Names with no candidate count as '-'. Ties go to the candidate seen first.
pub fn track_delimiter<S: AsRef<str>>(names: &[S]) -> char {
    let mut counts: FxHashMap<char, usize> = FxHashMap::default();
    let mut order: Vec<char> = Vec::new();
    for name in names {
        let delim = find_delimiter(name.as_ref()).unwrap_or(DEFAULT_DELIMITER);
        let count = counts.entry(delim).or_insert(0);
        if *count == 0 {
            order.push(delim);
        }
        *count += 1;
    }

    let best = order.iter().fold(None, |best: Option<(char, usize)>, &delim| {
        let count = counts[&delim];
        match best {
            Some((_, top)) if top >= count => best,
            _ => Some((delim, count)),
        }
    });
    match best {
        Some((delim, count)) if names.len() == 1 || count * 2 > names.len() => delim,
        _ => DEFAULT_DELIMITER,
    }
}

/// Find a catalog number shared by every track name.
///
/// Tokens common to all names (in first-name order, without the delimiter) are
/// collected and the first and last of them are tested. A match is removed
/// from every name. Returns the catalog number ("" if none) and the names.
/// e.g., ["CAT001 A - B", "CAT001 C - D"] → ("CAT001", ["A - B", "C - D"])
pub fn common_catalognum(names: Vec<String>, delimiter: char) -> (String, Vec<String>) {
    match strip_common_catalognum(&names, delimiter) {
        Some(found) => found,
        None => (String::new(), names),
    }
}

fn strip_common_catalognum(names: &[String], delimiter: char) -> Option<(String, Vec<String>)> {
    let mut tokens: Vec<Vec<&str>> = names.iter().map(|n| n.split_whitespace().collect()).collect();
    let delim = delimiter.to_string();

    let (first, rest) = tokens.split_first()?;
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let common: Vec<&str> = first
        .iter()
        .copied()
        .filter(|word| *word != delim && seen.insert(*word))
        .filter(|word| rest.iter().all(|other| other.contains(word)))
        .collect();

    let (&head, &tail) = (common.first()?, common.last()?);
    let candidates = if head == tail { vec![head] } else { vec![head, tail] };
    let (word, catnum) = candidates
        .into_iter()
        .find_map(|word| catalognum_anywhere(word).map(|catnum| (word, catnum)))?;

    for words in tokens.iter_mut() {
        if let Some(pos) = words.iter().position(|w| *w == word) {
            words.remove(pos);
        }
    }
    Some((catnum, tokens.iter().map(|words| words.join(" ")).collect()))
}

// ============================================================================
// TrackSet
// ============================================================================

/// All tracks of one release, in page order.
#[derive(Clone, Debug, Default)]
pub struct TrackSet {
    pub tracks: Vec<Track>,
    pub delimiter: char,
    /// Release-wide catalog number, empty when the tracks share none
    pub catalognum: String,
}

impl TrackSet {
    /// Detect the release conventions and parse every track against them.
    pub fn from_records(records: &[RawTrackRecord], label: &str) -> Self {
        let names: Vec<String> = records.iter().map(|r| r.name.clone()).collect();
        let delimiter = track_delimiter(&names);
        let (catalognum, names) = common_catalognum(names, delimiter);
        debug!(
            "{} tracks: delimiter {:?}, shared catalognum {:?}",
            records.len(),
            delimiter,
            catalognum
        );

        let tracks = records
            .iter()
            .zip(&names)
            .map(|(record, name)| Track::from_record(record, name, delimiter, &catalognum, label))
            .collect();
        Self {
            tracks,
            delimiter,
            catalognum,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    /// Distinct artists across all tracks, in order of appearance.
    pub fn artists(&self) -> Vec<String> {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        self.tracks
            .iter()
            .flat_map(Track::artists)
            .filter(|artist| seen.insert(artist.clone()))
            .collect()
    }

    /// Every remixer and featuring annotation found in the release.
    pub fn raw_remixers(&self) -> FxHashSet<String> {
        self.tracks
            .iter()
            .flat_map(|t| [&t.remixer, &t.featuring])
            .filter(|name| !name.is_empty())
            .cloned()
            .collect()
    }

    /// Repair pass. Marks every track's single flag and fills in missing
    /// artists: when exactly one track failed to parse an artist, its title is
    /// re-split on a bare '-'; anything still missing gets the album artist.
    pub fn adjust_artists(self, album_artist: &str, single: bool) -> Self {
        let count = self.tracks.len();
        let parsed = self.tracks.iter().filter(|t| !t.artist().is_empty()).count();
        let only_failure = parsed + 1 == count;

        let tracks = self
            .tracks
            .into_iter()
            .map(|track| repair_track(track, album_artist, single, only_failure))
            .collect();
        Self { tracks, ..self }
    }
}

fn repair_track(mut track: Track, album_artist: &str, single: bool, only_failure: bool) -> Track {
    track.single = Some(single);
    if !track.artist().is_empty() {
        return track;
    }

    if only_failure {
        let title = track.title();
        let parts: Vec<&str> = title.split('-').collect();
        if let [artist, title] = parts.as_slice() {
            debug!("track {}: split {:?} into artist and title", track.index, parts);
            track.set_artist(artist.to_string(), Some(title.to_string()));
        }
    }
    if track.artist().is_empty() {
        debug!("track {}: using album artist {:?}", track.index, album_artist);
        track.set_artist(album_artist.to_string(), None);
    }
    track
}

impl<'a> IntoIterator for &'a TrackSet {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}

// ============================================================================
// TESTS
// ============================================================================
