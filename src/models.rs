//! Core data models for release parsing.
//!
//! Raw models mirror the structured page metadata of a release. Every field is
//! optional and unknown keys are kept in an `extra` bucket, since sellers'
//! pages do not guarantee any fixed shape. Output models are the flat tag
//! records handed to the caller.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Media value for every release read from the marketplace.
pub const DIGITAL_MEDIA: &str = "Digital Media";

// ============================================================================
// Raw Page Models
// ============================================================================

/// Any `{"name": ...}` node: artists, labels, publishers.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Named {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

impl Named {
    fn name(node: &Option<Named>) -> Option<&str> {
        node.as_ref()
            .and_then(|n| n.name.as_deref())
            .filter(|n| !n.is_empty())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct InAlbum {
    #[serde(rename = "byArtist", default, deserialize_with = "lenient")]
    pub by_artist: Option<Named>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Lyrics {
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RecordingOf {
    #[serde(default, deserialize_with = "lenient")]
    pub lyrics: Option<Lyrics>,
}

/// Raw track from the release page. Never mutated once read.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawTrackRecord {
    #[serde(rename = "@id", default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub position: Option<u32>,
    #[serde(rename = "byArtist", default, deserialize_with = "lenient")]
    pub by_artist: Option<Named>,
    #[serde(rename = "inAlbum", default, deserialize_with = "lenient")]
    pub in_album: Option<InAlbum>,
    /// ISO-8601-ish duration: "P00H03M21S"
    #[serde(default, deserialize_with = "lenient")]
    pub duration: Option<String>,
    #[serde(rename = "recordingOf", default, deserialize_with = "lenient")]
    pub recording_of: Option<RecordingOf>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawTrackRecord {
    /// Track artist from the page metadata: album artist node first, then the
    /// track's own artist node.
    pub fn artist(&self) -> &str {
        self.in_album
            .as_ref()
            .and_then(|a| Named::name(&a.by_artist))
            .or_else(|| Named::name(&self.by_artist))
            .unwrap_or("")
    }

    /// Lyrics text with carriage returns removed.
    pub fn lyrics(&self) -> String {
        self.recording_of
            .as_ref()
            .and_then(|r| r.lyrics.as_ref())
            .and_then(|l| l.text.as_deref())
            .map(|t| t.replace('\r', ""))
            .unwrap_or_default()
    }
}

/// Entry of the release's track list: `{"position": 1, "item": {...}}`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListItem {
    #[serde(default, deserialize_with = "lenient")]
    pub position: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub item: RawTrackRecord,
}

impl ListItem {
    /// The track record, with the list position filled in when the item lacks one.
    pub fn into_record(self) -> RawTrackRecord {
        let mut record = self.item;
        if record.position.is_none() {
            record.position = self.position;
        }
        record
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TrackList {
    #[serde(rename = "itemListElement", default, deserialize_with = "lenient_list")]
    pub items: Vec<ListItem>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Publisher {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    /// Canonical tag URL: "https://bandcamp.com/tag/dubstep"
    #[serde(default, deserialize_with = "lenient")]
    pub genre: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AlbumRelease {
    #[serde(rename = "recordLabel", default, deserialize_with = "lenient")]
    pub record_label: Option<Named>,
}

/// Raw release page metadata.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawRelease {
    #[serde(rename = "@id", default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(rename = "byArtist", default, deserialize_with = "lenient")]
    pub by_artist: Option<Named>,
    #[serde(default, deserialize_with = "lenient")]
    pub publisher: Option<Publisher>,
    #[serde(rename = "albumRelease", default, deserialize_with = "lenient_list")]
    pub album_release: Vec<AlbumRelease>,
    #[serde(default, deserialize_with = "keywords_list")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub track: Option<TrackList>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawRelease {
    pub fn artist(&self) -> &str {
        Named::name(&self.by_artist).unwrap_or("")
    }

    /// Record label of the first release format, falling back to the publisher.
    pub fn label(&self) -> &str {
        self.album_release
            .first()
            .and_then(|r| Named::name(&r.record_label))
            .or_else(|| {
                self.publisher
                    .as_ref()
                    .and_then(|p| p.name.as_deref())
                    .filter(|n| !n.is_empty())
            })
            .unwrap_or("")
    }

    /// Canonical genre tag URL or slug, if the page carries one.
    pub fn genre_tag(&self) -> Option<&str> {
        self.publisher.as_ref().and_then(|p| p.genre.as_deref())
    }
}

/// Field of any shape: a value of the wrong type (or null) reads as the default.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// List of any shape: elements that do not fit are skipped, a non-list is empty.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| T::deserialize(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Keywords come either as a list or as one comma-separated string.
/// Non-string list entries are skipped.
fn keywords_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

// ============================================================================
// Output Models
// ============================================================================

/// Final per-track tag record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TrackInfo {
    pub track_id: String,
    /// None for single-track releases
    pub index: Option<u32>,
    pub medium_index: Option<u32>,
    /// Artist with the featuring annotation appended: "Artist ft. Other"
    pub artist: String,
    pub title: String,
    /// Seconds
    pub length: u32,
    pub track_alt: Option<String>,
    pub lyrics: String,
    pub catalognum: Option<String>,
    pub digital_only: bool,
}

/// Final release-level tag record for multi-track releases.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AlbumInfo {
    pub album_id: String,
    pub album: String,
    pub albumartist: String,
    pub catalognum: Option<String>,
    pub label: String,
    pub genre: Option<String>,
    pub style: Option<String>,
    pub media: String,
    pub mediums: u32,
    pub tracks: Vec<TrackInfo>,
}

/// Final tag record for a single-track release.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SingletonInfo {
    #[serde(flatten)]
    pub track: TrackInfo,
    pub album: String,
    pub label: String,
    pub genre: Option<String>,
    pub style: Option<String>,
    pub media: String,
}

/// Either output shape, serialized without a tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReleaseInfo {
    Album(AlbumInfo),
    Singleton(SingletonInfo),
}
