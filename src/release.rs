//! One release page, parsed end to end.

use log::{debug, warn};
use serde_json::Value;

use crate::album;
use crate::config::Config;
use crate::error::Result;
use crate::genre::GenreResolver;
use crate::models::{
    AlbumInfo, RawRelease, RawTrackRecord, ReleaseInfo, SingletonInfo, DIGITAL_MEDIA,
};
use crate::normalize::catalognum_delimited;
use crate::track::Track;
use crate::tracks::TrackSet;

pub const VARIOUS_ARTISTS: &str = "Various Artists";

/// More distinct track artists than this makes a compilation.
const VA_ARTIST_COUNT: usize = 3;

#[derive(Debug, Clone)]
pub struct Release {
    pub id: String,
    pub single: bool,
    pub label: String,
    pub album_artist: String,
    pub catalognum: String,
    pub album: String,
    pub style: Option<String>,
    pub genre: Option<String>,
    pub tracks: TrackSet,
}

impl Release {
    /// Parse one release's page metadata.
    ///
    /// Only a value that is not a JSON object, or an invalid `always_include`
    /// pattern, is an error. Missing fields degrade to empty values.
    pub fn from_json(value: Value, config: &Config) -> Result<Self> {
        let genres = GenreResolver::new(&config.genre)?;
        Self::with_resolver(value, &genres, &config.album.extras)
    }

    /// Like `from_json`, reusing an already built genre resolver.
    pub fn with_resolver(value: Value, genres: &GenreResolver, extras: &[String]) -> Result<Self> {
        let mut raw: RawRelease = serde_json::from_value(value.clone())?;
        let single = raw.track.as_ref().map_or(true, |list| list.items.is_empty());
        let records = if single {
            // the page itself is the only track
            let mut record: RawTrackRecord = serde_json::from_value(value)?;
            record.position = Some(1);
            vec![record]
        } else {
            raw.track
                .take()
                .map(|list| list.items.into_iter().map(|item| item.into_record()).collect::<Vec<_>>())
                .unwrap_or_default()
        };
        if raw.name.is_empty() {
            warn!("release {:?} has no name", raw.id);
        }

        let label = raw.label().to_string();
        // album artist comes from the parsed tracks, then fills the unparsed ones
        let parsed = TrackSet::from_records(&records, &label);
        let album_artist = album_artist(raw.artist(), &parsed);
        let tracks = parsed.adjust_artists(&album_artist, single);
        let catalognum = release_catalognum(&raw.name, &tracks);

        let mut album_extras: Vec<String> = vec![catalognum.clone(), album_artist.clone()];
        album_extras.extend(tracks.artists());
        album_extras.extend(extras.iter().cloned());
        let mut album = album::clean(&raw.name, &album_extras, &label);
        if album.is_empty() {
            if let Some(embedded) = tracks.iter().map(|t| &t.album).find(|a| !a.is_empty()) {
                album = embedded.clone();
            }
        }

        let style = genres.style(raw.genre_tag());
        let genre = genres.genre(&raw.keywords, style.as_deref());
        debug!(
            "release {:?}: album {:?}, albumartist {:?}, catalognum {:?}, {} tracks",
            raw.id,
            album,
            album_artist,
            catalognum,
            tracks.len()
        );

        Ok(Self {
            id: raw.id,
            single,
            label,
            album_artist,
            catalognum,
            album,
            style,
            genre,
            tracks,
        })
    }

    pub fn album_info(&self) -> AlbumInfo {
        AlbumInfo {
            album_id: self.id.clone(),
            album: self.album.clone(),
            albumartist: self.album_artist.clone(),
            catalognum: (!self.catalognum.is_empty()).then(|| self.catalognum.clone()),
            label: self.label.clone(),
            genre: self.genre.clone(),
            style: self.style.clone(),
            media: DIGITAL_MEDIA.to_string(),
            mediums: 1,
            tracks: self.tracks.iter().map(Track::info).collect(),
        }
    }

    pub fn singleton_info(&self) -> SingletonInfo {
        SingletonInfo {
            track: self.tracks.iter().next().map(Track::info).unwrap_or_default(),
            album: self.album.clone(),
            label: self.label.clone(),
            genre: self.genre.clone(),
            style: self.style.clone(),
            media: DIGITAL_MEDIA.to_string(),
        }
    }

    pub fn info(&self) -> ReleaseInfo {
        if self.single {
            ReleaseInfo::Singleton(self.singleton_info())
        } else {
            ReleaseInfo::Album(self.album_info())
        }
    }
}

/// The page's artist, unless the tracks show a compilation it is not part of.
fn album_artist(page_artist: &str, tracks: &TrackSet) -> String {
    let artists = tracks.artists();
    let credited = artists.iter().any(|a| a.eq_ignore_ascii_case(page_artist));
    if artists.len() > VA_ARTIST_COUNT && !credited {
        debug!("{} distinct track artists, using {:?}", artists.len(), VARIOUS_ARTISTS);
        return VARIOUS_ARTISTS.to_string();
    }
    page_artist.to_string()
}

/// Shared track catalog number, else the first per-track one, else one in the title.
fn release_catalognum(name: &str, tracks: &TrackSet) -> String {
    if !tracks.catalognum.is_empty() {
        return tracks.catalognum.clone();
    }
    tracks
        .iter()
        .map(|t| t.catalognum.clone())
        .find(|c| !c.is_empty())
        .or_else(|| catalognum_delimited(name).map(|(_, catnum)| catnum))
        .unwrap_or_default()
}

// ============================================================================
// TESTS
// ============================================================================
