//! Bandcamp release metadata extraction: track, album and genre parsing from
//! release page JSON.

pub mod album;
pub mod config;
pub mod error;
pub mod genre;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod release;
pub mod safety;
pub mod track;
pub mod tracks;
