//! Catalog, favorites and stream operations on an authenticated `Session`.
//!
//! Single-entity fetches are one `get_json` call each; collections go
//! through `Session::fetch_all_pages` and differ only in endpoint and in how
//! an item is unwrapped.

use log::warn;

use crate::error::ApiError;
use crate::pagination::Wrapped;
use crate::session::Session;
use crate::types::{Album, Artist, AudioQuality, StreamResponse, StreamUrls, Track};

impl Session {
    pub fn get_album(&self, album_id: u64) -> Result<Album, ApiError> {
        self.get_json(&format!("albums/{album_id}"), &[], &[])
    }

    pub fn get_track(&self, track_id: u64) -> Result<Track, ApiError> {
        self.get_json(&format!("tracks/{track_id}"), &[], &[])
    }

    pub fn get_artist(&self, artist_id: u64) -> Result<Artist, ApiError> {
        self.get_json(&format!("artists/{artist_id}"), &[], &[])
    }

    /// Every album released by the artist.
    pub fn get_artist_albums(&self, artist_id: u64) -> Result<Vec<Album>, ApiError> {
        self.fetch_all_pages(&format!("artists/{artist_id}/albums"), |album: Album| album)
    }

    /// Tracks of the album in running order.
    pub fn get_album_items(&self, album_id: u64) -> Result<Vec<Track>, ApiError> {
        self.fetch_all_pages(&format!("albums/{album_id}/items"), Wrapped::<Track>::into_inner)
    }

    pub fn get_favorite_albums(&self) -> Result<Vec<Album>, ApiError> {
        self.fetch_all_pages(&self.favorites_endpoint("albums"), Wrapped::<Album>::into_inner)
    }

    pub fn get_favorite_tracks(&self) -> Result<Vec<Track>, ApiError> {
        self.fetch_all_pages(&self.favorites_endpoint("tracks"), Wrapped::<Track>::into_inner)
    }

    pub fn get_favorite_artists(&self) -> Result<Vec<Artist>, ApiError> {
        self.fetch_all_pages(&self.favorites_endpoint("artists"), Wrapped::<Artist>::into_inner)
    }

    /// Resolve stream URLs for a track at `quality`.
    ///
    /// An encrypted stream comes back as `StreamUrls::Encrypted`; its URLs
    /// are useless without the key.
    pub fn get_stream_urls(&self, track_id: u64, quality: AudioQuality) -> Result<StreamUrls, ApiError> {
        let endpoint = format!("tracks/{track_id}/urlpostpaywall");
        let origin = self.config().origin.clone();
        let response: StreamResponse = self.get_json(
            &endpoint,
            &[
                ("audioquality", quality.as_str()),
                ("urlusagemode", "STREAM"),
                ("assetpresentation", "FULL"),
            ],
            &[("Origin", origin.as_str())],
        )?;

        let stream = StreamUrls::from(response);
        if stream.is_encrypted() {
            warn!("track {track_id} at {quality} resolved to an encrypted {} stream", stream.codec());
        }
        Ok(stream)
    }

    fn favorites_endpoint(&self, kind: &str) -> String {
        format!("users/{}/favorites/{kind}", self.user_id())
    }
}
