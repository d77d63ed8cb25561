//! Domain DTOs for the TIDAL API.
//!
//! # Design
//! These mirror the JSON the service returns and carry no behavior. Nested
//! shapes are lenient (`#[serde(default)]`) because the service embeds
//! reduced albums inside tracks and omits fields in listing contexts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artist {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Album {
    pub id: u64,
    pub title: String,
    #[serde(rename = "type")]
    pub album_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub release_date: String,
    pub number_of_tracks: u32,
    pub allow_streaming: bool,
    pub artist: Artist,
    pub artists: Vec<Artist>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Track {
    pub id: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub track_number: u32,
    /// Length in seconds.
    pub duration: u32,
    pub album: Album,
    pub artist: Artist,
    pub artists: Vec<Artist>,
}

/// Audio quality tier requested when resolving stream URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioQuality {
    Lossless,
    High,
    Low,
}

impl AudioQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioQuality::Lossless => "LOSSLESS",
            AudioQuality::High => "HIGH",
            AudioQuality::Low => "LOW",
        }
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioQuality {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOSSLESS" => Ok(AudioQuality::Lossless),
            "HIGH" => Ok(AudioQuality::High),
            "LOW" => Ok(AudioQuality::Low),
            _ => Err(ApiError::ConfigError {
                key: "audio quality".to_string(),
                reason: format!("`{s}` is not one of LOSSLESS, HIGH, LOW"),
            }),
        }
    }
}

/// Stream locations for one track.
///
/// URLs of an `Encrypted` stream point at content that cannot be played
/// without `encryption_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamUrls {
    Plain {
        codec: String,
        urls: Vec<String>,
    },
    Encrypted {
        codec: String,
        encryption_key: String,
        urls: Vec<String>,
    },
}

impl StreamUrls {
    pub fn codec(&self) -> &str {
        match self {
            StreamUrls::Plain { codec, .. } | StreamUrls::Encrypted { codec, .. } => codec,
        }
    }

    pub fn urls(&self) -> &[String] {
        match self {
            StreamUrls::Plain { urls, .. } | StreamUrls::Encrypted { urls, .. } => urls,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, StreamUrls::Encrypted { .. })
    }

    pub fn into_urls(self) -> Vec<String> {
        match self {
            StreamUrls::Plain { urls, .. } | StreamUrls::Encrypted { urls, .. } => urls,
        }
    }
}

/// Body of a `urlpostpaywall` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StreamResponse {
    #[serde(default)]
    pub codec: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub encryption_key: String,
    #[serde(default)]
    pub urls: Vec<String>,
}

impl From<StreamResponse> for StreamUrls {
    fn from(response: StreamResponse) -> Self {
        let StreamResponse {
            codec,
            encryption_key,
            urls,
        } = response;
        if encryption_key.is_empty() {
            StreamUrls::Plain { codec, urls }
        } else {
            StreamUrls::Encrypted {
                codec,
                encryption_key,
                urls,
            }
        }
    }
}

/// Body of a successful login.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: u64,
    pub session_id: String,
    pub country_code: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::deserialize(deserializer).map(Option::unwrap_or_default)
}
