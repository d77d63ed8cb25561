//! In-memory fake of the TIDAL v1 endpoints the client uses.
//!
//! # Design
//! The catalog is seeded once and read-only; only the set of issued session
//! ids changes. DTOs are defined independently from `tidal-core` so the
//! integration tests catch schema drift between the two crates.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Form, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Artist {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: u64,
    pub title: String,
    #[serde(rename = "type")]
    pub album_type: String,
    pub release_date: Option<String>,
    pub number_of_tracks: u32,
    pub allow_streaming: bool,
    pub artist: Artist,
    pub artists: Vec<Artist>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub version: Option<String>,
    pub track_number: u32,
    pub duration: u32,
    pub album: Album,
    pub artist: Artist,
    pub artists: Vec<Artist>,
}

/// Credentials and paging behavior of the fake service.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub api_token: String,
    pub username: String,
    pub password: String,
    pub user_id: u64,
    pub country_code: String,
    /// `limit` used when the request does not send one.
    pub page_size: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            api_token: "test-token".to_string(),
            username: "listener@example.com".to_string(),
            password: "hunter2".to_string(),
            user_id: 4242,
            country_code: "US".to_string(),
            page_size: 50,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub artists: BTreeMap<u64, Artist>,
    pub albums: BTreeMap<u64, Album>,
    pub tracks: BTreeMap<u64, Track>,
    pub artist_albums: BTreeMap<u64, Vec<u64>>,
    pub album_tracks: BTreeMap<u64, Vec<u64>>,
    pub favorite_albums: Vec<u64>,
    pub favorite_tracks: Vec<u64>,
    pub favorite_artists: Vec<u64>,
    /// Tracks whose LOSSLESS stream is served encrypted.
    pub encrypted_tracks: HashSet<u64>,
}

impl Catalog {
    /// Deterministic catalog used by the tests.
    ///
    /// Artist 1 has 120 albums (1000..1120), all favorited. Album 1000 has 5
    /// tracks, album 1001 has 75. Track ids are `album_id * 100 + n`.
    /// Track 100002 is encrypted at LOSSLESS. No favorite tracks.
    pub fn sample() -> Self {
        let mut catalog = Catalog::default();
        for (id, name) in [(1, "Miles Davis"), (2, "John Coltrane"), (3, "Bill Evans")] {
            catalog.artists.insert(
                id,
                Artist {
                    id,
                    name: name.to_string(),
                },
            );
        }

        for id in 1000..1120u64 {
            let title = match id {
                1000 => "Kind of Blue".to_string(),
                1001 => "The Complete Sessions".to_string(),
                n => format!("Live Volume {}", n - 1001),
            };
            let tracks = match id {
                1000 => 5,
                1001 => 75,
                _ => 0,
            };
            catalog.add_album(1, id, &title, tracks);
        }
        catalog.add_album(2, 2000, "Blue Train", 5);

        catalog.favorite_albums = (1000..1120).collect();
        catalog.favorite_artists = vec![1, 2];
        catalog.encrypted_tracks.insert(100002);
        catalog
    }

    fn add_album(&mut self, artist_id: u64, album_id: u64, title: &str, number_of_tracks: u32) {
        let artist = self.artists[&artist_id].clone();
        let album = Album {
            id: album_id,
            title: title.to_string(),
            album_type: "ALBUM".to_string(),
            release_date: Some(format!("{}-01-01", 1950 + album_id % 50)),
            number_of_tracks,
            allow_streaming: true,
            artist: artist.clone(),
            artists: vec![artist.clone()],
        };

        let track_ids: Vec<u64> = (1..=number_of_tracks as u64).map(|n| album_id * 100 + n).collect();
        for (index, track_id) in track_ids.iter().enumerate() {
            self.tracks.insert(
                *track_id,
                Track {
                    id: *track_id,
                    title: format!("{title} #{}", index + 1),
                    version: (index == 0).then(|| "Remastered".to_string()),
                    track_number: index as u32 + 1,
                    duration: 180 + index as u32,
                    album: album.clone(),
                    artist: artist.clone(),
                    artists: vec![artist.clone()],
                },
            );
        }

        self.album_tracks.insert(album_id, track_ids);
        self.artist_albums.entry(artist_id).or_default().push(album_id);
        self.albums.insert(album_id, album);
    }
}

pub type Sessions = Arc<RwLock<HashSet<String>>>;

/// Shared state behind the router. Clones share sessions and the request
/// counter.
#[derive(Clone)]
pub struct MockApi {
    config: Arc<MockConfig>,
    catalog: Arc<Catalog>,
    sessions: Sessions,
    hits: Arc<AtomicUsize>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new(MockConfig::default(), Catalog::sample())
    }
}

impl MockApi {
    pub fn new(config: MockConfig, catalog: Catalog) -> Self {
        Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            sessions: Arc::new(RwLock::new(HashSet::new())),
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Number of requests received on known routes.
    pub fn requests(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Register a session id without going through login.
    pub async fn insert_session(&self, session_id: &str) {
        self.sessions.write().await.insert(session_id.to_string());
    }

    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }
}

/// A TIDAL-shaped error response.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    sub_status: u32,
    message: &'static str,
}

impl Failure {
    fn new(status: StatusCode, sub_status: u32, message: &'static str) -> Self {
        Self {
            status,
            sub_status,
            message,
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = json!({
            "status": self.status.as_u16(),
            "subStatus": self.sub_status,
            "userMessage": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<Value>, Failure>;
type Params = Query<HashMap<String, String>>;

pub fn router(api: MockApi) -> Router {
    let v1 = Router::new()
        .route("/login/username", post(login))
        .route("/albums/{id}", get(get_album))
        .route("/albums/{id}/items", get(album_items))
        .route("/tracks/{id}", get(get_track))
        .route("/tracks/{id}/urlpostpaywall", get(stream_urls))
        .route("/artists/{id}", get(get_artist))
        .route("/artists/{id}/albums", get(artist_albums))
        .route("/users/{id}/favorites/{kind}", get(favorites))
        .with_state(api);
    Router::new().nest("/v1", v1)
}

/// Router over the sample catalog with default credentials.
pub fn app() -> Router {
    router(MockApi::default())
}

pub async fn run(listener: TcpListener, api: MockApi) -> Result<(), std::io::Error> {
    axum::serve(listener, router(api)).await
}

async fn login(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult {
    api.hit();
    let config = api.config();
    let token = headers.get("x-tidal-token").and_then(|v| v.to_str().ok());
    if token != Some(config.api_token.as_str()) {
        return Err(Failure::new(StatusCode::UNAUTHORIZED, 5001, "Invalid application token"));
    }
    let username = form.get("username").map(String::as_str);
    let password = form.get("password").map(String::as_str);
    if username != Some(config.username.as_str()) || password != Some(config.password.as_str()) {
        return Err(Failure::new(StatusCode::UNAUTHORIZED, 3001, "Invalid username or password"));
    }

    let session_id = Uuid::new_v4().to_string();
    api.sessions.write().await.insert(session_id.clone());
    Ok(Json(json!({
        "userId": config.user_id,
        "sessionId": session_id,
        "countryCode": config.country_code,
    })))
}

/// Count the request and check session header and country code.
async fn authorize(
    api: &MockApi,
    headers: &HeaderMap,
    params: &HashMap<String, String>,
) -> Result<(), Failure> {
    api.hit();
    let session_id = headers
        .get("x-tidal-sessionid")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Failure::new(StatusCode::UNAUTHORIZED, 6001, "Missing session"))?;
    if !api.sessions.read().await.contains(session_id) {
        return Err(Failure::new(StatusCode::UNAUTHORIZED, 6002, "Invalid session"));
    }
    if !params.contains_key("countryCode") {
        return Err(Failure::new(StatusCode::BAD_REQUEST, 1002, "Missing countryCode"));
    }
    Ok(())
}

fn found<T: Serialize>(value: Option<&T>, message: &'static str) -> ApiResult {
    value
        .map(|v| Json(json!(v)))
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, 2001, message))
}

/// Slice `items` per the request's `offset`/`limit` into a page envelope.
fn page(api: &MockApi, params: &HashMap<String, String>, items: Vec<Value>) -> ApiResult {
    let number = |key: &str, default: usize| -> Result<usize, Failure> {
        match params.get(key) {
            Some(v) => v
                .parse()
                .map_err(|_| Failure::new(StatusCode::BAD_REQUEST, 1002, "Invalid paging parameter")),
            None => Ok(default),
        }
    };
    let offset = number("offset", 0)?;
    let limit = number("limit", api.config().page_size)?;
    let total = items.len();
    let items: Vec<Value> = items.into_iter().skip(offset).take(limit).collect();

    Ok(Json(json!({
        "limit": limit,
        "offset": offset,
        "totalNumberOfItems": total,
        "items": items,
    })))
}

async fn get_album(
    State(api): State<MockApi>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Query(params): Params,
) -> ApiResult {
    authorize(&api, &headers, &params).await?;
    found(api.catalog().albums.get(&id), "Album not found")
}

async fn get_track(
    State(api): State<MockApi>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Query(params): Params,
) -> ApiResult {
    authorize(&api, &headers, &params).await?;
    found(api.catalog().tracks.get(&id), "Track not found")
}

async fn get_artist(
    State(api): State<MockApi>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Query(params): Params,
) -> ApiResult {
    authorize(&api, &headers, &params).await?;
    found(api.catalog().artists.get(&id), "Artist not found")
}

async fn artist_albums(
    State(api): State<MockApi>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Query(params): Params,
) -> ApiResult {
    authorize(&api, &headers, &params).await?;
    let catalog = api.catalog();
    if !catalog.artists.contains_key(&id) {
        return Err(Failure::new(StatusCode::NOT_FOUND, 2001, "Artist not found"));
    }
    let items = catalog
        .artist_albums
        .get(&id)
        .into_iter()
        .flatten()
        .map(|album_id| json!(catalog.albums[album_id]))
        .collect();
    page(&api, &params, items)
}

async fn album_items(
    State(api): State<MockApi>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Query(params): Params,
) -> ApiResult {
    authorize(&api, &headers, &params).await?;
    let catalog = api.catalog();
    let track_ids = catalog
        .album_tracks
        .get(&id)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, 2001, "Album not found"))?;
    let items = track_ids
        .iter()
        .map(|track_id| json!({ "item": catalog.tracks[track_id], "type": "track" }))
        .collect();
    page(&api, &params, items)
}

async fn favorites(
    State(api): State<MockApi>,
    Path((user_id, kind)): Path<(u64, String)>,
    headers: HeaderMap,
    Query(params): Params,
) -> ApiResult {
    authorize(&api, &headers, &params).await?;
    if user_id != api.config().user_id {
        return Err(Failure::new(StatusCode::FORBIDDEN, 4005, "Not your favorites"));
    }
    let catalog = api.catalog();
    let wrap = |index: usize, item: Value| {
        json!({ "created": format!("2017-01-{:02}T00:00:00.000+0000", index % 28 + 1), "item": item })
    };
    let items: Vec<Value> = match kind.as_str() {
        "albums" => catalog.favorite_albums.iter().map(|id| json!(catalog.albums[id])).collect(),
        "tracks" => catalog.favorite_tracks.iter().map(|id| json!(catalog.tracks[id])).collect(),
        "artists" => catalog.favorite_artists.iter().map(|id| json!(catalog.artists[id])).collect(),
        _ => return Err(Failure::new(StatusCode::NOT_FOUND, 2001, "Unknown favorites type")),
    };
    let items = items.into_iter().enumerate().map(|(i, item)| wrap(i, item)).collect();
    page(&api, &params, items)
}

async fn stream_urls(
    State(api): State<MockApi>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Query(params): Params,
) -> ApiResult {
    authorize(&api, &headers, &params).await?;
    if !headers.contains_key("origin") {
        return Err(Failure::new(StatusCode::FORBIDDEN, 4032, "Origin required"));
    }
    if params.get("urlusagemode").map(String::as_str) != Some("STREAM")
        || params.get("assetpresentation").map(String::as_str) != Some("FULL")
    {
        return Err(Failure::new(StatusCode::BAD_REQUEST, 1002, "Unsupported usage mode"));
    }
    let (codec, extension) = match params.get("audioquality").map(String::as_str) {
        Some("LOSSLESS") => ("FLAC", "flac"),
        Some("HIGH") | Some("LOW") => ("AAC", "m4a"),
        _ => return Err(Failure::new(StatusCode::BAD_REQUEST, 1002, "Invalid audioquality")),
    };
    if !api.catalog().tracks.contains_key(&id) {
        return Err(Failure::new(StatusCode::NOT_FOUND, 2001, "Track not found"));
    }

    let encryption_key = if codec == "FLAC" && api.catalog().encrypted_tracks.contains(&id) {
        format!("key-{id}")
    } else {
        String::new()
    };
    Ok(Json(json!({
        "trackId": id,
        "codec": codec,
        "encryptionKey": encryption_key,
        "urls": [format!("https://sp-pr-cf.audio.tidal.com/mediatracks/{id}/0.{extension}")],
    })))
}
