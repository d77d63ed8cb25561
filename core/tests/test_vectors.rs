//! Verify request building and response handling against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected results. A replaying transport feeds the simulated responses
//! to a real `Session` and records what it sent. Comparing parsed JSON (not
//! raw strings) avoids false negatives from field-ordering differences.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tidal_core::{
    Album, ApiError, Artist, AudioQuality, ClientConfig, HttpMethod, HttpRequest, HttpResponse, Session,
    StreamUrls, Track, Transport,
};
use url::Url;

const BASE_URL: &str = "http://localhost:3000/v1/";

/// Replays queued responses in order and records every request.
#[derive(Default)]
struct Replay {
    responses: Mutex<VecDeque<HttpResponse>>,
    sent: Mutex<Vec<HttpRequest>>,
}

impl Replay {
    fn with(responses: &[Value]) -> Arc<Self> {
        let replay = Replay::default();
        for sim in responses {
            replay.responses.lock().unwrap().push_back(HttpResponse {
                status: sim["status"].as_u64().unwrap() as u16,
                headers: Vec::new(),
                body: sim["body"].as_str().unwrap().as_bytes().to_vec(),
            });
        }
        Arc::new(replay)
    }

    fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for Replay {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.sent.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::RequestError("no simulated response left".into()))
    }
}

fn config() -> ClientConfig {
    ClientConfig::default().with_base_url(BASE_URL)
}

fn session(transport: Arc<Replay>) -> Session {
    Session::restore(transport, &config(), "sess-vectors", 4242, "US").unwrap()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn path_of(req: &HttpRequest) -> String {
    let url = Url::parse(&req.url).unwrap();
    url.path().trim_start_matches("/v1").to_string()
}

fn query_of(req: &HttpRequest) -> Vec<(String, String)> {
    Url::parse(&req.url).unwrap().query_pairs().into_owned().collect()
}

fn assert_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(path_of(req), expected["path"].as_str().unwrap(), "{name}: path");
    if let Some(query) = expected.get("query") {
        assert_eq!(query_of(req), pairs(query), "{name}: query");
    }
    if let Some(headers) = expected.get("headers") {
        assert_eq!(req.headers, pairs(headers), "{name}: headers");
    }
}

fn error_name(err: &ApiError) -> &'static str {
    match err {
        ApiError::UrlError { .. } => "UrlError",
        ApiError::RequestError(_) => "RequestError",
        ApiError::NotFound => "NotFound",
        ApiError::HttpError { .. } => "HttpError",
        ApiError::DeserializationError(_) => "DeserializationError",
        ApiError::AuthError(_) => "AuthError",
        ApiError::PaginationStalled { .. } => "PaginationStalled",
        ApiError::ConfigError { .. } => "ConfigError",
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[test]
fn login_test_vectors() {
    let raw = include_str!("../../test-vectors/login.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let transport = Replay::with(std::slice::from_ref(&case["simulated_response"]));

        let result = Session::login_with(
            transport.clone(),
            &config(),
            input["username"].as_str().unwrap(),
            input["password"].as_str().unwrap(),
            input["api_key"].as_str().unwrap(),
        );

        // Verify build
        let sent = transport.sent();
        assert_eq!(sent.len(), 1, "{name}: one request");
        let expected_req = &case["expected_request"];
        assert_request(name, &sent[0], expected_req);
        let form: Vec<(String, String)> =
            url::form_urlencoded::parse(sent[0].body.as_deref().unwrap().as_bytes())
                .into_owned()
                .collect();
        assert_eq!(form, pairs(&expected_req["form"]), "{name}: form");

        // Verify result
        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            assert_eq!(error_name(&err), expected_error.as_str().unwrap(), "{name}: error");
        } else {
            let session = result.unwrap();
            let expected = &case["expected_result"];
            assert_eq!(session.user_id(), expected["user_id"].as_u64().unwrap(), "{name}: user id");
            assert_eq!(session.session_id(), expected["session_id"].as_str().unwrap(), "{name}: session id");
            assert_eq!(session.country_code(), expected["country_code"].as_str().unwrap(), "{name}: country");
        }
    }
}

// ---------------------------------------------------------------------------
// Single entities
// ---------------------------------------------------------------------------

#[test]
fn entity_test_vectors() {
    let raw = include_str!("../../test-vectors/entities.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_u64().unwrap();
        let transport = Replay::with(std::slice::from_ref(&case["simulated_response"]));
        let s = session(transport.clone());

        let result: Result<Value, ApiError> = match case["operation"].as_str().unwrap() {
            "album" => s.get_album(id).map(|a| serde_json::to_value(a).unwrap()),
            "track" => s.get_track(id).map(|t| serde_json::to_value(t).unwrap()),
            "artist" => s.get_artist(id).map(|a| serde_json::to_value(a).unwrap()),
            other => panic!("{name}: unknown operation {other}"),
        };

        let sent = transport.sent();
        assert_eq!(sent.len(), 1, "{name}: one request");
        assert_request(name, &sent[0], &case["expected_request"]);
        assert!(sent[0].body.is_none(), "{name}: body should be None");

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            assert_eq!(error_name(&err), expected_error.as_str().unwrap(), "{name}: error");
            continue;
        }

        let actual = result.unwrap();
        let expected = &case["expected_result"];
        match case["operation"].as_str().unwrap() {
            "album" => assert_eq!(
                serde_json::from_value::<Album>(actual).unwrap(),
                serde_json::from_value::<Album>(expected.clone()).unwrap(),
                "{name}: parsed result"
            ),
            "track" => assert_eq!(
                serde_json::from_value::<Track>(actual).unwrap(),
                serde_json::from_value::<Track>(expected.clone()).unwrap(),
                "{name}: parsed result"
            ),
            _ => assert_eq!(
                serde_json::from_value::<Artist>(actual).unwrap(),
                serde_json::from_value::<Artist>(expected.clone()).unwrap(),
                "{name}: parsed result"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[test]
fn pagination_test_vectors() {
    let raw = include_str!("../../test-vectors/pagination.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let id = case.get("input_id").and_then(Value::as_u64).unwrap_or_default();
        let transport = Replay::with(case["simulated_responses"].as_array().unwrap());
        let s = session(transport.clone());

        let result: Result<Vec<u64>, ApiError> = match case["operation"].as_str().unwrap() {
            "artist_albums" => s.get_artist_albums(id).map(|v| v.iter().map(|a| a.id).collect()),
            "album_items" => s.get_album_items(id).map(|v| v.iter().map(|t| t.id).collect()),
            "favorite_albums" => s.get_favorite_albums().map(|v| v.iter().map(|a| a.id).collect()),
            "favorite_tracks" => s.get_favorite_tracks().map(|v| v.iter().map(|t| t.id).collect()),
            "favorite_artists" => s.get_favorite_artists().map(|v| v.iter().map(|a| a.id).collect()),
            other => panic!("{name}: unknown operation {other}"),
        };

        let sent = transport.sent();
        let expected_path = case["expected_path"].as_str().unwrap();
        for req in &sent {
            assert_eq!(path_of(req), expected_path, "{name}: path");
            assert_eq!(query_of(req)[0], ("countryCode".to_string(), "US".to_string()), "{name}: country first");
        }
        let offsets: Vec<String> = sent
            .iter()
            .map(|req| {
                query_of(req)
                    .into_iter()
                    .find(|(k, _)| k == "offset")
                    .map(|(_, v)| v)
                    .unwrap()
            })
            .collect();
        let expected_offsets: Vec<String> = case["expected_offsets"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        assert_eq!(offsets, expected_offsets, "{name}: offsets");

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            assert_eq!(error_name(&err), expected_error.as_str().unwrap(), "{name}: error");
        } else {
            let expected: Vec<u64> = serde_json::from_value(case["expected_ids"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: flattened ids");
        }
    }
}

// ---------------------------------------------------------------------------
// Stream resolution
// ---------------------------------------------------------------------------

#[test]
fn stream_test_vectors() {
    let raw = include_str!("../../test-vectors/stream.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_u64().unwrap();
        let quality: AudioQuality = case["quality"].as_str().unwrap().parse().unwrap();
        let transport = Replay::with(std::slice::from_ref(&case["simulated_response"]));

        let stream = session(transport.clone()).get_stream_urls(id, quality).unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1, "{name}: one request");
        assert_request(name, &sent[0], &case["expected_request"]);

        let expected = &case["expected_result"];
        let expected_urls: Vec<String> = serde_json::from_value(expected["urls"].clone()).unwrap();
        assert_eq!(stream.is_encrypted(), expected["encrypted"].as_bool().unwrap(), "{name}: encrypted");
        assert_eq!(stream.codec(), expected["codec"].as_str().unwrap(), "{name}: codec");
        assert_eq!(stream.urls(), expected_urls.as_slice(), "{name}: urls");
        if let StreamUrls::Encrypted { encryption_key, .. } = &stream {
            assert_eq!(encryption_key, expected["encryption_key"].as_str().unwrap(), "{name}: key");
        }
    }
}
