//! Authenticated session and the request executor every call goes through.
//!
//! # Design
//! A `Session` is an explicit context value: identity (session id, user id,
//! country code), the resolved base URL, and a shared `Transport`. It never
//! changes after login. Each operation is split the same way: a pure
//! `build_request` that produces an `HttpRequest`, execution through the
//! transport, then `check_status` and `decode` on the response.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use url::form_urlencoded;
use url::Url;

use crate::config::ClientConfig;
use crate::endpoint::{parse_base, resolve};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::LoginResponse;

pub const SESSION_HEADER: &str = "X-Tidal-SessionId";
pub const TOKEN_HEADER: &str = "X-Tidal-Token";
pub const COUNTRY_CODE_PARAM: &str = "countryCode";

const LOGIN_ENDPOINT: &str = "login/username";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// An authenticated TIDAL session.
///
/// Cloning is cheap and clones share the transport.
#[derive(Clone)]
pub struct Session {
    session_id: String,
    user_id: u64,
    country_code: String,
    base_url: Url,
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("country_code", &self.country_code)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Log in with a fresh `UreqTransport` configured from `config`.
    pub fn login(
        config: &ClientConfig,
        username: &str,
        password: &str,
        api_key: &str,
    ) -> Result<Self, ApiError> {
        let transport = Arc::new(UreqTransport::new(config.timeout));
        Self::login_with(transport, config, username, password, api_key)
    }

    /// Log in over an existing transport.
    pub fn login_with(
        transport: Arc<dyn Transport>,
        config: &ClientConfig,
        username: &str,
        password: &str,
        api_key: &str,
    ) -> Result<Self, ApiError> {
        let wrap = |e: ApiError| ApiError::AuthError(Box::new(e));

        let base_url = parse_base(&config.base_url).map_err(wrap)?;
        let request = build_login_request(&base_url, config, username, password, api_key).map_err(wrap)?;
        debug!("POST {}", request.url);

        let response = transport.execute(&request).map_err(wrap)?;
        let body = check_status(response).map_err(wrap)?;
        let login: LoginResponse = decode(&body).map_err(wrap)?;
        debug!(
            "logged in as user {} ({})",
            login.user_id, login.country_code
        );

        Ok(Self {
            session_id: login.session_id,
            user_id: login.user_id,
            country_code: login.country_code,
            base_url,
            config: config.clone(),
            transport,
        })
    }

    /// Rebuild a session from identity values obtained by an earlier login.
    pub fn restore(
        transport: Arc<dyn Transport>,
        config: &ClientConfig,
        session_id: impl Into<String>,
        user_id: u64,
        country_code: impl Into<String>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            session_id: session_id.into(),
            user_id,
            country_code: country_code.into(),
            base_url: parse_base(&config.base_url)?,
            config: config.clone(),
            transport,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build an authenticated request without executing it.
    ///
    /// The query starts with `countryCode`; a caller parameter of the same
    /// name is dropped, whether passed in `params` or inline in `endpoint`.
    pub fn build_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        params: &[(&str, &str)],
        body: Option<String>,
        headers: &[(&str, &str)],
    ) -> Result<HttpRequest, ApiError> {
        let mut url = resolve(&self.base_url, endpoint)?;
        let inline: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        {
            let mut query = url.query_pairs_mut();
            query.clear();
            query.append_pair(COUNTRY_CODE_PARAM, &self.country_code);
            let caller = inline
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .chain(params.iter().copied());
            for (key, value) in caller {
                if key == COUNTRY_CODE_PARAM {
                    warn!("ignoring caller-supplied {COUNTRY_CODE_PARAM}={value} on {endpoint}");
                    continue;
                }
                query.append_pair(key, value);
            }
        }

        let mut all_headers = Vec::with_capacity(headers.len() + 1);
        all_headers.push((SESSION_HEADER.to_string(), self.session_id.clone()));
        all_headers.extend(headers.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers: all_headers,
            body,
        })
    }

    /// Execute an authenticated request and return the body of a 2xx
    /// response.
    pub fn request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        params: &[(&str, &str)],
        body: Option<String>,
        headers: &[(&str, &str)],
    ) -> Result<Vec<u8>, ApiError> {
        let request = self.build_request(method, endpoint, params, body, headers)?;
        debug!("{} {}", method.as_str(), request.url);
        let response = self.transport.execute(&request)?;
        check_status(response)
    }

    /// GET `endpoint` and decode the body into `T`.
    pub fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let body = self.request(HttpMethod::Get, endpoint, params, None, headers)?;
        decode(&body)
    }
}

fn build_login_request(
    base_url: &Url,
    config: &ClientConfig,
    username: &str,
    password: &str,
    api_key: &str,
) -> Result<HttpRequest, ApiError> {
    let url = resolve(base_url, LOGIN_ENDPOINT)?;
    let body = form_urlencoded::Serializer::new(String::new())
        .append_pair("username", username)
        .append_pair("password", password)
        .append_pair("token", api_key)
        .append_pair("clientUniqueKey", &config.client_unique_key)
        .append_pair("clientVersion", &config.client_version)
        .finish();

    Ok(HttpRequest {
        method: HttpMethod::Post,
        url: url.into(),
        headers: vec![
            (TOKEN_HEADER.to_string(), api_key.to_string()),
            ("User-Agent".to_string(), config.user_agent.clone()),
            ("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()),
        ],
        body: Some(body),
    })
}

/// Deserialize a response body into `T`.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    Ok(serde_json::from_slice(body)?)
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: HttpResponse) -> Result<Vec<u8>, ApiError> {
    if response.is_success() {
        return Ok(response.body);
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
    })
}
