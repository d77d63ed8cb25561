//! Blocking client for TIDAL's private REST API.
//!
//! # Overview
//! Log in once to obtain a `Session`, then call catalog, favorites and
//! stream operations on it. Collection endpoints are paged by the service;
//! the session walks the offsets and returns fully materialized vectors.
//!
//! # Design
//! - `Session` is an explicit context value holding identity, the base URL
//!   and a shared `Transport`; there is no global state.
//! - Requests are built as plain `HttpRequest` data and executed through the
//!   `Transport` trait, so the HTTP stack is swappable (`UreqTransport` by
//!   default) and request construction is testable without a network.
//! - Non-2xx responses are errors carrying the status code, never decoded
//!   as success shapes.
//! - One generic pagination loop serves every collection endpoint.

mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod pagination;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ClientConfig;
pub use endpoint::resolve;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use pagination::{Page, Pages, Wrapped};
pub use session::{decode, Session};
pub use types::{Album, Artist, AudioQuality, LoginResponse, StreamUrls, Track};
