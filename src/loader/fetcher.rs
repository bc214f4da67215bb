//! Asset fetching for module bundles.
//!
//! Bundles live at `modules/<id>/<id>.{html,css,js}` relative to a base. Two
//! fetchers implement the same seam:
//!
//! - [`HttpFetcher`]: GETs assets from a web server with `reqwest`.
//! - [`EmbeddedFetcher`]: serves a fixed in-process asset map (the bundles
//!   compiled into the binary, or fixtures in tests).

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use log::{debug, warn};

/// Errors that can occur while fetching a bundle asset.
///
/// `Clone` because one failed fetch is reported to every caller sharing
/// the in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network-level failure (timeout, DNS, connection refused).
    Network(String),
    /// Server answered with a non-success status.
    Status { url: String, status: u16 },
    /// Asset is not part of the embedded map.
    NotFound(String),
    /// No executable unit is registered for the module.
    UnknownModule(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "network error: {msg}"),
            FetchError::Status { url, status } => write!(f, "GET {url} returned HTTP {status}"),
            FetchError::NotFound(path) => write!(f, "asset not found: {path}"),
            FetchError::UnknownModule(id) => write!(f, "no module registered as '{id}'"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Relative path of one bundle asset, e.g. `modules/quiz/quiz.css`.
pub fn asset_path(module_id: &str, extension: &str) -> String {
    format!("modules/{module_id}/{module_id}.{extension}")
}

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Returns the name of the fetcher, for logs.
    fn name(&self) -> &str;

    /// Fetches one asset as text. `path` is relative to the fetcher's base.
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError>;
}

// ============================================================================
// HTTP
// ============================================================================

pub struct HttpFetcher {
    base_url: String,
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher rooted at `base_url` (trailing slash optional).
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let url = self.url_for(path);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            warn!("GET {url} failed with HTTP {status}");
            return Err(FetchError::Status { url, status });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        debug!("GET {url}: {} bytes", body.len());
        Ok(body)
    }
}

// ============================================================================
// Embedded
// ============================================================================

#[derive(Default)]
pub struct EmbeddedFetcher {
    assets: HashMap<String, String>,
}

impl EmbeddedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, path: &str, body: &str) -> Self {
        self.insert(path, body);
        self
    }

    pub fn insert(&mut self, path: &str, body: &str) {
        self.assets
            .insert(path.trim_start_matches('/').to_string(), body.to_string());
    }

    /// Adds the HTML, CSS and script placeholder for one module.
    pub fn with_bundle(self, module_id: &str, html: &str, css: &str) -> Self {
        self.with_asset(&asset_path(module_id, "html"), html)
            .with_asset(&asset_path(module_id, "css"), css)
            .with_asset(&asset_path(module_id, "js"), "")
    }
}

#[async_trait]
impl AssetFetcher for EmbeddedFetcher {
    fn name(&self) -> &str {
        "embedded"
    }

    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        self.assets
            .get(path.trim_start_matches('/'))
            .cloned()
            .ok_or_else(|| FetchError::NotFound(path.to_string()))
    }
}
