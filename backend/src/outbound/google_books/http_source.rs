//! Reqwest-backed Google Books catalogue adapter.
//!
//! This adapter owns transport details only: query-string assembly, timeout
//! and HTTP error mapping, and JSON decoding into domain book records.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::dto::{VolumeDto, VolumesResponseDto};
use crate::domain::ports::{BookCatalogue, BookCatalogueError};
use crate::domain::{BookDetails, BookId, BookSearchPage, BookSearchQuery};

/// Public Google Books endpoint.
pub const DEFAULT_GOOGLE_BOOKS_BASE_URL: &str = "https://www.googleapis.com/books/v1";
const DEFAULT_LANG_RESTRICT: &str = "en";

/// Request identity and filters applied to every catalogue call.
#[derive(Debug, Clone, Default)]
pub struct GoogleBooksSettings {
    /// API key appended as `key`; anonymous quota applies when absent.
    pub api_key: Option<String>,
    /// Value of `langRestrict`; defaults to English.
    pub lang_restrict: Option<String>,
}

/// Catalogue adapter performing HTTP GET requests against the volumes API.
pub struct GoogleBooksHttpSource {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    lang_restrict: String,
}

impl GoogleBooksHttpSource {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        settings: GoogleBooksSettings,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let api_key = settings.api_key.filter(|key| !key.trim().is_empty());
        let lang_restrict = settings
            .lang_restrict
            .filter(|lang| !lang.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LANG_RESTRICT.to_owned());
        Ok(Self {
            client,
            base_url,
            api_key,
            lang_restrict,
        })
    }

    fn volumes_url(&self, id: Option<&str>) -> Result<Url, BookCatalogueError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                BookCatalogueError::transport(format!(
                    "base url {} cannot carry a path",
                    self.base_url
                ))
            })?;
            segments.pop_if_empty().push("volumes");
            if let Some(volume_id) = id {
                segments.push(volume_id);
            }
        }
        Ok(url)
    }

    fn with_key(&self, mut url: Url) -> Url {
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        url
    }

    async fn fetch(&self, url: Url) -> Result<(StatusCode, Vec<u8>), BookCatalogueError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl BookCatalogue for GoogleBooksHttpSource {
    async fn search(&self, query: &BookSearchQuery) -> Result<BookSearchPage, BookCatalogueError> {
        let mut url = self.volumes_url(None)?;
        url.query_pairs_mut()
            .append_pair("q", query.query())
            .append_pair("maxResults", &query.max_results().to_string())
            .append_pair("orderBy", query.order_by().as_str())
            .append_pair("startIndex", &query.start_index().to_string())
            .append_pair("printType", "books")
            .append_pair("langRestrict", &self.lang_restrict);
        let (status, body) = self.fetch(self.with_key(url)).await?;
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }
        parse_page(&body)
    }

    async fn details(&self, id: &BookId) -> Result<Option<BookDetails>, BookCatalogueError> {
        let url = self.volumes_url(Some(id.as_ref()))?;
        let (status, body) = self.fetch(self.with_key(url)).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }
        parse_details(&body).map(Some)
    }
}

fn parse_page(body: &[u8]) -> Result<BookSearchPage, BookCatalogueError> {
    let decoded: VolumesResponseDto = serde_json::from_slice(body).map_err(|error| {
        BookCatalogueError::decode(format!("invalid volumes payload: {error}"))
    })?;
    Ok(decoded.into_page())
}

fn parse_details(body: &[u8]) -> Result<BookDetails, BookCatalogueError> {
    let decoded: VolumeDto = serde_json::from_slice(body).map_err(|error| {
        BookCatalogueError::decode(format!("invalid volume payload: {error}"))
    })?;
    Ok(decoded.into_details())
}

fn map_transport_error(error: reqwest::Error) -> BookCatalogueError {
    if error.is_timeout() {
        BookCatalogueError::timeout(error.to_string())
    } else {
        BookCatalogueError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> BookCatalogueError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => BookCatalogueError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            BookCatalogueError::timeout(message)
        }
        _ => BookCatalogueError::upstream(status.as_u16(), message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
