//! # Response Formatting
//!
//! Standard response types for REST API.

use std::io::Read;

use axum::http::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::filters::FilterParams;

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: Option<u64>,
    /// Matching rows across all pages
    pub total: u64,
    /// `ceil(total / per_page)` when paginated
    pub pages: Option<u64>,
    /// Rows in this page
    pub page_total: usize,
}

impl PaginationMeta {
    pub fn new(page: u64, per_page: Option<u64>, total: u64, page_total: usize) -> Self {
        Self {
            page,
            per_page,
            total,
            pages: per_page.map(|n| total.div_ceil(n)),
            page_total,
        }
    }
}

/// Multi-resource response
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn build(data: Vec<T>, params: &FilterParams, total: u64) -> Self {
        let meta = PaginationMeta::new(params.page(), params.per_page(), total, data.len());
        Self { data, meta }
    }
}

/// Single-resource response
#[derive(Debug, Clone, Serialize)]
pub struct ResourceResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ResourceResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Binary response served inline under a filename
#[derive(Debug, Clone)]
pub struct DownloadResponse {
    filename: String,
    content_type: String,
    body: Vec<u8>,
    headers: Vec<(String, String)>,
}

impl DownloadResponse {
    pub fn new(body: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            content_type: content_type_for(&filename),
            filename,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    /// Drain a reader into the response body
    pub fn from_reader<R: Read>(mut reader: R, filename: impl Into<String>) -> std::io::Result<Self> {
        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;
        Ok(Self::new(body, filename))
    }

    /// Extra header; may override the defaults
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// MIME type from the filename's extension, octet-stream when unknown
fn content_type_for(filename: &str) -> String {
    let extension = filename.rsplit('.').next().unwrap_or_default();
    if extension.eq_ignore_ascii_case("xlsx") {
        return "application/vnd.ms-excel".to_string();
    }
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}

impl IntoResponse for DownloadResponse {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();

        if let Ok(value) = HeaderValue::from_str(&self.content_type) {
            headers.insert(CONTENT_TYPE, value);
        }
        let disposition = format!("inline; filename=\"{}\"", self.filename.replace('"', "'"));
        match HeaderValue::from_str(&disposition) {
            Ok(value) => {
                headers.insert(CONTENT_DISPOSITION, value);
            }
            Err(_) => {
                headers.insert(CONTENT_DISPOSITION, HeaderValue::from_static("inline"));
            }
        }

        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid download header"),
            }
        }

        (StatusCode::OK, headers, self.body).into_response()
    }
}
