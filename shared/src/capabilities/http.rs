use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crux_http::Http;

use crate::event::Event;
use crate::model::AppRecord;
use crate::{AppError, ErrorKind};

pub type HttpCapability = Http<Event>;

pub const MAX_URL_LENGTH: usize = 2048;

/// An absolute http(s) URL with a host and no embedded credentials.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatedUrl {
    url: String,
    scheme: String,
    host: String,
}

impl ValidatedUrl {
    pub fn new(url: impl Into<String>) -> Result<Self, HttpError> {
        let url = url.into();
        let parsed = Self::validate(&url)?;
        Ok(Self::from_parsed(&parsed))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Resolves `path` against this URL the way a browser resolves a relative link.
    pub fn join(&self, path: &str) -> Result<Self, HttpError> {
        let joined = Url::parse(&self.url)
            .and_then(|base| base.join(path))
            .map_err(|e| HttpError::InvalidUrl {
                url: Self::truncate_url(path),
                reason: e.to_string(),
            })?;
        Self::new(joined.to_string())
    }

    fn from_parsed(parsed: &Url) -> Self {
        Self {
            url: parsed.to_string(),
            scheme: parsed.scheme().to_lowercase(),
            host: parsed.host_str().unwrap_or_default().to_lowercase(),
        }
    }

    fn validate(url: &str) -> Result<Url, HttpError> {
        let invalid = |reason: String| HttpError::InvalidUrl {
            url: Self::truncate_url(url),
            reason,
        };

        if url.trim().is_empty() {
            return Err(invalid("URL cannot be empty".to_string()));
        }

        if url.len() > MAX_URL_LENGTH {
            return Err(invalid(format!(
                "URL exceeds maximum length of {MAX_URL_LENGTH} bytes"
            )));
        }

        let parsed = Url::parse(url.trim()).map_err(|e| invalid(e.to_string()))?;

        let scheme = parsed.scheme().to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(invalid(format!(
                "invalid scheme '{scheme}', only 'http' and 'https' are allowed"
            )));
        }

        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(invalid("URL must have a host".to_string()));
        }

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(invalid("credentials in URL are not allowed".to_string()));
        }

        Ok(parsed)
    }

    fn truncate_url(url: &str) -> String {
        if url.chars().count() <= 100 {
            url.to_string()
        } else {
            format!("{}...", url.chars().take(100).collect::<String>())
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HttpError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP error {status}")]
    Status { status: u16 },

    #[error("request failed: {message}")]
    Transport { message: String },

    #[error("response had no body")]
    EmptyBody,
}

impl HttpError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status } => *status == 408 || *status == 429 || *status >= 500,
            Self::InvalidUrl { .. } | Self::EmptyBody => false,
        }
    }
}

impl From<HttpError> for AppError {
    fn from(e: HttpError) -> Self {
        match &e {
            HttpError::InvalidUrl { url, .. } => AppError::new(ErrorKind::Configuration, e.to_string())
                .with_context("url", url.clone()),
            HttpError::Status { status } => AppError::from_http_status(*status),
            HttpError::Transport { message } => {
                AppError::new(ErrorKind::Network, "catalog request failed").with_internal(message.clone())
            }
            HttpError::EmptyBody => AppError::new(ErrorKind::Deserialization, e.to_string()),
        }
    }
}

/// Issues the one catalog GET; the answer arrives as [`Event::CatalogResponse`].
pub fn request_catalog(http: &HttpCapability, url: &ValidatedUrl) {
    debug!(url = url.as_str(), "requesting catalog");
    http.get(url.as_str())
        .expect_json::<Vec<AppRecord>>()
        .send(|result| Event::CatalogResponse(catalog_records(result)));
}

/// Flattens a catalog response into records or a classified error.
pub fn catalog_records(
    result: crux_http::Result<crux_http::Response<Vec<AppRecord>>>,
) -> Result<Vec<AppRecord>, HttpError> {
    let mut response = result.map_err(|e| HttpError::Transport {
        message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(HttpError::Status {
            status: u16::from(status),
        });
    }

    response.take_body().ok_or(HttpError::EmptyBody)
}
