// lib.rs - WearStore headless core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod catalog;
pub mod event;
pub mod location;
pub mod model;
pub mod resolver;
pub mod router;
pub mod search;
pub mod settings;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use catalog::Catalog;
pub use crux_core::{render::Render, App as CruxApp};
pub use event::Event;
pub use location::{DeveloperVariant, ListKind, Location};
pub use model::{AppId, AppRecord, Model, PlatformLevel, ResolvedVersion, VersionVariant};
pub use router::{Router, StackIdentity, ViewKind};
pub use view::ViewModel;

pub const DEFAULT_DATA_PATH: &str = "data/data.json";
pub const HOME_PAGE_SIZE: usize = 30;
pub const LIST_PAGE_SIZE: usize = 15;
pub const SUGGESTION_LIMIT: usize = 5;
pub const PINNED_POSITION: usize = 2;
pub const BASE_LAYER: u32 = 1300;
pub const LAYER_STEP: u32 = 10;
pub const OTHER_CATEGORY: &str = "Other";
pub const UNKNOWN_DEVELOPER: &str = "Unknown developer";
pub const TOAST_DURATION_MS: u64 = 3000;
pub const MIN_PLATFORM_LEVEL: u32 = 14;
pub const MAX_PLATFORM_LEVEL: u32 = 36;

pub const ANDROID_RELEASES: &[(u32, &str)] = &[
    (14, "4.0"),
    (15, "4.0.3"),
    (16, "4.1"),
    (17, "4.2"),
    (18, "4.3"),
    (19, "4.4"),
    (20, "4.4W"),
    (21, "5.0"),
    (22, "5.1"),
    (23, "6.0"),
    (24, "7.0"),
    (25, "7.1"),
    (26, "8.0"),
    (27, "8.1"),
    (28, "9"),
    (29, "10"),
    (30, "11"),
    (31, "12"),
    (32, "12L"),
    (33, "13"),
    (34, "14"),
    (35, "15"),
    (36, "16"),
];

/// Android release name for an API level, or the bare number when unknown.
#[must_use]
pub fn android_label(level: u32) -> String {
    ANDROID_RELEASES
        .iter()
        .find(|(api, _)| *api == level)
        .map_or_else(|| level.to_string(), |(_, name)| (*name).to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    NotFound,
    Validation,
    Storage,
    Deserialization,
    Configuration,
    ExternalAction,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION_ERROR",
            Self::Storage => "STORAGE_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::ExternalAction => "EXTERNAL_ACTION_FAILED",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::Storage | Self::ExternalAction => {
                ErrorSeverity::Transient
            }

            Self::Deserialization | Self::Configuration | Self::InvalidState | Self::Internal => {
                ErrorSeverity::Fatal
            }

            Self::NotFound | Self::Validation | Self::Unknown => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Storage)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && !matches!(self.severity, ErrorSeverity::Fatal)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to load the app catalog. Please check your connection and reload.".into()
            }
            ErrorKind::Timeout => "Loading the app catalog timed out. Please reload.".into(),
            ErrorKind::NotFound => "The app catalog could not be found.".into(),
            ErrorKind::Validation | ErrorKind::ExternalAction => self.message.clone(),
            ErrorKind::Storage => "Your settings could not be saved on this device.".into(),
            ErrorKind::Deserialization => "The app catalog is malformed.".into(),
            ErrorKind::Configuration => "The store is not configured correctly.".into(),
            ErrorKind::InvalidState => "The store is in an invalid state. Please reload.".into(),
            ErrorKind::Internal | ErrorKind::Unknown => {
                "An unexpected error occurred. Please reload the page.".into()
            }
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16) -> Self {
        let kind = match status {
            400 => ErrorKind::Validation,
            404 | 410 => ErrorKind::NotFound,
            408 | 504 => ErrorKind::Timeout,
            500..=599 => ErrorKind::Network,
            _ => ErrorKind::Unknown,
        };

        Self::new(kind, format!("HTTP error: {status}"))
            .with_context("http_status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}
