use serde::{Deserialize, Serialize};

use crate::capabilities::http::HttpError;
use crate::catalog::CatalogConfig;
use crate::location::Location;
use crate::model::AppRecord;
use crate::settings::Setting;

/// Side effects only the shell can perform. It reports the outcome back
/// through [`Event::ExternalActionCompleted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalAction {
    Download,
    CopyPassword,
    CopyShareLink,
    OpenPhoneLink,
}

impl ExternalAction {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::CopyPassword => "copy_password",
            Self::CopyShareLink => "copy_share_link",
            Self::OpenPhoneLink => "open_phone_link",
        }
    }

    /// Confirmation shown after the action succeeded, if any.
    #[must_use]
    pub const fn success_message(self) -> Option<&'static str> {
        match self {
            Self::CopyPassword => Some("Password copied"),
            Self::CopyShareLink => Some("Link copied, share it with friends"),
            Self::Download | Self::OpenPhoneLink => None,
        }
    }

    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Download => "The download could not be started",
            Self::CopyPassword => "Copy failed, please copy the password manually",
            Self::CopyShareLink => "Copy failed, please copy the link manually",
            Self::OpenPhoneLink => "The link could not be opened",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    Noop,

    Configure(CatalogConfig),
    AppStarted,

    // Catalog
    CatalogResponse(Result<Vec<AppRecord>, HttpError>),
    /// Records supplied directly by the shell, bypassing the fetch.
    CatalogLoaded(Vec<AppRecord>),
    RetryCatalog,

    // Settings
    SettingLoaded {
        setting: Setting,
        result: Result<Option<Vec<u8>>, String>,
    },
    SettingSaved {
        setting: Setting,
        result: Result<(), String>,
    },
    SystemThemeChanged {
        dark: bool,
    },
    ThemeToggled,
    PlatformLevelSelected(u32),

    // Navigation
    /// The shell's current fragment, reported on startup and on every change.
    LocationChanged(String),
    Navigate(Location),
    CloseRequested,

    // Search
    SearchInputChanged(String),
    SearchSubmitted,
    SearchCleared,

    // Shell-side actions
    ExternalActionCompleted {
        action: ExternalAction,
        outcome: Result<(), String>,
    },
    DismissError,
    DismissToast,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure(_) => "configure",
            Self::AppStarted => "app_started",
            Self::CatalogResponse(_) => "catalog_response",
            Self::CatalogLoaded(_) => "catalog_loaded",
            Self::RetryCatalog => "retry_catalog",
            Self::SettingLoaded { .. } => "setting_loaded",
            Self::SettingSaved { .. } => "setting_saved",
            Self::SystemThemeChanged { .. } => "system_theme_changed",
            Self::ThemeToggled => "theme_toggled",
            Self::PlatformLevelSelected(_) => "platform_level_selected",
            Self::LocationChanged(_) => "location_changed",
            Self::Navigate(_) => "navigate",
            Self::CloseRequested => "close_requested",
            Self::SearchInputChanged(_) => "search_input_changed",
            Self::SearchSubmitted => "search_submitted",
            Self::SearchCleared => "search_cleared",
            Self::ExternalActionCompleted { .. } => "external_action_completed",
            Self::DismissError => "dismiss_error",
            Self::DismissToast => "dismiss_toast",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::RetryCatalog
                | Self::ThemeToggled
                | Self::PlatformLevelSelected(_)
                | Self::Navigate(_)
                | Self::CloseRequested
                | Self::SearchInputChanged(_)
                | Self::SearchSubmitted
                | Self::SearchCleared
                | Self::DismissError
                | Self::DismissToast
        )
    }
}
