//! User settings persisted through the shell's key-value store.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::capabilities::kv::{check_value_size, KeyNamespace, KvCapability, KvError, KvKey};
use crate::event::Event;
use crate::model::PlatformLevel;
use crate::{AppError, ErrorKind, MAX_PLATFORM_LEVEL, MIN_PLATFORM_LEVEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Setting {
    PlatformLevel,
    Theme,
}

impl Setting {
    pub const ALL: [Self; 2] = [Self::PlatformLevel, Self::Theme];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PlatformLevel => "platform_level",
            Self::Theme => "theme",
        }
    }

    pub fn key(self) -> Result<KvKey, KvError> {
        KvKey::new(KeyNamespace::Settings, self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemePreference {
    #[default]
    System,
    Light,
    Dark,
}

impl ThemePreference {
    #[must_use]
    pub const fn resolve(self, system_dark: bool) -> Theme {
        match self {
            Self::Light => Theme::Light,
            Self::Dark => Theme::Dark,
            Self::System if system_dark => Theme::Dark,
            Self::System => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    #[must_use]
    pub const fn as_preference(self) -> ThemePreference {
        match self {
            Self::Light => ThemePreference::Light,
            Self::Dark => ThemePreference::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub platform_level: PlatformLevel,
    pub theme: ThemePreference,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("platform level {0} is not supported")]
    LevelOutOfRange(u32),
    #[error("stored platform level '{0}' is not a number")]
    InvalidLevel(String),
    #[error("unknown theme '{0}'")]
    UnknownTheme(String),
    #[error("stored value for {0} is not UTF-8")]
    NotUtf8(&'static str),
    #[error(transparent)]
    Storage(#[from] KvError),
}

impl From<SettingsError> for AppError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::Storage(kv) => kv.into(),
            SettingsError::LevelOutOfRange(_) => AppError::new(ErrorKind::Validation, e.to_string()),
            _ => AppError::new(ErrorKind::Storage, "Saved settings could not be read")
                .with_internal(e.to_string()),
        }
    }
}

pub fn validate_platform_level(level: u32) -> Result<PlatformLevel, SettingsError> {
    if (MIN_PLATFORM_LEVEL..=MAX_PLATFORM_LEVEL).contains(&level) {
        Ok(PlatformLevel::new(level))
    } else {
        Err(SettingsError::LevelOutOfRange(level))
    }
}

fn utf8(setting: Setting, bytes: &[u8]) -> Result<&str, SettingsError> {
    std::str::from_utf8(bytes)
        .map(str::trim)
        .map_err(|_| SettingsError::NotUtf8(setting.name()))
}

#[must_use]
pub fn encode_platform_level(level: PlatformLevel) -> Vec<u8> {
    level.get().to_string().into_bytes()
}

pub fn decode_platform_level(bytes: &[u8]) -> Result<PlatformLevel, SettingsError> {
    let raw = utf8(Setting::PlatformLevel, bytes)?;
    if raw.is_empty() || raw == "0" {
        return Ok(PlatformLevel::UNSET);
    }
    let level = raw
        .parse::<u32>()
        .map_err(|_| SettingsError::InvalidLevel(raw.to_string()))?;
    validate_platform_level(level)
}

#[must_use]
pub fn encode_theme(theme: ThemePreference) -> Vec<u8> {
    match theme {
        ThemePreference::System => Vec::new(),
        ThemePreference::Light => b"light".to_vec(),
        ThemePreference::Dark => b"dark".to_vec(),
    }
}

pub fn decode_theme(bytes: &[u8]) -> Result<ThemePreference, SettingsError> {
    match utf8(Setting::Theme, bytes)? {
        "" | "system" => Ok(ThemePreference::System),
        "light" => Ok(ThemePreference::Light),
        "dark" => Ok(ThemePreference::Dark),
        other => Err(SettingsError::UnknownTheme(other.to_string())),
    }
}

impl Settings {
    /// Applies a stored value. `None` (never written) resets the setting to its default.
    pub fn apply(&mut self, setting: Setting, stored: Option<&[u8]>) -> Result<(), SettingsError> {
        match (setting, stored) {
            (Setting::PlatformLevel, None) => self.platform_level = PlatformLevel::UNSET,
            (Setting::PlatformLevel, Some(bytes)) => {
                self.platform_level = decode_platform_level(bytes)?;
            }
            (Setting::Theme, None) => self.theme = ThemePreference::System,
            (Setting::Theme, Some(bytes)) => self.theme = decode_theme(bytes)?,
        }
        Ok(())
    }

    #[must_use]
    pub fn encode(&self, setting: Setting) -> Vec<u8> {
        match setting {
            Setting::PlatformLevel => encode_platform_level(self.platform_level),
            Setting::Theme => encode_theme(self.theme),
        }
    }
}

/// Requests the stored value; the answer arrives as [`Event::SettingLoaded`].
pub fn load(kv: &KvCapability, setting: Setting) -> Result<(), SettingsError> {
    let key = setting.key()?;
    debug!(key = %key.raw(), "loading setting");
    kv.get(key.raw(), move |result| Event::SettingLoaded {
        setting,
        result: result.map_err(|e| e.to_string()),
    });
    Ok(())
}

/// Writes the current value; the outcome arrives as [`Event::SettingSaved`].
pub fn save(kv: &KvCapability, settings: &Settings, setting: Setting) -> Result<(), SettingsError> {
    let key = setting.key()?;
    let value = settings.encode(setting);
    check_value_size(&value)?;
    debug!(key = %key.raw(), bytes = value.len(), "saving setting");
    kv.set(key.raw(), value, move |result| Event::SettingSaved {
        setting,
        result: result.map(|_| ()).map_err(|e| e.to_string()),
    });
    Ok(())
}

/// Logs and swallows a settings failure that must not interrupt the session.
pub fn log_failure(setting: Setting, error: &SettingsError) {
    warn!(setting = setting.name(), error = %error, "setting ignored");
}
