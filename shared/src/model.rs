use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::catalog::{Catalog, CatalogConfig};
use crate::router::Router;
use crate::search::SearchState;
use crate::settings::Settings;
use crate::{AppError, OTHER_CATEGORY, TOAST_DURATION_MS, UNKNOWN_DEVELOPER};

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(AppId);

/// User-declared Android API level. Zero means "not chosen yet", which admits
/// every app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlatformLevel(u32);

impl PlatformLevel {
    pub const UNSET: Self = Self(0);

    #[must_use]
    pub const fn new(level: u32) -> Self {
        Self(level)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn admits(self, min_sdk: u32) -> bool {
        self.is_unset() || min_sdk <= self.0
    }
}

impl fmt::Display for PlatformLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog entry as published in `data.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRecord {
    #[serde(default, deserialize_with = "loose::id")]
    pub id: AppId,
    #[serde(default, deserialize_with = "loose::string")]
    pub package: String,
    #[serde(default, deserialize_with = "loose::string")]
    pub name: String,
    #[serde(default, deserialize_with = "loose::non_empty")]
    pub developer: Option<String>,
    #[serde(default, deserialize_with = "loose::non_empty")]
    pub mod_author: Option<String>,
    #[serde(default, deserialize_with = "loose::non_empty")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "loose::string")]
    pub description: String,
    #[serde(default, deserialize_with = "loose::string")]
    pub icon: String,
    #[serde(default, deserialize_with = "loose::string_seq")]
    pub screenshots: Vec<String>,
    #[serde(default, deserialize_with = "loose::string_seq")]
    pub keywords: Vec<String>,

    #[serde(default, deserialize_with = "loose::string")]
    pub version: String,
    #[serde(default, deserialize_with = "loose::int")]
    pub code: i64,
    #[serde(default, alias = "minSDK", deserialize_with = "loose::level")]
    pub min_sdk: u32,
    #[serde(default, deserialize_with = "loose::string")]
    pub size: String,
    #[serde(default, deserialize_with = "loose::string")]
    pub download_url: String,
    #[serde(default, deserialize_with = "loose::string")]
    pub real_path: String,
    #[serde(default, deserialize_with = "loose::non_empty")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "loose::flag")]
    pub is_recommended: bool,
    #[serde(default, deserialize_with = "loose::variants")]
    pub history_version: Vec<VersionVariant>,

    #[serde(default, deserialize_with = "loose::int")]
    pub added_time: i64,
    #[serde(default, deserialize_with = "loose::non_empty")]
    pub update_time: Option<String>,

    #[serde(default, deserialize_with = "loose::id_opt")]
    pub recommend_id: Option<AppId>,
    #[serde(default, deserialize_with = "loose::id_seq")]
    pub recommend_ids: Vec<AppId>,
    #[serde(default, deserialize_with = "loose::non_empty")]
    pub recommend_package: Option<String>,
    #[serde(default, deserialize_with = "loose::non_empty")]
    pub recommend_reason: Option<String>,

    #[serde(default, deserialize_with = "loose::non_empty")]
    pub contributor: Option<String>,
    #[serde(default, deserialize_with = "loose::non_empty")]
    pub phone_link: Option<String>,
}

impl AppRecord {
    /// Category with blanks folded into [`OTHER_CATEGORY`].
    #[must_use]
    pub fn category_name(&self) -> &str {
        self.category.as_deref().unwrap_or(OTHER_CATEGORY)
    }

    #[must_use]
    pub fn developer_name(&self) -> &str {
        self.developer.as_deref().unwrap_or(UNKNOWN_DEVELOPER)
    }

    #[must_use]
    pub fn primary_download_url(&self) -> &str {
        if self.download_url.trim().is_empty() {
            self.real_path.trim()
        } else {
            self.download_url.trim()
        }
    }

    #[must_use]
    pub fn primary_password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn is_modded(&self) -> bool {
        self.mod_author.is_some()
    }

    /// `updateTime` in epoch milliseconds; missing or unparseable sorts as the epoch.
    #[must_use]
    pub fn updated_at_ms(&self) -> i64 {
        self.update_time.as_deref().map_or(0, parse_update_time)
    }
}

/// One historical build. Absent fields inherit from the owning record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionVariant {
    #[serde(default, deserialize_with = "loose::non_empty")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "loose::int_opt")]
    pub code: Option<i64>,
    #[serde(default, alias = "minSDK", deserialize_with = "loose::level_opt")]
    pub min_sdk: Option<u32>,
    #[serde(default, deserialize_with = "loose::non_empty")]
    pub size: Option<String>,
    #[serde(default, deserialize_with = "loose::non_empty")]
    pub download_url: Option<String>,
    #[serde(default, deserialize_with = "loose::non_empty")]
    pub real_path: Option<String>,
    #[serde(default, deserialize_with = "loose::non_empty")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "loose::flag_opt")]
    pub is_recommended: Option<bool>,
}

/// A concrete, fully populated version tuple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedVersion {
    pub version: String,
    pub code: i64,
    pub min_sdk: u32,
    pub size: String,
    pub download_url: String,
    pub password: String,
    pub is_recommended: bool,
}

impl ResolvedVersion {
    /// `"1.2.0 (120)"`, or just the version when no code is known.
    #[must_use]
    pub fn display_version(&self) -> String {
        let version = if self.version.is_empty() { "Unknown" } else { &self.version };
        if self.code == 0 {
            version.to_string()
        } else {
            format!("{version} ({})", self.code)
        }
    }
}

#[must_use]
pub fn parse_update_time(raw: &str) -> i64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.timestamp_millis();
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return ndt.and_utc().timestamp_millis();
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date
                .and_hms_opt(0, 0, 0)
                .map_or(0, |ndt| ndt.and_utc().timestamp_millis());
        }
    }

    0
}

/// Integer prefix of `raw`, the way catalog authors expect `"24 (Wear)"` to read as 24.
#[must_use]
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value = digits[..end].parse::<i64>().ok()?;
    Some(if negative { -value } else { value })
}

mod loose {
    //! Catalog JSON is hand-edited: numbers arrive as strings and vice versa.

    use super::{parse_leading_int, AppId, Deserialize, Deserializer, Value, VersionVariant};

    fn coerce_int(value: &Value) -> i64 {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| {
                    #[allow(clippy::cast_possible_truncation)]
                    n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)
                })
                .unwrap_or(0),
            Value::String(s) => parse_leading_int(s).unwrap_or(0),
            _ => 0,
        }
    }

    fn coerce_string(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn clamp_level(raw: i64) -> u32 {
        u32::try_from(raw.max(0)).unwrap_or(u32::MAX)
    }

    pub(super) fn int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(int_opt(d)?.unwrap_or(0))
    }

    pub(super) fn int_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(match value {
            Value::Null => None,
            other => Some(coerce_int(&other)),
        })
    }

    pub(super) fn level<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        Ok(clamp_level(int(d)?))
    }

    pub(super) fn level_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(int_opt(d)?.map(clamp_level))
    }

    pub(super) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(coerce_string(Value::deserialize(d)?).unwrap_or_default())
    }

    pub(super) fn non_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(coerce_string(Value::deserialize(d)?)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    pub(super) fn string_seq<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(coerce_string)
                .filter(|s| !s.trim().is_empty())
                .collect(),
            other => coerce_string(other)
                .filter(|s| !s.trim().is_empty())
                .into_iter()
                .collect(),
        })
    }

    pub(super) fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(flag_opt(d)?.unwrap_or(false))
    }

    pub(super) fn flag_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null => None,
            Value::Bool(b) => Some(b),
            Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
            Value::String(s) => Some(matches!(s.trim(), "true" | "1" | "yes")),
            Value::Array(_) | Value::Object(_) => Some(false),
        })
    }

    pub(super) fn id<'de, D: Deserializer<'de>>(d: D) -> Result<AppId, D::Error> {
        Ok(id_opt(d)?.unwrap_or_default())
    }

    pub(super) fn id_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<AppId>, D::Error> {
        Ok(coerce_string(Value::deserialize(d)?)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(AppId))
    }

    pub(super) fn id_seq<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<AppId>, D::Error> {
        Ok(string_seq(d)?.into_iter().map(AppId).collect())
    }

    /// Anything but an array reads as no history; non-object items are skipped.
    pub(super) fn variants<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Vec<VersionVariant>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|item| VersionVariant::deserialize(item).ok())
                .collect(),
            _ => Vec::new(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl ToastMessage {
    #[must_use]
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            duration_ms: TOAST_DURATION_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogStatus {
    #[default]
    Pending,
    Loaded,
    Failed,
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: CatalogConfig,
    pub catalog: Catalog,
    pub catalog_status: CatalogStatus,
    pub settings: Settings,
    pub settings_loaded: bool,
    pub system_dark: bool,
    pub router: Router,
    pub search: SearchState,
    pub active_error: Option<AppError>,
    pub active_toast: Option<ToastMessage>,
}

impl Model {
    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.active_toast = Some(ToastMessage::new(message, kind));
    }

    pub fn clear_toast(&mut self) {
        self.active_toast = None;
    }

    #[must_use]
    pub fn platform_level(&self) -> PlatformLevel {
        self.settings.platform_level
    }

    #[must_use]
    pub fn needs_platform_level(&self) -> bool {
        self.settings_loaded && self.settings.platform_level.is_unset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod decode_tests {
        use super::*;

        #[test]
        fn test_numbers_as_strings() {
            let record: AppRecord = serde_json::from_value(json!({
                "id": 42,
                "package": "com.example.watch",
                "code": "120",
                "minSdk": "25abc",
                "addedTime": 1_700_000_000_000_i64
            }))
            .unwrap();

            assert_eq!(record.id.as_str(), "42");
            assert_eq!(record.code, 120);
            assert_eq!(record.min_sdk, 25);
            assert_eq!(record.added_time, 1_700_000_000_000);
        }

        #[test]
        fn test_unparseable_numbers_become_zero() {
            let record: AppRecord = serde_json::from_value(json!({
                "package": "p",
                "code": "n/a",
                "minSdk": null
            }))
            .unwrap();

            assert_eq!(record.code, 0);
            assert_eq!(record.min_sdk, 0);
        }

        #[test]
        fn test_history_distinguishes_absent_from_zero() {
            let record: AppRecord = serde_json::from_value(json!({
                "package": "p",
                "historyVersion": [
                    { "version": "1.0" },
                    { "version": "0.9", "code": "x", "minSdk": 21 }
                ]
            }))
            .unwrap();

            assert_eq!(record.history_version[0].code, None);
            assert_eq!(record.history_version[0].min_sdk, None);
            assert_eq!(record.history_version[1].code, Some(0));
            assert_eq!(record.history_version[1].min_sdk, Some(21));
        }

        #[test]
        fn test_null_history_does_not_spoil_the_catalog() {
            let records: Vec<AppRecord> = serde_json::from_value(json!([
                { "id": 1, "package": "a" },
                { "id": 2, "package": "b", "historyVersion": null }
            ]))
            .unwrap();

            assert_eq!(records.len(), 2);
            assert!(records[1].history_version.is_empty());
        }

        #[test]
        fn test_history_skips_junk_items() {
            let record: AppRecord = serde_json::from_value(json!({
                "package": "p",
                "historyVersion": [null, "1.0", 7, { "version": "0.9", "code": 9 }]
            }))
            .unwrap();
            assert_eq!(record.history_version.len(), 1);
            assert_eq!(record.history_version[0].code, Some(9));

            let scalar: AppRecord =
                serde_json::from_value(json!({ "package": "p", "historyVersion": "none" })).unwrap();
            assert!(scalar.history_version.is_empty());
        }

        #[test]
        fn test_blank_optionals_are_none() {
            let record: AppRecord = serde_json::from_value(json!({
                "package": "p",
                "category": "   ",
                "modAuthor": "",
                "password": ""
            }))
            .unwrap();

            assert_eq!(record.category, None);
            assert_eq!(record.category_name(), OTHER_CATEGORY);
            assert!(!record.is_modded());
            assert_eq!(record.primary_password(), "");
        }

        #[test]
        fn test_keywords_string_or_array() {
            let single: AppRecord =
                serde_json::from_value(json!({ "package": "p", "keywords": "timer" })).unwrap();
            assert_eq!(single.keywords, vec!["timer".to_string()]);

            let many: AppRecord = serde_json::from_value(
                json!({ "package": "p", "keywords": ["timer", "", "alarm"] }),
            )
            .unwrap();
            assert_eq!(many.keywords, vec!["timer".to_string(), "alarm".to_string()]);
        }

        #[test]
        fn test_real_path_fallback() {
            let record: AppRecord = serde_json::from_value(json!({
                "package": "p",
                "downloadUrl": "",
                "realPath": "https://cdn.example/p.apk"
            }))
            .unwrap();

            assert_eq!(record.primary_download_url(), "https://cdn.example/p.apk");
        }

        #[test]
        fn test_unknown_keys_ignored() {
            let record: AppRecord = serde_json::from_value(json!({
                "package": "p",
                "somethingNew": { "nested": true }
            }))
            .unwrap();
            assert_eq!(record.package, "p");
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_leading_int() {
            assert_eq!(parse_leading_int("24"), Some(24));
            assert_eq!(parse_leading_int(" 30 (Wear OS 4)"), Some(30));
            assert_eq!(parse_leading_int("-3"), Some(-3));
            assert_eq!(parse_leading_int("v2"), None);
            assert_eq!(parse_leading_int(""), None);
        }

        #[test]
        fn test_update_time_formats() {
            let day = parse_update_time("2024-05-01");
            assert_eq!(day, 1_714_521_600_000);
            assert_eq!(parse_update_time("2024/05/01"), day);
            assert_eq!(parse_update_time("2024-05-01T00:00:00Z"), day);
            assert_eq!(parse_update_time("2024-05-01 00:00:00"), day);
        }

        #[test]
        fn test_update_time_garbage_is_epoch() {
            assert_eq!(parse_update_time("yesterday"), 0);
            assert_eq!(parse_update_time(""), 0);
        }
    }

    mod level_tests {
        use super::*;

        #[test]
        fn test_unset_admits_everything() {
            assert!(PlatformLevel::UNSET.admits(36));
            assert!(PlatformLevel::UNSET.is_unset());
        }

        #[test]
        fn test_admits_boundary() {
            let level = PlatformLevel::new(28);
            assert!(level.admits(28));
            assert!(level.admits(21));
            assert!(!level.admits(29));
        }
    }

    #[test]
    fn test_display_version() {
        let v = ResolvedVersion {
            version: "2.1".into(),
            code: 21,
            ..ResolvedVersion::default()
        };
        assert_eq!(v.display_version(), "2.1 (21)");

        let bare = ResolvedVersion {
            version: String::new(),
            ..ResolvedVersion::default()
        };
        assert_eq!(bare.display_version(), "Unknown");
    }
}
