//! The in-memory catalog and the list policies built on top of it.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::capabilities::http::{HttpError, ValidatedUrl};
use crate::location::{DeveloperVariant, ListKind, Location};
use crate::model::{AppId, AppRecord, PlatformLevel};
use crate::resolver::is_compatible;
use crate::{
    AppError, ErrorKind, DEFAULT_DATA_PATH, HOME_PAGE_SIZE, LIST_PAGE_SIZE, OTHER_CATEGORY,
    PINNED_POSITION,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Site root the catalog and share links hang off. `None` disables fetching.
    pub base_url: Option<String>,
    pub data_path: String,
    pub pinned_app_id: Option<AppId>,
    pub home_page_size: usize,
    pub list_page_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            data_path: DEFAULT_DATA_PATH.to_string(),
            pinned_app_id: None,
            home_page_size: HOME_PAGE_SIZE,
            list_page_size: LIST_PAGE_SIZE,
        }
    }
}

impl CatalogConfig {
    pub fn catalog_url(&self) -> Result<ValidatedUrl, CatalogError> {
        let base = self.base_url.as_deref().ok_or(CatalogError::NotConfigured)?;
        let base = ValidatedUrl::new(base)?;
        Ok(base.join(&self.data_path)?)
    }

    /// Absolute link to `location`, or just the fragment when no base is set.
    #[must_use]
    pub fn share_link(&self, location: &Location) -> String {
        let base = self
            .base_url
            .as_deref()
            .map(|b| b.split('#').next().unwrap_or_default())
            .unwrap_or_default();
        format!("{base}{location}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("no catalog base URL configured")]
    NotConfigured,
    #[error(transparent)]
    Http(#[from] HttpError),
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotConfigured => AppError::new(ErrorKind::Configuration, e.to_string()),
            CatalogError::Http(http) => http.into(),
        }
    }
}

/// Read-only after load. Ids are unique: blank or repeated ids are replaced
/// with `<package>#<index>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    records: Vec<AppRecord>,
}

impl Catalog {
    #[must_use]
    pub fn from_records(mut records: Vec<AppRecord>) -> Self {
        let mut seen = std::collections::HashSet::new();
        for (index, record) in records.iter_mut().enumerate() {
            if record.id.is_empty() || !seen.insert(record.id.clone()) {
                let fallback = AppId::new(format!("{}#{index}", record.package));
                debug!(package = %record.package, id = %fallback, "assigned fallback id");
                record.id = fallback.clone();
                seen.insert(fallback);
            }
        }
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[AppRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn by_id(&self, id: &AppId) -> Option<&AppRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    #[must_use]
    pub fn by_package(&self, package: &str) -> Option<&AppRecord> {
        self.records.iter().find(|r| r.package == package)
    }

    #[must_use]
    pub fn has_package(&self, package: &str) -> bool {
        self.by_package(package).is_some()
    }
}

fn compatible(records: &[AppRecord], level: PlatformLevel) -> impl Iterator<Item = &AppRecord> {
    records.iter().filter(move |app| is_compatible(app, level))
}

#[must_use]
pub fn category_apps<'a>(
    records: &'a [AppRecord],
    name: &str,
    level: PlatformLevel,
) -> Vec<&'a AppRecord> {
    compatible(records, level)
        .filter(|app| app.category_name() == name)
        .collect()
}

#[must_use]
pub fn newest(records: &[AppRecord], level: PlatformLevel, limit: usize) -> Vec<&AppRecord> {
    let mut apps: Vec<_> = compatible(records, level).collect();
    apps.sort_by_key(|app| Reverse(app.added_time));
    apps.truncate(limit);
    apps
}

#[must_use]
pub fn recently_updated(
    records: &[AppRecord],
    level: PlatformLevel,
    limit: usize,
) -> Vec<&AppRecord> {
    let mut apps: Vec<_> = compatible(records, level).collect();
    apps.sort_by_cached_key(|app| Reverse(app.updated_at_ms()));
    apps.truncate(limit);
    apps
}

#[must_use]
pub fn list_apps(
    records: &[AppRecord],
    kind: ListKind,
    level: PlatformLevel,
    limit: usize,
) -> Vec<&AppRecord> {
    match kind {
        ListKind::Newest => newest(records, level, limit),
        ListKind::RecentlyUpdated => recently_updated(records, level, limit),
        ListKind::All => compatible(records, level).collect(),
    }
}

/// Apps attributed to `name`. Not filtered by compatibility.
#[must_use]
pub fn developer_apps<'a>(
    records: &'a [AppRecord],
    name: &str,
    variant: DeveloperVariant,
) -> Vec<&'a AppRecord> {
    records
        .iter()
        .filter(|app| {
            let developer = app.developer.as_deref() == Some(name);
            match variant {
                DeveloperVariant::Original => developer && app.mod_author.is_none(),
                DeveloperVariant::Modded => app.mod_author.as_deref() == Some(name) || developer,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub name: String,
    /// Apps in this category that run at the current level.
    pub compatible_count: usize,
    pub icon: String,
    pub color: String,
}

const CATEGORY_STYLES: &[(&str, &str, &str)] = &[
    ("系统工具", "build", "slate"),
    ("效率办公", "work", "blue"),
    ("健康运动", "fitness_center", "red"),
    ("通讯社交", "forum", "green"),
    ("影音娱乐", "movie", "purple"),
    ("学习充电", "school", "orange"),
    ("生活服务", "storefront", "cyan"),
    ("休闲游戏", "sports_esports", "pink"),
    ("表盘美化", "watch", "indigo"),
];

fn category_style(name: &str) -> (&'static str, &'static str) {
    CATEGORY_STYLES
        .iter()
        .find(|(category, _, _)| *category == name)
        .map_or(("folder", "normal"), |(_, icon, color)| (*icon, *color))
}

/// Every category present in the catalog, sorted by name with
/// [`OTHER_CATEGORY`] last.
#[must_use]
pub fn categories(records: &[AppRecord], level: PlatformLevel) -> Vec<CategorySummary> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for app in records {
        let count = counts.entry(app.category_name()).or_default();
        if is_compatible(app, level) {
            *count += 1;
        }
    }

    let mut summaries: Vec<_> = counts
        .into_iter()
        .map(|(name, compatible_count)| {
            let (icon, color) = category_style(name);
            CategorySummary {
                name: name.to_string(),
                compatible_count,
                icon: icon.to_string(),
                color: color.to_string(),
            }
        })
        .collect();
    summaries.sort_by_key(|c| c.name == OTHER_CATEGORY);
    summaries
}

/// Randomized home ordering, computed once per platform level.
#[derive(Debug, Clone, Default)]
pub struct HomeFeed {
    level: Option<PlatformLevel>,
    ids: Vec<AppId>,
}

impl HomeFeed {
    pub fn invalidate(&mut self) {
        self.level = None;
        self.ids.clear();
    }

    #[must_use]
    pub fn is_cached_for(&self, level: PlatformLevel) -> bool {
        self.level == Some(level)
    }

    /// The last computed ordering; empty until [`HomeFeed::ids`] has run.
    #[must_use]
    pub fn cached(&self) -> &[AppId] {
        &self.ids
    }

    pub fn ids<R: Rng + ?Sized>(
        &mut self,
        records: &[AppRecord],
        level: PlatformLevel,
        pinned: Option<&AppId>,
        limit: usize,
        rng: &mut R,
    ) -> &[AppId] {
        if !self.is_cached_for(level) {
            self.ids = Self::shuffle(records, level, pinned, limit, rng);
            self.level = Some(level);
            debug!(level = level.get(), size = self.ids.len(), "home feed reshuffled");
        }
        &self.ids
    }

    fn shuffle<R: Rng + ?Sized>(
        records: &[AppRecord],
        level: PlatformLevel,
        pinned: Option<&AppId>,
        limit: usize,
        rng: &mut R,
    ) -> Vec<AppId> {
        let mut pool: Vec<AppId> = compatible(records, level).map(|a| a.id.clone()).collect();
        let pinned = pinned.and_then(|id| {
            let index = pool.iter().position(|candidate| candidate == id)?;
            Some(pool.remove(index))
        });

        pool.shuffle(rng);

        if let Some(id) = pinned {
            let keep = limit.saturating_sub(1);
            pool.truncate(keep);
            pool.insert(PINNED_POSITION.min(pool.len()), id);
        }
        pool.truncate(limit);
        pool
    }
}
