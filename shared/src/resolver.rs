//! Compatibility resolution: which build of an app a given platform level can run.
//!
//! Every function here works on the flattened [`ResolvedVersion`] list of a
//! record: the primary version first, then each `historyVersion` entry in
//! declared order. Nothing is cached; versions are derived on demand.

use std::cmp::Reverse;

use crate::model::{AppId, AppRecord, PlatformLevel, ResolvedVersion};

/// Flattens the primary version and its history into concrete tuples.
#[must_use]
pub fn resolved_versions(app: &AppRecord) -> Vec<ResolvedVersion> {
    let primary_url = app.primary_download_url();
    let primary_password = app.primary_password();

    let mut versions = Vec::with_capacity(app.history_version.len() + 1);
    versions.push(ResolvedVersion {
        version: app.version.clone(),
        code: app.code,
        min_sdk: app.min_sdk,
        size: app.size.clone(),
        download_url: primary_url.to_string(),
        password: primary_password.to_string(),
        is_recommended: app.is_recommended,
    });

    for variant in &app.history_version {
        let download_url = variant
            .download_url
            .as_deref()
            .or(variant.real_path.as_deref())
            .unwrap_or(primary_url);

        versions.push(ResolvedVersion {
            version: variant.version.clone().unwrap_or_else(|| app.version.clone()),
            code: variant.code.unwrap_or(app.code),
            min_sdk: variant.min_sdk.unwrap_or(app.min_sdk),
            size: variant.size.clone().unwrap_or_else(|| app.size.clone()),
            download_url: download_url.to_string(),
            password: variant
                .password
                .clone()
                .unwrap_or_else(|| primary_password.to_string()),
            // The recommendation pins one specific build; history entries never inherit it.
            is_recommended: variant.is_recommended.unwrap_or(false),
        });
    }

    versions
}

#[must_use]
pub fn is_compatible(app: &AppRecord, level: PlatformLevel) -> bool {
    if level.is_unset() {
        return true;
    }
    resolved_versions(app)
        .iter()
        .any(|v| level.admits(v.min_sdk))
}

/// The build to show for `level`, or `None` when nothing runs there.
///
/// Recommended builds win over unrecommended ones; within the same
/// recommendation the highest `code` wins; remaining ties keep declared order.
/// An unset level always yields the primary version.
#[must_use]
pub fn best_match(app: &AppRecord, level: PlatformLevel) -> Option<ResolvedVersion> {
    let versions = resolved_versions(app);

    if level.is_unset() {
        return versions.into_iter().next();
    }

    versions
        .into_iter()
        .filter(|v| level.admits(v.min_sdk))
        .min_by_key(|v| (Reverse(v.is_recommended), Reverse(v.code)))
}

/// Lowest `minSdk` across every build, used for the "needs Android X" hint.
#[must_use]
pub fn lowest_required_level(app: &AppRecord) -> u32 {
    resolved_versions(app)
        .iter()
        .map(|v| v.min_sdk)
        .min()
        .unwrap_or(app.min_sdk)
}

/// Result of resolving a deep link to a concrete build.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecisionMatch<'a> {
    pub record: &'a AppRecord,
    pub version: ResolvedVersion,
    /// `false` when the requested build was not found and the first record's
    /// primary version was substituted.
    pub exact: bool,
}

/// Finds the build a deep link names.
///
/// Searches every record sharing `package` for a resolved version matching the
/// supplied `version` and/or `code`. Without a match (or without either
/// component) falls back to the first record with that package and its primary
/// version. `None` only when no record has the package.
#[must_use]
pub fn precision_lookup<'a>(
    catalog: &'a [AppRecord],
    package: &str,
    version: Option<&str>,
    code: Option<i64>,
) -> Option<PrecisionMatch<'a>> {
    let mut candidates = catalog.iter().filter(|app| app.package == package).peekable();
    let first = *candidates.peek()?;

    if version.is_some() || code.is_some() {
        for record in candidates {
            let exact = resolved_versions(record).into_iter().find(|v| {
                version.map_or(true, |want| v.version == want)
                    && code.map_or(true, |want| v.code == want)
            });
            if let Some(found) = exact {
                return Some(PrecisionMatch {
                    record,
                    version: found,
                    exact: true,
                });
            }
        }
    }

    resolved_versions(first)
        .into_iter()
        .next()
        .map(|primary| PrecisionMatch {
            record: first,
            version: primary,
            exact: false,
        })
}

/// Records an entry points at as "similar apps", in display order.
#[must_use]
pub fn related_apps<'a>(catalog: &'a [AppRecord], app: &AppRecord) -> Vec<&'a AppRecord> {
    let by_id = |id: &AppId| catalog.iter().find(|candidate| &candidate.id == id);

    if let Some(id) = &app.recommend_id {
        return by_id(id).into_iter().collect();
    }

    if !app.recommend_ids.is_empty() {
        return app
            .recommend_ids
            .iter()
            .filter(|id| **id != app.id)
            .filter_map(by_id)
            .collect();
    }

    app.recommend_package
        .as_deref()
        .and_then(|package| {
            catalog
                .iter()
                .find(|candidate| candidate.package == package && candidate.id != app.id)
        })
        .into_iter()
        .collect()
}
