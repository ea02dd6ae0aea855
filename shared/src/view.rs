//! Projection of the model into what the shell renders.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogConfig, CategorySummary};
use crate::location::{DeveloperVariant, Location};
use crate::model::{
    AppId, AppRecord, CatalogStatus, Model, PlatformLevel, ResolvedVersion, ToastKind, ToastMessage,
};
use crate::resolver::{best_match, related_apps, resolved_versions};
use crate::router::{HistoryRow, Router, StackEvent, ViewContent, ViewEntry, ViewKind};
use crate::search::{search, suggestions, SearchOutcome};
use crate::settings::Theme;
use crate::{android_label, UserFacingError, ANDROID_RELEASES, SUGGESTION_LIMIT};

const NO_DESCRIPTION: &str = "No description yet";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastView {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl From<&ToastMessage> for ToastView {
    fn from(t: &ToastMessage) -> Self {
        Self {
            message: t.message.clone(),
            kind: t.kind,
            duration_ms: t.duration_ms,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformChoice {
    pub level: u32,
    pub label: String,
}

/// `"Android 11 (API 30)"`; `"Any"` for the unset level.
#[must_use]
pub fn level_label(level: u32) -> String {
    if level == 0 {
        "Any".to_string()
    } else {
        format!("Android {} (API {level})", android_label(level))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppCard {
    pub id: AppId,
    pub name: String,
    pub icon: String,
    pub developer: String,
    pub category: String,
    /// Version a tap would open; empty when nothing runs at this level.
    pub version: String,
    pub compatible: bool,
    pub fragment: String,
}

/// Where tapping a card goes. Packages shared by several records need the
/// exact build to land on the right one.
#[must_use]
pub fn card_location(catalog: &Catalog, app: &AppRecord, level: PlatformLevel) -> Location {
    let shared = catalog
        .records()
        .iter()
        .filter(|other| other.package == app.package)
        .nth(1)
        .is_some();
    match best_match(app, level) {
        Some(version) if shared => {
            Location::app_version(app.package.clone(), version.version, version.code)
        }
        _ => Location::app(app.package.clone()),
    }
}

#[must_use]
pub fn app_card(catalog: &Catalog, app: &AppRecord, level: PlatformLevel) -> AppCard {
    let best = best_match(app, level);
    AppCard {
        id: app.id.clone(),
        name: app.name.clone(),
        icon: app.icon.clone(),
        developer: app.developer_name().to_string(),
        category: app.category_name().to_string(),
        version: best.as_ref().map(ResolvedVersion::display_version).unwrap_or_default(),
        compatible: best.is_some(),
        fragment: card_location(catalog, app, level).to_fragment(),
    }
}

fn cards<'a>(
    catalog: &Catalog,
    apps: impl IntoIterator<Item = &'a AppRecord>,
    level: PlatformLevel,
) -> Vec<AppCard> {
    apps.into_iter().map(|app| app_card(catalog, app, level)).collect()
}

fn cards_by_id(catalog: &Catalog, ids: &[AppId], level: PlatformLevel) -> Vec<AppCard> {
    cards(catalog, ids.iter().filter_map(|id| catalog.by_id(id)), level)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncompatibleView {
    pub app: AppCard,
    pub required_level: u32,
    pub required_label: String,
    pub message: String,
}

fn incompatible_view(
    catalog: &Catalog,
    app: &AppRecord,
    required_level: u32,
    level: PlatformLevel,
) -> IncompatibleView {
    IncompatibleView {
        app: app_card(catalog, app, level),
        required_level,
        required_label: level_label(required_level),
        message: format!(
            "{} needs at least {}; your watch runs {}",
            app.name,
            level_label(required_level),
            level_label(level.get())
        ),
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeveloperLink {
    pub name: String,
    pub fragment: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub app: AppCard,
    pub reason: Option<String>,
    pub size: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppDetailView {
    pub id: AppId,
    pub name: String,
    pub icon: String,
    pub package: String,
    pub developer: DeveloperLink,
    pub modified_by: Option<DeveloperLink>,
    pub contributor: Option<String>,
    pub category: String,
    pub category_fragment: String,
    pub version: String,
    pub is_recommended: bool,
    pub size: String,
    pub min_platform: String,
    /// Set when the displayed build does not run at the current level.
    pub compat_warning: Option<String>,
    /// `None` when the build has no download link.
    pub download_url: Option<String>,
    pub password: Option<String>,
    pub description: String,
    pub screenshots: Vec<String>,
    pub phone_link: Option<String>,
    pub share_link: String,
    /// Present when the app has more than one build.
    pub history_fragment: Option<String>,
    pub related: Vec<Recommendation>,
}

fn detail_view(
    catalog: &Catalog,
    config: &CatalogConfig,
    app: &AppRecord,
    version: &ResolvedVersion,
    level: PlatformLevel,
) -> AppDetailView {
    let exact = Location::app_version(app.package.clone(), version.version.clone(), version.code);
    let developer = app.developer_name().to_string();
    let compat_warning = (!level.admits(version.min_sdk)).then(|| {
        format!(
            "This build needs {}; your watch runs {}",
            level_label(version.min_sdk),
            level_label(level.get())
        )
    });
    let history_fragment = (resolved_versions(app).len() > 1).then(|| {
        Location::History {
            package: app.package.clone(),
            app_id: Some(app.id.clone()),
        }
        .to_fragment()
    });
    let related = related_apps(catalog.records(), app)
        .into_iter()
        .map(|target| Recommendation {
            app: app_card(catalog, target, level),
            reason: app.recommend_reason.clone(),
            size: best_match(target, level)
                .map(|v| v.size)
                .filter(|size| !size.is_empty()),
        })
        .collect();

    AppDetailView {
        id: app.id.clone(),
        name: app.name.clone(),
        icon: app.icon.clone(),
        package: app.package.clone(),
        developer: DeveloperLink {
            fragment: Location::developer(developer.clone(), DeveloperVariant::Original).to_fragment(),
            name: developer,
        },
        modified_by: app.mod_author.as_ref().map(|author| DeveloperLink {
            name: author.clone(),
            fragment: Location::developer(author.clone(), DeveloperVariant::Modded).to_fragment(),
        }),
        contributor: app.contributor.clone(),
        category: app.category_name().to_string(),
        category_fragment: Location::category(app.category_name()).to_fragment(),
        version: version.display_version(),
        is_recommended: version.is_recommended,
        size: version.size.clone(),
        min_platform: level_label(version.min_sdk),
        compat_warning,
        download_url: Some(version.download_url.clone()).filter(|url| !url.trim().is_empty()),
        password: Some(version.password.clone()).filter(|p| !p.is_empty()),
        description: if app.description.trim().is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            app.description.clone()
        },
        screenshots: app.screenshots.clone(),
        phone_link: app.phone_link.clone(),
        share_link: config.share_link(&exact),
        history_fragment,
        related,
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryRowView {
    pub version: String,
    pub size: String,
    pub min_platform: String,
    pub is_recommended: bool,
    pub compatible: bool,
    pub fragment: String,
}

impl From<&HistoryRow> for HistoryRowView {
    fn from(row: &HistoryRow) -> Self {
        Self {
            version: row.version.display_version(),
            size: row.version.size.clone(),
            min_platform: level_label(row.version.min_sdk),
            is_recommended: row.version.is_recommended,
            compatible: row.compatible,
            fragment: row.location.to_fragment(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelBody {
    Menu { categories: Vec<CategorySummary> },
    AppDetail(Box<AppDetailView>),
    Incompatible(IncompatibleView),
    AppList { apps: Vec<AppCard> },
    History { rows: Vec<HistoryRowView> },
    /// The entry's record disappeared after a catalog reload.
    Missing,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PanelView {
    pub entry_id: u64,
    pub kind: ViewKind,
    pub layer: u32,
    pub title: String,
    pub fragment: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Panel {
    #[serde(flatten)]
    pub header: PanelView,
    pub body: PanelBody,
}

fn panel(position: usize, entry: &ViewEntry, model: &Model) -> Panel {
    let catalog = &model.catalog;
    let level = model.platform_level();
    let missing = |title: &str| (title.to_string(), PanelBody::Missing);

    let (title, body) = match &entry.content {
        ViewContent::Menu { categories } => (
            "Menu".to_string(),
            PanelBody::Menu {
                categories: categories.clone(),
            },
        ),
        ViewContent::AppDetail { app_id, version, .. } => match catalog.by_id(app_id) {
            Some(app) => (
                app.name.clone(),
                PanelBody::AppDetail(Box::new(detail_view(catalog, &model.config, app, version, level))),
            ),
            None => missing(app_id.as_str()),
        },
        ViewContent::Incompatible { app_id, required_level } => match catalog.by_id(app_id) {
            Some(app) => (
                app.name.clone(),
                PanelBody::Incompatible(incompatible_view(catalog, app, *required_level, level)),
            ),
            None => missing(app_id.as_str()),
        },
        ViewContent::AppList { title, apps } => (
            title.clone(),
            PanelBody::AppList {
                apps: cards_by_id(catalog, apps, level),
            },
        ),
        ViewContent::History { title, rows, .. } => (
            format!("{title} history"),
            PanelBody::History {
                rows: rows.iter().map(HistoryRowView::from).collect(),
            },
        ),
    };

    Panel {
        header: PanelView {
            entry_id: entry.entry_id,
            kind: entry.identity.kind(),
            layer: Router::layer_of(position),
            title,
            fragment: entry.location.to_fragment(),
        },
        body,
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchResults {
    Idle,
    Matches { apps: Vec<AppCard> },
    Incompatible(IncompatibleView),
    Empty { term: String },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchView {
    pub input: String,
    pub suggestions: Vec<AppCard>,
    pub results: SearchResults,
}

fn search_view(model: &Model) -> SearchView {
    let records = model.catalog.records();
    let level = model.platform_level();
    let input = model.search.input.trim();
    let submitted = model.search.submitted.as_deref();

    let suggestions = if input.is_empty() || submitted == Some(input) {
        Vec::new()
    } else {
        cards(&model.catalog, suggestions(records, input, level, SUGGESTION_LIMIT), level)
    };

    let results = match submitted {
        None => SearchResults::Idle,
        Some(term) => match search(records, term, level) {
            SearchOutcome::Compatible(apps) => SearchResults::Matches {
                apps: cards(&model.catalog, apps, level),
            },
            SearchOutcome::Incompatible { app, required_level } => {
                SearchResults::Incompatible(incompatible_view(&model.catalog, app, required_level, level))
            }
            SearchOutcome::Empty => SearchResults::Empty { term: term.to_string() },
        },
    };

    SearchView {
        input: model.search.input.clone(),
        suggestions,
        results,
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub theme: Theme,
    pub catalog_status: CatalogStatus,
    pub app_count: usize,
    /// Ask the user for their watch's platform level before anything else.
    pub needs_platform_level: bool,
    pub platform_level: u32,
    pub platform_label: String,
    pub platform_choices: Vec<PlatformChoice>,
    pub home: Vec<AppCard>,
    pub search: SearchView,
    /// Open views, bottom first.
    pub panels: Vec<Panel>,
    pub lifecycle: Vec<StackEvent>,
    pub error: Option<UserFacingError>,
    pub toast: Option<ToastView>,
}

#[must_use]
pub fn build(model: &Model) -> ViewModel {
    let level = model.platform_level();
    let panels = model
        .router
        .stack()
        .iter()
        .enumerate()
        .map(|(position, entry)| panel(position, entry, model))
        .collect();

    ViewModel {
        theme: model.settings.theme.resolve(model.system_dark),
        catalog_status: model.catalog_status,
        app_count: model.catalog.len(),
        needs_platform_level: model.needs_platform_level(),
        platform_level: level.get(),
        platform_label: level_label(level.get()),
        platform_choices: ANDROID_RELEASES
            .iter()
            .map(|(api, _)| PlatformChoice {
                level: *api,
                label: level_label(*api),
            })
            .collect(),
        home: cards_by_id(&model.catalog, model.router.home_feed().cached(), level),
        search: search_view(model),
        panels,
        lifecycle: model.router.lifecycle().to_vec(),
        error: model.active_error.as_ref().map(UserFacingError::from),
        toast: model.active_toast.as_ref().map(ToastView::from),
    }
}
