//! The view stack and the state machine that keeps it in step with the
//! location fragment.
//!
//! Every location change goes through [`Router::enqueue`] and
//! [`Router::drain`]: changes are applied one at a time, in arrival order, and
//! each one leaves the stack in its final state before the next is looked at.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

use crate::catalog::{
    categories, category_apps, developer_apps, list_apps, Catalog, CatalogConfig,
    CategorySummary, HomeFeed,
};
use crate::location::{DeveloperVariant, ListKind, Location};
use crate::model::{AppId, AppRecord, PlatformLevel, ResolvedVersion};
use crate::resolver::{best_match, lowest_required_level, precision_lookup, resolved_versions};
use crate::{BASE_LAYER, LAYER_STEP};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Menu,
    AppDetail,
    CategoryList,
    DeveloperList,
    HistoryList,
}

/// `(kind, key)`: at most one open entry per identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StackIdentity {
    Menu,
    App {
        package: String,
        version: Option<String>,
        code: Option<i64>,
    },
    List {
        kind: ListKind,
    },
    Category {
        name: String,
    },
    Developer {
        name: String,
        variant: DeveloperVariant,
    },
    History {
        package: String,
    },
}

impl StackIdentity {
    /// `None` for [`Location::Home`], which is the empty stack rather than an entry.
    /// APP descriptors are keyed as written here; open entries carry the key
    /// from [`StackIdentity::resolved`] instead.
    #[must_use]
    pub fn of(location: &Location) -> Option<Self> {
        Some(match location {
            Location::Home => return None,
            Location::Menu => Self::Menu,
            Location::App {
                package,
                version,
                code,
            } => Self::App {
                package: package.clone(),
                version: version.clone(),
                code: *code,
            },
            Location::List { kind } => Self::List { kind: *kind },
            Location::Category { name } => Self::Category { name: name.clone() },
            Location::Developer { name, variant } => Self::Developer {
                name: name.clone(),
                variant: *variant,
            },
            Location::History { package, .. } => Self::History {
                package: package.clone(),
            },
        })
    }

    /// Identity of an entry built as `content`. An APP entry is keyed by the
    /// build it shows, so every descriptor resolving to that build shares it.
    #[must_use]
    pub fn resolved(location: &Location, content: &ViewContent) -> Option<Self> {
        match (location, content) {
            (Location::App { package, .. }, ViewContent::AppDetail { version, .. }) => {
                Some(Self::App {
                    package: package.clone(),
                    version: Some(version.version.clone()),
                    code: Some(version.code),
                })
            }
            (Location::App { package, .. }, ViewContent::Incompatible { .. }) => Some(Self::App {
                package: package.clone(),
                version: None,
                code: None,
            }),
            _ => Self::of(location),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ViewKind {
        match self {
            Self::Menu => ViewKind::Menu,
            Self::App { .. } => ViewKind::AppDetail,
            Self::List { .. } | Self::Category { .. } => ViewKind::CategoryList,
            Self::Developer { .. } => ViewKind::DeveloperList,
            Self::History { .. } => ViewKind::HistoryList,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub version: ResolvedVersion,
    pub compatible: bool,
    /// Opens exactly this build.
    pub location: Location,
}

/// What an entry shows. Built once on push; rebuilt only when the catalog or
/// the platform level changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewContent {
    Menu {
        categories: Vec<CategorySummary>,
    },
    AppDetail {
        app_id: AppId,
        version: ResolvedVersion,
        /// The location named this exact build and it was found.
        pinned: bool,
    },
    Incompatible {
        app_id: AppId,
        required_level: u32,
    },
    AppList {
        title: String,
        apps: Vec<AppId>,
    },
    History {
        app_id: AppId,
        title: String,
        rows: Vec<HistoryRow>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEntry {
    pub entry_id: u64,
    pub identity: StackIdentity,
    pub location: Location,
    /// Location that was current when this entry was pushed.
    pub opened_from: Option<Location>,
    pub content: ViewContent,
}

/// Lifecycle notifications the renderer must honour, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StackEvent {
    Pushed { entry_id: u64 },
    /// An existing entry became the top again; its content was not rebuilt.
    Revealed { entry_id: u64 },
    Disposed { entry_id: u64 },
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Pushed,
    Reused,
    Cleared,
    /// The catalog has not arrived yet; the location is replayed once it does.
    Deferred,
    /// The location named nothing in the catalog; the stack went home instead.
    Redirected,
}

/// A location change the router wants the shell to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationRequest {
    Push(Location),
    Replace(Location),
    Back,
}

/// Read-only inputs a transition needs.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    pub catalog: &'a Catalog,
    pub config: &'a CatalogConfig,
    pub level: PlatformLevel,
    /// `false` while the catalog fetch is still outstanding.
    pub catalog_ready: bool,
}

#[derive(Debug)]
pub struct Router {
    stack: Vec<ViewEntry>,
    current: Location,
    /// Location that was current before `current`.
    previous: Option<Location>,
    seen_location: bool,
    queue: VecDeque<Location>,
    deferred: Option<Location>,
    next_entry_id: u64,
    lifecycle: Vec<StackEvent>,
    home_feed: HomeFeed,
    rng: StdRng,
}

impl Default for Router {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Router {
    /// Deterministic home-feed shuffles, for tests.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            stack: Vec::new(),
            current: Location::Home,
            previous: None,
            seen_location: false,
            queue: VecDeque::new(),
            deferred: None,
            next_entry_id: 1,
            lifecycle: Vec::new(),
            home_feed: HomeFeed::default(),
            rng,
        }
    }

    #[must_use]
    pub fn stack(&self) -> &[ViewEntry] {
        &self.stack
    }

    #[must_use]
    pub fn top(&self) -> Option<&ViewEntry> {
        self.stack.last()
    }

    #[must_use]
    pub fn current(&self) -> &Location {
        &self.current
    }

    #[must_use]
    pub fn is_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    /// Lifecycle events produced by the most recent drain.
    #[must_use]
    pub fn lifecycle(&self) -> &[StackEvent] {
        &self.lifecycle
    }

    #[must_use]
    pub fn home_feed(&self) -> &HomeFeed {
        &self.home_feed
    }

    /// Visual layer of the entry at `position` (0 = bottom).
    #[must_use]
    pub fn layer_of(position: usize) -> u32 {
        let step = u32::try_from(position.saturating_add(1)).unwrap_or(u32::MAX);
        BASE_LAYER.saturating_add(LAYER_STEP.saturating_mul(step))
    }

    /// Queues a fragment reported by the shell. Unparseable fragments queue
    /// HOME and ask the shell to rewrite the fragment.
    pub fn enqueue_fragment(&mut self, fragment: &str) -> Option<NavigationRequest> {
        match Location::parse(fragment) {
            Ok(location) => {
                self.enqueue(location);
                None
            }
            Err(error) => {
                warn!(fragment, %error, "malformed location, going home");
                self.enqueue(Location::Home);
                Some(NavigationRequest::Replace(Location::Home))
            }
        }
    }

    pub fn enqueue(&mut self, location: Location) {
        self.queue.push_back(location);
    }

    /// Applies every queued location in arrival order.
    pub fn drain(&mut self, ctx: &RouteContext<'_>) -> Vec<NavigationRequest> {
        self.lifecycle.clear();
        let mut requests = Vec::new();
        while let Some(target) = self.queue.pop_front() {
            if self.transition(target, ctx) == TransitionOutcome::Redirected {
                requests.push(NavigationRequest::Replace(Location::Home));
            }
        }
        self.ensure_home_feed(ctx);
        requests
    }

    /// Moves the stack to `target`. Callers outside tests go through
    /// [`Router::enqueue`] and [`Router::drain`].
    pub fn transition(&mut self, target: Location, ctx: &RouteContext<'_>) -> TransitionOutcome {
        let previous = std::mem::replace(&mut self.current, target.clone());
        let changed = self.seen_location && previous != target;
        let opened_from = changed.then(|| previous.clone());
        if changed {
            self.previous = Some(previous);
        }
        self.seen_location = true;

        let Some(identity) = StackIdentity::of(&target) else {
            self.clear();
            info!(outcome = "cleared", "location home");
            return TransitionOutcome::Cleared;
        };

        if !ctx.catalog_ready && needs_catalog(&target) {
            debug!(location = %target, "catalog pending, deferring");
            self.deferred = Some(target);
            return TransitionOutcome::Deferred;
        }

        let mut content = None;
        let identity = if matches!(target, Location::App { .. }) {
            let Some(built) = build_content(&target, ctx) else {
                return self.redirect_home(&target);
            };
            let resolved = StackIdentity::resolved(&target, &built).unwrap_or(identity);
            content = Some(built);
            resolved
        } else {
            identity
        };

        if let Some(position) = self.stack.iter().position(|e| e.identity == identity) {
            self.deferred = None;
            self.truncate_above(position);
            let entry_id = self.stack[position].entry_id;
            self.lifecycle.push(StackEvent::Revealed { entry_id });
            info!(location = %target, outcome = "reused", depth = self.stack.len(), "location changed");
            return TransitionOutcome::Reused;
        }
        self.deferred = None;

        let Some(content) = content.or_else(|| build_content(&target, ctx)) else {
            return self.redirect_home(&target);
        };

        let entry_id = self.next_entry_id;
        self.next_entry_id += 1;
        self.stack.push(ViewEntry {
            entry_id,
            identity,
            location: target,
            opened_from,
            content,
        });
        self.lifecycle.push(StackEvent::Pushed { entry_id });
        info!(
            location = %self.current,
            outcome = "pushed",
            depth = self.stack.len(),
            "location changed"
        );
        TransitionOutcome::Pushed
    }

    /// How to close the top entry. `Back` only when the shell's previous
    /// history entry is the opener, which holds when the location seen just
    /// before this one is the opener. Otherwise the opener (or HOME for deep
    /// links) replaces the fragment. `None` on an empty stack.
    #[must_use]
    pub fn close_request(&self) -> Option<NavigationRequest> {
        let top = self.stack.last()?;
        Some(match &top.opened_from {
            Some(opener) if self.previous.as_ref() == Some(opener) => NavigationRequest::Back,
            Some(opener) => NavigationRequest::Replace(opener.clone()),
            None => NavigationRequest::Replace(Location::Home),
        })
    }

    /// Rebuilds every open entry's content in place after the catalog or the
    /// platform level changed. Entry ids are kept; APP entries are re-keyed to
    /// the build they now show.
    pub fn refresh(&mut self, ctx: &RouteContext<'_>) {
        for entry in &mut self.stack {
            match build_content(&entry.location, ctx) {
                Some(content) => {
                    if let Some(identity) = StackIdentity::resolved(&entry.location, &content) {
                        entry.identity = identity;
                    }
                    entry.content = content;
                }
                None => debug!(location = %entry.location, "entry no longer resolves, keeping content"),
            }
        }
        self.ensure_home_feed(ctx);
    }

    /// Called once the catalog fetch has finished, successfully or not.
    pub fn catalog_arrived(&mut self, ctx: &RouteContext<'_>) -> Vec<NavigationRequest> {
        self.reset_home_feed(ctx);
        if let Some(location) = self.deferred.take() {
            self.enqueue(location);
        }
        self.drain(ctx)
    }

    /// Drops the cached home feed and rebuilds everything from `ctx`.
    pub fn reset_home_feed(&mut self, ctx: &RouteContext<'_>) {
        self.home_feed.invalidate();
        self.refresh(ctx);
    }

    pub fn ensure_home_feed(&mut self, ctx: &RouteContext<'_>) {
        if !ctx.catalog_ready {
            return;
        }
        let _ = self.home_feed.ids(
            ctx.catalog.records(),
            ctx.level,
            ctx.config.pinned_app_id.as_ref(),
            ctx.config.home_page_size,
            &mut self.rng,
        );
    }

    fn redirect_home(&mut self, target: &Location) -> TransitionOutcome {
        warn!(location = %target, "location names nothing in the catalog, going home");
        self.current = Location::Home;
        self.clear();
        TransitionOutcome::Redirected
    }

    fn truncate_above(&mut self, position: usize) {
        while self.stack.len() > position + 1 {
            if let Some(entry) = self.stack.pop() {
                self.lifecycle.push(StackEvent::Disposed {
                    entry_id: entry.entry_id,
                });
            }
        }
    }

    fn clear(&mut self) {
        self.deferred = None;
        while let Some(entry) = self.stack.pop() {
            self.lifecycle.push(StackEvent::Disposed {
                entry_id: entry.entry_id,
            });
        }
        self.lifecycle.push(StackEvent::Cleared);
    }
}

fn needs_catalog(location: &Location) -> bool {
    matches!(location, Location::App { .. } | Location::History { .. })
}

fn app_content(record: &AppRecord, level: PlatformLevel) -> ViewContent {
    match best_match(record, level) {
        Some(version) => ViewContent::AppDetail {
            app_id: record.id.clone(),
            version,
            pinned: false,
        },
        None => ViewContent::Incompatible {
            app_id: record.id.clone(),
            required_level: lowest_required_level(record),
        },
    }
}

fn id_list<'a>(apps: impl IntoIterator<Item = &'a AppRecord>) -> Vec<AppId> {
    apps.into_iter().map(|app| app.id.clone()).collect()
}

fn build_content(location: &Location, ctx: &RouteContext<'_>) -> Option<ViewContent> {
    let records = ctx.catalog.records();
    let content = match location {
        Location::Home => return None,
        Location::Menu => ViewContent::Menu {
            categories: categories(records, ctx.level),
        },
        Location::App {
            package,
            version,
            code,
        } => {
            if version.is_none() && code.is_none() {
                app_content(ctx.catalog.by_package(package)?, ctx.level)
            } else {
                let found = precision_lookup(records, package, version.as_deref(), *code)?;
                if found.exact {
                    ViewContent::AppDetail {
                        app_id: found.record.id.clone(),
                        version: found.version,
                        pinned: true,
                    }
                } else {
                    app_content(found.record, ctx.level)
                }
            }
        }
        Location::List { kind } => ViewContent::AppList {
            title: kind.title().to_string(),
            apps: id_list(list_apps(records, *kind, ctx.level, ctx.config.list_page_size)),
        },
        Location::Category { name } => ViewContent::AppList {
            title: name.clone(),
            apps: id_list(category_apps(records, name, ctx.level)),
        },
        Location::Developer { name, variant } => ViewContent::AppList {
            title: name.clone(),
            apps: id_list(developer_apps(records, name, *variant)),
        },
        Location::History { package, app_id } => {
            let record = app_id
                .as_ref()
                .and_then(|id| ctx.catalog.by_id(id))
                .filter(|record| &record.package == package)
                .or_else(|| ctx.catalog.by_package(package))?;
            let rows = resolved_versions(record)
                .into_iter()
                .map(|version| HistoryRow {
                    compatible: ctx.level.admits(version.min_sdk),
                    location: Location::app_version(
                        record.package.clone(),
                        version.version.clone(),
                        version.code,
                    ),
                    version,
                })
                .collect();
            ViewContent::History {
                app_id: record.id.clone(),
                title: record.name.clone(),
                rows,
            }
        }
    };
    Some(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VersionVariant;

    fn record(id: &str, package: &str, category: &str, min_sdk: u32, code: i64) -> AppRecord {
        AppRecord {
            id: AppId::new(id),
            package: package.into(),
            name: id.to_uppercase(),
            category: Some(category.into()),
            developer: Some("Jane".into()),
            version: format!("{code}.0"),
            code,
            min_sdk,
            ..AppRecord::default()
        }
    }

    fn catalog() -> Catalog {
        let mut timer = record("timer", "com.example.timer", "Games", 24, 5);
        timer.history_version.push(VersionVariant {
            version: Some("3.0".into()),
            code: Some(3),
            min_sdk: Some(21),
            ..VersionVariant::default()
        });
        Catalog::from_records(vec![
            timer,
            record("chess", "com.example.chess", "Games", 21, 2),
            record("notes", "com.example.notes", "Tools", 30, 9),
        ])
    }

    struct Fixture {
        catalog: Catalog,
        config: CatalogConfig,
        level: PlatformLevel,
        ready: bool,
    }

    impl Fixture {
        fn new(level: u32) -> Self {
            Self {
                catalog: catalog(),
                config: CatalogConfig::default(),
                level: PlatformLevel::new(level),
                ready: true,
            }
        }

        fn ctx(&self) -> RouteContext<'_> {
            RouteContext {
                catalog: &self.catalog,
                config: &self.config,
                level: self.level,
                catalog_ready: self.ready,
            }
        }
    }

    fn go(router: &mut Router, fixture: &Fixture, location: Location) -> Vec<NavigationRequest> {
        router.enqueue(location);
        router.drain(&fixture.ctx())
    }

    fn identities(router: &Router) -> Vec<StackIdentity> {
        router.stack().iter().map(|e| e.identity.clone()).collect()
    }

    mod identity_tests {
        use super::*;

        #[test]
        fn test_home_has_no_identity() {
            assert_eq!(StackIdentity::of(&Location::Home), None);
        }

        #[test]
        fn test_kinds() {
            let list = StackIdentity::of(&Location::List { kind: ListKind::Newest }).unwrap();
            assert_eq!(list.kind(), ViewKind::CategoryList);
            let history = StackIdentity::of(&Location::History {
                package: "p".into(),
                app_id: Some(AppId::new("1")),
            })
            .unwrap();
            assert_eq!(history, StackIdentity::History { package: "p".into() });
            assert_eq!(history.kind(), ViewKind::HistoryList);
        }

        #[test]
        fn test_app_identity_is_the_resolved_build() {
            let fixture = Fixture::new(22);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::app("com.example.timer"));

            assert_eq!(
                identities(&router),
                vec![StackIdentity::App {
                    package: "com.example.timer".into(),
                    version: Some("3.0".into()),
                    code: Some(3),
                }]
            );
        }

        #[test]
        fn test_incompatible_app_is_keyed_by_package() {
            let fixture = Fixture::new(18);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::app("com.example.timer"));
            go(&mut router, &fixture, Location::app_version("com.example.timer", "0.1", 1));

            assert_eq!(router.stack().len(), 1);
            assert_eq!(
                router.top().unwrap().identity,
                StackIdentity::App {
                    package: "com.example.timer".into(),
                    version: None,
                    code: None,
                }
            );
        }
    }

    mod transition_tests {
        use super::*;

        #[test]
        fn test_push_assigns_increasing_layers() {
            let fixture = Fixture::new(25);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::Menu);
            go(&mut router, &fixture, Location::category("Games"));

            assert_eq!(router.stack().len(), 2);
            assert_eq!(Router::layer_of(0), 1310);
            assert_eq!(Router::layer_of(1), 1320);
            assert_eq!(router.lifecycle(), [StackEvent::Pushed { entry_id: 2 }]);
        }

        #[test]
        fn test_same_location_twice_is_a_no_op() {
            let fixture = Fixture::new(25);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::Menu);
            go(&mut router, &fixture, Location::app("com.example.timer"));
            let before = router.stack().to_vec();

            go(&mut router, &fixture, Location::app("com.example.timer"));

            assert_eq!(router.stack(), before.as_slice());
            assert!(router
                .lifecycle()
                .iter()
                .all(|e| !matches!(e, StackEvent::Pushed { .. } | StackEvent::Disposed { .. })));
        }

        #[test]
        fn test_revisiting_lower_entry_truncates() {
            let fixture = Fixture::new(25);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::Menu);
            go(&mut router, &fixture, Location::category("Games"));
            let category_id = router.top().unwrap().entry_id;
            go(&mut router, &fixture, Location::app("com.example.chess"));
            let app_id = router.top().unwrap().entry_id;

            go(&mut router, &fixture, Location::category("Games"));

            assert_eq!(
                identities(&router),
                vec![
                    StackIdentity::Menu,
                    StackIdentity::Category { name: "Games".into() }
                ]
            );
            assert_eq!(router.top().unwrap().entry_id, category_id);
            assert_eq!(
                router.lifecycle(),
                [
                    StackEvent::Disposed { entry_id: app_id },
                    StackEvent::Revealed { entry_id: category_id }
                ]
            );
        }

        #[test]
        fn test_descriptors_for_the_same_build_share_an_entry() {
            let fixture = Fixture::new(30);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::app("com.example.timer"));
            let detail_id = router.top().unwrap().entry_id;
            go(
                &mut router,
                &fixture,
                Location::History {
                    package: "com.example.timer".into(),
                    app_id: None,
                },
            );

            let outcome = router.transition(
                Location::app_version("com.example.timer", "5.0", 5),
                &fixture.ctx(),
            );

            assert_eq!(outcome, TransitionOutcome::Reused);
            assert_eq!(router.stack().len(), 1);
            assert_eq!(router.top().unwrap().entry_id, detail_id);
        }

        #[test]
        fn test_other_build_of_open_app_is_pushed() {
            let fixture = Fixture::new(30);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::app("com.example.timer"));
            go(&mut router, &fixture, Location::app_version("com.example.timer", "3.0", 3));

            assert_eq!(router.stack().len(), 2);
        }

        #[test]
        fn test_home_clears_everything() {
            let fixture = Fixture::new(25);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::Menu);
            go(&mut router, &fixture, Location::category("Tools"));

            go(&mut router, &fixture, Location::Home);

            assert!(router.stack().is_empty());
            assert_eq!(
                router.lifecycle(),
                [
                    StackEvent::Disposed { entry_id: 2 },
                    StackEvent::Disposed { entry_id: 1 },
                    StackEvent::Cleared
                ]
            );
        }

        #[test]
        fn test_queue_applies_in_arrival_order() {
            let fixture = Fixture::new(25);
            let mut router = Router::with_seed(1);
            router.enqueue(Location::Menu);
            router.enqueue(Location::category("Games"));
            router.enqueue(Location::app("com.example.timer"));
            router.enqueue(Location::category("Games"));
            router.drain(&fixture.ctx());

            assert_eq!(router.stack().len(), 2);
            assert_eq!(router.current(), &Location::category("Games"));
        }

        #[test]
        fn test_malformed_fragment_goes_home() {
            let fixture = Fixture::new(25);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::Menu);

            let request = router.enqueue_fragment("#bogus=1");
            router.drain(&fixture.ctx());

            assert_eq!(request, Some(NavigationRequest::Replace(Location::Home)));
            assert!(router.stack().is_empty());
            assert_eq!(router.current(), &Location::Home);
        }

        #[test]
        fn test_unknown_package_redirects_home() {
            let fixture = Fixture::new(25);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::Menu);

            let requests = go(&mut router, &fixture, Location::app("com.example.gone"));

            assert_eq!(requests, vec![NavigationRequest::Replace(Location::Home)]);
            assert!(router.stack().is_empty());
            assert_eq!(router.current(), &Location::Home);
        }
    }

    mod content_tests {
        use super::*;

        #[test]
        fn test_app_resolves_best_match() {
            let fixture = Fixture::new(22);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::app("com.example.timer"));

            match &router.top().unwrap().content {
                ViewContent::AppDetail { version, pinned, .. } => {
                    assert_eq!(version.code, 3);
                    assert!(!pinned);
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn test_app_without_compatible_version() {
            let fixture = Fixture::new(18);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::app("com.example.timer"));

            assert_eq!(
                router.top().unwrap().content,
                ViewContent::Incompatible {
                    app_id: AppId::new("timer"),
                    required_level: 21,
                }
            );
        }

        #[test]
        fn test_exact_version_is_pinned() {
            let fixture = Fixture::new(30);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::app_version("com.example.timer", "3.0", 3));

            match &router.top().unwrap().content {
                ViewContent::AppDetail { version, pinned, .. } => {
                    assert_eq!(version.code, 3);
                    assert!(pinned);
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn test_missing_exact_version_falls_back_to_best_match() {
            let fixture = Fixture::new(30);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::app_version("com.example.timer", "0.1", 1));

            match &router.top().unwrap().content {
                ViewContent::AppDetail { version, pinned, .. } => {
                    assert_eq!(version.code, 5);
                    assert!(!pinned);
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn test_category_filters_by_level() {
            let fixture = Fixture::new(22);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::category("Games"));

            assert_eq!(
                router.top().unwrap().content,
                ViewContent::AppList {
                    title: "Games".into(),
                    apps: vec![AppId::new("timer"), AppId::new("chess")],
                }
            );
        }

        #[test]
        fn test_history_rows() {
            let fixture = Fixture::new(22);
            let mut router = Router::with_seed(1);
            go(
                &mut router,
                &fixture,
                Location::History {
                    package: "com.example.timer".into(),
                    app_id: None,
                },
            );

            let ViewContent::History { rows, title, .. } = &router.top().unwrap().content else {
                panic!("expected history");
            };
            assert_eq!(title, "TIMER");
            assert_eq!(rows.len(), 2);
            assert!(!rows[0].compatible);
            assert!(rows[1].compatible);
            assert_eq!(rows[1].location, Location::app_version("com.example.timer", "3.0", 3));
        }

        #[test]
        fn test_menu_lists_categories() {
            let fixture = Fixture::new(25);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::Menu);

            let ViewContent::Menu { categories } = &router.top().unwrap().content else {
                panic!("expected menu");
            };
            let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(names, vec!["Games", "Tools"]);
        }

        #[test]
        fn test_refresh_keeps_identity() {
            let mut fixture = Fixture::new(22);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::category("Tools"));
            let entry_id = router.top().unwrap().entry_id;

            fixture.level = PlatformLevel::new(33);
            router.refresh(&fixture.ctx());

            let top = router.top().unwrap();
            assert_eq!(top.entry_id, entry_id);
            assert_eq!(
                top.content,
                ViewContent::AppList {
                    title: "Tools".into(),
                    apps: vec![AppId::new("notes")],
                }
            );
        }
    }

    mod close_tests {
        use super::*;

        #[test]
        fn test_close_goes_back_to_opener() {
            let fixture = Fixture::new(25);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::Home);
            go(&mut router, &fixture, Location::Menu);

            assert_eq!(router.top().unwrap().opened_from, Some(Location::Home));
            assert_eq!(router.close_request(), Some(NavigationRequest::Back));
        }

        #[test]
        fn test_close_deep_link_replaces_home() {
            let fixture = Fixture::new(25);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::app("com.example.chess"));

            assert_eq!(router.top().unwrap().opened_from, None);
            assert_eq!(
                router.close_request(),
                Some(NavigationRequest::Replace(Location::Home))
            );
        }

        #[test]
        fn test_close_after_revisit_replaces_with_opener() {
            let fixture = Fixture::new(25);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::Home);
            go(&mut router, &fixture, Location::Menu);
            go(&mut router, &fixture, Location::category("Games"));
            go(&mut router, &fixture, Location::app("com.example.timer"));
            go(&mut router, &fixture, Location::category("Games"));

            assert_eq!(router.top().unwrap().opened_from, Some(Location::Menu));
            assert_eq!(
                router.close_request(),
                Some(NavigationRequest::Replace(Location::Menu))
            );

            go(&mut router, &fixture, Location::Menu);
            assert_eq!(identities(&router), vec![StackIdentity::Menu]);
        }

        #[test]
        fn test_close_after_back_replaces_with_opener() {
            let fixture = Fixture::new(25);
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::Home);
            go(&mut router, &fixture, Location::Menu);
            go(&mut router, &fixture, Location::category("Games"));
            go(&mut router, &fixture, Location::Menu);

            assert_eq!(
                router.close_request(),
                Some(NavigationRequest::Replace(Location::Home))
            );
        }

        #[test]
        fn test_close_on_empty_stack() {
            assert_eq!(Router::with_seed(1).close_request(), None);
        }
    }

    mod deferral_tests {
        use super::*;

        #[test]
        fn test_deep_link_waits_for_catalog() {
            let mut fixture = Fixture::new(25);
            fixture.ready = false;
            let mut router = Router::with_seed(1);

            go(&mut router, &fixture, Location::app("com.example.chess"));
            assert!(router.stack().is_empty());
            assert!(router.is_deferred());

            fixture.ready = true;
            let requests = router.catalog_arrived(&fixture.ctx());

            assert!(requests.is_empty());
            assert!(!router.is_deferred());
            assert_eq!(
                identities(&router),
                vec![StackIdentity::App {
                    package: "com.example.chess".into(),
                    version: Some("2.0".into()),
                    code: Some(2),
                }]
            );
            assert_eq!(router.top().unwrap().opened_from, None);
        }

        #[test]
        fn test_home_cancels_deferred_link() {
            let mut fixture = Fixture::new(25);
            fixture.ready = false;
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::app("com.example.chess"));
            go(&mut router, &fixture, Location::Home);

            fixture.ready = true;
            router.catalog_arrived(&fixture.ctx());
            assert!(router.stack().is_empty());
        }

        #[test]
        fn test_lists_open_before_catalog_and_refresh() {
            let mut fixture = Fixture::new(25);
            fixture.ready = false;
            fixture.catalog = Catalog::default();
            let mut router = Router::with_seed(1);
            go(&mut router, &fixture, Location::category("Games"));
            assert_eq!(router.stack().len(), 1);

            fixture.ready = true;
            fixture.catalog = catalog();
            router.catalog_arrived(&fixture.ctx());

            let ViewContent::AppList { apps, .. } = &router.top().unwrap().content else {
                panic!("expected list");
            };
            assert_eq!(apps.len(), 2);
        }
    }

    mod home_feed_tests {
        use super::*;

        #[test]
        fn test_feed_stable_until_level_changes() {
            let mut fixture = Fixture::new(25);
            let mut router = Router::with_seed(9);
            go(&mut router, &fixture, Location::Home);
            let first = router.home_feed().cached().to_vec();
            go(&mut router, &fixture, Location::Menu);
            go(&mut router, &fixture, Location::Home);
            assert_eq!(router.home_feed().cached(), first.as_slice());

            fixture.level = PlatformLevel::new(33);
            router.refresh(&fixture.ctx());
            assert!(router.home_feed().is_cached_for(PlatformLevel::new(33)));
            assert_eq!(router.home_feed().cached().len(), 3);
        }

        #[test]
        fn test_no_feed_before_catalog() {
            let mut fixture = Fixture::new(25);
            fixture.ready = false;
            let mut router = Router::with_seed(9);
            go(&mut router, &fixture, Location::Home);
            assert!(router.home_feed().cached().is_empty());
        }
    }
}
