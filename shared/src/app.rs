use tracing::{debug, info, warn};

use crate::capabilities::http::request_catalog;
use crate::capabilities::kv::KvError;
use crate::capabilities::Capabilities;
use crate::catalog::{Catalog, CatalogError};
use crate::event::Event;
use crate::model::{AppId, CatalogStatus, Model, ToastKind};
use crate::router::{NavigationRequest, RouteContext, Router};
use crate::settings::{self, validate_platform_level, Setting, SettingsError};
use crate::view::{self, ViewModel};
use crate::AppError;

#[derive(Default)]
pub struct App;

impl App {
    /// Runs `f` against the router with a context borrowed from the rest of the model.
    fn with_router<T>(model: &mut Model, f: impl FnOnce(&mut Router, &RouteContext<'_>) -> T) -> T {
        let Model {
            router,
            catalog,
            config,
            settings,
            catalog_status,
            ..
        } = model;
        let ctx = RouteContext {
            catalog,
            config,
            level: settings.platform_level,
            catalog_ready: *catalog_status != CatalogStatus::Pending,
        };
        f(router, &ctx)
    }

    fn dispatch(requests: impl IntoIterator<Item = NavigationRequest>, caps: &Capabilities) {
        for request in requests {
            debug!(?request, "navigation request");
            match request {
                NavigationRequest::Push(location) => caps.navigation.push(&location),
                NavigationRequest::Replace(location) => caps.navigation.replace(&location),
                NavigationRequest::Back => caps.navigation.back(),
            }
        }
    }

    fn fetch_catalog(model: &mut Model, caps: &Capabilities) {
        match model.config.catalog_url() {
            Ok(url) => {
                info!(url = url.as_str(), "fetching catalog");
                model.catalog_status = CatalogStatus::Pending;
                request_catalog(&caps.http, &url);
            }
            Err(CatalogError::NotConfigured) => {
                warn!("no catalog base URL configured, starting with an empty catalog");
                Self::catalog_failed(model, caps, None);
            }
            Err(e) => {
                warn!(error = %e, "catalog URL rejected");
                Self::catalog_failed(model, caps, Some(e.into()));
            }
        }
    }

    fn catalog_failed(model: &mut Model, caps: &Capabilities, error: Option<AppError>) {
        model.catalog = Catalog::default();
        model.catalog_status = CatalogStatus::Failed;
        if let Some(error) = error {
            model.set_error(error);
        }
        let requests = Self::with_router(model, |router, ctx| router.catalog_arrived(ctx));
        Self::dispatch(requests, caps);
    }

    fn save_setting(model: &mut Model, caps: &Capabilities, setting: Setting) {
        if let Err(e) = settings::save(&caps.kv, &model.settings, setting) {
            warn!(setting = setting.name(), error = %e, "setting not saved");
            model.set_error(e.into());
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let event_name = event.name();
        if event.is_user_initiated() {
            info!(event = event_name, "user action");
        } else {
            debug!(event = event_name, "update");
        }

        match event {
            Event::Noop => {}

            Event::Configure(config) => {
                info!(
                    base_url = config.base_url.as_deref().unwrap_or_default(),
                    pinned = config.pinned_app_id.as_ref().map(AppId::as_str).unwrap_or_default(),
                    "configured"
                );
                model.config = config;
                Self::with_router(model, |router, ctx| router.reset_home_feed(ctx));
            }

            Event::AppStarted => {
                for setting in Setting::ALL {
                    if let Err(e) = settings::load(&caps.kv, setting) {
                        settings::log_failure(setting, &e);
                    }
                }
                Self::fetch_catalog(model, caps);
            }

            Event::CatalogResponse(Ok(records)) => {
                self.update(Event::CatalogLoaded(records), model, caps);
                return;
            }

            Event::CatalogResponse(Err(e)) => {
                warn!(error = %e, retryable = e.is_retryable(), "catalog fetch failed");
                Self::catalog_failed(model, caps, Some(e.into()));
            }

            Event::CatalogLoaded(records) => {
                model.catalog = Catalog::from_records(records);
                model.catalog_status = CatalogStatus::Loaded;
                info!(records = model.catalog.len(), "catalog loaded");
                let requests = Self::with_router(model, |router, ctx| router.catalog_arrived(ctx));
                Self::dispatch(requests, caps);
            }

            Event::RetryCatalog => {
                model.clear_error();
                Self::fetch_catalog(model, caps);
            }

            Event::SettingLoaded { setting, result } => {
                let applied = result
                    .map_err(|message| SettingsError::Storage(KvError::Storage { message }))
                    .and_then(|stored| model.settings.apply(setting, stored.as_deref()));
                if let Err(e) = applied {
                    settings::log_failure(setting, &e);
                }
                if setting == Setting::PlatformLevel {
                    model.settings_loaded = true;
                    info!(level = model.platform_level().get(), "platform level loaded");
                    Self::with_router(model, |router, ctx| router.refresh(ctx));
                }
            }

            Event::SettingSaved { setting, result } => match result {
                Ok(()) => debug!(setting = setting.name(), "setting saved"),
                Err(message) => {
                    let e = SettingsError::Storage(KvError::Storage { message });
                    warn!(setting = setting.name(), error = %e, "setting not saved");
                    model.set_error(e.into());
                }
            },

            Event::SystemThemeChanged { dark } => {
                model.system_dark = dark;
            }

            Event::ThemeToggled => {
                let effective = model.settings.theme.resolve(model.system_dark);
                model.settings.theme = effective.toggled().as_preference();
                info!(theme = ?model.settings.theme, "theme toggled");
                Self::save_setting(model, caps, Setting::Theme);
            }

            Event::PlatformLevelSelected(level) => match validate_platform_level(level) {
                Ok(level) => {
                    model.settings.platform_level = level;
                    info!(level = level.get(), "platform level selected");
                    Self::save_setting(model, caps, Setting::PlatformLevel);
                    Self::with_router(model, |router, ctx| router.refresh(ctx));
                }
                Err(e) => {
                    warn!(level, error = %e, "platform level rejected");
                    model.set_error(e.into());
                }
            },

            Event::LocationChanged(fragment) => {
                let rewrite = model.router.enqueue_fragment(&fragment);
                let requests = Self::with_router(model, |router, ctx| router.drain(ctx));
                Self::dispatch(rewrite.into_iter().chain(requests), caps);
            }

            Event::Navigate(location) => {
                if model.router.current() == &location {
                    debug!(%location, "already there");
                } else {
                    caps.navigation.push(&location);
                }
            }

            Event::CloseRequested => {
                if let Some(request) = model.router.close_request() {
                    Self::dispatch([request], caps);
                }
            }

            Event::SearchInputChanged(input) => {
                model.search.set_input(input);
            }

            Event::SearchSubmitted => match model.search.submit() {
                Some(term) => info!(term, "search submitted"),
                None => debug!("blank search cleared"),
            },

            Event::SearchCleared => {
                model.search.clear();
            }

            Event::ExternalActionCompleted { action, outcome } => match outcome {
                Ok(()) => {
                    if let Some(message) = action.success_message() {
                        model.show_toast(message, ToastKind::Success);
                    }
                }
                Err(reason) => {
                    warn!(action = action.name(), reason = %reason, "external action failed");
                    model.show_toast(action.failure_message(), ToastKind::Warning);
                }
            },

            Event::DismissError => model.clear_error(),

            Event::DismissToast => model.clear_toast(),
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        view::build(model)
    }
}
