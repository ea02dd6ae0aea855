//! Location descriptors: the URL fragment that says which views are open.
//!
//! Grammar (leading `#` optional, values form-urlencoded):
//!
//! ```text
//! ""                              home
//! menu                            navigation menu
//! app=<pkg>[&v=<ver>][&c=<code>]  app detail
//! list=newest|updated|all         time-ordered / full listing
//! category=<name>                 category listing
//! dev=<name>[&type=mod]           developer listing
//! history=<pkg>[&id=<appId>]      version history
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::form_urlencoded;

use crate::model::AppId;
use crate::{AppError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Newest,
    RecentlyUpdated,
    All,
}

impl ListKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::RecentlyUpdated => "updated",
            Self::All => "all",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Newest => "New arrivals",
            Self::RecentlyUpdated => "Recently updated",
            Self::All => "All apps",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "newest" | "new" => Some(Self::Newest),
            "updated" | "recent" | "recently_updated" => Some(Self::RecentlyUpdated),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeveloperVariant {
    #[default]
    Original,
    Modded,
}

impl DeveloperVariant {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Modded => "mod",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "original" => Some(Self::Original),
            "mod" | "modded" => Some(Self::Modded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    #[default]
    Home,
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
        app_id: Option<AppId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("unknown location kind '{0}'")]
    UnknownKind(String),
    #[error("location '{kind}' requires a value")]
    MissingValue { kind: &'static str },
    #[error("invalid version code '{0}'")]
    InvalidCode(String),
    #[error("unknown list '{0}'")]
    UnknownList(String),
    #[error("unknown developer variant '{0}'")]
    UnknownVariant(String),
}

impl From<LocationError> for AppError {
    fn from(e: LocationError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

impl Location {
    #[must_use]
    pub fn app(package: impl Into<String>) -> Self {
        Self::App {
            package: package.into(),
            version: None,
            code: None,
        }
    }

    #[must_use]
    pub fn app_version(package: impl Into<String>, version: impl Into<String>, code: i64) -> Self {
        Self::App {
            package: package.into(),
            version: Some(version.into()),
            code: Some(code),
        }
    }

    #[must_use]
    pub fn category(name: impl Into<String>) -> Self {
        Self::Category { name: name.into() }
    }

    #[must_use]
    pub fn developer(name: impl Into<String>, variant: DeveloperVariant) -> Self {
        Self::Developer {
            name: name.into(),
            variant,
        }
    }

    #[must_use]
    pub const fn is_home(&self) -> bool {
        matches!(self, Self::Home)
    }

    /// Parses a fragment. `#`, blank input and `home` all mean [`Location::Home`].
    pub fn parse(fragment: &str) -> Result<Self, LocationError> {
        let fragment = fragment.trim();
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment).trim();
        if fragment.is_empty() {
            return Ok(Self::Home);
        }

        let mut pairs: Vec<(String, String)> = form_urlencoded::parse(fragment.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.trim().to_string()))
            .collect();
        if pairs.is_empty() {
            return Ok(Self::Home);
        }
        let (kind, value) = pairs.remove(0);
        let param = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .filter(|v| !v.is_empty())
        };

        let required = |kind: &'static str| {
            if value.is_empty() {
                Err(LocationError::MissingValue { kind })
            } else {
                Ok(value.clone())
            }
        };

        match kind.as_str() {
            "home" => Ok(Self::Home),
            "menu" => Ok(Self::Menu),
            "app" => {
                let package = required("app")?;
                let code = match param("c") {
                    Some(raw) => Some(
                        raw.parse::<i64>()
                            .map_err(|_| LocationError::InvalidCode(raw.clone()))?,
                    ),
                    None => None,
                };
                Ok(Self::App {
                    package,
                    version: param("v"),
                    code,
                })
            }
            "list" => {
                let raw = required("list")?;
                ListKind::parse(&raw)
                    .map(|kind| Self::List { kind })
                    .ok_or(LocationError::UnknownList(raw))
            }
            "category" => Ok(Self::Category {
                name: required("category")?,
            }),
            "dev" => {
                let name = required("dev")?;
                let raw_variant = param("type").unwrap_or_default();
                let variant = DeveloperVariant::parse(&raw_variant)
                    .ok_or(LocationError::UnknownVariant(raw_variant))?;
                Ok(Self::Developer { name, variant })
            }
            "history" => Ok(Self::History {
                package: required("history")?,
                app_id: param("id").map(AppId),
            }),
            other => Err(LocationError::UnknownKind(other.to_string())),
        }
    }

    /// Fragment text without the leading `#`; [`Location::parse`] reads it back.
    #[must_use]
    pub fn to_fragment(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        match self {
            Self::Home => return String::new(),
            Self::Menu => return "menu".to_string(),
            Self::App {
                package,
                version,
                code,
            } => {
                out.append_pair("app", package);
                if let Some(version) = version {
                    out.append_pair("v", version);
                }
                if let Some(code) = code {
                    out.append_pair("c", &code.to_string());
                }
            }
            Self::List { kind } => {
                out.append_pair("list", kind.as_str());
            }
            Self::Category { name } => {
                out.append_pair("category", name);
            }
            Self::Developer { name, variant } => {
                out.append_pair("dev", name);
                if *variant == DeveloperVariant::Modded {
                    out.append_pair("type", variant.as_str());
                }
            }
            Self::History { package, app_id } => {
                out.append_pair("history", package);
                if let Some(id) = app_id {
                    out.append_pair("id", id.as_str());
                }
            }
        }
        out.finish()
    }
}

impl FromStr for Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_fragment())
    }
}
