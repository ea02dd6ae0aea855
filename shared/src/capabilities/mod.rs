pub mod http;
pub mod kv;
pub mod navigation;

pub use self::http::{HttpError, ValidatedUrl};
pub use self::kv::{KeyNamespace, KvError, KvKey};
pub use self::navigation::{Navigation, NavigationOperation};

pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;

use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub kv: KeyValue<Event>,
    pub render: Render<Event>,
    pub navigation: Navigation<Event>,
}
