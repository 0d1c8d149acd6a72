mod camera;
mod delay;
mod http;
mod kv;
mod share;

pub use self::camera::{
    Camera, CameraError, CameraOperation, CameraOutput, CameraResult, CapturedFrame,
};
pub use self::delay::{Delay, DelayElapsed, DelayOperation};
pub use self::http::{
    Http, HttpError, HttpMethod, HttpOperation, HttpRequest, HttpResponse, HttpResult,
};
pub use self::kv::{
    KeyValue, KvError, KvOperation, KvOutput, KvResult, AUTH_TOKEN_KEY, LANGUAGE_KEY,
};
pub use self::share::{Share, ShareError, ShareOperation, ShareOutput, ShareResult};

// Crux's built-in Render capability already does everything the view
// refresh needs.
pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

pub type AppRender = Render<Event>;
pub type AppHttp = Http<Event>;
pub type AppKv = KeyValue<Event>;
pub type AppCamera = Camera<Event>;
pub type AppShare = Share<Event>;
pub type AppDelay = Delay<Event>;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub kv: KeyValue<Event>,
    pub camera: Camera<Event>,
    pub share: Share<Event>,
    pub delay: Delay<Event>,
}
