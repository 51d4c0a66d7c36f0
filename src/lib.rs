pub mod app;
pub mod config;
pub mod gestures;
pub mod overlay;
pub mod playback;
#[cfg(feature = "gstreamer")]
pub mod video_player;

pub use app::PlayerApp;
pub use config::Config;
