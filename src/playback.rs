use anyhow::Result;

/// The surface of the playback engine the UI talks to.
///
/// `is_ready` gates every seek and toggle: it reports whether a source is
/// loaded and enough data is buffered for those operations to be safe.
pub trait PlaybackEngine {
    fn play(&self) -> Result<()>;
    fn pause(&self) -> Result<()>;
    /// Pauses and resets the position to the start.
    fn stop(&self) -> Result<()>;
    /// Seeks to an absolute position in seconds.
    fn seek(&self, seconds: f64) -> Result<()>;
    /// Current position in seconds, if known.
    fn position(&self) -> Option<f64>;
    /// Media duration in seconds, if known.
    fn duration(&self) -> Option<f64>;
    fn is_paused(&self) -> bool;
    fn is_ready(&self) -> bool;
    fn set_volume(&self, volume: f64);
    /// Takes the latest engine error, if one occurred since the last call.
    fn take_error(&self) -> Option<String>;
}
