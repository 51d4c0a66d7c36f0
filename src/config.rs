use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub playback: PlaybackConfig,
    pub gestures: GestureConfig,
    pub overlay: OverlayConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Volume applied when a file is loaded, 0.0 to 1.0.
    pub initial_volume: f64,
    /// Seconds moved per arrow-key press.
    pub keyboard_seek_seconds: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GestureConfig {
    /// Width fraction of the skip zones on each side of the video surface.
    pub zone_fraction: f32,
    /// Seconds between repeated skips while a skip zone is held.
    pub tick_period_seconds: f64,
    /// Seconds moved per skip tick.
    pub skip_step_seconds: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverlayConfig {
    /// Quiet period after the last pointer activity before the controls hide.
    pub hide_delay_seconds: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiConfig {
    pub play_label: String,
    pub pause_label: String,
    pub background_color: String,
    pub label_color: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub file: String,
    pub max_lines: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig {
                initial_volume: 1.0,
                keyboard_seek_seconds: 5.0,
            },
            gestures: GestureConfig {
                zone_fraction: 0.25,
                tick_period_seconds: 0.3,
                skip_step_seconds: 30.0,
            },
            overlay: OverlayConfig {
                hide_delay_seconds: 3.0,
            },
            ui: UiConfig {
                play_label: "Play".to_string(),
                pause_label: "Pause".to_string(),
                background_color: "#000000".to_string(),
                label_color: "#FFFFFF".to_string(),
            },
            logging: LoggingConfig {
                file: "tapdeck.log".to_string(),
                max_lines: 10000,
            },
        }
    }
}

fn config_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join("config.toml"))
}

impl Config {
    /// Loads `config.toml` from the executable's directory, falling back to
    /// defaults when the file is missing or malformed.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            warn!("Could not resolve executable directory, using default config");
            return Self::default();
        };
        info!("Loading config from {}", path.display());
        match fs::read_to_string(&path) {
            Ok(config_str) => match toml::from_str(&config_str) {
                Ok(config) => {
                    info!("Config loaded successfully");
                    config
                }
                Err(e) => {
                    error!("Failed to parse config: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                warn!("Config file not found, using defaults");
                Self::default()
            }
        }
    }
}

/// Loads only the logging section, used before the logger itself exists.
pub fn load_for_logging() -> LoggingConfig {
    if let Some(path) = config_path() {
        if let Ok(config_str) = fs::read_to_string(&path) {
            if let Ok(config) = toml::from_str::<Config>(&config_str) {
                return config.logging;
            }
        }
    }
    Config::default().logging
}

impl LoggingConfig {
    /// Drops the oldest lines once the log file grows past `max_lines`.
    pub fn trim_log(&self) {
        let log_path = PathBuf::from(&self.file);
        if let Ok(content) = fs::read_to_string(&log_path) {
            let lines: Vec<&str> = content.lines().collect();
            if lines.len() > self.max_lines {
                let start = lines.len() - self.max_lines;
                let trimmed = lines[start..].join("\n");
                if fs::write(&log_path, trimmed + "\n").is_ok() {
                    info!("Trimmed log file to {} lines", self.max_lines);
                } else {
                    error!("Failed to trim log file");
                }
            }
        }
    }
}
