use eframe::egui;
use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

use crate::config::Config;
use crate::gestures::{GestureAction, TouchGestureHandler};
use crate::overlay::OverlayVisibility;
use crate::playback::PlaybackEngine;
#[cfg(feature = "gstreamer")]
use crate::video_player::VideoPlayer;

/// Formats a position as `mm:ss`, both fields zero-padded.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

pub struct PlayerApp {
    pub config: Config,
    pub player: Option<Box<dyn PlaybackEngine>>,
    pub overlay: OverlayVisibility,
    pub gestures: TouchGestureHandler,
    pub volume: f64,
    pub current_file_name: Option<String>,
    texture_sender: watch::Sender<Option<egui::ColorImage>>,
    texture_receiver: watch::Receiver<Option<egui::ColorImage>>,
    current_texture: Option<egui::TextureHandle>,
    /// Video surface bounds from the last layout pass, used to map touch
    /// coordinates into the gesture zones.
    video_rect: egui::Rect,
    /// Controls bounds from the last layout pass; NOTHING while hidden.
    controls_rect: egui::Rect,
    last_touch_time: f64,
    last_title: String,
}

impl Default for PlayerApp {
    fn default() -> Self {
        let (tx, rx) = watch::channel(None);
        let config = Config::default();
        Self {
            overlay: OverlayVisibility::new(config.overlay.hide_delay_seconds),
            gestures: TouchGestureHandler::new(
                config.gestures.zone_fraction,
                config.gestures.tick_period_seconds,
            ),
            volume: config.playback.initial_volume,
            config,
            player: None,
            current_file_name: None,
            texture_sender: tx,
            texture_receiver: rx,
            current_texture: None,
            video_rect: egui::Rect::NOTHING,
            controls_rect: egui::Rect::NOTHING,
            last_touch_time: f64::NEG_INFINITY,
            last_title: String::new(),
        }
    }
}

impl PlayerApp {
    pub fn new(launch_files: Vec<PathBuf>) -> Self {
        let config = Config::load();
        config.logging.trim_log();
        let mut app = Self::default();
        app.overlay = OverlayVisibility::new(config.overlay.hide_delay_seconds);
        app.gestures = TouchGestureHandler::new(
            config.gestures.zone_fraction,
            config.gestures.tick_period_seconds,
        );
        app.volume = config.playback.initial_volume;
        app.config = config;

        // Launch integration: the pending file list is consumed exactly once,
        // and the first readable file starts playing.
        for path in &launch_files {
            if app.open_file(path) {
                break;
            }
        }
        app
    }

    /// Loads and plays a file. Returns false when the file cannot be read or
    /// the engine refuses it; playback state is left untouched in that case.
    pub fn open_file(&mut self, path: &Path) -> bool {
        if let Err(e) = fs::File::open(path) {
            warn!("Skipping unreadable file {}: {}", path.display(), e);
            return false;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        if let Some(player) = self.player.take() {
            if let Err(e) = player.pause() {
                warn!("Error pausing previous player: {}", e);
            }
            drop(player);
            // Give GStreamer a moment to clean up
            std::thread::sleep(std::time::Duration::from_millis(100));
        }

        #[cfg(feature = "gstreamer")]
        {
            let abs_path = match dunce::canonicalize(path) {
                Ok(p) => p,
                Err(e) => {
                    error!("Failed to canonicalize path {}: {}", path.display(), e);
                    return false;
                }
            };
            let uri = match gstreamer::glib::filename_to_uri(&abs_path, None) {
                Ok(uri) => uri.to_string(),
                Err(e) => {
                    error!("Failed to convert path to URI {}: {}", abs_path.display(), e);
                    return false;
                }
            };
            match VideoPlayer::new(&uri, self.texture_sender.clone()) {
                Ok(player) => {
                    player.set_volume(self.volume);
                    if let Err(e) = player.play() {
                        error!("Failed to play video: {}", e);
                    }
                    info!("Playing {}", uri);
                    self.player = Some(Box::new(player));
                    self.current_file_name = Some(name);
                    true
                }
                Err(e) => {
                    error!("Failed to create player: {}", e);
                    false
                }
            }
        }
        #[cfg(not(feature = "gstreamer"))]
        {
            warn!("Built without the gstreamer feature, cannot play {}", name);
            self.current_file_name = Some(name);
            false
        }
    }

    /// Shared play/pause toggle used by the center tap, the surface click,
    /// the controls button, and the keyboard. A no-op unless the engine has a
    /// source and is ready.
    pub fn toggle_play_pause(&mut self) {
        let Some(player) = &self.player else {
            return;
        };
        if !player.is_ready() {
            return;
        }
        let result = if player.is_paused() {
            player.play()
        } else {
            player.pause()
        };
        if let Err(e) = result {
            error!("Failed to toggle playback: {}", e);
        }
    }

    /// Pauses and rewinds to the start.
    pub fn stop_playback(&mut self) {
        if let Some(player) = &self.player {
            if let Err(e) = player.stop() {
                error!("Failed to stop playback: {}", e);
            }
        }
    }

    /// Applies the outcome of a picker dialog. A cancelled or failed pick
    /// stops playback only when something was already playing past the start.
    pub fn handle_picker_result(&mut self, picked: Option<PathBuf>) {
        match picked {
            Some(path) => {
                self.open_file(&path);
            }
            None => {
                warn!("File picker cancelled or failed");
                if let Some(player) = &self.player {
                    if player.position().unwrap_or(0.0) > 0.0 {
                        if let Err(e) = player.stop() {
                            error!("Failed to stop playback: {}", e);
                        }
                    }
                }
            }
        }
    }

    pub fn open_picker(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter("Video", &["mp4", "mkv", "webm", "mov", "avi"])
            .pick_file();
        self.handle_picker_result(picked);
    }

    /// Seeks relative to the current position, clamped to the media bounds.
    pub fn keyboard_seek(&mut self, delta: f64) {
        let Some(player) = &self.player else {
            return;
        };
        if !player.is_ready() {
            return;
        }
        let (Some(pos), Some(dur)) = (player.position(), player.duration()) else {
            return;
        };
        if let Err(e) = player.seek((pos + delta).clamp(0.0, dur)) {
            warn!("Seek failed: {}", e);
        }
    }

    /// Routes a touch-start at offset `x` within a surface of width `width`
    /// into the gesture zones.
    pub fn handle_touch_start(&mut self, x: f32, width: f32, now: f64) {
        let ready = self.player.as_ref().map(|p| p.is_ready()).unwrap_or(false);
        match self.gestures.on_touch_start(x, width, now, ready) {
            GestureAction::Toggle => self.toggle_play_pause(),
            GestureAction::SkipStarted(direction) => {
                debug!("Skip hold started: {:?}", direction)
            }
            GestureAction::None => {}
        }
    }

    /// Performs every skip tick that has come due, one clamped step per tick.
    pub fn apply_due_skips(&mut self, now: f64) {
        let Some((direction, ticks)) = self.gestures.poll(now) else {
            return;
        };
        let Some(player) = &self.player else {
            self.gestures.on_touch_cancel();
            return;
        };
        let (Some(mut pos), Some(dur)) = (player.position(), player.duration()) else {
            return;
        };
        let step = self.config.gestures.skip_step_seconds;
        for _ in 0..ticks {
            pos = match direction {
                crate::gestures::SkipDirection::Back => (pos - step).max(0.0),
                crate::gestures::SkipDirection::Forward => (pos + step).min(dur),
            };
            if let Err(e) = player.seek(pos) {
                warn!("Skip seek failed: {}", e);
                break;
            }
        }
    }

    pub fn window_title(&self) -> String {
        match &self.current_file_name {
            Some(name) => {
                let playing = self.player.as_ref().map(|p| !p.is_paused()).unwrap_or(false);
                if playing {
                    format!("▶ {} — tapdeck", name)
                } else {
                    format!("{} — tapdeck", name)
                }
            }
            None => "tapdeck".to_string(),
        }
    }

    fn hex_to_color(hex: &str) -> egui::Color32 {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return egui::Color32::from_rgb(r, g, b);
            }
        }
        egui::Color32::WHITE
    }

    fn handle_input(&mut self, ctx: &egui::Context, now: f64) {
        let events = ctx.input(|i| i.events.clone());
        for event in &events {
            match event {
                egui::Event::PointerMoved(pos) => {
                    self.overlay.on_pointer_activity(*pos, now);
                }
                egui::Event::Touch { phase, pos, .. } => {
                    self.last_touch_time = now;
                    match phase {
                        egui::TouchPhase::Start => {
                            if self.video_rect.contains(*pos) {
                                let x = pos.x - self.video_rect.left();
                                self.handle_touch_start(x, self.video_rect.width(), now);
                            }
                        }
                        egui::TouchPhase::End => self.gestures.on_touch_end(),
                        egui::TouchPhase::Cancel => self.gestures.on_touch_cancel(),
                        egui::TouchPhase::Move => {}
                    }
                }
                _ => {}
            }
        }

        let fullscreen = ctx.input(|i| i.viewport().fullscreen.unwrap_or(false));
        if ctx.input(|i| i.key_pressed(egui::Key::Space) || i.key_pressed(egui::Key::Enter)) {
            self.toggle_play_pause();
        }
        let step = self.config.playback.keyboard_seek_seconds;
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowRight)) {
            self.keyboard_seek(step);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowLeft)) {
            self.keyboard_seek(-step);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::F)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(!fullscreen));
        }
        if fullscreen && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(false));
        }
    }

    fn show_controls(&mut self, ctx: &egui::Context) {
        let (ready, paused, pos, dur) = match &self.player {
            Some(p) => (
                p.is_ready(),
                p.is_paused(),
                p.position().unwrap_or(0.0),
                p.duration().unwrap_or(0.0),
            ),
            None => (false, true, 0.0, 0.0),
        };
        let toggle_label = if paused {
            self.config.ui.play_label.clone()
        } else {
            self.config.ui.pause_label.clone()
        };

        let mut toggle_clicked = false;
        let mut stop_clicked = false;
        let mut open_clicked = false;
        let mut volume = self.volume;
        let mut seek_target = None;

        let area = egui::Area::new(egui::Id::new("controls_overlay"))
            .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -24.0))
            .show(ctx, |ui| {
                egui::Frame::popup(&ctx.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        toggle_clicked = ui
                            .add_enabled(ready, egui::Button::new(&toggle_label))
                            .clicked();
                        stop_clicked = ui.button("Stop").clicked();
                        open_clicked = ui.button("Open…").clicked();
                        ui.add_space(8.0);
                        ui.label("Vol");
                        ui.add(egui::Slider::new(&mut volume, 0.0..=1.0).show_value(false));
                        ui.add_space(8.0);
                        let mut seek_pos = pos;
                        let slider = ui.add_enabled(
                            ready && dur > 0.0,
                            egui::Slider::new(&mut seek_pos, 0.0..=dur.max(0.001))
                                .show_value(false),
                        );
                        if slider.changed() {
                            seek_target = Some(seek_pos);
                        }
                        ui.label(format!("{} / {}", format_time(pos), format_time(dur)));
                    });
                });
            });
        self.controls_rect = area.response.rect;

        if toggle_clicked {
            self.toggle_play_pause();
        }
        if stop_clicked {
            self.stop_playback();
        }
        if volume != self.volume {
            self.volume = volume;
            if let Some(player) = &self.player {
                player.set_volume(volume);
            }
        }
        if let Some(target) = seek_target {
            if let Some(player) = &self.player {
                if player.is_ready() {
                    if let Err(e) = player.seek(target.clamp(0.0, dur)) {
                        warn!("Seek failed: {}", e);
                    }
                }
            }
        }
        if open_clicked {
            self.open_picker();
        }
    }
}

impl eframe::App for PlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);

        self.handle_input(ctx, now);
        self.apply_due_skips(now);

        let playback_error = self.player.as_ref().and_then(|p| p.take_error());
        if let Some(e) = playback_error {
            error!("Playback error, dropping player: {}", e);
            self.player = None;
            self.current_file_name = None;
        }

        if self.texture_receiver.has_changed().unwrap_or(false) {
            if let Some(image) = self.texture_receiver.borrow_and_update().clone() {
                self.current_texture =
                    Some(ctx.load_texture("video_frame", image, Default::default()));
            }
        }

        // Bounds are taken from the controls as laid out most recently, so
        // the inside-check follows layout changes.
        self.overlay.tick(now, self.controls_rect);

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                self.video_rect = rect;
                ui.painter().rect_filled(
                    rect,
                    0.0,
                    Self::hex_to_color(&self.config.ui.background_color),
                );
                if let Some(texture) = &self.current_texture {
                    ui.centered_and_justified(|ui| {
                        ui.image((texture.id(), ui.available_size()));
                    });
                } else {
                    ui.centered_and_justified(|ui| {
                        ui.label(
                            egui::RichText::new("No video loaded")
                                .size(32.0)
                                .color(Self::hex_to_color(&self.config.ui.label_color)),
                        );
                    });
                }

                let response =
                    ui.interact(rect, egui::Id::new("video_surface"), egui::Sense::click());
                // Touch taps already toggle through the gesture zones; skip
                // the click egui synthesizes for them.
                if response.clicked() && now - self.last_touch_time > 1.0 {
                    self.toggle_play_pause();
                }
            });

        if self.overlay.is_visible() {
            self.show_controls(ctx);
        } else {
            self.controls_rect = egui::Rect::NOTHING;
        }

        let title = self.window_title();
        if title != self.last_title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.last_title = title;
        }

        ctx.request_repaint();
    }
}
