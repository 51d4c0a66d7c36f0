use anyhow::Result;
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

use tapdeck::app::format_time;
use tapdeck::playback::PlaybackEngine;
use tapdeck::{Config, PlayerApp};

/// Scripted playback engine; state is shared so tests can observe what the
/// app did after handing the engine over.
#[derive(Default)]
struct FakeState {
    position: Cell<f64>,
    duration: Cell<f64>,
    paused: Cell<bool>,
    ready: Cell<bool>,
    volume: Cell<f64>,
    error: RefCell<Option<String>>,
}

struct FakePlayer(Rc<FakeState>);

impl PlaybackEngine for FakePlayer {
    fn play(&self) -> Result<()> {
        self.0.paused.set(false);
        Ok(())
    }
    fn pause(&self) -> Result<()> {
        self.0.paused.set(true);
        Ok(())
    }
    fn stop(&self) -> Result<()> {
        self.0.paused.set(true);
        self.0.position.set(0.0);
        Ok(())
    }
    fn seek(&self, seconds: f64) -> Result<()> {
        self.0.position.set(seconds);
        Ok(())
    }
    fn position(&self) -> Option<f64> {
        Some(self.0.position.get())
    }
    fn duration(&self) -> Option<f64> {
        let duration = self.0.duration.get();
        (duration > 0.0).then_some(duration)
    }
    fn is_paused(&self) -> bool {
        self.0.paused.get()
    }
    fn is_ready(&self) -> bool {
        self.0.ready.get()
    }
    fn set_volume(&self, volume: f64) {
        self.0.volume.set(volume);
    }
    fn take_error(&self) -> Option<String> {
        self.0.error.borrow_mut().take()
    }
}

fn app_with_player(position: f64, duration: f64, ready: bool, paused: bool) -> (PlayerApp, Rc<FakeState>) {
    let state = Rc::new(FakeState::default());
    state.position.set(position);
    state.duration.set(duration);
    state.ready.set(ready);
    state.paused.set(paused);
    let mut app = PlayerApp::default();
    app.player = Some(Box::new(FakePlayer(state.clone())));
    app.current_file_name = Some("clip.mp4".to_string());
    (app, state)
}

const WIDTH: f32 = 800.0;

#[test]
fn toggle_flips_playback_when_ready() {
    let (mut app, state) = app_with_player(0.0, 120.0, true, true);
    app.toggle_play_pause();
    assert!(!state.paused.get());
    app.toggle_play_pause();
    assert!(state.paused.get());
}

#[test]
fn toggle_is_a_no_op_when_not_ready() {
    let (mut app, state) = app_with_player(0.0, 120.0, false, true);
    app.toggle_play_pause();
    assert!(state.paused.get());

    let mut empty = PlayerApp::default();
    empty.toggle_play_pause();
    assert!(empty.player.is_none());
}

#[test]
fn picker_failure_stops_in_progress_playback() {
    let (mut app, state) = app_with_player(10.0, 120.0, true, false);
    app.handle_picker_result(None);
    assert!(state.paused.get());
    assert_eq!(state.position.get(), 0.0);
}

#[test]
fn picker_failure_at_start_changes_nothing() {
    let (mut app, state) = app_with_player(0.0, 120.0, true, false);
    app.handle_picker_result(None);
    assert!(!state.paused.get());
    assert_eq!(state.position.get(), 0.0);

    let mut empty = PlayerApp::default();
    empty.handle_picker_result(None);
    assert!(empty.player.is_none());
}

#[test]
fn held_left_zone_rewinds_and_clamps_at_zero() {
    // Duration 120s, position 5s, touch at x = 0.1 * width.
    let (mut app, state) = app_with_player(5.0, 120.0, true, false);
    app.handle_touch_start(0.1 * WIDTH, WIDTH, 0.0);
    assert!(app.gestures.is_skipping());

    // Three ticks due at 0.9s: max(0, 5 - 90) = 0.
    app.apply_due_skips(0.9);
    assert_eq!(state.position.get(), 0.0);

    // Still held: further ticks keep the position clamped at 0.
    app.apply_due_skips(1.2);
    assert_eq!(state.position.get(), 0.0);
    assert!(app.gestures.is_skipping());

    app.gestures.on_touch_end();
    app.apply_due_skips(10.0);
    assert_eq!(state.position.get(), 0.0);
    assert!(!app.gestures.is_skipping());
}

#[test]
fn held_right_zone_advances_and_clamps_at_duration() {
    let (mut app, state) = app_with_player(100.0, 120.0, true, false);
    app.handle_touch_start(0.9 * WIDTH, WIDTH, 0.0);

    app.apply_due_skips(0.3);
    assert_eq!(state.position.get(), 120.0);
    app.apply_due_skips(0.6);
    assert_eq!(state.position.get(), 120.0);
}

#[test]
fn double_touch_start_never_double_ticks() {
    let (mut app, state) = app_with_player(0.0, 600.0, true, false);
    app.handle_touch_start(0.9 * WIDTH, WIDTH, 0.0);
    // Second start in the same zone without an intervening touch-end.
    app.handle_touch_start(0.9 * WIDTH, WIDTH, 0.05);

    // One slot: a single 30s step per 300ms period, timed from the restart.
    app.apply_due_skips(0.35);
    assert_eq!(state.position.get(), 30.0);
    app.apply_due_skips(0.65);
    assert_eq!(state.position.get(), 60.0);
}

#[test]
fn center_tap_toggles_once_without_skipping() {
    let (mut app, state) = app_with_player(50.0, 120.0, true, false);
    app.handle_touch_start(0.5 * WIDTH, WIDTH, 0.0);
    assert!(state.paused.get());
    assert!(!app.gestures.is_skipping());

    // No repeated action: time passing changes nothing.
    app.apply_due_skips(5.0);
    assert_eq!(state.position.get(), 50.0);
    assert!(state.paused.get());
}

#[test]
fn touch_zones_are_inert_when_not_ready() {
    let (mut app, state) = app_with_player(50.0, 120.0, false, false);
    app.handle_touch_start(0.1 * WIDTH, WIDTH, 0.0);
    app.handle_touch_start(0.5 * WIDTH, WIDTH, 0.0);
    app.handle_touch_start(0.9 * WIDTH, WIDTH, 0.0);
    assert!(!app.gestures.is_skipping());
    assert!(!state.paused.get());
    app.apply_due_skips(5.0);
    assert_eq!(state.position.get(), 50.0);
}

#[test]
fn keyboard_seek_clamps_to_media_bounds() {
    let (mut app, state) = app_with_player(2.0, 120.0, true, false);
    app.keyboard_seek(-5.0);
    assert_eq!(state.position.get(), 0.0);

    state.position.set(118.0);
    app.keyboard_seek(5.0);
    assert_eq!(state.position.get(), 120.0);

    state.position.set(60.0);
    app.keyboard_seek(5.0);
    assert_eq!(state.position.get(), 65.0);
}

#[test]
fn keyboard_seek_requires_readiness() {
    let (mut app, state) = app_with_player(60.0, 120.0, false, false);
    app.keyboard_seek(5.0);
    assert_eq!(state.position.get(), 60.0);
}

#[test]
fn stop_pauses_and_rewinds() {
    let (mut app, state) = app_with_player(42.0, 120.0, true, false);
    app.stop_playback();
    assert!(state.paused.get());
    assert_eq!(state.position.get(), 0.0);
}

#[test]
fn unreadable_launch_file_is_skipped() {
    let mut app = PlayerApp::default();
    let loaded = app.open_file(&PathBuf::from("/nonexistent/video.mp4"));
    assert!(!loaded);
    assert!(app.player.is_none());
    assert!(app.current_file_name.is_none());
}

#[test]
fn config_round_trips_through_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let config = Config::default();
    fs::write(&config_path, toml::to_string(&config).unwrap()).unwrap();

    let config_str = fs::read_to_string(&config_path).unwrap();
    let parsed: Config = toml::from_str(&config_str).unwrap();
    assert_eq!(parsed.gestures.skip_step_seconds, 30.0);
    assert_eq!(parsed.overlay.hide_delay_seconds, 3.0);
}

#[test]
fn time_display_matches_player_format() {
    assert_eq!(format_time(125.0), "02:05");
    assert_eq!(format_time(0.0), "00:00");
}
