//! Touch-zone gestures over the video surface.
//!
//! A touch that starts in the left or right quarter of the surface begins a
//! repeated skip (one step per tick while held); a touch in the center band
//! toggles play/pause once. Only one skip can be active at a time.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipDirection {
    Back,
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchZone {
    SkipBack,
    Toggle,
    SkipForward,
}

impl TouchZone {
    /// Classifies a horizontal touch offset within a surface of the given
    /// width. Offsets exactly on a zone boundary belong to the center band.
    pub fn classify(x: f32, width: f32, zone_fraction: f32) -> Self {
        if x < width * zone_fraction {
            TouchZone::SkipBack
        } else if x > width * (1.0 - zone_fraction) {
            TouchZone::SkipForward
        } else {
            TouchZone::Toggle
        }
    }
}

/// What the caller should do in response to a touch-start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAction {
    None,
    Toggle,
    SkipStarted(SkipDirection),
}

#[derive(Debug, Clone, Copy)]
struct ActiveSkip {
    direction: SkipDirection,
    next_tick: f64,
}

pub struct TouchGestureHandler {
    zone_fraction: f32,
    tick_period: f64,
    skip: Option<ActiveSkip>,
}

impl TouchGestureHandler {
    pub fn new(zone_fraction: f32, tick_period: f64) -> Self {
        Self {
            zone_fraction,
            tick_period,
            skip: None,
        }
    }

    pub fn is_skipping(&self) -> bool {
        self.skip.is_some()
    }

    /// Handles the first touch point of a touch-start at horizontal offset
    /// `x` within a surface of width `width`. When the playback engine is not
    /// ready the touch is a no-op in every zone.
    ///
    /// Starting a skip while one is active replaces it; the single slot
    /// guarantees two skips never tick concurrently.
    pub fn on_touch_start(&mut self, x: f32, width: f32, now: f64, ready: bool) -> GestureAction {
        if !ready || width <= 0.0 {
            return GestureAction::None;
        }
        match TouchZone::classify(x, width, self.zone_fraction) {
            TouchZone::SkipBack => self.start_skip(SkipDirection::Back, now),
            TouchZone::SkipForward => self.start_skip(SkipDirection::Forward, now),
            TouchZone::Toggle => GestureAction::Toggle,
        }
    }

    fn start_skip(&mut self, direction: SkipDirection, now: f64) -> GestureAction {
        // Replace, never stack: cancelling first keeps the slot single even
        // if a second touch-start arrives before the previous touch-end.
        self.cancel();
        self.skip = Some(ActiveSkip {
            direction,
            next_tick: now + self.tick_period,
        });
        GestureAction::SkipStarted(direction)
    }

    /// Returns the skip ticks that have come due since the last poll. The
    /// accounting is deadline-based, so a slow frame still delivers every
    /// elapsed tick.
    pub fn poll(&mut self, now: f64) -> Option<(SkipDirection, u32)> {
        let skip = self.skip.as_mut()?;
        let mut ticks = 0;
        while now >= skip.next_tick {
            ticks += 1;
            skip.next_tick += self.tick_period;
        }
        if ticks > 0 {
            Some((skip.direction, ticks))
        } else {
            None
        }
    }

    pub fn on_touch_end(&mut self) {
        self.cancel();
    }

    pub fn on_touch_cancel(&mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        self.skip = None;
    }
}
