use egui::{Pos2, Rect};

/// Shows the controls overlay on pointer activity and hides it again after a
/// quiet period, unless the pointer is resting on the overlay itself.
///
/// Each activity event replaces the pending hide deadline, so the overlay only
/// hides once the pointer has been quiet for the full delay. The inside-check
/// runs against the overlay bounds as they are at fire time, not as they were
/// when the deadline was scheduled.
///
/// Known quirk, kept on purpose: when the deadline fires while the pointer is
/// inside the overlay, the deadline is consumed without being rescheduled. The
/// overlay then stays visible until the next pointer event elsewhere.
pub struct OverlayVisibility {
    hide_delay: f64,
    visible: bool,
    pointer: Option<Pos2>,
    hide_at: Option<f64>,
}

impl OverlayVisibility {
    pub fn new(hide_delay: f64) -> Self {
        Self {
            hide_delay,
            visible: true,
            pointer: None,
            hide_at: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn last_pointer(&self) -> Option<Pos2> {
        self.pointer
    }

    /// Records pointer movement: shows the overlay and replaces any pending
    /// hide deadline with a fresh one.
    pub fn on_pointer_activity(&mut self, pos: Pos2, now: f64) {
        self.pointer = Some(pos);
        self.visible = true;
        self.hide_at = Some(now + self.hide_delay);
    }

    /// Fires the hide deadline if it is due. `overlay_rect` must be the
    /// overlay's current bounds; an unknown pointer counts as outside.
    pub fn tick(&mut self, now: f64, overlay_rect: Rect) {
        let Some(deadline) = self.hide_at else {
            return;
        };
        if now < deadline {
            return;
        }
        self.hide_at = None;
        let inside = self
            .pointer
            .map(|pos| overlay_rect.contains(pos))
            .unwrap_or(false);
        if !inside {
            self.visible = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar() -> Rect {
        Rect::from_min_max(Pos2::new(0.0, 400.0), Pos2::new(800.0, 450.0))
    }

    #[test]
    fn visible_immediately_on_activity() {
        let mut overlay = OverlayVisibility::new(3.0);
        overlay.visible = false;
        overlay.on_pointer_activity(Pos2::new(100.0, 100.0), 0.0);
        assert!(overlay.is_visible());
    }

    #[test]
    fn hides_after_quiet_period_when_pointer_outside() {
        let mut overlay = OverlayVisibility::new(3.0);
        overlay.on_pointer_activity(Pos2::new(100.0, 100.0), 0.0);
        overlay.tick(2.9, bar());
        assert!(overlay.is_visible());
        overlay.tick(3.0, bar());
        assert!(!overlay.is_visible());
    }

    #[test]
    fn each_activity_replaces_the_deadline() {
        let mut overlay = OverlayVisibility::new(3.0);
        overlay.on_pointer_activity(Pos2::new(100.0, 100.0), 0.0);
        overlay.on_pointer_activity(Pos2::new(110.0, 100.0), 2.0);
        overlay.tick(3.5, bar());
        assert!(overlay.is_visible());
        overlay.tick(5.0, bar());
        assert!(!overlay.is_visible());
    }

    #[test]
    fn stays_visible_when_pointer_rests_on_overlay() {
        let mut overlay = OverlayVisibility::new(3.0);
        overlay.on_pointer_activity(Pos2::new(400.0, 425.0), 0.0);
        overlay.tick(3.0, bar());
        assert!(overlay.is_visible());
        // The deadline was consumed without rescheduling: no later tick hides
        // the overlay until new pointer activity arms it again.
        overlay.tick(100.0, bar());
        assert!(overlay.is_visible());
        overlay.on_pointer_activity(Pos2::new(10.0, 10.0), 100.0);
        overlay.tick(103.0, bar());
        assert!(!overlay.is_visible());
    }

    #[test]
    fn bounds_are_read_at_fire_time() {
        let mut overlay = OverlayVisibility::new(3.0);
        // Pointer sits where the bar used to be, but layout moved the bar
        // before the deadline fired.
        overlay.on_pointer_activity(Pos2::new(400.0, 425.0), 0.0);
        let moved = Rect::from_min_max(Pos2::new(0.0, 500.0), Pos2::new(800.0, 550.0));
        overlay.tick(3.0, moved);
        assert!(!overlay.is_visible());
    }

    #[test]
    fn unknown_pointer_counts_as_outside() {
        let mut overlay = OverlayVisibility::new(3.0);
        overlay.hide_at = Some(1.0);
        overlay.tick(1.0, bar());
        assert!(!overlay.is_visible());
    }
}
