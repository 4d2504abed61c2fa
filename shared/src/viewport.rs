/// Inclusive scale limits for a [`ViewTransform`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomBounds {
    pub min: f64,
    pub max: f64,
}

impl ZoomBounds {
    /// Swapped or non-positive limits are normalized so `0 < min <= max`.
    pub fn new(min: f64, max: f64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let min = if min.is_finite() && min > 0.0 { min } else { 1.0 };
        let max = if max.is_finite() && max >= min { max } else { min };
        Self { min, max }
    }

    pub fn clamp(&self, scale: f64) -> f64 {
        if scale.is_nan() {
            return self.min;
        }
        scale.clamp(self.min, self.max)
    }
}

impl Default for ZoomBounds {
    fn default() -> Self {
        Self { min: 1.0, max: 8.0 }
    }
}

const ZOOM_SENSITIVITY: f64 = 0.001;

/// Group-level pan/zoom applied on top of projected geometry:
/// `screen = projected * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl ViewTransform {
    /// Resting view for `bounds`: unit scale when the bounds allow it,
    /// otherwise the nearest bound applied about `center`.
    pub fn home(bounds: ZoomBounds, center: (f64, f64)) -> Self {
        Self::default().scaled_about(bounds, 1.0, center.0, center.1)
    }

    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        (
            wx * self.scale + self.translate_x,
            wy * self.scale + self.translate_y,
        )
    }

    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.translate_x) / self.scale,
            (sy - self.translate_y) / self.scale,
        )
    }

    /// Rescale to `target` (clamped) keeping the screen point `(sx, sy)` fixed.
    pub fn scaled_about(self, bounds: ZoomBounds, target: f64, sx: f64, sy: f64) -> Self {
        let scale = bounds.clamp(target);
        let ratio = scale / self.scale;
        Self {
            scale,
            translate_x: sx - (sx - self.translate_x) * ratio,
            translate_y: sy - (sy - self.translate_y) * ratio,
        }
    }

    pub fn zoom_in(self, bounds: ZoomBounds, step: f64, center: (f64, f64)) -> Self {
        self.scaled_about(bounds, self.scale * step, center.0, center.1)
    }

    pub fn zoom_out(self, bounds: ZoomBounds, step: f64, center: (f64, f64)) -> Self {
        self.scaled_about(bounds, self.scale * step, center.0, center.1)
    }

    /// Continuous wheel zoom toward the cursor.
    pub fn zoom_at(self, bounds: ZoomBounds, delta: f64, sx: f64, sy: f64) -> Self {
        let factor = (-delta * ZOOM_SENSITIVITY).exp();
        self.scaled_about(bounds, self.scale * factor, sx, sy)
    }

    pub fn pan_by(self, dx: f64, dy: f64) -> Self {
        Self {
            translate_x: self.translate_x + dx,
            translate_y: self.translate_y + dy,
            ..self
        }
    }

    pub fn reset(self, bounds: ZoomBounds, center: (f64, f64)) -> Self {
        Self::home(bounds, center)
    }

    /// SVG `transform` attribute value for the map group.
    pub fn svg_transform(&self) -> String {
        format!(
            "translate({:.2},{:.2}) scale({:.4})",
            self.translate_x, self.translate_y, self.scale
        )
    }

    fn lerp(from: Self, to: Self, t: f64) -> Self {
        Self {
            scale: from.scale + (to.scale - from.scale) * t,
            translate_x: from.translate_x + (to.translate_x - from.translate_x) * t,
            translate_y: from.translate_y + (to.translate_y - from.translate_y) * t,
        }
    }
}

/// Eased move between two transforms, sampled by the frame loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransition {
    pub from: ViewTransform,
    pub to: ViewTransform,
    pub start_time: f64,
    pub duration: f64, // milliseconds
}

impl ViewTransition {
    pub fn new(from: ViewTransform, to: ViewTransform, start_time: f64, duration: f64) -> Self {
        Self {
            from,
            to,
            start_time,
            duration,
        }
    }

    /// Transform at `now`, or `None` once the transition has finished.
    pub fn sample(&self, now: f64) -> Option<ViewTransform> {
        let elapsed = now - self.start_time;
        if elapsed >= self.duration || self.duration <= 0.0 {
            return None;
        }
        let t = cubic_ease_out((elapsed / self.duration).max(0.0));
        Some(ViewTransform::lerp(self.from, self.to, t))
    }
}

/// Cubic ease-out: decelerating to zero velocity.
fn cubic_ease_out(t: f64) -> f64 {
    let t = t - 1.0;
    t * t * t + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_zoom_in_stops_exactly_at_max() {
        let bounds = ZoomBounds::new(1.0, 6.0);
        let mut view = ViewTransform::default();
        for _ in 0..20 {
            view = view.zoom_in(bounds, 1.3, (400.0, 300.0));
        }
        assert_eq!(view.scale, 6.0);
    }

    #[test]
    fn repeated_zoom_out_stops_exactly_at_min() {
        let bounds = ZoomBounds::new(1.0, 6.0);
        let mut view = ViewTransform::default().zoom_in(bounds, 1.3, (0.0, 0.0));
        for _ in 0..20 {
            view = view.zoom_out(bounds, 0.77, (400.0, 300.0));
            assert!(view.scale >= bounds.min && view.scale <= bounds.max);
        }
        assert_eq!(view.scale, 1.0);
    }

    #[test]
    fn zoom_keeps_focus_point_fixed() {
        let bounds = ZoomBounds::default();
        let view = ViewTransform::default().pan_by(30.0, -12.0);
        let before = view.screen_to_world(250.0, 180.0);
        let zoomed = view.zoom_at(bounds, -300.0, 250.0, 180.0);
        let after = zoomed.screen_to_world(250.0, 180.0);
        assert!(zoomed.scale > view.scale);
        assert!((before.0 - after.0).abs() < 1e-9);
        assert!((before.1 - after.1).abs() < 1e-9);
    }

    #[test]
    fn wheel_zoom_is_bounded() {
        let bounds = ZoomBounds::new(1.0, 4.0);
        let view = ViewTransform::default().zoom_at(bounds, -1.0e6, 10.0, 10.0);
        assert_eq!(view.scale, 4.0);
        let view = view.zoom_at(bounds, 1.0e6, 10.0, 10.0);
        assert_eq!(view.scale, 1.0);
    }

    #[test]
    fn reset_restores_identity() {
        let bounds = ZoomBounds::default();
        let view = ViewTransform::default()
            .zoom_in(bounds, 1.3, (100.0, 100.0))
            .pan_by(5.0, 5.0)
            .reset(bounds, (400.0, 300.0));
        assert_eq!(view, ViewTransform::default());
    }

    #[test]
    fn home_respects_bounds_that_exclude_unit_scale() {
        let center = (400.0, 300.0);
        let tight = ZoomBounds::new(2.0, 6.0);
        let home = ViewTransform::home(tight, center);
        assert_eq!(home.scale, 2.0);
        // The viewport centre stays put, so the map is still centred.
        assert_eq!(home.world_to_screen(400.0, 300.0), center);

        let shrunk = ViewTransform::home(ZoomBounds::new(0.25, 0.5), center);
        assert_eq!(shrunk.scale, 0.5);

        let view = home.zoom_in(tight, 1.3, center).pan_by(-40.0, 12.0).reset(tight, center);
        assert_eq!(view, home);
    }

    #[test]
    fn bounds_normalize_bad_input() {
        let bounds = ZoomBounds::new(8.0, 2.0);
        assert_eq!((bounds.min, bounds.max), (2.0, 8.0));
        let bounds = ZoomBounds::new(-1.0, f64::NAN);
        assert_eq!((bounds.min, bounds.max), (1.0, 1.0));
        assert_eq!(ZoomBounds::default().clamp(f64::NAN), 1.0);
    }

    #[test]
    fn transition_eases_then_finishes() {
        let from = ViewTransform::default();
        let to = from.zoom_in(ZoomBounds::default(), 2.0, (0.0, 0.0));
        let transition = ViewTransition::new(from, to, 1000.0, 250.0);

        assert_eq!(transition.sample(1000.0), Some(from));
        let mid = transition.sample(1125.0).unwrap();
        // Ease-out covers more than half the distance by the midpoint.
        assert!(mid.scale > 1.5 && mid.scale < 2.0);
        assert_eq!(transition.sample(1250.0), None);
    }

    #[test]
    fn svg_transform_formats_translate_then_scale() {
        let view = ViewTransform {
            scale: 1.3,
            translate_x: -120.0,
            translate_y: 45.5,
        };
        assert_eq!(view.svg_transform(), "translate(-120.00,45.50) scale(1.3000)");
    }
}
