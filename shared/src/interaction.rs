use std::fmt;
use std::sync::Arc;

use crate::viewport::{ViewTransform, ViewTransition, ZoomBounds};

/// Pointer travel (per axis, px) below which a press/release is still a click.
pub const CLICK_SLOP_PX: f64 = 5.0;

pub const DEFAULT_ZOOM_IN_STEP: f64 = 1.3;
pub const DEFAULT_ZOOM_OUT_STEP: f64 = 0.77;

/// Invoked with the canonical name of a clicked entity.
pub type SelectionCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Tooltip position relative to the map container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TooltipAnchor {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hover {
    pub entity: String,
    pub anchor: TooltipAnchor,
}

/// Hover and selection. The two are independent of each other and of the
/// view transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    pub hover: Option<Hover>,
    pub selected: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    start: (f64, f64),
    last: (f64, f64),
    moved: bool,
}

pub struct InteractionController {
    state: InteractionState,
    transform: ViewTransform,
    bounds: ZoomBounds,
    zoom_in_step: f64,
    zoom_out_step: f64,
    transition_ms: f64,
    center: (f64, f64),
    transition: Option<ViewTransition>,
    drag: Option<Drag>,
    suppress_click: bool,
    on_select: Option<SelectionCallback>,
}

impl fmt::Debug for InteractionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionController")
            .field("state", &self.state)
            .field("transform", &self.transform)
            .field("bounds", &self.bounds)
            .field("transition", &self.transition)
            .field("has_callback", &self.on_select.is_some())
            .finish_non_exhaustive()
    }
}

impl InteractionController {
    /// `center` is the viewport point stepped zooms scale about. A zoom-in
    /// step must exceed 1 and a zoom-out step must lie in (0, 1); anything
    /// else falls back to the stock step for that direction.
    pub fn new(
        bounds: ZoomBounds,
        zoom_in_step: f64,
        zoom_out_step: f64,
        transition_ms: f64,
        center: (f64, f64),
    ) -> Self {
        Self {
            state: InteractionState::default(),
            transform: ViewTransform::home(bounds, center),
            bounds,
            zoom_in_step: normalize_step(zoom_in_step, |s| s > 1.0, DEFAULT_ZOOM_IN_STEP),
            zoom_out_step: normalize_step(
                zoom_out_step,
                |s| s > 0.0 && s < 1.0,
                DEFAULT_ZOOM_OUT_STEP,
            ),
            transition_ms,
            center,
            transition: None,
            drag: None,
            suppress_click: false,
            on_select: None,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn bounds(&self) -> ZoomBounds {
        self.bounds
    }

    pub fn set_selection_callback(&mut self, callback: Option<SelectionCallback>) {
        self.on_select = callback;
    }

    // Hover

    pub fn hover_enter(&mut self, canonical: &str, anchor: TooltipAnchor) {
        self.state.hover = Some(Hover {
            entity: canonical.to_owned(),
            anchor,
        });
    }

    /// Reposition the tooltip. No-op when nothing is hovered.
    pub fn hover_move(&mut self, anchor: TooltipAnchor) {
        if let Some(hover) = &mut self.state.hover {
            hover.anchor = anchor;
        }
    }

    /// Clear hover, unless the leave belongs to an entity that is no longer
    /// the hovered one.
    pub fn hover_leave(&mut self, canonical: &str) -> bool {
        match &self.state.hover {
            Some(hover) if hover.entity == canonical => {
                self.state.hover = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear_hover(&mut self) {
        self.state.hover = None;
    }

    // Selection

    /// Returns false when the click ended a drag and was swallowed.
    pub fn click(&mut self, canonical: &str) -> bool {
        if std::mem::take(&mut self.suppress_click) {
            return false;
        }
        self.state.selected = Some(canonical.to_owned());
        if let Some(callback) = &self.on_select {
            callback(canonical);
        }
        true
    }

    pub fn close_selection(&mut self) {
        self.state.selected = None;
    }

    // Pan

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.suppress_click = false;
        self.drag = Some(Drag {
            start: (x, y),
            last: (x, y),
            moved: false,
        });
    }

    /// Pan by the pointer delta while a drag is active. Returns whether the
    /// transform changed.
    pub fn pointer_drag(&mut self, x: f64, y: f64) -> bool {
        let Some(drag) = &mut self.drag else {
            return false;
        };
        let (dx, dy) = (x - drag.last.0, y - drag.last.1);
        drag.last = (x, y);
        if (x - drag.start.0).abs() >= CLICK_SLOP_PX || (y - drag.start.1).abs() >= CLICK_SLOP_PX
        {
            drag.moved = true;
        }
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        self.transition = None;
        self.transform = self.transform.pan_by(dx, dy);
        true
    }

    pub fn pointer_up(&mut self) {
        if let Some(drag) = self.drag.take() {
            self.suppress_click = drag.moved;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some_and(|drag| drag.moved)
    }

    // Zoom

    /// Stepped zoom about the viewport centre, eased from the current
    /// transform. `now` is in milliseconds.
    pub fn zoom_in(&mut self, now: f64) {
        let target = self
            .target()
            .zoom_in(self.bounds, self.zoom_in_step, self.center);
        self.animate_to(target, now);
    }

    pub fn zoom_out(&mut self, now: f64) {
        let target = self
            .target()
            .zoom_out(self.bounds, self.zoom_out_step, self.center);
        self.animate_to(target, now);
    }

    /// Continuous wheel zoom about the cursor. Applied immediately.
    pub fn zoom_at(&mut self, delta: f64, x: f64, y: f64) {
        let base = self.target();
        self.transition = None;
        self.transform = base.zoom_at(self.bounds, delta, x, y);
    }

    pub fn reset(&mut self) {
        self.transition = None;
        self.transform = self.transform.reset(self.bounds, self.center);
    }

    /// Advance a running transition. Returns true while another frame is
    /// needed.
    pub fn tick(&mut self, now: f64) -> bool {
        let Some(transition) = self.transition else {
            return false;
        };
        match transition.sample(now) {
            Some(transform) => {
                self.transform = transform;
                true
            }
            None => {
                self.transform = transition.to;
                self.transition = None;
                false
            }
        }
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Where the view is heading: the running transition's end, or the
    /// current transform.
    fn target(&self) -> ViewTransform {
        self.transition.map_or(self.transform, |t| t.to)
    }

    fn animate_to(&mut self, target: ViewTransform, now: f64) {
        if self.transition_ms <= 0.0 {
            self.transition = None;
            self.transform = target;
            return;
        }
        self.transition = Some(ViewTransition::new(
            self.transform,
            target,
            now,
            self.transition_ms,
        ));
    }
}

fn normalize_step(step: f64, valid: impl Fn(f64) -> bool, fallback: f64) -> f64 {
    if step.is_finite() && valid(step) { step } else { fallback }
}
