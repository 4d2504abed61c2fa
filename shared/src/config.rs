use crate::boundary::NameKeys;
use crate::interaction::{DEFAULT_ZOOM_IN_STEP, DEFAULT_ZOOM_OUT_STEP};
use crate::projection::ViewportSize;
use crate::viewport::ZoomBounds;

/// Tunables for one embedded map. `Default` gives the stock layout.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Fixed coordinate space paths are projected into.
    pub viewport: ViewportSize,
    pub detail_viewport: ViewportSize,
    /// Fraction of each viewport dimension kept clear around the fit.
    pub fit_padding: f64,
    pub zoom: ZoomBounds,
    pub detail_zoom: ZoomBounds,
    /// Multiplicative button steps. Zoom-in must exceed 1 and zoom-out must
    /// lie in (0, 1); other values fall back to 1.3 and 0.77.
    pub zoom_in_step: f64,
    pub zoom_out_step: f64,
    pub transition_ms: f64,
    pub name_keys: NameKeys,
    pub rank_limit: usize,
    /// Vertical badge offset from the label centroid, in viewport units.
    pub badge_offset_y: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportSize::new(800.0, 600.0),
            detail_viewport: ViewportSize::new(320.0, 240.0),
            fit_padding: 0.02,
            zoom: ZoomBounds::new(1.0, 8.0),
            detail_zoom: ZoomBounds::new(1.0, 6.0),
            zoom_in_step: DEFAULT_ZOOM_IN_STEP,
            zoom_out_step: DEFAULT_ZOOM_OUT_STEP,
            transition_ms: 250.0,
            name_keys: NameKeys::default(),
            rank_limit: 3,
            badge_offset_y: -18.0,
        }
    }
}
