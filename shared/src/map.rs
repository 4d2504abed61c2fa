use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::alias::NameReconciler;
use crate::boundary::{BoundaryCollection, BoundaryLoadError, LoadState};
use crate::colors::{FillStyle, StrokeStyle, resolve_fill, resolve_stroke};
use crate::config::MapConfig;
use crate::detail::{DetailPanel, NO_DATA};
use crate::entity::EntityIndex;
use crate::format::{ValueFormatter, default_formatter, format_ratio};
use crate::interaction::{InteractionController, InteractionState, SelectionCallback, TooltipAnchor};
use crate::metrics::{MetricIndex, MetricRecord};
use crate::projection::{GeometryCache, ProjectedGeometry, ProjectedPath};
use crate::ranking::{RankBadge, rank_worst};
use crate::viewport::ViewTransform;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapStatus {
    Loading,
    Ready,
    /// Terminal until reload; carries a short human-readable reason.
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionStyle {
    pub fill: FillStyle,
    pub stroke: StrokeStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub name: String,
    pub ratio_label: String,
    pub loss_label: Option<String>,
    pub anchor: TooltipAnchor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionLabel {
    pub canonical: String,
    pub position: (f64, f64),
}

/// Everything one embedded choropleth needs between events: load state,
/// memoized geometry, name resolution, current metrics, interaction and the
/// open detail panel. Pointer handlers address regions by feature index.
pub struct ChoroplethModel {
    config: MapConfig,
    reconciler: NameReconciler,
    load: LoadState,
    cache: GeometryCache,
    geometry: Arc<ProjectedGeometry>,
    entities: EntityIndex,
    metrics: MetricIndex,
    active: Option<String>,
    active_names: HashSet<String>,
    controller: InteractionController,
    detail: Option<DetailPanel>,
    formatter: ValueFormatter,
    revision: u64,
}

impl fmt::Debug for ChoroplethModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChoroplethModel")
            .field("status", &self.status())
            .field("entities", &self.entities.len())
            .field("metrics", &self.metrics.len())
            .field("active", &self.active)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

impl Default for ChoroplethModel {
    fn default() -> Self {
        Self::new(MapConfig::default(), NameReconciler::with_builtin_aliases())
    }
}

impl ChoroplethModel {
    pub fn new(config: MapConfig, reconciler: NameReconciler) -> Self {
        let controller = InteractionController::new(
            config.zoom,
            config.zoom_in_step,
            config.zoom_out_step,
            config.transition_ms,
            config.viewport.center(),
        );
        Self {
            config,
            reconciler,
            load: LoadState::default(),
            cache: GeometryCache::default(),
            geometry: Arc::default(),
            entities: EntityIndex::default(),
            metrics: MetricIndex::default(),
            active: None,
            active_names: HashSet::new(),
            controller,
            detail: None,
            formatter: default_formatter(),
            revision: 0,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    // Loading

    /// Back to `Loading`, dropping any rendered geometry and open panel.
    pub fn reload(&mut self) {
        self.load.reload();
        self.geometry = Arc::default();
        self.entities = EntityIndex::default();
        self.detail = None;
        self.controller.clear_hover();
        self.controller.close_selection();
        self.revision += 1;
    }

    /// Apply the boundary fetch outcome. Ignored unless currently loading.
    pub fn finish_load(&mut self, result: Result<BoundaryCollection, BoundaryLoadError>) -> bool {
        if !self.load.resolve(result) {
            return false;
        }
        if let Some(collection) = self.load.collection().cloned() {
            self.geometry = self.cache.get_or_project(
                &collection,
                self.config.viewport,
                self.config.fit_padding,
            );
            self.entities = EntityIndex::build(&collection, &self.reconciler);
            self.entities.bind_metrics(&self.metrics);
        }
        self.revision += 1;
        true
    }

    /// Bumped whenever the drawable path set may have changed.
    pub fn geometry_revision(&self) -> u64 {
        self.revision
    }

    pub fn status(&self) -> MapStatus {
        match &self.load {
            LoadState::Loading => MapStatus::Loading,
            LoadState::Ready(_) => MapStatus::Ready,
            LoadState::Unavailable(e) => MapStatus::Unavailable(e.to_string()),
        }
    }

    // Host inputs

    /// Replace every metric record. Projected geometry is untouched.
    pub fn set_metrics(&mut self, records: Vec<MetricRecord>) {
        self.metrics = MetricIndex::new(records);
        self.entities.bind_metrics(&self.metrics);
        if let Some(detail) = &mut self.detail
            && let Some(entity) = self.entities.get(detail.canonical())
        {
            detail.refresh_summary(entity, &self.formatter);
        }
    }

    pub fn metrics(&self) -> &MetricIndex {
        &self.metrics
    }

    /// Externally highlighted entity, in metrics vocabulary.
    pub fn set_active(&mut self, name: Option<&str>) {
        self.active = name.map(str::to_owned);
        self.active_names = name
            .map(|name| {
                self.reconciler
                    .resolve_to_boundary_names(name)
                    .into_iter()
                    .collect()
            })
            .unwrap_or_default();
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn set_selection_callback(&mut self, callback: Option<SelectionCallback>) {
        self.controller.set_selection_callback(callback);
    }

    pub fn set_formatter(&mut self, formatter: Option<ValueFormatter>) {
        self.formatter = formatter.unwrap_or_else(default_formatter);
    }

    // Pointer events. Unknown or unnamed features are ignored.

    pub fn pointer_enter(&mut self, feature: usize, x: f64, y: f64) {
        if let Some(entity) = self.entities.entity_for_feature(feature) {
            self.controller
                .hover_enter(&entity.canonical, TooltipAnchor { x, y });
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.controller.hover_move(TooltipAnchor { x, y });
    }

    pub fn pointer_leave(&mut self, feature: usize) {
        if let Some(entity) = self.entities.entity_for_feature(feature) {
            self.controller.hover_leave(&entity.canonical);
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.controller.pointer_down(x, y);
    }

    pub fn pointer_drag(&mut self, x: f64, y: f64) -> bool {
        self.controller.pointer_drag(x, y)
    }

    pub fn pointer_up(&mut self) {
        self.controller.pointer_up();
    }

    /// Select the entity drawn by `feature` and open its detail panel.
    /// Returns false for drags, unnamed features, or before load.
    pub fn click(&mut self, feature: usize) -> bool {
        let Some(collection) = self.load.collection() else {
            return false;
        };
        let Some(entity) = self.entities.entity_for_feature(feature) else {
            return false;
        };
        if !self.controller.click(&entity.canonical) {
            return false;
        }
        self.detail = Some(DetailPanel::open(
            entity,
            collection.features(),
            &self.config,
            &self.formatter,
        ));
        true
    }

    pub fn close_detail(&mut self) {
        self.controller.close_selection();
        self.detail = None;
    }

    // View

    pub fn zoom_in(&mut self, now: f64) {
        self.controller.zoom_in(now);
    }

    pub fn zoom_out(&mut self, now: f64) {
        self.controller.zoom_out(now);
    }

    pub fn zoom_at(&mut self, delta: f64, x: f64, y: f64) {
        self.controller.zoom_at(delta, x, y);
    }

    pub fn reset_view(&mut self) {
        self.controller.reset();
    }

    /// Advance eased transitions. True while more frames are needed.
    pub fn tick(&mut self, now: f64) -> bool {
        let main = self.controller.tick(now);
        let detail = self.detail.as_mut().is_some_and(|d| d.tick(now));
        main || detail
    }

    pub fn transform(&self) -> ViewTransform {
        self.controller.transform()
    }

    pub fn interaction(&self) -> &InteractionState {
        self.controller.state()
    }

    pub fn is_dragging(&self) -> bool {
        self.controller.is_dragging()
    }

    // Render plan

    /// Drawable paths. Empty unless loaded.
    pub fn paths(&self) -> &[ProjectedPath] {
        self.geometry.paths()
    }

    /// Features excluded from rendering as degenerate.
    pub fn dropped(&self) -> &[usize] {
        self.geometry.dropped()
    }

    pub fn entities(&self) -> &EntityIndex {
        &self.entities
    }

    pub fn region_style(&self, feature: usize) -> RegionStyle {
        let state = self.controller.state();
        let entity = self.entities.entity_for_feature(feature);
        let canonical = entity.map(|e| e.canonical.as_str());

        let hovered = canonical.is_some()
            && state.hover.as_ref().map(|h| h.entity.as_str()) == canonical;
        let selected = canonical.is_some() && state.selected.as_deref() == canonical;
        let active = self
            .load
            .collection()
            .and_then(|c| c.features().get(feature))
            .is_some_and(|f| f.is_named() && self.active_names.contains(&f.name));

        RegionStyle {
            fill: resolve_fill(
                entity.and_then(|e| e.ratio()),
                self.entities.neutral_order(feature),
                hovered,
            ),
            stroke: resolve_stroke(selected, active),
        }
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        let hover = self.controller.state().hover.as_ref()?;
        let entity = self.entities.get(&hover.entity)?;
        let metric = entity.metric.as_ref();
        Some(Tooltip {
            name: entity.canonical.clone(),
            ratio_label: entity
                .ratio()
                .map_or_else(|| NO_DATA.to_string(), format_ratio),
            loss_label: metric
                .and_then(|m| m.estimated_loss)
                .map(|loss| (self.formatter)(loss)),
            anchor: hover.anchor,
        })
    }

    pub fn badges(&self) -> Vec<RankBadge> {
        rank_worst(
            &self.entities,
            &self.geometry,
            self.config.rank_limit,
            self.config.badge_offset_y,
        )
    }

    /// One label per entity with drawable geometry.
    pub fn labels(&self) -> Vec<RegionLabel> {
        self.entities
            .iter()
            .filter_map(|entity| {
                let position = self.geometry.label_centroid(&entity.features)?;
                Some(RegionLabel {
                    canonical: entity.canonical.clone(),
                    position,
                })
            })
            .collect()
    }

    pub fn detail(&self) -> Option<&DetailPanel> {
        self.detail.as_ref()
    }

    pub fn detail_mut(&mut self) -> Option<&mut DetailPanel> {
        self.detail.as_mut()
    }

    pub fn geometry_computations(&self) -> u64 {
        self.cache.computations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryFeature;
    use crate::colors::{ACTIVE_STROKE_WIDTH, BASE_STROKE_WIDTH, FillKind, RiskLevel};
    use crate::viewport::ZoomBounds;
    use geo::{MultiPolygon, polygon};
    use std::sync::Mutex;

    fn square(name: &str, lon: f64) -> BoundaryFeature {
        BoundaryFeature::new(
            name,
            MultiPolygon::new(vec![polygon![
                (x: lon, y: 14.0),
                (x: lon + 1.0, y: 14.0),
                (x: lon + 1.0, y: 15.0),
                (x: lon, y: 15.0),
                (x: lon, y: 14.0),
            ]]),
        )
    }

    fn loaded() -> ChoroplethModel {
        let mut model = ChoroplethModel::default();
        model.set_metrics(vec![
            MetricRecord::new("Anantapur").with_ratio(0.62),
            MetricRecord {
                estimated_loss: Some(410_000.0),
                ..MetricRecord::new("Nellore").with_ratio(0.95)
            },
        ]);
        assert!(model.finish_load(Ok(BoundaryCollection::from_features(vec![
            square("Ananthapuramu", 77.0),
            square("Sri Potti Sriramulu Nellore", 79.0),
            square("Guntur", 80.0),
            square("", 81.0),
            square("S.P.S. Nellore", 79.5),
        ]))));
        model
    }

    #[test]
    fn interactions_before_load_are_noops() {
        let mut model = ChoroplethModel::default();
        assert_eq!(model.status(), MapStatus::Loading);
        model.pointer_enter(0, 1.0, 1.0);
        assert!(!model.click(0));
        assert!(model.tooltip().is_none());
        assert!(model.paths().is_empty());
        assert!(model.badges().is_empty());
        model.zoom_in(0.0);
        model.close_detail();
    }

    #[test]
    fn failed_load_is_terminal_until_reload() {
        let mut model = ChoroplethModel::default();
        assert!(model.finish_load(Err(BoundaryLoadError::status(500))));
        assert!(matches!(model.status(), MapStatus::Unavailable(_)));
        assert!(model.paths().is_empty());

        let late = BoundaryCollection::from_features(vec![square("Guntur", 80.0)]);
        assert!(!model.finish_load(Ok(late.clone())));
        assert!(model.paths().is_empty());

        model.reload();
        assert!(model.finish_load(Ok(late)));
        assert_eq!(model.status(), MapStatus::Ready);
        assert_eq!(model.paths().len(), 1);
    }

    #[test]
    fn fills_follow_reconciled_metrics() {
        let model = loaded();
        assert_eq!(model.region_style(0).fill.kind, FillKind::Risk(RiskLevel::High));
        assert_eq!(model.region_style(1).fill.kind, FillKind::Risk(RiskLevel::Low));
        assert_eq!(model.region_style(4).fill.kind, FillKind::Risk(RiskLevel::Low));
        assert_eq!(model.region_style(2).fill.kind, FillKind::Neutral);
        assert_eq!(model.region_style(3).fill.kind, FillKind::Neutral);
        assert_ne!(model.region_style(2).fill.color, model.region_style(3).fill.color);
    }

    #[test]
    fn metric_refresh_does_not_reproject() {
        let mut model = loaded();
        assert_eq!(model.geometry_computations(), 1);
        model.set_metrics(vec![MetricRecord::new("Guntur").with_ratio(0.75)]);
        assert_eq!(model.geometry_computations(), 1);
        assert_eq!(model.region_style(2).fill.kind, FillKind::Risk(RiskLevel::Medium));
        assert_eq!(model.region_style(0).fill.kind, FillKind::Neutral);
    }

    #[test]
    fn hovering_any_part_highlights_the_whole_entity() {
        let mut model = loaded();
        model.pointer_enter(1, 40.0, 50.0);
        assert_eq!(model.region_style(1).fill.kind, FillKind::Hover);
        assert_eq!(model.region_style(4).fill.kind, FillKind::Hover);
        assert_eq!(model.region_style(0).fill.kind, FillKind::Risk(RiskLevel::High));

        let tooltip = model.tooltip().unwrap();
        assert_eq!(tooltip.name, "Nellore");
        assert_eq!(tooltip.ratio_label, "0.95");
        assert_eq!(tooltip.loss_label.as_deref(), Some("₹4.10 L"));

        model.pointer_move(42.0, 55.0);
        assert_eq!(model.tooltip().unwrap().anchor, TooltipAnchor { x: 42.0, y: 55.0 });

        model.pointer_leave(4);
        assert!(model.tooltip().is_none());
    }

    #[test]
    fn unnamed_features_are_not_interactive() {
        let mut model = loaded();
        model.pointer_enter(3, 1.0, 1.0);
        assert!(model.tooltip().is_none());
        assert!(!model.click(3));
        assert!(model.interaction().selected.is_none());
    }

    #[test]
    fn tooltip_without_metric_says_no_data() {
        let mut model = loaded();
        model.pointer_enter(2, 0.0, 0.0);
        let tooltip = model.tooltip().unwrap();
        assert_eq!(tooltip.ratio_label, NO_DATA);
        assert_eq!(tooltip.loss_label, None);
    }

    #[test]
    fn every_part_click_reports_same_canonical_name_once() {
        let calls = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&calls);
        let mut model = loaded();
        model.set_selection_callback(Some(Arc::new(move |name: &str| {
            sink.lock().unwrap().push(name.to_owned());
        })));

        assert!(model.click(1));
        assert!(model.click(4));
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["Nellore".to_string(), "Nellore".to_string()]
        );
        assert_eq!(model.detail().map(|d| d.canonical()), Some("Nellore"));
        assert_eq!(model.detail().unwrap().geometry().paths().len(), 2);
        assert_eq!(model.region_style(1).stroke.width, ACTIVE_STROKE_WIDTH);
    }

    #[test]
    fn new_selection_replaces_panel_and_close_keeps_hover() {
        let mut model = loaded();
        model.click(0);
        model.click(1);
        assert_eq!(model.detail().unwrap().canonical(), "Nellore");

        model.pointer_enter(2, 5.0, 5.0);
        model.close_detail();
        assert!(model.detail().is_none());
        assert!(model.interaction().selected.is_none());
        assert_eq!(model.tooltip().unwrap().name, "Guntur");
    }

    #[test]
    fn detail_summary_follows_metric_refresh() {
        let mut model = loaded();
        model.click(0);
        assert_eq!(model.detail().unwrap().summary().ratio_label, "0.62");
        model.set_metrics(vec![MetricRecord::new("Anantapur").with_ratio(0.81)]);
        assert_eq!(model.detail().unwrap().summary().ratio_label, "0.81");
    }

    #[test]
    fn active_name_lights_every_boundary_spelling() {
        let mut model = loaded();
        model.set_active(Some("Nellore"));
        assert_eq!(model.region_style(1).stroke.width, ACTIVE_STROKE_WIDTH);
        assert_eq!(model.region_style(4).stroke.width, ACTIVE_STROKE_WIDTH);
        assert_eq!(model.region_style(0).stroke.width, BASE_STROKE_WIDTH);
        // Highlight never changes the fill.
        assert_eq!(model.region_style(1).fill.kind, FillKind::Risk(RiskLevel::Low));

        model.set_active(None);
        assert_eq!(model.region_style(1).stroke.width, BASE_STROKE_WIDTH);
    }

    #[test]
    fn badges_rank_only_entities_with_ratio() {
        let model = loaded();
        let badges = model.badges();
        let names: Vec<_> = badges.iter().map(|b| b.canonical.as_str()).collect();
        assert_eq!(names, ["Anantapur", "Nellore"]);
    }

    #[test]
    fn labels_cover_named_entities() {
        let model = loaded();
        let labels = model.labels();
        assert_eq!(labels.len(), 3);
        assert!(labels.iter().any(|l| l.canonical == "Guntur"));
    }

    #[test]
    fn view_starts_and_resets_inside_tight_zoom_bounds() {
        let config = MapConfig {
            zoom: ZoomBounds::new(2.0, 6.0),
            detail_zoom: ZoomBounds::new(1.5, 4.0),
            transition_ms: 0.0,
            ..MapConfig::default()
        };
        let mut model = ChoroplethModel::new(config, NameReconciler::with_builtin_aliases());
        assert_eq!(model.transform().scale, 2.0);

        assert!(model.finish_load(Ok(BoundaryCollection::from_features(vec![
            square("Guntur", 80.0),
            square("Kurnool", 78.0),
        ]))));
        model.zoom_in(0.0);
        model.zoom_at(-300.0, 120.0, 80.0);
        model.reset_view();
        assert_eq!(model.transform().scale, 2.0);
        for _ in 0..10 {
            model.zoom_out(0.0);
            assert!(model.transform().scale >= 2.0);
        }

        assert!(model.click(0));
        let detail = model.detail().expect("detail opens on click");
        assert_eq!(detail.transform().scale, 1.5);
        let detail = model.detail_mut().expect("detail still open");
        detail.zoom_at(-1.0e6, 10.0, 10.0);
        assert_eq!(detail.transform().scale, 4.0);
        detail.reset();
        assert_eq!(detail.transform().scale, 1.5);
    }
}
