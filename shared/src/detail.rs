use crate::boundary::BoundaryFeature;
use crate::colors::RiskLevel;
use crate::config::MapConfig;
use crate::entity::ResolvedEntity;
use crate::format::{ValueFormatter, format_ratio};
use crate::interaction::InteractionController;
use crate::projection::ProjectedGeometry;
use crate::viewport::ViewTransform;

pub const NO_DATA: &str = "No data";

/// Metric figures shown beside the detail map.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSummary {
    pub ratio: Option<f64>,
    pub ratio_label: String,
    pub risk: Option<RiskLevel>,
    pub sub_case_count: Option<u64>,
    pub sub_office_count: Option<u64>,
    pub transaction_count: Option<u64>,
    /// Estimated loss already run through the host formatter.
    pub estimated_loss: Option<String>,
}

impl MetricSummary {
    pub fn from_entity(entity: &ResolvedEntity, formatter: &ValueFormatter) -> Self {
        let metric = entity.metric.as_ref();
        let ratio = entity.ratio();
        Self {
            ratio,
            ratio_label: ratio.map_or_else(|| NO_DATA.to_string(), format_ratio),
            risk: ratio.map(RiskLevel::from_ratio),
            sub_case_count: metric.and_then(|m| m.sub_case_count),
            sub_office_count: metric.and_then(|m| m.sub_office_count),
            transaction_count: metric.and_then(|m| m.transaction_count),
            estimated_loss: metric
                .and_then(|m| m.estimated_loss)
                .map(|loss| formatter(loss)),
        }
    }

    /// Label/value rows in display order. Absent figures render as "—".
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let count = |value: Option<u64>| value.map_or_else(|| "—".to_string(), |v| v.to_string());
        vec![
            ("Ratio", self.ratio_label.clone()),
            (
                "Risk",
                self.risk
                    .map_or_else(|| NO_DATA.to_string(), |r| r.label().to_string()),
            ),
            ("Sub-cases", count(self.sub_case_count)),
            ("Sub-offices", count(self.sub_office_count)),
            ("Transactions", count(self.transaction_count)),
            (
                "Estimated loss",
                self.estimated_loss.clone().unwrap_or_else(|| "—".to_string()),
            ),
        ]
    }
}

/// Drill-down view for the selected entity: its own geometry re-fit to the
/// panel viewport, with a pan/zoom state separate from the main map.
#[derive(Debug)]
pub struct DetailPanel {
    canonical: String,
    geometry: ProjectedGeometry,
    controller: InteractionController,
    summary: MetricSummary,
}

impl DetailPanel {
    /// `features` is the full collection; only the entity's parts are kept.
    pub fn open(
        entity: &ResolvedEntity,
        features: &[BoundaryFeature],
        config: &MapConfig,
        formatter: &ValueFormatter,
    ) -> Self {
        let scoped: Vec<BoundaryFeature> = entity
            .features
            .iter()
            .filter_map(|&idx| features.get(idx).cloned())
            .collect();
        let geometry =
            ProjectedGeometry::project(&scoped, config.detail_viewport, config.fit_padding);
        let controller = InteractionController::new(
            config.detail_zoom,
            config.zoom_in_step,
            config.zoom_out_step,
            config.transition_ms,
            config.detail_viewport.center(),
        );
        Self {
            canonical: entity.canonical.clone(),
            geometry,
            controller,
            summary: MetricSummary::from_entity(entity, formatter),
        }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn geometry(&self) -> &ProjectedGeometry {
        &self.geometry
    }

    pub fn summary(&self) -> &MetricSummary {
        &self.summary
    }

    /// Rebuild the summary after a metrics refresh. Geometry and zoom stay.
    pub fn refresh_summary(&mut self, entity: &ResolvedEntity, formatter: &ValueFormatter) {
        self.summary = MetricSummary::from_entity(entity, formatter);
    }

    pub fn transform(&self) -> ViewTransform {
        self.controller.transform()
    }

    pub fn zoom_in(&mut self, now: f64) {
        self.controller.zoom_in(now);
    }

    pub fn zoom_out(&mut self, now: f64) {
        self.controller.zoom_out(now);
    }

    pub fn zoom_at(&mut self, delta: f64, x: f64, y: f64) {
        self.controller.zoom_at(delta, x, y);
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

    pub fn reset(&mut self) {
        self.controller.reset();
    }

    pub fn tick(&mut self, now: f64) -> bool {
        self.controller.tick(now)
    }
}
