pub mod alias;
pub mod boundary;
pub mod colors;
pub mod config;
pub mod detail;
pub mod entity;
pub mod format;
pub mod interaction;
pub mod map;
pub mod metrics;
pub mod projection;
pub mod ranking;
pub mod viewport;

pub use alias::{AliasConflict, AliasMap, NameReconciler};
pub use boundary::{
    BoundaryCollection, BoundaryFeature, BoundaryLoadError, CollectionId, LoadState, NameKeys,
    collection_from_response, parse_feature_collection,
};
pub use colors::{FillKind, FillStyle, RiskLevel, StrokeStyle};
pub use config::MapConfig;
pub use detail::{DetailPanel, MetricSummary};
pub use entity::{EntityIndex, ResolvedEntity};
pub use format::{ValueFormatter, default_formatter, format_inr_compact, format_ratio};
pub use interaction::{InteractionController, InteractionState, SelectionCallback, TooltipAnchor};
pub use map::{ChoroplethModel, MapStatus, RegionLabel, RegionStyle, Tooltip};
pub use metrics::{MetricIndex, MetricRecord};
pub use projection::{GeometryCache, ProjectedGeometry, ProjectedPath, Projection, ViewportSize};
pub use ranking::{RankBadge, rank_worst};
pub use viewport::{ViewTransform, ViewTransition, ZoomBounds};
