use crate::entity::EntityIndex;
use crate::format::format_ratio;
use crate::projection::ProjectedGeometry;

/// Badge drawn next to one of the worst-ratio entities.
#[derive(Debug, Clone, PartialEq)]
pub struct RankBadge {
    /// 1-based.
    pub rank: usize,
    pub canonical: String,
    pub ratio: f64,
    pub rank_label: String,
    pub ratio_label: String,
    /// Viewport coordinates, already offset from the label centroid.
    pub position: (f64, f64),
}

/// Up to `limit` entities with the lowest ratio, worst first. Ties keep
/// entity order. Entities without a ratio or without any drawable geometry
/// are skipped, and the list is never padded.
pub fn rank_worst(
    entities: &EntityIndex,
    geometry: &ProjectedGeometry,
    limit: usize,
    offset_y: f64,
) -> Vec<RankBadge> {
    let mut candidates: Vec<_> = entities
        .iter()
        .filter_map(|entity| {
            let ratio = entity.ratio()?;
            let centroid = geometry.label_centroid(&entity.features)?;
            Some((entity, ratio, centroid))
        })
        .collect();

    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

    candidates
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, (entity, ratio, (x, y)))| RankBadge {
            rank: idx + 1,
            canonical: entity.canonical.clone(),
            ratio,
            rank_label: format!("#{}", idx + 1),
            ratio_label: format_ratio(ratio),
            position: (x, y + offset_y),
        })
        .collect()
}
