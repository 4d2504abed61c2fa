use std::collections::HashMap;

use crate::alias::NameReconciler;
use crate::boundary::BoundaryCollection;
use crate::metrics::{MetricIndex, MetricRecord};

/// One logical region: a canonical name and every feature drawing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntity {
    pub canonical: String,
    /// Source feature indices, ascending. Never empty.
    pub features: Vec<usize>,
    pub metric: Option<MetricRecord>,
}

impl ResolvedEntity {
    pub fn ratio(&self) -> Option<f64> {
        self.metric.as_ref().and_then(MetricRecord::ratio_value)
    }
}

/// Features grouped by canonical name. Unnamed features belong to no entity
/// and are not interactive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityIndex {
    entities: Vec<ResolvedEntity>,
    by_feature: Vec<Option<usize>>,
    by_name: HashMap<String, usize>,
}

impl EntityIndex {
    /// Entities are ordered by the first feature that names them.
    pub fn build(collection: &BoundaryCollection, reconciler: &NameReconciler) -> Self {
        let mut index = Self {
            by_feature: Vec::with_capacity(collection.len()),
            ..Self::default()
        };

        for (idx, feature) in collection.features().iter().enumerate() {
            if !feature.is_named() {
                index.by_feature.push(None);
                continue;
            }
            let canonical = reconciler.resolve_to_canonical(&feature.name);
            let ordinal = match index.by_name.get(canonical) {
                Some(&ordinal) => ordinal,
                None => {
                    let ordinal = index.entities.len();
                    index.entities.push(ResolvedEntity {
                        canonical: canonical.to_owned(),
                        features: Vec::new(),
                        metric: None,
                    });
                    index.by_name.insert(canonical.to_owned(), ordinal);
                    ordinal
                }
            };
            index.entities[ordinal].features.push(idx);
            index.by_feature.push(Some(ordinal));
        }

        index
    }

    /// Attach the current metric records, replacing any previous binding.
    pub fn bind_metrics(&mut self, metrics: &MetricIndex) {
        for entity in &mut self.entities {
            entity.metric = metrics.get(&entity.canonical).cloned();
        }
    }

    pub fn entity_for_feature(&self, feature: usize) -> Option<&ResolvedEntity> {
        self.ordinal_for_feature(feature)
            .map(|ordinal| &self.entities[ordinal])
    }

    pub fn ordinal_for_feature(&self, feature: usize) -> Option<usize> {
        self.by_feature.get(feature).copied().flatten()
    }

    pub fn get(&self, canonical: &str) -> Option<&ResolvedEntity> {
        self.by_name.get(canonical).map(|&ordinal| &self.entities[ordinal])
    }

    /// Stable colour order for a feature's neutral fill. Unnamed features are
    /// placed after every entity so they never share an entity's hue.
    pub fn neutral_order(&self, feature: usize) -> usize {
        self.ordinal_for_feature(feature)
            .unwrap_or(self.entities.len() + feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedEntity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryFeature;
    use geo::{MultiPolygon, polygon};

    fn feature(name: &str, lon: f64) -> BoundaryFeature {
        BoundaryFeature::new(
            name,
            MultiPolygon::new(vec![polygon![
                (x: lon, y: 14.0),
                (x: lon + 1.0, y: 14.0),
                (x: lon + 1.0, y: 15.0),
                (x: lon, y: 14.0),
            ]]),
        )
    }

    fn sample() -> BoundaryCollection {
        BoundaryCollection::from_features(vec![
            feature("Ananthapuramu", 77.0),
            feature("Guntur", 80.0),
            feature("", 81.0),
            feature("Y.S.R.", 78.0),
            feature("Anantapur", 77.5),
            feature("YSR Kadapa", 78.5),
        ])
    }

    #[test]
    fn aliased_spellings_merge_into_one_entity() {
        let index = EntityIndex::build(&sample(), &NameReconciler::with_builtin_aliases());
        assert_eq!(index.len(), 3);

        let anantapur = index.get("Anantapur").unwrap();
        assert_eq!(anantapur.features, vec![0, 4]);
        let kadapa = index.get("Kadapa").unwrap();
        assert_eq!(kadapa.features, vec![3, 5]);

        assert_eq!(index.entity_for_feature(4).unwrap().canonical, "Anantapur");
        assert!(index.entity_for_feature(2).is_none());
        assert!(index.entity_for_feature(99).is_none());
    }

    #[test]
    fn entities_keep_first_appearance_order() {
        let index = EntityIndex::build(&sample(), &NameReconciler::with_builtin_aliases());
        let names: Vec<_> = index.iter().map(|e| e.canonical.as_str()).collect();
        assert_eq!(names, ["Anantapur", "Guntur", "Kadapa"]);
        assert_eq!(index.neutral_order(5), 2);
        assert_eq!(index.neutral_order(2), 3 + 2);
    }

    #[test]
    fn metrics_bind_by_canonical_name_and_rebind_on_refresh() {
        let mut index = EntityIndex::build(&sample(), &NameReconciler::with_builtin_aliases());
        index.bind_metrics(&MetricIndex::new(vec![
            MetricRecord::new("Anantapur").with_ratio(0.62),
            MetricRecord::new("Ananthapuramu").with_ratio(0.10),
        ]));
        assert_eq!(index.get("Anantapur").unwrap().ratio(), Some(0.62));
        assert_eq!(index.get("Guntur").unwrap().ratio(), None);

        index.bind_metrics(&MetricIndex::new(vec![
            MetricRecord::new("Guntur").with_ratio(0.8),
        ]));
        assert_eq!(index.get("Anantapur").unwrap().ratio(), None);
        assert_eq!(index.get("Guntur").unwrap().ratio(), Some(0.8));
    }
}
