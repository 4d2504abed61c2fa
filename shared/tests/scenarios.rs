use std::sync::{Arc, Mutex};

use leakmap_shared::colors::{FillKind, RiskLevel};
use leakmap_shared::{
    BoundaryCollection, ChoroplethModel, MapConfig, MapStatus, MetricRecord, NameKeys,
    NameReconciler, collection_from_response, parse_feature_collection,
};

const DISTRICTS: &[u8] = include_bytes!("../../data/districts.geojson");

fn districts() -> BoundaryCollection {
    parse_feature_collection(DISTRICTS, &NameKeys::default()).unwrap()
}

fn feature_index(collection: &BoundaryCollection, name: &str) -> usize {
    collection
        .features()
        .iter()
        .position(|f| f.name == name)
        .unwrap_or_else(|| panic!("{name} missing from demo data"))
}

fn ready_model(metrics: Vec<MetricRecord>) -> (ChoroplethModel, BoundaryCollection) {
    let collection = districts();
    let mut model = ChoroplethModel::new(MapConfig::default(), NameReconciler::with_builtin_aliases());
    model.set_metrics(metrics);
    assert!(model.finish_load(Ok(collection.clone())));
    (model, collection)
}

#[test]
fn demo_dataset_parses_with_name_key_fallback() {
    let collection = districts();
    assert_eq!(collection.len(), 11);
    assert!(collection.features().iter().all(|f| f.is_named()));
    // `dtname` is empty for this feature; `district` supplies the name.
    feature_index(&collection, "Guntur");
    feature_index(&collection, "Prakasam");

    let vizag = feature_index(&collection, "Visakhapatanam");
    assert_eq!(collection.features()[vizag].geometry.0.len(), 2);
}

#[test]
fn every_named_feature_renders_inside_the_viewport() {
    let (model, collection) = ready_model(Vec::new());
    let viewport = model.config().viewport;
    assert!(model.dropped().is_empty());
    assert_eq!(model.paths().len(), collection.len());
    for path in model.paths() {
        assert!(!path.d.is_empty());
        assert!(
            viewport.contains(path.centroid.0, path.centroid.1),
            "{} centroid {:?}",
            collection.features()[path.feature].name,
            path.centroid
        );
    }
}

#[test]
fn aliased_districts_pick_up_metrics_and_rank() {
    let (model, collection) = ready_model(vec![
        MetricRecord::new("Anantapur").with_ratio(0.62),
        MetricRecord::new("Nellore").with_ratio(0.95),
    ]);

    let anantapur = feature_index(&collection, "Ananthapuramu");
    let nellore = feature_index(&collection, "Sri Potti Sriramulu Nellore");
    assert_eq!(
        model.region_style(anantapur).fill.kind,
        FillKind::Risk(RiskLevel::High)
    );
    assert_eq!(
        model.region_style(nellore).fill.kind,
        FillKind::Risk(RiskLevel::Low)
    );

    let badges = model.badges();
    let ranked: Vec<_> = badges.iter().map(|b| b.canonical.as_str()).collect();
    assert_eq!(ranked, ["Anantapur", "Nellore"]);
    assert_eq!(badges[0].rank_label, "#1");
    assert_eq!(badges[0].ratio_label, "0.62");
}

#[test]
fn ranking_is_capped_and_worst_first() {
    let (model, _) = ready_model(vec![
        MetricRecord::new("Kurnool").with_ratio(0.81),
        MetricRecord::new("Guntur").with_ratio(0.44),
        MetricRecord::new("Kadapa").with_ratio(0.58),
        MetricRecord::new("Chittoor").with_ratio(0.93),
        MetricRecord::new("Prakasam"),
    ]);
    let badges = model.badges();
    assert_eq!(badges.len(), 3);
    let ranked: Vec<_> = badges.iter().map(|b| b.canonical.as_str()).collect();
    assert_eq!(ranked, ["Guntur", "Kadapa", "Kurnool"]);
}

#[test]
fn server_error_leaves_map_unavailable_with_no_paths() {
    let mut model = ChoroplethModel::default();
    let result = collection_from_response(500, DISTRICTS, &NameKeys::default());
    assert!(model.finish_load(result));
    match model.status() {
        MapStatus::Unavailable(message) => assert!(message.contains("500"), "{message}"),
        other => panic!("expected unavailable, got {other:?}"),
    }
    assert!(model.paths().is_empty());
    assert!(model.badges().is_empty());
}

#[test]
fn twenty_zoom_ins_settle_exactly_at_max() {
    let config = MapConfig {
        zoom: leakmap_shared::ZoomBounds::new(1.0, 6.0),
        ..MapConfig::default()
    };
    let mut model = ChoroplethModel::new(config, NameReconciler::with_builtin_aliases());
    assert!(model.finish_load(Ok(districts())));
    let mut now = 0.0;
    for _ in 0..20 {
        model.zoom_in(now);
        while model.tick(now) {
            now += 16.0;
        }
        now += 16.0;
    }
    assert_eq!(model.transform().scale, 6.0);
}

#[test]
fn clicking_nellore_without_callback_opens_detail() {
    let (mut model, collection) = ready_model(vec![MetricRecord::new("Nellore").with_ratio(0.95)]);
    let nellore = feature_index(&collection, "Sri Potti Sriramulu Nellore");
    assert!(model.click(nellore));
    assert_eq!(model.interaction().selected.as_deref(), Some("Nellore"));
    let detail = model.detail().unwrap();
    assert_eq!(detail.canonical(), "Nellore");
    assert_eq!(detail.summary().risk, Some(RiskLevel::Low));
    assert_eq!(detail.geometry().paths().len(), 1);
}

#[test]
fn click_callback_receives_canonical_name() {
    let (mut model, collection) = ready_model(Vec::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    model.set_selection_callback(Some(Arc::new(move |name: &str| {
        sink.lock().unwrap().push(name.to_owned());
    })));

    model.click(feature_index(&collection, "Y.S.R."));
    model.click(feature_index(&collection, "Visakhapatanam"));
    assert_eq!(*seen.lock().unwrap(), ["Kadapa", "Visakhapatnam"]);
}

#[test]
fn external_highlight_uses_metrics_vocabulary() {
    let (mut model, collection) = ready_model(Vec::new());
    model.set_active(Some("Anantapur"));
    let anantapur = feature_index(&collection, "Ananthapuramu");
    let kurnool = feature_index(&collection, "Kurnool");
    assert!(model.region_style(anantapur).stroke.glow);
    assert!(!model.region_style(kurnool).stroke.glow);
}
