use std::fmt;
use std::sync::Arc;

use geo::{Geometry, MultiPolygon, Polygon};
use geojson::GeoJson;

/// Property keys probed for a feature's display name, in priority order.
pub const DEFAULT_NAME_KEYS: &[&str] = &["dtname", "district"];

/// Ordered list of GeoJSON property keys tried when reading a feature name.
/// The first key holding a non-empty string wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameKeys(Vec<String>);

impl Default for NameKeys {
    fn default() -> Self {
        Self::new(DEFAULT_NAME_KEYS.iter().copied())
    }
}

impl NameKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    /// Read the feature name from a property bag. Returns an empty string when
    /// no key yields a non-empty value.
    pub fn read(&self, properties: Option<&geojson::JsonObject>) -> String {
        let Some(properties) = properties else {
            return String::new();
        };
        self.0
            .iter()
            .filter_map(|key| properties.get(key).and_then(|v| v.as_str()))
            .map(str::trim)
            .find(|name| !name.is_empty())
            .map(str::to_owned)
            .unwrap_or_default()
    }
}

/// One administrative boundary as sourced from the external dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    /// Raw name in boundary-dataset spelling.
    pub name: String,
    /// Lon/lat degrees.
    pub geometry: MultiPolygon<f64>,
}

impl BoundaryFeature {
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }

    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Identity of a loaded collection: a CRC32 over the source payload plus the
/// parsed feature count. Derived geometry is cached against this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionId {
    pub checksum: u32,
    pub features: usize,
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}-{}", self.checksum, self.features)
    }
}

/// Immutable feature collection produced by one successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCollection {
    id: CollectionId,
    features: Vec<BoundaryFeature>,
}

impl BoundaryCollection {
    /// Build a collection from already-parsed features. The checksum covers
    /// names and coordinate bits so equal inputs share an identity.
    pub fn from_features(features: Vec<BoundaryFeature>) -> Self {
        let mut hasher = crc32fast::Hasher::new();
        for feature in &features {
            hasher.update(feature.name.as_bytes());
            hasher.update(&[0]);
            for polygon in &feature.geometry.0 {
                for coord in polygon
                    .exterior()
                    .coords()
                    .chain(polygon.interiors().iter().flat_map(|ring| ring.coords()))
                {
                    hasher.update(&coord.x.to_bits().to_le_bytes());
                    hasher.update(&coord.y.to_bits().to_le_bytes());
                }
            }
        }
        let id = CollectionId {
            checksum: hasher.finalize(),
            features: features.len(),
        };
        Self { id, features }
    }

    pub fn id(&self) -> CollectionId {
        self.id
    }

    pub fn features(&self) -> &[BoundaryFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryLoadError {
    /// Transport failure or a non-success HTTP status.
    Network {
        status: Option<u16>,
        message: String,
    },
    /// Payload was not a GeoJSON FeatureCollection.
    Parse(String),
}

impl BoundaryLoadError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self::Network {
            status: Some(status),
            message: format!("HTTP {status}"),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

impl fmt::Display for BoundaryLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { message, .. } => write!(f, "boundary fetch failed: {message}"),
            Self::Parse(message) => write!(f, "boundary data malformed: {message}"),
        }
    }
}

impl std::error::Error for BoundaryLoadError {}

/// Parse a GeoJSON FeatureCollection into boundary features.
///
/// Non-polygonal geometries and features without geometry are skipped. Any
/// structural problem rejects the whole payload: a partial collection is never
/// returned.
pub fn parse_feature_collection(
    bytes: &[u8],
    keys: &NameKeys,
) -> Result<BoundaryCollection, BoundaryLoadError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| BoundaryLoadError::parse(format!("payload is not UTF-8: {e}")))?;
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| BoundaryLoadError::parse(e.to_string()))?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(BoundaryLoadError::parse("expected a FeatureCollection"));
    };

    let mut features = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let Some(geometry) = feature.geometry else {
            continue;
        };
        let geometry: Geometry<f64> = geometry
            .value
            .try_into()
            .map_err(|e: geojson::Error| BoundaryLoadError::parse(e.to_string()))?;
        let Some(polygons) = into_multi_polygon(geometry) else {
            continue;
        };
        let name = keys.read(feature.properties.as_ref());
        features.push(BoundaryFeature::new(name, polygons));
    }

    Ok(BoundaryCollection {
        id: CollectionId {
            checksum: crc32fast::hash(bytes),
            features: features.len(),
        },
        features,
    })
}

/// Map a transport result onto a collection. Non-2xx statuses fail before the
/// body is inspected.
pub fn collection_from_response(
    status: u16,
    body: &[u8],
    keys: &NameKeys,
) -> Result<BoundaryCollection, BoundaryLoadError> {
    if !(200..300).contains(&status) {
        return Err(BoundaryLoadError::status(status));
    }
    parse_feature_collection(body, keys)
}

fn into_multi_polygon(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(polygon) => Some(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(multi) if !multi.0.is_empty() => Some(multi),
        Geometry::GeometryCollection(collection) => {
            let polygons: Vec<Polygon<f64>> = collection
                .0
                .into_iter()
                .filter_map(into_multi_polygon)
                .flat_map(|multi| multi.0)
                .collect();
            (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
        }
        _ => None,
    }
}

/// Boundary load lifecycle. `Unavailable` is terminal until the host asks for
/// an explicit reload.
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Ready(Arc<BoundaryCollection>),
    Unavailable(BoundaryLoadError),
}

impl LoadState {
    /// Apply a fetch outcome. Only a `Loading` state accepts one; returns
    /// whether the state changed.
    pub fn resolve(&mut self, result: Result<BoundaryCollection, BoundaryLoadError>) -> bool {
        if !matches!(self, Self::Loading) {
            return false;
        }
        *self = match result {
            Ok(collection) => Self::Ready(Arc::new(collection)),
            Err(e) => Self::Unavailable(e),
        };
        true
    }

    pub fn reload(&mut self) {
        *self = Self::Loading;
    }

    pub fn collection(&self) -> Option<&Arc<BoundaryCollection>> {
        match self {
            Self::Ready(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&BoundaryLoadError> {
        match self {
            Self::Unavailable(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}
