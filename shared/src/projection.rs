use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::fmt::Write;
use std::sync::Arc;

use geo::{Centroid, Coord, LineString, MultiPolygon, Polygon};

use crate::boundary::{BoundaryCollection, BoundaryFeature, CollectionId};

/// Latitude limit of spherical Mercator; beyond it `y` diverges.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }
}

/// Spherical Mercator fitted to a viewport: `screen = mercator * scale + offset`,
/// with `y` flipped so north is up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lambda = lon.to_radians();
    let phi = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    (lambda, (FRAC_PI_4 + phi / 2.0).tan().ln())
}

impl Projection {
    /// Fit the extent of `features` into `viewport`, preserving aspect ratio.
    /// `padding` is a fraction of each viewport dimension kept clear on every
    /// side. Returns `None` for an empty or zero-extent input.
    pub fn fit(features: &[BoundaryFeature], viewport: ViewportSize, padding: f64) -> Option<Self> {
        if !viewport.is_drawable() {
            return None;
        }

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for coord in features.iter().flat_map(|f| all_coords(&f.geometry)) {
            let (x, y) = mercator(coord.x, coord.y);
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let world_w = max_x - min_x;
        let world_h = max_y - min_y;
        if !world_w.is_finite() || !world_h.is_finite() || (world_w <= 0.0 && world_h <= 0.0) {
            return None;
        }

        let padding = padding.clamp(0.0, 0.45);
        let inner_w = viewport.width * (1.0 - padding * 2.0);
        let inner_h = viewport.height * (1.0 - padding * 2.0);
        let scale_x = if world_w > 0.0 { inner_w / world_w } else { f64::INFINITY };
        let scale_y = if world_h > 0.0 { inner_h / world_h } else { f64::INFINITY };
        let scale = scale_x.min(scale_y);

        let center_x = (min_x + max_x) / 2.0;
        let center_y = (min_y + max_y) / 2.0;
        Some(Self {
            scale,
            offset_x: viewport.width / 2.0 - center_x * scale,
            offset_y: viewport.height / 2.0 + center_y * scale,
        })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Lon/lat degrees → viewport coordinates.
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = mercator(lon, lat);
        (x * self.scale + self.offset_x, -y * self.scale + self.offset_y)
    }

    /// Viewport coordinates → lon/lat degrees.
    pub fn invert(&self, sx: f64, sy: f64) -> (f64, f64) {
        let x = (sx - self.offset_x) / self.scale;
        let y = -(sy - self.offset_y) / self.scale;
        let lat = 2.0 * y.exp().atan() - FRAC_PI_2;
        (x.to_degrees(), lat.to_degrees())
    }

    fn project_ring(&self, ring: &LineString<f64>) -> LineString<f64> {
        ring.coords()
            .map(|c| {
                let (x, y) = self.project(c.x, c.y);
                Coord { x, y }
            })
            .collect()
    }

    fn project_geometry(&self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        geometry
            .0
            .iter()
            .map(|polygon| {
                Polygon::new(
                    self.project_ring(polygon.exterior()),
                    polygon
                        .interiors()
                        .iter()
                        .map(|ring| self.project_ring(ring))
                        .collect(),
                )
            })
            .collect()
    }
}

fn all_coords(geometry: &MultiPolygon<f64>) -> impl Iterator<Item = &Coord<f64>> {
    geometry.0.iter().flat_map(|polygon| {
        polygon
            .exterior()
            .coords()
            .chain(polygon.interiors().iter().flat_map(|ring| ring.coords()))
    })
}

/// Renderable geometry for one boundary feature, in viewport coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedPath {
    /// Index into the source collection.
    pub feature: usize,
    /// SVG path data, one `M…Z` subpath per ring.
    pub d: String,
    pub centroid: (f64, f64),
}

/// Projection output for a whole collection. Depends only on geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedGeometry {
    projection: Option<Projection>,
    viewport: Option<ViewportSize>,
    paths: Vec<ProjectedPath>,
    by_feature: Vec<Option<usize>>,
    dropped: Vec<usize>,
}

impl ProjectedGeometry {
    /// Project every feature. Features whose path is empty or whose centroid
    /// is not finite are recorded in `dropped` and excluded from `paths`.
    pub fn project(features: &[BoundaryFeature], viewport: ViewportSize, padding: f64) -> Self {
        let Some(projection) = Projection::fit(features, viewport, padding) else {
            return Self {
                viewport: Some(viewport),
                by_feature: vec![None; features.len()],
                dropped: (0..features.len()).collect(),
                ..Self::default()
            };
        };

        let mut paths = Vec::with_capacity(features.len());
        let mut by_feature = Vec::with_capacity(features.len());
        let mut dropped = Vec::new();

        for (idx, feature) in features.iter().enumerate() {
            let projected = projection.project_geometry(&feature.geometry);
            let d = path_data(&projected);
            let centroid = projected
                .centroid()
                .map(|p| (p.x(), p.y()))
                .filter(|(x, y)| x.is_finite() && y.is_finite());

            match centroid {
                Some(centroid) if !d.is_empty() => {
                    by_feature.push(Some(paths.len()));
                    paths.push(ProjectedPath {
                        feature: idx,
                        d,
                        centroid,
                    });
                }
                _ => {
                    by_feature.push(None);
                    dropped.push(idx);
                }
            }
        }

        Self {
            projection: Some(projection),
            viewport: Some(viewport),
            paths,
            by_feature,
            dropped,
        }
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    pub fn viewport(&self) -> Option<ViewportSize> {
        self.viewport
    }

    pub fn paths(&self) -> &[ProjectedPath] {
        &self.paths
    }

    pub fn path_for(&self, feature: usize) -> Option<&ProjectedPath> {
        self.by_feature
            .get(feature)
            .copied()
            .flatten()
            .map(|idx| &self.paths[idx])
    }

    /// Indices of features excluded as degenerate.
    pub fn dropped(&self) -> &[usize] {
        &self.dropped
    }

    /// Label anchor for an entity drawn from several features: the mean of
    /// the surviving per-part centroids.
    pub fn label_centroid(&self, features: &[usize]) -> Option<(f64, f64)> {
        let (sum_x, sum_y, count) = features
            .iter()
            .filter_map(|&feature| self.path_for(feature))
            .fold((0.0, 0.0, 0usize), |(sx, sy, n), path| {
                (sx + path.centroid.0, sy + path.centroid.1, n + 1)
            });
        (count > 0).then(|| (sum_x / count as f64, sum_y / count as f64))
    }
}

fn path_data(geometry: &MultiPolygon<f64>) -> String {
    let mut d = String::new();
    for polygon in &geometry.0 {
        write_ring(&mut d, polygon.exterior());
        for ring in polygon.interiors() {
            write_ring(&mut d, ring);
        }
    }
    d
}

fn write_ring(d: &mut String, ring: &LineString<f64>) {
    let coords = &ring.0;
    // A closed ring repeats its first point; `Z` closes it for us.
    let open_len = if coords.len() > 1 && coords.first() == coords.last() {
        coords.len() - 1
    } else {
        coords.len()
    };
    if open_len < 3 || coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return;
    }
    for (i, c) in coords[..open_len].iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        // Formatting into a String cannot fail.
        write!(d, "{cmd}{:.2},{:.2}", c.x, c.y).ok();
    }
    d.push('Z');
}

/// Memoizes [`ProjectedGeometry`] on collection identity and viewport size.
/// Metric refreshes and repaints never reach it.
#[derive(Debug, Clone, Default)]
pub struct GeometryCache {
    key: Option<(CollectionId, ViewportSize)>,
    geometry: Option<Arc<ProjectedGeometry>>,
    computations: u64,
}

impl GeometryCache {
    pub fn get_or_project(
        &mut self,
        collection: &BoundaryCollection,
        viewport: ViewportSize,
        padding: f64,
    ) -> Arc<ProjectedGeometry> {
        let key = (collection.id(), viewport);
        if self.key == Some(key)
            && let Some(geometry) = &self.geometry
        {
            return Arc::clone(geometry);
        }

        let geometry = Arc::new(ProjectedGeometry::project(
            collection.features(),
            viewport,
            padding,
        ));
        self.key = Some(key);
        self.geometry = Some(Arc::clone(&geometry));
        self.computations += 1;
        geometry
    }

    pub fn invalidate(&mut self) {
        self.key = None;
        self.geometry = None;
    }

    /// Number of projections actually computed.
    pub fn computations(&self) -> u64 {
        self.computations
    }
}
