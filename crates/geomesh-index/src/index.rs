//! Immutable k-d tree over named points.
//!
//! The tree is implicit: `order` is a permutation of point positions laid
//! out so that for any range `[lo, hi)` the median slot `lo + (hi - lo) / 2`
//! holds the splitting point, everything before it sorts at or below it on
//! the current axis and everything after it at or above. Axes alternate
//! latitude, longitude by depth.
//!
//! Distances are squared Euclidean in degree space. Ties on distance resolve
//! to the lowest insertion position.

use std::cmp::Ordering;

use geomesh_core::{GeoPoint, QueryLocation};

use crate::distance::planar_sq;
use crate::error::IndexError;

/// Spatial index answering "which indexed point is nearest to this location".
///
/// Built once with [`PointIndex::build`]; there are no mutation methods.
/// To reload, build a new index and swap it in through
/// [`crate::IndexHandle`].
#[derive(Debug, Clone, Default)]
pub struct PointIndex {
    points: Vec<GeoPoint>,
    order: Vec<usize>,
}

/// Best candidate found so far: squared distance and insertion position.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    dist_sq: f64,
    position: usize,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        match self.dist_sq.total_cmp(&other.dist_sq) {
            Ordering::Less => true,
            Ordering::Equal => self.position < other.position,
            Ordering::Greater => false,
        }
    }
}

impl PointIndex {
    /// An index with no points. Every query against it fails with
    /// [`IndexError::EmptyIndex`].
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the index from the full dataset in O(n log n).
    ///
    /// Insertion order is preserved and drives the tie-break in
    /// [`PointIndex::nearest`].
    ///
    /// # Errors
    ///
    /// - [`IndexError::EmptyDataset`] if `points` is empty.
    /// - [`IndexError::InvalidCoordinate`] naming the first point with a
    ///   non-finite or out-of-range coordinate.
    pub fn build(points: Vec<GeoPoint>) -> Result<Self, IndexError> {
        if points.is_empty() {
            return Err(IndexError::EmptyDataset);
        }

        for (position, point) in points.iter().enumerate() {
            point.validate().map_err(|source| {
                IndexError::invalid(format!("point '{}' (row {position})", point.name), source)
            })?;
        }

        let mut order: Vec<usize> = (0..points.len()).collect();
        partition(&points, &mut order, 0);

        tracing::info!(count = points.len(), "built point index");

        Ok(Self { points, order })
    }

    /// Returns the point nearest to `query` by planar distance.
    ///
    /// # Errors
    ///
    /// - [`IndexError::EmptyIndex`] if the index holds no points.
    /// - [`IndexError::InvalidCoordinate`] if `query` is out of range.
    pub fn nearest(&self, query: QueryLocation) -> Result<&GeoPoint, IndexError> {
        let position = self.nearest_position(query)?;
        Ok(&self.points[position])
    }

    /// Like [`PointIndex::nearest`] but returns the insertion position of
    /// the matched point.
    ///
    /// # Errors
    ///
    /// Same as [`PointIndex::nearest`].
    pub fn nearest_position(&self, query: QueryLocation) -> Result<usize, IndexError> {
        if self.points.is_empty() {
            return Err(IndexError::EmptyIndex);
        }
        query
            .validate()
            .map_err(|source| IndexError::invalid(format!("query location {query}"), source))?;

        let mut best: Option<Candidate> = None;
        self.search(0, self.order.len(), 0, [query.latitude, query.longitude], &mut best);

        best.map(|c| c.position).ok_or(IndexError::EmptyIndex)
    }

    fn search(
        &self,
        lo: usize,
        hi: usize,
        depth: usize,
        target: [f64; 2],
        best: &mut Option<Candidate>,
    ) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let position = self.order[mid];
        let point = &self.points[position];
        let coords = [point.latitude, point.longitude];

        let here = Candidate {
            dist_sq: planar_sq(target, coords),
            position,
        };
        if best.is_none_or(|b| here.beats(&b)) {
            *best = Some(here);
        }

        let axis = depth % 2;
        let diff = target[axis] - coords[axis];
        let (near, far) = if diff < 0.0 {
            ((lo, mid), (mid + 1, hi))
        } else {
            ((mid + 1, hi), (lo, mid))
        };

        self.search(near.0, near.1, depth + 1, target, best);

        // Equality still descends so an equidistant point with a lower
        // insertion position on the far side is not missed.
        if best.is_none_or(|b| diff * diff <= b.dist_sq) {
            self.search(far.0, far.1, depth + 1, target, best);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All indexed points in insertion order.
    #[must_use]
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&GeoPoint> {
        self.points.get(position)
    }

    /// Mean latitude and longitude of all points, used to center a map.
    #[must_use]
    pub fn centroid(&self) -> Option<QueryLocation> {
        if self.points.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.points.len() as f64;
        let (lat_sum, lon_sum) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(lat, lon), p| (lat + p.latitude, lon + p.longitude));
        Some(QueryLocation {
            latitude: lat_sum / n,
            longitude: lon_sum / n,
        })
    }
}

/// Recursively arranges `order` into implicit k-d tree layout.
fn partition(points: &[GeoPoint], order: &mut [usize], depth: usize) {
    if order.len() <= 1 {
        return;
    }
    let axis = depth % 2;
    let mid = order.len() / 2;
    order.select_nth_unstable_by(mid, |&a, &b| {
        axis_value(&points[a], axis)
            .total_cmp(&axis_value(&points[b], axis))
            .then(a.cmp(&b))
    });
    let (left, rest) = order.split_at_mut(mid);
    partition(points, left, depth + 1);
    partition(points, &mut rest[1..], depth + 1);
}

fn axis_value(point: &GeoPoint, axis: usize) -> f64 {
    if axis == 0 {
        point.latitude
    } else {
        point.longitude
    }
}

#[cfg(test)]
#[path = "index_test.rs"]
mod tests;
