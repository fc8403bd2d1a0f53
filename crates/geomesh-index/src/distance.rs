//! Distance metrics.
//!
//! [`geodesic_km`] is the reportable distance: the WGS-84 ellipsoidal
//! geodesic (Karney's method, through `geo`'s `Geodesic` metric). The planar
//! metric is what the index uses to pick a candidate.

use geo::{Distance, Geodesic, Point};
use geomesh_core::QueryLocation;

use crate::error::IndexError;

/// Geodesic distance between `a` and `b` in kilometers, unrounded.
///
/// The arguments are put in a canonical order before computing so that
/// `geodesic_km(a, b)` and `geodesic_km(b, a)` are bit-for-bit equal.
///
/// # Errors
///
/// Returns [`IndexError::InvalidCoordinate`] if either location is
/// non-finite or out of range.
pub fn geodesic_km(a: QueryLocation, b: QueryLocation) -> Result<f64, IndexError> {
    a.validate()
        .map_err(|source| IndexError::invalid(format!("distance origin {a}"), source))?;
    b.validate()
        .map_err(|source| IndexError::invalid(format!("distance destination {b}"), source))?;

    let (first, second) = if (a.latitude, a.longitude) <= (b.latitude, b.longitude) {
        (a, b)
    } else {
        (b, a)
    };

    let meters = Geodesic.distance(
        Point::new(first.longitude, first.latitude),
        Point::new(second.longitude, second.latitude),
    );
    Ok(meters / 1000.0)
}

/// Rounds a kilometer value to two decimal places for display.
#[must_use]
pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

/// Squared Euclidean distance treating (latitude, longitude) as planar
/// coordinates. This is the metric [`crate::PointIndex`] minimizes.
#[must_use]
pub fn planar_distance_sq(a: QueryLocation, b: QueryLocation) -> f64 {
    planar_sq([a.latitude, a.longitude], [b.latitude, b.longitude])
}

pub(crate) fn planar_sq(a: [f64; 2], b: [f64; 2]) -> f64 {
    let d_lat = a[0] - b[0];
    let d_lon = a[1] - b[1];
    d_lat * d_lat + d_lon * d_lon
}
