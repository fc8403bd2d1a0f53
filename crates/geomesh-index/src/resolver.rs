use geomesh_core::{GeoPoint, QueryLocation};
use serde::Serialize;

use crate::distance::{geodesic_km, round_km};
use crate::error::IndexError;
use crate::index::PointIndex;

/// Outcome of a closest-node lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionResult {
    pub matched_name: String,
    /// Unrounded geodesic distance from the query to the matched node.
    pub distance_km: f64,
    pub matched_point: GeoPoint,
}

impl ResolutionResult {
    /// Distance rounded to two decimals, for display only.
    #[must_use]
    pub fn rounded_distance_km(&self) -> f64 {
        round_km(self.distance_km)
    }
}

/// Single entry point for "which node is closest, and how far is it".
///
/// Stateless: the index is passed in per call so a caller holding an
/// [`crate::IndexHandle`] can resolve against whatever snapshot is current.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeResolver;

impl NodeResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Picks the nearest node through the index, then measures the
    /// geodesic distance to it.
    ///
    /// # Errors
    ///
    /// - [`IndexError::EmptyIndex`] from the index, unchanged.
    /// - [`IndexError::InvalidCoordinate`] if `query` is out of range.
    pub fn resolve(
        &self,
        query: QueryLocation,
        index: &PointIndex,
    ) -> Result<ResolutionResult, IndexError> {
        let matched = index.nearest(query)?;
        let distance_km = geodesic_km(query, matched.location())?;

        tracing::debug!(
            query = %query,
            node = %matched.name,
            distance_km,
            "resolved closest node"
        );

        Ok(ResolutionResult {
            matched_name: matched.name.clone(),
            distance_km,
            matched_point: matched.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn point(name: &str, latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint::new(name, latitude, longitude).expect("valid test point")
    }

    fn three_node_index() -> PointIndex {
        PointIndex::build(vec![
            point("A", 0.0, 0.0),
            point("B", 0.0, 1.0),
            point("C", 10.0, 10.0),
        ])
        .unwrap()
    }

    #[test]
    fn resolve_reports_geodesic_distance_to_match() {
        let index = three_node_index();
        let query = QueryLocation::new(0.0, 0.6).unwrap();
        let result = NodeResolver::new().resolve(query, &index).unwrap();

        assert_eq!(result.matched_name, "B");
        assert_eq!(result.matched_point, point("B", 0.0, 1.0));
        // 0.4 degrees of longitude on the equator.
        assert_abs_diff_eq!(result.distance_km, 44.528, epsilon = 0.01);
        assert_abs_diff_eq!(result.rounded_distance_km(), 44.53, epsilon = 1e-9);
    }

    #[test]
    fn resolve_at_node_is_zero_distance() {
        let index = three_node_index();
        let result = NodeResolver::new()
            .resolve(QueryLocation::new(10.0, 10.0).unwrap(), &index)
            .unwrap();
        assert_eq!(result.matched_name, "C");
        assert!(result.distance_km.abs() < 1e-9);
    }

    #[test]
    fn resolve_propagates_empty_index() {
        let err = NodeResolver::new()
            .resolve(QueryLocation::new(0.0, 0.0).unwrap(), &PointIndex::empty())
            .unwrap_err();
        assert_eq!(err, IndexError::EmptyIndex);
    }

    #[test]
    fn resolve_keeps_unrounded_distance() {
        let index = three_node_index();
        let result = NodeResolver::new()
            .resolve(QueryLocation::new(0.123_456, 0.0).unwrap(), &index)
            .unwrap();
        assert_eq!(result.matched_name, "A");
        assert!((result.distance_km - result.rounded_distance_km()).abs() > 0.0);
    }

    #[test]
    fn resolution_is_serializable() {
        let index = three_node_index();
        let result = NodeResolver::new()
            .resolve(QueryLocation::new(1.0, 1.0).unwrap(), &index)
            .unwrap();
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["matched_name"], "B");
        assert_eq!(json["matched_point"]["longitude"], 1.0);
    }
}
