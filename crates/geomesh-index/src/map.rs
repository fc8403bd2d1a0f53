//! Map payload handed to the presentation layer.
//!
//! Mirrors what the page draws: every node with a signal-radius circle, the
//! closest node highlighted, and the caller's own position.

use geomesh_core::QueryLocation;
use serde::Serialize;

use crate::error::IndexError;
use crate::index::PointIndex;
use crate::resolver::ResolutionResult;

pub const DEFAULT_ZOOM: u8 = 5;
pub const DEFAULT_SIGNAL_RADIUS_KM: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Node,
    ClosestNode,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub kind: MarkerKind,
    pub tooltip: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: QueryLocation,
    pub zoom: u8,
    pub signal_radius_m: f64,
    pub nodes: Vec<MapMarker>,
    pub closest: Option<MapMarker>,
    pub user: MapMarker,
}

impl MapView {
    /// Builds the payload for `user` over the whole index, highlighting the
    /// resolved node when there is one.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::EmptyIndex`] if there is nothing to draw.
    pub fn build(
        index: &PointIndex,
        user: QueryLocation,
        resolution: Option<&ResolutionResult>,
        signal_radius_km: f64,
    ) -> Result<Self, IndexError> {
        let center = index.centroid().ok_or(IndexError::EmptyIndex)?;

        let nodes = index
            .points()
            .iter()
            .map(|p| MapMarker {
                kind: MarkerKind::Node,
                tooltip: p.name.clone(),
                latitude: p.latitude,
                longitude: p.longitude,
            })
            .collect();

        let closest = resolution.map(|r| MapMarker {
            kind: MarkerKind::ClosestNode,
            tooltip: format!("Closest Hub: {}", r.matched_name),
            latitude: r.matched_point.latitude,
            longitude: r.matched_point.longitude,
        });

        Ok(Self {
            center,
            zoom: DEFAULT_ZOOM,
            signal_radius_m: signal_radius_km * 1000.0,
            nodes,
            closest,
            user: MapMarker {
                kind: MarkerKind::User,
                tooltip: "Your Location".to_string(),
                latitude: user.latitude,
                longitude: user.longitude,
            },
        })
    }
}
