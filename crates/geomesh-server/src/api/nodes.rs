use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use geomesh_index::{GeoPoint, QueryLocation, ResolutionResult};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_index_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct NearestParams {
    lat: f64,
    lon: f64,
}

/// Resolution as shown to a client: the two-decimal display distance plus
/// the unrounded value.
#[derive(Debug, Serialize)]
pub(super) struct NearestNode {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
    pub distance_km_raw: f64,
}

impl From<&ResolutionResult> for NearestNode {
    fn from(result: &ResolutionResult) -> Self {
        Self {
            name: result.matched_name.clone(),
            latitude: result.matched_point.latitude,
            longitude: result.matched_point.longitude,
            distance_km: result.rounded_distance_km(),
            distance_km_raw: result.distance_km,
        }
    }
}

pub(super) async fn list_nodes(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<GeoPoint>>> {
    let index = state.index.snapshot();
    Json(ApiResponse::new(index.points().to_vec(), req_id.0))
}

pub(super) async fn nearest(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    params: Result<Query<NearestParams>, QueryRejection>,
) -> Result<Json<ApiResponse<NearestNode>>, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        ApiError::new(req_id.0.clone(), "validation_error", rejection.body_text())
    })?;

    let query = QueryLocation::new(params.lat, params.lon)
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let index = state.index.snapshot();
    let result = state
        .resolver
        .resolve(query, &index)
        .map_err(|e| map_index_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(NearestNode::from(&result), req_id.0)))
}
