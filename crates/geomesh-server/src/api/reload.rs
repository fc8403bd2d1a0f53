use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use geomesh_index::{LoadedDataset, PointIndex, SkippedRow};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ReloadData {
    pub points: usize,
    pub previous_points: usize,
    pub skipped: Vec<SkippedRow>,
}

/// Rebuilds the index from the configured dataset and swaps it in.
///
/// On any failure the current index keeps serving.
pub(super) async fn reload_index(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ReloadData>>, ApiError> {
    let path = Arc::clone(&state.dataset_path);
    let loaded = tokio::task::spawn_blocking(move || geomesh_index::load_dataset(&path))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "dataset reload task failed");
            ApiError::new(req_id.0.clone(), "internal_error", "dataset reload task failed")
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "dataset reload failed");
            ApiError::new(req_id.0.clone(), "dataset_error", e.to_string())
        })?;

    let LoadedDataset { points, skipped } = loaded;
    let index = PointIndex::build(points).map_err(|e| {
        tracing::error!(error = %e, "reloaded dataset has no usable rows");
        ApiError::new(req_id.0.clone(), "dataset_error", e.to_string())
    })?;

    let points = index.len();
    let previous = state.index.swap(index);

    Ok(Json(ApiResponse::new(
        ReloadData {
            points,
            previous_points: previous.len(),
            skipped,
        },
        req_id.0,
    )))
}
