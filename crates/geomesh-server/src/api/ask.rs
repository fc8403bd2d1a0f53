use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use geomesh_assistant::{Answer, AssistantError, NodeContext};
use geomesh_index::{MapView, QueryLocation};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_assistant_error, map_index_error, nodes::NearestNode, ApiError, ApiResponse, AppState,
    ErrorBody,
};

#[derive(Debug, Deserialize)]
pub(super) struct AskRequest {
    question: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    offline: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct AskData {
    pub question: String,
    pub resolution: NearestNode,
    /// `None` when the upstream assistant failed; see `answer_error`.
    pub answer: Option<Answer>,
    pub answer_error: Option<ErrorBody>,
    pub map: MapView,
}

/// Resolves the caller's hub, then answers the question with that hub as
/// context.
///
/// An upstream assistant failure still returns the resolution and map, with
/// the failure reported in `answer_error`. A blank question, bad coordinates,
/// an empty index or a missing API key fail the whole request.
pub(super) async fn ask(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AskData>>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        ApiError::new(req_id.0.clone(), "validation_error", rejection.body_text())
    })?;

    let question = body.question.trim();
    if question.is_empty() {
        return Err(map_assistant_error(
            req_id.0.clone(),
            &AssistantError::EmptyQuestion,
        ));
    }

    let user = QueryLocation::new(body.latitude, body.longitude)
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let index = state.index.snapshot();
    let resolution = state
        .resolver
        .resolve(user, &index)
        .map_err(|e| map_index_error(req_id.0.clone(), &e))?;
    let map = MapView::build(&index, user, Some(&resolution), state.signal_radius_km)
        .map_err(|e| map_index_error(req_id.0.clone(), &e))?;

    let context = NodeContext::from(&resolution);
    let outcome = geomesh_assistant::answer(
        state.assistant.as_deref(),
        question,
        Some(&context),
        body.offline,
    )
    .await;
    let (answer, answer_error) = match outcome {
        Ok(answer) => (Some(answer), None),
        Err(e @ (AssistantError::EmptyQuestion | AssistantError::MissingApiKey)) => {
            return Err(map_assistant_error(req_id.0.clone(), &e));
        }
        Err(e) => (None, Some(map_assistant_error(req_id.0.clone(), &e).error)),
    };

    tracing::info!(
        request_id = %req_id.0,
        node = %resolution.matched_name,
        distance_km = resolution.distance_km,
        offline = body.offline,
        answered = answer.is_some(),
        "handled question"
    );

    Ok(Json(ApiResponse::new(
        AskData {
            question: question.to_owned(),
            resolution: NearestNode::from(&resolution),
            answer,
            answer_error,
            map,
        },
        req_id.0,
    )))
}
