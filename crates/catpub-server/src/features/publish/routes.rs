//! HTTP surface of the publish pipeline

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;

use super::pipeline::{PublishError, PublishPipeline};
use super::types::{PublishRequest, SelectionError};
use crate::api::response::ErrorResponse;
use crate::features::FeatureState;

pub fn publish_routes() -> Router<FeatureState> {
    Router::new().route("/", post(publish))
}

#[derive(Debug, Error)]
enum PublishApiError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("A publish run is already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    Pipeline(#[from] PublishError),
}

impl IntoResponse for PublishApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            PublishApiError::Selection(e) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_ERROR", e.to_string()),
            ),
            PublishApiError::AlreadyRunning => (
                StatusCode::CONFLICT,
                ErrorResponse::new(
                    "PUBLISH_IN_PROGRESS",
                    "A publish run is already in progress",
                ),
            ),
            PublishApiError::Pipeline(PublishError::NoDraftsFound) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("NOT_FOUND", "No draft products matched the request"),
            ),
            PublishApiError::Pipeline(PublishError::ImageValidationFailed(issues)) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_details(
                    "VALIDATION_ERROR",
                    "Image folder validation failed",
                    json!({ "issues": issues }),
                ),
            ),
            // Staging, import, move, ingest and status failures all surface
            // the underlying message so the operator can act on it.
            PublishApiError::Pipeline(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("PUBLISH_FAILED", e.to_string()),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// POST /publish
///
/// Runs the whole pipeline inline; the response is not sent until the run
/// has finished or failed. Concurrent triggers are rejected with 409.
#[tracing::instrument(skip_all)]
async fn publish(
    State(state): State<FeatureState>,
    Json(request): Json<PublishRequest>,
) -> Result<Response, PublishApiError> {
    let selection = request.selection()?;

    let _guard = state
        .publish_lock
        .try_lock()
        .map_err(|_| PublishApiError::AlreadyRunning)?;

    let pipeline = PublishPipeline::new(
        state.db.clone(),
        state.pipeline.clone(),
        state.media_ingest.clone(),
    );
    let response = pipeline.run(&selection).await.inspect_err(|e| {
        tracing::error!(error = %e, "Publish run failed");
    })?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::publish::ingest::MediaIngestError;
    use crate::features::publish::types::ImageIssue;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn empty_selection_maps_to_400() {
        let response = PublishApiError::Selection(SelectionError::Empty).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn concurrent_run_maps_to_409() {
        let response = PublishApiError::AlreadyRunning.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn no_drafts_maps_to_404() {
        let response = PublishApiError::Pipeline(PublishError::NoDraftsFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn image_issues_land_in_the_details_payload() {
        let issue = ImageIssue {
            spu: "AB100".into(),
            missing_main: true,
            ..Default::default()
        };
        let response =
            PublishApiError::Pipeline(PublishError::ImageValidationFailed(vec![issue]))
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            body["error"]["details"]["issues"][0],
            json!({"spu": "AB100", "missingMain": true})
        );
    }

    #[tokio::test]
    async fn ingest_failure_surfaces_stderr_in_500() {
        let err = PublishError::MediaIngestFailed(MediaIngestError::ScriptFailed {
            code: 1,
            stderr_tail: "disk full".into(),
        });
        let response = PublishApiError::Pipeline(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("disk full"));
    }
}
