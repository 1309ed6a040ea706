//! HTTP request handlers for the leave ledger engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::calc_request_duration;
use crate::error::{EngineError, EngineResult};
use crate::ledger::LedgerStore;

use super::request::{DurationRequest, LedgerQuery, SnapshotRequest};
use super::response::{ApiError, ApiErrorResponse, LedgerResponse, SnapshotResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/duration", post(duration_handler))
        .route("/workspaces/:workspace_id/snapshot", post(snapshot_handler))
        .route(
            "/workspaces/:workspace_id/members/:member_id/ledger",
            post(recompute_ledger_handler).get(get_ledger_handler),
        )
        .with_state(state)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(correlation_id: Uuid, err: EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %err,
        "Request failed"
    );
    let api_error: ApiErrorResponse = err.into();
    json_response(api_error.status, api_error.error)
}

fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries the detailed serde error
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    json_response(StatusCode::BAD_REQUEST, error)
}

/// Handler for POST /duration endpoint.
///
/// Previews a candidate request: working time per fiscal year and whether
/// the member's balances cover it.
async fn duration_handler(
    State(state): State<AppState>,
    payload: Result<Json<DurationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing duration request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let input = request.into_input(state.config().defaults());
    let start_time = Instant::now();
    match calc_request_duration(&input) {
        Ok(result) => {
            info!(
                correlation_id = %correlation_id,
                leave_type_id = %input.leave_type.id,
                years = result.per_year.len(),
                days = %result.total.workday_duration_in_days,
                allowance_enough = result.total.allowance_enough,
                duration_us = start_time.elapsed().as_micros(),
                "Duration calculated"
            );
            json_response(StatusCode::OK, result)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /workspaces/:workspace_id/snapshot endpoint.
///
/// Replaces everything stored for the workspace with the posted snapshot.
async fn snapshot_handler(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    payload: Result<Json<SnapshotRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        workspace_id = %workspace_id,
        "Loading workspace snapshot"
    );

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let snapshot = request.into_snapshot(workspace_id, state.config().defaults());
    let response = SnapshotResponse {
        workspace_id,
        members: snapshot.members.len(),
        requests: snapshot.requests.len(),
        allowances: snapshot.allowances.len(),
    };

    match state.store().load_snapshot(snapshot) {
        Ok(()) => {
            info!(
                correlation_id = %correlation_id,
                workspace_id = %workspace_id,
                members = response.members,
                requests = response.requests,
                allowances = response.allowances,
                "Workspace snapshot loaded"
            );
            json_response(StatusCode::OK, response)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /workspaces/:workspace_id/members/:member_id/ledger.
///
/// Recomputes the member's ledger on the blocking pool and returns the
/// persisted rows. The optional `today` query parameter overrides the
/// server date.
async fn recompute_ledger_handler(
    State(state): State<AppState>,
    Path((workspace_id, member_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<LedgerQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    info!(
        correlation_id = %correlation_id,
        workspace_id = %workspace_id,
        member_id = %member_id,
        today = %today,
        "Recomputing member ledger"
    );

    let start_time = Instant::now();
    let updater = Arc::clone(state.updater());
    let outcome =
        tokio::task::spawn_blocking(move || updater.recompute(workspace_id, member_id, today))
            .await
            .unwrap_or_else(|e| {
                Err(EngineError::CalculationError {
                    message: format!("ledger recomputation task failed: {}", e),
                })
            });
    match outcome {
        Ok(allowances) => {
            info!(
                correlation_id = %correlation_id,
                rows = allowances.len(),
                duration_us = start_time.elapsed().as_micros(),
                "Member ledger recomputed"
            );
            json_response(
                StatusCode::OK,
                LedgerResponse {
                    workspace_id,
                    member_id,
                    allowances,
                },
            )
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /workspaces/:workspace_id/members/:member_id/ledger.
async fn get_ledger_handler(
    State(state): State<AppState>,
    Path((workspace_id, member_id)): Path<(Uuid, Uuid)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        workspace_id = %workspace_id,
        member_id = %member_id,
        "Reading member ledger"
    );

    match stored_ledger(state.store(), workspace_id, member_id) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => error_response(correlation_id, err),
    }
}

fn stored_ledger(
    store: &dyn LedgerStore,
    workspace_id: Uuid,
    member_id: Uuid,
) -> EngineResult<LedgerResponse> {
    store
        .workspace(workspace_id)?
        .ok_or(EngineError::WorkspaceNotFound { workspace_id })?;
    store
        .member(workspace_id, member_id)?
        .ok_or(EngineError::MemberNotFound {
            workspace_id,
            member_id,
        })?;

    Ok(LedgerResponse {
        workspace_id,
        member_id,
        allowances: store.member_allowances(workspace_id, member_id)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::models::RequestDuration;
    use axum::body::Body;
    use axum::http::Request;
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let config = ConfigLoader::load("./config").expect("Failed to load config");
        AppState::new(config)
    }

    fn duration_body() -> &'static str {
        r#"{
            "start": "2024-02-01T00:00:00",
            "end": "2024-02-02T00:00:00",
            "start_at": "morning",
            "end_at": "end_of_day",
            "member_allowances": [
                { "year": 2024, "remaining": "20", "brought_forward": "0",
                  "allowance_type_id": "00000000-0000-0000-0000-000000000064" }
            ],
            "leave_type": {
                "id": "00000000-0000-0000-0000-00000000000a",
                "name": "Vacation",
                "leave_unit": "days",
                "take_from_allowance": true,
                "allowance_type_id": "00000000-0000-0000-0000-000000000064"
            },
            "workspace": { "fiscal_year_start_month": 0 }
        }"#
    }

    async fn post_json(router: Router, uri: &str, body: String) -> Response {
        router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duration_valid_request_returns_200() {
        let router = create_router(create_test_state());

        let response = post_json(router, "/duration", duration_body().to_string()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let content_type = response.headers().get("content-type").unwrap();
        assert_eq!(content_type, "application/json");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let result: RequestDuration = serde_json::from_slice(&body).unwrap();

        assert_eq!(result.total.workday_duration_in_days, Decimal::from(2));
        assert_eq!(result.total.workday_duration_in_minutes, 960);
        assert!(result.total.allowance_enough);
    }

    #[tokio::test]
    async fn test_duration_malformed_json_returns_400() {
        let router = create_router(create_test_state());

        let response = post_json(router, "/duration", "{invalid json".to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_duration_missing_leave_unit_returns_validation_error() {
        let router = create_router(create_test_state());
        let body = duration_body().replace("\"leave_unit\": \"days\",", "");

        let response = post_json(router, "/duration", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "VALIDATION_ERROR");
        assert!(error.message.contains("leave_unit"));
    }

    #[tokio::test]
    async fn test_duration_end_before_start_returns_invalid_request() {
        let router = create_router(create_test_state());
        let body = duration_body().replace("2024-02-02T00:00:00", "2024-01-30T00:00:00");

        let response = post_json(router, "/duration", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_ledger_of_unknown_workspace_returns_404() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(format!(
                        "/workspaces/{}/members/{}/ledger",
                        Uuid::from_u128(1),
                        Uuid::from_u128(2)
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "WORKSPACE_NOT_FOUND");
    }

    fn snapshot_body() -> String {
        r#"{
            "workspace": { "name": "Acme", "fiscal_year_start_month": 0 },
            "members": [{
                "id": "00000000-0000-0000-0000-000000000002",
                "workspace_id": "00000000-0000-0000-0000-000000000001"
            }],
            "allowance_types": [{
                "id": "00000000-0000-0000-0000-000000000064",
                "name": "Vacation",
                "ignore_allowance_limit": false,
                "max_carry_forward": "5",
                "carry_forward_months_after_fiscal_year": 0
            }]
        }"#
        .to_string()
    }

    fn ledger_uri(today: &str) -> String {
        format!(
            "/workspaces/{}/members/{}/ledger?today={}",
            Uuid::from_u128(1),
            Uuid::from_u128(2),
            today
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_recomputes_of_one_member_all_succeed() {
        let router = create_router(create_test_state());
        let snapshot_uri = format!("/workspaces/{}/snapshot", Uuid::from_u128(1));
        let response = post_json(router.clone(), &snapshot_uri, snapshot_body()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let router = router.clone();
                tokio::spawn(async move {
                    post_json(router, &ledger_uri("2024-06-01"), String::new())
                        .await
                        .status()
                })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_recompute_with_unsupported_today_returns_400() {
        let router = create_router(create_test_state());
        let snapshot_uri = format!("/workspaces/{}/snapshot", Uuid::from_u128(1));
        post_json(router.clone(), &snapshot_uri, snapshot_body()).await;

        let response = post_json(router, &ledger_uri("0001-01-01"), String::new()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "INVALID_REQUEST");
    }
}
