//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db;
use crate::errors::IndexerError;
use crate::events::{EventKind, EventRecord, ParticipantSummary};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

/// Build the HTTP router over the shared state.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", get(get_all_events))
        .route("/events/:kind", get(get_events_by_kind))
        .route("/participants/:address/events", get(get_participant_events))
        .route("/participants/:address/summary", get(get_participant_summary))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ParticipantEventsResponse {
    pub participant: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct KindEventsResponse {
    pub kind: &'static str,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn internal_error(e: IndexerError) -> Response {
    tracing::error!("API query failed: {e}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /events`
///
/// Returns all indexed events.
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> Response {
    match db::get_all_events(&state.pool).await {
        Ok(events) => {
            let count = events.len();
            (StatusCode::OK, Json(AllEventsResponse { count, events })).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// `GET /events/:kind`
///
/// `kind` is a stored event type such as `pledged` or `allocated`.
pub async fn get_events_by_kind(
    State(state): State<Arc<ApiState>>,
    Path(kind): Path<String>,
) -> Response {
    let Some(kind) = EventKind::from_stored(&kind) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Unknown event kind: {kind}"),
        );
    };

    match db::get_events_by_type(&state.pool, kind.as_str()).await {
        Ok(events) => {
            let count = events.len();
            (
                StatusCode::OK,
                Json(KindEventsResponse {
                    kind: kind.as_str(),
                    count,
                    events,
                }),
            )
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// `GET /participants/:address/events`
pub async fn get_participant_events(
    State(state): State<Arc<ApiState>>,
    Path(participant): Path<String>,
) -> Response {
    match db::get_events_for_participant(&state.pool, &participant).await {
        Ok(events) => {
            let count = events.len();
            (
                StatusCode::OK,
                Json(ParticipantEventsResponse {
                    participant,
                    count,
                    events,
                }),
            )
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// `GET /participants/:address/summary`
///
/// Pledged total, allocation and refund folded from the participant's events.
pub async fn get_participant_summary(
    State(state): State<Arc<ApiState>>,
    Path(participant): Path<String>,
) -> Response {
    match db::get_events_for_participant(&state.pool, &participant).await {
        Ok(events) if events.is_empty() => error_response(
            StatusCode::NOT_FOUND,
            format!("No events for participant {participant}"),
        ),
        Ok(events) => {
            let summary = ParticipantSummary::from_events(&participant, &events);
            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(e) => internal_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DistributionEvent;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn state_with(events: &[DistributionEvent]) -> Arc<ApiState> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::migrate(&pool).await.unwrap();
        db::insert_events(&pool, events).await.unwrap();
        Arc::new(ApiState { pool })
    }

    fn pledged(id: &str, who: &str, amount: &str, ledger: i64) -> DistributionEvent {
        DistributionEvent {
            event_id: id.to_string(),
            event_type: EventKind::Pledged.as_str().to_string(),
            participant: Some(who.to_string()),
            actor: Some(who.to_string()),
            amount: Some(amount.to_string()),
            detail: None,
            ledger,
            timestamp: 0,
            contract_id: "CONTRACT1".to_string(),
            tx_hash: None,
        }
    }

    #[tokio::test]
    async fn unknown_kind_is_bad_request() {
        let state = state_with(&[]).await;
        let resp = get_events_by_kind(State(state), Path("project_funded".to_string())).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn known_kind_is_ok() {
        let state = state_with(&[pledged("e1", "GALICE", "10", 1)]).await;
        let resp = get_events_by_kind(State(state), Path("pledged".to_string())).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn summary_of_unseen_participant_is_not_found() {
        let state = state_with(&[pledged("e1", "GALICE", "10", 1)]).await;
        let resp =
            get_participant_summary(State(state), Path("GNOBODY".to_string())).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn summary_of_depositor_is_ok() {
        let state = state_with(&[
            pledged("e1", "GALICE", "10", 1),
            pledged("e2", "GALICE", "15", 2),
        ])
        .await;
        let resp =
            get_participant_summary(State(state), Path("GALICE".to_string())).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
