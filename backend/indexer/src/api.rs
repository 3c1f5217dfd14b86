//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::error;

use crate::db;
use crate::errors::Result;
use crate::events::{Entity, EventRecord};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EntityEventsResponse {
    pub entity: &'static str,
    pub id: String,
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

/// `GET /spots/:id/events`
pub async fn get_spot_events(
    State(state): State<Arc<ApiState>>,
    Path(spot_id): Path<u64>,
) -> Response {
    let id = spot_id.to_string();
    let result = db::get_events_for_entity(&state.pool, Entity::Spot, &id).await;
    entity_response(Entity::Spot, id, result)
}

/// `GET /reservations/:id/events`
///
/// The reservation's full lifecycle: request, confirmation or timeout,
/// cancellation or completion, and any refund.
pub async fn get_reservation_events(
    State(state): State<Arc<ApiState>>,
    Path(reservation_id): Path<u64>,
) -> Response {
    let id = reservation_id.to_string();
    let result = db::get_events_for_entity(&state.pool, Entity::Reservation, &id).await;
    entity_response(Entity::Reservation, id, result)
}

/// `GET /users/:address/events`
///
/// Events keyed by the address plus every event it acted in.
pub async fn get_user_events(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> Response {
    let result = db::get_events_for_user(&state.pool, &address).await;
    entity_response(Entity::User, address, result)
}

fn entity_response(entity: Entity, id: String, result: Result<Vec<EventRecord>>) -> Response {
    match result {
        Ok(events) => {
            let count = events.len();
            (
                StatusCode::OK,
                Json(EntityEventsResponse {
                    entity: entity.as_str(),
                    id,
                    count,
                    events,
                }),
            )
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}

fn internal_error(e: impl std::fmt::Display) -> Response {
    error!("API query failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}
