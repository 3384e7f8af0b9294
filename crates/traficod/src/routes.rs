//! HTTP surface for the lookup service

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::error;
use traficostore::RecordKind;

use crate::lookup::{LookupService, Outcome};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    service: Arc<LookupService>,
}

/// Build the API router over a lookup service
pub fn router(service: Arc<LookupService>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/alerta/:uuid", get(get_alerta))
        .route("/atasco/:uuid", get(get_atasco))
        .route("/uuids_alertas", get(uuids_alertas))
        .route("/uuids_atascos", get(uuids_atascos))
        .with_state(AppState { service })
}

async fn index() -> &'static str {
    "Bienvenido a la API de trafico"
}

/// Wire format of a lookup reply; `tiempo (ms)` is present only on
/// hit/miss and measures the branch that served the request, not the
/// whole request
#[derive(Serialize)]
struct LookupResponse {
    resultado: &'static str,
    #[serde(rename = "tiempo (ms)", skip_serializing_if = "Option::is_none")]
    tiempo_ms: Option<f64>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn branch_ms(latency: Duration) -> f64 {
    (latency.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

fn lookup_reply(state: &AppState, kind: RecordKind, uuid: &str) -> Response {
    match state.service.lookup(kind, uuid) {
        Ok(Outcome::Hit(latency)) => Json(LookupResponse {
            resultado: "hit",
            tiempo_ms: Some(branch_ms(latency)),
        })
        .into_response(),
        Ok(Outcome::Miss(latency)) => Json(LookupResponse {
            resultado: "miss",
            tiempo_ms: Some(branch_ms(latency)),
        })
        .into_response(),
        Ok(Outcome::NotFound) => Json(LookupResponse {
            resultado: "no_encontrado",
            tiempo_ms: None,
        })
        .into_response(),
        Err(e) => {
            error!("lookup of {}:{} failed: {}", kind, uuid, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn get_alerta(State(state): State<AppState>, Path(uuid): Path<String>) -> Response {
    lookup_reply(&state, RecordKind::Alert, &uuid)
}

async fn get_atasco(State(state): State<AppState>, Path(uuid): Path<String>) -> Response {
    lookup_reply(&state, RecordKind::Jam, &uuid)
}

fn uuids_reply(state: &AppState, kind: RecordKind) -> Response {
    match state.service.list_ids(kind) {
        // Untagged serialization keeps each id's stored encoding
        Ok(ids) => Json(ids).into_response(),
        Err(e) => {
            error!("listing {} ids failed: {}", kind, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn uuids_alertas(State(state): State<AppState>) -> Response {
    uuids_reply(&state, RecordKind::Alert)
}

async fn uuids_atascos(State(state): State<AppState>) -> Response {
    uuids_reply(&state, RecordKind::Jam)
}
