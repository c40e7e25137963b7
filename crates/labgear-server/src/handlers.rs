use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Path, Query, Request, State};
use axum::http::{header, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::Json;
use labgear_store::{now_utc, Machine, MachineKind, MachineRepository, MachineSpec, RepositoryError};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub kind: Option<String>,
}

/// Guards every `/api/v1` route. All failure modes produce the same 401 so
/// callers learn nothing about which part of the credential was wrong.
pub async fn require_api_token(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if !state.api_token.verify_authorization(authorization) {
        debug!(method = %req.method(), path = %req.uri().path(), "rejected request without valid token");
        return Err(AppError::unauthorized("unauthorized"));
    }

    Ok(next.run(req).await)
}

pub async fn health(State(state): State<Arc<AppState>>) -> Response<Body> {
    let repo = state.repo.clone();
    let ping = tokio::task::spawn_blocking(move || repo.ping())
        .await
        .map_err(|err| err.to_string())
        .and_then(|result| result.map_err(|err| err.to_string()));

    match ping {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "version": state.build.version,
                "commit": state.build.commit,
            })),
        )
            .into_response(),
        Err(err) => {
            warn!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "error": err })),
            )
                .into_response()
        }
    }
}

pub async fn create_machine(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<Machine>), AppError> {
    let spec = decode_spec(body)?;
    let machine = spec.into_machine(Uuid::new_v4().to_string(), now_utc())?;

    let record = machine.clone();
    with_repo(&state, "failed to create machine", move |repo| repo.create(&record)).await?;

    info!(id = %machine.id, kind = %machine.kind, name = %machine.name, "machine created");
    Ok((StatusCode::CREATED, Json(machine)))
}

pub async fn list_machines(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Machine>>, AppError> {
    let Query(query) = query.map_err(|err| AppError::bad_request(err.body_text()))?;
    let kind = parse_kind_filter(query.kind.as_deref())?;
    let machines = with_repo(&state, "failed to list machines", move |repo| repo.list(kind)).await?;
    Ok(Json(machines))
}

pub async fn get_machine(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Machine>, AppError> {
    fetch_existing(&state, id).await.map(Json)
}

/// Existence is checked before the body is looked at, so an unknown id is a
/// 404 even when the body is also invalid.
pub async fn update_machine(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Machine>, AppError> {
    let existing = fetch_existing(&state, id).await?;
    let spec = decode_spec(body)?;
    let machine = existing.replace_with(spec, now_utc())?;

    let record = machine.clone();
    with_repo(&state, "failed to update machine", move |repo| repo.update(&record)).await?;

    info!(id = %machine.id, kind = %machine.kind, "machine updated");
    Ok(Json(machine))
}

pub async fn delete_machine(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let target = id.clone();
    with_repo(&state, "failed to delete machine", move |repo| repo.delete(&target)).await?;
    info!(id = %id, "machine deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_existing(state: &AppState, id: String) -> Result<Machine, AppError> {
    with_repo(state, "failed to get machine", move |repo| repo.get_by_id(&id))
        .await?
        .ok_or_else(|| AppError::not_found("machine not found"))
}

fn decode_spec(body: Result<Bytes, BytesRejection>) -> Result<MachineSpec, AppError> {
    let bytes = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::payload_too_large("request body too large")
        } else {
            AppError::bad_request("invalid JSON")
        }
    })?;
    serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("invalid JSON"))
}

fn parse_kind_filter(raw: Option<&str>) -> Result<Option<MachineKind>, AppError> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<MachineKind>()
            .map(Some)
            .map_err(|_| AppError::bad_request("invalid kind")),
    }
}

async fn with_repo<F, R>(state: &AppState, context: &'static str, op: F) -> Result<R, AppError>
where
    F: FnOnce(&dyn MachineRepository) -> Result<R, RepositoryError> + Send + 'static,
    R: Send + 'static,
{
    let repo = state.repo.clone();
    tokio::task::spawn_blocking(move || op(repo.as_ref()))
        .await
        .map_err(|err| {
            warn!(error = %err, "{context}");
            AppError::internal(context)
        })?
        .map_err(|err| AppError::storage(context, err))
}
