//! `/api/cves` handlers over the authoritative table store.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use cvetrack_core::{FieldUpdate, NewRecord, Record, Status, StoreFailure, validate};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::handler::AppState;

/// `POST /api/cves` body: a candidate record, optionally already stamped.
///
/// Coordinators send records carrying their own `dateAdded`; plain API
/// clients leave it out and the server stamps it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    #[serde(flatten)]
    pub draft: NewRecord,
    #[serde(default)]
    pub date_added: Option<DateTime<Utc>>,
}

/// `PATCH /api/cves/:id/status` body.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: Status,
}

/// `GET /api/cves`: every record, in store order.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Record>>, ApiError> {
    let records = state
        .store
        .list_all()
        .await
        .map_err(|f| ApiError::store("Could not retrieve CVEs", f))?;
    Ok(Json(records))
}

/// `POST /api/cves`: validate shape, apply defaults, store.
///
/// Uniqueness is the registry's concern; the store itself upserts.
pub async fn create(
    State(state): State<AppState>, payload: Result<Json<CreateBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let Json(body) = payload?;
    let admitted = validate(body.draft, std::iter::empty::<&str>())?;
    let record = admitted.into_record(body.date_added.unwrap_or_else(Utc::now));

    let stored = state
        .store
        .put(&record)
        .await
        .map_err(|f| ApiError::store("Could not add CVE", f))?;

    tracing::info!(id = %stored.id, "record stored");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `DELETE /api/cves/:id`: 200 whether or not the id existed.
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    match state.store.delete(&id).await {
        Ok(()) => tracing::info!(%id, "record deleted"),
        Err(StoreFailure::NotFound(_)) => tracing::debug!(%id, "delete of absent record"),
        Err(failure) => return Err(ApiError::store("Could not delete CVE", failure)),
    }
    Ok(Json(json!({ "message": "CVE deleted successfully" })))
}

/// `PATCH /api/cves/:id/status`: change the one mutable field.
pub async fn update_status(
    State(state): State<AppState>, Path(id): Path<String>, payload: Result<Json<StatusBody>, JsonRejection>,
) -> Result<Json<Record>, ApiError> {
    let Json(body) = payload?;
    let updated = state
        .store
        .update_field(&id, FieldUpdate::Status(body.status))
        .await
        .map_err(|f| ApiError::store("Could not update CVE", f))?;

    tracing::info!(%id, status = %updated.status, "record status changed");
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_body_accepts_plain_candidate() {
        let body: CreateBody = serde_json::from_value(json!({
            "id": "CVE-1",
            "description": "x",
            "severity": "Critical"
        }))
        .unwrap();
        assert_eq!(body.draft.id.as_deref(), Some("CVE-1"));
        assert!(body.date_added.is_none());
    }

    #[test]
    fn test_create_body_keeps_stamp() {
        let body: CreateBody = serde_json::from_value(json!({
            "id": "CVE-1",
            "description": "x",
            "dateAdded": "2024-04-01T08:00:00Z"
        }))
        .unwrap();
        assert_eq!(body.date_added.unwrap().to_rfc3339(), "2024-04-01T08:00:00+00:00");
    }
}
