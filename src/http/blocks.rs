use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::AppState;
use super::error::ApiError;
use crate::actors::ActorId;
use crate::db::{BlockOptions, BlockRecord, BlockStatus, BlockUpdate, ListFilter};

// ── Request / Response DTOs ─────────────────────────────────────────

#[derive(Serialize)]
pub struct BlockResponse {
    pub id: String,
    pub ip_address: String,
    pub reason: Option<String>,
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active: bool,
}

/// Expiry may be given as an instant or relative to now, not both.
#[derive(Deserialize, Default)]
pub struct BlockBody {
    pub reason: Option<String>,
    pub created_by: Option<ActorId>,
    pub expires_at: Option<DateTime<Utc>>,
    pub expires_in_secs: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateBlockRequest {
    pub ip: String,
    #[serde(flatten)]
    pub body: BlockBody,
}

/// Absent fields are left unchanged; explicit `null` clears them.
#[derive(Deserialize, Default)]
pub struct UpdateBlockRequest {
    #[serde(default, deserialize_with = "present")]
    pub reason: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Deserialize, Default)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Serialize)]
pub struct RemovedResponse {
    pub removed: bool,
}

#[derive(Serialize)]
pub struct CheckResponse {
    pub ip: String,
    pub blocked: bool,
}

#[derive(Serialize)]
pub struct SweepResponse {
    pub removed: u64,
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl BlockBody {
    fn into_options(self) -> Result<BlockOptions, ApiError> {
        let expires_at = match (self.expires_at, self.expires_in_secs) {
            (Some(_), Some(_)) => {
                return Err(ApiError::BadRequest {
                    code: "VALIDATION_ERROR",
                    message: "give expires_at or expires_in_secs, not both".to_string(),
                });
            }
            (Some(at), None) => Some(at),
            (None, Some(secs)) => {
                let at = Duration::try_seconds(secs)
                    .and_then(|delta| Utc::now().checked_add_signed(delta))
                    .ok_or_else(|| ApiError::BadRequest {
                        code: "VALIDATION_ERROR",
                        message: format!("expires_in_secs out of range: {secs}"),
                    })?;
                Some(at)
            }
            (None, None) => None,
        };

        Ok(BlockOptions {
            reason: self.reason,
            created_by: self.created_by,
            expires_at,
        })
    }
}

fn to_response(state: &AppState, record: BlockRecord) -> BlockResponse {
    let created_by_name = record
        .created_by
        .as_ref()
        .and_then(|id| state.actors.lookup(id))
        .map(|actor| actor.name);
    let active = record.is_active(Utc::now());

    BlockResponse {
        id: record.id,
        ip_address: record.ip_address.canonical(),
        reason: record.reason,
        created_by: record.created_by.map(|id| id.as_str().to_string()),
        created_by_name,
        expires_at: record.expires_at,
        created_at: record.created_at,
        updated_at: record.updated_at,
        active,
    }
}

// ── Handlers ────────────────────────────────────────────────────────

/// `POST /api/v1/blocks` — block an address.
pub async fn create_block(
    State(state): State<AppState>,
    Json(req): Json<CreateBlockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let options = req.body.into_options()?;
    let record = state.db.blocks().block(&req.ip, options).await?;
    crate::metrics::record_block_created();
    tracing::info!(ip = %record.ip_address, created_by = ?record.created_by, "Address blocked");
    Ok((StatusCode::CREATED, Json(to_response(&state, record))))
}

/// `PUT /api/v1/blocks/:ip` — create or overwrite the block for an address.
pub async fn replace_block(
    State(state): State<AppState>,
    Path(ip): Path<String>,
    Json(body): Json<BlockBody>,
) -> Result<impl IntoResponse, ApiError> {
    let options = body.into_options()?;
    let record = state.db.blocks().replace(&ip, options).await?;
    crate::metrics::record_block_created();
    tracing::info!(ip = %record.ip_address, "Block replaced");
    Ok(Json(to_response(&state, record)))
}

/// `PATCH /api/v1/blocks/:ip` — change reason and/or expiry.
pub async fn update_block(
    State(state): State<AppState>,
    Path(ip): Path<String>,
    Json(req): Json<UpdateBlockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let changes = BlockUpdate {
        reason: req.reason,
        expires_at: req.expires_at,
    };
    let record = state.db.blocks().update(&ip, changes).await?;
    tracing::info!(ip = %record.ip_address, "Block updated");
    Ok(Json(to_response(&state, record)))
}

/// `DELETE /api/v1/blocks/:ip` — unblock an address.
pub async fn delete_block(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.db.blocks().unblock(&ip).await?;
    if removed {
        crate::metrics::record_unblock();
        tracing::info!(ip = %ip, "Address unblocked");
    }
    Ok(Json(RemovedResponse { removed }))
}

/// `GET /api/v1/blocks/:ip` — stored record, expired or not.
pub async fn get_block(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.db.blocks().find(&ip).await? {
        Some(record) => Ok(Json(to_response(&state, record))),
        None => Err(ApiError::NotFound {
            code: "BLOCK_NOT_FOUND",
            message: format!("no block record for address: {ip}"),
        }),
    }
}

/// `GET /api/v1/blocks?status=&limit=&offset=` — list records.
pub async fn list_blocks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match query.status.as_deref() {
        None => BlockStatus::All,
        Some(s) => BlockStatus::parse(s).ok_or_else(|| ApiError::BadRequest {
            code: "VALIDATION_ERROR",
            message: format!("invalid status: {s} (expected all, active or expired)"),
        })?,
    };
    let filter = ListFilter {
        status,
        as_of: None,
        limit: query.limit,
        offset: query.offset.unwrap_or(0),
    };

    let records = state.db.blocks().list(filter).await?;
    let body: Vec<BlockResponse> = records
        .into_iter()
        .map(|r| to_response(&state, r))
        .collect();
    Ok(Json(body))
}

/// `GET /api/v1/check/:ip` — is the address blocked right now.
pub async fn check_block(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let blocked = state.db.blocks().is_blocked(&ip, None).await?;
    Ok(Json(CheckResponse { ip, blocked }))
}

/// `POST /api/v1/sweep` — purge expired records now.
pub async fn sweep(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let removed = state
        .db
        .blocks()
        .sweep_expired_batched(None, state.sweep_batch_size)
        .await?;
    crate::metrics::record_sweep(removed);
    Ok(Json(SweepResponse { removed }))
}
