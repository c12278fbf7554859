//! Claims handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ClaimId, OperationMetadata, Page};

use crate::dto::claims::*;
use crate::dto::PageParams;
use crate::{error::ApiError, AppState};

/// Files a first notice of loss
#[instrument(skip_all)]
pub async fn file_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<OperationMetadata>,
    Json(request): Json<FileClaimRequest>,
) -> Result<(StatusCode, Json<FileClaimResponse>), ApiError> {
    request.validate()?;

    let filed = state.service.file_claim(request.into(), &actor).await?;
    Ok((StatusCode::CREATED, Json(FileClaimResponse::from(&filed))))
}

/// Lists claims most recently reported first
#[instrument(skip_all)]
pub async fn list_claims(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
    Query(params): Query<ClaimListParams>,
) -> Result<Json<ClaimListResponse>, ApiError> {
    page.validate()?;
    params.validate()?;

    let result = state
        .service
        .list_claims(&params.into_query()?, Page::from(page))
        .await?;
    Ok(Json(ClaimListResponse::from(&result)))
}

pub async fn get_claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.service.get_claim(ClaimId::from_uuid(id)).await?;
    Ok(Json(ClaimResponse::from(&claim)))
}
