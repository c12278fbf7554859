//! Policy handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use std::str::FromStr;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use core_kernel::{OperationMetadata, Page, PolicyId};
use domain_policy::PolicyStatus;

use crate::dto::policy::*;
use crate::dto::PageParams;
use crate::{error::ApiError, AppState};

/// Issues a policy from an application
#[instrument(skip_all)]
pub async fn issue_policy(
    State(state): State<AppState>,
    Extension(actor): Extension<OperationMetadata>,
    Json(request): Json<PolicyApplicationRequest>,
) -> Result<(StatusCode, Json<IssuePolicyResponse>), ApiError> {
    request.validate()?;
    let application = request.into_application()?;

    let issued = state.service.issue_policy(application, &actor).await?;
    Ok((StatusCode::CREATED, Json(IssuePolicyResponse::from(&issued))))
}

/// Prices and underwrites an application without writing anything
#[instrument(skip_all)]
pub async fn quote_policy(
    State(state): State<AppState>,
    Extension(actor): Extension<OperationMetadata>,
    Json(request): Json<PolicyApplicationRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    request.validate()?;
    let application = request.into_application()?;

    let quote = state.service.quote(&application, &actor).await?;
    Ok(Json(QuoteResponse::from(&quote)))
}

/// Lists policies newest first
#[instrument(skip_all)]
pub async fn list_policies(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
    Query(params): Query<PolicyListParams>,
) -> Result<Json<PolicyListResponse>, ApiError> {
    page.validate()?;
    params.validate()?;

    let result = state
        .service
        .list_policies(&params.into_query()?, Page::from(page))
        .await?;
    Ok(Json(PolicyListResponse::from(&result)))
}

pub async fn get_policy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let policy = state.service.get_policy(PolicyId::from_uuid(id)).await?;
    Ok(Json(PolicyResponse::from(&policy)))
}

#[instrument(skip_all, fields(policy_id = %id))]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<OperationMetadata>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<PolicyResponse>, ApiError> {
    request.validate()?;
    let status = PolicyStatus::from_str(&request.status).map_err(|e| ApiError::validation(e.to_string()))?;

    let policy = state
        .service
        .change_policy_status(PolicyId::from_uuid(id), status, &actor)
        .await?;
    Ok(Json(PolicyResponse::from(&policy)))
}

/// Updates compliance status or the policy period
#[instrument(skip_all, fields(policy_id = %id))]
pub async fn update_policy(
    State(state): State<AppState>,
    Extension(actor): Extension<OperationMetadata>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePolicyRequest>,
) -> Result<Json<PolicyResponse>, ApiError> {
    request.validate()?;
    let update = request.into_update()?;

    let policy = state
        .service
        .update_policy(PolicyId::from_uuid(id), update, &actor)
        .await?;
    Ok(Json(PolicyResponse::from(&policy)))
}
