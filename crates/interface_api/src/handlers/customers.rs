//! Customer handlers

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::instrument;
use validator::Validate;

use core_kernel::Page;

use crate::dto::customers::*;
use crate::dto::PageParams;
use crate::{error::ApiError, AppState};

#[instrument(skip_all)]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
    Query(params): Query<CustomerListParams>,
) -> Result<Json<CustomerListResponse>, ApiError> {
    page.validate()?;
    params.validate()?;

    let result = state
        .service
        .list_customers(&params.into_query()?, Page::from(page))
        .await?;
    Ok(Json(CustomerListResponse::from(&result)))
}
