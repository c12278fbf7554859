//! Request and response bodies

pub mod claims;
pub mod customers;
pub mod policy;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use core_kernel::{Page, Paginated, MAX_AMOUNT};

/// Rejects negative amounts and amounts above what a money column holds
pub fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::new("negative_amount"));
    }
    if *amount > MAX_AMOUNT {
        return Err(ValidationError::new("amount_too_large"));
    }
    Ok(())
}

/// `?page=&limit=` query parameters shared by the list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
pub struct PageParams {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

impl From<PageParams> for Page {
    fn from(params: PageParams) -> Self {
        Page::new(
            params.page.unwrap_or(1),
            params.limit.unwrap_or(Page::DEFAULT_LIMIT),
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDto {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl<T> From<&Paginated<T>> for PaginationDto {
    fn from(result: &Paginated<T>) -> Self {
        Self {
            page: result.page,
            limit: result.limit,
            total: result.total,
            pages: result.pages(),
        }
    }
}
