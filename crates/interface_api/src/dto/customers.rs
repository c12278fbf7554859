//! Customer DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use core_kernel::Paginated;
use domain_party::{Customer, CustomerQuery, CustomerType};

use crate::dto::PaginationDto;
use crate::error::ApiError;

/// Filters of `GET /customers`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListParams {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 20))]
    pub customer_type: Option<String>,
    #[validate(length(max = 100))]
    pub search: Option<String>,
}

impl CustomerListParams {
    pub fn into_query(self) -> Result<CustomerQuery, ApiError> {
        let customer_type = self
            .customer_type
            .as_deref()
            .map(CustomerType::from_str)
            .transpose()
            .map_err(|e| ApiError::validation(e.to_string()))?;
        Ok(CustomerQuery { search: self.search, customer_type })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: Uuid,
    pub customer_type: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub state: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Customer> for CustomerDto {
    fn from(customer: &Customer) -> Self {
        Self {
            id: *customer.id.as_uuid(),
            customer_type: customer.customer_type.as_str().to_string(),
            name: customer.display_name(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            state: customer.address.state.clone(),
            created_at: customer.created_at,
        }
    }
}

/// Body of `GET /customers`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListResponse {
    pub customers: Vec<CustomerDto>,
    pub pagination: PaginationDto,
}

impl From<&Paginated<Customer>> for CustomerListResponse {
    fn from(result: &Paginated<Customer>) -> Self {
        Self {
            customers: result.items.iter().map(CustomerDto::from).collect(),
            pagination: result.into(),
        }
    }
}
