//! Party Domain Ports
//!
//! The assembly engine reads customers through [`CustomerPort`]. The
//! PostgreSQL adapter lives in `infra_db`; [`mock::MockCustomerPort`] keeps
//! customers in memory for tests.

use async_trait::async_trait;

use core_kernel::{CustomerId, DomainPort, OperationMetadata, Page, Paginated, PortError};

use crate::customer::{Customer, CustomerType};

/// Filters for listing customers
#[derive(Debug, Clone, Default)]
pub struct CustomerQuery {
    /// Case-insensitive match on first, last or business name and email
    pub search: Option<String>,
    pub customer_type: Option<CustomerType>,
}

impl CustomerQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Default::default()
        }
    }

    /// True when the customer passes every filter that is set
    pub fn matches(&self, customer: &Customer) -> bool {
        if self.customer_type.is_some_and(|t| t != customer.customer_type) {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => customer.matches_search(term),
            None => true,
        }
    }
}

/// Read access to customers
#[async_trait]
pub trait CustomerPort: DomainPort {
    /// Retrieves a customer by ID
    ///
    /// # Errors
    ///
    /// Returns `PortError::NotFound` if the customer does not exist
    async fn find_customer(
        &self,
        id: CustomerId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Customer, PortError>;

    /// Customers ordered by creation time, newest first
    async fn list_customers(
        &self,
        query: &CustomerQuery,
        page: Page,
    ) -> Result<Paginated<Customer>, PortError>;

    /// Returns true if the customer exists
    async fn customer_exists(&self, id: CustomerId) -> Result<bool, PortError> {
        match self.find_customer(id, None).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// In-memory implementation of CustomerPort for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default, Clone)]
    pub struct MockCustomerPort {
        customers: Arc<RwLock<HashMap<CustomerId, Customer>>>,
    }

    impl MockCustomerPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with customers for testing
        pub async fn with_customers(customers: Vec<Customer>) -> Self {
            let port = Self::new();
            for customer in customers {
                port.insert(customer).await;
            }
            port
        }

        pub async fn insert(&self, customer: Customer) {
            self.customers.write().await.insert(customer.id, customer);
        }
    }

    impl DomainPort for MockCustomerPort {}

    #[async_trait]
    impl CustomerPort for MockCustomerPort {
        async fn find_customer(
            &self,
            id: CustomerId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Customer, PortError> {
            self.customers
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Customer", id))
        }

        async fn list_customers(
            &self,
            query: &CustomerQuery,
            page: Page,
        ) -> Result<Paginated<Customer>, PortError> {
            let mut matching: Vec<Customer> = self
                .customers
                .read()
                .await
                .values()
                .filter(|c| query.matches(c))
                .cloned()
                .collect();
            matching.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
            });
            Ok(Paginated::from_all(matching, page))
        }
    }
}
