//! PostgreSQL-backed [`CustomerPort`]

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{CustomerId, DomainPort, OperationMetadata, Page, Paginated, PortError};
use domain_party::{Customer, CustomerPort, CustomerQuery, User};

use crate::error::DatabaseError;
use crate::rows::{like_pattern, CustomerRow};

const CUSTOMER_FILTER: &str = r#"
    WHERE ($1::text IS NULL OR customer_type = $1)
      AND ($2::text IS NULL
           OR first_name ILIKE $2 OR last_name ILIKE $2
           OR business_name ILIKE $2 OR email ILIKE $2)
"#;

#[derive(Debug, Clone)]
pub struct PostgresCustomerPort {
    pool: PgPool,
}

impl PostgresCustomerPort {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a customer; used by seeding and tests since the engine
    /// itself never creates customers
    pub async fn insert(&self, customer: &Customer) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO customers (
                customer_id, customer_type, first_name, last_name, business_name,
                email, phone, date_of_birth, street, city, state, zip_code, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(customer.customer_type.as_str())
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.business_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.date_of_birth)
        .bind(&customer.address.street)
        .bind(&customer.address.city)
        .bind(&customer.address.state)
        .bind(&customer.address.zip_code)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Inserts a back-office user; adjusters enter the assignment roster in
/// insertion order
pub async fn insert_user(pool: &PgPool, user: &User) -> Result<(), DatabaseError> {
    sqlx::query("INSERT INTO users (user_id, name, email, role) VALUES ($1, $2, $3, $4)")
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

impl DomainPort for PostgresCustomerPort {}

#[async_trait]
impl CustomerPort for PostgresCustomerPort {
    #[instrument(skip(self, _metadata), fields(customer_id = %id))]
    async fn find_customer(
        &self,
        id: CustomerId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Customer, PortError> {
        let row: CustomerRow = sqlx::query_as(
            r#"
            SELECT customer_id, customer_type, first_name, last_name, business_name,
                   email, phone, date_of_birth, street, city, state, zip_code, created_at
            FROM customers
            WHERE customer_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| DatabaseError::not_found("Customer", id))?;

        Ok(Customer::try_from(row)?)
    }

    #[instrument(skip(self, query))]
    async fn list_customers(
        &self,
        query: &CustomerQuery,
        page: Page,
    ) -> Result<Paginated<Customer>, PortError> {
        let customer_type = query.customer_type.map(|t| t.as_str());
        let search = query.search.as_deref().and_then(like_pattern);

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM customers {CUSTOMER_FILTER}"))
            .bind(customer_type)
            .bind(&search)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        let rows: Vec<CustomerRow> = sqlx::query_as(&format!(
            r#"
            SELECT customer_id, customer_type, first_name, last_name, business_name,
                   email, phone, date_of_birth, street, city, state, zip_code, created_at
            FROM customers
            {CUSTOMER_FILTER}
            ORDER BY created_at DESC, customer_id
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(customer_type)
        .bind(&search)
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let customers = rows
            .into_iter()
            .map(Customer::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Paginated::new(customers, page, total.max(0) as u64))
    }
}
