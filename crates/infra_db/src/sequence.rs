//! Yearly number counters in PostgreSQL
//!
//! A single upsert both creates the `(kind, year)` counter and increments
//! it, so concurrent callers serialise on the row lock and never observe
//! the same value. The increment commits on its own: a caller whose later
//! write fails leaves a gap rather than a duplicate.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, NumberKind, PortError, SequencePort};

use crate::error::DatabaseError;

#[derive(Debug, Clone)]
pub struct PostgresSequence {
    pool: PgPool,
}

impl PostgresSequence {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresSequence {}

#[async_trait]
impl SequencePort for PostgresSequence {
    #[instrument(skip(self), fields(kind = %kind))]
    async fn next_value(&self, kind: NumberKind, year: i32) -> Result<u64, PortError> {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO number_sequences (kind, year, last_value)
            VALUES ($1, $2, 1)
            ON CONFLICT (kind, year)
            DO UPDATE SET last_value = number_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(kind.as_str())
        .bind(year)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        debug!(value, year, "Sequence advanced");
        u64::try_from(value).map_err(|_| PortError::internal(format!("negative {kind} sequence value {value}")))
    }
}
