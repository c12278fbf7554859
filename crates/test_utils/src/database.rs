//! Database Test Utilities
//!
//! Starts a disposable PostgreSQL container with the workspace schema
//! applied. Tests that use it need a running Docker daemon.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const POSTGRES_DB: &str = "assembly_test";

const SCHEMA: &str = include_str!("../../../migrations/20240101_000001_initial_schema.sql");

/// Tables cleared by [`TestDatabase::clear_data`], children first
const TABLES: &[&str] = &[
    "outbox_messages",
    "activities",
    "fraud_alerts",
    "claim_participants",
    "claims",
    "policy_transactions",
    "locations",
    "drivers",
    "insured_items",
    "coverages",
    "policies",
    "number_sequences",
    "users",
    "customers",
];

#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A PostgreSQL container plus a pool connected to it
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    pub config: TestDatabaseConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Starts a container and applies the schema
    ///
    /// # Errors
    ///
    /// Returns an error if the container fails to start or the schema fails
    /// to apply
    pub async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let container = Postgres::default()
            .with_user(POSTGRES_USER)
            .with_password(POSTGRES_PASSWORD)
            .with_db_name(POSTGRES_DB)
            .with_tag(POSTGRES_TAG)
            .start()
            .await?;

        let config = TestDatabaseConfig {
            host: container.get_host().await?.to_string(),
            port: container.get_host_port_ipv4(5432).await?,
            ..TestDatabaseConfig::default()
        };

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.connection_url())
            .await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        Ok(Self { _container: container, config, pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Clears all rows while preserving the schema
    pub async fn clear_data(&self) -> Result<(), sqlx::Error> {
        sqlx::query(&format!("TRUNCATE TABLE {} CASCADE", TABLES.join(", ")))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// A container owned by one test
pub async fn create_isolated_test_database() -> Result<TestDatabase, Box<dyn std::error::Error + Send + Sync>> {
    TestDatabase::new().await
}
