//! PostgreSQL-backed [`AssemblyStore`]
//!
//! Every `save_*` call runs inside one database transaction. Any error
//! before `commit` drops the transaction, which rolls it back, so a failed
//! issue or filing leaves no policy, claim, child row, activity or outbox
//! message behind.
//!
//! Updates to an existing policy carry the status the caller read in their
//! `WHERE` clause. Zero affected rows on a policy that exists means another
//! writer got there first and surfaces as `PortError::Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use app_services::{
    Activity, AssemblyStore, ClaimFiling, ClaimQuery, ClaimSummary, OutboxMessage, OutboxStatus,
    PolicyIssue, PolicyQuery, PolicySummary,
};
use core_kernel::{
    ClaimId, CustomerId, DomainPort, OutboxMessageId, Page, Paginated, PolicyId, PortError,
};
use domain_claims::{AdjusterLoad, Claim, ClaimHistoryEntry, FraudAlert};
use domain_policy::{Policy, PolicyStatus, PolicyTransaction};

use crate::error::DatabaseError;
use crate::rows::{
    like_pattern, to_text, AdjusterLoadRow, ClaimHistoryRow, ClaimRow, ClaimSummaryRow, CoverageRow,
    DriverRow, InsuredItemRow, LocationRow, OutboxRow, ParticipantRow, PolicyRecord, PolicyRow,
    PolicySummaryRow,
};

const POLICY_FILTER: &str = r#"
    WHERE ($1::text IS NULL OR p.status = $1)
      AND ($2::text IS NULL OR p.product_type = $2)
      AND ($3::text IS NULL
           OR p.policy_number ILIKE $3
           OR cu.first_name ILIKE $3 OR cu.last_name ILIKE $3
           OR cu.business_name ILIKE $3 OR cu.email ILIKE $3)
"#;

const CLAIM_FILTER: &str = r#"
    WHERE ($1::text IS NULL OR c.status = $1)
      AND ($2::text IS NULL
           OR c.claim_number ILIKE $2
           OR c.description ILIKE $2
           OR p.policy_number ILIKE $2)
"#;

type Tx<'a> = Transaction<'a, Postgres>;

#[derive(Debug, Clone)]
pub struct PostgresAssemblyStore {
    pool: PgPool,
}

impl PostgresAssemblyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_policy(tx: &mut Tx<'_>, policy: &Policy) -> Result<(), DatabaseError> {
        let premium = policy.premium();
        sqlx::query(
            r#"
            INSERT INTO policies (
                policy_id, policy_number, customer_id, product_type, status,
                effective_date, expiration_date, payment_plan, currency, jurisdiction,
                base_premium, fees, taxes, total_premium, risk_score, underwriting,
                compliance_status, created_by, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            "#,
        )
        .bind(policy.id().as_uuid())
        .bind(policy.policy_number())
        .bind(policy.customer_id().as_uuid())
        .bind(policy.product_type().as_str())
        .bind(policy.status().as_str())
        .bind(policy.period().effective())
        .bind(policy.period().expiration())
        .bind(policy.payment_plan().as_str())
        .bind(policy.currency().code())
        .bind(policy.jurisdiction())
        .bind(premium.base_premium.amount())
        .bind(premium.fees.amount())
        .bind(premium.taxes.amount())
        .bind(premium.total_premium.amount())
        .bind(policy.decision().map(|d| i16::from(d.risk_score)))
        .bind(policy.decision().map(Json))
        .bind(policy.compliance_status().as_str())
        .bind(policy.created_by().map(|u| *u.as_uuid()))
        .bind(policy.created_at())
        .bind(policy.updated_at())
        .execute(&mut **tx)
        .await?;

        for (position, coverage) in policy.coverages().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO coverages (
                    coverage_id, policy_id, position, code, name, coverage_type,
                    coverage_limit, deductible, premium
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(coverage.id.as_uuid())
            .bind(policy.id().as_uuid())
            .bind(position as i32)
            .bind(&coverage.code)
            .bind(&coverage.name)
            .bind(coverage.coverage_type.as_str())
            .bind(coverage.limit.map(|l| l.to_string()))
            .bind(coverage.deductible.map(|d| d.amount()))
            .bind(coverage.premium.amount())
            .execute(&mut **tx)
            .await?;
        }

        for (position, item) in policy.insured_items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO insured_items (item_id, policy_id, position, description, details, covered_amount)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(policy.id().as_uuid())
            .bind(position as i32)
            .bind(&item.description)
            .bind(Json(&item.kind))
            .bind(item.covered_amount.map(|a| a.amount()))
            .execute(&mut **tx)
            .await?;
        }

        for (position, driver) in policy.drivers().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO drivers (
                    driver_id, policy_id, position, driver_type, first_name, last_name,
                    date_of_birth, license_number, license_state, years_licensed
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(driver.id.as_uuid())
            .bind(policy.id().as_uuid())
            .bind(position as i32)
            .bind(to_text(&driver.driver_type)?)
            .bind(&driver.first_name)
            .bind(&driver.last_name)
            .bind(driver.date_of_birth)
            .bind(&driver.license_number)
            .bind(&driver.license_state)
            .bind(driver.years_licensed.and_then(|y| i32::try_from(y).ok()))
            .execute(&mut **tx)
            .await?;
        }

        for (position, location) in policy.locations().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO locations (
                    location_id, policy_id, position, street, city, state, zip_code,
                    construction_type, occupancy_type, year_built
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(location.id.as_uuid())
            .bind(policy.id().as_uuid())
            .bind(position as i32)
            .bind(&location.street)
            .bind(&location.city)
            .bind(&location.state)
            .bind(&location.zip_code)
            .bind(location.construction_type.as_ref().map(to_text).transpose()?)
            .bind(location.occupancy_type.as_ref().map(to_text).transpose()?)
            .bind(location.year_built)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn insert_transaction(tx: &mut Tx<'_>, transaction: &PolicyTransaction) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO policy_transactions (
                transaction_id, policy_id, transaction_type, premium, currency, effective_date, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(transaction.id.as_uuid())
        .bind(transaction.policy_id.as_uuid())
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.premium.amount())
        .bind(transaction.premium.currency().code())
        .bind(transaction.effective_date)
        .bind(transaction.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn insert_claim(tx: &mut Tx<'_>, claim: &Claim) -> Result<(), DatabaseError> {
        let currency = claim
            .loss_amount()
            .or(claim.reserve_amount())
            .map(|m| m.currency())
            .unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO claims (
                claim_id, claim_number, policy_id, customer_id, status, loss_date,
                reported_date, description, loss_amount, reserve_amount, currency,
                loss_location, assigned_adjuster, created_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(claim.id().as_uuid())
        .bind(claim.claim_number())
        .bind(claim.policy_id().as_uuid())
        .bind(claim.customer_id().as_uuid())
        .bind(claim.status().as_str())
        .bind(claim.loss_date())
        .bind(claim.reported_date())
        .bind(claim.description())
        .bind(claim.loss_amount().map(|m| m.amount()))
        .bind(claim.reserve_amount().map(|m| m.amount()))
        .bind(currency.code())
        .bind(claim.loss_location())
        .bind(claim.assigned_adjuster().map(|u| *u.as_uuid()))
        .bind(claim.created_by().map(|u| *u.as_uuid()))
        .bind(claim.created_at())
        .bind(claim.updated_at())
        .execute(&mut **tx)
        .await?;

        for (position, participant) in claim.participants().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO claim_participants (participant_id, claim_id, position, kind, name, role, contact)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(participant.id.as_uuid())
            .bind(claim.id().as_uuid())
            .bind(position as i32)
            .bind(participant.kind.as_str())
            .bind(&participant.name)
            .bind(participant.role.as_str())
            .bind(&participant.contact)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn insert_activity(tx: &mut Tx<'_>, activity: &Activity) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO activities (
                activity_id, entity_type, entity_id, user_id, action, description, metadata, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(activity.id.as_uuid())
        .bind(activity.entity_type.as_str())
        .bind(activity.entity_id)
        .bind(activity.user_id.map(|u| *u.as_uuid()))
        .bind(activity.action.as_str())
        .bind(&activity.description)
        .bind(Json(&activity.metadata))
        .bind(activity.timestamp)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn insert_outbox(tx: &mut Tx<'_>, message: &OutboxMessage) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO outbox_messages (
                message_id, kind, aggregate_id, attempts, last_error, status, claimed_until, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.kind.as_str())
        .bind(message.aggregate_id)
        .bind(i32::try_from(message.attempts).unwrap_or(i32::MAX))
        .bind(&message.last_error)
        .bind(message.status.as_str())
        .bind(message.claimed_until)
        .bind(message.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn load_policy(&self, id: PolicyId) -> Result<Policy, DatabaseError> {
        let policy: PolicyRow = sqlx::query_as(
            r#"
            SELECT policy_id, policy_number, customer_id, product_type, status,
                   effective_date, expiration_date, payment_plan, currency, jurisdiction,
                   base_premium, fees, taxes, total_premium, underwriting,
                   compliance_status, created_by, created_at, updated_at
            FROM policies
            WHERE policy_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Policy", id))?;

        let coverages: Vec<CoverageRow> = sqlx::query_as(
            r#"
            SELECT coverage_id, code, name, coverage_type, coverage_limit, deductible, premium
            FROM coverages WHERE policy_id = $1 ORDER BY position
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let insured_items: Vec<InsuredItemRow> = sqlx::query_as(
            "SELECT item_id, description, details, covered_amount FROM insured_items WHERE policy_id = $1 ORDER BY position",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let drivers: Vec<DriverRow> = sqlx::query_as(
            r#"
            SELECT driver_id, driver_type, first_name, last_name, date_of_birth,
                   license_number, license_state, years_licensed
            FROM drivers WHERE policy_id = $1 ORDER BY position
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let locations: Vec<LocationRow> = sqlx::query_as(
            r#"
            SELECT location_id, street, city, state, zip_code,
                   construction_type, occupancy_type, year_built
            FROM locations WHERE policy_id = $1 ORDER BY position
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        PolicyRecord { policy, coverages, insured_items, drivers, locations }.into_policy()
    }

    async fn load_claim(&self, id: ClaimId) -> Result<Claim, DatabaseError> {
        let claim: ClaimRow = sqlx::query_as(
            r#"
            SELECT claim_id, claim_number, policy_id, customer_id, status, loss_date,
                   reported_date, description, loss_amount, reserve_amount, currency,
                   loss_location, assigned_adjuster, created_by, created_at, updated_at
            FROM claims
            WHERE claim_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Claim", id))?;

        let participants: Vec<ParticipantRow> = sqlx::query_as(
            "SELECT participant_id, kind, name, role, contact FROM claim_participants WHERE claim_id = $1 ORDER BY position",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        claim.into_claim(participants)
    }

    async fn mark_outbox(
        &self,
        id: OutboxMessageId,
        status: OutboxStatus,
        error: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE outbox_messages
            SET attempts = attempts + 1, status = $2, last_error = $3, claimed_until = NULL
            WHERE message_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("OutboxMessage", id));
        }
        Ok(())
    }

    /// Distinguishes a missing policy from one whose status moved on
    async fn stale_policy(tx: &mut Tx<'_>, policy: &Policy, expected: PolicyStatus) -> DatabaseError {
        let stored: Result<Option<String>, _> =
            sqlx::query_scalar("SELECT status FROM policies WHERE policy_id = $1")
                .bind(policy.id().as_uuid())
                .fetch_optional(&mut **tx)
                .await;
        match stored {
            Ok(Some(status)) => DatabaseError::StaleUpdate(format!(
                "policy {} is {status}, expected {expected}",
                policy.policy_number()
            )),
            Ok(None) => DatabaseError::not_found("Policy", policy.id()),
            Err(e) => e.into(),
        }
    }
}

impl DomainPort for PostgresAssemblyStore {}

#[async_trait]
impl AssemblyStore for PostgresAssemblyStore {
    #[instrument(skip(self, issue), fields(policy_number = issue.policy.policy_number()))]
    async fn save_issued_policy(&self, issue: &PolicyIssue) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        Self::insert_policy(&mut tx, &issue.policy).await?;
        Self::insert_transaction(&mut tx, &issue.transaction).await?;
        Self::insert_activity(&mut tx, &issue.activity).await?;
        Self::insert_outbox(&mut tx, &issue.outbox).await?;
        tx.commit().await.map_err(DatabaseError::from)?;

        debug!("Policy issue committed");
        Ok(())
    }

    #[instrument(skip(self, filing), fields(claim_number = filing.claim.claim_number()))]
    async fn save_filed_claim(&self, filing: &ClaimFiling) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        Self::insert_claim(&mut tx, &filing.claim).await?;
        Self::insert_activity(&mut tx, &filing.activity).await?;
        Self::insert_outbox(&mut tx, &filing.outbox).await?;
        tx.commit().await.map_err(DatabaseError::from)?;

        debug!("Claim filing committed");
        Ok(())
    }

    async fn find_policy(&self, id: PolicyId) -> Result<Policy, PortError> {
        Ok(self.load_policy(id).await?)
    }

    async fn find_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
        Ok(self.load_claim(id).await?)
    }

    #[instrument(skip(self, policy, activity), fields(policy_number = policy.policy_number()))]
    async fn update_policy_status(
        &self,
        policy: &Policy,
        previous: PolicyStatus,
        activity: &Activity,
    ) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        let result = sqlx::query(
            "UPDATE policies SET status = $2, updated_at = $3 WHERE policy_id = $1 AND status = $4",
        )
        .bind(policy.id().as_uuid())
        .bind(policy.status().as_str())
        .bind(policy.updated_at())
        .bind(previous.as_str())
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;
        if result.rows_affected() == 0 {
            return Err(Self::stale_policy(&mut tx, policy, previous).await.into());
        }
        Self::insert_activity(&mut tx, activity).await?;
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    #[instrument(skip(self, policy, activity), fields(policy_number = policy.policy_number()))]
    async fn update_policy(&self, policy: &Policy, activity: &Activity) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        let result = sqlx::query(
            r#"
            UPDATE policies
            SET compliance_status = $2, effective_date = $3, expiration_date = $4, updated_at = $5
            WHERE policy_id = $1 AND status = $6
            "#,
        )
        .bind(policy.id().as_uuid())
        .bind(policy.compliance_status().as_str())
        .bind(policy.period().effective())
        .bind(policy.period().expiration())
        .bind(policy.updated_at())
        .bind(policy.status().as_str())
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;
        if result.rows_affected() == 0 {
            return Err(Self::stale_policy(&mut tx, policy, policy.status()).await.into());
        }
        Self::insert_activity(&mut tx, activity).await?;
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    #[instrument(skip(self, query))]
    async fn list_policies(
        &self,
        query: &PolicyQuery,
        page: Page,
    ) -> Result<Paginated<PolicySummary>, PortError> {
        let status = query.status.map(|s| s.as_str());
        let product = query.product_type.map(|p| p.as_str());
        let search = query.search.as_deref().and_then(like_pattern);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM policies p JOIN customers cu ON cu.customer_id = p.customer_id {POLICY_FILTER}"
        ))
        .bind(status)
        .bind(product)
        .bind(&search)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let rows: Vec<PolicySummaryRow> = sqlx::query_as(&format!(
            r#"
            SELECT p.policy_id, p.policy_number, p.product_type, p.status, p.customer_id,
                   CASE WHEN cu.customer_type = 'BUSINESS' THEN COALESCE(cu.business_name, '')
                        ELSE TRIM(COALESCE(cu.first_name, '') || ' ' || COALESCE(cu.last_name, ''))
                   END AS customer_name,
                   cu.email AS customer_email,
                   p.effective_date, p.expiration_date, p.currency, p.total_premium,
                   p.risk_score, p.compliance_status,
                   (SELECT COUNT(*) FROM claims c WHERE c.policy_id = p.policy_id) AS claim_count,
                   p.created_at
            FROM policies p
            JOIN customers cu ON cu.customer_id = p.customer_id
            {POLICY_FILTER}
            ORDER BY p.created_at DESC, p.policy_number DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(status)
        .bind(product)
        .bind(&search)
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let items = rows
            .into_iter()
            .map(PolicySummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Paginated::new(items, page, total.max(0) as u64))
    }

    #[instrument(skip(self, query))]
    async fn list_claims(&self, query: &ClaimQuery, page: Page) -> Result<Paginated<ClaimSummary>, PortError> {
        let status = query.status.map(|s| s.as_str());
        let search = query.search.as_deref().and_then(like_pattern);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM claims c JOIN policies p ON p.policy_id = c.policy_id {CLAIM_FILTER}"
        ))
        .bind(status)
        .bind(&search)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let rows: Vec<ClaimSummaryRow> = sqlx::query_as(&format!(
            r#"
            SELECT c.claim_id, c.claim_number, c.policy_id, p.policy_number, c.customer_id,
                   c.status, c.description, c.loss_date, c.reported_date,
                   c.loss_amount, c.reserve_amount, c.currency, c.assigned_adjuster
            FROM claims c
            JOIN policies p ON p.policy_id = c.policy_id
            {CLAIM_FILTER}
            ORDER BY c.reported_date DESC, c.claim_number DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(status)
        .bind(&search)
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let items = rows
            .into_iter()
            .map(ClaimSummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Paginated::new(items, page, total.max(0) as u64))
    }

    async fn customer_claim_history(
        &self,
        customer_id: CustomerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ClaimHistoryEntry>, PortError> {
        let rows: Vec<ClaimHistoryRow> = sqlx::query_as(
            r#"
            SELECT claim_id, reported_date
            FROM claims
            WHERE customer_id = $1 AND reported_date >= $2
            ORDER BY reported_date
            "#,
        )
        .bind(customer_id.as_uuid())
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(rows.into_iter().map(ClaimHistoryEntry::from).collect())
    }

    async fn list_adjusters_by_open_claim_count(&self) -> Result<Vec<AdjusterLoad>, PortError> {
        let rows: Vec<AdjusterLoadRow> = sqlx::query_as(
            r#"
            SELECT u.user_id, u.name, COUNT(c.claim_id) AS open_claims
            FROM users u
            LEFT JOIN claims c
                ON c.assigned_adjuster = u.user_id
               AND c.status IN ('OPEN', 'INVESTIGATING', 'PROCESSING')
            WHERE u.role = 'ADJUSTER'
            GROUP BY u.user_id, u.name, u.created_at
            ORDER BY open_claims ASC, u.created_at ASC, u.user_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(rows.into_iter().map(AdjusterLoad::from).collect())
    }

    async fn save_fraud_alert(&self, alert: &FraudAlert) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            INSERT INTO fraud_alerts (
                alert_id, entity_type, entity_id, alert_type, severity, risk_score,
                description, indicators, investigation_required, status, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (entity_type, entity_id) DO NOTHING
            "#,
        )
        .bind(alert.id.as_uuid())
        .bind(&alert.entity_type)
        .bind(&alert.entity_id)
        .bind(alert.alert_type.as_str())
        .bind(alert.severity.as_str())
        .bind(i16::from(alert.risk_score))
        .bind(&alert.description)
        .bind(Json(&alert.indicators))
        .bind(alert.investigation_required)
        .bind(alert.status.as_str())
        .bind(alert.created_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        if result.rows_affected() == 0 {
            debug!(entity_id = %alert.entity_id, "Fraud alert already recorded");
        }
        Ok(())
    }

    /// Rows locked by a concurrent claim are skipped rather than waited on,
    /// and the lease is written in the same statement that selects them
    #[instrument(skip(self))]
    async fn claim_pending_outbox(&self, limit: u32, now: DateTime<Utc>) -> Result<Vec<OutboxMessage>, PortError> {
        let rows: Vec<OutboxRow> = sqlx::query_as(
            r#"
            UPDATE outbox_messages
            SET claimed_until = $3
            WHERE message_id IN (
                SELECT message_id
                FROM outbox_messages
                WHERE status = 'PENDING'
                  AND (claimed_until IS NULL OR claimed_until <= $1)
                ORDER BY created_at, message_id
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING message_id, kind, aggregate_id, attempts, last_error, status, claimed_until, created_at
            "#,
        )
        .bind(now)
        .bind(i64::from(limit))
        .bind(app_services::outbox::lease_expiry(now))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let mut messages = rows
            .into_iter()
            .map(OutboxMessage::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.as_uuid().cmp(b.id.as_uuid())));
        Ok(messages)
    }

    async fn complete_outbox(&self, id: OutboxMessageId) -> Result<(), PortError> {
        Ok(self.mark_outbox(id, OutboxStatus::Completed, None).await?)
    }

    async fn record_outbox_failure(&self, id: OutboxMessageId, error: &str) -> Result<(), PortError> {
        Ok(self.mark_outbox(id, OutboxStatus::Pending, Some(error)).await?)
    }
}
