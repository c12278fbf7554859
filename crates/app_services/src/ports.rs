//! Application ports
//!
//! [`AssemblyStore`] is the write boundary of the engine: each `save_*`
//! call persists an aggregate together with its derived records in one
//! atomic unit, so either everything is visible afterwards or nothing is.
//! [`DocumentGenerator`] is the fire-and-forget collaborator invoked after a
//! policy commits.
//!
//! Updates to an existing policy are optimistic: the write only applies if
//! the stored status is still the one the caller read, otherwise it fails
//! with `PortError::Conflict` and changes nothing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{
    ClaimId, CustomerId, DomainPort, OutboxMessageId, Page, Paginated, PolicyId, PortError,
};
use domain_claims::{AdjusterLoad, Claim, ClaimHistoryEntry, FraudAlert};
use domain_policy::{Policy, PolicyStatus, PolicyTransaction};

use crate::activity::Activity;
use crate::outbox::OutboxMessage;
use crate::query::{ClaimQuery, ClaimSummary, PolicyQuery, PolicySummary};

/// Everything written when a policy is issued
#[derive(Debug, Clone)]
pub struct PolicyIssue {
    pub policy: Policy,
    pub transaction: PolicyTransaction,
    pub activity: Activity,
    pub outbox: OutboxMessage,
}

/// Everything written when a claim is filed
#[derive(Debug, Clone)]
pub struct ClaimFiling {
    pub claim: Claim,
    pub activity: Activity,
    pub outbox: OutboxMessage,
}

/// Transactional persistence for policies, claims and their derived records
#[async_trait]
pub trait AssemblyStore: DomainPort {
    /// Persists the policy, its children, the transaction journal entry, the
    /// audit activity and the outbox message atomically
    async fn save_issued_policy(&self, issue: &PolicyIssue) -> Result<(), PortError>;

    /// Persists the claim, its participants, the activity and the outbox
    /// message atomically
    ///
    /// # Errors
    ///
    /// `PortError::Conflict` if the claim number is already taken
    async fn save_filed_claim(&self, filing: &ClaimFiling) -> Result<(), PortError>;

    /// # Errors
    ///
    /// `PortError::NotFound` if no policy has this id
    async fn find_policy(&self, id: PolicyId) -> Result<Policy, PortError>;

    /// # Errors
    ///
    /// `PortError::NotFound` if no claim has this id
    async fn find_claim(&self, id: ClaimId) -> Result<Claim, PortError>;

    /// Writes a new status with its activity, provided the stored status is
    /// still `previous`
    ///
    /// # Errors
    ///
    /// `PortError::Conflict` when another writer changed the status first;
    /// `PortError::NotFound` if the policy does not exist
    async fn update_policy_status(
        &self,
        policy: &Policy,
        previous: PolicyStatus,
        activity: &Activity,
    ) -> Result<(), PortError>;

    /// Writes compliance status and period with its activity, provided the
    /// stored status still equals the policy's
    async fn update_policy(&self, policy: &Policy, activity: &Activity) -> Result<(), PortError>;

    /// Newest policies first
    async fn list_policies(
        &self,
        query: &PolicyQuery,
        page: Page,
    ) -> Result<Paginated<PolicySummary>, PortError>;

    /// Most recently reported claims first
    async fn list_claims(&self, query: &ClaimQuery, page: Page) -> Result<Paginated<ClaimSummary>, PortError>;

    /// Claims filed by the customer reported on or after `since`
    async fn customer_claim_history(
        &self,
        customer_id: CustomerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ClaimHistoryEntry>, PortError>;

    /// Adjuster roster ordered by open claim count, ties in stable roster order
    async fn list_adjusters_by_open_claim_count(&self) -> Result<Vec<AdjusterLoad>, PortError>;

    /// Stores an alert; a second alert for the same claim is ignored
    async fn save_fraud_alert(&self, alert: &FraudAlert) -> Result<(), PortError>;

    /// Claims up to `limit` pending messages not held by another worker,
    /// oldest first. Claimed messages stay hidden from other callers until
    /// completed, failed, or their lease runs out.
    async fn claim_pending_outbox(&self, limit: u32, now: DateTime<Utc>) -> Result<Vec<OutboxMessage>, PortError>;

    async fn complete_outbox(&self, id: OutboxMessageId) -> Result<(), PortError>;

    /// Increments the attempt count, records the error and releases the claim
    async fn record_outbox_failure(&self, id: OutboxMessageId, error: &str) -> Result<(), PortError>;
}

/// Produces declaration documents for an issued policy
#[async_trait]
pub trait DocumentGenerator: DomainPort {
    async fn generate_declaration_documents(&self, policy: &Policy) -> Result<(), PortError>;
}

/// Generator that only logs; used until a document service is wired in
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDocumentGenerator;

impl DomainPort for LoggingDocumentGenerator {}

#[async_trait]
impl DocumentGenerator for LoggingDocumentGenerator {
    async fn generate_declaration_documents(&self, policy: &Policy) -> Result<(), PortError> {
        tracing::info!(
            policy_number = policy.policy_number(),
            status = %policy.status(),
            "Declaration documents requested"
        );
        Ok(())
    }
}

/// In-memory implementations for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::UserId;
    use domain_party::Customer;

    use crate::outbox::{lease_expiry, OutboxStatus};

    #[derive(Debug, Default)]
    struct State {
        customers: HashMap<CustomerId, Customer>,
        policies: HashMap<PolicyId, Policy>,
        claims: HashMap<ClaimId, Claim>,
        transactions: Vec<PolicyTransaction>,
        activities: Vec<crate::activity::Activity>,
        outbox: Vec<OutboxMessage>,
        alerts: Vec<FraudAlert>,
        roster: Vec<(UserId, String)>,
    }

    /// Store keeping all records in memory under a single lock, so each
    /// `save_*` call is trivially atomic
    #[derive(Debug, Default, Clone)]
    pub struct InMemoryAssemblyStore {
        state: Arc<RwLock<State>>,
        fail_writes: Arc<AtomicBool>,
        fail_alerts: Arc<AtomicBool>,
    }

    impl InMemoryAssemblyStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes a customer's names and email visible to the list queries
        pub async fn register_customer(&self, customer: &Customer) {
            self.state.write().await.customers.insert(customer.id, customer.clone());
        }

        /// Adds an adjuster to the end of the roster
        pub async fn add_adjuster(&self, id: UserId, name: impl Into<String>) {
            self.state.write().await.roster.push((id, name.into()));
        }

        /// Makes every atomic write fail with a connection error
        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Makes fraud alert persistence fail
        pub fn set_fail_alerts(&self, fail: bool) {
            self.fail_alerts.store(fail, Ordering::SeqCst);
        }

        /// Overwrites a stored policy, bypassing the status check
        pub async fn replace_policy(&self, policy: Policy) {
            self.state.write().await.policies.insert(policy.id(), policy);
        }

        /// Inserts a claim directly, bypassing the service
        pub async fn insert_claim(&self, claim: Claim) {
            self.state.write().await.claims.insert(claim.id(), claim);
        }

        pub async fn policy_count(&self) -> usize {
            self.state.read().await.policies.len()
        }

        pub async fn claim_count(&self) -> usize {
            self.state.read().await.claims.len()
        }

        pub async fn transactions(&self) -> Vec<PolicyTransaction> {
            self.state.read().await.transactions.clone()
        }

        pub async fn activities(&self) -> Vec<crate::activity::Activity> {
            self.state.read().await.activities.clone()
        }

        pub async fn outbox(&self) -> Vec<OutboxMessage> {
            self.state.read().await.outbox.clone()
        }

        pub async fn alerts(&self) -> Vec<FraudAlert> {
            self.state.read().await.alerts.clone()
        }

        fn check_writable(&self) -> Result<(), PortError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PortError::connection("in-memory store is failing writes"));
            }
            Ok(())
        }
    }

    impl State {
        /// Fails unless the stored policy is in `expected`
        fn check_status(&self, id: PolicyId, expected: PolicyStatus) -> Result<(), PortError> {
            let stored = self
                .policies
                .get(&id)
                .ok_or_else(|| PortError::not_found("Policy", id))?;
            if stored.status() != expected {
                return Err(PortError::conflict(format!(
                    "policy {} is {}, expected {}",
                    stored.policy_number(),
                    stored.status(),
                    expected
                )));
            }
            Ok(())
        }

        fn policy_summary(&self, policy: &Policy) -> PolicySummary {
            let claim_count = self.claims.values().filter(|c| c.policy_id() == policy.id()).count();
            PolicySummary::project(
                policy,
                self.customers.get(&policy.customer_id()),
                claim_count as u32,
            )
        }
    }

    impl DomainPort for InMemoryAssemblyStore {}

    #[async_trait]
    impl AssemblyStore for InMemoryAssemblyStore {
        async fn save_issued_policy(&self, issue: &PolicyIssue) -> Result<(), PortError> {
            self.check_writable()?;
            let mut state = self.state.write().await;
            if state
                .policies
                .values()
                .any(|p| p.policy_number() == issue.policy.policy_number())
            {
                return Err(PortError::conflict(format!(
                    "policy number {} already exists",
                    issue.policy.policy_number()
                )));
            }
            state.policies.insert(issue.policy.id(), issue.policy.clone());
            state.transactions.push(issue.transaction.clone());
            state.activities.push(issue.activity.clone());
            state.outbox.push(issue.outbox.clone());
            Ok(())
        }

        async fn save_filed_claim(&self, filing: &ClaimFiling) -> Result<(), PortError> {
            self.check_writable()?;
            let mut state = self.state.write().await;
            if state
                .claims
                .values()
                .any(|c| c.claim_number() == filing.claim.claim_number())
            {
                return Err(PortError::conflict(format!(
                    "claim number {} already exists",
                    filing.claim.claim_number()
                )));
            }
            state.claims.insert(filing.claim.id(), filing.claim.clone());
            state.activities.push(filing.activity.clone());
            state.outbox.push(filing.outbox.clone());
            Ok(())
        }

        async fn find_policy(&self, id: PolicyId) -> Result<Policy, PortError> {
            self.state
                .read()
                .await
                .policies
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Policy", id))
        }

        async fn find_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
            self.state
                .read()
                .await
                .claims
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Claim", id))
        }

        async fn update_policy_status(
            &self,
            policy: &Policy,
            previous: PolicyStatus,
            activity: &crate::activity::Activity,
        ) -> Result<(), PortError> {
            self.check_writable()?;
            let mut state = self.state.write().await;
            state.check_status(policy.id(), previous)?;
            state.policies.insert(policy.id(), policy.clone());
            state.activities.push(activity.clone());
            Ok(())
        }

        async fn update_policy(&self, policy: &Policy, activity: &crate::activity::Activity) -> Result<(), PortError> {
            self.check_writable()?;
            let mut state = self.state.write().await;
            state.check_status(policy.id(), policy.status())?;
            state.policies.insert(policy.id(), policy.clone());
            state.activities.push(activity.clone());
            Ok(())
        }

        async fn list_policies(
            &self,
            query: &PolicyQuery,
            page: Page,
        ) -> Result<Paginated<PolicySummary>, PortError> {
            let state = self.state.read().await;
            let mut rows: Vec<PolicySummary> = state
                .policies
                .values()
                .map(|p| state.policy_summary(p))
                .filter(|s| query.matches(s))
                .collect();
            rows.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.policy_number.cmp(&a.policy_number))
            });
            Ok(Paginated::from_all(rows, page))
        }

        async fn list_claims(&self, query: &ClaimQuery, page: Page) -> Result<Paginated<ClaimSummary>, PortError> {
            let state = self.state.read().await;
            let mut rows: Vec<ClaimSummary> = state
                .claims
                .values()
                .map(|c| {
                    let number = state
                        .policies
                        .get(&c.policy_id())
                        .map(|p| p.policy_number().to_string())
                        .unwrap_or_default();
                    ClaimSummary::project(c, number)
                })
                .filter(|s| query.matches(s))
                .collect();
            rows.sort_by(|a, b| {
                b.reported_date
                    .cmp(&a.reported_date)
                    .then_with(|| b.claim_number.cmp(&a.claim_number))
            });
            Ok(Paginated::from_all(rows, page))
        }

        async fn customer_claim_history(
            &self,
            customer_id: CustomerId,
            since: DateTime<Utc>,
        ) -> Result<Vec<ClaimHistoryEntry>, PortError> {
            let state = self.state.read().await;
            let mut history: Vec<_> = state
                .claims
                .values()
                .filter(|c| c.customer_id() == customer_id && c.reported_date() >= since)
                .map(|c| ClaimHistoryEntry {
                    claim_id: c.id(),
                    reported_date: c.reported_date(),
                })
                .collect();
            history.sort_by_key(|h| h.reported_date);
            Ok(history)
        }

        async fn list_adjusters_by_open_claim_count(&self) -> Result<Vec<AdjusterLoad>, PortError> {
            let state = self.state.read().await;
            let mut loads: Vec<AdjusterLoad> = state
                .roster
                .iter()
                .map(|(id, name)| AdjusterLoad {
                    adjuster_id: *id,
                    name: name.clone(),
                    open_claims: state
                        .claims
                        .values()
                        .filter(|c| c.assigned_adjuster() == Some(*id) && c.status().is_open())
                        .count() as u32,
                })
                .collect();
            loads.sort_by_key(|l| l.open_claims);
            Ok(loads)
        }

        async fn save_fraud_alert(&self, alert: &FraudAlert) -> Result<(), PortError> {
            if self.fail_alerts.load(Ordering::SeqCst) {
                return Err(PortError::connection("in-memory store is failing alert writes"));
            }
            let mut state = self.state.write().await;
            let exists = state
                .alerts
                .iter()
                .any(|a| a.entity_type == alert.entity_type && a.entity_id == alert.entity_id);
            if !exists {
                state.alerts.push(alert.clone());
            }
            Ok(())
        }

        async fn claim_pending_outbox(&self, limit: u32, now: DateTime<Utc>) -> Result<Vec<OutboxMessage>, PortError> {
            let mut state = self.state.write().await;
            let mut claimed = Vec::new();
            for message in state
                .outbox
                .iter_mut()
                .filter(|m| m.is_claimable(now))
                .take(limit as usize)
            {
                message.claimed_until = Some(lease_expiry(now));
                claimed.push(message.clone());
            }
            Ok(claimed)
        }

        async fn complete_outbox(&self, id: OutboxMessageId) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            let message = state
                .outbox
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| PortError::not_found("OutboxMessage", id))?;
            message.attempts += 1;
            message.status = OutboxStatus::Completed;
            message.last_error = None;
            message.claimed_until = None;
            Ok(())
        }

        async fn record_outbox_failure(&self, id: OutboxMessageId, error: &str) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            let message = state
                .outbox
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| PortError::not_found("OutboxMessage", id))?;
            message.attempts += 1;
            message.last_error = Some(error.to_string());
            message.claimed_until = None;
            Ok(())
        }
    }

    /// Document generator that counts calls and can be told to fail
    #[derive(Debug, Default, Clone)]
    pub struct RecordingDocumentGenerator {
        calls: Arc<AtomicUsize>,
        failing: Arc<AtomicBool>,
        generated: Arc<RwLock<Vec<(PolicyId, PolicyStatus)>>>,
    }

    impl RecordingDocumentGenerator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub async fn generated(&self) -> Vec<(PolicyId, PolicyStatus)> {
            self.generated.read().await.clone()
        }
    }

    impl DomainPort for RecordingDocumentGenerator {}

    #[async_trait]
    impl DocumentGenerator for RecordingDocumentGenerator {
        async fn generate_declaration_documents(&self, policy: &Policy) -> Result<(), PortError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(PortError::ServiceUnavailable {
                    service: "document-generator".to_string(),
                });
            }
            self.generated.write().await.push((policy.id(), policy.status()));
            Ok(())
        }
    }
}
