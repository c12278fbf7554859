//! Aggregate assembly service
//!
//! Turns an application into an issued policy, and a loss report into a
//! filed claim, each as one atomic write through [`AssemblyStore`].
//!
//! # Policy path
//!
//! ```text
//! required coverages -> validate -> customer exists -> price
//!   -> underwrite with loss history -> allocate number -> assemble
//!   -> save (policy + children + NEW_BUSINESS + activity + outbox)
//!   -> post-commit: declaration documents
//! ```
//!
//! # Claim path
//!
//! ```text
//! validate -> policy exists and belongs to customer -> allocate number
//!   -> pick adjuster -> save (claim + participants + activity + outbox)
//!   -> post-commit: fraud evaluation and alert
//! ```
//!
//! Numbers are allocated only after every pure check has passed. A failed
//! save leaves a gap in the sequence; a retried call receives a new number.
//! Post-commit work never fails the call: errors are logged and the outbox
//! message stays pending for [`AssemblyService::drain_outbox`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{
    Clock, CustomerId, IdentifierAllocator, Money, NumberKind, OperationMetadata, Page, Paginated,
    PolicyId, PolicyPeriod, PortError, ClaimId,
};
use domain_claims::{
    select_adjuster, Claim, ClaimReport, FraudAssessment, FraudEngine, Participant,
};
use domain_party::{Customer, CustomerPort, CustomerQuery};
use domain_policy::{
    CoverageRequest, Driver, InsuredItem, Location, PaymentPlan, Policy, PolicyBuilder,
    PolicyStatus, PolicyTransaction, ProductType, RatedPolicy, RatingEngine, RatingResult,
    UnderwritingDecision, UnderwritingEngine,
};

use crate::activity::{Activity, ActivityAction, EntityType};
use crate::error::AssemblyError;
use crate::outbox::{DrainReport, OutboxKind, OutboxMessage};
use crate::ports::{AssemblyStore, ClaimFiling, DocumentGenerator, PolicyIssue};
use crate::query::{ClaimQuery, ClaimSummary, PolicyQuery, PolicySummary, PolicyUpdate};

const LOSS_HISTORY_DAYS: i64 = 3 * 365;
const FRAUD_WINDOW_DAYS: i64 = domain_claims::fraud::RECENT_CLAIM_WINDOW_DAYS;

/// A request to issue a policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyApplication {
    pub customer_id: CustomerId,
    pub product_type: ProductType,
    pub effective_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    pub payment_plan: PaymentPlan,
    pub coverages: Vec<CoverageRequest>,
    pub insured_items: Vec<InsuredItem>,
    pub drivers: Vec<Driver>,
    pub locations: Vec<Location>,
}

/// A loss report as submitted; the reported date is the time of filing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimSubmission {
    pub policy_id: PolicyId,
    pub customer_id: CustomerId,
    pub loss_date: DateTime<Utc>,
    pub description: String,
    pub loss_amount: Option<Money>,
    pub reserve_amount: Option<Money>,
    pub loss_location: Option<String>,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone)]
pub struct IssuedPolicy {
    pub policy: Policy,
    /// False when declaration documents are still queued in the outbox
    pub documents_generated: bool,
}

#[derive(Debug, Clone)]
pub struct FiledClaim {
    pub claim: Claim,
    /// `None` when fraud evaluation failed and was left in the outbox
    pub fraud: Option<FraudAssessment>,
}

/// Rating and underwriting preview of an application
#[derive(Debug, Clone, Serialize)]
pub struct QuoteResult {
    pub rating: RatingResult,
    pub decision: UnderwritingDecision,
}

/// Orchestrates policy issue and claim filing over the domain ports
#[derive(Clone)]
pub struct AssemblyService {
    customers: Arc<dyn CustomerPort>,
    store: Arc<dyn AssemblyStore>,
    allocator: IdentifierAllocator,
    documents: Arc<dyn DocumentGenerator>,
    clock: Arc<dyn Clock>,
    rating: RatingEngine,
    underwriting: UnderwritingEngine,
    fraud: FraudEngine,
    default_state: Option<String>,
}

impl AssemblyService {
    pub fn new(
        customers: Arc<dyn CustomerPort>,
        store: Arc<dyn AssemblyStore>,
        allocator: IdentifierAllocator,
        documents: Arc<dyn DocumentGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            customers,
            store,
            allocator,
            documents,
            clock,
            rating: RatingEngine::default(),
            underwriting: UnderwritingEngine::default(),
            fraud: FraudEngine::standard(),
            default_state: None,
        }
    }

    pub fn with_rating(mut self, rating: RatingEngine) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_underwriting(mut self, underwriting: UnderwritingEngine) -> Self {
        self.underwriting = underwriting;
        self
    }

    pub fn with_fraud_engine(mut self, fraud: FraudEngine) -> Self {
        self.fraud = fraud;
        self
    }

    /// Tax state used when neither a location nor the customer address has one
    pub fn with_default_state(mut self, state: impl Into<String>) -> Self {
        self.default_state = Some(state.into().to_ascii_uppercase());
        self
    }

    /// Issues a policy from an application in one atomic write
    ///
    /// # Errors
    ///
    /// - `Validation` for bad dates or coverage inputs
    /// - `MissingRequiredCoverage` naming every absent required code, checked
    ///   before insured items, drivers and locations
    /// - `CustomerNotFound` if the customer does not exist
    /// - `AllocatorUnavailable` if no number could be allocated
    /// - `Persistence` if the write failed; nothing was stored
    #[instrument(skip(self, application, actor), fields(customer_id = %application.customer_id, product = %application.product_type))]
    pub async fn issue_policy(
        &self,
        application: PolicyApplication,
        actor: &OperationMetadata,
    ) -> Result<IssuedPolicy, AssemblyError> {
        let now = self.clock.now();
        let period = PolicyPeriod::new(application.effective_date, application.expiration_date)
            .map_err(|e| AssemblyError::validation(e.to_string()))?;
        self.rating
            .validate_required(application.product_type, &application.coverages)?;
        let builder = self.builder_for(&application, period, actor);
        builder.validate()?;

        let customer = self.find_customer(application.customer_id, actor).await?;
        let jurisdiction = self.jurisdiction(&application.locations, &customer);
        let rating = self.rating.price_for_binding(
            application.product_type,
            &application.coverages,
            &jurisdiction,
        )?;
        let prior_claims = self.prior_claim_count(customer.id, period.effective()).await?;

        let number = self.allocator.allocate(NumberKind::Policy).await?;
        let mut policy = builder.policy_number(number).build(now)?;
        policy.apply_rating(rating, now)?;
        let decision = self.underwriting.decide(&RatedPolicy {
            product: policy.product_type(),
            coverages: policy.coverages(),
            total_premium: policy.premium().total_premium,
            drivers: policy.drivers(),
            effective_date: period.effective().date_naive(),
            prior_claims,
        });
        policy.apply_decision(decision, now)?;

        for event in policy.take_events() {
            tracing::debug!(event = event.event_type(), policy_id = %event.policy_id(), "Policy event");
        }

        let issue = PolicyIssue {
            transaction: PolicyTransaction::new_business(
                policy.id(),
                policy.premium().total_premium,
                period.effective(),
                now,
            ),
            activity: Activity::new(
                EntityType::Policy,
                policy.id(),
                ActivityAction::Created,
                format!("Policy {} issued", policy.policy_number()),
                now,
            )
            .by(actor.initiated_by)
            .with_metadata(json!({
                "policyNumber": policy.policy_number(),
                "status": policy.status().as_str(),
                "totalPremium": policy.premium().total_premium.amount(),
                "riskScore": policy.decision().map(|d| d.risk_score),
                "tier": policy.decision().map(|d| d.tier.as_str()),
            })),
            outbox: OutboxMessage::pending(OutboxKind::GenerateDeclarationDocuments, policy.id(), now),
            policy,
        };

        self.store
            .save_issued_policy(&issue)
            .await
            .map_err(AssemblyError::Persistence)?;

        info!(
            policy_number = issue.policy.policy_number(),
            status = %issue.policy.status(),
            total_premium = %issue.policy.premium().total_premium,
            "Policy issued"
        );

        let documents_generated = self.generate_documents(&issue.policy, &issue.outbox).await;
        Ok(IssuedPolicy { policy: issue.policy, documents_generated })
    }

    /// Rating and underwriting preview. Nothing is written and missing
    /// required coverages are reported instead of rejected.
    #[instrument(skip(self, application, actor), fields(customer_id = %application.customer_id))]
    pub async fn quote(
        &self,
        application: &PolicyApplication,
        actor: &OperationMetadata,
    ) -> Result<QuoteResult, AssemblyError> {
        let period = PolicyPeriod::new(application.effective_date, application.expiration_date)
            .map_err(|e| AssemblyError::validation(e.to_string()))?;
        let customer = self.find_customer(application.customer_id, actor).await?;
        let jurisdiction = self.jurisdiction(&application.locations, &customer);

        let rating = self
            .rating
            .price(application.product_type, &application.coverages, &jurisdiction)?;
        let prior_claims = self.prior_claim_count(customer.id, period.effective()).await?;
        let decision = self.underwriting.decide(&RatedPolicy {
            product: application.product_type,
            coverages: &rating.coverages,
            total_premium: rating.premium.total_premium,
            drivers: &application.drivers,
            effective_date: period.effective().date_naive(),
            prior_claims,
        });

        Ok(QuoteResult { rating, decision })
    }

    /// Files a claim in one atomic write, then scores it for fraud
    ///
    /// # Errors
    ///
    /// - `Validation` for inconsistent dates, negative amounts, or a policy
    ///   that belongs to another customer
    /// - `PolicyNotFound` if the policy does not exist
    /// - `AllocatorUnavailable` if no number could be allocated
    /// - `Persistence` if the write failed; nothing was stored
    #[instrument(skip(self, submission, actor), fields(policy_id = %submission.policy_id))]
    pub async fn file_claim(
        &self,
        submission: ClaimSubmission,
        actor: &OperationMetadata,
    ) -> Result<FiledClaim, AssemblyError> {
        let now = self.clock.now();
        let report = ClaimReport {
            policy_id: submission.policy_id,
            customer_id: submission.customer_id,
            loss_date: submission.loss_date,
            reported_date: now,
            description: submission.description,
            loss_amount: submission.loss_amount,
            reserve_amount: submission.reserve_amount,
            loss_location: submission.loss_location,
            participants: submission.participants,
        };
        report.validate()?;

        let policy = self.find_policy(report.policy_id).await?;
        if policy.customer_id() != report.customer_id {
            return Err(AssemblyError::validation(format!(
                "policy {} does not belong to customer {}",
                policy.policy_number(),
                report.customer_id
            )));
        }

        let number = self.allocator.allocate(NumberKind::Claim).await?;
        let roster = self
            .store
            .list_adjusters_by_open_claim_count()
            .await
            .map_err(AssemblyError::Persistence)?;

        let mut claim = Claim::file(number, report, actor.initiated_by, now)?;
        match select_adjuster(&roster) {
            Some(adjuster) => claim.assign_adjuster(adjuster.adjuster_id, now),
            None => warn!(claim_number = claim.claim_number(), "No adjuster available, claim left unassigned"),
        }

        let filing = ClaimFiling {
            activity: Activity::new(
                EntityType::Claim,
                claim.id(),
                ActivityAction::Created,
                format!("Claim {} filed", claim.claim_number()),
                now,
            )
            .by(actor.initiated_by)
            .with_metadata(json!({
                "claimNumber": claim.claim_number(),
                "status": claim.status().as_str(),
                "lossAmount": claim.loss_amount().map(|m| m.amount()),
            })),
            outbox: OutboxMessage::pending(OutboxKind::EvaluateFraud, claim.id(), now),
            claim,
        };

        self.store
            .save_filed_claim(&filing)
            .await
            .map_err(AssemblyError::Persistence)?;

        info!(
            claim_number = filing.claim.claim_number(),
            adjuster = ?filing.claim.assigned_adjuster(),
            "Claim filed"
        );

        let fraud = match self.evaluate_fraud(&filing.claim).await {
            Ok(assessment) => {
                self.complete(&filing.outbox).await;
                Some(assessment)
            }
            Err(e) => {
                warn!(claim_number = filing.claim.claim_number(), error = %e, "Fraud evaluation deferred");
                self.record_failure(&filing.outbox, &e).await;
                None
            }
        };

        Ok(FiledClaim { claim: filing.claim, fraud })
    }

    pub async fn get_policy(&self, id: PolicyId) -> Result<Policy, AssemblyError> {
        self.find_policy(id).await
    }

    pub async fn get_claim(&self, id: ClaimId) -> Result<Claim, AssemblyError> {
        self.store.find_claim(id).await.map_err(|e| {
            if e.is_not_found() {
                AssemblyError::ClaimNotFound(id.to_string())
            } else {
                AssemblyError::Persistence(e)
            }
        })
    }

    /// Moves a policy along its lifecycle and records a `STATUS_CHANGED`
    /// activity
    #[instrument(skip(self, actor))]
    pub async fn change_policy_status(
        &self,
        id: PolicyId,
        status: PolicyStatus,
        actor: &OperationMetadata,
    ) -> Result<Policy, AssemblyError> {
        let now = self.clock.now();
        let mut policy = self.find_policy(id).await?;
        let previous = policy.transition(status, now)?;
        policy.take_events();

        let activity = Activity::new(
            EntityType::Policy,
            policy.id(),
            ActivityAction::StatusChanged,
            format!("Policy {} changed from {} to {}", policy.policy_number(), previous, status),
            now,
        )
        .by(actor.initiated_by)
        .with_metadata(json!({ "from": previous.as_str(), "to": status.as_str() }));

        self.store
            .update_policy_status(&policy, previous, &activity)
            .await
            .map_err(AssemblyError::Persistence)?;

        info!(policy_number = policy.policy_number(), from = %previous, to = %status, "Policy status changed");
        Ok(policy)
    }

    /// Applies a compliance review and date changes and records an
    /// `UPDATED` activity listing what changed
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty update or an inverted period
    /// - `InvalidTransition` when dates change on a policy already in force
    /// - `Persistence(Conflict)` if the status moved since the policy was read
    #[instrument(skip(self, update, actor))]
    pub async fn update_policy(
        &self,
        id: PolicyId,
        update: PolicyUpdate,
        actor: &OperationMetadata,
    ) -> Result<Policy, AssemblyError> {
        if update.is_empty() {
            return Err(AssemblyError::validation("no policy fields to update"));
        }
        let now = self.clock.now();
        let mut policy = self.find_policy(id).await?;

        let mut changes = serde_json::Map::new();
        if let Some(status) = update.compliance_status {
            if status != policy.compliance_status() {
                changes.insert(
                    "complianceStatus".into(),
                    json!({ "from": policy.compliance_status().as_str(), "to": status.as_str() }),
                );
            }
            policy.set_compliance_status(status, now);
        }
        if update.effective_date.is_some() || update.expiration_date.is_some() {
            let current = *policy.period();
            let period = PolicyPeriod::new(
                update.effective_date.unwrap_or(current.effective()),
                update.expiration_date.unwrap_or(current.expiration()),
            )
            .map_err(|e| AssemblyError::validation(e.to_string()))?;
            if period != current {
                changes.insert(
                    "period".into(),
                    json!({
                        "effectiveDate": period.effective(),
                        "expirationDate": period.expiration(),
                    }),
                );
            }
            policy.reschedule(period, now)?;
        }
        for event in policy.take_events() {
            tracing::debug!(event = event.event_type(), policy_id = %event.policy_id(), "Policy event");
        }

        let activity = Activity::new(
            EntityType::Policy,
            policy.id(),
            ActivityAction::Updated,
            format!("Policy {} updated", policy.policy_number()),
            now,
        )
        .by(actor.initiated_by)
        .with_metadata(serde_json::Value::Object(changes));

        self.store
            .update_policy(&policy, &activity)
            .await
            .map_err(AssemblyError::Persistence)?;

        info!(policy_number = policy.policy_number(), "Policy updated");
        Ok(policy)
    }

    /// Policies matching the filters, newest first
    #[instrument(skip(self, query))]
    pub async fn list_policies(
        &self,
        query: &PolicyQuery,
        page: Page,
    ) -> Result<Paginated<PolicySummary>, AssemblyError> {
        self.store
            .list_policies(query, page)
            .await
            .map_err(AssemblyError::Persistence)
    }

    /// Claims matching the filters, most recently reported first
    #[instrument(skip(self, query))]
    pub async fn list_claims(
        &self,
        query: &ClaimQuery,
        page: Page,
    ) -> Result<Paginated<ClaimSummary>, AssemblyError> {
        self.store
            .list_claims(query, page)
            .await
            .map_err(AssemblyError::Persistence)
    }

    #[instrument(skip(self, query))]
    pub async fn list_customers(
        &self,
        query: &CustomerQuery,
        page: Page,
    ) -> Result<Paginated<Customer>, AssemblyError> {
        self.customers
            .list_customers(query, page)
            .await
            .map_err(AssemblyError::Persistence)
    }

    /// Retries pending post-commit work, oldest first. Messages are claimed
    /// before they are worked, so concurrent drains never share a message.
    #[instrument(skip(self))]
    pub async fn drain_outbox(&self, limit: u32) -> Result<DrainReport, AssemblyError> {
        let pending = self
            .store
            .claim_pending_outbox(limit, self.clock.now())
            .await
            .map_err(AssemblyError::Persistence)?;

        let mut report = DrainReport::default();
        for message in pending {
            let outcome = match message.kind {
                OutboxKind::GenerateDeclarationDocuments => {
                    match self.store.find_policy(PolicyId::from_uuid(message.aggregate_id)).await {
                        Ok(policy) => self.documents.generate_declaration_documents(&policy).await,
                        Err(e) => Err(e),
                    }
                }
                OutboxKind::EvaluateFraud => {
                    match self.store.find_claim(ClaimId::from_uuid(message.aggregate_id)).await {
                        Ok(claim) => self.evaluate_fraud(&claim).await.map(|_| ()),
                        Err(e) => Err(e),
                    }
                }
            };

            match outcome {
                Ok(()) => {
                    self.complete(&message).await;
                    report.completed += 1;
                }
                Err(e) => {
                    warn!(kind = message.kind.as_str(), attempts = message.attempts + 1, error = %e, "Outbox retry failed");
                    self.record_failure(&message, &e).await;
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    fn builder_for(
        &self,
        application: &PolicyApplication,
        period: PolicyPeriod,
        actor: &OperationMetadata,
    ) -> PolicyBuilder {
        let mut builder = PolicyBuilder::new()
            .customer(application.customer_id)
            .product(application.product_type)
            .period(period)
            .payment_plan(application.payment_plan)
            .currency(self.rating.tables().currency())
            .insured_items(application.insured_items.clone())
            .drivers(application.drivers.clone())
            .locations(application.locations.clone());
        if let Some(user) = actor.initiated_by {
            builder = builder.created_by(user);
        }
        builder
    }

    /// First location's state, else the customer's address state, else the
    /// configured default
    fn jurisdiction(&self, locations: &[Location], customer: &Customer) -> String {
        locations
            .first()
            .map(|l| l.state.clone())
            .filter(|s| !s.trim().is_empty())
            .or_else(|| Some(customer.home_state().to_string()).filter(|s| !s.trim().is_empty()))
            .or_else(|| self.default_state.clone())
            .unwrap_or_default()
    }

    async fn find_customer(
        &self,
        id: CustomerId,
        actor: &OperationMetadata,
    ) -> Result<Customer, AssemblyError> {
        self.customers
            .find_customer(id, Some(actor.clone()))
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    AssemblyError::CustomerNotFound(id)
                } else {
                    AssemblyError::Persistence(e)
                }
            })
    }

    async fn find_policy(&self, id: PolicyId) -> Result<Policy, AssemblyError> {
        self.store.find_policy(id).await.map_err(|e| {
            if e.is_not_found() {
                AssemblyError::PolicyNotFound(id.to_string())
            } else {
                AssemblyError::Persistence(e)
            }
        })
    }

    async fn prior_claim_count(
        &self,
        customer_id: CustomerId,
        effective: DateTime<Utc>,
    ) -> Result<u32, AssemblyError> {
        let since = effective - Duration::days(LOSS_HISTORY_DAYS);
        let history = self
            .store
            .customer_claim_history(customer_id, since)
            .await
            .map_err(AssemblyError::Persistence)?;
        Ok(history.iter().filter(|h| h.reported_date <= effective).count() as u32)
    }

    /// Scores the claim and stores an alert when any indicator fired
    async fn evaluate_fraud(&self, claim: &Claim) -> Result<FraudAssessment, PortError> {
        let since = claim.reported_date() - Duration::days(FRAUD_WINDOW_DAYS);
        let history = self.store.customer_claim_history(claim.customer_id(), since).await?;
        let assessment = self.fraud.evaluate(claim, &history);

        if let Some(alert) = assessment.to_alert(claim, self.clock.now()) {
            self.store.save_fraud_alert(&alert).await?;
            warn!(
                claim_number = claim.claim_number(),
                risk_score = alert.risk_score,
                severity = alert.severity.as_str(),
                "Fraud alert raised"
            );
        }
        Ok(assessment)
    }

    async fn generate_documents(&self, policy: &Policy, message: &OutboxMessage) -> bool {
        match self.documents.generate_declaration_documents(policy).await {
            Ok(()) => {
                self.complete(message).await;
                true
            }
            Err(e) => {
                warn!(policy_number = policy.policy_number(), error = %e, "Declaration documents deferred");
                self.record_failure(message, &e).await;
                false
            }
        }
    }

    async fn complete(&self, message: &OutboxMessage) {
        if let Err(e) = self.store.complete_outbox(message.id).await {
            warn!(outbox_id = %message.id, error = %e, "Could not mark outbox message completed");
        }
    }

    async fn record_failure(&self, message: &OutboxMessage, error: &PortError) {
        if let Err(e) = self.store.record_outbox_failure(message.id, &error.to_string()).await {
            warn!(outbox_id = %message.id, error = %e, "Could not record outbox failure");
        }
    }
}

impl std::fmt::Debug for AssemblyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssemblyService")
            .field("allocator", &self.allocator)
            .field("rating", &self.rating)
            .field("default_state", &self.default_state)
            .finish_non_exhaustive()
    }
}
