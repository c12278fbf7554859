//! Read models and filters for the list endpoints
//!
//! Summaries are flat projections joined across aggregates (a policy with
//! its customer's name, a claim with its policy number). They are read-only
//! and never loaded back into an aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, CustomerId, Money, PolicyId, UserId};
use domain_claims::{Claim, ClaimStatus};
use domain_party::Customer;
use domain_policy::{ComplianceStatus, Policy, PolicyStatus, ProductType};

fn search_term(search: &Option<String>) -> Option<String> {
    search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

/// Filters for listing policies; every field narrows the result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyQuery {
    pub status: Option<PolicyStatus>,
    pub product_type: Option<ProductType>,
    /// Case-insensitive match on policy number, customer names and email
    pub search: Option<String>,
}

impl PolicyQuery {
    pub fn search_term(&self) -> Option<String> {
        search_term(&self.search)
    }

    pub fn matches(&self, summary: &PolicySummary) -> bool {
        self.status.map_or(true, |s| s == summary.status)
            && self.product_type.map_or(true, |p| p == summary.product_type)
            && self.search_term().map_or(true, |term| {
                summary.policy_number.to_lowercase().contains(&term)
                    || summary.customer_name.to_lowercase().contains(&term)
                    || summary
                        .customer_email
                        .as_deref()
                        .is_some_and(|e| e.to_lowercase().contains(&term))
            })
    }
}

/// Filters for listing claims
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimQuery {
    pub status: Option<ClaimStatus>,
    /// Case-insensitive match on claim number, description and policy number
    pub search: Option<String>,
}

impl ClaimQuery {
    pub fn search_term(&self) -> Option<String> {
        search_term(&self.search)
    }

    pub fn matches(&self, summary: &ClaimSummary) -> bool {
        self.status.map_or(true, |s| s == summary.status)
            && self.search_term().map_or(true, |term| {
                summary.claim_number.to_lowercase().contains(&term)
                    || summary.description.to_lowercase().contains(&term)
                    || summary.policy_number.to_lowercase().contains(&term)
            })
    }
}

/// One row of the policy list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
    pub id: PolicyId,
    pub policy_number: String,
    pub product_type: ProductType,
    pub status: PolicyStatus,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub effective_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    pub total_premium: Money,
    pub risk_score: Option<u8>,
    pub compliance_status: ComplianceStatus,
    pub claim_count: u32,
    pub created_at: DateTime<Utc>,
}

impl PolicySummary {
    /// Projects a policy; the customer is `None` when it is not on file
    pub fn project(policy: &Policy, customer: Option<&Customer>, claim_count: u32) -> Self {
        Self {
            id: policy.id(),
            policy_number: policy.policy_number().to_string(),
            product_type: policy.product_type(),
            status: policy.status(),
            customer_id: policy.customer_id(),
            customer_name: customer.map(Customer::display_name).unwrap_or_default(),
            customer_email: customer.and_then(|c| c.email.clone()),
            effective_date: policy.period().effective(),
            expiration_date: policy.period().expiration(),
            total_premium: policy.premium().total_premium,
            risk_score: policy.decision().map(|d| d.risk_score),
            compliance_status: policy.compliance_status(),
            claim_count,
            created_at: policy.created_at(),
        }
    }
}

/// One row of the claim list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSummary {
    pub id: ClaimId,
    pub claim_number: String,
    pub policy_id: PolicyId,
    pub policy_number: String,
    pub customer_id: CustomerId,
    pub status: ClaimStatus,
    pub description: String,
    pub loss_date: DateTime<Utc>,
    pub reported_date: DateTime<Utc>,
    pub loss_amount: Option<Money>,
    pub reserve_amount: Option<Money>,
    pub assigned_adjuster: Option<UserId>,
}

impl ClaimSummary {
    pub fn project(claim: &Claim, policy_number: impl Into<String>) -> Self {
        Self {
            id: claim.id(),
            claim_number: claim.claim_number().to_string(),
            policy_id: claim.policy_id(),
            policy_number: policy_number.into(),
            customer_id: claim.customer_id(),
            status: claim.status(),
            description: claim.description().to_string(),
            loss_date: claim.loss_date(),
            reported_date: claim.reported_date(),
            loss_amount: claim.loss_amount(),
            reserve_amount: claim.reserve_amount(),
            assigned_adjuster: claim.assigned_adjuster(),
        }
    }
}

/// Editable policy attributes. Premium and risk score are derived by rating
/// and underwriting and cannot be set directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyUpdate {
    pub compliance_status: Option<ComplianceStatus>,
    pub effective_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
}

impl PolicyUpdate {
    pub fn is_empty(&self) -> bool {
        self.compliance_status.is_none() && self.effective_date.is_none() && self.expiration_date.is_none()
    }
}
