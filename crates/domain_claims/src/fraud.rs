//! Fraud signal engine
//!
//! A filed claim is checked against an ordered list of [`FraudRule`]s. Each
//! rule is a named predicate worth a fixed number of points; the assessment
//! adds up the points of every rule that fired. Rules are appended with
//! [`FraudEngine::with_rule`] and never change how scores are aggregated.
//!
//! Standard rules:
//!
//! | label | fires when | points |
//! |---|---|---|
//! | high value claim | loss amount > 50,000 | 25 + 25 bonus |
//! | multiple recent claims | > 3 claims by the customer in the 90 days up to the reported date | 25 |
//!
//! Severity is `HIGH` when the loss amount exceeds 75,000 and `MEDIUM`
//! otherwise. No alert is raised when nothing fires.
//!
//! Evaluation is pure: the same claim and history always produce the same
//! assessment.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use core_kernel::{ClaimId, FraudAlertId};

use crate::claim::Claim;
use crate::error::ClaimError;

pub const HIGH_VALUE_THRESHOLD: Decimal = dec!(50000);
pub const HIGH_SEVERITY_THRESHOLD: Decimal = dec!(75000);
pub const RECENT_CLAIM_WINDOW_DAYS: i64 = 90;
pub const RECENT_CLAIM_LIMIT: usize = 3;

/// A claim previously filed by the same customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimHistoryEntry {
    pub claim_id: ClaimId,
    pub reported_date: DateTime<Utc>,
}

/// What a rule predicate can see
#[derive(Debug, Clone, Copy)]
pub struct FraudContext<'a> {
    pub claim: &'a Claim,
    pub history: &'a [ClaimHistoryEntry],
}

impl FraudContext<'_> {
    /// Distinct claims by the customer reported in the trailing window,
    /// counting the claim under evaluation once
    pub fn recent_claim_count(&self, window: Duration) -> usize {
        let reported = self.claim.reported_date();
        let since = reported - window;

        let mut seen: HashSet<ClaimId> = self
            .history
            .iter()
            .filter(|h| h.reported_date >= since && h.reported_date <= reported)
            .map(|h| h.claim_id)
            .collect();
        seen.insert(self.claim.id());
        seen.len()
    }

    fn loss_exceeds(&self, threshold: Decimal) -> bool {
        self.claim
            .loss_amount()
            .is_some_and(|loss| loss.amount() > threshold)
    }
}

type Predicate = Arc<dyn Fn(&FraudContext<'_>) -> bool + Send + Sync>;

/// A named fraud indicator
#[derive(Clone)]
pub struct FraudRule {
    label: String,
    points: u32,
    bonus: u32,
    predicate: Predicate,
}

impl FraudRule {
    pub fn new<F>(label: impl Into<String>, points: u32, predicate: F) -> Self
    where
        F: Fn(&FraudContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            points,
            bonus: 0,
            predicate: Arc::new(predicate),
        }
    }

    /// Extra points added on top of the rule's own when it fires
    pub fn with_bonus(mut self, bonus: u32) -> Self {
        self.bonus = bonus;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    fn fires(&self, context: &FraudContext<'_>) -> bool {
        (self.predicate)(context)
    }
}

impl fmt::Debug for FraudRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FraudRule")
            .field("label", &self.label)
            .field("points", &self.points)
            .field("bonus", &self.bonus)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl FromStr for Severity {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            other => Err(ClaimError::validation(format!("unknown severity {other}"))),
        }
    }
}

/// A rule that fired
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudIndicator {
    pub label: String,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudAssessment {
    pub indicators: Vec<FraudIndicator>,
    pub risk_score: u8,
    /// Present only when at least one indicator fired
    pub severity: Option<Severity>,
    pub investigation_required: bool,
}

impl FraudAssessment {
    pub fn is_clean(&self) -> bool {
        self.indicators.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.indicators.iter().map(|i| i.label.clone()).collect()
    }

    /// Turns a non-clean assessment into an alert against the claim
    pub fn to_alert(&self, claim: &Claim, at: DateTime<Utc>) -> Option<FraudAlert> {
        let severity = self.severity?;
        let labels = self.labels();
        Some(FraudAlert {
            id: FraudAlertId::new_v7(),
            entity_type: "CLAIM".to_string(),
            entity_id: claim.id().as_uuid().to_string(),
            alert_type: AlertType::SuspiciousPattern,
            severity,
            risk_score: self.risk_score,
            description: format!("Potential fraud detected: {}", labels.join(", ")),
            indicators: labels,
            investigation_required: self.investigation_required,
            status: AlertStatus::Pending,
            created_at: at,
        })
    }
}

/// Evaluates claims against a rule list
#[derive(Debug, Clone)]
pub struct FraudEngine {
    rules: Vec<FraudRule>,
}

impl FraudEngine {
    /// Engine with no rules; every claim is clean
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// High value and claim frequency rules
    pub fn standard() -> Self {
        Self::empty()
            .with_rule(
                FraudRule::new("high value claim", 25, |ctx| ctx.loss_exceeds(HIGH_VALUE_THRESHOLD))
                    .with_bonus(25),
            )
            .with_rule(FraudRule::new("multiple recent claims", 25, |ctx| {
                ctx.recent_claim_count(Duration::days(RECENT_CLAIM_WINDOW_DAYS)) > RECENT_CLAIM_LIMIT
            }))
    }

    pub fn with_rule(mut self, rule: FraudRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[FraudRule] {
        &self.rules
    }

    pub fn evaluate(&self, claim: &Claim, history: &[ClaimHistoryEntry]) -> FraudAssessment {
        let context = FraudContext { claim, history };

        let fired: Vec<&FraudRule> = self.rules.iter().filter(|r| r.fires(&context)).collect();
        let points: u32 = fired.iter().map(|r| r.points + r.bonus).sum();
        let indicators: Vec<FraudIndicator> = fired
            .iter()
            .map(|r| FraudIndicator { label: r.label.clone(), points: r.points })
            .collect();

        tracing::debug!(
            claim_number = claim.claim_number(),
            indicators = indicators.len(),
            points,
            "Fraud rules evaluated"
        );

        let severity = if indicators.is_empty() {
            None
        } else if context.loss_exceeds(HIGH_SEVERITY_THRESHOLD) {
            Some(Severity::High)
        } else {
            Some(Severity::Medium)
        };

        FraudAssessment {
            investigation_required: !indicators.is_empty(),
            risk_score: points.min(100) as u8,
            severity,
            indicators,
        }
    }
}

impl Default for FraudEngine {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    SuspiciousPattern,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::SuspiciousPattern => "SUSPICIOUS_PATTERN",
        }
    }
}

/// Review status of an alert. Moves are made by a human reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Pending,
    Investigating,
    Confirmed,
    Dismissed,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Pending => "PENDING",
            AlertStatus::Investigating => "INVESTIGATING",
            AlertStatus::Confirmed => "CONFIRMED",
            AlertStatus::Dismissed => "DISMISSED",
        }
    }

    pub fn can_transition_to(&self, target: AlertStatus) -> bool {
        use AlertStatus::*;
        matches!(
            (self, target),
            (Pending, Investigating)
                | (Pending, Dismissed)
                | (Investigating, Confirmed)
                | (Investigating, Dismissed)
        )
    }
}

impl FromStr for AlertStatus {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(AlertStatus::Pending),
            "INVESTIGATING" => Ok(AlertStatus::Investigating),
            "CONFIRMED" => Ok(AlertStatus::Confirmed),
            "DISMISSED" => Ok(AlertStatus::Dismissed),
            other => Err(ClaimError::validation(format!("unknown alert status {other}"))),
        }
    }
}

/// Alert raised against a claim; references the claim but is not owned by it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudAlert {
    pub id: FraudAlertId,
    pub entity_type: String,
    pub entity_id: String,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub risk_score: u8,
    pub description: String,
    pub indicators: Vec<String>,
    pub investigation_required: bool,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
}

impl FraudAlert {
    pub fn review(&mut self, status: AlertStatus) -> Result<(), ClaimError> {
        if !self.status.can_transition_to(status) {
            return Err(ClaimError::InvalidStatusTransition {
                from: self.status.as_str().to_string(),
                to: status.as_str().to_string(),
            });
        }
        self.status = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::ClaimReport;
    use chrono::TimeZone;
    use core_kernel::{CustomerId, Money, PolicyId};

    fn claim_with_loss(loss: Option<Decimal>) -> Claim {
        let reported = Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap();
        let report = ClaimReport {
            policy_id: PolicyId::new(),
            customer_id: CustomerId::new(),
            loss_date: reported - Duration::days(1),
            reported_date: reported,
            description: "Kitchen fire".into(),
            loss_amount: loss.map(Money::usd),
            reserve_amount: None,
            loss_location: None,
            participants: Vec::new(),
        };
        Claim::file("CLM-20240000010", report, None, reported).unwrap()
    }

    fn prior(claim: &Claim, days_before: i64) -> ClaimHistoryEntry {
        ClaimHistoryEntry {
            claim_id: ClaimId::new(),
            reported_date: claim.reported_date() - Duration::days(days_before),
        }
    }

    #[test]
    fn test_clean_claim_has_no_indicators() {
        let claim = claim_with_loss(Some(dec!(1200)));
        let assessment = FraudEngine::standard().evaluate(&claim, &[]);
        assert!(assessment.is_clean());
        assert_eq!(assessment.risk_score, 0);
        assert!(assessment.severity.is_none());
        assert!(assessment.to_alert(&claim, claim.reported_date()).is_none());
    }

    #[test]
    fn test_high_value_scores_fifty() {
        let claim = claim_with_loss(Some(dec!(60000)));
        let assessment = FraudEngine::standard().evaluate(&claim, &[]);
        assert_eq!(assessment.labels(), vec!["high value claim"]);
        assert_eq!(assessment.risk_score, 50);
        assert_eq!(assessment.severity, Some(Severity::Medium));
    }

    #[test]
    fn test_exactly_fifty_thousand_is_not_high_value() {
        let claim = claim_with_loss(Some(dec!(50000)));
        assert!(FraudEngine::standard().evaluate(&claim, &[]).is_clean());
    }

    #[test]
    fn test_frequency_window_is_inclusive_of_ninety_days() {
        let claim = claim_with_loss(None);
        let history = vec![prior(&claim, 10), prior(&claim, 40), prior(&claim, 90)];
        let assessment = FraudEngine::standard().evaluate(&claim, &history);
        assert_eq!(assessment.labels(), vec!["multiple recent claims"]);
        assert_eq!(assessment.risk_score, 25);
    }

    #[test]
    fn test_old_claims_fall_outside_window() {
        let claim = claim_with_loss(None);
        let history = vec![prior(&claim, 10), prior(&claim, 40), prior(&claim, 91)];
        assert!(FraudEngine::standard().evaluate(&claim, &history).is_clean());
    }

    #[test]
    fn test_current_claim_in_history_counted_once() {
        let claim = claim_with_loss(None);
        let current = ClaimHistoryEntry {
            claim_id: claim.id(),
            reported_date: claim.reported_date(),
        };
        let history = vec![current, prior(&claim, 5), prior(&claim, 6)];
        assert!(FraudEngine::standard().evaluate(&claim, &history).is_clean());
    }

    #[test]
    fn test_alert_from_assessment() {
        let claim = claim_with_loss(Some(dec!(80000)));
        let assessment = FraudEngine::standard().evaluate(&claim, &[]);
        let alert = assessment.to_alert(&claim, claim.reported_date()).unwrap();
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.status, AlertStatus::Pending);
        assert_eq!(alert.description, "Potential fraud detected: high value claim");
        assert_eq!(alert.entity_type, "CLAIM");
    }

    #[test]
    fn test_appended_rule_adds_points() {
        let claim = claim_with_loss(Some(dec!(60000)));
        let engine = FraudEngine::standard()
            .with_rule(FraudRule::new("no loss location", 10, |ctx| ctx.claim.loss_location().is_none()));
        let assessment = engine.evaluate(&claim, &[]);
        assert_eq!(assessment.risk_score, 60);
        assert_eq!(assessment.indicators.len(), 2);
    }

    #[test]
    fn test_alert_review_transitions() {
        let claim = claim_with_loss(Some(dec!(60000)));
        let mut alert = FraudEngine::standard()
            .evaluate(&claim, &[])
            .to_alert(&claim, claim.reported_date())
            .unwrap();
        assert!(alert.review(AlertStatus::Confirmed).is_err());
        alert.review(AlertStatus::Investigating).unwrap();
        alert.review(AlertStatus::Confirmed).unwrap();
    }
}
