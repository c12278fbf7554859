//! PostgreSQL Adapter Tests
//!
//! Runs the adapters against a disposable PostgreSQL container. These tests
//! need a Docker daemon and are ignored by default:
//!
//! ```text
//! cargo test -p infra_db -- --ignored
//! ```
//!
//! # Test Organization
//!
//! - `sequence` - counters per kind and year under concurrency
//! - `policies` - issue round trip, uniqueness, rollback on failure,
//!   guarded updates
//! - `claims` - filing, history, adjuster load, alert uniqueness, cents
//! - `outbox` - claiming, leases, completion, failure bookkeeping
//! - `listing` - filtered and paged policy, claim and customer queries
//! - `service` - the assembly service wired to every adapter

use chrono::{Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::sync::Arc;

use app_services::{
    Activity, ActivityAction, AssemblyError, AssemblyService, AssemblyStore, ClaimQuery,
    EntityType, LoggingDocumentGenerator, OutboxKind, OutboxMessage, OutboxStatus, PolicyIssue,
    PolicyQuery, PolicyUpdate, OUTBOX_LEASE_SECONDS,
};
use core_kernel::{
    FixedClock, IdentifierAllocator, Money, NumberKind, OperationMetadata, Page, PolicyPeriod,
    PortError, SequencePort,
};
use domain_claims::{AlertStatus, AlertType, ClaimStatus, FraudAlert, Severity};
use domain_party::{Customer, CustomerPort, CustomerQuery, CustomerType, User};
use domain_policy::{ComplianceStatus, PolicyBuilder, PolicyStatus, PolicyTransaction, ProductType};
use infra_db::{insert_user, PostgresAssemblyStore, PostgresCustomerPort, PostgresSequence};
use sqlx::PgPool;
use test_utils::{
    assert_claim_number, assert_issued, assert_policy_number, create_isolated_test_database,
    fixed_now, AdjusterFixtures, ApplicationBuilder, ClaimSubmissionBuilder, CustomerFixtures,
    RiskFixtures, TestDatabase,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

struct Engine {
    db: TestDatabase,
    service: AssemblyService,
    store: PostgresAssemblyStore,
    customer: Customer,
    adjusters: Vec<User>,
}

async fn database() -> TestDatabase {
    create_isolated_test_database()
        .await
        .expect("failed to start PostgreSQL container")
}

async fn engine() -> Engine {
    let db = database().await;
    let pool = db.pool().clone();

    let customers = PostgresCustomerPort::new(pool.clone());
    let customer = CustomerFixtures::individual_in("NY");
    customers.insert(&customer).await.unwrap();

    let adjusters = vec![
        AdjusterFixtures::named("Avery Park"),
        AdjusterFixtures::named("Blake Moss"),
    ];
    for adjuster in &adjusters {
        insert_user(&pool, adjuster).await.unwrap();
    }

    let clock = Arc::new(FixedClock(fixed_now()));
    let store = PostgresAssemblyStore::new(pool.clone());
    let service = AssemblyService::new(
        Arc::new(customers),
        Arc::new(store.clone()),
        IdentifierAllocator::new(Arc::new(PostgresSequence::new(pool)), clock.clone()),
        Arc::new(LoggingDocumentGenerator),
        clock,
    );

    Engine { db, service, store, customer, adjusters }
}

fn actor() -> OperationMetadata {
    OperationMetadata::default()
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

/// A quote-status policy with a hand-built issue record around it
fn manual_issue(customer: &Customer, number: &str) -> PolicyIssue {
    let now = fixed_now();
    let period = PolicyPeriod::new(now, now + Duration::days(365)).unwrap();
    let policy = PolicyBuilder::new()
        .policy_number(number)
        .customer(customer.id)
        .product(ProductType::PersonalAuto)
        .period(period)
        .add_insured_item(RiskFixtures::vehicle())
        .add_location(RiskFixtures::location_in("CA"))
        .build(now)
        .unwrap();

    // Released, as after a failed first attempt
    let mut outbox = OutboxMessage::pending(OutboxKind::GenerateDeclarationDocuments, policy.id(), now);
    outbox.claimed_until = None;

    PolicyIssue {
        transaction: PolicyTransaction::new_business(policy.id(), Money::usd(dec!(0)), now, now),
        activity: Activity::new(EntityType::Policy, policy.id(), ActivityAction::Created, "manual", now),
        outbox,
        policy,
    }
}

// ============================================================================
// SEQUENCE TESTS
// ============================================================================

mod sequence {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_first_value_is_one_per_kind_and_year() {
        let db = database().await;
        let sequence = PostgresSequence::new(db.pool().clone());

        assert_eq!(sequence.next_value(NumberKind::Policy, 2024).await.unwrap(), 1);
        assert_eq!(sequence.next_value(NumberKind::Policy, 2024).await.unwrap(), 2);
        assert_eq!(sequence.next_value(NumberKind::Claim, 2024).await.unwrap(), 1);
        assert_eq!(sequence.next_value(NumberKind::Policy, 2025).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "requires a Docker daemon"]
    async fn test_concurrent_allocations_are_distinct_and_dense() {
        let db = database().await;
        let sequence = Arc::new(PostgresSequence::new(db.pool().clone()));

        let handles: Vec<_> = (0..40)
            .map(|_| {
                let sequence = sequence.clone();
                tokio::spawn(async move { sequence.next_value(NumberKind::Claim, 2024).await })
            })
            .collect();

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.unwrap().unwrap());
        }
        values.sort_unstable();
        assert_eq!(values, (1..=40).collect::<Vec<u64>>());
    }
}

// ============================================================================
// POLICY PERSISTENCE TESTS
// ============================================================================

mod policies {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_issued_policy_round_trips() {
        let e = engine().await;
        let application = ApplicationBuilder::personal_auto(e.customer.id)
            .drivers(vec![RiskFixtures::adult_driver()])
            .build();

        let issued = e.service.issue_policy(application, &actor()).await.unwrap();
        assert_issued(&issued.policy);
        assert_policy_number(issued.policy.policy_number(), 2024);

        let loaded = e.store.find_policy(issued.policy.id()).await.unwrap();
        assert_eq!(loaded.policy_number(), issued.policy.policy_number());
        assert_eq!(loaded.status(), PolicyStatus::Bound);
        assert_eq!(loaded.jurisdiction(), "CA");
        assert_eq!(loaded.premium(), issued.policy.premium());
        assert_eq!(loaded.premium().total_premium.amount(), dec!(640));
        assert_eq!(loaded.decision(), issued.policy.decision());

        let codes: Vec<_> = loaded.coverages().iter().map(|c| c.code.as_str()).collect();
        let issued_codes: Vec<_> = issued.policy.coverages().iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, issued_codes);
        assert_eq!(loaded.insured_items().len(), 1);
        assert_eq!(loaded.drivers().len(), 1);
        assert_eq!(loaded.locations().len(), 1);

        let pool = e.db.pool();
        assert_eq!(count(pool, "policy_transactions").await, 1);
        assert_eq!(count(pool, "activities").await, 1);
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_missing_policy_is_not_found() {
        let e = engine().await;
        let err = e.store.find_policy(core_kernel::PolicyId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_duplicate_policy_number_is_conflict() {
        let e = engine().await;
        e.store
            .save_issued_policy(&manual_issue(&e.customer, "POL-2024-000900"))
            .await
            .unwrap();

        let err = e
            .store
            .save_issued_policy(&manual_issue(&e.customer, "POL-2024-000900"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict { .. }), "got {err:?}");
        assert_eq!(count(e.db.pool(), "policies").await, 1);
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_failure_on_last_write_rolls_back_everything() {
        let e = engine().await;
        let first = manual_issue(&e.customer, "POL-2024-000901");
        e.store.save_issued_policy(&first).await.unwrap();

        // The outbox row is written last; reusing its id fails the final insert
        let mut second = manual_issue(&e.customer, "POL-2024-000902");
        second.outbox.id = first.outbox.id;
        assert!(e.store.save_issued_policy(&second).await.is_err());

        let err = e.store.find_policy(second.policy.id()).await.unwrap_err();
        assert!(err.is_not_found());

        let pool = e.db.pool();
        assert_eq!(count(pool, "policies").await, 1);
        assert_eq!(count(pool, "coverages").await, 0);
        assert_eq!(count(pool, "insured_items").await, 1);
        assert_eq!(count(pool, "locations").await, 1);
        assert_eq!(count(pool, "policy_transactions").await, 1);
        assert_eq!(count(pool, "activities").await, 1);
        assert_eq!(count(pool, "outbox_messages").await, 1);
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_unknown_customer_is_validation_and_writes_nothing() {
        let e = engine().await;
        let stranger = CustomerFixtures::individual_in("TX");

        let err = e
            .store
            .save_issued_policy(&manual_issue(&stranger, "POL-2024-000903"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Validation { .. }), "got {err:?}");
        assert_eq!(count(e.db.pool(), "policies").await, 0);
        assert_eq!(count(e.db.pool(), "activities").await, 0);
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_status_update_persists() {
        let e = engine().await;
        let issued = e
            .service
            .issue_policy(ApplicationBuilder::personal_auto(e.customer.id).build(), &actor())
            .await
            .unwrap();

        e.service
            .change_policy_status(issued.policy.id(), PolicyStatus::Active, &actor())
            .await
            .unwrap();

        let loaded = e.store.find_policy(issued.policy.id()).await.unwrap();
        assert_eq!(loaded.status(), PolicyStatus::Active);
        assert_eq!(count(e.db.pool(), "activities").await, 2);
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_status_update_from_stale_snapshot_is_conflict() {
        let e = engine().await;
        let issued = e
            .service
            .issue_policy(ApplicationBuilder::personal_auto(e.customer.id).build(), &actor())
            .await
            .unwrap();
        let mut stale = e.store.find_policy(issued.policy.id()).await.unwrap();

        e.service
            .change_policy_status(issued.policy.id(), PolicyStatus::Cancelled, &actor())
            .await
            .unwrap();

        let previous = stale.transition(PolicyStatus::Active, fixed_now()).unwrap();
        let activity = Activity::new(EntityType::Policy, stale.id(), ActivityAction::StatusChanged, "stale", fixed_now());
        let err = e
            .store
            .update_policy_status(&stale, previous, &activity)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict { .. }), "got {err:?}");

        let loaded = e.store.find_policy(issued.policy.id()).await.unwrap();
        assert_eq!(loaded.status(), PolicyStatus::Cancelled);
        assert_eq!(count(e.db.pool(), "activities").await, 2);
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_status_update_of_unknown_policy_is_not_found() {
        let e = engine().await;
        let issue = manual_issue(&e.customer, "POL-2024-000904");
        let err = e
            .store
            .update_policy_status(&issue.policy, PolicyStatus::Quote, &issue.activity)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_policy_update_persists_compliance_and_period() {
        let e = engine().await;
        let issued = e
            .service
            .issue_policy(ApplicationBuilder::personal_auto(e.customer.id).build(), &actor())
            .await
            .unwrap();
        let effective = fixed_now() + Duration::days(10);

        e.service
            .update_policy(
                issued.policy.id(),
                PolicyUpdate {
                    compliance_status: Some(ComplianceStatus::Compliant),
                    effective_date: Some(effective),
                    expiration_date: Some(effective + Duration::days(365)),
                },
                &actor(),
            )
            .await
            .unwrap();

        let loaded = e.store.find_policy(issued.policy.id()).await.unwrap();
        assert_eq!(loaded.compliance_status(), ComplianceStatus::Compliant);
        assert_eq!(loaded.period().effective(), effective);

        let action: String = sqlx::query_scalar(
            "SELECT action FROM activities ORDER BY created_at DESC, activity_id DESC LIMIT 1",
        )
        .fetch_one(e.db.pool())
        .await
        .unwrap();
        assert_eq!(action, "UPDATED");
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_policy_update_after_activation_is_conflict() {
        let e = engine().await;
        let issued = e
            .service
            .issue_policy(ApplicationBuilder::personal_auto(e.customer.id).build(), &actor())
            .await
            .unwrap();
        let mut reviewed = issued.policy.clone();
        reviewed.set_compliance_status(ComplianceStatus::NonCompliant, fixed_now());

        e.service
            .change_policy_status(issued.policy.id(), PolicyStatus::Active, &actor())
            .await
            .unwrap();

        let activity = Activity::new(EntityType::Policy, reviewed.id(), ActivityAction::Updated, "review", fixed_now());
        let err = e.store.update_policy(&reviewed, &activity).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict { .. }), "got {err:?}");
        assert_eq!(
            e.store.find_policy(issued.policy.id()).await.unwrap().compliance_status(),
            ComplianceStatus::Pending
        );
    }
}

// ============================================================================
// CLAIM PERSISTENCE TESTS
// ============================================================================

mod claims {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_filed_claim_round_trips_and_appears_in_history() {
        let e = engine().await;
        let policy = e
            .service
            .issue_policy(ApplicationBuilder::personal_auto(e.customer.id).build(), &actor())
            .await
            .unwrap()
            .policy;

        let filed = e
            .service
            .file_claim(ClaimSubmissionBuilder::new(policy.id(), e.customer.id).build(), &actor())
            .await
            .unwrap();
        assert_claim_number(filed.claim.claim_number(), 2024);

        let loaded = e.store.find_claim(filed.claim.id()).await.unwrap();
        assert_eq!(loaded.claim_number(), filed.claim.claim_number());
        assert_eq!(loaded.policy_id(), policy.id());
        assert_eq!(loaded.reserve_amount(), Some(Money::usd(dec!(2500))));
        assert_eq!(loaded.participants().len(), 1);
        assert_eq!(loaded.assigned_adjuster(), filed.claim.assigned_adjuster());

        let history = e
            .store
            .customer_claim_history(e.customer.id, fixed_now() - Duration::days(90))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].claim_id, filed.claim.id());
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_adjusters_ordered_by_open_claims() {
        let e = engine().await;
        let policy = e
            .service
            .issue_policy(ApplicationBuilder::personal_auto(e.customer.id).build(), &actor())
            .await
            .unwrap()
            .policy;

        let first = e
            .service
            .file_claim(ClaimSubmissionBuilder::new(policy.id(), e.customer.id).build(), &actor())
            .await
            .unwrap();
        let second = e
            .service
            .file_claim(ClaimSubmissionBuilder::new(policy.id(), e.customer.id).build(), &actor())
            .await
            .unwrap();

        let first_adjuster = first.claim.assigned_adjuster().unwrap();
        let second_adjuster = second.claim.assigned_adjuster().unwrap();
        assert_ne!(first_adjuster, second_adjuster);

        let roster = e.store.list_adjusters_by_open_claim_count().await.unwrap();
        assert_eq!(roster.len(), e.adjusters.len());
        assert!(roster.iter().all(|a| a.open_claims == 1));
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_second_alert_for_same_claim_is_ignored() {
        let e = engine().await;
        let alert = FraudAlert {
            id: core_kernel::FraudAlertId::new(),
            entity_type: "CLAIM".into(),
            entity_id: "CLM-20240000001".into(),
            alert_type: AlertType::SuspiciousPattern,
            severity: Severity::High,
            risk_score: 50,
            description: "High claim amount".into(),
            indicators: vec!["High claim amount".into()],
            investigation_required: true,
            status: AlertStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        };

        e.store.save_fraud_alert(&alert).await.unwrap();
        let duplicate = FraudAlert { id: core_kernel::FraudAlertId::new(), risk_score: 75, ..alert };
        e.store.save_fraud_alert(&duplicate).await.unwrap();

        assert_eq!(count(e.db.pool(), "fraud_alerts").await, 1);
        let score: i16 = sqlx::query_scalar("SELECT risk_score FROM fraud_alerts")
            .fetch_one(e.db.pool())
            .await
            .unwrap();
        assert_eq!(score, 50);
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_large_loss_raises_stored_alert() {
        let e = engine().await;
        let policy = e
            .service
            .issue_policy(ApplicationBuilder::personal_auto(e.customer.id).build(), &actor())
            .await
            .unwrap()
            .policy;

        let filed = e
            .service
            .file_claim(
                ClaimSubmissionBuilder::new(policy.id(), e.customer.id)
                    .loss_amount(dec!(90000))
                    .build(),
                &actor(),
            )
            .await
            .unwrap();

        let assessment = filed.fraud.expect("fraud evaluated after commit");
        assert_eq!(assessment.risk_score, 50);
        assert_eq!(assessment.severity, Some(Severity::High));

        let (entity_id, severity): (String, String) =
            sqlx::query_as("SELECT entity_id, severity FROM fraud_alerts")
                .fetch_one(e.db.pool())
                .await
                .unwrap();
        assert_eq!(entity_id, filed.claim.claim_number());
        assert_eq!(severity, "HIGH");
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_sub_cent_amounts_round_trip_unchanged() {
        let e = engine().await;
        let policy = e
            .service
            .issue_policy(ApplicationBuilder::personal_auto(e.customer.id).build(), &actor())
            .await
            .unwrap()
            .policy;

        let filed = e
            .service
            .file_claim(
                ClaimSubmissionBuilder::new(policy.id(), e.customer.id)
                    .loss_amount(dec!(50000.0001))
                    .reserve_amount(dec!(1234.5678))
                    .build(),
                &actor(),
            )
            .await
            .unwrap();
        assert_eq!(filed.claim.loss_amount(), Some(Money::usd(dec!(50000.00))));
        assert_eq!(filed.claim.reserve_amount(), Some(Money::usd(dec!(1234.57))));

        let loaded = e.store.find_claim(filed.claim.id()).await.unwrap();
        assert_eq!(loaded.loss_amount(), filed.claim.loss_amount());
        assert_eq!(loaded.reserve_amount(), filed.claim.reserve_amount());
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_duplicate_claim_number_is_conflict() {
        let e = engine().await;
        let policy = e
            .service
            .issue_policy(ApplicationBuilder::personal_auto(e.customer.id).build(), &actor())
            .await
            .unwrap()
            .policy;
        e.service
            .file_claim(ClaimSubmissionBuilder::new(policy.id(), e.customer.id).build(), &actor())
            .await
            .unwrap();

        // Rewind the claim counter so the next filing reuses the number
        sqlx::query("UPDATE number_sequences SET last_value = 0 WHERE kind = 'CLAIM'")
            .execute(e.db.pool())
            .await
            .unwrap();
        let err = e
            .service
            .file_claim(ClaimSubmissionBuilder::new(policy.id(), e.customer.id).build(), &actor())
            .await
            .unwrap_err();
        assert!(matches!(err, AssemblyError::Persistence(PortError::Conflict { .. })), "got {err:?}");
        assert_eq!(count(e.db.pool(), "claims").await, 1);
    }
}

// ============================================================================
// OUTBOX TESTS
// ============================================================================

mod outbox {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_failure_keeps_message_pending_until_completed() {
        let e = engine().await;
        let now = fixed_now();
        let issue = manual_issue(&e.customer, "POL-2024-000910");
        e.store.save_issued_policy(&issue).await.unwrap();

        let claimed = e.store.claim_pending_outbox(10, now).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, issue.outbox.id);
        assert_eq!(claimed[0].kind, OutboxKind::GenerateDeclarationDocuments);
        assert!(claimed[0].claimed_until.is_some_and(|until| until > now));
        assert!(e.store.claim_pending_outbox(10, now).await.unwrap().is_empty());

        e.store
            .record_outbox_failure(issue.outbox.id, "document service unavailable")
            .await
            .unwrap();
        let claimed = e.store.claim_pending_outbox(10, now).await.unwrap();
        assert_eq!(claimed[0].attempts, 1);
        assert_eq!(claimed[0].status, OutboxStatus::Pending);
        assert_eq!(claimed[0].last_error.as_deref(), Some("document service unavailable"));

        e.store.complete_outbox(issue.outbox.id).await.unwrap();
        let later = now + Duration::seconds(OUTBOX_LEASE_SECONDS);
        assert!(e.store.claim_pending_outbox(10, later).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "requires a Docker daemon"]
    async fn test_concurrent_claims_are_disjoint() {
        let e = engine().await;
        for n in 0..6 {
            e.store
                .save_issued_policy(&manual_issue(&e.customer, &format!("POL-2024-00092{n}")))
                .await
                .unwrap();
        }

        let (a, b) = tokio::join!(
            e.store.claim_pending_outbox(4, fixed_now()),
            e.store.claim_pending_outbox(4, fixed_now())
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.len() + b.len(), 6);
        assert!(a.iter().all(|m| b.iter().all(|n| n.id != m.id)));
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_expired_claim_is_claimed_again() {
        let e = engine().await;
        e.store
            .save_issued_policy(&manual_issue(&e.customer, "POL-2024-000912"))
            .await
            .unwrap();

        assert_eq!(e.store.claim_pending_outbox(10, fixed_now()).await.unwrap().len(), 1);
        let before_expiry = fixed_now() + Duration::seconds(OUTBOX_LEASE_SECONDS - 1);
        assert!(e.store.claim_pending_outbox(10, before_expiry).await.unwrap().is_empty());
        let after_expiry = fixed_now() + Duration::seconds(OUTBOX_LEASE_SECONDS);
        assert_eq!(e.store.claim_pending_outbox(10, after_expiry).await.unwrap().len(), 1);
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_drain_completes_pending_documents() {
        let e = engine().await;
        e.store
            .save_issued_policy(&manual_issue(&e.customer, "POL-2024-000911"))
            .await
            .unwrap();

        let report = e.service.drain_outbox(10).await.unwrap();
        assert_eq!(report.completed, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(count(e.db.pool(), "outbox_messages WHERE status = 'PENDING'").await, 0);
    }
}

// ============================================================================
// LISTING TESTS
// ============================================================================

mod listing {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_policies_filter_search_and_page() {
        let e = engine().await;
        for _ in 0..3 {
            e.service
                .issue_policy(ApplicationBuilder::personal_auto(e.customer.id).build(), &actor())
                .await
                .unwrap();
        }
        e.service
            .issue_policy(ApplicationBuilder::homeowners(e.customer.id).build(), &actor())
            .await
            .unwrap();

        let page = e.store.list_policies(&PolicyQuery::default(), Page::new(2, 3)).await.unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.pages(), 2);
        assert_eq!(page.items.len(), 1);

        let auto = PolicyQuery { product_type: Some(ProductType::PersonalAuto), ..Default::default() };
        assert_eq!(e.store.list_policies(&auto, Page::default()).await.unwrap().total, 3);

        let by_name = PolicyQuery { search: Some("REYES".into()), ..Default::default() };
        let result = e.store.list_policies(&by_name, Page::default()).await.unwrap();
        assert_eq!(result.total, 4);
        assert_eq!(result.items[0].customer_name, "Jordan Reyes");
        assert_eq!(result.items[0].customer_email.as_deref(), Some("jordan.reyes@example.com"));

        let wildcard = PolicyQuery { search: Some("%".into()), ..Default::default() };
        assert_eq!(e.store.list_policies(&wildcard, Page::default()).await.unwrap().total, 0);

        let active = PolicyQuery { status: Some(PolicyStatus::Active), ..Default::default() };
        assert_eq!(e.store.list_policies(&active, Page::default()).await.unwrap().total, 0);
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_claims_filter_and_join_policy_number() {
        let e = engine().await;
        let policy = e
            .service
            .issue_policy(ApplicationBuilder::personal_auto(e.customer.id).build(), &actor())
            .await
            .unwrap()
            .policy;
        for description in ["Rear-ended at a stop light", "Hail damage to roof"] {
            e.service
                .file_claim(
                    ClaimSubmissionBuilder::new(policy.id(), e.customer.id)
                        .description(description)
                        .build(),
                    &actor(),
                )
                .await
                .unwrap();
        }

        let all = e.store.list_claims(&ClaimQuery::default(), Page::default()).await.unwrap();
        assert_eq!(all.total, 2);
        assert!(all.items.iter().all(|c| c.policy_number == policy.policy_number()));

        let hail = ClaimQuery { search: Some("hail".into()), ..Default::default() };
        assert_eq!(e.store.list_claims(&hail, Page::default()).await.unwrap().total, 1);

        let by_policy = ClaimQuery { search: Some(policy.policy_number().to_string()), ..Default::default() };
        assert_eq!(e.store.list_claims(&by_policy, Page::default()).await.unwrap().total, 2);

        let denied = ClaimQuery { status: Some(ClaimStatus::Denied), ..Default::default() };
        assert_eq!(e.store.list_claims(&denied, Page::default()).await.unwrap().total, 0);

        let summary = e
            .store
            .list_policies(&PolicyQuery::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(summary.items[0].claim_count, 2);
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_customers_search_and_type_filter() {
        let e = engine().await;
        let customers = PostgresCustomerPort::new(e.db.pool().clone());
        customers.insert(&CustomerFixtures::business_in("WA")).await.unwrap();

        let all = customers.list_customers(&CustomerQuery::default(), Page::default()).await.unwrap();
        assert_eq!(all.total, 2);

        let harbor = customers
            .list_customers(&CustomerQuery::search("harbor"), Page::default())
            .await
            .unwrap();
        assert_eq!(harbor.total, 1);
        assert_eq!(harbor.items[0].customer_type, CustomerType::Business);

        let individuals = CustomerQuery { customer_type: Some(CustomerType::Individual), ..Default::default() };
        let result = customers.list_customers(&individuals, Page::default()).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].id, e.customer.id);
    }
}

// ============================================================================
// SERVICE OVER POSTGRES
// ============================================================================

mod service {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_customer_lookup_by_id() {
        let e = engine().await;
        let customers = PostgresCustomerPort::new(e.db.pool().clone());

        let found = customers.find_customer(e.customer.id, None).await.unwrap();
        assert_eq!(found.id, e.customer.id);
        assert_eq!(found.address.state, "NY");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "requires a Docker daemon"]
    async fn test_concurrent_issues_receive_distinct_numbers() {
        let e = Arc::new(engine().await);

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let e = e.clone();
                tokio::spawn(async move {
                    e.service
                        .issue_policy(ApplicationBuilder::personal_auto(e.customer.id).build(), &actor())
                        .await
                        .map(|issued| issued.policy.policy_number().to_string())
                })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap().unwrap());
        }
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), 10);
        assert_eq!(count(e.db.pool(), "policies").await, 10);
        assert_eq!(count(e.db.pool(), "outbox_messages").await, 10);
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn test_cleared_database_keeps_schema() {
        let e = engine().await;
        e.service
            .issue_policy(ApplicationBuilder::personal_auto(e.customer.id).build(), &actor())
            .await
            .unwrap();

        e.db.clear_data().await.unwrap();

        assert_eq!(count(e.db.pool(), "policies").await, 0);
        assert_eq!(count(e.db.pool(), "number_sequences").await, 0);
        assert_eq!(count(e.db.pool(), "customers").await, 0);
    }
}
