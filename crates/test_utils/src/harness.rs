//! In-memory engine
//!
//! Wires an [`AssemblyService`] to the mock ports with a fixed clock, and
//! keeps handles to every mock so tests can seed data, inject failures and
//! inspect what was written.

use std::sync::Arc;

use app_services::{AssemblyService, InMemoryAssemblyStore, RecordingDocumentGenerator};
use core_kernel::numbering::mock::InMemorySequence;
use core_kernel::{FixedClock, IdentifierAllocator};
use domain_party::{Customer, MockCustomerPort, User};

use crate::fixtures::fixed_now;

pub struct InMemoryEngine {
    pub service: AssemblyService,
    pub store: InMemoryAssemblyStore,
    pub customers: MockCustomerPort,
    pub sequence: Arc<InMemorySequence>,
    pub documents: RecordingDocumentGenerator,
    pub clock: Arc<FixedClock>,
}

impl InMemoryEngine {
    /// An engine at [`fixed_now`] with no customers and no adjusters
    pub fn new() -> Self {
        let store = InMemoryAssemblyStore::new();
        let customers = MockCustomerPort::new();
        let sequence = Arc::new(InMemorySequence::new());
        let documents = RecordingDocumentGenerator::new();
        let clock = Arc::new(FixedClock(fixed_now()));

        let service = AssemblyService::new(
            Arc::new(customers.clone()),
            Arc::new(store.clone()),
            IdentifierAllocator::new(sequence.clone(), clock.clone()),
            Arc::new(documents.clone()),
            clock.clone(),
        );

        Self { service, store, customers, sequence, documents, clock }
    }

    /// Registers the customer with both the customer port and the store's
    /// list projections
    pub async fn with_customer(self, customer: Customer) -> Self {
        self.store.register_customer(&customer).await;
        self.customers.insert(customer).await;
        self
    }

    pub async fn with_adjusters(self, adjusters: &[User]) -> Self {
        for adjuster in adjusters {
            self.store.add_adjuster(adjuster.id, adjuster.name.clone()).await;
        }
        self
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}
