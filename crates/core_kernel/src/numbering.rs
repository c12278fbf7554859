//! Identifier allocation for policy and claim numbers
//!
//! Numbers are human readable and carry the calendar year they were minted
//! in. The counter behind them lives in a [`SequencePort`], whose only
//! operation is an atomic increment-and-return, so concurrent callers are
//! serialized by the store and never observe the same value.
//!
//! | kind   | format            | example            |
//! |--------|-------------------|--------------------|
//! | policy | `POL-YYYY-NNNNNN` | `POL-2024-000042`  |
//! | claim  | `CLM-YYYYNNNNNNN` | `CLM-20240000042`  |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::ports::{DomainPort, PortError};
use crate::temporal::Clock;

/// Which family of numbers to allocate from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NumberKind {
    Policy,
    Claim,
}

impl NumberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumberKind::Policy => "POLICY",
            NumberKind::Claim => "CLAIM",
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            NumberKind::Policy => "POL",
            NumberKind::Claim => "CLM",
        }
    }

    /// Largest sequence value the number format can represent
    pub fn max_sequence(&self) -> u64 {
        match self {
            NumberKind::Policy => 999_999,
            NumberKind::Claim => 9_999_999,
        }
    }

    /// Renders a number for `year` and `sequence`
    pub fn format(&self, year: i32, sequence: u64) -> String {
        match self {
            NumberKind::Policy => format!("{}-{:04}-{:06}", self.prefix(), year, sequence),
            NumberKind::Claim => format!("{}-{:04}{:07}", self.prefix(), year, sequence),
        }
    }

    /// Splits a rendered number back into year and sequence
    pub fn parse(&self, number: &str) -> Option<(i32, u64)> {
        let rest = number.strip_prefix(self.prefix())?.strip_prefix('-')?;
        let (year, seq) = match self {
            NumberKind::Policy => {
                let (year, seq) = rest.split_once('-')?;
                (year, seq)
            }
            NumberKind::Claim => {
                if !rest.is_char_boundary(4) {
                    return None;
                }
                rest.split_at(4)
            }
        };
        let expected_len = match self {
            NumberKind::Policy => 6,
            NumberKind::Claim => 7,
        };
        if year.len() != 4 || seq.len() != expected_len {
            return None;
        }
        if !year.bytes().chain(seq.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some((year.parse().ok()?, seq.parse().ok()?))
    }
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NumberKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POLICY" => Ok(NumberKind::Policy),
            "CLAIM" => Ok(NumberKind::Claim),
            other => Err(format!("unknown number kind: {other}")),
        }
    }
}

/// Atomic counter storage, one counter per (kind, year)
#[async_trait]
pub trait SequencePort: DomainPort {
    /// Increments the counter for `kind` in `year` and returns the new value.
    /// The first call for a fresh (kind, year) returns 1.
    async fn next_value(&self, kind: NumberKind, year: i32) -> Result<u64, PortError>;
}

/// Errors raised while minting a number
#[derive(Debug, Error)]
pub enum AllocatorError {
    /// The sequence store could not be reached or refused the increment
    #[error("Identifier allocator unavailable for {kind}: {source}")]
    Unavailable {
        kind: NumberKind,
        #[source]
        source: PortError,
    },

    /// The yearly counter ran past what the number format can hold
    #[error("{kind} sequence exhausted for {year}")]
    Exhausted { kind: NumberKind, year: i32 },
}

impl AllocatorError {
    /// Allocation failures are worth retrying with backoff
    pub fn is_transient(&self) -> bool {
        match self {
            AllocatorError::Unavailable { .. } => true,
            AllocatorError::Exhausted { .. } => false,
        }
    }
}

/// Mints policy and claim numbers from a [`SequencePort`]
#[derive(Clone)]
pub struct IdentifierAllocator {
    sequence: Arc<dyn SequencePort>,
    clock: Arc<dyn Clock>,
}

impl IdentifierAllocator {
    pub fn new(sequence: Arc<dyn SequencePort>, clock: Arc<dyn Clock>) -> Self {
        Self { sequence, clock }
    }

    /// Allocates the next number of `kind` for the clock's current year.
    ///
    /// Never fabricates a number: if the store fails the error is returned
    /// as [`AllocatorError::Unavailable`].
    pub async fn allocate(&self, kind: NumberKind) -> Result<String, AllocatorError> {
        let year = self.clock.current_year();
        let sequence = self
            .sequence
            .next_value(kind, year)
            .await
            .map_err(|source| {
                warn!(%kind, year, error = %source, "Sequence increment failed");
                AllocatorError::Unavailable { kind, source }
            })?;

        if sequence > kind.max_sequence() {
            return Err(AllocatorError::Exhausted { kind, year });
        }

        let number = kind.format(year, sequence);
        debug!(%kind, %number, "Allocated number");
        Ok(number)
    }
}

impl fmt::Debug for IdentifierAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierAllocator").finish_non_exhaustive()
    }
}

/// In-memory sequence for tests and local runs
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Mutex;

    /// Counter map guarded by a mutex; can be switched offline to simulate an outage
    #[derive(Default)]
    pub struct InMemorySequence {
        counters: Mutex<HashMap<(NumberKind, i32), u64>>,
        offline: AtomicBool,
    }

    impl InMemorySequence {
        pub fn new() -> Self {
            Self::default()
        }

        /// Starts the counter for (kind, year) at `value`; the next allocation returns `value + 1`
        pub async fn seed(&self, kind: NumberKind, year: i32, value: u64) {
            self.counters.lock().await.insert((kind, year), value);
        }

        pub fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }
    }

    impl DomainPort for InMemorySequence {}

    #[async_trait]
    impl SequencePort for InMemorySequence {
        async fn next_value(&self, kind: NumberKind, year: i32) -> Result<u64, PortError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(PortError::ServiceUnavailable {
                    service: "sequence store".to_string(),
                });
            }
            let mut counters = self.counters.lock().await;
            let counter = counters.entry((kind, year)).or_insert(0);
            *counter += 1;
            Ok(*counter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::InMemorySequence;
    use super::*;
    use crate::temporal::FixedClock;

    fn allocator(sequence: Arc<InMemorySequence>) -> IdentifierAllocator {
        let clock = FixedClock::at_date(2024, 3, 1).unwrap();
        IdentifierAllocator::new(sequence, Arc::new(clock))
    }

    #[test]
    fn test_formats() {
        assert_eq!(NumberKind::Policy.format(2024, 42), "POL-2024-000042");
        assert_eq!(NumberKind::Claim.format(2024, 42), "CLM-20240000042");
    }

    #[test]
    fn test_parse_inverts_format() {
        assert_eq!(NumberKind::Policy.parse("POL-2024-000042"), Some((2024, 42)));
        assert_eq!(NumberKind::Claim.parse("CLM-20240000042"), Some((2024, 42)));
        assert_eq!(NumberKind::Claim.parse("POL-2024-000042"), None);
        assert_eq!(NumberKind::Policy.parse("POL-2024-42"), None);
    }

    #[tokio::test]
    async fn test_first_number_of_year() {
        let allocator = allocator(Arc::new(InMemorySequence::new()));
        assert_eq!(allocator.allocate(NumberKind::Policy).await.unwrap(), "POL-2024-000001");
        assert_eq!(allocator.allocate(NumberKind::Claim).await.unwrap(), "CLM-20240000001");
        assert_eq!(allocator.allocate(NumberKind::Policy).await.unwrap(), "POL-2024-000002");
    }

    #[tokio::test]
    async fn test_unavailable_store_fabricates_nothing() {
        let sequence = Arc::new(InMemorySequence::new());
        sequence.set_offline(true);
        let allocator = allocator(sequence);

        let err = allocator.allocate(NumberKind::Policy).await.unwrap_err();
        assert!(matches!(err, AllocatorError::Unavailable { kind: NumberKind::Policy, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_exhausted_sequence() {
        let sequence = Arc::new(InMemorySequence::new());
        sequence.seed(NumberKind::Policy, 2024, 999_999).await;
        let allocator = allocator(sequence);

        let err = allocator.allocate(NumberKind::Policy).await.unwrap_err();
        assert!(matches!(err, AllocatorError::Exhausted { year: 2024, .. }));
    }
}
