//! Admission gate bounding concurrent extractions.
//!
//! Backed by a fair `tokio::sync::Semaphore`, so waiters are admitted in
//! arrival order. The permit releases its slot when dropped, which covers
//! success, error returns, and request futures cancelled by a client
//! disconnect alike.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::debug;

use crate::error::AdmissionError;

/// What to do with a request that arrives while every slot is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionPolicy {
    /// Queue until a slot frees up (bounded by the gate's timeout, if any).
    #[default]
    Wait,
    /// Fail immediately.
    Reject,
}

impl FromStr for AdmissionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wait" | "block" => Ok(Self::Wait),
            "reject" | "fail-fast" | "fail_fast" => Ok(Self::Reject),
            other => Err(format!("unknown admission policy '{other}' (expected 'wait' or 'reject')")),
        }
    }
}

impl fmt::Display for AdmissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wait => f.write_str("wait"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// Counting gate shared by all extraction requests.
#[derive(Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    limit: usize,
    policy: AdmissionPolicy,
    timeout: Option<Duration>,
}

impl AdmissionGate {
    /// `limit` is clamped to at least one slot.
    pub fn new(limit: usize, policy: AdmissionPolicy, timeout: Option<Duration>) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            limit,
            policy,
            timeout,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Number of requests currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Take a slot, waiting or failing per the configured policy.
    pub async fn acquire(&self) -> Result<AdmissionPermit, AdmissionError> {
        let permit = match self.policy {
            AdmissionPolicy::Reject => {
                Arc::clone(&self.semaphore)
                    .try_acquire_owned()
                    .map_err(|err| match err {
                        TryAcquireError::NoPermits => AdmissionError::Saturated { limit: self.limit },
                        TryAcquireError::Closed => AdmissionError::Closed,
                    })?
            }
            AdmissionPolicy::Wait => {
                let pending = Arc::clone(&self.semaphore).acquire_owned();
                let acquired = match self.timeout {
                    Some(waited) => tokio::time::timeout(waited, pending)
                        .await
                        .map_err(|_| AdmissionError::TimedOut { waited })?,
                    None => pending.await,
                };
                acquired.map_err(|_| AdmissionError::Closed)?
            }
        };

        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(in_flight = now, limit = self.limit, "Extraction admitted");

        Ok(AdmissionPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }
}

impl fmt::Debug for AdmissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionGate")
            .field("limit", &self.limit)
            .field("in_flight", &self.in_flight())
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Proof of admission. Dropping it frees the slot.
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_policy_names() {
        assert_eq!("wait".parse::<AdmissionPolicy>().unwrap(), AdmissionPolicy::Wait);
        assert_eq!(" REJECT ".parse::<AdmissionPolicy>().unwrap(), AdmissionPolicy::Reject);
        assert!("drop".parse::<AdmissionPolicy>().is_err());
    }

    #[test]
    fn zero_limit_is_clamped() {
        let gate = AdmissionGate::new(0, AdmissionPolicy::Wait, None);
        assert_eq!(gate.limit(), 1);
    }

    #[tokio::test]
    async fn permit_drop_releases_slot() {
        let gate = AdmissionGate::new(2, AdmissionPolicy::Reject, None);
        let a = gate.acquire().await.unwrap();
        let b = gate.acquire().await.unwrap();
        assert_eq!(gate.in_flight(), 2);

        drop(a);
        assert_eq!(gate.in_flight(), 1);
        let _c = gate.acquire().await.unwrap();
        drop(b);
        assert_eq!(gate.in_flight(), 1);
    }

    #[tokio::test]
    async fn reject_policy_fails_fast_when_full() {
        let gate = AdmissionGate::new(1, AdmissionPolicy::Reject, None);
        let _held = gate.acquire().await.unwrap();
        let err = gate.acquire().await.err().unwrap();
        assert_eq!(err, AdmissionError::Saturated { limit: 1 });
        assert_eq!(gate.in_flight(), 1);
    }

    #[tokio::test]
    async fn wait_policy_times_out() {
        let gate = AdmissionGate::new(1, AdmissionPolicy::Wait, Some(Duration::from_millis(20)));
        let _held = gate.acquire().await.unwrap();
        let err = gate.acquire().await.err().unwrap();
        assert!(matches!(err, AdmissionError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn wait_policy_admits_after_release() {
        let gate = AdmissionGate::new(1, AdmissionPolicy::Wait, None);
        let held = gate.acquire().await.unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.acquire().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.unwrap().unwrap();
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_limit_under_load() {
        let gate = AdmissionGate::new(3, AdmissionPolicy::Wait, None);
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..12)
            .map(|_| {
                let gate = gate.clone();
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    let _permit = gate.acquire().await.unwrap();
                    peak.fetch_max(gate.in_flight(), Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(gate.in_flight(), 0);
    }
}
