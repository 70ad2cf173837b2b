use crate::error::ProtectionError;
use crate::guard::{GuardOutcome, WriteGuard};
use fieldguard_database::{ChangeKind, DocumentStore, RecordChanged};
use fieldguard_domain::config::GuardConfig;
use fieldguard_event_bus::{Delivery, EventBus, EventReceiverExt};
use fieldguard_vault::KeyProvider;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How often, and how patiently, a failed guard invocation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled after each failure.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&GuardConfig::default())
    }
}

impl From<&GuardConfig> for RetryPolicy {
    fn from(cfg: &GuardConfig) -> Self {
        Self { max_attempts: cfg.max_attempts, initial_delay: Duration::from_millis(cfg.retry_delay_ms) }
    }
}

/// Feeds store change events to a [`WriteGuard`], retrying failures with exponential backoff.
#[derive(Debug, Clone)]
pub struct GuardWorker<S, K> {
    guard: WriteGuard<S, K>,
    policy: RetryPolicy,
}

impl<S, K> GuardWorker<S, K>
where
    S: DocumentStore + Clone,
    K: KeyProvider + Clone + 'static,
{
    #[must_use]
    pub const fn new(guard: WriteGuard<S, K>, policy: RetryPolicy) -> Self {
        Self { guard, policy }
    }

    /// Runs the guard for `event` until it succeeds or the attempts are exhausted.
    ///
    /// Only transient failures ([`ProtectionError::Internal`], [`ProtectionError::Store`])
    /// are retried; a bad key fails on the first attempt.
    ///
    /// # Errors
    /// Returns the last error once every attempt has failed, or the first non-transient one.
    pub async fn process(&self, event: &RecordChanged) -> Result<GuardOutcome, ProtectionError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut delay = self.policy.initial_delay;
        let mut attempt = 1;

        loop {
            match self.guard.handle(event).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt < attempts && is_transient(&e) => {
                    warn!(id = %event.id, revision = event.revision, attempt, ?delay, error = %e, "Guard failed, retrying...");
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                },
                Err(e) => return Err(e),
            }
        }
    }

    /// Runs the guard over every record currently in the collection.
    ///
    /// Covers writes whose change events were lost. Returns how many records were encrypted;
    /// per-record failures are reported and the scan continues.
    ///
    /// # Errors
    /// Returns [`ProtectionError::Store`] if the collection cannot be listed.
    pub async fn reconcile(&self) -> Result<usize, ProtectionError> {
        let docs = self.guard.store().list(self.guard.collection()).await?;
        let scanned = docs.len();
        let mut encrypted = 0;

        for doc in docs {
            let event = RecordChanged {
                collection: self.guard.collection().to_owned(),
                id: doc.id,
                revision: doc.revision,
                kind: ChangeKind::Updated,
                record: doc.record,
            };
            match self.process(&event).await {
                Ok(GuardOutcome::Persisted { .. }) => encrypted += 1,
                Ok(_) => {},
                Err(e) => self.report(&event, &e),
            }
        }

        info!(collection = self.guard.collection(), scanned, encrypted, "Collection resynchronised");
        Ok(encrypted)
    }

    /// Subscribes to [`RecordChanged`] on `events` and processes events in order on a
    /// background task until the bus shuts down.
    ///
    /// The subscription is taken before returning, so no write made after this call is missed.
    /// If the task falls behind and events are overwritten, it rescans the collection.
    ///
    /// # Errors
    /// Returns [`ProtectionError::Internal`] if the bus is already closed.
    pub fn spawn(self, events: &EventBus) -> Result<JoinHandle<()>, ProtectionError> {
        let mut rx = events.subscribe::<RecordChanged>().map_err(|e| ProtectionError::Internal {
            message: e.to_string().into(),
            context: Some("Subscribing write guard to change events".into()),
        })?;

        info!(collection = self.guard.collection(), "Write guard listening for changes");

        Ok(tokio::spawn(async move {
            while let Some(delivery) = rx.next_delivery().await {
                match delivery {
                    Delivery::Event(event) => {
                        if let Err(e) = self.process(&event).await {
                            self.report(&event, &e);
                        }
                    },
                    Delivery::Lagged(lost) => {
                        error!(collection = self.guard.collection(), lost, "Change events lost; rescanning collection");
                        if let Err(e) = self.reconcile().await {
                            error!(
                                collection = self.guard.collection(),
                                error = %e,
                                "Rescan failed; records may be stored unencrypted"
                            );
                        }
                    },
                }
            }
            info!("Write guard stopped: change stream closed");
        }))
    }

    fn report(&self, event: &RecordChanged, err: &ProtectionError) {
        error!(
            collection = %event.collection,
            id = %event.id,
            revision = event.revision,
            attempts = self.policy.max_attempts.max(1),
            error = %err,
            "Guard gave up; record may be stored unencrypted"
        );
    }
}

const fn is_transient(err: &ProtectionError) -> bool {
    matches!(err, ProtectionError::Internal { .. } | ProtectionError::Store { .. })
}
