//! Verification engine — the PENDING → VERIFIED decision protocol.
//!
//! A token is PENDING while its record sits in the [`TokenStore`]. A
//! completion attempt either transitions it to VERIFIED (record consumed,
//! audit event emitted, grant request enqueued) or leaves it PENDING for a
//! retry. Concurrency correctness hinges on a single point: the store's
//! atomic consume. The reputation verdict is taken *before* consumption, so
//! of N racing attempts at most one reaches the grant side; the rest observe
//! either the rejection path or the idempotent already-verified path.

use crate::error::VerifyError;
use crate::record::{AuditEvent, GrantRequest, VerificationRecord};
use crate::store::{Consumed, TokenStore};
use crate::time::Timestamp;
use crate::token::Token;
use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Best-effort classification of a network origin.
///
/// Implementations must be fail-open: any failure to consult the backing
/// service yields `false` (not suspicious) rather than an error, so that a
/// third-party outage never blocks verification.
pub trait ReputationCheck: Send + Sync + 'static {
    fn is_suspicious(&self, addr: IpAddr) -> impl Future<Output = bool> + Send;
}

/// Receives the audit event for each successful verification.
///
/// Delivery is best-effort; implementations swallow and log their own
/// failures. The engine never learns whether delivery succeeded.
pub trait AuditSink: Send + Sync + 'static {
    fn verified(&self, event: AuditEvent) -> impl Future<Output = ()> + Send;
}

/// Outcome of a completion attempt that did not fail.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// This attempt won: the record was consumed and the grant dispatched.
    Verified(VerificationRecord),
    /// A concurrent attempt already consumed the token. No duplicate grant.
    AlreadyVerified,
}

/// What the challenge page needs: the record plus the current verdict.
#[derive(Clone, Debug)]
pub struct Challenge {
    pub record: VerificationRecord,
    /// Verdict at display time. Advisory only — the submission path re-checks,
    /// and the two verdicts may differ.
    pub suspicious: bool,
}

/// Orchestrates the token store, the reputation checker, and the downstream
/// sinks. One instance is shared (via `Arc`) by every interface layer.
pub struct VerificationEngine<R, A> {
    store: Arc<TokenStore>,
    checker: R,
    audit: A,
    grant_tx: mpsc::Sender<GrantRequest>,
}

impl<R, A> VerificationEngine<R, A>
where
    R: ReputationCheck,
    A: AuditSink,
{
    pub fn new(
        store: Arc<TokenStore>,
        checker: R,
        audit: A,
        grant_tx: mpsc::Sender<GrantRequest>,
    ) -> Self {
        Self {
            store,
            checker,
            audit,
            grant_tx,
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Issue a fresh token for `subject_id`.
    pub fn issue(
        &self,
        subject_id: &str,
        display_name: &str,
        avatar_url: &str,
        now: Timestamp,
    ) -> Result<Token, VerifyError> {
        let token = self.store.create(subject_id, display_name, avatar_url, now)?;
        debug!(subject = subject_id, "issued verification token");
        Ok(token)
    }

    /// Display path: look up the record and take a reputation verdict for
    /// rendering. Never consumes the token.
    pub async fn challenge(
        &self,
        token: &Token,
        addr: IpAddr,
        now: Timestamp,
    ) -> Result<Challenge, VerifyError> {
        let record = self.store.get(token, now).ok_or(VerifyError::UnknownToken)?;
        let suspicious = self.checker.is_suspicious(addr).await;
        Ok(Challenge { record, suspicious })
    }

    /// Completion path.
    ///
    /// The reputation check runs before consumption so a suspicious origin
    /// leaves the token intact for a retry. Downstream failures after the
    /// consume never roll the transition back — once consumed, the token is
    /// gone regardless of what the audit sink or grant worker make of it.
    pub async fn submit(
        &self,
        token: &Token,
        addr: IpAddr,
        now: Timestamp,
    ) -> Result<Outcome, VerifyError> {
        if self.store.get(token, now).is_none() {
            return Err(VerifyError::UnknownToken);
        }

        if self.checker.is_suspicious(addr).await {
            debug!(%addr, "suspicious origin, token preserved for retry");
            return Err(VerifyError::SuspiciousOrigin);
        }

        let record = match self.store.try_consume(token, now) {
            Consumed::Live(record) => record,
            // The TTL lapsed after the lookup above; a stale link must not
            // read as a completed verification.
            Consumed::Expired => return Err(VerifyError::UnknownToken),
            // Lost the race against a concurrent submission.
            Consumed::Missing => return Ok(Outcome::AlreadyVerified),
        };

        self.audit
            .verified(AuditEvent {
                subject_id: record.subject_id.clone(),
                display_name: record.display_name.clone(),
                avatar_url: record.avatar_url.clone(),
                network_address: addr,
                timestamp: now,
            })
            .await;

        let grant = GrantRequest {
            subject_id: record.subject_id.clone(),
        };
        if let Err(e) = self.grant_tx.try_send(grant) {
            // Bounded queue full or worker gone. Best-effort policy: the
            // verification stands, the grant is dropped with a trace.
            warn!(subject = %record.subject_id, error = %e, "grant dispatch failed");
        }

        Ok(Outcome::Verified(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Clone)]
    struct FixedChecker(Arc<AtomicBool>);

    impl FixedChecker {
        fn new(suspicious: bool) -> Self {
            Self(Arc::new(AtomicBool::new(suspicious)))
        }

        fn set(&self, suspicious: bool) {
            self.0.store(suspicious, Ordering::SeqCst);
        }
    }

    impl ReputationCheck for FixedChecker {
        async fn is_suspicious(&self, _addr: IpAddr) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Clone, Default)]
    struct RecordingAudit(Arc<Mutex<Vec<AuditEvent>>>);

    impl RecordingAudit {
        fn events(&self) -> Vec<AuditEvent> {
            self.0.lock().unwrap().clone()
        }
    }

    impl AuditSink for RecordingAudit {
        async fn verified(&self, event: AuditEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn addr() -> IpAddr {
        "203.0.113.7".parse().unwrap()
    }

    fn engine(
        checker: FixedChecker,
    ) -> (
        Arc<VerificationEngine<FixedChecker, RecordingAudit>>,
        RecordingAudit,
        mpsc::Receiver<GrantRequest>,
    ) {
        let audit = RecordingAudit::default();
        let (grant_tx, grant_rx) = mpsc::channel(16);
        let engine = VerificationEngine::new(
            Arc::new(TokenStore::new(900)),
            checker,
            audit.clone(),
            grant_tx,
        );
        (Arc::new(engine), audit, grant_rx)
    }

    #[tokio::test]
    async fn unknown_token_has_no_side_effects() {
        let (engine, audit, mut grant_rx) = engine(FixedChecker::new(false));
        let now = Timestamp::new(1_000);

        let err = engine
            .submit(&Token::from("no-such-token"), addr(), now)
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::UnknownToken));
        assert!(audit.events().is_empty());
        assert!(grant_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn suspicious_origin_preserves_token() {
        let checker = FixedChecker::new(true);
        let (engine, audit, _grant_rx) = engine(checker.clone());
        let now = Timestamp::new(1_000);
        let token = engine.issue("U1", "alice", "", now).unwrap();

        let err = engine.submit(&token, addr(), now).await.unwrap_err();
        assert!(matches!(err, VerifyError::SuspiciousOrigin));
        assert!(engine.store().get(&token, now).is_some());
        assert!(audit.events().is_empty());
    }

    #[tokio::test]
    async fn clean_submission_verifies_and_grants_once() {
        let checker = FixedChecker::new(true);
        let (engine, audit, mut grant_rx) = engine(checker.clone());
        let now = Timestamp::new(1_000);
        let token = engine.issue("U1", "alice", "a.png", now).unwrap();

        // First attempt rejected, then the subject drops the VPN.
        assert!(engine.submit(&token, addr(), now).await.is_err());
        checker.set(false);

        let outcome = engine.submit(&token, addr(), now).await.unwrap();
        assert!(matches!(outcome, Outcome::Verified(_)));
        assert!(engine.store().get(&token, now).is_none());

        let events = audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].subject_id, "U1");
        assert_eq!(events[0].network_address, addr());

        assert_eq!(grant_rx.recv().await.unwrap().subject_id, "U1");
        assert!(grant_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn second_submission_is_already_verified() {
        let (engine, _audit, mut grant_rx) = engine(FixedChecker::new(false));
        let now = Timestamp::new(1_000);
        let token = engine.issue("U1", "alice", "", now).unwrap();

        assert!(matches!(
            engine.submit(&token, addr(), now).await.unwrap(),
            Outcome::Verified(_)
        ));
        // The record is gone, so the second attempt reads as unknown.
        assert!(matches!(
            engine.submit(&token, addr(), now).await.unwrap_err(),
            VerifyError::UnknownToken
        ));
        assert_eq!(grant_rx.recv().await.unwrap().subject_id, "U1");
        assert!(grant_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn challenge_reports_verdict_without_consuming() {
        let checker = FixedChecker::new(true);
        let (engine, _audit, _grant_rx) = engine(checker.clone());
        let now = Timestamp::new(1_000);
        let token = engine.issue("U1", "alice", "", now).unwrap();

        let challenge = engine.challenge(&token, addr(), now).await.unwrap();
        assert!(challenge.suspicious);
        assert_eq!(challenge.record.subject_id, "U1");

        checker.set(false);
        let challenge = engine.challenge(&token, addr(), now).await.unwrap();
        assert!(!challenge.suspicious);
        assert!(engine.store().get(&token, now).is_some());
    }

    /// Consumes a fixed token from the shared store while the verdict is
    /// being taken, standing in for a rival submission that wins the race
    /// mid-flight.
    struct RivalConsumingChecker {
        store: Arc<TokenStore>,
        token: Token,
    }

    impl ReputationCheck for RivalConsumingChecker {
        async fn is_suspicious(&self, _addr: IpAddr) -> bool {
            self.store
                .consume_if_present(&self.token, Timestamp::new(1_000));
            false
        }
    }

    #[tokio::test]
    async fn losing_the_consume_race_is_already_verified() {
        let store = Arc::new(TokenStore::new(900));
        let now = Timestamp::new(1_000);
        let token = store.create("U1", "alice", "", now).unwrap();

        let audit = RecordingAudit::default();
        let (grant_tx, mut grant_rx) = mpsc::channel(8);
        let engine = VerificationEngine::new(
            store.clone(),
            RivalConsumingChecker {
                store: store.clone(),
                token: token.clone(),
            },
            audit.clone(),
            grant_tx,
        );

        let outcome = engine.submit(&token, addr(), now).await.unwrap();
        assert!(matches!(outcome, Outcome::AlreadyVerified));
        // The rival attempt owns the grant; this one must emit nothing.
        assert!(audit.events().is_empty());
        assert!(grant_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn expired_token_is_unknown_not_already_verified() {
        let (engine, audit, mut grant_rx) = engine(FixedChecker::new(false));
        let issued_at = Timestamp::new(1_000);
        let token = engine.issue("U1", "alice", "", issued_at).unwrap();

        let after_ttl = Timestamp::new(1_000 + 900);
        let err = engine.submit(&token, addr(), after_ttl).await.unwrap_err();
        assert!(matches!(err, VerifyError::UnknownToken));
        assert!(audit.events().is_empty());
        assert!(grant_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn racing_submissions_yield_one_verified() {
        let (engine, audit, mut grant_rx) = engine(FixedChecker::new(false));
        let now = Timestamp::new(1_000);
        let token = engine.issue("U1", "alice", "", now).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = engine.clone();
            let token = token.clone();
            handles.push(tokio::spawn(async move {
                engine.submit(&token, addr(), now).await
            }));
        }

        let mut verified = 0;
        let mut already = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(Outcome::Verified(_)) => verified += 1,
                Ok(Outcome::AlreadyVerified) => already += 1,
                // Attempts that start after consumption read as unknown.
                Err(VerifyError::UnknownToken) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(verified, 1);
        assert!(already <= 7);
        assert_eq!(audit.events().len(), 1);
        assert_eq!(grant_rx.recv().await.unwrap().subject_id, "U1");
        assert!(grant_rx.try_recv().is_err());
    }
}
