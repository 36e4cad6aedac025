//! In-memory registry of pending verifications.

use crate::error::VerifyError;
use crate::record::VerificationRecord;
use crate::time::Timestamp;
use crate::token::Token;
use std::collections::HashMap;
use std::sync::Mutex;

/// Default record lifetime: 15 minutes.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 900;

/// Result of a consume attempt, distinguishing why nothing was consumed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Consumed {
    /// The live record, now removed from the store.
    Live(VerificationRecord),
    /// A record existed but its TTL had passed; removed without consuming.
    Expired,
    /// No record for this token.
    Missing,
}

/// Thread-safe mapping from token to pending [`VerificationRecord`].
///
/// The store is the single shared mutable resource in the system. All access
/// goes through one mutex so that [`consume_if_present`](Self::consume_if_present)
/// can do its read-then-delete atomically — two racing completions of the
/// same token can never both observe the record.
///
/// Expired records read as absent everywhere; a periodic sweep calls
/// [`evict_expired`](Self::evict_expired) to reclaim the memory.
pub struct TokenStore {
    records: Mutex<HashMap<Token, VerificationRecord>>,
    ttl_secs: u64,
}

impl TokenStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            ttl_secs,
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TOKEN_TTL_SECS)
    }

    /// Generate a fresh token and insert a record for it.
    ///
    /// Collisions with live tokens are excluded by entropy, not checked for.
    /// A subject may hold multiple outstanding tokens; issuing a new one does
    /// not invalidate earlier ones.
    pub fn create(
        &self,
        subject_id: &str,
        display_name: &str,
        avatar_url: &str,
        now: Timestamp,
    ) -> Result<Token, VerifyError> {
        let token = Token::generate()?;
        let record = VerificationRecord {
            token: token.clone(),
            subject_id: subject_id.to_string(),
            display_name: display_name.to_string(),
            avatar_url: avatar_url.to_string(),
            created_at: now,
        };
        self.lock().insert(token.clone(), record);
        Ok(token)
    }

    /// Read-only lookup. Safe to call any number of times; never consumes.
    pub fn get(&self, token: &Token, now: Timestamp) -> Option<VerificationRecord> {
        let records = self.lock();
        records
            .get(token)
            .filter(|r| !r.is_expired(self.ttl_secs, now))
            .cloned()
    }

    /// Atomically retrieve and delete the record for `token`, reporting why
    /// nothing came out when it didn't.
    ///
    /// The second of two racing callers observes [`Consumed::Missing`]. An
    /// expired record is removed as a side effect and reported as
    /// [`Consumed::Expired`], so callers can keep a stale link from passing
    /// for a completed one.
    pub fn try_consume(&self, token: &Token, now: Timestamp) -> Consumed {
        let mut records = self.lock();
        match records.remove(token) {
            Some(record) if record.is_expired(self.ttl_secs, now) => Consumed::Expired,
            Some(record) => Consumed::Live(record),
            None => Consumed::Missing,
        }
    }

    /// [`try_consume`](Self::try_consume) flattened to an `Option`: the
    /// second of two racing callers observes `None`, as does any caller
    /// holding an expired token.
    pub fn consume_if_present(
        &self,
        token: &Token,
        now: Timestamp,
    ) -> Option<VerificationRecord> {
        match self.try_consume(token, now) {
            Consumed::Live(record) => Some(record),
            Consumed::Expired | Consumed::Missing => None,
        }
    }

    /// Remove all expired records, returning how many were evicted.
    pub fn evict_expired(&self, now: Timestamp) -> usize {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|_, r| !r.is_expired(self.ttl_secs, now));
        before - records.len()
    }

    /// Number of live (possibly expired, not yet swept) records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Token, VerificationRecord>> {
        // Record values contain no interior mutability, so a poisoned lock
        // still guards a consistent map.
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TokenStore {
        TokenStore::new(60)
    }

    #[test]
    fn create_then_get_returns_original_fields() {
        let store = store();
        let now = Timestamp::new(1_000);
        let token = store
            .create("U1", "alice#0001", "https://cdn.example/a.png", now)
            .unwrap();

        let record = store.get(&token, now).expect("record present");
        assert_eq!(record.subject_id, "U1");
        assert_eq!(record.display_name, "alice#0001");
        assert_eq!(record.avatar_url, "https://cdn.example/a.png");
        assert_eq!(record.created_at, now);
        assert_eq!(record.token, token);
    }

    #[test]
    fn get_does_not_consume() {
        let store = store();
        let now = Timestamp::new(1_000);
        let token = store.create("U1", "alice", "", now).unwrap();
        for _ in 0..5 {
            assert!(store.get(&token, now).is_some());
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn consume_succeeds_exactly_once() {
        let store = store();
        let now = Timestamp::new(1_000);
        let token = store.create("U1", "alice", "", now).unwrap();

        assert!(store.consume_if_present(&token, now).is_some());
        assert!(store.consume_if_present(&token, now).is_none());
        assert!(store.get(&token, now).is_none());
    }

    #[test]
    fn unknown_token_reads_as_absent() {
        let store = store();
        let now = Timestamp::new(1_000);
        let bogus = Token::from("deadbeef");
        assert!(store.get(&bogus, now).is_none());
        assert!(store.consume_if_present(&bogus, now).is_none());
    }

    #[test]
    fn expired_record_reads_as_absent() {
        let store = store();
        let created = Timestamp::new(1_000);
        let token = store.create("U1", "alice", "", created).unwrap();

        let later = Timestamp::new(1_000 + 60);
        assert!(store.get(&token, later).is_none());
        assert!(store.consume_if_present(&token, later).is_none());
    }

    #[test]
    fn evict_expired_removes_only_stale_records() {
        let store = store();
        let t0 = Timestamp::new(1_000);
        let t1 = Timestamp::new(1_050);
        store.create("old", "old", "", t0).unwrap();
        store.create("fresh", "fresh", "", t1).unwrap();

        let evicted = store.evict_expired(Timestamp::new(1_060));
        assert_eq!(evicted, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn try_consume_tells_expired_from_missing() {
        let store = store();
        let created = Timestamp::new(1_000);
        let stale = store.create("U1", "alice", "", created).unwrap();
        let live = store.create("U2", "bob", "", Timestamp::new(1_030)).unwrap();

        let later = Timestamp::new(1_000 + 60);
        // First attempt sees the lapsed TTL; the removal makes a second
        // attempt indistinguishable from a never-issued token.
        assert_eq!(store.try_consume(&stale, later), Consumed::Expired);
        assert_eq!(store.try_consume(&stale, later), Consumed::Missing);

        assert!(matches!(store.try_consume(&live, later), Consumed::Live(_)));
        assert_eq!(store.try_consume(&live, later), Consumed::Missing);
    }

    #[test]
    fn concurrent_consume_yields_one_winner() {
        use std::sync::Arc;

        let store = Arc::new(store());
        let now = Timestamp::new(1_000);
        let token = store.create("U1", "alice", "", now).unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let token = token.clone();
            handles.push(std::thread::spawn(move || {
                store.consume_if_present(&token, now).is_some()
            }));
        }

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn subject_may_hold_multiple_outstanding_tokens() {
        let store = store();
        let now = Timestamp::new(1_000);
        let a = store.create("U1", "alice", "", now).unwrap();
        let b = store.create("U1", "alice", "", now).unwrap();
        assert_ne!(a, b);
        assert!(store.get(&a, now).is_some());
        assert!(store.get(&b, now).is_some());
    }
}
