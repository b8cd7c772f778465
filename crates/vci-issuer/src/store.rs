//! # Pending-Credential Store
//!
//! Holds unsigned credential documents between the offer and the issuance
//! flow, keyed by the one-time code. The offer flow is the only writer and
//! the issuance flow the only reader.
//!
//! Codes are freshly generated per offer, so writes never target the same
//! key and a read only ever targets a key whose write has completed.
//!
//! Records are never removed. A persistent implementation should expire
//! them.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::document::PendingCredential;

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists for the code.
    #[error("no item found for {0}")]
    NotFound(String),
    /// A record already exists for the code. Codes are single-use.
    #[error("a credential is already stored for {0}")]
    AlreadyExists(String),
    /// The backing store failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Persistence of pending credentials.
pub trait CredentialStore: Send + Sync + 'static {
    /// Fetch the record stored under `code`.
    fn get(&self, code: &str) -> Result<PendingCredential, StoreError>;

    /// Store `credential` under `code`. Fails if the code is taken.
    fn put(&self, code: &str, credential: PendingCredential) -> Result<(), StoreError>;
}

/// Thread-safe, cloneable in-memory store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not `tokio::sync`)
/// because the lock is never held across `.await` points.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    data: Arc<RwLock<HashMap<String, PendingCredential>>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a record exists for `code`.
    pub fn contains(&self, code: &str) -> bool {
        self.data.read().contains_key(code)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self, code: &str) -> Result<PendingCredential, StoreError> {
        self.data
            .read()
            .get(code)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(code.to_string()))
    }

    fn put(&self, code: &str, credential: PendingCredential) -> Result<(), StoreError> {
        let mut guard = self.data.write();
        if guard.contains_key(code) {
            return Err(StoreError::AlreadyExists(code.to_string()));
        }
        guard.insert(code.to_string(), credential);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};
    use vci_core::CredentialKind;

    fn credential(name: &str) -> PendingCredential {
        let mut claims = Map::new();
        claims.insert("given_name".into(), json!(name));
        PendingCredential::build(CredentialKind::Developer, "https://issuer.example", claims)
    }

    #[test]
    fn get_unknown_code_is_not_found_with_code() {
        let store = InMemoryCredentialStore::new();
        let err = store.get("missing-code").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref c) if c == "missing-code"));
        assert!(err.to_string().contains("missing-code"));
    }

    #[test]
    fn put_then_get_returns_document() {
        let store = InMemoryCredentialStore::new();
        store.put("c1", credential("A")).unwrap();
        let fetched = store.get("c1").unwrap();
        assert_eq!(fetched.claims().unwrap()["given_name"], "A");
        assert!(store.contains("c1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn put_existing_code_is_rejected() {
        let store = InMemoryCredentialStore::new();
        store.put("c1", credential("A")).unwrap();
        let err = store.put("c1", credential("B")).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(store.get("c1").unwrap().claims().unwrap()["given_name"], "A");
    }

    #[test]
    fn clones_share_data() {
        let store = InMemoryCredentialStore::new();
        let other = store.clone();
        store.put("shared", credential("A")).unwrap();
        assert!(other.contains("shared"));
    }

    #[test]
    fn get_returns_a_copy() {
        let store = InMemoryCredentialStore::new();
        store.put("c1", credential("A")).unwrap();
        let fetched = store.get("c1").unwrap().with_holder("did:example:holder");
        assert!(fetched.holder().is_some());
        assert!(store.get("c1").unwrap().holder().is_none());
    }

    #[test]
    fn concurrent_writes_under_distinct_codes() {
        let store = InMemoryCredentialStore::new();
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || store.put(&format!("code-{i}"), credential("X")))
            })
            .collect();
        for h in handles {
            h.join().unwrap().unwrap();
        }
        assert_eq!(store.len(), 16);
    }
}
