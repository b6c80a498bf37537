//! Identity registry: wallet address <-> chosen username.
//!
//! Each identity is two store entries: the primary address -> username
//! mapping written when a user claims a name, and a secondary
//! username -> `{address}` record that tip pages and the leaderboard
//! resolve recipients through.
//!
//! Uniqueness is deliberately not enforced across addresses: a later
//! claim of the same username overwrites the secondary record (last
//! write wins, matching the web app this ledger is compatible with).

use serde::{Deserialize, Serialize};

use crate::store::{self, KvStore, StoreError};

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 20;

/// Value stored under `tipjar_user_<username>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    address: String,
}

#[derive(Debug)]
pub enum RegistryError {
    /// Username failed the format rule; nothing was persisted.
    InvalidUsername(String),
    /// A directly looked-up record did not parse. Never swallowed here;
    /// only bulk aggregation skips corrupt entries.
    Corrupt(serde_json::Error),
    Store(StoreError),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::InvalidUsername(reason) => write!(f, "invalid username: {reason}"),
            RegistryError::Corrupt(e) => write!(f, "corrupt stored entry: {e}"),
            RegistryError::Store(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<StoreError> for RegistryError {
    fn from(e: StoreError) -> Self {
        RegistryError::Store(e)
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(e: serde_json::Error) -> Self {
        RegistryError::Corrupt(e)
    }
}

/// Lowercase, then check `[a-z0-9_-]{3,20}`. The web app lowercases on
/// input, so uppercase letters are accepted and folded rather than
/// rejected.
fn normalize_username(username: &str) -> Result<String, RegistryError> {
    let username = username.trim().to_lowercase();
    let chars = username.chars().count();
    if chars < USERNAME_MIN_CHARS || chars > USERNAME_MAX_CHARS {
        return Err(RegistryError::InvalidUsername(format!(
            "must be {USERNAME_MIN_CHARS}-{USERNAME_MAX_CHARS} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(RegistryError::InvalidUsername(
            "only letters, digits, '-' and '_' are allowed".to_string(),
        ));
    }
    Ok(username)
}

pub struct IdentityRegistry<'a, S: KvStore> {
    store: &'a S,
}

impl<'a, S: KvStore> IdentityRegistry<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Claim `username` for `address`, writing both mappings. Returns the
    /// normalized (lowercased) username.
    pub fn register(&self, address: &str, username: &str) -> Result<String, RegistryError> {
        let username = normalize_username(username)?;
        let record = serde_json::to_string(&UserRecord {
            address: address.to_string(),
        })?;
        self.store.set(&store::username_key(address), &username)?;
        self.store.set(&store::user_key(&username), &record)?;
        Ok(username)
    }

    /// Resolve a username to its registered address via the secondary
    /// record.
    pub fn lookup_address(&self, username: &str) -> Result<Option<String>, RegistryError> {
        match self.store.get(&store::user_key(username))? {
            Some(raw) => {
                let record: UserRecord = serde_json::from_str(&raw)?;
                Ok(Some(record.address))
            }
            None => Ok(None),
        }
    }

    /// Resolve an address to the username it last claimed.
    pub fn lookup_username(&self, address: &str) -> Result<Option<String>, RegistryError> {
        Ok(self.store.get(&store::username_key(address))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn register_and_lookup_both_ways() {
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store);

        let name = registry.register("SP1ABC", "alice").unwrap();
        assert_eq!(name, "alice");
        assert_eq!(
            registry.lookup_address("alice").unwrap().as_deref(),
            Some("SP1ABC")
        );
        assert_eq!(
            registry.lookup_username("SP1ABC").unwrap().as_deref(),
            Some("alice")
        );
    }

    #[test]
    fn usernames_are_lowercased() {
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store);

        let name = registry.register("SP1ABC", "Alice_99").unwrap();
        assert_eq!(name, "alice_99");
        assert!(registry.lookup_address("alice_99").unwrap().is_some());
    }

    #[test]
    fn rejects_bad_formats() {
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store);

        for bad in ["ab", "a", "", "this-name-is-way-too-long", "spaced out", "héllo", "dot.dot"] {
            let err = registry.register("SP1ABC", bad).unwrap_err();
            assert!(
                matches!(err, RegistryError::InvalidUsername(_)),
                "expected rejection for {bad:?}"
            );
        }
        // Nothing persisted on failure.
        assert!(registry.lookup_username("SP1ABC").unwrap().is_none());
    }

    #[test]
    fn boundary_lengths_accepted() {
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store);
        registry.register("SP1ABC", "abc").unwrap();
        registry.register("SP1ABC", "a".repeat(20).as_str()).unwrap();
    }

    #[test]
    fn later_claim_overwrites_secondary_mapping() {
        let store = MemoryStore::new();
        let registry = IdentityRegistry::new(&store);

        registry.register("SP1ABC", "alice").unwrap();
        registry.register("SP2XYZ", "alice").unwrap();

        // Last write wins on the username -> address record; the first
        // address still remembers its claimed name.
        assert_eq!(
            registry.lookup_address("alice").unwrap().as_deref(),
            Some("SP2XYZ")
        );
        assert_eq!(
            registry.lookup_username("SP1ABC").unwrap().as_deref(),
            Some("alice")
        );
    }

    #[test]
    fn corrupt_user_record_surfaces_on_direct_lookup() {
        let store = MemoryStore::new();
        store.set("tipjar_user_mallory", "not json").unwrap();

        let registry = IdentityRegistry::new(&store);
        let err = registry.lookup_address("mallory").unwrap_err();
        assert!(matches!(err, RegistryError::Corrupt(_)));
    }
}
