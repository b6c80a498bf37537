//! Append-only tip ledger, one JSON array per recipient username.
//!
//! Appends prepend, so a stored ledger reads newest first. The whole
//! array is read, updated, and written back on every append; there is no
//! atomic append and no locking. That is fine for the single-writer
//! model this store serves and is not a property callers may rely on
//! across concurrent processes.

use std::time::{SystemTime, UNIX_EPOCH};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::registry::{IdentityRegistry, RegistryError};
use crate::store::{self, KvStore, StoreError};

pub const MAX_MESSAGE_CHARS: usize = 280;

/// A single tip. Immutable once appended. Serialized field names match
/// the web app's localStorage layout (`txId`), so existing ledgers parse
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipRecord {
    pub sender: String,
    pub recipient: String,
    pub amount: Decimal,
    pub message: String,
    /// Epoch milliseconds.
    pub timestamp: u64,
    pub tx_id: String,
}

#[derive(Debug)]
pub enum LedgerError {
    /// No registered address for the recipient username.
    UnknownRecipient(String),
    InvalidAmount(String),
    MessageTooLong { len: usize, max: usize },
    /// A directly looked-up ledger did not parse.
    Corrupt(serde_json::Error),
    Store(StoreError),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::UnknownRecipient(username) => {
                write!(f, "no tip page for @{username}")
            }
            LedgerError::InvalidAmount(amount) => {
                write!(f, "amount must be a positive number, got {amount}")
            }
            LedgerError::MessageTooLong { len, max } => {
                write!(f, "message is {len} characters, maximum is {max}")
            }
            LedgerError::Corrupt(e) => write!(f, "corrupt stored entry: {e}"),
            LedgerError::Store(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        LedgerError::Store(e)
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Corrupt(e)
    }
}

/// Current wall-clock time in epoch milliseconds, the timestamp unit tip
/// records carry.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Check a prospective tip before it reaches the ledger. The append
/// itself is unconditional; callers reject bad input first so every
/// stored record is valid.
pub fn validate_tip(amount: Decimal, message: &str) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount.to_string()));
    }
    let len = message.chars().count();
    if len > MAX_MESSAGE_CHARS {
        return Err(LedgerError::MessageTooLong {
            len,
            max: MAX_MESSAGE_CHARS,
        });
    }
    Ok(())
}

pub struct TipLedger<'a, S: KvStore> {
    store: &'a S,
}

impl<'a, S: KvStore> TipLedger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Prepend `tip` to the recipient's ledger. Fails with
    /// [`LedgerError::UnknownRecipient`] unless the registry resolves the
    /// username to an address.
    pub fn append(&self, username: &str, tip: TipRecord) -> Result<(), LedgerError> {
        let registry = IdentityRegistry::new(self.store);
        match registry.lookup_address(username) {
            Ok(Some(_)) => {}
            Ok(None) => return Err(LedgerError::UnknownRecipient(username.to_string())),
            Err(RegistryError::Corrupt(e)) => return Err(LedgerError::Corrupt(e)),
            Err(RegistryError::Store(e)) => return Err(LedgerError::Store(e)),
            Err(RegistryError::InvalidUsername(_)) => {
                return Err(LedgerError::UnknownRecipient(username.to_string()))
            }
        }

        let mut tips = self.tips(username)?;
        tips.insert(0, tip);
        let json = serde_json::to_string(&tips)?;
        self.store.set(&store::tips_key(username), &json)?;
        Ok(())
    }

    /// All tips for `username`, newest first. An absent ledger reads as
    /// empty; an unparsable one is an error here, not skipped.
    pub fn tips(&self, username: &str) -> Result<Vec<TipRecord>, LedgerError> {
        match self.store.get(&store::tips_key(username))? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::IdentityRegistry;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    fn tip(sender: &str, amount: Decimal, tx_id: &str) -> TipRecord {
        TipRecord {
            sender: sender.to_string(),
            recipient: "SP1ABC".to_string(),
            amount,
            message: "thanks".to_string(),
            timestamp: 1000,
            tx_id: tx_id.to_string(),
        }
    }

    #[test]
    fn append_requires_registered_recipient() {
        let store = MemoryStore::new();
        let ledger = TipLedger::new(&store);

        let err = ledger.append("alice", tip("SP2XYZ", dec!(1), "0x1")).unwrap_err();
        assert!(matches!(err, LedgerError::UnknownRecipient(name) if name == "alice"));
    }

    #[test]
    fn append_is_a_pure_prepend() {
        let store = MemoryStore::new();
        IdentityRegistry::new(&store)
            .register("SP1ABC", "alice")
            .unwrap();
        let ledger = TipLedger::new(&store);

        ledger.append("alice", tip("SP2XYZ", dec!(1), "0x1")).unwrap();
        let before = ledger.tips("alice").unwrap();

        let newest = tip("SP3DEF", dec!(2), "0x2");
        ledger.append("alice", newest.clone()).unwrap();

        let after = ledger.tips("alice").unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(after[0], newest);
        assert_eq!(&after[1..], &before[..]);
    }

    #[test]
    fn absent_ledger_reads_empty() {
        let store = MemoryStore::new();
        assert!(TipLedger::new(&store).tips("nobody").unwrap().is_empty());
    }

    #[test]
    fn corrupt_ledger_surfaces_on_direct_read() {
        let store = MemoryStore::new();
        store.set("tipjar_tips_alice", "{broken").unwrap();
        let err = TipLedger::new(&store).tips("alice").unwrap_err();
        assert!(matches!(err, LedgerError::Corrupt(_)));
    }

    #[test]
    fn validate_tip_bounds() {
        assert!(validate_tip(dec!(0.000001), "").is_ok());
        assert!(validate_tip(dec!(2.5), &"x".repeat(280)).is_ok());

        assert!(matches!(
            validate_tip(dec!(0), "hi"),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            validate_tip(dec!(-1), "hi"),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            validate_tip(dec!(1), &"x".repeat(281)),
            Err(LedgerError::MessageTooLong { len: 281, max: 280 })
        ));
    }

    #[test]
    fn stored_json_uses_web_field_names() {
        let json = serde_json::to_string(&tip("SP2XYZ", dec!(2.5), "0xabc")).unwrap();
        assert!(json.contains("\"txId\":\"0xabc\""));
        assert!(json.contains("\"timestamp\":1000"));
    }
}
