//! Derived aggregates: per-user totals, the ranked leaderboard, and the
//! global summary cards.
//!
//! Nothing here is persisted or cached; every call recomputes from the
//! ledgers at read time, so the invariants `total_received == sum(amount)`
//! and `total_tips == ledger length` hold for the snapshot being read.
//! The leaderboard scan swallows corrupt entries (skip-and-continue) so
//! one bad record never blanks the whole board.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::{LedgerError, TipLedger, TipRecord};
use crate::registry::{IdentityRegistry, RegistryError};
use crate::store::{self, KvStore, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub total_received: Decimal,
    pub total_tips: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub address: String,
    pub username: String,
    pub total_received: Decimal,
    pub total_tips: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalTotals {
    pub total_users: usize,
    pub total_tips: usize,
    pub total_volume: Decimal,
}

fn fold_stats(tips: &[TipRecord]) -> UserStats {
    UserStats {
        total_received: tips.iter().map(|t| t.amount).sum(),
        total_tips: tips.len(),
    }
}

/// Sum and count of one user's ledger. O(n) fold, recomputed per call.
/// A corrupt ledger is an error here: this backs a direct page view, not
/// the bulk scan.
pub fn user_stats<S: KvStore>(store: &S, username: &str) -> Result<UserStats, LedgerError> {
    let tips = TipLedger::new(store).tips(username)?;
    Ok(fold_stats(&tips))
}

/// Scan every ledger key, aggregate each, and rank by total received
/// (descending). The sort is stable; ties keep store enumeration order.
///
/// Skipped, never fatal: ledgers that fail to parse, and ledgers whose
/// username has no resolvable registered address. Storage failures still
/// propagate.
pub fn leaderboard<S: KvStore>(store: &S) -> Result<Vec<LeaderboardEntry>, StoreError> {
    let registry = IdentityRegistry::new(store);
    let ledger = TipLedger::new(store);

    let mut entries = Vec::new();
    for key in store.keys_with_prefix(store::TIPS_KEY_PREFIX)? {
        let username = &key[store::TIPS_KEY_PREFIX.len()..];

        let tips = match ledger.tips(username) {
            Ok(tips) => tips,
            Err(LedgerError::Store(e)) => return Err(e),
            Err(_) => continue,
        };
        let address = match registry.lookup_address(username) {
            Ok(Some(address)) => address,
            Ok(None) => continue,
            Err(RegistryError::Store(e)) => return Err(e),
            Err(_) => continue,
        };

        let stats = fold_stats(&tips);
        entries.push(LeaderboardEntry {
            address,
            username: username.to_string(),
            total_received: stats.total_received,
            total_tips: stats.total_tips,
        });
    }

    entries.sort_by(|a, b| b.total_received.cmp(&a.total_received));
    Ok(entries)
}

/// The three summary cards above the board.
pub fn global_totals(entries: &[LeaderboardEntry]) -> GlobalTotals {
    GlobalTotals {
        total_users: entries.len(),
        total_tips: entries.iter().map(|e| e.total_tips).sum(),
        total_volume: entries.iter().map(|e| e.total_received).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TipRecord;
    use crate::registry::IdentityRegistry;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    fn seed_user(store: &MemoryStore, address: &str, username: &str, amounts: &[Decimal]) {
        IdentityRegistry::new(store).register(address, username).unwrap();
        let ledger = TipLedger::new(store);
        for (i, amount) in amounts.iter().enumerate() {
            ledger
                .append(
                    username,
                    TipRecord {
                        sender: "SP9SENDER".to_string(),
                        recipient: address.to_string(),
                        amount: *amount,
                        message: String::new(),
                        timestamp: 1000 + i as u64,
                        tx_id: format!("0x{username}{i}"),
                    },
                )
                .unwrap();
        }
    }

    #[test]
    fn user_stats_folds_sum_and_count() {
        let store = MemoryStore::new();
        seed_user(&store, "SP1ABC", "alice", &[dec!(1.5), dec!(1.0)]);

        let stats = user_stats(&store, "alice").unwrap();
        assert_eq!(stats.total_received, dec!(2.5));
        assert_eq!(stats.total_tips, 2);
    }

    #[test]
    fn user_stats_for_unknown_user_is_zero() {
        let store = MemoryStore::new();
        let stats = user_stats(&store, "ghost").unwrap();
        assert_eq!(stats.total_received, Decimal::ZERO);
        assert_eq!(stats.total_tips, 0);
    }

    #[test]
    fn leaderboard_ranks_by_total_received() {
        let store = MemoryStore::new();
        seed_user(&store, "SP2BOB", "bob", &[dec!(3.0)]);
        seed_user(&store, "SP1ABC", "alice", &[dec!(2.0), dec!(3.0)]);

        let board = leaderboard(&store).unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].username, "alice");
        assert_eq!(board[0].total_received, dec!(5.0));
        assert_eq!(board[1].username, "bob");
        for pair in board.windows(2) {
            assert!(pair[0].total_received >= pair[1].total_received);
        }
    }

    #[test]
    fn ties_keep_store_order() {
        let store = MemoryStore::new();
        seed_user(&store, "SP2BOB", "bob", &[dec!(2.0)]);
        seed_user(&store, "SP1ABC", "alice", &[dec!(2.0)]);

        let board = leaderboard(&store).unwrap();
        assert_eq!(board[0].username, "bob");
        assert_eq!(board[1].username, "alice");
    }

    #[test]
    fn corrupt_ledger_is_skipped() {
        let store = MemoryStore::new();
        seed_user(&store, "SP1ABC", "alice", &[dec!(5.0)]);
        IdentityRegistry::new(&store).register("SP3MAL", "mallory").unwrap();
        store.set("tipjar_tips_mallory", "][ not json").unwrap();

        let board = leaderboard(&store).unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].username, "alice");
    }

    #[test]
    fn ledger_without_identity_is_dropped() {
        let store = MemoryStore::new();
        seed_user(&store, "SP1ABC", "alice", &[dec!(1.0)]);
        // A ledger exists but nobody registered the name.
        store.set("tipjar_tips_orphan", "[]").unwrap();

        let board = leaderboard(&store).unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].username, "alice");
    }

    #[test]
    fn global_totals_sum_the_board() {
        let store = MemoryStore::new();
        seed_user(&store, "SP1ABC", "alice", &[dec!(2.0), dec!(3.0)]);
        seed_user(&store, "SP2BOB", "bob", &[dec!(3.0)]);

        let board = leaderboard(&store).unwrap();
        let totals = global_totals(&board);
        assert_eq!(totals.total_users, 2);
        assert_eq!(totals.total_tips, 3);
        assert_eq!(totals.total_volume, dec!(8.0));
    }
}
