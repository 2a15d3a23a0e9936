//! # UTXO Snapshot Seam
//!
//! The peer manager never owns chain state; it only *queries* a UTXO
//! snapshot provided by the embedding node. [`UtxoView`] is that seam:
//! a read-only lookup keyed by [`Outpoint`]. The caller is responsible
//! for holding whatever lock keeps the snapshot consistent for the
//! duration of an operation (in particular across a block-tip rescan).
//!
//! [`InMemoryUtxoSet`] is the stub implementation used by tests and
//! simulations. It carries its own `parking_lot::RwLock` so a test can
//! keep a handle to the set, mutate it (add/spend coins), and observe
//! the peer manager react on the next rescan.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::outpoint::Outpoint;

// ════════════════════════════════════════════════════════════════════════════════
// COIN
// ════════════════════════════════════════════════════════════════════════════════

/// An unspent transaction output as visible in the snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Output value in base units.
    pub amount: u64,
    /// Height of the block that created the output.
    pub height: u32,
    /// Whether the output was created by a coinbase transaction.
    pub is_coinbase: bool,
}

impl Coin {
    /// Builds a coin record.
    #[must_use]
    pub const fn new(amount: u64, height: u32, is_coinbase: bool) -> Self {
        Coin {
            amount,
            height,
            is_coinbase,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// UTXO VIEW
// ════════════════════════════════════════════════════════════════════════════════

/// Read-only access to a UTXO snapshot.
///
/// Implementations must be cheap to query and must not block on I/O;
/// validation walks every stake of a proof through this lookup.
pub trait UtxoView: Send + Sync {
    /// Returns the coin at `outpoint`, or `None` if it is unknown or
    /// spent in the snapshot.
    fn coin_at(&self, outpoint: &Outpoint) -> Option<Coin>;
}

// ════════════════════════════════════════════════════════════════════════════════
// IN-MEMORY UTXO SET
// ════════════════════════════════════════════════════════════════════════════════

/// In-memory [`UtxoView`] implementation.
///
/// Interior mutability lets callers share one handle between the peer
/// manager (reads) and the test driver (writes). The lock is held only
/// for the duration of each map operation.
#[derive(Default)]
pub struct InMemoryUtxoSet {
    coins: RwLock<HashMap<Outpoint, Coin>>,
}

impl InMemoryUtxoSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a coin at `outpoint`.
    pub fn add_coin(&self, outpoint: Outpoint, coin: Coin) {
        self.coins.write().insert(outpoint, coin);
    }

    /// Removes the coin at `outpoint`. Returns `true` if one was spent.
    pub fn spend_coin(&self, outpoint: &Outpoint) -> bool {
        self.coins.write().remove(outpoint).is_some()
    }

    /// Number of unspent coins currently in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coins.read().len()
    }

    /// Whether the set holds no coins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coins.read().is_empty()
    }
}

impl UtxoView for InMemoryUtxoSet {
    fn coin_at(&self, outpoint: &Outpoint) -> Option<Coin> {
        self.coins.read().get(outpoint).copied()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════
