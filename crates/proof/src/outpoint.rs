//! # Transaction Output References
//!
//! Defines [`TxId`] and [`Outpoint`] — the `(txid, vout)` key under which
//! every unspent transaction output is addressed. Stake conflict
//! detection, UTXO lookups, and pool indexing all key on `Outpoint`.
//!
//! Both types are plain value types: `Copy`, totally ordered, hashable,
//! and serializable. Display renders the txid as lowercase hex, matching
//! the operator-facing conventions used everywhere else in the project.

use serde::{Deserialize, Serialize};
use std::fmt;

// ════════════════════════════════════════════════════════════════════════════════
// TXID
// ════════════════════════════════════════════════════════════════════════════════

/// A 32-byte transaction identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    /// Builds a txid from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        TxId(bytes)
    }

    /// Raw byte access, used when feeding hashes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", hex::encode(self.0))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// OUTPOINT
// ════════════════════════════════════════════════════════════════════════════════

/// A reference to a single transaction output: `(txid, vout)`.
///
/// At most one *valid* proof may own any given outpoint; the conflicting
/// and orphan pools each hold at most one proof per outpoint as well.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Outpoint {
    /// Identifier of the transaction holding the output.
    pub txid: TxId,
    /// Zero-based index of the output within that transaction.
    pub vout: u32,
}

impl Outpoint {
    /// Builds an outpoint from its parts.
    #[must_use]
    pub const fn new(txid: TxId, vout: u32) -> Self {
        Outpoint { txid, vout }
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

impl fmt::Debug for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Outpoint({}:{})", self.txid, self.vout)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════
