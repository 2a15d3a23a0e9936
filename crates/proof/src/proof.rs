//! # Stake Proofs
//!
//! A proof is a bundle of staked UTXOs published by a stake owner to
//! claim voting weight. This module defines the proof document itself:
//! [`Stake`], [`Proof`], the content-hash identifier [`ProofId`], and
//! the score derivation that turns staked value into sampling weight.
//!
//! ## Identity
//!
//! `ProofId` is the SHA3-256 hash of the proof's canonical field
//! encoding (sequence, master public key, then every stake record in
//! order). Two proofs differing in any observable attribute therefore
//! have distinct ids, and the id is stable across processes. The id is
//! computed once at construction; [`Proof`] fields are immutable.
//!
//! ## Score
//!
//! `score = floor(staked_amount / SCORE_UNIT)` — the number of slot
//! units the proof's peer occupies in the sampler. With
//! `SCORE_UNIT = COIN / 100`, one whole coin of stake is worth 100
//! score. Proofs below [`MIN_VALID_PROOF_SCORE`] are rejected as dust.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::sync::Arc;

use crate::outpoint::Outpoint;

// ════════════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ════════════════════════════════════════════════════════════════════════════════

/// Base units per coin.
pub const COIN: u64 = 100_000_000;

/// Base units per slot-score unit. One coin of stake is worth 100 score.
pub const SCORE_UNIT: u64 = COIN / 100;

/// Minimum score a proof must reach to be registrable.
pub const MIN_VALID_PROOF_SCORE: u32 = 100;

/// Maximum number of stakes a single proof may carry.
pub const MAX_PROOF_STAKES: usize = 1_000;

// ════════════════════════════════════════════════════════════════════════════════
// PROOF ID
// ════════════════════════════════════════════════════════════════════════════════

/// 256-bit content hash uniquely identifying a proof.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProofId(pub [u8; 32]);

impl ProofId {
    /// Builds a proof id from raw bytes (e.g. received over the wire).
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        ProofId(bytes)
    }
}

impl fmt::Display for ProofId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ProofId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProofId({})", hex::encode(self.0))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// STAKE
// ════════════════════════════════════════════════════════════════════════════════

/// A single staked UTXO inside a proof.
///
/// `amount`, `height`, and `is_coinbase` restate what the chain is
/// expected to hold at `outpoint`; validation checks the snapshot
/// agrees. `pubkey` is the key the stake was signed with — verified at
/// the wire layer, carried here opaquely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    /// The staked output.
    pub outpoint: Outpoint,
    /// Claimed output value in base units.
    pub amount: u64,
    /// Claimed creation height of the output.
    pub height: u32,
    /// Claimed coinbase flag of the output.
    pub is_coinbase: bool,
    /// Public key owning the output.
    pub pubkey: [u8; 32],
}

// ════════════════════════════════════════════════════════════════════════════════
// PROOF
// ════════════════════════════════════════════════════════════════════════════════

/// Shared handle to an immutable proof.
pub type ProofRef = Arc<Proof>;

/// A stake proof: the stake owner's sequence number, master key, and
/// the staked UTXOs establishing voting weight.
///
/// Fields are private; the id is derived from them at construction and
/// would go stale under mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    id: ProofId,
    sequence: u64,
    master_pubkey: [u8; 32],
    stakes: Vec<Stake>,
}

impl Proof {
    /// Builds a proof and computes its content hash.
    ///
    /// No validation happens here — a structurally broken proof still
    /// has a well-defined id, which lets rejection be reported against
    /// it. See [`crate::validation`] for the checks.
    #[must_use]
    pub fn new(sequence: u64, master_pubkey: [u8; 32], stakes: Vec<Stake>) -> Self {
        let id = Self::compute_id(sequence, &master_pubkey, &stakes);
        Proof {
            id,
            sequence,
            master_pubkey,
            stakes,
        }
    }

    /// Convenience constructor returning a shared handle.
    #[must_use]
    pub fn new_ref(sequence: u64, master_pubkey: [u8; 32], stakes: Vec<Stake>) -> ProofRef {
        Arc::new(Self::new(sequence, master_pubkey, stakes))
    }

    fn compute_id(sequence: u64, master_pubkey: &[u8; 32], stakes: &[Stake]) -> ProofId {
        let mut hasher = Sha3_256::new();
        hasher.update(sequence.to_le_bytes());
        hasher.update(master_pubkey);
        hasher.update((stakes.len() as u32).to_le_bytes());
        for stake in stakes {
            hasher.update(stake.outpoint.txid.as_bytes());
            hasher.update(stake.outpoint.vout.to_le_bytes());
            hasher.update(stake.amount.to_le_bytes());
            hasher.update(stake.height.to_le_bytes());
            hasher.update([u8::from(stake.is_coinbase)]);
            hasher.update(stake.pubkey);
        }
        ProofId(hasher.finalize().into())
    }

    /// The proof's content hash.
    #[must_use]
    pub fn id(&self) -> ProofId {
        self.id
    }

    /// Replacement counter chosen by the stake owner; higher wins.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Identity of the stake owner.
    #[must_use]
    pub fn master_pubkey(&self) -> &[u8; 32] {
        &self.master_pubkey
    }

    /// The staked UTXOs.
    #[must_use]
    pub fn stakes(&self) -> &[Stake] {
        &self.stakes
    }

    /// Number of staked UTXOs.
    #[must_use]
    pub fn stake_count(&self) -> usize {
        self.stakes.len()
    }

    /// Total staked value in base units (saturating).
    #[must_use]
    pub fn staked_amount(&self) -> u64 {
        self.stakes
            .iter()
            .fold(0u64, |sum, s| sum.saturating_add(s.amount))
    }

    /// Sampling weight: `floor(staked_amount / SCORE_UNIT)`.
    #[must_use]
    pub fn score(&self) -> u32 {
        let units = self.staked_amount() / SCORE_UNIT;
        units.min(u64::from(u32::MAX)) as u32
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════
