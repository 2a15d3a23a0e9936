//! # Conflict Ordering
//!
//! When two proofs stake the same outpoint only one of them may hold it
//! in the valid pool. This module defines the total order deciding the
//! winner. A candidate beats a reference iff the first differing
//! attribute in this sequence prefers it:
//!
//! 1. higher `sequence` (the owner's replacement counter),
//! 2. greater staked amount,
//! 3. fewer stakes (fewer UTXOs locked for the same value),
//! 4. lexicographically smaller proof id.
//!
//! Step 4 is total over the id space, so ties are impossible: for any
//! two distinct proofs exactly one is preferred. Registration,
//! conflicting-pool eviction, and rescan promotion all rely on this
//! determinism.
//!
//! [`ProofRank`] packages the four attributes as an `Ord` key where a
//! *greater* rank means a *preferred* proof, so ranks can drive ordered
//! pool indexes directly.

use std::cmp::{Ordering, Reverse};

use crate::proof::{Proof, ProofId};

// ════════════════════════════════════════════════════════════════════════════════
// PROOF RANK
// ════════════════════════════════════════════════════════════════════════════════

/// Orderable conflict-resolution key of a proof.
///
/// `rank(a) > rank(b)` exactly when `a` is preferred over `b`. Since
/// the key ends in the proof id, ranks of distinct proofs never
/// compare equal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProofRank {
    sequence: u64,
    staked_amount: u64,
    stake_count: Reverse<usize>,
    proof_id: Reverse<ProofId>,
}

impl ProofRank {
    /// Computes the rank of `proof`.
    #[must_use]
    pub fn of(proof: &Proof) -> Self {
        ProofRank {
            sequence: proof.sequence(),
            staked_amount: proof.staked_amount(),
            stake_count: Reverse(proof.stake_count()),
            proof_id: Reverse(proof.id()),
        }
    }

    /// The proof id the rank was derived from.
    #[must_use]
    pub fn proof_id(&self) -> ProofId {
        self.proof_id.0
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// COMPARISON
// ════════════════════════════════════════════════════════════════════════════════

/// Total order over proofs: `Greater` means `a` is preferred over `b`.
#[must_use]
pub fn compare_proofs(a: &Proof, b: &Proof) -> Ordering {
    ProofRank::of(a).cmp(&ProofRank::of(b))
}

/// Returns `true` iff `candidate` is preferred over `reference`.
///
/// Antisymmetric for distinct proofs: exactly one direction holds.
#[must_use]
pub fn is_preferred(candidate: &Proof, reference: &Proof) -> bool {
    compare_proofs(candidate, reference) == Ordering::Greater
}

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════
