//! # Proof Validation
//!
//! Deterministic validation pipeline deciding what the registry does
//! with a submitted proof. Two layers:
//!
//! 1. **Structural checks** ([`check_structure`]) — properties of the
//!    document alone: it must stake something, stake each outpoint at
//!    most once, stay under the stake-count limit, and clear the dust
//!    score threshold.
//! 2. **Stake visibility** ([`verify_proof`]) — every staked outpoint
//!    must be present in the UTXO snapshot with exactly the claimed
//!    amount, height, and coinbase flag. Any discrepancy makes the
//!    proof an *orphan* candidate, not an invalid one: a reorg can
//!    later make the claim true, so the registry parks it instead of
//!    discarding it.
//!
//! Both layers are pure: caller-provided snapshot, no clock, no
//! side effects. Signature verification happens upstream at the wire
//! layer and is deliberately absent here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outpoint::Outpoint;
use crate::proof::{Proof, MAX_PROOF_STAKES, MIN_VALID_PROOF_SCORE};
use crate::utxo::UtxoView;

// ════════════════════════════════════════════════════════════════════════════════
// PROOF ERROR
// ════════════════════════════════════════════════════════════════════════════════

/// Structural defects that make a proof permanently unregistrable.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ProofError {
    /// The proof stakes no UTXO at all.
    #[error("proof has no stake")]
    NoStake,

    /// The same outpoint is staked more than once.
    #[error("duplicated stake on outpoint {0}")]
    DuplicateStake(Outpoint),

    /// More stakes than the protocol allows in one proof.
    #[error("proof has {count} stakes, above the maximum of {max}")]
    TooManyStakes {
        /// Stakes carried by the proof.
        count: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// The proof's score is below the dust threshold.
    #[error("proof score {score} is below the minimum of {min}")]
    DustThreshold {
        /// Derived score of the proof.
        score: u32,
        /// Required minimum score.
        min: u32,
    },
}

// ════════════════════════════════════════════════════════════════════════════════
// PROOF STATUS
// ════════════════════════════════════════════════════════════════════════════════

/// Outcome of validating a proof against a UTXO snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProofStatus {
    /// Structure is sound and every stake is visible as claimed.
    Valid,
    /// The document itself is broken; never registrable.
    Invalid(ProofError),
    /// Structure is sound but the listed outpoints are missing from the
    /// snapshot or present with different attributes. Registrable as an
    /// orphan; may become valid after a chain update.
    NeedsUtxo(Vec<Outpoint>),
}

impl ProofStatus {
    /// Whether the status is [`ProofStatus::Valid`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, ProofStatus::Valid)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// STRUCTURAL CHECKS
// ════════════════════════════════════════════════════════════════════════════════

/// Validates the proof document alone, without chain state.
///
/// Check order: stake presence, stake-count bound, duplicate outpoints,
/// dust threshold. The first failing check is reported.
pub fn check_structure(proof: &Proof) -> Result<(), ProofError> {
    let stakes = proof.stakes();

    if stakes.is_empty() {
        return Err(ProofError::NoStake);
    }

    if stakes.len() > MAX_PROOF_STAKES {
        return Err(ProofError::TooManyStakes {
            count: stakes.len(),
            max: MAX_PROOF_STAKES,
        });
    }

    let mut seen = std::collections::HashSet::with_capacity(stakes.len());
    for stake in stakes {
        if !seen.insert(stake.outpoint) {
            return Err(ProofError::DuplicateStake(stake.outpoint));
        }
    }

    let score = proof.score();
    if score < MIN_VALID_PROOF_SCORE {
        return Err(ProofError::DustThreshold {
            score,
            min: MIN_VALID_PROOF_SCORE,
        });
    }

    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════════
// FULL VALIDATION
// ════════════════════════════════════════════════════════════════════════════════

/// Validates a proof against a UTXO snapshot.
///
/// Structural failures short-circuit to [`ProofStatus::Invalid`]. For a
/// structurally sound proof, every stake is then checked against the
/// snapshot; all unverifiable outpoints are collected so the orphan
/// pool can report what is missing.
pub fn verify_proof(proof: &Proof, view: &dyn UtxoView) -> ProofStatus {
    if let Err(err) = check_structure(proof) {
        return ProofStatus::Invalid(err);
    }

    let mut unverified = Vec::new();
    for stake in proof.stakes() {
        match view.coin_at(&stake.outpoint) {
            Some(coin)
                if coin.amount == stake.amount
                    && coin.height == stake.height
                    && coin.is_coinbase == stake.is_coinbase => {}
            // Missing, or present with mismatched attributes: either way
            // the chain does not currently back the claim.
            _ => unverified.push(stake.outpoint),
        }
    }

    if unverified.is_empty() {
        ProofStatus::Valid
    } else {
        ProofStatus::NeedsUtxo(unverified)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════
