//! # Chain Listener
//!
//! `updated_block_tip` is the peer manager's reaction to a change of
//! the UTXO snapshot: a reorg, a new block, or a catch-up. Every stored
//! proof is re-judged against the fresh snapshot and moved to the pool
//! its stake now warrants:
//!
//! 1. **Orphans** whose stake appeared are re-registered, best-first,
//!    so the preferred proof wins any conflict it re-enters.
//! 2. **Peers** whose stake vanished are demoted; their proofs move to
//!    the orphan pool and their nodes become pending.
//! 3. **Conflicting** entries whose rival peer went away (and whose
//!    own stake is visible) are promoted.
//!
//! The three steps repeat until a full pass changes nothing. Each pass
//! either performs a pool transition or terminates, and a proof can
//! only move forward per pass, so the fixed point is reached within a
//! bounded number of passes; the bound is enforced explicitly and
//! logged if ever hit.
//!
//! The caller must hold the snapshot stable (whatever lock guards it)
//! for the duration of the call. The listener is infallible: individual
//! re-validation failures demote or drop the affected proof, they never
//! surface as errors.

use tracing::debug;

use avalanche_proof::{verify_proof, ProofRef, ProofStatus};

use crate::manager::{PeerManager, RegistrationError, RegistrationMode};
use crate::pool::PoolAddOutcome;
use crate::slots::PeerId;

impl PeerManager {
    /// Rescans every pool against the current UTXO snapshot. See the
    /// module docs for the algorithm.
    pub fn updated_block_tip(&mut self) {
        let bound = self.peer_count() + self.conflicting_pool_size() + self.orphan_pool_size() + 1;

        for _pass in 0..bound {
            let mut changed = false;

            changed |= self.rescan_orphans();
            changed |= self.rescan_peers();
            changed |= self.rescan_conflicting();

            if !changed {
                return;
            }
        }

        debug!("block-tip rescan stopped at its iteration bound");
    }

    /// Step 1: promote orphans whose stake is now visible, best first.
    fn rescan_orphans(&mut self) -> bool {
        let mut changed = false;

        for proof in self.orphans.proofs_best_first() {
            if !verify_proof(&proof, self.utxos.as_ref()).is_valid() {
                continue;
            }

            let proof_id = proof.id();
            self.orphans.remove(&proof_id);
            match self.register_proof(ProofRef::clone(&proof), RegistrationMode::Polite) {
                Ok(peer_id) => {
                    debug!("orphan {} promoted to peer {}", proof_id, peer_id);
                    changed = true;
                }
                Err(RegistrationError::Conflicting) => {
                    // Moved to the conflicting pool; still a transition.
                    changed = true;
                }
                Err(RegistrationError::CooldownNotElapsed) => {
                    // Not a transition: park it again and retry on a
                    // later tip update.
                    let _ = self.orphans.add(proof);
                }
                Err(err) => {
                    debug!("orphan {} dropped on rescan: {}", proof_id, err);
                    changed = true;
                }
            }
        }

        changed
    }

    /// Step 2: demote peers whose proofs no longer verify.
    fn rescan_peers(&mut self) -> bool {
        let stale: Vec<(PeerId, ProofRef)> = self
            .peers
            .iter_by_score_desc()
            .filter(|peer| {
                !matches!(
                    verify_proof(&peer.proof, self.utxos.as_ref()),
                    ProofStatus::Valid
                )
            })
            .map(|peer| (peer.peer_id, ProofRef::clone(&peer.proof)))
            .collect();

        let changed = !stale.is_empty();
        for (peer_id, proof) in stale {
            self.demote_peer(peer_id);
            match self.orphans.add(ProofRef::clone(&proof)) {
                PoolAddOutcome::Added { evicted } => {
                    for old in evicted {
                        debug!("orphan {} displaced by demoted proof {}", old.id(), proof.id());
                    }
                }
                PoolAddOutcome::Refused => {
                    debug!("demoted proof {} lost its orphan-pool place", proof.id());
                }
                PoolAddOutcome::Duplicate => {}
            }
        }

        changed
    }

    /// Step 3: promote conflicting entries whose rival disappeared.
    fn rescan_conflicting(&mut self) -> bool {
        let mut changed = false;

        for proof in self.conflicting.proofs_best_first() {
            if !verify_proof(&proof, self.utxos.as_ref()).is_valid() {
                continue;
            }
            if !self.peers.conflicts_with(&proof).is_empty() {
                continue;
            }

            let proof_id = proof.id();
            self.conflicting.remove(&proof_id);
            match self.register_proof(proof, RegistrationMode::Polite) {
                Ok(peer_id) => {
                    debug!("conflicting proof {} promoted to peer {}", proof_id, peer_id);
                    changed = true;
                }
                Err(err) => {
                    debug!("conflicting proof {} dropped on rescan: {}", proof_id, err);
                    changed = true;
                }
            }
        }

        changed
    }
}
