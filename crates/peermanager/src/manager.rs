//! # Peer Manager Façade
//!
//! [`PeerManager`] coordinates the slot sampler, the three proof pools,
//! and the node table behind one API: proof admission with conflict
//! resolution and cooldown, node binding, stake-weighted selection,
//! compaction, and the invariant checker. The chain listener half of
//! the façade (`updated_block_tip`) lives in [`crate::listener`].
//!
//! ## Admission outcomes
//!
//! `register_proof` returns the new [`PeerId`] on promotion and a
//! [`RegistrationError`] otherwise. Two of the "errors" still store the
//! proof: `Orphan` (parked until its stake appears on chain) and
//! `Conflicting` (parked until it wins a conflict). All other outcomes
//! leave the manager exactly as it was — no partial state is ever
//! committed.
//!
//! ## Determinism
//!
//! The clock and the RNG are injected. Production uses the system
//! clock and an entropy-seeded [`StdRng`]; tests pin a
//! [`crate::time::MockTime`] and a seeded generator, which makes every
//! selection reproducible.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use avalanche_proof::{
    is_preferred, verify_proof, Outpoint, ProofError, ProofId, ProofRef, ProofStatus, UtxoView,
};

use crate::config::PeerManagerConfig;
use crate::nodes::{Node, NodeId, NodeSet, NodeState};
use crate::peers::{Peer, PeerSet};
use crate::pool::{EvictionPolicy, PoolAddOutcome, ProofPool};
use crate::slots::{PeerId, SlotArray};
use crate::time::{SystemTimeSource, TimeSource};

/// Draws attempted before `select_peer` gives up on fragmentation.
const SELECT_PEER_MAX_RETRIES: usize = 3;

/// Peer draws attempted before `select_node` reports no node.
const SELECT_NODE_MAX_RETRIES: usize = 3;

// ════════════════════════════════════════════════════════════════════════════════
// MODES AND ERRORS
// ════════════════════════════════════════════════════════════════════════════════

/// How `register_proof` treats conflicts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationMode {
    /// Respect cooldowns and the replacement policy.
    Polite,
    /// Replace conflicting peers unconditionally.
    ForceAccept,
}

/// How `reject_proof` treats the rejected id afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionMode {
    /// Remove the proof; it may register again later.
    Default,
    /// Remove the proof and blacklist its id.
    Invalidate,
}

/// Why `register_proof` did not promote the proof.
///
/// `Orphan` and `Conflicting` mean the proof WAS stored, in the pool
/// of the same name; everything else means nothing was stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationError {
    /// Structurally broken proof; never registrable.
    Invalid(ProofError),
    /// The proof id is already tracked in some pool.
    AlreadyRegistered,
    /// Stored in the conflicting pool after losing to a valid peer.
    Conflicting,
    /// A conflicted peer is still inside its cooldown window.
    CooldownNotElapsed,
    /// Stored in the orphan pool awaiting its stake on chain.
    Orphan,
    /// Refused outright: blacklisted id, lost an intra-pool conflict,
    /// or fell below a pool's size cap.
    Rejected,
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::Invalid(err) => write!(f, "invalid proof: {err}"),
            RegistrationError::AlreadyRegistered => write!(f, "proof already registered"),
            RegistrationError::Conflicting => {
                write!(f, "proof conflicts with a registered peer")
            }
            RegistrationError::CooldownNotElapsed => {
                write!(f, "conflicting proof cooldown has not elapsed")
            }
            RegistrationError::Orphan => write!(f, "proof stake is not available on chain"),
            RegistrationError::Rejected => write!(f, "proof rejected"),
        }
    }
}

impl std::error::Error for RegistrationError {}

// ════════════════════════════════════════════════════════════════════════════════
// PEER MANAGER
// ════════════════════════════════════════════════════════════════════════════════

/// The in-memory registry of proofs, peers, and nodes.
pub struct PeerManager {
    pub(crate) config: PeerManagerConfig,
    pub(crate) utxos: Arc<dyn UtxoView>,
    pub(crate) clock: Arc<dyn TimeSource>,
    pub(crate) rng: Box<dyn RngCore + Send + Sync>,
    pub(crate) slots: SlotArray,
    pub(crate) peers: PeerSet,
    pub(crate) nodes: NodeSet,
    pub(crate) conflicting: ProofPool,
    pub(crate) orphans: ProofPool,
    pub(crate) invalidated: HashSet<ProofId>,
    pub(crate) unbroadcast: BTreeSet<ProofId>,
    pub(crate) need_more_nodes: bool,
}

impl PeerManager {
    /// Creates a manager over the given UTXO snapshot with the system
    /// clock and an entropy-seeded RNG.
    #[must_use]
    pub fn new(config: PeerManagerConfig, utxos: Arc<dyn UtxoView>) -> Self {
        Self::with_dependencies(
            config,
            utxos,
            Arc::new(SystemTimeSource),
            Box::new(StdRng::from_entropy()),
        )
    }

    /// Creates a manager with injected clock and RNG. Tests pass a
    /// [`MockTime`] and a seeded generator for full determinism.
    #[must_use]
    pub fn with_dependencies(
        config: PeerManagerConfig,
        utxos: Arc<dyn UtxoView>,
        clock: Arc<dyn TimeSource>,
        rng: Box<dyn RngCore + Send + Sync>,
    ) -> Self {
        let conflicting = ProofPool::new(EvictionPolicy::WorstFirst, config.conflicting_pool_cap);
        let orphans = ProofPool::new(EvictionPolicy::OldestFirst, config.orphan_pool_cap);
        PeerManager {
            config,
            utxos,
            clock,
            rng,
            slots: SlotArray::new(),
            peers: PeerSet::new(),
            nodes: NodeSet::new(),
            conflicting,
            orphans,
            invalidated: HashSet::new(),
            unbroadcast: BTreeSet::new(),
            need_more_nodes: false,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &PeerManagerConfig {
        &self.config
    }

    // ────────────────────────────────────────────────────────────────
    // REGISTRATION
    // ────────────────────────────────────────────────────────────────

    /// Submits a proof for registration.
    ///
    /// Pipeline: blacklist → dedup → validation → conflict detection →
    /// cooldown → replacement or conflicting-pool storage. See the
    /// module docs for which outcomes store the proof.
    pub fn register_proof(
        &mut self,
        proof: ProofRef,
        mode: RegistrationMode,
    ) -> Result<PeerId, RegistrationError> {
        let proof_id = proof.id();

        if self.invalidated.contains(&proof_id) {
            return Err(RegistrationError::Rejected);
        }

        let proof = if self.exists(&proof_id) {
            // Force-accepting a proof parked in the conflicting pool
            // pulls it out and re-runs admission; anything else is a
            // duplicate.
            if mode == RegistrationMode::ForceAccept && self.conflicting.contains(&proof_id) {
                match self.conflicting.remove(&proof_id) {
                    Some(stored) => stored,
                    None => return Err(RegistrationError::AlreadyRegistered),
                }
            } else {
                return Err(RegistrationError::AlreadyRegistered);
            }
        } else {
            proof
        };

        match verify_proof(&proof, self.utxos.as_ref()) {
            ProofStatus::Invalid(err) => return Err(RegistrationError::Invalid(err)),
            ProofStatus::NeedsUtxo(_) => {
                return match self.orphans.add(proof) {
                    PoolAddOutcome::Added { evicted } => {
                        for old in evicted {
                            debug!("orphan {} displaced by a preferred proof", old.id());
                        }
                        Err(RegistrationError::Orphan)
                    }
                    PoolAddOutcome::Refused => Err(RegistrationError::Rejected),
                    PoolAddOutcome::Duplicate => Err(RegistrationError::AlreadyRegistered),
                }
            }
            ProofStatus::Valid => {}
        }

        let now = self.clock.now();
        let conflicts = self.peers.conflicts_with(&proof);

        if conflicts.is_empty() {
            return self.promote(proof, now);
        }

        if mode == RegistrationMode::Polite && self.config.cooldown_enabled() {
            for &peer_id in &conflicts {
                if let Some(peer) = self.peers.get(peer_id) {
                    if now < peer.next_possible_conflict_time {
                        return Err(RegistrationError::CooldownNotElapsed);
                    }
                }
            }
        }

        let beats_all = conflicts.iter().all(|&peer_id| {
            self.peers
                .get(peer_id)
                .is_some_and(|peer| is_preferred(&proof, &peer.proof))
        });

        if mode == RegistrationMode::ForceAccept
            || (self.config.enable_proof_replacement && beats_all)
        {
            for &peer_id in &conflicts {
                if let Some(old) = self.demote_peer(peer_id) {
                    match self.conflicting.add(ProofRef::clone(&old)) {
                        PoolAddOutcome::Added { .. } => {}
                        _ => debug!("replaced proof {} dropped entirely", old.id()),
                    }
                }
            }
            return self.promote(proof, now);
        }

        match self.conflicting.add(proof) {
            PoolAddOutcome::Added { evicted } => {
                let cooldown_until =
                    now.saturating_add(self.config.conflicting_proof_cooldown_secs);
                for &peer_id in &conflicts {
                    self.peers.stamp_conflict_time(peer_id, cooldown_until);
                }
                for old in evicted {
                    debug!("conflicting proof {} evicted by a preferred one", old.id());
                }
                Err(RegistrationError::Conflicting)
            }
            PoolAddOutcome::Refused => Err(RegistrationError::Rejected),
            PoolAddOutcome::Duplicate => Err(RegistrationError::AlreadyRegistered),
        }
    }

    /// Promotes a conflict-free valid proof to a peer: allocates the
    /// id, appends the slot range, stamps the cooldown, and drains
    /// pending nodes into bound ones (their stored request times are
    /// preserved).
    fn promote(&mut self, proof: ProofRef, now: u64) -> Result<PeerId, RegistrationError> {
        if self.peers.len() >= self.config.valid_pool_cap {
            match self.peers.lowest_score_peer() {
                Some((score, weakest)) if proof.score() > score => {
                    if let Some(dropped) = self.demote_peer(weakest) {
                        debug!("peer cap reached, dropped lowest-score proof {}", dropped.id());
                    }
                }
                _ => return Err(RegistrationError::Rejected),
            }
        }

        let proof_id = proof.id();
        let peer_id = self.peers.allocate_id();
        let slot_index = self.slots.append(proof.score(), peer_id);
        let pending = self.nodes.pending_node_ids(&proof_id);

        self.peers.insert(Peer {
            peer_id,
            proof,
            next_possible_conflict_time: now
                .saturating_add(self.config.conflicting_proof_cooldown_secs),
            slot_index,
            node_count: pending.len(),
        });

        for node_id in pending {
            self.nodes.set_bound(node_id, peer_id, now);
        }

        debug!("proof {} promoted to peer {}", proof_id, peer_id);
        Ok(peer_id)
    }

    /// Tears a peer down: slot freed or fragmented, nodes parked as
    /// pending against the proof id. Returns the proof.
    pub(crate) fn demote_peer(&mut self, peer_id: PeerId) -> Option<ProofRef> {
        let peer = self.peers.remove(peer_id)?;
        self.slots.remove(peer.slot_index);
        self.nodes.unbind_peer(peer_id, peer.proof_id());
        debug!("peer {} demoted, proof {}", peer_id, peer.proof_id());
        Some(peer.proof)
    }

    // ────────────────────────────────────────────────────────────────
    // REJECTION AND REMOVAL
    // ────────────────────────────────────────────────────────────────

    /// Rejects a tracked proof. Returns `false` if the id is unknown.
    ///
    /// A valid-pool rejection demotes the peer and re-registers the
    /// best conflicting-pool proof touching the freed stake, if any.
    /// `Invalidate` additionally blacklists the id against future
    /// registration.
    pub fn reject_proof(&mut self, proof_id: &ProofId, mode: RejectionMode) -> bool {
        if !self.exists(proof_id) {
            return false;
        }

        if mode == RejectionMode::Invalidate {
            self.invalidated.insert(*proof_id);
        }
        self.unbroadcast.remove(proof_id);

        if self.orphans.remove(proof_id).is_some() {
            return true;
        }
        if self.conflicting.remove(proof_id).is_some() {
            return true;
        }

        let Some(peer_id) = self.peers.peer_id_for_proof(proof_id) else {
            return false;
        };
        let Some(removed) = self.demote_peer(peer_id) else {
            return false;
        };

        let outpoints: Vec<Outpoint> =
            removed.stakes().iter().map(|stake| stake.outpoint).collect();
        self.promote_best_conflicting(&outpoints);
        true
    }

    /// Removes a peer outright, dropping its proof from the valid pool.
    /// Bound nodes become pending against the dropped proof id.
    pub fn remove_peer(&mut self, peer_id: PeerId) -> bool {
        match self.demote_peer(peer_id) {
            Some(proof) => {
                self.unbroadcast.remove(&proof.id());
                true
            }
            None => false,
        }
    }

    /// Pulls the best conflicting-pool proof touching `outpoints` and
    /// runs it through registration again. Used after the valid-pool
    /// owner of those outpoints went away. A promotion blocked only by
    /// another peer's cooldown re-parks the proof for a later attempt.
    pub(crate) fn promote_best_conflicting(&mut self, outpoints: &[Outpoint]) {
        let Some(best) = self.conflicting.best_for_outpoints(outpoints) else {
            return;
        };
        self.conflicting.remove(&best.id());
        let best_id = best.id();
        match self.register_proof(ProofRef::clone(&best), RegistrationMode::Polite) {
            Ok(peer_id) => debug!("conflicting proof {} promoted to peer {}", best_id, peer_id),
            Err(RegistrationError::CooldownNotElapsed) => {
                let _ = self.conflicting.add(best);
            }
            Err(err) => debug!("conflicting proof {} not promoted: {}", best_id, err),
        }
    }

    // ────────────────────────────────────────────────────────────────
    // NODES
    // ────────────────────────────────────────────────────────────────

    /// Points a node at a proof. Binds it when a peer for the proof
    /// exists, parks it as pending otherwise; an existing node is
    /// retargeted. Returns `true` iff the node ends up bound.
    pub fn add_node(&mut self, node_id: NodeId, proof_id: ProofId) -> bool {
        let now = self.clock.now();
        match self.peers.peer_id_for_proof(&proof_id) {
            Some(peer_id) => {
                let previous = self.nodes.set_bound(node_id, peer_id, now);
                match previous {
                    Some(NodeState::Bound(old_peer)) if old_peer == peer_id => {}
                    Some(NodeState::Bound(old_peer)) => {
                        self.adjust_node_count(old_peer, -1);
                        self.adjust_node_count(peer_id, 1);
                    }
                    Some(NodeState::Pending(_)) | None => self.adjust_node_count(peer_id, 1),
                }
                true
            }
            None => {
                let previous = self.nodes.set_pending(node_id, proof_id, now);
                if let Some(NodeState::Bound(old_peer)) = previous {
                    self.adjust_node_count(old_peer, -1);
                }
                false
            }
        }
    }

    /// Forgets a node. Returns `false` if it was not tracked.
    pub fn remove_node(&mut self, node_id: NodeId) -> bool {
        match self.nodes.remove(node_id) {
            Some(node) => {
                if let Some(peer_id) = node.peer_id() {
                    self.adjust_node_count(peer_id, -1);
                }
                true
            }
            None => false,
        }
    }

    /// Re-schedules a bound node. Fails for pending or unknown nodes.
    pub fn update_next_request_time(&mut self, node_id: NodeId, t: u64) -> bool {
        self.nodes.update_next_request_time(node_id, t)
    }

    /// Moves a peer's conflict-cooldown stamp strictly forward.
    pub fn update_next_possible_conflict_time(&mut self, peer_id: PeerId, t: u64) -> bool {
        self.peers.try_update_conflict_time(peer_id, t)
    }

    fn adjust_node_count(&mut self, peer_id: PeerId, delta: isize) {
        if let Some(peer) = self.peers.get_mut(peer_id) {
            peer.node_count = peer.node_count.saturating_add_signed(delta);
        }
    }

    // ────────────────────────────────────────────────────────────────
    // SELECTION
    // ────────────────────────────────────────────────────────────────

    /// Draws a peer with probability proportional to its score. `None`
    /// when no peer exists or every bounded draw hit a fragmentation
    /// gap.
    pub fn select_peer(&mut self) -> Option<PeerId> {
        let max = self.slots.slot_count();
        if max == 0 {
            return None;
        }
        for _ in 0..SELECT_PEER_MAX_RETRIES {
            let unit = self.rng.gen_range(0..max);
            if let Some(peer_id) = self.slots.select_at(unit) {
                return Some(peer_id);
            }
        }
        None
    }

    /// Draws a peer, then returns its earliest-requestable bound node
    /// if that node is due. A failed attempt latches
    /// [`PeerManager::should_request_more_nodes`].
    pub fn select_node(&mut self) -> Option<NodeId> {
        let now = self.clock.now();
        for _ in 0..SELECT_NODE_MAX_RETRIES {
            let Some(peer_id) = self.select_peer() else {
                continue;
            };
            if let Some((node_id, next_request_time)) = self.nodes.best_node_for_peer(peer_id) {
                if next_request_time <= now {
                    self.need_more_nodes = false;
                    return Some(node_id);
                }
            }
        }
        self.need_more_nodes = true;
        None
    }

    /// Consumes the more-nodes latch: `true` at most once after a
    /// failed selection, until the next failure re-arms it.
    pub fn should_request_more_nodes(&mut self) -> bool {
        std::mem::take(&mut self.need_more_nodes)
    }

    // ────────────────────────────────────────────────────────────────
    // QUERIES
    // ────────────────────────────────────────────────────────────────

    /// Whether the proof id is tracked in any pool.
    #[must_use]
    pub fn exists(&self, proof_id: &ProofId) -> bool {
        self.is_bound_to_peer(proof_id)
            || self.conflicting.contains(proof_id)
            || self.orphans.contains(proof_id)
    }

    /// Whether the proof backs a live peer.
    #[must_use]
    pub fn is_bound_to_peer(&self, proof_id: &ProofId) -> bool {
        self.peers.peer_id_for_proof(proof_id).is_some()
    }

    /// Whether the proof sits in the orphan pool.
    #[must_use]
    pub fn is_orphan(&self, proof_id: &ProofId) -> bool {
        self.orphans.contains(proof_id)
    }

    /// Whether the proof sits in the conflicting pool.
    #[must_use]
    pub fn is_in_conflicting_pool(&self, proof_id: &ProofId) -> bool {
        self.conflicting.contains(proof_id)
    }

    /// The tracked proof with this id, from whichever pool holds it.
    #[must_use]
    pub fn get_proof(&self, proof_id: &ProofId) -> Option<ProofRef> {
        if let Some(peer_id) = self.peers.peer_id_for_proof(proof_id) {
            return self.peers.get(peer_id).map(|peer| ProofRef::clone(&peer.proof));
        }
        self.conflicting
            .get(proof_id)
            .or_else(|| self.orphans.get(proof_id))
            .map(ProofRef::clone)
    }

    /// Total slot units in the sampler (live + fragmented).
    #[must_use]
    pub fn slot_count(&self) -> u64 {
        self.slots.slot_count()
    }

    /// Slot units currently lost to fragmentation.
    #[must_use]
    pub fn fragmentation(&self) -> u64 {
        self.slots.fragmentation()
    }

    /// Number of live peers.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Number of bound nodes.
    #[must_use]
    pub fn node_count(&self) -> u64 {
        self.nodes.bound_count() as u64
    }

    /// Number of pending nodes.
    #[must_use]
    pub fn pending_node_count(&self) -> u64 {
        self.nodes.pending_count() as u64
    }

    /// Number of conflicting-pool entries.
    #[must_use]
    pub fn conflicting_pool_size(&self) -> usize {
        self.conflicting.len()
    }

    /// Number of orphan-pool entries.
    #[must_use]
    pub fn orphan_pool_size(&self) -> usize {
        self.orphans.len()
    }

    // ────────────────────────────────────────────────────────────────
    // ITERATION HELPERS
    // ────────────────────────────────────────────────────────────────

    /// Applies a predicate to the peer backed by `proof_id`. Returns
    /// `false` when no such peer exists.
    pub fn for_peer(&self, proof_id: &ProofId, f: impl FnOnce(&Peer) -> bool) -> bool {
        self.peers
            .peer_id_for_proof(proof_id)
            .and_then(|peer_id| self.peers.get(peer_id))
            .map_or(false, f)
    }

    /// Visits every peer in descending score order.
    pub fn for_each_peer(&self, mut f: impl FnMut(&Peer)) {
        for peer in self.peers.iter_by_score_desc() {
            f(peer);
        }
    }

    /// Applies a predicate to a node row. Returns `false` when the
    /// node is not tracked.
    pub fn for_node(&self, node_id: NodeId, f: impl FnOnce(&Node) -> bool) -> bool {
        self.nodes.get(node_id).map_or(false, f)
    }

    /// Visits every node bound to `peer_id`, ordered by request time.
    pub fn for_each_node(&self, peer_id: PeerId, mut f: impl FnMut(&Node)) {
        for node_id in self.nodes.bound_node_ids(peer_id) {
            if let Some(node) = self.nodes.get(node_id) {
                f(node);
            }
        }
    }

    // ────────────────────────────────────────────────────────────────
    // RELAY SUPPORT
    // ────────────────────────────────────────────────────────────────

    /// Marks a tracked proof as awaiting its first announcement.
    pub fn add_unbroadcast_proof(&mut self, proof_id: ProofId) -> bool {
        if !self.exists(&proof_id) {
            return false;
        }
        self.unbroadcast.insert(proof_id)
    }

    /// Clears the unbroadcast mark, typically after relay.
    pub fn remove_unbroadcast_proof(&mut self, proof_id: &ProofId) -> bool {
        self.unbroadcast.remove(proof_id)
    }

    /// Ids still awaiting announcement, pruned to proofs that are
    /// still tracked.
    #[must_use]
    pub fn get_unbroadcast_proofs(&self) -> Vec<ProofId> {
        self.unbroadcast
            .iter()
            .filter(|proof_id| self.exists(proof_id))
            .copied()
            .collect()
    }

    // ────────────────────────────────────────────────────────────────
    // MAINTENANCE
    // ────────────────────────────────────────────────────────────────

    /// Rebuilds the slot array without gaps. Returns the slot units
    /// reclaimed. Peer ids and their relative order are preserved.
    pub fn compact(&mut self) -> u64 {
        let peers = &mut self.peers;
        let reclaimed = self.slots.compact(|peer_id, index| {
            if let Some(peer) = peers.get_mut(peer_id) {
                peer.slot_index = index;
            }
        });
        debug!("compaction reclaimed {} slot units", reclaimed);
        reclaimed
    }

    /// Full invariant check, intended for tests and debug assertions:
    /// component-level index consistency, pool disjointness, the
    /// peer ↔ slot bijection, node counts, and pending-target
    /// liveness. Returns `false` on the first violation.
    #[must_use]
    pub fn verify(&self) -> bool {
        if !(self.slots.verify()
            && self.peers.verify()
            && self.nodes.verify()
            && self.conflicting.verify()
            && self.orphans.verify())
        {
            return false;
        }

        // Pool disjointness over proof ids.
        for proof in self.conflicting.proofs_best_first() {
            if self.peers.peer_id_for_proof(&proof.id()).is_some()
                || self.orphans.contains(&proof.id())
            {
                return false;
            }
        }
        for proof in self.orphans.proofs_best_first() {
            if self.peers.peer_id_for_proof(&proof.id()).is_some() {
                return false;
            }
        }

        // Peer ↔ slot bijection and node accounting.
        let mut live_slots = 0usize;
        let mut checked = true;
        self.for_each_peer(|peer| {
            live_slots += 1;
            let slot_ok = self.slots.get(peer.slot_index).is_some_and(|slot| {
                slot.peer_id() == Some(peer.peer_id) && slot.score() == peer.score()
            });
            let nodes_ok = self.nodes.bound_node_ids(peer.peer_id).len() == peer.node_count;
            if !(slot_ok && nodes_ok) {
                checked = false;
            }
        });
        if !checked {
            return false;
        }
        let live_in_array = (0..self.slots.len())
            .filter_map(|i| self.slots.get(i))
            .filter(|slot| slot.peer_id().is_some())
            .count();
        if live_slots != live_in_array {
            return false;
        }

        // Bound nodes point at live peers; pending targets have none.
        let mut nodes_ok = true;
        let mut pending_targets: Vec<ProofId> = Vec::new();
        self.for_each_peer(|peer| {
            self.for_each_node(peer.peer_id, |node| {
                if node.peer_id() != Some(peer.peer_id) {
                    nodes_ok = false;
                }
            });
            pending_targets.push(peer.proof_id());
        });
        for proof_id in pending_targets {
            if !self.nodes.pending_node_ids(&proof_id).is_empty() {
                nodes_ok = false;
            }
        }
        nodes_ok
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════
