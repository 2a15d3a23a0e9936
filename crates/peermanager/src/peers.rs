//! # Peer Table
//!
//! Accepted proofs promoted to peers — the *valid pool*. Each peer owns
//! a dense [`PeerId`], a contiguous slot range in the sampler, a count
//! of bound nodes, and the cooldown stamp protecting it from rapid-fire
//! conflicting registrations.
//!
//! [`PeerSet`] keeps the primary map by peer id plus three secondary
//! indexes maintained atomically with it: proof id → peer id, stake
//! outpoint → proof id (stake uniqueness across the valid pool), and a
//! score-ordered index for descending-score iteration. Freed peer ids
//! go on a free-list and are reused before fresh ids, keeping the id
//! space dense for the sampler.

use std::collections::{BTreeSet, HashMap};

use avalanche_proof::{Outpoint, ProofId, ProofRef};

use crate::slots::PeerId;

// ════════════════════════════════════════════════════════════════════════════════
// PEER
// ════════════════════════════════════════════════════════════════════════════════

/// A live peer: an accepted proof plus its sampling and cooldown state.
#[derive(Clone, Debug)]
pub struct Peer {
    /// Dense identifier, stable while the peer lives.
    pub peer_id: PeerId,
    /// The accepted proof backing this peer.
    pub proof: ProofRef,
    /// Earliest time a conflicting proof against this peer may be
    /// accepted again.
    pub next_possible_conflict_time: u64,
    pub(crate) slot_index: usize,
    pub(crate) node_count: usize,
}

impl Peer {
    /// The proof's content hash.
    #[must_use]
    pub fn proof_id(&self) -> ProofId {
        self.proof.id()
    }

    /// Sampling weight, copied from the proof.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.proof.score()
    }

    /// Number of nodes currently bound to this peer.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// PEER SET
// ════════════════════════════════════════════════════════════════════════════════

/// The valid pool: peers indexed by id, proof id, stake outpoint, and
/// score.
#[derive(Default)]
pub struct PeerSet {
    peers: HashMap<PeerId, Peer>,
    by_proof: HashMap<ProofId, PeerId>,
    by_outpoint: HashMap<Outpoint, ProofId>,
    by_score: BTreeSet<(u32, PeerId)>,
    free_ids: Vec<PeerId>,
    next_id: PeerId,
}

impl PeerSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether no peer is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// The peer with this id.
    #[must_use]
    pub fn get(&self, peer_id: PeerId) -> Option<&Peer> {
        self.peers.get(&peer_id)
    }

    /// Whether a peer with this id is live.
    #[must_use]
    pub fn contains_peer(&self, peer_id: PeerId) -> bool {
        self.peers.contains_key(&peer_id)
    }

    /// The peer id bound to this proof, if the proof is in the valid
    /// pool.
    #[must_use]
    pub fn peer_id_for_proof(&self, proof_id: &ProofId) -> Option<PeerId> {
        self.by_proof.get(proof_id).copied()
    }

    /// The valid-pool proof owning this outpoint, if any.
    #[must_use]
    pub fn proof_for_outpoint(&self, outpoint: &Outpoint) -> Option<ProofId> {
        self.by_outpoint.get(outpoint).copied()
    }

    /// Peer ids whose proofs share at least one stake outpoint with
    /// `proof`, in stake order, deduplicated.
    #[must_use]
    pub fn conflicts_with(&self, proof: &ProofRef) -> Vec<PeerId> {
        let mut found = Vec::new();
        for stake in proof.stakes() {
            if let Some(proof_id) = self.by_outpoint.get(&stake.outpoint) {
                if let Some(peer_id) = self.by_proof.get(proof_id) {
                    if !found.contains(peer_id) {
                        found.push(*peer_id);
                    }
                }
            }
        }
        found
    }

    /// The live peer with the lowest score, preferring the smaller id
    /// among equals. Used for valid-pool cap eviction.
    #[must_use]
    pub fn lowest_score_peer(&self) -> Option<(u32, PeerId)> {
        self.by_score.iter().next().copied()
    }

    /// Iterates peers by descending score.
    pub fn iter_by_score_desc(&self) -> impl Iterator<Item = &Peer> {
        self.by_score
            .iter()
            .rev()
            .filter_map(move |&(_, peer_id)| self.peers.get(&peer_id))
    }

    /// Allocates a peer id, reusing freed ids before minting new ones.
    pub(crate) fn allocate_id(&mut self) -> PeerId {
        if let Some(id) = self.free_ids.pop() {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Inserts a fully built peer, wiring every index.
    ///
    /// The caller guarantees id/proof uniqueness and outpoint
    /// disjointness (the façade resolves conflicts before promotion);
    /// [`PeerSet::verify`] checks it after the fact.
    pub(crate) fn insert(&mut self, peer: Peer) {
        let peer_id = peer.peer_id;
        let proof_id = peer.proof_id();
        self.by_proof.insert(proof_id, peer_id);
        for stake in peer.proof.stakes() {
            self.by_outpoint.insert(stake.outpoint, proof_id);
        }
        self.by_score.insert((peer.score(), peer_id));
        self.peers.insert(peer_id, peer);
    }

    /// Removes a peer, unwires every index, and recycles its id.
    pub(crate) fn remove(&mut self, peer_id: PeerId) -> Option<Peer> {
        let peer = self.peers.remove(&peer_id)?;
        self.by_proof.remove(&peer.proof_id());
        for stake in peer.proof.stakes() {
            if self.by_outpoint.get(&stake.outpoint) == Some(&peer.proof_id()) {
                self.by_outpoint.remove(&stake.outpoint);
            }
        }
        self.by_score.remove(&(peer.score(), peer_id));
        self.free_ids.push(peer_id);
        Some(peer)
    }

    pub(crate) fn get_mut(&mut self, peer_id: PeerId) -> Option<&mut Peer> {
        self.peers.get_mut(&peer_id)
    }

    /// Moves the cooldown stamp forward; fails unless `t` is strictly
    /// later than the current stamp.
    pub(crate) fn try_update_conflict_time(&mut self, peer_id: PeerId, t: u64) -> bool {
        match self.peers.get_mut(&peer_id) {
            Some(peer) if t > peer.next_possible_conflict_time => {
                peer.next_possible_conflict_time = t;
                true
            }
            _ => false,
        }
    }

    /// Unconditionally restamps the cooldown (internal resets on
    /// accepted conflicts).
    pub(crate) fn stamp_conflict_time(&mut self, peer_id: PeerId, t: u64) {
        if let Some(peer) = self.peers.get_mut(&peer_id) {
            peer.next_possible_conflict_time = peer.next_possible_conflict_time.max(t);
        }
    }

    /// Checks index consistency.
    #[must_use]
    pub fn verify(&self) -> bool {
        if self.by_proof.len() != self.peers.len() || self.by_score.len() != self.peers.len() {
            return false;
        }

        let mut outpoints = 0usize;
        for (id, peer) in &self.peers {
            if peer.peer_id != *id {
                return false;
            }
            if self.by_proof.get(&peer.proof_id()) != Some(id) {
                return false;
            }
            if !self.by_score.contains(&(peer.score(), *id)) {
                return false;
            }
            for stake in peer.proof.stakes() {
                if self.by_outpoint.get(&stake.outpoint) != Some(&peer.proof_id()) {
                    return false;
                }
                outpoints += 1;
            }
        }

        outpoints == self.by_outpoint.len()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════
