//! # Proof Pools
//!
//! Keyed storage for proofs that are known but not currently promoted
//! to peers: the *conflicting* pool (lost a stake conflict against a
//! valid proof) and the *orphan* pool (stake not visible on chain).
//! One [`ProofPool`] type serves both, differing only in eviction
//! policy.
//!
//! ## Intra-pool conflict resolution
//!
//! Each pool holds at most one proof per stake outpoint. An insertion
//! that shares an outpoint with stored entries resolves through the
//! conflict comparator: the candidate is refused if any stored rival is
//! preferred over it, and otherwise evicts every rival it beats. The
//! pools therefore never contain two proofs contesting the same stake.
//!
//! ## Size caps
//!
//! Pools are capped. When an insertion would overflow, the weakest
//! entry goes first: worst-by-comparator for the conflicting pool,
//! oldest-inserted for the orphan pool. A candidate that would itself
//! be the weakest under `WorstFirst` is refused outright.
//!
//! All decisions are made before any mutation; a refused insertion
//! leaves the pool untouched.

use std::collections::{BTreeMap, HashMap};

use avalanche_proof::{is_preferred, Outpoint, ProofId, ProofRank, ProofRef};

// ════════════════════════════════════════════════════════════════════════════════
// POLICY AND OUTCOME
// ════════════════════════════════════════════════════════════════════════════════

/// Which entry a full pool discards first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Discard the entry ranked worst by the conflict comparator.
    WorstFirst,
    /// Discard the entry inserted earliest.
    OldestFirst,
}

/// Result of [`ProofPool::add`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolAddOutcome {
    /// The proof was stored; `evicted` lists entries it displaced
    /// (conflict losers and cap victims).
    Added {
        /// Proofs removed to make room or resolve conflicts.
        evicted: Vec<ProofRef>,
    },
    /// The proof id is already present; nothing changed.
    Duplicate,
    /// The proof lost a conflict against a stored entry, or fell below
    /// the cap cut; nothing changed.
    Refused,
}

// ════════════════════════════════════════════════════════════════════════════════
// PROOF POOL
// ════════════════════════════════════════════════════════════════════════════════

struct PoolEntry {
    proof: ProofRef,
    rank: ProofRank,
    order: u64,
}

/// A capped, multi-indexed set of proofs.
pub struct ProofPool {
    policy: EvictionPolicy,
    cap: usize,
    next_order: u64,
    entries: HashMap<ProofId, PoolEntry>,
    by_outpoint: HashMap<Outpoint, ProofId>,
    by_rank: BTreeMap<ProofRank, ProofId>,
    by_order: BTreeMap<u64, ProofId>,
}

impl ProofPool {
    /// Creates an empty pool with the given policy and cap.
    #[must_use]
    pub fn new(policy: EvictionPolicy, cap: usize) -> Self {
        ProofPool {
            policy,
            cap,
            next_order: 0,
            entries: HashMap::new(),
            by_outpoint: HashMap::new(),
            by_rank: BTreeMap::new(),
            by_order: BTreeMap::new(),
        }
    }

    /// Number of stored proofs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `proof_id` is stored.
    #[must_use]
    pub fn contains(&self, proof_id: &ProofId) -> bool {
        self.entries.contains_key(proof_id)
    }

    /// The stored proof with this id.
    #[must_use]
    pub fn get(&self, proof_id: &ProofId) -> Option<&ProofRef> {
        self.entries.get(proof_id).map(|entry| &entry.proof)
    }

    /// Ids of stored proofs sharing at least one outpoint with `proof`,
    /// in stake order, deduplicated.
    #[must_use]
    pub fn conflicting_with(&self, proof: &ProofRef) -> Vec<ProofId> {
        let mut found = Vec::new();
        for stake in proof.stakes() {
            if let Some(id) = self.by_outpoint.get(&stake.outpoint) {
                if !found.contains(id) {
                    found.push(*id);
                }
            }
        }
        found
    }

    /// The best-ranked stored proof touching any of `outpoints`.
    #[must_use]
    pub fn best_for_outpoints(&self, outpoints: &[Outpoint]) -> Option<ProofRef> {
        let mut best: Option<&PoolEntry> = None;
        for outpoint in outpoints {
            if let Some(id) = self.by_outpoint.get(outpoint) {
                let entry = &self.entries[id];
                if best.map_or(true, |b| entry.rank > b.rank) {
                    best = Some(entry);
                }
            }
        }
        best.map(|entry| ProofRef::clone(&entry.proof))
    }

    /// Stored proofs, best-ranked first.
    #[must_use]
    pub fn proofs_best_first(&self) -> Vec<ProofRef> {
        self.by_rank
            .values()
            .rev()
            .map(|id| ProofRef::clone(&self.entries[id].proof))
            .collect()
    }

    /// Stored proofs, oldest insertion first.
    #[must_use]
    pub fn proofs_oldest_first(&self) -> Vec<ProofRef> {
        self.by_order
            .values()
            .map(|id| ProofRef::clone(&self.entries[id].proof))
            .collect()
    }

    /// Inserts `proof`, resolving intra-pool conflicts and the size cap
    /// as described in the module docs.
    pub fn add(&mut self, proof: ProofRef) -> PoolAddOutcome {
        let proof_id = proof.id();
        if self.entries.contains_key(&proof_id) {
            return PoolAddOutcome::Duplicate;
        }

        // Phase 1: decide. Conflict losers are mandatory victims; the
        // candidate is refused if any rival out-ranks it.
        let mut victims = self.conflicting_with(&proof);
        for rival in &victims {
            if !is_preferred(&proof, &self.entries[rival].proof) {
                return PoolAddOutcome::Refused;
            }
        }

        // Cap planning over the entries that would remain.
        let candidate_rank = ProofRank::of(&proof);
        let mut projected = self.entries.len() - victims.len();
        while projected >= self.cap {
            let weakest = match self.policy {
                EvictionPolicy::WorstFirst => self
                    .by_rank
                    .iter()
                    .map(|(rank, id)| (rank.clone(), *id))
                    .find(|(_, id)| !victims.contains(id)),
                EvictionPolicy::OldestFirst => self
                    .by_order
                    .values()
                    .find(|&id| !victims.contains(id))
                    .map(|id| (self.entries[id].rank.clone(), *id)),
            };
            let Some((rank, id)) = weakest else {
                // cap of zero, or nothing left to evict
                return PoolAddOutcome::Refused;
            };
            if self.policy == EvictionPolicy::WorstFirst && rank > candidate_rank {
                return PoolAddOutcome::Refused;
            }
            victims.push(id);
            projected -= 1;
        }

        // Phase 2: commit.
        let evicted: Vec<ProofRef> = victims
            .iter()
            .filter_map(|id| self.remove(id))
            .collect();

        let order = self.next_order;
        self.next_order += 1;
        for stake in proof.stakes() {
            self.by_outpoint.insert(stake.outpoint, proof_id);
        }
        self.by_rank.insert(candidate_rank.clone(), proof_id);
        self.by_order.insert(order, proof_id);
        self.entries.insert(
            proof_id,
            PoolEntry {
                proof,
                rank: candidate_rank,
                order,
            },
        );

        PoolAddOutcome::Added { evicted }
    }

    /// Removes and returns the proof with this id.
    pub fn remove(&mut self, proof_id: &ProofId) -> Option<ProofRef> {
        let entry = self.entries.remove(proof_id)?;
        for stake in entry.proof.stakes() {
            if self.by_outpoint.get(&stake.outpoint) == Some(proof_id) {
                self.by_outpoint.remove(&stake.outpoint);
            }
        }
        self.by_rank.remove(&entry.rank);
        self.by_order.remove(&entry.order);
        Some(entry.proof)
    }

    /// Checks internal index consistency.
    #[must_use]
    pub fn verify(&self) -> bool {
        if self.by_rank.len() != self.entries.len() || self.by_order.len() != self.entries.len() {
            return false;
        }

        let mut outpoints = 0usize;
        for (id, entry) in &self.entries {
            if entry.proof.id() != *id {
                return false;
            }
            for stake in entry.proof.stakes() {
                if self.by_outpoint.get(&stake.outpoint) != Some(id) {
                    return false;
                }
                outpoints += 1;
            }
            if self.by_rank.get(&entry.rank) != Some(id)
                || self.by_order.get(&entry.order) != Some(id)
            {
                return false;
            }
        }

        outpoints == self.by_outpoint.len()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════
