//! # Node Table
//!
//! Network nodes that vote on behalf of a proof. A node is either
//! *bound* to a live peer or *pending* against a proof id the registry
//! does not (yet) have a peer for; never both. One row per node holds
//! its state and its `next_request_time`, so the request schedule
//! survives a peer being torn down and rebuilt (the row just moves
//! between the bound and pending sub-tables).
//!
//! Selection support: bound nodes are indexed by
//! `(peer_id, next_request_time, node_id)`, so the earliest-requestable
//! node of a peer is a range lookup. Pending nodes are indexed by their
//! target proof id for bulk drain on promotion.

use std::collections::{BTreeSet, HashMap};

use avalanche_proof::ProofId;

use crate::slots::PeerId;

/// Externally assigned network node handle.
pub type NodeId = u64;

// ════════════════════════════════════════════════════════════════════════════════
// NODE
// ════════════════════════════════════════════════════════════════════════════════

/// Which sub-table a node lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    /// Bound to a live peer.
    Bound(PeerId),
    /// Waiting for a peer to appear for this proof id.
    Pending(ProofId),
}

/// One tracked node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    /// The node's network handle.
    pub node_id: NodeId,
    /// Bound or pending state.
    pub state: NodeState,
    /// Earliest time this node should be queried again.
    pub next_request_time: u64,
}

impl Node {
    /// The bound peer, if any.
    #[must_use]
    pub fn peer_id(&self) -> Option<PeerId> {
        match self.state {
            NodeState::Bound(peer_id) => Some(peer_id),
            NodeState::Pending(_) => None,
        }
    }

    /// The pending target proof, if any.
    #[must_use]
    pub fn pending_target(&self) -> Option<ProofId> {
        match self.state {
            NodeState::Bound(_) => None,
            NodeState::Pending(proof_id) => Some(proof_id),
        }
    }

    /// Whether the node is bound to a peer.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        matches!(self.state, NodeState::Bound(_))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// NODE SET
// ════════════════════════════════════════════════════════════════════════════════

/// The node table: bound and pending sub-tables over one row store.
#[derive(Default)]
pub struct NodeSet {
    nodes: HashMap<NodeId, Node>,
    bound_index: BTreeSet<(PeerId, u64, NodeId)>,
    pending_by_proof: HashMap<ProofId, BTreeSet<NodeId>>,
    bound_count: usize,
}

impl NodeSet {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The row for this node.
    #[must_use]
    pub fn get(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Number of bound nodes.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.bound_count
    }

    /// Number of pending nodes.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.nodes.len() - self.bound_count
    }

    fn detach(&mut self, node: &Node) {
        match node.state {
            NodeState::Bound(peer_id) => {
                self.bound_index
                    .remove(&(peer_id, node.next_request_time, node.node_id));
                self.bound_count -= 1;
            }
            NodeState::Pending(proof_id) => {
                if let Some(set) = self.pending_by_proof.get_mut(&proof_id) {
                    set.remove(&node.node_id);
                    if set.is_empty() {
                        self.pending_by_proof.remove(&proof_id);
                    }
                }
            }
        }
    }

    fn attach(&mut self, node: &Node) {
        match node.state {
            NodeState::Bound(peer_id) => {
                self.bound_index
                    .insert((peer_id, node.next_request_time, node.node_id));
                self.bound_count += 1;
            }
            NodeState::Pending(proof_id) => {
                self.pending_by_proof
                    .entry(proof_id)
                    .or_default()
                    .insert(node.node_id);
            }
        }
    }

    fn set_state(&mut self, node_id: NodeId, state: NodeState, default_nrt: u64) -> Option<NodeState> {
        match self.nodes.get(&node_id).copied() {
            Some(old) => {
                self.detach(&old);
                let updated = Node { state, ..old };
                self.attach(&updated);
                self.nodes.insert(node_id, updated);
                Some(old.state)
            }
            None => {
                let fresh = Node {
                    node_id,
                    state,
                    next_request_time: default_nrt,
                };
                self.attach(&fresh);
                self.nodes.insert(node_id, fresh);
                None
            }
        }
    }

    /// Binds a node to a peer, creating the row with
    /// `next_request_time = default_nrt` if the node is new and keeping
    /// the stored time otherwise. Returns the previous state.
    pub(crate) fn set_bound(
        &mut self,
        node_id: NodeId,
        peer_id: PeerId,
        default_nrt: u64,
    ) -> Option<NodeState> {
        self.set_state(node_id, NodeState::Bound(peer_id), default_nrt)
    }

    /// Parks a node as pending against `proof_id`; same row semantics
    /// as [`NodeSet::set_bound`].
    pub(crate) fn set_pending(
        &mut self,
        node_id: NodeId,
        proof_id: ProofId,
        default_nrt: u64,
    ) -> Option<NodeState> {
        self.set_state(node_id, NodeState::Pending(proof_id), default_nrt)
    }

    /// Deletes a node from whichever sub-table holds it.
    pub(crate) fn remove(&mut self, node_id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&node_id)?;
        self.detach(&node);
        Some(node)
    }

    /// Re-keys a bound node's request time. Fails for pending or
    /// unknown nodes.
    pub(crate) fn update_next_request_time(&mut self, node_id: NodeId, t: u64) -> bool {
        let Some(node) = self.nodes.get(&node_id).copied() else {
            return false;
        };
        let NodeState::Bound(peer_id) = node.state else {
            return false;
        };

        self.bound_index
            .remove(&(peer_id, node.next_request_time, node_id));
        self.bound_index.insert((peer_id, t, node_id));
        self.nodes.insert(
            node_id,
            Node {
                next_request_time: t,
                ..node
            },
        );
        true
    }

    /// The bound node of `peer_id` with the smallest request time.
    #[must_use]
    pub fn best_node_for_peer(&self, peer_id: PeerId) -> Option<(NodeId, u64)> {
        self.bound_index
            .range((peer_id, u64::MIN, NodeId::MIN)..=(peer_id, u64::MAX, NodeId::MAX))
            .next()
            .map(|&(_, nrt, node_id)| (node_id, nrt))
    }

    /// Ids of nodes pending against `proof_id`, ascending.
    #[must_use]
    pub fn pending_node_ids(&self, proof_id: &ProofId) -> Vec<NodeId> {
        self.pending_by_proof
            .get(proof_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Ids of nodes bound to `peer_id`, ascending by request time.
    #[must_use]
    pub fn bound_node_ids(&self, peer_id: PeerId) -> Vec<NodeId> {
        self.bound_index
            .range((peer_id, u64::MIN, NodeId::MIN)..=(peer_id, u64::MAX, NodeId::MAX))
            .map(|&(_, _, node_id)| node_id)
            .collect()
    }

    /// Turns every node bound to `peer_id` into a pending node against
    /// `proof_id`, preserving each node's request time. Returns how
    /// many nodes moved.
    pub(crate) fn unbind_peer(&mut self, peer_id: PeerId, proof_id: ProofId) -> usize {
        let ids = self.bound_node_ids(peer_id);
        for &node_id in &ids {
            self.set_pending(node_id, proof_id, 0);
        }
        ids.len()
    }

    /// Checks row/index consistency.
    #[must_use]
    pub fn verify(&self) -> bool {
        let mut bound = 0usize;
        let mut pending = 0usize;
        for (id, node) in &self.nodes {
            if node.node_id != *id {
                return false;
            }
            match node.state {
                NodeState::Bound(peer_id) => {
                    bound += 1;
                    if !self
                        .bound_index
                        .contains(&(peer_id, node.next_request_time, *id))
                    {
                        return false;
                    }
                }
                NodeState::Pending(proof_id) => {
                    pending += 1;
                    if !self
                        .pending_by_proof
                        .get(&proof_id)
                        .is_some_and(|set| set.contains(id))
                    {
                        return false;
                    }
                }
            }
        }

        bound == self.bound_count
            && bound == self.bound_index.len()
            && pending == self.pending_by_proof.values().map(BTreeSet::len).sum::<usize>()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn proof_id(byte: u8) -> ProofId {
        ProofId::new([byte; 32])
    }

    #[test]
    fn test_new_node_bound_with_default_time() {
        let mut set = NodeSet::new();
        assert_eq!(set.set_bound(7, 0, 1_000), None);
        assert_eq!(set.bound_count(), 1);
        assert_eq!(set.pending_count(), 0);

        let node = set.get(7).expect("row");
        assert_eq!(node.state, NodeState::Bound(0));
        assert_eq!(node.next_request_time, 1_000);
        assert!(set.verify());
    }

    #[test]
    fn test_new_node_pending() {
        let mut set = NodeSet::new();
        assert_eq!(set.set_pending(7, proof_id(1), 1_000), None);
        assert_eq!(set.bound_count(), 0);
        assert_eq!(set.pending_count(), 1);
        assert_eq!(set.pending_node_ids(&proof_id(1)), vec![7]);
        assert!(set.verify());
    }

    #[test]
    fn test_rebind_preserves_request_time() {
        let mut set = NodeSet::new();
        set.set_bound(7, 0, 1_000);
        set.update_next_request_time(7, 5_000);

        // Bound → pending → bound again; stored time survives.
        assert_eq!(set.set_pending(7, proof_id(1), 0), Some(NodeState::Bound(0)));
        assert_eq!(set.get(7).expect("row").next_request_time, 5_000);

        assert_eq!(
            set.set_bound(7, 3, 0),
            Some(NodeState::Pending(proof_id(1)))
        );
        assert_eq!(set.get(7).expect("row").next_request_time, 5_000);
        assert!(set.pending_node_ids(&proof_id(1)).is_empty());
        assert!(set.verify());
    }

    #[test]
    fn test_retarget_pending() {
        let mut set = NodeSet::new();
        set.set_pending(7, proof_id(1), 0);
        assert_eq!(
            set.set_pending(7, proof_id(2), 0),
            Some(NodeState::Pending(proof_id(1)))
        );
        assert!(set.pending_node_ids(&proof_id(1)).is_empty());
        assert_eq!(set.pending_node_ids(&proof_id(2)), vec![7]);
        assert!(set.verify());
    }

    #[test]
    fn test_remove_from_either_table() {
        let mut set = NodeSet::new();
        set.set_bound(1, 0, 0);
        set.set_pending(2, proof_id(1), 0);

        assert!(set.remove(1).is_some());
        assert!(set.remove(2).is_some());
        assert!(set.remove(3).is_none());
        assert_eq!(set.bound_count(), 0);
        assert_eq!(set.pending_count(), 0);
        assert!(set.verify());
    }

    #[test]
    fn test_update_next_request_time_bound_only() {
        let mut set = NodeSet::new();
        set.set_bound(1, 0, 10);
        set.set_pending(2, proof_id(1), 10);

        assert!(set.update_next_request_time(1, 99));
        assert_eq!(set.get(1).expect("row").next_request_time, 99);
        assert!(!set.update_next_request_time(2, 99));
        assert!(!set.update_next_request_time(3, 99));
        assert!(set.verify());
    }

    #[test]
    fn test_best_node_orders_by_time() {
        let mut set = NodeSet::new();
        set.set_bound(1, 0, 50);
        set.set_bound(2, 0, 10);
        set.set_bound(3, 0, 30);
        set.set_bound(4, 1, 1);

        assert_eq!(set.best_node_for_peer(0), Some((2, 10)));
        set.update_next_request_time(2, 100);
        assert_eq!(set.best_node_for_peer(0), Some((3, 30)));
        assert_eq!(set.best_node_for_peer(1), Some((4, 1)));
        assert_eq!(set.best_node_for_peer(9), None);
    }

    #[test]
    fn test_unbind_peer_moves_all_nodes() {
        let mut set = NodeSet::new();
        for id in 0..5 {
            set.set_bound(id, 2, id * 10);
        }
        set.set_bound(9, 3, 0);

        assert_eq!(set.unbind_peer(2, proof_id(7)), 5);
        assert_eq!(set.bound_count(), 1);
        assert_eq!(set.pending_count(), 5);
        assert_eq!(set.pending_node_ids(&proof_id(7)), vec![0, 1, 2, 3, 4]);
        // Request times preserved through the unbind.
        assert_eq!(set.get(3).expect("row").next_request_time, 30);
        assert!(set.verify());
    }

    #[test]
    fn test_bound_node_ids_scoped_to_peer() {
        let mut set = NodeSet::new();
        set.set_bound(1, 0, 5);
        set.set_bound(2, 1, 5);
        set.set_bound(3, 0, 1);
        assert_eq!(set.bound_node_ids(0), vec![3, 1]);
        assert_eq!(set.bound_node_ids(1), vec![2]);
    }
}
