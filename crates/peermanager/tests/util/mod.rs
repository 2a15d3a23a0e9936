//! Shared helpers for the peer manager integration tests: a harness
//! with pinned clock and seeded RNG, coin plumbing for the in-memory
//! UTXO set, and proof builders.

#![allow(dead_code)]

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use avalanche_peermanager::{
    MockTime, NodeId, PeerId, PeerManager, PeerManagerConfig, RegistrationMode, TimeSource,
};
use avalanche_proof::{
    Coin, InMemoryUtxoSet, Outpoint, Proof, ProofRef, Stake, TxId, UtxoView, SCORE_UNIT,
};

/// Height every test coin and stake claims.
pub const HEIGHT: u32 = 100;

/// Where the mock clock starts.
pub const START_TIME: u64 = 1_000;

pub struct Harness {
    pub pm: PeerManager,
    pub utxos: Arc<InMemoryUtxoSet>,
    pub clock: Arc<MockTime>,
}

/// Config with the conflict cooldown disabled, the common test setup.
pub fn no_cooldown() -> PeerManagerConfig {
    PeerManagerConfig {
        conflicting_proof_cooldown_secs: 0,
        ..PeerManagerConfig::default()
    }
}

pub fn harness_with(config: PeerManagerConfig, seed: u64) -> Harness {
    let utxos = Arc::new(InMemoryUtxoSet::new());
    let clock = Arc::new(MockTime::new(START_TIME));
    let pm = PeerManager::with_dependencies(
        config,
        Arc::clone(&utxos) as Arc<dyn UtxoView>,
        Arc::clone(&clock) as Arc<dyn TimeSource>,
        Box::new(ChaCha20Rng::seed_from_u64(seed)),
    );
    Harness { pm, utxos, clock }
}

pub fn harness() -> Harness {
    harness_with(no_cooldown(), 0xA11CE)
}

/// A distinct outpoint per tag.
pub fn outpoint(tag: u64) -> Outpoint {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&tag.to_le_bytes());
    bytes[31] = 0xA5;
    Outpoint::new(TxId::new(bytes), 0)
}

pub fn add_coin(utxos: &InMemoryUtxoSet, op: Outpoint, amount: u64) {
    utxos.add_coin(op, Coin::new(amount, HEIGHT, false));
}

/// Builds a proof staking the given `(outpoint, amount)` pairs.
pub fn proof_with(sequence: u64, master_tag: u8, stakes: &[(Outpoint, u64)]) -> ProofRef {
    let stakes = stakes
        .iter()
        .map(|&(outpoint, amount)| Stake {
            outpoint,
            amount,
            height: HEIGHT,
            is_coinbase: false,
            pubkey: [0xEE; 32],
        })
        .collect();
    Proof::new_ref(sequence, [master_tag; 32], stakes)
}

/// Builds a proof of the requested score on a fresh outpoint and backs
/// it with a coin, so registration promotes it straight to a peer.
pub fn staked_proof(utxos: &InMemoryUtxoSet, tag: u64, score: u32) -> ProofRef {
    let op = outpoint(tag);
    let amount = u64::from(score) * SCORE_UNIT;
    add_coin(utxos, op, amount);
    proof_with(0, (tag % 250) as u8 + 1, &[(op, amount)])
}

/// The peer id currently bound to this proof, if any.
pub fn peer_id_of(pm: &PeerManager, proof: &ProofRef) -> Option<PeerId> {
    let mut found = None;
    pm.for_peer(&proof.id(), |peer| {
        found = Some(peer.peer_id);
        true
    });
    found
}

/// Registers (politely, result ignored) and reports the bound peer id.
pub fn register_and_get_peer_id(pm: &mut PeerManager, proof: &ProofRef) -> Option<PeerId> {
    let _ = pm.register_proof(ProofRef::clone(proof), RegistrationMode::Polite);
    peer_id_of(pm, proof)
}

pub fn is_node_pending(pm: &PeerManager, node_id: NodeId) -> bool {
    pm.for_node(node_id, |node| !node.is_bound())
}

pub fn node_belongs_to_peer(pm: &PeerManager, node_id: NodeId, peer_id: PeerId) -> bool {
    pm.for_node(node_id, |node| node.peer_id() == Some(peer_id))
}
