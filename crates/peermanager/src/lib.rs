//! # Avalanche Peer Manager
//!
//! In-memory registry of stake proofs and the network nodes that vote
//! on their behalf. The manager admits proofs, resolves stake
//! conflicts, tracks proofs whose stake is not yet visible on chain,
//! and performs stake-weighted random selection of the node to query
//! next. It is the decision engine of the Sybil-resistant voting layer.
//!
//! ## Components
//!
//! | Type | Module | Purpose |
//! |------|--------|---------|
//! | `Slot`, `SlotArray`, `select_peer_impl` | `slots` | Stake-weighted sampler over `[start, stop)` slot ranges |
//! | `ProofPool` | `pool` | Capped conflicting/orphan pools with comparator eviction |
//! | `Peer`, `PeerSet` | `peers` | Valid pool: accepted proofs promoted to dense peer ids |
//! | `Node`, `NodeSet` | `nodes` | Bound and pending node sub-tables |
//! | `PeerManager` | `manager` | The façade: register, reject, select, compact, verify |
//! | chain listener | `listener` | `updated_block_tip` rescan to a fixed point |
//! | `SharedPeerManager` | `shared` | Single-writer / multi-reader section |
//! | `PeerManagerConfig` | `config` | Cooldown, replacement, pool caps |
//! | `TimeSource`, `MockTime` | `time` | Injected monotone clock |
//!
//! ## Lifecycle
//!
//! ```text
//! (submit) ─→ validator ─→ VALID     ─→ valid pool + peer + slots
//!                        ├→ CONFLICT ─→ conflicting pool (may later swap)
//!                        ├→ NEEDS_UTXO ─→ orphan pool
//!                        └→ INVALID  ─→ rejected, not stored
//! UTXO tip change ─→ rescan: promote / demote across pools.
//! ```
//!
//! ## Concurrency
//!
//! The manager itself is single-threaded state; [`SharedPeerManager`]
//! wraps it in the exclusive-section idiom the embedding node uses. No
//! operation blocks, suspends, or performs I/O. Clock and randomness
//! are injected so behavior is fully deterministic under test.

pub mod config;
pub mod listener;
pub mod manager;
pub mod nodes;
pub mod peers;
pub mod pool;
pub mod shared;
pub mod slots;
pub mod time;

pub use config::PeerManagerConfig;
pub use manager::{PeerManager, RegistrationError, RegistrationMode, RejectionMode};
pub use nodes::{Node, NodeId, NodeState};
pub use peers::Peer;
pub use shared::SharedPeerManager;
pub use slots::{select_peer_impl, PeerId, Slot};
pub use time::{MockTime, SystemTimeSource, TimeSource};
