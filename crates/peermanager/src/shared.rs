//! # Shared Access
//!
//! The embedding node runs the peer manager under a single-writer /
//! multi-reader discipline: every mutation happens inside one exclusive
//! section, read-only closures run under a shared section, and nothing
//! suspends while a section is held. [`SharedPeerManager`] packages
//! that contract around `parking_lot::RwLock` so call sites cannot
//! forget it.
//!
//! The closures must not call back into the same [`SharedPeerManager`];
//! the lock is not reentrant.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::manager::PeerManager;

/// Cloneable handle running closures against the shared peer manager.
#[derive(Clone)]
pub struct SharedPeerManager {
    inner: Arc<RwLock<PeerManager>>,
}

impl SharedPeerManager {
    /// Wraps a manager for shared use.
    #[must_use]
    pub fn new(manager: PeerManager) -> Self {
        SharedPeerManager {
            inner: Arc::new(RwLock::new(manager)),
        }
    }

    /// Runs `f` inside the exclusive section. All mutation goes through
    /// here.
    pub fn with_peer_manager<R>(&self, f: impl FnOnce(&mut PeerManager) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Runs `f` under the shared section. `f` must not mutate
    /// observable state; the type system enforces it.
    pub fn read<R>(&self, f: impl FnOnce(&PeerManager) -> R) -> R {
        f(&self.inner.read())
    }
}
