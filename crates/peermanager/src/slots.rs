//! # Slot Sampler
//!
//! Stake-weighted random selection works over an ordered array of
//! non-overlapping slots. Each live slot maps the half-open interval
//! `[start, stop)` of slot units to a peer; drawing a uniform value in
//! `[0, slot_count)` and binary-searching the array yields a peer with
//! probability proportional to its score.
//!
//! Removing a peer does not shift the array. The removed slot keeps its
//! extent but loses its peer — a *gap*. Draws landing in a gap select
//! nobody, and the gap's score is accounted as *fragmentation* until
//! [`SlotArray::compact`] rebuilds the array. Removing the tail slot
//! instead shrinks the array, since nothing follows it.
//!
//! Invariants after every mutation:
//!
//! - `slots[i].stop() <= slots[i + 1].start()` (sorted, disjoint),
//! - `slot_count == slots.last().stop()` (or 0 when empty),
//! - `sum(score over live slots) + fragmentation == slot_count`.

use serde::{Deserialize, Serialize};

/// Dense peer identifier. Ids are small integers reused via a
/// free-list, so the id space stays compact for the sampler.
pub type PeerId = u32;

// ════════════════════════════════════════════════════════════════════════════════
// SLOT
// ════════════════════════════════════════════════════════════════════════════════

/// One interval `[start, start + score)` of the sampling space.
///
/// A slot with no peer is a fragmentation gap: it keeps its extent so
/// the array stays ordered, but selection ignores it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    start: u64,
    score: u32,
    peer_id: Option<PeerId>,
}

impl Slot {
    /// Builds a live slot.
    #[must_use]
    pub const fn new(start: u64, score: u32, peer_id: PeerId) -> Self {
        Slot {
            start,
            score,
            peer_id: Some(peer_id),
        }
    }

    /// First slot unit covered.
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Number of slot units covered.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// One past the last slot unit covered.
    #[must_use]
    pub const fn stop(&self) -> u64 {
        self.start + self.score as u64
    }

    /// The owning peer, `None` for a gap.
    #[must_use]
    pub const fn peer_id(&self) -> Option<PeerId> {
        self.peer_id
    }

    /// Whether `unit` falls inside this slot's interval.
    #[must_use]
    pub const fn contains(&self, unit: u64) -> bool {
        self.start <= unit && unit < self.stop()
    }

    /// Copy with a different score.
    #[must_use]
    pub const fn with_score(self, score: u32) -> Self {
        Slot { score, ..self }
    }

    /// Copy with a different start.
    #[must_use]
    pub const fn with_start(self, start: u64) -> Self {
        Slot { start, ..self }
    }

    const fn into_gap(self) -> Self {
        Slot {
            peer_id: None,
            ..self
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// SELECTION
// ════════════════════════════════════════════════════════════════════════════════

/// Maps a uniform draw `unit ∈ [0, max)` to the peer whose slot covers
/// it, or `None` when the draw lands before the first slot, in a gap
/// between or inside slots, or at/after `max`.
///
/// O(log n) binary search over the sorted slot array.
#[must_use]
pub fn select_peer_impl(slots: &[Slot], unit: u64, max: u64) -> Option<PeerId> {
    if unit >= max {
        return None;
    }

    let after = slots.partition_point(|slot| slot.start() <= unit);
    if after == 0 {
        return None;
    }

    let slot = &slots[after - 1];
    if slot.contains(unit) {
        slot.peer_id()
    } else {
        None
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// SLOT ARRAY
// ════════════════════════════════════════════════════════════════════════════════

/// The sampler's backing store: slots plus fragmentation accounting.
#[derive(Clone, Debug, Default)]
pub struct SlotArray {
    slots: Vec<Slot>,
    fragmentation: u64,
}

impl SlotArray {
    /// Creates an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total slot units, live and fragmented: the sampling bound.
    #[must_use]
    pub fn slot_count(&self) -> u64 {
        self.slots.last().map_or(0, Slot::stop)
    }

    /// Slot units currently held by gaps.
    #[must_use]
    pub fn fragmentation(&self) -> u64 {
        self.fragmentation
    }

    /// Number of array entries, gaps included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the array has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The slot at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Appends a live slot at the tail and returns its index.
    pub fn append(&mut self, score: u32, peer_id: PeerId) -> usize {
        let start = self.slot_count();
        self.slots.push(Slot::new(start, score, peer_id));
        self.slots.len() - 1
    }

    /// Removes the slot at `index`.
    ///
    /// The tail slot is popped outright (the sampling bound shrinks);
    /// any other slot becomes a gap and its score moves into the
    /// fragmentation counter. Indices of surviving slots are unchanged.
    pub fn remove(&mut self, index: usize) {
        if index >= self.slots.len() {
            return;
        }
        if index + 1 == self.slots.len() {
            self.slots.pop();
        } else {
            self.fragmentation += u64::from(self.slots[index].score());
            self.slots[index] = self.slots[index].into_gap();
        }
    }

    /// Selects the peer covering `unit`, if any.
    #[must_use]
    pub fn select_at(&self, unit: u64) -> Option<PeerId> {
        select_peer_impl(&self.slots, unit, self.slot_count())
    }

    /// Rebuilds the array without gaps and returns the number of slot
    /// units reclaimed. Live slots keep their relative order;
    /// `on_move(peer_id, new_index)` reports each survivor's position
    /// so owners can update their back-references.
    pub fn compact(&mut self, mut on_move: impl FnMut(PeerId, usize)) -> u64 {
        let reclaimed = self.fragmentation;

        let mut rebuilt = Vec::with_capacity(self.slots.len());
        let mut next_start = 0u64;
        for slot in &self.slots {
            if let Some(peer_id) = slot.peer_id() {
                on_move(peer_id, rebuilt.len());
                rebuilt.push(Slot::new(next_start, slot.score(), peer_id));
                next_start += u64::from(slot.score());
            }
        }

        self.slots = rebuilt;
        self.fragmentation = 0;
        reclaimed
    }

    /// Checks the structural invariants.
    #[must_use]
    pub fn verify(&self) -> bool {
        let mut live_units = 0u64;
        for window in self.slots.windows(2) {
            if window[0].stop() > window[1].start() {
                return false;
            }
        }
        for slot in &self.slots {
            if slot.peer_id().is_some() {
                live_units += u64::from(slot.score());
            }
        }
        live_units + self.fragmentation == self.slot_count()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════
