// olsr: a proactive mesh routing engine
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Neighbor table
//!
//! Tracks symmetric/asymmetric one-hop neighbors with their last-HELLO timestamp, willingness,
//! and MPR flags. Invariants this table must uphold:
//!
//! - `is_mpr` implies `link_status == Sym` and `willingness != Never`.
//! - at most one entry per id.
//! - `last_hello <= now`.

use crate::error::{Table, TableError};
use crate::types::{LinkStatus, NodeId, Willingness};
use std::time::Instant;

/// A single one-hop neighbor.
#[derive(Debug, Clone)]
pub struct NeighborEntry {
    /// Neighbor identifier.
    pub id: NodeId,
    /// Current link status.
    pub link_status: LinkStatus,
    /// Willingness advertised by the neighbor in its last HELLO.
    pub willingness: Willingness,
    /// Last time this neighbor was observed in any capacity.
    pub last_seen: Instant,
    /// Last time a HELLO was received directly from this neighbor.
    pub last_hello: Instant,
    /// Whether this node has selected the neighbor as one of its own MPRs.
    pub is_mpr: bool,
    /// Whether the neighbor has selected this node as one of its MPRs.
    pub is_mpr_selector: bool,
}

impl NeighborEntry {
    fn new(id: NodeId, link_status: LinkStatus, willingness: Willingness, now: Instant) -> Self {
        NeighborEntry {
            id,
            link_status,
            willingness,
            last_seen: now,
            last_hello: now,
            is_mpr: false,
            is_mpr_selector: false,
        }
    }

    /// Returns true if the link is currently usable for forwarding.
    pub fn is_sym(&self) -> bool {
        self.link_status.is_sym()
    }
}

/// Result of an [`NeighborTable::upsert`] call, letting the caller detect state transitions
/// without re-querying the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Link status the entry had before this call (`None` if the entry was just created).
    pub previous: Option<LinkStatus>,
}

impl UpsertOutcome {
    /// True if the entry did not exist before this call.
    pub fn is_new(&self) -> bool {
        self.previous.is_none()
    }

    /// True if the link was promoted from ASYM to SYM by this call.
    pub fn promoted_to_sym(&self, new_status: LinkStatus) -> bool {
        self.previous == Some(LinkStatus::Asym) && new_status.is_sym()
    }
}

/// Bounded table of one-hop neighbors.
#[derive(Debug, Clone)]
pub struct NeighborTable {
    entries: Vec<NeighborEntry>,
    capacity: usize,
}

impl NeighborTable {
    /// Creates an empty table with the given capacity (`MAX_NEIGHBORS`).
    pub fn new(capacity: usize) -> Self {
        NeighborTable { entries: Vec::new(), capacity }
    }

    /// Inserts or refreshes a neighbor entry, updating `last_hello`/`last_seen` to `now`.
    ///
    /// Returns a [`TableError::TableFull`] if the neighbor is new and the table is at capacity;
    /// in that case the existing state is left untouched.
    pub fn upsert(
        &mut self,
        id: NodeId,
        link_status: LinkStatus,
        willingness: Willingness,
        now: Instant,
    ) -> Result<UpsertOutcome, TableError> {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            let previous = entry.link_status;
            entry.link_status = link_status;
            entry.willingness = willingness;
            entry.last_hello = now;
            entry.last_seen = now;
            return Ok(UpsertOutcome { previous: Some(previous) });
        }
        if self.entries.len() >= self.capacity {
            return Err(TableError::TableFull(Table::Neighbor));
        }
        self.entries.push(NeighborEntry::new(id, link_status, willingness, now));
        Ok(UpsertOutcome { previous: None })
    }

    /// Looks up a neighbor entry by id.
    pub fn get(&self, id: NodeId) -> Option<&NeighborEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Looks up a neighbor entry by id, mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NeighborEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    /// Removes a neighbor entry, returning it if present.
    pub fn remove(&mut self, id: NodeId) -> Option<NeighborEntry> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos))
    }

    /// Iterates over all neighbor entries.
    pub fn iter(&self) -> impl Iterator<Item = &NeighborEntry> {
        self.entries.iter()
    }

    /// Iterates over symmetric neighbors only.
    pub fn sym_neighbors(&self) -> impl Iterator<Item = &NeighborEntry> {
        self.entries.iter().filter(|e| e.is_sym())
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clears the `is_mpr` flag on every neighbor (step 1 of MPR recompute).
    pub fn clear_mpr_flags(&mut self) {
        for e in &mut self.entries {
            e.is_mpr = false;
        }
    }

    /// Sets the `is_mpr` flag for a given neighbor. No-op if the neighbor is unknown.
    pub fn set_is_mpr(&mut self, id: NodeId, is_mpr: bool) {
        if let Some(e) = self.get_mut(id) {
            e.is_mpr = is_mpr;
        }
    }

    /// Sets the `is_mpr_selector` flag for a given neighbor. No-op if the neighbor is unknown.
    pub fn set_is_mpr_selector(&mut self, id: NodeId, is_selector: bool) {
        if let Some(e) = self.get_mut(id) {
            e.is_mpr_selector = is_selector;
        }
    }

    /// Returns the ids of every neighbor whose `last_hello` is older than `timeout`, without
    /// removing them. The caller is expected to cascade the removal (two-hop purge, slot
    /// clear, route invalidation) before calling [`NeighborTable::remove`].
    pub fn timed_out(&self, now: Instant, timeout: std::time::Duration) -> Vec<NodeId> {
        self.entries
            .iter()
            .filter(|e| now.saturating_duration_since(e.last_hello) > timeout)
            .map(|e| e.id)
            .collect()
    }
}
