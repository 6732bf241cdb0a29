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

//! # Two-hop table
//!
//! Holds `(two_hop_id, via_one_hop_id)` tuples with a last-seen timestamp. The HELLO engine only
//! reads it when building an outbound HELLO; it never keeps its own copy.

use crate::error::{Table, TableError};
use crate::types::NodeId;
use std::time::Instant;

/// A single two-hop reachability record.
#[derive(Debug, Clone, Copy)]
pub struct TwoHopEntry {
    /// The two-hop node.
    pub two_hop_id: NodeId,
    /// The one-hop neighbor through which `two_hop_id` was heard.
    pub via_one_hop_id: NodeId,
    /// Last time this pair was refreshed.
    pub last_seen: Instant,
}

/// Bounded table of two-hop reachability records.
#[derive(Debug, Clone)]
pub struct TwoHopTable {
    entries: Vec<TwoHopEntry>,
    capacity: usize,
}

impl TwoHopTable {
    /// Creates an empty table with the given capacity (`MAX_TWO_HOP`).
    pub fn new(capacity: usize) -> Self {
        TwoHopTable { entries: Vec::new(), capacity }
    }

    /// Inserts or refreshes a `(two_hop_id, via)` pair. Deduplicates on the pair.
    pub fn upsert(
        &mut self,
        two_hop_id: NodeId,
        via: NodeId,
        now: Instant,
    ) -> Result<(), TableError> {
        if let Some(e) =
            self.entries.iter_mut().find(|e| e.two_hop_id == two_hop_id && e.via_one_hop_id == via)
        {
            e.last_seen = now;
            return Ok(());
        }
        if self.entries.len() >= self.capacity {
            return Err(TableError::TableFull(Table::TwoHop));
        }
        self.entries.push(TwoHopEntry { two_hop_id, via_one_hop_id: via, last_seen: now });
        Ok(())
    }

    /// Removes a specific `(two_hop_id, via)` pair.
    pub fn remove_pair(&mut self, two_hop_id: NodeId, via: NodeId) {
        self.entries.retain(|e| !(e.two_hop_id == two_hop_id && e.via_one_hop_id == via));
    }

    /// Removes every entry reached via the given one-hop neighbor. Used when that neighbor's
    /// link fails.
    pub fn remove_all_via(&mut self, via: NodeId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.via_one_hop_id != via);
        before - self.entries.len()
    }

    /// Iterates over all two-hop entries.
    pub fn iter(&self) -> impl Iterator<Item = &TwoHopEntry> {
        self.entries.iter()
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the distinct set of two-hop ids reachable via at least one one-hop neighbor.
    pub fn distinct_two_hop_ids(&self) -> std::collections::HashSet<NodeId> {
        self.entries.iter().map(|e| e.two_hop_id).collect()
    }

    /// Returns every one-hop neighbor through which `two_hop_id` is reachable.
    pub fn reachers_of(&self, two_hop_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.entries
            .iter()
            .filter(move |e| e.two_hop_id == two_hop_id)
            .map(|e| e.via_one_hop_id)
    }

    /// Returns the set of two-hop ids reachable through the one-hop neighbor `via`.
    pub fn reach_set(&self, via: NodeId) -> std::collections::HashSet<NodeId> {
        self.entries.iter().filter(|e| e.via_one_hop_id == via).map(|e| e.two_hop_id).collect()
    }
}
