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

//! # TDMA slot table
//!
//! Slot reservations carried out-of-band in HELLO messages, for self and for 1- and 2-hop
//! neighbors. This table has nothing to do with route computation; it exists purely so HELLO
//! messages can advertise slot state to the RRC/TDMA layer above.

use crate::error::{Table, TableError};
use crate::types::NodeId;
use std::time::{Duration, Instant};

/// A single TDMA slot reservation, for a one- or two-hop node.
#[derive(Debug, Clone, Copy)]
pub struct TdmaReservation {
    /// Node holding the reservation.
    pub node_id: NodeId,
    /// Reserved slot number.
    pub slot: u32,
    /// Distance, in hops, from this node (1 or 2).
    pub hop_distance: u8,
    /// Last time the reservation was refreshed.
    pub last_updated: Instant,
}

/// Bounded table of TDMA slot reservations for 1- and 2-hop neighbors, plus this node's own
/// reservation.
#[derive(Debug, Clone)]
pub struct SlotTable {
    entries: Vec<TdmaReservation>,
    capacity: usize,
    self_slot: Option<u32>,
}

impl SlotTable {
    /// Creates an empty table with the given capacity.
    pub fn new(capacity: usize) -> Self {
        SlotTable { entries: Vec::new(), capacity, self_slot: None }
    }

    /// Sets (or clears, with `None`) this node's own slot reservation.
    pub fn set_self_slot(&mut self, slot: Option<u32>) {
        self.self_slot = slot;
    }

    /// Returns this node's own slot reservation.
    pub fn get_self_slot(&self) -> Option<u32> {
        self.self_slot
    }

    /// Inserts or refreshes a reservation for `node_id`. A node holds at most one entry: a
    /// later update (even at a different hop distance) collapses onto the existing entry rather
    /// than creating a duplicate.
    pub fn upsert(
        &mut self,
        node_id: NodeId,
        slot: u32,
        hop_distance: u8,
        now: Instant,
    ) -> Result<(), TableError> {
        if let Some(e) = self.entries.iter_mut().find(|e| e.node_id == node_id) {
            e.slot = slot;
            e.hop_distance = hop_distance;
            e.last_updated = now;
            return Ok(());
        }
        if self.entries.len() >= self.capacity {
            return Err(TableError::TableFull(Table::Slot));
        }
        self.entries.push(TdmaReservation { node_id, slot, hop_distance, last_updated: now });
        Ok(())
    }

    /// Removes the reservation for `node_id`, if any.
    pub fn remove(&mut self, node_id: NodeId) {
        self.entries.retain(|e| e.node_id != node_id);
    }

    /// Looks up the reservation for `node_id`.
    pub fn get(&self, node_id: NodeId) -> Option<&TdmaReservation> {
        self.entries.iter().find(|e| e.node_id == node_id)
    }

    /// Iterates over all reservations (self excluded).
    pub fn iter(&self) -> impl Iterator<Item = &TdmaReservation> {
        self.entries.iter()
    }

    /// Purges every reservation older than `timeout`. Returns the number removed.
    pub fn expire(&mut self, now: Instant, timeout: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| now.saturating_duration_since(e.last_updated) <= timeout);
        before - self.entries.len()
    }
}
