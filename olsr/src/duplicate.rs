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

//! # Duplicate-suppression table
//!
//! Tracks `(originator, seq_number)` pairs recently seen on TC messages, so a flooded TC is
//! processed and forwarded at most once per node. An entry self-expires after
//! `DUPLICATE_HOLD_TIME`.

use crate::error::{Table, TableError};
use crate::types::NodeId;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct DuplicateEntry {
    originator: NodeId,
    seq_number: u16,
    timestamp: Instant,
}

/// Bounded table of recently-seen `(originator, seq)` pairs.
#[derive(Debug, Clone)]
pub struct DuplicateTable {
    entries: Vec<DuplicateEntry>,
    capacity: usize,
}

impl DuplicateTable {
    /// Creates an empty table with the given capacity.
    pub fn new(capacity: usize) -> Self {
        DuplicateTable { entries: Vec::new(), capacity }
    }

    /// Returns true if `(originator, seq)` was recorded within `hold` of `now`.
    pub fn is_duplicate(
        &self,
        originator: NodeId,
        seq: u16,
        now: Instant,
        hold: Duration,
    ) -> bool {
        self.entries.iter().any(|e| {
            e.originator == originator
                && e.seq_number == seq
                && now.saturating_duration_since(e.timestamp) < hold
        })
    }

    /// Records `(originator, seq)` as seen at `now`. If an entry for the same pair already
    /// exists (e.g. it is about to expire), it is refreshed instead of duplicated.
    pub fn insert(
        &mut self,
        originator: NodeId,
        seq: u16,
        now: Instant,
    ) -> Result<(), TableError> {
        if let Some(e) =
            self.entries.iter_mut().find(|e| e.originator == originator && e.seq_number == seq)
        {
            e.timestamp = now;
            return Ok(());
        }
        if self.entries.len() >= self.capacity {
            return Err(TableError::TableFull(Table::Duplicate));
        }
        self.entries.push(DuplicateEntry { originator, seq_number: seq, timestamp: now });
        Ok(())
    }

    /// Removes every entry older than `hold`. Returns the number removed.
    pub fn cleanup(&mut self, now: Instant, hold: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| now.saturating_duration_since(e.timestamp) < hold);
        before - self.entries.len()
    }
}
