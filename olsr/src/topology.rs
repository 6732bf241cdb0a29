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

//! # Topology database
//!
//! Directed links `(from, to, ansn, validity)` built from accepted TC messages. A link is
//! considered absent once `validity <= now`, whether or not it has been physically purged yet;
//! [`TopologyDatabase::purge_expired`] performs the physical purge on the periodic cleanup pass,
//! while [`TopologyDatabase::active`] lets route computation treat expired-but-not-yet-purged
//! links as already gone.

use crate::error::{Table, TableError};
use crate::types::NodeId;
use std::time::Instant;

/// A single directed topology link, as advertised by a TC originator for one of its selectors.
#[derive(Debug, Clone, Copy)]
pub struct TopologyLink {
    /// Originator of the advertising TC.
    pub from: NodeId,
    /// One of the originator's MPR selectors.
    pub to: NodeId,
    /// Advertised Neighbor Sequence Number for this originator.
    pub ansn: u32,
    /// Time at which this link becomes stale.
    pub validity: Instant,
}

/// Outcome of [`TopologyDatabase::update_link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A new link was created.
    Created,
    /// An existing link was refreshed (its ANSN was `>=` the stored one).
    Refreshed,
    /// The update was rejected because its ANSN was older than the stored one.
    StaleAnsn,
}

/// Bounded table of directed topology links.
#[derive(Debug, Clone)]
pub struct TopologyDatabase {
    links: Vec<TopologyLink>,
    capacity: usize,
}

impl TopologyDatabase {
    /// Creates an empty database with the given capacity (`MAX_TOPOLOGY_LINKS`).
    pub fn new(capacity: usize) -> Self {
        TopologyDatabase { links: Vec::new(), capacity }
    }

    /// Accepts an update for `(from, to)` iff `ansn >= stored.ansn`; refreshes validity on
    /// acceptance.
    pub fn update_link(
        &mut self,
        from: NodeId,
        to: NodeId,
        ansn: u32,
        validity: Instant,
    ) -> Result<UpdateOutcome, TableError> {
        if let Some(link) = self.links.iter_mut().find(|l| l.from == from && l.to == to) {
            if ansn < link.ansn {
                return Ok(UpdateOutcome::StaleAnsn);
            }
            link.ansn = ansn;
            link.validity = validity;
            return Ok(UpdateOutcome::Refreshed);
        }
        if self.links.len() >= self.capacity {
            return Err(TableError::TableFull(Table::Topology));
        }
        self.links.push(TopologyLink { from, to, ansn, validity });
        Ok(UpdateOutcome::Created)
    }

    /// Looks up a specific directed link.
    pub fn get(&self, from: NodeId, to: NodeId) -> Option<&TopologyLink> {
        self.links.iter().find(|l| l.from == from && l.to == to)
    }

    /// Iterates over every link still valid at `now`, treating expired-but-unpurged links as
    /// absent.
    pub fn active(&self, now: Instant) -> impl Iterator<Item = &TopologyLink> {
        self.links.iter().filter(move |l| l.validity > now)
    }

    /// Removes every link whose validity has elapsed. Returns the number removed.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.links.len();
        self.links.retain(|l| l.validity > now);
        before - self.links.len()
    }

    /// Number of links currently stored (valid or not yet purged).
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// True if the database holds no links.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
