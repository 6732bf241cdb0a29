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

//! # HELLO engine
//!
//! Generates, processes, and reacts to HELLO messages, updating the neighbor, two-hop, and slot
//! tables and triggering MPR recomputation.

use crate::config::EngineConfig;
use crate::message::{HelloNeighbor, HelloPayload, HelloTwoHop};
use crate::mpr::MprSelector;
use crate::neighbor::NeighborTable;
use crate::slots::SlotTable;
use crate::two_hop::TwoHopTable;
use crate::types::{LinkStatus, NodeId, Willingness};
use log::{debug, info, warn};
use std::time::Instant;

/// Snapshots current state into an outbound HELLO body.
///
/// Every known one-hop neighbor is advertised, not only symmetric ones: a link that is still
/// only ASYM must still be cited so the peer can promote it to SYM on its next HELLO. That is
/// how link sensing bootstraps a new link from nothing.
pub fn build_hello(
    willingness: Willingness,
    neighbors: &NeighborTable,
    two_hop: &TwoHopTable,
    slots: &SlotTable,
    hello_interval_secs: u32,
) -> HelloPayload {
    let hello_neighbors: Vec<HelloNeighbor> = neighbors
        .iter()
        .filter(|n| matches!(n.link_status, LinkStatus::Sym | LinkStatus::Asym))
        .map(|n| {
            let link_code = if n.is_mpr { LinkStatus::MprNeigh } else { n.link_status };
            HelloNeighbor { id: n.id, link_code }
        })
        .collect();

    let two_hop_list: Vec<HelloTwoHop> = two_hop
        .iter()
        .map(|e| HelloTwoHop {
            two_hop_id: e.two_hop_id,
            via_id: e.via_one_hop_id,
            reserved_slot: slots.get(e.two_hop_id).map(|r| r.slot),
        })
        .collect();

    HelloPayload {
        hello_interval: hello_interval_secs,
        willingness,
        reserved_slot: slots.get_self_slot(),
        neighbors: hello_neighbors,
        two_hop: two_hop_list,
    }
}

/// Outcome of processing an inbound HELLO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloOutcome {
    /// Whether the topology-affecting state changed (a neighbor appeared or was promoted to
    /// SYM), requiring the routing table to be marked dirty.
    pub topology_dirty: bool,
}

/// Processes one inbound HELLO from `sender`, following the six-step sequence in the data
/// model: slot bookkeeping, neighbor upsert, two-hop learning, MPR recompute, selector-flag
/// update, and stale-slot expiry.
#[allow(clippy::too_many_arguments)]
pub fn on_hello(
    self_id: NodeId,
    sender: NodeId,
    hello: &HelloPayload,
    neighbors: &mut NeighborTable,
    two_hop: &mut TwoHopTable,
    slots: &mut SlotTable,
    mpr: &mut MprSelector,
    now: Instant,
    cfg: &EngineConfig,
) -> HelloOutcome {
    let mut dirty = false;

    // 1. TDMA reservation for the sender itself (hop=1).
    match hello.reserved_slot {
        Some(slot) => {
            if let Err(e) = slots.upsert(sender, slot, 1, now) {
                warn!("slot table full, dropping reservation for {}: {}", sender, e);
            }
        }
        None => slots.remove(sender),
    }

    // 2. TDMA reservations for every two-hop entry the sender advertises, except self.
    for entry in &hello.two_hop {
        if entry.two_hop_id == self_id {
            continue;
        }
        if let Some(slot) = entry.reserved_slot {
            if let Err(e) = slots.upsert(entry.two_hop_id, slot, 2, now) {
                warn!(
                    "slot table full, dropping 2-hop reservation for {}: {}",
                    entry.two_hop_id, e
                );
            }
        }
    }

    // 3. Classify the link to the sender and upsert the neighbor entry.
    let self_cited = hello.neighbors.iter().any(|n| n.id == self_id);
    let link_status = if self_cited { LinkStatus::Sym } else { LinkStatus::Asym };

    match neighbors.upsert(sender, link_status, hello.willingness, now) {
        Ok(outcome) => {
            if outcome.is_new() {
                info!("neighbor {} discovered ({:?})", sender, link_status);
                dirty = true;
            } else if outcome.promoted_to_sym(link_status) {
                info!("neighbor {} promoted to SYM", sender);
                dirty = true;
            } else {
                debug!("neighbor {} refreshed ({:?})", sender, link_status);
            }
        }
        Err(e) => {
            warn!("neighbor table full, dropping HELLO from {}: {}", sender, e);
            return HelloOutcome { topology_dirty: dirty };
        }
    }

    // 4. Learn two-hop neighbors through a SYM sender.
    if link_status == LinkStatus::Sym {
        for n in &hello.neighbors {
            if n.id == self_id {
                continue;
            }
            if n.link_code != LinkStatus::Sym {
                continue;
            }
            if neighbors.get(n.id).map_or(false, |e| e.is_sym()) {
                continue;
            }
            if let Err(e) = two_hop.upsert(n.id, sender, now) {
                warn!("two-hop table full, dropping ({}, via {}): {}", n.id, sender, e);
            }
        }
    }

    // 5. Recompute MPR, then track whether the sender has chosen us as one of its MPRs.
    mpr.recompute(neighbors, two_hop);
    let sender_selected_us =
        hello.neighbors.iter().any(|n| n.id == self_id && n.link_code == LinkStatus::MprNeigh);
    let was_selector = neighbors.get(sender).map(|e| e.is_mpr_selector).unwrap_or(false);
    neighbors.set_is_mpr_selector(sender, sender_selected_us);
    if sender_selected_us != was_selector {
        info!("neighbor {} mpr-selector status -> {}", sender, sender_selected_us);
    }

    // 6. Expire stale slot reservations.
    slots.expire(now, cfg.slot_reservation_timeout);

    HelloOutcome { topology_dirty: dirty }
}

/// Outcome of [`check_neighbor_timeouts`].
#[derive(Debug, Clone, Default)]
pub struct TimeoutOutcome {
    /// Neighbors removed by this scan.
    pub removed: Vec<NodeId>,
}

impl TimeoutOutcome {
    /// True if any neighbor was removed.
    pub fn any_removed(&self) -> bool {
        !self.removed.is_empty()
    }
}

/// Removes every neighbor whose `last_hello` has not been refreshed within `HELLO_TIMEOUT`,
/// cascading the removal to the two-hop and slot tables. Routing-table invalidation is the
/// caller's responsibility (it requires the topology database too).
pub fn check_neighbor_timeouts(
    neighbors: &mut NeighborTable,
    two_hop: &mut TwoHopTable,
    slots: &mut SlotTable,
    now: Instant,
    hello_timeout: std::time::Duration,
) -> TimeoutOutcome {
    let timed_out = neighbors.timed_out(now, hello_timeout);
    for id in &timed_out {
        info!("neighbor {} timed out, removing", id);
        neighbors.remove(*id);
        slots.remove(*id);
        let purged = two_hop.remove_all_via(*id);
        if purged > 0 {
            debug!("purged {} two-hop entries via {}", purged, id);
        }
    }
    TimeoutOutcome { removed: timed_out }
}
