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

//! # TC engine
//!
//! Originates Topology Control messages from the current MPR-selector set, and ingests inbound
//! TC messages: duplicate suppression, topology-database update, and MPR-based forwarding.

use crate::duplicate::DuplicateTable;
use crate::error::TcError;
use crate::message::{OutgoingMessage, Payload, TcPayload, TcSelector};
use crate::neighbor::NeighborTable;
use crate::topology::{TopologyDatabase, UpdateOutcome};
use crate::types::{MessageHeader, MessageType, NodeId};
use std::time::{Duration, Instant};

/// Collects the set of SYM neighbors that have chosen this node as one of their MPRs: the
/// selector set advertised in an originated TC.
pub fn collect_selectors(neighbors: &NeighborTable) -> Vec<TcSelector> {
    neighbors
        .sym_neighbors()
        .filter(|n| n.is_mpr_selector)
        .map(|n| TcSelector { neighbor_id: n.id })
        .collect()
}

/// Builds the outbound TC message for origination. The caller is responsible for bumping ANSN
/// and the per-originator sequence counter and recording `(self_id, seq)` in the duplicate
/// table before enqueueing this.
pub fn build_tc(
    self_id: NodeId,
    seq: u16,
    ansn: u32,
    vtime_secs: u32,
    selectors: Vec<TcSelector>,
) -> OutgoingMessage {
    OutgoingMessage {
        header: MessageHeader {
            msg_type: MessageType::Tc,
            vtime: vtime_secs,
            originator: self_id,
            ttl: 255,
            hop_count: 0,
            seq,
        },
        payload: Payload::Tc(TcPayload { ansn, selectors }),
    }
}

/// Outcome of processing one inbound TC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcOutcome {
    /// Whether a topology link was created or refreshed with a newer ANSN.
    pub topology_dirty: bool,
    /// The same TC, re-headered for forwarding, if this node is an MPR for `sender`.
    pub forward: Option<OutgoingMessage>,
}

/// Processes one inbound TC from `sender`, following the six-step ingestion sequence: type and
/// body validation, duplicate suppression, per-selector topology update, and forwarding.
pub fn on_tc(
    header: &MessageHeader,
    tc: &TcPayload,
    sender: NodeId,
    neighbors: &NeighborTable,
    duplicate: &mut DuplicateTable,
    topology: &mut TopologyDatabase,
    now: Instant,
    duplicate_hold: Duration,
) -> Result<TcOutcome, TcError> {
    if header.msg_type != MessageType::Tc {
        return Err(TcError::Malformed("msg_type != TC"));
    }
    if tc.selectors.is_empty() {
        return Err(TcError::Malformed("empty selector set"));
    }

    if duplicate.is_duplicate(header.originator, header.seq, now, duplicate_hold) {
        return Err(TcError::Duplicate { originator: header.originator, seq: header.seq });
    }
    duplicate.insert(header.originator, header.seq, now)?;

    let mut dirty = false;
    let validity = now + Duration::from_secs(u64::from(header.vtime));
    for selector in &tc.selectors {
        let outcome =
            topology.update_link(header.originator, selector.neighbor_id, tc.ansn, validity)?;
        if matches!(outcome, UpdateOutcome::Created | UpdateOutcome::Refreshed) {
            dirty = true;
        }
    }

    // Forward only if self was chosen as an MPR by the sender, and the TC has hops left. The
    // originator itself never reaches this path for its own message: it inserted its own
    // (originator, seq) into the duplicate table at origination, so a reflected copy is caught
    // by the duplicate check above.
    let sender_selected_us =
        neighbors.get(sender).map_or(false, |n| n.is_sym() && n.is_mpr_selector);
    let forward = if sender_selected_us && header.ttl > 1 {
        let fwd_header = MessageHeader {
            ttl: header.ttl - 1,
            hop_count: header.hop_count.saturating_add(1),
            ..*header
        };
        Some(OutgoingMessage { header: fwd_header, payload: Payload::Tc(tc.clone()) })
    } else {
        None
    };

    Ok(TcOutcome { topology_dirty: dirty, forward })
}
