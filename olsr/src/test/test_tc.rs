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

use crate::duplicate::DuplicateTable;
use crate::error::TcError;
use crate::message::{TcPayload, TcSelector};
use crate::neighbor::NeighborTable;
use crate::tc::on_tc;
use crate::topology::TopologyDatabase;
use crate::types::{LinkStatus, MessageHeader, MessageType, NodeId, Willingness};
use std::time::{Duration, Instant};

fn tc_header(originator: NodeId, seq: u16, ttl: u8) -> MessageHeader {
    MessageHeader { msg_type: MessageType::Tc, vtime: 15, originator, ttl, hop_count: 0, seq }
}

// TC flood & dedup.
#[test]
fn test_tc_accepted_installs_links_and_forwards() {
    let now = Instant::now();
    let mut neighbors = NeighborTable::new(8);
    neighbors.upsert(NodeId(2), LinkStatus::Sym, Willingness::Default, now).unwrap();
    neighbors.set_is_mpr_selector(NodeId(2), true);

    let mut duplicate = DuplicateTable::new(64);
    let mut topology = TopologyDatabase::new(64);

    let header = tc_header(NodeId(10), 7, 5);
    let payload = TcPayload {
        ansn: 1,
        selectors: vec![TcSelector { neighbor_id: NodeId(11) }, TcSelector { neighbor_id: NodeId(12) }],
    };

    let outcome = on_tc(
        &header,
        &payload,
        NodeId(2),
        &neighbors,
        &mut duplicate,
        &mut topology,
        now,
        Duration::from_secs(30),
    )
    .unwrap();

    assert!(outcome.topology_dirty);
    assert_eq!(topology.get(NodeId(10), NodeId(11)).unwrap().ansn, 1);
    assert_eq!(topology.get(NodeId(10), NodeId(12)).unwrap().ansn, 1);

    let forward = outcome.forward.expect("should forward: sender chose us as MPR, ttl > 1");
    assert_eq!(forward.header.ttl, 4);
    assert_eq!(forward.header.hop_count, 1);
    assert_eq!(forward.header.originator, NodeId(10));
    assert_eq!(forward.header.seq, 7);
}

#[test]
fn test_tc_duplicate_dropped_and_topology_unchanged() {
    let now = Instant::now();
    let neighbors = NeighborTable::new(8);
    let mut duplicate = DuplicateTable::new(64);
    let mut topology = TopologyDatabase::new(64);

    let header = tc_header(NodeId(10), 7, 5);
    let payload = TcPayload { ansn: 1, selectors: vec![TcSelector { neighbor_id: NodeId(11) }] };

    on_tc(&header, &payload, NodeId(2), &neighbors, &mut duplicate, &mut topology, now, Duration::from_secs(30))
        .unwrap();
    let links_before = topology.len();

    let err = on_tc(
        &header,
        &payload,
        NodeId(3),
        &neighbors,
        &mut duplicate,
        &mut topology,
        now,
        Duration::from_secs(30),
    )
    .unwrap_err();

    assert!(matches!(err, TcError::Duplicate { originator, seq } if originator == NodeId(10) && seq == 7));
    assert_eq!(topology.len(), links_before);
}

#[test]
fn test_tc_not_forwarded_when_not_chosen_as_mpr() {
    let now = Instant::now();
    let mut neighbors = NeighborTable::new(8);
    neighbors.upsert(NodeId(2), LinkStatus::Sym, Willingness::Default, now).unwrap();
    // sender 2 has NOT selected us as an MPR.

    let mut duplicate = DuplicateTable::new(64);
    let mut topology = TopologyDatabase::new(64);
    let header = tc_header(NodeId(10), 7, 5);
    let payload = TcPayload { ansn: 1, selectors: vec![TcSelector { neighbor_id: NodeId(11) }] };

    let outcome = on_tc(&header, &payload, NodeId(2), &neighbors, &mut duplicate, &mut topology, now, Duration::from_secs(30))
        .unwrap();

    assert!(outcome.forward.is_none());
}

#[test]
fn test_tc_not_forwarded_when_ttl_exhausted() {
    let now = Instant::now();
    let mut neighbors = NeighborTable::new(8);
    neighbors.upsert(NodeId(2), LinkStatus::Sym, Willingness::Default, now).unwrap();
    neighbors.set_is_mpr_selector(NodeId(2), true);

    let mut duplicate = DuplicateTable::new(64);
    let mut topology = TopologyDatabase::new(64);
    let header = tc_header(NodeId(10), 7, 1);
    let payload = TcPayload { ansn: 1, selectors: vec![TcSelector { neighbor_id: NodeId(11) }] };

    let outcome = on_tc(&header, &payload, NodeId(2), &neighbors, &mut duplicate, &mut topology, now, Duration::from_secs(30))
        .unwrap();

    assert!(outcome.forward.is_none());
}

#[test]
fn test_tc_rejects_empty_selector_set() {
    let now = Instant::now();
    let neighbors = NeighborTable::new(8);
    let mut duplicate = DuplicateTable::new(64);
    let mut topology = TopologyDatabase::new(64);
    let header = tc_header(NodeId(10), 7, 5);
    let payload = TcPayload { ansn: 1, selectors: vec![] };

    let err = on_tc(&header, &payload, NodeId(2), &neighbors, &mut duplicate, &mut topology, now, Duration::from_secs(30))
        .unwrap_err();

    assert!(matches!(err, TcError::Malformed(_)));
}

#[test]
fn test_stale_ansn_rejected() {
    let now = Instant::now();
    let neighbors = NeighborTable::new(8);
    let mut duplicate = DuplicateTable::new(64);
    let mut topology = TopologyDatabase::new(64);

    let first = tc_header(NodeId(10), 1, 5);
    let first_payload =
        TcPayload { ansn: 5, selectors: vec![TcSelector { neighbor_id: NodeId(11) }] };
    on_tc(&first, &first_payload, NodeId(2), &neighbors, &mut duplicate, &mut topology, now, Duration::from_secs(30))
        .unwrap();

    let second = tc_header(NodeId(10), 2, 5);
    let stale_payload =
        TcPayload { ansn: 3, selectors: vec![TcSelector { neighbor_id: NodeId(11) }] };
    let outcome = on_tc(
        &second,
        &stale_payload,
        NodeId(2),
        &neighbors,
        &mut duplicate,
        &mut topology,
        now,
        Duration::from_secs(30),
    )
    .unwrap();

    assert!(!outcome.topology_dirty);
    assert_eq!(topology.get(NodeId(10), NodeId(11)).unwrap().ansn, 5);
}
