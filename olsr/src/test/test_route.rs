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

use crate::neighbor::NeighborTable;
use crate::route::compute;
use crate::topology::TopologyDatabase;
use crate::types::{LinkStatus, NodeId, Willingness};
use std::time::{Duration, Instant};

// A single SYM neighbor is reachable directly at cost 1.
#[test]
fn test_direct_sym_neighbor_is_one_hop() {
    let now = Instant::now();
    let mut neighbors = NeighborTable::new(8);
    neighbors.upsert(NodeId(2), LinkStatus::Sym, Willingness::Default, now).unwrap();
    let topology = TopologyDatabase::new(8);

    let entries = compute(NodeId(1), &neighbors, &topology, now);

    assert_eq!(entries.len(), 1);
    let route = entries.iter().find(|e| e.dest == NodeId(2)).unwrap();
    assert_eq!(route.next_hop, NodeId(2));
    assert_eq!(route.metric, 1);
    assert_eq!(route.hops, 1);
}

#[test]
fn test_multi_hop_via_topology_links() {
    let now = Instant::now();
    let mut neighbors = NeighborTable::new(8);
    neighbors.upsert(NodeId(2), LinkStatus::Sym, Willingness::Default, now).unwrap();

    let mut topology = TopologyDatabase::new(8);
    let validity = now + Duration::from_secs(15);
    topology.update_link(NodeId(2), NodeId(3), 1, validity).unwrap();
    topology.update_link(NodeId(3), NodeId(5), 1, validity).unwrap();

    let entries = compute(NodeId(1), &neighbors, &topology, now);

    let to5 = entries.iter().find(|e| e.dest == NodeId(5)).expect("5 should be reachable");
    assert_eq!(to5.next_hop, NodeId(2));
    assert_eq!(to5.metric, 3);
}

#[test]
fn test_expired_topology_links_excluded() {
    let now = Instant::now();
    let neighbors = NeighborTable::new(8);
    let mut topology = TopologyDatabase::new(8);
    let already_expired = now - Duration::from_secs(1);
    topology.update_link(NodeId(2), NodeId(3), 1, already_expired).unwrap();

    let entries = compute(NodeId(1), &neighbors, &topology, now);
    assert!(entries.is_empty());
}

// Rerouting after next-hop loss, driven directly at the compute() level: once neighbor 3
// is gone, node 5 is still reachable via neighbor 4's topology link.
#[test]
fn test_reroute_after_next_hop_neighbor_removed() {
    let now = Instant::now();
    let mut neighbors = NeighborTable::new(8);
    neighbors.upsert(NodeId(3), LinkStatus::Sym, Willingness::Default, now).unwrap();
    neighbors.upsert(NodeId(4), LinkStatus::Sym, Willingness::Default, now).unwrap();

    let mut topology = TopologyDatabase::new(8);
    let validity = now + Duration::from_secs(15);
    topology.update_link(NodeId(3), NodeId(5), 1, validity).unwrap();
    topology.update_link(NodeId(4), NodeId(5), 1, validity).unwrap();

    let before = compute(NodeId(1), &neighbors, &topology, now);
    assert_eq!(before.iter().find(|e| e.dest == NodeId(5)).unwrap().next_hop, NodeId(3));

    // Neighbor 3 times out and is removed.
    neighbors.remove(NodeId(3));
    let after = compute(NodeId(1), &neighbors, &topology, now);
    assert_eq!(after.iter().find(|e| e.dest == NodeId(5)).unwrap().next_hop, NodeId(4));
}

#[test]
fn test_unreachable_destination_absent_from_table() {
    let now = Instant::now();
    let neighbors = NeighborTable::new(8);
    let topology = TopologyDatabase::new(8);
    let entries = compute(NodeId(1), &neighbors, &topology, now);
    assert!(entries.is_empty());
}
