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

//! # Route computation & routing table
//!
//! Builds a unit-cost directed graph from the neighbor and topology tables and runs Dijkstra
//! from self to recover, for every reachable destination, the immediate next hop. The routing
//! table is always replaced atomically as a whole, never patched entry-by-entry.

use crate::neighbor::NeighborTable;
use crate::topology::TopologyDatabase;
use crate::types::{NodeId, INFINITE_COST};
use petgraph::graphmap::DiGraphMap;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

/// Outcome of a next-hop query against the RRC-facing interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextHopOutcome {
    /// `dest` is this node.
    DestinationIsSelf,
    /// A usable route was found.
    Found {
        /// Immediate next hop towards `dest`.
        next_hop: NodeId,
        /// Path cost.
        metric: u32,
        /// Hop count (equal to `metric` under the unit-cost model).
        hops: u32,
    },
    /// `dest` does not appear in the neighbor table or the topology database at all.
    DestinationUnreachable,
    /// `dest` is known but currently unreachable (temporary partition).
    NoRoute,
}

/// A single computed route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingEntry {
    /// Destination node.
    pub dest: NodeId,
    /// Immediate next hop towards `dest`.
    pub next_hop: NodeId,
    /// Path cost (unit-weight hop count).
    pub metric: u32,
    /// Number of hops, equal to `metric` under the unit-cost model.
    pub hops: u32,
    /// Time this entry was computed.
    pub timestamp: Instant,
}

/// The computed routing table, replaced wholesale on every recompute.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: Vec<RoutingEntry>,
}

impl RoutingTable {
    /// Creates an empty routing table.
    pub fn new() -> Self {
        RoutingTable { entries: Vec::new() }
    }

    /// Atomically replaces the entire table with a freshly computed set of entries.
    pub fn replace(&mut self, entries: Vec<RoutingEntry>) {
        self.entries = entries;
    }

    /// Looks up the route to `dest`.
    pub fn get(&self, dest: NodeId) -> Option<&RoutingEntry> {
        self.entries.iter().find(|e| e.dest == dest)
    }

    /// Removes a single stale entry ahead of a forced recompute.
    pub fn invalidate(&mut self, dest: NodeId) {
        self.entries.retain(|e| e.dest != dest);
    }

    /// Removes every entry routed through `next_hop`, used when that neighbor fails.
    pub fn invalidate_via(&mut self, next_hop: NodeId) {
        self.entries.retain(|e| e.next_hop != next_hop);
    }

    /// Iterates over every computed route.
    pub fn iter(&self) -> impl Iterator<Item = &RoutingEntry> {
        self.entries.iter()
    }

    /// Full read-only view of the computed table, for diagnostics.
    pub fn as_slice(&self) -> &[RoutingEntry] {
        &self.entries
    }

    /// Number of destinations currently routable.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no destination is currently routable.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds the IGP-style graph from `self_id`'s SYM neighbors and the active topology links, and
/// runs Dijkstra from `self_id`. Returns one [`RoutingEntry`] per reachable destination other
/// than `self_id`.
pub fn compute(
    self_id: NodeId,
    neighbors: &NeighborTable,
    topology: &TopologyDatabase,
    now: Instant,
) -> Vec<RoutingEntry> {
    let mut graph: DiGraphMap<NodeId, u32> = DiGraphMap::new();
    graph.add_node(self_id);
    for n in neighbors.iter() {
        graph.add_node(n.id);
    }
    for n in neighbors.sym_neighbors() {
        graph.add_edge(self_id, n.id, 1);
    }
    for link in topology.active(now) {
        // dedup against (a): re-adding the same edge with the same weight is a no-op in
        // DiGraphMap, it simply overwrites the weight.
        graph.add_edge(link.from, link.to, 1);
    }

    let (dist, prev) = dijkstra_with_predecessors(&graph, self_id);

    let mut entries = Vec::with_capacity(dist.len());
    for (&dest, &metric) in dist.iter() {
        if dest == self_id {
            continue;
        }
        let next_hop = match first_hop(self_id, dest, &prev) {
            Some(h) => h,
            None => continue,
        };
        entries.push(RoutingEntry { dest, next_hop, metric, hops: metric, timestamp: now });
    }
    entries
}

/// Single-source shortest paths over a unit/positive-weight [`DiGraphMap`], returning both the
/// distance map and a predecessor map for path reconstruction. `petgraph::algo::dijkstra` only
/// returns distances, so we run the same algorithm by hand to recover the next hop.
fn dijkstra_with_predecessors(
    graph: &DiGraphMap<NodeId, u32>,
    source: NodeId,
) -> (HashMap<NodeId, u32>, HashMap<NodeId, NodeId>) {
    let mut dist: HashMap<NodeId, u32> = HashMap::new();
    let mut prev: HashMap<NodeId, NodeId> = HashMap::new();
    let mut heap: BinaryHeap<Reverse<(u32, NodeId)>> = BinaryHeap::new();

    dist.insert(source, 0);
    heap.push(Reverse((0, source)));

    while let Some(Reverse((d, u))) = heap.pop() {
        if d > *dist.get(&u).unwrap_or(&INFINITE_COST) {
            continue;
        }
        for v in graph.neighbors(u) {
            let w = *graph.edge_weight(u, v).unwrap_or(&1);
            let nd = d.saturating_add(w);
            if nd < *dist.get(&v).unwrap_or(&INFINITE_COST) {
                dist.insert(v, nd);
                prev.insert(v, u);
                heap.push(Reverse((nd, v)));
            }
        }
    }

    (dist, prev)
}

/// Walks the predecessor chain from `dest` back to `source`, returning the first node visited
/// after `source` (i.e. the immediate next hop).
fn first_hop(
    source: NodeId,
    dest: NodeId,
    prev: &HashMap<NodeId, NodeId>,
) -> Option<NodeId> {
    let mut cur = dest;
    loop {
        match prev.get(&cur) {
            Some(&p) if p == source => return Some(cur),
            Some(&p) => cur = p,
            None => return None,
        }
    }
}
