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

//! # MPR selection
//!
//! Computes the local Multipoint Relay set from the neighbor and two-hop tables, following the
//! RFC-3626 heuristic described in the data model: always-willing neighbors first, then unique
//! coverers, then greedy maximum-coverage until the two-hop set is covered or no candidate can
//! extend it further.

use crate::neighbor::NeighborTable;
use crate::two_hop::TwoHopTable;
use crate::types::{NodeId, Willingness};
use std::collections::{HashMap, HashSet};

/// Computes and remembers MPR selections.
///
/// Beyond the MPR set itself, this keeps a diagnostic record of which two-hop nodes each
/// selected MPR uniquely covered at the moment it was chosen, useful for explaining a
/// selection during debugging. It is never consulted by route computation.
#[derive(Debug, Clone, Default)]
pub struct MprSelector {
    last_coverage: HashMap<NodeId, HashSet<NodeId>>,
}

impl MprSelector {
    /// Creates a selector with no recorded history.
    pub fn new() -> Self {
        MprSelector { last_coverage: HashMap::new() }
    }

    /// Returns the two-hop nodes that `neighbor` newly covered when it was last selected as an
    /// MPR, if it currently is one.
    pub fn last_coverage(&self, neighbor: NodeId) -> Option<&HashSet<NodeId>> {
        self.last_coverage.get(&neighbor)
    }

    /// Recomputes the MPR set from `neighbors` and `two_hop`, writing the result back onto
    /// `neighbors` via `is_mpr`, and returns the chosen set.
    pub fn recompute(
        &mut self,
        neighbors: &mut NeighborTable,
        two_hop: &TwoHopTable,
    ) -> HashSet<NodeId> {
        self.last_coverage.clear();
        neighbors.clear_mpr_flags();

        let eligible: Vec<NodeId> = neighbors
            .sym_neighbors()
            .filter(|n| n.willingness != Willingness::Never)
            .map(|n| n.id)
            .collect();

        let h: HashSet<NodeId> = two_hop.distinct_two_hop_ids();
        let mut covered: HashSet<NodeId> = HashSet::new();
        let mut m: HashSet<NodeId> = HashSet::new();

        let reach = |n: NodeId| -> HashSet<NodeId> { two_hop.reach_set(n) };

        // Step 2: every SYM neighbor with willingness ALWAYS. Coverage is recorded against the
        // covered set as it stands at the moment each neighbor is added, same as step 4.
        for &id in &eligible {
            if neighbors.get(id).map(|n| n.willingness) == Some(Willingness::Always) {
                let gained: HashSet<NodeId> = reach(id).difference(&covered).copied().collect();
                self.last_coverage.insert(id, gained.clone());
                covered.extend(gained);
                m.insert(id);
            }
        }

        // Step 3: two-hop nodes reachable through exactly one eligible neighbor.
        for &two_hop_id in &h {
            let reachers: Vec<NodeId> =
                two_hop.reachers_of(two_hop_id).filter(|via| eligible.contains(via)).collect();
            if reachers.len() == 1 {
                let id = reachers[0];
                if m.insert(id) {
                    let gained: HashSet<NodeId> =
                        reach(id).difference(&covered).copied().collect();
                    self.last_coverage.insert(id, gained.clone());
                    covered.extend(gained);
                } else {
                    covered.insert(two_hop_id);
                }
            }
        }

        // Step 4: greedily cover the remainder.
        loop {
            if covered.len() >= h.len() {
                break;
            }
            let remaining: HashSet<NodeId> = h.difference(&covered).copied().collect();

            let mut best: Option<(NodeId, usize, Willingness)> = None;
            for &id in &eligible {
                if m.contains(&id) {
                    continue;
                }
                let willingness = match neighbors.get(id) {
                    Some(n) => n.willingness,
                    None => continue,
                };
                let new_coverage = reach(id).intersection(&remaining).count();
                if new_coverage == 0 {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((best_id, best_count, best_will)) => {
                        (new_coverage, willingness, std::cmp::Reverse(id))
                            > (best_count, best_will, std::cmp::Reverse(best_id))
                    }
                };
                if better {
                    best = Some((id, new_coverage, willingness));
                }
            }

            match best {
                None => break,
                Some((id, _, _)) => {
                    let gained: HashSet<NodeId> = reach(id).intersection(&remaining).copied().collect();
                    self.last_coverage.insert(id, gained.clone());
                    covered.extend(gained);
                    m.insert(id);
                }
            }
        }

        for &id in &m {
            neighbors.set_is_mpr(id, true);
        }

        m
    }
}
