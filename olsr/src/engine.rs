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

//! # Node identity & clock and scheduler
//!
//! `Engine` is the single owning value for all protocol state, replacing the source's
//! process-wide singletons: one node id, one willingness, one set of sequence counters, and
//! every other table behind it. The scheduler (`tick`) and the inbound callbacks (`on_hello`,
//! `on_tc`) are the only entry points that mutate it.
//!
//! Time is never read internally (no `Instant::now()` inside protocol logic, [`Engine::new`]
//! aside): every operation that cares about time takes `now: Instant` from the caller, so tests
//! can drive the engine with a fake clock.

use crate::config::EngineConfig;
use crate::duplicate::DuplicateTable;
use crate::hello;
use crate::message::{HelloPayload, OutgoingMessage, Payload, TcPayload, Transport};
use crate::mpr::MprSelector;
use crate::neighbor::NeighborTable;
use crate::queue::ControlQueue;
use crate::route::{self, NextHopOutcome, RoutingEntry, RoutingTable};
use crate::slots::SlotTable;
use crate::tc;
use crate::topology::TopologyDatabase;
use crate::two_hop::TwoHopTable;
use crate::types::{MessageHeader, MessageType, NodeId, Willingness};
use log::{debug, info, trace, warn};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Owns every protocol table for one node and drives the periodic scheduler.
pub struct Engine {
    self_id: NodeId,
    willingness: Willingness,
    config: EngineConfig,

    neighbors: NeighborTable,
    two_hop: TwoHopTable,
    slots: SlotTable,
    mpr: MprSelector,
    topology: TopologyDatabase,
    routing: RoutingTable,
    queue: ControlQueue,
    duplicate: DuplicateTable,

    ansn: u32,
    seq: u16,
    topology_dirty: bool,
    pending_emergency_hello: bool,

    last_hello_send: Instant,
    last_tc_send: Instant,
    last_timeout_scan: Instant,
    last_cleanup: Instant,
}

impl Engine {
    /// Constructs a new engine with every table empty and counters at zero. `last_hello_send`
    /// and `last_tc_send` are backdated so the first `tick()` originates both immediately.
    pub fn new(self_id: NodeId, willingness: Willingness, config: EngineConfig) -> Engine {
        let now = Instant::now();
        let backdated = now.checked_sub(Duration::from_secs(3600)).unwrap_or(now);
        Engine {
            self_id,
            willingness,
            neighbors: NeighborTable::new(config.max_neighbors),
            two_hop: TwoHopTable::new(config.max_two_hop),
            slots: SlotTable::new(config.max_slot_reservations),
            mpr: MprSelector::new(),
            topology: TopologyDatabase::new(config.max_topology_links),
            routing: RoutingTable::new(),
            queue: ControlQueue::new(config.control_queue_capacity),
            duplicate: DuplicateTable::new(config.max_duplicate_entries),
            ansn: 0,
            seq: 0,
            topology_dirty: false,
            pending_emergency_hello: false,
            last_hello_send: backdated,
            last_tc_send: backdated,
            last_timeout_scan: backdated,
            last_cleanup: backdated,
            config,
        }
    }

    /// This node's own id.
    pub fn self_id(&self) -> NodeId {
        self.self_id
    }

    /// Runs one scheduler tick, in the order: timeout scan, retry processing, HELLO origination,
    /// TC origination, one queue drain, periodic cleanup, routing recompute.
    pub fn tick<T: Transport>(&mut self, now: Instant, transport: &mut T) {
        if now.saturating_duration_since(self.last_timeout_scan) >= self.config.timeout_scan_interval
        {
            trace!("running neighbor timeout scan");
            self.run_timeout_scan(now);
            self.last_timeout_scan = now;
        }

        let failed_retries = self.queue.process_retries(
            now,
            self.config.max_retry_attempts,
            self.config.retry_base,
            self.config.max_retry_interval,
        );
        if failed_retries > 0 {
            warn!("{} control message(s) dropped after retry exhaustion", failed_retries);
        }

        if self.pending_emergency_hello
            || now.saturating_duration_since(self.last_hello_send) >= self.config.hello_interval
        {
            trace!("hello tick");
            self.hello_tick(now);
            self.last_hello_send = now;
            self.pending_emergency_hello = false;
        }

        if now.saturating_duration_since(self.last_tc_send) >= self.config.tc_interval {
            trace!("tc tick");
            self.tc_tick(now);
            self.last_tc_send = now;
        }

        if let Some(msg) = self.queue.pop() {
            transport.send(msg.payload);
        }

        if now.saturating_duration_since(self.last_cleanup) >= self.config.cleanup_interval {
            trace!("running periodic cleanup");
            self.run_cleanup(now);
            self.last_cleanup = now;
        }

        if self.topology_dirty {
            self.update_routing_table(now);
            self.topology_dirty = false;
        }
    }

    /// Minimum delay until `tick` next has useful work to do: the earliest of the four timers, or
    /// zero if an emergency HELLO is pending or the control queue has something to drain. An
    /// external driver can sleep for this long instead of polling on a fixed cadence.
    pub fn next_wakeup(&self, now: Instant) -> Duration {
        if self.pending_emergency_hello || !self.queue.is_empty() {
            return Duration::from_secs(0);
        }
        let mut wait = self.remaining(self.last_hello_send, self.config.hello_interval, now);
        wait = wait.min(self.remaining(self.last_tc_send, self.config.tc_interval, now));
        wait = wait.min(self.remaining(
            self.last_timeout_scan,
            self.config.timeout_scan_interval,
            now,
        ));
        wait.min(self.remaining(self.last_cleanup, self.config.cleanup_interval, now))
    }

    fn remaining(&self, last: Instant, interval: Duration, now: Instant) -> Duration {
        interval.saturating_sub(now.saturating_duration_since(last))
    }

    fn run_timeout_scan(&mut self, now: Instant) {
        let outcome = hello::check_neighbor_timeouts(
            &mut self.neighbors,
            &mut self.two_hop,
            &mut self.slots,
            now,
            self.config.hello_timeout,
        );
        if outcome.any_removed() {
            for id in &outcome.removed {
                self.routing.invalidate_via(*id);
            }
            self.topology_dirty = true;
            self.pending_emergency_hello = true;
            info!(
                "{} neighbor(s) timed out, requesting emergency HELLO",
                outcome.removed.len()
            );
        }
    }

    fn run_cleanup(&mut self, now: Instant) {
        self.duplicate.cleanup(now, self.config.duplicate_hold);
        let expired_links = self.topology.purge_expired(now);
        self.queue.cleanup_expired(
            now,
            self.config.control_message_max_age,
            self.config.max_retry_attempts,
        );
        if expired_links > 0 {
            debug!("{} expired topology link(s) purged", expired_links);
            self.topology_dirty = true;
        }
    }

    fn update_routing_table(&mut self, now: Instant) {
        let entries = route::compute(self.self_id, &self.neighbors, &self.topology, now);
        debug!("routing table rebuilt: {} reachable destination(s)", entries.len());
        self.routing.replace(entries);
    }

    /// Builds and enqueues one HELLO, snapshotting current neighbor/two-hop/slot state.
    fn hello_tick(&mut self, now: Instant) {
        let payload = hello::build_hello(
            self.willingness,
            &self.neighbors,
            &self.two_hop,
            &self.slots,
            self.config.hello_interval.as_secs() as u32,
        );
        self.seq = self.seq.wrapping_add(1);
        let header = MessageHeader {
            msg_type: MessageType::Hello,
            vtime: self.config.hello_timeout.as_secs() as u32,
            originator: self.self_id,
            ttl: 1,
            hop_count: 0,
            seq: self.seq,
        };
        let msg = OutgoingMessage { header, payload: Payload::Hello(payload) };
        if let Err(e) = self.queue.enqueue(msg, now) {
            warn!("control queue full, dropping HELLO origination: {}", e);
        }
    }

    /// Originates a TC iff this node currently has at least one MPR selector.
    fn tc_tick(&mut self, now: Instant) {
        let selectors = tc::collect_selectors(&self.neighbors);
        if selectors.is_empty() {
            trace!("no MPR selectors, skipping TC origination");
            return;
        }
        self.ansn = self.ansn.wrapping_add(1);
        self.seq = self.seq.wrapping_add(1);
        let vtime = self.config.tc_validity.as_secs() as u32;
        let msg = tc::build_tc(self.self_id, self.seq, self.ansn, vtime, selectors);
        if let Err(e) = self.duplicate.insert(self.self_id, self.seq, now) {
            warn!("duplicate table full, dropping TC origination: {}", e);
            return;
        }
        if let Err(e) = self.queue.enqueue(msg, now) {
            warn!("control queue full, dropping TC origination: {}", e);
        }
    }

    /// Processes one inbound HELLO. Never fails: table-full conditions are logged and the event
    /// is otherwise absorbed.
    pub fn on_hello(&mut self, sender: NodeId, hello: &HelloPayload, now: Instant) {
        let outcome = hello::on_hello(
            self.self_id,
            sender,
            hello,
            &mut self.neighbors,
            &mut self.two_hop,
            &mut self.slots,
            &mut self.mpr,
            now,
            &self.config,
        );
        if outcome.topology_dirty {
            self.topology_dirty = true;
        }
    }

    /// Processes one inbound TC. Duplicates and malformed messages are dropped and logged;
    /// nothing ever propagates back across the transport boundary.
    pub fn on_tc(&mut self, header: &MessageHeader, tc: &TcPayload, sender: NodeId, now: Instant) {
        match tc::on_tc(
            header,
            tc,
            sender,
            &self.neighbors,
            &mut self.duplicate,
            &mut self.topology,
            now,
            self.config.duplicate_hold,
        ) {
            Ok(outcome) => {
                if outcome.topology_dirty {
                    self.topology_dirty = true;
                }
                if let Some(forward) = outcome.forward {
                    if let Err(e) = self.queue.enqueue(forward, now) {
                        warn!("control queue full, dropping TC forward: {}", e);
                    }
                }
            }
            Err(e) => debug!("dropping TC from {}: {}", sender, e),
        }
    }

    /// Looks up the next hop towards `dest`, recomputing the routing table at most once if the
    /// cached entry is stale.
    pub fn get_next_hop(&mut self, dest: NodeId, now: Instant) -> NextHopOutcome {
        if dest == self.self_id {
            return NextHopOutcome::DestinationIsSelf;
        }
        if let Some(outcome) = self.fresh_route(dest, now) {
            return outcome;
        }
        self.routing.invalidate(dest);
        self.update_routing_table(now);
        if let Some(outcome) = self.fresh_route(dest, now) {
            return outcome;
        }
        if self.known_elsewhere(dest, now) {
            NextHopOutcome::NoRoute
        } else {
            NextHopOutcome::DestinationUnreachable
        }
    }

    fn fresh_route(&self, dest: NodeId, now: Instant) -> Option<NextHopOutcome> {
        let entry = self.routing.get(dest)?;
        let neighbor = self.neighbors.get(entry.next_hop)?;
        if !neighbor.is_sym() {
            return None;
        }
        if now.saturating_duration_since(neighbor.last_seen) >= self.config.hello_timeout {
            return None;
        }
        Some(NextHopOutcome::Found {
            next_hop: entry.next_hop,
            metric: entry.metric,
            hops: entry.hops,
        })
    }

    fn known_elsewhere(&self, dest: NodeId, now: Instant) -> bool {
        self.neighbors.get(dest).is_some()
            || self.topology.active(now).any(|l| l.from == dest || l.to == dest)
    }

    /// Sets (or clears) this node's own TDMA slot, used by the next originated HELLO.
    pub fn set_self_slot(&mut self, slot: Option<u32>) {
        self.slots.set_self_slot(slot);
    }

    /// Returns this node's own TDMA slot.
    pub fn get_self_slot(&self) -> Option<u32> {
        self.slots.get_self_slot()
    }

    /// Full read-only view of the computed routing table, for diagnostics.
    pub fn routing_table(&self) -> &[RoutingEntry] {
        self.routing.as_slice()
    }

    /// Diagnostic view of the two-hop nodes `neighbor` uniquely covered the last time MPR
    /// selection ran. `None` if `neighbor` is not currently an MPR.
    pub fn mpr_last_coverage(&self, neighbor: NodeId) -> Option<&HashSet<NodeId>> {
        self.mpr.last_coverage(neighbor)
    }

    /// Hands every currently queued message to `transport`, in FIFO order. `tick` only drains
    /// one message per call to keep a single tick's work bounded; a caller that wants the queue
    /// fully flushed (e.g. ahead of a clean shutdown) calls this directly instead.
    pub fn drain_queue_to<T: Transport>(&mut self, transport: &mut T) {
        while let Some(msg) = self.queue.pop() {
            transport.send(msg.payload);
        }
    }
}
