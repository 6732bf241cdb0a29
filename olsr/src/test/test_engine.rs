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

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::message::{
    HelloNeighbor, HelloPayload, OutgoingMessage, Payload, RecordingTransport, TcPayload,
    TcSelector,
};
use crate::route::NextHopOutcome;
use crate::types::{LinkStatus, MessageHeader, MessageType, NodeId, Willingness};
use std::time::{Duration, Instant};

fn hello_citing(ids: Vec<(NodeId, LinkStatus)>) -> HelloPayload {
    HelloPayload {
        hello_interval: 2,
        willingness: Willingness::Default,
        reserved_slot: None,
        neighbors: ids.into_iter().map(|(id, link_code)| HelloNeighbor { id, link_code }).collect(),
        two_hop: vec![],
    }
}

// Symmetric link sensing, from bare ASYM discovery through to a one-hop route.
#[test]
fn test_symmetric_link_sensing_from_asym_discovery() {
    let mut engine = Engine::new(NodeId(1), Willingness::Default, EngineConfig::default());
    let mut transport = RecordingTransport::default();
    let t0 = Instant::now();

    engine.on_hello(NodeId(2), &hello_citing(vec![]), t0);
    engine.tick(t0, &mut transport);

    let sent_hello = transport
        .sent
        .iter()
        .find_map(|m| match &m.payload {
            Payload::Hello(h) => Some(h.clone()),
            _ => None,
        })
        .expect("a HELLO must have been originated");
    assert_eq!(
        sent_hello.neighbors,
        vec![HelloNeighbor { id: NodeId(2), link_code: LinkStatus::Asym }]
    );

    let t1 = t0 + Duration::from_millis(1);
    engine.on_hello(NodeId(2), &hello_citing(vec![(NodeId(1), LinkStatus::Sym)]), t1);

    match engine.get_next_hop(NodeId(2), t1) {
        NextHopOutcome::Found { next_hop, metric, hops } => {
            assert_eq!(next_hop, NodeId(2));
            assert_eq!(metric, 1);
            assert_eq!(hops, 1);
        }
        other => panic!("expected Found, got {:?}", other),
    }

    let table = engine.routing_table();
    assert_eq!(table.len(), 1);
    assert_eq!(table[0].dest, NodeId(2));
}

// Link failure removes the neighbor and forces an emergency HELLO ahead of schedule.
#[test]
fn test_link_failure_triggers_emergency_hello() {
    let mut engine = Engine::new(NodeId(1), Willingness::Default, EngineConfig::default());
    let mut transport = RecordingTransport::default();
    let t0 = Instant::now();

    engine.on_hello(NodeId(2), &hello_citing(vec![(NodeId(1), LinkStatus::Sym)]), t0);
    assert!(matches!(engine.get_next_hop(NodeId(2), t0), NextHopOutcome::Found { .. }));

    // Advance past HELLO_TIMEOUT (6s default) without refreshing the neighbor.
    let t1 = t0 + Duration::from_secs(7);
    engine.tick(t1, &mut transport);

    assert!(matches!(
        engine.get_next_hop(NodeId(2), t1),
        NextHopOutcome::DestinationUnreachable
    ));

    let hello_count =
        transport.sent.iter().filter(|m| matches!(m.payload, Payload::Hello(_))).count();
    assert_eq!(hello_count, 1, "timeout must trigger an emergency HELLO bypassing the interval");
}

#[test]
fn test_get_next_hop_for_self() {
    let mut engine = Engine::new(NodeId(1), Willingness::Default, EngineConfig::default());
    let now = Instant::now();
    assert_eq!(engine.get_next_hop(NodeId(1), now), NextHopOutcome::DestinationIsSelf);
}

#[test]
fn test_next_wakeup_is_zero_with_pending_queue_work() {
    let mut engine = Engine::new(NodeId(1), Willingness::Default, EngineConfig::default());
    let mut transport = RecordingTransport::default();
    let now = Instant::now();

    // First tick originates HELLO/TC immediately (timers were backdated at construction).
    engine.tick(now, &mut transport);
    assert_eq!(engine.next_wakeup(now), Duration::from_secs(0));
}

fn tc_header(originator: NodeId, seq: u16) -> MessageHeader {
    MessageHeader { msg_type: MessageType::Tc, vtime: 15, originator, ttl: 5, hop_count: 0, seq }
}

#[test]
fn test_drain_queue_to_flushes_everything_in_fifo_order() {
    let mut engine = Engine::new(NodeId(1), Willingness::Default, EngineConfig::default());
    let mut transport = RecordingTransport::default();
    let now = Instant::now();

    // Neighbor 2 selects us as one of its MPRs, so its TCs get forwarded rather than dropped.
    engine.on_hello(NodeId(2), &hello_citing(vec![(NodeId(1), LinkStatus::MprNeigh)]), now);

    let tc = TcPayload { ansn: 1, selectors: vec![TcSelector { neighbor_id: NodeId(9) }] };
    engine.on_tc(&tc_header(NodeId(2), 1), &tc, NodeId(2), now);
    engine.on_tc(&tc_header(NodeId(2), 2), &tc, NodeId(2), now);

    engine.drain_queue_to(&mut transport);
    let forwarded: Vec<&OutgoingMessage> =
        transport.sent.iter().filter(|m| matches!(m.payload, Payload::Tc(_))).collect();
    assert_eq!(forwarded.len(), 2);
}

// dest appears in the topology database (so it is "known elsewhere") but no path to it exists
// from self through any currently-sym neighbor: a partition distinct from never-having-heard-of
// dest at all.
#[test]
fn test_get_next_hop_returns_no_route_for_unreachable_known_destination() {
    let mut engine = Engine::new(NodeId(1), Willingness::Default, EngineConfig::default());
    let now = Instant::now();

    let tc = TcPayload { ansn: 1, selectors: vec![TcSelector { neighbor_id: NodeId(6) }] };
    engine.on_tc(&tc_header(NodeId(5), 1), &tc, NodeId(5), now);

    assert_eq!(engine.get_next_hop(NodeId(5), now), NextHopOutcome::NoRoute);
}

#[test]
fn test_self_slot_round_trips() {
    let mut engine = Engine::new(NodeId(1), Willingness::Default, EngineConfig::default());
    assert_eq!(engine.get_self_slot(), None);
    engine.set_self_slot(Some(4));
    assert_eq!(engine.get_self_slot(), Some(4));
}
