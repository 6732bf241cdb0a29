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

//! # Wire-adjacent message types and the transport boundary
//!
//! This module defines the *semantic* shape of what crosses the transport boundary: the engine
//! hands a transport typed [`OutgoingMessage`] values; it never constructs a byte-level frame.
//! Framing, header emission and transmission are the transport's job.

use crate::types::{LinkStatus, MessageHeader, NodeId, Willingness};

/// One neighbor entry as advertised in an outbound HELLO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloNeighbor {
    /// Neighbor id.
    pub id: NodeId,
    /// Link code: `Sym`, `Asym`, or `MprNeigh`. Never `Unspec`/`Lost` on the wire.
    pub link_code: LinkStatus,
}

/// One two-hop entry as advertised in an outbound HELLO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloTwoHop {
    /// The two-hop node.
    pub two_hop_id: NodeId,
    /// The one-hop neighbor it is reachable through.
    pub via_id: NodeId,
    /// The two-hop node's known slot reservation, if any.
    pub reserved_slot: Option<u32>,
}

/// Body of a HELLO message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloPayload {
    /// The interval, in seconds, at which this node sends HELLOs.
    pub hello_interval: u32,
    /// This node's willingness.
    pub willingness: Willingness,
    /// This node's own slot reservation, if any.
    pub reserved_slot: Option<u32>,
    /// Symmetric/asymmetric one-hop neighbors, with link codes.
    pub neighbors: Vec<HelloNeighbor>,
    /// Known two-hop neighbors, with their slots.
    pub two_hop: Vec<HelloTwoHop>,
}

/// One selector entry in a TC message: a neighbor that has chosen the originator as an MPR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcSelector {
    /// The selector's id.
    pub neighbor_id: NodeId,
}

/// Body of a TC message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcPayload {
    /// Advertised Neighbor Sequence Number for this originator.
    pub ansn: u32,
    /// The originator's current MPR-selector set.
    pub selectors: Vec<TcSelector>,
}

/// The body of a message, tagged by type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// HELLO body.
    Hello(HelloPayload),
    /// TC body.
    Tc(TcPayload),
}

/// A fully-formed outbound message, ready to hand to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Semantic OLSR header.
    pub header: MessageHeader,
    /// Message body.
    pub payload: Payload,
}

/// The transport boundary the engine drives. A real implementation frames and transmits; tests
/// use a recording mock.
pub trait Transport {
    /// Hand one outbound message to the transport.
    fn send(&mut self, msg: OutgoingMessage);
}

/// A [`Transport`] that simply records everything it is given, for tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingTransport {
    /// Every message handed to `send`, in order.
    pub sent: Vec<OutgoingMessage>,
}

impl Transport for RecordingTransport {
    fn send(&mut self, msg: OutgoingMessage) {
        self.sent.push(msg);
    }
}
