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

//! Module containing all error types.
//!
//! `TableError` and `TcError` are the two subsystem error types the crate defines; `From` impls
//! let `?` flow from table operations into `TcError::Table` where TC processing uses them.
//! `Engine::on_hello`/`Engine::on_tc` are total functions: they absorb these errors by logging
//! and otherwise dropping the event, rather than surfacing them to the caller, so there is no
//! top-level error enum wrapping the two.

use crate::types::NodeId;
use thiserror::Error;

/// Names a bounded table, for `TableFull` reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    /// Neighbor table
    Neighbor,
    /// Two-hop table
    TwoHop,
    /// TDMA slot table
    Slot,
    /// Topology database
    Topology,
    /// Routing table
    Routing,
    /// Control queue
    ControlQueue,
    /// Duplicate-suppression table.
    Duplicate,
}

/// Errors raised by the bounded tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The table is at capacity; the insertion was rejected and no record was created.
    #[error("table {0:?} is full")]
    TableFull(Table),
}

/// Errors raised while processing an inbound TC message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TcError {
    /// `msg.type != TC` or `msg.body` was empty.
    #[error("malformed TC message: {0}")]
    Malformed(&'static str),
    /// `(originator, seq)` was already seen within the duplicate hold time.
    #[error("duplicate TC from {originator:?} seq {seq}")]
    Duplicate {
        /// Originator of the duplicate message.
        originator: NodeId,
        /// Sequence number of the duplicate message.
        seq: u16,
    },
    /// A table was full while processing the message.
    #[error("table error while processing TC: {0}")]
    Table(#[from] TableError),
}
