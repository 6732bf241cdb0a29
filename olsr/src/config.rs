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

//! # Engine configuration
//!
//! This module holds the tunable timing and capacity constants for one engine instance. They
//! are grouped in a single flat struct rather than a builder: none of these values interact with
//! each other or need incremental validation, so a plain `Default`-backed struct is the
//! idiomatic fit.

use std::time::Duration;

/// Tunable timing and capacity constants for one [`crate::engine::Engine`] instance.
///
/// `EngineConfig::default()` reproduces the reference constants exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Interval between periodic HELLO originations.
    pub hello_interval: Duration,
    /// Interval between periodic TC originations.
    pub tc_interval: Duration,
    /// A neighbor is removed if no HELLO was heard from it for this long.
    pub hello_timeout: Duration,
    /// Validity duration advertised on originated TC messages.
    pub tc_validity: Duration,
    /// How long an (originator, seq) pair is remembered for duplicate suppression.
    pub duplicate_hold: Duration,
    /// Maximum number of retries for a control message before it is dropped.
    pub max_retry_attempts: u8,
    /// Base retry backoff.
    pub retry_base: Duration,
    /// Cap on the exponential retry backoff.
    pub max_retry_interval: Duration,
    /// A TDMA slot reservation is purged if not refreshed for this long.
    pub slot_reservation_timeout: Duration,
    /// Maximum number of one-hop neighbor entries.
    pub max_neighbors: usize,
    /// Maximum number of two-hop entries.
    pub max_two_hop: usize,
    /// Maximum number of directed topology links.
    pub max_topology_links: usize,
    /// Maximum number of TDMA slot reservations tracked (1- and 2-hop).
    pub max_slot_reservations: usize,
    /// Maximum number of remembered `(originator, seq)` duplicate-suppression entries.
    pub max_duplicate_entries: usize,
    /// Capacity of the outbound control queue.
    pub control_queue_capacity: usize,
    /// Period at which neighbor-timeout scanning runs.
    pub timeout_scan_interval: Duration,
    /// Period at which duplicate/topology/queue cleanup runs.
    pub cleanup_interval: Duration,
    /// Fixed upper bound on how long a control message may sit in the queue.
    pub control_message_max_age: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            hello_interval: Duration::from_secs(2),
            tc_interval: Duration::from_secs(5),
            hello_timeout: Duration::from_secs(6),
            tc_validity: Duration::from_secs(15),
            duplicate_hold: Duration::from_secs(30),
            max_retry_attempts: 3,
            retry_base: Duration::from_secs(2),
            max_retry_interval: Duration::from_secs(16),
            slot_reservation_timeout: Duration::from_secs(30),
            max_neighbors: 40,
            max_two_hop: 100,
            max_topology_links: 40 * 40,
            max_slot_reservations: 40 * 2,
            max_duplicate_entries: 128,
            control_queue_capacity: 64,
            timeout_scan_interval: Duration::from_secs(1),
            cleanup_interval: Duration::from_secs(30),
            control_message_max_age: Duration::from_secs(60),
        }
    }
}
