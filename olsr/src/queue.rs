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

//! # Control queue
//!
//! A bounded FIFO of outbound control messages with per-message retry metadata, backed by a
//! single `VecDeque` (array-backed with head/tail indices internally) rather than a pair of
//! separate structures for plain and retried entries.

use crate::error::{Table, TableError};
use crate::message::OutgoingMessage;
use crate::types::{MessageType, NodeId};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Retry metadata for a control message awaiting acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    /// Next time a retry should be attempted.
    pub next_retry_time: Instant,
    /// Number of retries attempted so far.
    pub retry_count: u8,
}

/// One outbound control message plus its queue bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlMessage {
    /// Type of the enqueued message.
    pub msg_type: MessageType,
    /// Time the message was enqueued.
    pub timestamp: Instant,
    /// Retry metadata, present only for messages enqueued via
    /// [`ControlQueue::enqueue_with_retry`].
    pub retry: Option<RetryState>,
    /// Destination the message is retried against, if any.
    pub destination_id: Option<NodeId>,
    /// The message itself.
    pub payload: OutgoingMessage,
}

/// Bounded FIFO of [`ControlMessage`]s.
#[derive(Debug, Clone)]
pub struct ControlQueue {
    messages: VecDeque<ControlMessage>,
    capacity: usize,
}

impl ControlQueue {
    /// Creates an empty queue with the given capacity.
    pub fn new(capacity: usize) -> Self {
        ControlQueue { messages: VecDeque::new(), capacity }
    }

    /// Appends a message with no retry tracking (used for HELLO/TC floods, which are
    /// fire-and-forget).
    pub fn enqueue(&mut self, payload: OutgoingMessage, now: Instant) -> Result<(), TableError> {
        self.push(ControlMessage {
            msg_type: msg_type_of(&payload),
            timestamp: now,
            retry: None,
            destination_id: None,
            payload,
        })
    }

    /// Appends a message that should be retried with exponential backoff if not acknowledged.
    pub fn enqueue_with_retry(
        &mut self,
        payload: OutgoingMessage,
        destination: NodeId,
        now: Instant,
        retry_base: Duration,
    ) -> Result<(), TableError> {
        self.push(ControlMessage {
            msg_type: msg_type_of(&payload),
            timestamp: now,
            retry: Some(RetryState { next_retry_time: now + retry_base, retry_count: 0 }),
            destination_id: Some(destination),
            payload,
        })
    }

    fn push(&mut self, msg: ControlMessage) -> Result<(), TableError> {
        if self.messages.len() >= self.capacity {
            return Err(TableError::TableFull(Table::ControlQueue));
        }
        self.messages.push_back(msg);
        Ok(())
    }

    /// Removes and returns the head of the queue, for handing to the transport.
    pub fn pop(&mut self) -> Option<ControlMessage> {
        self.messages.pop_front()
    }

    /// Number of messages currently queued.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if the queue holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Scans the queue for retry-tracked messages whose `next_retry_time` has elapsed.
    /// Exhausted messages (`retry_count >= max_retry_attempts`) are dropped; others have their
    /// `retry_count` incremented and `next_retry_time` pushed out by
    /// `min(retry_base * 2^retry_count, max_retry_interval)`.
    ///
    /// Returns the number of messages dropped due to retry exhaustion.
    pub fn process_retries(
        &mut self,
        now: Instant,
        max_retry_attempts: u8,
        retry_base: Duration,
        max_retry_interval: Duration,
    ) -> usize {
        let mut failed = 0;
        let mut remaining = VecDeque::with_capacity(self.messages.len());
        while let Some(mut msg) = self.messages.pop_front() {
            if let Some(state) = &mut msg.retry {
                if now >= state.next_retry_time {
                    if state.retry_count >= max_retry_attempts {
                        failed += 1;
                        continue;
                    }
                    state.retry_count += 1;
                    let backoff = retry_base
                        .checked_mul(1u32 << state.retry_count)
                        .unwrap_or(max_retry_interval);
                    state.next_retry_time = now + backoff.min(max_retry_interval);
                }
            }
            remaining.push_back(msg);
        }
        self.messages = remaining;
        failed
    }

    /// Drops any message older than `max_age`, and any retried message whose `retry_count`
    /// exceeds `max_retry_attempts`, independently of age. Returns the number removed.
    pub fn cleanup_expired(
        &mut self,
        now: Instant,
        max_age: Duration,
        max_retry_attempts: u8,
    ) -> usize {
        let before = self.messages.len();
        self.messages.retain(|m| {
            let too_old = now.saturating_duration_since(m.timestamp) > max_age;
            let retries_exhausted =
                m.retry.map_or(false, |state| state.retry_count > max_retry_attempts);
            !too_old && !retries_exhausted
        });
        before - self.messages.len()
    }
}

fn msg_type_of(payload: &OutgoingMessage) -> MessageType {
    payload.header.msg_type
}
