//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Message I/O (spec §4.8/§6): outbound updates and seqno requests. Wire
//! format encode/decode and the unicast/multicast send path are out of scope
//! (spec.md §1); this module only specifies what gets sent, to whom.

use enum_as_inner::EnumAsInner;

use crate::address::Prefix;
use crate::neighbor::NeighbourHandle;

pub trait MessageIo {
    /// `send_update(neigh?, urgent, prefix, plen)` (spec §6). `neigh = None`
    /// means "broadcast to all neighbours" (the common case).
    fn send_update(&mut self, neigh: Option<NeighbourHandle>, urgent: bool, prefix: Prefix);

    /// `send_unicast_request(neigh, prefix, plen, seqno, hopcount, id)`
    /// (spec §6).
    fn send_unicast_request(&mut self, neigh: NeighbourHandle, prefix: Prefix, seqno: u16);

    /// `send_request_resend(prefix, plen, seqno, origin_hash)` (spec §6): a
    /// targeted seqno-resend request to the origin.
    fn send_request_resend(&mut self, prefix: Prefix, seqno: u16, origin_hash: u64);

    /// `send_request(neigh?, prefix, plen, seqno, hopcount, id)` (spec §6): a
    /// generic seqno request, optionally targeted at one neighbour.
    fn send_request(&mut self, neigh: Option<NeighbourHandle>, prefix: Prefix, seqno: u16);
}

/// What [`RecordingMessageIo`] recorded, for test assertions.
#[derive(Clone, Debug, Eq, EnumAsInner, PartialEq)]
pub enum OutboundMessage {
    Update { neigh: Option<NeighbourHandle>, urgent: bool, prefix: Prefix },
    UnicastRequest { neigh: NeighbourHandle, prefix: Prefix, seqno: u16 },
    RequestResend { prefix: Prefix, seqno: u16, origin_hash: u64 },
    Request { neigh: Option<NeighbourHandle>, prefix: Prefix, seqno: u16 },
}

/// A [`MessageIo`] that just records every call, for tests.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct RecordingMessageIo {
    pub sent: Vec<OutboundMessage>,
}

#[cfg(any(test, feature = "testing"))]
impl RecordingMessageIo {
    pub fn new() -> Self {
        RecordingMessageIo::default()
    }
}

#[cfg(any(test, feature = "testing"))]
impl MessageIo for RecordingMessageIo {
    fn send_update(&mut self, neigh: Option<NeighbourHandle>, urgent: bool, prefix: Prefix) {
        self.sent.push(OutboundMessage::Update { neigh, urgent, prefix });
    }

    fn send_unicast_request(&mut self, neigh: NeighbourHandle, prefix: Prefix, seqno: u16) {
        self.sent
            .push(OutboundMessage::UnicastRequest { neigh, prefix, seqno });
    }

    fn send_request_resend(&mut self, prefix: Prefix, seqno: u16, origin_hash: u64) {
        self.sent
            .push(OutboundMessage::RequestResend { prefix, seqno, origin_hash });
    }

    fn send_request(&mut self, neigh: Option<NeighbourHandle>, prefix: Prefix, seqno: u16) {
        self.sent.push(OutboundMessage::Request { neigh, prefix, seqno });
    }
}
