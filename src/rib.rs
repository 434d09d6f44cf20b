//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The top-level facade tying every component together: the RouteStore, its
//! companion Source/Neighbour tables, and the external collaborators named
//! in spec §6, each injected as a generic parameter the way `holo-rip` is
//! generic over its `Version` trait.

use crate::address::{Clock, Prefix};
use crate::config::Config;
use crate::filter::InputFilter;
use crate::kernel::KernelFib;
use crate::message::MessageIo;
use crate::neighbor::NeighbourTable;
use crate::request::RequestTable;
use crate::route::RouteStore;
use crate::source::SourceTable;
use crate::xroute::XrouteTable;

/// The route table core of a Babel speaker, generic over every external
/// collaborator from spec §6.
pub struct Rib<K, M, X, R, F, C>
where
    K: KernelFib,
    M: MessageIo,
    X: XrouteTable,
    R: RequestTable,
    F: InputFilter,
    C: Clock,
{
    pub config: Config,
    pub sources: SourceTable,
    pub neighbours: NeighbourTable,
    pub routes: RouteStore,
    pub kernel: K,
    pub messages: M,
    pub xroutes: X,
    pub requests: R,
    pub filter: F,
    pub clock: C,
}

impl<K, M, X, R, F, C> Rib<K, M, X, R, F, C>
where
    K: KernelFib,
    M: MessageIo,
    X: XrouteTable,
    R: RequestTable,
    F: InputFilter,
    C: Clock,
{
    pub fn new(config: Config, kernel: K, messages: M, xroutes: X, requests: R, filter: F, clock: C) -> Self {
        Rib {
            config,
            sources: SourceTable::new(),
            neighbours: NeighbourTable::new(),
            routes: RouteStore::new(),
            kernel,
            messages,
            xroutes,
            requests,
            filter,
            clock,
        }
    }

    pub(crate) fn now(&self) -> u32 {
        self.clock.now()
    }

    /// `hash_id` of the origin behind a Source handle, or `0` if the Source
    /// is gone (shouldn't happen while any Route references it, but the
    /// cascading callbacks re-read state defensively per spec §5).
    pub(crate) fn origin_hash(&self, src: crate::source::SourceHandle) -> u64 {
        self.sources
            .get(src)
            .map(|s| crate::address::hash_id(&s.origin))
            .unwrap_or(0)
    }

    pub(crate) fn prefix_of(&self, src: crate::source::SourceHandle) -> Option<Prefix> {
        self.sources.get(src).map(|s| s.prefix)
    }

    /// Shutdown teardown (spec §4.14/§5): uninstall every installed Route,
    /// without flushing the table (the process is exiting).
    pub fn shutdown(&mut self) {
        for handle in self.routes.handles() {
            crate::installer::uninstall_route(
                &mut self.routes,
                &self.sources,
                &self.neighbours,
                &mut self.kernel,
                &self.config,
                handle,
            );
        }
    }
}
