//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The RouteStore (spec §3/§4.1): the flat collection of `Route` records.
//!
//! Stable references (spec §9 Design Notes, option (a)): Routes live in a
//! `generational_arena::Arena`, wrapped the way `holo-ospf`'s collections
//! module wraps its arenas. A [`RouteHandle`] stays valid exactly as long as
//! the Route it names hasn't been flushed; using a stale handle is a silent
//! lookup miss (`None`), never dangling-pointer UB, which is what makes the
//! "repeats the current index after removal" iteration discipline from
//! spec.md §5 unnecessary here — callers collect handles up front and
//! re-validate with `get`/`get_mut` before acting on each one.

use bitflags::bitflags;
use generational_arena::Arena;

use crate::address::{Address, Prefix};
use crate::config::Config;
use crate::debug::Debug;
use crate::error::KernelError;
use crate::feasibility::route_feasible;
use crate::kernel::{KernelFib, KernelOp, KernelRoute};
use crate::metric::{self, Metric};
use crate::neighbor::{NeighbourHandle, NeighbourTable};
use crate::source::{SourceHandle, SourceTable};

pub type RouteHandle = generational_arena::Index;

bitflags! {
    /// Bookkeeping bits the (out-of-scope) output layer would consult to
    /// decide whether a Route needs advertising this round.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct RouteFlags: u8 {
        /// Set whenever a Route is created or refreshed; cleared once it's
        /// been advertised.
        const CHANGED = 0x01;
    }
}

#[derive(Clone, Debug)]
pub struct Route {
    pub src: SourceHandle,
    pub neigh: NeighbourHandle,
    pub nexthop: Address,
    pub refmetric: Metric,
    pub seqno: u16,
    pub metric: Metric,
    pub time: u32,
    pub origtime: u32,
    pub installed: bool,
    pub flags: RouteFlags,
}

impl Route {
    pub(crate) fn new(
        src: SourceHandle,
        neigh: NeighbourHandle,
        nexthop: Address,
        refmetric: Metric,
        seqno: u16,
        metric: Metric,
        now: u32,
    ) -> Self {
        Route {
            src,
            neigh,
            nexthop,
            refmetric,
            seqno,
            metric,
            time: now,
            origtime: now,
            installed: false,
            flags: RouteFlags::CHANGED,
        }
    }

    /// `metric_to_kernel` applied to this Route's current metric (spec §4.3).
    pub fn kernel_route(&self, prefix: Prefix, ifindex: u32, base: u32, infinity: u32) -> KernelRoute {
        KernelRoute {
            prefix,
            nexthop: self.nexthop,
            ifindex,
            kernel_metric: metric::kernel_metric(self.metric, base, infinity),
        }
    }
}

#[derive(Debug, Default)]
pub struct RouteStore {
    arena: Arena<Route>,
}

/// Result of [`RouteStore::flush_route`]: whether the removed Route was
/// installed, and if so the `(src, metric)` pair `route_lost` needs (spec
/// §3 Lifecycle, "Destruction always goes through a single `flush_route`
/// path").
pub struct FlushOutcome {
    pub was_installed: bool,
    pub old_src: SourceHandle,
    pub old_metric: Metric,
}

impl RouteStore {
    pub fn new() -> Self {
        RouteStore::default()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn get(&self, handle: RouteHandle) -> Option<&Route> {
        self.arena.get(handle)
    }

    pub fn get_mut(&mut self, handle: RouteHandle) -> Option<&mut Route> {
        self.arena.get_mut(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RouteHandle, &Route)> {
        self.arena.iter()
    }

    /// Handles of every Route in the table, as a snapshot. Used by callers
    /// that need to iterate while possibly flushing entries (spec §5
    /// iteration discipline).
    pub fn handles(&self) -> Vec<RouteHandle> {
        self.arena.iter().map(|(h, _)| h).collect()
    }

    /// `find_route(prefix, plen, neigh, nexthop)` (spec §4.1): linear scan
    /// matching `neigh` and exact `nexthop`, with prefix equality checked
    /// via the Source (same Source implies same prefix).
    pub fn find_route(
        &self,
        sources: &SourceTable,
        prefix: &Prefix,
        neigh: NeighbourHandle,
        nexthop: &Address,
    ) -> Option<RouteHandle> {
        self.arena.iter().find_map(|(handle, route)| {
            if route.neigh != neigh || &route.nexthop != nexthop {
                return None;
            }
            let src = sources.get(route.src)?;
            (&src.prefix == prefix).then_some(handle)
        })
    }

    /// `find_installed_route(prefix, plen)` (spec §4.1).
    pub fn find_installed_route(
        &self,
        sources: &SourceTable,
        prefix: &Prefix,
    ) -> Option<RouteHandle> {
        self.arena.iter().find_map(|(handle, route)| {
            if !route.installed {
                return None;
            }
            let src = sources.get(route.src)?;
            (&src.prefix == prefix).then_some(handle)
        })
    }

    /// Inserts a new Route, enforcing `MAX_ROUTES` at the call site (the
    /// Update Handler is responsible for running `drop_some_routes` first;
    /// see spec §4.6 Case B).
    pub fn insert(&mut self, route: Route, max_routes: usize) -> Option<RouteHandle> {
        if self.arena.len() >= max_routes {
            return None;
        }
        Some(self.arena.insert(route))
    }

    /// `flush_route(route)` (spec §4.1/§3 Lifecycle): removes from the
    /// table; if installed, first uninstalls from the FIB. Does NOT call
    /// `route_lost` itself (that needs the Selector and Message I/O, which
    /// live above this module) — the caller is expected to do so when
    /// `was_installed` is true, per spec.md's single-path destruction rule.
    pub fn flush_route(
        &mut self,
        handle: RouteHandle,
        prefix: Prefix,
        ifindex: u32,
        kernel: &mut dyn KernelFib,
        kernel_base_metric: u32,
        kernel_infinity: u32,
    ) -> Option<FlushOutcome> {
        let route = self.arena.get(handle)?.clone();
        Debug::RouteFlush(&prefix).log();

        let was_installed = route.installed;
        if was_installed {
            let kroute = route.kernel_route(prefix, ifindex, kernel_base_metric, kernel_infinity);
            // FLUSH unconditionally forces `installed = false` even on
            // failure (spec §4.5/§7): the entry is leaving the table either
            // way, so there is nothing left in memory to keep in sync.
            let _: Result<(), KernelError> = kernel.route(KernelOp::Flush, kroute, None);
            Debug::RouteUninstall(&prefix).log();
        }

        self.arena.remove(handle);

        Some(FlushOutcome {
            was_installed,
            old_src: route.src,
            old_metric: route.metric,
        })
    }

    /// `flush_neighbour_routes(neigh)` (spec §4.1): drops every Route whose
    /// `neigh` is `neigh`. Removal order is unspecified; each removal still
    /// goes through `flush_route`.
    pub fn flush_neighbour_routes(
        &mut self,
        sources: &SourceTable,
        neighbours: &NeighbourTable,
        kernel: &mut dyn KernelFib,
        config: &Config,
        neigh: NeighbourHandle,
    ) -> Vec<FlushOutcome> {
        let victims: Vec<RouteHandle> = self
            .arena
            .iter()
            .filter(|(_, route)| route.neigh == neigh)
            .map(|(handle, _)| handle)
            .collect();

        let mut outcomes = Vec::new();
        for handle in victims {
            self.evict(sources, neighbours, kernel, config, handle, &mut outcomes);
        }
        outcomes
    }

    /// `drop_some_routes` (spec §4.1): capacity-pressure eviction, run when
    /// the store is full and a new Route needs room. Three passes, stopping
    /// as soon as there is room for one more Route.
    pub fn drop_some_routes(
        &mut self,
        sources: &SourceTable,
        neighbours: &NeighbourTable,
        kernel: &mut dyn KernelFib,
        config: &Config,
        now: u32,
    ) -> Vec<FlushOutcome> {
        let mut outcomes = Vec::new();
        let has_room = |store: &Self| store.arena.len() < config.max_routes;

        // Pass 1: uninstalled and older than the capacity-pass age.
        let victims: Vec<RouteHandle> = self
            .arena
            .iter()
            .filter(|(_, r)| !r.installed && now.saturating_sub(r.time) > config.capacity_pass_age)
            .map(|(h, _)| h)
            .collect();
        for handle in victims {
            if has_room(self) {
                break;
            }
            self.evict(sources, neighbours, kernel, config, handle, &mut outcomes);
        }
        if has_room(self) {
            return outcomes;
        }

        // Pass 2: retractions (metric >= INFINITY) older than the
        // capacity-pass age.
        let victims: Vec<RouteHandle> = self
            .arena
            .iter()
            .filter(|(_, r)| r.metric.is_infinite() && now.saturating_sub(r.time) > config.capacity_pass_age)
            .map(|(h, _)| h)
            .collect();
        for handle in victims {
            if has_room(self) {
                break;
            }
            self.evict(sources, neighbours, kernel, config, handle, &mut outcomes);
        }
        if has_room(self) {
            return outcomes;
        }

        // Pass 3: a single unfeasible Route.
        if let Some(handle) = self
            .arena
            .iter()
            .find(|(_, r)| !route_feasible(sources, r, now, config.source_stale_delay))
            .map(|(h, _)| h)
        {
            self.evict(sources, neighbours, kernel, config, handle, &mut outcomes);
        }
        if has_room(self) {
            return outcomes;
        }

        // Pass 4: a single uninstalled Route.
        if let Some(handle) = self.arena.iter().find(|(_, r)| !r.installed).map(|(h, _)| h) {
            self.evict(sources, neighbours, kernel, config, handle, &mut outcomes);
        }

        outcomes
    }

    /// Resolves the `(prefix, ifindex)` a Route needs for a kernel FLUSH,
    /// then flushes it, recording the outcome if the removal took place.
    fn evict(
        &mut self,
        sources: &SourceTable,
        neighbours: &NeighbourTable,
        kernel: &mut dyn KernelFib,
        config: &Config,
        handle: RouteHandle,
        outcomes: &mut Vec<FlushOutcome>,
    ) {
        let Some(route) = self.arena.get(handle) else {
            return;
        };
        let Some(prefix) = sources.get(route.src).map(|s| s.prefix) else {
            return;
        };
        let Some(ifindex) = neighbours.get(route.neigh).map(|n| n.ifindex) else {
            return;
        };
        if let Some(outcome) =
            self.flush_route(handle, prefix, ifindex, kernel, config.kernel_base_metric, config.kernel_infinity)
        {
            outcomes.push(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceTable;

    fn neigh(n: u32) -> NeighbourHandle {
        // Arena indices aren't directly constructible; tests route through
        // a real NeighbourTable / SourceTable elsewhere. This helper module
        // only exercises pure-store behaviour via a throwaway source table.
        let mut table = crate::neighbor::NeighbourTable::new();
        for _ in 0..n {
            table.insert([0u8; 16], 0, Metric::new(0));
        }
        table.insert([0u8; 16], n, Metric::new(0))
    }

    #[test]
    fn insert_respects_capacity() {
        let mut store = RouteStore::new();
        let mut sources = SourceTable::new();
        let prefix = Prefix::from_v4([10, 0, 0, 0], 24);
        let src = sources.find_source([1u8; 16], prefix, true, 0, 0).unwrap();
        let n1 = neigh(1);

        let route = Route::new(src, n1, [2u8; 16], Metric::new(10), 1, Metric::new(10), 0);
        assert!(store.insert(route.clone(), 1).is_some());
        assert!(store.insert(route, 1).is_none());
    }

    #[test]
    fn find_route_matches_on_neigh_and_nexthop_and_prefix() {
        let mut store = RouteStore::new();
        let mut sources = SourceTable::new();
        let prefix = Prefix::from_v4([10, 0, 0, 0], 24);
        let src = sources.find_source([1u8; 16], prefix, true, 0, 0).unwrap();
        let n1 = neigh(1);
        let nexthop = [2u8; 16];

        let route = Route::new(src, n1, nexthop, Metric::new(10), 1, Metric::new(10), 0);
        let handle = store.insert(route, 10).unwrap();

        assert_eq!(
            store.find_route(&sources, &prefix, n1, &nexthop),
            Some(handle)
        );
        assert_eq!(store.find_route(&sources, &prefix, n1, &[9u8; 16]), None);
    }

    #[test]
    fn flush_route_removes_and_reports_install_state() {
        let mut store = RouteStore::new();
        let mut sources = SourceTable::new();
        let mut kernel = crate::kernel::FakeKernel::new();
        let prefix = Prefix::from_v4([10, 0, 0, 0], 24);
        let src = sources.find_source([1u8; 16], prefix, true, 0, 0).unwrap();
        let n1 = neigh(1);

        let mut route = Route::new(src, n1, [2u8; 16], Metric::new(10), 1, Metric::new(10), 0);
        route.installed = true;
        let handle = store.insert(route, 10).unwrap();

        let outcome = store
            .flush_route(handle, prefix, 1, &mut kernel, 0, 0xFFFF)
            .unwrap();
        assert!(outcome.was_installed);
        assert!(store.get(handle).is_none());
    }

    #[test]
    fn flush_neighbour_routes_drops_only_matching_neighbour() {
        let mut store = RouteStore::new();
        let mut sources = SourceTable::new();
        let mut neighbours = NeighbourTable::new();
        let mut kernel = crate::kernel::FakeKernel::new();
        let prefix = Prefix::from_v4([10, 0, 0, 0], 24);
        let src = sources.find_source([1u8; 16], prefix, true, 0, 0).unwrap();
        let n1 = neighbours.insert([2u8; 16], 1, Metric::new(0));
        let n2 = neighbours.insert([3u8; 16], 2, Metric::new(0));
        let config = Config::default();

        let via_n1 = Route::new(src, n1, [8u8; 16], Metric::new(0), 1, Metric::new(10), 0);
        let via_n2 = Route::new(src, n2, [9u8; 16], Metric::new(0), 1, Metric::new(10), 0);
        let h1 = store.insert(via_n1, 10).unwrap();
        let h2 = store.insert(via_n2, 10).unwrap();

        let outcomes = store.flush_neighbour_routes(&sources, &neighbours, &mut kernel, &config, n1);
        assert_eq!(outcomes.len(), 1);
        assert!(store.get(h1).is_none());
        assert!(store.get(h2).is_some());
    }

    #[test]
    fn drop_some_routes_prefers_old_uninstalled_then_stops_once_room_exists() {
        let mut store = RouteStore::new();
        let mut sources = SourceTable::new();
        let mut neighbours = NeighbourTable::new();
        let mut kernel = crate::kernel::FakeKernel::new();
        let prefix = Prefix::from_v4([10, 0, 0, 0], 24);
        let src = sources.find_source([1u8; 16], prefix, true, 0, 0).unwrap();
        sources.record_feasible(src, 1, Metric::new(10), 0);
        let n1 = neighbours.insert([2u8; 16], 1, Metric::new(0));

        let config = Config {
            max_routes: 2,
            capacity_pass_age: 90,
            ..Config::default()
        };

        // Old, uninstalled: pass 1 should evict this first.
        let stale = Route::new(src, n1, [8u8; 16], Metric::new(0), 1, Metric::new(10), 0);
        let stale_handle = store.insert(stale, 10).unwrap();
        // Fresh, installed: must survive.
        let mut fresh = Route::new(src, n1, [9u8; 16], Metric::new(0), 1, Metric::new(20), 200);
        fresh.installed = true;
        let fresh_handle = store.insert(fresh, 10).unwrap();

        let now = 200;
        let outcomes = store.drop_some_routes(&sources, &neighbours, &mut kernel, &config, now);

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].was_installed);
        assert!(store.get(stale_handle).is_none());
        assert!(store.get(fresh_handle).is_some());
        assert!(store.len() < config.max_routes);
    }
}
