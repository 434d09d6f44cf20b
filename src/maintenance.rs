//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Bulk recomputation (spec §4.12): metric recalculation triggered by a
//! neighbour or interface cost change, and the periodic expiry/GC sweep.

use crate::address::{self, Clock};
use crate::debug::Debug;
use crate::filter::InputFilter;
use crate::installer;
use crate::kernel::KernelFib;
use crate::message::MessageIo;
use crate::metric::{self, Metric};
use crate::neighbor::NeighbourHandle;
use crate::request::RequestTable;
use crate::rib::Rib;
use crate::route::RouteHandle;
use crate::xroute::XrouteTable;

impl<K, M, X, R, F, C> Rib<K, M, X, R, F, C>
where
    K: KernelFib,
    M: MessageIo,
    X: XrouteTable,
    R: RequestTable,
    F: InputFilter,
    C: Clock,
{
    /// `update_route_metric(r)` (spec §4.12): if `r` has gone stale, force
    /// it to `INFINITY` and bump its seqno once; otherwise recompute its
    /// metric from the current neighbour cost. Either way, push the result
    /// through the Installer and `trigger_route_change`.
    pub fn update_route_metric(&mut self, handle: RouteHandle) {
        let now = self.now();
        let Some((oldmetric, oldsrc)) = self.routes.get(handle).map(|r| (r.metric, r.src)) else {
            return;
        };
        let Some(time) = self.routes.get(handle).map(|r| r.time) else {
            return;
        };

        let new_metric = if now.saturating_sub(time) > self.config.route_timeout_delay {
            let already_retracted = self.routes.get(handle).is_some_and(|r| r.refmetric.is_infinite());
            if !already_retracted {
                let bumped_seqno = self.sources.get(oldsrc).map(|s| address::seqno_plus(s.seqno, 1));
                if let Some(seqno) = bumped_seqno {
                    if let Some(route) = self.routes.get_mut(handle) {
                        route.refmetric = Metric::INFINITY;
                        route.seqno = seqno;
                    }
                }
            }
            Metric::INFINITY
        } else {
            let Some((refmetric, neigh)) = self.routes.get(handle).map(|r| (r.refmetric, r.neigh)) else {
                return;
            };
            let neighbour_cost = self.neighbours.cost(neigh);
            metric::effective_metric(refmetric, neighbour_cost, Metric::new(0))
        };

        installer::change_route_metric(
            &mut self.routes,
            &self.sources,
            &self.neighbours,
            &mut self.kernel,
            &self.config,
            handle,
            new_metric,
        );
        self.trigger_route_change(handle, oldsrc, oldmetric);
    }

    /// `update_neighbour_metric(neigh)` (spec §4.12): applied whenever the
    /// (out-of-scope) hello/IHU logic changes a neighbour's estimated cost.
    pub fn update_neighbour_metric(&mut self, neigh: NeighbourHandle) {
        let handles: Vec<RouteHandle> = self
            .routes
            .iter()
            .filter(|(_, r)| r.neigh == neigh)
            .map(|(h, _)| h)
            .collect();
        for handle in handles {
            self.update_route_metric(handle);
        }
    }

    /// `update_network_metric(net)` (spec §4.12): applied to every Route
    /// whose neighbour shares the given interface. "Network" is this
    /// crate's minimal `NeighbourTable` standing in as `ifindex`, since no
    /// richer network grouping is modelled here.
    pub fn update_network_metric(&mut self, ifindex: u32) {
        let handles: Vec<RouteHandle> = self
            .routes
            .iter()
            .filter(|(_, r)| self.neighbours.get(r.neigh).is_some_and(|n| n.ifindex == ifindex))
            .map(|(h, _)| h)
            .collect();
        for handle in handles {
            self.update_route_metric(handle);
        }
    }

    /// `expire_routes()` (spec §4.12): flushes Routes older than
    /// `route_gc_delay`; otherwise recomputes their metric and, for an
    /// installed Route nearing its timeout, pings the advertising neighbour
    /// for a refresh.
    pub fn expire_routes(&mut self) {
        let now = self.now();
        let handles = self.routes.handles();

        for handle in handles {
            let Some(src) = self.routes.get(handle).map(|r| r.src) else {
                continue;
            };
            let Some(prefix) = self.prefix_of(src) else {
                continue;
            };
            let Some(neigh) = self.routes.get(handle).map(|r| r.neigh) else {
                continue;
            };
            let Some(ifindex) = self.neighbours.get(neigh).map(|n| n.ifindex) else {
                continue;
            };
            let Some(time) = self.routes.get(handle).map(|r| r.time) else {
                continue;
            };

            if now.saturating_sub(time) > self.config.route_gc_delay {
                let outcome = self.routes.flush_route(
                    handle,
                    prefix,
                    ifindex,
                    &mut self.kernel,
                    self.config.kernel_base_metric,
                    self.config.kernel_infinity,
                );
                if let Some(outcome) = outcome {
                    Debug::RouteGcTimeout(&prefix).log();
                    if outcome.was_installed {
                        self.route_lost(outcome.old_src, outcome.old_metric);
                    }
                }
                continue;
            }

            self.update_route_metric(handle);

            let Some((installed, refmetric, seqno)) =
                self.routes.get(handle).map(|r| (r.installed, r.refmetric, r.seqno))
            else {
                continue;
            };
            let Some(time) = self.routes.get(handle).map(|r| r.time) else {
                continue;
            };
            let threshold = self.config.refresh_ping_threshold();
            if installed && !refmetric.is_infinite() && now.saturating_sub(time) > threshold {
                Debug::RouteTimeout(&prefix).log();
                self.messages.send_unicast_request(neigh, prefix, seqno);
            }
        }
    }
}
