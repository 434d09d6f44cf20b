//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The Update Handler (spec §4.6) and the protocol-feedback cascade it feeds
//! into: triggered updates (§4.8), post-change reaction (§4.9), the loss
//! handler (§4.10), and the unfeasible-update request (§4.11).

use crate::address::{self, Address, Clock, Prefix};
use crate::debug::Debug;
use crate::error::Error;
use crate::feasibility::update_feasible;
use crate::filter::InputFilter;
use crate::installer;
use crate::kernel::KernelFib;
use crate::message::MessageIo;
use crate::metric::{self, Metric};
use crate::neighbor::NeighbourHandle;
use crate::request::RequestTable;
use crate::rib::Rib;
use crate::route::{Route, RouteFlags, RouteHandle};
use crate::selector::find_best_route;
use crate::source::SourceHandle;
use crate::xroute::XrouteTable;

/// Metric-jump threshold past which a triggered update is sent even if
/// nothing else made it urgent (spec §4.8).
const URGENT_JUMP: u16 = 512;
/// Metric-jump threshold past which an update is sent regardless of urgency
/// (spec §4.8).
const UPDATE_JUMP: u16 = 256;
/// Degradation threshold past which a seqno-resend, rather than a generic
/// request, is targeted at the origin (spec §4.8).
const RESEND_JUMP: u16 = 384;
/// Degradation threshold past which a generic request is sent (spec §4.8).
const REQUEST_JUMP: u16 = 288;
/// Metric-improvement threshold a candidate alternative must clear before
/// `trigger_route_change` bothers installing it (spec §4.9).
const REPLACEMENT_MARGIN: u16 = 96;
/// Metric-gap threshold past which `send_unfeasible_request` still asks for
/// a refresh even though a route is already installed (spec §4.11).
const UNFEASIBLE_MARGIN: u16 = 256;

impl<K, M, X, R, F, C> Rib<K, M, X, R, F, C>
where
    K: KernelFib,
    M: MessageIo,
    X: XrouteTable,
    R: RequestTable,
    F: InputFilter,
    C: Clock,
{
    /// `update_route(origin, prefix, plen, seqno, refmetric, neigh, nexthop)`
    /// (spec §4.6): ingests a received update, creating or mutating a Route.
    pub fn update_route(
        &mut self,
        origin: Address,
        prefix: Prefix,
        seqno: u16,
        refmetric: Metric,
        neigh: NeighbourHandle,
        nexthop: Address,
    ) -> Option<RouteHandle> {
        if address::martian_prefix(&prefix) {
            Error::MartianPrefix(prefix).log();
            return None;
        }

        let neighbour = self.neighbours.get(neigh)?;
        let neigh_id = neighbour.id;
        let ifindex = neighbour.ifindex;
        let neighbour_cost = self.neighbours.cost(neigh);

        let filter_add = self.filter.filter(&origin, &prefix, &neigh_id, ifindex);
        if filter_add.is_infinite() {
            Error::FilterRejected(prefix).log();
            return None;
        }

        let now = self.now();
        let Some(src) = self.sources.find_source(origin, prefix, true, seqno, now) else {
            Error::SourceAllocationFailed(prefix).log();
            return None;
        };

        let feasible = update_feasible(&self.sources, Some(src), seqno, refmetric, now, self.config.source_stale_delay);
        let computed_metric = metric::effective_metric(refmetric, neighbour_cost, filter_add);

        let existing = self.routes.find_route(&self.sources, &prefix, neigh, &nexthop);

        let result = match existing {
            Some(handle) => self.update_existing_route(handle, prefix, src, seqno, refmetric, computed_metric, feasible),
            None => self.create_new_route(prefix, src, neigh, nexthop, seqno, refmetric, computed_metric, feasible),
        };

        if feasible {
            // Raise the Source's high-water mark so later advertisements are
            // judged against what was just accepted, not against the
            // placeholder seeded when the Source was first allocated (spec
            // §4.2/§6, "per-origin seqno/metric high-water marks"). Done
            // only after the cascade above has run, so any `route_feasible`
            // re-derivation it performs on this very Route still sees the
            // pre-update Source state.
            self.sources.record_feasible(src, seqno, refmetric, now);
        }

        result
    }

    /// Case A of §4.6: an existing Route was found for `(prefix, neigh,
    /// nexthop)`.
    fn update_existing_route(
        &mut self,
        handle: RouteHandle,
        prefix: Prefix,
        src: SourceHandle,
        seqno: u16,
        refmetric: Metric,
        computed_metric: Metric,
        feasible: bool,
    ) -> Option<RouteHandle> {
        let (oldsrc, oldmetric, oldrefmetric, was_installed) = {
            let route = self.routes.get(handle)?;
            (route.src, route.metric, route.refmetric, route.installed)
        };

        let mut lost = false;
        if !feasible && was_installed {
            installer::uninstall_route(&mut self.routes, &self.sources, &self.neighbours, &mut self.kernel, &self.config, handle);
            lost = true;
        }

        let now = self.now();
        if let Some(route) = self.routes.get_mut(handle) {
            route.src = src;
            if feasible && !refmetric.is_infinite() {
                route.time = now;
                if oldrefmetric.is_infinite() {
                    route.origtime = now;
                }
            }
            route.seqno = seqno;
            route.refmetric = refmetric;
            route.flags.insert(RouteFlags::CHANGED);
        }

        installer::change_route_metric(
            &mut self.routes,
            &self.sources,
            &self.neighbours,
            &mut self.kernel,
            &self.config,
            handle,
            computed_metric,
        );

        if feasible {
            Debug::RouteRefresh(&prefix, &computed_metric).log();
            self.trigger_route_change(handle, oldsrc, oldmetric);
        } else {
            Debug::RouteUnfeasible(&prefix, &oldmetric, &refmetric).log();
            self.send_unfeasible_request(prefix, src, computed_metric);
        }

        if lost {
            self.route_lost(oldsrc, oldmetric);
        }

        Some(handle)
    }

    /// Case B of §4.6: no existing Route for `(prefix, neigh, nexthop)`.
    fn create_new_route(
        &mut self,
        prefix: Prefix,
        src: SourceHandle,
        neigh: NeighbourHandle,
        nexthop: Address,
        seqno: u16,
        refmetric: Metric,
        computed_metric: Metric,
        feasible: bool,
    ) -> Option<RouteHandle> {
        if !feasible {
            self.send_unfeasible_request(prefix, src, computed_metric);
            return None;
        }
        if refmetric.is_infinite() {
            Error::UnknownRetraction(prefix).log();
            return None;
        }

        if self.routes.len() >= self.config.max_routes {
            let now = self.now();
            let outcomes =
                self.routes.drop_some_routes(&self.sources, &self.neighbours, &mut self.kernel, &self.config, now);
            self.handle_flush_outcomes(outcomes);

            if self.routes.len() >= self.config.max_routes {
                Error::RouteTableFull(prefix).log();
                return None;
            }
        }

        let now = self.now();
        let route = Route::new(src, neigh, nexthop, refmetric, seqno, computed_metric, now);
        let handle = self.routes.insert(route, self.config.max_routes)?;
        Debug::RouteCreate(&prefix, &computed_metric).log();

        self.consider_route(handle);
        Some(handle)
    }

    /// `send_triggered_update` (spec §4.8): decides urgency and whether a
    /// companion seqno request should follow, given the installed Route's
    /// new state and the `(oldsrc, oldmetric)` it replaced or changed from.
    pub(crate) fn send_triggered_update(&mut self, handle: RouteHandle, oldsrc: SourceHandle, oldmetric: Metric) {
        let Some((src, newmetric, seqno)) = self.routes.get(handle).map(|r| (r.src, r.metric, r.seqno)) else {
            return;
        };
        let Some(prefix) = self.prefix_of(src) else {
            return;
        };

        let source_changed = src != oldsrc;
        let became_retraction = !oldmetric.is_infinite() && newmetric.is_infinite();
        let metric_jump = newmetric.get().abs_diff(oldmetric.get());

        let origin_hash = self.origin_hash(src);
        let outstanding_request = self.requests.unsatisfied(&prefix, seqno, origin_hash);

        let urgent = source_changed || became_retraction || metric_jump >= URGENT_JUMP || outstanding_request;

        Debug::TriggeredUpdate(&prefix, urgent).log();

        if urgent || metric_jump >= UPDATE_JUMP {
            self.messages.send_update(None, urgent, prefix);
            if let Some(route) = self.routes.get_mut(handle) {
                route.flags.remove(RouteFlags::CHANGED);
            }
        }

        if oldmetric.is_infinite() {
            return;
        }
        let degraded_severely = newmetric.is_infinite() || newmetric.get() >= oldmetric.get().saturating_add(RESEND_JUMP);
        let degraded = newmetric.get() >= oldmetric.get().saturating_add(REQUEST_JUMP);

        if !degraded_severely && !degraded {
            return;
        }
        let Some(source) = self.sources.get(oldsrc) else {
            return;
        };
        let resend_seqno = if source.metric.is_infinite() {
            source.seqno
        } else {
            address::seqno_plus(source.seqno, 1)
        };
        let origin_hash = address::hash_id(&source.origin);

        if degraded_severely {
            self.messages.send_request_resend(prefix, resend_seqno, origin_hash);
        } else {
            self.messages.send_request(None, prefix, resend_seqno);
        }
    }

    /// `trigger_route_change` (spec §4.9): if the Route is installed and its
    /// metric worsened, look for a strictly better feasible alternative; if
    /// one clears the hysteresis margin, give it a shot via `consider_route`.
    /// Then re-evaluate from scratch, since that cascading call may have
    /// changed what's installed.
    pub(crate) fn trigger_route_change(&mut self, handle: RouteHandle, oldsrc: SourceHandle, oldmetric: Metric) {
        let now = self.now();
        let Some(route_src) = self.routes.get(handle).map(|r| r.src) else {
            return;
        };
        let Some(prefix) = self.prefix_of(route_src) else {
            return;
        };
        let Some((installed, metric)) = self.routes.get(handle).map(|r| (r.installed, r.metric)) else {
            return;
        };

        if installed && metric.get() > oldmetric.get() {
            if let Some(candidate) = find_best_route(&self.routes, &self.sources, &self.config, now, &prefix, true, None) {
                if candidate != handle {
                    let candidate_metric = self.routes.get(candidate).map(|r| r.metric).unwrap_or(Metric::INFINITY);
                    if metric.get() >= candidate_metric.plus(REPLACEMENT_MARGIN).get() {
                        self.consider_route(candidate);
                    }
                }
            }
        }

        let still_installed = self.routes.get(handle).is_some_and(|r| r.installed);
        if still_installed {
            self.send_triggered_update(handle, oldsrc, oldmetric);
        } else {
            self.consider_route(handle);
        }
    }

    /// `route_lost` (spec §4.10): called whenever an uninstall happened.
    /// Finds the best feasible alternative and installs it if one exists;
    /// otherwise emits an urgent retraction update and, if `oldmetric` was
    /// finite, a seqno-resend request to the origin.
    pub(crate) fn route_lost(&mut self, oldsrc: SourceHandle, oldmetric: Metric) {
        let Some(prefix) = self.prefix_of(oldsrc) else {
            return;
        };
        let now = self.now();

        if let Some(alternative) = find_best_route(&self.routes, &self.sources, &self.config, now, &prefix, true, None) {
            self.consider_route(alternative);
            return;
        }

        self.messages.send_update(None, true, prefix);

        if !oldmetric.is_infinite() {
            if let Some(source) = self.sources.get(oldsrc) {
                let seqno = if source.metric.is_infinite() {
                    source.seqno
                } else {
                    address::seqno_plus(source.seqno, 1)
                };
                let origin_hash = address::hash_id(&source.origin);
                self.messages.send_request_resend(prefix, seqno, origin_hash);
            }
        }
    }

    /// `send_unfeasible_request` (spec §4.11): for an update deemed
    /// unfeasible, ask the origin to resend if there's no installed Route
    /// for the prefix, or the installed Route's metric doesn't clearly beat
    /// the unfeasible one.
    pub(crate) fn send_unfeasible_request(&mut self, prefix: Prefix, src: SourceHandle, unfeasible_metric: Metric) {
        let installed = self.routes.find_installed_route(&self.sources, &prefix);
        let should_request = match installed {
            None => true,
            Some(handle) => self
                .routes
                .get(handle)
                .is_some_and(|r| r.metric.get() >= unfeasible_metric.plus(UNFEASIBLE_MARGIN).get()),
        };
        if !should_request {
            return;
        }

        let Some(source) = self.sources.get(src) else {
            return;
        };
        let seqno = if source.metric.is_infinite() {
            source.seqno
        } else {
            address::seqno_plus(source.seqno, 1)
        };
        let origin_hash = address::hash_id(&source.origin);
        Debug::SeqnoRequest(&prefix).log();
        self.messages.send_request_resend(prefix, seqno, origin_hash);
    }

    /// Drains the `FlushOutcome`s returned by a `RouteStore` eviction pass,
    /// running `route_lost` for every one that had actually been installed
    /// (spec §3 Lifecycle, §4.1).
    pub(crate) fn handle_flush_outcomes(&mut self, outcomes: Vec<crate::route::FlushOutcome>) {
        for outcome in outcomes {
            if outcome.was_installed {
                self.route_lost(outcome.old_src, outcome.old_metric);
            }
        }
    }
}
