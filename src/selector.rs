//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The Selector (spec §4.4): picks the best feasible route for a prefix.

use crate::address::Prefix;
use crate::config::Config;
use crate::feasibility::route_feasible;
use crate::neighbor::NeighbourHandle;
use crate::route::{RouteHandle, RouteStore};
use crate::source::SourceTable;

/// `find_best_route(prefix, plen, feasible_only, exclude_neigh)` (spec
/// §4.4): the feasible (if requested), non-stale route for `prefix` with the
/// strictly smallest metric; ties broken by first-seen (scan order).
pub fn find_best_route(
    routes: &RouteStore,
    sources: &SourceTable,
    config: &Config,
    now: u32,
    prefix: &Prefix,
    feasible_only: bool,
    exclude_neigh: Option<NeighbourHandle>,
) -> Option<RouteHandle> {
    let mut best: Option<(RouteHandle, crate::metric::Metric)> = None;

    for (handle, route) in routes.iter() {
        let Some(src) = sources.get(route.src) else {
            continue;
        };
        if &src.prefix != prefix {
            continue;
        }
        if now.saturating_sub(route.time) > config.route_timeout_delay {
            continue;
        }
        if feasible_only && !route_feasible(sources, route, now, config.source_stale_delay) {
            continue;
        }
        if let Some(exclude) = exclude_neigh {
            if route.neigh == exclude {
                continue;
            }
        }
        match best {
            Some((_, best_metric)) if best_metric <= route.metric => {}
            _ => best = Some((handle, route.metric)),
        }
    }

    best.map(|(handle, _)| handle)
}

// ===== impl Rib: consider_route =====

use crate::address::Clock;
use crate::filter::InputFilter;
use crate::kernel::KernelFib;
use crate::message::MessageIo;
use crate::request::RequestTable;
use crate::rib::Rib;
use crate::xroute::XrouteTable;

/// Hysteresis threshold for switching away from a different source (spec
/// §4.7).
const HYSTERESIS_CROSS_SOURCE: u16 = 192;
/// Hysteresis threshold for switching to a better route from the same
/// source (spec §4.7).
const HYSTERESIS_SAME_SOURCE: u16 = 96;

impl<K, M, X, R, F, C> Rib<K, M, X, R, F, C>
where
    K: KernelFib,
    M: MessageIo,
    X: XrouteTable,
    R: RequestTable,
    F: InputFilter,
    C: Clock,
{
    /// `consider_route(route)` (spec §4.7): decides whether a feasible,
    /// freshly mutated Route should be installed in place of the current
    /// installed one (if any).
    pub fn consider_route(&mut self, candidate: RouteHandle) {
        let now = self.now();

        let Some((installed, candidate_src, candidate_metric)) =
            self.routes.get(candidate).map(|r| (r.installed, r.src, r.metric))
        else {
            return;
        };
        if installed {
            return;
        }
        let feasible = self
            .routes
            .get(candidate)
            .is_some_and(|r| route_feasible(&self.sources, r, now, self.config.source_stale_delay));
        if !feasible {
            return;
        }
        let Some(prefix) = self.prefix_of(candidate_src) else {
            return;
        };
        if self.xroutes.contains(&prefix) {
            return;
        }

        let cur = self.routes.find_installed_route(&self.sources, &prefix);
        let cur_info = cur.and_then(|h| self.routes.get(h).map(|r| (r.src, r.metric)));

        let should_install = match cur_info {
            None => true,
            Some((cur_src, cur_metric)) => {
                if candidate_metric.is_infinite() {
                    // Never install a retraction.
                    false
                } else if cur_metric.is_infinite() {
                    true
                } else if cur_metric.get() >= candidate_metric.plus(HYSTERESIS_CROSS_SOURCE).get() {
                    true
                } else if cur_src != candidate_src {
                    // Avoid switching sources below the cross-source
                    // threshold (source-stickiness).
                    false
                } else {
                    cur_metric.get() >= candidate_metric.plus(HYSTERESIS_SAME_SOURCE).get()
                }
            }
        };

        if !should_install {
            return;
        }

        let swapped = crate::installer::change_route(
            &mut self.routes,
            &self.sources,
            &self.neighbours,
            &mut self.kernel,
            &self.config,
            cur,
            candidate,
        );

        match cur_info {
            Some((old_src, old_metric)) if swapped => {
                self.send_triggered_update(candidate, old_src, old_metric);
            }
            _ => {
                self.messages.send_update(None, true, prefix);
                if let Some(route) = self.routes.get_mut(candidate) {
                    route.flags.remove(crate::route::RouteFlags::CHANGED);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Metric;
    use crate::neighbor::NeighbourTable;
    use crate::route::Route;

    fn setup() -> (RouteStore, SourceTable, NeighbourTable, Prefix, Config) {
        (
            RouteStore::new(),
            SourceTable::new(),
            NeighbourTable::new(),
            Prefix::from_v4([10, 0, 0, 0], 24),
            Config::default(),
        )
    }

    #[test]
    fn picks_smallest_metric() {
        let (mut routes, mut sources, mut neighbours, prefix, config) = setup();
        let src = sources.find_source([1u8; 16], prefix, true, 1, 0).unwrap();
        sources.record_feasible(src, 1, Metric::new(0), 0);
        let n1 = neighbours.insert([2u8; 16], 1, Metric::new(0));
        let n2 = neighbours.insert([3u8; 16], 2, Metric::new(0));

        let worse = Route::new(src, n1, [9u8; 16], Metric::new(0), 1, Metric::new(200), 0);
        let better = Route::new(src, n2, [8u8; 16], Metric::new(0), 1, Metric::new(50), 0);
        routes.insert(worse, 10);
        let better_handle = routes.insert(better, 10).unwrap();

        let best = find_best_route(&routes, &sources, &config, 0, &prefix, true, None);
        assert_eq!(best, Some(better_handle));
    }

    #[test]
    fn skips_stale_routes() {
        let (mut routes, mut sources, mut neighbours, prefix, config) = setup();
        let src = sources.find_source([1u8; 16], prefix, true, 1, 0).unwrap();
        sources.record_feasible(src, 1, Metric::new(0), 0);
        let n1 = neighbours.insert([2u8; 16], 1, Metric::new(0));

        let route = Route::new(src, n1, [9u8; 16], Metric::new(0), 1, Metric::new(50), 0);
        routes.insert(route, 10);

        let now = config.route_timeout_delay + 1;
        let best = find_best_route(&routes, &sources, &config, now, &prefix, true, None);
        assert_eq!(best, None);
    }

    #[test]
    fn excludes_neighbour() {
        let (mut routes, mut sources, mut neighbours, prefix, config) = setup();
        let src = sources.find_source([1u8; 16], prefix, true, 1, 0).unwrap();
        sources.record_feasible(src, 1, Metric::new(0), 0);
        let n1 = neighbours.insert([2u8; 16], 1, Metric::new(0));

        let route = Route::new(src, n1, [9u8; 16], Metric::new(0), 1, Metric::new(50), 0);
        routes.insert(route, 10);

        let best = find_best_route(&routes, &sources, &config, 0, &prefix, true, Some(n1));
        assert_eq!(best, None);
    }
}
