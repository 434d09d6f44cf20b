//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The Installer (spec §4.5): mediates kernel FIB operations and keeps each
//! Route's `installed` flag in sync with the kernel.

use crate::config::Config;
use crate::debug::Debug;
use crate::error::KernelError;
use crate::kernel::{KernelFib, KernelOp, KernelRoute};
use crate::metric::Metric;
use crate::neighbor::NeighbourTable;
use crate::route::{RouteHandle, RouteStore};
use crate::source::SourceTable;

fn kernel_route_for(
    routes: &RouteStore,
    sources: &SourceTable,
    neighbours: &NeighbourTable,
    config: &Config,
    handle: RouteHandle,
) -> Option<KernelRoute> {
    let route = routes.get(handle)?;
    let src = sources.get(route.src)?;
    let neigh = neighbours.get(route.neigh)?;
    Some(route.kernel_route(
        src.prefix,
        neigh.ifindex,
        config.kernel_base_metric,
        config.kernel_infinity,
    ))
}

/// `install_route(r)` (spec §4.5): no-op if already installed. `EEXIST` is
/// treated as success (the FIB is already in the desired state).
pub fn install_route(
    routes: &mut RouteStore,
    sources: &SourceTable,
    neighbours: &NeighbourTable,
    kernel: &mut dyn KernelFib,
    config: &Config,
    handle: RouteHandle,
) {
    if routes.get(handle).is_some_and(|r| r.installed) {
        return;
    }
    let Some(kroute) = kernel_route_for(routes, sources, neighbours, config, handle) else {
        return;
    };

    match kernel.route(KernelOp::Add, kroute, None) {
        Ok(()) | Err(KernelError::Exists) => {
            if let Some(route) = routes.get_mut(handle) {
                route.installed = true;
                Debug::RouteInstall(&kroute.prefix, &route.metric).log();
            }
        }
        Err(_) => {
            // Logged by the caller, which has the prefix/context to report;
            // in-memory state is left unchanged (spec §7).
        }
    }
}

/// `uninstall_route(r)` (spec §4.5): no-op if not installed. FLUSH
/// unconditionally clears `installed`, even on kernel failure.
pub fn uninstall_route(
    routes: &mut RouteStore,
    sources: &SourceTable,
    neighbours: &NeighbourTable,
    kernel: &mut dyn KernelFib,
    config: &Config,
    handle: RouteHandle,
) {
    if !routes.get(handle).is_some_and(|r| r.installed) {
        return;
    }
    if let Some(kroute) = kernel_route_for(routes, sources, neighbours, config, handle) {
        let _: Result<(), KernelError> = kernel.route(KernelOp::Flush, kroute, None);
        Debug::RouteUninstall(&kroute.prefix).log();
    }
    if let Some(route) = routes.get_mut(handle) {
        route.installed = false;
    }
}

/// `change_route(old, new)` (spec §4.5): atomic swap via a single MODIFY
/// when both routes exist and `old` is installed, avoiding the
/// uninstall/install race window (spec §9 Design Notes). Returns whether
/// `new` ended up installed.
pub fn change_route(
    routes: &mut RouteStore,
    sources: &SourceTable,
    neighbours: &NeighbourTable,
    kernel: &mut dyn KernelFib,
    config: &Config,
    old: Option<RouteHandle>,
    new: RouteHandle,
) -> bool {
    let Some(old) = old else {
        install_route(routes, sources, neighbours, kernel, config, new);
        return routes.get(new).is_some_and(|r| r.installed);
    };

    if !routes.get(old).is_some_and(|r| r.installed) {
        // Caller must not expect `new` to become installed: the in-memory
        // state claiming `old` is installed is stale (spec §4.5).
        return false;
    }

    let (Some(old_kroute), Some(new_kroute)) = (
        kernel_route_for(routes, sources, neighbours, config, old),
        kernel_route_for(routes, sources, neighbours, config, new),
    ) else {
        return false;
    };

    match kernel.route(KernelOp::Modify, old_kroute, Some(new_kroute)) {
        Ok(()) => {
            if let Some(route) = routes.get_mut(old) {
                route.installed = false;
            }
            if let Some(route) = routes.get_mut(new) {
                route.installed = true;
                Debug::RouteInstall(&new_kroute.prefix, &route.metric).log();
            }
            true
        }
        Err(_) => false,
    }
}

/// `change_route_metric(r, new_metric)` (spec §4.5): if installed, issue a
/// MODIFY preserving nexthop/ifindex but changing only the kernel metric;
/// on success update `r.metric`. If not installed, just update `r.metric`.
pub fn change_route_metric(
    routes: &mut RouteStore,
    sources: &SourceTable,
    neighbours: &NeighbourTable,
    kernel: &mut dyn KernelFib,
    config: &Config,
    handle: RouteHandle,
    new_metric: Metric,
) {
    let installed = routes.get(handle).is_some_and(|r| r.installed);
    if installed {
        let Some(kroute) = kernel_route_for(routes, sources, neighbours, config, handle) else {
            return;
        };
        let mut new_kroute = kroute;
        new_kroute.kernel_metric =
            crate::metric::kernel_metric(new_metric, config.kernel_base_metric, config.kernel_infinity);
        if kernel.route(KernelOp::Modify, kroute, Some(new_kroute)).is_err() {
            return;
        }
    }
    if let Some(route) = routes.get_mut(handle) {
        route.metric = new_metric;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::FakeKernel;
    use crate::neighbor::NeighbourTable;
    use crate::route::Route;
    use crate::source::SourceTable;
    use crate::address::Prefix;

    fn setup() -> (RouteStore, SourceTable, NeighbourTable, FakeKernel, Config, crate::address::Prefix) {
        (
            RouteStore::new(),
            SourceTable::new(),
            NeighbourTable::new(),
            FakeKernel::new(),
            Config::default(),
            Prefix::from_v4([10, 0, 0, 0], 24),
        )
    }

    #[test]
    fn install_then_noop_if_already_installed() {
        let (mut routes, mut sources, mut neighbours, mut kernel, config, prefix) = setup();
        let src = sources.find_source([1u8; 16], prefix, true, 1, 0).unwrap();
        let n1 = neighbours.insert([2u8; 16], 7, Metric::new(0));
        let route = Route::new(src, n1, [9u8; 16], Metric::new(0), 1, Metric::new(150), 0);
        let handle = routes.insert(route, 10).unwrap();

        install_route(&mut routes, &sources, &neighbours, &mut kernel, &config, handle);
        assert!(routes.get(handle).unwrap().installed);
        assert_eq!(kernel.installed_route(&prefix).unwrap().ifindex, 7);

        // Second call is a no-op (no panic, no duplicate kernel call needed).
        install_route(&mut routes, &sources, &neighbours, &mut kernel, &config, handle);
        assert!(routes.get(handle).unwrap().installed);
    }

    #[test]
    fn install_treats_eexist_as_success() {
        let (mut routes, mut sources, mut neighbours, mut kernel, config, prefix) = setup();
        let src = sources.find_source([1u8; 16], prefix, true, 1, 0).unwrap();
        let n1 = neighbours.insert([2u8; 16], 1, Metric::new(0));
        let route = Route::new(src, n1, [9u8; 16], Metric::new(0), 1, Metric::new(150), 0);
        let handle = routes.insert(route, 10).unwrap();

        kernel.inject_add_error = Some(KernelError::Exists);
        install_route(&mut routes, &sources, &neighbours, &mut kernel, &config, handle);
        assert!(routes.get(handle).unwrap().installed);
    }

    #[test]
    fn change_route_atomic_swap() {
        let (mut routes, mut sources, mut neighbours, mut kernel, config, prefix) = setup();
        let src = sources.find_source([1u8; 16], prefix, true, 1, 0).unwrap();
        let n1 = neighbours.insert([2u8; 16], 1, Metric::new(0));
        let n2 = neighbours.insert([3u8; 16], 2, Metric::new(0));

        let mut old_route = Route::new(src, n1, [9u8; 16], Metric::new(0), 1, Metric::new(150), 0);
        old_route.installed = true;
        let old = routes.insert(old_route, 10).unwrap();
        kernel.force_install(kernel_route_for(&routes, &sources, &neighbours, &config, old).unwrap());

        let new_route = Route::new(src, n2, [8u8; 16], Metric::new(0), 1, Metric::new(50), 0);
        let new = routes.insert(new_route, 10).unwrap();

        let ok = change_route(&mut routes, &sources, &neighbours, &mut kernel, &config, Some(old), new);
        assert!(ok);
        assert!(!routes.get(old).unwrap().installed);
        assert!(routes.get(new).unwrap().installed);
    }

    #[test]
    fn change_route_noop_if_old_not_installed() {
        let (mut routes, mut sources, mut neighbours, mut kernel, config, prefix) = setup();
        let src = sources.find_source([1u8; 16], prefix, true, 1, 0).unwrap();
        let n1 = neighbours.insert([2u8; 16], 1, Metric::new(0));
        let n2 = neighbours.insert([3u8; 16], 2, Metric::new(0));

        let old_route = Route::new(src, n1, [9u8; 16], Metric::new(0), 1, Metric::new(150), 0);
        let old = routes.insert(old_route, 10).unwrap();
        let new_route = Route::new(src, n2, [8u8; 16], Metric::new(0), 1, Metric::new(50), 0);
        let new = routes.insert(new_route, 10).unwrap();

        let ok = change_route(&mut routes, &sources, &neighbours, &mut kernel, &config, Some(old), new);
        assert!(!ok);
        assert!(!routes.get(new).unwrap().installed);
    }
}
