//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The kernel FIB adapter (spec §4.5/§6): add/modify/flush of routes in the
//! OS forwarding table. No real netlink/syscall backend ships in this crate;
//! that plumbing belongs to the (out of scope) southbound layer.

use crate::address::{Address, Prefix};
use crate::error::KernelError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KernelOp {
    Add,
    Flush,
    Modify,
}

/// A single kernel route, the unit the Installer asks to have added, flushed
/// or (for `Modify`) replaced by a second one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KernelRoute {
    pub prefix: Prefix,
    pub nexthop: Address,
    pub ifindex: u32,
    pub kernel_metric: u32,
}

pub trait KernelFib {
    /// `kernel_route(op, prefix, plen, nexthop, ifindex, kernel_metric,
    /// new_nexthop?, new_ifindex?, new_kernel_metric?)` (spec §6).
    ///
    /// `new` is only meaningful (and only read) for `KernelOp::Modify`.
    fn route(
        &mut self,
        op: KernelOp,
        route: KernelRoute,
        new: Option<KernelRoute>,
    ) -> Result<(), KernelError>;
}

/// An in-memory reference implementation of [`KernelFib`], keyed by prefix,
/// useful for tests and for embedding this crate without a real kernel.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct FakeKernel {
    installed: std::collections::HashMap<Prefix, KernelRoute>,
    /// When set, the next `Add` call fails with this error instead of
    /// succeeding (tests exercising §7's kernel-failure paths).
    pub inject_add_error: Option<KernelError>,
    pub inject_modify_error: Option<KernelError>,
}

#[cfg(any(test, feature = "testing"))]
impl FakeKernel {
    pub fn new() -> Self {
        FakeKernel::default()
    }

    pub fn installed_route(&self, prefix: &Prefix) -> Option<&KernelRoute> {
        self.installed.get(prefix)
    }

    /// Seeds the fake FIB directly, bypassing `KernelFib::route` — useful
    /// for test setup that wants an already-installed route without
    /// exercising the Installer itself.
    pub fn force_install(&mut self, route: KernelRoute) {
        self.installed.insert(route.prefix, route);
    }
}

#[cfg(any(test, feature = "testing"))]
impl KernelFib for FakeKernel {
    fn route(
        &mut self,
        op: KernelOp,
        route: KernelRoute,
        new: Option<KernelRoute>,
    ) -> Result<(), KernelError> {
        match op {
            KernelOp::Add => {
                if let Some(err) = self.inject_add_error.take() {
                    return Err(err);
                }
                self.installed.insert(route.prefix, route);
                Ok(())
            }
            KernelOp::Flush => {
                self.installed.remove(&route.prefix);
                Ok(())
            }
            KernelOp::Modify => {
                if let Some(err) = self.inject_modify_error.take() {
                    return Err(err);
                }
                let new = new.expect("Modify requires a `new` route");
                self.installed.remove(&route.prefix);
                self.installed.insert(new.prefix, new);
                Ok(())
            }
        }
    }
}
