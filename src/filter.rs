//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The input filter (spec §6/§4.13): an additive metric penalty, or
//! `Metric::INFINITY` to drop the update outright. Policy beyond this single
//! additive knob is out of scope (spec.md §1, "no policy routing beyond an
//! additive input-filter metric").

use crate::address::{Address, Prefix};
use crate::metric::Metric;

pub trait InputFilter {
    /// `input_filter(origin, prefix, plen, neigh_id, ifindex)` (spec §6).
    fn filter(
        &self,
        origin: &Address,
        prefix: &Prefix,
        neigh_id: &Address,
        ifindex: u32,
    ) -> Metric;
}

/// Accepts everything with no metric penalty — matches upstream babeld's
/// behaviour when no filter file is configured.
#[derive(Debug, Default)]
pub struct PermissiveFilter;

impl InputFilter for PermissiveFilter {
    fn filter(
        &self,
        _origin: &Address,
        _prefix: &Prefix,
        _neigh_id: &Address,
        _ifindex: u32,
    ) -> Metric {
        Metric::new(0)
    }
}
