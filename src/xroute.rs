//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The xroute (locally redistributed route) table (spec §6). A local
//! announcement always wins over a learned route for the same prefix
//! (`consider_route`, spec §4.7); out of scope as a full subsystem.

use std::collections::HashSet;

use crate::address::Prefix;

pub trait XrouteTable {
    /// `find_xroute(prefix, plen)` (spec §6).
    fn contains(&self, prefix: &Prefix) -> bool;
}

/// An in-memory reference implementation, mostly useful for tests and for
/// embedding this crate without a real redistribution subsystem.
#[derive(Debug, Default)]
pub struct StaticXrouteTable {
    prefixes: HashSet<Prefix>,
}

impl StaticXrouteTable {
    pub fn new() -> Self {
        StaticXrouteTable::default()
    }

    pub fn insert(&mut self, prefix: Prefix) {
        self.prefixes.insert(prefix);
    }

    pub fn remove(&mut self, prefix: &Prefix) {
        self.prefixes.remove(prefix);
    }
}

impl XrouteTable for StaticXrouteTable {
    fn contains(&self, prefix: &Prefix) -> bool {
        self.prefixes.contains(prefix)
    }
}
