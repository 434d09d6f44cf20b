//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The source table (spec §6): per-(origin, prefix, plen) high-water mark of
//! `(seqno, metric)`, the input the Feasibility Oracle reads. Out of scope as
//! a full subsystem per spec.md §1, but implemented here in minimal form
//! because feasibility cannot be exercised without it.

use std::collections::HashMap;

use generational_arena::Arena;

use crate::address::{Address, Prefix};
use crate::metric::Metric;

pub type SourceHandle = generational_arena::Index;

#[derive(Clone, Debug)]
pub struct Source {
    pub origin: Address,
    pub prefix: Prefix,
    pub seqno: u16,
    pub metric: Metric,
    pub time: u32,
}

#[derive(Debug, Default)]
pub struct SourceTable {
    arena: Arena<Source>,
    index: HashMap<(Address, Prefix), SourceHandle>,
}

impl SourceTable {
    pub fn new() -> Self {
        SourceTable::default()
    }

    pub fn get(&self, handle: SourceHandle) -> Option<&Source> {
        self.arena.get(handle)
    }

    pub fn get_mut(&mut self, handle: SourceHandle) -> Option<&mut Source> {
        self.arena.get_mut(handle)
    }

    /// `find_source(origin, prefix, plen, create, seqno_hint)` (spec §6).
    ///
    /// Resolves the unique Source for `(origin, prefix, plen)`, optionally
    /// creating it. A freshly-created Source seeds `seqno` with `seqno_hint`
    /// and starts with `metric = INFINITY`: nothing has yet been accepted as
    /// feasible for it, so the first update for it is trivially feasible
    /// (spec §4.2, "src is unknown").
    pub fn find_source(
        &mut self,
        origin: Address,
        prefix: Prefix,
        create: bool,
        seqno_hint: u16,
        now: u32,
    ) -> Option<SourceHandle> {
        let key = (origin, prefix);
        if let Some(&handle) = self.index.get(&key) {
            return Some(handle);
        }
        if !create {
            return None;
        }
        let source = Source {
            origin,
            prefix,
            seqno: seqno_hint,
            metric: Metric::INFINITY,
            time: now,
        };
        let handle = self.arena.insert(source);
        self.index.insert(key, handle);
        Some(handle)
    }

    /// Records that `(seqno, refmetric)` was just accepted as feasible,
    /// raising the Source's high-water mark if it's newer.
    pub fn record_feasible(
        &mut self,
        handle: SourceHandle,
        seqno: u16,
        refmetric: Metric,
        now: u32,
    ) {
        if let Some(source) = self.arena.get_mut(handle) {
            source.seqno = seqno;
            source.metric = refmetric;
            source.time = now;
        }
    }

    pub fn is_stale(&self, handle: SourceHandle, now: u32, stale_delay: u32) -> bool {
        match self.arena.get(handle) {
            Some(source) => now.saturating_sub(source.time) > stale_delay,
            // An unknown source can't be "stale": the Feasibility Oracle
            // treats unknown sources as trivially feasible regardless.
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(byte: u8) -> Address {
        let mut a = [0u8; 16];
        a[15] = byte;
        a
    }

    #[test]
    fn find_source_creates_and_dedupes() {
        let mut table = SourceTable::new();
        let prefix = Prefix::from_v4([10, 0, 1, 0], 24);
        let h1 = table.find_source(origin(1), prefix, true, 5, 0).unwrap();
        let h2 = table.find_source(origin(1), prefix, true, 99, 0).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(table.get(h1).unwrap().seqno, 5);
    }

    #[test]
    fn find_source_without_create_returns_none_for_unknown() {
        let mut table = SourceTable::new();
        let prefix = Prefix::from_v4([10, 0, 1, 0], 24);
        assert!(table.find_source(origin(1), prefix, false, 0, 0).is_none());
    }

    #[test]
    fn staleness_horizon() {
        let mut table = SourceTable::new();
        let prefix = Prefix::from_v4([10, 0, 1, 0], 24);
        let h = table.find_source(origin(1), prefix, true, 0, 0).unwrap();
        assert!(!table.is_stale(h, 100, 200));
        assert!(table.is_stale(h, 300, 200));
    }
}
