//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The Feasibility Oracle (spec §4.2): Babel's loop-avoidance predicate.

use std::cmp::Ordering;

use crate::address::seqno_compare;
use crate::metric::Metric;
use crate::route::Route;
use crate::source::{SourceHandle, SourceTable};

/// `update_feasible(origin, prefix, plen, seqno, refmetric)` (spec §4.2):
///
/// ```text
/// feasible  <=>  src is unknown
///            \/  src is stale (src.time older than the staleness horizon)
///            \/  refmetric >= INFINITY                  (retraction)
///            \/  seqno > src.seqno                      (modular order)
///            \/  (seqno == src.seqno  /\  refmetric < src.metric)
/// ```
pub fn update_feasible(
    sources: &SourceTable,
    src: Option<SourceHandle>,
    seqno: u16,
    refmetric: Metric,
    now: u32,
    stale_delay: u32,
) -> bool {
    let Some(src) = src else {
        // src is unknown.
        return true;
    };
    let Some(source) = sources.get(src) else {
        return true;
    };

    if sources.is_stale(src, now, stale_delay) {
        // Never mind what is probably stale data.
        return true;
    }

    if refmetric.is_infinite() {
        // Retractions are always feasible.
        return true;
    }

    match seqno_compare(seqno, source.seqno) {
        Ordering::Greater => true,
        Ordering::Equal => refmetric < source.metric,
        Ordering::Less => false,
    }
}

/// `route_feasible(r)` (spec §4.2): the same predicate applied to a Route's
/// own `(src, seqno, refmetric)`.
pub fn route_feasible(
    sources: &SourceTable,
    route: &Route,
    now: u32,
    stale_delay: u32,
) -> bool {
    update_feasible(sources, Some(route.src), route.seqno, route.refmetric, now, stale_delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Prefix;

    #[test]
    fn unknown_source_is_feasible() {
        let sources = SourceTable::new();
        assert!(update_feasible(&sources, None, 1, Metric::new(0), 0, 200));
    }

    #[test]
    fn stale_source_is_feasible() {
        let mut sources = SourceTable::new();
        let prefix = Prefix::from_v4([10, 0, 0, 0], 24);
        let h = sources.find_source([1u8; 16], prefix, true, 5, 0).unwrap();
        sources.record_feasible(h, 5, Metric::new(50), 0);
        assert!(update_feasible(&sources, Some(h), 1, Metric::new(200), 300, 200));
    }

    #[test]
    fn retraction_always_feasible() {
        let mut sources = SourceTable::new();
        let prefix = Prefix::from_v4([10, 0, 0, 0], 24);
        let h = sources.find_source([1u8; 16], prefix, true, 5, 0).unwrap();
        sources.record_feasible(h, 5, Metric::new(50), 0);
        assert!(update_feasible(&sources, Some(h), 1, Metric::INFINITY, 0, 200));
    }

    #[test]
    fn newer_seqno_is_feasible_regardless_of_metric() {
        let mut sources = SourceTable::new();
        let prefix = Prefix::from_v4([10, 0, 0, 0], 24);
        let h = sources.find_source([1u8; 16], prefix, true, 5, 0).unwrap();
        sources.record_feasible(h, 5, Metric::new(50), 0);
        assert!(update_feasible(&sources, Some(h), 6, Metric::new(9999), 0, 200));
    }

    #[test]
    fn same_seqno_requires_strictly_smaller_metric() {
        let mut sources = SourceTable::new();
        let prefix = Prefix::from_v4([10, 0, 0, 0], 24);
        let h = sources.find_source([1u8; 16], prefix, true, 5, 0).unwrap();
        sources.record_feasible(h, 5, Metric::new(50), 0);

        assert!(update_feasible(&sources, Some(h), 5, Metric::new(49), 0, 200));
        assert!(!update_feasible(&sources, Some(h), 5, Metric::new(50), 0, 200));
        assert!(!update_feasible(&sources, Some(h), 5, Metric::new(51), 0, 200));
    }

    #[test]
    fn older_seqno_is_unfeasible() {
        let mut sources = SourceTable::new();
        let prefix = Prefix::from_v4([10, 0, 0, 0], 24);
        let h = sources.find_source([1u8; 16], prefix, true, 5, 0).unwrap();
        sources.record_feasible(h, 5, Metric::new(50), 0);
        assert!(!update_feasible(&sources, Some(h), 4, Metric::new(0), 0, 200));
    }

    // Universal invariant 4 (spec §8): feasibility is monotone in seqno.
    #[test]
    fn feasibility_monotone_in_seqno() {
        let mut sources = SourceTable::new();
        let prefix = Prefix::from_v4([10, 0, 0, 0], 24);
        let h = sources.find_source([1u8; 16], prefix, true, 100, 0).unwrap();
        sources.record_feasible(h, 100, Metric::new(50), 0);

        let refmetric = Metric::new(10); // < source.metric
        for seqno in [101u16, 150, 65535, 0] {
            if seqno_compare(seqno, 100) == Ordering::Greater {
                assert!(update_feasible(&sources, Some(h), seqno, refmetric, 0, 200));
            }
        }
    }
}
