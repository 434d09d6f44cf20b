//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The neighbour table (spec §6): link cost and ifindex per neighbour. The
//! hello/IHU reachability state machine that would keep `cost` current is out
//! of scope (spec.md §1); this module only stores the result.

use derive_new::new;
use generational_arena::Arena;

use crate::address::Address;
use crate::metric::Metric;

pub type NeighbourHandle = generational_arena::Index;

#[derive(Clone, Debug, new)]
pub struct Neighbour {
    pub id: Address,
    pub ifindex: u32,
    cost: Metric,
}

#[derive(Debug, Default)]
pub struct NeighbourTable {
    arena: Arena<Neighbour>,
}

impl NeighbourTable {
    pub fn new() -> Self {
        NeighbourTable::default()
    }

    pub fn insert(&mut self, id: Address, ifindex: u32, cost: Metric) -> NeighbourHandle {
        self.arena.insert(Neighbour::new(id, ifindex, cost))
    }

    pub fn get(&self, handle: NeighbourHandle) -> Option<&Neighbour> {
        self.arena.get(handle)
    }

    /// `neighbour_cost(neigh)` (spec §4.3/§6).
    pub fn cost(&self, handle: NeighbourHandle) -> Metric {
        self.arena
            .get(handle)
            .map(|n| n.cost)
            .unwrap_or(Metric::INFINITY)
    }

    /// Called by the (out of scope) hello/IHU logic whenever the estimated
    /// link cost to `handle` changes.
    pub fn set_cost(&mut self, handle: NeighbourHandle, cost: Metric) {
        if let Some(n) = self.arena.get_mut(handle) {
            n.cost = cost;
        }
    }

    /// Removes the neighbour. Callers must flush every Route referencing it
    /// first (`RouteStore::flush_neighbour_routes`) — see §9 Design Notes,
    /// "collaborator notifies, core drops".
    pub fn remove(&mut self, handle: NeighbourHandle) {
        self.arena.remove(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_defaults_to_infinity_for_unknown_handle() {
        let mut table = NeighbourTable::new();
        let h = table.insert([1u8; 16], 1, Metric::new(50));
        table.remove(h);
        assert_eq!(table.cost(h), Metric::INFINITY);
    }

    #[test]
    fn set_cost_updates_in_place() {
        let mut table = NeighbourTable::new();
        let h = table.insert([1u8; 16], 1, Metric::new(50));
        table.set_cost(h, Metric::new(75));
        assert_eq!(table.cost(h), Metric::new(75));
    }
}
