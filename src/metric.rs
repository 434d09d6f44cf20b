//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The Metric Engine (spec §4.3): effective route metric and kernel metric
//! translation.

use std::fmt;

/// A Babel metric: an unsigned value capped at [`Metric::INFINITY`].
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct Metric(u16);

impl Metric {
    /// Daemon-level infinite metric (retraction marker).
    pub const INFINITY: Metric = Metric(0xFFFF);

    pub const fn new(value: u16) -> Self {
        Metric(value)
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    pub fn is_infinite(self) -> bool {
        self.0 >= Self::INFINITY.0
    }

    /// Saturating addition, capped at `INFINITY`.
    pub fn saturating_add(self, other: Metric) -> Metric {
        Metric(self.0.saturating_add(other.0).min(Self::INFINITY.0))
    }

    /// `self + delta`, capped at `INFINITY`, where `delta` may not itself be
    /// infinite (used for hysteresis threshold comparisons).
    pub fn plus(self, delta: u16) -> Metric {
        Metric(self.0.saturating_add(delta).min(Self::INFINITY.0))
    }
}

impl From<u16> for Metric {
    fn from(value: u16) -> Metric {
        Metric(value)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            write!(f, "infinity")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Effective local metric on receipt of an update (spec §4.3):
/// `min(refmetric + neighbour_cost + filter_add, INFINITY)`.
pub fn effective_metric(
    refmetric: Metric,
    neighbour_cost: Metric,
    filter_add: Metric,
) -> Metric {
    refmetric.saturating_add(neighbour_cost).saturating_add(filter_add)
}

/// Kernel metric translation (spec §4.3):
/// `min(ceil(metric / 256) + kernel_base_metric, KERNEL_INFINITY)`;
/// `INFINITY` always maps to `KERNEL_INFINITY`.
pub fn kernel_metric(
    metric: Metric,
    kernel_base_metric: u32,
    kernel_infinity: u32,
) -> u32 {
    if metric.is_infinite() {
        return kernel_infinity;
    }
    let scaled = (u32::from(metric.get()) + 255) / 256;
    (scaled + kernel_base_metric).min(kernel_infinity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_metric_saturates() {
        let m = effective_metric(Metric::new(65000), Metric::new(1000), Metric::new(0));
        assert!(m.is_infinite());
    }

    #[test]
    fn effective_metric_sums() {
        let m = effective_metric(Metric::new(100), Metric::new(50), Metric::new(0));
        assert_eq!(m, Metric::new(150));
    }

    #[test]
    fn kernel_metric_rounds_up() {
        assert_eq!(kernel_metric(Metric::new(150), 0, 0xFFFF), 1);
        assert_eq!(kernel_metric(Metric::new(256), 0, 0xFFFF), 1);
        assert_eq!(kernel_metric(Metric::new(257), 0, 0xFFFF), 2);
    }

    #[test]
    fn kernel_metric_infinite_maps_to_kernel_infinity() {
        assert_eq!(kernel_metric(Metric::INFINITY, 0, 65535), 65535);
    }

    #[test]
    fn kernel_metric_adds_base_and_caps() {
        assert_eq!(kernel_metric(Metric::new(256), 5, 65535), 6);
        assert_eq!(kernel_metric(Metric::new(256), 65535, 65535), 65535);
    }
}
