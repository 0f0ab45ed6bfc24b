//! Welcome to `packer`!
//!
//! `packer` splits a multiset of positive sizes into as few unit-capacity
//! bins as it reasonably can, and builds a machine scheduler on top of that:
//! given `m` identical machines, it binary-searches the smallest per-machine
//! load ("makespan") for which the items still fit into `m` bins.
//!
//! The main path is the classical asymptotic approximation scheme:
//!
//! 1. items no larger than ε are put aside ([`histogram::split`]),
//! 2. the rest are rounded into ⌈1/ε²⌉ size classes ([`Histogram`]),
//! 3. the fewest bins covering the rounded instance are found by a
//!    shortest-path search over count vectors ([`cover`]), whose edges are
//!    produced lazily by [`configs::Configurations`],
//! 4. small items are folded back in fullest-bin-first ([`small`]).
//!
//! A faster, guarantee-free alternative lives in [`algo::heuristic`]. Both
//! sit behind the [`Packer`] trait, which is all [`makespan::search`] needs.

mod item;
mod bins;
pub mod items;
pub mod histogram;
pub mod configs;
pub mod cover;
pub mod small;
pub mod algo;
pub mod makespan;
pub mod utils;

/// Imports, type aliases, traits ... in general
/// useful stuff that shall be needed in many places.
pub use crate::utils::*;
pub use crate::makespan::{eps_makespan, search, sweep};

/// Our fundamental unit of interest: one of the caller's sizes.
///
/// The [`id`](Item::id) is the item's index in the list the caller
/// originally handed in. Items get scaled, bucketed, shuffled between
/// bins and sorted, but their id never changes, which is how results
/// are traced back to the caller's values.
///
/// > ***ATTENTION:*** an item's [`size`](Item::size) is only meaningful
/// > relative to the frame it currently lives in. While a makespan search
/// > is running, sizes are fractions of the candidate makespan; the
/// > [`Schedule`] handed back carries original units again.
#[derive(Clone, Copy, Debug)]
pub struct Item {
    pub id:     u32,
    pub size:   Size,
}

/// A multiset of items sharing one unit of capacity.
///
/// The fill is cached, since both packers keep asking for it while
/// they sort and scan bins.
#[derive(Clone, Debug, Default)]
pub struct Bin {
    items:  Vec<Item>,
    fill:   Size,
}

/// What a makespan search produces.
#[derive(Clone, Debug)]
pub struct Schedule {
    /// The smallest per-machine load found feasible, in original units.
    pub makespan:   Size,
    /// One bin per busy machine, holding the caller's original values.
    pub bins:       Solution,
    /// How many times the packer was invoked.
    pub probes:     u32,
}

impl Schedule {
    pub fn empty() -> Self {
        Self {
            makespan:   0.0,
            bins:       vec![],
            probes:     0,
        }
    }

    pub fn machines_used(&self) -> usize {
        self.bins.len()
    }

    /// The heaviest machine's actual load. Rounding lets it exceed
    /// [`makespan`](Schedule::makespan) by at most a factor of (1 + ε).
    pub fn max_load(&self) -> Size {
        self.bins
            .iter()
            .map(|b| b.fill())
            .fold(0.0, Size::max)
    }
}
