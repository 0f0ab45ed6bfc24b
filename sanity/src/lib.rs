//! Independent checks on what `packer` hands back.
//!
//! Nothing here trusts the engine: the audit works only from the caller's
//! sizes and the returned bins, matching items by id.

use std::hash::BuildHasherDefault;

use ahash::AHasher;
use indexmap::IndexMap;
use packer::{Schedule, Size, FIT_SLACK};
use serde::Serialize;

type Tally = IndexMap<u32, usize, BuildHasherDefault<AHasher>>;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Report {
    pub eps:            Size,
    pub machines:       usize,
    pub machines_used:  usize,
    pub makespan:       Size,
    pub lower_bound:    Size,
    /// Makespan over lower bound.
    pub ratio:          Size,
    pub max_load:       Size,
    pub probes:         u32,
    /// Ids missing from every bin.
    pub lost:           Vec<u32>,
    /// Ids seen more than once, with how many times.
    pub duplicated:     Tally,
    /// Ids whose reported size differs from the input.
    pub altered:        Vec<u32>,
    /// Ids that were never part of the input.
    pub unknown:        Vec<u32>,
    /// Bins loaded past makespan · (1 + eps).
    pub overfull:       Vec<usize>,
}

impl Report {
    pub fn is_valid(&self) -> bool {
        self.lost.is_empty()
            && self.duplicated.is_empty()
            && self.altered.is_empty()
            && self.unknown.is_empty()
            && self.overfull.is_empty()
            && self.machines_used <= self.machines.max(1)
    }
}

/// Checks `schedule` against the `sizes` it was computed from.
pub fn audit(sizes: &[Size], schedule: &Schedule, machines: usize, eps: Size) -> Report {
    let total: Size = sizes.iter().sum();
    let biggest = sizes.iter().cloned().fold(0.0, Size::max);
    let lower_bound = if sizes.is_empty() {
        0.0
    } else {
        (total / machines.max(1) as Size).max(biggest)
    };

    let mut seen = Tally::default();
    let mut altered = vec![];
    let mut unknown = vec![];
    for it in schedule.bins.iter().flat_map(|b| b.items()) {
        *seen.entry(it.id).or_default() += 1;
        match sizes.get(it.id as usize) {
            Some(&s) if s == it.size    => {},
            Some(_)                     => altered.push(it.id),
            None                        => unknown.push(it.id),
        }
    }
    let lost = (0..sizes.len() as u32)
        .filter(|id| !seen.contains_key(id))
        .collect();
    seen.retain(|_, cnt| *cnt > 1);
    seen.sort_keys();

    let cap = schedule.makespan * (1.0 + eps) * (1.0 + FIT_SLACK);
    let overfull = schedule.bins
        .iter()
        .enumerate()
        .filter(|(_, b)| b.fill() > cap)
        .map(|(idx, _)| idx)
        .collect();

    Report {
        eps,
        machines,
        machines_used:  schedule.machines_used(),
        makespan:       schedule.makespan,
        lower_bound,
        ratio:          if lower_bound > 0.0 { schedule.makespan / lower_bound } else { 1.0 },
        max_load:       schedule.max_load(),
        probes:         schedule.probes,
        lost,
        duplicated:     seen,
        altered,
        unknown,
        overfull,
    }
}
