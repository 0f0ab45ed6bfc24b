//! Minimum bin cover of a rounded instance.
//!
//! Nodes are count vectors bounded by the histogram, and an edge of cost 1
//! joins `v` to `v + c` for each non-zero feasible configuration `c`. The
//! fewest bins packing the rounded instance is the shortest path from the
//! zero vector to the histogram itself. Edges are never materialized:
//! [`Configurations`] produces them on the fly for each expanded state.
//!
//! States are interned as mixed-radix `u64` keys. The visited table is an
//! [`IndexMap`], so a state's position in it doubles as its handle: the
//! frontier and the predecessor links hold plain indices.
//!
//! The state space is exponential in the number of types. How many types
//! show up is governed by ε, so callers pick the trade-off and bound the
//! damage with a [`Budget`].

use crate::configs::Configurations;
use crate::utils::*;

/// Cap on visited states used unless the caller says otherwise.
pub const DEFAULT_MAX_STATES: usize = 2_000_000;

// Elapsed time is checked once per this many expansions.
const CLOCK_STRIDE: usize = 256;

/// Limits on how much work one cover search may do.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Budget {
    pub max_states: usize,
    pub time_limit: Option<Duration>,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_states: DEFAULT_MAX_STATES,
            time_limit: None,
        }
    }
}

impl Budget {
    pub fn new(max_states: usize) -> Self {
        Self {
            max_states,
            time_limit: None,
        }
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn unlimited() -> Self {
        Self {
            max_states: usize::MAX,
            time_limit: None,
        }
    }
}

/// The result of a successful search: one count vector per bin,
/// summing exactly to the target.
#[derive(Clone, Debug)]
pub struct Cover {
    pub bins:   Vec<Vec<u32>>,
    /// Distinct states visited on the way.
    pub states: usize,
}

#[derive(Copy, Clone, Debug)]
struct Visit {
    bins:   u32,
    parent: Option<usize>,
}

type StateTable = IndexMap<u64, Visit, BuildHasherDefault<AHasher>>;

/// Encodes count vectors bounded by `target` as single integers.
///
/// Digit i has radix target_i + 1. Since no component ever exceeds its
/// bound, encoding is linear: key(u + v) = key(u) + key(v), which lets
/// edges be followed, and undone, with plain integer arithmetic.
struct Lattice {
    strides:    Vec<u64>,
}

impl Lattice {
    fn new(target: &[u32]) -> PackResult<Self> {
        let mut strides = vec![0u64; target.len()];
        let mut acc: u64 = 1;
        for (i, &t) in target.iter().enumerate().rev() {
            strides[i] = acc;
            acc = acc
                .checked_mul(t as u64 + 1)
                .ok_or(PackError::BudgetExceeded {
                    stage:      Stage::CoverSearch,
                    explored:   0,
                })?;
        }

        Ok(Self { strides })
    }

    #[inline]
    fn encode(&self, v: &[u32]) -> u64 {
        v.iter()
            .zip(&self.strides)
            .map(|(&c, &s)| c as u64 * s)
            .sum()
    }

    #[inline]
    fn decode(&self, mut key: u64, out: &mut [u32]) {
        for (o, &s) in out.iter_mut().zip(&self.strides) {
            *o = (key / s) as u32;
            key %= s;
        }
    }
}

/// Finds the fewest feasible configurations summing to `target`.
pub fn min_bin_cover(target: &[u32], weights: &[Size], budget: &Budget) -> PackResult<Cover> {
    match cover_within(target, weights, budget, None)? {
        Some(c) => Ok(c),
        // Without a limit the search either covers or fails.
        None    => Err(PackError::SearchExhausted {
            stage:      Stage::CoverSearch,
            explored:   0,
        }),
    }
}

/// Like [`min_bin_cover`], but gives up with `Ok(None)` as soon as
/// it is clear that more than `limit` bins are needed.
pub fn cover_within(
    target:     &[u32],
    weights:    &[Size],
    budget:     &Budget,
    limit:      Option<u32>,
) -> PackResult<Option<Cover>> {
    if target.len() != weights.len() {
        return Err(PackError::invalid(
            Stage::Enumeration,
            format!("{} counts but {} weights", target.len(), weights.len()),
        ));
    }
    if let Some(w) = weights.iter().find(|w| !(**w > 0.0 && **w <= CAPACITY + FIT_SLACK)) {
        return Err(PackError::invalid(
            Stage::Enumeration,
            format!("type weight {w} outside (0, {CAPACITY}]"),
        ));
    }
    let lattice = Lattice::new(target)?;
    let goal = lattice.encode(target);
    let mut table: StateTable = IndexMap::default();
    table.insert(0, Visit { bins: 0, parent: None });
    if goal == 0 {
        return Ok(Some(Cover { bins: vec![], states: 1 }));
    }

    let start = Instant::now();
    let mut frontier: VecDeque<usize> = VecDeque::from([0]);
    let mut state = vec![0u32; target.len()];
    let mut remaining = vec![0u32; target.len()];
    let mut configs = Configurations::new(weights);
    let mut expanded = 0;

    let goal_handle = 'search: loop {
        let Some(handle) = frontier.pop_front() else {
            return Err(PackError::SearchExhausted {
                stage:      Stage::CoverSearch,
                explored:   table.len(),
            });
        };
        let Some((&key, &visit)) = table.get_index(handle) else {
            return Err(PackError::SearchExhausted {
                stage:      Stage::CoverSearch,
                explored:   table.len(),
            });
        };
        if let Some(l) = limit {
            // FIFO order pops states by increasing bin count. Whatever
            // is discovered from here on needs more than `limit` bins.
            if visit.bins >= l {
                trace!(limit = l, states = table.len(), "cover needs more bins than allowed");
                return Ok(None);
            }
        }

        expanded += 1;
        if expanded % CLOCK_STRIDE == 0 {
            if let Some(tl) = budget.time_limit {
                if start.elapsed() > tl {
                    return Err(PackError::BudgetExceeded {
                        stage:      Stage::CoverSearch,
                        explored:   table.len(),
                    });
                }
            }
        }

        lattice.decode(key, &mut state);
        for ((r, &t), &s) in remaining.iter_mut().zip(target).zip(&state) {
            *r = t - s;
        }
        configs.restart(&remaining);
        while let Some(c) = configs.next_config() {
            let next = key + lattice.encode(c);
            let cand = Visit {
                bins:   visit.bins + 1,
                parent: Some(handle),
            };
            match table.get_index_of(&next) {
                None        => {
                    let (idx, _) = table.insert_full(next, cand);
                    // Unit edge costs: first discovery is the shortest path.
                    if next == goal {
                        break 'search idx;
                    }
                    frontier.push_back(idx);
                },
                Some(idx)   => {
                    if cand.bins < table[idx].bins {
                        table[idx] = cand;
                        frontier.push_back(idx);
                    }
                },
            }
        }
        if table.len() > budget.max_states {
            return Err(PackError::BudgetExceeded {
                stage:      Stage::CoverSearch,
                explored:   table.len(),
            });
        }
    };

    // Walk predecessors back to zero. Every step's key difference
    // is the configuration of one bin.
    let mut bins = vec![];
    let mut cur = goal_handle;
    while let Some((&key, &Visit { parent: Some(p), .. })) = table.get_index(cur) {
        let Some((&pkey, _)) = table.get_index(p) else {
            break;
        };
        let mut delta = vec![0u32; target.len()];
        lattice.decode(key - pkey, &mut delta);
        bins.push(delta);
        cur = p;
    }
    bins.reverse();
    debug!(
        bins = bins.len(),
        states = table.len(),
        expanded,
        "cover search settled"
    );

    Ok(Some(Cover { bins, states: table.len() }))
}
