//! Scheduling on `m` identical machines, by way of bin packing.
//!
//! A candidate makespan D is feasible iff the sizes, divided by D, pack
//! into at most `m` unit bins. Feasibility is monotone in D, so the
//! smallest feasible D is found by bisection between the classical lower
//! bound and a doubled, probed upper bound.

use crate::items::{self, init, lower_bound, originals, scale};
use crate::utils::*;

/// Bisection stops once the bracket is narrower than this share
/// of its lower end.
pub const DEFAULT_REL_TOLERANCE: Size = 1e-3;

/// How many times an infeasible upper bound may be doubled.
pub const MAX_DOUBLINGS: u32 = 64;

/// Lets another thread stop a running search.
///
/// Clones share the flag. The search looks at it before every call
/// into the packer, so a call already underway runs to completion.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub rel_tolerance:  Size,
    pub max_doublings:  u32,
    pub cancel:         Option<CancelToken>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rel_tolerance:  DEFAULT_REL_TOLERANCE,
            max_doublings:  MAX_DOUBLINGS,
            cancel:         None,
        }
    }
}

impl SearchConfig {
    pub fn with_tolerance(mut self, rel_tolerance: Size) -> Self {
        self.rel_tolerance = rel_tolerance;
        self
    }

    pub fn with_max_doublings(mut self, max_doublings: u32) -> Self {
        self.max_doublings = max_doublings;
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn check(&self) -> PackResult<()> {
        match &self.cancel {
            Some(t) if t.is_cancelled() => Err(PackError::Cancelled { stage: Stage::OuterSearch }),
            _                           => Ok(()),
        }
    }
}

/// Schedules `sizes` on `m` machines with the rounding packer,
/// default budget and default tolerance.
pub fn eps_makespan(sizes: Vec<Size>, m: usize, eps: Size) -> PackResult<Schedule> {
    let mut dual = Dual::new(eps)?;

    search(sizes, m, &mut dual, &SearchConfig::default())
}

/// Finds (approximately) the smallest makespan for which `packer`
/// fits `sizes` into `m` bins.
///
/// The reported [`makespan`](Schedule::makespan) is the upper end of
/// the final bracket, i.e. the smallest candidate actually shown
/// feasible. Its bins carry the caller's own values.
pub fn search<P: Packer + ?Sized>(
    sizes:  Vec<Size>,
    m:      usize,
    packer: &mut P,
    cfg:    &SearchConfig,
) -> PackResult<Schedule> {
    let items = init(sizes)?;
    if items.is_empty() {
        return Ok(Schedule::empty());
    }
    if m == 0 {
        return Err(PackError::invalid(
            Stage::OuterSearch,
            format!("{} items but no machines", items.len()),
        ));
    }
    if !(cfg.rel_tolerance.is_finite() && cfg.rel_tolerance >= 0.0) {
        return Err(PackError::invalid(
            Stage::OuterSearch,
            format!("tolerance must be finite and non-negative, got {}", cfg.rel_tolerance),
        ));
    }
    let orig = originals(&items);
    let mut lower = lower_bound(&items, m);
    // Huge items would double past the largest finite size.
    let mut upper = (2.0 * lower).min(Size::MAX);
    let mut probes = 0;
    info!(
        items = items.len(),
        machines = m,
        total = items::total(&items),
        lower,
        "starting makespan search"
    );

    // Establish a feasible upper end before bisecting.
    let mut doublings = 0;
    let mut best = loop {
        if !(lower.is_finite() && upper.is_finite()) {
            return Err(PackError::NumericPrecision {
                stage: Stage::OuterSearch,
                lower,
                upper,
            });
        }
        if let Some(sol) = probe(packer, &items, upper, m, cfg, &mut probes)? {
            break sol;
        }
        if doublings == cfg.max_doublings {
            return Err(PackError::InfeasibleUpperBound {
                stage: Stage::OuterSearch,
                upper,
                doublings,
            });
        }
        if upper == Size::MAX {
            return Err(PackError::NumericPrecision {
                stage: Stage::OuterSearch,
                lower,
                upper,
            });
        }
        warn!(upper, "upper bound infeasible, doubling");
        lower = upper;
        upper = (upper * 2.0).min(Size::MAX);
        doublings += 1;
    };

    while upper - lower > cfg.rel_tolerance * lower {
        let mid = lower + (upper - lower) / 2.0;
        if mid <= lower || mid >= upper {
            // Bracket can't shrink any further in floating point.
            debug!(lower, upper, "bisection stalled");
            break;
        }
        match probe(packer, &items, mid, m, cfg, &mut probes)? {
            Some(sol)   => {
                upper = mid;
                best = sol;
            },
            None        => {
                lower = mid;
            },
        }
    }
    info!(makespan = upper, probes, bins = best.len(), "makespan search done");

    Ok(Schedule {
        makespan:   upper,
        bins:       best.iter().map(|b| b.restore(&orig)).collect(),
        probes,
    })
}

fn probe<P: Packer + ?Sized>(
    packer: &mut P,
    items:  &[Item],
    d:      Size,
    m:      usize,
    cfg:    &SearchConfig,
    probes: &mut u32,
) -> PackResult<Option<Solution>> {
    cfg.check()?;
    *probes += 1;
    let res = packer.pack_within(&scale(items, d), m)?;
    debug!(d, feasible = res.is_some(), "probed candidate makespan");

    Ok(res)
}

/// Runs one rounding-packer search per `(m, eps)` query, in parallel.
///
/// Queries share nothing but the input sizes, so each result is exactly
/// what a standalone [`search`] would return. Results come back in
/// query order.
pub fn sweep(
    sizes:      &[Size],
    queries:    &[(usize, Size)],
    budget:     &Budget,
    cfg:        &SearchConfig,
) -> Vec<PackResult<Schedule>> {
    queries
        .par_iter()
        .map(|&(m, eps)| {
            let mut dual = Dual::new(eps)?.with_budget(*budget);
            search(sizes.to_vec(), m, &mut dual, cfg)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Claims nothing ever fits.
    struct Hopeless;

    impl Packer for Hopeless {
        fn pack(&mut self, items: &[Item]) -> PackResult<Solution> {
            Ok(items.iter().map(|it| Bin::with(vec![*it])).collect())
        }

        fn pack_within(&mut self, _: &[Item], _: usize) -> PackResult<Option<Solution>> {
            Ok(None)
        }
    }

    #[test]
    fn empty_input_needs_no_search() {
        let s = eps_makespan(vec![], 3, 0.2).unwrap();
        assert_eq!(s.makespan, 0.0);
        assert!(s.bins.is_empty());
        assert_eq!(s.probes, 0);
    }

    #[test]
    fn zero_machines() {
        let err = eps_makespan(vec![1.0], 0, 0.2).unwrap_err();
        assert!(matches!(err, PackError::InvalidParameter { stage: Stage::OuterSearch, .. }));
    }

    #[test]
    fn bad_sizes_fail_at_input() {
        let err = eps_makespan(vec![1.0, -2.0], 2, 0.2).unwrap_err();
        assert_eq!(err.stage(), Stage::Input);
    }

    #[test]
    fn doubling_gives_up() {
        let cfg = SearchConfig::default().with_max_doublings(3);
        let err = search(vec![1.0, 2.0], 1, &mut Hopeless, &cfg).unwrap_err();
        match err {
            PackError::InfeasibleUpperBound { doublings, upper, .. } => {
                assert_eq!(doublings, 3);
                // Lower bound 3, doubled four times over.
                assert_eq!(upper, 48.0);
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn near_max_sizes_still_schedule() {
        let s = eps_makespan(vec![1e308], 1, 0.1).unwrap();
        assert_eq!(s.machines_used(), 1);
        assert!(s.makespan >= 1e308 && s.makespan.is_finite());
        assert_eq!(s.bins[0].sizes(), vec![1e308]);
    }

    #[test]
    fn cancelled_before_first_probe() {
        let token = CancelToken::new();
        token.cancel();
        let cfg = SearchConfig::default().with_cancel(token);
        let mut dual = Dual::new(0.2).unwrap();
        let err = search(vec![1.0, 2.0], 2, &mut dual, &cfg).unwrap_err();
        assert_eq!(err, PackError::Cancelled { stage: Stage::OuterSearch });
    }

    #[test]
    fn one_machine_takes_everything() {
        let s = eps_makespan(vec![3.0, 1.0, 2.0], 1, 0.2).unwrap();
        assert_eq!(s.machines_used(), 1);
        assert!((s.makespan - 6.0).abs() <= 6.0 * DEFAULT_REL_TOLERANCE);
        assert_eq!(s.bins[0].fill(), 6.0);
    }

    #[test]
    fn bins_carry_original_values() {
        let sizes = vec![7.0, 3.0, 5.0, 5.0];
        let s = eps_makespan(sizes.clone(), 2, 0.1).unwrap();
        let mut got: Vec<Size> = s.bins.iter().flat_map(|b| b.sizes()).collect();
        got.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(got, vec![3.0, 5.0, 5.0, 7.0]);
        assert!(s.makespan >= 10.0);
    }
}
