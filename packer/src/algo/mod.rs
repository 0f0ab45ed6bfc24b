pub mod heuristic;

use crate::{
    cover::cover_within,
    histogram::split,
    items::{check_eps, check_unit},
    small::pack_small,
    utils::*,
};
use rand::{rngs::StdRng, SeedableRng};

/// Anything that turns unit-frame items into bins.
///
/// Implementors must hand back a [`Solution`] containing every input item
/// exactly once. What they promise about bin fills is theirs to document.
pub trait Packer {
    fn pack(&mut self, items: &[Item]) -> PackResult<Solution>;

    /// Packs `items` if at most `m` bins are needed, `None` otherwise.
    ///
    /// The default packs in full and counts. Implementors that can
    /// tell early that `m` bins won't do should override it.
    fn pack_within(&mut self, items: &[Item], m: usize) -> PackResult<Option<Solution>> {
        let res = self.pack(items)?;

        Ok((res.len() <= m).then_some(res))
    }
}

impl<P: Packer + ?Sized> Packer for Box<P> {
    fn pack(&mut self, items: &[Item]) -> PackResult<Solution> {
        (**self).pack(items)
    }

    fn pack_within(&mut self, items: &[Item], m: usize) -> PackResult<Option<Solution>> {
        (**self).pack_within(items, m)
    }
}

/// The rounding-based packer ("dual" of the scheduling problem).
///
/// Large items (> ε) are rounded into a histogram whose minimum cover is
/// found exactly; small ones are folded in greedily afterwards. Uses at
/// most (1 + O(ε))·OPT + O(1) bins. Under [`Rounding::LowerEdge`] every
/// bin holds at most 1 + ε; under [`Rounding::UpperEdge`], at most 1.
#[derive(Copy, Clone, Debug)]
pub struct Dual {
    pub eps:        Size,
    pub rounding:   Rounding,
    pub budget:     Budget,
}

impl Dual {
    pub fn new(eps: Size) -> PackResult<Self> {
        check_eps(eps, Stage::Histogram)?;

        Ok(Self {
            eps,
            rounding:   Rounding::default(),
            budget:     Budget::default(),
        })
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    fn run(&self, items: &[Item], limit: Option<usize>) -> PackResult<Option<Solution>> {
        check_unit(items, Stage::Histogram)?;
        let (small, large) = split(items, self.eps);
        let mut hist = Histogram::build(&large, self.eps)?;
        let weights = hist.weights(self.rounding);
        let bin_limit = limit.map(|m| m.min(u32::MAX as usize) as u32);

        let Some(cover) = cover_within(hist.counts(), &weights, &self.budget, bin_limit)? else {
            return Ok(None);
        };

        // Materialize: each configuration pops concrete
        // items off its types' retained stacks.
        let mut bins = Vec::with_capacity(cover.bins.len());
        for config in cover.bins {
            let mut bin = Bin::new();
            for (t, &cnt) in config.iter().enumerate() {
                for _ in 0..cnt {
                    let it = hist.take(t).ok_or(PackError::SearchExhausted {
                        stage:      Stage::CoverSearch,
                        explored:   cover.states,
                    })?;
                    bin.push(it);
                }
            }
            bins.push(bin);
        }
        trace!(
            large = large.len(),
            small = small.len(),
            large_bins = bins.len(),
            "large items placed"
        );

        Ok(pack_small(bins, &small, limit))
    }
}

impl Packer for Dual {
    fn pack(&mut self, items: &[Item]) -> PackResult<Solution> {
        self.run(items, None)?.ok_or(PackError::SearchExhausted {
            stage:      Stage::SmallItems,
            explored:   0,
        })
    }

    fn pack_within(&mut self, items: &[Item], m: usize) -> PackResult<Option<Solution>> {
        self.run(items, Some(m))
    }
}

/// Selects one of the available [`Packer`]s.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum Strategy {
    /// Histogram rounding plus exact cover search
    #[default]
    Dual,
    /// Five-stage greedy heuristic, no rounding
    FifthFit,
}

impl Strategy {
    /// Builds the selected packer. `eps` is validated for every
    /// strategy; `seed` only matters to those that break ties randomly.
    pub fn build(
        self,
        eps:        Size,
        rounding:   Rounding,
        budget:     Budget,
        seed:       u64,
    ) -> PackResult<Box<dyn Packer + Send>> {
        check_eps(eps, Stage::Input)?;
        match self {
            Strategy::Dual      => {
                Ok(Box::new(
                    Dual::new(eps)?
                        .with_rounding(rounding)
                        .with_budget(budget)
                ))
            },
            Strategy::FifthFit  => {
                Ok(Box::new(FifthFit::new(StdRng::seed_from_u64(seed))))
            },
        }
    }
}
