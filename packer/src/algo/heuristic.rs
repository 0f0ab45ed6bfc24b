//! Five-stage greedy packing, straight on sorted sizes.
//!
//! No rounding and no search, hence no approximation guarantee, but it
//! runs in O(n log n) and is often good enough to seed or sanity-check
//! the rounding path. Items from [`SMALL`] up are matched largest first
//! against complements found by binary search; the rest are handed to
//! [`pack_small`] exactly like the rounding path does.
//!
//! Every bin formed here honors [`CAPACITY`].

use crate::{
    items::check_unit,
    small::pack_small,
    utils::*,
};
use rand::Rng;

use super::Packer;

/// Items below this size are left for the final greedy pass.
pub const SMALL: Size = 0.2;

/// See the [module-level docs](self).
///
/// Stage 2 sometimes has to choose between pairing an item with one
/// complement or with two; the injected random source decides. Seed it
/// for reproducible runs.
pub struct FifthFit<R: Rng> {
    rng: R,
}

impl<R: Rng> FifthFit<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Packer for FifthFit<R> {
    fn pack(&mut self, items: &[Item]) -> PackResult<Solution> {
        check_unit(items, Stage::Heuristic)?;
        let (small, mut rest): (ItemSet, ItemSet) = items
            .iter()
            .partition(|it| it.size < SMALL);
        let small: ItemSet = small.into_iter().sorted().collect();
        rest.sort_unstable();

        let mut bins = vec![];
        // Stage 1: anything ≥ 0.6 takes the largest item that still fits.
        while let Some(p) = pop_at_least(&mut rest, 0.6) {
            let mut bin = Bin::with(vec![p]);
            if let Some(l) = complements(&rest, &[CAPACITY - p.size]) {
                bin.extend(take(&mut rest, &l));
            }
            bins.push(bin);
        }

        // Stage 2: items in [0.5, 0.6). A partner that fits beside one of
        // them is another half only in the exact-fit case; otherwise it's
        // a single complement or two items sharing the gap.
        while let Some(p) = pop_at_least(&mut rest, 0.5) {
            let gap = CAPACITY - p.size;
            let mut bin = Bin::with(vec![p]);
            let pair = complements(&rest, &[gap]);
            let triple = complements(&rest, &[gap / 2.0, gap / 2.0]);
            let pick = match (pair, triple) {
                (Some(a), Some(b))  => {
                    if self.rng.gen_bool(0.5) { Some(a) } else { Some(b) }
                },
                (a, b)              => a.or(b),
            };
            if let Some(l) = pick {
                bin.extend(take(&mut rest, &l));
            }
            bins.push(bin);
        }

        // Stage 3: items in (0.4, 0.5) form triples. The middle item is
        // the largest that still leaves room for the smallest one left,
        // the last one fills what remains.
        while let Some(l) = triple_for_top(&rest) {
            bins.push(Bin::with(take(&mut rest, &l)));
        }

        // Stage 4: what's left of [0.4, 0.5) goes two at a time.
        while rest.len() > 1 && rest[rest.len() - 1].size >= 0.4 {
            let n = rest.len();
            let top = take(&mut rest, &[n - 2, n - 1]);
            bins.append(&mut fitting_groups(top));
        }

        // Stage 5: everything else is below 0.4.
        while !rest.is_empty() {
            if let Some(l) = quad_for_bottom(&rest) {
                bins.push(Bin::with(take(&mut rest, &l)));
                continue;
            }
            let k = (1..=rest.len().min(3))
                .rev()
                .find(|&k| {
                    rest[rest.len() - k..]
                        .iter()
                        .map(|it| it.size)
                        .sum::<Size>() <= CAPACITY + FIT_SLACK
                })
                .unwrap_or(1);
            let positions: Vec<usize> = (rest.len() - k..rest.len()).collect();
            bins.push(Bin::with(take(&mut rest, &positions)));
        }

        debug!(bins = bins.len(), small = small.len(), "heuristic stages done");

        // Small items can always open a new bin, so this never bails.
        pack_small(bins, &small, None).ok_or(PackError::SearchExhausted {
            stage:      Stage::SmallItems,
            explored:   0,
        })
    }
}

fn pop_at_least(rest: &mut ItemSet, bound: Size) -> Option<Item> {
    if rest.last()?.size >= bound {
        rest.pop()
    } else {
        None
    }
}

/// Position of the largest item of `rest[..end]` not exceeding `bound`.
#[inline]
fn largest_at_most(rest: &[Item], bound: Size, end: usize) -> Option<usize> {
    rest[..end]
        .partition_point(|it| it.size <= bound + FIT_SLACK)
        .checked_sub(1)
}

/// For each bound, from the last to the first, picks the largest item not
/// exceeding it among those left of the previous pick. `bounds` should be
/// ascending. Positions come back ascending and distinct, or not at all.
fn complements(rest: &[Item], bounds: &[Size]) -> Option<Vec<usize>> {
    let mut res = Vec::with_capacity(bounds.len());
    let mut end = rest.len();
    for &b in bounds.iter().rev() {
        end = largest_at_most(rest, b, end)?;
        res.push(end);
    }
    res.reverse();

    Some(res)
}

fn triple_for_top(rest: &[Item]) -> Option<Vec<usize>> {
    let n = rest.len();
    if n < 3 || rest[n - 1].size <= 0.4 {
        return None;
    }
    let gap = CAPACITY - rest[n - 1].size;
    let mid = largest_at_most(rest, gap - rest[0].size, n - 1)?;
    if mid == 0 {
        return None;
    }
    let low = largest_at_most(rest, gap - rest[mid].size, mid)?;

    Some(vec![low, mid, n - 1])
}

fn quad_for_bottom(rest: &[Item]) -> Option<Vec<usize>> {
    if rest.len() < 4 || rest[0].size > 0.25 {
        return None;
    }
    let share = (CAPACITY - rest[0].size) / 3.0;
    let l = complements(&rest[1..], &[share, share, share])?;

    Some(std::iter::once(0)
        .chain(l.into_iter().map(|p| p + 1))
        .collect())
}

/// Removes the items at ascending `positions` from `rest`.
fn take(rest: &mut ItemSet, positions: &[usize]) -> Vec<Item> {
    let mut res: Vec<Item> = positions
        .iter()
        .rev()
        .map(|&p| rest.remove(p))
        .collect();
    res.reverse();

    res
}

/// One bin if the group fits together, one bin per item otherwise.
fn fitting_groups(group: Vec<Item>) -> Vec<Bin> {
    let bin = Bin::with(group);
    if bin.fill() <= CAPACITY + FIT_SLACK {
        vec![bin]
    } else {
        bin.items()
            .iter()
            .map(|it| Bin::with(vec![*it]))
            .collect()
    }
}
