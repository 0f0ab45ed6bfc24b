//! Lazy enumeration of bin configurations.
//!
//! A configuration is a count vector `c` over the histogram's types, telling
//! how many items of each type share one bin. It is feasible iff
//! Σ c_i·w_i ≤ 1. Given how much of each type is still unpacked, the
//! enumerator walks all non-zero feasible vectors like an odometer: the
//! last type turns fastest, and whenever a digit overflows its supply *or*
//! pushes the weight over capacity, it is reset and the digit to its left
//! is bumped. Weights are positive, so once a prefix doesn't fit, nothing
//! extending it can; resetting right there is the pruning.

use crate::utils::*;

pub struct Configurations<'a> {
    weights:    &'a [Size],
    supply:     Vec<u32>,
    current:    Vec<u32>,
    // Capacity not yet used by `current`.
    left:       Size,
    done:       bool,
}

impl<'a> Configurations<'a> {
    /// An enumerator over `weights.len()` types. Nothing is
    /// yielded until it is given some supply.
    pub fn new(weights: &'a [Size]) -> Self {
        Self {
            weights,
            supply:     vec![0; weights.len()],
            current:    vec![0; weights.len()],
            left:       CAPACITY,
            done:       true,
        }
    }

    /// Starts over with a new per-type supply. Buffers are reused,
    /// so restarting once per search state allocates nothing.
    pub fn restart(&mut self, supply: &[u32]) {
        debug_assert_eq!(supply.len(), self.weights.len(), "Supply/type mismatch!");
        self.supply.copy_from_slice(supply);
        self.current.fill(0);
        self.left = CAPACITY;
        self.done = self.weights.is_empty();
    }

    /// Yields the next non-zero feasible configuration, or `None`
    /// once all of them have been seen.
    pub fn next_config(&mut self) -> Option<&[u32]> {
        if self.done {
            return None;
        }
        let mut pos = self.weights.len() - 1;
        self.bump(pos);
        while self.current[pos] > self.supply[pos] || self.left < -FIT_SLACK {
            // Carry: this digit is exhausted, give its weight back.
            self.left += self.current[pos] as Size * self.weights[pos];
            self.current[pos] = 0;
            if pos == 0 {
                self.done = true;
                return None;
            }
            pos -= 1;
            self.bump(pos);
        }

        Some(&self.current)
    }

    #[inline]
    fn bump(&mut self, pos: usize) {
        self.current[pos] += 1;
        self.left -= self.weights[pos];
    }
}

/// Returns `true` if `config` fits in one bin under `weights`.
pub fn feasible(config: &[u32], weights: &[Size]) -> bool {
    config
        .iter()
        .zip(weights)
        .map(|(&c, &w)| c as Size * w)
        .sum::<Size>() <= CAPACITY + FIT_SLACK
}
