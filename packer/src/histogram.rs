//! Rounding of large items into a bounded number of size classes.
//!
//! With ε fixed, the interval (ε, 1] is cut into ⌈1/ε²⌉ buckets of equal
//! width h = (1 − ε) / nbins. However many items come in, the search that
//! follows only ever sees that many distinct "types", which is what keeps
//! it tractable.

use crate::utils::*;

/// Which edge of its bucket an item is assumed to sit on when
/// checking whether a configuration fits.
///
/// - [`LowerEdge`](Rounding::LowerEdge) packs as tightly as the rounded
///   instance allows. A bin of k large items may then exceed capacity by
///   up to k·h, which never reaches ε.
/// - [`UpperEdge`](Rounding::UpperEdge) rounds every item up, so a bin
///   that fits in the rounded instance fits for the true sizes too.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Rounding {
    #[default]
    LowerEdge,
    UpperEdge,
}

/// Splits items into small (size ≤ ε) and large ones. Both halves
/// come back sorted by increasing size.
pub fn split(items: &[Item], eps: Size) -> (ItemSet, ItemSet) {
    let (small, large): (ItemSet, ItemSet) = items
        .iter()
        .partition(|it| it.is_small(eps));

    (
        small.into_iter().sorted().collect(),
        large.into_iter().sorted().collect(),
    )
}

/// Number of buckets for accuracy `eps`.
#[inline]
pub fn bucket_count(eps: Size) -> usize {
    (1.0 / (eps * eps)).ceil() as usize
}

/// Maps a size in (eps, 1] to its bucket, clamping to the valid range
/// so that floating point noise on the edges can't escape it.
#[inline]
pub fn bucket_index(size: Size, eps: Size, h: Size, nbins: usize) -> usize {
    let raw = ((size - eps) / h).ceil() - 1.0;
    if raw <= 0.0 {
        0
    } else {
        (raw as usize).min(nbins - 1)
    }
}

/// Per-bucket counts of large items, plus the items themselves.
///
/// Only non-empty buckets are stored. Each one is a *type*, and types
/// are kept in increasing bucket order; everything downstream (weights,
/// count vectors, search states) is indexed by type, not by bucket.
#[derive(Clone, Debug)]
pub struct Histogram {
    pub eps:    Size,
    pub nbins:  usize,
    pub h:      Size,
    buckets:    Vec<usize>,
    counts:     Vec<u32>,
    // Items within a bucket are interchangeable: whoever
    // needs one pops it off the top.
    retained:   Vec<Vec<Item>>,
}

impl Histogram {
    /// Buckets `large`, which must hold sizes in (eps, 1].
    pub fn build(large: &[Item], eps: Size) -> PackResult<Self> {
        crate::items::check_eps(eps, Stage::Histogram)?;
        if let Some(it) = large.iter().find(|it| it.size <= eps || it.size > CAPACITY) {
            return Err(PackError::invalid(
                Stage::Histogram,
                format!("item {} of size {} is not large for eps = {eps}", it.id, it.size),
            ));
        }
        let nbins = bucket_count(eps);
        let h = (1.0 - eps) / nbins as Size;

        let mut by_bucket: BTreeMap<usize, Vec<Item>> = BTreeMap::new();
        for it in large {
            by_bucket
                .entry(bucket_index(it.size, eps, h, nbins))
                .or_default()
                .push(*it);
        }

        let mut buckets = Vec::with_capacity(by_bucket.len());
        let mut counts = Vec::with_capacity(by_bucket.len());
        let mut retained = Vec::with_capacity(by_bucket.len());
        for (b, its) in by_bucket {
            buckets.push(b);
            counts.push(its.len() as u32);
            retained.push(its);
        }
        trace!(nbins, types = buckets.len(), items = large.len(), "histogram built");

        Ok(Self {
            eps,
            nbins,
            h,
            buckets,
            counts,
            retained,
        })
    }

    /// Re-buckets an arbitrary size with this histogram's parameters.
    #[inline]
    pub fn bucket_of(&self, size: Size) -> usize {
        bucket_index(size, self.eps, self.h, self.nbins)
    }

    #[inline]
    pub fn lower_edge(&self, bucket: usize) -> Size {
        self.eps + bucket as Size * self.h
    }

    #[inline]
    pub fn upper_edge(&self, bucket: usize) -> Size {
        self.eps + (bucket + 1) as Size * self.h
    }

    /// Count of large items in `bucket` (zero for absent buckets).
    pub fn count(&self, bucket: usize) -> u32 {
        match self.buckets.binary_search(&bucket) {
            Ok(t)   => self.counts[t],
            Err(_)  => 0,
        }
    }

    /// Bucket index of each type.
    #[inline]
    pub fn buckets(&self) -> &[usize] {
        &self.buckets
    }

    /// Count of each type: the vector the cover search aims for.
    #[inline]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Items still retained for type `t`.
    pub fn retained(&self, t: usize) -> &[Item] {
        &self.retained[t]
    }

    /// Number of types.
    #[inline]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Feasibility weight of each type.
    pub fn weights(&self, rounding: Rounding) -> Vec<Size> {
        self.buckets
            .iter()
            .map(|&b| match rounding {
                Rounding::LowerEdge => self.lower_edge(b),
                Rounding::UpperEdge => self.upper_edge(b),
            })
            .collect()
    }

    /// Hands out one concrete item of type `t`, never the same twice.
    pub fn take(&mut self, t: usize) -> Option<Item> {
        self.retained
            .get_mut(t)?
            .pop()
    }
}
