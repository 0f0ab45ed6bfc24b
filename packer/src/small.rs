use crate::utils::*;

/// Folds small items into already formed bins.
///
/// Bins are visited fullest first. Each item goes into the current bin
/// if it still fits; otherwise the bin is left behind for good and the
/// next-fullest one is tried. A new bin is opened only once every
/// existing one has been left behind. Every bin left behind is filled
/// beyond 1 − s for the item s that didn't fit, which is what bounds the
/// number of bins opened for small items alone.
///
/// If `limit` is given and packing would need more than `limit` bins,
/// `None` is returned instead.
pub fn pack_small(mut bins: Solution, small: &[Item], limit: Option<usize>) -> Option<Solution> {
    if let Some(m) = limit {
        if bins.len() > m {
            return None;
        }
    }
    // Stable, so equally full bins keep the order the cover gave them.
    bins.sort_by(|a, b| b.fill().total_cmp(&a.fill()));

    let mut cursor = 0;
    for it in small {
        while cursor < bins.len() && !bins[cursor].has_room_for(it.size) {
            cursor += 1;
        }
        if cursor == bins.len() {
            if limit.is_some_and(|m| bins.len() >= m) {
                return None;
            }
            bins.push(Bin::new());
        }
        bins[cursor].push(*it);
    }

    Some(bins)
}
