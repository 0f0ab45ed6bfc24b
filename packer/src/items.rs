use crate::utils::*;

/// Initializes an [ItemSet] from raw sizes.
/// A successfully returned set is guaranteed to be
/// compliant with all of `packer`'s assumptions. These are:
/// - every size is finite
/// - every size is strictly positive
/// - ids fit in a `u32` and equal the position in `sizes`
///
/// This function is the gatekeeper to the rest of the library.
pub fn init(sizes: Vec<Size>) -> PackResult<ItemSet> {
    if sizes.len() > u32::MAX as usize {
        return Err(PackError::invalid(
            Stage::Input,
            format!("{} items exceed the id space", sizes.len()),
        ));
    }
    for (idx, s) in sizes.iter().enumerate() {
        if !s.is_finite() {
            return Err(PackError::invalid(
                Stage::Input,
                format!("item {idx} has non-finite size {s}"),
            ));
        } else if *s <= 0.0 {
            return Err(PackError::invalid(
                Stage::Input,
                format!("item {idx} has non-positive size {s}"),
            ));
        }
    }

    Ok(sizes
        .into_iter()
        .enumerate()
        .map(|(id, size)| Item::new(id as u32, size))
        // Ties are impossible (ids differ), so
        // unstable sorting loses nothing.
        .sorted_unstable()
        .collect())
}

/// Rejects accuracy parameters outside the open unit interval.
pub fn check_eps(eps: Size, stage: Stage) -> PackResult<()> {
    if eps.is_finite() && eps > 0.0 && eps < 1.0 {
        Ok(())
    } else {
        Err(PackError::invalid(stage, format!("eps must lie in (0, 1), got {eps}")))
    }
}

/// Packers work in the unit-capacity frame: every item they are
/// handed must be positive and no larger than one bin.
pub fn check_unit(items: &[Item], stage: Stage) -> PackResult<()> {
    match items
        .iter()
        .find(|it| !(it.size.is_finite() && it.size > 0.0 && it.size <= CAPACITY))
    {
        Some(it)    => Err(PackError::invalid(
            stage,
            format!("item {} has size {} outside (0, {CAPACITY}]", it.id, it.size),
        )),
        None        => Ok(()),
    }
}

pub fn total(items: &[Item]) -> Size {
    items.iter().map(|it| it.size).sum()
}

pub fn max_size(items: &[Item]) -> Size {
    items.iter().map(|it| it.size).fold(0.0, Size::max)
}

/// The two classical lower bounds on the makespan of `m` identical
/// machines: the average load and the largest single item.
pub fn lower_bound(items: &[Item], m: usize) -> Size {
    (total(items) / m as Size).max(max_size(items))
}

/// Divides every size by `d`, keeping ids.
pub fn scale(items: &[Item], d: Size) -> ItemSet {
    items
        .iter()
        .map(|it| it.scaled(d))
        .collect()
}

/// Maps ids back to the sizes they were born with.
pub fn originals(items: &[Item]) -> Vec<Size> {
    let mut res = vec![0.0; items.len()];
    for it in items {
        res[it.id as usize] = it.size;
    }

    res
}
