use crate::utils::*;

impl Item {
    pub fn new(id: u32, size: Size) -> Self {
        Self { id, size }
    }

    /// The same item, seen from a frame where `d` is one unit.
    pub fn scaled(&self, d: Size) -> Self {
        Self {
            id:     self.id,
            size:   self.size / d,
        }
    }

    /// Returns `true` if the item is set aside from rounding
    /// and packed greedily at the end.
    pub fn is_small(&self, threshold: Size) -> bool {
        self.size <= threshold
    }
}

//-----TREATING GROUPS OF ITEMS (START)---------------------
/*
    Both packers walk items in order of increasing size, and
    binary-search sorted runs of them.

    Sizes are validated to be finite before anything sorts them,
    so `total_cmp` agrees with the usual numeric order. Ties are
    broken by id to keep every run deterministic.
 */
impl Ord for Item {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.size
            .total_cmp(&other.size)
            .then(self.id.cmp(&other.id))
    }
}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Item {}
//-----TREATING GROUPS OF ITEMS (END)---------------------
