use crate::utils::*;

impl Bin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(items: Vec<Item>) -> Self {
        let fill = items.iter().map(|it| it.size).sum();

        Self { items, fill }
    }

    pub fn push(&mut self, it: Item) {
        self.fill += it.size;
        self.items.push(it);
    }

    pub fn extend(&mut self, its: impl IntoIterator<Item = Item>) {
        for it in its {
            self.push(it);
        }
    }

    #[inline]
    pub fn fill(&self) -> Size {
        self.fill
    }

    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns `true` if an item of size `s` can join
    /// without exceeding [`CAPACITY`].
    #[inline]
    pub fn has_room_for(&self, s: Size) -> bool {
        self.fill + s <= CAPACITY + FIT_SLACK
    }

    pub fn sizes(&self) -> Vec<Size> {
        self.items
            .iter()
            .map(|it| it.size)
            .collect()
    }

    /// Swaps every item for the caller's original value, looked up
    /// by id. The fill is recomputed from scratch rather than scaled,
    /// so no rounding error creeps into reported sizes.
    pub fn restore(&self, originals: &[Size]) -> Bin {
        Bin::with(
            self.items
                .iter()
                .map(|it| Item::new(it.id, originals[it.id as usize]))
                .collect()
        )
    }
}
