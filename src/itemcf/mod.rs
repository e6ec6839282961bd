use std::cmp::Ordering;

use crate::dataset::ItemId;

pub mod recommender;
pub mod similarity;

/// An item with an associated similarity or recommendation score.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ItemScore {
    pub id: ItemId,
    pub score: f64,
}

impl ItemScore {
    pub fn new(id: ItemId, score: f64) -> Self {
        ItemScore { id, score }
    }
}

impl Eq for ItemScore {}

impl Ord for ItemScore {
    /// Rank order: a higher score sorts first, equal scores fall back to the
    /// lower item id. A max-heap of `ItemScore` therefore keeps the worst
    /// ranked entry on top.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for ItemScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Read access to a fitted item neighborhood.
pub trait NeighborIndex {
    /// Neighbors of `item_id` in rank order, excluding the item itself.
    /// Items that never co-occurred with anything yield an empty slice.
    fn neighbors(&self, item_id: &ItemId) -> &[ItemScore];
}
