use crate::dataset::{Dataset, ItemId};
use crate::metrics::RecommendationMetric;

use hashbrown::HashSet;

/// Share of the training catalogue that shows up in any top `length` list.
pub struct Coverage {
    training_items: HashSet<ItemId>,
    recommended_items: HashSet<ItemId>,
    length: usize,
}

impl Coverage {
    pub fn new(training: &Dataset, length: usize) -> Coverage {
        let training_items = training
            .values()
            .flat_map(|interactions| interactions.iter().map(|interaction| interaction.item_id))
            .collect();
        Coverage {
            training_items,
            recommended_items: HashSet::new(),
            length,
        }
    }
}

impl RecommendationMetric for Coverage {
    fn add(&mut self, recommendations: &[ItemId], _held_out_items: &[ItemId]) {
        for item_id in recommendations.iter().take(self.length) {
            if self.training_items.contains(item_id) {
                self.recommended_items.insert(*item_id);
            }
        }
    }

    fn result(&self) -> f64 {
        if !self.training_items.is_empty() {
            self.recommended_items.len() as f64 / self.training_items.len() as f64
        } else {
            0.0
        }
    }

    fn get_name(&self) -> String {
        format!("Coverage@{}", self.length)
    }
}
