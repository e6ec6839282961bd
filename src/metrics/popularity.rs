use crate::dataset::{Dataset, ItemId};
use crate::metrics::RecommendationMetric;

use hashbrown::HashMap;

/// Mean `ln(1 + occurrences)` of recommended items, with occurrences counted
/// in the training data. Lower values mean more novel recommendations.
pub struct Popularity {
    sum_of_scores: f64,
    qty: usize,
    item_occurrences: HashMap<ItemId, usize>,
    length: usize,
}

impl Popularity {
    pub fn new(training: &Dataset, length: usize) -> Popularity {
        let mut item_occurrences = HashMap::new();
        for interaction in training.values().flatten() {
            *item_occurrences.entry(interaction.item_id).or_insert(0) += 1;
        }

        Popularity {
            sum_of_scores: 0.0,
            qty: 0,
            item_occurrences,
            length,
        }
    }
}

impl RecommendationMetric for Popularity {
    fn add(&mut self, recommendations: &[ItemId], _held_out_items: &[ItemId]) {
        for item_id in recommendations.iter().take(self.length) {
            let occurrences = self.item_occurrences.get(item_id).copied().unwrap_or(0);
            self.sum_of_scores += (1.0 + occurrences as f64).ln();
            self.qty += 1;
        }
    }

    fn result(&self) -> f64 {
        if self.qty > 0 {
            self.sum_of_scores / self.qty as f64
        } else {
            0.0
        }
    }

    fn get_name(&self) -> String {
        format!("Popularity@{}", self.length)
    }
}
