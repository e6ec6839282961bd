use crate::dataset::ItemId;
use crate::metrics::RecommendationMetric;
use hashbrown::HashSet;

/// Harmonic mean of Precision@N and Recall@N, each averaged over users
/// the same way [`Precision`](crate::metrics::precision::Precision) and
/// [`Recall`](crate::metrics::recall::Recall) average them.
pub struct F1score {
    precision_sum: f64,
    precision_qty: usize,
    recall_sum: f64,
    recall_qty: usize,
    length: usize,
}

impl F1score {
    pub fn new(length: usize) -> F1score {
        F1score {
            precision_sum: 0.0,
            precision_qty: 0,
            recall_sum: 0.0,
            recall_qty: 0,
            length,
        }
    }

    fn mean(sum: f64, qty: usize) -> f64 {
        if qty == 0 {
            0.0
        } else {
            sum / qty as f64
        }
    }
}

impl RecommendationMetric for F1score {
    fn add(&mut self, recommendations: &[ItemId], held_out_items: &[ItemId]) {
        let held_out: HashSet<&ItemId> = held_out_items.iter().collect();
        let hits = recommendations
            .iter()
            .take(self.length)
            .collect::<HashSet<&ItemId>>()
            .intersection(&held_out)
            .count() as f64;

        self.precision_qty += 1;
        if self.length > 0 {
            self.precision_sum += hits / self.length as f64;
        }
        // users without held-out items have no recall
        if !held_out.is_empty() {
            self.recall_qty += 1;
            self.recall_sum += hits / held_out.len() as f64;
        }
    }

    fn result(&self) -> f64 {
        let precision = F1score::mean(self.precision_sum, self.precision_qty);
        let recall = F1score::mean(self.recall_sum, self.recall_qty);
        if precision + recall == 0.0 {
            return 0.0;
        }
        2.0 * precision * recall / (precision + recall)
    }

    fn get_name(&self) -> String {
        format!("F1score@{}", self.length)
    }
}
