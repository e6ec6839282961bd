use crate::dataset::ItemId;
use crate::metrics::RecommendationMetric;
use hashbrown::HashSet;

pub struct Recall {
    sum_of_scores: f64,
    qty: usize,
    length: usize,
}

impl Recall {
    /// Returns a Recall evaluation metric: the share of a user's distinct
    /// held-out items that appear in the top `length` recommendations.
    /// Users without held-out items are not counted.
    pub fn new(length: usize) -> Recall {
        Recall {
            sum_of_scores: 0_f64,
            qty: 0,
            length,
        }
    }
}

impl RecommendationMetric for Recall {
    fn add(&mut self, recommendations: &[ItemId], held_out_items: &[ItemId]) {
        let unique_held_out: HashSet<&ItemId> = held_out_items.iter().collect();
        if unique_held_out.is_empty() {
            return;
        }
        self.qty += 1;
        let top_recos: HashSet<&ItemId> = recommendations.iter().take(self.length).collect();
        let hits = top_recos.intersection(&unique_held_out).count();
        self.sum_of_scores += hits as f64 / unique_held_out.len() as f64
    }

    fn result(&self) -> f64 {
        if self.qty > 0 {
            self.sum_of_scores / self.qty as f64
        } else {
            0.0
        }
    }

    fn get_name(&self) -> String {
        format!("Recall@{}", self.length)
    }
}

#[cfg(test)]
mod recall_test {
    use super::*;

    #[test]
    fn should_calculate_recall() {
        let mut under_test = Recall::new(20);
        let recommendations: Vec<ItemId> = (1..=24).collect();
        let held_out_items: Vec<ItemId> = vec![3, 55, 3, 4];
        under_test.add(&recommendations, &held_out_items);
        assert!((2.0 / 3.0 - under_test.result()).abs() < f64::EPSILON);
        assert_eq!("Recall@20", under_test.get_name());
    }

    #[test]
    fn should_skip_users_without_held_out_items() {
        let mut under_test = Recall::new(20);
        under_test.add(&[1, 2], &[]);
        assert!((0.0 - under_test.result()).abs() < f64::EPSILON);
        under_test.add(&[1, 2], &[2]);
        assert!((1.0 - under_test.result()).abs() < f64::EPSILON);
    }
}
