use crate::dataset::{Dataset, ItemId};
use crate::metrics::coverage::Coverage;
use crate::metrics::f1score::F1score;
use crate::metrics::hitrate::HitRate;
use crate::metrics::popularity::Popularity;
use crate::metrics::precision::Precision;
use crate::metrics::recall::Recall;
use crate::metrics::RecommendationMetric;

/// Feeds every user's recommendations to all offline metrics at once.
pub struct EvaluationReporter {
    precision: Precision,
    recall: Recall,
    f1: F1score,
    hitrate: HitRate,
    coverage: Coverage,
    popularity: Popularity,
}

impl EvaluationReporter {
    pub fn new(training: &Dataset, length: usize) -> EvaluationReporter {
        EvaluationReporter {
            precision: Precision::new(length),
            recall: Recall::new(length),
            f1: F1score::new(length),
            hitrate: HitRate::new(length),
            coverage: Coverage::new(training, length),
            popularity: Popularity::new(training, length),
        }
    }

    fn metrics(&self) -> [&dyn RecommendationMetric; 6] {
        [
            &self.precision,
            &self.recall,
            &self.f1,
            &self.hitrate,
            &self.coverage,
            &self.popularity,
        ]
    }

    pub fn add(&mut self, recommendations: &[ItemId], held_out_items: &[ItemId]) {
        self.precision.add(recommendations, held_out_items);
        self.recall.add(recommendations, held_out_items);
        self.f1.add(recommendations, held_out_items);
        self.hitrate.add(recommendations, held_out_items);
        self.coverage.add(recommendations, held_out_items);
        self.popularity.add(recommendations, held_out_items);
    }

    /// Comma separated scores, in the same order as [`EvaluationReporter::get_name`].
    pub fn result(&self) -> String {
        self.metrics()
            .iter()
            .map(|metric| format!("{:.4}", metric.result()))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn get_name(&self) -> String {
        self.metrics()
            .iter()
            .map(|metric| metric.get_name())
            .collect::<Vec<_>>()
            .join(",")
    }
}
