use crate::dataset::ItemId;

pub mod coverage;
pub mod evaluation_reporter;
pub mod f1score;
pub mod hitrate;
pub mod popularity;
pub mod precision;
pub mod recall;

/// An offline evaluation metric accumulated over users.
pub trait RecommendationMetric {
    /// Adds the ranked `recommendations` of one user together with the items
    /// that user actually interacted with after the training period.
    fn add(&mut self, recommendations: &[ItemId], held_out_items: &[ItemId]);
    fn result(&self) -> f64;
    fn get_name(&self) -> String;
}
