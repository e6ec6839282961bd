use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::dataset::{Dataset, Interaction, ItemId, Timestamp, UserId};

// Longest time window a single user's burst of interactions spans.
const MAX_BURST_SECS: i64 = 6 * 60 * 60;

/// Shape of a generated interaction log.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticConfig {
    pub num_users: usize,
    pub num_items: usize,
    pub min_interactions_per_user: usize,
    pub max_interactions_per_user: usize,
    pub start_timestamp: Timestamp,
    pub time_span_secs: i64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        SyntheticConfig {
            num_users: 200,
            num_items: 500,
            min_interactions_per_user: 2,
            max_interactions_per_user: 12,
            start_timestamp: 1_600_000_000,
            time_span_secs: 30 * 24 * 60 * 60,
            seed: 42,
        }
    }
}

/// Generates a reproducible interaction log.
///
/// Every user has a "topic" item around which it picks items with a skew
/// towards the topic, and interacts in a few bursts so that some pairs are
/// close in time and others are days apart.
pub fn generate(config: &SyntheticConfig) -> Dataset {
    let mut rng = Pcg64::seed_from_u64(config.seed);
    let num_items = config.num_items.max(1) as u64;
    let min_qty = config.min_interactions_per_user;
    let max_qty = config.max_interactions_per_user.max(min_qty);
    let time_span_secs = config.time_span_secs.max(1);

    let mut dataset = Dataset::with_capacity(config.num_users);
    for user_id in 0..config.num_users as UserId {
        let qty_interactions = rng.gen_range(min_qty..=max_qty);
        let topic: ItemId = rng.gen_range(0..num_items);
        let mut burst_start = config.start_timestamp + rng.gen_range(0..time_span_secs);

        let mut interactions = Vec::with_capacity(qty_interactions);
        for _ in 0..qty_interactions {
            if rng.gen_bool(0.2) {
                burst_start = config.start_timestamp + rng.gen_range(0..time_span_secs);
            }
            let offset = (rng.gen::<f64>().powi(3) * num_items as f64) as ItemId;
            let item_id = (topic + offset) % num_items;
            let timestamp = burst_start + rng.gen_range(0..MAX_BURST_SECS);
            interactions.push(Interaction::new(item_id, timestamp));
        }
        interactions.sort_by_key(|interaction| interaction.timestamp);
        dataset.insert(user_id, interactions);
    }
    dataset
}

#[cfg(test)]
mod synthetic_test {
    use super::*;

    #[test]
    fn should_generate_same_dataset_for_same_seed() {
        let config = SyntheticConfig::default();
        assert_eq!(generate(&config), generate(&config));
    }

    #[test]
    fn should_respect_configured_bounds() {
        let config = SyntheticConfig {
            num_users: 50,
            num_items: 20,
            min_interactions_per_user: 3,
            max_interactions_per_user: 5,
            ..SyntheticConfig::default()
        };
        let dataset = generate(&config);
        assert_eq!(50, dataset.len());
        let end = config.start_timestamp + config.time_span_secs + MAX_BURST_SECS;
        for interactions in dataset.values() {
            assert!((3..=5).contains(&interactions.len()));
            assert!(interactions.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
            for interaction in interactions.iter() {
                assert!(interaction.item_id < 20);
                assert!(interaction.timestamp >= config.start_timestamp);
                assert!(interaction.timestamp < end);
            }
        }
    }
}
