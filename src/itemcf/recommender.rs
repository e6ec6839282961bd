use dary_heap::OctonaryHeap;
use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;
use tracing::debug;

use crate::dataset::{Dataset, ItemId, Timestamp, UserId};
use crate::itemcf::similarity::TimeContextParams;
use crate::itemcf::{ItemScore, NeighborIndex};

/// Scores unseen items for users of a fitted dataset.
///
/// Holds only shared references, so a single recommender can serve
/// concurrent queries.
pub struct Recommender<'a, I: NeighborIndex> {
    index: &'a I,
    dataset: &'a Dataset,
    beta: f64,
    reference_timestamp: Timestamp,
}

impl<'a, I: NeighborIndex + Sync> Recommender<'a, I> {
    pub fn new(index: &'a I, dataset: &'a Dataset, params: &TimeContextParams) -> Self {
        Recommender {
            index,
            dataset,
            beta: params.beta(),
            reference_timestamp: params.reference_timestamp(),
        }
    }

    /// Weight of an interaction at `timestamp`: `1 / (1 + beta * age)`.
    /// Interactions after the reference time count as age zero.
    fn recency_weight(&self, timestamp: Timestamp) -> f64 {
        let age = self.reference_timestamp.saturating_sub(timestamp).max(0) as f64;
        1.0 / (1.0 + self.beta * age)
    }

    /// Returns at most `how_many` item ids for `user_id`, best first.
    ///
    /// # Arguments
    ///
    /// * `how_many` - the maximum number of recommendations, aka 'N'.
    /// * `neighborhood_size_k` - the number of neighbors consulted per
    ///   historical item, aka 'K'. `None` consults all of them.
    ///
    /// Users that are not part of the dataset get an empty list.
    pub fn recommend(
        &self,
        user_id: &UserId,
        how_many: usize,
        neighborhood_size_k: Option<usize>,
    ) -> Vec<ItemId> {
        self.recommend_scored(user_id, how_many, neighborhood_size_k)
            .into_iter()
            .map(|scored| scored.id)
            .collect()
    }

    /// Same ranking as [`Recommender::recommend`], with the accumulated scores.
    pub fn recommend_scored(
        &self,
        user_id: &UserId,
        how_many: usize,
        neighborhood_size_k: Option<usize>,
    ) -> Vec<ItemScore> {
        let history = match self.dataset.get(user_id) {
            Some(history) => history,
            None => {
                debug!(user_id, "user not present in dataset, no recommendations");
                return Vec::new();
            }
        };
        if how_many == 0 {
            return Vec::new();
        }

        let seen: HashSet<ItemId> = history
            .iter()
            .map(|interaction| interaction.item_id)
            .collect();

        let mut item_scores: HashMap<ItemId, f64> = HashMap::new();
        for interaction in history.iter() {
            let neighbors = self.index.neighbors(&interaction.item_id);
            let k = neighborhood_size_k.unwrap_or(neighbors.len()).min(neighbors.len());
            let weight = self.recency_weight(interaction.timestamp);
            for neighbor in neighbors[..k].iter() {
                if !seen.contains(&neighbor.id) {
                    *item_scores.entry(neighbor.id).or_insert(0.0) += neighbor.score * weight;
                }
            }
        }

        // Bounded heap with the worst ranked candidate on top.
        let mut top_items = OctonaryHeap::<ItemScore>::with_capacity(how_many);
        for (item_id, score) in item_scores.into_iter() {
            let scored_item = ItemScore::new(item_id, score);
            if top_items.len() < how_many {
                top_items.push(scored_item);
            } else if let Some(mut bottom) = top_items.peek_mut() {
                if scored_item < *bottom {
                    *bottom = scored_item;
                }
            }
        }

        top_items.into_sorted_vec()
    }

    /// Runs [`Recommender::recommend`] for every user independently.
    pub fn recommend_users(
        &self,
        user_ids: &[UserId],
        how_many: usize,
        neighborhood_size_k: Option<usize>,
    ) -> HashMap<UserId, Vec<ItemId>> {
        user_ids
            .par_iter()
            .map(|user_id| {
                (
                    *user_id,
                    self.recommend(user_id, how_many, neighborhood_size_k),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod recommender_test {
    use float_cmp::approx_eq;

    use crate::dataset::group_interactions;
    use crate::itemcf::similarity::SimilarityBuilder;
    use crate::synthetic::{generate, SyntheticConfig};

    use super::*;

    const ITEM_A: ItemId = 1;
    const ITEM_B: ItemId = 2;
    const ITEM_C: ItemId = 3;

    fn two_user_dataset() -> Dataset {
        group_interactions(&[
            (1, ITEM_A, 100),
            (1, ITEM_B, 100),
            (2, ITEM_A, 100),
            (2, ITEM_C, 100),
        ])
    }

    fn fitted(dataset: &Dataset, params: TimeContextParams) -> SimilarityBuilder {
        let mut builder = SimilarityBuilder::new(params);
        builder.fit(dataset);
        builder
    }

    #[test]
    fn should_recommend_unseen_cooccurring_item() {
        let dataset = two_user_dataset();
        let builder = fitted(&dataset, TimeContextParams::new(1.0, 1.0, 100).unwrap());
        let recommender = builder.recommender(&dataset);

        assert_eq!(vec![ITEM_C], recommender.recommend(&1, 2, None));

        let scored = recommender.recommend_scored(&1, 2, None);
        assert_eq!(1, scored.len());
        assert!(approx_eq!(f64, 1.0 / 2.0_f64.sqrt(), scored[0].score, epsilon = 1e-12));
    }

    #[test]
    fn should_return_empty_for_unknown_user() {
        let dataset = two_user_dataset();
        let builder = fitted(&dataset, TimeContextParams::with_defaults(100));
        let recommender = builder.recommender(&dataset);
        assert!(recommender.recommend(&42, 10, None).is_empty());
    }

    #[test]
    fn should_return_empty_for_empty_history() {
        let mut dataset = two_user_dataset();
        dataset.insert(3, Vec::new());
        let builder = fitted(&dataset, TimeContextParams::with_defaults(100));
        let recommender = builder.recommender(&dataset);
        assert!(recommender.recommend(&3, 10, None).is_empty());
    }

    #[test]
    fn should_respect_how_many_and_neighborhood_size() {
        let dataset = group_interactions(&[
            (1, ITEM_A, 0),
            (2, ITEM_A, 0),
            (2, ITEM_B, 1),
            (2, ITEM_C, 50),
            (2, 4, 500),
        ]);
        let builder = fitted(&dataset, TimeContextParams::with_defaults(1000));
        let recommender = builder.recommender(&dataset);

        assert_eq!(vec![ITEM_B, ITEM_C, 4], recommender.recommend(&1, 10, None));
        assert_eq!(vec![ITEM_B, ITEM_C], recommender.recommend(&1, 2, None));
        assert_eq!(vec![ITEM_B], recommender.recommend(&1, 10, Some(1)));
        assert!(recommender.recommend(&1, 10, Some(0)).is_empty());
        assert!(recommender.recommend(&1, 0, None).is_empty());
    }

    #[test]
    fn should_weight_recent_interactions_higher() {
        // user 1 touched A long ago and B recently; both co-occur with C equally
        let dataset = group_interactions(&[
            (1, ITEM_A, 10),
            (1, ITEM_B, 990),
            (2, ITEM_A, 0),
            (2, ITEM_C, 0),
            (3, ITEM_B, 0),
            (3, ITEM_C, 0),
        ]);
        let builder = fitted(&dataset, TimeContextParams::new(1.0, 0.5, 1000).unwrap());
        let recommender = builder.recommender(&dataset);

        let similarities = builder.similarities();
        let sim_ac = similarities.similarity(&ITEM_A, &ITEM_C).unwrap();
        let sim_bc = similarities.similarity(&ITEM_B, &ITEM_C).unwrap();
        let from_old = sim_ac * recommender.recency_weight(10);
        let from_recent = sim_bc * recommender.recency_weight(990);
        assert!(from_recent >= from_old);

        let scored = recommender.recommend_scored(&1, 5, None);
        let score_c = scored.iter().find(|s| s.id == ITEM_C).unwrap().score;
        assert!(approx_eq!(f64, from_old + from_recent, score_c, epsilon = 1e-12));
    }

    #[test]
    fn should_not_decrease_weight_for_more_recent_interactions() {
        let dataset = two_user_dataset();
        let reference_timestamp = 1_000;
        for beta in [1e-6, 0.01, 1.0, 1e6] {
            let params = TimeContextParams::new(1.0, beta, reference_timestamp).unwrap();
            let builder = fitted(&dataset, params);
            let recommender = builder.recommender(&dataset);

            let timestamps = [-5_000, 0, 1, 500, 999, reference_timestamp];
            for pair in timestamps.windows(2) {
                let (earlier, later) = (pair[0], pair[1]);
                assert!(recommender.recency_weight(earlier) <= recommender.recency_weight(later));
            }
            assert!(approx_eq!(
                f64,
                1.0,
                recommender.recency_weight(reference_timestamp),
                epsilon = 1e-12
            ));
        }
    }

    #[test]
    fn should_prefer_recent_repeat_of_the_same_item() {
        // user 1 touched A twice; only the later touch is close to t0
        let dataset = group_interactions(&[
            (1, ITEM_A, 0),
            (1, ITEM_A, 900),
            (2, ITEM_A, 0),
            (2, ITEM_B, 0),
        ]);
        let builder = fitted(&dataset, TimeContextParams::new(1.0, 0.1, 1000).unwrap());
        let recommender = builder.recommender(&dataset);

        let sim_ab = builder.similarities().similarity(&ITEM_A, &ITEM_B).unwrap();
        let old_part = sim_ab * recommender.recency_weight(0);
        let recent_part = sim_ab * recommender.recency_weight(900);
        assert!(recent_part > old_part);

        let scored = recommender.recommend_scored(&1, 5, None);
        assert_eq!(1, scored.len());
        assert_eq!(ITEM_B, scored[0].id);
        assert!(approx_eq!(f64, old_part + recent_part, scored[0].score, epsilon = 1e-12));
    }

    #[test]
    fn should_keep_weight_bounded_for_extreme_timestamps() {
        let dataset = two_user_dataset();
        let builder = fitted(&dataset, TimeContextParams::with_defaults(1_000));
        let recommender = builder.recommender(&dataset);

        for timestamp in [i64::MIN, i64::MIN + 1, i64::MAX] {
            let weight = recommender.recency_weight(timestamp);
            assert!(weight.is_finite());
            assert!((0.0..=1.0).contains(&weight));
        }
        assert!(recommender.recency_weight(i64::MIN) <= recommender.recency_weight(0));

        let far_future = fitted(&dataset, TimeContextParams::with_defaults(i64::MAX));
        let recommender = far_future.recommender(&dataset);
        let weight = recommender.recency_weight(i64::MIN);
        assert!(weight.is_finite() && weight >= 0.0);
    }

    #[test]
    fn should_clamp_interactions_after_reference_time() {
        let dataset = two_user_dataset();
        let builder = fitted(&dataset, TimeContextParams::with_defaults(50));
        let recommender = builder.recommender(&dataset);
        assert!(approx_eq!(f64, 1.0, recommender.recency_weight(100), epsilon = 1e-12));
        let scored = recommender.recommend_scored(&1, 5, None);
        assert!(scored.iter().all(|s| s.score >= 0.0));
    }

    #[test]
    fn should_never_recommend_seen_items_and_stay_bounded() {
        let dataset = generate(&SyntheticConfig::default());
        let builder = fitted(&dataset, TimeContextParams::with_defaults(2_000_000_000));
        let recommender = builder.recommender(&dataset);

        let how_many = 7;
        for (user_id, history) in dataset.iter() {
            let scored = recommender.recommend_scored(user_id, how_many, Some(20));
            assert!(scored.len() <= how_many);
            assert!(scored.windows(2).all(|pair| pair[0].score >= pair[1].score));
            for recommendation in scored.iter() {
                assert!(recommendation.score >= 0.0);
                assert!(history.iter().all(|i| i.item_id != recommendation.id));
            }
        }
    }

    #[test]
    fn should_fan_out_over_users() {
        let dataset = two_user_dataset();
        let builder = fitted(&dataset, TimeContextParams::with_defaults(100));
        let recommender = builder.recommender(&dataset);

        let recommendations = recommender.recommend_users(&[1, 2, 42], 2, None);
        assert_eq!(3, recommendations.len());
        assert_eq!(vec![ITEM_C], recommendations[&1]);
        assert_eq!(vec![ITEM_B], recommendations[&2]);
        assert!(recommendations[&42].is_empty());
        assert_eq!(recommender.recommend(&1, 2, None), recommendations[&1]);
    }
}
