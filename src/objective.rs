use itertools::Itertools;

use crate::dataset::{Dataset, ItemId, UserId};
use crate::itemcf::similarity::{SimilarityBuilder, TimeContextParams};
use crate::metrics::recall::Recall;
use crate::metrics::RecommendationMetric;

/// Distinct held-out items per test user, ordered by user id.
pub fn held_out_items(test: &Dataset) -> Vec<(UserId, Vec<ItemId>)> {
    test.iter()
        .map(|(user_id, interactions)| {
            let items = interactions
                .iter()
                .map(|interaction| interaction.item_id)
                .unique()
                .collect_vec();
            (*user_id, items)
        })
        .sorted_by_key(|(user_id, _)| *user_id)
        .collect()
}

/// Fits on `train` and returns Recall@`how_many` over the users in `test`.
pub fn objective(
    train: &Dataset,
    test: &Dataset,
    params: TimeContextParams,
    how_many: usize,
    neighborhood_size_k: Option<usize>,
) -> f64 {
    let mut builder = SimilarityBuilder::new(params);
    builder.fit(train);
    let recommender = builder.recommender(train);

    let held_out = held_out_items(test);
    let user_ids = held_out.iter().map(|(user_id, _)| *user_id).collect_vec();
    let recommendations = recommender.recommend_users(&user_ids, how_many, neighborhood_size_k);

    let mut metric = Recall::new(how_many);
    for (user_id, items) in held_out.iter() {
        metric.add(&recommendations[user_id], items);
    }
    metric.result()
}

#[cfg(test)]
mod objective_test {
    use crate::dataset::{group_interactions, split_by_time};

    use super::*;

    #[test]
    fn should_collect_distinct_held_out_items() {
        let test = group_interactions(&[(2, 5, 0), (1, 7, 0), (1, 7, 1), (1, 8, 2)]);
        assert_eq!(vec![(1, vec![7, 8]), (2, vec![5])], held_out_items(&test));
    }

    #[test]
    fn should_score_perfect_recall_on_predictable_split() {
        let dataset = group_interactions(&[
            (1, 10, 0),
            (1, 11, 10),
            (2, 10, 0),
            (2, 11, 10),
            (3, 10, 20),
            (3, 11, 200),
        ]);
        let (train, test) = split_by_time(&dataset, 100);
        let params = TimeContextParams::with_defaults(100);
        let recall = objective(&train, &test, params, 5, None);
        assert!((1.0 - recall).abs() < f64::EPSILON);
    }
}
