use std::time::Instant;

use hashbrown::HashMap;
use rayon::prelude::*;
use tracing::info;

use crate::dataset::{Dataset, Interaction, ItemId, Timestamp, UserId};
use crate::error::{ItemCfError, Result};
use crate::itemcf::recommender::Recommender;
use crate::itemcf::{ItemScore, NeighborIndex};

// Users per independently accumulated partition during `fit`.
const USERS_PER_PARTITION: usize = 256;

pub const DEFAULT_ALPHA: f64 = 1.0;
pub const DEFAULT_BETA: f64 = 1.0;

/// Decay factors and the reference time shared by fitting and scoring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeContextParams {
    alpha: f64,
    beta: f64,
    reference_timestamp: Timestamp,
}

impl TimeContextParams {
    /// # Arguments
    ///
    /// * `alpha` - decay applied to the time gap between two co-occurring interactions.
    /// * `beta` - decay applied to the age of an interaction when scoring.
    /// * `reference_timestamp` - the "now" that interaction ages are measured against.
    ///
    /// Both decay factors must be positive and finite.
    pub fn new(alpha: f64, beta: f64, reference_timestamp: Timestamp) -> Result<Self> {
        Ok(TimeContextParams {
            alpha: validate_decay_factor("alpha", alpha)?,
            beta: validate_decay_factor("beta", beta)?,
            reference_timestamp,
        })
    }

    pub fn with_defaults(reference_timestamp: Timestamp) -> Self {
        TimeContextParams {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
            reference_timestamp,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn reference_timestamp(&self) -> Timestamp {
        self.reference_timestamp
    }
}

fn validate_decay_factor(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ItemCfError::InvalidDecayFactor { name, value })
    }
}

/// Sparse item-to-item similarity scores. Only pairs that co-occurred for at
/// least one user are stored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimilarityMatrix {
    rows: HashMap<ItemId, HashMap<ItemId, f64>>,
}

impl SimilarityMatrix {
    pub fn similarity(&self, item_id: &ItemId, other_item_id: &ItemId) -> Option<f64> {
        self.rows.get(item_id)?.get(other_item_id).copied()
    }

    pub fn row(&self, item_id: &ItemId) -> Option<&HashMap<ItemId, f64>> {
        self.rows.get(item_id)
    }

    pub fn num_items(&self) -> usize {
        self.rows.len()
    }

    pub fn num_pairs(&self) -> usize {
        self.rows.values().map(|row| row.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Per item, its co-occurring items ordered by descending similarity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NeighborRanking {
    item_to_neighbors_ordered: HashMap<ItemId, Vec<ItemScore>>,
}

impl NeighborRanking {
    fn from_similarities(similarities: &SimilarityMatrix) -> Self {
        let item_to_neighbors_ordered = similarities
            .rows
            .par_iter()
            .map(|(item_id, row)| {
                let mut neighbors: Vec<ItemScore> = row
                    .iter()
                    .map(|(other_item_id, score)| ItemScore::new(*other_item_id, *score))
                    .collect();
                neighbors.sort_unstable();
                (*item_id, neighbors)
            })
            .collect();

        NeighborRanking {
            item_to_neighbors_ordered,
        }
    }

    pub fn neighbors(&self, item_id: &ItemId) -> &[ItemScore] {
        self.item_to_neighbors_ordered
            .get(item_id)
            .map(|neighbors| neighbors.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.item_to_neighbors_ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_to_neighbors_ordered.is_empty()
    }
}

impl NeighborIndex for NeighborRanking {
    fn neighbors(&self, item_id: &ItemId) -> &[ItemScore] {
        NeighborRanking::neighbors(self, item_id)
    }
}

/// Raw decayed co-occurrence sums and occurrence counts, before normalization.
#[derive(Default)]
struct CooccurrenceCounts {
    cooccurrences: HashMap<ItemId, HashMap<ItemId, f64>>,
    occurrences: HashMap<ItemId, u64>,
}

impl CooccurrenceCounts {
    fn accumulate(&mut self, interactions: &[Interaction], alpha: f64) {
        for (pos, current) in interactions.iter().enumerate() {
            *self.occurrences.entry(current.item_id).or_insert(0) += 1;
            for (other_pos, other) in interactions.iter().enumerate() {
                // Same position, or the same item repeated at another position.
                if pos == other_pos || current.item_id == other.item_id {
                    continue;
                }
                let time_gap = current.timestamp.abs_diff(other.timestamp) as f64;
                *self
                    .cooccurrences
                    .entry(current.item_id)
                    .or_default()
                    .entry(other.item_id)
                    .or_insert(0.0) += 1.0 / (alpha * (time_gap + 1.0));
            }
        }
    }

    fn merge(mut self, other: CooccurrenceCounts) -> CooccurrenceCounts {
        for (item_id, row) in other.cooccurrences.into_iter() {
            let target = self.cooccurrences.entry(item_id).or_default();
            for (other_item_id, score) in row.into_iter() {
                *target.entry(other_item_id).or_insert(0.0) += score;
            }
        }
        for (item_id, qty) in other.occurrences.into_iter() {
            *self.occurrences.entry(item_id).or_insert(0) += qty;
        }
        self
    }

    fn normalize(self) -> SimilarityMatrix {
        let CooccurrenceCounts {
            cooccurrences,
            occurrences,
        } = self;

        let rows = cooccurrences
            .into_par_iter()
            .map(|(item_id, mut row)| {
                let item_occurrences = occurrences[&item_id];
                for (other_item_id, score) in row.iter_mut() {
                    let other_occurrences = occurrences[other_item_id];
                    *score /= ((item_occurrences * other_occurrences) as f64).sqrt();
                }
                (item_id, row)
            })
            .collect();

        SimilarityMatrix { rows }
    }
}

fn compute_similarities(dataset: &Dataset, alpha: f64) -> SimilarityMatrix {
    // Fixed user order and fixed partition boundaries keep the floating point
    // summation order, and thus the result, identical between runs.
    let mut user_ids: Vec<&UserId> = dataset.keys().collect();
    user_ids.sort_unstable();
    let histories: Vec<&[Interaction]> = user_ids
        .iter()
        .map(|user_id| dataset[*user_id].as_slice())
        .collect();

    let partitions: Vec<CooccurrenceCounts> = histories
        .par_chunks(USERS_PER_PARTITION)
        .map(|partition| {
            let mut counts = CooccurrenceCounts::default();
            for interactions in partition.iter() {
                counts.accumulate(interactions, alpha);
            }
            counts
        })
        .collect();

    partitions
        .into_iter()
        .fold(CooccurrenceCounts::default(), CooccurrenceCounts::merge)
        .normalize()
}

/// Builds the item similarity index from a time-stamped interaction log.
pub struct SimilarityBuilder {
    params: TimeContextParams,
    similarities: SimilarityMatrix,
    neighbor_ranking: NeighborRanking,
}

impl SimilarityBuilder {
    pub fn new(params: TimeContextParams) -> Self {
        SimilarityBuilder {
            params,
            similarities: SimilarityMatrix::default(),
            neighbor_ranking: NeighborRanking::default(),
        }
    }

    /// Recomputes the similarity matrix and neighbor ranking from scratch.
    ///
    /// For every user, each ordered pair of interactions with different items
    /// adds `1 / (alpha * (|t_i - t_j| + 1))` to the pair's score. Scores are
    /// then divided by `sqrt(n_i * n_j)`, where `n` counts every occurrence of
    /// an item over all users. Previously fitted state is replaced once the
    /// computation has finished.
    pub fn fit(&mut self, dataset: &Dataset) {
        let start_time = Instant::now();
        let similarities = compute_similarities(dataset, self.params.alpha);
        let neighbor_ranking = NeighborRanking::from_similarities(&similarities);
        info!(
            users = dataset.len(),
            items = similarities.num_items(),
            pairs = similarities.num_pairs(),
            elapsed_micros = start_time.elapsed().as_micros() as u64,
            "fitted item similarities"
        );
        self.similarities = similarities;
        self.neighbor_ranking = neighbor_ranking;
    }

    pub fn params(&self) -> &TimeContextParams {
        &self.params
    }

    pub fn similarities(&self) -> &SimilarityMatrix {
        &self.similarities
    }

    pub fn neighbor_ranking(&self) -> &NeighborRanking {
        &self.neighbor_ranking
    }

    /// A recommender over this index for the dataset it was fitted on.
    pub fn recommender<'a>(&'a self, dataset: &'a Dataset) -> Recommender<'a, SimilarityBuilder> {
        Recommender::new(self, dataset, &self.params)
    }
}

impl NeighborIndex for SimilarityBuilder {
    fn neighbors(&self, item_id: &ItemId) -> &[ItemScore] {
        self.neighbor_ranking.neighbors(item_id)
    }
}
