use chrono::{DateTime, Utc};
use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use num_format::{Locale, ToFormattedString};
use rayon::prelude::*;
use tdigest::TDigest;
use tracing::info;

pub type UserId = u64;
pub type ItemId = u64;
pub type Timestamp = i64;

/// One user touching one item at one point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interaction {
    pub item_id: ItemId,
    pub timestamp: Timestamp,
}

impl Interaction {
    pub fn new(item_id: ItemId, timestamp: Timestamp) -> Self {
        Interaction { item_id, timestamp }
    }
}

/// Interaction history per user, in read order.
pub type Dataset = HashMap<UserId, Vec<Interaction>>;

/// Groups flat `(user, item, time)` records by user. The order of the records
/// for a user is kept as is.
pub fn group_interactions(records: &[(UserId, ItemId, Timestamp)]) -> Dataset {
    records
        .iter()
        .map(|(user_id, item_id, timestamp)| (*user_id, Interaction::new(*item_id, *timestamp)))
        .into_group_map()
        .into_iter()
        .collect()
}

/// Splits every history at `cutoff`: interactions strictly before it go to the
/// training side, the rest to the test side. Users without interactions on a
/// side do not appear in that side's dataset.
pub fn split_by_time(dataset: &Dataset, cutoff: Timestamp) -> (Dataset, Dataset) {
    let mut train = Dataset::with_capacity(dataset.len());
    let mut test = Dataset::new();
    for (user_id, interactions) in dataset.iter() {
        let (before, after): (Vec<Interaction>, Vec<Interaction>) = interactions
            .iter()
            .partition(|interaction| interaction.timestamp < cutoff);
        if !before.is_empty() {
            train.insert(*user_id, before);
        }
        if !after.is_empty() {
            test.insert(*user_id, after);
        }
    }
    (train, test)
}

/// Timestamp at `train_fraction` of the observed time range, or `None` for an
/// empty dataset.
pub fn split_timestamp(dataset: &Dataset, train_fraction: f64) -> Option<Timestamp> {
    let (min_time, max_time) = time_range(dataset)?;
    let fraction = train_fraction.clamp(0.0, 1.0);
    let offset = ((max_time - min_time) as f64 * fraction).round() as Timestamp;
    Some(min_time + offset)
}

fn time_range(dataset: &Dataset) -> Option<(Timestamp, Timestamp)> {
    dataset
        .values()
        .flat_map(|interactions| interactions.iter().map(|interaction| interaction.timestamp))
        .minmax()
        .into_option()
}

pub struct DatasetStats {
    pub descriptive_name: String,
    pub qty_records: usize,
    pub qty_unique_user_ids: usize,
    pub qty_unique_item_ids: usize,
    pub min_time_date_time: Option<DateTime<Utc>>,
    pub max_time_date_time: Option<DateTime<Utc>>,
    pub history_length_p50: u64,
    pub history_length_p90: u64,
    pub history_length_p99: u64,
    pub history_length_p100: u64,
}

impl DatasetStats {
    pub fn compute(descriptive_name: &str, dataset: &Dataset) -> DatasetStats {
        let qty_records = dataset.values().map(|interactions| interactions.len()).sum();

        let unique_items: HashSet<ItemId> = dataset
            .par_values()
            .flat_map_iter(|interactions| {
                interactions.iter().map(|interaction| interaction.item_id)
            })
            .collect();

        let (min_time_date_time, max_time_date_time) = match time_range(dataset) {
            Some((min_time, max_time)) => (
                DateTime::<Utc>::from_timestamp(min_time, 0),
                DateTime::<Utc>::from_timestamp(max_time, 0),
            ),
            None => (None, None),
        };

        let history_lengths = dataset
            .values()
            .map(|interactions| interactions.len() as f64)
            .collect_vec();
        let quantile = if history_lengths.is_empty() {
            None
        } else {
            Some(TDigest::new_with_size(100).merge_unsorted(history_lengths))
        };
        let estimate = |q: f64| {
            quantile
                .as_ref()
                .map(|digest| digest.estimate_quantile(q).round() as u64)
                .unwrap_or(0)
        };

        DatasetStats {
            descriptive_name: descriptive_name.to_string(),
            qty_records,
            qty_unique_user_ids: dataset.len(),
            qty_unique_item_ids: unique_items.len(),
            min_time_date_time,
            max_time_date_time,
            history_length_p50: estimate(0.50),
            history_length_p90: estimate(0.90),
            history_length_p99: estimate(0.99),
            history_length_p100: estimate(1.0),
        }
    }

    pub fn log(&self) {
        let span = match (self.min_time_date_time, self.max_time_date_time) {
            (Some(min_time), Some(max_time)) => format!("{} / {}", min_time, max_time),
            _ => "-".to_string(),
        };
        info!(
            dataset = %self.descriptive_name,
            interactions = %self.qty_records.to_formatted_string(&Locale::en),
            users = %self.qty_unique_user_ids.to_formatted_string(&Locale::en),
            items = %self.qty_unique_item_ids.to_formatted_string(&Locale::en),
            span = %span,
            "loaded dataset"
        );
        info!(
            p50 = self.history_length_p50,
            p90 = self.history_length_p90,
            p99 = self.history_length_p99,
            p100 = self.history_length_p100,
            "history length percentiles"
        );
    }
}
