use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use std::collections::HashMap;

pub type ParamCombination = HashMap<String, f64>;

pub struct HyperParamGrid {
    pub param_grid: HashMap<String, Vec<f64>>,
}

impl HyperParamGrid {
    /// Returns `n` unique random combinations out of all hyperparameter
    /// combinations, or all of them when there are fewer than `n`.
    /// The values given for a parameter are assumed to be unique.
    ///
    /// # Arguments
    ///
    /// * `n` - the requested amount of random results returned.
    /// * `seed` - makes the selection reproducible.
    pub fn get_n_random_combinations(&self, n: usize, seed: u64) -> Vec<ParamCombination> {
        let mut all_combinations = self.get_all_combinations();
        all_combinations.shuffle(&mut Pcg64::seed_from_u64(seed));
        all_combinations.truncate(n);
        all_combinations
    }

    /// Combinations are enumerated with the parameter names in sorted order,
    /// so the result does not depend on the hash map's iteration order.
    pub fn get_all_combinations(&self) -> Vec<ParamCombination> {
        let mut entries: Vec<(&String, &Vec<f64>)> = self.param_grid.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut keys = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());
        for (key, choices) in entries {
            keys.push(key.clone());
            values.push(choices.clone());
        }

        HyperParamGrid::cartesian_product(&values)
            .into_iter()
            .map(|param_values| keys.iter().cloned().zip(param_values).collect())
            .collect()
    }

    fn cartesian_product(lists: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let mut list_iter = lists.iter();
        let mut res: Vec<Vec<f64>> = match list_iter.next() {
            Some(first_list) => first_list.iter().map(|&value| vec![value]).collect(),
            None => return Vec::new(),
        };
        for list in list_iter {
            res = res
                .into_iter()
                .flat_map(|prefix| {
                    list.iter().map(move |&value| {
                        let mut combination = prefix.clone();
                        combination.push(value);
                        combination
                    })
                })
                .collect();
        }
        res
    }

    pub fn get_qty_combinations(&self) -> usize {
        if self.param_grid.is_empty() {
            return 0;
        }
        self.param_grid.values().map(|choices| choices.len()).product()
    }
}
