use std::collections::HashMap;

use anyhow::{anyhow, Context};
use indicatif::ProgressBar;
use tracing::info;

use tcitemcf::config::AppConfig;
use tcitemcf::dataset::{split_by_time, split_timestamp};
use tcitemcf::hyperparameter::gridsearchlog::{GridSearchLog, GridSearchRecord};
use tcitemcf::hyperparameter::hyperparamgrid::HyperParamGrid;
use tcitemcf::itemcf::similarity::TimeContextParams;
use tcitemcf::logging::init_logging;
use tcitemcf::objective;
use tcitemcf::synthetic;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_default();
    // configuration errors carry non-Send source locations, so keep only the message
    let config = AppConfig::new(&config_path).map_err(|err| anyhow!("{}", err))?;
    init_logging(&config.log.level);

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.compute.num_threads)
        .build_global()?;

    let hyperparam = &config.hyperparam;
    let how_many = config.model.num_items_to_recommend;

    let dataset = synthetic::generate(&config.synthetic);
    let cutoff = split_timestamp(&dataset, config.eval.train_fraction)
        .context("cannot split an empty dataset")?;
    let (train, test) = split_by_time(&dataset, cutoff);
    let reference_timestamp = config.model.reference_timestamp.unwrap_or(cutoff);

    let mut param_grid = HashMap::new();
    param_grid.insert("alpha".to_string(), hyperparam.alpha_choices.clone());
    param_grid.insert("beta".to_string(), hyperparam.beta_choices.clone());
    param_grid.insert(
        "neighborhood_size_k".to_string(),
        hyperparam.neighborhood_size_k_choices.clone(),
    );
    let grid = HyperParamGrid { param_grid };
    let combinations = match hyperparam.max_combinations {
        Some(n) => grid.get_n_random_combinations(n, hyperparam.seed),
        None => grid.get_all_combinations(),
    };
    info!(
        evaluated = combinations.len(),
        total = grid.get_qty_combinations(),
        "starting grid search"
    );

    let mut log = if hyperparam.save_records {
        let log = GridSearchLog::create(&hyperparam.out_path)
            .map_err(|err| anyhow!("cannot write to {}: {}", hyperparam.out_path, err))?;
        Some(log)
    } else {
        None
    };

    let pb = ProgressBar::new(combinations.len() as u64);
    let mut best: Option<GridSearchRecord> = None;

    for (iteration, combination) in combinations.iter().enumerate() {
        pb.inc(1);
        let alpha = combination["alpha"];
        let beta = combination["beta"];
        let neighborhood_size_k = combination["neighborhood_size_k"].round() as usize;

        let params = TimeContextParams::new(alpha, beta, reference_timestamp)
            .map_err(|err| anyhow!("{}", err))?;
        // K = 0 consults every neighbor
        let k = if neighborhood_size_k == 0 {
            None
        } else {
            Some(neighborhood_size_k)
        };
        let recall = objective::objective(&train, &test, params, how_many, k);

        let record = GridSearchRecord {
            iteration,
            alpha,
            beta,
            neighborhood_size_k,
            recall,
        };
        if let Some(log) = log.as_mut() {
            log.write(&record).map_err(|err| anyhow!("{}", err))?;
        }
        if best.as_ref().map_or(true, |current| record.recall > current.recall) {
            best = Some(record);
        }
    }
    pb.finish();

    if let Some(log) = log.as_mut() {
        log.flush().map_err(|err| anyhow!("{}", err))?;
    }

    match best {
        Some(best) => {
            println!("Best alpha: {}", best.alpha);
            println!("Best beta: {}", best.beta);
            println!("Best neighborhood_size_k: {}", best.neighborhood_size_k);
            println!("Best value for Recall@{}: {}", how_many, best.recall);
        }
        None => println!("No hyperparameter combinations to evaluate."),
    }

    Ok(())
}
