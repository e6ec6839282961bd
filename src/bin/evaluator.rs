use anyhow::{anyhow, Context};
use tracing::info;

use tcitemcf::config::AppConfig;
use tcitemcf::dataset::{split_by_time, split_timestamp, DatasetStats};
use tcitemcf::itemcf::similarity::SimilarityBuilder;
use tcitemcf::logging::init_logging;
use tcitemcf::metrics::evaluation_reporter::EvaluationReporter;
use tcitemcf::objective::held_out_items;
use tcitemcf::stopwatch::Stopwatch;
use tcitemcf::synthetic;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_default();
    // configuration errors carry non-Send source locations, so keep only the message
    let config = AppConfig::new(&config_path).map_err(|err| anyhow!("{}", err))?;
    init_logging(&config.log.level);

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.compute.num_threads)
        .build_global()?;

    let dataset = synthetic::generate(&config.synthetic);
    DatasetStats::compute("synthetic", &dataset).log();

    let cutoff = split_timestamp(&dataset, config.eval.train_fraction)
        .context("cannot split an empty dataset")?;
    let (train, test) = split_by_time(&dataset, cutoff);
    info!(cutoff, "split interactions by time");
    DatasetStats::compute("train", &train).log();
    DatasetStats::compute("test", &test).log();

    // Without an explicit reference time, "now" is the end of the training period.
    let params = config
        .model
        .time_context_params(cutoff)
        .map_err(|err| anyhow!("{}", err))?;
    let mut builder = SimilarityBuilder::new(params);
    builder.fit(&train);
    let recommender = builder.recommender(&train);

    let how_many = config.model.num_items_to_recommend;
    let neighborhood_size_k = config.model.neighborhood_size_k;
    let mut reporter = EvaluationReporter::new(&train, how_many);
    let mut stopwatch = Stopwatch::new();

    for (user_id, items) in held_out_items(&test).iter() {
        stopwatch.start();
        let recommended_items = recommender.recommend(user_id, how_many, neighborhood_size_k);
        stopwatch.stop();
        reporter.add(&recommended_items, items);
    }

    println!("===============================================================");
    println!("===                 START EVALUATING TEST SPLIT            ====");
    println!("===============================================================");
    println!(
        "alpha={} beta={} t0={} N={} K={:?}",
        params.alpha(),
        params.beta(),
        params.reference_timestamp(),
        how_many,
        neighborhood_size_k
    );
    println!("{}", reporter.get_name());
    println!("{}", reporter.result());
    println!("Qty test evaluations: {}", stopwatch.get_n());
    println!("Recommendation latency");
    println!("p90 (microseconds): {}", stopwatch.get_percentile_in_micros(0.90));
    println!("p95 (microseconds): {}", stopwatch.get_percentile_in_micros(0.95));
    println!("p99.5 (microseconds): {}", stopwatch.get_percentile_in_micros(0.995));
    Ok(())
}
