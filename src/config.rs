use std::ffi::OsStr;
use std::fs::File;

use justconfig::error::ConfigError;
use justconfig::item::{MapAction, StringItem, ValueExtractor};
use justconfig::processors::Trim;
use justconfig::sources::env::Env;
use justconfig::sources::text::ConfigText;
use justconfig::ConfPath;
use justconfig::Config;

use crate::dataset::Timestamp;
use crate::error::{ItemCfError, Result};
use crate::itemcf::similarity::{TimeContextParams, DEFAULT_ALPHA, DEFAULT_BETA};
use crate::synthetic::SyntheticConfig;

// Set some default values
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_NUM_ITEMS_TO_RECOMMEND: usize = 10;
const DEFAULT_TRAIN_FRACTION: f64 = 0.8;
const DEFAULT_ALPHA_CHOICES: &str = "0.5,1,2";
const DEFAULT_BETA_CHOICES: &str = "0.0001,0.001,0.01,1";
const DEFAULT_NEIGHBORHOOD_SIZE_K_CHOICES: &str = "0,10,50";
const DEFAULT_GRID_SEARCH_OUT_PATH: &str = "grid_search.csv";

pub struct AppConfig {
    pub log: LogConfig,
    pub compute: ComputeConfig,
    pub model: ModelConfig,
    pub synthetic: SyntheticConfig,
    pub eval: EvalConfig,
    pub hyperparam: HyperparamConfig,
}

pub struct LogConfig {
    pub level: String,
}

pub struct ComputeConfig {
    pub num_threads: usize,
}

pub struct ModelConfig {
    pub alpha: f64,
    pub beta: f64,
    pub reference_timestamp: Option<Timestamp>,
    pub num_items_to_recommend: usize,
    pub neighborhood_size_k: Option<usize>,
}

pub struct EvalConfig {
    pub train_fraction: f64,
}

pub struct HyperparamConfig {
    pub alpha_choices: Vec<f64>,
    pub beta_choices: Vec<f64>,
    /// `0` stands for "consult all neighbors".
    pub neighborhood_size_k_choices: Vec<f64>,
    pub max_combinations: Option<usize>,
    pub seed: u64,
    pub save_records: bool,
    pub out_path: String,
}

impl AppConfig {
    /// Reads `config_path` if it exists, then applies environment overrides.
    pub fn new(config_path: &str) -> Result<AppConfig> {
        let mut conf = Config::default();

        if let Ok(config_file) = File::open(config_path) {
            conf.add_source(ConfigText::new(config_file, config_path)?);
        }

        let config_env = Env::new(&[
            (ConfPath::from(&["log", "level"]), OsStr::new("LOG_LEVEL")),
            (
                ConfPath::from(&["compute", "num_threads"]),
                OsStr::new("NUM_THREADS"),
            ),
        ]);
        conf.add_source(config_env);

        AppConfig::parse(&conf)
    }

    pub fn parse(conf: &Config) -> Result<AppConfig> {
        Ok(AppConfig {
            log: LogConfig::parse(conf, ConfPath::from(&["log"]))?,
            compute: ComputeConfig::parse(conf, ConfPath::from(&["compute"]))?,
            model: ModelConfig::parse(conf, ConfPath::from(&["model"]))?,
            synthetic: parse_synthetic(conf, ConfPath::from(&["synthetic"]))?,
            eval: EvalConfig::parse(conf, ConfPath::from(&["eval"]))?,
            hyperparam: HyperparamConfig::parse(conf, ConfPath::from(&["hyperparam"]))?,
        })
    }
}

impl LogConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<LogConfig> {
        Ok(LogConfig {
            level: conf
                .get(path.push("level"))
                .unquote()
                .try_value()?
                .unwrap_or_else(|| String::from(DEFAULT_LOG_LEVEL)),
        })
    }
}

impl ComputeConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<ComputeConfig> {
        Ok(ComputeConfig {
            num_threads: conf
                .get(path.push("num_threads"))
                .trim()
                .try_value()?
                // Detect number of CPUs
                .unwrap_or_else(|| sys_info::cpu_num().map(|n| n as usize).unwrap_or(1)),
        })
    }
}

impl ModelConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<ModelConfig> {
        Ok(ModelConfig {
            alpha: conf
                .get(path.push("alpha"))
                .trim()
                .try_value()?
                .unwrap_or(DEFAULT_ALPHA),
            beta: conf
                .get(path.push("beta"))
                .trim()
                .try_value()?
                .unwrap_or(DEFAULT_BETA),
            reference_timestamp: conf.get(path.push("reference_timestamp")).trim().try_value()?,
            num_items_to_recommend: conf
                .get(path.push("num_items_to_recommend"))
                .trim()
                .try_value()?
                .unwrap_or(DEFAULT_NUM_ITEMS_TO_RECOMMEND),
            neighborhood_size_k: conf.get(path.push("neighborhood_size_k")).trim().try_value()?,
        })
    }

    /// Validated decay parameters. `fallback_reference_timestamp` is used when
    /// no reference timestamp is configured.
    pub fn time_context_params(
        &self,
        fallback_reference_timestamp: Timestamp,
    ) -> Result<TimeContextParams> {
        TimeContextParams::new(
            self.alpha,
            self.beta,
            self.reference_timestamp
                .unwrap_or(fallback_reference_timestamp),
        )
    }
}

fn parse_synthetic(conf: &Config, path: ConfPath) -> Result<SyntheticConfig> {
    let defaults = SyntheticConfig::default();
    Ok(SyntheticConfig {
        num_users: conf
            .get(path.push("num_users"))
            .trim()
            .try_value()?
            .unwrap_or(defaults.num_users),
        num_items: conf
            .get(path.push("num_items"))
            .trim()
            .try_value()?
            .unwrap_or(defaults.num_items),
        min_interactions_per_user: conf
            .get(path.push("min_interactions_per_user"))
            .trim()
            .try_value()?
            .unwrap_or(defaults.min_interactions_per_user),
        max_interactions_per_user: conf
            .get(path.push("max_interactions_per_user"))
            .trim()
            .try_value()?
            .unwrap_or(defaults.max_interactions_per_user),
        start_timestamp: conf
            .get(path.push("start_timestamp"))
            .trim()
            .try_value()?
            .unwrap_or(defaults.start_timestamp),
        time_span_secs: conf
            .get(path.push("time_span_secs"))
            .trim()
            .try_value()?
            .unwrap_or(defaults.time_span_secs),
        seed: conf
            .get(path.push("seed"))
            .trim()
            .try_value()?
            .unwrap_or(defaults.seed),
    })
}

impl EvalConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<EvalConfig> {
        let train_fraction = conf
            .get(path.push("train_fraction"))
            .trim()
            .try_value()?
            .unwrap_or(DEFAULT_TRAIN_FRACTION);
        if !(0.0..=1.0).contains(&train_fraction) {
            return Err(ItemCfError::InvalidSetting {
                key: "eval.train_fraction".to_string(),
                reason: format!("{} is not within 0.0 ..= 1.0", train_fraction),
            });
        }
        Ok(EvalConfig { train_fraction })
    }
}

impl HyperparamConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<HyperparamConfig> {
        let choices = |key: &str, default: &str| -> Result<Vec<f64>> {
            let raw: Option<String> = conf.get(path.push(key)).unquote().try_value()?;
            parse_choices(key, raw.as_deref().unwrap_or(default))
        };

        Ok(HyperparamConfig {
            alpha_choices: choices("alpha_choices", DEFAULT_ALPHA_CHOICES)?,
            beta_choices: choices("beta_choices", DEFAULT_BETA_CHOICES)?,
            neighborhood_size_k_choices: choices(
                "neighborhood_size_k_choices",
                DEFAULT_NEIGHBORHOOD_SIZE_K_CHOICES,
            )?,
            max_combinations: conf.get(path.push("max_combinations")).trim().try_value()?,
            seed: conf.get(path.push("seed")).trim().try_value()?.unwrap_or(0),
            save_records: conf
                .get(path.push("save_records"))
                .trim()
                .try_value()?
                .unwrap_or(false),
            out_path: conf
                .get(path.push("out_path"))
                .unquote()
                .try_value()?
                .unwrap_or_else(|| String::from(DEFAULT_GRID_SEARCH_OUT_PATH)),
        })
    }
}

fn parse_choices(key: &str, raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|choice| !choice.is_empty())
        .map(|choice| {
            choice.parse::<f64>().map_err(|err| ItemCfError::InvalidSetting {
                key: format!("hyperparam.{}", key),
                reason: format!("`{}`: {}", choice, err),
            })
        })
        .collect()
}

/// Strips surrounding double quotes from configuration strings.
trait Unquote
where
    Self: Sized,
{
    fn unquote(self) -> std::result::Result<StringItem, ConfigError>;
}

impl Unquote for std::result::Result<StringItem, ConfigError> {
    fn unquote(self) -> std::result::Result<StringItem, ConfigError> {
        self?.map(|v| {
            let v = v.trim();
            if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
                MapAction::Replace(vec![v[1..v.len() - 1].to_owned()])
            } else {
                MapAction::Keep
            }
        })
    }
}
