use thiserror::Error;

pub type Result<T> = std::result::Result<T, ItemCfError>;

#[derive(Error, Debug)]
pub enum ItemCfError {
    #[error("decay factor `{name}` must be a positive finite number, got {value}")]
    InvalidDecayFactor { name: &'static str, value: f64 },

    #[error("invalid value for `{key}`: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("configuration error: {0}")]
    Config(#[from] justconfig::error::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
