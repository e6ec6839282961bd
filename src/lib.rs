//! Time-context item-based collaborative filtering.
//!
//! [`itemcf::similarity::SimilarityBuilder`] turns a time-stamped interaction
//! log into a sparse item similarity index, and
//! [`itemcf::recommender::Recommender`] scores unseen items for a user by
//! weighting each historical interaction with its recency.

pub mod config;
pub mod dataset;
pub mod error;
pub mod hyperparameter;
pub mod itemcf;
pub mod logging;
pub mod metrics;
pub mod objective;
pub mod stopwatch;
pub mod synthetic;
