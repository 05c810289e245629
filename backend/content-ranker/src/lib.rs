pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod persistence;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{RankerError, Result};
pub use services::{EngineSettings, RankingEngine};
