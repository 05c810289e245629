pub mod exploration;
pub mod ranking;
pub mod snapshot;
pub mod store;

pub use exploration::{BoostPolicy, OrderPolicy};
pub use ranking::{base_score, EngineSettings, RankingEngine};
pub use store::EngagementStore;
