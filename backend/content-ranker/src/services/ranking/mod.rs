/// Ranking Module
///
/// Fuses engagement-based utility with the exploration policies into a
/// ranked feed.
///
/// # Workflow
/// 1. Order policy fixes (and caches) the processing order of all content
/// 2. Each item gets a base score from its engagement counters
/// 3. Optionally the boost agent adds a contextual nudge
/// 4. Items are sorted by final score and paginated
///
/// Feedback flows the other way: store update → reward → order policy value
/// update + boost agent table update → metrics snapshot.
pub mod engine;
pub mod scorer;

pub use engine::{EngineSettings, RankingEngine};
pub use scorer::base_score;
