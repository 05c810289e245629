// ============================================
// Exploration Module
// ============================================
//
// Two online policies that trade exploration against exploitation:
// 1. OrderPolicy - epsilon-greedy bandit that fixes the processing order
// 2. BoostPolicy - two-action Q-learning agent keyed by (category, rank)
//
// Both are plain in-memory tables; callers own synchronization.

pub mod bandit;
pub mod q_learning;

pub use bandit::OrderPolicy;
pub use q_learning::BoostPolicy;
