// ============================================
// Tabular Boost Agent (Q-learning)
// ============================================
//
// Context key: "{category}:{previous_rank}" where previous_rank is the
// 1-based position in the cached stable order (0 when absent).
//
// Actions: 0 = hold, 1 = boost. Boost value = 0.5 + Q[s][1] * 0.1
//
// Update (next state is the same state):
//   Q[s][a] += alpha * (reward + gamma * max(Q[s]) - Q[s][a])

use rand::Rng;
use std::collections::HashMap;
use tracing::debug;

use crate::models::BoostAction;

const BASE_BOOST: f64 = 0.5;
const Q_BOOST_WEIGHT: f64 = 0.1;

#[derive(Debug)]
pub struct BoostPolicy {
    alpha: f64,
    gamma: f64,
    q: HashMap<String, [f64; 2]>,
}

impl Default for BoostPolicy {
    fn default() -> Self {
        Self::new(0.2, 0.9)
    }
}

impl BoostPolicy {
    pub fn new(alpha: f64, gamma: f64) -> Self {
        Self {
            alpha,
            gamma,
            q: HashMap::new(),
        }
    }

    pub fn state_key(category: &str, previous_rank: usize) -> String {
        format!("{}:{}", category, previous_rank)
    }

    /// Action values for a state, zeros when never updated
    pub fn q_values(&self, state_key: &str) -> [f64; 2] {
        self.q.get(state_key).copied().unwrap_or([0.0, 0.0])
    }

    fn q_values_mut(&mut self, state_key: &str) -> &mut [f64; 2] {
        self.q.entry(state_key.to_string()).or_insert([0.0, 0.0])
    }

    /// Epsilon-greedy choice; on equal values the hold action wins.
    pub fn select_action<R: Rng + ?Sized>(
        &self,
        state_key: &str,
        epsilon: f64,
        rng: &mut R,
    ) -> BoostAction {
        if rng.gen::<f64>() < epsilon {
            return BoostAction::from_index(rng.gen_range(0..2));
        }

        let q = self.q_values(state_key);
        if q[BoostAction::Boost.index()] > q[BoostAction::Hold.index()] {
            BoostAction::Boost
        } else {
            BoostAction::Hold
        }
    }

    pub fn update(&mut self, state_key: &str, action: BoostAction, reward: f64) {
        let (alpha, gamma) = (self.alpha, self.gamma);
        let q = self.q_values_mut(state_key);
        let best_next = q[0].max(q[1]);
        let a = action.index();
        q[a] += alpha * (reward + gamma * best_next - q[a]);

        debug!(
            state = state_key,
            action = a,
            reward = reward,
            q_hold = q[0],
            q_boost = q[1],
            "Boost policy updated"
        );
    }

    /// Additive score nudge for the chosen action
    pub fn boost_value(&self, state_key: &str, action: BoostAction) -> f64 {
        match action {
            BoostAction::Boost => {
                BASE_BOOST + self.q_values(state_key)[BoostAction::Boost.index()] * Q_BOOST_WEIGHT
            }
            BoostAction::Hold => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_state_key_format() {
        assert_eq!(BoostPolicy::state_key("news", 3), "news:3");
        assert_eq!(BoostPolicy::state_key("", 0), ":0");
    }

    #[test]
    fn test_single_update_from_zero() {
        let mut policy = BoostPolicy::new(0.2, 0.9);
        policy.update("news:1", BoostAction::Boost, 1.0);

        let q = policy.q_values("news:1");
        assert!((q[1] - 0.2).abs() < 1e-12);
        assert_eq!(q[0], 0.0);
    }

    #[test]
    fn test_update_bootstraps_from_same_state() {
        let mut policy = BoostPolicy::new(0.2, 0.9);
        policy.update("s", BoostAction::Boost, 1.0); // Q = [0, 0.2]
        policy.update("s", BoostAction::Hold, 0.0); // 0.2 * (0 + 0.9 * 0.2 - 0)

        let q = policy.q_values("s");
        assert!((q[0] - 0.036).abs() < 1e-12);
        assert!((q[1] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_greedy_selection_prefers_hold_on_ties() {
        let mut policy = BoostPolicy::default();
        let mut rng = StdRng::seed_from_u64(5);

        assert_eq!(policy.select_action("s", 0.0, &mut rng), BoostAction::Hold);

        policy.update("s", BoostAction::Boost, 1.0);
        assert_eq!(policy.select_action("s", 0.0, &mut rng), BoostAction::Boost);
    }

    #[test]
    fn test_full_exploration_hits_both_actions() {
        let policy = BoostPolicy::default();
        let mut rng = StdRng::seed_from_u64(11);

        let boosts = (0..200)
            .filter(|_| policy.select_action("s", 1.0, &mut rng) == BoostAction::Boost)
            .count();

        assert!(boosts > 0 && boosts < 200);
    }

    #[test]
    fn test_boost_value() {
        let mut policy = BoostPolicy::new(0.2, 0.9);
        assert_eq!(policy.boost_value("s", BoostAction::Hold), 0.0);
        assert!((policy.boost_value("s", BoostAction::Boost) - 0.5).abs() < 1e-12);

        policy.update("s", BoostAction::Boost, 1.0);
        assert!((policy.boost_value("s", BoostAction::Boost) - 0.52).abs() < 1e-12);
    }
}
