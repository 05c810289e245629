// ============================================
// Epsilon-Greedy Order Policy
// ============================================
//
// One accumulated value per content id. Ordering is global:
//   - with probability epsilon: uniform random permutation of all ids
//   - otherwise: ids sorted by value descending, ties keep input order
//
// Values only ever grow by the observed reward (no decay, no averaging).

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct OrderPolicy {
    values: HashMap<String, f64>,
}

impl OrderPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored value, 0.0 for unseen ids
    pub fn value(&self, id: &str) -> f64 {
        self.values.get(id).copied().unwrap_or(0.0)
    }

    /// Produce a full permutation of `ids`.
    pub fn choose_order<R: Rng + ?Sized>(
        &self,
        ids: &[String],
        epsilon: f64,
        rng: &mut R,
    ) -> Vec<String> {
        let mut order = ids.to_vec();

        if rng.gen::<f64>() < epsilon {
            order.shuffle(rng);
            debug!(count = order.len(), "Order policy explored");
        } else {
            // sort_by is stable, so equal values keep their input order
            order.sort_by(|a, b| self.value(b).total_cmp(&self.value(a)));
            debug!(count = order.len(), "Order policy exploited");
        }

        order
    }

    pub fn update(&mut self, id: &str, reward: f64) {
        *self.values.entry(id.to_string()).or_insert(0.0) += reward;
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
