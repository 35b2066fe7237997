use crate::Probability;
use crate::medium::outcome::Outcome;
use rand::Rng;
use rand::rngs::SmallRng;

pub(super) const MAX_PERIOD_EXPONENT: u32 = 8;
const OPTIMALITY_WINDOW: f64 = 0.95;
const INITIAL_NOISE: f64 = 0.1;
const INITIAL_TRANSMIT: f64 = 0.25;
pub(super) const INC_SUCCESS: f64 = 0.2;
pub(super) const INC_COLLISION: f64 = 0.5;
pub(super) const INC_POTENTIAL_COLLISION: f64 = 0.5;
const INC_EMPTY: f64 = 0.2;
const RELINQUISH: f64 = 2e-2;

/// ALOHA-QT: the full binary bank of 2^m-periodic policies, one
/// weight each. policy j wants the slots where time mod N[j] == K[j];
/// the node transmits when some policy above the optimality window
/// (or the single best one, which is always selected) wants the slot.
pub struct AlohaQt {
    pub(super) name: String,
    pub(super) active: bool,
    pub(super) decision: bool,
    pub(super) time: u64,
    pub(super) periods: Vec<u64>,
    pub(super) phases: Vec<u64>,
    pub(super) weights: Vec<Probability>,
    pub(super) active_policies: Vec<bool>,
    pub(super) selected_policies: Vec<bool>,
    pub(super) inc_empty: f64,
    pub(super) relinquish: f64,
}

impl AlohaQt {
    pub fn new(rng: &mut SmallRng) -> Self {
        Self::grown(MAX_PERIOD_EXPONENT, INC_EMPTY, RELINQUISH, rng)
    }

    /// the fair variant reuses the bank with its own empty increment
    pub(super) fn grown(
        max_period_exponent: u32,
        inc_empty: f64,
        relinquish: f64,
        rng: &mut SmallRng,
    ) -> Self {
        let name = format!("{:x}", rng.random::<u16>());
        let mut periods = Vec::new();
        let mut phases = Vec::new();
        let mut weights = Vec::new();
        for m in 0..=max_period_exponent {
            let n = 1u64 << m;
            for k in 0..n {
                let w = INITIAL_TRANSMIT * ((1.0 - INITIAL_NOISE) + INITIAL_NOISE * rng.random::<f64>());
                periods.push(n);
                phases.push(k);
                weights.push(w / 1.2f64.powi(m as i32));
            }
        }
        let count = weights.len();
        Self {
            name,
            active: true,
            decision: false,
            time: 0,
            periods,
            phases,
            weights,
            active_policies: vec![false; count],
            selected_policies: vec![false; count],
            inc_empty,
            relinquish,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn decide(&mut self) -> bool {
        for j in 0..self.weights.len() {
            self.active_policies[j] = self.time % self.periods[j] == self.phases[j];
            self.selected_policies[j] = self.weights[j] > OPTIMALITY_WINDOW;
        }
        self.selected_policies[super::argmax(&self.weights)] = true;
        self.decision = self.active
            && self
                .active_policies
                .iter()
                .zip(&self.selected_policies)
                .any(|(a, s)| *a && *s);
        self.decision
    }

    pub fn learn(&mut self, outcome: &Outcome, rng: &mut SmallRng) {
        let (sign, inc_amount) = match outcome {
            Outcome::Collision => (-1.0, INC_COLLISION),
            Outcome::Used { .. } if self.decision => (1.0, INC_SUCCESS),
            Outcome::Used { .. } => (-1.0, INC_POTENTIAL_COLLISION),
            Outcome::Empty => (1.0, self.inc_empty),
        };
        let factor = self.update_factor(sign, inc_amount, 1.0, rng);
        let relinquish = self.decision && rng.random::<f64>() < self.relinquish;
        self.rescale(&factor, relinquish, rng);
    }

    /// multiplicative weight factor: exp(sign * inc * U) on the
    /// policies that wanted this slot, exp(0) = 1 on the rest. one
    /// fresh uniform draw per policy per slot.
    pub(super) fn update_factor(
        &self,
        sign: f64,
        inc_amount: f64,
        scale: f64,
        rng: &mut SmallRng,
    ) -> Vec<f64> {
        self.active_policies
            .iter()
            .map(|&wants| {
                let u = rng.random::<f64>();
                match wants {
                    true => (sign * inc_amount * u * scale).exp(),
                    false => 1.0,
                }
            })
            .collect()
    }

    /// apply the factor, optionally zero the just-active weights, clip
    /// to [0, 1], and redistribute conserved weight mass when the bank
    /// has drained below its initial level.
    pub(super) fn rescale(&mut self, factor: &[f64], relinquish: bool, rng: &mut SmallRng) {
        let count = self.weights.len();
        let old_sum = self.weights.iter().sum::<f64>();
        let mut next = self
            .weights
            .iter()
            .zip(factor)
            .map(|(w, f)| w * f)
            .collect::<Vec<f64>>();
        if relinquish {
            for (w, wants) in next.iter_mut().zip(&self.active_policies) {
                if *wants {
                    *w = 0.0;
                }
            }
        }
        for w in next.iter_mut() {
            *w = w.min(1.0);
        }
        let new_sum = next.iter().sum::<f64>();
        let decrease = old_sum - new_sum;
        if decrease > 0.0 && new_sum < INITIAL_TRANSMIT * count as f64 {
            let inc = (0..count).map(|_| rng.random::<f64>()).collect::<Vec<f64>>();
            let total = inc.iter().sum::<f64>();
            for (w, i) in next.iter_mut().zip(&inc) {
                *w = (*w + i / total * decrease).min(1.0);
            }
        }
        self.weights = next;
    }

    pub fn tick(&mut self) {
        self.time += 1;
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn active(&self) -> bool {
        self.active
    }
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
    pub fn display_name(&self) -> &'static str {
        "ALOHA-QT"
    }
    pub fn weights(&self) -> &[Probability] {
        &self.weights
    }
    pub fn time(&self) -> u64 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn bank_covers_every_period_and_phase() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let node = AlohaQt::new(rng);
        let expect = (0..=MAX_PERIOD_EXPONENT).map(|m| 1usize << m).sum::<usize>();
        assert!(node.weights.len() == expect);
        assert!(node.weights.iter().all(|&w| (0.0..=1.0).contains(&w)));
        for (n, k) in node.periods.iter().zip(&node.phases) {
            assert!(k < n);
        }
    }

    #[test]
    fn best_policy_is_always_selected() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut node = AlohaQt::new(rng);
        node.decide();
        let best = crate::protocol::argmax(&node.weights);
        assert!(node.selected_policies[best]);
    }

    #[test]
    fn weights_stay_in_bounds_under_feedback() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut node = AlohaQt::new(rng);
        let outcomes = [
            Outcome::Collision,
            Outcome::Empty,
            Outcome::Used {
                winner: "ffff".to_string(),
            },
        ];
        for slot in 0..1000u64 {
            node.decide();
            node.learn(&outcomes[(slot % 3) as usize], rng);
            node.tick();
            assert!(node.weights.iter().all(|&w| (0.0..=1.0).contains(&w)));
        }
    }

    #[test]
    fn inactive_node_never_transmits_but_still_learns() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut node = AlohaQt::new(rng);
        node.set_active(false);
        let before = node.weights.clone();
        for _ in 0..64 {
            assert!(!node.decide());
            node.learn(&Outcome::Empty, rng);
            node.tick();
        }
        assert!(node.weights != before);
    }

    #[test]
    fn relinquish_redistributes_the_lost_mass() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut node = AlohaQt::new(rng);
        node.decide();
        let factor = vec![1.0; node.weights.len()];
        let wanted = node.active_policies.clone();
        let before = node.weights.clone();
        node.rescale(&factor, true, rng);
        let drained = before.iter().sum::<f64>() - node.weights.iter().sum::<f64>();
        assert!(drained.abs() < 1e-6);
        for j in 0..node.weights.len() {
            match wanted[j] {
                true => assert!(node.weights[j] < before[j]),
                false => assert!(node.weights[j] >= before[j]),
            }
        }
    }
}
