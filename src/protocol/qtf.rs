use super::counter::ParticipantCounter;
use super::qt::AlohaQt;
use crate::Bandwidth;
use crate::medium::outcome::Outcome;
use rand::Rng;
use rand::rngs::SmallRng;

const INC_EMPTY: f64 = 0.5;
const RELINQUISH: f64 = 2e-2;

/// ALOHA-QTF: the QT bank with a fairness loop around it. the node
/// watches who wins each slot to estimate the active population,
/// compares the bandwidth its selected policies claim against an
/// equal share, and damps its own growth once it claims too much.
pub struct AlohaQtf {
    qt: AlohaQt,
    participants: ParticipantCounter,
    num_players: f64,
    requested_bandwidth: Bandwidth,
    fair_bandwidth: Bandwidth,
}

impl AlohaQtf {
    pub fn new(rng: &mut SmallRng) -> Self {
        Self {
            qt: AlohaQt::grown(super::qt::MAX_PERIOD_EXPONENT, INC_EMPTY, RELINQUISH, rng),
            participants: ParticipantCounter::new(1usize << super::qt::MAX_PERIOD_EXPONENT),
            num_players: 1.0,
            requested_bandwidth: 1.0,
            fair_bandwidth: 1.0,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.qt = self.qt.with_name(name);
        self
    }

    pub fn decide(&mut self) -> bool {
        self.qt.decide()
    }

    pub fn learn(&mut self, outcome: &Outcome, rng: &mut SmallRng) {
        self.num_players = self.participants.estimate() as f64;
        self.requested_bandwidth = self.bandwidth();
        self.fair_bandwidth = 1.0 / self.num_players;
        let (sign, inc_amount) = match outcome {
            Outcome::Collision => {
                self.participants.hit(rng);
                (-1.0, super::qt::INC_COLLISION)
            }
            Outcome::Used { winner } if self.qt.decision => {
                self.participants.set(Some(winner.as_str()));
                (1.0, super::qt::INC_SUCCESS)
            }
            Outcome::Used { winner } => {
                self.participants.set(Some(winner.as_str()));
                (-1.0, super::qt::INC_POTENTIAL_COLLISION)
            }
            Outcome::Empty => {
                self.participants.set(None);
                (1.0, self.qt.inc_empty)
            }
        };
        let ratio = self.requested_bandwidth / self.fair_bandwidth;
        let scale = match sign > 0.0 {
            true => 1.0 - ratio * ratio,
            false => ratio.sqrt(),
        }
        .clamp(0.0, 1.0);
        let factor = self.qt.update_factor(sign, inc_amount, scale, rng);
        let relinquish = self.qt.decision
            && rng.random::<f64>() < self.qt.relinquish
            && self.requested_bandwidth > self.fair_bandwidth;
        self.qt.rescale(&factor, relinquish, rng);
    }

    /// bandwidth claimed by a minimal cover of the selected policies:
    /// a policy contributes 1/N only when no coarser selected policy
    /// already owns its slots
    fn bandwidth(&self) -> Bandwidth {
        let mut cover: Vec<(u64, u64)> = Vec::new();
        let mut bw = 0.0;
        for j in 0..self.qt.selected_policies.len() {
            if self.qt.selected_policies[j] {
                let (k, n) = (self.qt.phases[j], self.qt.periods[j]);
                if !cover.iter().any(|&(ck, cn)| n > cn && k % cn == ck) {
                    bw += 1.0 / n as f64;
                    cover.push((k, n));
                }
            }
        }
        assert!(
            bw > 0.0 && bw <= 1.0,
            "{}: requested bandwidth {} out of range at slot {}",
            self.qt.name(),
            bw,
            self.qt.time()
        );
        bw
    }

    pub fn tick(&mut self) {
        self.qt.tick();
    }

    pub fn name(&self) -> &str {
        self.qt.name()
    }
    pub fn active(&self) -> bool {
        self.qt.active()
    }
    pub fn set_active(&mut self, active: bool) {
        self.qt.set_active(active);
    }
    pub fn display_name(&self) -> &'static str {
        self.qt.display_name()
    }
    pub fn estimated_num_players(&self) -> f64 {
        self.num_players
    }
    pub fn requested_bandwidth(&self) -> Bandwidth {
        self.requested_bandwidth
    }
    pub fn weights(&self) -> &[crate::Probability] {
        self.qt.weights()
    }
}
