use crate::Probability;
use crate::medium::outcome::Outcome;
use rand::Rng;
use rand::rngs::SmallRng;

const INITIAL_P: Probability = 0.5;
const BACKOFF_Q: f64 = 0.9;
const BIAS: f64 = 1.0;

/// always-learning exponential-backoff ALOHA. the node adapts its
/// Bernoulli transmit probability from every slot it observes, not
/// just the slots it took part in. there is no explicit floor on p;
/// q < 1 keeps it positive.
pub struct EbAloha {
    name: String,
    active: bool,
    decision: bool,
    p: Probability,
    q: f64,
    bias: f64,
}

impl EbAloha {
    pub fn new(rng: &mut SmallRng) -> Self {
        Self {
            name: format!("{:x}", rng.random::<u16>()),
            active: true,
            decision: false,
            p: INITIAL_P,
            q: BACKOFF_Q,
            bias: BIAS,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn decide(&mut self, rng: &mut SmallRng) -> bool {
        self.decision = rng.random::<f64>() < self.p;
        self.decision && self.active
    }

    pub fn learn(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Collision => self.p *= self.q.powf(self.bias),
            Outcome::Empty => self.p = (self.p / self.q).min(1.0),
            Outcome::Used { .. } => {}
        }
    }

    pub fn tick(&mut self) {}

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
        "EB-ALOHA"
    }
    pub fn estimated_num_players(&self) -> f64 {
        1.0 / self.p
    }
    pub fn depth(&self) -> f64 {
        -self.p.log2()
    }
}
