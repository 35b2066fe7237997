use crate::medium::outcome::Outcome;
use rand::Rng;
use rand::rngs::SmallRng;

const FRAME_SIZE: usize = 64;
const RETRY_LIMIT: u32 = 6;
const ALPHA: f64 = 0.9;
const GAMMA: f64 = 0.9;
const TIE_NOISE: f64 = 1e-10;

/// ALOHA-Q: one action value per slot of an N-slot frame. the node
/// claims its best-valued slot and, after a collision, backs off by
/// doubling a window of frames and rescheduling uniformly inside it.
pub struct AlohaQ {
    name: String,
    active: bool,
    decision: bool,
    t: u64,
    n: usize,
    q: Vec<f64>,
    slot: usize,
    w: u64,
    frame: u64,
    scheduled_frame: u64,
    retry: u32,
    retry_limit: u32,
    alpha: f64,
    // declared by the published protocol, unused by the one-step update
    #[allow(dead_code)]
    gamma: f64,
}

impl AlohaQ {
    pub fn new(rng: &mut SmallRng) -> Self {
        let name = format!("{:x}", rng.random::<u16>());
        let q = vec![0.0; FRAME_SIZE];
        let slot = preferred(&q, rng);
        Self {
            name,
            active: true,
            decision: false,
            t: 0,
            n: FRAME_SIZE,
            q,
            slot,
            w: 1,
            frame: 0,
            scheduled_frame: 0,
            retry: 0,
            retry_limit: RETRY_LIMIT,
            alpha: ALPHA,
            gamma: GAMMA,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn decide(&mut self) -> bool {
        self.decision =
            self.slot == (self.t % self.n as u64) as usize && self.frame == self.scheduled_frame;
        self.decision && self.active
    }

    /// only a node that elected to transmit updates its action values
    pub fn learn(&mut self, outcome: &Outcome, rng: &mut SmallRng) {
        if !self.decision {
            return;
        }
        match outcome {
            Outcome::Collision => {
                self.w *= 2;
                self.reinforce(-1.0);
                self.retry += 1;
                if self.retry > self.retry_limit {
                    self.reset_backoff();
                } else {
                    self.scheduled_frame = rng.random_range(0..self.w);
                }
            }
            Outcome::Used { .. } => {
                self.reinforce(1.0);
                self.reset_backoff();
            }
            Outcome::Empty => {}
        }
    }

    pub fn tick(&mut self, rng: &mut SmallRng) {
        self.t += 1;
        self.frame = (self.t / self.n as u64) % self.w;
        if self.t % self.n as u64 == 0 {
            self.slot = preferred(&self.q, rng);
        }
    }

    /// Q[s] <- Q[s] + alpha * (r - Q[s])
    fn reinforce(&mut self, reward: f64) {
        let at = (self.t % self.n as u64) as usize;
        self.q[at] += self.alpha * (reward - self.q[at]);
    }

    fn reset_backoff(&mut self) {
        self.retry = 0;
        self.w = 1;
        self.frame = 0;
        self.scheduled_frame = 0;
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
        "ALOHA-Q"
    }
    pub fn estimated_num_players(&self) -> f64 {
        self.n as f64
    }
    pub fn depth(&self) -> f64 {
        -(self.n as f64).log2()
    }
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// argmax over Q plus fresh per-index noise; the noise breaks ties
/// stochastically while first-max argmax stays deterministic.
fn preferred(q: &[f64], rng: &mut SmallRng) -> usize {
    let noisy = q
        .iter()
        .map(|v| v + rng.random::<f64>() * TIE_NOISE)
        .collect::<Vec<f64>>();
    super::argmax(&noisy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn invariants(node: &AlohaQ) {
        assert!(node.q.len() == node.n);
        assert!(node.slot < node.n);
        assert!(node.w >= 1);
        assert!(node.frame < node.w);
        assert!(node.scheduled_frame < node.w);
    }

    #[test]
    fn construction_satisfies_frame_indexing() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        invariants(&AlohaQ::new(rng));
    }

    #[test]
    fn collision_doubles_the_window() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut node = AlohaQ::new(rng);
        node.t = node.slot as u64;
        assert!(node.decide());
        node.learn(&Outcome::Collision, rng);
        assert!(node.w == 2);
        assert!(node.retry == 1);
        assert!(node.scheduled_frame < node.w);
        invariants(&node);
    }

    #[test]
    fn retry_limit_collapses_the_window() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut node = AlohaQ::new(rng);
        node.t = node.slot as u64;
        node.decision = true;
        for _ in 0..=node.retry_limit {
            node.learn(&Outcome::Collision, rng);
        }
        assert!(node.w == 1);
        assert!(node.retry == 0);
        assert!(node.scheduled_frame == 0);
        invariants(&node);
    }

    #[test]
    fn success_reinforces_and_resets() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut node = AlohaQ::new(rng);
        node.t = node.slot as u64;
        node.w = 4;
        node.scheduled_frame = 2;
        node.decision = true;
        node.learn(
            &Outcome::Used {
                winner: node.name().to_string(),
            },
            rng,
        );
        assert!(node.q[node.slot] > 0.0);
        assert!(node.w == 1);
        assert!(node.scheduled_frame == 0);
        invariants(&node);
    }

    #[test]
    fn bystander_never_updates() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut node = AlohaQ::new(rng);
        node.t = (node.slot as u64 + 1) % node.n as u64;
        assert!(!node.decide());
        node.learn(&Outcome::Collision, rng);
        assert!(node.w == 1);
        assert!(node.q.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn frame_boundary_redraws_the_slot_preference() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut node = AlohaQ::new(rng);
        let claimed = 17;
        node.q[claimed] = 1.0;
        for _ in 0..node.n {
            node.tick(rng);
        }
        assert!(node.slot == claimed);
        invariants(&node);
    }

    #[test]
    fn argmax_takes_the_first_maximum() {
        assert!(crate::protocol::argmax(&[0.0, 3.0, 3.0, 1.0]) == 1);
        assert!(crate::protocol::argmax(&[5.0]) == 0);
    }
}
