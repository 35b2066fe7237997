use super::l16::L16;
use super::outcome::Outcome;
use super::tdma::Tdma;
use super::transmitter::Transmitter;
use crate::protocol::Node;
use rand::rngs::SmallRng;

/// who the slot went to, when it went to exactly one transmitter
enum Winner {
    Tdma(usize),
    L16(usize),
    Player(usize),
}

/// the slot-level arbiter. owns the stations, the external
/// transmitters, the per-run rng stream, and the counters. per slot:
/// every decision is gathered before any station learns, every
/// station learns the same outcome exactly once, clocks advance last.
pub struct Network {
    rng: SmallRng,
    players: Vec<Node>,
    tdmas: Vec<Tdma>,
    l16s: Vec<L16>,
    history: Vec<String>,
    slot_counter: u64,
    collision_counter: u64,
    tdma_counter: u64,
    player_counter: Vec<u64>,
    l16_counter: Vec<u64>,
}

impl Network {
    pub fn new(players: Vec<Node>, rng: SmallRng) -> Self {
        let count = players.len();
        Self {
            rng,
            players,
            tdmas: Vec::new(),
            l16s: Vec::new(),
            history: Vec::new(),
            slot_counter: 0,
            collision_counter: 0,
            tdma_counter: 0,
            player_counter: vec![0; count],
            l16_counter: Vec::new(),
        }
    }

    pub fn set_tdmas(&mut self, tdmas: Vec<Tdma>) {
        self.tdmas = tdmas;
    }

    pub fn set_l16s(&mut self, l16s: Vec<L16>) {
        assert!(
            l16s.len() <= crate::MAX_L16_CHANNELS,
            "at most {} L16 channels, got {}",
            crate::MAX_L16_CHANNELS,
            l16s.len()
        );
        self.l16_counter = vec![0; l16s.len()];
        self.l16s = l16s;
    }

    /// one slot: decisions, outcome, feedback, clocks, counters
    pub fn round(&mut self) {
        let tdmas = self.tdmas.iter().map(|t| t.transmit()).collect::<Vec<bool>>();
        let l16s = self.l16s.iter().map(|l| l.transmit()).collect::<Vec<bool>>();
        let mut moves = Vec::with_capacity(self.players.len());
        for player in self.players.iter_mut() {
            moves.push(player.decide(&mut self.rng));
        }
        let total = count(&tdmas) + count(&l16s) + count(&moves);
        let winner = match total {
            1 => Some(self.winner(&tdmas, &l16s, &moves)),
            _ => None,
        };
        let outcome = match total {
            0 => Outcome::Empty,
            1 => Outcome::Used {
                winner: self.credit(winner.as_ref().expect("sole transmitter identified")),
            },
            _ => Outcome::Collision,
        };
        for player in self.players.iter_mut() {
            player.learn(&outcome, &mut self.rng);
        }
        for player in self.players.iter_mut() {
            player.tick(&mut self.rng);
        }
        for tdma in self.tdmas.iter_mut() {
            tdma.tick();
        }
        for l16 in self.l16s.iter_mut() {
            l16.tick();
        }
        self.slot_counter += 1;
        match (&outcome, winner) {
            (Outcome::Collision, _) => {
                self.collision_counter += 1;
                self.history.push("C".to_string());
            }
            (Outcome::Used { winner: name }, Some(at)) => {
                let token = match at {
                    Winner::Tdma(_) => {
                        self.tdma_counter += 1;
                        "T".to_string()
                    }
                    Winner::L16(channel) => {
                        self.l16_counter[channel] += 1;
                        "L".to_string()
                    }
                    Winner::Player(index) => {
                        self.player_counter[index] += 1;
                        name.clone()
                    }
                };
                self.history.push(token);
            }
            _ => self.history.push("_".to_string()),
        }
    }

    fn winner(&self, tdmas: &[bool], l16s: &[bool], moves: &[bool]) -> Winner {
        if let Some(at) = first(tdmas) {
            Winner::Tdma(at)
        } else if let Some(at) = first(l16s) {
            Winner::L16(at)
        } else {
            Winner::Player(first(moves).expect("some transmitter fired"))
        }
    }

    fn credit(&self, winner: &Winner) -> String {
        match winner {
            Winner::Tdma(at) => self.tdmas[*at].name().to_string(),
            Winner::L16(at) => self.l16s[*at].name().to_string(),
            Winner::Player(at) => self.players[*at].name().to_string(),
        }
    }

    pub fn reset_counters(&mut self) {
        self.slot_counter = 0;
        self.collision_counter = 0;
        self.tdma_counter = 0;
        self.player_counter = vec![0; self.players.len()];
        self.l16_counter = vec![0; self.l16s.len()];
    }

    pub fn player_utilization(&self) -> Vec<f64> {
        self.player_counter
            .iter()
            .map(|&c| c as f64 / self.slot_counter as f64)
            .collect()
    }
    pub fn tdma_utilization(&self) -> f64 {
        self.tdma_counter as f64 / self.slot_counter as f64
    }
    pub fn l16_utilization(&self) -> Vec<f64> {
        self.l16_counter
            .iter()
            .map(|&c| c as f64 / self.slot_counter as f64)
            .collect()
    }
    pub fn collisions(&self) -> f64 {
        self.collision_counter as f64 / self.slot_counter as f64
    }

    pub fn actives(&self) -> Vec<bool> {
        self.players.iter().map(Node::active).collect()
    }
    pub fn depths(&self) -> Vec<Option<f64>> {
        self.players.iter().map(Node::depth).collect()
    }
    pub fn estimated_num_players(&self) -> Vec<Option<f64>> {
        self.players.iter().map(Node::estimated_num_players).collect()
    }
    pub fn player_labels(&self) -> Vec<&'static str> {
        self.players.iter().map(Node::display_name).collect()
    }

    pub fn players(&self) -> &[Node] {
        &self.players
    }
    pub fn player_mut(&mut self, at: usize) -> &mut Node {
        &mut self.players[at]
    }
    pub fn history(&self) -> &[String] {
        &self.history
    }
    pub fn slot_counter(&self) -> u64 {
        self.slot_counter
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.history.concat())
    }
}

fn count(decisions: &[bool]) -> usize {
    decisions.iter().filter(|&&d| d).count()
}

fn first(decisions: &[bool]) -> Option<usize> {
    decisions.iter().position(|&d| d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Kind;
    use rand::SeedableRng;

    fn seeded(kind: Kind, n: usize, seed: u64) -> Network {
        let ref mut rng = SmallRng::seed_from_u64(seed);
        let players = (0..n).map(|_| Node::new(kind, rng)).collect::<Vec<Node>>();
        Network::new(players, rng.clone())
    }

    #[test]
    fn colliding_schedules_always_collide() {
        let mut net = Network::new(Vec::new(), SmallRng::seed_from_u64(0));
        net.set_tdmas(vec![Tdma::new("a", 2, 0), Tdma::new("b", 2, 0)]);
        for _ in 0..10 {
            net.round();
        }
        assert!(net.collision_counter == 5);
        assert!(net.to_string() == "C_C_C_C_C_");
    }

    #[test]
    fn a_lone_transmitter_owns_the_medium() {
        let mut net = Network::new(Vec::new(), SmallRng::seed_from_u64(0));
        net.set_tdmas(vec![Tdma::new("a", 1, 0)]);
        for _ in 0..10 {
            net.round();
        }
        assert!(net.tdma_counter == 10);
        assert!(net.tdma_utilization() == 1.0);
        assert!(net.to_string() == "TTTTTTTTTT");
    }

    #[test]
    fn l16_channels_are_credited_separately() {
        let mut net = Network::new(Vec::new(), SmallRng::seed_from_u64(0));
        net.set_l16s(vec![L16::new(0, 2, 0), L16::new(1, 2, 1)]);
        for _ in 0..10 {
            net.round();
        }
        assert!(net.l16_counter == vec![5, 5]);
        assert!(net.collision_counter == 0);
        assert!(net.to_string() == "LLLLLLLLLL");
    }

    #[test]
    #[should_panic]
    fn a_fourth_l16_channel_is_rejected() {
        let mut net = Network::new(Vec::new(), SmallRng::seed_from_u64(0));
        net.set_l16s((0..4).map(|c| L16::new(c, 4, c as u64)).collect());
    }

    #[test]
    fn outcome_fractions_partition_the_frame() {
        let mut net = seeded(Kind::Eb, 3, 7);
        for _ in 0..500 {
            net.round();
        }
        let used = net.player_utilization().iter().sum::<f64>();
        let empty = 1.0 - used - net.collisions();
        assert!(used >= 0.0 && net.collisions() >= 0.0 && empty >= -1e-12);
        assert!(net.history().len() == 500);
    }

    #[test]
    fn same_seed_same_history() {
        for kind in [Kind::Eb, Kind::Q, Kind::Qt, Kind::Qtf, Kind::At] {
            let mut a = seeded(kind, 4, 42);
            let mut b = seeded(kind, 4, 42);
            for _ in 0..300 {
                a.round();
                b.round();
            }
            assert!(a.to_string() == b.to_string());
            assert!(a.player_counter == b.player_counter);
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = seeded(Kind::Eb, 4, 1);
        let mut b = seeded(Kind::Eb, 4, 2);
        for _ in 0..300 {
            a.round();
            b.round();
        }
        assert!(a.to_string() != b.to_string());
    }

    #[test]
    fn inactive_players_leave_the_medium_idle() {
        let mut net = seeded(Kind::At, 3, 0);
        for at in 0..3 {
            net.player_mut(at).set_active(false);
        }
        for _ in 0..100 {
            net.round();
        }
        assert!(net.collision_counter == 0);
        assert!(net.player_counter.iter().all(|&c| c == 0));
        assert!(net.to_string().chars().all(|c| c == '_'));
    }
}
