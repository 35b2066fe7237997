pub mod at;
pub mod counter;
pub mod eb;
pub mod q;
pub mod qt;
pub mod qtf;

use self::at::AtAloha;
use self::eb::EbAloha;
use self::q::AlohaQ;
use self::qt::AlohaQt;
use self::qtf::AlohaQtf;
use crate::medium::outcome::Outcome;
use rand::rngs::SmallRng;

/// the protocol families a station can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Kind {
    Eb,
    Q,
    Qt,
    Qtf,
    At,
}

/// a station on the shared medium, closed over the five protocol
/// families. the round engine sees only this surface: decide, learn,
/// tick, and the active gate. capabilities a family lacks come back
/// as None instead of being probed for.
pub enum Node {
    Eb(EbAloha),
    Q(AlohaQ),
    Qt(AlohaQt),
    Qtf(AlohaQtf),
    At(AtAloha),
}

impl Node {
    pub fn new(kind: Kind, rng: &mut SmallRng) -> Self {
        match kind {
            Kind::Eb => Self::Eb(EbAloha::new(rng)),
            Kind::Q => Self::Q(AlohaQ::new(rng)),
            Kind::Qt => Self::Qt(AlohaQt::new(rng)),
            Kind::Qtf => Self::Qtf(AlohaQtf::new(rng)),
            Kind::At => Self::At(AtAloha::new(rng)),
        }
    }

    pub fn with_name(self, name: &str) -> Self {
        match self {
            Self::Eb(node) => Self::Eb(node.with_name(name)),
            Self::Q(node) => Self::Q(node.with_name(name)),
            Self::Qt(node) => Self::Qt(node.with_name(name)),
            Self::Qtf(node) => Self::Qtf(node.with_name(name)),
            Self::At(node) => Self::At(node.with_name(name)),
        }
    }

    /// transmit intent for the current slot, after the active gate
    pub fn decide(&mut self, rng: &mut SmallRng) -> bool {
        match self {
            Self::Eb(node) => node.decide(rng),
            Self::Q(node) => node.decide(),
            Self::Qt(node) => node.decide(),
            Self::Qtf(node) => node.decide(),
            Self::At(node) => node.decide(),
        }
    }

    /// exactly one call per slot, same triple for every station
    pub fn learn(&mut self, outcome: &Outcome, rng: &mut SmallRng) {
        match self {
            Self::Eb(node) => node.learn(outcome),
            Self::Q(node) => node.learn(outcome, rng),
            Self::Qt(node) => node.learn(outcome, rng),
            Self::Qtf(node) => node.learn(outcome, rng),
            Self::At(node) => node.learn(outcome, rng),
        }
    }

    pub fn tick(&mut self, rng: &mut SmallRng) {
        match self {
            Self::Eb(node) => node.tick(),
            Self::Q(node) => node.tick(rng),
            Self::Qt(node) => node.tick(),
            Self::Qtf(node) => node.tick(),
            Self::At(node) => node.tick(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Eb(node) => node.name(),
            Self::Q(node) => node.name(),
            Self::Qt(node) => node.name(),
            Self::Qtf(node) => node.name(),
            Self::At(node) => node.name(),
        }
    }

    pub fn active(&self) -> bool {
        match self {
            Self::Eb(node) => node.active(),
            Self::Q(node) => node.active(),
            Self::Qt(node) => node.active(),
            Self::Qtf(node) => node.active(),
            Self::At(node) => node.active(),
        }
    }

    pub fn set_active(&mut self, active: bool) {
        match self {
            Self::Eb(node) => node.set_active(active),
            Self::Q(node) => node.set_active(active),
            Self::Qt(node) => node.set_active(active),
            Self::Qtf(node) => node.set_active(active),
            Self::At(node) => node.set_active(active),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Eb(node) => node.display_name(),
            Self::Q(node) => node.display_name(),
            Self::Qt(node) => node.display_name(),
            Self::Qtf(node) => node.display_name(),
            Self::At(node) => node.display_name(),
        }
    }

    pub fn estimated_num_players(&self) -> Option<f64> {
        match self {
            Self::Eb(node) => Some(node.estimated_num_players()),
            Self::Q(node) => Some(node.estimated_num_players()),
            Self::Qt(_) => None,
            Self::Qtf(node) => Some(node.estimated_num_players()),
            Self::At(node) => Some(node.estimated_num_players()),
        }
    }

    pub fn depth(&self) -> Option<f64> {
        match self {
            Self::Eb(node) => Some(node.depth()),
            Self::Q(node) => Some(node.depth()),
            Self::Qt(_) | Self::Qtf(_) => None,
            Self::At(node) => Some(node.depth()),
        }
    }

    /// incentive traces, carried only by the AT family
    pub fn empty_incentive(&self) -> Option<f64> {
        match self {
            Self::At(node) => Some(node.empty_incentive()),
            _ => None,
        }
    }
    pub fn kind_incentive(&self) -> Option<f64> {
        match self {
            Self::At(node) => Some(node.kind_incentive()),
            _ => None,
        }
    }
}

/// index of the first maximum, NumPy argmax semantics
pub(crate) fn argmax(xs: &[f64]) -> usize {
    let mut at = 0;
    for (j, x) in xs.iter().enumerate() {
        if *x > xs[at] {
            at = j;
        }
    }
    at
}
