use super::stats::Stats;
use crate::medium::network::Network;
use crate::protocol::Node;

/// frame-level aggregator: drives the engine one frame of slots at a
/// time, snapshots the per-frame counters, and resets them. fairness
/// and totals are derived afterwards by Stats.
pub struct Run {
    net: Network,
    slots_per_frame: usize,
    tdma_utilization: Vec<f64>,
    l16_utilization: Vec<Vec<f64>>,
    player_utilization: Vec<Vec<f64>>,
    actives: Vec<Vec<bool>>,
    collisions: Vec<f64>,
    depths: Vec<Vec<Option<f64>>>,
    estimates: Vec<Vec<Option<f64>>>,
    empty_incentives: Vec<f64>,
    kind_incentives: Vec<f64>,
}

impl Run {
    pub fn new(net: Network) -> Self {
        Self::framed(net, crate::SLOTS_PER_FRAME)
    }

    pub fn framed(net: Network, slots_per_frame: usize) -> Self {
        assert!(slots_per_frame > 0, "zero-length frame");
        Self {
            net,
            slots_per_frame,
            tdma_utilization: Vec::new(),
            l16_utilization: Vec::new(),
            player_utilization: Vec::new(),
            actives: Vec::new(),
            collisions: Vec::new(),
            depths: Vec::new(),
            estimates: Vec::new(),
            empty_incentives: Vec::new(),
            kind_incentives: Vec::new(),
        }
    }

    /// run one frame of slots and snapshot the counters
    pub fn run_frame(&mut self) {
        for _ in 0..self.slots_per_frame {
            self.net.round();
        }
        self.tdma_utilization.push(self.net.tdma_utilization());
        self.l16_utilization.push(self.net.l16_utilization());
        self.player_utilization.push(self.net.player_utilization());
        self.actives.push(self.net.actives());
        self.collisions.push(self.net.collisions());
        self.depths.push(self.net.depths());
        self.estimates.push(self.net.estimated_num_players());
        if let Some(incentive) = self.net.players().first().and_then(Node::empty_incentive) {
            self.empty_incentives.push(incentive);
        }
        if let Some(incentive) = self.net.players().first().and_then(Node::kind_incentive) {
            self.kind_incentives.push(incentive);
        }
        self.net.reset_counters();
    }

    pub fn stats(&self) -> Stats {
        Stats::from(self)
    }

    pub fn frames(&self) -> usize {
        self.collisions.len()
    }
    pub fn slots_per_frame(&self) -> usize {
        self.slots_per_frame
    }
    pub fn network(&self) -> &Network {
        &self.net
    }
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.net
    }

    pub fn tdma_utilization(&self) -> &[f64] {
        &self.tdma_utilization
    }
    pub fn l16_utilization(&self) -> &[Vec<f64>] {
        &self.l16_utilization
    }
    pub fn player_utilization(&self) -> &[Vec<f64>] {
        &self.player_utilization
    }
    pub fn actives(&self) -> &[Vec<bool>] {
        &self.actives
    }
    pub fn collisions(&self) -> &[f64] {
        &self.collisions
    }
    pub fn depths(&self) -> &[Vec<Option<f64>>] {
        &self.depths
    }
    pub fn estimates(&self) -> &[Vec<Option<f64>>] {
        &self.estimates
    }
    pub fn empty_incentives(&self) -> &[f64] {
        &self.empty_incentives
    }
    pub fn kind_incentives(&self) -> &[f64] {
        &self.kind_incentives
    }
}
