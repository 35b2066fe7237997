use crate::medium::outcome::Outcome;
use rand::Rng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

const INITIAL_LEVEL: u32 = 1;
const EMPTY_INCENTIVE: f64 = 0.1;
const EMPTY_ADAPTATION: f64 = 0.99;
const FREE_TO_COLLISION: f64 = 1.39;
const MIN_EMPTY_INCENTIVE: f64 = 1e-3;
const KINDNESS: f64 = 20.0;
const KIND_ADAPTATION: f64 = 0.98;
const KIND_INCENTIVE: f64 = 0.05;
const MIN_KIND_INCENTIVE: f64 = 1e-2;
const MAX_NUM_POLICIES: usize = 10;
const MAX_LEVEL_DIFFERENCE: u32 = 2;
const START_LEVEL_OFFSET: f64 = 3.0;
const EPSILON: f64 = 1e-7;

/// AT-ALOHA: a multiset of tree policies (i, n), each meaning
/// "transmit when t mod 2^n == i". collisions demote the policy that
/// fired; empty slots are claimed with a probability that adapts
/// toward a target free-to-collision ratio; successes are sometimes
/// relinquished out of kindness so newcomers can get in.
pub struct AtAloha {
    name: String,
    active: bool,
    t: u64,
    decision: bool,
    strategy: Option<(u64, u32)>,
    policies: Vec<(u64, u32)>,
    empty_incentive: f64,
    kind_incentive: f64,
}

impl AtAloha {
    pub fn new(rng: &mut SmallRng) -> Self {
        let name = format!("{:x}", rng.random::<u16>());
        let i = rng.random_range(0..1u64 << INITIAL_LEVEL);
        Self {
            name,
            active: true,
            t: 0,
            decision: false,
            strategy: None,
            policies: vec![(i, INITIAL_LEVEL)],
            empty_incentive: EMPTY_INCENTIVE,
            kind_incentive: KIND_INCENTIVE,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// the first policy in current order that wants this slot wins
    pub fn decide(&mut self) -> bool {
        self.decision = false;
        self.strategy = None;
        for &(i, n) in self.policies.iter() {
            if self.t % (1u64 << n) == i {
                self.strategy = Some((i, n));
                self.decision = true;
                break;
            }
        }
        self.decision && self.active
    }

    pub fn learn(&mut self, outcome: &Outcome, rng: &mut SmallRng) {
        match outcome {
            Outcome::Collision => {
                self.kind_incentive /= KIND_ADAPTATION;
                self.empty_incentive *= EMPTY_ADAPTATION.powf(FREE_TO_COLLISION);
            }
            Outcome::Used { .. } => {
                self.kind_incentive /= KIND_ADAPTATION;
            }
            Outcome::Empty => {
                self.empty_incentive /= EMPTY_ADAPTATION;
                self.kind_incentive *= KIND_ADAPTATION.powf(KINDNESS);
            }
        }
        self.empty_incentive = self.empty_incentive.clamp(MIN_EMPTY_INCENTIVE, 0.5);
        self.kind_incentive = self.kind_incentive.clamp(MIN_KIND_INCENTIVE, 0.5);

        if self.decision {
            let (i, n) = self.strategy.expect("transmitting policy recorded by decide");
            if outcome.is_collision() {
                self.demote(i, n, rng);
            } else if rng.random::<f64>() < self.kind_incentive {
                self.demote(i, n, rng);
            }
        } else if !outcome.is_used() && rng.random::<f64>() < self.empty_incentive {
            self.insert_policy();
        }
        self.simplify(rng);
    }

    /// remove (i, n); if that leaves nothing at level n or above,
    /// keep a uniformly chosen child so the tree never empties
    fn demote(&mut self, i: u64, n: u32, rng: &mut SmallRng) {
        let m = 1u64 << n;
        self.remove((i, n));
        if !self.policies.iter().any(|&(_, k)| k <= n) {
            let child = match rng.random_range(0..2u32) {
                0 => i,
                _ => i + m,
            };
            self.policies.push((child, n + 1));
        }
        assert!(
            !self.policies.is_empty(),
            "{}: policy tree emptied at slot {}",
            self.name,
            self.t
        );
    }

    /// claim the current slot at a level sized to the estimated
    /// population and the bandwidth already held
    fn insert_policy(&mut self) {
        let n = self.level_for_insert();
        let i = self.t % (1u64 << n);
        self.policies.push((i, n));
        self.normalize((i, n));
    }

    fn level_for_insert(&self) -> u32 {
        let num_players = self.estimated_num_players();
        let bw = self
            .policies
            .iter()
            .map(|&(_, n)| 1.0 / (1u64 << n) as f64)
            .sum::<f64>();
        let discrepancy = (bw * num_players).log2().clamp(-1.0, 1.0);
        (num_players.log2() + discrepancy + START_LEVEL_OFFSET).ceil() as u32
    }

    /// normalize the tree for the presence of policy p: drop p's
    /// strict sub-policies, then merge complete sibling pairs upward
    fn normalize(&mut self, p: (u64, u32)) {
        self.policies.retain(|&q| !is_subpolicy(p, q));
        self.normalize_siblings(p);
    }

    fn normalize_siblings(&mut self, (i, n): (u64, u32)) {
        if n == 0 {
            return;
        }
        let m = 1u64 << (n - 1);
        let left = (i % m, n);
        let right = (m + i % m, n);
        if self.policies.contains(&left) && self.policies.contains(&right) {
            self.remove(left);
            self.remove(right);
            let parent = (i % m, n - 1);
            self.policies.push(parent);
            self.normalize_siblings(parent);
        }
    }

    /// shuffle then stable-sort by level: the level order is kept,
    /// the preference among same-level policies is randomized. chop
    /// to the level window and the policy cap.
    fn simplify(&mut self, rng: &mut SmallRng) {
        assert!(
            !self.policies.is_empty(),
            "{}: policy tree emptied at slot {}",
            self.name,
            self.t
        );
        for &(i, n) in self.policies.iter() {
            assert!(
                i < 1u64 << n,
                "{}: policy ({}, {}) out of range at slot {}",
                self.name,
                i,
                n,
                self.t
            );
        }
        self.policies.shuffle(rng);
        self.policies.sort_by_key(|&(_, n)| n);
        let min_level = self.policies[0].1;
        self.policies
            .retain(|&(_, n)| n < min_level + MAX_LEVEL_DIFFERENCE);
        self.policies.truncate(MAX_NUM_POLICIES);
    }

    /// multiset removal: first occurrence only
    fn remove(&mut self, p: (u64, u32)) {
        if let Some(at) = self.policies.iter().position(|&q| q == p) {
            self.policies.remove(at);
        }
    }

    pub fn tick(&mut self) {
        self.t += 1;
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
        "AT"
    }
    pub fn estimated_num_players(&self) -> f64 {
        1.0 / (EPSILON + self.empty_incentive)
    }
    /// depth of the tree, for visualization
    pub fn depth(&self) -> f64 {
        self.policies.iter().map(|&(_, n)| n).max().expect("tree is never empty") as f64
    }
    pub fn empty_incentive(&self) -> f64 {
        self.empty_incentive
    }
    pub fn kind_incentive(&self) -> f64 {
        self.kind_incentive
    }
    pub fn policies(&self) -> &[(u64, u32)] {
        &self.policies
    }
}

/// whether q sits strictly below p in the slot tree
fn is_subpolicy((i1, n1): (u64, u32), (i2, n2): (u64, u32)) -> bool {
    n1 < n2 && i2 % (1u64 << n1) == i1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn well_formed(node: &AtAloha) {
        let policies = node.policies();
        assert!(!policies.is_empty());
        assert!(policies.len() <= MAX_NUM_POLICIES);
        for &(i, n) in policies {
            assert!(i < 1u64 << n);
        }
        for (a, &p) in policies.iter().enumerate() {
            for (b, &q) in policies.iter().enumerate() {
                if a != b {
                    assert!(!is_subpolicy(p, q), "{:?} covers {:?}", p, q);
                }
            }
        }
        for &(i, n) in policies {
            if n > 0 {
                let m = 1u64 << (n - 1);
                let sibling = match i < m {
                    true => (i + m, n),
                    false => (i - m, n),
                };
                assert!(!policies.contains(&sibling), "siblings {:?} both present", (i, n));
            }
        }
        let min = policies.iter().map(|&(_, n)| n).min().expect("non-empty");
        let max = policies.iter().map(|&(_, n)| n).max().expect("non-empty");
        assert!(max - min < MAX_LEVEL_DIFFERENCE);
    }

    #[test]
    fn construction_is_well_formed() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        well_formed(&AtAloha::new(rng));
    }

    #[test]
    fn tree_survives_a_feedback_storm() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut node = AtAloha::new(rng);
        let outcomes = [
            Outcome::Collision,
            Outcome::Empty,
            Outcome::Used {
                winner: "ffff".to_string(),
            },
        ];
        for slot in 0..5000u64 {
            node.decide();
            node.learn(&outcomes[(slot % 3) as usize], rng);
            node.tick();
            well_formed(&node);
            assert!((MIN_EMPTY_INCENTIVE..=0.5).contains(&node.empty_incentive()));
            assert!((MIN_KIND_INCENTIVE..=0.5).contains(&node.kind_incentive()));
        }
    }

    #[test]
    fn demote_keeps_the_tree_populated() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut node = AtAloha::new(rng);
        let &(i, n) = node.policies().first().expect("initial policy");
        node.demote(i, n, rng);
        assert!(node.policies().len() == 1);
        let &(j, k) = node.policies().first().expect("demoted child");
        assert!(k == n + 1);
        assert!(j == i || j == i + (1u64 << n));
    }

    #[test]
    fn siblings_merge_into_their_parent() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut node = AtAloha::new(rng);
        node.policies = vec![(1, 2), (3, 2)];
        node.normalize_siblings((1, 2));
        assert!(node.policies == vec![(1, 1)]);
    }

    #[test]
    fn normalize_is_idempotent() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut node = AtAloha::new(rng);
        node.policies = vec![(0, 1), (2, 2), (1, 3), (5, 3)];
        node.normalize((0, 1));
        let once = {
            let mut sorted = node.policies.clone();
            sorted.sort();
            sorted
        };
        assert!(once == vec![(0, 1), (1, 3), (5, 3)]);
        node.normalize((0, 1));
        let twice = {
            let mut sorted = node.policies.clone();
            sorted.sort();
            sorted
        };
        assert!(once == twice);
    }

    #[test]
    fn insert_claims_the_current_slot() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut node = AtAloha::new(rng);
        node.t = 21;
        node.insert_policy();
        assert!(
            node.policies()
                .iter()
                .any(|&(i, k)| node.t % (1u64 << k) == i)
        );
    }

    #[test]
    fn simplify_chops_to_the_level_window() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut node = AtAloha::new(rng);
        node.policies = vec![(0, 2), (1, 4), (2, 3), (3, 4)];
        node.simplify(rng);
        assert!(node.policies().iter().all(|&(_, n)| n < 2 + MAX_LEVEL_DIFFERENCE));
        assert!(node.policies().iter().map(|&(_, n)| n).min() == Some(2));
    }
}
