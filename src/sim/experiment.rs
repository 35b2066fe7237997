use super::run::Run;
use crate::medium::network::Network;
use crate::protocol::Kind;
use crate::protocol::Node;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn nodes(kind: Kind, count: usize, rng: &mut SmallRng) -> Vec<Node> {
    (0..count).map(|_| Node::new(kind, rng)).collect()
}

fn named(kind: Kind, count: usize, rng: &mut SmallRng) -> Vec<Node> {
    (0..count)
        .map(|i| Node::new(kind, rng).with_name(&i.to_string()))
        .collect()
}

/// fixed population: `num_players` nodes, all active, `frames` frames
pub fn run_n(kind: Kind, num_players: usize, seed: u64, frames: usize) -> Run {
    log::info!("run_n: {} players for {} frames", num_players, frames);
    let ref mut rng = SmallRng::seed_from_u64(seed);
    let players = named(kind, num_players, rng);
    let mut run = Run::new(Network::new(players, rng.clone()));
    for _ in 0..frames {
        run.run_frame();
    }
    run
}

/// population 10 -> 50 -> 30: ramp up one node per frame, hold,
/// drop twenty at once, hold
pub fn ramp(kind: Kind, seed: u64) -> Run {
    let ref mut rng = SmallRng::seed_from_u64(seed);
    let players = nodes(kind, 50, rng);
    let mut run = Run::new(Network::new(players, rng.clone()));
    for at in 10..50 {
        run.network_mut().player_mut(at).set_active(false);
    }
    log::info!("ramp: holding at 10 nodes");
    for _ in 0..50 {
        run.run_frame();
    }
    log::info!("ramp: adding one node per frame up to 50");
    for at in 0..40 {
        run.network_mut().player_mut(at + 10).set_active(true);
        run.run_frame();
    }
    for _ in 0..100 {
        run.run_frame();
    }
    log::info!("ramp: dropping twenty nodes");
    for at in 0..20 {
        run.network_mut().player_mut(at).set_active(false);
        run.run_frame();
    }
    for _ in 0..100 {
        run.run_frame();
    }
    run
}

/// population 50 -> 10 -> 40: drop one node per frame, hold,
/// reactivate thirty one per frame, hold
pub fn reverse_ramp(kind: Kind, seed: u64) -> Run {
    let ref mut rng = SmallRng::seed_from_u64(seed);
    let players = nodes(kind, 50, rng);
    let mut run = Run::new(Network::new(players, rng.clone()));
    log::info!("reverse_ramp: holding at 50 nodes");
    for _ in 0..50 {
        run.run_frame();
    }
    log::info!("reverse_ramp: dropping one node per frame down to 10");
    for at in 0..40 {
        run.network_mut().player_mut(at).set_active(false);
        run.run_frame();
    }
    for _ in 0..100 {
        run.run_frame();
    }
    log::info!("reverse_ramp: reactivating thirty nodes");
    for at in 0..30 {
        run.network_mut().player_mut(at).set_active(true);
        run.run_frame();
    }
    for _ in 0..100 {
        run.run_frame();
    }
    run
}

/// ramp from `min_nodes` up to `max_nodes`, one activation per frame
pub fn ramp_up(kind: Kind, seed: u64, min_nodes: usize, max_nodes: usize) -> Run {
    assert!(min_nodes <= max_nodes, "ramp bounds out of order");
    let ref mut rng = SmallRng::seed_from_u64(seed);
    let players = named(kind, max_nodes, rng);
    let mut run = Run::new(Network::new(players, rng.clone()));
    for at in min_nodes..max_nodes {
        run.network_mut().player_mut(at).set_active(false);
    }
    for _ in 0..20 {
        run.run_frame();
    }
    log::info!("ramp_up: {} -> {} nodes", min_nodes, max_nodes);
    for at in 0..max_nodes - min_nodes {
        run.network_mut().player_mut(at + min_nodes).set_active(true);
        run.run_frame();
    }
    for _ in 0..20 {
        run.run_frame();
    }
    run
}

/// ramp from `max_nodes` down to `min_nodes`, one deactivation per frame
pub fn ramp_down(kind: Kind, seed: u64, min_nodes: usize, max_nodes: usize) -> Run {
    assert!(min_nodes <= max_nodes, "ramp bounds out of order");
    let ref mut rng = SmallRng::seed_from_u64(seed);
    let players = named(kind, max_nodes, rng);
    let mut run = Run::new(Network::new(players, rng.clone()));
    for _ in 0..50 {
        run.run_frame();
    }
    log::info!("ramp_down: {} -> {} nodes", max_nodes, min_nodes);
    for at in 0..max_nodes - min_nodes {
        run.network_mut().player_mut(at + min_nodes).set_active(false);
        run.run_frame();
    }
    for _ in 0..10 {
        run.run_frame();
    }
    run
}

/// membership churn: each node flips activity with probability
/// `churn_rate` per frame. the schedule is drawn up front; the run
/// starts from two active nodes, one at each end of the roster.
pub fn churn(kind: Kind, num_players: usize, num_steps: usize, churn_rate: f64, seed: u64) -> Run {
    let ref mut rng = SmallRng::seed_from_u64(seed);
    let players = nodes(kind, num_players, rng);
    let mut schedule = vec![vec![false; num_players]; num_steps];
    schedule[0][0] = true;
    schedule[0][num_players - 1] = true;
    for step in 1..num_steps {
        for at in 0..num_players {
            let flip = rng.random::<f64>() < churn_rate;
            schedule[step][at] = schedule[step - 1][at] != flip;
        }
    }
    log::info!(
        "churn: {} nodes, {} steps, rate {}",
        num_players,
        num_steps,
        churn_rate
    );
    let mut run = Run::new(Network::new(players, rng.clone()));
    for step in schedule.iter() {
        for (at, &active) in step.iter().enumerate() {
            run.network_mut().player_mut(at).set_active(active);
        }
        run.run_frame();
    }
    run
}
