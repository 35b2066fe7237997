use super::run::Run;

/// per-run derived statistics. utilization, empty, and collision
/// fractions are per frame; the fairness series are per stat block
/// (STAT_BLOCK_LEN frames), computed over the nodes that stayed
/// active through the whole block.
pub struct Stats {
    pub total_utilization: Vec<f64>,
    pub empty: Vec<f64>,
    pub collisions: Vec<f64>,
    pub num_active: Vec<usize>,
    pub jain: Vec<f64>,
    pub bottom_fair_ratio: Vec<f64>,
    pub mid_fair_ratio: Vec<f64>,
}

impl From<&Run> for Stats {
    fn from(run: &Run) -> Self {
        Self::over(run, crate::STAT_BLOCK_LEN, crate::BOTTOM_PLAYER_FRACTION)
    }
}

impl Stats {
    pub fn over(run: &Run, stat_len: usize, bottom_fraction: f64) -> Self {
        assert!(stat_len > 0, "zero-length stat block");
        let frames = run.frames();
        let players = run.player_utilization();
        let num_players = players.first().map(|frame| frame.len()).unwrap_or(0);
        let total_utilization = (0..frames)
            .map(|f| {
                players[f].iter().sum::<f64>()
                    + run.tdma_utilization()[f]
                    + run.l16_utilization()[f].iter().sum::<f64>()
            })
            .collect::<Vec<f64>>();
        let collisions = run.collisions().to_vec();
        let empty = total_utilization
            .iter()
            .zip(&collisions)
            .map(|(u, c)| 1.0 - u - c)
            .collect::<Vec<f64>>();
        let num_active = run
            .actives()
            .iter()
            .map(|mask| mask.iter().filter(|&&a| a).count())
            .collect::<Vec<usize>>();

        let mut jain = Vec::new();
        let mut bottom_fair_ratio = Vec::new();
        let mut mid_fair_ratio = Vec::new();
        for block in 0..frames / stat_len {
            let lo = block * stat_len;
            let hi = lo + stat_len;
            let mut utils = (0..num_players)
                .filter(|&j| (lo..hi).all(|f| run.actives()[f][j]))
                .map(|j| {
                    (lo..hi).map(|f| players[f][j]).sum::<f64>() / stat_len as f64
                        * (run.slots_per_frame() * stat_len) as f64
                })
                .collect::<Vec<f64>>();
            utils.sort_by(|a, b| a.partial_cmp(b).expect("utilization is finite"));
            jain.push(jain_index(&utils));
            let active = utils.len();
            let bottom = (active as f64 * bottom_fraction).ceil() as usize;
            bottom_fair_ratio.push(fair_ratio(&utils, bottom));
            let mid = active.div_ceil(2);
            mid_fair_ratio.push(fair_ratio(&utils, mid));
        }
        Self {
            total_utilization,
            empty,
            collisions,
            num_active,
            jain,
            bottom_fair_ratio,
            mid_fair_ratio,
        }
    }
}

/// (sum x)^2 / (n * sum x^2); 0 when there is nothing to share
fn jain_index(utils: &[f64]) -> f64 {
    let total = utils.iter().sum::<f64>();
    let squares = utils.iter().map(|u| u * u).sum::<f64>();
    match squares > 0.0 {
        true => total * total / (utils.len() as f64 * squares),
        false => 0.0,
    }
}

/// aggregate share of the lowest `take` nodes against their
/// proportional share of the total
fn fair_ratio(utils: &[f64], take: usize) -> f64 {
    let total = utils.iter().sum::<f64>();
    let fair = total * take as f64 / utils.len().max(1) as f64;
    match fair > 0.0 {
        true => utils.iter().take(take).sum::<f64>() / fair,
        false => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jain_of_equal_shares_is_one() {
        let jain = jain_index(&[3.0, 3.0, 3.0, 3.0]);
        assert!((jain - 1.0).abs() < 1e-12);
    }

    #[test]
    fn jain_of_one_hog_is_one_over_n() {
        let jain = jain_index(&[0.0, 0.0, 0.0, 12.0]);
        assert!((jain - 0.25).abs() < 1e-12);
    }

    #[test]
    fn jain_of_nobody_is_zero() {
        assert!(jain_index(&[]) == 0.0);
        assert!(jain_index(&[0.0, 0.0]) == 0.0);
    }

    #[test]
    fn fair_ratio_of_equal_shares_is_one() {
        let ratio = fair_ratio(&[2.0, 2.0, 2.0, 2.0], 1);
        assert!((ratio - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fair_ratio_of_a_starved_bottom_is_small() {
        let ratio = fair_ratio(&[0.0, 4.0, 4.0, 4.0], 1);
        assert!(ratio == 0.0);
    }
}
