pub mod medium;
pub mod protocol;
pub mod sim;

/// dimensional analysis types
type Probability = f64;
type Bandwidth = f64;

// run aggregation parameters
const SLOTS_PER_FRAME: usize = 100;
const STAT_BLOCK_LEN: usize = 10;
const BOTTOM_PLAYER_FRACTION: f64 = 0.1;

// the shared medium supports at most three L16 channels
const MAX_L16_CHANNELS: usize = 3;

/// initialize terminal logging
pub fn init() {
    simplelog::TermLogger::init(
        log::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .expect("initialize logger");
}
