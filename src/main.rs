use alohasim::protocol::Kind;
use alohasim::sim::experiment;
use alohasim::sim::record::Record;
use alohasim::sim::run::Run;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

/// slotted-medium multiple-access simulator
#[derive(Parser)]
#[command(name = "alohasim", version, about)]
struct Args {
    /// rng seed for the run
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// write the run record to this JSON file
    #[arg(long)]
    out: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// fixed population, all nodes active
    RunN {
        #[arg(long, value_enum)]
        kind: Kind,
        #[arg(long, default_value_t = 10)]
        players: usize,
        #[arg(long, default_value_t = 100)]
        frames: usize,
    },
    /// population 10 -> 50 -> 30
    Ramp {
        #[arg(long, value_enum)]
        kind: Kind,
    },
    /// population 50 -> 10 -> 40
    ReverseRamp {
        #[arg(long, value_enum)]
        kind: Kind,
    },
    /// one activation per frame from min to max
    RampUp {
        #[arg(long, value_enum)]
        kind: Kind,
        #[arg(long, default_value_t = 10)]
        min: usize,
        #[arg(long, default_value_t = 100)]
        max: usize,
    },
    /// one deactivation per frame from max to min
    RampDown {
        #[arg(long, value_enum)]
        kind: Kind,
        #[arg(long, default_value_t = 10)]
        min: usize,
        #[arg(long, default_value_t = 100)]
        max: usize,
    },
    /// random per-frame membership flips
    Churn {
        #[arg(long, value_enum)]
        kind: Kind,
        #[arg(long, default_value_t = 100)]
        players: usize,
        #[arg(long, default_value_t = 200)]
        steps: usize,
        #[arg(long, default_value_t = 0.01)]
        rate: f64,
    },
}

fn main() -> Result<()> {
    alohasim::init();
    let args = Args::parse();
    let run = dispatch(&args);
    summarize(&run);
    if let Some(ref path) = args.out {
        let record = Record::from(&run.stats());
        Record::save(&[record], path)?;
        log::info!("wrote {}", path.display());
    }
    Ok(())
}

fn dispatch(args: &Args) -> Run {
    match args.command {
        Command::RunN {
            kind,
            players,
            frames,
        } => experiment::run_n(kind, players, args.seed, frames),
        Command::Ramp { kind } => experiment::ramp(kind, args.seed),
        Command::ReverseRamp { kind } => experiment::reverse_ramp(kind, args.seed),
        Command::RampUp { kind, min, max } => experiment::ramp_up(kind, args.seed, min, max),
        Command::RampDown { kind, min, max } => experiment::ramp_down(kind, args.seed, min, max),
        Command::Churn {
            kind,
            players,
            steps,
            rate,
        } => experiment::churn(kind, players, steps, rate, args.seed),
    }
}

fn summarize(run: &Run) {
    let stats = run.stats();
    let frames = stats.total_utilization.len();
    let tail = frames.saturating_sub(10);
    let utilization = stats.total_utilization[tail..].iter().sum::<f64>()
        / stats.total_utilization[tail..].len() as f64;
    let collisions =
        stats.collisions[tail..].iter().sum::<f64>() / stats.collisions[tail..].len() as f64;
    log::info!(
        "{} frames of {} ({})",
        frames,
        run.slots_per_frame(),
        run.network()
            .player_labels()
            .first()
            .copied()
            .unwrap_or("empty"),
    );
    log::info!("final utilization {:.3}, collisions {:.3}", utilization, collisions);
    if let Some(jain) = stats.jain.last() {
        log::info!("final Jain index {:.3}", jain);
    }
}
