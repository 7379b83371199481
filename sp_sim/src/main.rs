//! Multi-client story-point estimation simulator.
//!
//! Spawns one client session per participant over the in-memory room store,
//! plays scripted voting rounds and a raffle, and logs what the clients observe.

mod config;
mod logging;
mod simulation;

use anyhow::Error;
use log::info;
use pico_args::Arguments;

use crate::config::{Overrides, SimConfig};

const HELP: &str = "\
Simulate a story-point estimation session

USAGE:
  sp_sim [OPTIONS]

OPTIONS:
  --participants N         Simulated clients, creator included  [default: env SIM_PARTICIPANTS or 5]
  --room-name    NAME      Room name                            [default: env SIM_ROOM_NAME or \"Sprint planning\"]
  --rounds       N         Voting rounds before the raffle      [default: env SIM_ROUNDS or 3]
  --seed         N         Seed for card choices                [default: env SIM_SEED or random]

FLAGS:
  --fast                   Shrink reveal and raffle countdowns to 50ms
  -h, --help               Print help information

ENVIRONMENT:
  RUST_LOG                 Log filter (e.g. info,story_poker=debug)
  REVEAL_DELAY_MS          Delay before revealed cards are shown
  RAFFLE_COUNTDOWN_MS      Countdown before the raffle winner is drawn
  RAFFLE_DRAW_POLICY       creator | every-client
  ENFORCE_CREATOR          Reject creator-only actions from other users
  (A .env file in the working directory is loaded first)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        fast: pargs.contains("--fast"),
        participants: pargs.opt_value_from_str("--participants")?,
        room_name: pargs.opt_value_from_str("--room-name")?,
        rounds: pargs.opt_value_from_str("--rounds")?,
        seed: pargs.opt_value_from_str("--seed")?,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {remaining:?}");
    }

    logging::init();

    let config = SimConfig::from_env(overrides)?;
    config.validate()?;

    info!(
        "Simulating {} participant(s) over {} round(s) in \"{}\"",
        config.participants, config.rounds, config.room_name
    );

    let report = simulation::run(&config).await?;

    for (index, round) in report.rounds.iter().enumerate() {
        let consensus = match round.summary.consensus.consensus_point {
            Some(point) => format!("consensus on {point}"),
            None => "no consensus".to_string(),
        };
        info!(
            "Round {}: {} vote(s), average {:.1}, rounded {} ({consensus})",
            index + 1,
            round.votes,
            round.summary.average,
            round.summary.rounded_average,
        );
    }

    if let Some(winner) = &report.raffle_winner {
        info!("Raffle winner: {}", winner.name);
    }

    info!(
        "Room {} finished (seed {}, {} participant(s) still active)",
        report.room_id, report.seed, report.still_active
    );

    Ok(())
}
