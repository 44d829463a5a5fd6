#![deny(warnings)]

//! Headless CLI for driving a session and validating invariants.

use anyhow::Result;
use chrono::NaiveDate;
use sim_core::{validate_player_state, SimConfig};
use sim_runtime::Session;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

fn parse_args() -> (Option<u32>, Option<u64>) {
    let mut months: Option<u32> = None;
    let mut seed: Option<u64> = None;
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--months" => months = it.next().and_then(|s| s.parse().ok()),
            "--seed" => seed = it.next().and_then(|s| s.parse().ok()),
            _ => {}
        }
    }
    (months, seed)
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let (months, seed) = parse_args();
    info!(?months, ?seed, build = env!("GIT_SHA"), "starting CLI");

    let config = SimConfig {
        rng_seed: seed.unwrap_or(42),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    };
    let mut session = Session::new(config);
    validate_player_state(session.state())?;

    let catalogs = session.catalogs();
    println!(
        "Session OK | quests: {} | achievements: {} | events: {}",
        catalogs.quests.len(),
        catalogs.achievements.len(),
        catalogs.events.len()
    );

    let run = session.run_months(months.unwrap_or(12));
    validate_player_state(session.state())?;

    let state = session.state();
    println!(
        "KPI | months: {} | date: {} | level: {} | cash: ${} | net worth: ${} | debt: ${} | quests done: {} | achievements: {} | game over: {}",
        run,
        state.game_date,
        state.level,
        state.cash,
        state.net_worth,
        state.debt,
        state.completed_quest_ids.len(),
        state.unlocked_achievement_ids.len(),
        state.is_game_over
    );
    if let Some(message) = &state.game_over_message {
        println!("{message}");
    }

    Ok(())
}
