#![deny(warnings)]

//! Financial simulation core: pure functions behind the monthly progression.
//!
//! This crate provides:
//! - Net-worth derivation and the experience curve
//! - The monthly update transform (settlement, interest, fluctuation, leveling)
//! - Investment construction
//!
//! Nothing here performs I/O. All randomness comes from an `Rng` supplied by
//! the caller, so every transform is reproducible under a fixed seed.

use chrono::Months;
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sim_core::{
    HistoricalDataPoint, Investment, InvestmentId, InvestmentKind, PlayerState, HISTORY_MONTHS,
};

/// Experience granted for surviving a month.
pub const MONTH_SURVIVAL_XP: f64 = 10.0;

/// Terminal message set when the insolvency predicate fires.
pub const GAME_OVER_MESSAGE: &str =
    "You've fallen too deep into debt and can't recover. Game Over.";

/// Monthly interest charged on outstanding debt (1%).
pub fn debt_interest_rate() -> Decimal {
    Decimal::new(1, 2)
}

/// Net worth is always derived: cash plus total investment value minus debt.
pub fn calculate_net_worth(state: &PlayerState) -> Decimal {
    state.cash + state.total_investment_value() - state.debt
}

/// Experience required to advance past the given level.
///
/// `100 * level^1.5`, producing 100, ~283, ~520, 800, ... Monotonically
/// increasing in level; used both for level-up eligibility and progress
/// display.
pub fn experience_for_next_level(level: u32) -> f64 {
    100.0 * f64::from(level).powf(1.5)
}

/// Apply at most one level-up to the given progression values.
///
/// Deliberately a single conditional, not a loop: one very large experience
/// grant can leave `experience` above the next threshold, and the surplus
/// only converts on the following grant. The cash bonus is 100 times the
/// new level.
pub fn apply_level_up(level: u32, experience: f64, cash: Decimal) -> (u32, f64, Decimal) {
    let threshold = experience_for_next_level(level);
    if experience >= threshold {
        let level = level + 1;
        let experience = experience - threshold;
        let cash = cash + Decimal::from(level * 100);
        (level, experience, cash)
    } else {
        (level, experience, cash)
    }
}

/// The full field set produced by a surviving month advance.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyUpdate {
    pub cash: Decimal,
    pub debt: Decimal,
    pub investments: Vec<Investment>,
    pub game_date: chrono::NaiveDate,
    pub experience: f64,
    pub level: u32,
    pub net_worth: Decimal,
    pub historical_data: Vec<HistoricalDataPoint>,
}

/// Outcome of a month advance.
///
/// The two arms are intentionally asymmetric: when the insolvency predicate
/// fires, the computed update is discarded and only the terminal flags are
/// surfaced, leaving every other field at its pre-advance value.
#[derive(Clone, Debug, PartialEq)]
pub enum MonthlyOutcome {
    Update(MonthlyUpdate),
    GameOver { message: String },
}

/// Advance a non-game-over state by one month.
///
/// Fixed order: income/expense settlement, debt interest (charged as a cash
/// outflow while accruing on the debt), per-investment fluctuation, date
/// advance, survival experience plus a single level-up check, net-worth
/// recomputation, history append with FIFO eviction, and finally the
/// game-over predicate.
///
/// Each investment value is multiplied by `1 + (u - 0.45) * 0.05` with `u`
/// drawn uniformly from [0, 1) per investment, i.e. a fluctuation between
/// -2.25% and +2.75%, floored so value never goes negative.
pub fn process_monthly_update<R: Rng>(state: &PlayerState, rng: &mut R) -> MonthlyOutcome {
    let mut cash = state.cash + state.monthly_income - state.monthly_expenses;

    let interest = state.debt * debt_interest_rate();
    cash -= interest;
    let debt = state.debt + interest;

    let investments: Vec<Investment> = state
        .investments
        .iter()
        .map(|inv| {
            let u: f64 = rng.gen();
            let factor = 1.0 + (u - 0.45) * 0.05;
            // The factor is always finite and close to 1; fall back to a flat
            // month rather than poisoning the value.
            let factor = Decimal::from_f64(factor).unwrap_or(Decimal::ONE);
            let mut inv = inv.clone();
            inv.value = (inv.value * factor).max(Decimal::ZERO);
            inv
        })
        .collect();

    let game_date = state
        .game_date
        .checked_add_months(Months::new(1))
        .unwrap_or(state.game_date);

    let experience = state.experience + MONTH_SURVIVAL_XP;
    let (level, experience, cash) = apply_level_up(state.level, experience, cash);

    let investments_value: Decimal = investments.iter().map(|inv| inv.value).sum();
    let net_worth = cash + investments_value - debt;

    let point = HistoricalDataPoint {
        date: game_date,
        net_worth,
        cash,
        investments_value,
        debt,
    };
    let mut historical_data = state.historical_data.clone();
    historical_data.push(point);
    if historical_data.len() > HISTORY_MONTHS {
        let excess = historical_data.len() - HISTORY_MONTHS;
        historical_data.drain(..excess);
    }

    if cash < Decimal::ZERO && debt > net_worth * Decimal::TWO && net_worth < Decimal::ZERO {
        return MonthlyOutcome::GameOver {
            message: GAME_OVER_MESSAGE.to_string(),
        };
    }

    MonthlyOutcome::Update(MonthlyUpdate {
        cash,
        debt,
        investments,
        game_date,
        experience,
        level,
        net_worth,
        historical_data,
    })
}

/// Build a new investment with a freshly drawn id and the given purchase date.
///
/// Pure aside from the id draw, which comes from the caller's seeded RNG so
/// creation stays reproducible.
pub fn create_investment<R: Rng>(
    name: String,
    value: Decimal,
    kind: InvestmentKind,
    purchase_date: chrono::NaiveDate,
    rng: &mut R,
) -> Investment {
    Investment {
        id: InvestmentId(format!("inv_{:016x}", rng.gen::<u64>())),
        name,
        value,
        kind,
        purchase_date,
        quantity: None,
        annual_return_rate: None,
    }
}

/// The fixed initial configuration a session starts from.
pub fn initial_player_state(start_date: chrono::NaiveDate) -> PlayerState {
    let cash = Decimal::new(500, 0);
    PlayerState {
        player_name: "Player One".to_string(),
        level: 1,
        experience: 0.0,
        cash,
        monthly_income: Decimal::new(1000, 0),
        monthly_expenses: Decimal::new(800, 0),
        investments: vec![],
        debt: Decimal::ZERO,
        net_worth: cash,
        completed_quest_ids: vec![],
        unlocked_achievement_ids: vec![],
        game_date: start_date,
        historical_data: vec![HistoricalDataPoint {
            date: start_date,
            net_worth: cash,
            cash,
            investments_value: Decimal::ZERO,
            debt: Decimal::ZERO,
        }],
        is_game_over: false,
        game_over_message: None,
    }
}
