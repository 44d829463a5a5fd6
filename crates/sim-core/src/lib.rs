#![deny(warnings)]

//! Core domain models and invariants for the FinanceLife simulation.
//!
//! This crate defines the serializable player-state aggregate, the action
//! vocabulary accepted by the reducer, and validation helpers that guarantee
//! basic invariants. No behavior lives here beyond trivial aggregation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Maximum number of monthly history snapshots retained (oldest evicted first).
pub const HISTORY_MONTHS: usize = 12;

/// Unique identifier for a player-held investment, e.g. "inv_0001_9f2c41d3".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InvestmentId(pub String);

/// Asset class of an investment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentKind {
    /// Equity holdings, affected by market dip/boom events.
    Stocks,
    /// Fixed-income holdings.
    Bonds,
    /// Property holdings.
    RealEstate,
}

/// A single investment position held by the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    /// Unique identifier assigned at purchase.
    pub id: InvestmentId,
    /// Display name chosen at purchase.
    pub name: String,
    /// Current value; mutated monthly by fluctuation and by event outcomes.
    pub value: Decimal,
    /// Asset class.
    pub kind: InvestmentKind,
    /// Simulation date of purchase; immutable after creation.
    pub purchase_date: NaiveDate,
    /// Units held (reserved; not used by core arithmetic).
    pub quantity: Option<f64>,
    /// Nominal annual return rate (reserved; not used by core arithmetic).
    pub annual_return_rate: Option<f64>,
}

/// Immutable monthly snapshot appended once per month advance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDataPoint {
    /// Simulation date the snapshot was taken.
    pub date: NaiveDate,
    /// Net worth at snapshot time.
    pub net_worth: Decimal,
    /// Cash at snapshot time.
    pub cash: Decimal,
    /// Total investment value at snapshot time.
    pub investments_value: Decimal,
    /// Outstanding debt at snapshot time.
    pub debt: Decimal,
}

/// The sole mutable aggregate: the full state of one player's financial life.
///
/// Replaced wholesale on every dispatched action; never mutated in place by
/// callers. `net_worth` is derived and recomputed after every mutating
/// transition, never drifted independently.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Display name.
    pub player_name: String,
    /// Current level, >= 1.
    pub level: u32,
    /// Experience toward the next level; reduced by the threshold at level-up.
    pub experience: f64,
    /// Liquid cash; may go negative.
    pub cash: Decimal,
    /// Income credited each month advance.
    pub monthly_income: Decimal,
    /// Expenses debited each month advance.
    pub monthly_expenses: Decimal,
    /// Held positions; insertion order is display order.
    pub investments: Vec<Investment>,
    /// Outstanding debt. Non-negative by construction but not enforced:
    /// ADJUST_FINANCES may drive it negative (read as a credit balance).
    pub debt: Decimal,
    /// Derived: cash + sum of investment values - debt.
    pub net_worth: Decimal,
    /// Ids of quests completed so far; grows until reinitialize.
    pub completed_quest_ids: Vec<String>,
    /// Ids of achievements unlocked so far; grows until reinitialize.
    pub unlocked_achievement_ids: Vec<String>,
    /// Simulation date; advances by whole months only.
    pub game_date: NaiveDate,
    /// Rolling window of monthly snapshots, at most [`HISTORY_MONTHS`] entries.
    pub historical_data: Vec<HistoricalDataPoint>,
    /// One-way false -> true, except on reinitialize.
    pub is_game_over: bool,
    /// Human-readable terminal message; only meaningful while `is_game_over`.
    pub game_over_message: Option<String>,
}

impl PlayerState {
    /// Sum of all held investment values.
    pub fn total_investment_value(&self) -> Decimal {
        self.investments.iter().map(|inv| inv.value).sum()
    }

    /// Whether the given quest id has already been completed.
    pub fn has_completed_quest(&self, quest_id: &str) -> bool {
        self.completed_quest_ids.iter().any(|id| id == quest_id)
    }

    /// Whether the given achievement id has already been unlocked.
    pub fn has_unlocked_achievement(&self, achievement_id: &str) -> bool {
        self.unlocked_achievement_ids.iter().any(|id| id == achievement_id)
    }
}

/// Optional deltas applied to the core finance fields by ADJUST_FINANCES.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinanceAdjustment {
    pub cash_delta: Option<Decimal>,
    pub debt_delta: Option<Decimal>,
    pub income_delta: Option<Decimal>,
    pub expenses_delta: Option<Decimal>,
}

/// Cosmetic player fields shallow-merged by UPDATE_PLAYER_DETAILS.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerDetails {
    pub player_name: Option<String>,
}

/// Optional overrides merged over the default configuration on INITIALIZE_GAME.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialOverrides {
    pub player_name: Option<String>,
    pub cash: Option<Decimal>,
    pub monthly_income: Option<Decimal>,
    pub monthly_expenses: Option<Decimal>,
    pub debt: Option<Decimal>,
}

/// The full action vocabulary accepted by the reducer.
///
/// Every variant except `InitializeGame`, `UpdatePlayerDetails`, and
/// `SetGameOver` is a no-op while the game is over. `ApplyRandomEvent` is
/// carried in the vocabulary but has no handler; dispatching it returns the
/// state unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameAction {
    InitializeGame {
        overrides: Option<InitialOverrides>,
    },
    AdvanceMonth,
    CompleteQuest {
        quest_id: String,
    },
    BuyInvestment {
        name: String,
        value: Decimal,
        kind: InvestmentKind,
    },
    SellInvestment {
        investment_id: InvestmentId,
        sell_price: Decimal,
    },
    AdjustFinances(FinanceAdjustment),
    UpdatePlayerDetails(PlayerDetails),
    ApplyRandomEvent {
        event_id: String,
    },
    ProcessEventChoice {
        event_id: String,
        choice_index: usize,
    },
    SetGameOver {
        message: String,
    },
}

/// Simulation configuration parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    /// Seed for deterministic RNG.
    pub rng_seed: u64,
    /// Simulation date of the first snapshot.
    pub start_date: NaiveDate,
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Level must be >= 1.
    #[error("level must be >= 1")]
    LevelZero,
    /// Experience must be finite and non-negative.
    #[error("experience must be finite and non-negative")]
    InvalidExperience,
    /// Player name must be non-empty.
    #[error("player name must be non-empty")]
    EmptyPlayerName,
    /// History exceeds the retained window.
    #[error("historical data holds {0} entries, more than {HISTORY_MONTHS}")]
    HistoryOverflow(usize),
    /// Stored net worth does not match cash + investments - debt.
    #[error("net worth {stored} drifted from derived {derived}")]
    NetWorthDrift { stored: Decimal, derived: Decimal },
    /// Game-over message present while the game is not over.
    #[error("game over message set while game is not over")]
    StrayGameOverMessage,
    /// Duplicate investment id.
    #[error("duplicate investment id: {0}")]
    DuplicateInvestmentId(String),
}

/// Validate a player state against the domain invariants.
pub fn validate_player_state(state: &PlayerState) -> Result<(), ValidationError> {
    if state.level == 0 {
        return Err(ValidationError::LevelZero);
    }
    if !state.experience.is_finite() || state.experience < 0.0 {
        return Err(ValidationError::InvalidExperience);
    }
    if state.player_name.trim().is_empty() {
        return Err(ValidationError::EmptyPlayerName);
    }
    if state.historical_data.len() > HISTORY_MONTHS {
        return Err(ValidationError::HistoryOverflow(state.historical_data.len()));
    }
    let derived = state.cash + state.total_investment_value() - state.debt;
    if state.net_worth != derived {
        return Err(ValidationError::NetWorthDrift {
            stored: state.net_worth,
            derived,
        });
    }
    if state.game_over_message.is_some() && !state.is_game_over {
        return Err(ValidationError::StrayGameOverMessage);
    }
    let mut ids: BTreeSet<&InvestmentId> = BTreeSet::new();
    for inv in &state.investments {
        if !ids.insert(&inv.id) {
            return Err(ValidationError::DuplicateInvestmentId(inv.id.0.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn base_state() -> PlayerState {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PlayerState {
            player_name: "Player One".to_string(),
            level: 1,
            experience: 0.0,
            cash: Decimal::new(500, 0),
            monthly_income: Decimal::new(1000, 0),
            monthly_expenses: Decimal::new(800, 0),
            investments: vec![],
            debt: Decimal::ZERO,
            net_worth: Decimal::new(500, 0),
            completed_quest_ids: vec![],
            unlocked_achievement_ids: vec![],
            game_date: date,
            historical_data: vec![HistoricalDataPoint {
                date,
                net_worth: Decimal::new(500, 0),
                cash: Decimal::new(500, 0),
                investments_value: Decimal::ZERO,
                debt: Decimal::ZERO,
            }],
            is_game_over: false,
            game_over_message: None,
        }
    }

    fn investment(id: &str, value: Decimal) -> Investment {
        Investment {
            id: InvestmentId(id.to_string()),
            name: "Index Fund".to_string(),
            value,
            kind: InvestmentKind::Stocks,
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            quantity: None,
            annual_return_rate: None,
        }
    }

    #[test]
    fn serde_roundtrip_player_state() {
        let mut state = base_state();
        state.investments.push(investment("inv_1", Decimal::new(400, 0)));
        state.net_worth = Decimal::new(900, 0);
        let s = serde_json::to_string_pretty(&state).unwrap();
        let back: PlayerState = serde_json::from_str(&s).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn investment_kind_uses_snake_case_tags() {
        let s = serde_json::to_string(&InvestmentKind::RealEstate).unwrap();
        assert_eq!(s, "\"real_estate\"");
        let back: InvestmentKind = serde_json::from_str("\"stocks\"").unwrap();
        assert_eq!(back, InvestmentKind::Stocks);
    }

    #[test]
    fn valid_initial_state_passes() {
        validate_player_state(&base_state()).unwrap();
    }

    #[test]
    fn drifted_net_worth_is_rejected() {
        let mut state = base_state();
        state.net_worth = Decimal::new(9999, 0);
        assert!(matches!(
            validate_player_state(&state),
            Err(ValidationError::NetWorthDrift { .. })
        ));
    }

    #[test]
    fn oversized_history_is_rejected() {
        let mut state = base_state();
        let point = state.historical_data[0].clone();
        state.historical_data = vec![point; HISTORY_MONTHS + 1];
        assert_eq!(
            validate_player_state(&state),
            Err(ValidationError::HistoryOverflow(HISTORY_MONTHS + 1))
        );
    }

    #[test]
    fn stray_game_over_message_is_rejected() {
        let mut state = base_state();
        state.game_over_message = Some("not actually over".to_string());
        assert_eq!(
            validate_player_state(&state),
            Err(ValidationError::StrayGameOverMessage)
        );
    }

    #[test]
    fn duplicate_investment_ids_are_rejected() {
        let mut state = base_state();
        state.investments.push(investment("inv_1", Decimal::new(100, 0)));
        state.investments.push(investment("inv_1", Decimal::new(200, 0)));
        state.net_worth = Decimal::new(800, 0);
        assert_eq!(
            validate_player_state(&state),
            Err(ValidationError::DuplicateInvestmentId("inv_1".to_string()))
        );
    }

    #[test]
    fn zero_level_is_rejected() {
        let mut state = base_state();
        state.level = 0;
        assert_eq!(validate_player_state(&state), Err(ValidationError::LevelZero));
    }

    proptest! {
        #[test]
        fn consistent_states_validate(cash in -10_000i64..100_000,
                                      debt in -1_000i64..50_000,
                                      value in 0i64..50_000) {
            let mut state = base_state();
            state.cash = Decimal::new(cash, 0);
            state.debt = Decimal::new(debt, 0);
            state.investments = vec![investment("inv_1", Decimal::new(value, 0))];
            state.net_worth = state.cash + state.total_investment_value() - state.debt;
            prop_assert!(validate_player_state(&state).is_ok());
        }

        #[test]
        fn negative_experience_is_rejected(xp in -1_000.0f64..-0.001) {
            let mut state = base_state();
            state.experience = xp;
            prop_assert_eq!(
                validate_player_state(&state),
                Err(ValidationError::InvalidExperience)
            );
        }
    }
}
