//! The game state machine: one pure reducer dispatching to the simulation
//! core and the progression catalogs.

use rand::Rng;
use sim_catalog::{Catalogs, StateChanges};
use sim_core::{GameAction, PlayerState, SimConfig};
use sim_econ::{
    apply_level_up, calculate_net_worth, create_investment, initial_player_state,
    process_monthly_update, MonthlyOutcome,
};
use tracing::{debug, info};

/// Produce the next state for the given action.
///
/// Total: invalid actions under the current state (insufficient cash, unknown
/// ids, out-of-range choice, anything while game-over) return the input state
/// unchanged rather than erroring. Every handler except `InitializeGame`,
/// `UpdatePlayerDetails`, and `SetGameOver` checks the game-over gate first.
/// Net worth is recomputed as the last step of every mutating branch.
pub fn reduce<R: Rng>(
    state: &PlayerState,
    action: &GameAction,
    catalogs: &Catalogs,
    config: &SimConfig,
    rng: &mut R,
) -> PlayerState {
    match action {
        GameAction::InitializeGame { overrides } => {
            let mut next = initial_player_state(config.start_date);
            if let Some(overrides) = overrides {
                if let Some(name) = &overrides.player_name {
                    next.player_name = name.clone();
                }
                if let Some(cash) = overrides.cash {
                    next.cash = cash;
                }
                if let Some(income) = overrides.monthly_income {
                    next.monthly_income = income;
                }
                if let Some(expenses) = overrides.monthly_expenses {
                    next.monthly_expenses = expenses;
                }
                if let Some(debt) = overrides.debt {
                    next.debt = debt;
                }
            }
            next.net_worth = calculate_net_worth(&next);
            next
        }

        GameAction::AdvanceMonth => {
            if state.is_game_over {
                return state.clone();
            }
            let mut next = state.clone();
            match process_monthly_update(state, rng) {
                MonthlyOutcome::Update(update) => {
                    next.cash = update.cash;
                    next.debt = update.debt;
                    next.investments = update.investments;
                    next.game_date = update.game_date;
                    next.experience = update.experience;
                    next.level = update.level;
                    next.net_worth = update.net_worth;
                    next.historical_data = update.historical_data;
                    if next.level > state.level {
                        info!(level = next.level, "leveled up");
                    }
                }
                MonthlyOutcome::GameOver { message } => {
                    info!(%message, "game over");
                    next.is_game_over = true;
                    next.game_over_message = Some(message);
                }
            }
            next.net_worth = calculate_net_worth(&next);
            let newly = sim_catalog::newly_unlocked_achievements(&catalogs.achievements, &next);
            if !newly.is_empty() {
                info!(achievements = ?newly, "achievements unlocked");
            }
            next.unlocked_achievement_ids.extend(newly);
            next
        }

        GameAction::CompleteQuest { quest_id } => {
            if state.is_game_over {
                return state.clone();
            }
            let Some(quest) = catalogs.quest(quest_id) else {
                debug!(%quest_id, "unknown quest id");
                return state.clone();
            };
            if state.has_completed_quest(&quest.id) || !quest.goal.is_met(state) {
                return state.clone();
            }
            let mut next = state.clone();
            next.experience += quest.reward.experience;
            if let Some(cash) = quest.reward.cash {
                next.cash += cash;
            }
            if let Some(bonus) = &quest.on_complete {
                if let Some(delta) = bonus.cash_delta {
                    next.cash += delta;
                }
                if let Some(delta) = bonus.income_delta {
                    next.monthly_income += delta;
                }
                if let Some(delta) = bonus.expenses_delta {
                    next.monthly_expenses += delta;
                }
            }
            let (level, experience, cash) = apply_level_up(next.level, next.experience, next.cash);
            next.level = level;
            next.experience = experience;
            next.cash = cash;
            next.completed_quest_ids.push(quest.id.clone());
            next.net_worth = calculate_net_worth(&next);
            info!(quest = %quest.id, level = next.level, "quest completed");
            next
        }

        GameAction::BuyInvestment { name, value, kind } => {
            if state.is_game_over {
                return state.clone();
            }
            if state.cash < *value {
                debug!(%value, cash = %state.cash, "buy rejected: insufficient cash");
                return state.clone();
            }
            let investment =
                create_investment(name.clone(), *value, *kind, state.game_date, rng);
            let mut next = state.clone();
            next.cash -= *value;
            next.investments.push(investment);
            next.net_worth = calculate_net_worth(&next);
            next
        }

        GameAction::SellInvestment {
            investment_id,
            sell_price,
        } => {
            if state.is_game_over {
                return state.clone();
            }
            if !state.investments.iter().any(|inv| inv.id == *investment_id) {
                debug!(id = %investment_id.0, "sell rejected: unknown investment");
                return state.clone();
            }
            let mut next = state.clone();
            next.cash += *sell_price;
            next.investments.retain(|inv| inv.id != *investment_id);
            next.net_worth = calculate_net_worth(&next);
            next
        }

        GameAction::AdjustFinances(adjustment) => {
            if state.is_game_over {
                return state.clone();
            }
            let mut next = state.clone();
            if let Some(delta) = adjustment.cash_delta {
                next.cash += delta;
            }
            if let Some(delta) = adjustment.debt_delta {
                // No floor: a negative balance reads as a credit.
                next.debt += delta;
            }
            if let Some(delta) = adjustment.income_delta {
                next.monthly_income += delta;
            }
            if let Some(delta) = adjustment.expenses_delta {
                next.monthly_expenses += delta;
            }
            next.net_worth = calculate_net_worth(&next);
            next
        }

        GameAction::UpdatePlayerDetails(details) => {
            // Cosmetic; not gated on game over.
            let mut next = state.clone();
            if let Some(name) = &details.player_name {
                next.player_name = name.clone();
            }
            next
        }

        // Reserved in the vocabulary; no handler.
        GameAction::ApplyRandomEvent { .. } => state.clone(),

        GameAction::ProcessEventChoice {
            event_id,
            choice_index,
        } => {
            if state.is_game_over {
                return state.clone();
            }
            let Some(event) = catalogs.event(event_id) else {
                debug!(%event_id, "unknown event id");
                return state.clone();
            };
            let Some(choice) = event.choices.get(*choice_index) else {
                debug!(%event_id, choice_index, "event choice out of range");
                return state.clone();
            };
            let changes = choice.effect.apply(state, rng);
            let mut next = apply_changes(state, changes);
            next.net_worth = calculate_net_worth(&next);
            next
        }

        GameAction::SetGameOver { message } => {
            let mut next = state.clone();
            next.is_game_over = true;
            next.game_over_message = Some(message.clone());
            next
        }
    }
}

/// Merge a partial-state change set over the current state.
fn apply_changes(state: &PlayerState, changes: StateChanges) -> PlayerState {
    let mut next = state.clone();
    if let Some(cash) = changes.cash {
        next.cash = cash;
    }
    if let Some(debt) = changes.debt {
        next.debt = debt;
    }
    if let Some(income) = changes.monthly_income {
        next.monthly_income = income;
    }
    if let Some(expenses) = changes.monthly_expenses {
        next.monthly_expenses = expenses;
    }
    if let Some(investments) = changes.investments {
        next.investments = investments;
    }
    next
}
