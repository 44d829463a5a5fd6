//! Boundary to the external advice collaborator.
//!
//! The collaborator is an opaque async function: it receives five scalars
//! summarizing the player's finances and returns free-form display text.
//! Failures and timeouts stay on this side of the boundary; they never touch
//! [`PlayerState`].

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use sim_core::PlayerState;
use sim_econ::calculate_net_worth;

/// The financial summary handed to the advice collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdviceInput {
    pub income: f64,
    pub expenses: f64,
    /// Total current value of all investments.
    pub investments: f64,
    pub debt: f64,
    pub net_worth: f64,
}

/// Opaque advice text returned by the collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub advice: String,
}

/// Failures at the advice boundary; transient and retryable, never fatal.
#[derive(Debug, Error)]
pub enum AdviceError {
    /// The collaborator did not answer within the deadline.
    #[error("advice request timed out after {0:?}")]
    Timeout(Duration),
    /// The collaborator answered with an error.
    #[error("advice provider failed: {0}")]
    Provider(String),
}

/// Derive the five-scalar summary from the current state.
pub fn advice_input(state: &PlayerState) -> AdviceInput {
    AdviceInput {
        income: state.monthly_income.to_f64().unwrap_or(0.0),
        expenses: state.monthly_expenses.to_f64().unwrap_or(0.0),
        investments: state.total_investment_value().to_f64().unwrap_or(0.0),
        debt: state.debt.to_f64().unwrap_or(0.0),
        net_worth: calculate_net_worth(state).to_f64().unwrap_or(0.0),
    }
}

/// Call the collaborator with a deadline.
///
/// The caller may abandon the result freely; nothing here mutates game state.
pub async fn fetch_advice<F, Fut>(
    input: AdviceInput,
    provider: F,
    deadline: Duration,
) -> Result<Advice, AdviceError>
where
    F: FnOnce(AdviceInput) -> Fut,
    Fut: Future<Output = Result<Advice, AdviceError>>,
{
    match tokio::time::timeout(deadline, provider(input)).await {
        Ok(result) => result,
        Err(_) => Err(AdviceError::Timeout(deadline)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sim_econ::initial_player_state;

    fn state_with_debt() -> PlayerState {
        let mut state =
            initial_player_state(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        state.debt = Decimal::new(300, 0);
        state.net_worth = calculate_net_worth(&state);
        state
    }

    #[test]
    fn input_summarizes_the_five_scalars() {
        let input = advice_input(&state_with_debt());
        assert_eq!(input.income, 1000.0);
        assert_eq!(input.expenses, 800.0);
        assert_eq!(input.investments, 0.0);
        assert_eq!(input.debt, 300.0);
        assert_eq!(input.net_worth, 200.0);
    }

    #[tokio::test]
    async fn successful_advice_passes_through() {
        let input = advice_input(&state_with_debt());
        let result = fetch_advice(
            input,
            |input| async move {
                Ok(Advice {
                    advice: format!("Pay down your ${} debt first.", input.debt),
                })
            },
            Duration::from_secs(1),
        )
        .await
        .unwrap();
        assert_eq!(result.advice, "Pay down your $300 debt first.");
    }

    #[tokio::test]
    async fn provider_failure_is_reported_as_retryable() {
        let input = advice_input(&state_with_debt());
        let result = fetch_advice(
            input,
            |_| async { Err(AdviceError::Provider("model unavailable".to_string())) },
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(result, Err(AdviceError::Provider(_))));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let input = advice_input(&state_with_debt());
        let result = fetch_advice(
            input,
            |_| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(Advice {
                    advice: "too late".to_string(),
                })
            },
            Duration::from_millis(20),
        )
        .await;
        assert!(matches!(result, Err(AdviceError::Timeout(_))));
    }
}
