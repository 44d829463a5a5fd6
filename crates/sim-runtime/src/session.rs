//! Session orchestrator: the single owner of the live player state.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_catalog::{AchievementDef, Catalogs, QuestDef, RandomEventDef};
use sim_core::{GameAction, PlayerState, SimConfig};
use sim_econ::initial_player_state;
use tracing::{debug, info};

use crate::reducer::reduce;

/// Owns the current [`PlayerState`], the seeded RNG, and the catalogs, and
/// exposes the dispatch entry point plus read-only projections.
///
/// The random-event trigger is an explicit post-transition hook: it runs
/// synchronously after a successful `AdvanceMonth` dispatch, only when the
/// game date actually advanced, and never while the game is over. It cannot
/// fire off the initial state.
#[derive(Clone, Debug)]
pub struct Session {
    config: SimConfig,
    catalogs: Catalogs,
    state: PlayerState,
    rng: ChaCha8Rng,
    pending_event: Option<String>,
}

impl Session {
    /// Start a session from the fixed initial configuration and the base
    /// catalogs.
    pub fn new(config: SimConfig) -> Self {
        Self::with_catalogs(config, Catalogs::base())
    }

    /// Start a session with custom catalogs (used by tests and mods).
    pub fn with_catalogs(config: SimConfig, catalogs: Catalogs) -> Self {
        let state = initial_player_state(config.start_date);
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        Self {
            config,
            catalogs,
            state,
            rng,
            pending_event: None,
        }
    }

    /// The current state snapshot.
    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// The session configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The catalogs this session runs against.
    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    /// Dispatch one action, replacing the state wholesale.
    pub fn dispatch(&mut self, action: &GameAction) {
        let prev_date = self.state.game_date;
        self.state = reduce(&self.state, action, &self.catalogs, &self.config, &mut self.rng);
        match action {
            GameAction::InitializeGame { .. } => {
                self.pending_event = None;
            }
            GameAction::AdvanceMonth => {
                if !self.state.is_game_over && self.state.game_date != prev_date {
                    if let Some(event) =
                        sim_catalog::roll_event(&self.catalogs.events, &mut self.rng)
                    {
                        info!(event = %event.id, "random event fired");
                        self.pending_event = Some(event.id.clone());
                    }
                }
            }
            GameAction::ProcessEventChoice { event_id, .. } => {
                if self.pending_event.as_deref() == Some(event_id.as_str()) {
                    self.pending_event = None;
                }
            }
            _ => {}
        }
    }

    /// Quests currently visible to the player.
    pub fn available_quests(&self) -> Vec<&QuestDef> {
        sim_catalog::available_quests(&self.catalogs.quests, &self.state)
    }

    /// Unlocked achievements, in catalog order.
    pub fn unlocked_achievements(&self) -> Vec<&AchievementDef> {
        self.catalogs
            .achievements
            .iter()
            .filter(|a| self.state.has_unlocked_achievement(&a.id))
            .collect()
    }

    /// The event awaiting a player choice, if any.
    pub fn pending_event(&self) -> Option<&RandomEventDef> {
        self.pending_event
            .as_deref()
            .and_then(|id| self.catalogs.event(id))
    }

    /// Resolve the pending event with the given choice and clear it.
    pub fn resolve_pending_event(&mut self, choice_index: usize) {
        let Some(event_id) = self.pending_event.take() else {
            debug!("no pending event to resolve");
            return;
        };
        self.dispatch(&GameAction::ProcessEventChoice {
            event_id,
            choice_index,
        });
    }

    /// Drop the pending event without applying any choice.
    pub fn dismiss_pending_event(&mut self) {
        self.pending_event = None;
    }

    /// Headless driver: advance up to `months` months, resolving any fired
    /// event with its first listed choice. Returns the number of months
    /// actually run (the loop stops at game over).
    pub fn run_months(&mut self, months: u32) -> u32 {
        let mut run = 0;
        for _ in 0..months {
            if self.state.is_game_over {
                break;
            }
            self.dispatch(&GameAction::AdvanceMonth);
            run += 1;
            if self.pending_event.is_some() {
                self.resolve_pending_event(0);
            }
        }
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sim_catalog::{EventChoice, EventEffect, RandomEventDef};
    use sim_core::{validate_player_state, FinanceAdjustment, HISTORY_MONTHS};

    fn config(seed: u64) -> SimConfig {
        SimConfig {
            rng_seed: seed,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    /// Catalogs whose single event always fires, for trigger-protocol tests.
    fn certain_event_catalogs() -> Catalogs {
        let mut catalogs = Catalogs::base();
        catalogs.events = vec![RandomEventDef {
            id: "event_always".to_string(),
            title: "Always".to_string(),
            description: "Fires every month.".to_string(),
            chance: 1.0,
            icon: "gift".to_string(),
            choices: vec![EventChoice {
                text: "Take $100".to_string(),
                effect: EventEffect::CashDelta(Decimal::new(100, 0)),
            }],
        }];
        catalogs
    }

    #[test]
    fn no_event_fires_off_the_initial_state() {
        let session = Session::with_catalogs(config(1), certain_event_catalogs());
        assert!(session.pending_event().is_none());
    }

    #[test]
    fn event_fires_only_on_a_date_change() {
        let mut session = Session::with_catalogs(config(1), certain_event_catalogs());
        session.dispatch(&GameAction::AdjustFinances(FinanceAdjustment {
            cash_delta: Some(Decimal::new(10, 0)),
            ..FinanceAdjustment::default()
        }));
        assert!(session.pending_event().is_none());
        session.dispatch(&GameAction::AdvanceMonth);
        assert_eq!(session.pending_event().unwrap().id, "event_always");
    }

    #[test]
    fn resolving_the_pending_event_applies_the_choice() {
        let mut session = Session::with_catalogs(config(1), certain_event_catalogs());
        session.dispatch(&GameAction::AdvanceMonth);
        let cash_before = session.state().cash;
        session.resolve_pending_event(0);
        assert!(session.pending_event().is_none());
        assert_eq!(session.state().cash, cash_before + Decimal::new(100, 0));
        validate_player_state(session.state()).unwrap();
    }

    #[test]
    fn dismissing_drops_the_event_without_changes() {
        let mut session = Session::with_catalogs(config(1), certain_event_catalogs());
        session.dispatch(&GameAction::AdvanceMonth);
        let state_before = session.state().clone();
        session.dismiss_pending_event();
        assert!(session.pending_event().is_none());
        assert_eq!(session.state(), &state_before);
    }

    #[test]
    fn no_event_fires_once_the_game_is_over() {
        let mut session = Session::with_catalogs(config(1), certain_event_catalogs());
        session.dispatch(&GameAction::SetGameOver {
            message: "over".to_string(),
        });
        session.dispatch(&GameAction::AdvanceMonth);
        assert!(session.pending_event().is_none());
    }

    #[test]
    fn reinitializing_clears_state_and_pending_event() {
        let mut session = Session::with_catalogs(config(1), certain_event_catalogs());
        session.dispatch(&GameAction::AdvanceMonth);
        assert!(session.pending_event().is_some());
        session.dispatch(&GameAction::InitializeGame { overrides: None });
        assert!(session.pending_event().is_none());
        assert_eq!(session.state().cash, Decimal::new(500, 0));
        assert_eq!(
            session.state().game_date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn projections_track_progress() {
        let mut session = Session::new(config(7));
        assert_eq!(session.available_quests().len(), 3);
        assert!(session.unlocked_achievements().is_empty());
        session.dispatch(&GameAction::CompleteQuest {
            quest_id: "q1_save_100".to_string(),
        });
        let visible: Vec<&str> = session
            .available_quests()
            .iter()
            .map(|q| q.id.as_str())
            .collect();
        assert!(visible.contains(&"q2_emergency_fund"));
        assert!(!visible.contains(&"q1_save_100"));
    }

    #[test]
    fn run_months_is_bounded_and_keeps_invariants() {
        let mut session = Session::new(config(42));
        let run = session.run_months(24);
        assert_eq!(run, 24);
        let state = session.state();
        assert!(state.historical_data.len() <= HISTORY_MONTHS);
        validate_player_state(state).unwrap();
        assert_eq!(
            state.game_date,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
        );
    }

    #[test]
    fn same_seed_replays_identically() {
        let mut a = Session::new(config(1234));
        let mut b = Session::new(config(1234));
        a.run_months(18);
        b.run_months(18);
        assert_eq!(a.state(), b.state());
    }

    #[test]
    fn different_seeds_diverge_with_investments() {
        let buy = GameAction::BuyInvestment {
            name: "Index Fund".to_string(),
            value: Decimal::new(400, 0),
            kind: sim_core::InvestmentKind::Stocks,
        };
        let mut a = Session::new(config(1));
        let mut b = Session::new(config(2));
        a.dispatch(&buy);
        b.dispatch(&buy);
        a.run_months(12);
        b.run_months(12);
        // Fluctuation paths differ across seeds.
        assert_ne!(
            a.state().investments[0].value,
            b.state().investments[0].value
        );
    }

    #[test]
    fn run_months_stops_at_game_over() {
        let mut session = Session::new(config(5));
        session.dispatch(&GameAction::AdjustFinances(FinanceAdjustment {
            cash_delta: Some(Decimal::new(-10_000, 0)),
            debt_delta: Some(Decimal::new(50_000, 0)),
            income_delta: Some(Decimal::new(-1_000, 0)),
            expenses_delta: None,
        }));
        let run = session.run_months(60);
        assert!(session.state().is_game_over);
        assert!(run < 60);
        assert!(session.state().game_over_message.is_some());
    }
}
