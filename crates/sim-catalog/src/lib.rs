#![deny(warnings)]

//! Progression catalogs: quest, achievement, and random-event tables.
//!
//! Catalog entries are data-only records. Completion predicates and event
//! outcomes are tagged variants evaluated by pure functions, so the tables
//! stay serializable and every effect is reproducible under a seeded RNG.

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{Investment, InvestmentKind, PlayerState};

/// One-time reward granted when a quest completes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestReward {
    pub experience: f64,
    pub cash: Option<Decimal>,
}

/// Prerequisites gating a quest's visibility (display only; completion is
/// governed solely by the goal predicate).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestRequirement {
    pub level: Option<u32>,
    pub completed_quest_ids: Vec<String>,
}

/// Completion predicate for a quest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum QuestGoal {
    CashAtLeast(Decimal),
    HoldsInvestmentKind(InvestmentKind),
    MonthlyExpensesBelow(Decimal),
    LevelAtLeast(u32),
}

impl QuestGoal {
    /// Whether the goal is currently satisfied by the given state.
    pub fn is_met(&self, state: &PlayerState) -> bool {
        match self {
            QuestGoal::CashAtLeast(amount) => state.cash >= *amount,
            QuestGoal::HoldsInvestmentKind(kind) => {
                state.investments.iter().any(|inv| inv.kind == *kind)
            }
            QuestGoal::MonthlyExpensesBelow(amount) => state.monthly_expenses < *amount,
            QuestGoal::LevelAtLeast(level) => state.level >= *level,
        }
    }
}

/// Optional direct state changes applied on completion, beyond the reward.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestBonus {
    pub cash_delta: Option<Decimal>,
    pub income_delta: Option<Decimal>,
    pub expenses_delta: Option<Decimal>,
}

/// An immutable quest catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestDef {
    pub id: String,
    pub title: String,
    pub description: String,
    pub reward: QuestReward,
    pub requires: Option<QuestRequirement>,
    pub goal: QuestGoal,
    pub on_complete: Option<QuestBonus>,
}

impl QuestDef {
    /// Display availability: not yet completed and all prerequisites met.
    ///
    /// Deliberately decoupled from [`QuestGoal::is_met`]: a quest can be
    /// locked for display yet technically completable when dispatched
    /// directly.
    pub fn is_available(&self, state: &PlayerState) -> bool {
        if state.has_completed_quest(&self.id) {
            return false;
        }
        if let Some(requires) = &self.requires {
            if let Some(level) = requires.level {
                if state.level < level {
                    return false;
                }
            }
            for id in &requires.completed_quest_ids {
                if !state.has_completed_quest(id) {
                    return false;
                }
            }
        }
        true
    }
}

/// Unlock predicate for an achievement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AchievementCondition {
    CashAtLeast(Decimal),
    AnyInvestment,
    /// Debt cleared while still holding cash, so "broke but debt-free"
    /// does not count.
    DebtFree,
    NetWorthAtLeast(Decimal),
}

impl AchievementCondition {
    /// Whether the achievement should be unlocked for the given state.
    pub fn is_unlocked(&self, state: &PlayerState) -> bool {
        match self {
            AchievementCondition::CashAtLeast(amount) => state.cash >= *amount,
            AchievementCondition::AnyInvestment => !state.investments.is_empty(),
            AchievementCondition::DebtFree => {
                state.debt <= Decimal::ZERO && state.cash > Decimal::ZERO
            }
            AchievementCondition::NetWorthAtLeast(amount) => state.net_worth >= *amount,
        }
    }
}

/// An immutable achievement catalog entry. The icon is a symbolic key; the
/// presentation layer resolves it to a glyph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AchievementDef {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub condition: AchievementCondition,
}

/// Partial-state change set produced by an event choice.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateChanges {
    pub cash: Option<Decimal>,
    pub debt: Option<Decimal>,
    pub monthly_income: Option<Decimal>,
    pub monthly_expenses: Option<Decimal>,
    pub investments: Option<Vec<Investment>>,
}

/// Outcome of one event choice, as data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventEffect {
    NoChange,
    /// Add to cash (negative deltas may drive cash below zero).
    CashDelta(Decimal),
    /// Add to cash, clamping the result at zero.
    CashDeltaClamped(Decimal),
    /// Pay `cost` (clamped at zero); with `failure_chance` the fix fails and
    /// `failure_debt` is added to debt.
    RiskyCashFix {
        cost: Decimal,
        failure_chance: f64,
        failure_debt: Decimal,
    },
    /// Multiply every investment of `kind` by `factor`, floored at zero.
    ScaleInvestments { kind: InvestmentKind, factor: Decimal },
    /// Sell `portion` of every investment of `kind` at `price_factor` of
    /// face value; positions left at or below `min_remaining` are dropped.
    SellPortionOfKind {
        kind: InvestmentKind,
        portion: Decimal,
        price_factor: Decimal,
        min_remaining: Decimal,
    },
    /// Shift the monthly income/expense baselines.
    AdjustIncomeExpenses {
        income_delta: Decimal,
        expenses_delta: Decimal,
    },
}

impl EventEffect {
    /// Evaluate the effect against the given state.
    ///
    /// `RiskyCashFix` draws from the supplied RNG; every other variant is
    /// deterministic.
    pub fn apply<R: Rng>(&self, state: &PlayerState, rng: &mut R) -> StateChanges {
        match self {
            EventEffect::NoChange => StateChanges::default(),
            EventEffect::CashDelta(delta) => StateChanges {
                cash: Some(state.cash + *delta),
                ..StateChanges::default()
            },
            EventEffect::CashDeltaClamped(delta) => StateChanges {
                cash: Some((state.cash + *delta).max(Decimal::ZERO)),
                ..StateChanges::default()
            },
            EventEffect::RiskyCashFix {
                cost,
                failure_chance,
                failure_debt,
            } => {
                let mut changes = StateChanges {
                    cash: Some((state.cash - *cost).max(Decimal::ZERO)),
                    ..StateChanges::default()
                };
                if rng.gen::<f64>() < *failure_chance {
                    changes.debt = Some(state.debt + *failure_debt);
                }
                changes
            }
            EventEffect::ScaleInvestments { kind, factor } => {
                let investments = state
                    .investments
                    .iter()
                    .map(|inv| {
                        let mut inv = inv.clone();
                        if inv.kind == *kind {
                            inv.value = (inv.value * *factor).max(Decimal::ZERO);
                        }
                        inv
                    })
                    .collect();
                StateChanges {
                    investments: Some(investments),
                    ..StateChanges::default()
                }
            }
            EventEffect::SellPortionOfKind {
                kind,
                portion,
                price_factor,
                min_remaining,
            } => {
                let mut proceeds = Decimal::ZERO;
                let mut kept = Vec::with_capacity(state.investments.len());
                for inv in &state.investments {
                    if inv.kind != *kind {
                        kept.push(inv.clone());
                        continue;
                    }
                    let sold = inv.value * *portion;
                    proceeds += sold * *price_factor;
                    let remaining = inv.value - sold;
                    if remaining > *min_remaining {
                        let mut inv = inv.clone();
                        inv.value = remaining;
                        kept.push(inv);
                    }
                }
                StateChanges {
                    cash: Some(state.cash + proceeds),
                    investments: Some(kept),
                    ..StateChanges::default()
                }
            }
            EventEffect::AdjustIncomeExpenses {
                income_delta,
                expenses_delta,
            } => StateChanges {
                monthly_income: Some(state.monthly_income + *income_delta),
                monthly_expenses: Some(state.monthly_expenses + *expenses_delta),
                ..StateChanges::default()
            },
        }
    }
}

/// One selectable response to a random event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventChoice {
    pub text: String,
    pub effect: EventEffect,
}

/// An immutable random-event catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomEventDef {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Probability of firing in a given month, in (0, 1].
    pub chance: f64,
    pub icon: String,
    pub choices: Vec<EventChoice>,
}

/// The three progression tables, owned together so the reducer and session
/// receive one explicit handle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Catalogs {
    pub quests: Vec<QuestDef>,
    pub achievements: Vec<AchievementDef>,
    pub events: Vec<RandomEventDef>,
}

impl Catalogs {
    /// The base game content.
    pub fn base() -> Self {
        Self {
            quests: base_quests(),
            achievements: base_achievements(),
            events: base_random_events(),
        }
    }

    /// Look up a quest by id.
    pub fn quest(&self, id: &str) -> Option<&QuestDef> {
        self.quests.iter().find(|q| q.id == id)
    }

    /// Look up a random event by id.
    pub fn event(&self, id: &str) -> Option<&RandomEventDef> {
        self.events.iter().find(|e| e.id == id)
    }
}

/// The base quest table.
pub fn base_quests() -> Vec<QuestDef> {
    vec![
        QuestDef {
            id: "q1_save_100".to_string(),
            title: "First Savings Goal".to_string(),
            description: "Save up $100 in your cash reserves. A small step for a big future!"
                .to_string(),
            reward: QuestReward {
                experience: 50.0,
                cash: Some(Decimal::new(10, 0)),
            },
            requires: None,
            goal: QuestGoal::CashAtLeast(Decimal::new(100, 0)),
            on_complete: None,
        },
        QuestDef {
            id: "q2_emergency_fund".to_string(),
            title: "Emergency Fund Starter".to_string(),
            description: "Build an emergency fund of at least $500. Be prepared for the unexpected."
                .to_string(),
            reward: QuestReward {
                experience: 100.0,
                cash: Some(Decimal::new(50, 0)),
            },
            requires: Some(QuestRequirement {
                level: None,
                completed_quest_ids: vec!["q1_save_100".to_string()],
            }),
            goal: QuestGoal::CashAtLeast(Decimal::new(500, 0)),
            on_complete: None,
        },
        QuestDef {
            id: "q3_first_investment".to_string(),
            title: "My First Stock".to_string(),
            description: "Learn about investing and buy your first stock (any amount)."
                .to_string(),
            reward: QuestReward {
                experience: 150.0,
                cash: None,
            },
            requires: Some(QuestRequirement {
                level: Some(2),
                completed_quest_ids: vec!["q2_emergency_fund".to_string()],
            }),
            goal: QuestGoal::HoldsInvestmentKind(InvestmentKind::Stocks),
            on_complete: None,
        },
        QuestDef {
            id: "q4_reduce_expenses".to_string(),
            title: "Expense Optimizer".to_string(),
            description: "Reduce your monthly expenses by $50 compared to the start of the game."
                .to_string(),
            reward: QuestReward {
                experience: 75.0,
                cash: None,
            },
            requires: None,
            goal: QuestGoal::MonthlyExpensesBelow(Decimal::new(450, 0)),
            on_complete: None,
        },
        QuestDef {
            id: "q5_reach_level_3".to_string(),
            title: "Level Up!".to_string(),
            description: "Gain enough experience to reach Level 3.".to_string(),
            reward: QuestReward {
                experience: 200.0,
                cash: Some(Decimal::new(100, 0)),
            },
            requires: None,
            goal: QuestGoal::LevelAtLeast(3),
            on_complete: None,
        },
    ]
}

/// The base achievement table.
pub fn base_achievements() -> Vec<AchievementDef> {
    vec![
        AchievementDef {
            id: "first_1k_cash".to_string(),
            title: "Pocket Money Pro".to_string(),
            description: "Accumulate $1,000 in cash.".to_string(),
            icon: "dollar-sign".to_string(),
            condition: AchievementCondition::CashAtLeast(Decimal::new(1000, 0)),
        },
        AchievementDef {
            id: "first_investment".to_string(),
            title: "Budding Investor".to_string(),
            description: "Make your first investment.".to_string(),
            icon: "trending-up".to_string(),
            condition: AchievementCondition::AnyInvestment,
        },
        AchievementDef {
            id: "debt_free".to_string(),
            title: "Debt Demolisher".to_string(),
            description: "Become completely debt-free.".to_string(),
            icon: "shield-check".to_string(),
            condition: AchievementCondition::DebtFree,
        },
        AchievementDef {
            id: "net_worth_10k".to_string(),
            title: "Junior Tycoon".to_string(),
            description: "Reach a net worth of $10,000.".to_string(),
            icon: "landmark".to_string(),
            condition: AchievementCondition::NetWorthAtLeast(Decimal::new(10_000, 0)),
        },
        AchievementDef {
            id: "net_worth_100k".to_string(),
            title: "Financial Guru".to_string(),
            description: "Reach a net worth of $100,000.".to_string(),
            icon: "crown".to_string(),
            condition: AchievementCondition::NetWorthAtLeast(Decimal::new(100_000, 0)),
        },
    ]
}

/// The base random-event table. Total probability mass is 0.33, so most
/// months pass without an event.
pub fn base_random_events() -> Vec<RandomEventDef> {
    vec![
        RandomEventDef {
            id: "event_car_repair".to_string(),
            title: "Unexpected Car Repair".to_string(),
            description: "Your trusty old car suddenly needs a significant repair.".to_string(),
            chance: 0.1,
            icon: "alert-triangle".to_string(),
            choices: vec![
                EventChoice {
                    text: "Pay $300 for the repair".to_string(),
                    effect: EventEffect::CashDeltaClamped(Decimal::new(-300, 0)),
                },
                EventChoice {
                    text: "Try a cheaper fix for $100 (50% chance of further issues)".to_string(),
                    effect: EventEffect::RiskyCashFix {
                        cost: Decimal::new(100, 0),
                        failure_chance: 0.5,
                        failure_debt: Decimal::new(50, 0),
                    },
                },
            ],
        },
        RandomEventDef {
            id: "event_birthday_gift".to_string(),
            title: "Birthday Windfall!".to_string(),
            description: "You received a cash gift for your birthday.".to_string(),
            chance: 0.05,
            icon: "gift".to_string(),
            choices: vec![EventChoice {
                text: "Receive $100".to_string(),
                effect: EventEffect::CashDelta(Decimal::new(100, 0)),
            }],
        },
        RandomEventDef {
            id: "event_stock_market_dip".to_string(),
            title: "Stock Market Correction".to_string(),
            description: "The stock market experiences a temporary dip. Your investments might be affected."
                .to_string(),
            chance: 0.08,
            icon: "trending-down".to_string(),
            choices: vec![
                EventChoice {
                    text: "Hold onto investments".to_string(),
                    effect: EventEffect::ScaleInvestments {
                        kind: InvestmentKind::Stocks,
                        factor: Decimal::new(9, 1),
                    },
                },
                EventChoice {
                    text: "Sell some stocks to cut losses (20% of stock value)".to_string(),
                    effect: EventEffect::SellPortionOfKind {
                        kind: InvestmentKind::Stocks,
                        portion: Decimal::new(2, 1),
                        price_factor: Decimal::new(9, 1),
                        min_remaining: Decimal::ONE,
                    },
                },
            ],
        },
        RandomEventDef {
            id: "event_job_opportunity".to_string(),
            title: "New Job Offer!".to_string(),
            description: "A recruiter contacts you with a potential new job with higher pay but more hours."
                .to_string(),
            chance: 0.03,
            icon: "briefcase".to_string(),
            choices: vec![
                EventChoice {
                    text: "Accept (+$200/month income, -$50/month effective free time/higher expenses)"
                        .to_string(),
                    effect: EventEffect::AdjustIncomeExpenses {
                        income_delta: Decimal::new(200, 0),
                        expenses_delta: Decimal::new(50, 0),
                    },
                },
                EventChoice {
                    text: "Decline, stay with current job.".to_string(),
                    effect: EventEffect::NoChange,
                },
            ],
        },
        RandomEventDef {
            id: "event_market_boom".to_string(),
            title: "Market Boom!".to_string(),
            description: "The stock market is surging! Your investments are doing great."
                .to_string(),
            chance: 0.07,
            icon: "trending-up".to_string(),
            choices: vec![EventChoice {
                text: "Celebrate!".to_string(),
                effect: EventEffect::ScaleInvestments {
                    kind: InvestmentKind::Stocks,
                    factor: Decimal::new(115, 2),
                },
            }],
        },
    ]
}

/// Quests currently visible to the player.
pub fn available_quests<'a>(quests: &'a [QuestDef], state: &PlayerState) -> Vec<&'a QuestDef> {
    quests.iter().filter(|q| q.is_available(state)).collect()
}

/// Ids of achievements that are satisfied now but not yet recorded.
///
/// Idempotent: rescanning after the ids are appended yields nothing new.
pub fn newly_unlocked_achievements(
    achievements: &[AchievementDef],
    state: &PlayerState,
) -> Vec<String> {
    achievements
        .iter()
        .filter(|a| !state.has_unlocked_achievement(&a.id) && a.condition.is_unlocked(state))
        .map(|a| a.id.clone())
        .collect()
}

/// Roll for this month's random event.
///
/// Draws one uniform value in [0, 1) and walks the catalog in declared
/// order, accumulating chance; the first entry whose cumulative probability
/// exceeds the draw is selected. When the total mass is under 1 and the draw
/// lands beyond it, no event fires.
pub fn roll_event<'a, R: Rng>(events: &'a [RandomEventDef], rng: &mut R) -> Option<&'a RandomEventDef> {
    let roll: f64 = rng.gen();
    let mut cumulative = 0.0;
    for event in events {
        cumulative += event.chance;
        if roll < cumulative {
            return Some(event);
        }
    }
    None
}
