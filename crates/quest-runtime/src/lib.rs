#![deny(warnings)]

//! Decision and forecast engine for Money Quest.
//!
//! Every operation takes the current state by reference and returns a new
//! one; the caller decides what to persist. Randomness (event ids) is always
//! injected.

pub mod catalog;

pub use catalog::{CatalogError, EncounterCatalog};

use chrono::{DateTime, Utc};
use quest_core::{
    format_money, new_event_id, Choice, ChoiceDeltas, ChoiceEvent, Encounter, EngineState,
    GameConfig, MoneyState, Portfolio, Reflection, Settings, UpcomingEvent, WeekState,
    LAST_DAY_INDEX, SAVE_VERSION,
};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Days covered by a try-it-first preview.
pub const PREVIEW_DAYS: u8 = 3;

/// Weeks remaining to the goal and which upcoming costs are affordable now.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalForecast {
    pub goal_eta_weeks: u32,
    pub can_afford_event_ids: Vec<String>,
}

/// Forecast as if the week's balance were `balance`.
fn project(state: &EngineState, balance: Decimal) -> GoalForecast {
    let week = &state.week;
    let remaining = (state.settings.goal.cost - week.goal_saved).max(Decimal::ZERO);
    let future_costs: Decimal = week
        .upcoming_events
        .iter()
        .filter(|e| e.day_index >= week.day_index)
        .map(|e| e.cost)
        .sum();
    let expected = (balance - future_costs).max(Decimal::ZERO);
    let rate = if expected > Decimal::ZERO {
        expected
    } else {
        state.settings.weekly_allowance / Decimal::TWO
    }
    .max(Decimal::ONE);

    let goal_eta_weeks = if remaining.is_zero() {
        0
    } else {
        (remaining / rate).ceil().to_u32().unwrap_or(u32::MAX)
    };
    let can_afford_event_ids = week
        .upcoming_events
        .iter()
        .filter(|e| e.cost <= balance)
        .map(|e| e.id.clone())
        .collect();
    GoalForecast {
        goal_eta_weeks,
        can_afford_event_ids,
    }
}

/// Estimate weeks to the goal from the current week.
pub fn forecast(state: &EngineState) -> GoalForecast {
    project(state, state.week.balance)
}

fn effective_cost(encounter: &Encounter, choice: Choice) -> Decimal {
    match choice {
        Choice::Buy => encounter.cost,
        Choice::Skip => Decimal::ZERO,
    }
}

fn weeks(n: u32) -> &'static str {
    if n == 1 {
        "week"
    } else {
        "weeks"
    }
}

/// Narrate the effect of a choice without applying it.
///
/// Always one line for the immediate effect and one for the goal outlook; a
/// purchase that makes upcoming costs unaffordable adds a third line naming them.
pub fn explain_impact(state: &EngineState, encounter: &Encounter, choice: Choice) -> Vec<String> {
    let balance = state.week.balance;
    let after_balance = (balance - effective_cost(encounter, choice)).max(Decimal::ZERO);
    let spent = balance - after_balance;
    let mut notes = Vec::with_capacity(3);

    notes.push(match choice {
        Choice::Buy if spent < encounter.cost => format!(
            "You spend {} on {} (price {}).",
            format_money(spent),
            encounter.title,
            format_money(encounter.cost)
        ),
        Choice::Buy => format!("You spend {} on {}.", format_money(spent), encounter.title),
        Choice::Skip => format!(
            "You skip {}. Your balance is unchanged at {}.",
            encounter.title,
            format_money(balance)
        ),
    });

    let after = project(state, after_balance);
    notes.push(match after.goal_eta_weeks {
        0 => format!("You've already reached your {} goal!", state.settings.goal.label),
        n => format!(
            "Your {} goal is about {} {} away.",
            state.settings.goal.label,
            n,
            weeks(n)
        ),
    });

    if choice == Choice::Buy {
        let before = forecast(state);
        let lost: Vec<String> = state
            .week
            .upcoming_events
            .iter()
            .filter(|e| {
                before.can_afford_event_ids.contains(&e.id)
                    && !after.can_afford_event_ids.contains(&e.id)
            })
            .map(|e| format!("{} ({})", e.title, format_money(e.cost)))
            .collect();
        if !lost.is_empty() {
            notes.push(format!(
                "After this you can't afford: {}.",
                lost.join(", ")
            ));
        }
    }
    notes
}

/// Result of applying a decision to the weekly state.
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionOutcome {
    pub next_state: EngineState,
    pub deltas: ChoiceDeltas,
    pub notes: Vec<String>,
}

/// Apply a buy/skip decision to the weekly state.
///
/// Spending floors the balance at zero instead of failing; whatever the
/// balance decreased by counts toward the goal. The day advances (capped at
/// the last day) and one event is appended to history.
pub fn simulate_decision<R: Rng>(
    state: &EngineState,
    encounter: &Encounter,
    choice: Choice,
    rng: &mut R,
) -> DecisionOutcome {
    let week = &state.week;
    let next_balance = (week.balance - effective_cost(encounter, choice)).max(Decimal::ZERO);
    let spent = week.balance - next_balance;
    let notes = explain_impact(state, encounter, choice);

    let mut next_state = state.clone();
    let next_week = &mut next_state.week;
    next_week.balance = next_balance;
    next_week.goal_saved = (week.goal_saved + spent).max(Decimal::ZERO);
    next_week.day_index = week.day_index.saturating_add(1).min(LAST_DAY_INDEX);
    next_week.unlocked_insights.insert(encounter.id.clone());

    let after = forecast(&next_state);
    let deltas = ChoiceDeltas {
        balance_after: next_balance,
        goal_eta_weeks: Some(after.goal_eta_weeks),
        notes: notes.clone(),
    };
    next_state.week.history.push(ChoiceEvent {
        id: new_event_id(rng),
        encounter_id: encounter.id.clone(),
        day_index: Some(week.day_index),
        choice,
        cost: (choice == Choice::Buy).then_some(spent),
        category: encounter.category,
        reflection: None,
        deltas: deltas.clone(),
    });
    debug!(
        encounter = %encounter.id,
        ?choice,
        balance = %next_balance,
        eta_weeks = after.goal_eta_weeks,
        "decision applied"
    );
    DecisionOutcome {
        next_state,
        deltas,
        notes,
    }
}

/// One day of a try-it-first preview.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewDay {
    pub day_index: u8,
    pub balance: Decimal,
    pub notes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Preview {
    pub days: Vec<PreviewDay>,
    pub summary: String,
}

/// Show the next few days as if the purchase had happened.
///
/// The balance is the same post-purchase figure on every day; costs listed for
/// a day are potential, not deducted.
pub fn try_it_first_preview(state: &EngineState, encounter: &Encounter) -> Preview {
    let week = &state.week;
    let balance = (week.balance - encounter.cost).max(Decimal::ZERO);
    let days = (0..PREVIEW_DAYS)
        .map(|offset| {
            let day_index = week.day_index.saturating_add(offset).min(LAST_DAY_INDEX);
            let mut notes: Vec<String> = week
                .upcoming_events
                .iter()
                .filter(|e| e.day_index == day_index)
                .map(|e| format!("Potential: {} ({})", e.title, format_money(e.cost)))
                .collect();
            if notes.is_empty() {
                notes.push("No planned costs".to_string());
            }
            PreviewDay {
                day_index,
                balance,
                notes,
            }
        })
        .collect();
    let summary = format!(
        "If you buy {} for {}, you'll have {} over the next {} days.",
        encounter.title,
        format_money(encounter.cost),
        format_money(balance),
        PREVIEW_DAYS
    );
    Preview { days, summary }
}

/// Errors from applying a choice to the cash model.
#[derive(Debug, Error, PartialEq)]
pub enum ChoiceError {
    #[error("not enough cash for {encounter}: {available} available, {cost} needed")]
    InsufficientCash {
        encounter: String,
        available: Decimal,
        cost: Decimal,
    },
}

/// Apply a buy/skip decision to the cash model.
///
/// A purchase costing more than the cash on hand is rejected.
pub fn apply_choice<R: Rng>(
    money: &MoneyState,
    encounter: &Encounter,
    choice: Choice,
    reflection: Option<Reflection>,
    rng: &mut R,
) -> Result<MoneyState, ChoiceError> {
    let cost = effective_cost(encounter, choice);
    if cost > money.cash {
        let err = ChoiceError::InsufficientCash {
            encounter: encounter.id.clone(),
            available: money.cash,
            cost,
        };
        warn!(%err, "choice rejected");
        return Err(err);
    }
    let mut next = money.clone();
    next.cash -= cost;
    let note = match choice {
        Choice::Buy => format!(
            "You spent {} on {}.",
            format_money(cost),
            encounter.title
        ),
        Choice::Skip => format!(
            "You skipped {} and kept {}.",
            encounter.title,
            format_money(next.cash)
        ),
    };
    next.history.push(ChoiceEvent {
        id: new_event_id(rng),
        encounter_id: encounter.id.clone(),
        day_index: None,
        choice,
        cost: (choice == Choice::Buy).then_some(cost),
        category: encounter.category,
        reflection,
        deltas: ChoiceDeltas {
            balance_after: next.cash,
            goal_eta_weeks: None,
            notes: vec![note],
        },
    });
    debug!(encounter = %encounter.id, ?choice, cash = %next.cash, "choice recorded");
    Ok(next)
}

/// Fresh cash-model state for a new game or a restart.
pub fn new_money_state<R: Rng>(config: &GameConfig, rng: &mut R) -> MoneyState {
    info!(cash = %config.starting_cash, goal = %config.goal.label, "new money state");
    MoneyState {
        cash: config.starting_cash,
        bank_balance: Decimal::ZERO,
        portfolio: Portfolio::default(),
        market_trends: quest_econ::initial_trends(rng),
        goal: config.goal.clone(),
        history: Vec::new(),
        bank_history: Vec::new(),
    }
}

/// Fresh weekly state: day 0 with one week's allowance.
pub fn new_engine_state(
    config: &GameConfig,
    created_at: DateTime<Utc>,
    upcoming_events: Vec<UpcomingEvent>,
) -> EngineState {
    info!(allowance = %config.weekly_allowance, "new engine state");
    EngineState {
        version: SAVE_VERSION,
        created_at,
        settings: Settings {
            weekly_allowance: config.weekly_allowance,
            goal: config.goal.clone(),
            play_style: config.play_style,
        },
        week: WeekState {
            day_index: 0,
            balance: config.weekly_allowance,
            goal_saved: Decimal::ZERO,
            upcoming_events,
            history: Vec::new(),
            unlocked_insights: BTreeSet::new(),
        },
    }
}

/// Roll over to a new week: pay the allowance and schedule new costs.
///
/// History, goal progress and unlocked insights carry over.
pub fn start_next_week(state: &EngineState, upcoming_events: Vec<UpcomingEvent>) -> EngineState {
    let mut next = state.clone();
    next.week.day_index = 0;
    next.week.balance += state.settings.weekly_allowance;
    next.week.upcoming_events = upcoming_events;
    info!(balance = %next.week.balance, "started next week");
    next
}

/// Payday for the cash model. Non-positive amounts are ignored.
pub fn pay_allowance(money: &MoneyState, amount: Decimal) -> MoneyState {
    let mut next = money.clone();
    if amount > Decimal::ZERO {
        next.cash += amount;
        debug!(%amount, cash = %next.cash, "allowance paid");
    }
    next
}
