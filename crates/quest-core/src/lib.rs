#![deny(warnings)]

//! Core domain models and invariants for Money Quest.
//!
//! This crate defines the serializable player state shared by every engine
//! crate, in its two save schemas:
//! - [`MoneyState`]: cash, savings account, portfolio and market history.
//! - [`EngineState`]: the weekly-allowance model used by the overworld flow.
//!
//! Validation helpers guarantee the invariants loaded state must satisfy
//! before any engine operates on it.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Current version written into [`EngineState::version`].
pub const SAVE_VERSION: u32 = 1;

/// Last day of the week, zero-indexed (a 7-day week).
pub const LAST_DAY_INDEX: u8 = 6;

/// Lowest value any market price index may take.
pub const MIN_PRICE_INDEX: f64 = 10.0;

/// Asset classes a player can invest in. The set is closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentKind {
    Etf,
    Stocks,
    Bonds,
    Minerals,
    Crypto,
    RealEstate,
    Options,
}

/// Coarse risk label shown next to an investment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl InvestmentKind {
    /// Every investment kind, in display order.
    pub const ALL: [InvestmentKind; 7] = [
        InvestmentKind::Etf,
        InvestmentKind::Stocks,
        InvestmentKind::Bonds,
        InvestmentKind::Minerals,
        InvestmentKind::Crypto,
        InvestmentKind::RealEstate,
        InvestmentKind::Options,
    ];

    /// Storage key, identical to the serialized form.
    pub fn key(self) -> &'static str {
        match self {
            InvestmentKind::Etf => "etf",
            InvestmentKind::Stocks => "stocks",
            InvestmentKind::Bonds => "bonds",
            InvestmentKind::Minerals => "minerals",
            InvestmentKind::Crypto => "crypto",
            InvestmentKind::RealEstate => "real_estate",
            InvestmentKind::Options => "options",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InvestmentKind::Etf => "Index Fund (ETF)",
            InvestmentKind::Stocks => "Stocks",
            InvestmentKind::Bonds => "Bonds",
            InvestmentKind::Minerals => "Gold & Minerals",
            InvestmentKind::Crypto => "Crypto",
            InvestmentKind::RealEstate => "Real Estate",
            InvestmentKind::Options => "Options",
        }
    }

    pub fn risk(self) -> RiskLevel {
        match self {
            InvestmentKind::Bonds | InvestmentKind::RealEstate => RiskLevel::Low,
            InvestmentKind::Etf | InvestmentKind::Minerals => RiskLevel::Medium,
            InvestmentKind::Stocks => RiskLevel::High,
            InvestmentKind::Crypto | InvestmentKind::Options => RiskLevel::VeryHigh,
        }
    }
}

/// Dollar value held per investment kind. Always carries every kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Portfolio(BTreeMap<InvestmentKind, Decimal>);

impl Default for Portfolio {
    fn default() -> Self {
        Self(
            InvestmentKind::ALL
                .iter()
                .map(|k| (*k, Decimal::ZERO))
                .collect(),
        )
    }
}

impl Portfolio {
    pub fn value(&self, kind: InvestmentKind) -> Decimal {
        self.0.get(&kind).copied().unwrap_or(Decimal::ZERO)
    }

    /// Set the value of a holding, flooring at zero.
    pub fn set_value(&mut self, kind: InvestmentKind, value: Decimal) {
        self.0.insert(kind, value.max(Decimal::ZERO));
    }

    pub fn total(&self) -> Decimal {
        self.0.values().copied().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InvestmentKind, Decimal)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    fn missing_kind(&self) -> Option<InvestmentKind> {
        InvestmentKind::ALL
            .into_iter()
            .find(|k| !self.0.contains_key(k))
    }
}

/// Price-index history per investment kind, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketTrends(BTreeMap<InvestmentKind, Vec<f64>>);

impl MarketTrends {
    /// Build trends with one series per investment kind.
    pub fn from_fn(mut series: impl FnMut(InvestmentKind) -> Vec<f64>) -> Self {
        Self(
            InvestmentKind::ALL
                .into_iter()
                .map(|k| (k, series(k)))
                .collect(),
        )
    }

    pub fn series(&self, kind: InvestmentKind) -> &[f64] {
        self.0.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn latest(&self, kind: InvestmentKind) -> Option<f64> {
        self.series(kind).last().copied()
    }

    /// Series ready for charting; `None` while fewer than two points exist.
    pub fn chart(&self, kind: InvestmentKind) -> Option<&[f64]> {
        let s = self.series(kind);
        (s.len() >= 2).then_some(s)
    }

    /// Percent change from the oldest to the newest point in the window.
    pub fn change_pct(&self, kind: InvestmentKind) -> Option<f64> {
        let s = self.chart(kind)?;
        let first = *s.first()?;
        let last = *s.last()?;
        if first <= 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }

    fn missing_kind(&self) -> Option<InvestmentKind> {
        InvestmentKind::ALL
            .into_iter()
            .find(|k| !self.0.contains_key(k))
    }

    pub fn iter(&self) -> impl Iterator<Item = (InvestmentKind, &[f64])> + '_ {
        self.0.iter().map(|(k, v)| (*k, v.as_slice()))
    }
}

/// The single savings target a player works toward.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub label: String,
    /// Target amount in dollars (> 0).
    pub cost: Decimal,
}

impl Default for Goal {
    fn default() -> Self {
        Self {
            id: "goal-headphones".to_string(),
            label: "Headphones".to_string(),
            cost: Decimal::new(60, 0),
        }
    }
}

/// Player decision at an encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Buy,
    Skip,
}

/// What kind of purchase an encounter offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Need,
    Want,
    Social,
}

/// Player's answer to "was it worth it?" after a decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reflection {
    Yes,
    Unsure,
    No,
}

/// A location-triggered buy/skip decision point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub context: String,
    /// Price in dollars (>= 0).
    pub cost: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// Effect payload recorded with every decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceDeltas {
    pub balance_after: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_eta_weeks: Option<u32>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// One immutable buy/skip decision in a player's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceEvent {
    pub id: String,
    pub encounter_id: String,
    /// Day the decision was taken on (weekly schema only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_index: Option<u8>,
    pub choice: Choice,
    /// Price paid; present only for purchases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<Reflection>,
    pub deltas: ChoiceDeltas,
}

impl ChoiceEvent {
    pub fn is_buy(&self) -> bool {
        self.choice == Choice::Buy
    }
}

/// Direction of a savings-account movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankTxKind {
    Deposit,
    Withdraw,
    Interest,
}

/// One savings-account movement. `amount` is always positive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BankTxKind,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub balance_after: Decimal,
}

/// Financial state of one player at one point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyState {
    pub cash: Decimal,
    pub bank_balance: Decimal,
    #[serde(default)]
    pub portfolio: Portfolio,
    #[serde(default)]
    pub market_trends: MarketTrends,
    pub goal: Goal,
    #[serde(default)]
    pub history: Vec<ChoiceEvent>,
    #[serde(default)]
    pub bank_history: Vec<BankTransaction>,
}

impl MoneyState {
    pub fn invested_total(&self) -> Decimal {
        self.portfolio.total()
    }

    /// Cash, savings and investments combined.
    pub fn net_worth(&self) -> Decimal {
        self.cash + self.bank_balance + self.invested_total()
    }

    /// Money counted toward the goal: savings plus investments.
    pub fn goal_savings(&self) -> Decimal {
        self.bank_balance + self.invested_total()
    }

    /// Goal progress in percent, capped at 100.
    pub fn goal_progress_pct(&self) -> f64 {
        if self.goal.cost <= Decimal::ZERO {
            return 100.0;
        }
        let ratio = (self.goal_savings() / self.goal.cost)
            .to_f64()
            .unwrap_or(0.0);
        (ratio * 100.0).clamp(0.0, 100.0)
    }
}

/// How the player described their approach during onboarding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayStyle {
    Saver,
    #[default]
    Balanced,
    Spender,
}

/// Onboarding choices for the weekly schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub weekly_allowance: Decimal,
    pub goal: Goal,
    #[serde(default)]
    pub play_style: PlayStyle,
}

/// A cost scheduled later in the week.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEvent {
    pub id: String,
    pub title: String,
    pub day_index: u8,
    pub cost: Decimal,
}

/// Progress through the current week.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekState {
    pub day_index: u8,
    pub balance: Decimal,
    pub goal_saved: Decimal,
    #[serde(default)]
    pub upcoming_events: Vec<UpcomingEvent>,
    #[serde(default)]
    pub history: Vec<ChoiceEvent>,
    #[serde(default)]
    pub unlocked_insights: BTreeSet<String>,
}

/// The weekly-allowance save schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub settings: Settings,
    pub week: WeekState,
}

/// Parameters for starting a new game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub starting_cash: Decimal,
    pub weekly_allowance: Decimal,
    pub goal: Goal,
    pub play_style: PlayStyle,
    /// Seed for deterministic RNG.
    pub rng_seed: u64,
    /// Weekly savings-account interest in percent.
    pub interest_rate_pct: Decimal,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_cash: Decimal::new(20, 0),
            weekly_allowance: Decimal::new(20, 0),
            goal: Goal::default(),
            play_style: PlayStyle::default(),
            rng_seed: 42,
            interest_rate_pct: Decimal::new(2, 0),
        }
    }
}

/// Format a dollar amount for narration, e.g. `$12.50`.
pub fn format_money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

/// Generate a fresh event id from the injected random source.
pub fn new_event_id<R: Rng>(rng: &mut R) -> String {
    uuid::Builder::from_random_bytes(rng.gen())
        .into_uuid()
        .to_string()
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Money field must be non-negative.
    #[error("{0} must not be negative")]
    NegativeMoney(&'static str),
    /// Goal cost must be strictly positive.
    #[error("goal cost must be > 0")]
    NonPositiveGoal,
    /// Text field must not be blank.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    /// Portfolio or trends lack an investment kind.
    #[error("missing investment kind: {0}")]
    MissingInvestment(&'static str),
    /// Price index below floor or not finite.
    #[error("invalid price index {value} for {kind}")]
    InvalidPriceIndex { kind: &'static str, value: f64 },
    /// Day index past the end of the week.
    #[error("day index {0} is out of range [0, 6]")]
    DayOutOfRange(u8),
    /// Two history entries share an id.
    #[error("duplicate event id: {0}")]
    DuplicateEventId(String),
    /// Bank transactions carry strictly positive amounts.
    #[error("bank transaction {0} has a non-positive amount")]
    NonPositiveTransaction(String),
}

fn non_negative(value: Decimal, field: &'static str) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney(field));
    }
    Ok(())
}

/// Validate a savings goal.
pub fn validate_goal(goal: &Goal) -> Result<(), ValidationError> {
    if goal.id.trim().is_empty() {
        return Err(ValidationError::EmptyField("goal.id"));
    }
    if goal.cost <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveGoal);
    }
    Ok(())
}

/// Validate an encounter definition.
pub fn validate_encounter(e: &Encounter) -> Result<(), ValidationError> {
    if e.id.trim().is_empty() {
        return Err(ValidationError::EmptyField("encounter.id"));
    }
    non_negative(e.cost, "encounter.cost")
}

fn validate_history(history: &[ChoiceEvent]) -> Result<(), ValidationError> {
    let mut ids = BTreeSet::new();
    for ev in history {
        if !ids.insert(ev.id.as_str()) {
            return Err(ValidationError::DuplicateEventId(ev.id.clone()));
        }
        if let Some(cost) = ev.cost {
            non_negative(cost, "history.cost")?;
        }
        if let Some(day) = ev.day_index {
            if day > LAST_DAY_INDEX {
                return Err(ValidationError::DayOutOfRange(day));
            }
        }
    }
    Ok(())
}

/// Validate the rich money state, including portfolio and market history.
pub fn validate_money_state(m: &MoneyState) -> Result<(), ValidationError> {
    non_negative(m.cash, "cash")?;
    non_negative(m.bank_balance, "bankBalance")?;
    validate_goal(&m.goal)?;
    if let Some(kind) = m.portfolio.missing_kind() {
        return Err(ValidationError::MissingInvestment(kind.key()));
    }
    for (_, value) in m.portfolio.iter() {
        non_negative(value, "portfolio")?;
    }
    if let Some(kind) = m.market_trends.missing_kind() {
        return Err(ValidationError::MissingInvestment(kind.key()));
    }
    for (kind, series) in m.market_trends.iter() {
        if let Some(&bad) = series
            .iter()
            .find(|p| !p.is_finite() || **p < MIN_PRICE_INDEX)
        {
            return Err(ValidationError::InvalidPriceIndex {
                kind: kind.key(),
                value: bad,
            });
        }
    }
    validate_history(&m.history)?;
    let mut tx_ids = BTreeSet::new();
    for tx in &m.bank_history {
        if !tx_ids.insert(tx.id.as_str()) {
            return Err(ValidationError::DuplicateEventId(tx.id.clone()));
        }
        if tx.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveTransaction(tx.id.clone()));
        }
        non_negative(tx.balance_after, "bankHistory.balanceAfter")?;
    }
    Ok(())
}

/// Validate the weekly schema.
pub fn validate_engine_state(s: &EngineState) -> Result<(), ValidationError> {
    non_negative(s.settings.weekly_allowance, "settings.weeklyAllowance")?;
    validate_goal(&s.settings.goal)?;
    let w = &s.week;
    if w.day_index > LAST_DAY_INDEX {
        return Err(ValidationError::DayOutOfRange(w.day_index));
    }
    non_negative(w.balance, "week.balance")?;
    non_negative(w.goal_saved, "week.goalSaved")?;
    for ev in &w.upcoming_events {
        if ev.day_index > LAST_DAY_INDEX {
            return Err(ValidationError::DayOutOfRange(ev.day_index));
        }
        non_negative(ev.cost, "upcomingEvents.cost")?;
    }
    validate_history(&w.history)
}

/// Validate game configuration before a new game is created from it.
pub fn validate_config(c: &GameConfig) -> Result<(), ValidationError> {
    non_negative(c.starting_cash, "starting_cash")?;
    non_negative(c.weekly_allowance, "weekly_allowance")?;
    non_negative(c.interest_rate_pct, "interest_rate_pct")?;
    validate_goal(&c.goal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ts() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn money() -> MoneyState {
        MoneyState {
            cash: Decimal::new(20, 0),
            bank_balance: Decimal::new(15, 0),
            portfolio: Portfolio::default(),
            market_trends: MarketTrends::from_fn(|_| vec![100.0, 101.5]),
            goal: Goal::default(),
            history: vec![ChoiceEvent {
                id: "ev-1".to_string(),
                encounter_id: "arcade".to_string(),
                day_index: None,
                choice: Choice::Buy,
                cost: Some(Decimal::new(5, 0)),
                category: Some(Category::Want),
                reflection: Some(Reflection::Unsure),
                deltas: ChoiceDeltas {
                    balance_after: Decimal::new(15, 0),
                    goal_eta_weeks: None,
                    notes: vec![],
                },
            }],
            bank_history: vec![BankTransaction {
                id: "tx-1".to_string(),
                kind: BankTxKind::Deposit,
                amount: Decimal::new(15, 0),
                date: ts(),
                balance_after: Decimal::new(15, 0),
            }],
        }
    }

    #[test]
    fn money_state_roundtrip_keeps_shape() {
        let m = money();
        validate_money_state(&m).unwrap();
        let s = serde_json::to_string(&m).unwrap();
        assert!(s.contains("\"bankBalance\""));
        assert!(s.contains("\"real_estate\""));
        assert!(s.contains("\"type\":\"deposit\""));
        assert!(s.contains("\"encounterId\":\"arcade\""));
        let back: MoneyState = serde_json::from_str(&s).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn engine_state_roundtrip() {
        let st = EngineState {
            version: SAVE_VERSION,
            created_at: ts(),
            settings: Settings {
                weekly_allowance: Decimal::new(20, 0),
                goal: Goal::default(),
                play_style: PlayStyle::Saver,
            },
            week: WeekState {
                day_index: 2,
                balance: Decimal::new(1250, 2),
                goal_saved: Decimal::new(750, 2),
                upcoming_events: vec![UpcomingEvent {
                    id: "movie".to_string(),
                    title: "Movie night".to_string(),
                    day_index: 4,
                    cost: Decimal::new(3, 0),
                }],
                history: vec![],
                unlocked_insights: ["arcade".to_string()].into_iter().collect(),
            },
        };
        validate_engine_state(&st).unwrap();
        let s = serde_json::to_string_pretty(&st).unwrap();
        assert!(s.contains("\"weeklyAllowance\""));
        assert!(s.contains("\"playStyle\": \"saver\""));
        let back: EngineState = serde_json::from_str(&s).unwrap();
        assert_eq!(back, st);
    }

    #[test]
    fn portfolio_always_has_every_kind() {
        let mut p = Portfolio::default();
        assert_eq!(p.iter().count(), InvestmentKind::ALL.len());
        p.set_value(InvestmentKind::Crypto, Decimal::new(-5, 0));
        assert_eq!(p.value(InvestmentKind::Crypto), Decimal::ZERO);
        p.set_value(InvestmentKind::Bonds, Decimal::new(12, 0));
        assert_eq!(p.total(), Decimal::new(12, 0));
    }

    #[test]
    fn risk_levels_per_kind() {
        use InvestmentKind::*;
        let risks: Vec<_> = InvestmentKind::ALL.iter().map(|k| (k.key(), k.risk())).collect();
        assert_eq!(
            risks,
            vec![
                ("etf", RiskLevel::Medium),
                ("stocks", RiskLevel::High),
                ("bonds", RiskLevel::Low),
                ("minerals", RiskLevel::Medium),
                ("crypto", RiskLevel::VeryHigh),
                ("real_estate", RiskLevel::Low),
                ("options", RiskLevel::VeryHigh),
            ]
        );
        assert!(Bonds.risk() < Stocks.risk());
        assert!(Stocks.risk() < Options.risk());
        assert_eq!(serde_json::to_string(&RiskLevel::VeryHigh).unwrap(), "\"very_high\"");
    }

    #[test]
    fn trend_chart_waits_for_two_points() {
        let mut trends = MarketTrends::from_fn(|_| vec![100.0]);
        assert!(trends.chart(InvestmentKind::Etf).is_none());
        trends = MarketTrends::from_fn(|_| vec![100.0, 110.0]);
        assert_eq!(trends.chart(InvestmentKind::Etf).unwrap().len(), 2);
        let pct = trends.change_pct(InvestmentKind::Etf).unwrap();
        assert!((pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn validation_rejects_bad_state() {
        let mut m = money();
        m.cash = Decimal::new(-1, 0);
        assert_eq!(
            validate_money_state(&m),
            Err(ValidationError::NegativeMoney("cash"))
        );

        let mut m = money();
        m.market_trends = MarketTrends::from_fn(|_| vec![100.0, 9.5]);
        assert!(matches!(
            validate_money_state(&m),
            Err(ValidationError::InvalidPriceIndex { .. })
        ));

        let mut m = money();
        m.goal.cost = Decimal::ZERO;
        assert_eq!(
            validate_money_state(&m),
            Err(ValidationError::NonPositiveGoal)
        );

        let mut m = money();
        let dup = m.history[0].clone();
        m.history.push(dup);
        assert_eq!(
            validate_money_state(&m),
            Err(ValidationError::DuplicateEventId("ev-1".to_string()))
        );
    }

    #[test]
    fn missing_portfolio_key_is_rejected() {
        let json = serde_json::to_value(money()).unwrap();
        let mut obj = json.as_object().unwrap().clone();
        obj.insert("portfolio".to_string(), serde_json::json!({"etf": 1.0}));
        let m: MoneyState = serde_json::from_value(serde_json::Value::Object(obj)).unwrap();
        assert_eq!(
            validate_money_state(&m),
            Err(ValidationError::MissingInvestment("stocks"))
        );
    }

    #[test]
    fn goal_progress_counts_savings_and_investments() {
        let mut m = money();
        m.portfolio.set_value(InvestmentKind::Etf, Decimal::new(15, 0));
        assert_eq!(m.goal_savings(), Decimal::new(30, 0));
        assert!((m.goal_progress_pct() - 50.0).abs() < 1e-9);
        assert_eq!(m.net_worth(), Decimal::new(50, 0));
        m.bank_balance = Decimal::new(500, 0);
        assert_eq!(m.goal_progress_pct(), 100.0);
    }

    #[test]
    fn config_parses_partial_yaml() {
        let cfg: GameConfig = serde_yaml::from_str("rng_seed: 7\nstarting_cash: 12.5\n").unwrap();
        assert_eq!(cfg.rng_seed, 7);
        assert_eq!(cfg.starting_cash, Decimal::new(125, 1));
        assert_eq!(cfg.goal, Goal::default());
        validate_config(&cfg).unwrap();
    }

    #[test]
    fn event_ids_are_seeded() {
        let mut a = ChaCha8Rng::seed_from_u64(1);
        let mut b = ChaCha8Rng::seed_from_u64(1);
        let id = new_event_id(&mut a);
        assert_eq!(id, new_event_id(&mut b));
        assert_ne!(id, new_event_id(&mut a));
    }

    #[test]
    fn money_formats_with_cents() {
        assert_eq!(format_money(Decimal::new(12, 0)), "$12.00");
        assert_eq!(format_money(Decimal::new(1256, 3)), "$1.26");
    }

    proptest! {
        #[test]
        fn day_index_past_week_is_invalid(day in 7u8..=255) {
            let mut m = money();
            m.history[0].day_index = Some(day);
            prop_assert_eq!(validate_money_state(&m), Err(ValidationError::DayOutOfRange(day)));
        }

        #[test]
        fn progress_is_bounded(bank in 0i64..1_000_000, cost in 1i64..10_000) {
            let mut m = money();
            m.bank_balance = Decimal::new(bank, 2);
            m.goal.cost = Decimal::new(cost, 2);
            let pct = m.goal_progress_pct();
            prop_assert!((0.0..=100.0).contains(&pct));
        }
    }
}
