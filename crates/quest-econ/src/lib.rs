#![deny(warnings)]

//! Money movement for Money Quest: the investment market and the bank.
//!
//! This module provides:
//! - A random-walk market simulator with per-asset volatility and trend
//! - Portfolio revaluation proportional to price movement
//! - Bounded transfers between cash, savings and investments

use chrono::{DateTime, Utc};
use quest_core::{
    new_event_id, BankTransaction, BankTxKind, InvestmentKind, MarketTrends, MoneyState,
    MIN_PRICE_INDEX,
};
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

/// Maximum number of points kept per price series.
pub const TREND_WINDOW: usize = 50;
/// Points generated for a new game's trailing chart.
pub const INITIAL_HISTORY_POINTS: usize = 20;
/// Starting value of every price index.
pub const INITIAL_PRICE_INDEX: f64 = 100.0;

/// Random-walk parameters for one asset class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssetParams {
    /// Width of the uniform per-tick move, in percent.
    pub volatility: f64,
    /// Drift added to every tick, in percent.
    pub trend: f64,
}

/// Fixed market parameters per investment kind.
pub fn asset_params(kind: InvestmentKind) -> AssetParams {
    let (volatility, trend) = match kind {
        InvestmentKind::Etf => (1.0, 0.03),
        InvestmentKind::Stocks => (2.0, 0.02),
        InvestmentKind::Bonds => (0.5, 0.01),
        InvestmentKind::Minerals => (1.5, 0.01),
        InvestmentKind::Crypto => (5.0, 0.0),
        InvestmentKind::RealEstate => (0.8, 0.015),
        // Options lose money on average.
        InvestmentKind::Options => (8.0, -0.1),
    };
    AssetParams { volatility, trend }
}

/// Advance one price by a single tick, never below [`MIN_PRICE_INDEX`].
///
/// change% = (u - 0.5) * volatility + trend, with u uniform in [0, 1).
pub fn next_price<R: Rng>(prev: f64, params: AssetParams, rng: &mut R) -> f64 {
    let u: f64 = rng.gen();
    let change_pct = (u - 0.5) * params.volatility + params.trend;
    (prev * (1.0 + change_pct / 100.0)).max(MIN_PRICE_INDEX)
}

/// Generate `points` prices starting at [`INITIAL_PRICE_INDEX`].
pub fn random_walk<R: Rng>(kind: InvestmentKind, points: usize, rng: &mut R) -> Vec<f64> {
    let params = asset_params(kind);
    let mut series = Vec::with_capacity(points);
    let mut price = INITIAL_PRICE_INDEX;
    for i in 0..points {
        if i > 0 {
            price = next_price(price, params, rng);
        }
        series.push(price);
    }
    series
}

/// Trailing history for a new game, one walk per investment kind.
pub fn initial_trends<R: Rng>(rng: &mut R) -> MarketTrends {
    MarketTrends::from_fn(|kind| random_walk(kind, INITIAL_HISTORY_POINTS, rng))
}

/// Rescale a holding by the price ratio, rounded to cents.
///
/// An empty holding stays empty whatever the price does.
pub fn revalue(value: Decimal, prev_price: f64, next_price: f64) -> Decimal {
    if value <= Decimal::ZERO || prev_price <= 0.0 {
        return value.max(Decimal::ZERO);
    }
    let ratio = Decimal::from_f64(next_price / prev_price).unwrap_or(Decimal::ONE);
    (value * ratio).round_dp(2).max(Decimal::ZERO)
}

/// Advance every price series by one tick and revalue the portfolio.
pub fn simulate_market_step<R: Rng>(state: &MoneyState, rng: &mut R) -> MoneyState {
    let mut portfolio = state.portfolio.clone();
    let market_trends = MarketTrends::from_fn(|kind| {
        let series = state.market_trends.series(kind);
        let prev = series.last().copied().unwrap_or(INITIAL_PRICE_INDEX);
        let price = next_price(prev, asset_params(kind), rng);
        portfolio.set_value(kind, revalue(state.portfolio.value(kind), prev, price));

        let mut next = Vec::with_capacity(TREND_WINDOW + 1);
        next.extend_from_slice(series);
        next.push(price);
        if next.len() > TREND_WINDOW {
            let excess = next.len() - TREND_WINDOW;
            next.drain(..excess);
        }
        next
    });
    debug!(
        before = %state.invested_total(),
        after = %portfolio.total(),
        "market tick"
    );
    MoneyState {
        portfolio,
        market_trends,
        ..state.clone()
    }
}

/// Errors produced by guarded transfers. The caller's state is left as-is.
#[derive(Debug, Error, PartialEq)]
pub enum TransferError {
    /// Transfers must move a strictly positive amount.
    #[error("transfer amount must be > 0, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("insufficient cash: {available} available, {requested} requested")]
    InsufficientCash {
        available: Decimal,
        requested: Decimal,
    },
    #[error("insufficient savings: {available} available, {requested} requested")]
    InsufficientSavings {
        available: Decimal,
        requested: Decimal,
    },
    #[error("insufficient {kind} holding: {available} available, {requested} requested")]
    InsufficientHolding {
        kind: &'static str,
        available: Decimal,
        requested: Decimal,
    },
}

fn check_amount(amount: Decimal) -> Result<(), TransferError> {
    if amount <= Decimal::ZERO {
        return Err(TransferError::NonPositiveAmount(amount));
    }
    Ok(())
}

fn rejected(op: &str, err: TransferError) -> TransferError {
    warn!(op, %err, "transfer rejected");
    err
}

fn bank_entry<R: Rng>(
    kind: BankTxKind,
    amount: Decimal,
    balance_after: Decimal,
    date: DateTime<Utc>,
    rng: &mut R,
) -> BankTransaction {
    BankTransaction {
        id: new_event_id(rng),
        kind,
        amount,
        date,
        balance_after,
    }
}

/// Move cash into the savings account. Requires `0 < amount <= cash`.
pub fn deposit<R: Rng>(
    state: &MoneyState,
    amount: Decimal,
    date: DateTime<Utc>,
    rng: &mut R,
) -> Result<MoneyState, TransferError> {
    check_amount(amount).map_err(|e| rejected("deposit", e))?;
    if amount > state.cash {
        return Err(rejected(
            "deposit",
            TransferError::InsufficientCash {
                available: state.cash,
                requested: amount,
            },
        ));
    }
    let mut next = state.clone();
    next.cash -= amount;
    next.bank_balance += amount;
    next.bank_history.push(bank_entry(
        BankTxKind::Deposit,
        amount,
        next.bank_balance,
        date,
        rng,
    ));
    debug!(%amount, bank = %next.bank_balance, "deposit");
    Ok(next)
}

/// Move savings back to cash. Requires `0 < amount <= bank balance`.
pub fn withdraw<R: Rng>(
    state: &MoneyState,
    amount: Decimal,
    date: DateTime<Utc>,
    rng: &mut R,
) -> Result<MoneyState, TransferError> {
    check_amount(amount).map_err(|e| rejected("withdraw", e))?;
    if amount > state.bank_balance {
        return Err(rejected(
            "withdraw",
            TransferError::InsufficientSavings {
                available: state.bank_balance,
                requested: amount,
            },
        ));
    }
    let mut next = state.clone();
    next.bank_balance -= amount;
    next.cash += amount;
    next.bank_history.push(bank_entry(
        BankTxKind::Withdraw,
        amount,
        next.bank_balance,
        date,
        rng,
    ));
    debug!(%amount, bank = %next.bank_balance, "withdraw");
    Ok(next)
}

/// Credit one period of interest on the savings balance.
///
/// Interest rounds to cents; a zero credit records nothing.
pub fn accrue_interest<R: Rng>(
    state: &MoneyState,
    rate_pct: Decimal,
    date: DateTime<Utc>,
    rng: &mut R,
) -> MoneyState {
    let amount = (state.bank_balance * rate_pct / Decimal::ONE_HUNDRED).round_dp(2);
    if amount <= Decimal::ZERO {
        return state.clone();
    }
    let mut next = state.clone();
    next.bank_balance += amount;
    next.bank_history.push(bank_entry(
        BankTxKind::Interest,
        amount,
        next.bank_balance,
        date,
        rng,
    ));
    debug!(%amount, bank = %next.bank_balance, "interest");
    next
}

/// Buy into an investment with cash. Requires `0 < amount <= cash`.
pub fn invest(
    state: &MoneyState,
    kind: InvestmentKind,
    amount: Decimal,
) -> Result<MoneyState, TransferError> {
    check_amount(amount).map_err(|e| rejected("invest", e))?;
    if amount > state.cash {
        return Err(rejected(
            "invest",
            TransferError::InsufficientCash {
                available: state.cash,
                requested: amount,
            },
        ));
    }
    let mut next = state.clone();
    next.cash -= amount;
    let held = next.portfolio.value(kind);
    next.portfolio.set_value(kind, held + amount);
    debug!(kind = kind.key(), %amount, "invest");
    Ok(next)
}

/// Sell part of a holding back to cash. Requires `0 < amount <= holding`.
pub fn sell(
    state: &MoneyState,
    kind: InvestmentKind,
    amount: Decimal,
) -> Result<MoneyState, TransferError> {
    check_amount(amount).map_err(|e| rejected("sell", e))?;
    let held = state.portfolio.value(kind);
    if amount > held {
        return Err(rejected(
            "sell",
            TransferError::InsufficientHolding {
                kind: kind.key(),
                available: held,
                requested: amount,
            },
        ));
    }
    let mut next = state.clone();
    next.portfolio.set_value(kind, held - amount);
    next.cash += amount;
    debug!(kind = kind.key(), %amount, "sell");
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use quest_core::{Goal, Portfolio};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn date() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn state(cash: i64, bank: i64) -> MoneyState {
        MoneyState {
            cash: Decimal::new(cash, 0),
            bank_balance: Decimal::new(bank, 0),
            portfolio: Portfolio::default(),
            market_trends: MarketTrends::from_fn(|_| vec![100.0, 100.0]),
            goal: Goal::default(),
            history: vec![],
            bank_history: vec![],
        }
    }

    #[test]
    fn tick_matches_formula_for_seed() {
        let s = state(10, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let next = simulate_market_step(&s, &mut rng);

        let mut expected_rng = ChaCha8Rng::seed_from_u64(7);
        for kind in InvestmentKind::ALL {
            let p = asset_params(kind);
            let u: f64 = expected_rng.gen();
            let expected = 100.0 * (1.0 + ((u - 0.5) * p.volatility + p.trend) / 100.0);
            assert_eq!(next.market_trends.latest(kind), Some(expected.max(10.0)));
            assert_eq!(next.market_trends.series(kind).len(), 3);
        }
    }

    #[test]
    fn same_seed_same_market() {
        let s = state(10, 0);
        let a = simulate_market_step(&s, &mut ChaCha8Rng::seed_from_u64(3));
        let b = simulate_market_step(&s, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn initial_history_has_twenty_points_from_one_hundred() {
        let trends = initial_trends(&mut ChaCha8Rng::seed_from_u64(1));
        for kind in InvestmentKind::ALL {
            let s = trends.series(kind);
            assert_eq!(s.len(), INITIAL_HISTORY_POINTS);
            assert_eq!(s[0], INITIAL_PRICE_INDEX);
            assert!(s.iter().all(|p| *p >= MIN_PRICE_INDEX));
        }
    }

    #[test]
    fn window_is_capped() {
        let mut s = state(0, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..(TREND_WINDOW + 15) {
            s = simulate_market_step(&s, &mut rng);
        }
        for kind in InvestmentKind::ALL {
            assert_eq!(s.market_trends.series(kind).len(), TREND_WINDOW);
        }
    }

    #[test]
    fn holdings_follow_price_ratio() {
        let mut s = state(0, 0);
        s.portfolio.set_value(InvestmentKind::Stocks, Decimal::new(50, 0));
        let next = simulate_market_step(&s, &mut ChaCha8Rng::seed_from_u64(5));
        let ratio = next.market_trends.latest(InvestmentKind::Stocks).unwrap() / 100.0;
        let got = next.portfolio.value(InvestmentKind::Stocks);
        let expected = Decimal::from_f64(50.0 * ratio).unwrap().round_dp(2);
        assert!((got - expected).abs() <= Decimal::new(1, 2));
    }

    #[test]
    fn revalue_floor_and_zero() {
        assert_eq!(revalue(Decimal::ZERO, 100.0, 500.0), Decimal::ZERO);
        assert_eq!(revalue(Decimal::new(10, 0), 100.0, 50.0), Decimal::new(5, 0));
    }

    #[test]
    fn deposit_exceeding_cash_is_noop() {
        let s = state(10, 0);
        let err = deposit(&s, Decimal::new(25, 0), date(), &mut ChaCha8Rng::seed_from_u64(1))
            .unwrap_err();
        assert_eq!(
            err,
            TransferError::InsufficientCash {
                available: Decimal::new(10, 0),
                requested: Decimal::new(25, 0)
            }
        );
        assert!(s.bank_history.is_empty());
        assert_eq!(s.cash, Decimal::new(10, 0));
        assert_eq!(s.bank_balance, Decimal::ZERO);
    }

    #[test]
    fn deposit_and_withdraw_log_transactions() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let s = state(10, 0);
        let s = deposit(&s, Decimal::new(8, 0), date(), &mut rng).unwrap();
        assert_eq!(s.cash, Decimal::new(2, 0));
        assert_eq!(s.bank_balance, Decimal::new(8, 0));
        let s = withdraw(&s, Decimal::new(3, 0), date(), &mut rng).unwrap();
        assert_eq!(s.cash, Decimal::new(5, 0));
        assert_eq!(s.bank_history.len(), 2);
        assert_eq!(s.bank_history[0].kind, BankTxKind::Deposit);
        assert_eq!(s.bank_history[1].kind, BankTxKind::Withdraw);
        assert_eq!(s.bank_history[1].balance_after, Decimal::new(5, 0));
        assert_ne!(s.bank_history[0].id, s.bank_history[1].id);

        assert!(matches!(
            withdraw(&s, Decimal::new(6, 0), date(), &mut rng),
            Err(TransferError::InsufficientSavings { .. })
        ));
        assert!(matches!(
            deposit(&s, Decimal::ZERO, date(), &mut rng),
            Err(TransferError::NonPositiveAmount(_))
        ));
    }

    #[test]
    fn interest_credits_savings() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let s = accrue_interest(&state(0, 50), Decimal::new(2, 0), date(), &mut rng);
        assert_eq!(s.bank_balance, Decimal::new(51, 0));
        assert_eq!(s.bank_history[0].kind, BankTxKind::Interest);
        assert_eq!(s.bank_history[0].amount, Decimal::ONE);

        let empty = accrue_interest(&state(5, 0), Decimal::new(2, 0), date(), &mut rng);
        assert!(empty.bank_history.is_empty());
    }

    #[test]
    fn invest_and_sell_are_bounded() {
        let s = state(10, 0);
        let s = invest(&s, InvestmentKind::Bonds, Decimal::new(4, 0)).unwrap();
        assert_eq!(s.cash, Decimal::new(6, 0));
        assert_eq!(s.portfolio.value(InvestmentKind::Bonds), Decimal::new(4, 0));
        assert!(invest(&s, InvestmentKind::Bonds, Decimal::new(7, 0)).is_err());
        assert!(matches!(
            sell(&s, InvestmentKind::Bonds, Decimal::new(5, 0)),
            Err(TransferError::InsufficientHolding { kind: "bonds", .. })
        ));
        let s = sell(&s, InvestmentKind::Bonds, Decimal::new(4, 0)).unwrap();
        assert_eq!(s.cash, Decimal::new(10, 0));
        assert_eq!(s.portfolio.total(), Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn prices_never_fall_below_floor(seed in any::<u64>(), start in 10.0f64..200.0, ticks in 1usize..120) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut s = state(0, 0);
            s.market_trends = MarketTrends::from_fn(|_| vec![start]);
            for _ in 0..ticks {
                s = simulate_market_step(&s, &mut rng);
            }
            for (_, series) in s.market_trends.iter() {
                prop_assert!(series.iter().all(|p| *p >= MIN_PRICE_INDEX));
            }
        }

        #[test]
        fn empty_holdings_stay_empty(seed in any::<u64>(), ticks in 1usize..60) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut s = state(0, 0);
            s.portfolio.set_value(InvestmentKind::Crypto, Decimal::new(30, 0));
            for _ in 0..ticks {
                s = simulate_market_step(&s, &mut rng);
            }
            for kind in InvestmentKind::ALL {
                if kind != InvestmentKind::Crypto {
                    prop_assert_eq!(s.portfolio.value(kind), Decimal::ZERO);
                }
            }
            prop_assert!(s.portfolio.value(InvestmentKind::Crypto) >= Decimal::ZERO);
        }
    }
}
