#![deny(warnings)]

//! Behavioral scoring and feedback derived from a player's history.
//!
//! Two 0–100 scores summarize how a player handles money:
//! - future preparedness: goal progress, willingness to skip, savings buffer
//! - financial mindfulness: needs-first purchases, buy/skip balance, variety
//!
//! Feedback generators turn the same history into short messages, checked in
//! a fixed priority order and truncated to [`MAX_FEEDBACK`] entries.

use quest_core::{format_money, BankTransaction, BankTxKind, Category, ChoiceEvent, MoneyState};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Score reported before the player has made any decision.
pub const NEUTRAL_SCORE: u8 = 50;
/// Maximum number of feedback lines returned.
pub const MAX_FEEDBACK: usize = 3;
/// Savings balance that counts as a full emergency buffer.
const BUFFER_TARGET: f64 = 25.0;
/// Distinct encounters needed for a full variety score.
const VARIETY_TARGET: f64 = 3.0;

pub const FALLBACK_POSITIVE: &str = "Started learning about money!";
pub const FALLBACK_IMPROVEMENT: &str = "Keep trying new strategies!";

/// Derived behavioral scores, each an integer in [0, 100].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub future_preparedness: u8,
    pub financial_mindfulness: u8,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            future_preparedness: NEUTRAL_SCORE,
            financial_mindfulness: NEUTRAL_SCORE,
        }
    }
}

/// Counts over a decision history.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistoryTally {
    pub decisions: usize,
    pub buys: usize,
    pub skips: usize,
    pub needs: usize,
    pub wants: usize,
    pub socials: usize,
    pub unique_encounters: usize,
}

impl HistoryTally {
    pub fn from_history(history: &[ChoiceEvent]) -> Self {
        let mut t = HistoryTally {
            decisions: history.len(),
            ..Default::default()
        };
        let mut seen = BTreeSet::new();
        for ev in history {
            seen.insert(ev.encounter_id.as_str());
            if !ev.is_buy() {
                t.skips += 1;
                continue;
            }
            t.buys += 1;
            match ev.category {
                Some(Category::Need) => t.needs += 1,
                Some(Category::Want) => t.wants += 1,
                Some(Category::Social) => t.socials += 1,
                None => {}
            }
        }
        t.unique_encounters = seen.len();
        t
    }

    pub fn skip_ratio(&self) -> f64 {
        ratio(self.skips, self.decisions)
    }

    pub fn buy_ratio(&self) -> f64 {
        ratio(self.buys, self.decisions)
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64
}

fn dollars(d: Decimal) -> f64 {
    d.max(Decimal::ZERO).to_f64().unwrap_or(0.0)
}

fn score(x: f64) -> u8 {
    if !x.is_finite() {
        return 0;
    }
    x.round().clamp(0.0, 100.0) as u8
}

/// Weighted needs-first score over categorized purchases.
fn needs_score(t: &HistoryTally) -> f64 {
    let categorized = t.needs + t.wants + t.socials;
    if categorized == 0 {
        return f64::from(NEUTRAL_SCORE);
    }
    let weighted = t.needs as f64 * 1.0 + t.socials as f64 * 0.5;
    weighted / categorized as f64 * 100.0
}

/// Compute both behavioral scores.
///
/// An empty history yields [`NEUTRAL_SCORE`] for both.
pub fn compute_stats(history: &[ChoiceEvent], bank_balance: Decimal, goal_cost: Decimal) -> PlayerStats {
    if history.is_empty() {
        return PlayerStats::default();
    }
    let t = HistoryTally::from_history(history);
    let bank = dollars(bank_balance);

    let goal_progress = if goal_cost <= Decimal::ZERO {
        100.0
    } else {
        (bank / dollars(goal_cost) * 100.0).min(100.0)
    };
    let skip_score = t.skip_ratio() * 100.0;
    let buffer_score = (bank / BUFFER_TARGET * 100.0).min(100.0);
    let preparedness = goal_progress * 0.5 + skip_score * 0.3 + buffer_score * 0.2;

    let balance_score = 100.0 - (t.buy_ratio() - 0.5).abs() * 200.0;
    let variety_score = (t.unique_encounters as f64 / VARIETY_TARGET * 100.0).min(100.0);
    let mindfulness = needs_score(&t) * 0.4 + balance_score * 0.4 + variety_score * 0.2;

    PlayerStats {
        future_preparedness: score(preparedness),
        financial_mindfulness: score(mindfulness),
    }
}

fn total_deposited(bank_history: &[BankTransaction]) -> Decimal {
    bank_history
        .iter()
        .filter(|tx| tx.kind == BankTxKind::Deposit)
        .map(|tx| tx.amount)
        .sum()
}

fn finish(mut lines: Vec<String>, fallback: &str) -> Vec<String> {
    lines.truncate(MAX_FEEDBACK);
    if lines.is_empty() {
        lines.push(fallback.to_string());
    }
    lines
}

/// Up to three affirmations, highest priority first. Never empty.
pub fn positive_feedback(
    history: &[ChoiceEvent],
    bank_history: &[BankTransaction],
    bank_balance: Decimal,
    goal_cost: Decimal,
) -> Vec<String> {
    let t = HistoryTally::from_history(history);
    let stats = compute_stats(history, bank_balance, goal_cost);
    let deposited = total_deposited(bank_history);
    let mut lines = Vec::new();

    if t.skips >= 3 {
        lines.push(format!(
            "Great self-control! You skipped {} purchases.",
            t.skips
        ));
    }
    if t.needs > t.wants {
        lines.push("You put needs before wants. Nice prioritizing!".to_string());
    }
    if deposited > Decimal::ZERO {
        lines.push(format!(
            "You deposited {} into the bank!",
            format_money(deposited)
        ));
    }
    if stats.future_preparedness >= 70 {
        lines.push("You're planning ahead for your future.".to_string());
    }
    if stats.financial_mindfulness >= 70 {
        lines.push("You're spending money mindfully.".to_string());
    }
    if t.decisions > 0 && t.skip_ratio() >= 0.5 {
        lines.push("You're patient with your money.".to_string());
    }
    finish(lines, FALLBACK_POSITIVE)
}

/// Up to three suggestions, highest priority first. Never empty.
pub fn improvement_feedback(
    history: &[ChoiceEvent],
    bank_history: &[BankTransaction],
    bank_balance: Decimal,
    goal_cost: Decimal,
) -> Vec<String> {
    let t = HistoryTally::from_history(history);
    let stats = compute_stats(history, bank_balance, goal_cost);
    let deposits = bank_history
        .iter()
        .filter(|tx| tx.kind == BankTxKind::Deposit)
        .count();
    let mut lines = Vec::new();

    if t.wants > 3 {
        lines.push(format!(
            "You bought {} wants. Ask yourself if each one is worth it.",
            t.wants
        ));
    }
    if deposits == 0 && !history.is_empty() {
        lines.push("Try using the bank to keep your savings safe.".to_string());
    }
    if stats.future_preparedness < 40 {
        lines.push("Focus on saving a little toward your goal each week.".to_string());
    }
    if stats.financial_mindfulness < 40 && t.buys > 2 * t.skips {
        lines.push("Try balancing purchases with skipping sometimes.".to_string());
    }
    if t.decisions >= 5 && bank_balance < goal_cost / Decimal::TWO {
        lines.push("Keep going! Your savings are still growing toward your goal.".to_string());
    }
    finish(lines, FALLBACK_IMPROVEMENT)
}

/// Scores and both feedback lists for one player.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub stats: PlayerStats,
    pub positive: Vec<String>,
    pub improvement: Vec<String>,
}

/// Build the end-of-session report from a money state.
pub fn report(money: &MoneyState) -> Report {
    let stats = compute_stats(&money.history, money.bank_balance, money.goal.cost);
    debug!(
        decisions = money.history.len(),
        preparedness = stats.future_preparedness,
        mindfulness = stats.financial_mindfulness,
        "player report"
    );
    Report {
        stats,
        positive: positive_feedback(
            &money.history,
            &money.bank_history,
            money.bank_balance,
            money.goal.cost,
        ),
        improvement: improvement_feedback(
            &money.history,
            &money.bank_history,
            money.bank_balance,
            money.goal.cost,
        ),
    }
}
