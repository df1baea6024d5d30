#![deny(warnings)]

//! Check whether a save file would load, and summarize it.
//!
//! Usage: check-save <file> [--engine]

use anyhow::{bail, Context, Result};

fn main() -> Result<()> {
    let mut path: Option<String> = None;
    let mut engine = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--engine" => engine = true,
            _ => path = Some(arg),
        }
    }
    let Some(path) = path else {
        bail!("usage: check-save <file> [--engine]");
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;

    if engine {
        let s = persistence::decode_engine_state(&text)
            .with_context(|| format!("{path} is not a loadable engine save"))?;
        println!(
            "engine save OK | version: {} | day: {} | balance: {} | decisions: {}",
            s.version,
            s.week.day_index,
            quest_core::format_money(s.week.balance),
            s.week.history.len()
        );
    } else {
        let p = persistence::decode_profile(&text)
            .with_context(|| format!("{path} is not a loadable profile"))?;
        println!(
            "profile OK | user: {} | net worth: {} | decisions: {} | bank entries: {}",
            p.username,
            quest_core::format_money(p.money.net_worth()),
            p.money.history.len(),
            p.money.bank_history.len()
        );
    }
    Ok(())
}
