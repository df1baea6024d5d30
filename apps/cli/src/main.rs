#![deny(warnings)]

//! Headless CLI: plays a few weeks of Money Quest with a scripted player and
//! prints the decision notes, forecasts and the end-of-run report.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use quest_core::{
    format_money, validate_config, Category, Choice, Encounter, GameConfig, InvestmentKind,
    PlayStyle, Reflection,
};
use quest_runtime::EncounterCatalog;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    seed: Option<u64>,
    weeks: Option<u32>,
    ticks: Option<u32>,
    save: Option<PathBuf>,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next().map(PathBuf::from),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--weeks" => args.weeks = it.next().and_then(|s| s.parse().ok()),
            "--ticks" => args.ticks = it.next().and_then(|s| s.parse().ok()),
            "--save" => args.save = it.next().map(PathBuf::from),
            _ => {}
        }
    }
    args
}

fn load_config(path: Option<&PathBuf>) -> Result<GameConfig> {
    let cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("reading config {}", p.display()))?;
            serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", p.display()))?
        }
        None => GameConfig::default(),
    };
    validate_config(&cfg)?;
    Ok(cfg)
}

fn now() -> DateTime<Utc> {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default()
}

/// Scripted player: savers buy needs only, spenders buy everything.
fn pick(style: PlayStyle, encounter: &Encounter) -> (Choice, Option<Reflection>) {
    let buy = match (style, encounter.category) {
        (PlayStyle::Spender, _) => true,
        (_, Some(Category::Need)) => true,
        (PlayStyle::Balanced, Some(Category::Social)) => true,
        (PlayStyle::Balanced, _) => encounter.cost <= Decimal::new(5, 0),
        (PlayStyle::Saver, _) => false,
    };
    if !buy {
        return (Choice::Skip, None);
    }
    let reflection = match encounter.category {
        Some(Category::Need) => Reflection::Yes,
        Some(Category::Social) => Reflection::Unsure,
        _ if style == PlayStyle::Spender => Reflection::No,
        _ => Reflection::Unsure,
    };
    (Choice::Buy, Some(reflection))
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    let mut cfg = load_config(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        cfg.rng_seed = seed;
    }
    let weeks = args.weeks.unwrap_or(2).max(1);
    let ticks = args.ticks.unwrap_or(5);
    info!(seed = cfg.rng_seed, weeks, ticks, style = ?cfg.play_style, "starting CLI");

    let catalog = EncounterCatalog::builtin()?;
    let mut rng = ChaCha8Rng::seed_from_u64(cfg.rng_seed);
    let created_at = now();
    let mut engine = quest_runtime::new_engine_state(&cfg, created_at, catalog.upcoming.clone());
    let mut money = quest_runtime::new_money_state(&cfg, &mut rng);

    for week in 0..weeks {
        let date = created_at + Duration::weeks(i64::from(week));
        println!("== Week {} | allowance {} ==", week + 1, format_money(engine.week.balance));

        for encounter in &catalog.encounters {
            let (choice, reflection) = pick(cfg.play_style, encounter);
            if choice == Choice::Buy {
                let preview = quest_runtime::try_it_first_preview(&engine, encounter);
                println!("  preview {}: {}", encounter.title, preview.summary);
            }
            for note in quest_runtime::explain_impact(&engine, encounter, choice) {
                println!("  {}", note);
            }
            engine = quest_runtime::simulate_decision(&engine, encounter, choice, &mut rng).next_state;

            money = match quest_runtime::apply_choice(&money, encounter, choice, reflection, &mut rng) {
                Ok(next) => next,
                Err(err) => {
                    warn!(%err, "falling back to skip");
                    quest_runtime::apply_choice(&money, encounter, Choice::Skip, None, &mut rng)?
                }
            };
        }

        let fc = quest_runtime::forecast(&engine);
        println!(
            "Forecast | {} goal in {} week(s) | affordable events: {:?}",
            engine.settings.goal.label, fc.goal_eta_weeks, fc.can_afford_event_ids
        );

        let savings = (money.cash / Decimal::TWO).round_dp(2);
        if savings > Decimal::ZERO {
            money = quest_econ::deposit(&money, savings, date, &mut rng)?;
        }
        if week == 0 {
            let stake = (money.cash / Decimal::new(4, 0)).round_dp(2);
            if stake > Decimal::ZERO {
                money = quest_econ::invest(&money, InvestmentKind::Etf, stake)?;
            }
        }
        for _ in 0..ticks {
            money = quest_econ::simulate_market_step(&money, &mut rng);
        }
        money = quest_econ::accrue_interest(&money, cfg.interest_rate_pct, date, &mut rng);
        println!(
            "Money | cash {} | bank {} | invested {} | net worth {}",
            format_money(money.cash),
            format_money(money.bank_balance),
            format_money(money.invested_total()),
            format_money(money.net_worth())
        );

        if week + 1 < weeks {
            engine = quest_runtime::start_next_week(&engine, catalog.upcoming.clone());
            money = quest_runtime::pay_allowance(&money, cfg.weekly_allowance);
        }
    }

    for kind in InvestmentKind::ALL {
        if let (Some(latest), Some(change)) = (money.market_trends.latest(kind), money.market_trends.change_pct(kind)) {
            println!(
                "Market | {:<18} {:>8.2} ({:+.1}%) | risk: {:?}",
                kind.label(),
                latest,
                change,
                kind.risk()
            );
        }
    }

    let report = quest_insights::report(&money);
    println!(
        "Stats | future preparedness: {} | financial mindfulness: {} | goal progress: {:.0}%",
        report.stats.future_preparedness,
        report.stats.financial_mindfulness,
        money.goal_progress_pct()
    );
    for line in &report.positive {
        println!("  + {}", line);
    }
    for line in &report.improvement {
        println!("  - {}", line);
    }

    if let Some(path) = args.save {
        let profile = persistence::Profile {
            username: "player".to_string(),
            created_at,
            money,
        };
        let blob = persistence::encode_profile(&profile)?;
        std::fs::write(&path, blob).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "saved profile");
    }

    Ok(())
}
