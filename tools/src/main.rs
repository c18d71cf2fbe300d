//! dropship-runner: headless operations runner.
//!
//! Usage:
//!   dropship-runner init    --db data/dropship.db
//!   dropship-runner stats   --db data/dropship.db
//!   dropship-runner check   --db data/dropship.db --name "Shun Classic" \
//!                           --category knife --wholesale 8000 --price 95.0
//!   dropship-runner suggest --wholesale 300 --weight 50 --margin 0.30
//!   dropship-runner summary --db data/dropship.db --date 2026-08-24
//!
//! `--config fees.json` loads an alternate engine configuration (exchange
//! rate, shipping tiers, fee models) for the check and suggest commands.
//!
//! The HTTP marketplace adapters run elsewhere; this binary covers the
//! local workflows: database setup, risk checks, pricing, and reports.

use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use dropship_core::{
    config::EngineConfig,
    profit::{ProfitEngine, DEFAULT_TARGET_MARGIN},
    risk::{ProductCandidate, RiskScorer},
    store::Store,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        bail!("usage: dropship-runner <init|stats|check|suggest|summary> [options]");
    };

    let db = parse_str_arg(&args, "--db").unwrap_or_else(|| ":memory:".to_string());
    let config = match parse_str_arg(&args, "--config") {
        Some(path) => EngineConfig::from_json(&std::fs::read_to_string(&path)?)?,
        None => EngineConfig::default(),
    };
    let engine = ProfitEngine::new(config);

    match command {
        "init" => {
            let store = Store::open(&db)?;
            store.migrate()?;
            let (restrictions, brands) = store.seed_reference_data()?;
            println!("db: {db}");
            println!("schema applied");
            println!("seeded {restrictions} country restriction(s), {brands} brand(s)");
        }
        "stats" => {
            let store = Store::open(&db)?;
            for (table, count) in store.table_counts()? {
                println!("{table:24} {count}");
            }
        }
        "check" => {
            let store = Store::open(&db)?;
            store.migrate()?;
            store.seed_reference_data()?;

            let Some(name) = parse_str_arg(&args, "--name") else {
                bail!("check requires --name");
            };
            let candidate = ProductCandidate {
                name_ja: name,
                name_en: parse_str_arg(&args, "--name-en"),
                category: parse_str_arg(&args, "--category"),
                wholesale_price_jpy: parse_arg(&args, "--wholesale"),
                weight_g: parse_arg(&args, "--weight"),
                ..ProductCandidate::default()
            };
            let sale_usd: Option<f64> = parse_arg(&args, "--price");
            let marketplace =
                parse_str_arg(&args, "--marketplace").unwrap_or_else(|| "ebay".to_string());

            let scorer = RiskScorer::new(&engine);
            let verdict = scorer.check_ban_risk(&candidate, &store, sale_usd, &marketplace)?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
        "suggest" => {
            let Some(wholesale) = parse_arg::<i64>(&args, "--wholesale") else {
                bail!("suggest requires --wholesale <JPY>");
            };
            let weight: Option<u32> = parse_arg(&args, "--weight");
            let margin = parse_arg(&args, "--margin").unwrap_or(DEFAULT_TARGET_MARGIN);
            let marketplace =
                parse_str_arg(&args, "--marketplace").unwrap_or_else(|| "ebay".to_string());

            let suggestion = engine.suggest_price(wholesale, weight, margin, &marketplace)?;
            println!("{}", serde_json::to_string_pretty(&suggestion)?);
        }
        "summary" => {
            let store = Store::open(&db)?;
            let date = match parse_str_arg(&args, "--date") {
                Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")?,
                None => Utc::now().date_naive(),
            };
            let summary = store.daily_summary(date)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        other => bail!("unknown command: {other}"),
    }

    Ok(())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].clone())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    parse_str_arg(args, flag).and_then(|v| v.parse().ok())
}
