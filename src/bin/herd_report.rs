//! Herd Report
//!
//! Loads a directory of CSV exports, scores the herd and prints the report
//! as JSON on stdout.
//!
//! Without `--as-of` the period is the trailing year ending today. With
//! `--year` the period is that calendar year and breeding figures are
//! restricted to it.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use herd_metrics_rust::utils::parse_date;
use herd_metrics_rust::{HerdPeriod, HerdScorer, HerdSnapshot, MetricsConfig, ReportKey};
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "herd_report", about = "Score a herd snapshot and print the report as JSON")]
struct Args {
    /// Directory holding animals.csv, weights.csv and the optional record files
    snapshot_dir: PathBuf,

    /// Last day of the trailing-year period (YYYY-MM-DD)
    #[arg(long, value_parser = parse_as_of)]
    as_of: Option<NaiveDate>,

    /// Score one calendar year; takes precedence over --as-of
    #[arg(long)]
    year: Option<i32>,

    /// Metrics configuration JSON (targets, ranges, defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Record version the report is keyed under
    #[arg(long, default_value_t = 0)]
    herd_version: u64,
}

fn parse_as_of(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).ok_or_else(|| format!("invalid date '{}'", raw))
}

impl Args {
    fn period(&self) -> Result<HerdPeriod> {
        Ok(match (self.year, self.as_of) {
            (Some(year), _) => HerdPeriod::calendar_year(year)
                .with_context(|| format!("Year out of range: {}", year))?,
            (None, Some(as_of)) => HerdPeriod::trailing_year(as_of),
            (None, None) => HerdPeriod::trailing_year(Local::now().date_naive()),
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herd_metrics_rust=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => MetricsConfig::load(path)?,
        None => MetricsConfig::default(),
    };
    let period = args.period()?;

    tracing::info!("Configuration:");
    tracing::info!("  Snapshot: {:?}", args.snapshot_dir);
    tracing::info!("  Period: {} to {}", period.start, period.end);
    tracing::info!("  Herd version: {}", args.herd_version);

    let snapshot = HerdSnapshot::load(&args.snapshot_dir)?;
    let scorer = HerdScorer::new(config);
    let report = scorer.score_herd_for(&snapshot, period, args.year);
    let key = ReportKey::new(args.herd_version, period);

    let output = json!({
        "key": key,
        "report": report,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to serialise report")?
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_flags() {
        let args = Args::try_parse_from([
            "herd_report",
            "snapshots/farm_a",
            "--as-of",
            "2024-06-30",
            "--herd-version",
            "7",
        ])
        .unwrap();

        assert_eq!(args.snapshot_dir, PathBuf::from("snapshots/farm_a"));
        assert_eq!(args.as_of, NaiveDate::from_ymd_opt(2024, 6, 30));
        assert_eq!(args.herd_version, 7);
        assert_eq!(args.year, None);
        assert_eq!(args.period().unwrap().end, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
    }

    #[test]
    fn test_year_takes_precedence() {
        let args = Args::try_parse_from([
            "herd_report",
            "farm",
            "--year",
            "2023",
            "--as-of",
            "2024-06-30",
        ])
        .unwrap();

        let period = args.period().unwrap();
        assert_eq!(period, HerdPeriod::calendar_year(2023).unwrap());
        assert_eq!(args.herd_version, 0);
    }

    #[test]
    fn test_bad_date_and_missing_dir_rejected() {
        assert!(Args::try_parse_from(["herd_report", "farm", "--as-of", "30th June"]).is_err());
        assert!(Args::try_parse_from(["herd_report"]).is_err());
    }
}
