use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use serde_json::json;

use grad_insights::analytics::views::{extreme_series, mean_std_points, stability_ranking};
use grad_insights::{
    salary_trend_analysis, stability_index, university_roi, DatasetState, RoiQuery, TrendQuery,
    DEFAULT_GROUP_COLUMN,
};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut state = DatasetState::default();
    let path = cli
        .data
        .context("no dataset given: pass --data or set GRAD_INSIGHTS_DATA")?;
    let dataset = state.load(&path)?;

    let output = match cli.command {
        Commands::Stability(args) => {
            let report = stability_index(&dataset, &args.group_by)?;
            json!({
                "ranking": stability_ranking(&report.group_stats),
                "mean_std": mean_std_points(&report.group_stats),
                "extremes": extreme_series(&report, args.views),
                "report": report,
            })
        }
        Commands::Roi(args) => {
            let query = RoiQuery {
                year: args.year,
                start_year: args.start_year,
                end_year: args.end_year,
            };
            to_json(&university_roi(&dataset, &query)?)?
        }
        Commands::Trend(args) => {
            let query = TrendQuery {
                universities: (!args.university.is_empty()).then_some(args.university),
                start_year: args.start_year,
                end_year: args.end_year,
            };
            to_json(&salary_trend_analysis(&dataset, &query)?)?
        }
        Commands::Describe => {
            let columns: Vec<_> = dataset
                .column_names()
                .iter()
                .map(|name| {
                    json!({
                        "name": name,
                        "distinct": dataset.distinct_values(name).len(),
                    })
                })
                .collect();
            json!({ "rows": dataset.len(), "columns": columns })
        }
    };

    let text = if cli.pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
    .context("serializing output")?;
    println!("{text}");

    info!("done");
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).context("serializing result")
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Graduate employment survey analytics.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Survey dataset (.csv, .json or .parquet).
    #[arg(long, env = "GRAD_INSIGHTS_DATA", global = true)]
    data: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Employability stability index per group.
    Stability(StabilityArgs),
    /// ROI proxy ranking of universities.
    Roi(RoiArgs),
    /// Median salary trends per university.
    Trend(TrendArgs),
    /// Row count and columns of the dataset.
    Describe,
}

#[derive(Parser)]
struct StabilityArgs {
    /// Column to group by.
    #[arg(long, default_value = DEFAULT_GROUP_COLUMN)]
    group_by: String,

    /// How many most/least stable groups to expose as aligned series.
    #[arg(long, default_value_t = 3)]
    views: usize,
}

#[derive(Parser)]
struct RoiArgs {
    /// Only this survey year (overrides the range).
    #[arg(long)]
    year: Option<i64>,

    #[arg(long)]
    start_year: Option<i64>,

    #[arg(long)]
    end_year: Option<i64>,
}

#[derive(Parser)]
struct TrendArgs {
    /// University to include; repeat for several. Omit for all.
    #[arg(long)]
    university: Vec<String>,

    #[arg(long)]
    start_year: Option<i64>,

    #[arg(long)]
    end_year: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_is_accepted_before_or_after_the_subcommand() {
        let after = Cli::try_parse_from(["grad-insights", "roi", "--data", "f.csv", "--year", "2019"])
            .unwrap();
        assert_eq!(after.data, Some(PathBuf::from("f.csv")));
        assert!(matches!(after.command, Commands::Roi(RoiArgs { year: Some(2019), .. })));

        let before = Cli::try_parse_from(["grad-insights", "--data", "f.csv", "--pretty", "describe"])
            .unwrap();
        assert_eq!(before.data, Some(PathBuf::from("f.csv")));
        assert!(before.pretty);

        let trend =
            Cli::try_parse_from(["grad-insights", "trend", "--university", "A", "--data", "g.json"])
                .unwrap();
        assert_eq!(trend.data, Some(PathBuf::from("g.json")));
    }
}
