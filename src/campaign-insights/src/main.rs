//! Campaign Insights: performance reporting, budget allocation, and
//! predictive recommendations over a JSON campaign dataset.

mod dataset;

use anyhow::Context;
use campaign_core::config::AppConfig;
use campaign_ml::{CampaignOptimizer, InsightRequest};
use campaign_reporting::{AnalyticsQuery, AnalyticsService, GroupBy};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use dataset::Dataset;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "campaign-insights")]
#[command(about = "Campaign performance analytics and budget optimization")]
#[command(version)]
struct Cli {
    /// JSON dataset with campaigns, daily records, and training samples
    #[arg(long, env = "CAMPAIGN_INSIGHTS__DATASET")]
    dataset: PathBuf,

    /// Optional TOML config file (environment variables take precedence)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reference date for trailing windows (defaults to today, UTC)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Records and summary for a date range
    Query {
        #[arg(long)]
        campaign: Option<Uuid>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long, value_enum)]
        group_by: Option<GroupByArg>,
    },
    /// Daily trend for one campaign
    Trend {
        #[arg(long)]
        campaign: Uuid,
        #[arg(long)]
        days: Option<i64>,
    },
    /// Side-by-side summaries, in the order given
    Compare {
        #[arg(long = "campaign", required = true)]
        campaigns: Vec<Uuid>,
        #[arg(long)]
        days: Option<i64>,
    },
    /// Portfolio totals and top campaigns by ROAS
    Overview {
        #[arg(long)]
        days: Option<i64>,
    },
    /// Split a total budget across campaigns by efficiency
    Allocate {
        #[arg(long)]
        total_budget: f64,
        /// Restrict to these campaigns (default: all)
        #[arg(long = "campaign")]
        campaigns: Vec<Uuid>,
        #[arg(long)]
        days: Option<i64>,
    },
    /// Train both predictors from the dataset's training samples and save them
    Train {
        /// Output directory (overrides ml.model_dir)
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
    /// Predictions and recommendations for each request in a JSON file
    Insight {
        /// JSON array of insight requests
        #[arg(long)]
        requests: PathBuf,
        /// Directory holding saved models (overrides ml.model_dir)
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GroupByArg {
    Day,
    Week,
    Month,
}

impl From<GroupByArg> for GroupBy {
    fn from(arg: GroupByArg) -> Self {
        match arg {
            GroupByArg::Day => GroupBy::Day,
            GroupByArg::Week => GroupBy::Week,
            GroupByArg::Month => GroupBy::Month,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let (config, config_error) = match config {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    let as_of = cli
        .as_of
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    info!(dataset = %cli.dataset.display(), %as_of, "Campaign Insights starting");

    let (store, training) = Dataset::load(&cli.dataset)?.into_store();
    let service = AnalyticsService::new(Arc::new(store), config.reporting.clone());
    let window = |days: Option<i64>| days.unwrap_or(service.default_window_days());

    match cli.command {
        Command::Query {
            campaign,
            start,
            end,
            group_by,
        } => {
            let query = AnalyticsQuery {
                campaign_id: campaign,
                start_date: start,
                end_date: end,
                group_by: group_by.map(Into::into),
            };
            print_json(&service.query(&query)?)
        }
        Command::Trend { campaign, days } => {
            let trend = service.campaign_trend(&campaign, window(days), as_of)?;
            print_json(&trend.report())
        }
        Command::Compare { campaigns, days } => {
            print_json(&service.compare_campaigns(&campaigns, window(days), as_of)?)
        }
        Command::Overview { days } => print_json(&service.overview(window(days), as_of)?),
        Command::Allocate {
            total_budget,
            campaigns,
            days,
        } => {
            let ids = (!campaigns.is_empty()).then_some(campaigns.as_slice());
            print_json(&service.optimize_budget(ids, total_budget, window(days), as_of)?)
        }
        Command::Train { model_dir } => {
            let optimizer = CampaignOptimizer::new(&config.ml);
            let roas = optimizer.train_roas_model(&training)?;
            let conversions = optimizer.train_conversion_model(&training)?;
            let dir = model_dir.unwrap_or_else(|| PathBuf::from(&config.ml.model_dir));
            optimizer.save_models(&dir)?;
            print_json(&serde_json::json!({
                "roas_model": roas,
                "conversion_model": conversions,
                "model_dir": dir,
            }))
        }
        Command::Insight {
            requests,
            model_dir,
        } => {
            let optimizer = CampaignOptimizer::new(&config.ml);
            let dir = model_dir.unwrap_or_else(|| PathBuf::from(&config.ml.model_dir));
            optimizer.load_models(&dir)?;
            if !optimizer.is_trained() && !training.is_empty() {
                info!("No saved models found, training from dataset");
                optimizer.train_roas_model(&training)?;
                optimizer.train_conversion_model(&training)?;
            }
            let insights = load_requests(&requests)?
                .iter()
                .map(|r| optimizer.insight(r))
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&insights)
        }
    }
}

fn load_requests(path: &Path) -> anyhow::Result<Vec<InsightRequest>> {
    let file =
        File::open(path).with_context(|| format!("failed to open requests {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse requests {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
