//! CLI entry point for ROI model training, prediction and bid optimization.

use anyhow::{Context, Result, anyhow};
use bidwise_learning::{
    CampaignOptimizer, FeatureConfig, ImputationStrategy, ModelSpec, PredictorConfig,
    RoiPredictor, UnknownCategoryPolicy, default_candidates,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// CLI-compatible unseen-category policy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliUnknownCategory {
    /// Fail on categorical values not seen in training
    Error,
    /// Map unseen values to a reserved code
    Reserved,
}

impl From<CliUnknownCategory> for UnknownCategoryPolicy {
    fn from(cli: CliUnknownCategory) -> Self {
        match cli {
            CliUnknownCategory::Error => UnknownCategoryPolicy::Error,
            CliUnknownCategory::Reserved => UnknownCategoryPolicy::Reserved,
        }
    }
}

/// CLI-compatible imputation strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliImputation {
    /// Reuse the medians recorded at training time
    Training,
    /// Recompute medians from every batch
    Batch,
}

impl From<CliImputation> for ImputationStrategy {
    fn from(cli: CliImputation) -> Self {
        match cli {
            CliImputation::Training => ImputationStrategy::TrainingMedians,
            CliImputation::Batch => ImputationStrategy::BatchMedians,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "bidwise",
    version,
    about = "ROI prediction and bid optimization for ad campaigns",
    long_about = "Train ROI models on historical campaign performance and use them to \
                  score records, suggest bid changes and flag underperforming keywords.\n\n\
                  EXAMPLES:\n  \
                  # Train and save a model\n  \
                  bidwise train -i history.csv -m roi_model.json\n\n  \
                  # Suggest bids that reach an ROI of 1.5\n  \
                  bidwise optimize -i keywords.csv -m roi_model.json --target-roi 1.5\n\n  \
                  # Machine-readable output\n  \
                  bidwise --json underperforming -i keywords.csv -m roi_model.json"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the final JSON document is written.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a model on historical records and save it
    Train(TrainArgs),
    /// Predict ROI for every row of a CSV file
    Predict(ModelInput),
    /// Show the feature importances of a saved model
    Importance {
        /// Path to the saved model bundle
        #[arg(short, long)]
        model: PathBuf,
    },
    /// Recommend bid changes
    Optimize {
        #[command(flatten)]
        source: ModelInput,

        /// Minimum predicted ROI a recommended bid must reach
        #[arg(long)]
        target_roi: f64,

        /// Largest relative bid change to try
        #[arg(long, default_value = "0.2")]
        max_bid_change: f64,
    },
    /// Flag keywords whose predicted ROI is below a threshold
    Underperforming {
        #[command(flatten)]
        source: ModelInput,

        /// ROI threshold
        #[arg(long, default_value = "1.0")]
        threshold: f64,
    },
}

#[derive(Args, Debug)]
struct ModelInput {
    /// Path to the CSV file with performance records
    #[arg(short, long)]
    input: PathBuf,

    /// Path to the saved model bundle
    #[arg(short, long)]
    model: PathBuf,
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Path to the CSV file with historical performance records
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the model bundle
    #[arg(short, long)]
    model: PathBuf,

    /// Target column
    #[arg(short, long, default_value = "roi")]
    target: String,

    /// Number of cross-validation folds
    #[arg(long, default_value = "5")]
    cv_folds: usize,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value = "0.2")]
    test_size: f64,

    /// Random seed for the split and the forest
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Also consider a ridge regression candidate
    #[arg(long)]
    with_ridge: bool,

    /// Policy for categorical values unseen in training
    #[arg(long, value_enum, default_value = "error")]
    unknown_category: CliUnknownCategory,

    /// Source of the fill values for missing features
    #[arg(long, value_enum, default_value = "training")]
    imputation: CliImputation,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.quiet, cli.json);

    match &cli.command {
        Command::Train(args) => run_train(args, cli.json),
        Command::Predict(source) => run_predict(source, cli.json),
        Command::Importance { model } => run_importance(model, cli.json),
        Command::Optimize {
            source,
            target_roi,
            max_bid_change,
        } => run_optimize(source, *target_roi, *max_bid_change, cli.json),
        Command::Underperforming { source, threshold } => {
            run_underperforming(source, *threshold, cli.json)
        }
    }
}

fn run_train(args: &TrainArgs, json: bool) -> Result<()> {
    let records = load_csv(&args.input)?;

    let features = FeatureConfig::builder()
        .target_column(&args.target)
        .unknown_category_policy(args.unknown_category.into())
        .imputation(args.imputation.into())
        .build()?;

    let mut candidates = default_candidates();
    if args.with_ridge {
        candidates.push(ModelSpec::ridge(1.0));
    }

    let config = PredictorConfig::builder()
        .features(features)
        .cv_folds(args.cv_folds)
        .test_size(args.test_size)
        .random_seed(args.seed)
        .candidates(candidates)
        .build()?;

    let mut predictor = RoiPredictor::with_config(config)?.on_progress(|update| {
        tracing::debug!(
            stage = %update.stage,
            progress = update.progress,
            "{}",
            update.message
        );
    });

    let metrics = predictor.train(&records)?;
    predictor.save_model(&args.model)?;

    if json {
        #[derive(Serialize)]
        struct TrainOutput<'a> {
            model: Option<&'static str>,
            metrics: &'a bidwise_learning::TrainingMetrics,
            candidates: &'a [bidwise_learning::CandidateScore],
        }
        return print_json(&TrainOutput {
            model: predictor.model_name(),
            metrics: &metrics,
            candidates: predictor.candidate_scores(),
        });
    }

    println!("Model saved to {}", args.model.display());
    println!("  Selected model:   {}", predictor.model_name().unwrap_or("-"));
    for candidate in predictor.candidate_scores() {
        println!(
            "  {} {:<18} CV R² {:.4} ± {:.4}",
            if candidate.selected { "*" } else { " " },
            candidate.name,
            candidate.mean_score,
            candidate.std_score
        );
    }
    println!("  Test R²:          {:.4}", metrics.r2_score);
    println!("  MAE:              {:.4}", metrics.mae);
    println!("  RMSE:             {:.4}", metrics.rmse);
    println!(
        "  Rows:             {} train / {} test",
        metrics.training_samples, metrics.test_samples
    );
    Ok(())
}

fn run_predict(source: &ModelInput, json: bool) -> Result<()> {
    let predictor = load_predictor(&source.model)?;
    let records = load_csv(&source.input)?;
    let predictions = predictor.predict(&records)?;

    if json {
        return print_json(&predictions);
    }
    for (row, roi) in predictions.iter().enumerate() {
        println!("{row}\t{roi:.6}");
    }
    Ok(())
}

fn run_importance(model: &Path, json: bool) -> Result<()> {
    let predictor = load_predictor(model)?;
    let ranked = predictor.get_feature_importance()?;

    if json {
        return print_json(&ranked);
    }
    for (name, score) in &ranked {
        println!("{name:<24} {score:.6}");
    }
    Ok(())
}

fn run_optimize(source: &ModelInput, target_roi: f64, max_bid_change: f64, json: bool) -> Result<()> {
    let predictor = load_predictor(&source.model)?;
    let records = load_csv(&source.input)?;
    let recommendations =
        CampaignOptimizer::new(&predictor).optimize_bids(&records, target_roi, max_bid_change)?;

    if json {
        return print_json(&recommendations);
    }
    if recommendations.is_empty() {
        println!("No bid change reaches a predicted ROI of {target_roi}");
        return Ok(());
    }
    for rec in &recommendations {
        println!(
            "{:<16} {:<12} bid {:.2} -> {:.2} ({:+.0}%)  ROI {:.3} -> {:.3}",
            rec.campaign_id,
            rec.keyword_id.as_deref().unwrap_or("-"),
            rec.current_bid,
            rec.recommended_bid,
            rec.bid_change * 100.0,
            rec.current_roi,
            rec.predicted_roi
        );
    }
    Ok(())
}

fn run_underperforming(source: &ModelInput, threshold: f64, json: bool) -> Result<()> {
    let predictor = load_predictor(&source.model)?;
    let records = load_csv(&source.input)?;
    let flagged =
        CampaignOptimizer::new(&predictor).identify_underperforming_keywords(&records, threshold)?;

    if json {
        return print_json(&flagged);
    }
    if flagged.is_empty() {
        println!("No keyword has a predicted ROI below {threshold}");
        return Ok(());
    }
    for keyword in &flagged {
        println!(
            "{:<16} {:<24} ROI {:.3}  cost {:.2}  -> {}",
            keyword.campaign_id,
            keyword
                .keyword_text
                .as_deref()
                .or(keyword.keyword_id.as_deref())
                .unwrap_or("-"),
            keyword.current_roi,
            keyword.cost,
            keyword.recommendation
        );
    }
    Ok(())
}

fn load_predictor(path: &Path) -> Result<RoiPredictor> {
    let mut predictor = RoiPredictor::new();
    predictor
        .load_model(path)
        .with_context(|| format!("loading model from {}", path.display()))?;
    Ok(predictor)
}

fn load_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(anyhow!("Input file not found: {}", path.display()));
    }

    info!("Loading records from: {}", path.display());
    let records = CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .with_context(|| format!("reading {}", path.display()))?;
    info!("Records loaded: {:?}", records.shape());
    Ok(records)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
