//! Smog CLI - Command-line interface for the similarity engine
//!
//! Commands:
//! - analyze: Correlate a user's commits with air quality at a location
//! - config: Print the effective configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use smog_code::types::{AnalysisFlag, AnalysisResult};
use smog_code::{AnalysisError, EngineConfig, HttpSimilarityEngine, ENGINE_VERSION};

/// Smog - find similarity between coding output and air pollution
#[derive(Parser)]
#[command(name = "smog")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Correlate GitHub commit activity with local air quality", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one similarity analysis
    Analyze {
        /// GitHub username (defaults to the configured subject)
        #[arg(short, long)]
        user: Option<String>,

        /// Latitude of the measurement location
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude of the measurement location
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Hourly air-quality metric to average (e.g. pm2_5, pm10)
        #[arg(long)]
        metric: Option<String>,

        /// GitHub token for a higher rate limit
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,

        /// Output format
        #[arg(long, default_value = "table")]
        output_format: OutputFormat,
    },

    /// Print the effective configuration as JSON
    Config,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Summary followed by the joined table
    Table,
    /// Compact JSON result
    Json,
    /// Pretty-printed JSON result
    JsonPretty,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), SmogCliError> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Analyze {
            user,
            lat,
            lon,
            metric,
            github_token,
            output_format,
        } => {
            if let Some(metric) = metric {
                config.air_quality.metric = metric;
            }
            if github_token.is_some() {
                config.github.token = github_token;
            }
            let user = user.unwrap_or_else(|| config.defaults.subject.clone());
            let lat = lat.unwrap_or(config.defaults.latitude);
            let lon = lon.unwrap_or(config.defaults.longitude);

            cmd_analyze(&config, &user, lat, lon, &output_format)
        }

        Commands::Config => {
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn cmd_analyze(
    config: &EngineConfig,
    user: &str,
    lat: f64,
    lon: f64,
    output_format: &OutputFormat,
) -> Result<(), SmogCliError> {
    let engine = HttpSimilarityEngine::from_config(config)
        .map_err(|e| SmogCliError::Setup(e.to_string()))?;

    let result = engine.analyze(user, lat, lon)?;
    let output = format_output(&result, output_format)?;

    let mut stdout = io::stdout();
    write!(stdout, "{}", output)?;
    stdout.flush()?;
    Ok(())
}

// Helper functions

fn format_output(result: &AnalysisResult, format: &OutputFormat) -> Result<String, SmogCliError> {
    match format {
        OutputFormat::Table => Ok(render_table(result)),
        OutputFormat::Json => Ok(serde_json::to_string(result)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(result)? + "\n"),
    }
}

fn render_table(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let score = result
        .correlation
        .value()
        .map(|r| format!("{r:.4}"))
        .unwrap_or_else(|| "undefined".to_string());

    out.push_str("Similarity Report\n");
    out.push_str("=================\n");
    out.push_str(&format!("Subject:          {}\n", result.provenance.subject));
    out.push_str(&format!(
        "Location:         {}, {}\n",
        result.provenance.coordinates.latitude, result.provenance.coordinates.longitude
    ));
    out.push_str(&format!("Metric:           {}\n", result.provenance.metric));
    out.push_str(&format!("Data points:      {}\n", result.data_points()));
    out.push_str(&format!("Similarity score: {}\n", score));
    out.push_str(&format!("Verdict:          {}\n", verdict(result)));

    for flag in &result.flags {
        out.push_str(&format!("  [WARN] {}\n", describe_flag(flag)));
    }

    out.push_str("\ndate        commits  mean_value  norm_commits  norm_value\n");
    for record in &result.records {
        out.push_str(&format!(
            "{}  {:>7}  {:>10.2}  {:>12.3}  {:>10.3}\n",
            record.day.date,
            record.day.commits,
            record.day.mean_value,
            record.norm_commits,
            record.norm_value
        ));
    }
    out
}

fn verdict(result: &AnalysisResult) -> &'static str {
    use smog_code::SimilarityLabel::*;
    match result.label {
        Strong => "Strong similarity found",
        Weak => "Weak similarity found",
        Unrelated => "No similarity detected",
        Undetermined => "Similarity undefined for this data",
    }
}

fn describe_flag(flag: &AnalysisFlag) -> &'static str {
    match flag {
        AnalysisFlag::DegenerateCommitScale => "commit counts are constant; overlay shows a flat line",
        AnalysisFlag::DegenerateValueScale => "measurements are constant; overlay shows a flat line",
        AnalysisFlag::UndefinedCorrelation => "correlation is undefined (zero variance)",
    }
}

// Error types

#[derive(Debug)]
enum SmogCliError {
    Io(io::Error),
    Config(smog_code::error::ConfigError),
    Json(serde_json::Error),
    Analysis(AnalysisError),
    Setup(String),
}

impl From<io::Error> for SmogCliError {
    fn from(e: io::Error) -> Self {
        SmogCliError::Io(e)
    }
}

impl From<smog_code::error::ConfigError> for SmogCliError {
    fn from(e: smog_code::error::ConfigError) -> Self {
        SmogCliError::Config(e)
    }
}

impl From<serde_json::Error> for SmogCliError {
    fn from(e: serde_json::Error) -> Self {
        SmogCliError::Json(e)
    }
}

impl From<AnalysisError> for SmogCliError {
    fn from(e: AnalysisError) -> Self {
        SmogCliError::Analysis(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SmogCliError> for CliError {
    fn from(e: SmogCliError) -> Self {
        match e {
            SmogCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            SmogCliError::Config(e) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'smog config' to see the expected layout".to_string()),
            },
            SmogCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            SmogCliError::Setup(msg) => CliError {
                code: "SETUP_ERROR".to_string(),
                message: msg,
                hint: Some("Check the http section of the configuration".to_string()),
            },
            SmogCliError::Analysis(e) => {
                let (code, hint) = match &e {
                    AnalysisError::NoData { .. } => (
                        "NO_DATA",
                        "Check the username and location, or try again later",
                    ),
                    AnalysisError::InsufficientJoinedData { .. } => (
                        "INSUFFICIENT_DATA",
                        "Not enough matching data found. Try a more active GitHub user",
                    ),
                    AnalysisError::InvalidInput(_) => (
                        "INVALID_INPUT",
                        "Latitude must be within ±90 and longitude within ±180",
                    ),
                };
                let message = match &e {
                    AnalysisError::NoData { cause, .. } => format!("{e}: {cause}"),
                    _ => e.to_string(),
                };
                CliError {
                    code: code.to_string(),
                    message,
                    hint: Some(hint.to_string()),
                }
            }
        }
    }
}
