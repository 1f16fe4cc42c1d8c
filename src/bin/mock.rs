//! Mock CLI - Command-line interface for Synheart Mock
//!
//! Commands:
//! - generate: Generate one day of mock samples (batch payload)
//! - day: Run the full authorize / generate / load cycle against an in-memory store
//! - summarize: Summarize stored sleep intervals
//! - metrics: Print the metric metadata table
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::FixedOffset;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use synheart_mock::encoder::{MockEncoder, SleepView};
use synheart_mock::sleep::summarize;
use synheart_mock::types::{HealthMetric, RawStageInterval};
use synheart_mock::{
    build_batch, DayWindow, InMemoryStore, MockConfig, MockError, MockProcessor, MOCK_VERSION,
    PRODUCER_NAME,
};

/// Mock - On-device mock health data generator
#[derive(Parser)]
#[command(name = "mock")]
#[command(author = "Synheart AI Inc")]
#[command(version = MOCK_VERSION)]
#[command(about = "Generate and summarize mock health data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one day of mock samples
    Generate {
        /// Local calendar date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Local UTC offset in seconds east of UTC
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        utc_offset: i32,

        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Generate a day into an in-memory store and read it back
    Day {
        /// Local calendar date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Local UTC offset in seconds east of UTC
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        utc_offset: i32,

        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Summarize stored sleep intervals
    Summarize {
        /// Input file with a JSON array of intervals (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the metric metadata table
    Metrics {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "synheart_mock=info".into()),
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

fn run(cli: Cli) -> Result<(), MockCliError> {
    match cli.command {
        Commands::Generate {
            date,
            utc_offset,
            seed,
            config,
            output,
            output_format,
        } => cmd_generate(
            &date,
            utc_offset,
            seed,
            config.as_deref(),
            &output,
            &output_format,
        ),

        Commands::Day {
            date,
            utc_offset,
            seed,
            config,
            output_format,
        } => cmd_day(&date, utc_offset, seed, config.as_deref(), &output_format),

        Commands::Summarize { input, json } => cmd_summarize(&input, json),

        Commands::Metrics { json } => cmd_metrics(json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_generate(
    date: &str,
    utc_offset: i32,
    seed: Option<u64>,
    config_path: Option<&Path>,
    output: &Path,
    output_format: &OutputFormat,
) -> Result<(), MockCliError> {
    let config = load_config(config_path, seed)?;
    let window = resolve_window(date, utc_offset)?;

    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let batch = build_batch(&window, &config, &mut rng)?;
    let payload = MockEncoder::new().encode_batch(&window, &batch);
    let output_data = format_output(&payload, output_format)?;

    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_day(
    date: &str,
    utc_offset: i32,
    seed: Option<u64>,
    config_path: Option<&Path>,
    output_format: &OutputFormat,
) -> Result<(), MockCliError> {
    let config = load_config(config_path, seed)?;
    let window = resolve_window(date, utc_offset)?;

    let mut processor = MockProcessor::new(InMemoryStore::new(), config);
    processor.authorize()?;
    processor.generate_day(&window)?;
    let readings = processor.load_day(&window)?;

    let payload = MockEncoder::new().encode_readings(&window, &readings);
    println!("{}", format_output(&payload, output_format)?);

    Ok(())
}

fn cmd_summarize(input: &Path, json: bool) -> Result<(), MockCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let intervals: Vec<RawStageInterval> = serde_json::from_str(&input_data)?;
    let Some(summary) = summarize(&intervals) else {
        return Err(MockCliError::NoData);
    };
    let view = SleepView::from(&summary);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("Sleep Summary");
        println!("=============");
        println!("From:   {}", view.start_utc);
        println!("To:     {}", view.end_utc);
        println!("Total:  {:.1} min", view.total_minutes);
        println!("Asleep: {:.1} min", view.asleep_minutes);
        println!("\nStages:");
        for stage in &view.stages {
            println!(
                "  {:<6} {:>7.1} min  {:>5.1}%",
                stage.stage.display_name(),
                stage.minutes,
                stage.percentage
            );
        }
    }

    Ok(())
}

fn cmd_metrics(json: bool) -> Result<(), MockCliError> {
    let mut metrics = HealthMetric::ALL;
    metrics.sort_by_key(|m| m.spec().rank);

    if json {
        let entries: Vec<serde_json::Value> = metrics
            .iter()
            .map(|m| {
                serde_json::json!({
                    "metric": m,
                    "title": m.title(),
                    "unit": m.unit(),
                    "range": m.spec().range,
                    "rank": m.spec().rank,
                    "rounding": m.spec().rounding,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for m in metrics {
            let (low, high) = m.spec().range;
            println!(
                "{:<28} {:<6} {:>8} - {:<8}",
                m.title(),
                m.unit(),
                low,
                high
            );
        }
    }

    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), MockCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "mock_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Mock version {}", MOCK_VERSION),
    });

    if let Some(config_path) = config {
        if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(content) => match MockConfig::from_json(&content) {
                    Ok(parsed) => checks.push(DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid ({} range overrides, seed {})",
                            parsed.ranges.len(),
                            parsed
                                .seed
                                .map(|s| s.to_string())
                                .unwrap_or_else(|| "unset".to_string())
                        ),
                    }),
                    Err(e) => checks.push(DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: e.to_string(),
                    }),
                },
                Err(e) => checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {}", e),
                }),
            }
        } else {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist".to_string(),
            });
        }
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass intervals with --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (summarize --input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: MOCK_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Mock Doctor Report");
        println!("==================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(MockCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn load_config(path: Option<&Path>, seed: Option<u64>) -> Result<MockConfig, MockCliError> {
    let mut config = match path {
        Some(path) => MockConfig::from_json(&fs::read_to_string(path)?)?,
        None => MockConfig::default(),
    };
    if seed.is_some() {
        config.seed = seed;
    }
    Ok(config)
}

fn resolve_window(date: &str, utc_offset: i32) -> Result<DayWindow, MockCliError> {
    let offset = FixedOffset::east_opt(utc_offset).ok_or_else(|| {
        MockError::InvalidInput(format!("UTC offset {utc_offset}s is out of range"))
    })?;
    Ok(DayWindow::for_date(DayWindow::parse_date(date)?, &offset)?)
}

fn format_output<T: serde::Serialize>(
    payload: &T,
    format: &OutputFormat,
) -> Result<String, MockCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(payload)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(payload)?),
    }
}

// Error types

#[derive(Debug)]
enum MockCliError {
    Io(io::Error),
    Mock(MockError),
    Json(serde_json::Error),
    NoData,
    DoctorFailed,
}

impl From<io::Error> for MockCliError {
    fn from(e: io::Error) -> Self {
        MockCliError::Io(e)
    }
}

impl From<MockError> for MockCliError {
    fn from(e: MockError) -> Self {
        MockCliError::Mock(e)
    }
}

impl From<serde_json::Error> for MockCliError {
    fn from(e: serde_json::Error) -> Self {
        MockCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MockCliError> for CliError {
    fn from(e: MockCliError) -> Self {
        match e {
            MockCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MockCliError::Mock(e) => {
                let (code, hint) = match &e {
                    MockError::InvalidInput(_) => ("INVALID_INPUT", "Check the date and offset"),
                    MockError::DateParseError(_) => ("DATE_PARSE_ERROR", "Use YYYY-MM-DD dates"),
                    MockError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Run 'mock doctor --config <file>' for details")
                    }
                    MockError::Unauthorized => ("UNAUTHORIZED", "Authorize the store first"),
                    MockError::StoreError(_) => ("STORE_ERROR", "The write was not applied"),
                    MockError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            MockCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            MockCliError::NoData => CliError {
                code: "NO_DATA".to_string(),
                message: "No usable sleep intervals found in input".to_string(),
                hint: Some("Intervals need a known code and end after start".to_string()),
            },
            MockCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
