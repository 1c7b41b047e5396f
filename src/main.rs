use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use trainready::config::AppConfig;
use trainready::database::SqliteStore;
use trainready::dispatcher::{DispatchResponse, Dispatcher};
use trainready::logging::{init_logging, LogFormat, LogLevel};
use trainready::models::ExerciseEntry;

/// trainready - Training readiness and load progression
///
/// Records daily DOMS surveys and session RPE logs, scores readiness and
/// suggests the load for the next session.
#[derive(Parser)]
#[command(name = "trainready")]
#[command(version)]
#[command(about = "Training readiness and load progression engine", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (":memory:" for a throwaway store)
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); overrides the config file
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<LogLevel>,

    /// Log format (pretty, json, compact); overrides the config file
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<LogFormat>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch one raw JSON request
    Request {
        /// Request file (reads stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Submit a DOMS recovery survey
    Survey {
        #[arg(short, long)]
        user: String,

        #[arg(long, default_value = "0")]
        chest: i64,
        #[arg(long, default_value = "0")]
        back: i64,
        #[arg(long, default_value = "0")]
        legs: i64,
        #[arg(long, default_value = "0")]
        arms: i64,
        #[arg(long, default_value = "0")]
        shoulders: i64,
        #[arg(long, default_value = "0")]
        core: i64,

        /// Whole-body soreness (0-10)
        #[arg(long)]
        overall: i64,

        /// Sleep quality (1-10)
        #[arg(long)]
        sleep: i64,

        /// Energy level (1-10)
        #[arg(long)]
        energy: i64,

        /// Motivation (1-10)
        #[arg(long)]
        motivation: i64,

        #[arg(long)]
        notes: Option<String>,

        /// Survey date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Log a completed training session
    Session {
        #[arg(short, long)]
        user: String,

        /// Session RPE (1-10)
        #[arg(long)]
        rpe: i64,

        /// Duration in minutes (default 60)
        #[arg(long)]
        duration: Option<Decimal>,

        /// Exercise as NAME:SETS:REPS:WEIGHT (repeatable)
        #[arg(short, long = "exercise", value_parser = parse_exercise)]
        exercises: Vec<ExerciseEntry>,

        #[arg(long)]
        notes: Option<String>,

        /// Session date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Suggest the load for the next session
    Suggest {
        #[arg(short, long)]
        user: String,

        /// Load used last time (0 for a new exercise)
        #[arg(short, long, default_value = "0")]
        load: Decimal,

        /// compound or isolation
        #[arg(short = 't', long, default_value = "compound")]
        exercise_type: String,
    },

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let request = match cli.command {
        Commands::InitConfig { force } => return init_config(cli.config.as_deref(), force),

        Commands::Request { file } => read_request(file.as_deref())?,

        Commands::Survey {
            user,
            chest,
            back,
            legs,
            arms,
            shoulders,
            core,
            overall,
            sleep,
            energy,
            motivation,
            notes,
            date,
        } => with_optional(
            json!({
                "action": "submit_doms",
                "user_id": user,
                "chest_soreness": chest,
                "back_soreness": back,
                "legs_soreness": legs,
                "arms_soreness": arms,
                "shoulders_soreness": shoulders,
                "core_soreness": core,
                "overall_soreness": overall,
                "sleep_quality": sleep,
                "energy_level": energy,
                "motivation": motivation,
            }),
            notes,
            date,
        ),

        Commands::Session {
            user,
            rpe,
            duration,
            exercises,
            notes,
            date,
        } => {
            let mut request = json!({
                "action": "log_session",
                "user_id": user,
                "session_rpe": rpe,
                "exercises": serde_json::to_value(&exercises)?,
            });
            if let Some(duration) = duration {
                request["duration_minutes"] = serde_json::to_value(duration)?;
            }
            with_optional(request, notes, date)
        }

        Commands::Suggest {
            user,
            load,
            exercise_type,
        } => json!({
            "action": "get_suggestion",
            "user_id": user,
            "current_load": serde_json::to_value(load)?,
            "exercise_type": exercise_type,
        }),
    };

    let config = AppConfig::load(cli.config.as_deref())?;
    let log_config = config
        .logging
        .clone()
        .with_overrides(cli.log_level, cli.log_format)
        .with_verbosity(cli.verbose);
    init_logging(&log_config)?;

    let db_path = cli.db.unwrap_or_else(|| config.storage.database_path.clone());
    let store = open_store(&db_path)?;
    let dispatcher = Dispatcher::with_config(
        store,
        config.progression.clone(),
        config.trends.clone(),
        config.workload.clone(),
    )
    .with_recommendation_thresholds(config.recommendations);

    let response = dispatcher.handle(&request);
    print_response(&response)
}

fn init_config(path: Option<&Path>, force: bool) -> Result<()> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_config_path);

    if path.exists() && !force {
        bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    AppConfig::default().save_to_file(&path)?;
    println!(
        "{}",
        format!("✓ Wrote default configuration to {}", path.display()).green()
    );
    Ok(())
}

fn open_store(path: &Path) -> Result<SqliteStore> {
    if path == Path::new(":memory:") {
        return Ok(SqliteStore::in_memory()?);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
    }

    SqliteStore::new(path)
        .with_context(|| format!("Failed to open database: {}", path.display()))
}

fn read_request(file: Option<&Path>) -> Result<Value> {
    let raw = match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read request from stdin")?;
            buffer
        }
    };

    serde_json::from_str(&raw).context("Request is not valid JSON")
}

fn with_optional(mut request: Value, notes: Option<String>, date: Option<NaiveDate>) -> Value {
    if let Some(notes) = notes {
        request["notes"] = Value::String(notes);
    }
    if let Some(date) = date {
        request["date"] = Value::String(date.to_string());
    }
    request
}

/// NAME:SETS:REPS:WEIGHT
fn parse_exercise(raw: &str) -> std::result::Result<ExerciseEntry, String> {
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() != 4 {
        return Err(format!("expected NAME:SETS:REPS:WEIGHT, got '{}'", raw));
    }

    let number = |label: &str, value: &str| {
        value
            .trim()
            .parse::<Decimal>()
            .map_err(|_| format!("{} must be a number, got '{}'", label, value))
    };

    Ok(ExerciseEntry {
        exercise_name: Some(parts[0].trim().to_string()).filter(|name| !name.is_empty()),
        sets: number("sets", parts[1])?,
        avg_reps: number("reps", parts[2])?,
        avg_weight: number("weight", parts[3])?,
    })
}

fn print_response(response: &DispatchResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&response.body)?);

    if response.is_success() {
        eprintln!("{}", "✓ Request completed".green());
        Ok(())
    } else {
        let message = response.body["error"].as_str().unwrap_or("request failed");
        eprintln!("{}", format!("✗ {}", message).red().bold());
        bail!("request failed with status {}", response.status)
    }
}
