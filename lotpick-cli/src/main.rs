mod display;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use lotpick_db::db::{append_entry, clear_entries, count_entries, db_path, delete_entry, get_entry, list_entries, migrate, open_db, HISTORY_LIMIT};
use lotpick_db::models::{HistoryStats, NewHistoryEntry, PickMethod};
use lotpick_engine::api::{GenerateRequest, GenerateResponse, generate};
use lotpick_engine::config::{EngineConfig, GamePreset, load_config, save_config};
use lotpick_engine::engine::Engine;
use lotpick_engine::error::EngineError;
use lotpick_engine::progress::LogProgress;

use crate::display::{display_history, display_pick, display_presets};

#[derive(Parser)]
#[command(name = "lotpick", about = "Lottery number popularity simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate draws and pick the most frequently drawn numbers
    Generate(GenerateArgs),

    /// List the built-in game presets
    Presets,

    /// Browse or edit saved picks
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Print the database path
    DbPath,

    /// Write the default engine configuration to a file
    InitConfig {
        #[arg(short, long, default_value = "engine.json")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List the latest picks
    List {
        #[arg(short, long, default_value_t = HISTORY_LIMIT)]
        last: u32,
    },

    /// Show one pick by id
    Show { id: i64 },

    /// Delete one pick by id
    Delete { id: i64 },

    /// Delete every saved pick
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Game layout to simulate
    #[arg(short, long, default_value = "powerball")]
    preset: GamePreset,

    /// Generation string; repeat for several
    #[arg(short = 's', long = "string")]
    strings: Vec<String>,

    /// Previous winning numbers, separated by spaces or commas
    #[arg(long, default_value = "")]
    prior: String,

    /// Extra iterations added to the derived count
    #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
    bias: i64,

    #[arg(long, allow_negative_numbers = true)]
    main_count: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    main_max: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    secondary_count: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    secondary_max: Option<i64>,

    /// Read the whole request from a JSON file instead of flags
    #[arg(long)]
    request: Option<PathBuf>,

    /// Engine configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Number of worker shards (default: one per core)
    #[arg(long)]
    shards: Option<usize>,

    /// Ceiling on the derived iteration count
    #[arg(long)]
    max_iterations: Option<u64>,

    /// Abort the simulation after this many seconds
    #[arg(long)]
    time_limit: Option<u64>,

    /// Print the response as JSON
    #[arg(long)]
    json: bool,

    /// Do not record the pick in history
    #[arg(long)]
    no_save: bool,

    /// No progress bar
    #[arg(short, long)]
    quiet: bool,
}

impl GenerateArgs {
    fn has_layout_override(&self) -> bool {
        self.main_count.is_some()
            || self.main_max.is_some()
            || self.secondary_count.is_some()
            || self.secondary_max.is_some()
    }

    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("Cannot read engine config {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(shards) = self.shards {
            config.shards = Some(shards);
        }
        if let Some(max) = self.max_iterations {
            config.max_iterations = max;
        }
        if let Some(secs) = self.time_limit {
            config.time_limit_secs = Some(secs);
        }
        Ok(config)
    }

    fn build_request(&self) -> Result<GenerateRequest> {
        if let Some(path) = &self.request {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read {}", path.display()))?;
            return serde_json::from_str(&json)
                .with_context(|| format!("Invalid request JSON in {}", path.display()));
        }

        let mut request = GenerateRequest::for_preset(self.preset, self.strings.clone());
        request.prior_numbers = parse_prior_numbers(&self.prior);
        request.bias = self.bias;
        if let Some(v) = self.main_count {
            request.main_count = v;
        }
        if let Some(v) = self.main_max {
            request.main_max = v;
        }
        if let Some(v) = self.secondary_count {
            request.secondary_count = v;
        }
        if let Some(v) = self.secondary_max {
            request.secondary_max = v;
        }
        Ok(request)
    }

    /// Preset id recorded in history, when the layout is a pure preset.
    fn preset_id(&self) -> Option<String> {
        if self.request.is_some() || self.has_layout_override() {
            None
        } else {
            Some(self.preset.id().to_string())
        }
    }
}

/// Splits on whitespace and commas; tokens that are not integers are skipped.
fn parse_prior_numbers(raw: &str) -> Vec<i64> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => cmd_generate(&args),
        Command::Presets => {
            display_presets(&GamePreset::ALL);
            Ok(())
        }
        Command::History { action } => cmd_history(action),
        Command::DbPath => {
            println!("{}", db_path().display());
            Ok(())
        }
        Command::InitConfig { output } => cmd_init_config(&output),
    }
}

fn open_history() -> Result<lotpick_db::rusqlite::Connection> {
    let conn = open_db(&db_path())?;
    migrate(&conn)?;
    Ok(conn)
}

fn progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> "),
    );
    pb
}

/// Headline for an engine failure: bad input versus a run that broke off.
fn failure_context(err: &EngineError) -> &'static str {
    if err.is_validation() {
        "Request rejected"
    } else {
        "Generation failed"
    }
}

fn engine_failure(err: EngineError) -> anyhow::Error {
    let context = failure_context(&err);
    anyhow::Error::new(err).context(context)
}

fn cmd_generate(args: &GenerateArgs) -> Result<()> {
    let config = args.engine_config()?;
    let request = args.build_request()?;

    // Validation and ceiling check up front, so the bar knows its length.
    request.validate().map_err(engine_failure)?;
    let engine = Engine::new(config);
    let total = engine
        .iteration_count(&request.generation_strings, &request.prior_numbers, request.bias)
        .map_err(engine_failure)?;

    let bar = if args.quiet || args.json {
        None
    } else {
        Some(progress_bar(total))
    };
    let engine = match &bar {
        Some(pb) => engine.with_progress(Arc::new(pb.clone())),
        None if args.json => engine.with_progress(Arc::new(LogProgress)),
        None => engine,
    };

    let result = generate(&engine, &request);
    if let Some(pb) = &bar {
        pb.finish_and_clear();
    }
    let response = result.map_err(engine_failure)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        display_pick(&response);
    }

    if !args.no_save {
        save_pick(args.preset_id(), &response)?;
    }
    Ok(())
}

fn save_pick(preset: Option<String>, response: &GenerateResponse) -> Result<()> {
    let conn = open_history()?;
    let entry = append_entry(
        &conn,
        &NewHistoryEntry {
            method: PickMethod::Generator,
            preset,
            main_numbers: response.main_numbers.clone(),
            secondary_numbers: response.secondary_numbers.clone(),
            stats: Some(HistoryStats {
                total_iterations: response.total_iterations,
                elapsed_seconds: response.elapsed_seconds,
            }),
        },
    )?;
    log::info!("Pick saved to history as #{}", entry.id);
    Ok(())
}

fn cmd_history(action: HistoryAction) -> Result<()> {
    let conn = open_history()?;
    match action {
        HistoryAction::List { last } => {
            if count_entries(&conn)? == 0 {
                println!("No saved picks yet. Run: lotpick generate");
                return Ok(());
            }
            let entries = list_entries(&conn, last)?;
            display_history(&entries);
        }
        HistoryAction::Show { id } => match get_entry(&conn, id)? {
            Some(entry) => display_history(&[entry]),
            None => println!("No pick with id #{id}."),
        },
        HistoryAction::Delete { id } => {
            if delete_entry(&conn, id)? {
                println!("Pick #{id} deleted.");
            } else {
                println!("No pick with id #{id}.");
            }
        }
        HistoryAction::Clear { yes } => {
            let confirmed = yes || {
                let answer = prompt("Clear all history? This cannot be undone. (y/n) : ")?;
                answer.to_lowercase() == "y"
            };
            if confirmed {
                let removed = clear_entries(&conn)?;
                println!("{removed} picks deleted.");
            } else {
                println!("Cancelled.");
            }
        }
    }
    Ok(())
}

fn cmd_init_config(output: &Path) -> Result<()> {
    save_config(&EngineConfig::default(), output)
        .with_context(|| format!("Cannot write {}", output.display()))?;
    println!("Default engine configuration written to {}", output.display());
    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Cannot read input")?;
    Ok(input.trim().to_string())
}
