use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use persona_reflect::{Config, Orchestrator, PersonaResponse};

/// Ask four coaching personas about a dilemma and distill their advice
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fan a dilemma out to every persona and synthesize suggested actions
    Reflect {
        dilemma: String,
        #[arg(long, default_value = "cli_user")]
        user: String,
        /// JSON object with recent_dilemmas / growth_area
        #[arg(long)]
        context: Option<PathBuf>,
    },
    /// Build a 5-7 step action plan from saved persona responses
    Plan {
        #[arg(long)]
        entry_id: String,
        /// JSON array of persona responses
        #[arg(long)]
        responses: PathBuf,
        #[arg(long)]
        preferences: Option<PathBuf>,
    },
    /// List the persona registry
    Personas,
    /// Suggest free calendar slots
    Slots {
        #[arg(long, default_value = "7")]
        days: u32,
        #[arg(long, default_value = "60")]
        duration: u32,
        #[arg(long)]
        start_hour: Option<u32>,
        #[arg(long)]
        end_hour: Option<u32>,
        #[arg(long, default_value = "3")]
        topk: usize,
    },
    /// Rational analysis of a dilemma plus free slots to act on it
    Alex {
        dilemma: String,
        #[arg(long, default_value = "cli_user")]
        user: String,
        #[arg(long, default_value = "3")]
        days: u32,
        #[arg(long, default_value = "60")]
        duration: u32,
        #[arg(long)]
        start_hour: Option<u32>,
        #[arg(long)]
        end_hour: Option<u32>,
        #[arg(long, default_value = "3")]
        topk: usize,
    },
    /// Book a calendar block
    Book {
        #[arg(long)]
        title: String,
        /// e.g. 2025-03-11T09:00:00
        #[arg(long)]
        start_iso: String,
        #[arg(long, default_value = "60")]
        duration: u32,
        #[arg(long, default_value = "")]
        description: String,
    },
}

fn work_hours(
    orchestrator: &Orchestrator,
    start_hour: Option<u32>,
    end_hour: Option<u32>,
) -> Option<(u32, u32)> {
    if start_hour.is_none() && end_hour.is_none() {
        return None;
    }
    let (default_start, default_end) = orchestrator.work_hours();
    Some((
        start_hour.unwrap_or(default_start),
        end_hour.unwrap_or(default_end),
    ))
}

fn read_object(path: &Path) -> Result<Map<String, Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    match serde_json::from_str(&raw)? {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} must contain a JSON object", path.display()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    // Logs go to stderr; stdout carries JSON only
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let orchestrator = Orchestrator::from_config(&config)?;

    match args.command {
        Command::Reflect {
            dilemma,
            user,
            context,
        } => {
            let context = match context {
                Some(path) => read_object(&path)?,
                None => Map::new(),
            };
            let result = orchestrator.process_dilemma(&user, &dilemma, context).await?;
            print_json(&result)?;
        }
        Command::Plan {
            entry_id,
            responses,
            preferences,
        } => {
            let raw = std::fs::read_to_string(&responses)
                .with_context(|| format!("reading {}", responses.display()))?;
            let responses: Vec<PersonaResponse> = serde_json::from_str(&raw)?;
            let preferences = match preferences {
                Some(path) => read_object(&path)?,
                None => Map::new(),
            };
            let plan = orchestrator
                .create_action_plan(&entry_id, &responses, &preferences)
                .await?;
            print_json(&plan)?;
        }
        Command::Personas => print_json(&orchestrator.personas())?,
        Command::Slots {
            days,
            duration,
            start_hour,
            end_hour,
            topk,
        } => {
            let hours = work_hours(&orchestrator, start_hour, end_hour);
            let slots = orchestrator.suggest_slots(days, duration, hours, topk).await?;
            print_json(&slots)?;
        }
        Command::Alex {
            dilemma,
            user,
            days,
            duration,
            start_hour,
            end_hour,
            topk,
        } => {
            let hours = work_hours(&orchestrator, start_hour, end_hour);
            let suggestion = orchestrator
                .analyst_schedule(&user, &dilemma, days, duration, hours, topk)
                .await?;
            print_json(&suggestion)?;
        }
        Command::Book {
            title,
            start_iso,
            duration,
            description,
        } => {
            let booked = orchestrator
                .book_block(&title, &start_iso, duration, &description)
                .await?;
            print_json(&booked)?;
        }
    }

    Ok(())
}
