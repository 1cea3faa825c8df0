mod commands;
mod input;
mod render;

use std::io::IsTerminal;

use anyhow::{Result, anyhow};
use clap::{ArgGroup, Parser, Subcommand};
use organizer_core::organizer::Organizer;
use owo_colors::OwoColorize;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "organizer")]
#[command(about = "Plan events with reminders and estimate income tax")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List occurrences in a window, grouped by day
    Events {
        /// Window start (default: today)
        #[arg(long)]
        from: Option<String>,

        /// Window end (default: 7 days after --from)
        #[arg(long)]
        to: Option<String>,

        /// Print occurrences as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create an event
    New {
        title: String,

        /// Start date/time (e.g., "2025-03-20T15:00", "tomorrow 3pm")
        #[arg(short, long)]
        start: String,

        /// End date/time
        #[arg(short, long, conflicts_with = "duration")]
        end: Option<String>,

        /// Length instead of an end (e.g., "1h", "30m")
        #[arg(short, long)]
        duration: Option<String>,

        /// Recurrence rule (e.g., "FREQ=WEEKLY;COUNT=4")
        #[arg(short, long)]
        repeat: Option<String>,

        /// Reminder offset in minutes before the start (repeatable)
        #[arg(long = "remind", value_name = "MINUTES")]
        reminders: Vec<u32>,

        /// Mark as an all-day event
        #[arg(long)]
        all_day: bool,

        #[arg(long)]
        description: Option<String>,
    },
    /// Change an event; its reminders are rescheduled
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        /// New start; the event keeps its length unless --end/--duration is given
        #[arg(short, long)]
        start: Option<String>,

        #[arg(short, long, conflicts_with = "duration")]
        end: Option<String>,

        #[arg(short, long)]
        duration: Option<String>,

        #[arg(short, long, conflicts_with = "no_repeat")]
        repeat: Option<String>,

        /// Make the event non-recurring
        #[arg(long)]
        no_repeat: bool,

        /// Replace reminder offsets (default: keep the current ones)
        #[arg(long = "remind", value_name = "MINUTES", conflicts_with = "no_reminders")]
        reminders: Vec<u32>,

        /// Drop all pending reminders
        #[arg(long)]
        no_reminders: bool,
    },
    /// Cancel an event and its pending reminders
    Cancel { id: String },
    /// Show the reminders of an event
    Reminders { id: String },
    /// Estimate progressive income tax
    #[command(group(ArgGroup::new("income").required(true).args(["monthly_income", "annual_income"])))]
    Tax {
        #[arg(long, value_parser = input::parse_amount, allow_hyphen_values = true)]
        monthly_income: Option<Decimal>,

        #[arg(long, value_parser = input::parse_amount, allow_hyphen_values = true)]
        annual_income: Option<Decimal>,

        /// Annual deductions
        #[arg(long, value_parser = input::parse_amount, allow_hyphen_values = true, default_value = "0")]
        deductions: Decimal,

        /// Tax year (default: config default_tax_year, else the current year)
        #[arg(long)]
        year: Option<i32>,

        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("{}", format!("Error: {e:#}").red());
        std::process::exit(2);
    }

    if let Err(e) = run(cli.command) {
        eprintln!("{}", format!("Error: {e:#}").red());
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    let organizer = Organizer::load()?;

    match command {
        Commands::Events { from, to, json } => commands::events::run(
            &organizer,
            commands::events::Window {
                from: from.as_deref(),
                to: to.as_deref(),
            },
            json,
        ),
        Commands::New {
            title,
            start,
            end,
            duration,
            repeat,
            reminders,
            all_day,
            description,
        } => commands::new::run(
            &organizer,
            commands::new::NewEvent {
                title,
                start,
                end,
                duration,
                repeat,
                reminders,
                all_day,
                description,
            },
        ),
        Commands::Edit {
            id,
            title,
            start,
            end,
            duration,
            repeat,
            no_repeat,
            reminders,
            no_reminders,
        } => commands::edit::run(
            &organizer,
            &id,
            commands::edit::EventChanges {
                title,
                start,
                end,
                duration,
                repeat,
                no_repeat,
                reminders,
                no_reminders,
            },
        ),
        Commands::Cancel { id } => commands::cancel::run(&organizer, &id),
        Commands::Reminders { id } => commands::reminders::run(&organizer, &id),
        Commands::Tax {
            monthly_income,
            annual_income,
            deductions,
            year,
            json,
        } => {
            let income = match (monthly_income, annual_income) {
                (Some(monthly), _) => commands::tax::Income::Monthly(monthly),
                (None, Some(annual)) => commands::tax::Income::Annual(annual),
                (None, None) => return Err(anyhow!("either --monthly-income or --annual-income is required")),
            };
            commands::tax::run(&organizer, income, deductions, year, json)
        }
    }
}

fn init_tracing(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init()
        .map_err(|e| anyhow!("failed to initialize tracing subscriber: {e}"))?;

    Ok(())
}
