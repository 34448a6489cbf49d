use chrono::Local;
use clap::{Parser, Subcommand};
use overload_core::dashboard::{DashboardView, HistoryDay, ProgressSeries};
use overload_core::view::ExerciseView;
use overload_core::*;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "overload")]
#[command(about = "Progressive overload strength workout tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage backend (local, sheets, memory)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show streak, weekly goal and recent gains (default)
    Dashboard {
        /// Print the dashboard as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a workout, reading commands from stdin
    Workout,

    /// Show logged workouts grouped by day
    History {
        /// Print history as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show value history for weighted and bodyweight exercises
    Progress {
        /// Print progress as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the full log to CSV
    Export {
        /// Destination file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the interactive screen readable
    let default_level = match cli.command {
        Some(Commands::Workout) => "warn",
        _ => "info",
    };
    overload_core::logging::init_with_level(default_level);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let backend = match &cli.backend {
        Some(name) => name.parse()?,
        None => config.sync.backend,
    };

    let gateway = open_gateway(backend, &data_dir, &config)?;
    let mut tracker = Tracker::new(config.catalog()?, gateway, TrackerOptions::from(&config));
    if let Err(e) = tracker.load() {
        eprintln!("⚠ Could not load saved data ({}); using starting values.", e);
    }

    let today = Local::now().date_naive();
    match cli.command.unwrap_or(Commands::Dashboard { json: false }) {
        Commands::Dashboard { json } => {
            let view = tracker.dashboard(today);
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                display_dashboard(&view, tracker.sync_status());
            }
            Ok(())
        }
        Commands::Workout => cmd_workout(&mut tracker),
        Commands::History { json } => {
            let days = tracker.history(today);
            if json {
                println!("{}", serde_json::to_string_pretty(&days)?);
            } else {
                display_history(&days);
            }
            Ok(())
        }
        Commands::Progress { json } => {
            let series = tracker.progress();
            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else {
                display_progress(&series);
            }
            Ok(())
        }
        Commands::Export { path } => cmd_export(&tracker, &path),
    }
}

fn open_gateway(backend: Backend, data_dir: &Path, config: &Config) -> Result<Box<dyn Gateway>> {
    tracing::debug!("Using {:?} backend", backend);
    Ok(match backend {
        Backend::Local => {
            std::fs::create_dir_all(data_dir.join("wal"))?;
            Box::new(LocalGateway::new(data_dir))
        }
        Backend::Sheets => Box::new(SheetsGateway::new(config.sheets.clone())?),
        Backend::Memory => Box::new(MemoryGateway::new()),
    })
}

fn cmd_export<G: Gateway>(tracker: &Tracker<G>, path: &Path) -> Result<()> {
    let count = export_log_csv(tracker.log(), path)?;
    println!("✓ Exported {} log entries", count);
    println!("  CSV: {}", path.display());
    Ok(())
}

// ============================================================================
// Workout
// ============================================================================

/// One line of workout input
#[derive(Debug, PartialEq)]
enum Input {
    Log(String),
    Adjust(i64),
    Set(u32),
    Acknowledge,
    Skip,
    Back,
    Date(i64),
    Help,
    Quit,
}

fn parse_input(line: &str) -> std::result::Result<Input, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_lowercase().as_str() {
        "" => Ok(Input::Log(String::new())),
        "log" | "l" => Ok(Input::Log(rest.to_string())),
        "ok" => Ok(Input::Acknowledge),
        "skip" | "s" => Ok(Input::Skip),
        "back" | "b" => Ok(Input::Back),
        "help" | "?" => Ok(Input::Help),
        "quit" | "q" => Ok(Input::Quit),
        "+" => Ok(Input::Adjust(1)),
        "-" => Ok(Input::Adjust(-1)),
        "date" => rest
            .parse::<i64>()
            .map(Input::Date)
            .map_err(|_| format!("date needs a day offset like +1 or -1, got {:?}", rest)),
        _ if rest.is_empty() => parse_reps(word),
        _ => Err(format!("Unknown command: {}", line)),
    }
}

fn parse_reps(word: &str) -> std::result::Result<Input, String> {
    let invalid = || format!("Unknown command: {}", word);
    if let Some(n) = word.strip_prefix('+') {
        n.parse::<i64>().map(Input::Adjust).map_err(|_| invalid())
    } else if word.starts_with('-') {
        word.parse::<i64>().map(Input::Adjust).map_err(|_| invalid())
    } else {
        word.strip_prefix('=')
            .unwrap_or(word)
            .parse::<u32>()
            .map(Input::Set)
            .map_err(|_| invalid())
    }
}

fn cmd_workout<G: Gateway>(tracker: &mut Tracker<G>) -> Result<()> {
    tracker.start(Local::now());
    display_exercise(tracker);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let input = match parse_input(&line?) {
            Ok(input) => input,
            Err(message) => {
                println!("{}  (type help for commands)", message);
                continue;
            }
        };

        let now = Local::now();
        let outcome = match input {
            Input::Quit => break,
            Input::Help => {
                display_help();
                continue;
            }
            Input::Adjust(delta) => {
                tracker.adjust_reps(delta);
                display_reps(tracker);
                continue;
            }
            Input::Set(reps) => {
                tracker.set_reps(reps);
                display_reps(tracker);
                continue;
            }
            Input::Date(days) => {
                tracker.adjust_date(days);
                display_exercise(tracker);
                continue;
            }
            Input::Back => {
                if tracker.back() {
                    display_exercise(tracker);
                } else {
                    println!("Nothing to go back to.");
                }
                continue;
            }
            Input::Log(notes) => tracker.log_current(&notes, now),
            Input::Acknowledge => tracker.acknowledge_level_up(now),
            Input::Skip => tracker.skip(now),
        };

        match outcome {
            Outcome::Ignored => {
                if let Some(Phase::LevelUp(_)) = tracker.session().map(|s| s.phase()) {
                    println!("Type ok to continue.");
                } else {
                    println!("Nothing to do.");
                }
            }
            Outcome::Advanced => display_exercise(tracker),
            Outcome::LevelUp(level_up) => {
                println!();
                println!("  ★ LEVEL UP! {}", level_up.message);
                println!("  Type ok to continue.");
            }
            Outcome::Completed(summary) => {
                display_summary(&summary);
                break;
            }
        }
    }

    match tracker.finish() {
        Some(FlushOutcome::Saved) => println!("✓ Workout saved"),
        Some(FlushOutcome::Failed(e)) => {
            println!("⚠ Could not save workout: {}", e);
            println!("  Sync status: {}", tracker.sync_status());
        }
        None => {}
    }
    Ok(())
}

// ============================================================================
// Display
// ============================================================================

fn display_help() {
    println!("  Enter / log [notes]  log this exercise");
    println!("  +N / -N              adjust reps");
    println!("  N / =N               set reps");
    println!("  ok                   continue after a level-up");
    println!("  skip                 skip this exercise");
    println!("  back                 undo the last step");
    println!("  date +N / date -N    move the workout date");
    println!("  quit                 end the workout");
}

fn display_exercise<G: Gateway>(tracker: &Tracker<G>) {
    let Some(view) = tracker.exercise_view(Local::now()) else {
        return;
    };
    print_exercise(&view);
}

fn print_exercise(view: &ExerciseView) {
    println!("\n╭─────────────────────────────────────────╮");
    println!(
        "│  {}  {}  ({})",
        view.progress, view.kind_label, view.workout_date
    );
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  {}", view.name);
    if view.unit_text.is_empty() {
        println!("  {}", view.value_text);
    } else {
        println!("  {} {}", view.value_text, view.unit_text);
    }
    println!("  {}", view.target_text);
    if !view.is_warmup {
        println!("  Reps: {}", view.reps);
    }
    println!("  Elapsed: {}", view.elapsed);
    println!();
}

fn display_reps<G: Gateway>(tracker: &Tracker<G>) {
    if let Some(session) = tracker.session() {
        println!("  Reps: {}", session.reps());
    }
}

fn display_summary(summary: &CompletionSummary) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  WORKOUT COMPLETE");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Exercises: {}", summary.exercises_completed);
    println!("  Level-ups: {}", summary.progressions);
    println!("  Streak:    {} days", summary.streak);
    println!("  Time:      {}", summary.elapsed);
    println!();
}

fn display_dashboard(view: &DashboardView, sync: SyncStatus) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  OVERLOAD                    [{}]", sync);
    println!("╰─────────────────────────────────────────╯");
    println!();
    print!("  Streak: {} days", view.streak);
    if view.streak_at_risk {
        print!("  (at risk)");
    }
    println!();

    let dots: String = view
        .weekly_dots
        .iter()
        .map(|done| if *done { '●' } else { '○' })
        .collect();
    println!(
        "  This week: {} / {}  {}",
        view.weekly_count, view.weekly_goal, dots
    );
    println!("  Weight added: {} lbs", view.total_weight_added);
    println!("  Workouts: {}", view.total_workouts);

    if !view.recent_gains.is_empty() {
        println!();
        println!("  Recent gains:");
        for gain in &view.recent_gains {
            println!("    {} → {}", gain.name, gain.value_text);
        }
    }

    println!();
    for week in view.calendar.chunks(7) {
        let row: Vec<&str> = week
            .iter()
            .map(|day| match (day.today, day.active) {
                (true, true) => "◆",
                (true, false) => "◇",
                (false, true) => "■",
                (false, false) => "·",
            })
            .collect();
        println!("  {}", row.join(" "));
    }

    println!();
    println!("  {}  (overload workout)", view.start_label);
    println!();
}

fn display_history(days: &[HistoryDay]) {
    if days.is_empty() {
        println!("No workouts logged yet.");
        return;
    }

    for day in days {
        println!();
        if day.progressions > 0 {
            println!("{}  ({} level-ups)", day.label, day.progressions);
        } else {
            println!("{}", day.label);
        }
        for entry in &day.entries {
            if entry.notes.is_empty() {
                println!("  {:<16} {}", entry.name, entry.summary());
            } else {
                println!("  {:<16} {}  {}", entry.name, entry.summary(), entry.notes);
            }
        }
    }
}

fn display_progress(series: &[ProgressSeries]) {
    if series.is_empty() {
        println!("No progress to show yet.");
        return;
    }

    for s in series {
        println!();
        println!("{}  (now {})", s.name, s.current_text);
        for (date, value) in &s.points {
            println!("  {}  {}", date, value);
        }
    }
}
