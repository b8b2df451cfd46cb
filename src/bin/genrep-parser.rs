//! Generals / Zero Hour replay (.rep) parser CLI
//!
//! A command-line interface for inspecting, parsing, and following
//! replay files.
//!
//! ## Commands
//!
//! - `info` - Display quick replay metadata
//! - `parse` - Parse a replay with output format options
//! - `summary` - Per-player match summary
//! - `validate` - Validate replay format (exit codes for scripting)
//! - `batch` - Process every replay in a directory
//! - `stream` - Follow a replay that is still being written

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use genrep_parser::replay::Replay;
use genrep_parser::stores::GameData;
use genrep_parser::streaming::{stream_replay, CancelToken, StreamOptions};

/// Generals / Zero Hour replay (.rep) parser
#[derive(Parser)]
#[command(name = "genrep-parser")]
#[command(about = "Command & Conquer: Generals / Zero Hour replay parser", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the game's Data/INI directory
    #[arg(long, global = true, default_value = "Data/INI")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display replay information
    Info {
        /// Path to the replay file
        file: PathBuf,
    },
    /// Parse a replay file
    Parse {
        /// Path to the replay file
        file: PathBuf,
        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
        /// Include all events in the output
        #[arg(long)]
        events: bool,
        /// Include the per-player summary
        #[arg(long)]
        summary: bool,
    },
    /// Print the per-player match summary
    Summary {
        /// Path to the replay file
        file: PathBuf,
    },
    /// Validate replay format
    Validate {
        /// Path to the replay file
        file: PathBuf,
        /// Verbose reporting
        #[arg(short, long)]
        verbose: bool,
    },
    /// Summarize every replay in a directory
    Batch {
        /// Directory containing replay files
        directory: PathBuf,
        /// Continue past replays that fail to open
        #[arg(long)]
        continue_on_error: bool,
    },
    /// Follow a replay that is still being written
    Stream {
        /// Path to the replay file
        file: PathBuf,
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 100)]
        poll_ms: u64,
        /// Close after this many seconds without a new event
        #[arg(long, default_value_t = 120)]
        inactivity_secs: u64,
    },
}

/// Output format options
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let data = match GameData::load(&cli.data) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("error: could not load game data from {}: {e}", cli.data.display());
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Info { file } => cmd_info(&file, &data),
        Commands::Parse {
            file,
            output,
            events,
            summary,
        } => cmd_parse(&file, &data, &output, events, summary),
        Commands::Summary { file } => cmd_summary(&file, &data),
        Commands::Validate { file, verbose } => cmd_validate(&file, &data, verbose),
        Commands::Batch {
            directory,
            continue_on_error,
        } => cmd_batch(&directory, &data, continue_on_error),
        Commands::Stream {
            file,
            poll_ms,
            inactivity_secs,
        } => cmd_stream(&file, data, poll_ms, inactivity_secs),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_info(file: &Path, data: &GameData) -> genrep_parser::Result<()> {
    let replay = Replay::from_file(file, data)?;
    let header = &replay.header;

    println!("File:        {}", file.display());
    println!("Format tag:  {}", header.game_type);
    println!("Valid:       {}", header.is_valid());
    println!("Saved:       {}", header.wall_clock);
    println!("Version:     {}", header.version);
    println!("Build date:  {}", header.build_date);
    println!("Map:         {}", header.metadata.map_file);
    println!("Seed:        {}", header.metadata.seed);
    println!("Credits:     {}", header.metadata.starting_credits);
    if let Some(duration) = header.duration_secs() {
        println!("Duration:    {duration}s");
    }
    println!("Events:      {}", replay.body.len());
    println!("Players:");
    for player in &header.metadata.players {
        println!(
            "  {} ({}) team {} color {}",
            player.name, player.kind, player.team, player.color
        );
    }
    Ok(())
}

fn cmd_parse(
    file: &Path,
    data: &GameData,
    output: &OutputFormat,
    events: bool,
    summary: bool,
) -> genrep_parser::Result<()> {
    let replay = Replay::from_file(file, data)?;

    match output {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "header": replay.header,
                "offset": replay.offset,
                "events": events.then_some(&replay.body),
                "summary": summary.then_some(&replay.summary),
            });
            println!("{}", serde_json::to_string_pretty(&value).expect("serializable"));
        }
        OutputFormat::Pretty => {
            println!(
                "{} on {} ({} events, offset {})",
                replay.header.file_name,
                replay.header.metadata.map_file,
                replay.body.len(),
                replay.offset
            );
            if events {
                for event in &replay.body {
                    print_event(event);
                }
            }
            if summary {
                print_summary(&replay);
            }
        }
    }
    Ok(())
}

fn cmd_summary(file: &Path, data: &GameData) -> genrep_parser::Result<()> {
    let replay = Replay::from_file(file, data)?;
    print_summary(&replay);
    Ok(())
}

fn cmd_validate(file: &Path, data: &GameData, verbose: bool) -> genrep_parser::Result<()> {
    let replay = Replay::from_file(file, data)?;

    let mut problems = Vec::new();
    if !replay.header.is_valid() {
        problems.push(format!(
            "format tag is {:?}, expected \"GENREP\"",
            replay.header.game_type
        ));
    }
    if replay.header.metadata.players.is_empty() {
        problems.push("metadata carries no players".to_string());
    }
    if replay.body.is_empty() {
        problems.push("no body events decoded".to_string());
    }

    if verbose {
        println!(
            "{}: {} events, {} players, offset {}",
            file.display(),
            replay.body.len(),
            replay.summary.len(),
            replay.offset
        );
        for problem in &problems {
            println!("  problem: {problem}");
        }
    }

    if problems.is_empty() {
        println!("{}: OK", file.display());
        Ok(())
    } else {
        Err(genrep_parser::ParserError::MalformedDataFile {
            reason: format!("{} problem(s) found", problems.len()),
        })
    }
}

fn cmd_batch(
    directory: &Path,
    data: &GameData,
    continue_on_error: bool,
) -> genrep_parser::Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(directory)
        .map_err(genrep_parser::ParserError::Io)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "rep"))
        .collect();
    entries.sort();

    let mut failures = 0usize;
    for path in &entries {
        match Replay::from_file(path, data) {
            Ok(replay) => {
                let winner = replay
                    .summary
                    .iter()
                    .find(|p| p.win)
                    .map_or("-", |p| p.name.as_str());
                println!(
                    "{}: {} players on {}, {} events, winner {}",
                    path.display(),
                    replay.summary.len(),
                    replay.header.metadata.map_file,
                    replay.body.len(),
                    winner
                );
            }
            Err(e) => {
                failures += 1;
                eprintln!("{}: {e}", path.display());
                if !continue_on_error {
                    return Err(e);
                }
            }
        }
    }

    println!("{} replay(s), {failures} failure(s)", entries.len());
    Ok(())
}

fn cmd_stream(
    file: &Path,
    data: GameData,
    poll_ms: u64,
    inactivity_secs: u64,
) -> genrep_parser::Result<()> {
    let options = StreamOptions {
        poll_interval: Duration::from_millis(poll_ms),
        inactivity_timeout: Duration::from_secs(inactivity_secs),
        ..StreamOptions::default()
    };
    let cancel = CancelToken::new();
    let (live, events) = stream_replay(file, Arc::new(data), options, cancel)?;

    println!(
        "Streaming {} on {}",
        live.header.file_name, live.header.metadata.map_file
    );
    for event in events {
        print_event(&event);
    }
    println!("stream closed (offset {})", live.offset());
    Ok(())
}

fn print_event(event: &genrep_parser::BodyChunk) {
    let name = if event.order_name.is_empty() {
        "?"
    } else {
        event.order_name
    };
    let who = if event.player_name.is_empty() {
        format!("id {}", event.player_id)
    } else {
        event.player_name.clone()
    };
    if event.details.is_some() {
        println!(
            "[{:>8}] {:<28} {:<16} {}",
            event.time_code, name, who, event.details
        );
    } else {
        println!("[{:>8}] {:<28} {}", event.time_code, name, who);
    }
}

fn print_summary(replay: &Replay) {
    println!(
        "{:<16} {:<16} {:>4} {:>6} {:>7} {:>6} {:>6} {:>6}  result",
        "player", "side", "team", "units", "bldgs", "upgr", "powers", "spent"
    );
    for player in &replay.summary {
        let units: u32 = player.units_created.values().map(|t| t.count).sum();
        let buildings: u32 = player.buildings_built.values().map(|t| t.count).sum();
        let upgrades: u32 = player.upgrades_built.values().map(|t| t.count).sum();
        let powers: u32 = player.powers_used.values().sum();
        println!(
            "{:<16} {:<16} {:>4} {:>6} {:>7} {:>6} {:>6} {:>6}  {}",
            player.name,
            player.side,
            player.team,
            units,
            buildings,
            upgrades,
            powers,
            player.money_spent,
            if player.win { "WIN" } else { "LOSS" },
        );
    }
}
