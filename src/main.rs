mod data;
mod driver;
mod error;
mod export;
mod lattice;
mod requirements;
mod schedule;
mod server;
mod solver;

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::data::{TimeFormat, TimetableConfig};

#[derive(Parser)]
#[command(author, version, about = "Generates conflict-free teaching timetables")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate timetables from a JSON configuration file
    Generate {
        /// Path to the JSON configuration file
        #[arg(long)]
        config: PathBuf,

        /// Folder for timetable_<name>.csv / .json
        #[arg(long, default_value = "./outputs")]
        output_dir: PathBuf,

        /// Overrides the seed in the configuration
        #[arg(long)]
        seed: Option<u64>,

        /// Overrides the time format in the configuration
        #[arg(long, value_enum)]
        time_format: Option<TimeFormat>,
    },
    /// Serve the generator over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
}

fn load_config(path: &Path) -> Result<TimetableConfig, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Could not read {}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("Invalid configuration {}: {}", path.display(), e))
}

fn generate(
    config_path: &Path,
    output_dir: &Path,
    seed: Option<u64>,
    time_format: Option<TimeFormat>,
) -> Result<(), String> {
    let mut config = load_config(config_path)?;
    if seed.is_some() {
        config.seed = seed;
    }
    if let Some(format) = time_format {
        config.time_format = format;
    }

    println!("Generating timetables...");
    let report = driver::generate_many(&config, config.num_timetables).map_err(|e| e.to_string())?;
    if report.timetables.is_empty() {
        return Err("Failed to generate any valid timetable with the given constraints. Try relaxing constraints or increasing attempts.".to_string());
    }

    for timetable in &report.timetables {
        for conflict in schedule::find_conflicts(&timetable.schedule) {
            warn!(
                "Timetable {} double-books a {} at slot {} (entries {} and {})",
                timetable.name, conflict.reason, conflict.slot, conflict.first, conflict.second
            );
        }
        let (csv_path, json_path) =
            export::save_timetable(output_dir, &timetable.name, &timetable.schedule)
                .map_err(|e| e.to_string())?;
        println!(
            "Saved timetable {} -> {}, {}",
            timetable.name,
            csv_path.display(),
            json_path.display()
        );
        println!("\nTimetable: {}", timetable.name);
        println!("{}", export::render_table(&timetable.schedule));
    }

    if !report.is_complete() {
        println!(
            "Generated {} of {} timetables before the attempt budget ran out.",
            report.timetables.len(),
            report.requested
        );
    }
    println!("Done.");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Generate {
            config,
            output_dir,
            seed,
            time_format,
        } => {
            info!("Loading configuration from {}", config.display());
            generate(&config, &output_dir, seed, time_format)
        }
        Command::Serve { addr } => server::run_server(addr)
            .await
            .map_err(|e| format!("Server error: {}", e)),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{}", message);
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}
