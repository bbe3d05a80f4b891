//! `glocal` – headless exploration runs against a simulated world.
//!
//! ```text
//! glocal check --config config/glocal.toml
//! glocal run   --config config/glocal.toml --max-iterations 50
//! ```
//!
//! `check` builds every component from the configuration and reports what
//! was selected.  `run` additionally drives the exploration loop, with the
//! robot teleporting between goals inside the `[simulation]` world.
//! Ctrl-C stops the loop after the current cycle.  Startup failures exit
//! with status 1.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Parser, Subcommand};
use colored::Colorize;
use glocal_mapping::{DistanceField, EsdfServer, Map};
use glocal_runtime::{
    ExplorationRunner, RunSummary, RuntimeConfig, Simulation, SimulationConfig, telemetry,
};
use glocal_types::Pose;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "glocal")]
#[command(about = "Exploration planning over a local/global map stack", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "config/glocal.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build every component and report the selection
    Check,
    /// Explore the simulated world
    Run {
        /// Override `[exploration] max_iterations`
        #[arg(long)]
        max_iterations: Option<usize>,
    },
}

fn main() -> ExitCode {
    telemetry::init_tracing();
    let cli = Cli::parse();

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}: {}", "error".red().bold(), message);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> Result<(), String> {
    let config = RuntimeConfig::load_from(&cli.config).map_err(|e| e.to_string())?;
    let sim_config: SimulationConfig = config
        .source("simulation")
        .typed()
        .map_err(|e| e.to_string())?;
    let mut sim = Simulation::new(&sim_config).map_err(|e| e.to_string())?;
    let mut runner = ExplorationRunner::from_config(&config, Arc::new(sim.backends()))
        .map_err(|e| format!("startup failed: {e}"))?;

    println!(
        "  Config loaded from {}",
        cli.config.display().to_string().bold()
    );
    print_components(&runner, &sim_config);

    match cli.command {
        Command::Check => {
            println!("  {}", "✓ All components constructed.".green());
            Ok(())
        }
        Command::Run { max_iterations } => {
            if let Some(n) = max_iterations {
                runner.set_max_iterations(n);
            }
            let stop = install_stop_handler();
            let start = runner.communicator().state_machine().current_pose();
            sim.observe(&start);
            let summary = runner.run(&mut sim, &stop).map_err(|e| e.to_string())?;
            print_summary(&summary, sim.esdf(), &runner.communicator().state_machine().current_pose());
            Ok(())
        }
    }
}

fn install_stop_handler() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping after this cycle …".yellow().bold());
        flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the run can only end on its own");
    }
    stop
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_components(runner: &ExplorationRunner, sim: &SimulationConfig) {
    let map = runner.map();
    println!("  Map:        {}", map.name().bold());
    if let Ok(voxel) = map.voxel_size() {
        println!("  Voxel size: {voxel} m");
    }
    println!(
        "  World:      {} obstacle(s), sensor range {} m",
        sim.obstacles.len(),
        sim.sensor_range
    );
}

fn print_summary(summary: &RunSummary, esdf: &EsdfServer, pose: &Pose) {
    println!();
    println!("{}", "  Exploration summary".bold().cyan());
    println!("    finished:       {:?}", summary.reason);
    println!("    iterations:     {}", summary.iterations);
    println!("    local goals:    {}", summary.local_goals);
    println!("    global goals:   {}", summary.global_goals);
    println!(
        "    observed voxels: {} ({} m voxels)",
        esdf.snapshot().observed_voxel_count(),
        esdf.voxel_size()
    );
    println!(
        "    final position: ({:.2}, {:.2}, {:.2})",
        pose.position.x, pose.position.y, pose.position.z
    );
}
