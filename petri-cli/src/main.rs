use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use petri_config::load_world_config;
use petri_core::Simulation;
use petri_types::{MetricsSnapshot, WorldConfig};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "petri")]
#[command(about = "Headless driver for the petri cell simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a world for a number of ticks and prints a summary.
    Run {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 600)]
        ticks: u32,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Advances a few ticks, optionally dumping the final snapshot.
    Step {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 1)]
        ticks: u32,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = false)]
        print_state: bool,
    },
    Benchmark {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 600)]
        ticks: u32,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long)]
        cells: Option<u32>,
        #[arg(long)]
        particles: Option<u32>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    ticks: u32,
    seed: u64,
    final_tick: u64,
    cells: u32,
    particles: u32,
    player_alive: bool,
    total_splits: u64,
    total_deaths: u64,
}

#[derive(Debug, Serialize)]
struct StepSummary {
    ticks: u32,
    final_tick: u64,
    particles_consumed_last_tick: u64,
    deaths_last_tick: u64,
}

#[derive(Debug, Serialize)]
struct BenchmarkSummary {
    ticks: u32,
    elapsed_ms: u128,
    avg_ms_per_tick: f64,
    us_per_entity_tick: f64,
    final_metrics: MetricsSnapshot,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("petri=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            ticks,
            seed,
            format,
            out,
        } => run_command(config.as_deref(), ticks, seed, format, out),
        Commands::Step {
            config,
            ticks,
            seed,
            print_state,
        } => step_command(config.as_deref(), ticks, seed, print_state),
        Commands::Benchmark {
            config,
            ticks,
            seed,
            cells,
            particles,
        } => benchmark_command(config.as_deref(), ticks, seed, cells, particles),
    }
}

fn run_command(
    config_path: Option<&Path>,
    ticks: u32,
    seed: u64,
    format: OutputFormat,
    out: Option<PathBuf>,
) -> Result<()> {
    let mut sim = build_simulation(load_world_config(config_path)?, seed)?;
    sim.step_n(ticks);
    let metrics = sim.metrics();

    let summary = RunSummary {
        ticks,
        seed,
        final_tick: sim.tick_count(),
        cells: metrics.cells,
        particles: metrics.particles,
        player_alive: sim.player().is_some(),
        total_splits: metrics.total_splits,
        total_deaths: metrics.total_deaths,
    };

    let text = match format {
        OutputFormat::Pretty => format!(
            "ticks={} seed={} final_tick={} cells={} particles={} player_alive={} splits={} deaths={}",
            summary.ticks,
            summary.seed,
            summary.final_tick,
            summary.cells,
            summary.particles,
            summary.player_alive,
            summary.total_splits,
            summary.total_deaths
        ),
        OutputFormat::Json => serde_json::to_string_pretty(&summary)?,
    };
    write_output(text, out)
}

fn step_command(
    config_path: Option<&Path>,
    ticks: u32,
    seed: u64,
    print_state: bool,
) -> Result<()> {
    let mut sim = build_simulation(load_world_config(config_path)?, seed)?;
    let ticks = ticks.max(1);
    sim.step_n(ticks);
    let snapshot = sim.snapshot();

    let summary = StepSummary {
        ticks,
        final_tick: snapshot.tick,
        particles_consumed_last_tick: snapshot.metrics.particles_consumed_last_tick,
        deaths_last_tick: snapshot.metrics.deaths_last_tick,
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    if print_state {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}

fn benchmark_command(
    config_path: Option<&Path>,
    ticks: u32,
    seed: u64,
    cells: Option<u32>,
    particles: Option<u32>,
) -> Result<()> {
    let mut cfg = load_world_config(config_path)?;
    if let Some(count) = cells {
        cfg.initial_cells = count;
    }
    if let Some(count) = particles {
        cfg.initial_particles = count;
    }

    let mut sim = build_simulation(cfg, seed)?;
    let ticks = ticks.max(1);
    let start = Instant::now();
    let deltas = sim.step_n(ticks);
    let elapsed = start.elapsed();

    let entity_ticks: u64 = deltas
        .iter()
        .map(|delta| u64::from(delta.metrics.cells) + u64::from(delta.metrics.particles))
        .sum();

    let summary = BenchmarkSummary {
        ticks,
        elapsed_ms: elapsed.as_millis(),
        avg_ms_per_tick: elapsed.as_secs_f64() * 1000.0 / f64::from(ticks),
        us_per_entity_tick: elapsed.as_secs_f64() * 1_000_000.0 / (entity_ticks.max(1) as f64),
        final_metrics: sim.metrics().clone(),
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn build_simulation(cfg: WorldConfig, seed: u64) -> Result<Simulation> {
    let sim = Simulation::new(cfg, seed).context("failed to build simulation")?;
    info!(
        seed,
        cells = sim.metrics().cells,
        particles = sim.metrics().particles,
        "simulation ready"
    );
    Ok(sim)
}

fn write_output(text: String, out: Option<PathBuf>) -> Result<()> {
    if let Some(path) = out {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating output directory {}", parent.display())
            })?;
        }
        fs::write(&path, text).with_context(|| format!("failed writing {}", path.display()))?;
        println!("wrote output to {}", path.display());
    } else {
        println!("{text}");
    }
    Ok(())
}
