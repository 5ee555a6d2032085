use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use paint_control::{DrainAfter, TickSource};
use paint_core::{Event, SimulationRun, Snapshot};
use serde::Serialize;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "paint_cli", about = "Paint shop buffer simulation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation until its vehicle stream is exhausted.
    Run {
        /// Line configuration JSON. Defaults to the reference line.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        /// Override the number of vehicles in the stream.
        #[arg(long)]
        vehicles: Option<usize>,
        #[arg(long, default_value_t = 10)]
        print_every: u64,
        /// Keep picking after the stream ends until every lane is empty.
        #[arg(long)]
        drain: bool,
        /// Write the final snapshot to this file as JSON.
        #[arg(long)]
        snapshot_out: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct RunReport<'a> {
    run_label: &'a str,
    seed: u64,
    ticks: u64,
    snapshot: &'a Snapshot,
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

struct RunOptions {
    seed: Option<u64>,
    vehicles: Option<usize>,
    print_every: u64,
    drain: bool,
}

fn run(
    config_path: Option<&Path>,
    options: &RunOptions,
    snapshot_out: Option<&Path>,
) -> Result<()> {
    let mut config = paint_world::load_config_or_reference(config_path)?;
    if let Some(vehicles) = options.vehicles {
        config.vehicles_per_run = vehicles;
    }
    let seed = options.seed.unwrap_or_else(rand::random);
    let paint_world::RunSetup {
        mut run,
        mut feeder,
        ..
    } = paint_world::build_seeded_run(&config, seed)?;
    let run_label = paint_world::generate_run_id(seed);

    println!(
        "Starting run {run_label}: id={} vehicles={} lanes={}+{} pick_every={}",
        run.id(),
        feeder.stream().len(),
        config.stage1.lanes,
        config.stage2.lanes,
        config.pick_every,
    );
    println!("{}", "-".repeat(80));

    let ticks = if options.drain {
        drive(&mut run, &mut DrainAfter::new(feeder), options.print_every)
    } else {
        drive(&mut run, &mut feeder, options.print_every)
    };

    println!("{}", "-".repeat(80));
    println!("Done after {ticks} ticks:");
    let snapshot = run.snapshot();
    print_summary(&snapshot);

    if let Some(path) = snapshot_out {
        write_report(
            path,
            &RunReport {
                run_label: &run_label,
                seed,
                ticks,
                snapshot: &snapshot,
            },
        )?;
        println!("Snapshot written to {}", path.display());
    }
    Ok(())
}

/// Applies ticks from `source` until it is exhausted, printing a status line
/// every `print_every` ticks and every drop as it happens.
fn drive(run: &mut SimulationRun, source: &mut impl TickSource, print_every: u64) -> u64 {
    let mut ticks = 0;
    while let Some(action) = source.next_action(run) {
        let events = run.apply(&action);
        ticks += 1;

        for envelope in &events {
            if let Event::VehicleDropped { color, stage } = &envelope.event {
                println!(
                    "*** DROPPED: {color} bound for {stage} at tick={:04} ***",
                    envelope.tick
                );
            }
        }

        if print_every > 0 && run.tick() % print_every == 0 {
            print_status(run);
        }
    }
    ticks
}

fn print_status(run: &SimulationRun) {
    let bank = run.bank();
    let picker = run.picker();
    let counters = run.stats().counters();
    let target = picker
        .current_target()
        .map_or_else(|| "-".to_string(), ToString::to_string);
    println!(
        "[tick={tick:04}]  held={held:3}/{capacity}  picks={picks:3}  \
         changeovers={changeovers:3}  overflow={overflow:3}  dropped={dropped}  target={target}",
        tick = run.tick(),
        held = bank.total_vehicles(),
        capacity = bank.total_capacity(),
        picks = picker.total_picks(),
        changeovers = picker.changeovers(),
        overflow = counters.overflow_penalties,
        dropped = counters.dropped,
    );
}

fn print_summary(snapshot: &Snapshot) {
    let kpis = &snapshot.kpis;
    let stats = &snapshot.stats;
    println!(
        "  picks={}  changeovers={}  admitted={}  overflow={}  dropped={}  nothing_to_pick={}",
        kpis.throughput,
        kpis.changeovers,
        kpis.total_vehicles,
        kpis.overflow_penalties,
        kpis.dropped,
        stats.nothing_to_pick,
    );
    println!(
        "  buffer={}%  stage1={:.1}%  stage2={:.1}%",
        kpis.buffer_utilization_pct, stats.stage1_utilization_pct, stats.stage2_utilization_pct,
    );
    let sequence: Vec<&str> = snapshot
        .picker
        .recent_sequence
        .iter()
        .map(paint_core::ColorId::as_str)
        .collect();
    println!("  recent picks: [{}]", sequence.join(", "));
}

fn write_report(path: &Path, report: &RunReport<'_>) -> Result<()> {
    let file =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            seed,
            vehicles,
            print_every,
            drain,
            snapshot_out,
        } => {
            let options = RunOptions {
                seed,
                vehicles,
                print_every,
                drain,
            };
            run(config.as_deref(), &options, snapshot_out.as_deref())?;
        }
    }
    Ok(())
}
