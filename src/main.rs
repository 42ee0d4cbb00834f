//! CLI entry point for the DPS simulator

use clap::{Parser, ValueEnum};
use dps_sim::{
    format_ranged_report, format_report,
    ranged::{run_ranged_batch, run_ranged_fight},
    simulation::{run_batch, run_fight},
    stats::AggregatedStats,
    FightConfig, RangedFightConfig,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "dps-sim")]
#[command(version)]
#[command(about = "Melee and archery DPS simulator for EverQuest-style combat", long_about = None)]
struct Args {
    /// Path to the fight configuration file (YAML or JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Treat the config as a ranged (archery) fight
    #[arg(short, long, default_value = "false")]
    ranged: bool,

    /// Number of fights to run; more than one prints aggregated stats
    #[arg(short, long, default_value = "1")]
    num_sims: usize,

    /// Use parallel processing
    #[arg(short, long, default_value = "false")]
    parallel: bool,

    /// Worker threads for parallel runs (defaults to the CPU count)
    #[arg(long)]
    threads: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Main-hand label in the text report
    #[arg(long)]
    label1: Option<String>,

    /// Off-hand label in the text report
    #[arg(long)]
    label2: Option<String>,

    /// Show timing information
    #[arg(short, long, default_value = "false")]
    timing: bool,

    /// Debug: log every swing
    #[arg(long, default_value = "false")]
    debug_trace: bool,
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("{context}: {err}");
    process::exit(1);
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => fail("Error serializing output", e),
    }
}

fn print_aggregate(stats: &AggregatedStats, args: &Args, elapsed: Duration) {
    match args.output {
        OutputFormat::Text => {
            println!("=== DPS Simulation Results ===");
            println!("Simulations: {}", stats.runs);
            println!();
            println!("Average DPS: {:.2} ± {:.2}", stats.avg_dps, stats.std_dps);
            println!("DPS Range: {:.2} - {:.2}", stats.min_dps, stats.max_dps);
            println!("Avg Total Damage: {:.0}", stats.avg_total_damage);
            println!("Avg Crits: {:.1}", stats.avg_crit_hits);
            println!("Avg Elemental Damage: {:.0}", stats.avg_elemental_damage);
            println!("Accuracy: {:.1}%", stats.accuracy);
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "simulations": args.num_sims,
                "parallel": args.parallel,
                "elapsed_seconds": elapsed.as_secs_f64(),
                "stats": stats,
            });
            print_json(&output);
        }
    }
}

fn print_timing(args: &Args, elapsed: Duration) {
    if !args.timing {
        return;
    }
    println!();
    println!("--- Performance ---");
    println!("Total time: {:.3}s", elapsed.as_secs_f64());
    println!(
        "Per simulation: {:.3}ms",
        elapsed.as_secs_f64() * 1000.0 / args.num_sims.max(1) as f64
    );
}

fn run_melee(args: &Args) {
    let config = FightConfig::from_file(&args.config)
        .unwrap_or_else(|e| fail("Error loading config", e));
    let start = Instant::now();

    if args.num_sims <= 1 {
        let report = run_fight(&config).unwrap_or_else(|e| fail("Error", e));
        match args.output {
            OutputFormat::Text => println!(
                "{}",
                format_report(&report, args.label1.as_deref(), args.label2.as_deref())
            ),
            OutputFormat::Json => print_json(&report),
        }
    } else {
        let reports = run_batch(&config, args.num_sims, args.parallel)
            .unwrap_or_else(|e| fail("Error", e));
        print_aggregate(&AggregatedStats::from_results(&reports), args, start.elapsed());
    }
    print_timing(args, start.elapsed());
}

fn run_ranged(args: &Args) {
    let config = RangedFightConfig::from_file(&args.config)
        .unwrap_or_else(|e| fail("Error loading config", e));
    let start = Instant::now();

    if args.num_sims <= 1 {
        let report = run_ranged_fight(&config).unwrap_or_else(|e| fail("Error", e));
        match args.output {
            OutputFormat::Text => println!("{}", format_ranged_report(&report)),
            OutputFormat::Json => print_json(&report),
        }
    } else {
        let reports = run_ranged_batch(&config, args.num_sims, args.parallel)
            .unwrap_or_else(|e| fail("Error", e));
        print_aggregate(&AggregatedStats::from_results(&reports), args, start.elapsed());
    }
    print_timing(args, start.elapsed());
}

fn main() {
    let args = Args::parse();

    let filter = if args.debug_trace {
        EnvFilter::new("trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if args.parallel {
        let threads = args.threads.unwrap_or_else(num_cpus::get);
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            warn!(error = %e, "could not size the thread pool");
        }
    }

    if args.ranged {
        run_ranged(&args);
    } else {
        run_melee(&args);
    }
}
