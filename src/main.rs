// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use cardmarket::history::{self, RunSummary};
use cardmarket::prelude::*;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    Run {
        /// JSON configuration; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short = 'n', long)]
        iterations: Option<u64>,
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(long)]
        initial_price: Option<f64>,
        #[arg(long)]
        initial_stock: Option<u64>,
        #[arg(long)]
        random: Option<u32>,
        #[arg(long)]
        trend: Option<u32>,
        #[arg(long)]
        counter: Option<u32>,
        #[arg(long)]
        custom: Option<u32>,
        #[arg(long)]
        balance: Option<f64>,
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
        /// Keep history in memory only
        #[arg(long)]
        no_persist: bool,
        #[arg(long)]
        progress: bool,
    },

    Analyze {
        #[arg(default_value = "results")]
        path: PathBuf,
        /// Defaults to the latest recorded run
        #[arg(short, long)]
        run: Option<u64>,
    },

    List,
}

fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            config,
            iterations,
            seed,
            initial_price,
            initial_stock,
            random,
            trend,
            counter,
            custom,
            balance,
            output,
            no_persist,
            progress,
        } => {
            let mut config = match config {
                Some(path) => SimConfig::from_json_file(&path)?,
                None => SimConfig::default(),
            };
            if let Some(n) = iterations {
                config.iterations = n;
            }
            config.seed = seed.or(config.seed);
            if let Some(p) = initial_price {
                config.market.initial_price = p;
            }
            if let Some(k) = initial_stock {
                config.market.initial_stock = k;
            }
            if let Some(n) = random {
                config.agents.random_agents = n;
            }
            if let Some(n) = trend {
                config.agents.follow_trend_agents = n;
            }
            if let Some(n) = counter {
                config.agents.counter_trend_agents = n;
            }
            if let Some(n) = custom {
                config.agents.custom_agents = n;
            }
            if let Some(b) = balance {
                config.agents.balance = b;
            }
            config.show_progress = config.show_progress || progress;

            run_single_simulation(config, &output, no_persist)?;
        }

        Commands::Analyze { path, run } => {
            analyze_results(&path, run.map(RunId::new))?;
        }

        Commands::List => {
            println!("\nAvailable Strategies");

            for name in Strategy::NAMES {
                println!("  - {}", name);
            }

            println!("\nUsage: cargo run -- run --random 10 --trend 5 --counter 5 --custom 1");
            println!("Example: cargo run -- run --seed 42 --iterations 500\n");
        }
    }

    let total_time = program_start.elapsed();
    info!("Total runtime: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

fn run_single_simulation(config: SimConfig, output: &Path, no_persist: bool) -> Result<()> {
    let sink: Box<dyn HistorySink> = if no_persist {
        Box::new(MemoryHistory::new())
    } else {
        Box::new(CsvHistory::open(output)?)
    };

    let mut sim = Simulation::new(config, sink)?;
    let report = sim.run()?;

    standings_table(&report);

    if !no_persist {
        let report_path = output.join(format!("run_{}_report.json", report.run_id));
        std::fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;
        info!("Report saved to: {}", report_path.display());
    }

    Ok(())
}

fn analyze_results(path: &Path, run: Option<RunId>) -> Result<()> {
    info!("Analyzing history in: {}", path.display());

    let runs = history::logger::list_runs(path)?;
    let run = match run.or_else(|| runs.last().copied()) {
        Some(run) => run,
        None => {
            info!("No runs recorded.");
            return Ok(());
        }
    };
    if !runs.contains(&run) {
        anyhow::bail!("Run {} not found under {}", run, path.display());
    }

    let (transactions, snapshots) = history::logger::load_run(path, run)?;
    let summary = RunSummary::from_records(run, &transactions, &snapshots);

    println!("\nRun {}", summary.run_id);
    println!("  Trades:            {} ({} buys, {} sells)", summary.trades, summary.buys, summary.sells);
    println!("  Active iterations: {}", summary.active_iterations);
    if let (Some(first), Some(last)) = (summary.first_price, summary.last_price) {
        println!("  Price:             {:.2} -> {:.2}", first, last);
    }
    if let (Some(min), Some(max)) = (summary.min_price, summary.max_price) {
        println!("  Range:             {:.2} .. {:.2}", min, max);
    }
    if let Some(stock) = summary.final_stock {
        println!("  Final stock:       {}", stock);
    }
    println!();

    Ok(())
}

fn standings_table(report: &RunReport) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                     FINAL STANDINGS (run {:<6})              ║", report.run_id.get());
    println!("╠════════════════╦═══════════════╦═══════════════╦═════════════╣");
    println!("║ Agent          ║ Strategy      ║ Balance ($)   ║ Cards       ║");
    println!("╠════════════════╬═══════════════╬═══════════════╬═════════════╣");

    for agent in &report.agents {
        println!(
            "║ {:<14} ║ {:<13} ║ {:>13.2} ║ {:>11} ║",
            agent.name, agent.strategy, agent.balance, agent.holdings,
        );
    }

    println!("╚════════════════╩═══════════════╩═══════════════╩═════════════╝\n");

    println!(
        "Market closed at ${:.2} with {} cards in stock after {} iterations (seed {})",
        report.final_price, report.final_stock, report.iterations, report.seed
    );

    let wealth = |balance: f64, holdings: u64| balance + holdings as f64 * report.final_price;
    if let Some(best) = report.agents.iter().max_by(|a, b| {
        wealth(a.balance, a.holdings).total_cmp(&wealth(b.balance, b.holdings))
    }) {
        println!(
            "Top Net Worth: {} ({}, ${:.2})",
            best.name,
            best.strategy,
            wealth(best.balance, best.holdings)
        );
    }

    println!();
}
