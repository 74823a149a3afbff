mod auto;
mod scenarios;
mod storage;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::time::{Duration, Instant};

use dicebox_game::{Round, RoundConfig, SeededDice};
use scenarios::{TestScenario, get_all_scenarios, get_scenarios_by_names};

#[derive(Debug, Parser)]
#[command(name = "dicebox-tester", version = "0.1.0")]
#[command(
    about = "Automated QA testing for the DiceBox engine - scripted scenarios and bulk auto-play"
)]
struct Args {
    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Base seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: u64,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json"])]
    report: String,

    /// Run the playability sweep after the scenarios
    #[arg(long)]
    playability: bool,

    /// Number of auto-played games in the playability sweep
    #[arg(long, default_value_t = 200)]
    games: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct ScenarioResult {
    scenario_name: String,
    passed: bool,
    iterations_run: u64,
    successful_iterations: u64,
    failures: Vec<String>,
    average_duration_us: u128,
}

#[derive(Debug, Default, Serialize)]
struct PlayabilityAggregate {
    games: u64,
    wins: u64,
    perfect_shuts: u64,
    losses: u64,
    total_rolls_on_wins: u64,
    total_leftover_on_losses: u64,
}

impl PlayabilityAggregate {
    fn win_rate_pct(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.wins as f64 / self.games as f64 * 100.0
    }

    fn avg_rolls_per_win(&self) -> Option<f64> {
        (self.wins > 0).then(|| self.total_rolls_on_wins as f64 / self.wins as f64)
    }

    fn avg_leftover_per_loss(&self) -> Option<f64> {
        (self.losses > 0).then(|| self.total_leftover_on_losses as f64 / self.losses as f64)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_scenarios {
        for scenario in get_all_scenarios() {
            println!("{:12} {}", scenario.name.bright_white(), scenario.description);
        }
        return Ok(());
    }

    let seeds = parse_seeds(&args.seeds)?;
    let scenarios = resolve_scenarios(&args.scenarios)?;
    log::debug!(
        "running {} scenarios over {} seeds, {} iterations each",
        scenarios.len(),
        seeds.len(),
        args.iterations
    );

    let mut results = Vec::new();
    for scenario in &scenarios {
        if args.verbose {
            println!("Running scenario: {}", scenario.name.bright_white());
        }
        results.push(run_scenario(scenario, &seeds, args.iterations, args.verbose));
    }

    let playability = args
        .playability
        .then(|| run_playability(seeds.first().copied().unwrap_or(1337), args.games))
        .transpose()?;

    match args.report.as_str() {
        "json" => print_json_report(&results, playability.as_ref())?,
        _ => print_console_report(&results, playability.as_ref()),
    }

    if results.iter().any(|result| !result.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_seeds(raw: &str) -> Result<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>()
                .with_context(|| format!("invalid seed '{part}'"))
        })
        .collect()
}

fn resolve_scenarios(raw: &str) -> Result<Vec<TestScenario>> {
    let names: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect();
    let scenarios = if names.iter().any(|name| name == "all") {
        get_all_scenarios()
    } else {
        get_scenarios_by_names(&names)
    };
    anyhow::ensure!(
        !scenarios.is_empty(),
        "no scenarios matched '{raw}' (use --list-scenarios)"
    );
    Ok(scenarios)
}

fn run_scenario(
    scenario: &TestScenario,
    seeds: &[u64],
    iterations: u64,
    verbose: bool,
) -> ScenarioResult {
    let mut successes = 0_u64;
    let mut failures = Vec::new();
    let mut total = Duration::ZERO;
    let mut runs = 0_u64;

    for &seed in seeds {
        for iteration in 0..iterations {
            runs += 1;
            let run_seed = seed.wrapping_add(iteration);
            let start = Instant::now();
            match (scenario.test_fn)(run_seed) {
                Ok(()) => {
                    successes += 1;
                    total += start.elapsed();
                    if verbose {
                        println!("  {} seed {run_seed}", "ok".green());
                    }
                }
                Err(err) => {
                    failures.push(format!("seed {run_seed}: {err:#}"));
                    if verbose {
                        println!("  {} seed {run_seed}: {err:#}", "FAIL".red());
                    }
                }
            }
        }
    }

    let average = if successes > 0 {
        total / u32::try_from(successes).unwrap_or(1)
    } else {
        Duration::ZERO
    };
    ScenarioResult {
        scenario_name: scenario.name.to_string(),
        passed: failures.is_empty(),
        iterations_run: runs,
        successful_iterations: successes,
        failures,
        average_duration_us: average.as_micros(),
    }
}

fn run_playability(seed_base: u64, games: u64) -> Result<PlayabilityAggregate> {
    let mut aggregate = PlayabilityAggregate::default();
    let mut seed_stream = ChaCha8Rng::seed_from_u64(seed_base);
    for game in 0..games {
        let mut round = Round::new(RoundConfig::default_config());
        let mut dice = SeededDice::new(seed_stream.next_u64());
        let result = auto::play_round(&mut round, &mut dice)
            .with_context(|| format!("auto-play failed on game {game}"))?;
        aggregate.games += 1;
        if result.is_win() {
            aggregate.wins += 1;
            if result.perfect {
                aggregate.perfect_shuts += 1;
            }
            aggregate.total_rolls_on_wins += u64::from(result.rolls_used);
        } else {
            aggregate.losses += 1;
            aggregate.total_leftover_on_losses += u64::from(result.leftover_sum.unwrap_or(0));
        }
    }
    Ok(aggregate)
}

fn print_console_report(results: &[ScenarioResult], playability: Option<&PlayabilityAggregate>) {
    println!();
    for result in results {
        let status = if result.passed {
            "PASS".green()
        } else {
            "FAIL".red()
        };
        println!(
            "{status} {:12} {}/{} iterations ({}us avg)",
            result.scenario_name.bright_white(),
            result.successful_iterations,
            result.iterations_run,
            result.average_duration_us,
        );
        for failure in &result.failures {
            println!("       {}", failure.red());
        }
    }
    if let Some(aggregate) = playability {
        println!();
        println!("{}", "Playability sweep".bright_white());
        println!(
            "  {} games: {:.1}% wins, {} perfect shuts",
            aggregate.games,
            aggregate.win_rate_pct(),
            aggregate.perfect_shuts,
        );
        if let Some(avg) = aggregate.avg_rolls_per_win() {
            println!("  avg rolls per win: {avg:.1}");
        }
        if let Some(avg) = aggregate.avg_leftover_per_loss() {
            println!("  avg leftover per loss: {avg:.1}");
        }
    }
}

fn print_json_report(
    results: &[ScenarioResult],
    playability: Option<&PlayabilityAggregate>,
) -> Result<()> {
    #[derive(Serialize)]
    struct Report<'a> {
        scenarios: &'a [ScenarioResult],
        #[serde(skip_serializing_if = "Option::is_none")]
        playability: Option<&'a PlayabilityAggregate>,
    }
    let report = Report {
        scenarios: results,
        playability,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("report serialization")?
    );
    Ok(())
}
