use std::env;
use std::process::ExitCode;
use stress_test::{stress_test_replicas, stress_test_scaling, SimulationError};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod stress_test;

const USAGE: &str = "usage: vdag [replicas] [ops_per_replica] [merges]";

/// Simulation sizes given on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Params {
    replicas: usize,
    ops_per_replica: usize,
    merges: usize,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            replicas: 4,
            ops_per_replica: 50,
            merges: 20,
        }
    }
}

/// Positional numbers, each falling back to its default when absent.
/// `None` means no arguments were given at all.
fn parse_args(args: &[String]) -> Result<Option<Params>, String> {
    if args.is_empty() {
        return Ok(None);
    }
    if args.len() > 3 {
        return Err(format!("too many arguments\n{USAGE}"));
    }

    let number = |idx: usize, name: &str, default: usize| -> Result<usize, String> {
        match args.get(idx) {
            Some(raw) => raw
                .parse()
                .map_err(|_| format!("{name} must be a non-negative integer, got {raw:?}\n{USAGE}")),
            None => Ok(default),
        }
    };

    let defaults = Params::default();
    let params = Params {
        replicas: number(0, "replicas", defaults.replicas)?,
        ops_per_replica: number(1, "ops_per_replica", defaults.ops_per_replica)?,
        merges: number(2, "merges", defaults.merges)?,
    };

    if params.replicas == 0 {
        return Err(format!("at least one replica is required\n{USAGE}"));
    }
    Ok(Some(params))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("VDAG_LOG").unwrap_or_else(|_| EnvFilter::new("vdag=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let params = match parse_args(&args) {
        Ok(params) => params,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            error!(%err, "failed to start the runtime");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(async_main(params)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "simulation failed");
            ExitCode::FAILURE
        }
    }
}

async fn async_main(params: Option<Params>) -> Result<(), SimulationError> {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            REPLICA SIMULATIONS                             ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    if let Some(params) = params {
        let stats = stress_test_replicas(params.replicas, params.ops_per_replica, params.merges).await?;
        stats.print();
        println!("\n✓ Simulation completed successfully!");
        return Ok(());
    }

    // Small scale
    let defaults = Params::default();
    let stats = stress_test_replicas(defaults.replicas, defaults.ops_per_replica, defaults.merges).await?;
    stats.print();

    // Medium scale
    let stats = stress_test_replicas(8, 100, 40).await?;
    stats.print();

    stress_test_scaling(8, 2).await?;

    println!("\n✓ All simulations completed successfully!");
    Ok(())
}
