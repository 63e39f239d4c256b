use anyhow::{anyhow, Result};
use clap::Parser;

mod access;
mod cli;
mod config;
mod desktop;
mod engine;
mod evaluate;
mod executor;
mod fingerprint;
mod model;
mod packages;
mod plan;
mod proc;
mod pyenv;
mod service;
mod state;
mod units;
mod validate;

use cli::RootArgs;
use config::SetupConfig;
use state::StateStore;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    let config = SetupConfig::resolve(&args)?;

    if args.reset {
        StateStore::reset(&config.state_path)?;
        println!("installation state reset ({})", config.state_path.display());
        return Ok(());
    }

    config.ensure_preconditions()?;
    let mut store = StateStore::load(config.state_path.clone());

    if args.validate {
        return run_validation(&config, &store, args.json);
    }

    let statuses = evaluate::evaluate_all(&config, &store);

    if args.check {
        return plan::render(&statuses, args.json);
    }

    let report = executor::run_apply(&config, &mut store, &statuses)?;
    println!(
        "converged {} unit(s){}",
        report.converged_count(),
        if report.degraded() {
            " (degraded: some optional units failed)"
        } else {
            ""
        }
    );

    run_validation(&config, &store, args.json)
}

fn run_validation(config: &SetupConfig, store: &StateStore, json: bool) -> Result<()> {
    let results = validate::run_validation(config, store);
    validate::render(&results, json)?;
    let failed = validate::failed_count(&results);
    if failed > 0 {
        return Err(anyhow!("validation failed for {failed} unit(s)"));
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "murmur_setup=debug"
    } else {
        "murmur_setup=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
