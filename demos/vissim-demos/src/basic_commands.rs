//! Basic Commands
//!
//! Loads the training network, turns on quick mode, runs the simulation and
//! shuts the server down.
//!
//! Run with: cargo run --bin basic-commands -- --simulate

use clap::Parser;
use tracing::info;

use vissim_demos::{execute, init_logging, BasicCommands, CommonArgs};

#[derive(Parser)]
#[command(name = "basic-commands")]
#[command(about = "Load a network and run it in quick mode")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.common.verbose)?;

    execute(&args.common, &BasicCommands)?;

    info!("Simulation finished, server closed");
    Ok(())
}
