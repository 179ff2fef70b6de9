//! Window Control
//!
//! Hides the server's main window through the native utilities module, runs
//! a short simulation and brings the window back.
//!
//! Run with: cargo run --bin vissim-extension -- --simulate --break-at 60

use clap::Parser;
use tracing::info;

use vissim_demos::{execute, init_logging, CommonArgs, HiddenRun};

#[derive(Parser)]
#[command(name = "vissim-extension")]
#[command(about = "Run a simulation with the main window hidden")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Simulation second to pause at
    #[arg(long, default_value = "60")]
    break_at: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.common.verbose)?;

    info!("The main window will disappear while the simulation runs");
    execute(&args.common, &HiddenRun { break_at: args.break_at })?;

    info!("The main window is back");
    Ok(())
}
