//! Link Query
//!
//! Selects the links whose number is above a threshold through a lazy query
//! over the link collection, prints them and runs the simulation.
//!
//! Run with: cargo run --bin vissim-linq -- --simulate --min-link 10

use clap::Parser;
use tracing::info;

use vissim_demos::{execute, init_logging, CommonArgs, LinkQuery};

#[derive(Parser)]
#[command(name = "vissim-linq")]
#[command(about = "Query links by number, then run the simulation")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Select links numbered above this
    #[arg(long, default_value = "10")]
    min_link: i32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.common.verbose)?;

    execute(&args.common, &LinkQuery { min_no: args.min_link })?;

    info!("Done");
    Ok(())
}
