//! Vissim automation demos
//!
//! Shared plumbing for the demo programs: command line options, logging and
//! the choice between the real server and the simulated one.
//!
//! Every demo runs against the simulated server with `--simulate`:
//!
//! ```text
//! cargo run --bin vissim-linq -- --simulate
//! ```

use std::path::PathBuf;

use clap::Args;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vissim_com::sim::SimServer;
use vissim_com::{AutomationObject, Session, SessionConfig};

/// Number of links seeded into the simulated network
pub const SIMULATED_LINKS: i32 = 15;

/// Options shared by all demos
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Run against the in-process simulated server
    #[arg(long)]
    pub simulate: bool,

    /// Folder holding the example scenarios
    #[arg(long)]
    pub example_folder: Option<PathBuf>,

    /// Network file, absolute or relative to the example folder
    #[arg(long)]
    pub network: Option<PathBuf>,

    /// Layout file, absolute or relative to the example folder
    #[arg(long)]
    pub layout: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommonArgs {
    /// Session configuration with the overrides given on the command line
    pub fn session_config(&self) -> SessionConfig {
        let mut builder = SessionConfig::builder();
        if let Some(folder) = &self.example_folder {
            builder = builder.example_folder(folder);
        }
        if let Some(network) = &self.network {
            builder = builder.network_file(network);
        }
        if let Some(layout) = &self.layout {
            builder = builder.layout_file(layout);
        }
        builder.build()
    }
}

/// Install the global subscriber; `RUST_LOG` wins over `--verbose`
pub fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// A demo body, written once for any backend
pub trait Scenario {
    /// Drive the session; the caller shuts the server down afterwards
    fn run<O: AutomationObject>(&self, session: &Session<O>) -> vissim_com::Result<()>;
}

/// Simulated server with the same shape as the training network
pub fn simulated_server() -> SimServer {
    let server = SimServer::new().with_links(1..=SIMULATED_LINKS);
    for no in 1..=4 {
        server.add_vehicle(no, 30.0 + f64::from(no) * 5.0);
    }
    server
}

/// Run `scenario` against the server selected by `args`, then exit it
pub fn execute(args: &CommonArgs, scenario: &impl Scenario) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.session_config();
    if args.simulate {
        info!("using the simulated server");
        let server = simulated_server();
        let session = Session::with_server(server.vissim(), config).with_native_module(server.utilities());
        scenario.run(&session)?;
        session.exit()?;
        return Ok(());
    }
    launch(config, scenario)
}

#[cfg(windows)]
fn launch(config: SessionConfig, scenario: &impl Scenario) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::launch(config)?;
    scenario.run(&session)?;
    session.exit()?;
    Ok(())
}

#[cfg(not(windows))]
fn launch(_config: SessionConfig, _scenario: &impl Scenario) -> Result<(), Box<dyn std::error::Error>> {
    Err(vissim_com::ComError::Unsupported(
        "the automation server runs on Windows only; pass --simulate".to_string(),
    )
    .into())
}

/// Load the network, turn on quick mode and run the simulation
pub struct BasicCommands;

impl Scenario for BasicCommands {
    fn run<O: AutomationObject>(&self, session: &Session<O>) -> vissim_com::Result<()> {
        session.load_network(session.config().network_path())?;
        session.set_quick_mode(session.config().quick_mode)?;
        session.run_continuous()
    }
}

/// Select links numbered above `min_no`, then run the simulation
pub struct LinkQuery {
    pub min_no: i32,
}

impl LinkQuery {
    /// Numbers of the links the query selects, in server order
    pub fn selected<O: AutomationObject>(&self, session: &Session<O>) -> vissim_com::Result<Vec<i32>> {
        session
            .links()?
            .query()
            .filter(|link| Ok(link.no()? > self.min_no))
            .project(|link| link.no())
            .try_collect()
    }
}

impl Scenario for LinkQuery {
    fn run<O: AutomationObject>(&self, session: &Session<O>) -> vissim_com::Result<()> {
        session.load_network(session.config().network_path())?;
        session.load_layout(session.config().layout_path())?;

        for no in self.selected(session)? {
            info!("selected link: {}", no);
        }

        session.set_quick_mode(session.config().quick_mode)?;
        session.run_continuous()
    }
}

/// Hide the main window while a short run executes
pub struct HiddenRun {
    pub break_at: f64,
}

impl Scenario for HiddenRun {
    fn run<O: AutomationObject>(&self, session: &Session<O>) -> vissim_com::Result<()> {
        session.load_network(session.config().network_path())?;
        session.load_layout(session.config().layout_path())?;

        info!("hiding the main window");
        session.hide_main_window()?;

        session.set_break_at(self.break_at)?;
        session.run_continuous()?;

        session.restore_main_window()?;
        info!("main window restored");
        Ok(())
    }
}
