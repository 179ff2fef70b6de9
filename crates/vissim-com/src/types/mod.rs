//! Core interop types
//!
//! - Errors and HRESULT codes
//! - Dynamically typed attribute values

mod error;
mod variant;

pub use error::*;
pub use variant::{vartype, Variant};

/// Well-known member names of the automation interface
pub mod member {
    /// Parameterized attribute accessor on every server object
    pub const ATT_VALUE: &str = "AttValue";
    /// `IVissim.Net`
    pub const NET: &str = "Net";
    /// `IVissim.Simulation`
    pub const SIMULATION: &str = "Simulation";
    /// `IVissim.Graphics`
    pub const GRAPHICS: &str = "Graphics";
    /// `INet.Links`
    pub const LINKS: &str = "Links";
    /// `INet.Vehicles`
    pub const VEHICLES: &str = "Vehicles";
    /// Collection size
    pub const COUNT: &str = "Count";
    /// Collection lookup by key attribute
    pub const ITEM_BY_KEY: &str = "ItemByKey";
    /// `IVissim.LoadNet`
    pub const LOAD_NET: &str = "LoadNet";
    /// `IVissim.LoadLayout`
    pub const LOAD_LAYOUT: &str = "LoadLayout";
    /// `IVissim.Exit`
    pub const EXIT: &str = "Exit";
    /// `ISimulation.RunContinuous`
    pub const RUN_CONTINUOUS: &str = "RunContinuous";
}

/// Well-known attribute names
pub mod attribute {
    /// Key attribute of links and vehicles
    pub const NO: &str = "No";
    /// Graphics quick mode flag
    pub const QUICK_MODE: &str = "QuickMode";
    /// Simulation second at which a continuous run pauses
    pub const SIM_BREAK_AT: &str = "SimBreakAt";
    /// Simulation period in seconds
    pub const SIM_PERIOD: &str = "SimPeriod";
    /// Current simulation second
    pub const SIM_SEC: &str = "SimSec";
}
