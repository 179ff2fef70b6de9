//! Automation session
//!
//! Glue over the typed proxies: start the server, load a scenario, run it,
//! control the main window and shut the server down. Lifecycle calls are
//! forwarded verbatim.

use std::any::Any;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::bindings::{AutomationObject, ILink, IVehicle, IVissim};
use crate::capability::{NativeModule, WindowControl};
use crate::collection::CollectionView;
use crate::config::SessionConfig;
use crate::types::{attribute, ComError, Result};

/// A running automation server and the resources attached to it
pub struct Session<O: AutomationObject> {
    vissim: IVissim<O>,
    config: SessionConfig,
    utilities: Option<Box<dyn NativeModule>>,
    exited: bool,
    // Declared last: dropped after the server references above.
    _runtime: Option<Box<dyn Any>>,
}

impl<O: AutomationObject> Session<O> {
    /// Attach to an already running server
    pub fn with_server(vissim: IVissim<O>, config: SessionConfig) -> Self {
        Self {
            vissim,
            config,
            utilities: None,
            exited: false,
            _runtime: None,
        }
    }

    /// Use `module` for window control
    pub fn with_native_module(mut self, module: impl NativeModule + 'static) -> Self {
        self.utilities = Some(Box::new(module));
        self
    }

    /// The server's root interface
    pub fn vissim(&self) -> &IVissim<O> {
        &self.vissim
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Load a network file
    pub fn load_network(&self, path: impl AsRef<Path>) -> Result<()> {
        self.vissim.load_net(path.as_ref())
    }

    /// Load a layout file
    pub fn load_layout(&self, path: impl AsRef<Path>) -> Result<()> {
        self.vissim.load_layout(path.as_ref())
    }

    /// Load the configured network and layout, then apply the configured
    /// quick mode and break-at second
    pub fn load_scenario(&self) -> Result<()> {
        let network = self.config.network_path();
        let layout = self.config.layout_path();
        info!(network = %network.display(), layout = %layout.display(), "loading scenario");
        self.load_network(&network)?;
        self.load_layout(&layout)?;
        self.set_quick_mode(self.config.quick_mode)?;
        if let Some(seconds) = self.config.sim_break_at {
            self.set_break_at(seconds)?;
        }
        Ok(())
    }

    /// Toggle graphics quick mode
    pub fn set_quick_mode(&self, enable: bool) -> Result<()> {
        self.vissim
            .graphics()?
            .set_att_value(attribute::QUICK_MODE, enable)
    }

    /// Pause continuous runs at `seconds`
    pub fn set_break_at(&self, seconds: f64) -> Result<()> {
        self.vissim
            .simulation()?
            .set_att_value(attribute::SIM_BREAK_AT, seconds)
    }

    /// Run the simulation continuously
    pub fn run_continuous(&self) -> Result<()> {
        info!("running simulation");
        self.vissim.simulation()?.run_continuous()
    }

    /// Lazy view over all links
    pub fn links(&self) -> Result<CollectionView<'static, ILink<O>>> {
        self.vissim.net()?.links()?.view()
    }

    /// Lazy view over all vehicles
    pub fn vehicles(&self) -> Result<CollectionView<'static, IVehicle<O>>> {
        self.vissim.net()?.vehicles()?.view()
    }

    fn utilities(&self) -> Result<&dyn NativeModule> {
        self.utilities
            .as_deref()
            .ok_or_else(|| ComError::NativeModule("no native utilities module loaded".to_string()))
    }

    /// Hide the server's main window
    pub fn hide_main_window(&self) -> Result<()> {
        self.vissim.hide_main_window(self.utilities()?)
    }

    /// Show the server's main window again
    pub fn restore_main_window(&self) -> Result<()> {
        self.vissim.restore_main_window(self.utilities()?)
    }

    /// Shut the server down
    pub fn exit(mut self) -> Result<()> {
        self.exited = true;
        self.vissim.exit()
    }
}

impl<O: AutomationObject> Drop for Session<O> {
    fn drop(&mut self) {
        if !self.exited {
            warn!("session dropped without exit; the server keeps running");
        } else {
            debug!("session closed");
        }
    }
}

#[cfg(windows)]
impl Session<crate::backend::DispatchObject> {
    /// Start the server configured in `config` and attach to it
    ///
    /// Initializes a single-threaded COM apartment on the calling thread.
    /// A missing utilities module disables window control but does not fail
    /// the launch.
    pub fn launch(config: SessionConfig) -> Result<Self> {
        let apartment = crate::backend::ComApartment::enter()?;
        let root = crate::backend::DispatchObject::create(&config.prog_id)?;
        info!(prog_id = %config.prog_id, "automation server started");

        let utilities = match crate::capability::NativeLibrary::load(&config.utilities_module) {
            Ok(library) => Some(Box::new(library) as Box<dyn NativeModule>),
            Err(err) => {
                warn!("window control unavailable: {}", err);
                None
            }
        };

        Ok(Self {
            vissim: IVissim::from_object(root),
            config,
            utilities,
            exited: false,
            _runtime: Some(Box::new(apartment)),
        })
    }
}
