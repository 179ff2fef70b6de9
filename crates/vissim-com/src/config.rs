//! Session configuration

use std::path::{Path, PathBuf};

use crate::capability::UTILITIES_MODULE;

/// Folder of the COM examples installed with the server
pub const DEFAULT_EXAMPLE_FOLDER: &str =
    r"C:\Users\Public\Documents\PTV Vision\PTV Vissim 2020\Examples Training\COM";

/// Network of the "Basic Commands" example, relative to the example folder
pub const DEFAULT_NETWORK_FILE: &str = r"Basic Commands\COM Basic Commands.inpx";

/// Layout of the "Basic Commands" example, relative to the example folder
pub const DEFAULT_LAYOUT_FILE: &str = r"Basic Commands\COM Basic Commands.layx";

/// ProgID of the 2020 automation server
pub const DEFAULT_PROG_ID: &str = "Vissim.Vissim.200";

/// Configuration for an automation session
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Folder relative scenario paths are resolved against
    pub example_folder: PathBuf,
    /// Network file, absolute or relative to `example_folder`
    pub network_file: PathBuf,
    /// Layout file, absolute or relative to `example_folder`
    pub layout_file: PathBuf,
    /// ProgID used to start the server
    pub prog_id: String,
    /// Native utilities module providing window control
    pub utilities_module: PathBuf,
    /// Turn off vehicle drawing while simulating
    pub quick_mode: bool,
    /// Pause continuous runs at this simulation second
    pub sim_break_at: Option<f64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            example_folder: PathBuf::from(DEFAULT_EXAMPLE_FOLDER),
            network_file: PathBuf::from(DEFAULT_NETWORK_FILE),
            layout_file: PathBuf::from(DEFAULT_LAYOUT_FILE),
            prog_id: DEFAULT_PROG_ID.to_string(),
            utilities_module: PathBuf::from(UTILITIES_MODULE),
            quick_mode: true,
            sim_break_at: None,
        }
    }
}

impl SessionConfig {
    /// Start building a configuration from the defaults
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Full path of the network file
    pub fn network_path(&self) -> PathBuf {
        self.resolve(&self.network_file)
    }

    /// Full path of the layout file
    pub fn layout_path(&self) -> PathBuf {
        self.resolve(&self.layout_file)
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.example_folder.join(file)
        }
    }
}

/// Builder for [`SessionConfig`]
#[derive(Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Set the example folder
    pub fn example_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.config.example_folder = folder.into();
        self
    }

    /// Set the network file
    pub fn network_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.config.network_file = file.into();
        self
    }

    /// Set the layout file
    pub fn layout_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.config.layout_file = file.into();
        self
    }

    /// Set the server ProgID
    pub fn prog_id(mut self, prog_id: impl Into<String>) -> Self {
        self.config.prog_id = prog_id.into();
        self
    }

    /// Set the native utilities module
    pub fn utilities_module(mut self, module: impl Into<PathBuf>) -> Self {
        self.config.utilities_module = module.into();
        self
    }

    /// Enable or disable quick mode
    pub fn quick_mode(mut self, enable: bool) -> Self {
        self.config.quick_mode = enable;
        self
    }

    /// Pause continuous runs at `seconds`
    pub fn sim_break_at(mut self, seconds: f64) -> Self {
        self.config.sim_break_at = Some(seconds);
        self
    }

    /// Build the configuration
    pub fn build(self) -> SessionConfig {
        self.config
    }
}
