//! Native capabilities
//!
//! Some server functionality is not reachable through the automation
//! interface at all. The server vendor ships a native utilities module whose
//! exports take the server's `IUnknown` identity and act on it directly
//! (hiding or showing the main window).
//!
//! Every invocation follows the same protocol: resolve the identity, call
//! the export, release the identity. The release is tied to the handle's
//! scope, so it also happens when the native call panics.
//!
//! The exports return nothing. Whether the native side succeeded cannot be
//! observed; [`invoke`] only reports failures to resolve the target.

mod library;

pub use library::{NativeLibrary, UTILITIES_MODULE};

use std::fmt;

use tracing::debug;

use crate::bindings::{AutomationObject, IVissim};
use crate::identity::{IdentityHandle, IdentitySource};
use crate::types::Result;

/// Out-of-band operations provided by the native module
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeOp {
    /// Hide the server's main window
    HideWindow,
    /// Show the server's main window again
    ShowWindow,
}

impl NativeOp {
    /// Every supported operation
    pub const ALL: [NativeOp; 2] = [NativeOp::HideWindow, NativeOp::ShowWindow];

    /// Name of the export implementing this operation
    pub const fn export_name(self) -> &'static str {
        match self {
            NativeOp::HideWindow => "HideVissim",
            NativeOp::ShowWindow => "ShowVissim",
        }
    }
}

impl fmt::Display for NativeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.export_name())
    }
}

/// A module exporting native operations
///
/// Calls are fire-and-forget: there is no status channel back to the caller.
pub trait NativeModule {
    /// Run `op` against the object identified by `identity`
    fn call(&self, op: NativeOp, identity: &IdentityHandle<'_>);
}

impl<M: NativeModule + ?Sized> NativeModule for Box<M> {
    fn call(&self, op: NativeOp, identity: &IdentityHandle<'_>) {
        (**self).call(op, identity)
    }
}

/// Resolve `target`, run `op` on it, release the identity
pub fn invoke<S, M>(target: &S, module: &M, op: NativeOp) -> Result<()>
where
    S: IdentitySource,
    M: NativeModule + ?Sized,
{
    let identity = IdentityHandle::resolve(target)?;
    debug!(%op, identity = ?identity.identity(), "invoking native capability");
    module.call(op, &identity);
    Ok(())
}

/// Main window control, attached to the server's root interface
pub trait WindowControl {
    /// Run a native operation against this object
    fn invoke_native<M>(&self, module: &M, op: NativeOp) -> Result<()>
    where
        M: NativeModule + ?Sized;

    /// Hide the server's main window
    fn hide_main_window<M>(&self, module: &M) -> Result<()>
    where
        M: NativeModule + ?Sized,
    {
        self.invoke_native(module, NativeOp::HideWindow)
    }

    /// Show the server's main window again
    fn restore_main_window<M>(&self, module: &M) -> Result<()>
    where
        M: NativeModule + ?Sized,
    {
        self.invoke_native(module, NativeOp::ShowWindow)
    }
}

impl<O: AutomationObject> WindowControl for IVissim<O> {
    fn invoke_native<M>(&self, module: &M, op: NativeOp) -> Result<()>
    where
        M: NativeModule + ?Sized,
    {
        invoke(self, module, op)
    }
}
