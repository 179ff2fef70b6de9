//! Simulated native utilities module

use std::cell::Cell;

use tracing::debug;

use super::{id_for, SimServer, ROOT};
use crate::capability::{NativeModule, NativeOp};
use crate::identity::IdentityHandle;

/// One native call as seen by the simulated server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeCall {
    /// Operation requested
    pub op: NativeOp,
    /// Address of the identity passed in
    pub identity: usize,
    /// References held on the target while the call ran
    pub refs_during_call: u32,
}

/// Native module acting on a [`SimServer`]
///
/// Hides or shows the main window when handed the root object's identity.
pub struct SimUtilities {
    server: SimServer,
    fail_next: Cell<bool>,
}

impl SimUtilities {
    pub(super) fn new(server: SimServer) -> Self {
        Self {
            server,
            fail_next: Cell::new(false),
        }
    }

    /// Make the next call raise a failure (a panic) after it is recorded
    pub fn fail_next_call(&self) {
        self.fail_next.set(true);
    }
}

impl NativeModule for SimUtilities {
    fn call(&self, op: NativeOp, identity: &IdentityHandle<'_>) {
        let raw = identity.identity();
        {
            let mut state = self.server.state.lock();
            let id = id_for(raw);
            let refs_during_call = state.entries.get(id).map_or(0, |e| e.refs);
            state.native_calls.push(NativeCall {
                op,
                identity: raw.addr(),
                refs_during_call,
            });
            if id == ROOT {
                state.window_visible = op == NativeOp::ShowWindow;
            }
        }
        debug!(%op, identity = ?raw, "simulated native call");

        if self.fail_next.replace(false) {
            panic!("{} raised a native failure", op);
        }
    }
}
