//! Dynamically loaded native utilities module

use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::{NativeModule, NativeOp};
use crate::identity::IdentityHandle;
use crate::types::Result;

/// File name of the vendor's native utilities module
pub const UTILITIES_MODULE: &str = "Vissim.ComProvider.Utilities.dll";

/// Export signature: `void __stdcall Export(IUnknown*)`
type NativeFn = unsafe extern "system" fn(*mut c_void);

/// A loaded native module with its exports resolved
///
/// All exports are looked up at load time, so a missing export is a load
/// error rather than a silent no-op later.
pub struct NativeLibrary {
    path: PathBuf,
    exports: HashMap<NativeOp, NativeFn>,
    #[cfg(windows)]
    module: windows::Win32::Foundation::HMODULE,
}

impl NativeLibrary {
    /// Load the module at `path` and resolve every [`NativeOp`] export
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        #[cfg(windows)]
        {
            sys::load(path)
        }

        #[cfg(not(windows))]
        {
            Err(crate::types::ComError::Unsupported(format!(
                "cannot load {}: native modules require Windows",
                path.display()
            )))
        }
    }

    /// Load the vendor utilities module from the default search path
    pub fn utilities() -> Result<Self> {
        Self::load(UTILITIES_MODULE)
    }

    /// Path the module was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NativeModule for NativeLibrary {
    fn call(&self, op: NativeOp, identity: &IdentityHandle<'_>) {
        match self.exports.get(&op) {
            // SAFETY: the export has the documented signature and the
            // identity pointer stays valid while `identity` is borrowed.
            Some(export) => unsafe { export(identity.as_ptr()) },
            None => warn!(%op, path = %self.path.display(), "export not resolved"),
        }
    }
}

impl fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .field("exports", &self.exports.len())
            .finish()
    }
}

#[cfg(windows)]
impl Drop for NativeLibrary {
    fn drop(&mut self) {
        unsafe {
            let _ = windows::Win32::Foundation::FreeLibrary(self.module);
        }
    }
}

#[cfg(windows)]
mod sys {
    use std::collections::HashMap;
    use std::ffi::{CString, OsStr};
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;

    use tracing::debug;
    use windows::core::{PCSTR, PCWSTR};
    use windows::Win32::Foundation::FreeLibrary;
    use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};

    use super::{NativeFn, NativeLibrary, NativeOp};
    use crate::types::{ComError, Result};

    fn to_wide_string(s: &OsStr) -> Vec<u16> {
        s.encode_wide().chain(std::iter::once(0)).collect()
    }

    pub(super) fn load(path: &Path) -> Result<NativeLibrary> {
        let wide = to_wide_string(path.as_os_str());
        let module = unsafe { LoadLibraryW(PCWSTR(wide.as_ptr())) }.map_err(|e| {
            ComError::NativeModule(format!("LoadLibrary({}) failed: {}", path.display(), e))
        })?;

        let mut exports = HashMap::new();
        for op in NativeOp::ALL {
            let name = CString::new(op.export_name())
                .map_err(|e| ComError::NativeModule(e.to_string()))?;
            let proc = unsafe { GetProcAddress(module, PCSTR(name.as_ptr() as *const u8)) };
            let Some(proc) = proc else {
                unsafe {
                    let _ = FreeLibrary(module);
                }
                return Err(ComError::NativeModule(format!(
                    "{} does not export {}",
                    path.display(),
                    op.export_name()
                )));
            };
            // SAFETY: the vendor documents every export as
            // `void __stdcall(IUnknown*)`.
            let export: NativeFn = unsafe { std::mem::transmute(proc) };
            exports.insert(op, export);
        }

        debug!(path = %path.display(), "native module loaded");
        Ok(NativeLibrary {
            path: path.to_path_buf(),
            exports,
            module,
        })
    }
}
