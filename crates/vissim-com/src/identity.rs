//! Object identity resolution
//!
//! A server object can be reached through several typed interfaces. Its
//! canonical identity is the `IUnknown` pointer obtained by querying any of
//! them: two references denote the same object iff their identities are
//! equal.
//!
//! Resolving an identity adds one server-side reference. [`IdentityHandle`]
//! owns that reference and gives it back exactly once when it goes out of
//! scope, on every exit path.

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

use tracing::trace;

use crate::types::Result;

/// Raw identity pointer of a server object
///
/// Only meaningful while a reference is held on it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawIdentity(NonNull<c_void>);

impl RawIdentity {
    /// Wrap a raw identity pointer, `None` if it is null
    pub fn new(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    /// The pointer handed to native code
    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }

    /// Pointer value, for logging and table lookups
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}

impl fmt::Debug for RawIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({:#x})", self.addr())
    }
}

/// Anything that refers to a live server object
pub trait IdentitySource {
    /// Resolve the canonical identity, adding one reference to it
    ///
    /// Fails with `DisconnectedObject` if the object is gone.
    fn acquire_identity(&self) -> Result<RawIdentity>;

    /// Give back one reference taken by [`IdentitySource::acquire_identity`]
    ///
    /// # Safety
    ///
    /// `identity` must come from `acquire_identity` on this source and must
    /// not have been released already.
    unsafe fn release_identity(&self, identity: RawIdentity);
}

/// Scoped, counted reference to a server object's identity
///
/// Not `Clone`: each handle releases its reference once, on drop.
pub struct IdentityHandle<'a> {
    identity: RawIdentity,
    source: &'a (dyn IdentitySource + 'a),
}

impl<'a> IdentityHandle<'a> {
    /// Resolve the identity of `source`
    pub fn resolve<S: IdentitySource + 'a>(source: &'a S) -> Result<Self> {
        let identity = source.acquire_identity()?;
        trace!(?identity, "identity acquired");
        Ok(Self { identity, source })
    }

    /// The resolved identity
    pub fn identity(&self) -> RawIdentity {
        self.identity
    }

    /// The pointer handed to native code, valid while `self` lives
    pub fn as_ptr(&self) -> *mut c_void {
        self.identity.as_ptr()
    }
}

impl PartialEq<IdentityHandle<'_>> for IdentityHandle<'_> {
    fn eq(&self, other: &IdentityHandle<'_>) -> bool {
        self.identity == other.identity
    }
}

impl Eq for IdentityHandle<'_> {}

impl fmt::Debug for IdentityHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IdentityHandle").field(&self.identity).finish()
    }
}

impl Drop for IdentityHandle<'_> {
    fn drop(&mut self) {
        // SAFETY: the identity was acquired from `source` in `resolve` and
        // this is the only place that releases it.
        unsafe { self.source.release_identity(self.identity) };
        trace!(identity = ?self.identity, "identity released");
    }
}

/// Resolve the identity of `source`
pub fn resolve<S: IdentitySource>(source: &S) -> Result<IdentityHandle<'_>> {
    IdentityHandle::resolve(source)
}

/// Whether two references denote the same server object
///
/// Both identities are released before returning.
pub fn same_object<A, B>(a: &A, b: &B) -> Result<bool>
where
    A: IdentitySource,
    B: IdentitySource,
{
    let left = resolve(a)?;
    let right = resolve(b)?;
    Ok(left == right)
}
