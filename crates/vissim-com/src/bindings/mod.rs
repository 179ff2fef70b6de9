//! Late-bound automation bindings
//!
//! The server is driven through a small, generic boundary: named properties
//! (optionally parameterized), named methods, and collection enumeration.
//! [`AutomationObject`] is that boundary; backends implement it once.
//!
//! On top of it, the typed proxies in this module give the server's
//! interfaces their usual shape (`IVissim`, `INet`, `ILinkContainer`, ...).
//! They only name members; every call is forwarded verbatim.

mod proxies;

pub use proxies::*;

use crate::collection::ElementEnumerator;
use crate::identity::IdentitySource;
use crate::types::{Result, Variant};

/// A server object reachable through late binding
pub trait AutomationObject: IdentitySource + Sized + 'static {
    /// Read a property, passing `args` for parameterized properties
    fn property(&self, name: &str, args: &[Variant]) -> Result<Variant>;

    /// Write a property
    fn set_property(&self, name: &str, args: &[Variant], value: Variant) -> Result<()>;

    /// Read a property whose value is another server object
    fn object(&self, name: &str) -> Result<Self> {
        self.object_with(name, &[])
    }

    /// Read a parameterized property or call a method returning an object
    fn object_with(&self, name: &str, args: &[Variant]) -> Result<Self>;

    /// Call a method
    fn call(&self, name: &str, args: &[Variant]) -> Result<Variant>;

    /// Start a forward enumeration over this collection object
    fn elements(&self) -> Result<Box<dyn ElementEnumerator<Item = Self>>>;
}
