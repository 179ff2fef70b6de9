//! Typed proxies over [`AutomationObject`]
//!
//! Each proxy is a newtype around a backend object. Several proxies can wrap
//! the same server object; identity resolution sees through all of them.

use std::path::Path;

use tracing::debug;

use super::AutomationObject;
use crate::collection::{CollectionView, ElementEnumerator, Query};
use crate::identity::{IdentitySource, RawIdentity};
use crate::types::{attribute, member, ComError, Result, Variant};

macro_rules! proxy {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name<O>(O);

        impl<O: AutomationObject> $name<O> {
            /// View a backend object through this interface
            pub fn from_object(object: O) -> Self {
                Self(object)
            }

            /// The underlying backend object
            pub fn object(&self) -> &O {
                &self.0
            }

            /// Unwrap the backend object
            pub fn into_object(self) -> O {
                self.0
            }

            /// Read `AttValue(attribute)`
            pub fn att_value(&self, attribute: &str) -> Result<Variant> {
                self.0.property(member::ATT_VALUE, &[Variant::from(attribute)])
            }

            /// Write `AttValue(attribute)`
            pub fn set_att_value(&self, attribute: &str, value: impl Into<Variant>) -> Result<()> {
                let value = value.into();
                debug!(interface = stringify!($name), attribute, %value, "set attribute");
                self.0.set_property(member::ATT_VALUE, &[Variant::from(attribute)], value)
            }
        }

        impl<O: AutomationObject> IdentitySource for $name<O> {
            fn acquire_identity(&self) -> Result<RawIdentity> {
                self.0.acquire_identity()
            }

            unsafe fn release_identity(&self, identity: RawIdentity) {
                unsafe { self.0.release_identity(identity) }
            }
        }
    };
}

macro_rules! collection {
    ($(#[$meta:meta])* $name:ident => $element:ident) => {
        proxy!($(#[$meta])* $name);

        impl<O: AutomationObject> $name<O> {
            /// Number of elements currently in the collection
            pub fn count(&self) -> Result<usize> {
                let count = i64::try_from(&self.0.property(member::COUNT, &[])?)?;
                usize::try_from(count).map_err(|_| ComError::AttributeTypeMismatch {
                    expected: "usize",
                    found: "i64",
                })
            }

            /// Look up an element by its key attribute
            pub fn item_by_key(&self, key: impl Into<Variant>) -> Result<$element<O>> {
                self.0
                    .object_with(member::ITEM_BY_KEY, &[key.into()])
                    .map($element)
            }

            /// Fresh lazy view over the elements
            pub fn view(&self) -> Result<CollectionView<'static, $element<O>>> {
                let elements = self.0.elements()?;
                Ok(CollectionView::new(elements.map_elements($element)))
            }

            /// Deferred query over a fresh view
            pub fn query(&self) -> Result<Query<CollectionView<'static, $element<O>>>> {
                Ok(self.view()?.query())
            }
        }
    };
}

proxy!(
    /// Root interface of the automation server
    IVissim
);

proxy!(
    /// The loaded network
    INet
);

proxy!(
    /// Simulation control
    ISimulation
);

proxy!(
    /// Graphics settings
    IGraphics
);

proxy!(
    /// A network link
    ILink
);

proxy!(
    /// A vehicle currently in the network
    IVehicle
);

collection!(
    /// Collection of all links in the network
    ILinkContainer => ILink
);

collection!(
    /// Collection of all vehicles in the network
    IVehicleContainer => IVehicle
);

fn path_arg(path: &Path) -> Variant {
    Variant::from(path.to_string_lossy().into_owned())
}

impl<O: AutomationObject> IVissim<O> {
    /// `IVissim.Net`
    pub fn net(&self) -> Result<INet<O>> {
        self.0.object(member::NET).map(INet)
    }

    /// `IVissim.Simulation`
    pub fn simulation(&self) -> Result<ISimulation<O>> {
        self.0.object(member::SIMULATION).map(ISimulation)
    }

    /// `IVissim.Graphics`
    pub fn graphics(&self) -> Result<IGraphics<O>> {
        self.0.object(member::GRAPHICS).map(IGraphics)
    }

    /// Load a network file
    pub fn load_net(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "LoadNet");
        self.0.call(member::LOAD_NET, &[path_arg(path)]).map(drop)
    }

    /// Load a layout file
    pub fn load_layout(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "LoadLayout");
        self.0.call(member::LOAD_LAYOUT, &[path_arg(path)]).map(drop)
    }

    /// Shut the server down
    pub fn exit(&self) -> Result<()> {
        debug!("Exit");
        self.0.call(member::EXIT, &[]).map(drop)
    }
}

impl<O: AutomationObject> INet<O> {
    /// `INet.Links`
    pub fn links(&self) -> Result<ILinkContainer<O>> {
        self.0.object(member::LINKS).map(ILinkContainer)
    }

    /// `INet.Vehicles`
    pub fn vehicles(&self) -> Result<IVehicleContainer<O>> {
        self.0.object(member::VEHICLES).map(IVehicleContainer)
    }
}

impl<O: AutomationObject> ISimulation<O> {
    /// Run until the end of the simulation period or `SimBreakAt`
    pub fn run_continuous(&self) -> Result<()> {
        debug!("RunContinuous");
        self.0.call(member::RUN_CONTINUOUS, &[]).map(drop)
    }
}

impl<O: AutomationObject> ILink<O> {
    /// Key attribute `No`
    pub fn no(&self) -> Result<i32> {
        i32::try_from(&self.att_value(attribute::NO)?)
    }
}

impl<O: AutomationObject> IVehicle<O> {
    /// Key attribute `No`
    pub fn no(&self) -> Result<i32> {
        i32::try_from(&self.att_value(attribute::NO)?)
    }
}
