//! Automation interop layer for the PTV Vissim COM server
//!
//! This crate drives the simulation server over COM automation and reaches
//! past its automation interface where that interface falls short.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Session (lifecycle glue)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Query layer          │  Window control                     │
//! │  - filter / project   │  - WindowControl extension trait    │
//! │  - deferred, ordered  │  - NativeOp → native export         │
//! ├───────────────────────┼─────────────────────────────────────┤
//! │  CollectionView       │  Identity resolution                │
//! │  - lazy, single-pass  │  - IUnknown identity, scoped ref    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Typed proxies (IVissim, INet, ILinkContainer, ...)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  AutomationObject: IDispatch backend │ simulated server     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use vissim_com::sim::SimServer;
//! use vissim_com::WindowControl;
//!
//! let server = SimServer::new().with_links(1..=15);
//! let vissim = server.vissim();
//!
//! let selected: Vec<i32> = vissim.net()?.links()?
//!     .query()?
//!     .filter(|link| Ok(link.no()? > 10))
//!     .project(|link| link.no())
//!     .try_collect()?;
//! assert_eq!(selected, vec![11, 12, 13, 14, 15]);
//!
//! vissim.hide_main_window(&server.utilities())?;
//! assert!(!server.window_visible());
//! # Ok::<(), vissim_com::ComError>(())
//! ```
//!
//! # Modules
//!
//! - [`types`]: errors, HRESULT codes, attribute values
//! - [`identity`]: canonical object identity with scoped references
//! - [`capability`]: native operations and the window control extension
//! - [`collection`]: lazy collection views and queries
//! - [`bindings`]: late-bound boundary and typed proxies
//! - [`backend`]: the `IDispatch` backend (Windows)
//! - [`sim`]: in-process simulated server
//! - [`session`], [`config`]: lifecycle glue and its configuration

pub mod backend;
pub mod bindings;
pub mod capability;
pub mod collection;
pub mod config;
pub mod identity;
pub mod session;
pub mod sim;
pub mod types;

pub use bindings::{
    AutomationObject, IGraphics, ILink, ILinkContainer, INet, ISimulation, IVehicle,
    IVehicleContainer, IVissim,
};
pub use capability::{invoke, NativeLibrary, NativeModule, NativeOp, WindowControl};
pub use collection::{CollectionView, ElementEnumerator, Query};
pub use config::{SessionConfig, SessionConfigBuilder};
pub use identity::{resolve, same_object, IdentityHandle, IdentitySource, RawIdentity};
pub use session::Session;
pub use types::{ComError, Result, Variant};
