//! In-process simulated automation server
//!
//! Models the part of the server's object graph the interop layer touches:
//! the root object with its network, simulation and graphics objects, link
//! and vehicle collections, per-object reference counts, and the main window
//! visibility flag. Runs on every platform.
//!
//! Collections carry a generation counter. Adding or removing an element
//! bumps it, and any enumeration started under an older generation fails
//! with `EnumerationInvalidated` on its next step.

mod utilities;

pub use utilities::{NativeCall, SimUtilities};

use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::bindings::{AutomationObject, IVissim};
use crate::collection::ElementEnumerator;
use crate::identity::{IdentitySource, RawIdentity};
use crate::types::{attribute, hresult, member, ComError, Result, Variant};

const ROOT: usize = 0;
const NET: usize = 1;
const SIMULATION: usize = 2;
const GRAPHICS: usize = 3;
const LINKS: usize = 4;
const VEHICLES: usize = 5;

/// Default simulation period in seconds
const DEFAULT_SIM_PERIOD: i32 = 3600;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Vissim,
    Net,
    Simulation,
    Graphics,
    LinkContainer,
    VehicleContainer,
    Link,
    Vehicle,
}

struct Entry {
    kind: Kind,
    attributes: HashMap<String, Variant>,
    refs: u32,
    alive: bool,
}

impl Entry {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            attributes: HashMap::new(),
            refs: 0,
            alive: true,
        }
    }

    fn with(mut self, name: &str, value: impl Into<Variant>) -> Self {
        self.attributes.insert(attribute_key(name), value.into());
        self
    }
}

/// Attribute names are case-insensitive on the server
fn attribute_key(name: &str) -> String {
    name.to_ascii_uppercase()
}

fn identity_for(id: usize) -> Option<RawIdentity> {
    // Fake, never dereferenced, 16-byte aligned addresses.
    RawIdentity::new(((id + 1) << 4) as *mut c_void)
}

fn id_for(identity: RawIdentity) -> usize {
    (identity.addr() >> 4).saturating_sub(1)
}

#[derive(Default)]
struct State {
    entries: Vec<Entry>,
    links: Vec<usize>,
    vehicles: Vec<usize>,
    links_generation: u64,
    vehicles_generation: u64,
    window_visible: bool,
    network_file: Option<String>,
    layout_file: Option<String>,
    runs: u32,
    exited: bool,
    acquired: u64,
    released: u64,
    native_calls: Vec<NativeCall>,
}

impl State {
    fn live(&self, id: usize) -> Result<&Entry> {
        match self.entries.get(id) {
            Some(entry) if entry.alive => Ok(entry),
            Some(entry) => Err(ComError::DisconnectedObject(format!("{:?} #{}", entry.kind, id))),
            None => Err(ComError::DisconnectedObject(format!("unknown object #{}", id))),
        }
    }

    fn live_mut(&mut self, id: usize) -> Result<&mut Entry> {
        self.live(id)?;
        Ok(&mut self.entries[id])
    }

    fn insert(&mut self, entry: Entry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    fn collection(&self, container: usize) -> (&[usize], u64) {
        match container {
            LINKS => (&self.links, self.links_generation),
            _ => (&self.vehicles, self.vehicles_generation),
        }
    }

    fn find_by_no(&self, container: usize, key: &Variant) -> Result<usize> {
        let no = i32::try_from(key)?;
        let (items, _) = self.collection(container);
        items
            .iter()
            .copied()
            .find(|id| {
                self.entries[*id].attributes.get(&attribute_key(attribute::NO)) == Some(&Variant::I4(no))
            })
            .ok_or_else(|| ComError::from_hresult(hresult::E_INVALIDARG, format!("ItemByKey({})", no)))
    }
}

/// Handle to a simulated server; clones share the same server
#[derive(Clone)]
pub struct SimServer {
    state: Arc<Mutex<State>>,
}

impl SimServer {
    /// Start a server with an empty network
    pub fn new() -> Self {
        let mut state = State {
            window_visible: true,
            ..State::default()
        };
        state.insert(Entry::new(Kind::Vissim));
        state.insert(Entry::new(Kind::Net));
        state.insert(
            Entry::new(Kind::Simulation)
                .with(attribute::SIM_PERIOD, DEFAULT_SIM_PERIOD)
                .with(attribute::SIM_BREAK_AT, 0)
                .with(attribute::SIM_SEC, 0.0),
        );
        state.insert(Entry::new(Kind::Graphics).with(attribute::QUICK_MODE, false));
        state.insert(Entry::new(Kind::LinkContainer));
        state.insert(Entry::new(Kind::VehicleContainer));

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Builder-style [`SimServer::add_link`] for several links
    pub fn with_links(self, numbers: impl IntoIterator<Item = i32>) -> Self {
        for no in numbers {
            self.add_link(no);
        }
        self
    }

    /// Add a link with key `no`
    pub fn add_link(&self, no: i32) {
        let mut state = self.state.lock();
        let id = state.insert(
            Entry::new(Kind::Link)
                .with(attribute::NO, no)
                .with("Name", format!("Link {}", no)),
        );
        state.links.push(id);
        state.links_generation += 1;
    }

    /// Remove the link with key `no`; its references become disconnected
    pub fn remove_link(&self, no: i32) -> bool {
        let mut state = self.state.lock();
        let Ok(id) = state.find_by_no(LINKS, &Variant::I4(no)) else {
            return false;
        };
        state.links.retain(|l| *l != id);
        state.entries[id].alive = false;
        state.links_generation += 1;
        true
    }

    /// Set an attribute on the link with key `no`
    pub fn set_link_attribute(&self, no: i32, name: &str, value: impl Into<Variant>) -> Result<()> {
        let mut state = self.state.lock();
        let id = state.find_by_no(LINKS, &Variant::I4(no))?;
        state.entries[id].attributes.insert(attribute_key(name), value.into());
        Ok(())
    }

    /// Add a vehicle with key `no` travelling at `speed`
    pub fn add_vehicle(&self, no: i32, speed: f64) {
        let mut state = self.state.lock();
        let id = state.insert(
            Entry::new(Kind::Vehicle)
                .with(attribute::NO, no)
                .with("Speed", speed),
        );
        state.vehicles.push(id);
        state.vehicles_generation += 1;
    }

    /// The server's root object
    pub fn vissim(&self) -> IVissim<SimObject> {
        IVissim::from_object(self.object(ROOT))
    }

    /// Native utilities module bound to this server
    pub fn utilities(&self) -> SimUtilities {
        SimUtilities::new(self.clone())
    }

    fn object(&self, id: usize) -> SimObject {
        SimObject {
            server: self.clone(),
            id,
        }
    }

    /// Whether the main window is visible
    pub fn window_visible(&self) -> bool {
        self.state.lock().window_visible
    }

    /// Identity references currently held on all objects
    pub fn outstanding_refs(&self) -> u32 {
        self.state.lock().entries.iter().map(|e| e.refs).sum()
    }

    /// Total identity acquisitions and releases so far
    pub fn identity_traffic(&self) -> (u64, u64) {
        let state = self.state.lock();
        (state.acquired, state.released)
    }

    /// Native calls received, in order
    pub fn native_calls(&self) -> Vec<NativeCall> {
        self.state.lock().native_calls.clone()
    }

    /// Last network file loaded
    pub fn network_file(&self) -> Option<String> {
        self.state.lock().network_file.clone()
    }

    /// Last layout file loaded
    pub fn layout_file(&self) -> Option<String> {
        self.state.lock().layout_file.clone()
    }

    /// Number of continuous runs
    pub fn run_count(&self) -> u32 {
        self.state.lock().runs
    }

    /// Whether `Exit` was called
    pub fn has_exited(&self) -> bool {
        self.state.lock().exited
    }
}

impl Default for SimServer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SimServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SimServer")
            .field("objects", &state.entries.len())
            .field("links", &state.links.len())
            .field("vehicles", &state.vehicles.len())
            .field("exited", &state.exited)
            .finish()
    }
}

/// Reference to an object on a [`SimServer`]
#[derive(Clone)]
pub struct SimObject {
    server: SimServer,
    id: usize,
}

impl SimObject {
    /// Identity references currently held on this object
    pub fn ref_count(&self) -> u32 {
        self.server
            .state
            .lock()
            .entries
            .get(self.id)
            .map_or(0, |e| e.refs)
    }

    fn unknown(kind: Kind, name: &str) -> ComError {
        ComError::UnknownMember(format!("{:?}.{}", kind, name))
    }
}

impl fmt::Debug for SimObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimObject(#{})", self.id)
    }
}

fn attribute_arg(args: &[Variant]) -> Result<String> {
    match args.first() {
        Some(name) => Ok(attribute_key(name.as_str()?)),
        None => Err(ComError::from_hresult(hresult::E_INVALIDARG, "AttValue without name")),
    }
}

fn path_arg(name: &str, args: &[Variant]) -> Result<String> {
    args.first()
        .ok_or_else(|| ComError::from_hresult(hresult::E_INVALIDARG, format!("{} without path", name)))?
        .as_str()
        .map(str::to_string)
}

impl IdentitySource for SimObject {
    fn acquire_identity(&self) -> Result<RawIdentity> {
        let mut state = self.server.state.lock();
        let identity = identity_for(self.id)
            .ok_or_else(|| ComError::from_hresult(hresult::E_POINTER, "QueryInterface(IUnknown)"))?;
        state.live_mut(self.id)?.refs += 1;
        state.acquired += 1;
        Ok(identity)
    }

    unsafe fn release_identity(&self, identity: RawIdentity) {
        let mut state = self.server.state.lock();
        match state.entries.get_mut(id_for(identity)) {
            Some(entry) if entry.refs > 0 => entry.refs -= 1,
            _ => warn!(?identity, "release without matching acquire"),
        }
        state.released += 1;
    }
}

impl AutomationObject for SimObject {
    fn property(&self, name: &str, args: &[Variant]) -> Result<Variant> {
        let state = self.server.state.lock();
        let entry = state.live(self.id)?;
        match (entry.kind, name) {
            (_, member::ATT_VALUE) => {
                let key = attribute_arg(args)?;
                entry
                    .attributes
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| ComError::UnknownMember(format!("AttValue({})", key)))
            }
            (Kind::LinkContainer | Kind::VehicleContainer, member::COUNT) => {
                let (items, _) = state.collection(self.id);
                Ok(Variant::I4(items.len() as i32))
            }
            (kind, _) => Err(Self::unknown(kind, name)),
        }
    }

    fn set_property(&self, name: &str, args: &[Variant], value: Variant) -> Result<()> {
        let mut state = self.server.state.lock();
        let entry = state.live_mut(self.id)?;
        if name != member::ATT_VALUE {
            return Err(Self::unknown(entry.kind, name));
        }
        let key = attribute_arg(args)?;
        debug!(object = self.id, attribute = %key, %value, "simulated attribute write");
        entry.attributes.insert(key, value);
        Ok(())
    }

    fn object_with(&self, name: &str, args: &[Variant]) -> Result<Self> {
        let state = self.server.state.lock();
        let entry = state.live(self.id)?;
        let id = match (entry.kind, name) {
            (Kind::Vissim, member::NET) => NET,
            (Kind::Vissim, member::SIMULATION) => SIMULATION,
            (Kind::Vissim, member::GRAPHICS) => GRAPHICS,
            (Kind::Net, member::LINKS) => LINKS,
            (Kind::Net, member::VEHICLES) => VEHICLES,
            (Kind::LinkContainer | Kind::VehicleContainer, member::ITEM_BY_KEY) => {
                let key = args
                    .first()
                    .ok_or_else(|| ComError::from_hresult(hresult::E_INVALIDARG, "ItemByKey without key"))?;
                state.find_by_no(self.id, key)?
            }
            (kind, _) => return Err(Self::unknown(kind, name)),
        };
        drop(state);
        Ok(self.server.object(id))
    }

    fn call(&self, name: &str, args: &[Variant]) -> Result<Variant> {
        let mut state = self.server.state.lock();
        let kind = state.live(self.id)?.kind;
        match (kind, name) {
            (Kind::Vissim, member::LOAD_NET) => {
                state.network_file = Some(path_arg(name, args)?);
            }
            (Kind::Vissim, member::LOAD_LAYOUT) => {
                state.layout_file = Some(path_arg(name, args)?);
            }
            (Kind::Vissim, member::EXIT) => {
                state.exited = true;
                for entry in &mut state.entries {
                    entry.alive = false;
                }
            }
            (Kind::Simulation, member::RUN_CONTINUOUS) => {
                state.runs += 1;
                let sim = &mut state.entries[SIMULATION].attributes;
                let period = sim
                    .get(&attribute_key(attribute::SIM_PERIOD))
                    .map_or(Ok(f64::from(DEFAULT_SIM_PERIOD)), f64::try_from)?;
                let break_at = sim
                    .get(&attribute_key(attribute::SIM_BREAK_AT))
                    .map_or(Ok(0.0), f64::try_from)?;
                let end = if break_at > 0.0 { break_at.min(period) } else { period };
                sim.insert(attribute_key(attribute::SIM_SEC), Variant::R8(end));
            }
            (kind, _) => return Err(Self::unknown(kind, name)),
        }
        Ok(Variant::Empty)
    }

    fn elements(&self) -> Result<Box<dyn ElementEnumerator<Item = Self>>> {
        let state = self.server.state.lock();
        let kind = state.live(self.id)?.kind;
        if !matches!(kind, Kind::LinkContainer | Kind::VehicleContainer) {
            return Err(Self::unknown(kind, "_NewEnum"));
        }
        let (_, generation) = state.collection(self.id);
        Ok(Box::new(SimEnumerator {
            server: self.server.clone(),
            container: self.id,
            generation,
            position: 0,
        }))
    }
}

/// Forward enumerator over a simulated collection
struct SimEnumerator {
    server: SimServer,
    container: usize,
    generation: u64,
    position: usize,
}

impl ElementEnumerator for SimEnumerator {
    type Item = SimObject;

    fn next_element(&mut self) -> Result<Option<SimObject>> {
        let state = self.server.state.lock();
        state.live(self.container)?;
        let (items, generation) = state.collection(self.container);
        if generation != self.generation {
            return Err(ComError::EnumerationInvalidated(format!(
                "collection modified after {} elements",
                self.position
            )));
        }
        let Some(id) = items.get(self.position).copied() else {
            return Ok(None);
        };
        drop(state);
        self.position += 1;
        Ok(Some(self.server.object(id)))
    }
}
