//! `IDispatch` backend
//!
//! Drives the real automation server through late binding: member names are
//! resolved with `GetIDsOfNames` and called with `Invoke`. Collections are
//! walked with the `IEnumVARIANT` returned by `_NewEnum`.

use std::marker::PhantomData;
use std::ptr;

use tracing::{debug, trace};
use windows::core::{IUnknown, Interface, BSTR, GUID, HSTRING, PCWSTR, VARIANT};
use windows::Win32::System::Com::{
    CLSIDFromProgID, CoCreateInstance, CoInitializeEx, CoUninitialize, IDispatch,
    CLSCTX_LOCAL_SERVER, COINIT_APARTMENTTHREADED, DISPATCH_FLAGS, DISPATCH_METHOD,
    DISPATCH_PROPERTYGET, DISPATCH_PROPERTYPUT, DISPPARAMS,
};
use windows::Win32::System::Ole::IEnumVARIANT;

use crate::bindings::AutomationObject;
use crate::collection::ElementEnumerator;
use crate::identity::{IdentitySource, RawIdentity};
use crate::types::{hresult, vartype, ComError, Result, Variant};

/// `LOCALE_USER_DEFAULT`
const LOCALE_USER_DEFAULT: u32 = 0x0400;
/// Named argument carrying the value of a property put
const DISPID_PROPERTYPUT: i32 = -3;
/// Member returning the collection enumerator
const DISPID_NEWENUM: i32 = -4;

fn com_error(err: windows::core::Error, context: impl Into<String>) -> ComError {
    ComError::from_hresult(err.code().0 as u32, context)
}

/// Single-threaded COM apartment on the current thread
///
/// Every call into the server is made from this thread.
pub struct ComApartment {
    _not_send: PhantomData<*const ()>,
}

impl ComApartment {
    /// Initialize COM on the calling thread
    pub fn enter() -> Result<Self> {
        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
            .ok()
            .map_err(|e| com_error(e, "CoInitializeEx"))?;
        Ok(Self {
            _not_send: PhantomData,
        })
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

/// A server object reached through `IDispatch`
#[derive(Clone, Debug)]
pub struct DispatchObject {
    dispatch: IDispatch,
}

impl DispatchObject {
    /// Start the server registered under `prog_id`
    pub fn create(prog_id: &str) -> Result<Self> {
        let clsid = unsafe { CLSIDFromProgID(&HSTRING::from(prog_id)) }
            .map_err(|e| com_error(e, format!("CLSIDFromProgID({})", prog_id)))?;
        let dispatch: IDispatch = unsafe { CoCreateInstance(&clsid, None, CLSCTX_LOCAL_SERVER) }
            .map_err(|e| com_error(e, format!("CoCreateInstance({})", prog_id)))?;
        Ok(Self { dispatch })
    }

    fn from_variant_object(value: &VARIANT, context: &str) -> Result<Self> {
        let unknown = IUnknown::try_from(value).map_err(|e| com_error(e, context))?;
        let dispatch = unknown.cast::<IDispatch>().map_err(|e| com_error(e, context))?;
        Ok(Self { dispatch })
    }

    fn dispid(&self, name: &str) -> Result<i32> {
        let wide = HSTRING::from(name);
        let names = [PCWSTR(wide.as_ptr())];
        let mut dispid = 0i32;
        unsafe {
            self.dispatch.GetIDsOfNames(
                &GUID::zeroed(),
                names.as_ptr(),
                1,
                LOCALE_USER_DEFAULT,
                &mut dispid,
            )
        }
        .map_err(|e| com_error(e, name))?;
        Ok(dispid)
    }

    fn invoke(
        &self,
        dispid: i32,
        context: &str,
        flags: DISPATCH_FLAGS,
        args: &[Variant],
        put: Option<&Variant>,
    ) -> Result<VARIANT> {
        // Arguments travel right to left; the put value is the named first one.
        let mut argv: Vec<VARIANT> = put
            .into_iter()
            .chain(args.iter().rev())
            .map(to_variant)
            .collect();
        let mut named = [DISPID_PROPERTYPUT];
        let params = DISPPARAMS {
            rgvarg: if argv.is_empty() {
                ptr::null_mut()
            } else {
                argv.as_mut_ptr()
            },
            rgdispidNamedArgs: if put.is_some() {
                named.as_mut_ptr()
            } else {
                ptr::null_mut()
            },
            cArgs: argv.len() as u32,
            cNamedArgs: u32::from(put.is_some()),
        };

        trace!(member = context, dispid, args = args.len(), "IDispatch::Invoke");
        let mut result = VARIANT::default();
        let mut arg_err = 0u32;
        unsafe {
            self.dispatch.Invoke(
                dispid,
                &GUID::zeroed(),
                LOCALE_USER_DEFAULT,
                flags,
                &params,
                &mut result,
                ptr::null_mut(),
                &mut arg_err,
            )
        }
        .map_err(|e| com_error(e, context))?;
        Ok(result)
    }

    fn get(&self, name: &str, args: &[Variant]) -> Result<VARIANT> {
        let dispid = self.dispid(name)?;
        self.invoke(dispid, name, DISPATCH_PROPERTYGET | DISPATCH_METHOD, args, None)
    }
}

fn to_variant(value: &Variant) -> VARIANT {
    match value {
        Variant::Empty | Variant::Null => VARIANT::default(),
        Variant::Bool(v) => VARIANT::from(*v),
        Variant::I4(v) => VARIANT::from(*v),
        Variant::I8(v) => VARIANT::from(*v),
        Variant::R8(v) => VARIANT::from(*v),
        Variant::Str(v) => VARIANT::from(BSTR::from(v.as_str())),
    }
}

fn from_variant(value: &VARIANT, context: &str) -> Result<Variant> {
    let found = value.vt().0;
    let converted = match found {
        vartype::EMPTY => return Ok(Variant::Empty),
        vartype::NULL => return Ok(Variant::Null),
        vartype::BOOL => bool::try_from(value).map(Variant::Bool),
        vartype::I2 | vartype::I4 | vartype::UI1 | vartype::UI2 | vartype::INT => {
            i32::try_from(value).map(Variant::I4)
        }
        vartype::I8 => i64::try_from(value).map(Variant::I8),
        vartype::R4 | vartype::R8 => f64::try_from(value).map(Variant::R8),
        vartype::BSTR => BSTR::try_from(value).map(|s| Variant::Str(s.to_string())),
        _ => {
            return Err(ComError::Unsupported(format!(
                "{} returned VARTYPE {}",
                context, found
            )))
        }
    };
    converted.map_err(|e| com_error(e, context))
}

impl IdentitySource for DispatchObject {
    fn acquire_identity(&self) -> Result<RawIdentity> {
        let unknown: IUnknown = self
            .dispatch
            .cast()
            .map_err(|e| com_error(e, "QueryInterface(IUnknown)"))?;
        RawIdentity::new(unknown.into_raw())
            .ok_or_else(|| ComError::from_hresult(hresult::E_POINTER, "QueryInterface(IUnknown)"))
    }

    unsafe fn release_identity(&self, identity: RawIdentity) {
        // SAFETY: the pointer carries the reference added by `cast` in
        // `acquire_identity`; rebuilding the interface releases it on drop.
        drop(unsafe { IUnknown::from_raw(identity.as_ptr()) });
    }
}

impl AutomationObject for DispatchObject {
    fn property(&self, name: &str, args: &[Variant]) -> Result<Variant> {
        from_variant(&self.get(name, args)?, name)
    }

    fn set_property(&self, name: &str, args: &[Variant], value: Variant) -> Result<()> {
        let dispid = self.dispid(name)?;
        self.invoke(dispid, name, DISPATCH_PROPERTYPUT, args, Some(&value))?;
        Ok(())
    }

    fn object_with(&self, name: &str, args: &[Variant]) -> Result<Self> {
        Self::from_variant_object(&self.get(name, args)?, name)
    }

    fn call(&self, name: &str, args: &[Variant]) -> Result<Variant> {
        debug!(member = name, "calling server method");
        let dispid = self.dispid(name)?;
        let result = self.invoke(dispid, name, DISPATCH_METHOD, args, None)?;
        from_variant(&result, name)
    }

    fn elements(&self) -> Result<Box<dyn ElementEnumerator<Item = Self>>> {
        let context = "_NewEnum";
        let value = self.invoke(
            DISPID_NEWENUM,
            context,
            DISPATCH_PROPERTYGET | DISPATCH_METHOD,
            &[],
            None,
        )?;
        let unknown = IUnknown::try_from(&value).map_err(|e| com_error(e, context))?;
        let inner = unknown
            .cast::<IEnumVARIANT>()
            .map_err(|e| com_error(e, context))?;
        Ok(Box::new(DispatchEnumerator { inner }))
    }
}

/// `IEnumVARIANT` pulled one element at a time
struct DispatchEnumerator {
    inner: IEnumVARIANT,
}

impl ElementEnumerator for DispatchEnumerator {
    type Item = DispatchObject;

    fn next_element(&mut self) -> Result<Option<DispatchObject>> {
        let context = "IEnumVARIANT::Next";
        let mut slot = [VARIANT::default()];
        let mut fetched = 0u32;
        let status = unsafe { self.inner.Next(&mut slot, &mut fetched) };
        if status.is_err() {
            return Err(match ComError::from_hresult(status.0 as u32, context) {
                err @ ComError::DisconnectedObject(_) => err,
                _ => ComError::EnumerationInvalidated(format!(
                    "{} failed with HRESULT 0x{:08x}",
                    context, status.0 as u32
                )),
            });
        }
        if fetched == 0 {
            return Ok(None);
        }
        DispatchObject::from_variant_object(&slot[0], context).map(Some)
    }
}
