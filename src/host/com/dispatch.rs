//! Late-bound calls through `IDispatch`.

use std::mem::ManuallyDrop;
use std::ptr;

use windows::core::{IUnknown, Interface, GUID, HSTRING, PCWSTR, VARIANT};
use windows::Win32::System::Com::{
    IDispatch, DISPATCH_FLAGS, DISPATCH_METHOD, DISPATCH_PROPERTYGET, DISPATCH_PROPERTYPUT,
    DISPPARAMS, EXCEPINFO,
};
use windows::Win32::System::Ole::DISPID_PROPERTYPUT;
use windows::Win32::System::Variant::{VariantChangeType, VAR_CHANGE_FLAGS, VT_UNKNOWN};

use crate::error::{HostError, HostResult};

const LOCALE_USER_DEFAULT: u32 = 0x0400;

pub(crate) const DISP_E_MEMBERNOTFOUND: u32 = 0x8002_0003;
pub(crate) const DISP_E_UNKNOWNNAME: u32 = 0x8002_0006;
pub(crate) const DISP_E_EXCEPTION: u32 = 0x8002_0009;
pub(crate) const DISP_E_BADPARAMCOUNT: u32 = 0x8002_000E;
pub(crate) const E_INVALIDARG: u32 = 0x8007_0057;

/// Map a COM error to a [`HostError`]; `member` names what was called.
pub(crate) fn host_error(err: &windows::core::Error, member: &str) -> HostError {
    let code = err.code().0 as u32;
    match code {
        DISP_E_UNKNOWNNAME | DISP_E_MEMBERNOTFOUND => HostError::unsupported(member),
        _ => HostError::from_code(code, format!("{member}: {}", err.message())),
    }
}

/// An automation object reached by member name.
#[derive(Clone)]
pub struct Dispatch(IDispatch);

impl Dispatch {
    pub fn new(inner: IDispatch) -> Self {
        Self(inner)
    }

    /// Convert a returned `VARIANT` into an object; `None` for empty,
    /// null or non-object values.
    pub fn from_variant(value: &VARIANT) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        let mut unknown = VARIANT::default();
        unsafe { VariantChangeType(&mut unknown, value, VAR_CHANGE_FLAGS(0), VT_UNKNOWN) }.ok()?;
        let unknown = IUnknown::try_from(&unknown).ok()?;
        unknown.cast::<IDispatch>().ok().map(Self)
    }

    pub fn dispid(&self, member: &str) -> HostResult<i32> {
        let name = HSTRING::from(member);
        let names = [PCWSTR(name.as_ptr())];
        let mut id = 0i32;
        unsafe {
            self.0
                .GetIDsOfNames(&GUID::zeroed(), names.as_ptr(), 1, LOCALE_USER_DEFAULT, &mut id)
        }
        .map_err(|err| host_error(&err, member))?;
        Ok(id)
    }

    /// Whether the object exposes `member`.
    pub fn has_member(&self, member: &str) -> bool {
        self.dispid(member).is_ok()
    }

    pub fn call(&self, member: &str, args: &[VARIANT]) -> HostResult<VARIANT> {
        self.invoke(member, DISPATCH_METHOD, args)
    }

    /// Call a method that returns an object; `Ok(None)` when it returns nothing.
    pub fn call_object(&self, member: &str, args: &[VARIANT]) -> HostResult<Option<Dispatch>> {
        Ok(Self::from_variant(&self.call(member, args)?))
    }

    pub fn get(&self, member: &str) -> HostResult<VARIANT> {
        self.invoke(member, DISPATCH_PROPERTYGET, &[])
    }

    pub fn put(&self, member: &str, value: VARIANT) -> HostResult<()> {
        self.invoke(member, DISPATCH_PROPERTYPUT, &[value]).map(|_| ())
    }

    pub fn get_bool(&self, member: &str) -> HostResult<bool> {
        let value = self.get(member)?;
        i32::try_from(&value)
            .map(|v| v != 0)
            .map_err(|err| host_error(&err, member))
    }

    fn invoke(&self, member: &str, flags: DISPATCH_FLAGS, args: &[VARIANT]) -> HostResult<VARIANT> {
        let id = self.dispid(member)?;

        // IDispatch takes arguments right to left.
        let mut args: Vec<VARIANT> = args.iter().rev().cloned().collect();
        let mut named = DISPID_PROPERTYPUT;
        let is_put = flags == DISPATCH_PROPERTYPUT;
        let params = DISPPARAMS {
            rgvarg: if args.is_empty() {
                ptr::null_mut()
            } else {
                args.as_mut_ptr()
            },
            rgdispidNamedArgs: if is_put { &mut named } else { ptr::null_mut() },
            cArgs: args.len() as u32,
            cNamedArgs: u32::from(is_put),
        };

        let mut result = VARIANT::default();
        let mut excep = EXCEPINFO::default();
        let mut arg_err = 0u32;
        let outcome = unsafe {
            self.0.Invoke(
                id,
                &GUID::zeroed(),
                LOCALE_USER_DEFAULT,
                flags,
                &params,
                Some(&mut result),
                Some(&mut excep),
                Some(&mut arg_err),
            )
        };

        let description = excep.bstrDescription.to_string();
        let scode = excep.scode as u32;
        unsafe {
            ManuallyDrop::drop(&mut excep.bstrSource);
            ManuallyDrop::drop(&mut excep.bstrDescription);
            ManuallyDrop::drop(&mut excep.bstrHelpFile);
        }

        match outcome {
            Ok(()) => Ok(result),
            Err(err) if err.code().0 as u32 == DISP_E_EXCEPTION && scode != 0 => {
                Err(HostError::from_code(scode, format!("{member}: {description}")))
            }
            Err(err) => Err(host_error(&err, member)),
        }
    }
}
