//! Runtime strings.

use std::fmt;

use crate::context::Env;
use crate::error::{Error, Result};
use crate::ffi::{check_exception, ObjectRef, RefKind};
use crate::object::ObjectHandle;
use crate::reference::OwnedRef;
use crate::signature::{JavaType, Signature, STRING_SIGNATURE};

/// An owned reference to a `java.lang.String`.
///
/// Text crosses the boundary as UTF-16, so any Rust string survives the round
/// trip unchanged, including characters outside the Basic Multilingual Plane.
///
/// ```no_run
/// # fn example(env: jbridge::Env<'_>) -> jbridge::Result<()> {
/// let greeting = env.new_string("grüß dich 👋")?;
/// assert_eq!(greeting.to_rust_string()?, "grüß dich 👋");
/// # Ok(())
/// # }
/// ```
pub struct StringHandle<'a> {
    inner: OwnedRef<'a>,
}

impl<'a> StringHandle<'a> {
    /// Create a new runtime string from Rust text.
    pub fn new(env: Env<'a>, text: &str) -> Result<Self> {
        let utf16: Vec<u16> = text.encode_utf16().collect();
        let raw = env.native().new_string(&utf16)?;
        check_exception(env)?;
        if raw.is_null() {
            return Err(Error::NullReference);
        }
        // SAFETY: NewString returns a fresh local reference.
        Ok(unsafe { Self::from_raw(env, raw) })
    }

    /// Take ownership of a raw string reference.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a live reference to a `java.lang.String` that
    /// no other owner will release.
    pub unsafe fn from_raw(env: Env<'a>, raw: ObjectRef) -> Self {
        Self {
            inner: OwnedRef::from_raw(env, raw),
        }
    }

    /// Read the string back as Rust text.
    pub fn to_rust_string(&self) -> Result<String> {
        let raw = self.inner.bound()?;
        let env = self.inner.env();
        let utf16 = env.native().get_string_chars(raw)?;
        check_exception(env)?;
        String::from_utf16(&utf16).map_err(|err| Error::StringConversion(err.to_string()))
    }

    /// Read the string back, replacing unpaired surrogates with U+FFFD.
    pub fn to_string_lossy(&self) -> Result<String> {
        let raw = self.inner.bound()?;
        let env = self.inner.env();
        let utf16 = env.native().get_string_chars(raw)?;
        check_exception(env)?;
        Ok(String::from_utf16_lossy(&utf16))
    }

    /// Whether this handle holds `null`.
    pub fn is_null(&self) -> bool {
        !self.inner.is_bound()
    }

    /// The raw reference, still owned by `self`.
    pub fn as_raw(&self) -> ObjectRef {
        self.inner.as_raw()
    }

    /// The reference's current kind.
    pub fn ref_kind(&self) -> Result<RefKind> {
        self.inner.kind()
    }

    /// Give up ownership without releasing.
    pub fn into_raw(self) -> ObjectRef {
        self.inner.into_raw()
    }

    /// Release the reference now.
    pub fn release(&mut self) -> Result<()> {
        self.inner.release()
    }

    /// View this string as a plain object.
    pub fn into_object(self) -> ObjectHandle<'a> {
        ObjectHandle::from_owned(self.inner)
    }

    pub(crate) fn into_owned(self) -> OwnedRef<'a> {
        self.inner
    }
}

impl TryFrom<&StringHandle<'_>> for String {
    type Error = Error;

    fn try_from(handle: &StringHandle<'_>) -> Result<Self> {
        handle.to_rust_string()
    }
}

impl JavaType for StringHandle<'_> {
    const SIGNATURE: Signature = STRING_SIGNATURE;
}

impl fmt::Debug for StringHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringHandle")
            .field("raw", &self.inner.as_raw())
            .finish()
    }
}
