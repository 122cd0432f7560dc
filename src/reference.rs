//! Ownership of runtime references.
//!
//! [`OwnedRef`] is the single owner of one runtime reference. It is either
//! bound (holding a live local, global or weak reference) or unbound (holding
//! the null sentinel). Dropping a bound reference releases it exactly once;
//! which release call is issued is decided by asking the VM for the
//! reference's kind at that moment, never by remembering how the reference
//! was obtained.

use std::fmt;
use std::mem;

use crate::context::Env;
use crate::error::{Error, Result};
use crate::ffi::{ObjectRef, RefKind};

/// A uniquely owned runtime reference.
///
/// Not `Clone`: two owners would release the same reference twice. Use
/// [`new_ref`](Self::new_ref) to obtain a second, independently owned
/// reference to the same object.
pub struct OwnedRef<'a> {
    env: Env<'a>,
    raw: ObjectRef,
}

impl<'a> OwnedRef<'a> {
    /// Take ownership of a raw reference.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a live reference valid in `env`'s thread that no
    /// other owner will release.
    pub unsafe fn from_raw(env: Env<'a>, raw: ObjectRef) -> Self {
        Self { env, raw }
    }

    /// An unbound reference.
    pub fn null(env: Env<'a>) -> Self {
        Self {
            env,
            raw: ObjectRef::null(),
        }
    }

    /// The context this reference was obtained under.
    pub fn env(&self) -> Env<'a> {
        self.env
    }

    /// The raw reference, still owned by `self`.
    pub fn as_raw(&self) -> ObjectRef {
        self.raw
    }

    /// Whether a reference is held.
    pub fn is_bound(&self) -> bool {
        !self.raw.is_null()
    }

    /// The reference's current kind as reported by the VM.
    ///
    /// An unbound reference reports [`RefKind::Invalid`] without asking.
    pub fn kind(&self) -> Result<RefKind> {
        if self.raw.is_null() {
            return Ok(RefKind::Invalid);
        }
        self.env.native().get_object_ref_type(self.raw)
    }

    /// Bound reference or `NullReference`.
    pub(crate) fn bound(&self) -> Result<ObjectRef> {
        if self.raw.is_null() {
            Err(Error::NullReference)
        } else {
            Ok(self.raw)
        }
    }

    /// Move the reference out, leaving `self` unbound.
    pub fn take(&mut self) -> OwnedRef<'a> {
        OwnedRef {
            env: self.env,
            raw: mem::take(&mut self.raw),
        }
    }

    /// Give up ownership without releasing.
    pub fn into_raw(mut self) -> ObjectRef {
        mem::take(&mut self.raw)
    }

    /// A new, independently owned reference of the given kind to the same object.
    ///
    /// Promoting a weak reference whose object has been collected yields an
    /// unbound reference.
    pub fn new_ref(&self, kind: RefKind) -> Result<OwnedRef<'a>> {
        let raw = self.bound()?;
        let native = self.env.native();
        let fresh = match kind {
            RefKind::Local => native.new_local_ref(raw)?,
            RefKind::Global => native.new_global_ref(raw)?,
            RefKind::WeakGlobal => native.new_weak_global_ref(raw)?,
            RefKind::Invalid => {
                return Err(Error::InvalidArgument(
                    "cannot create an invalid reference".to_string(),
                ))
            }
        };
        Ok(OwnedRef {
            env: self.env,
            raw: fresh,
        })
    }

    /// Release the reference now, leaving `self` unbound.
    ///
    /// Releasing an unbound reference does nothing.
    pub fn release(&mut self) -> Result<()> {
        let raw = mem::take(&mut self.raw);
        if raw.is_null() {
            return Ok(());
        }
        release_raw(self.env, raw)
    }
}

fn release_raw(env: Env<'_>, raw: ObjectRef) -> Result<()> {
    let native = env.native();
    match native.get_object_ref_type(raw)? {
        RefKind::Global => {
            log::trace!("releasing global reference {:#x}", raw.as_raw());
            native.delete_global_ref(raw)
        }
        RefKind::WeakGlobal => {
            log::trace!("releasing weak global reference {:#x}", raw.as_raw());
            native.delete_weak_global_ref(raw)
        }
        RefKind::Local => {
            log::trace!("releasing local reference {:#x}", raw.as_raw());
            native.delete_local_ref(raw)
        }
        // Deleting something the VM does not recognise as a reference can
        // take the whole process down.
        RefKind::Invalid => {
            log::warn!("not releasing invalid reference {:#x}", raw.as_raw());
            Ok(())
        }
    }
}

impl Drop for OwnedRef<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            log::warn!("failed to release reference: {}", err);
        }
    }
}

impl fmt::Debug for OwnedRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedRef").field("raw", &self.raw).finish()
    }
}
