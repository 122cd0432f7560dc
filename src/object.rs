//! Object handles and instance member access.

use std::fmt;

use crate::class::ClassHandle;
use crate::context::Env;
use crate::dispatch::{self, JavaArg, JavaArgs, JavaField, JavaReturn};
use crate::error::{Error, Result};
use crate::ffi::{FieldId, MethodId, ObjectRef, RefKind, Target};
use crate::reference::OwnedRef;
use crate::signature::{JavaType, MethodOf, Signature, OBJECT_SIGNATURE};

/// An owned reference to a runtime object.
///
/// Move-only. Dropping the handle releases the reference with whichever
/// release call matches its kind at that moment; a handle that was moved out
/// of with [`take`](Self::take) or emptied by [`release`](Self::release)
/// releases nothing.
///
/// Instance members are resolved against the object's class on every call.
/// Callers that invoke the same member repeatedly can resolve it once with
/// [`method_id`](Self::method_id) and use [`invoke_id`](Self::invoke_id).
///
/// A handle holding a weak reference can be used like any other: each call
/// promotes it to a local reference first and fails with
/// [`Error::NullReference`] once the object has been collected.
///
/// ```no_run
/// # fn example(env: jbridge::Env<'_>) -> jbridge::Result<()> {
/// let list = env.find_class("java/util/ArrayList")?.create_object(())?;
/// let added: bool = list.invoke_with_signature("add", "(Ljava/lang/Object;)Z", ("first",))?;
/// let size: i32 = list.invoke("size", ())?;
/// assert!(added);
/// assert_eq!(size, 1);
/// # Ok(())
/// # }
/// ```
pub struct ObjectHandle<'a> {
    inner: OwnedRef<'a>,
}

impl<'a> ObjectHandle<'a> {
    /// Take ownership of a raw object reference.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a live reference valid in `env`'s thread that
    /// no other owner will release.
    pub unsafe fn from_raw(env: Env<'a>, raw: ObjectRef) -> Self {
        Self {
            inner: OwnedRef::from_raw(env, raw),
        }
    }

    pub(crate) fn from_owned(inner: OwnedRef<'a>) -> Self {
        Self { inner }
    }

    /// A handle holding `null`.
    pub fn null(env: Env<'a>) -> Self {
        Self {
            inner: OwnedRef::null(env),
        }
    }

    /// The context this object was obtained under.
    pub fn env(&self) -> Env<'a> {
        self.inner.env()
    }

    /// The raw reference, still owned by `self`.
    pub fn as_raw(&self) -> ObjectRef {
        self.inner.as_raw()
    }

    /// Whether this handle holds `null` (or has been moved out of).
    pub fn is_null(&self) -> bool {
        !self.inner.is_bound()
    }

    /// The reference's current kind as reported by the VM.
    pub fn ref_kind(&self) -> Result<RefKind> {
        self.inner.kind()
    }

    /// Move the reference into a new handle, leaving this one holding `null`.
    pub fn take(&mut self) -> ObjectHandle<'a> {
        Self {
            inner: self.inner.take(),
        }
    }

    /// Give up ownership without releasing.
    pub fn into_raw(self) -> ObjectRef {
        self.inner.into_raw()
    }

    /// Release the reference now, leaving this handle holding `null`.
    pub fn release(&mut self) -> Result<()> {
        self.inner.release()
    }

    /// A new local reference to the same object.
    pub fn new_local_ref(&self) -> Result<ObjectHandle<'a>> {
        Ok(Self::from_owned(self.inner.new_ref(RefKind::Local)?))
    }

    /// A new global reference to the same object.
    ///
    /// Global references survive the current native frame and are the only
    /// kind that may be handed to another thread (see [`into_raw`](Self::into_raw)).
    pub fn new_global_ref(&self) -> Result<ObjectHandle<'a>> {
        Ok(Self::from_owned(self.inner.new_ref(RefKind::Global)?))
    }

    /// A new weak global reference to the same object.
    pub fn new_weak_ref(&self) -> Result<ObjectHandle<'a>> {
        Ok(Self::from_owned(self.inner.new_ref(RefKind::WeakGlobal)?))
    }

    /// A strong local reference to the object behind a weak reference, or
    /// `None` once the object has been collected.
    pub fn upgrade(&self) -> Result<Option<ObjectHandle<'a>>> {
        let strong = self.new_local_ref()?;
        Ok(if strong.is_null() { None } else { Some(strong) })
    }

    /// A strong reference to use for one call.
    ///
    /// Strong references are used as they are. A weak reference is promoted
    /// to a local one, returned alongside so it lives until the call is done;
    /// a collected object is `NullReference`.
    fn pin(&self) -> Result<(ObjectRef, Option<OwnedRef<'a>>)> {
        let raw = self.inner.bound()?;
        if self.inner.kind()? != RefKind::WeakGlobal {
            return Ok((raw, None));
        }
        let strong = self.inner.new_ref(RefKind::Local)?;
        if !strong.is_bound() {
            log::debug!("weak reference {:#x} was cleared", raw.as_raw());
            return Err(Error::NullReference);
        }
        Ok((strong.as_raw(), Some(strong)))
    }

    /// Whether both handles refer to the same object.
    pub fn is_same_object(&self, other: &ObjectHandle<'_>) -> Result<bool> {
        self.env()
            .native()
            .is_same_object(self.inner.as_raw(), other.as_raw())
    }

    /// Whether this object is an instance of `class`.
    pub fn is_instance_of(&self, class: &ClassHandle<'_>) -> Result<bool> {
        class.is_instance(self)
    }

    /// The class of this object.
    pub fn get_class(&self) -> Result<ClassHandle<'a>> {
        let (raw, _pin) = self.pin()?;
        let env = self.env();
        let class = env.native().get_object_class(raw)?;
        if class.is_null() {
            env.discard_exception()?;
            return Err(Error::ClassNotFound {
                class: "<class of object>".to_string(),
            });
        }
        // SAFETY: GetObjectClass returns a fresh local reference.
        Ok(unsafe { ClassHandle::from_raw(env, class) })
    }

    /// Resolve an instance method against this object's class.
    pub fn method_id(&self, name: &str, signature: &str) -> Result<MethodId> {
        self.get_class()?.method_id(name, signature)
    }

    /// Resolve an instance field against this object's class.
    pub fn field_id(&self, name: &str, signature: &str) -> Result<FieldId> {
        self.get_class()?.field_id(name, signature)
    }

    /// Invoke an instance method, inferring the descriptor from `A` and `R`.
    pub fn invoke<R, A>(&self, name: &str, args: A) -> Result<R>
    where
        R: JavaReturn<'a>,
        A: JavaArgs,
    {
        let signature: Signature = MethodOf::<A, R>::SIGNATURE;
        self.invoke_with_signature(name, signature.as_str(), args)
    }

    /// Invoke an instance method with an explicit descriptor.
    pub fn invoke_with_signature<R, A>(&self, name: &str, signature: &str, args: A) -> Result<R>
    where
        R: JavaReturn<'a>,
        A: JavaArgs,
    {
        let method = self.method_id(name, signature)?;
        // SAFETY: `method` was just resolved against this object's class.
        unsafe { self.invoke_id(method, args) }
    }

    /// Invoke a previously resolved instance method.
    ///
    /// # Safety
    ///
    /// `method` must have been resolved against this object's class or one
    /// of its superclasses, its return type must belong to `R`'s category
    /// and its parameters must match `A`.
    pub unsafe fn invoke_id<R, A>(&self, method: MethodId, args: A) -> Result<R>
    where
        R: JavaReturn<'a>,
        A: JavaArgs,
    {
        let (raw, _pin) = self.pin()?;
        dispatch::call_method(self.env(), Target::Instance(raw), method, &args)
    }

    /// Read an instance field, inferring the descriptor from `T`.
    pub fn get_field<T>(&self, name: &str) -> Result<T>
    where
        T: JavaReturn<'a> + JavaField,
    {
        self.get_field_with_signature(name, T::SIGNATURE.as_str())
    }

    /// Read an instance field with an explicit descriptor.
    pub fn get_field_with_signature<T>(&self, name: &str, signature: &str) -> Result<T>
    where
        T: JavaReturn<'a> + JavaField,
    {
        let field = self.field_id(name, signature)?;
        // SAFETY: `field` was just resolved against this object's class.
        unsafe { self.get_field_by_id(field) }
    }

    /// Read a previously resolved instance field.
    ///
    /// # Safety
    ///
    /// `field` must belong to this object's class (or a superclass) and be
    /// of `T`'s category.
    pub unsafe fn get_field_by_id<T>(&self, field: FieldId) -> Result<T>
    where
        T: JavaReturn<'a> + JavaField,
    {
        let (raw, _pin) = self.pin()?;
        dispatch::get_field(self.env(), Target::Instance(raw), field)
    }

    /// Write an instance field, inferring the descriptor from `T`.
    pub fn set_field<T>(&self, name: &str, value: &T) -> Result<()>
    where
        T: JavaArg + JavaField + ?Sized,
    {
        self.set_field_with_signature(name, T::SIGNATURE.as_str(), value)
    }

    /// Write an instance field with an explicit descriptor.
    pub fn set_field_with_signature<T>(&self, name: &str, signature: &str, value: &T) -> Result<()>
    where
        T: JavaArg + JavaField + ?Sized,
    {
        let field = self.field_id(name, signature)?;
        // SAFETY: `field` was just resolved against this object's class.
        unsafe { self.set_field_by_id(field, value) }
    }

    /// Write a previously resolved instance field.
    ///
    /// # Safety
    ///
    /// `field` must belong to this object's class (or a superclass) and be
    /// of `T`'s category.
    pub unsafe fn set_field_by_id<T>(&self, field: FieldId, value: &T) -> Result<()>
    where
        T: JavaArg + JavaField + ?Sized,
    {
        let (raw, _pin) = self.pin()?;
        dispatch::set_field(self.env(), Target::Instance(raw), field, value)
    }
}

impl JavaType for ObjectHandle<'_> {
    const SIGNATURE: Signature = OBJECT_SIGNATURE;
}

impl fmt::Debug for ObjectHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHandle")
            .field("raw", &self.inner.as_raw())
            .finish()
    }
}
