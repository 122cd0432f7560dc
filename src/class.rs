//! Classes: member resolution, construction and static members.

use std::fmt;

use crate::context::{c_string, Env};
use crate::dispatch::{self, JavaArg, JavaArgs, JavaField, JavaReturn};
use crate::error::{Error, Result};
use crate::ffi::{FieldId, MethodId, ObjectRef, RefKind, Target};
use crate::object::ObjectHandle;
use crate::reference::OwnedRef;
use crate::signature::{ConstructorOf, MethodOf, Signature};

const CONSTRUCTOR: &str = "<init>";
const CLASS_CLASS: &str = "java/lang/Class";

/// A resolved class.
///
/// Obtained from [`Env::find_class`] or [`ObjectHandle::get_class`]; holds a
/// local reference, so it is meant to be short-lived. Promote it with
/// [`new_global_ref`](Self::new_global_ref) to keep it around.
///
/// Member identifiers resolved here are valid for this class and its
/// subclasses only. Nothing is cached: every name-based call resolves again.
///
/// ```no_run
/// # fn example(env: jbridge::Env<'_>) -> jbridge::Result<()> {
/// let integer = env.find_class("java/lang/Integer")?;
/// let max: i32 = integer.get_static_field("MAX_VALUE")?;
/// let parsed: i32 = integer.invoke_static("parseInt", ("1234",))?;
/// assert_eq!(parsed, 1234);
/// # let _ = max;
/// # Ok(())
/// # }
/// ```
pub struct ClassHandle<'a> {
    inner: OwnedRef<'a>,
    path: Option<String>,
}

impl<'a> ClassHandle<'a> {
    pub(crate) fn new(inner: OwnedRef<'a>, path: Option<String>) -> Self {
        Self { inner, path }
    }

    /// Take ownership of a raw class reference.
    ///
    /// # Safety
    ///
    /// `raw` must be a live reference to a `java.lang.Class` that no other
    /// owner will release.
    pub unsafe fn from_raw(env: Env<'a>, raw: ObjectRef) -> Self {
        Self::new(OwnedRef::from_raw(env, raw), None)
    }

    /// The context this class was resolved under.
    pub fn env(&self) -> Env<'a> {
        self.inner.env()
    }

    /// The raw reference, still owned by `self`.
    pub fn as_raw(&self) -> ObjectRef {
        self.inner.as_raw()
    }

    /// The `/`-separated path this class was looked up by, if it was looked
    /// up by path.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The binary name (`java.lang.String`), from `Class.getName()`.
    pub fn name(&self) -> Result<String> {
        let raw = self.inner.bound()?;
        let env = self.env();
        let meta = env.native().get_object_class(raw)?;
        if meta.is_null() {
            return Err(Error::NullReference);
        }
        // SAFETY: GetObjectClass returns a fresh local reference.
        let meta = Self::new(unsafe { OwnedRef::from_raw(env, meta) }, Some(CLASS_CLASS.to_string()));
        let get_name = meta.method_id("getName", "()Ljava/lang/String;")?;
        dispatch::call_method(env, Target::Instance(raw), get_name, &())
    }

    /// The reference's current kind.
    pub fn ref_kind(&self) -> Result<RefKind> {
        self.inner.kind()
    }

    /// A globally referenced copy of this class.
    pub fn new_global_ref(&self) -> Result<ClassHandle<'a>> {
        Ok(Self::new(self.inner.new_ref(RefKind::Global)?, self.path.clone()))
    }

    /// Give up ownership without releasing.
    pub fn into_raw(self) -> ObjectRef {
        self.inner.into_raw()
    }

    /// Whether `object` is an instance of this class (or a subclass).
    pub fn is_instance(&self, object: &ObjectHandle<'_>) -> Result<bool> {
        self.env()
            .native()
            .is_instance_of(object.as_raw(), self.inner.bound()?)
    }

    /// Name used in lookup errors.
    fn label(&self) -> String {
        match &self.path {
            Some(path) => path.clone(),
            None => self
                .name()
                .map(|name| name.replace('.', "/"))
                .unwrap_or_else(|_| "<unknown class>".to_string()),
        }
    }

    fn lookup_method(&self, name: &str, signature: &str, is_static: bool) -> Result<MethodId> {
        let class = self.inner.bound()?;
        let env = self.env();
        let id = env.native().get_method_id(
            class,
            &c_string(name)?,
            &c_string(signature)?,
            is_static,
        )?;
        if id.is_null() {
            env.discard_exception()?;
            log::debug!("method {}{} not found", name, signature);
            return Err(if name == CONSTRUCTOR {
                Error::ConstructorNotFound {
                    class: self.label(),
                    signature: signature.to_string(),
                }
            } else {
                Error::MethodNotFound {
                    class: self.label(),
                    name: name.to_string(),
                    signature: signature.to_string(),
                    is_static,
                }
            });
        }
        Ok(id)
    }

    fn lookup_field(&self, name: &str, signature: &str, is_static: bool) -> Result<FieldId> {
        let class = self.inner.bound()?;
        let env = self.env();
        let id = env.native().get_field_id(
            class,
            &c_string(name)?,
            &c_string(signature)?,
            is_static,
        )?;
        if id.is_null() {
            env.discard_exception()?;
            log::debug!("field {} {} not found", name, signature);
            return Err(Error::FieldNotFound {
                class: self.label(),
                name: name.to_string(),
                signature: signature.to_string(),
                is_static,
            });
        }
        Ok(id)
    }

    /// Resolve an instance method.
    pub fn method_id(&self, name: &str, signature: &str) -> Result<MethodId> {
        self.lookup_method(name, signature, false)
    }

    /// Resolve a static method.
    pub fn static_method_id(&self, name: &str, signature: &str) -> Result<MethodId> {
        self.lookup_method(name, signature, true)
    }

    /// Resolve an instance field.
    pub fn field_id(&self, name: &str, signature: &str) -> Result<FieldId> {
        self.lookup_field(name, signature, false)
    }

    /// Resolve a static field.
    pub fn static_field_id(&self, name: &str, signature: &str) -> Result<FieldId> {
        self.lookup_field(name, signature, true)
    }

    /// Resolve a constructor.
    pub fn constructor_id(&self, signature: &str) -> Result<MethodId> {
        self.lookup_method(CONSTRUCTOR, signature, false)
    }

    /// Construct an instance, picking the constructor from the argument types.
    pub fn create_object<A: JavaArgs>(&self, args: A) -> Result<ObjectHandle<'a>> {
        let signature: Signature = ConstructorOf::<A>::SIGNATURE;
        self.create_object_with_signature(signature.as_str(), args)
    }

    /// Construct an instance through an explicitly spelled constructor.
    ///
    /// Use this when the inferred descriptor is not the one wanted, for
    /// example when a parameter is declared as a specific class rather than
    /// `java.lang.Object`.
    pub fn create_object_with_signature<A: JavaArgs>(
        &self,
        signature: &str,
        args: A,
    ) -> Result<ObjectHandle<'a>> {
        let ctor = self.constructor_id(signature)?;
        dispatch::new_object(self.env(), self.inner.bound()?, ctor, &args)
    }

    /// Invoke a static method, inferring the descriptor from `A` and `R`.
    pub fn invoke_static<R, A>(&self, name: &str, args: A) -> Result<R>
    where
        R: JavaReturn<'a>,
        A: JavaArgs,
    {
        let signature: Signature = MethodOf::<A, R>::SIGNATURE;
        self.invoke_static_with_signature(name, signature.as_str(), args)
    }

    /// Invoke a static method with an explicit descriptor.
    pub fn invoke_static_with_signature<R, A>(&self, name: &str, signature: &str, args: A) -> Result<R>
    where
        R: JavaReturn<'a>,
        A: JavaArgs,
    {
        let method = self.static_method_id(name, signature)?;
        // SAFETY: `method` was just resolved as a static method of this class.
        unsafe { self.invoke_static_id(method, args) }
    }

    /// Invoke a previously resolved static method.
    ///
    /// # Safety
    ///
    /// `method` must be a static method of this class whose return type
    /// belongs to `R`'s category and whose parameters match `A`.
    pub unsafe fn invoke_static_id<R, A>(&self, method: MethodId, args: A) -> Result<R>
    where
        R: JavaReturn<'a>,
        A: JavaArgs,
    {
        let class = self.inner.bound()?;
        dispatch::call_method(self.env(), Target::Static(class), method, &args)
    }

    /// Read a static field, inferring the descriptor from `T`.
    pub fn get_static_field<T>(&self, name: &str) -> Result<T>
    where
        T: JavaReturn<'a> + JavaField,
    {
        self.get_static_field_with_signature(name, T::SIGNATURE.as_str())
    }

    /// Read a static field with an explicit descriptor.
    pub fn get_static_field_with_signature<T>(&self, name: &str, signature: &str) -> Result<T>
    where
        T: JavaReturn<'a> + JavaField,
    {
        let field = self.static_field_id(name, signature)?;
        // SAFETY: `field` was just resolved as a static field of this class.
        unsafe { self.get_static_field_by_id(field) }
    }

    /// Read a previously resolved static field.
    ///
    /// # Safety
    ///
    /// `field` must be a static field of this class of `T`'s category.
    pub unsafe fn get_static_field_by_id<T>(&self, field: FieldId) -> Result<T>
    where
        T: JavaReturn<'a> + JavaField,
    {
        dispatch::get_field(self.env(), Target::Static(self.inner.bound()?), field)
    }

    /// Write a static field, inferring the descriptor from `T`.
    pub fn set_static_field<T>(&self, name: &str, value: &T) -> Result<()>
    where
        T: JavaArg + JavaField + ?Sized,
    {
        self.set_static_field_with_signature(name, T::SIGNATURE.as_str(), value)
    }

    /// Write a static field with an explicit descriptor.
    pub fn set_static_field_with_signature<T>(&self, name: &str, signature: &str, value: &T) -> Result<()>
    where
        T: JavaArg + JavaField + ?Sized,
    {
        let field = self.static_field_id(name, signature)?;
        // SAFETY: `field` was just resolved as a static field of this class.
        unsafe { self.set_static_field_by_id(field, value) }
    }

    /// Write a previously resolved static field.
    ///
    /// # Safety
    ///
    /// `field` must be a static field of this class of `T`'s category.
    pub unsafe fn set_static_field_by_id<T>(&self, field: FieldId, value: &T) -> Result<()>
    where
        T: JavaArg + JavaField + ?Sized,
    {
        dispatch::set_field(self.env(), Target::Static(self.inner.bound()?), field, value)
    }
}

impl fmt::Debug for ClassHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassHandle")
            .field("raw", &self.inner.as_raw())
            .field("path", &self.path)
            .finish()
    }
}
