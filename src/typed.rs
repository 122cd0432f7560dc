//! Objects of a class known at compile time.

use std::fmt;
use std::marker::PhantomData;

use crate::class::ClassHandle;
use crate::context::Env;
use crate::dispatch::{JavaArg, JavaArgs, JavaField, JavaReturn};
use crate::error::{Error, Result};
use crate::ffi::RefKind;
use crate::object::ObjectHandle;
use crate::signature::{JavaClass, JavaType, Signature};

/// Declare a marker type for a class, for use with [`TypedObject`].
///
/// ```
/// jbridge::java_class! {
///     /// `java.lang.Integer`
///     pub Integer => "java.lang.Integer"
/// }
///
/// use jbridge::signature::MethodOf;
/// use jbridge::TypedObject;
///
/// assert_eq!(
///     MethodOf::<(i32,), TypedObject<'static, Integer>>::SIGNATURE.as_str(),
///     "(I)Ljava/lang/Integer;"
/// );
/// ```
#[macro_export]
macro_rules! java_class {
    ($(#[$meta:meta])* $vis:vis $name:ident => $path:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis struct $name;

        impl $crate::signature::JavaClass for $name {
            const CLASS_PATH: &'static str = $path;
        }
    };
}

/// An object statically tagged with its class `C`.
///
/// Unlike [`ObjectHandle`], `TypedObject` is `Clone`: cloning asks the VM for
/// a fresh reference of the same kind instead of duplicating the raw one, so
/// every copy is released independently. A clone that could not get a
/// reference holds `null`; [`try_clone`](Self::try_clone) reports that case
/// as an error instead. Its descriptor is that of `C`,
/// which makes inferred signatures precise where [`ObjectHandle`] would fall
/// back to `java.lang.Object`.
///
/// ```no_run
/// jbridge::java_class!(Integer => "java.lang.Integer");
///
/// # fn example(env: jbridge::Env<'_>) -> jbridge::Result<()> {
/// use jbridge::TypedObject;
///
/// let boxed = TypedObject::<Integer>::new(env, (42i32,))?;
/// let copy = boxed.clone();
/// let value: i32 = copy.invoke("intValue", ())?;
/// let same: TypedObject<Integer> = TypedObject::<Integer>::invoke_static(env, "valueOf", (value,))?;
/// assert_eq!(same.invoke::<i32, _>("intValue", ())?, 42);
/// # Ok(())
/// # }
/// ```
pub struct TypedObject<'a, C: JavaClass> {
    object: ObjectHandle<'a>,
    _class: PhantomData<C>,
}

impl<'a, C: JavaClass> TypedObject<'a, C> {
    pub(crate) fn from_object_unchecked(object: ObjectHandle<'a>) -> Self {
        Self {
            object,
            _class: PhantomData,
        }
    }

    /// Wrap an object after checking it is an instance of `C`.
    pub fn from_object(object: ObjectHandle<'a>) -> Result<Self> {
        if object.is_null() {
            return Ok(Self::from_object_unchecked(object));
        }
        let class = Self::class(object.env())?;
        if !class.is_instance(&object)? {
            return Err(Error::InvalidArgument(format!(
                "object is not an instance of {}",
                C::CLASS_PATH
            )));
        }
        Ok(Self::from_object_unchecked(object))
    }

    /// Look up `C`.
    pub fn class(env: Env<'a>) -> Result<ClassHandle<'a>> {
        env.find_class(C::CLASS_PATH)
    }

    /// Construct an instance, picking the constructor from the argument types.
    pub fn new<A: JavaArgs>(env: Env<'a>, args: A) -> Result<Self> {
        let object = Self::class(env)?.create_object(args)?;
        Ok(Self::from_object_unchecked(object))
    }

    /// Construct an instance through an explicitly spelled constructor.
    pub fn new_with_signature<A: JavaArgs>(env: Env<'a>, signature: &str, args: A) -> Result<Self> {
        let object = Self::class(env)?.create_object_with_signature(signature, args)?;
        Ok(Self::from_object_unchecked(object))
    }

    /// A new handle of the same kind to the same object.
    ///
    /// Fails with [`Error::NullReference`] if the VM hands back no reference,
    /// as it does for a weak reference whose object has been collected.
    /// Prefer this over [`Clone::clone`] wherever the failure matters.
    pub fn try_clone(&self) -> Result<Self> {
        if self.object.is_null() {
            return Ok(Self::from_object_unchecked(ObjectHandle::null(self.object.env())));
        }
        let object = match self.object.ref_kind()? {
            RefKind::Global => self.object.new_global_ref()?,
            RefKind::WeakGlobal => self.object.new_weak_ref()?,
            RefKind::Local | RefKind::Invalid => self.object.new_local_ref()?,
        };
        if object.is_null() {
            return Err(Error::NullReference);
        }
        Ok(Self::from_object_unchecked(object))
    }

    /// Promote to a global reference, releasing the current one.
    pub fn into_global(self) -> Result<Self> {
        let global = self.object.new_global_ref()?;
        Ok(Self::from_object_unchecked(global))
    }

    /// The underlying object.
    pub fn as_object(&self) -> &ObjectHandle<'a> {
        &self.object
    }

    /// Unwrap into the underlying object.
    pub fn into_object(self) -> ObjectHandle<'a> {
        self.object
    }

    /// Read an instance field.
    pub fn get<T>(&self, name: &str) -> Result<T>
    where
        T: JavaReturn<'a> + JavaField,
    {
        self.object.get_field(name)
    }

    /// Write an instance field.
    pub fn set<T>(&self, name: &str, value: &T) -> Result<()>
    where
        T: JavaArg + JavaField + ?Sized,
    {
        self.object.set_field(name, value)
    }

    /// Invoke an instance method.
    pub fn invoke<R, A>(&self, name: &str, args: A) -> Result<R>
    where
        R: JavaReturn<'a>,
        A: JavaArgs,
    {
        self.object.invoke(name, args)
    }

    /// Read a static field of `C`.
    pub fn get_static<T>(env: Env<'a>, name: &str) -> Result<T>
    where
        T: JavaReturn<'a> + JavaField,
    {
        Self::class(env)?.get_static_field(name)
    }

    /// Write a static field of `C`.
    pub fn set_static<T>(env: Env<'a>, name: &str, value: &T) -> Result<()>
    where
        T: JavaArg + JavaField + ?Sized,
    {
        Self::class(env)?.set_static_field(name, value)
    }

    /// Invoke a static method of `C`.
    pub fn invoke_static<R, A>(env: Env<'a>, name: &str, args: A) -> Result<R>
    where
        R: JavaReturn<'a>,
        A: JavaArgs,
    {
        Self::class(env)?.invoke_static(name, args)
    }
}

/// Clones through the VM.
///
/// `clone` cannot report failure: if the VM hands back no reference the
/// error is logged and the clone holds `null`, so later calls on it fail
/// with [`Error::NullReference`]. Use [`TypedObject::try_clone`] to get the
/// error where it happens.
impl<C: JavaClass> Clone for TypedObject<'_, C> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(err) => {
                log::error!("failed to clone reference to {}: {}", C::CLASS_PATH, err);
                Self::from_object_unchecked(ObjectHandle::null(self.object.env()))
            }
        }
    }
}

impl<C: JavaClass> JavaType for TypedObject<'_, C> {
    const SIGNATURE: Signature = Signature::object(C::CLASS_PATH);
}

impl<C: JavaClass> fmt::Debug for TypedObject<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedObject")
            .field("class", &C::CLASS_PATH)
            .field("raw", &self.object.as_raw())
            .finish()
    }
}
