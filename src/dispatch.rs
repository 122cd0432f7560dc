//! Typed dispatch of invocations and field accesses.
//!
//! The Rust type requested as a result selects exactly one low-level call:
//! [`JavaReturn::KIND`] picks the boolean, byte, char, short, int, long,
//! float, double, object or void variant of the native call, and
//! [`JavaReturn`] turns the raw result back into that Rust type. Strings and
//! objects come back as new owning handles. The set of categories is closed:
//! the traits here are sealed.

use crate::context::Env;
use crate::error::{Error, Result};
use crate::ffi::{check_exception, FieldId, JavaKind, MethodId, ObjectRef, Target, Value};
use crate::object::ObjectHandle;
use crate::reference::OwnedRef;
use crate::signature::{ArgTypes, JavaClass, JavaType};
use crate::string::StringHandle;
use crate::typed::TypedObject;

mod sealed {
    pub trait Sealed {}
}

use sealed::Sealed;

/// A type that can be produced by a method call or field read.
pub trait JavaReturn<'a>: JavaType + Sized + Sealed {
    /// Category of the native call used to produce this type.
    const KIND: JavaKind;

    #[doc(hidden)]
    fn from_value(env: Env<'a>, value: Value) -> Result<Self>;
}

/// A type that can be passed as an argument or stored in a field.
pub trait JavaArg: JavaType + Sealed {
    /// Convert to a raw value. Temporary runtime objects created on the way
    /// are pushed to `temps` and live until the call completes.
    #[doc(hidden)]
    fn to_value<'a>(&self, env: Env<'a>, temps: &mut Vec<OwnedRef<'a>>) -> Result<Value>;
}

/// A type a field can have (anything but void).
pub trait JavaField: JavaType + Sealed {}

/// An argument pack: a tuple of up to eight [`JavaArg`]s.
pub trait JavaArgs: ArgTypes + Sealed {
    #[doc(hidden)]
    fn to_values<'a>(&self, env: Env<'a>, temps: &mut Vec<OwnedRef<'a>>) -> Result<Vec<Value>>;
}

fn mismatch(expected: JavaKind, got: Value) -> Error {
    Error::Unknown(format!(
        "expected a {:?} value, got {:?}",
        expected,
        got.kind()
    ))
}

macro_rules! primitive_dispatch {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Sealed for $ty {}

            impl<'a> JavaReturn<'a> for $ty {
                const KIND: JavaKind = JavaKind::$variant;

                fn from_value(_env: Env<'a>, value: Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(mismatch(JavaKind::$variant, other)),
                    }
                }
            }

            impl JavaArg for $ty {
                fn to_value<'a>(&self, _env: Env<'a>, _temps: &mut Vec<OwnedRef<'a>>) -> Result<Value> {
                    Ok(Value::$variant(*self))
                }
            }

            impl JavaField for $ty {}
        )*
    };
}

primitive_dispatch! {
    bool => Boolean,
    i8 => Byte,
    u16 => Char,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
}

// `()` is sealed by the empty argument-pack impl below.
impl<'a> JavaReturn<'a> for () {
    const KIND: JavaKind = JavaKind::Void;

    fn from_value(_env: Env<'a>, _value: Value) -> Result<Self> {
        Ok(())
    }
}

fn object_ref(value: Value) -> Result<ObjectRef> {
    match value {
        Value::Object(raw) => Ok(raw),
        other => Err(mismatch(JavaKind::Object, other)),
    }
}

impl<'a> Sealed for ObjectHandle<'a> {}

impl<'a> JavaReturn<'a> for ObjectHandle<'a> {
    const KIND: JavaKind = JavaKind::Object;

    fn from_value(env: Env<'a>, value: Value) -> Result<Self> {
        let raw = object_ref(value)?;
        // SAFETY: object results are fresh local references.
        Ok(unsafe { ObjectHandle::from_raw(env, raw) })
    }
}

impl JavaArg for ObjectHandle<'_> {
    fn to_value<'a>(&self, _env: Env<'a>, _temps: &mut Vec<OwnedRef<'a>>) -> Result<Value> {
        Ok(Value::Object(self.as_raw()))
    }
}

impl JavaField for ObjectHandle<'_> {}

impl<'a> Sealed for StringHandle<'a> {}

impl<'a> JavaReturn<'a> for StringHandle<'a> {
    const KIND: JavaKind = JavaKind::Object;

    fn from_value(env: Env<'a>, value: Value) -> Result<Self> {
        let raw = object_ref(value)?;
        // SAFETY: object results are fresh local references.
        Ok(unsafe { StringHandle::from_raw(env, raw) })
    }
}

impl JavaArg for StringHandle<'_> {
    fn to_value<'a>(&self, _env: Env<'a>, _temps: &mut Vec<OwnedRef<'a>>) -> Result<Value> {
        Ok(Value::Object(self.as_raw()))
    }
}

impl JavaField for StringHandle<'_> {}

impl Sealed for String {}

/// A `null` string result is reported as [`Error::NullReference`]; ask for a
/// [`StringHandle`] instead to observe `null`.
impl<'a> JavaReturn<'a> for String {
    const KIND: JavaKind = JavaKind::Object;

    fn from_value(env: Env<'a>, value: Value) -> Result<Self> {
        let handle = StringHandle::from_value(env, value)?;
        handle.to_rust_string()
    }
}

impl JavaArg for String {
    fn to_value<'a>(&self, env: Env<'a>, temps: &mut Vec<OwnedRef<'a>>) -> Result<Value> {
        self.as_str().to_value(env, temps)
    }
}

impl JavaField for String {}

impl Sealed for str {}

impl JavaArg for str {
    fn to_value<'a>(&self, env: Env<'a>, temps: &mut Vec<OwnedRef<'a>>) -> Result<Value> {
        let string = StringHandle::new(env, self)?;
        let raw = string.as_raw();
        temps.push(string.into_owned());
        Ok(Value::Object(raw))
    }
}

impl JavaField for str {}

impl<'a, C: JavaClass> Sealed for TypedObject<'a, C> {}

impl<'a, C: JavaClass> JavaReturn<'a> for TypedObject<'a, C> {
    const KIND: JavaKind = JavaKind::Object;

    fn from_value(env: Env<'a>, value: Value) -> Result<Self> {
        let handle = ObjectHandle::from_value(env, value)?;
        Ok(TypedObject::from_object_unchecked(handle))
    }
}

impl<C: JavaClass> JavaArg for TypedObject<'_, C> {
    fn to_value<'a>(&self, _env: Env<'a>, _temps: &mut Vec<OwnedRef<'a>>) -> Result<Value> {
        Ok(Value::Object(self.as_object().as_raw()))
    }
}

impl<C: JavaClass> JavaField for TypedObject<'_, C> {}

impl<T: Sealed + ?Sized> Sealed for &T {}

impl<T: JavaArg + ?Sized> JavaArg for &T {
    fn to_value<'a>(&self, env: Env<'a>, temps: &mut Vec<OwnedRef<'a>>) -> Result<Value> {
        (**self).to_value(env, temps)
    }
}

impl<T: JavaField + ?Sized> JavaField for &T {}

macro_rules! java_args_tuple {
    ($($name:ident),*) => {
        impl<$($name: JavaArg),*> Sealed for ($($name,)*) {}

        impl<$($name: JavaArg),*> JavaArgs for ($($name,)*) {
            #[allow(non_snake_case, unused_variables)]
            fn to_values<'a>(&self, env: Env<'a>, temps: &mut Vec<OwnedRef<'a>>) -> Result<Vec<Value>> {
                let ($($name,)*) = self;
                Ok(vec![$($name.to_value(env, temps)?),*])
            }
        }
    };
}

java_args_tuple!();
java_args_tuple!(A);
java_args_tuple!(A, B);
java_args_tuple!(A, B, C);
java_args_tuple!(A, B, C, D);
java_args_tuple!(A, B, C, D, E);
java_args_tuple!(A, B, C, D, E, F);
java_args_tuple!(A, B, C, D, E, F, G);
java_args_tuple!(A, B, C, D, E, F, G, H);

/// Check for a pending exception after a call that produced `value`.
///
/// On failure an object result is released before the error is returned.
fn finish<'a, R: JavaReturn<'a>>(env: Env<'a>, value: Value) -> Result<R> {
    if let Err(err) = check_exception(env) {
        if let Value::Object(raw) = value {
            // SAFETY: an object result is a fresh local reference nobody else owns.
            drop(unsafe { OwnedRef::from_raw(env, raw) });
        }
        return Err(err);
    }
    R::from_value(env, value)
}

/// Invoke a resolved method with typed arguments and result.
pub(crate) fn call_method<'a, R, A>(
    env: Env<'a>,
    target: Target,
    method: MethodId,
    args: &A,
) -> Result<R>
where
    R: JavaReturn<'a>,
    A: JavaArgs + ?Sized,
{
    let mut temps = Vec::new();
    let values = args.to_values(env, &mut temps)?;
    let value = env.native().call_method(target, method, R::KIND, &values)?;
    let result = finish(env, value);
    drop(temps);
    result
}

/// Run a resolved constructor.
pub(crate) fn new_object<'a, A>(
    env: Env<'a>,
    class: ObjectRef,
    ctor: MethodId,
    args: &A,
) -> Result<ObjectHandle<'a>>
where
    A: JavaArgs + ?Sized,
{
    let mut temps = Vec::new();
    let values = args.to_values(env, &mut temps)?;
    let value = Value::Object(env.native().new_object(class, ctor, &values)?);
    let result: Result<ObjectHandle<'a>> = finish(env, value);
    drop(temps);
    let object = result?;
    if object.is_null() {
        return Err(Error::NullReference);
    }
    Ok(object)
}

/// Read a resolved field.
pub(crate) fn get_field<'a, T>(env: Env<'a>, target: Target, field: FieldId) -> Result<T>
where
    T: JavaReturn<'a> + JavaField,
{
    let value = env.native().get_field(target, field, T::KIND)?;
    finish(env, value)
}

/// Write a resolved field.
pub(crate) fn set_field<'a, T>(env: Env<'a>, target: Target, field: FieldId, value: &T) -> Result<()>
where
    T: JavaArg + JavaField + ?Sized,
{
    let mut temps = Vec::new();
    let value = value.to_value(env, &mut temps)?;
    env.native().set_field(target, field, value)?;
    let result = check_exception(env);
    drop(temps);
    result
}
