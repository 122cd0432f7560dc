//! The low-level native interface the bindings call into.
//!
//! [`NativeInterface`] is one method per runtime call the safe layer needs.
//! The production implementation forwards to the JNI function table (see
//! [`super::jni::JniEnv`]); anything else implementing it (an embedded test
//! runtime, a recording proxy) can stand in for the VM.

use std::ffi::CStr;

use super::handles::{FieldId, MethodId, ObjectRef};
use crate::error::Result;

/// Value category of a method return or field.
///
/// This is the closed set the typed-dispatch layer selects from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JavaKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Object,
    Void,
}

/// Kind of a reference as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// Not a valid reference (or the null reference).
    Invalid,
    /// Valid for the current native frame only.
    Local,
    /// Valid until explicitly deleted.
    Global,
    /// Does not keep the referent alive.
    WeakGlobal,
}

/// A value crossing the boundary: an argument, a return value or a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Object(ObjectRef),
    Void,
}

impl Value {
    /// The category of this value.
    pub fn kind(&self) -> JavaKind {
        match self {
            Value::Boolean(_) => JavaKind::Boolean,
            Value::Byte(_) => JavaKind::Byte,
            Value::Char(_) => JavaKind::Char,
            Value::Short(_) => JavaKind::Short,
            Value::Int(_) => JavaKind::Int,
            Value::Long(_) => JavaKind::Long,
            Value::Float(_) => JavaKind::Float,
            Value::Double(_) => JavaKind::Double,
            Value::Object(_) => JavaKind::Object,
            Value::Void => JavaKind::Void,
        }
    }
}

/// What a member access is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// An instance member on the given object.
    Instance(ObjectRef),
    /// A static member on the given class.
    Static(ObjectRef),
}

/// The runtime's native interface, as seen from one attached thread.
///
/// Lookups signal "not found" by returning a null handle, mirroring the
/// runtime; the caller decides which error that becomes. Calls that run
/// managed code may leave an exception pending, which the caller checks with
/// [`exception_check`](Self::exception_check).
pub trait NativeInterface {
    /// Find a class by its `/`-separated path.
    fn find_class(&self, path: &CStr) -> Result<ObjectRef>;

    /// The class of an object, as a new local reference.
    fn get_object_class(&self, obj: ObjectRef) -> Result<ObjectRef>;

    /// Resolve a method; null if absent.
    fn get_method_id(
        &self,
        class: ObjectRef,
        name: &CStr,
        signature: &CStr,
        is_static: bool,
    ) -> Result<MethodId>;

    /// Resolve a field; null if absent.
    fn get_field_id(
        &self,
        class: ObjectRef,
        name: &CStr,
        signature: &CStr,
        is_static: bool,
    ) -> Result<FieldId>;

    /// Allocate an instance and run the given constructor on it.
    fn new_object(&self, class: ObjectRef, ctor: MethodId, args: &[Value]) -> Result<ObjectRef>;

    /// Invoke a method whose return category is `ret`.
    fn call_method(
        &self,
        target: Target,
        method: MethodId,
        ret: JavaKind,
        args: &[Value],
    ) -> Result<Value>;

    /// Read a field of category `kind`.
    fn get_field(&self, target: Target, field: FieldId, kind: JavaKind) -> Result<Value>;

    /// Write a field; the category is that of `value`.
    fn set_field(&self, target: Target, field: FieldId, value: Value) -> Result<()>;

    /// Create a runtime string from UTF-16 code units.
    fn new_string(&self, utf16: &[u16]) -> Result<ObjectRef>;

    /// Read the UTF-16 code units of a runtime string.
    fn get_string_chars(&self, string: ObjectRef) -> Result<Vec<u16>>;

    /// Query the current kind of a reference.
    fn get_object_ref_type(&self, obj: ObjectRef) -> Result<RefKind>;

    fn new_local_ref(&self, obj: ObjectRef) -> Result<ObjectRef>;
    fn new_global_ref(&self, obj: ObjectRef) -> Result<ObjectRef>;
    fn new_weak_global_ref(&self, obj: ObjectRef) -> Result<ObjectRef>;

    fn delete_local_ref(&self, obj: ObjectRef) -> Result<()>;
    fn delete_global_ref(&self, obj: ObjectRef) -> Result<()>;
    fn delete_weak_global_ref(&self, obj: ObjectRef) -> Result<()>;

    fn is_same_object(&self, a: ObjectRef, b: ObjectRef) -> Result<bool>;
    fn is_instance_of(&self, obj: ObjectRef, class: ObjectRef) -> Result<bool>;

    /// Whether a managed exception is pending on this thread.
    fn exception_check(&self) -> Result<bool>;
    /// The pending throwable as a new local reference, or null.
    fn exception_occurred(&self) -> Result<ObjectRef>;
    fn exception_clear(&self) -> Result<()>;
    /// Print the pending throwable and its backtrace to the runtime's error stream.
    fn exception_describe(&self) -> Result<()>;
}
