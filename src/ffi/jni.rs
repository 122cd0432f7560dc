//! [`NativeInterface`] backed by a real JVM through the JNI function table.

use std::ffi::{c_void, CStr};
use std::ptr;
use std::sync::OnceLock;

use jni_sys::{jobject, jobjectRefType, jvalue, JNIEnv, JavaVM, JNI_EDETACHED, JNI_EVERSION, JNI_FALSE, JNI_OK, JNI_TRUE};

use super::handles::{FieldId, MethodId, ObjectRef};
use super::raw::{JavaKind, NativeInterface, RefKind, Target, Value};
use crate::error::{Error, Result};
use crate::types::JniVersion;

/// Call an entry of the JNI function table, failing the enclosing function
/// if the entry is missing. Must be used inside an `unsafe` block.
macro_rules! jni_call {
    ($env:expr, $name:ident $(, $arg:expr)* $(,)?) => {{
        let env: *mut JNIEnv = $env;
        match (**env).$name {
            Some(f) => f(env $(, $arg)*),
            None => return Err(Error::MissingFunction(stringify!($name))),
        }
    }};
}

fn to_jvalue(value: &Value) -> jvalue {
    match *value {
        Value::Boolean(z) => jvalue {
            z: if z { JNI_TRUE } else { JNI_FALSE },
        },
        Value::Byte(b) => jvalue { b },
        Value::Char(c) => jvalue { c },
        Value::Short(s) => jvalue { s },
        Value::Int(i) => jvalue { i },
        Value::Long(j) => jvalue { j },
        Value::Float(f) => jvalue { f },
        Value::Double(d) => jvalue { d },
        Value::Object(l) => jvalue { l: l.as_ptr() },
        Value::Void => jvalue { j: 0 },
    }
}

fn obj(r: ObjectRef) -> jobject {
    r.as_ptr()
}

/// The JNI environment of the current thread.
///
/// Not `Send`: an environment pointer is only meaningful on the thread it
/// was obtained on.
#[derive(Debug)]
pub struct JniEnv {
    raw: *mut JNIEnv,
}

impl JniEnv {
    /// Wrap an environment pointer received from the VM (for example the
    /// first argument of a native method).
    ///
    /// # Safety
    ///
    /// `raw` must be a valid `JNIEnv*` for the calling thread and must stay
    /// valid for as long as the returned value is used.
    pub unsafe fn from_raw(raw: *mut JNIEnv) -> Result<Self> {
        if raw.is_null() {
            return Err(Error::InvalidArgument("null JNIEnv pointer".to_string()));
        }
        Ok(Self { raw })
    }

    /// The underlying environment pointer.
    pub fn as_raw(&self) -> *mut JNIEnv {
        self.raw
    }
}

impl NativeInterface for JniEnv {
    fn find_class(&self, path: &CStr) -> Result<ObjectRef> {
        unsafe { Ok(ObjectRef::from_ptr(jni_call!(self.raw, FindClass, path.as_ptr()))) }
    }

    fn get_object_class(&self, o: ObjectRef) -> Result<ObjectRef> {
        unsafe { Ok(ObjectRef::from_ptr(jni_call!(self.raw, GetObjectClass, obj(o)))) }
    }

    fn get_method_id(
        &self,
        class: ObjectRef,
        name: &CStr,
        signature: &CStr,
        is_static: bool,
    ) -> Result<MethodId> {
        unsafe {
            let id = if is_static {
                jni_call!(self.raw, GetStaticMethodID, obj(class), name.as_ptr(), signature.as_ptr())
            } else {
                jni_call!(self.raw, GetMethodID, obj(class), name.as_ptr(), signature.as_ptr())
            };
            Ok(MethodId::from_ptr(id))
        }
    }

    fn get_field_id(
        &self,
        class: ObjectRef,
        name: &CStr,
        signature: &CStr,
        is_static: bool,
    ) -> Result<FieldId> {
        unsafe {
            let id = if is_static {
                jni_call!(self.raw, GetStaticFieldID, obj(class), name.as_ptr(), signature.as_ptr())
            } else {
                jni_call!(self.raw, GetFieldID, obj(class), name.as_ptr(), signature.as_ptr())
            };
            Ok(FieldId::from_ptr(id))
        }
    }

    fn new_object(&self, class: ObjectRef, ctor: MethodId, args: &[Value]) -> Result<ObjectRef> {
        let args: Vec<jvalue> = args.iter().map(to_jvalue).collect();
        unsafe {
            let o = jni_call!(self.raw, NewObjectA, obj(class), ctor.as_ptr(), args.as_ptr());
            Ok(ObjectRef::from_ptr(o))
        }
    }

    fn call_method(
        &self,
        target: Target,
        method: MethodId,
        ret: JavaKind,
        args: &[Value],
    ) -> Result<Value> {
        let args: Vec<jvalue> = args.iter().map(to_jvalue).collect();
        let id = method.as_ptr();
        let a = args.as_ptr();
        let env = self.raw;
        unsafe {
            let value = match target {
                Target::Instance(o) => {
                    let o = obj(o);
                    match ret {
                        JavaKind::Boolean => {
                            Value::Boolean(jni_call!(env, CallBooleanMethodA, o, id, a) != JNI_FALSE)
                        }
                        JavaKind::Byte => Value::Byte(jni_call!(env, CallByteMethodA, o, id, a)),
                        JavaKind::Char => Value::Char(jni_call!(env, CallCharMethodA, o, id, a)),
                        JavaKind::Short => Value::Short(jni_call!(env, CallShortMethodA, o, id, a)),
                        JavaKind::Int => Value::Int(jni_call!(env, CallIntMethodA, o, id, a)),
                        JavaKind::Long => Value::Long(jni_call!(env, CallLongMethodA, o, id, a)),
                        JavaKind::Float => Value::Float(jni_call!(env, CallFloatMethodA, o, id, a)),
                        JavaKind::Double => Value::Double(jni_call!(env, CallDoubleMethodA, o, id, a)),
                        JavaKind::Object => Value::Object(ObjectRef::from_ptr(jni_call!(
                            env,
                            CallObjectMethodA,
                            o,
                            id,
                            a
                        ))),
                        JavaKind::Void => {
                            jni_call!(env, CallVoidMethodA, o, id, a);
                            Value::Void
                        }
                    }
                }
                Target::Static(c) => {
                    let c = obj(c);
                    match ret {
                        JavaKind::Boolean => Value::Boolean(
                            jni_call!(env, CallStaticBooleanMethodA, c, id, a) != JNI_FALSE,
                        ),
                        JavaKind::Byte => Value::Byte(jni_call!(env, CallStaticByteMethodA, c, id, a)),
                        JavaKind::Char => Value::Char(jni_call!(env, CallStaticCharMethodA, c, id, a)),
                        JavaKind::Short => {
                            Value::Short(jni_call!(env, CallStaticShortMethodA, c, id, a))
                        }
                        JavaKind::Int => Value::Int(jni_call!(env, CallStaticIntMethodA, c, id, a)),
                        JavaKind::Long => Value::Long(jni_call!(env, CallStaticLongMethodA, c, id, a)),
                        JavaKind::Float => {
                            Value::Float(jni_call!(env, CallStaticFloatMethodA, c, id, a))
                        }
                        JavaKind::Double => {
                            Value::Double(jni_call!(env, CallStaticDoubleMethodA, c, id, a))
                        }
                        JavaKind::Object => Value::Object(ObjectRef::from_ptr(jni_call!(
                            env,
                            CallStaticObjectMethodA,
                            c,
                            id,
                            a
                        ))),
                        JavaKind::Void => {
                            jni_call!(env, CallStaticVoidMethodA, c, id, a);
                            Value::Void
                        }
                    }
                }
            };
            Ok(value)
        }
    }

    fn get_field(&self, target: Target, field: FieldId, kind: JavaKind) -> Result<Value> {
        let id = field.as_ptr();
        let env = self.raw;
        unsafe {
            let value = match target {
                Target::Instance(o) => {
                    let o = obj(o);
                    match kind {
                        JavaKind::Boolean => Value::Boolean(jni_call!(env, GetBooleanField, o, id) != JNI_FALSE),
                        JavaKind::Byte => Value::Byte(jni_call!(env, GetByteField, o, id)),
                        JavaKind::Char => Value::Char(jni_call!(env, GetCharField, o, id)),
                        JavaKind::Short => Value::Short(jni_call!(env, GetShortField, o, id)),
                        JavaKind::Int => Value::Int(jni_call!(env, GetIntField, o, id)),
                        JavaKind::Long => Value::Long(jni_call!(env, GetLongField, o, id)),
                        JavaKind::Float => Value::Float(jni_call!(env, GetFloatField, o, id)),
                        JavaKind::Double => Value::Double(jni_call!(env, GetDoubleField, o, id)),
                        JavaKind::Object => {
                            Value::Object(ObjectRef::from_ptr(jni_call!(env, GetObjectField, o, id)))
                        }
                        JavaKind::Void => {
                            return Err(Error::InvalidArgument("a field cannot be void".to_string()))
                        }
                    }
                }
                Target::Static(c) => {
                    let c = obj(c);
                    match kind {
                        JavaKind::Boolean => {
                            Value::Boolean(jni_call!(env, GetStaticBooleanField, c, id) != JNI_FALSE)
                        }
                        JavaKind::Byte => Value::Byte(jni_call!(env, GetStaticByteField, c, id)),
                        JavaKind::Char => Value::Char(jni_call!(env, GetStaticCharField, c, id)),
                        JavaKind::Short => Value::Short(jni_call!(env, GetStaticShortField, c, id)),
                        JavaKind::Int => Value::Int(jni_call!(env, GetStaticIntField, c, id)),
                        JavaKind::Long => Value::Long(jni_call!(env, GetStaticLongField, c, id)),
                        JavaKind::Float => Value::Float(jni_call!(env, GetStaticFloatField, c, id)),
                        JavaKind::Double => Value::Double(jni_call!(env, GetStaticDoubleField, c, id)),
                        JavaKind::Object => Value::Object(ObjectRef::from_ptr(jni_call!(
                            env,
                            GetStaticObjectField,
                            c,
                            id
                        ))),
                        JavaKind::Void => {
                            return Err(Error::InvalidArgument("a field cannot be void".to_string()))
                        }
                    }
                }
            };
            Ok(value)
        }
    }

    fn set_field(&self, target: Target, field: FieldId, value: Value) -> Result<()> {
        let id = field.as_ptr();
        let env = self.raw;
        unsafe {
            match target {
                Target::Instance(o) => {
                    let o = obj(o);
                    match value {
                        Value::Boolean(z) => jni_call!(
                            env,
                            SetBooleanField,
                            o,
                            id,
                            if z { JNI_TRUE } else { JNI_FALSE }
                        ),
                        Value::Byte(b) => jni_call!(env, SetByteField, o, id, b),
                        Value::Char(c) => jni_call!(env, SetCharField, o, id, c),
                        Value::Short(s) => jni_call!(env, SetShortField, o, id, s),
                        Value::Int(i) => jni_call!(env, SetIntField, o, id, i),
                        Value::Long(j) => jni_call!(env, SetLongField, o, id, j),
                        Value::Float(f) => jni_call!(env, SetFloatField, o, id, f),
                        Value::Double(d) => jni_call!(env, SetDoubleField, o, id, d),
                        Value::Object(l) => jni_call!(env, SetObjectField, o, id, obj(l)),
                        Value::Void => {
                            return Err(Error::InvalidArgument("a field cannot be void".to_string()))
                        }
                    }
                }
                Target::Static(c) => {
                    let c = obj(c);
                    match value {
                        Value::Boolean(z) => jni_call!(
                            env,
                            SetStaticBooleanField,
                            c,
                            id,
                            if z { JNI_TRUE } else { JNI_FALSE }
                        ),
                        Value::Byte(b) => jni_call!(env, SetStaticByteField, c, id, b),
                        Value::Char(ch) => jni_call!(env, SetStaticCharField, c, id, ch),
                        Value::Short(s) => jni_call!(env, SetStaticShortField, c, id, s),
                        Value::Int(i) => jni_call!(env, SetStaticIntField, c, id, i),
                        Value::Long(j) => jni_call!(env, SetStaticLongField, c, id, j),
                        Value::Float(f) => jni_call!(env, SetStaticFloatField, c, id, f),
                        Value::Double(d) => jni_call!(env, SetStaticDoubleField, c, id, d),
                        Value::Object(l) => jni_call!(env, SetStaticObjectField, c, id, obj(l)),
                        Value::Void => {
                            return Err(Error::InvalidArgument("a field cannot be void".to_string()))
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn new_string(&self, utf16: &[u16]) -> Result<ObjectRef> {
        let len = i32::try_from(utf16.len())
            .map_err(|_| Error::InvalidArgument("string too long".to_string()))?;
        unsafe { Ok(ObjectRef::from_ptr(jni_call!(self.raw, NewString, utf16.as_ptr(), len))) }
    }

    fn get_string_chars(&self, string: ObjectRef) -> Result<Vec<u16>> {
        unsafe {
            let len = jni_call!(self.raw, GetStringLength, obj(string));
            let mut buf = vec![0u16; usize::try_from(len).unwrap_or(0)];
            if !buf.is_empty() {
                jni_call!(self.raw, GetStringRegion, obj(string), 0, len, buf.as_mut_ptr());
            }
            Ok(buf)
        }
    }

    fn get_object_ref_type(&self, o: ObjectRef) -> Result<RefKind> {
        let kind = unsafe { jni_call!(self.raw, GetObjectRefType, obj(o)) };
        Ok(match kind {
            jobjectRefType::JNILocalRefType => RefKind::Local,
            jobjectRefType::JNIGlobalRefType => RefKind::Global,
            jobjectRefType::JNIWeakGlobalRefType => RefKind::WeakGlobal,
            jobjectRefType::JNIInvalidRefType => RefKind::Invalid,
        })
    }

    fn new_local_ref(&self, o: ObjectRef) -> Result<ObjectRef> {
        unsafe { Ok(ObjectRef::from_ptr(jni_call!(self.raw, NewLocalRef, obj(o)))) }
    }

    fn new_global_ref(&self, o: ObjectRef) -> Result<ObjectRef> {
        unsafe { Ok(ObjectRef::from_ptr(jni_call!(self.raw, NewGlobalRef, obj(o)))) }
    }

    fn new_weak_global_ref(&self, o: ObjectRef) -> Result<ObjectRef> {
        unsafe { Ok(ObjectRef::from_ptr(jni_call!(self.raw, NewWeakGlobalRef, obj(o)))) }
    }

    fn delete_local_ref(&self, o: ObjectRef) -> Result<()> {
        unsafe { jni_call!(self.raw, DeleteLocalRef, obj(o)) };
        Ok(())
    }

    fn delete_global_ref(&self, o: ObjectRef) -> Result<()> {
        unsafe { jni_call!(self.raw, DeleteGlobalRef, obj(o)) };
        Ok(())
    }

    fn delete_weak_global_ref(&self, o: ObjectRef) -> Result<()> {
        unsafe { jni_call!(self.raw, DeleteWeakGlobalRef, obj(o)) };
        Ok(())
    }

    fn is_same_object(&self, a: ObjectRef, b: ObjectRef) -> Result<bool> {
        unsafe { Ok(jni_call!(self.raw, IsSameObject, obj(a), obj(b)) != JNI_FALSE) }
    }

    fn is_instance_of(&self, o: ObjectRef, class: ObjectRef) -> Result<bool> {
        unsafe { Ok(jni_call!(self.raw, IsInstanceOf, obj(o), obj(class)) != JNI_FALSE) }
    }

    fn exception_check(&self) -> Result<bool> {
        unsafe { Ok(jni_call!(self.raw, ExceptionCheck) != JNI_FALSE) }
    }

    fn exception_occurred(&self) -> Result<ObjectRef> {
        unsafe { Ok(ObjectRef::from_ptr(jni_call!(self.raw, ExceptionOccurred))) }
    }

    fn exception_clear(&self) -> Result<()> {
        unsafe { jni_call!(self.raw, ExceptionClear) };
        Ok(())
    }

    fn exception_describe(&self) -> Result<()> {
        unsafe { jni_call!(self.raw, ExceptionDescribe) };
        Ok(())
    }
}

static GLOBAL_VM: OnceLock<JavaVm> = OnceLock::new();

/// The process-wide JVM.
///
/// Only one VM exists per process; it is installed once (typically from
/// `JNI_OnLoad`) and then used to fetch the environment of whichever thread
/// asks.
#[derive(Debug)]
pub struct JavaVm {
    raw: *mut JavaVM,
}

// The invocation interface is callable from any thread.
unsafe impl Send for JavaVm {}
unsafe impl Sync for JavaVm {}

impl JavaVm {
    /// Wrap a VM pointer.
    ///
    /// # Safety
    ///
    /// `raw` must point to a live JVM for the rest of the process lifetime.
    pub unsafe fn from_raw(raw: *mut JavaVM) -> Result<Self> {
        if raw.is_null() {
            return Err(Error::InvalidArgument("null JavaVM pointer".to_string()));
        }
        Ok(Self { raw })
    }

    /// Make this VM the process-wide one returned by [`JavaVm::global`].
    pub fn install(self) -> Result<&'static JavaVm> {
        GLOBAL_VM.set(self).map_err(|_| Error::VmAlreadyInstalled)?;
        Self::global()
    }

    /// The installed VM.
    pub fn global() -> Result<&'static JavaVm> {
        GLOBAL_VM.get().ok_or(Error::VmNotInstalled)
    }

    /// The underlying VM pointer.
    pub fn as_raw(&self) -> *mut JavaVM {
        self.raw
    }

    /// The environment of the calling thread.
    ///
    /// The thread must already be attached to the VM.
    pub fn env(&self, version: JniVersion) -> Result<JniEnv> {
        let mut env: *mut c_void = ptr::null_mut();
        let code = unsafe {
            match (**self.raw).GetEnv {
                Some(get_env) => get_env(self.raw, &mut env, version.into()),
                None => return Err(Error::MissingFunction("GetEnv")),
            }
        };
        match code {
            JNI_OK => unsafe { JniEnv::from_raw(env as *mut JNIEnv) },
            JNI_EDETACHED => Err(Error::Detached),
            JNI_EVERSION => Err(Error::UnsupportedVersion(version.into())),
            other => Err(Error::Unknown(format!("GetEnv failed with code {}", other))),
        }
    }
}
