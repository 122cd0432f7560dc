//! Execution context: the calling thread's entry point into the VM.

use std::ffi::CString;
use std::fmt;

use crate::class::ClassHandle;
use crate::error::{Error, Result};
use crate::ffi::{self, JavaVm, NativeInterface};
use crate::reference::OwnedRef;
use crate::string::StringHandle;
use crate::types::ContextOptions;

/// The calling thread's execution context.
///
/// A borrowed view of a [`NativeInterface`]; the bindings never create or
/// destroy the underlying environment, they only forward it. Every handle
/// obtained through an `Env` borrows it, so no handle outlives the context it
/// was created under.
#[derive(Clone, Copy)]
pub struct Env<'a> {
    native: &'a dyn NativeInterface,
    options: ContextOptions,
}

impl<'a> Env<'a> {
    /// Wrap a native interface with default options.
    pub fn new(native: &'a dyn NativeInterface) -> Self {
        Self::with_options(native, ContextOptions::default())
    }

    /// Wrap a native interface.
    pub fn with_options(native: &'a dyn NativeInterface, options: ContextOptions) -> Self {
        Self { native, options }
    }

    /// The underlying native interface.
    pub fn native(&self) -> &'a dyn NativeInterface {
        self.native
    }

    /// Options in effect for this context.
    pub fn options(&self) -> ContextOptions {
        self.options
    }

    /// Find a class by fully-qualified path.
    ///
    /// Both `java/lang/String` and `java.lang.String` are accepted; the VM is
    /// always handed the `/`-separated form.
    pub fn find_class(&self, path: &str) -> Result<ClassHandle<'a>> {
        let path = path.replace('.', "/");
        let c_path = c_string(&path)?;
        let raw = self.native.find_class(&c_path)?;
        if raw.is_null() {
            self.discard_exception()?;
            log::debug!("class {} not found", path);
            return Err(Error::ClassNotFound { class: path });
        }
        // SAFETY: FindClass hands back a fresh local reference we now own.
        let inner = unsafe { OwnedRef::from_raw(*self, raw) };
        Ok(ClassHandle::new(inner, Some(path)))
    }

    /// Create a runtime string.
    pub fn new_string(&self, text: &str) -> Result<StringHandle<'a>> {
        StringHandle::new(*self, text)
    }

    /// Whether a managed exception is pending on this thread.
    pub fn exception_pending(&self) -> Result<bool> {
        self.native.exception_check()
    }

    /// Convert a pending managed exception, if any, into [`Error::Exception`].
    ///
    /// The exception is cleared either way.
    pub fn check_exception(&self) -> Result<()> {
        ffi::check_exception(*self)
    }

    /// Clear a pending exception without inspecting it.
    ///
    /// Failed lookups leave `NoSuchMethodError` and friends pending; the
    /// bindings report those through their own error instead.
    pub(crate) fn discard_exception(&self) -> Result<()> {
        if self.native.exception_check()? {
            self.native.exception_clear()?;
        }
        Ok(())
    }
}

impl fmt::Debug for Env<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("native", &(self.native as *const dyn NativeInterface))
            .field("options", &self.options)
            .finish()
    }
}

/// Run `f` with the execution context of the calling thread.
///
/// Uses the VM installed with [`JavaVm::install`]; the thread must already be
/// attached.
///
/// ```no_run
/// use jbridge::{ContextOptions, ObjectHandle};
///
/// let value: i32 = jbridge::with_env(ContextOptions::default(), |env| {
///     let integer = env.find_class("java/lang/Integer")?;
///     let boxed: ObjectHandle = integer.create_object((42i32,))?;
///     boxed.invoke("intValue", ())
/// })?;
/// assert_eq!(value, 42);
/// # Ok::<(), jbridge::Error>(())
/// ```
pub fn with_env<T, F>(options: ContextOptions, f: F) -> Result<T>
where
    F: FnOnce(Env<'_>) -> Result<T>,
{
    let vm = JavaVm::global()?;
    let native = vm.env(options.version)?;
    f(Env::with_options(&native, options))
}

/// Convert a member or class name for the native interface.
pub(crate) fn c_string(text: &str) -> Result<CString> {
    CString::new(text)
        .map_err(|_| Error::InvalidArgument(format!("{:?} contains a NUL byte", text)))
}
