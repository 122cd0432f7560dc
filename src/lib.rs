//! Type-safe bindings for calling into a JVM through JNI.
//!
//! This crate turns JNI's stringly-typed member access into ordinary Rust
//! calls. The Rust types of the arguments and of the requested result decide
//! both the descriptor used to look a member up (derived at compile time) and
//! the typed native call used to invoke it. Every reference the VM hands back
//! is owned by a handle that releases it exactly once, with the release call
//! matching the reference's kind.
//!
//! # Example
//!
//! ```no_run
//! use jbridge::{ContextOptions, Env, ObjectHandle};
//!
//! fn answer(env: Env<'_>) -> jbridge::Result<i32> {
//!     // Resolve a class and construct an instance through `Integer(int)`.
//!     let integer = env.find_class("java/lang/Integer")?;
//!     let boxed: ObjectHandle = integer.create_object((42i32,))?;
//!
//!     // `()I` is derived from the argument and result types.
//!     boxed.invoke("intValue", ())
//! }
//!
//! // From a thread already attached to the VM installed with
//! // `JavaVm::install` (typically in `JNI_OnLoad`):
//! let value = jbridge::with_env(ContextOptions::default(), answer)?;
//! assert_eq!(value, 42);
//! # Ok::<(), jbridge::Error>(())
//! ```
//!
//! # Exceptions
//!
//! Managed code may throw. After every invocation, construction and field
//! access the bindings check for a pending exception, clear it, and report it
//! as [`Error::Exception`] with the throwable's class name and message. No
//! exception is ever left pending for the caller.
//!
//! # Threads
//!
//! An [`Env`] belongs to the thread it was obtained on and every handle
//! borrows it, so handles stay on that thread. To hand an object to another
//! thread, promote it with [`ObjectHandle::new_global_ref`], give up the
//! handle with [`ObjectHandle::into_raw`] and re-wrap it on the other side.

pub mod class;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod ffi;
pub mod object;
pub mod reference;
pub mod signature;
pub mod string;
pub mod typed;
pub mod types;

// Re-export main types at the crate root
pub use class::ClassHandle;
pub use context::{with_env, Env};
pub use dispatch::{JavaArg, JavaArgs, JavaField, JavaReturn};
pub use error::{Error, Result};
pub use ffi::{FieldId, JavaVm, JniEnv, MethodId, NativeInterface, ObjectRef, RefKind};
pub use object::ObjectHandle;
pub use reference::OwnedRef;
pub use signature::{JavaClass, JavaType, MethodOf, Signature};
pub use string::StringHandle;
pub use typed::TypedObject;
pub use types::{ContextOptions, ExceptionPolicy, JniVersion};

/// Version constants.
pub mod version {
    /// Lowest JNI version the bindings work with.
    pub const MIN_JNI_VERSION: i32 = 0x0001_0006;
}
