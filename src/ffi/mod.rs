//! Low-level native interface.
//!
//! This module contains the raw handle types, the [`NativeInterface`] seam
//! and its JNI implementation. Users should prefer the safe wrappers in the
//! parent modules.

pub mod error;
pub mod handles;
pub mod jni;
pub mod raw;

pub use error::check_exception;
pub use handles::*;
pub use jni::{JavaVm, JniEnv};
pub use raw::*;
