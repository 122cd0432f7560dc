//! Conversion of pending managed exceptions into [`Error`].

use crate::context::Env;
use crate::error::{Error, Result};
use crate::object::ObjectHandle;
use crate::string::StringHandle;
use crate::types::ExceptionPolicy;

const UNKNOWN_CLASS: &str = "<unknown>";

/// Take, clear and convert the pending exception, if any.
///
/// Returns `Ok(())` when nothing is pending. Otherwise the throwable is
/// cleared, described by its class name and message, released, and reported
/// as [`Error::Exception`].
pub fn check_exception(env: Env<'_>) -> Result<()> {
    let native = env.native();
    if !native.exception_check()? {
        return Ok(());
    }

    // ExceptionDescribe clears the exception, so take it first.
    let raw = native.exception_occurred()?;
    if env.options().exception_policy == ExceptionPolicy::DescribeAndConvert {
        native.exception_describe()?;
    }
    native.exception_clear()?;

    if raw.is_null() {
        return Err(Error::Exception {
            class: UNKNOWN_CLASS.to_string(),
            message: None,
        });
    }

    // SAFETY: ExceptionOccurred returns a new local reference.
    let throwable = unsafe { ObjectHandle::from_raw(env, raw) };

    // Describing the throwable runs managed code that may throw again; those
    // secondary failures only degrade the description.
    let class = throwable
        .get_class()
        .and_then(|class| class.name())
        .unwrap_or_else(|_| UNKNOWN_CLASS.to_string());
    let message = throwable
        .invoke::<StringHandle<'_>, _>("getMessage", ())
        .ok()
        .filter(|message| !message.is_null())
        .and_then(|message| message.to_rust_string().ok());

    log::debug!("managed exception {}: {:?}", class, message);
    Err(Error::Exception { class, message })
}
