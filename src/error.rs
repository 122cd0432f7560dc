//! Error types for the jbridge crate.

use thiserror::Error;

/// Result type alias for jbridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for jbridge operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// No class with this path could be loaded.
    #[error("can't find class {class}")]
    ClassNotFound {
        /// Class path that was looked up.
        class: String,
    },

    /// No method with this name and descriptor exists on the class.
    #[error("can't find {} method {name} with signature {signature} on {class}", member_kind(.is_static))]
    MethodNotFound {
        /// Class the lookup ran against.
        class: String,
        /// Method name.
        name: String,
        /// Method descriptor.
        signature: String,
        /// Whether a static method was requested.
        is_static: bool,
    },

    /// No field with this name and descriptor exists on the class.
    #[error("can't find {} field {name} with signature {signature} on {class}", member_kind(.is_static))]
    FieldNotFound {
        /// Class the lookup ran against.
        class: String,
        /// Field name.
        name: String,
        /// Field descriptor.
        signature: String,
        /// Whether a static field was requested.
        is_static: bool,
    },

    /// No constructor with this descriptor exists on the class.
    #[error("can't find constructor with signature {signature} on {class}")]
    ConstructorNotFound {
        /// Class the lookup ran against.
        class: String,
        /// Constructor descriptor.
        signature: String,
    },

    /// Managed code threw; the exception has been cleared.
    #[error("{class}: {}", message_or_placeholder(.message))]
    Exception {
        /// Binary name of the throwable's class.
        class: String,
        /// Result of `getMessage()`, if any.
        message: Option<String>,
    },

    /// The handle is unbound, or the runtime returned null where a value was required.
    #[error("null reference")]
    NullReference,

    /// Function argument is invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The runtime handed back text that is not valid UTF-16.
    #[error("string conversion failed: {0}")]
    StringConversion(String),

    /// The calling thread is not attached to the VM.
    #[error("current thread is not attached to the VM")]
    Detached,

    /// The VM does not support the requested interface version.
    #[error("unsupported JNI version {0:#x}")]
    UnsupportedVersion(i32),

    /// No VM has been installed for this process.
    #[error("no JavaVM installed")]
    VmNotInstalled,

    /// A VM has already been installed for this process.
    #[error("a JavaVM is already installed")]
    VmAlreadyInstalled,

    /// An entry of the native function table is missing.
    #[error("native interface function {0} is missing")]
    MissingFunction(&'static str),

    /// Unknown error.
    #[error("unknown error: {0}")]
    Unknown(String),
}

fn member_kind(is_static: &bool) -> &'static str {
    if *is_static {
        "static"
    } else {
        "instance"
    }
}

fn message_or_placeholder(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or("<no message>")
}

impl Error {
    /// Check if this is a failed class or member lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ClassNotFound { .. }
                | Error::MethodNotFound { .. }
                | Error::FieldNotFound { .. }
                | Error::ConstructorNotFound { .. }
        )
    }

    /// Check if this is a converted managed exception.
    pub fn is_exception(&self) -> bool {
        matches!(self, Error::Exception { .. })
    }

    /// Check if this is an exception of the given class (binary name, e.g. `java.lang.ArithmeticException`).
    pub fn is_exception_of(&self, class_name: &str) -> bool {
        matches!(self, Error::Exception { class, .. } if class == class_name)
    }
}
