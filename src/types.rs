//! Configuration types.

/// JNI interface version requested from the VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JniVersion {
    /// JNI 1.6 (Java 6), the oldest version the bindings use.
    #[default]
    V1_6,
    /// JNI 1.8 (Java 8).
    V1_8,
    /// JNI 9 (Java 9).
    V9,
    /// JNI 10 (Java 10 and later).
    V10,
}

impl From<JniVersion> for i32 {
    fn from(version: JniVersion) -> i32 {
        match version {
            JniVersion::V1_6 => 0x0001_0006,
            JniVersion::V1_8 => 0x0001_0008,
            JniVersion::V9 => 0x0009_0000,
            JniVersion::V10 => 0x000a_0000,
        }
    }
}

/// What happens to an exception thrown by managed code during a call.
///
/// Either way the exception is cleared and surfaces as
/// [`Error::Exception`](crate::Error::Exception); it is never left pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExceptionPolicy {
    /// Clear it and convert it.
    #[default]
    Convert,
    /// Let the VM print it with its stack trace first, then clear and convert.
    DescribeAndConvert,
}

/// Options applied to an execution context.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextOptions {
    /// Interface version requested when fetching the thread's environment.
    pub version: JniVersion,
    /// Exception handling after calls into managed code.
    pub exception_policy: ExceptionPolicy,
}
