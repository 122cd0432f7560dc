//! Handle types for opaque tokens handed out by the runtime.
//!
//! Each handle type is a newtype wrapper around a pointer-sized word. The
//! zero value is the inert sentinel: it is never a live reference and never
//! released.

/// Macro to define a handle type.
macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            _h: usize,
        }

        impl $name {
            /// Create the null (inert) handle.
            #[inline]
            pub const fn null() -> Self {
                Self { _h: 0 }
            }

            /// Wrap a raw word.
            #[inline]
            pub const fn from_raw(raw: usize) -> Self {
                Self { _h: raw }
            }

            /// Check if this handle is null.
            #[inline]
            pub const fn is_null(&self) -> bool {
                self._h == 0
            }

            /// The raw word.
            #[inline]
            pub const fn as_raw(&self) -> usize {
                self._h
            }

            /// Wrap a raw pointer.
            #[inline]
            pub fn from_ptr<T>(ptr: *mut T) -> Self {
                Self { _h: ptr as usize }
            }

            /// The raw word as a pointer.
            #[inline]
            pub fn as_ptr<T>(&self) -> *mut T {
                self._h as *mut T
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::null()
            }
        }
    };
}

define_handle!(
    /// Reference to a runtime object (instances, classes, strings and throwables alike).
    ObjectRef
);
define_handle!(
    /// Method identifier resolved against a class.
    MethodId
);
define_handle!(
    /// Field identifier resolved against a class.
    FieldId
);
