//! Type descriptors derived from Rust types at compile time.
//!
//! Every type that can cross into the VM implements [`JavaType`], whose
//! [`SIGNATURE`](JavaType::SIGNATURE) is the descriptor the VM expects
//! (`I` for `i32`, `Ljava/lang/String;` for text, ...). Argument tuples
//! implement [`ArgTypes`], and [`MethodOf`] glues arguments and return type
//! into a method descriptor such as `(IZ)V`. All of it is evaluated in
//! constant context, so no descriptor is ever built at runtime.
//!
//! | Rust type | Descriptor |
//! |---|---|
//! | `bool` | `Z` |
//! | `i8` | `B` |
//! | `u16` | `C` |
//! | `i16` | `S` |
//! | `i32` | `I` |
//! | `i64` | `J` |
//! | `f32` | `F` |
//! | `f64` | `D` |
//! | `()` | `V` |
//! | `str`, `String`, [`StringHandle`](crate::StringHandle) | `Ljava/lang/String;` |
//! | [`ObjectHandle`](crate::ObjectHandle) | `Ljava/lang/Object;` |
//! | [`TypedObject<C>`](crate::TypedObject) | `L` + `C::CLASS_PATH` + `;` |
//!
//! A type without a mapping does not compile:
//!
//! ```compile_fail
//! use jbridge::signature::JavaType;
//!
//! struct Unmapped;
//! let _ = <Unmapped as JavaType>::SIGNATURE;
//! ```
//!
//! Anything this table cannot express (arrays, overloads that need a
//! specific class) goes through the `*_with_signature` variants of the
//! handle operations, optionally built with the const helpers on
//! [`Signature`]:
//!
//! ```
//! use jbridge::signature::{JavaType, Signature};
//!
//! const INT_ARRAY: Signature = Signature::array(&i32::SIGNATURE);
//! assert_eq!(INT_ARRAY.as_str(), "[I");
//! ```

use std::fmt;
use std::marker::PhantomData;

/// Maximum length of a single descriptor, in bytes.
pub const SIGNATURE_CAPACITY: usize = 256;

/// A descriptor held in a fixed-size buffer so it can be built by `const fn`.
///
/// The builders panic when a descriptor outgrows [`SIGNATURE_CAPACITY`].
/// In a `const` context that is a compile error; at runtime it is a panic.
/// Descriptors longer than that can still be passed as plain `&str` to the
/// `*_with_signature` operations.
#[derive(Clone, Copy)]
pub struct Signature {
    buf: [u8; SIGNATURE_CAPACITY],
    len: usize,
}

impl Signature {
    /// The empty descriptor.
    pub const fn new() -> Self {
        Self {
            buf: [0; SIGNATURE_CAPACITY],
            len: 0,
        }
    }

    /// A descriptor spelled out by hand.
    ///
    /// # Panics
    ///
    /// If the result would exceed [`SIGNATURE_CAPACITY`] bytes.
    pub const fn literal(text: &str) -> Self {
        Self::new().push_str(text)
    }

    /// Append raw text.
    ///
    /// # Panics
    ///
    /// If the result would exceed [`SIGNATURE_CAPACITY`] bytes.
    pub const fn push_str(mut self, text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            self = self.push_byte(bytes[i]);
            i += 1;
        }
        self
    }

    /// Append another descriptor.
    ///
    /// # Panics
    ///
    /// If the result would exceed [`SIGNATURE_CAPACITY`] bytes.
    pub const fn push(mut self, other: &Signature) -> Self {
        let mut i = 0;
        while i < other.len {
            self = self.push_byte(other.buf[i]);
            i += 1;
        }
        self
    }

    const fn push_byte(mut self, byte: u8) -> Self {
        if self.len >= SIGNATURE_CAPACITY {
            panic!("descriptor exceeds SIGNATURE_CAPACITY");
        }
        self.buf[self.len] = byte;
        self.len += 1;
        self
    }

    /// Object descriptor for a class path, `java.lang.String` or
    /// `java/lang/String` alike: `Ljava/lang/String;`.
    ///
    /// # Panics
    ///
    /// If the result would exceed [`SIGNATURE_CAPACITY`] bytes.
    pub const fn object(class_path: &str) -> Self {
        let bytes = class_path.as_bytes();
        let mut sig = Self::new().push_byte(b'L');
        let mut i = 0;
        while i < bytes.len() {
            sig = sig.push_byte(if bytes[i] == b'.' { b'/' } else { bytes[i] });
            i += 1;
        }
        sig.push_byte(b';')
    }

    /// Array descriptor: `[` followed by the element descriptor.
    ///
    /// # Panics
    ///
    /// If the result would exceed [`SIGNATURE_CAPACITY`] bytes.
    pub const fn array(element: &Signature) -> Self {
        Self::new().push_byte(b'[').push(element)
    }

    /// Method descriptor from an argument list (without parentheses) and a
    /// return descriptor.
    ///
    /// # Panics
    ///
    /// If the result would exceed [`SIGNATURE_CAPACITY`] bytes.
    pub const fn method(args: &Signature, ret: &Signature) -> Self {
        Self::new().push_byte(b'(').push(args).push_byte(b')').push(ret)
    }

    /// The descriptor bytes.
    pub const fn as_bytes(&self) -> &[u8] {
        self.buf.split_at(self.len).0
    }

    /// The descriptor text.
    pub const fn as_str(&self) -> &str {
        // SAFETY: the buffer only ever receives whole `&str` contents, with
        // ASCII `.` swapped for ASCII `/`, so it is valid UTF-8.
        unsafe { std::str::from_utf8_unchecked(self.as_bytes()) }
    }

    /// Length in bytes.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the descriptor is empty.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Signature {}

impl std::hash::Hash for Signature {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl PartialEq<str> for Signature {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Signature {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl AsRef<str> for Signature {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signature").field(&self.as_str()).finish()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Rust type with a VM type descriptor.
pub trait JavaType {
    /// Descriptor of this type.
    const SIGNATURE: Signature;
}

macro_rules! primitive_signatures {
    ($($ty:ty => $code:literal),* $(,)?) => {
        $(
            impl JavaType for $ty {
                const SIGNATURE: Signature = Signature::literal($code);
            }
        )*
    };
}

primitive_signatures! {
    bool => "Z",
    i8 => "B",
    u16 => "C",
    i16 => "S",
    i32 => "I",
    i64 => "J",
    f32 => "F",
    f64 => "D",
    () => "V",
}

/// Descriptor of `java.lang.String`.
pub const STRING_SIGNATURE: Signature = Signature::object("java/lang/String");

/// Descriptor of `java.lang.Object`.
pub const OBJECT_SIGNATURE: Signature = Signature::object("java/lang/Object");

impl JavaType for str {
    const SIGNATURE: Signature = STRING_SIGNATURE;
}

impl JavaType for String {
    const SIGNATURE: Signature = STRING_SIGNATURE;
}

impl<T: JavaType + ?Sized> JavaType for &T {
    const SIGNATURE: Signature = T::SIGNATURE;
}

/// A class known at compile time, used by [`TypedObject`](crate::TypedObject).
///
/// Usually declared through [`java_class!`](crate::java_class).
pub trait JavaClass {
    /// Fully-qualified class path, dotted or `/`-separated.
    const CLASS_PATH: &'static str;
}

/// An ordered pack of argument types.
///
/// Implemented for tuples of up to eight [`JavaType`]s; the descriptor is the
/// concatenation of the element descriptors, without parentheses.
pub trait ArgTypes {
    /// Concatenated argument descriptors.
    const SIGNATURE: Signature;
}

macro_rules! arg_types_tuple {
    ($($name:ident),*) => {
        impl<$($name: JavaType),*> ArgTypes for ($($name,)*) {
            const SIGNATURE: Signature = Signature::new()$(.push(&$name::SIGNATURE))*;
        }
    };
}

arg_types_tuple!();
arg_types_tuple!(A);
arg_types_tuple!(A, B);
arg_types_tuple!(A, B, C);
arg_types_tuple!(A, B, C, D);
arg_types_tuple!(A, B, C, D, E);
arg_types_tuple!(A, B, C, D, E, F);
arg_types_tuple!(A, B, C, D, E, F, G);
arg_types_tuple!(A, B, C, D, E, F, G, H);

/// Method descriptor of a method taking `A` and returning `R`.
///
/// ```
/// use jbridge::signature::MethodOf;
///
/// assert_eq!(MethodOf::<(i32, bool), ()>::SIGNATURE.as_str(), "(IZ)V");
/// assert_eq!(MethodOf::<(i64, f32), f64>::SIGNATURE.as_str(), "(JF)D");
/// ```
pub struct MethodOf<A, R>(PhantomData<fn(A) -> R>);

impl<A: ArgTypes, R: JavaType> MethodOf<A, R> {
    /// The method descriptor.
    pub const SIGNATURE: Signature = Signature::method(&A::SIGNATURE, &R::SIGNATURE);
}

/// Constructor descriptor for arguments `A` (constructors return `V`).
pub struct ConstructorOf<A>(PhantomData<fn(A)>);

impl<A: ArgTypes> ConstructorOf<A> {
    /// The constructor descriptor.
    pub const SIGNATURE: Signature = Signature::method(&A::SIGNATURE, &<() as JavaType>::SIGNATURE);
}
