//! Canonical byte encodings for map keys.
//!
//! Every key stored in a [`PersistentMap`](crate::map::PersistentMap) goes
//! through [`KeyEncoding::encode`] on the way in and [`KeyEncoding::decode`]
//! on the way out. The two must be inverse to each other and `encode` must be
//! injective: two distinct keys may never produce the same bytes.
//!
//! Iteration order follows the encoded bytes. The integer encodings below
//! are big-endian (with the sign bit flipped for signed types), so maps keyed
//! by integers iterate in numeric order.
//!
//! # Example
//!
//! ```
//! use persistent_collections::codec::{KeyDecodeError, KeyEncoding};
//!
//! #[derive(Debug, PartialEq)]
//! struct Version(u16, u16);
//!
//! impl KeyEncoding for Version {
//!     fn encode(&self) -> Vec<u8> {
//!         let mut bytes = self.0.to_be_bytes().to_vec();
//!         bytes.extend_from_slice(&self.1.to_be_bytes());
//!         bytes
//!     }
//!
//!     fn decode(bytes: &[u8]) -> Result<Self, KeyDecodeError> {
//!         let [a, b, c, d] = bytes else {
//!             return Err(KeyDecodeError::Length { expected: 4, found: bytes.len() });
//!         };
//!         Ok(Version(u16::from_be_bytes([*a, *b]), u16::from_be_bytes([*c, *d])))
//!     }
//! }
//!
//! let v = Version(1, 42);
//! assert_eq!(Version::decode(&v.encode()).unwrap(), v);
//! ```

use std::fmt;
use std::str::Utf8Error;

/// Conversion between an application key and its canonical byte sequence.
pub trait KeyEncoding: Sized {
    fn encode(&self) -> Vec<u8>;

    fn decode(bytes: &[u8]) -> Result<Self, KeyDecodeError>;
}

/// Errors raised when a byte sequence is not the encoding of any key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDecodeError {
    /// The bytes are not valid UTF-8.
    Utf8(Utf8Error),
    /// A fixed-width encoding received the wrong number of bytes.
    Length { expected: usize, found: usize },
    /// The scalar value is not a valid `char`.
    InvalidChar(u32),
    /// A boolean byte other than 0 or 1.
    InvalidBool(u8),
}

impl fmt::Display for KeyDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8(err) => write!(f, "key is not valid UTF-8: {err}"),
            Self::Length { expected, found } => {
                write!(f, "expected a {expected}-byte key, found {found} bytes")
            }
            Self::InvalidChar(scalar) => write!(f, "{scalar:#x} is not a unicode scalar value"),
            Self::InvalidBool(byte) => write!(f, "{byte:#04x} is not a boolean key"),
        }
    }
}

impl std::error::Error for KeyDecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Utf8(err) => Some(err),
            _ => None,
        }
    }
}

impl KeyEncoding for String {
    fn encode(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Self, KeyDecodeError> {
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(KeyDecodeError::Utf8)
    }
}

impl KeyEncoding for Vec<u8> {
    fn encode(&self) -> Vec<u8> {
        self.clone()
    }

    fn decode(bytes: &[u8]) -> Result<Self, KeyDecodeError> {
        Ok(bytes.to_vec())
    }
}

impl<const N: usize> KeyEncoding for [u8; N] {
    fn encode(&self) -> Vec<u8> {
        self.to_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Self, KeyDecodeError> {
        bytes.try_into().map_err(|_| KeyDecodeError::Length {
            expected: N,
            found: bytes.len(),
        })
    }
}

impl KeyEncoding for bool {
    fn encode(&self) -> Vec<u8> {
        vec![u8::from(*self)]
    }

    fn decode(bytes: &[u8]) -> Result<Self, KeyDecodeError> {
        match bytes {
            [0] => Ok(false),
            [1] => Ok(true),
            [other] => Err(KeyDecodeError::InvalidBool(*other)),
            _ => Err(KeyDecodeError::Length {
                expected: 1,
                found: bytes.len(),
            }),
        }
    }
}

impl KeyEncoding for char {
    fn encode(&self) -> Vec<u8> {
        u32::from(*self).to_be_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Self, KeyDecodeError> {
        let scalar = u32::decode(bytes)?;
        char::from_u32(scalar).ok_or(KeyDecodeError::InvalidChar(scalar))
    }
}

macro_rules! unsigned_key {
    ($($ty:ty),* $(,)?) => {$(
        impl KeyEncoding for $ty {
            fn encode(&self) -> Vec<u8> {
                self.to_be_bytes().to_vec()
            }

            fn decode(bytes: &[u8]) -> Result<Self, KeyDecodeError> {
                let raw = bytes.try_into().map_err(|_| KeyDecodeError::Length {
                    expected: std::mem::size_of::<$ty>(),
                    found: bytes.len(),
                })?;
                Ok(<$ty>::from_be_bytes(raw))
            }
        }
    )*};
}

// The sign bit is flipped so that negative numbers sort below positive ones.
macro_rules! signed_key {
    ($($ty:ty => $unsigned:ty),* $(,)?) => {$(
        impl KeyEncoding for $ty {
            fn encode(&self) -> Vec<u8> {
                ((*self as $unsigned) ^ (1 << (<$unsigned>::BITS - 1))).to_be_bytes().to_vec()
            }

            fn decode(bytes: &[u8]) -> Result<Self, KeyDecodeError> {
                let flipped = <$unsigned>::decode(bytes)?;
                Ok((flipped ^ (1 << (<$unsigned>::BITS - 1))) as $ty)
            }
        }
    )*};
}

unsigned_key!(u8, u16, u32, u64, u128, usize);
signed_key!(i8 => u8, i16 => u16, i32 => u32, i64 => u64, i128 => u128, isize => usize);
