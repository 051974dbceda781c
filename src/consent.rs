//! Decoding and encoding of publisher purposes consent strings.
//!
//! A consent string is a URL-safe Base64 token. Its first 6 bits hold the format version, which
//! selects the layout of everything that follows. Decoding reads the version first and hands
//! the bytes to the matching implementation; unknown versions are rejected.
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let consent = iab_ppc::decode("BOjUNEbOjUNEbAMAWhENABABsAAAFWA")?;
//!
//! assert_eq!(consent.version(), 1);
//! assert!(consent.is_purpose_allowed(3));
//! assert!(consent.is_custom_purpose_allowed(5));
//! assert_eq!(iab_ppc::encode(&consent), "BOjUNEbOjUNEbAMAWhENABABsAAAFWA");
//! # Ok(())
//! # }
//! ```
//!
use crate::core::base64::{DecodeError, DecodeExt, EncodeExt};
use crate::core::{BitBuffer, BitBufferError, Field, IdSet};
use crate::purpose::Purpose;
use crate::v1;
use crate::v1::ConsentV1;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

// Every format version starts with its version number.
const VERSION_FIELD: Field = Field::new(0, 6);

/// The error type for consent string decoding.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConsentDecodeError {
    /// The input string or byte slice is empty.
    #[error("empty consent string")]
    Empty,
    #[error("unable to decode consent string: {0}")]
    DecodeBase64(#[from] DecodeError),
    #[error("unsupported consent string version {0}")]
    UnsupportedVersion(u8),
    /// The input is shorter than its header, or than the bitfield length the header declares.
    #[error("truncated consent string (expected at least {expected} bits, found {found})")]
    Truncated { expected: usize, found: usize },
    #[error("unable to read consent string: {0}")]
    Read(#[from] BitBufferError),
}

/// A decoded publisher purposes consent string.
///
/// Each variant wraps the implementation of one format version. Accessors are available
/// directly on this type for the fields that all versions share.
///
/// Two records are equal if their raw bytes are equal.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum ConsentRecord {
    V1(ConsentV1),
}

macro_rules! delegate {
    ($($(#[$attr:meta])* fn $name:ident(&self $(, $arg:ident: $ty:ty)*) -> $ret:ty;)*) => {
        $(
            $(#[$attr])*
            pub fn $name(&self $(, $arg: $ty)*) -> $ret {
                match self {
                    Self::V1(c) => c.$name($($arg),*),
                }
            }
        )*
    };
}

impl ConsentRecord {
    /// Decodes raw consent string bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConsentDecodeError> {
        Self::from_buffer(BitBuffer::new(bytes.to_vec()))
    }

    /// Dispatches a buffer to the implementation matching its version field.
    pub fn from_buffer(bits: BitBuffer) -> Result<Self, ConsentDecodeError> {
        if bits.as_bytes().is_empty() {
            return Err(ConsentDecodeError::Empty);
        }

        let version = bits.get_uint(VERSION_FIELD.offset, VERSION_FIELD.width)? as u8;
        debug!(version, bytes = bits.as_bytes().len(), "decoding consent string");

        match version {
            v1::VERSION => ConsentV1::from_buffer(bits).map(Self::V1),
            _ => Err(ConsentDecodeError::UnsupportedVersion(version)),
        }
    }

    delegate! {
        fn version(&self) -> u8;
        /// Creation time, in milliseconds since the Unix epoch.
        fn created(&self) -> u64;
        /// Last update time, in milliseconds since the Unix epoch.
        fn last_updated(&self) -> u64;
        fn cmp_id(&self) -> u16;
        fn cmp_version(&self) -> u16;
        fn consent_screen(&self) -> u8;
        fn consent_language(&self) -> String;
        fn vendor_list_version(&self) -> u16;
        fn publisher_purposes_version(&self) -> u16;
        fn allowed_purpose_ids(&self) -> IdSet;
        fn allowed_purposes(&self) -> BTreeSet<Purpose>;
        fn allowed_purposes_bits(&self) -> u32;
        /// Returns `false` for ids without a standard purpose bit.
        fn is_purpose_allowed(&self, id: u16) -> bool;
        fn is_allowed(&self, purpose: Purpose) -> bool;
        fn custom_purposes_count(&self) -> u8;
        fn custom_allowed_purpose_ids(&self) -> IdSet;
        fn custom_allowed_purposes_bits(&self) -> u64;
        /// Returns `false` for ids without a custom purpose bit.
        fn is_custom_purpose_allowed(&self, id: u16) -> bool;
        fn as_bytes(&self) -> &[u8];
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::V1(c) => c.into_bytes(),
        }
    }
}

impl From<ConsentV1> for ConsentRecord {
    fn from(c: ConsentV1) -> Self {
        Self::V1(c)
    }
}

impl FromStr for ConsentRecord {
    type Err = ConsentDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ConsentDecodeError::Empty);
        }

        let bytes = s.decode_base64_url()?;
        Self::from_buffer(BitBuffer::new(bytes))
    }
}

/// Writes the URL-safe Base64 token, without padding.
impl fmt::Display for ConsentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_bytes().encode_base64_url())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ConsentRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ConsentRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <std::borrow::Cow<'de, str> as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Decodes a consent string from its Base64 token.
pub fn decode(s: &str) -> Result<ConsentRecord, ConsentDecodeError> {
    s.parse()
}

/// Decodes a consent string from its raw bytes.
pub fn decode_bytes(bytes: &[u8]) -> Result<ConsentRecord, ConsentDecodeError> {
    ConsentRecord::from_bytes(bytes)
}

/// Encodes a consent string into its Base64 token.
pub fn encode(record: &ConsentRecord) -> String {
    record.to_string()
}
