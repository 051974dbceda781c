//! Version 1 of the publisher purposes consent string.
//!
//! A version 1 string carries a fixed 174 bits header followed by a custom purposes bitfield
//! whose length is given by the last header field. See [`layout`] for the exact bit layout.
//!
//! A [`ConsentV1`] is a read-only view over the raw bytes of a string: every accessor decodes its
//! field on demand, nothing is cached.
//!
use crate::consent::ConsentDecodeError;
use crate::core::{BitBuffer, DataRead, Field, IdSet};
use crate::purpose::Purpose;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

pub mod builder;
pub mod layout;

pub use builder::{ConsentBuildError, ConsentBuilder};

/// Format version handled by this module.
pub const VERSION: u8 = 1;

/// A version 1 publisher purposes consent string.
///
/// Two values are equal if their raw bytes are equal.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct ConsentV1 {
    bits: BitBuffer,
}

impl ConsentV1 {
    /// Wraps a buffer after checking that it holds the whole header and as many custom purpose
    /// bits as the header announces.
    ///
    /// The version field is not checked.
    pub fn from_buffer(bits: BitBuffer) -> Result<Self, ConsentDecodeError> {
        let found = bits.bit_len();
        if found < layout::HEADER_BITS {
            debug!(found, "consent string shorter than its header");
            return Err(ConsentDecodeError::Truncated {
                expected: layout::HEADER_BITS,
                found,
            });
        }

        let count = bits.get_uint(
            layout::CUSTOM_PURPOSES_COUNT.offset,
            layout::CUSTOM_PURPOSES_COUNT.width,
        )? as u8;
        let expected = layout::custom_purposes(count).end();
        if found < expected {
            debug!(count, found, "custom purposes bitfield is truncated");
            return Err(ConsentDecodeError::Truncated { expected, found });
        }

        Ok(Self { bits })
    }

    /// The buffer must have been sized for the count it contains.
    pub(crate) fn from_buffer_unchecked(bits: BitBuffer) -> Self {
        Self { bits }
    }

    pub fn version(&self) -> u8 {
        self.uint(layout::VERSION) as u8
    }

    /// Creation time, in milliseconds since the Unix epoch, with decisecond precision.
    pub fn created(&self) -> u64 {
        self.timestamp(layout::CREATED)
    }

    /// Last update time, in milliseconds since the Unix epoch, with decisecond precision.
    pub fn last_updated(&self) -> u64 {
        self.timestamp(layout::LAST_UPDATED)
    }

    /// Consent Management Provider id that last updated the string.
    pub fn cmp_id(&self) -> u16 {
        self.uint(layout::CMP_ID) as u16
    }

    pub fn cmp_version(&self) -> u16 {
        self.uint(layout::CMP_VERSION) as u16
    }

    /// Screen number in the CMP where consent was given.
    pub fn consent_screen(&self) -> u8 {
        self.uint(layout::CONSENT_SCREEN) as u8
    }

    /// Two-letter ISO 639-1 language code the CMP asked for consent in.
    pub fn consent_language(&self) -> String {
        self.bits
            .get_six_bit_string(
                layout::CONSENT_LANGUAGE.offset,
                layout::CONSENT_LANGUAGE_CHARS,
            )
            .expect("header length is checked at construction")
    }

    pub fn vendor_list_version(&self) -> u16 {
        self.uint(layout::VENDOR_LIST_VERSION) as u16
    }

    pub fn publisher_purposes_version(&self) -> u16 {
        self.uint(layout::PUBLISHER_PURPOSES_VERSION) as u16
    }

    pub fn allowed_purpose_ids(&self) -> IdSet {
        self.bitfield(layout::PURPOSES)
    }

    /// Allowed purposes which have a well-known label.
    pub fn allowed_purposes(&self) -> BTreeSet<Purpose> {
        self.allowed_purpose_ids()
            .into_iter()
            .filter_map(Purpose::from_id)
            .collect()
    }

    /// The standard purposes bitfield as an integer, purpose 1 being the most significant bit.
    pub fn allowed_purposes_bits(&self) -> u32 {
        self.uint(layout::PURPOSES) as u32
    }

    /// Ids outside of `1..=24` are never allowed.
    pub fn is_purpose_allowed(&self, id: u16) -> bool {
        is_id_allowed(&self.bits, layout::PURPOSES, id)
    }

    pub fn is_allowed(&self, purpose: Purpose) -> bool {
        self.is_purpose_allowed(purpose.id())
    }

    /// Declared number of custom purposes, which is also the length of their bitfield.
    pub fn custom_purposes_count(&self) -> u8 {
        self.uint(layout::CUSTOM_PURPOSES_COUNT) as u8
    }

    pub fn custom_allowed_purpose_ids(&self) -> IdSet {
        self.bitfield(self.custom_purposes())
    }

    /// The custom purposes bitfield as an integer, custom purpose 1 being the most significant
    /// bit.
    pub fn custom_allowed_purposes_bits(&self) -> u64 {
        self.uint(self.custom_purposes())
    }

    /// Ids outside of `1..=custom_purposes_count()` are never allowed.
    pub fn is_custom_purpose_allowed(&self, id: u16) -> bool {
        is_id_allowed(&self.bits, self.custom_purposes(), id)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bits.as_bytes()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bits.into_bytes()
    }

    fn custom_purposes(&self) -> Field {
        layout::custom_purposes(self.custom_purposes_count())
    }

    // Every field below lies within the length validated by `from_buffer`.

    fn uint(&self, field: Field) -> u64 {
        self.bits
            .get_uint(field.offset, field.width)
            .expect("field lies within the checked length")
    }

    fn timestamp(&self, field: Field) -> u64 {
        self.bits
            .get_timestamp_deciseconds(field.offset, field.width)
            .expect("field lies within the checked length")
    }

    fn bitfield(&self, field: Field) -> IdSet {
        self.bits
            .reader_at(field.offset, field.width)
            .ok()
            .and_then(|mut r| r.read_fixed_bitfield(field.width as usize).ok())
            .unwrap_or_default()
    }
}

fn is_id_allowed(bits: &BitBuffer, field: Field, id: u16) -> bool {
    if id == 0 || u32::from(id) > field.width {
        return false;
    }
    bits.get_bit(field.offset + usize::from(id) - 1)
        .unwrap_or(false)
}

impl fmt::Debug for ConsentV1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsentV1")
            .field("version", &self.version())
            .field("created", &self.created())
            .field("last_updated", &self.last_updated())
            .field("cmp_id", &self.cmp_id())
            .field("cmp_version", &self.cmp_version())
            .field("consent_screen", &self.consent_screen())
            .field("consent_language", &self.consent_language())
            .field("vendor_list_version", &self.vendor_list_version())
            .field(
                "publisher_purposes_version",
                &self.publisher_purposes_version(),
            )
            .field("allowed_purpose_ids", &self.allowed_purpose_ids())
            .field(
                "custom_allowed_purpose_ids",
                &self.custom_allowed_purpose_ids(),
            )
            .finish()
    }
}
