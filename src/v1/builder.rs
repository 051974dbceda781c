use crate::consent::ConsentRecord;
use crate::core::{BitBuffer, BitBufferError, Field, IdSet};
use crate::purpose::Purpose;
use crate::v1::{ConsentV1, VERSION, layout};
use thiserror::Error;
use tracing::trace;

/// The error type for consent string creation.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConsentBuildError {
    /// A mandatory field has not been set.
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("invalid purpose id {id} (expected at most {max})")]
    InvalidPurposeId { id: u16, max: u16 },
    #[error("invalid custom purpose id {id} (expected at most {max})")]
    InvalidCustomPurposeId { id: u16, max: u16 },
    /// A field value is rejected by the format, either because it does not fit the field or
    /// because the value is not meaningful.
    #[error("invalid value {value} for field {field}")]
    InvalidField { field: &'static str, value: u64 },
    /// The consent language is not made of two letters.
    #[error("invalid consent language {0:?}")]
    InvalidConsentLanguage(String),
    #[error("unable to write field: {0}")]
    Write(#[from] BitBufferError),
}

/// Builder for version 1 consent strings.
///
/// Setters can be chained and the same builder can be used to produce several strings.
///
/// ```
/// # use std::error::Error;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// use iab_ppc::ConsentBuilder;
///
/// let consent = ConsentBuilder::new()
///     .with_created(1562488450700)
///     .with_last_updated(1562488450700)
///     .with_cmp_id(12)
///     .with_cmp_version(22)
///     .with_consent_screen(33)
///     .with_consent_language("EN")
///     .with_vendor_list_version(1)
///     .with_publisher_purposes_version(1)
///     .with_allowed_purpose_ids([1, 3, 4])?
///     .with_custom_allowed_purpose_ids([2, 4, 5])?
///     .build()?;
///
/// assert_eq!(consent.to_string(), "BOjUNEbOjUNEbAMAWhENABABsAAAFWA");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConsentBuilder {
    created: Option<u64>,
    last_updated: Option<u64>,
    cmp_id: u16,
    cmp_version: u16,
    consent_screen: u8,
    consent_language: Option<String>,
    vendor_list_version: u16,
    publisher_purposes_version: u16,
    allowed_purposes: IdSet,
    custom_allowed_purposes: IdSet,
}

impl ConsentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creation time, in milliseconds since the Unix epoch. Mandatory.
    pub fn with_created(mut self, millis: u64) -> Self {
        self.created = Some(millis);
        self
    }

    /// Last update time, in milliseconds since the Unix epoch. Mandatory.
    pub fn with_last_updated(mut self, millis: u64) -> Self {
        self.last_updated = Some(millis);
        self
    }

    pub fn with_cmp_id(mut self, cmp_id: u16) -> Self {
        self.cmp_id = cmp_id;
        self
    }

    pub fn with_cmp_version(mut self, cmp_version: u16) -> Self {
        self.cmp_version = cmp_version;
        self
    }

    pub fn with_consent_screen(mut self, consent_screen: u8) -> Self {
        self.consent_screen = consent_screen;
        self
    }

    /// Two-letter ISO 639-1 language code, case insensitive. Mandatory.
    pub fn with_consent_language(mut self, language: &str) -> Self {
        self.consent_language = Some(language.to_string());
        self
    }

    /// Must be positive.
    pub fn with_vendor_list_version(mut self, version: u16) -> Self {
        self.vendor_list_version = version;
        self
    }

    pub fn with_publisher_purposes_version(mut self, version: u16) -> Self {
        self.publisher_purposes_version = version;
        self
    }

    /// Replaces the allowed standard purposes.
    ///
    /// Fails if an id is greater than 24. Id 0 is accepted and ignored.
    pub fn with_allowed_purpose_ids<I>(mut self, ids: I) -> Result<Self, ConsentBuildError>
    where
        I: IntoIterator<Item = u16>,
    {
        self.allowed_purposes = collect_ids(ids, layout::MAX_PURPOSE_ID, |id, max| {
            ConsentBuildError::InvalidPurposeId { id, max }
        })?;
        Ok(self)
    }

    /// Replaces the allowed standard purposes.
    pub fn with_allowed_purposes<I>(mut self, purposes: I) -> Self
    where
        I: IntoIterator<Item = Purpose>,
    {
        self.allowed_purposes = purposes.into_iter().map(Purpose::id).collect();
        self
    }

    /// Replaces the allowed custom purposes.
    ///
    /// Fails if an id is greater than 63. Id 0 is accepted and ignored.
    pub fn with_custom_allowed_purpose_ids<I>(mut self, ids: I) -> Result<Self, ConsentBuildError>
    where
        I: IntoIterator<Item = u16>,
    {
        self.custom_allowed_purposes =
            collect_ids(ids, layout::MAX_CUSTOM_PURPOSE_ID, |id, max| {
                ConsentBuildError::InvalidCustomPurposeId { id, max }
            })?;
        Ok(self)
    }

    /// Validates the fields and encodes them into a new consent string.
    ///
    /// The custom purposes bitfield is as long as the highest allowed custom purpose id, and the
    /// buffer holds exactly the header and that bitfield, rounded up to a whole byte.
    pub fn build(&self) -> Result<ConsentRecord, ConsentBuildError> {
        let created = self
            .created
            .ok_or(ConsentBuildError::MissingField("created"))?;
        let last_updated = self
            .last_updated
            .ok_or(ConsentBuildError::MissingField("last_updated"))?;
        let language = self
            .consent_language
            .as_deref()
            .ok_or(ConsentBuildError::MissingField("consent_language"))?;
        let language = normalize_language(language)?;

        if self.vendor_list_version == 0 {
            return Err(ConsentBuildError::InvalidField {
                field: "vendor_list_version",
                value: 0,
            });
        }

        let custom_count = self.custom_allowed_purposes.last().copied().unwrap_or(0) as u8;
        let custom_purposes = layout::custom_purposes(custom_count);
        let mut bits = BitBuffer::with_bit_len(custom_purposes.end());
        trace!(
            custom_count,
            bytes = bits.as_bytes().len(),
            "building consent string"
        );

        write_uint(&mut bits, "version", layout::VERSION, VERSION.into())?;
        write_timestamp(&mut bits, "created", layout::CREATED, created)?;
        write_timestamp(&mut bits, "last_updated", layout::LAST_UPDATED, last_updated)?;
        write_uint(&mut bits, "cmp_id", layout::CMP_ID, self.cmp_id.into())?;
        write_uint(
            &mut bits,
            "cmp_version",
            layout::CMP_VERSION,
            self.cmp_version.into(),
        )?;
        write_uint(
            &mut bits,
            "consent_screen",
            layout::CONSENT_SCREEN,
            self.consent_screen.into(),
        )?;
        bits.set_six_bit_string(
            layout::CONSENT_LANGUAGE.offset,
            layout::CONSENT_LANGUAGE_CHARS,
            &language,
        )?;
        write_uint(
            &mut bits,
            "vendor_list_version",
            layout::VENDOR_LIST_VERSION,
            self.vendor_list_version.into(),
        )?;
        write_uint(
            &mut bits,
            "publisher_purposes_version",
            layout::PUBLISHER_PURPOSES_VERSION,
            self.publisher_purposes_version.into(),
        )?;
        write_bitfield(&mut bits, layout::PURPOSES, &self.allowed_purposes)?;
        write_uint(
            &mut bits,
            "custom_purposes_count",
            layout::CUSTOM_PURPOSES_COUNT,
            custom_count.into(),
        )?;
        write_bitfield(&mut bits, custom_purposes, &self.custom_allowed_purposes)?;

        Ok(ConsentRecord::V1(ConsentV1::from_buffer_unchecked(bits)))
    }
}

fn collect_ids<I, F>(ids: I, max: u16, err: F) -> Result<IdSet, ConsentBuildError>
where
    I: IntoIterator<Item = u16>,
    F: Fn(u16, u16) -> ConsentBuildError,
{
    ids.into_iter()
        .map(|id| if id > max { Err(err(id, max)) } else { Ok(id) })
        .collect()
}

fn normalize_language(language: &str) -> Result<String, ConsentBuildError> {
    if language.len() == layout::CONSENT_LANGUAGE_CHARS
        && language.bytes().all(|b| b.is_ascii_alphabetic())
    {
        Ok(language.to_ascii_uppercase())
    } else {
        Err(ConsentBuildError::InvalidConsentLanguage(
            language.to_string(),
        ))
    }
}

fn max_value(width: u32) -> u64 {
    u64::MAX >> (u64::BITS - width)
}

fn write_uint(
    bits: &mut BitBuffer,
    name: &'static str,
    field: Field,
    value: u64,
) -> Result<(), ConsentBuildError> {
    if value > max_value(field.width) {
        return Err(ConsentBuildError::InvalidField { field: name, value });
    }
    bits.set_uint(field.offset, field.width, value)?;
    Ok(())
}

fn write_timestamp(
    bits: &mut BitBuffer,
    name: &'static str,
    field: Field,
    millis: u64,
) -> Result<(), ConsentBuildError> {
    if millis / 100 > max_value(field.width) {
        return Err(ConsentBuildError::InvalidField {
            field: name,
            value: millis,
        });
    }
    bits.set_timestamp_deciseconds(field.offset, field.width, millis)?;
    Ok(())
}

// Writes every bit of the field, clearing the ids not in the set.
fn write_bitfield(bits: &mut BitBuffer, field: Field, ids: &IdSet) -> Result<(), ConsentBuildError> {
    for i in 0..field.width as usize {
        let pos = field.offset + i;
        if ids.contains(&(i as u16 + 1)) {
            bits.set_bit(pos)?;
        } else {
            bits.clear_bit(pos)?;
        }
    }
    Ok(())
}
