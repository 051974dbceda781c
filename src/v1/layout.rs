//! Bit layout of version 1 publisher purposes consent strings.
//!
//! | Field                           | Bits |
//! |---------------------------------|------|
//! | Version                         | 6    |
//! | Created (deciseconds)           | 36   |
//! | Last updated (deciseconds)      | 36   |
//! | CMP id                          | 12   |
//! | CMP version                     | 12   |
//! | Consent screen                  | 6    |
//! | Consent language                | 12   |
//! | Vendor list version             | 12   |
//! | Publisher purposes version      | 12   |
//! | Standard purposes bitfield      | 24   |
//! | Number of custom purposes       | 6    |
//! | Custom purposes bitfield        | N    |
//!
//! The custom purposes bitfield is as long as the value of the field preceding it.
//!
use crate::core::Field;

pub const VERSION: Field = Field::new(0, 6);
pub const CREATED: Field = Field::after(VERSION, 36);
pub const LAST_UPDATED: Field = Field::after(CREATED, 36);
pub const CMP_ID: Field = Field::after(LAST_UPDATED, 12);
pub const CMP_VERSION: Field = Field::after(CMP_ID, 12);
pub const CONSENT_SCREEN: Field = Field::after(CMP_VERSION, 6);
pub const CONSENT_LANGUAGE: Field = Field::after(CONSENT_SCREEN, 12);
pub const VENDOR_LIST_VERSION: Field = Field::after(CONSENT_LANGUAGE, 12);
pub const PUBLISHER_PURPOSES_VERSION: Field = Field::after(VENDOR_LIST_VERSION, 12);
pub const PURPOSES: Field = Field::after(PUBLISHER_PURPOSES_VERSION, 24);
pub const CUSTOM_PURPOSES_COUNT: Field = Field::after(PURPOSES, 6);

/// Number of characters of the consent language.
pub const CONSENT_LANGUAGE_CHARS: usize = 2;

/// Highest standard purpose id.
pub const MAX_PURPOSE_ID: u16 = PURPOSES.width as u16;

/// Highest custom purpose id the count field can describe.
pub const MAX_CUSTOM_PURPOSE_ID: u16 = (1 << CUSTOM_PURPOSES_COUNT.width) - 1;

/// Length of everything before the custom purposes bitfield.
pub const HEADER_BITS: usize = CUSTOM_PURPOSES_COUNT.end();

/// Custom purposes bitfield holding `count` purposes.
pub const fn custom_purposes(count: u8) -> Field {
    Field::new(HEADER_BITS, count as u32)
}
