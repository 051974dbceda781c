//! This crate is an implementation of the IAB Publisher Purposes Consent String, the companion
//! of the GDPR Transparency and Consent Framework v1.1 vendor consent string which records the
//! purposes a user allowed a publisher to process their data for.
//!
//! NOTE: This is not an official IAB library.
//!
//! # Decoding consent strings
//!
//! A consent string is a compact binary record transported as an unpadded URL-safe Base64 token.
//! It holds a header describing the Consent Management Provider (CMP) which recorded the consent,
//! a bitfield of 24 standard purposes, and a bitfield of up to 63 custom purposes defined by the
//! publisher.
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use iab_ppc::{ConsentRecord, Purpose};
//! use std::str::FromStr;
//!
//! let consent = ConsentRecord::from_str("BOjUNEbOjUNEbAMAWhENABABsAAAFWA")?;
//!
//! assert_eq!(consent.cmp_id(), 12);
//! assert_eq!(consent.consent_language(), "EN");
//!
//! // may the publisher select ads for this user?
//! assert!(consent.is_allowed(Purpose::AdSelection));
//!
//! // custom purposes only have numeric ids
//! assert!(consent.is_custom_purpose_allowed(2));
//! assert!(!consent.is_custom_purpose_allowed(3));
//! # Ok(())
//! # }
//! ```
//!
//! # Creating consent strings
//!
//! New strings are created with a [`ConsentBuilder`], and encoded back to their token form with
//! [`encode`] or through their [`Display`](std::fmt::Display) implementation.
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use iab_ppc::{ConsentBuilder, Purpose};
//!
//! let consent = ConsentBuilder::new()
//!     .with_created(1528070400000)
//!     .with_last_updated(1528070400000)
//!     .with_cmp_id(15)
//!     .with_consent_language("fr")
//!     .with_vendor_list_version(150)
//!     .with_allowed_purposes([Purpose::StorageAndAccess, Purpose::Measurement])
//!     .build()?;
//!
//! let token = iab_ppc::encode(&consent);
//! assert_eq!(iab_ppc::decode(&token)?, consent);
//! # Ok(())
//! # }
//! ```
//!
//! # Error handling
//!
//! Decoding is all or nothing: a string which is empty, not valid Base64, of an unknown version,
//! or shorter than the bitfields it declares is rejected with a [`ConsentDecodeError`].
//! Querying a decoded string never fails; ids outside of the bitfields are simply not allowed.
//!
pub mod consent;
pub mod core;
pub mod purpose;
pub mod v1;

pub use crate::consent::{ConsentDecodeError, ConsentRecord, decode, decode_bytes, encode};
pub use crate::core::BitBuffer;
pub use crate::purpose::Purpose;
pub use crate::v1::{ConsentBuildError, ConsentBuilder};
