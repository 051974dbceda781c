//! URL-safe Base64 transport of consent strings.
//!
//! Consent strings are encoded without padding. Decoding accepts padded and unpadded input, and
//! ignores the unused low bits of the last character, which 6-bit aligned encoders may fill.
//!
use base64::Engine;
use base64::alphabet::URL_SAFE;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

pub use base64::DecodeError;

const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

pub trait DecodeExt {
    fn decode_base64_url(&self) -> Result<Vec<u8>, DecodeError>;
}

impl DecodeExt for str {
    fn decode_base64_url(&self) -> Result<Vec<u8>, DecodeError> {
        ENGINE.decode(self)
    }
}

pub trait EncodeExt {
    fn encode_base64_url(&self) -> String;
}

impl EncodeExt for [u8] {
    fn encode_base64_url(&self) -> String {
        ENGINE.encode(self)
    }
}
