use iab_ppc::{
    BitBuffer, ConsentBuildError, ConsentBuilder, ConsentDecodeError, ConsentRecord, decode,
    decode_bytes, encode,
};
use std::collections::BTreeSet;
use test_case::test_case;

fn builder() -> ConsentBuilder {
    ConsentBuilder::new()
        .with_created(1562488450700)
        .with_last_updated(1562488459900)
        .with_cmp_id(12)
        .with_cmp_version(22)
        .with_consent_screen(33)
        .with_consent_language("EN")
        .with_vendor_list_version(1)
        .with_publisher_purposes_version(1)
}

fn build(purposes: &[u16], custom: &[u16]) -> ConsentRecord {
    builder()
        .with_allowed_purpose_ids(purposes.iter().copied())
        .unwrap()
        .with_custom_allowed_purpose_ids(custom.iter().copied())
        .unwrap()
        .build()
        .unwrap()
}

#[test_case(&[], &[] ; "nothing allowed")]
#[test_case(&[1, 3, 4], &[2, 4, 5] ; "sparse")]
#[test_case(&[24], &[63] ; "highest ids")]
#[test_case(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24], &[1, 2, 3, 4, 5, 6, 7, 8] ; "byte aligned")]
fn round_trip(purposes: &[u16], custom: &[u16]) {
    let built = build(purposes, custom);
    let decoded = decode(&encode(&built)).unwrap();

    assert_eq!(decoded, built);
    assert_eq!(decoded.as_bytes(), built.as_bytes());
    assert_eq!(
        decoded.allowed_purpose_ids(),
        BTreeSet::from_iter(purposes.iter().copied())
    );
    assert_eq!(
        decoded.custom_allowed_purpose_ids(),
        BTreeSet::from_iter(custom.iter().copied())
    );
    assert_eq!(decode_bytes(built.as_bytes()).unwrap(), built);
}

#[test]
fn bit_independence() {
    let c = build(&[1, 3, 4], &[]);

    assert_eq!(c.allowed_purpose_ids(), BTreeSet::from_iter([1, 3, 4]));
    assert_eq!(c.allowed_purposes_bits(), 0b1011 << 20);
    assert_eq!(c.publisher_purposes_version(), 1);
    assert_eq!(c.custom_purposes_count(), 0);
}

#[test_case(0 ; "none")]
#[test_case(1 ; "one")]
#[test_case(7 ; "one byte")]
#[test_case(63 ; "most")]
fn custom_bitfield_length(count: u16) {
    let c = build(&[], &[count]);

    assert_eq!(u16::from(c.custom_purposes_count()), count);
    assert_eq!(c.as_bytes().len(), (174 + count as usize).div_ceil(8));
    for id in 0..=70 {
        assert_eq!(c.is_custom_purpose_allowed(id), id != 0 && id == count);
    }
}

#[test]
fn timestamps_keep_decisecond_precision() {
    let c = builder()
        .with_created(1562488450700)
        .with_last_updated(1562488450789)
        .build()
        .unwrap();
    let decoded = decode(&encode(&c)).unwrap();

    assert_eq!(decoded.created(), 1562488450700);
    assert_eq!(decoded.last_updated(), 1562488450700);
}

#[test_case(0 ; "zero")]
#[test_case(25 ; "past the bitfield")]
#[test_case(u16::MAX ; "max")]
fn out_of_range_purposes_are_not_allowed(id: u16) {
    let all: Vec<u16> = (1..=24).collect();
    let c = build(&all, &[]);

    assert!(!c.is_purpose_allowed(id));
}

#[test]
fn unsupported_version() {
    let mut bits = BitBuffer::with_bit_len(800);
    bits.set_uint(0, 6, 10).unwrap();

    assert!(matches!(
        ConsentRecord::from_buffer(bits),
        Err(ConsentDecodeError::UnsupportedVersion(10))
    ));
}

#[test]
fn truncated_string_is_rejected() {
    let c = build(&[1], &[1, 9]);
    let bytes = c.as_bytes();

    assert!(matches!(
        decode_bytes(&bytes[..bytes.len() - 1]),
        Err(ConsentDecodeError::Truncated {
            expected: 183,
            found: 176
        })
    ));
}

#[test]
fn invalid_construction() {
    assert!(matches!(
        builder().with_vendor_list_version(0).build(),
        Err(ConsentBuildError::InvalidField { .. })
    ));
    assert!(matches!(
        builder().with_allowed_purpose_ids([99]),
        Err(ConsentBuildError::InvalidPurposeId { id: 99, .. })
    ));
}
