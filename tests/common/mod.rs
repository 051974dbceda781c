use assert_json_diff::assert_json_eq;
use iab_ppc::ConsentRecord;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

#[derive(Deserialize)]
pub struct TestCase {
    consent_string: String,
    expected: Fields,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Fields {
    version: u8,
    created: u64,
    last_updated: u64,
    cmp_id: u16,
    cmp_version: u16,
    consent_screen: u8,
    consent_language: String,
    vendor_list_version: u16,
    publisher_purposes_version: u16,
    allowed_purpose_ids: Vec<u16>,
    custom_purposes_count: u8,
    custom_allowed_purpose_ids: Vec<u16>,
}

impl From<&ConsentRecord> for Fields {
    fn from(c: &ConsentRecord) -> Self {
        Self {
            version: c.version(),
            created: c.created(),
            last_updated: c.last_updated(),
            cmp_id: c.cmp_id(),
            cmp_version: c.cmp_version(),
            consent_screen: c.consent_screen(),
            consent_language: c.consent_language(),
            vendor_list_version: c.vendor_list_version(),
            publisher_purposes_version: c.publisher_purposes_version(),
            allowed_purpose_ids: c.allowed_purpose_ids().into_iter().collect(),
            custom_purposes_count: c.custom_purposes_count(),
            custom_allowed_purpose_ids: c.custom_allowed_purpose_ids().into_iter().collect(),
        }
    }
}

impl TestCase {
    pub fn load_from_file<P: AsRef<Path>>(p: P) -> io::Result<Self> {
        let f = File::open(p)?;
        let tc: Self = serde_json::from_reader(&f)
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e.to_string()))?;
        Ok(tc)
    }

    pub fn assert_json_matches(&self) {
        let c = ConsentRecord::from_str(&self.consent_string).expect("invalid consent string");

        assert_json_eq!(Fields::from(&c), self.expected);
        assert_eq!(c.to_string(), self.consent_string);
    }
}
