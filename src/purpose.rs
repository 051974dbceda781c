//! Well-known standard purposes.
//!
//! Standard purpose ids range from 1 to 24, but only the first five carry a label. Records and
//! builders work on raw ids; this enumeration is a lookup on top of them.
//!
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};
#[cfg(feature = "serde")]
use serde::Serialize;
use strum_macros::Display;

#[derive(
    Clone, Copy, Debug, Display, Eq, PartialEq, Ord, PartialOrd, Hash, FromPrimitive, ToPrimitive,
)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[non_exhaustive]
pub enum Purpose {
    /// Storage and access of information on the user's device.
    StorageAndAccess = 1,
    /// Personalisation of content and advertising.
    Personalization = 2,
    /// Ad selection, delivery and reporting.
    AdSelection = 3,
    /// Content selection, delivery and reporting.
    ContentDelivery = 4,
    Measurement = 5,
}

impl Purpose {
    pub fn id(self) -> u16 {
        self.to_u16().unwrap_or_default()
    }

    /// Returns the purpose labelled by `id`, if any.
    pub fn from_id(id: u16) -> Option<Self> {
        Self::from_u16(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1 => Some(Purpose::StorageAndAccess))]
    #[test_case(3 => Some(Purpose::AdSelection))]
    #[test_case(5 => Some(Purpose::Measurement))]
    #[test_case(0 => None ; "zero")]
    #[test_case(15 => None ; "unlabelled")]
    fn from_id(id: u16) -> Option<Purpose> {
        Purpose::from_id(id)
    }

    #[test]
    fn id_lookup_is_injective() {
        for id in 0..=24 {
            if let Some(p) = Purpose::from_id(id) {
                assert_eq!(p.id(), id);
            }
        }
    }

    #[test]
    fn display() {
        assert_eq!(Purpose::ContentDelivery.to_string(), "ContentDelivery");
    }
}
