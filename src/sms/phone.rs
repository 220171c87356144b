//! Destination phone numbers and country derivation.

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// A destination phone number. Debug and Display mask all but the last four
/// digits so numbers never reach the logs in full.
#[derive(Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// The unmasked number, for handing to vendors.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Show only the last four characters, e.g. `+85291234567` -> `+*******4567`.
fn mask(phone: &str) -> String {
    let len = phone.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }

    let visible: String = phone.chars().skip(len - 4).collect();
    match phone.strip_prefix('+') {
        Some(_) => format!("+{}{}", "*".repeat(len - 5), visible),
        None => format!("{}{}", "*".repeat(len - 4), visible),
    }
}

impl std::fmt::Debug for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PhoneNumber({})", mask(&self.0))
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&mask(&self.0))
    }
}

impl<'de> Deserialize<'de> for PhoneNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(PhoneNumber)
    }
}

/// Derives the destination country from a phone number.
pub trait PhoneNumberService: Send + Sync {
    /// ISO 3166-1 alpha-2 code of the number's region.
    ///
    /// Fails with [`Error::InvalidDestination`] when the number cannot be
    /// parsed or does not belong to a known region.
    fn country_code(&self, number: &PhoneNumber) -> Result<String>;
}

/// [`PhoneNumberService`] backed by libphonenumber metadata. Numbers must be
/// in international form (leading `+` and calling code).
#[derive(Debug, Clone, Copy, Default)]
pub struct LibPhoneNumber;

impl PhoneNumberService for LibPhoneNumber {
    fn country_code(&self, number: &PhoneNumber) -> Result<String> {
        let invalid = |reason: String| Error::InvalidDestination {
            number: number.to_string(),
            reason,
        };

        let parsed =
            phonenumber::parse(None, number.expose()).map_err(|e| invalid(e.to_string()))?;

        if !phonenumber::is_valid(&parsed) {
            return Err(invalid("not a valid phone number".to_string()));
        }

        // country ids are named after their alpha-2 codes
        parsed
            .country()
            .id()
            .map(|id| format!("{:?}", id))
            .ok_or_else(|| invalid("number does not belong to a single region".to_string()))
    }
}
