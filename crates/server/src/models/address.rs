//! Shipping address value object.
//!
//! Constructed per checkout request and frozen into the order snapshot.
//! Validation rules are country-aware: US/Canada expect two-letter region
//! codes and their national postal formats, the UK its postcode format,
//! anything else just non-empty fields.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s\-']+$").expect("static regex"));
static COUNTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s\-]+$").expect("static regex"));
static CITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s\-.]+$").expect("static regex"));
static REGION_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}$").expect("static regex"));
static REGION_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s\-.]+$").expect("static regex"));
static US_ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("static regex"));
static CA_ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]\d[A-Za-z][ -]?\d[A-Za-z]\d$").expect("static regex"));
static UK_ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,2}\d[A-Z\d]? ?\d[A-Z]{2}$").expect("static regex"));
static STREET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\s\-.,#'/]+$").expect("static regex"));

/// Which address field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("full name")]
    FullName,
    #[error("country")]
    Country,
    #[error("city")]
    City,
    #[error("state/region")]
    Region,
    #[error("postal code")]
    PostalCode,
    #[error("street address")]
    Street,
}

/// A shipping address, validated as a whole before checkout commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub full_name: String,
    pub country: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub street: String,
}

impl Address {
    /// Validate every field, returning the first violation.
    ///
    /// # Errors
    ///
    /// Returns the [`AddressError`] naming the first malformed field.
    pub fn validate(&self) -> Result<(), AddressError> {
        if !Self::valid_full_name(&self.full_name) {
            return Err(AddressError::FullName);
        }
        if !Self::valid_country(&self.country) {
            return Err(AddressError::Country);
        }
        if !Self::valid_city(&self.city) {
            return Err(AddressError::City);
        }
        if !Self::valid_region(&self.region, &self.country) {
            return Err(AddressError::Region);
        }
        if !Self::valid_postal_code(&self.postal_code, &self.country) {
            return Err(AddressError::PostalCode);
        }
        if !Self::valid_street(&self.street) {
            return Err(AddressError::Street);
        }
        Ok(())
    }

    /// At least 2 characters of letters, spaces, hyphens, apostrophes.
    fn valid_full_name(name: &str) -> bool {
        let trimmed = name.trim();
        trimmed.len() >= 2 && NAME_RE.is_match(trimmed)
    }

    /// At least 2 characters of letters, spaces, hyphens.
    fn valid_country(country: &str) -> bool {
        let trimmed = country.trim();
        trimmed.len() >= 2 && COUNTRY_RE.is_match(trimmed)
    }

    /// At least 2 characters of letters, spaces, hyphens, periods.
    fn valid_city(city: &str) -> bool {
        let trimmed = city.trim();
        trimmed.len() >= 2 && CITY_RE.is_match(trimmed)
    }

    /// US and Canada require two-letter uppercase codes; elsewhere free text.
    fn valid_region(region: &str, country: &str) -> bool {
        let trimmed = region.trim();
        if trimmed.is_empty() {
            return false;
        }
        if is_us(country) || is_canada(country) {
            return REGION_CODE_RE.is_match(trimmed);
        }
        REGION_TEXT_RE.is_match(trimmed)
    }

    /// Postal format depends on country; unknown countries need only a
    /// non-empty value.
    fn valid_postal_code(postal: &str, country: &str) -> bool {
        let trimmed = postal.trim();
        if is_us(country) {
            return US_ZIP_RE.is_match(trimmed);
        }
        if is_canada(country) {
            return CA_ZIP_RE.is_match(trimmed);
        }
        if is_uk(country) {
            return UK_ZIP_RE.is_match(&trimmed.to_uppercase());
        }
        !trimmed.is_empty()
    }

    /// At least 3 characters of alphanumerics and common address punctuation.
    fn valid_street(street: &str) -> bool {
        let trimmed = street.trim();
        trimmed.len() >= 3 && STREET_RE.is_match(trimmed)
    }
}

fn is_us(country: &str) -> bool {
    matches!(
        country.trim().to_uppercase().as_str(),
        "UNITED STATES" | "USA" | "US"
    )
}

fn is_canada(country: &str) -> bool {
    matches!(country.trim().to_uppercase().as_str(), "CANADA" | "CA")
}

fn is_uk(country: &str) -> bool {
    matches!(
        country.trim().to_uppercase().as_str(),
        "UNITED KINGDOM" | "UK" | "GREAT BRITAIN"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn us_address() -> Address {
        Address {
            full_name: "Ada Lovelace".to_string(),
            country: "United States".to_string(),
            city: "Portland".to_string(),
            region: "OR".to_string(),
            postal_code: "97201".to_string(),
            street: "123 Main St #4".to_string(),
        }
    }

    #[test]
    fn accepts_well_formed_us_address() {
        assert!(us_address().validate().is_ok());
    }

    #[test]
    fn us_postal_code_formats() {
        let mut addr = us_address();
        addr.postal_code = "97201-1234".to_string();
        assert!(addr.validate().is_ok());

        addr.postal_code = "9720".to_string();
        assert_eq!(addr.validate(), Err(AddressError::PostalCode));
    }

    #[test]
    fn us_region_must_be_two_letter_code() {
        let mut addr = us_address();
        addr.region = "Oregon".to_string();
        assert_eq!(addr.validate(), Err(AddressError::Region));
    }

    #[test]
    fn canadian_postal_code() {
        let addr = Address {
            full_name: "Terry Fox".to_string(),
            country: "Canada".to_string(),
            city: "Winnipeg".to_string(),
            region: "MB".to_string(),
            postal_code: "R3C 4T3".to_string(),
            street: "45 Portage Ave".to_string(),
        };
        assert!(addr.validate().is_ok());

        let mut bad = addr;
        bad.postal_code = "12345".to_string();
        assert_eq!(bad.validate(), Err(AddressError::PostalCode));
    }

    #[test]
    fn uk_postcode_case_insensitive() {
        let addr = Address {
            full_name: "Alan Turing".to_string(),
            country: "United Kingdom".to_string(),
            city: "London".to_string(),
            region: "Greater London".to_string(),
            postal_code: "sw1a 1aa".to_string(),
            street: "10 Downing Street".to_string(),
        };
        assert!(addr.validate().is_ok());
    }

    #[test]
    fn other_countries_need_only_nonempty_postal() {
        let addr = Address {
            full_name: "Grace Hopper".to_string(),
            country: "Japan".to_string(),
            city: "Tokyo".to_string(),
            region: "Kanto".to_string(),
            postal_code: "100-0001".to_string(),
            street: "1 Chiyoda".to_string(),
        };
        assert!(addr.validate().is_ok());
    }

    #[test]
    fn rejects_short_or_odd_fields() {
        let mut addr = us_address();
        addr.full_name = "A".to_string();
        assert_eq!(addr.validate(), Err(AddressError::FullName));

        let mut addr = us_address();
        addr.street = "12".to_string();
        assert_eq!(addr.validate(), Err(AddressError::Street));

        let mut addr = us_address();
        addr.city = "P0rtland!".to_string();
        assert_eq!(addr.validate(), Err(AddressError::City));
    }
}
