//! Payment card value object.
//!
//! Cards are validated for shape only and never charged or persisted; the
//! number exists just long enough to pass checkout validation.

use chrono::{Datelike, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Which payment field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("cardholder name")]
    CardholderName,
    #[error("card number")]
    CardNumber,
    #[error("expiry date")]
    Expiry,
    #[error("security code")]
    Cvv,
    #[error("billing zip")]
    BillingZip,
}

/// Card networks the validator recognizes.
///
/// Only the CVV length rule depends on the network; unknown prefixes are
/// accepted if the number itself checks out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardNetwork {
    Visa,
    Mastercard,
    AmericanExpress,
    Discover,
    Unknown,
}

impl CardNetwork {
    /// Detect the network from the leading digits.
    #[must_use]
    pub fn detect(digits: &str) -> Self {
        if digits.starts_with('4') {
            Self::Visa
        } else if matches!(digits.as_bytes().first(), Some(b'5'))
            && matches!(digits.as_bytes().get(1), Some(b'1'..=b'5'))
        {
            Self::Mastercard
        } else if digits.starts_with("34") || digits.starts_with("37") {
            Self::AmericanExpress
        } else if digits.starts_with("6011") || digits.starts_with("65") {
            Self::Discover
        } else {
            Self::Unknown
        }
    }

    /// Required CVV length for this network.
    #[must_use]
    pub const fn cvv_length(self) -> usize {
        match self {
            Self::AmericanExpress => 4,
            _ => 3,
        }
    }
}

/// Payment details submitted with a checkout request.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCard {
    pub card_name: String,
    pub card_number: String,
    /// Expiry in `MM/YY` form.
    pub card_exp: String,
    pub card_cvv: String,
    pub card_zip: String,
}

impl PaymentCard {
    /// Validate every field, returning the first violation.
    ///
    /// # Errors
    ///
    /// Returns the [`PaymentError`] naming the first malformed field.
    pub fn validate(&self) -> Result<(), PaymentError> {
        if !Self::valid_name(&self.card_name) {
            return Err(PaymentError::CardholderName);
        }
        let digits = normalize_number(&self.card_number);
        if !Self::valid_number(&digits) {
            return Err(PaymentError::CardNumber);
        }
        if !Self::valid_expiry(&self.card_exp) {
            return Err(PaymentError::Expiry);
        }
        if !Self::valid_cvv(&self.card_cvv, CardNetwork::detect(&digits)) {
            return Err(PaymentError::Cvv);
        }
        if !Self::valid_zip(&self.card_zip) {
            return Err(PaymentError::BillingZip);
        }
        Ok(())
    }

    /// Cardholder name needs at least two space-separated tokens.
    fn valid_name(name: &str) -> bool {
        let trimmed = name.trim();
        trimmed.len() >= 2 && trimmed.split_whitespace().count() >= 2
    }

    /// 13-19 digits passing the Luhn checksum.
    fn valid_number(digits: &str) -> bool {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        if digits.len() < 13 || digits.len() > 19 {
            return false;
        }
        luhn_checksum(digits) % 10 == 0
    }

    /// `MM/YY`, month 1-12, not in the past.
    fn valid_expiry(exp: &str) -> bool {
        let Some((month_str, year_str)) = exp.split_once('/') else {
            return false;
        };
        if month_str.len() != 2 || year_str.len() != 2 {
            return false;
        }
        let (Ok(month), Ok(year)) = (month_str.parse::<u32>(), year_str.parse::<i32>()) else {
            return false;
        };
        if !(1..=12).contains(&month) {
            return false;
        }

        let now = Utc::now();
        let current_year = now.year() % 100;
        let current_month = now.month();

        year > current_year || (year == current_year && month >= current_month)
    }

    /// Digit-only CVV of the network's required length.
    fn valid_cvv(cvv: &str, network: CardNetwork) -> bool {
        let trimmed = cvv.trim();
        trimmed.bytes().all(|b| b.is_ascii_digit()) && trimmed.len() == network.cvv_length()
    }

    /// US zip, Canadian postal code, or any 3+ character value.
    fn valid_zip(zip: &str) -> bool {
        let trimmed = zip.trim();
        if trimmed.is_empty() {
            return false;
        }
        let bytes = trimmed.as_bytes();
        // US 5-digit (optionally +4)
        let us = match bytes.len() {
            5 => bytes.iter().all(u8::is_ascii_digit),
            10 => {
                bytes.iter().take(5).all(u8::is_ascii_digit)
                    && bytes.get(5) == Some(&b'-')
                    && bytes.iter().skip(6).all(u8::is_ascii_digit)
            }
            _ => false,
        };
        if us {
            return true;
        }
        // Canadian A1A 1A1 (optional separator)
        let compact: Vec<u8> = bytes
            .iter()
            .copied()
            .filter(|b| *b != b' ' && *b != b'-')
            .collect();
        let canadian = compact.len() == 6
            && compact
                .iter()
                .enumerate()
                .all(|(i, b)| if i % 2 == 0 { b.is_ascii_alphabetic() } else { b.is_ascii_digit() });
        if canadian {
            return true;
        }
        trimmed.len() >= 3
    }
}

/// Strip spaces and dashes from a card number.
fn normalize_number(raw: &str) -> String {
    raw.chars().filter(|c| *c != ' ' && *c != '-').collect()
}

/// Sum of digits per the Luhn algorithm, doubling every second digit from
/// the right.
fn luhn_checksum(digits: &str) -> u32 {
    digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let mut d = u32::from(b - b'0');
            if i % 2 == 1 {
                d *= 2;
                if d > 9 {
                    d -= 9;
                }
            }
            d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_card() -> PaymentCard {
        PaymentCard {
            card_name: "Ada Lovelace".to_string(),
            card_number: "4111 1111 1111 1111".to_string(),
            card_exp: "12/99".to_string(),
            card_cvv: "123".to_string(),
            card_zip: "97201".to_string(),
        }
    }

    #[test]
    fn accepts_valid_visa() {
        assert!(valid_card().validate().is_ok());
    }

    #[test]
    fn rejects_luhn_failure() {
        let mut card = valid_card();
        card.card_number = "4111111111111112".to_string();
        assert_eq!(card.validate(), Err(PaymentError::CardNumber));
    }

    #[test]
    fn rejects_wrong_length() {
        let mut card = valid_card();
        card.card_number = "411111111111".to_string(); // 12 digits
        assert_eq!(card.validate(), Err(PaymentError::CardNumber));
    }

    #[test]
    fn network_detection() {
        assert_eq!(CardNetwork::detect("4111111111111111"), CardNetwork::Visa);
        assert_eq!(
            CardNetwork::detect("5500005555555559"),
            CardNetwork::Mastercard
        );
        assert_eq!(
            CardNetwork::detect("378282246310005"),
            CardNetwork::AmericanExpress
        );
        assert_eq!(
            CardNetwork::detect("6011111111111117"),
            CardNetwork::Discover
        );
        assert_eq!(CardNetwork::detect("9999999999999999"), CardNetwork::Unknown);
    }

    #[test]
    fn amex_requires_four_digit_cvv() {
        let mut card = valid_card();
        // Amex test number, valid Luhn
        card.card_number = "378282246310005".to_string();
        card.card_cvv = "123".to_string();
        assert_eq!(card.validate(), Err(PaymentError::Cvv));

        card.card_cvv = "1234".to_string();
        assert!(card.validate().is_ok());
    }

    #[test]
    fn rejects_past_expiry() {
        let mut card = valid_card();
        card.card_exp = "01/20".to_string();
        assert_eq!(card.validate(), Err(PaymentError::Expiry));

        card.card_exp = "13/99".to_string();
        assert_eq!(card.validate(), Err(PaymentError::Expiry));

        card.card_exp = "1/99".to_string();
        assert_eq!(card.validate(), Err(PaymentError::Expiry));
    }

    #[test]
    fn rejects_single_token_name() {
        let mut card = valid_card();
        card.card_name = "Cher".to_string();
        assert_eq!(card.validate(), Err(PaymentError::CardholderName));
    }

    #[test]
    fn billing_zip_formats() {
        let mut card = valid_card();
        for zip in ["97201", "97201-1234", "R3C 4T3", "EC1A"] {
            card.card_zip = zip.to_string();
            assert!(card.validate().is_ok(), "{zip} should be accepted");
        }
        card.card_zip = "ab".to_string();
        assert_eq!(card.validate(), Err(PaymentError::BillingZip));
    }
}
