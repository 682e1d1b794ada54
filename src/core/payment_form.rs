//! Input normalizers and checks for the mock payment form. Nothing here
//! talks to a payment provider.

use crate::core::{CartError, Result};
use crate::utils::validation::{validate_digits, validate_non_empty_string, validate_range, Validate};

/// Strips whitespace and groups the rest in blocks of four.
pub fn format_card_number(input: &str) -> String {
    let compact: Vec<char> = input.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keeps digits and inserts `/` after the month: `"1225"` → `"12/25"`.
pub fn format_expiry(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 2 {
        return digits;
    }
    let year: String = digits[2..].chars().take(2).collect();
    format!("{}/{}", &digits[..2], year)
}

pub fn sanitize_cvv(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentForm {
    pub card_holder: String,
    pub card_number: String,
    pub expiry: String,
    pub cvv: String,
}

impl PaymentForm {
    pub fn new(
        card_holder: impl Into<String>,
        card_number: &str,
        expiry: &str,
        cvv: &str,
    ) -> Self {
        Self {
            card_holder: card_holder.into(),
            card_number: format_card_number(card_number),
            expiry: format_expiry(expiry),
            cvv: sanitize_cvv(cvv),
        }
    }

    /// Card number shown on receipts, e.g. `**** 4242`.
    pub fn masked_card_number(&self) -> String {
        let digits: String = self.card_number.chars().filter(|c| !c.is_whitespace()).collect();
        let last4: String = digits.chars().skip(digits.len().saturating_sub(4)).collect();
        format!("**** {}", last4)
    }
}

impl Validate for PaymentForm {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("card_holder", &self.card_holder)?;

        let digits: String = self.card_number.chars().filter(|c| !c.is_whitespace()).collect();
        validate_digits("card_number", &digits, 13, 19)?;

        let Some((month, year)) = self.expiry.split_once('/') else {
            return Err(CartError::ValidationError {
                message: "expiry must be in MM/YY format".to_string(),
            });
        };
        validate_digits("expiry year", year, 2, 2)?;
        let month: u32 = month.parse().map_err(|_| CartError::ValidationError {
            message: format!("invalid expiry month '{}'", month),
        })?;
        validate_range("expiry month", month, 1, 12)?;

        validate_digits("cvv", &self.cvv, 3, 4)
    }
}
