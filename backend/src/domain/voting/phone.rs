//! Phone number normalisation.
//!
//! Verified voters are keyed by the digits of their phone number, so every
//! representation a client may send (`+972 50-123-4567`, `00972501234567`)
//! must collapse to the same canonical digit string.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const MIN_DIGITS: usize = 7;
const MAX_DIGITS: usize = 15;

/// Raised when a raw phone number cannot be normalised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneNumberValidationError {
    /// Input contains no digits at all.
    #[error("phone number must contain digits")]
    Empty,
    /// Fewer digits than any dialable number.
    #[error("phone number must have at least {min} digits")]
    TooShort { min: usize },
    /// More digits than E.164 allows.
    #[error("phone number must have at most {max} digits")]
    TooLong { max: usize },
}

/// Canonical digit-only phone number.
///
/// # Examples
/// ```
/// use qvote_backend::domain::PhoneNumber;
///
/// let phone = PhoneNumber::normalize("+972 (50) 123-4567").expect("valid phone");
/// assert_eq!(phone.as_str(), "972501234567");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Strip formatting and the `00` international prefix, then bound-check
    /// the remaining digits.
    pub fn normalize(raw: &str) -> Result<Self, PhoneNumberValidationError> {
        let all_digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        let digits = all_digits
            .strip_prefix("00")
            .unwrap_or(all_digits.as_str())
            .to_owned();

        match digits.len() {
            0 => Err(PhoneNumberValidationError::Empty),
            len if len < MIN_DIGITS => {
                Err(PhoneNumberValidationError::TooShort { min: MIN_DIGITS })
            }
            len if len > MAX_DIGITS => {
                Err(PhoneNumberValidationError::TooLong { max: MAX_DIGITS })
            }
            _ => Ok(Self(digits)),
        }
    }

    /// Canonical digits.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Short, non-reversible tag safe to put in log fields.
    pub fn fingerprint(&self) -> String {
        let hash = Sha256::digest(self.0.as_bytes());
        hex::encode(hash.get(..4).unwrap_or_default())
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneNumberValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}
