//! Canonical phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CanonicalPhone`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains a character that is not a digit, separator or
    /// leading plus sign.
    #[error("phone number contains invalid character '{0}'")]
    InvalidCharacter(char),
    /// Fewer digits than any national number can have.
    #[error("phone number must have at least {min} digits")]
    TooShort {
        /// Minimum digit count.
        min: usize,
    },
    /// More digits than E.164 allows.
    #[error("phone number must have at most {max} digits")]
    TooLong {
        /// Maximum digit count (E.164).
        max: usize,
    },
    /// The configured default dialing code is not 1-3 digits.
    #[error("invalid default dialing code: {0}")]
    InvalidDialingCode(String),
}

/// A phone number normalized to a single international format:
/// `+<country><digits>`.
///
/// Every registration request derives its canonical phone exactly once and
/// reuses the value for every downstream call, so uniqueness checks and
/// stored values agree bit-for-bit.
///
/// ## Accepted inputs
///
/// - International: `+52 55 1234 5678`
/// - International with `00` prefix: `0052 55 1234 5678`
/// - National: `055 1234 5678` (trunk `0` stripped, default dialing code
///   prepended)
///
/// Separators (spaces, dashes, dots, parentheses) are removed.
///
/// ## Examples
///
/// ```
/// use reparto_core::CanonicalPhone;
///
/// let phone = CanonicalPhone::parse("+52 (55) 1234-5678", "52").unwrap();
/// assert_eq!(phone.as_str(), "+525512345678");
///
/// let national = CanonicalPhone::parse("055 1234 5678", "52").unwrap();
/// assert_eq!(national.as_str(), "+525512345678");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CanonicalPhone(String);

impl CanonicalPhone {
    /// Minimum number of digits (country code included).
    pub const MIN_DIGITS: usize = 7;

    /// Maximum number of digits (E.164 limit).
    pub const MAX_DIGITS: usize = 15;

    /// Parse a raw phone number into canonical `+<country><digits>` form.
    ///
    /// `default_dialing_code` supplies the country code for bare national
    /// numbers; it must be 1-3 digits.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains characters other
    /// than digits and separators, has too few or too many digits, or if
    /// the default dialing code is malformed.
    pub fn parse(raw: &str, default_dialing_code: &str) -> Result<Self, PhoneError> {
        if default_dialing_code.is_empty()
            || default_dialing_code.len() > 3
            || !default_dialing_code.chars().all(|c| c.is_ascii_digit())
        {
            return Err(PhoneError::InvalidDialingCode(
                default_dialing_code.to_owned(),
            ));
        }

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let international = trimmed.starts_with('+');
        let mut digits = String::with_capacity(trimmed.len());
        for (i, c) in trimmed.chars().enumerate() {
            match c {
                '0'..='9' => digits.push(c),
                '+' if i == 0 => {}
                ' ' | '-' | '.' | '(' | ')' => {}
                other => return Err(PhoneError::InvalidCharacter(other)),
            }
        }

        let national_number = if international {
            digits
        } else if let Some(rest) = digits.strip_prefix("00") {
            // "00" is the ITU international call prefix
            rest.to_owned()
        } else {
            let bare = digits.strip_prefix('0').unwrap_or(&digits);
            format!("{default_dialing_code}{bare}")
        };

        if national_number.len() < Self::MIN_DIGITS {
            return Err(PhoneError::TooShort {
                min: Self::MIN_DIGITS,
            });
        }
        if national_number.len() > Self::MAX_DIGITS {
            return Err(PhoneError::TooLong {
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(format!("+{national_number}")))
    }

    /// Returns the canonical phone as a string slice, including the leading
    /// plus sign.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `CanonicalPhone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CanonicalPhone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
