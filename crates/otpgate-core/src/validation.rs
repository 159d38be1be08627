//! Client-side checks for mobile numbers and OTP codes.

use std::fmt;

/// Number of digits in a mobile number.
pub const MOBILE_LENGTH: usize = 10;

/// Reasons a mobile number or OTP fails client-side validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MobileEmpty,
    MobileNotNumeric,
    MobileWrongLength,
    MobileInvalidPrefix,
    MobileNotRegistered,
    OtpEmpty,
    OtpNotNumeric,
    OtpWrongLength,
    OtpIncomplete,
}

impl ValidationError {
    pub fn message(self) -> &'static str {
        match self {
            ValidationError::MobileEmpty => "Please enter your mobile number",
            ValidationError::MobileNotNumeric => "Mobile number must contain only digits",
            ValidationError::MobileWrongLength => "Mobile number must be exactly 10 digits",
            ValidationError::MobileInvalidPrefix => "Please enter a valid Indian mobile number",
            ValidationError::MobileNotRegistered => {
                "Invalid number. Please use a registered number."
            }
            ValidationError::OtpEmpty => "Please enter the OTP",
            ValidationError::OtpNotNumeric => "OTP must contain only numbers",
            ValidationError::OtpWrongLength => "OTP must be exactly 4 digits",
            ValidationError::OtpIncomplete => "Please enter all 4 digits of OTP",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Validates a 10-digit Indian mobile number.
///
/// Checks run in order: empty, digits only, length, leading digit 6-9.
///
/// # Errors
/// Returns the first failed check.
pub fn validate_mobile(mobile: &str) -> Result<(), ValidationError> {
    if mobile.is_empty() {
        return Err(ValidationError::MobileEmpty);
    }
    if !mobile.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::MobileNotNumeric);
    }
    if mobile.len() != MOBILE_LENGTH {
        return Err(ValidationError::MobileWrongLength);
    }
    if !matches!(mobile.as_bytes()[0], b'6'..=b'9') {
        return Err(ValidationError::MobileInvalidPrefix);
    }
    Ok(())
}

/// Validates a complete OTP code.
///
/// # Errors
/// Returns the first failed check.
pub fn validate_otp(otp: &str) -> Result<(), ValidationError> {
    if otp.is_empty() {
        return Err(ValidationError::OtpEmpty);
    }
    if !otp.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::OtpNotNumeric);
    }
    if otp.len() != crate::otp::OTP_LENGTH {
        return Err(ValidationError::OtpWrongLength);
    }
    Ok(())
}

/// Strips non-digits and caps the result at 10 digits.
pub fn sanitize_mobile_input(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_digit)
        .take(MOBILE_LENGTH)
        .collect()
}

/// Formats a 10-digit number for display as `+91 98765 43210`.
///
/// Anything that isn't exactly 10 ASCII digits is returned unchanged.
pub fn format_mobile(mobile: &str, country_code: &str) -> String {
    if mobile.len() == MOBILE_LENGTH && mobile.chars().all(|c| c.is_ascii_digit()) {
        let (head, tail) = mobile.split_at(5);
        format!("{country_code} {head} {tail}")
    } else {
        mobile.to_string()
    }
}

/// Masks the middle of a number for logs: `98******10`.
pub fn mask_mobile(mobile: &str) -> String {
    let chars: Vec<char> = mobile.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 4))
}
