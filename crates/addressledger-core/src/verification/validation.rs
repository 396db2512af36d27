//! Address input validation.

use super::model::AddressInput;

/// Validation error for an address input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Address line 1 is empty.
    EmptyAddress1,
    /// Postal code is empty.
    EmptyPostal,
    /// Country is empty.
    EmptyCountry,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyAddress1 => "Address line 1 is required",
            Self::EmptyPostal => "Postal code is required",
            Self::EmptyCountry => "Country is required",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyAddress1 => "address_1",
            Self::EmptyPostal => "postal",
            Self::EmptyCountry => "country",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating an address input.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate an address input.
///
/// Returns `Ok(())` if valid, or `Err(Vec<ValidationError>)` with all errors.
///
/// # Errors
///
/// Returns validation errors if address line 1, postal code or country
/// is empty or whitespace.
pub fn validate_input(input: &AddressInput) -> ValidationResult {
    let mut errors = Vec::new();

    if input.address_1.trim().is_empty() {
        errors.push(ValidationError::EmptyAddress1);
    }
    if input.postal.trim().is_empty() {
        errors.push(ValidationError::EmptyPostal);
    }
    if input.country.trim().is_empty() {
        errors.push(ValidationError::EmptyCountry);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
