//! Address verification data model.
//!
//! Provides the caller-facing input and result types, the stored
//! verification record, and input validation.

mod model;
mod validation;

pub use model::{
    AddressInput, NormalizedAddress, RecordId, RecordUpdate, VerificationRecord,
    VerificationResult,
};
pub use validation::{ValidationError, ValidationResult, validate_input};
