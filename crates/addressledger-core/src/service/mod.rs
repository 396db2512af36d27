//! Verification services.
//!
//! This module provides the service layer that ties the record store
//! to the address provider.

pub mod provider;
pub mod verify;

pub use provider::AddressProvider;
pub use verify::{VerificationService, verify_address};
