//! # addressledger-core
//!
//! Core business logic for `AddressLedger` postal address verification.
//!
//! This crate provides:
//! - **Result-code classification** - deliverable / not-deliverable verdicts
//!   from provider result codes, with PO-box blocking
//! - **Verification records** - `SQLite` storage of every attempt, with
//!   duplicate lookup so repeat addresses are not billed twice
//! - **Verification service** - dedupe, provider call, classification and
//!   persistence in one transaction
//! - **Configuration** - license key, endpoint and database location
//!
//! ## Example
//!
//! ```ignore
//! use addressledger_core::{AddressInput, Config, SqliteRecordStore, VerificationService};
//!
//! let config = Config::load(&Config::default_path()).await?;
//! let store = SqliteRecordStore::new(&config.database_path.to_string_lossy()).await?;
//! let service = VerificationService::new(store, config.client()?);
//!
//! let input = AddressInput::new("9500 Gilman Dr", "92093", "US").with_city("La Jolla");
//! let result = service.verify(&input).await?;
//! println!("valid: {} duplicate: {}", result.valid, result.duplicate);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod classify;
pub mod config;
mod error;
pub mod service;
pub mod store;
pub mod verification;

pub use classify::{CodeRules, Verdict, classify};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use service::{AddressProvider, VerificationService, verify_address};
pub use store::{
    DuplicateKey, RecordStore, SqliteRecordStore, SqliteTransaction, StoreTransaction,
};
pub use verification::{
    AddressInput, NormalizedAddress, RecordId, RecordUpdate, ValidationError, ValidationResult,
    VerificationRecord, VerificationResult, validate_input,
};
