//! Verification record storage.
//!
//! Every store operation for one verification runs inside a single
//! [`StoreTransaction`]. Callers end it with [`StoreTransaction::commit`] or
//! [`StoreTransaction::rollback`]; both consume the transaction, and dropping
//! it without either rolls back.
//!
//! Transactions are serialized: a second verification waits for the first
//! to commit or roll back.

mod repository;

use std::future::Future;

pub use repository::{DEFAULT_BUSY_TIMEOUT, SqliteRecordStore, SqliteTransaction};

use crate::Result;
use crate::verification::{AddressInput, RecordId, RecordUpdate, VerificationRecord};

/// Fields that identify a repeat request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateKey<'a> {
    /// Address line 1.
    pub address_1: &'a str,
    /// Address line 2; absent matches absent only.
    pub address_2: Option<&'a str>,
    /// Postal code.
    pub postal: &'a str,
    /// Country.
    pub country: &'a str,
}

impl<'a> From<&'a AddressInput> for DuplicateKey<'a> {
    fn from(input: &'a AddressInput) -> Self {
        Self {
            address_1: &input.address_1,
            address_2: input.address_2.as_deref(),
            postal: &input.postal,
            country: &input.country,
        }
    }
}

/// A store that can open transactions.
pub trait RecordStore {
    /// Transaction type handed out by [`RecordStore::begin`].
    type Transaction: StoreTransaction;

    /// Opens a transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Transaction>> + Send;
}

impl<S: RecordStore> RecordStore for &S {
    type Transaction = S::Transaction;

    fn begin(&self) -> impl Future<Output = Result<Self::Transaction>> + Send {
        (**self).begin()
    }
}

/// Store operations available inside one transaction.
pub trait StoreTransaction: Send {
    /// Finds the most recent completed record matching `key`.
    ///
    /// Attempts that never received a verdict are not matched.
    fn find_duplicate(
        &mut self,
        key: &DuplicateKey<'_>,
    ) -> impl Future<Output = Result<Option<VerificationRecord>>> + Send;

    /// Creates a record holding only the submitted input.
    ///
    /// Returns `None` if the store did not produce an identifier.
    fn create(
        &mut self,
        input: &AddressInput,
    ) -> impl Future<Output = Result<Option<RecordId>>> + Send;

    /// Writes provider results onto a record. Returns false if no record was updated.
    fn update_results(
        &mut self,
        id: RecordId,
        update: &RecordUpdate,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Writes the raw provider body onto a record whose response could not
    /// be interpreted. Returns false if no record was updated.
    fn record_raw_response(
        &mut self,
        id: RecordId,
        raw_response: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Commits all work done in this transaction.
    fn commit(self) -> impl Future<Output = Result<()>> + Send;

    /// Discards all work done in this transaction.
    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}
