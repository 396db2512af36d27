//! Address verification orchestration.
//!
//! One call runs duplicate lookup, record creation, the provider exchange,
//! classification and the result update inside a single store transaction.
//! The transaction stays open across the provider call.

use addressledger_melissa::{GlobalAddressRequest, GlobalAddressResponse};
use tracing::{debug, info, warn};

use super::provider::AddressProvider;
use crate::classify::CodeRules;
use crate::store::{DuplicateKey, RecordStore, StoreTransaction};
use crate::verification::{
    AddressInput, NormalizedAddress, RecordId, RecordUpdate, VerificationResult, validate_input,
};
use crate::{Error, Result};

/// How a transaction ends after an attempt that did not error.
enum Outcome {
    /// Served from a prior record; nothing was written.
    Duplicate(VerificationResult),
    /// Provider answered and results were stored.
    Verified(VerificationResult),
    /// The attempt is kept for audit, but the call still fails.
    Kept(Error),
}

/// Verifies addresses against a provider, caching results in a record store.
#[derive(Debug, Clone)]
pub struct VerificationService<S, P> {
    store: S,
    provider: P,
    rules: CodeRules<'static>,
}

impl<S, P> VerificationService<S, P>
where
    S: RecordStore,
    P: AddressProvider,
{
    /// Creates a service using the Melissa code vocabulary.
    #[must_use]
    pub const fn new(store: S, provider: P) -> Self {
        Self {
            store,
            provider,
            rules: CodeRules::MELISSA,
        }
    }

    /// Replaces the code vocabulary.
    #[must_use]
    pub const fn with_rules(mut self, rules: CodeRules<'static>) -> Self {
        self.rules = rules;
        self
    }

    /// Returns the record store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Verifies an address.
    ///
    /// Returns a stored result with `duplicate` set if an identical address
    /// (line 1, line 2, postal code, country) was verified before; otherwise
    /// calls the provider.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if required fields are empty; nothing is touched.
    /// - [`Error::Persistence`] / [`Error::Database`] if the store fails.
    ///   A result update that is not applied still commits the attempt.
    /// - [`Error::Transport`] if the provider exchange fails or is not 2xx.
    /// - [`Error::ProviderFormat`] if the response lacks the expected records.
    ///   The attempt and raw response are committed before this is returned.
    pub async fn verify(&self, input: &AddressInput) -> Result<VerificationResult> {
        validate_input(input).map_err(Error::Validation)?;

        let mut tx = self.store.begin().await?;

        match self.attempt(&mut tx, input).await {
            Ok(Outcome::Duplicate(result)) => {
                tx.rollback().await?;
                Ok(result)
            }
            Ok(Outcome::Verified(result)) => {
                tx.commit().await?;
                Ok(result)
            }
            Ok(Outcome::Kept(err)) => {
                tx.commit().await?;
                Err(err)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed verification also failed");
                }
                Err(err)
            }
        }
    }

    async fn attempt(
        &self,
        tx: &mut S::Transaction,
        input: &AddressInput,
    ) -> Result<Outcome> {
        if let Some(existing) = tx.find_duplicate(&DuplicateKey::from(input)).await? {
            info!(record_id = %existing.id, "Serving verification from duplicate record");
            let result = existing.to_result(true).ok_or_else(|| {
                Error::Persistence(format!("Duplicate record {} has no results", existing.id))
            })?;
            return Ok(Outcome::Duplicate(result));
        }

        let record_id = tx
            .create(input)
            .await?
            .ok_or_else(|| Error::Persistence("Failed to create record in database.".into()))?;

        let request = build_request(record_id, input);
        let response = self.provider.send(&request).await?;
        if !response.is_success() {
            warn!(record_id = %record_id, status = response.status, "Address provider returned an error status");
            return Err(Error::Transport {
                status: Some(response.status),
                reason: response.reason,
            });
        }

        let record = match GlobalAddressResponse::first_record(&response.body) {
            Ok(record) => record,
            Err(err) => {
                warn!(record_id = %record_id, error = %err, "Address provider response is unusable");
                if !tx.record_raw_response(record_id, &response.body).await? {
                    return Err(Error::Persistence(format!(
                        "Failed to store raw response for address verification {record_id}"
                    )));
                }
                return Ok(Outcome::Kept(Error::ProviderFormat {
                    record_id,
                    reason: err.to_string(),
                }));
            }
        };

        let verdict = self.rules.classify(
            &record.results,
            record.address_type.as_deref(),
            input.block_po_boxes,
        );
        debug!(record_id = %record_id, codes = %verdict.codes, good = verdict.good, "Classified result codes");

        let update = RecordUpdate {
            raw_response: response.body,
            codes: verdict.codes,
            good: verdict.good,
            formatted_address: record.formatted_address.clone(),
            normalized: NormalizedAddress::from(&record),
        };

        if !tx.update_results(record_id, &update).await? {
            warn!(record_id = %record_id, "Result update was not applied");
            return Ok(Outcome::Kept(Error::Persistence(format!(
                "Failed to update results for address verification {record_id}"
            ))));
        }

        info!(record_id = %record_id, valid = update.good, "Address verified");
        Ok(Outcome::Verified(VerificationResult {
            address: update.normalized,
            valid: update.good,
            duplicate: false,
        }))
    }
}

/// Verifies one address with borrowed collaborators.
///
/// # Errors
///
/// See [`VerificationService::verify`].
pub async fn verify_address<S, P>(
    store: &S,
    provider: &P,
    input: &AddressInput,
) -> Result<VerificationResult>
where
    S: RecordStore,
    P: AddressProvider,
{
    VerificationService::new(store, provider).verify(input).await
}

fn build_request(record_id: RecordId, input: &AddressInput) -> GlobalAddressRequest {
    GlobalAddressRequest {
        tracking: record_id.to_string(),
        address_1: input.address_1.clone(),
        address_2: input.address_2.clone(),
        address_3: input.address_3.clone(),
        locality: input.city.clone(),
        administrative_area: input.state.clone(),
        postal: input.postal.clone(),
        country: input.country.clone(),
    }
}
