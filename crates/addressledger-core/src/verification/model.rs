//! Verification model types.

use addressledger_melissa::GlobalAddressRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a verification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl RecordId {
    /// Create a new record ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An address submitted for verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    /// Address line 1 (required).
    pub address_1: String,
    /// Address line 2.
    pub address_2: Option<String>,
    /// Address line 3.
    pub address_3: Option<String>,
    /// City.
    pub city: Option<String>,
    /// State or region.
    pub state: Option<String>,
    /// Postal code (required).
    pub postal: String,
    /// Country (required).
    pub country: String,
    /// Whether PO boxes are rejected. Defaults to true since the
    /// addresses being checked are shipping destinations.
    pub block_po_boxes: bool,
}

impl AddressInput {
    /// Create an input with the required fields; PO boxes are blocked.
    #[must_use]
    pub fn new(
        address_1: impl Into<String>,
        postal: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            address_1: address_1.into(),
            address_2: None,
            address_3: None,
            city: None,
            state: None,
            postal: postal.into(),
            country: country.into(),
            block_po_boxes: true,
        }
    }

    /// Sets address line 2. Empty values are treated as absent.
    #[must_use]
    pub fn with_address_2(mut self, address_2: impl Into<String>) -> Self {
        self.address_2 = non_empty(address_2.into());
        self
    }

    /// Sets address line 3. Empty values are treated as absent.
    #[must_use]
    pub fn with_address_3(mut self, address_3: impl Into<String>) -> Self {
        self.address_3 = non_empty(address_3.into());
        self
    }

    /// Sets the city. Empty values are treated as absent.
    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = non_empty(city.into());
        self
    }

    /// Sets the state. Empty values are treated as absent.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = non_empty(state.into());
        self
    }

    /// Accepts PO boxes as deliverable.
    #[must_use]
    pub const fn allow_po_boxes(mut self) -> Self {
        self.block_po_boxes = false;
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Provider-corrected address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAddress {
    /// Address line 1.
    pub address_1: String,
    /// Address line 2.
    pub address_2: String,
    /// Address line 3.
    pub address_3: String,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
    /// Postal code.
    pub postal: String,
    /// Country name.
    pub country: String,
    /// Latitude as reported by the provider.
    pub latitude: String,
    /// Longitude as reported by the provider.
    pub longitude: String,
}

impl From<&GlobalAddressRecord> for NormalizedAddress {
    fn from(record: &GlobalAddressRecord) -> Self {
        Self {
            address_1: record.address_line1.clone(),
            address_2: record.address_line2.clone(),
            address_3: record.address_line3.clone(),
            city: record.locality.clone(),
            state: record.administrative_area.clone(),
            postal: record.postal_code.clone(),
            country: record.country_name.clone(),
            latitude: record.latitude.clone(),
            longitude: record.longitude.clone(),
        }
    }
}

/// Results written back onto a record once the provider has answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    /// Raw response body.
    pub raw_response: String,
    /// Stored code string, including synthetic codes.
    pub codes: String,
    /// Derived verdict.
    pub good: bool,
    /// Formatted address string.
    pub formatted_address: String,
    /// Normalized address fields.
    pub normalized: NormalizedAddress,
}

/// A stored verification attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationRecord {
    /// Record identifier.
    pub id: RecordId,
    /// Address as submitted.
    pub input: AddressInput,
    /// Raw provider response, once received.
    pub raw_response: Option<String>,
    /// Stored code string, once classified.
    pub codes: Option<String>,
    /// Verdict, once classified.
    pub good: Option<bool>,
    /// Formatted address, once classified.
    pub formatted_address: Option<String>,
    /// Normalized address, once classified.
    pub normalized: Option<NormalizedAddress>,
    /// When the attempt was created.
    pub created_at: DateTime<Utc>,
    /// When results were last written.
    pub updated_at: Option<DateTime<Utc>>,
}

impl VerificationRecord {
    /// Returns true if the provider answered and a verdict was recorded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.good.is_some() && self.normalized.is_some()
    }

    /// Builds the caller-facing result, if the record is complete.
    #[must_use]
    pub fn to_result(&self, duplicate: bool) -> Option<VerificationResult> {
        Some(VerificationResult {
            address: self.normalized.clone()?,
            valid: self.good?,
            duplicate,
        })
    }
}

/// Outcome of a verification call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Normalized address fields.
    #[serde(flatten)]
    pub address: NormalizedAddress,
    /// Whether the address is deliverable.
    pub valid: bool,
    /// Whether this result was served from a prior identical record.
    pub duplicate: bool,
}
