//! Global Address response envelope.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// `AddressType` value marking a PO box (US addresses only).
pub const PO_BOX_ADDRESS_TYPE: &str = "P";

/// Top-level response envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalAddressResponse {
    /// Tracking token echoed from the request.
    #[serde(default)]
    pub transmission_reference: Option<String>,
    /// Transmission-level result codes (e.g. license problems).
    #[serde(default)]
    pub transmission_results: Option<String>,
    /// Per-address results. Absent when the service rejected the transmission.
    #[serde(default)]
    pub records: Option<Vec<GlobalAddressRecord>>,
}

/// One verified address.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalAddressRecord {
    /// Fully formatted address.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub formatted_address: String,
    /// Comma-delimited result codes.
    #[serde(deserialize_with = "null_as_empty")]
    pub results: String,
    /// Normalized address line 1.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub address_line1: String,
    /// Normalized address line 2.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub address_line2: String,
    /// Normalized address line 3.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub address_line3: String,
    /// Normalized locality.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub locality: String,
    /// Normalized administrative area.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub administrative_area: String,
    /// Normalized postal code.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub postal_code: String,
    /// Country name.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub country_name: String,
    /// Latitude, as sent by the service.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub latitude: String,
    /// Longitude, as sent by the service.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub longitude: String,
    /// Address type indicator; `P` marks a PO box. US only.
    #[serde(default)]
    pub address_type: Option<String>,
}

/// The service sends `null` for some fields it has no value for.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl GlobalAddressRecord {
    /// Returns true if the service flagged this address as a PO box.
    #[must_use]
    pub fn is_po_box(&self) -> bool {
        self.address_type.as_deref() == Some(PO_BOX_ADDRESS_TYPE)
    }
}

impl GlobalAddressResponse {
    /// Parses a raw response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(Into::into)
    }

    /// Parses a raw response body and returns its first record.
    ///
    /// Requests carry a single address, so only the first result is consulted.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not JSON, has no `Records` key,
    /// or the list is empty.
    pub fn first_record(raw: &str) -> Result<GlobalAddressRecord> {
        let response = Self::parse(raw)?;
        let records = response.records.ok_or(Error::MissingRecords)?;
        records.into_iter().next().ok_or(Error::EmptyRecords)
    }
}
