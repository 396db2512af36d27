//! Global Address request parameters.

/// Option flag enabling delivery-line detail in the response.
pub const DELIVERY_LINES_OPTION: &str = "DeliveryLines:ON";

/// Response format requested from the service.
pub const RESPONSE_FORMAT: &str = "JSON";

/// A single-address lookup request.
///
/// The service accepts batches, but a request always carries exactly one
/// address. Absent optional fields are sent as empty strings; the service
/// misbehaves when `a2`/`a3` are missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalAddressRequest {
    /// Caller-assigned tracking token, echoed back by the service.
    pub tracking: String,
    /// Address line 1.
    pub address_1: String,
    /// Address line 2.
    pub address_2: Option<String>,
    /// Address line 3.
    pub address_3: Option<String>,
    /// City or locality.
    pub locality: Option<String>,
    /// State, province or other administrative area.
    pub administrative_area: Option<String>,
    /// Postal code.
    pub postal: String,
    /// Country name or ISO code.
    pub country: String,
}

impl GlobalAddressRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(
        tracking: impl Into<String>,
        address_1: impl Into<String>,
        postal: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            tracking: tracking.into(),
            address_1: address_1.into(),
            address_2: None,
            address_3: None,
            locality: None,
            administrative_area: None,
            postal: postal.into(),
            country: country.into(),
        }
    }

    /// Sets address line 2.
    #[must_use]
    pub fn with_address_2(mut self, address_2: impl Into<String>) -> Self {
        self.address_2 = Some(address_2.into());
        self
    }

    /// Sets address line 3.
    #[must_use]
    pub fn with_address_3(mut self, address_3: impl Into<String>) -> Self {
        self.address_3 = Some(address_3.into());
        self
    }

    /// Sets the locality.
    #[must_use]
    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = Some(locality.into());
        self
    }

    /// Sets the administrative area.
    #[must_use]
    pub fn with_administrative_area(mut self, area: impl Into<String>) -> Self {
        self.administrative_area = Some(area.into());
        self
    }

    /// Builds the query parameters in wire order.
    #[must_use]
    pub fn query_params<'a>(&'a self, license_key: &'a str) -> Vec<(&'static str, &'a str)> {
        vec![
            ("id", license_key),
            ("opt", DELIVERY_LINES_OPTION),
            ("format", RESPONSE_FORMAT),
            ("t", self.tracking.as_str()),
            ("a1", self.address_1.as_str()),
            ("loc", self.locality.as_deref().unwrap_or_default()),
            ("admarea", self.administrative_area.as_deref().unwrap_or_default()),
            ("postal", self.postal.as_str()),
            ("ctry", self.country.as_str()),
            ("a2", self.address_2.as_deref().unwrap_or_default()),
            ("a3", self.address_3.as_deref().unwrap_or_default()),
        ]
    }
}
