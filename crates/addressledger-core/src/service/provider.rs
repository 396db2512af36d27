//! Address provider abstraction.

use std::future::Future;

use addressledger_melissa::{GlobalAddressRequest, MelissaClient, RawResponse};

use crate::Result;

/// Sends verification requests to an address provider.
pub trait AddressProvider {
    /// Sends one request and returns the completed exchange.
    ///
    /// A non-success HTTP status is returned as a [`RawResponse`]; only
    /// exchanges that never completed are errors.
    fn send(
        &self,
        request: &GlobalAddressRequest,
    ) -> impl Future<Output = Result<RawResponse>> + Send;
}

impl AddressProvider for MelissaClient {
    async fn send(&self, request: &GlobalAddressRequest) -> Result<RawResponse> {
        Ok(Self::send(self, request).await?)
    }
}

impl<P: AddressProvider> AddressProvider for &P {
    fn send(
        &self,
        request: &GlobalAddressRequest,
    ) -> impl Future<Output = Result<RawResponse>> + Send {
        (**self).send(request)
    }
}
