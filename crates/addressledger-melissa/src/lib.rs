//! # addressledger-melissa
//!
//! Client for the Melissa Global Address verification web service.
//!
//! ## Features
//!
//! - **Request building**: wire parameters for a single-address lookup
//! - **Transport**: `reqwest` GET with a bounded timeout
//! - **Response parsing**: the batch-shaped `Records` envelope, first record only
//!
//! ## Quick Start
//!
//! ```ignore
//! use addressledger_melissa::{GlobalAddressRequest, GlobalAddressResponse, MelissaClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MelissaClient::new(
//!         "https://address.melissadata.net/v3/WEB/GlobalAddress/doGlobalAddress",
//!         "your_license_key",
//!     )?;
//!
//!     let request = GlobalAddressRequest::new("1", "123 Main St", "12345", "US")
//!         .with_locality("Springfield");
//!
//!     let response = client.send(&request).await?;
//!     if response.is_success() {
//!         let record = GlobalAddressResponse::first_record(&response.body)?;
//!         println!("{}: {}", record.formatted_address, record.results);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
pub mod request;
pub mod response;

pub use client::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, MelissaClient, RawResponse};
pub use error::{Error, Result};
pub use request::GlobalAddressRequest;
pub use response::{GlobalAddressRecord, GlobalAddressResponse, PO_BOX_ADDRESS_TYPE};
