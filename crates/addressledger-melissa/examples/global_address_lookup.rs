//! Example: one Global Address lookup
//!
//! This example demonstrates how to:
//! 1. Build a client for the Melissa Global Address endpoint
//! 2. Send a single address for verification
//! 3. Read the result codes and corrected address from the first record
//!
//! ## Prerequisites
//!
//! Set your Melissa license key:
//! ```bash
//! export MELISSA_LICENSE_KEY="your-license-key"
//! ```
//!
//! ## Running
//!
//! ```bash
//! cargo run -p addressledger-melissa --example global_address_lookup
//! ```

use addressledger_melissa::{DEFAULT_ENDPOINT, GlobalAddressRequest, GlobalAddressResponse, MelissaClient};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let license_key = env::var("MELISSA_LICENSE_KEY")?;

    let client = MelissaClient::new(DEFAULT_ENDPOINT, license_key)?;
    let request = GlobalAddressRequest::new("example-1", "9500 Gilman Dr", "92093", "US")
        .with_locality("La Jolla")
        .with_administrative_area("CA");

    println!("Sending lookup to {}", client.endpoint());
    let response = client.send(&request).await?;
    println!("HTTP {} {}", response.status, response.reason);
    if !response.is_success() {
        return Ok(());
    }

    let record = GlobalAddressResponse::first_record(&response.body)?;
    println!("Result codes:      {}", record.results);
    println!("Formatted address: {}", record.formatted_address);
    println!("Address type:      {}", record.address_type.as_deref().unwrap_or("-"));
    println!("PO box:            {}", record.is_po_box());

    Ok(())
}
