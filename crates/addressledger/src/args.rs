use std::path::PathBuf;

use addressledger_core::{AddressInput, RecordId};

#[derive(clap::Parser)]
#[command(name = "addressledger")]
#[command(version)]
#[command(about = "Verify postal addresses and keep a ledger of every lookup")]
#[command(long_about = "
Verifies postal addresses against the Melissa Global Address service.

Every lookup is recorded in a local SQLite database. Repeating a lookup for
the same address line 1, address line 2, postal code and country is answered
from the database without calling the service again.

The license key is read from the config file or ADDRESSLEDGER_LICENSE_KEY.")]
pub struct Args {
    /// Path to the config file (default: user config directory)
    #[arg(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Verify an address and print the result as JSON
    Verify(VerifyArgs),

    /// Print a stored verification record as JSON
    Show {
        /// Record identifier
        #[arg(value_name = "ID", value_parser = record_id_value_parser)]
        id: RecordId,
    },

    /// List recent verification attempts, newest first
    History {
        /// Maximum number of records to list
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[derive(clap::Args)]
pub struct VerifyArgs {
    /// Address line 1
    #[arg(long = "address-1", value_name = "LINE")]
    pub address_1: String,

    /// Address line 2
    #[arg(long = "address-2", value_name = "LINE")]
    pub address_2: Option<String>,

    /// Address line 3
    #[arg(long = "address-3", value_name = "LINE")]
    pub address_3: Option<String>,

    /// City
    #[arg(long)]
    pub city: Option<String>,

    /// State or region
    #[arg(long)]
    pub state: Option<String>,

    /// Postal code
    #[arg(long)]
    pub postal: String,

    /// Country name or ISO code
    #[arg(long)]
    pub country: String,

    /// Accept PO boxes as deliverable
    #[arg(long, default_value_t = false)]
    pub allow_po_boxes: bool,
}

impl VerifyArgs {
    pub fn to_input(&self) -> AddressInput {
        let mut input = AddressInput::new(&self.address_1, &self.postal, &self.country);
        if let Some(line) = &self.address_2 {
            input = input.with_address_2(line);
        }
        if let Some(line) = &self.address_3 {
            input = input.with_address_3(line);
        }
        if let Some(city) = &self.city {
            input = input.with_city(city);
        }
        if let Some(state) = &self.state {
            input = input.with_state(state);
        }
        if self.allow_po_boxes {
            input = input.allow_po_boxes();
        }
        input
    }
}

fn record_id_value_parser(raw: &str) -> Result<RecordId, String> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(RecordId::new(id)),
        _ => Err(format!("'{raw}' is not a valid record id")),
    }
}
