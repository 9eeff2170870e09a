//! Health check command.
//!
//! Queries the `/health` endpoint, which is not wrapped in the API envelope.

use anyhow::Result;
use clap::Args;

use crate::client::ApiClient;
use crate::output::{self, Card, OutputFormat};

#[derive(Args)]
pub struct HealthArgs {
    /// Exit non-zero when the server reports unhealthy
    #[arg(long)]
    strict: bool,
}

pub async fn execute(args: HealthArgs, client: &ApiClient, format: OutputFormat) -> Result<()> {
    let (http_status, health) = client.get_raw("/health").await?;
    let status = health
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    match format {
        OutputFormat::Table => {
            let mut card = Card::new("System Health")
                .field("Status", &status)
                .field("API URL", client.base_url());
            for (label, key) in [("Storage", "storage"), ("Version", "version"), ("Timestamp", "timestamp")] {
                if let Some(value) = health.get(key).and_then(|v| v.as_str()) {
                    card = card.field(label, value);
                }
            }
            card.print();

            if http_status.is_success() && status == "healthy" {
                output::print_success("All systems operational");
            } else {
                output::print_error(&format!("System status: {} ({})", status, http_status));
            }
        }
        _ => output::print_item(&health, format)?,
    }

    if args.strict && !http_status.is_success() {
        anyhow::bail!("server reported {}", http_status);
    }
    Ok(())
}
