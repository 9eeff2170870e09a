//! Show the caller's identity and effective permissions.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tabled::Tabled;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::output::{self, Card, OutputFormat};

#[derive(Debug, Deserialize, Serialize)]
struct PermissionsInfo {
    user_id: Uuid,
    roles: Vec<String>,
    permissions: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize, Tabled)]
struct PermissionRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Actions")]
    actions: String,
}

pub async fn execute(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info: PermissionsInfo = client.get("/me/permissions").await?;

    match format {
        OutputFormat::Table => {
            let roles = (!info.roles.is_empty()).then(|| info.roles.join(", "));
            Card::new("Identity")
                .field("User", info.user_id)
                .optional("Roles", roles)
                .print();
            println!();

            let rows: Vec<PermissionRow> = info
                .permissions
                .iter()
                .map(|(resource, actions)| PermissionRow {
                    resource: resource.clone(),
                    actions: actions.join(", "),
                })
                .collect();
            output::print_list(&rows, "permissions", format)?;
        }
        _ => output::print_item(&info, format)?,
    }

    Ok(())
}
