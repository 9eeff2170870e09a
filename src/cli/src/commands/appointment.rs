//! Appointment management commands.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::output::{self, status_badge, Card, OutputFormat};

#[derive(Subcommand)]
pub enum AppointmentCommands {
    /// List a business's appointments
    List {
        /// Business ID
        business_id: Uuid,
    },

    /// Book an appointment (created as pending)
    Create {
        /// Business ID
        business_id: Uuid,

        /// Service ID; must belong to the business
        #[arg(long)]
        service: Uuid,

        /// Registered customer (user profile) ID
        #[arg(long, conflicts_with = "customer", required_unless_present = "customer")]
        user: Option<Uuid>,

        /// Business-customer ID (walk-in record)
        #[arg(long)]
        customer: Option<Uuid>,

        /// Staff member ID
        #[arg(long)]
        staff: Option<Uuid>,

        /// Start time (RFC 3339)
        #[arg(long)]
        start: DateTime<Utc>,

        /// End time (RFC 3339), after start
        #[arg(long)]
        end: DateTime<Utc>,
    },

    /// Show appointment details
    Get {
        /// Appointment ID
        id: Uuid,
    },

    /// Update appointment fields
    Update {
        /// Appointment ID
        id: Uuid,

        #[arg(long)]
        service: Option<Uuid>,

        #[arg(long)]
        staff: Option<Uuid>,

        #[arg(long)]
        start: Option<DateTime<Utc>>,

        #[arg(long)]
        end: Option<DateTime<Utc>>,

        /// Set the status directly (pending, confirmed, completed, cancelled)
        #[arg(long)]
        status: Option<String>,
    },

    /// Approve a pending appointment
    Approve {
        /// Appointment ID
        id: Uuid,
    },

    /// Cancel an appointment
    Cancel {
        /// Appointment ID
        id: Uuid,
    },

    /// Move an appointment to a new window; it returns to pending
    Reschedule {
        /// Appointment ID
        id: Uuid,

        #[arg(long)]
        start: DateTime<Utc>,

        #[arg(long)]
        end: DateTime<Utc>,
    },

    /// Delete an appointment
    Delete {
        /// Appointment ID
        id: Uuid,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AppointmentInfo {
    pub id: Uuid,
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub user_id: Option<Uuid>,
    pub business_customer_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentInfo {
    fn customer(&self) -> String {
        match (self.user_id, self.business_customer_id) {
            (Some(user), _) => format!("user {}", short_id(user)),
            (None, Some(customer)) => format!("customer {}", short_id(customer)),
            (None, None) => "-".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct AppointmentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Staff")]
    staff: String,
}

impl From<&AppointmentInfo> for AppointmentRow {
    fn from(a: &AppointmentInfo) -> Self {
        Self {
            id: a.id.to_string(),
            status: a.status.clone(),
            start: a.start_time.format("%Y-%m-%d %H:%M").to_string(),
            end: a.end_time.format("%H:%M").to_string(),
            customer: a.customer(),
            staff: a.staff_id.map(short_id).unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

#[derive(Debug, Serialize)]
struct CreateBody {
    service_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    business_customer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    staff_id: Option<Uuid>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize)]
struct UpdateBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    service_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    staff_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<DateTime<Utc>>,
}

impl StatusBody {
    fn action(action: &'static str) -> Self {
        Self {
            action,
            start_time: None,
            end_time: None,
        }
    }
}

fn business_appointments_path(business_id: Uuid) -> String {
    format!("/businesses/{}/appointments", business_id)
}

fn appointment_path(id: Uuid) -> String {
    format!("/appointments/{}", id)
}

fn status_path(id: Uuid) -> String {
    format!("/appointments/{}/status", id)
}

fn print_appointment(a: &AppointmentInfo, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            Card::new(format!("Appointment {}", a.id))
                .field("Status", status_badge(&a.status))
                .field("Business", a.business_id)
                .field("Service", a.service_id)
                .field("Customer", a.customer())
                .optional("Staff", a.staff_id)
                .field("Start", a.start_time.to_rfc3339())
                .field("End", a.end_time.to_rfc3339())
                .field("Updated", a.updated_at.to_rfc3339())
                .print();
            Ok(())
        }
        _ => output::print_item(a, format),
    }
}

async fn change_status(
    client: &ApiClient,
    id: Uuid,
    body: StatusBody,
    done: &str,
    format: OutputFormat,
) -> Result<()> {
    let updated: AppointmentInfo = client.patch(&status_path(id), &body).await?;
    match format {
        OutputFormat::Table => {
            output::print_success(&format!(
                "Appointment {} {} (now {})",
                id,
                done,
                status_badge(&updated.status)
            ))
        }
        _ => output::print_item(&updated, format)?,
    }
    Ok(())
}

pub async fn execute(cmd: AppointmentCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        AppointmentCommands::List { business_id } => {
            let appointments: Vec<AppointmentInfo> =
                client.get(&business_appointments_path(business_id)).await?;
            match format {
                OutputFormat::Table => {
                    let rows: Vec<AppointmentRow> = appointments.iter().map(AppointmentRow::from).collect();
                    output::print_list(&rows, "appointments", format)?;
                }
                _ => output::print_item(&appointments, format)?,
            }
        }

        AppointmentCommands::Create {
            business_id,
            service,
            user,
            customer,
            staff,
            start,
            end,
        } => {
            let body = CreateBody {
                service_id: service,
                user_id: user,
                business_customer_id: customer,
                staff_id: staff,
                start_time: start,
                end_time: end,
            };
            let created: AppointmentInfo = client
                .post(&business_appointments_path(business_id), &body)
                .await?;

            match format {
                OutputFormat::Table => {
                    output::print_success(&format!("Appointment booked: {}", created.id));
                    Card::new("Booking")
                        .field("Status", status_badge(&created.status))
                        .field("Start", created.start_time.to_rfc3339())
                        .field("End", created.end_time.to_rfc3339())
                        .print();
                }
                _ => output::print_item(&created, format)?,
            }
        }

        AppointmentCommands::Get { id } => {
            let appointment: AppointmentInfo = client.get(&appointment_path(id)).await?;
            print_appointment(&appointment, format)?;
        }

        AppointmentCommands::Update {
            id,
            service,
            staff,
            start,
            end,
            status,
        } => {
            let body = UpdateBody {
                service_id: service,
                staff_id: staff,
                start_time: start,
                end_time: end,
                status,
            };
            let updated: AppointmentInfo = client.put(&appointment_path(id), &body).await?;
            match format {
                OutputFormat::Table => output::print_success(&format!("Appointment {} updated", id)),
                _ => output::print_item(&updated, format)?,
            }
        }

        AppointmentCommands::Approve { id } => {
            change_status(client, id, StatusBody::action("approve"), "approved", format).await?;
        }

        AppointmentCommands::Cancel { id } => {
            change_status(client, id, StatusBody::action("cancel"), "cancelled", format).await?;
        }

        AppointmentCommands::Reschedule { id, start, end } => {
            let body = StatusBody {
                action: "reschedule",
                start_time: Some(start),
                end_time: Some(end),
            };
            change_status(client, id, body, "rescheduled", format).await?;
        }

        AppointmentCommands::Delete { id, force } => {
            if !force {
                output::print_info(&format!(
                    "This will permanently delete appointment {}. Use --force to confirm.",
                    id
                ));
                return Ok(());
            }

            client.delete(&appointment_path(id)).await?;
            output::print_success(&format!("Appointment {} deleted", id));
        }
    }

    Ok(())
}
