//! PostgreSQL [`BookingStore`] using sqlx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{BookingStore, Business, BusinessCustomer, Profile, Service};
use crate::appointments::{Appointment, AppointmentPatch, AppointmentStatus, TimeWindow};
use crate::config::DatabaseConfig;
use crate::error::{Result, SalonError};

const APPOINTMENT_COLUMNS: &str = "id, business_id, service_id, user_id, business_customer_id, \
     staff_id, start_time, end_time, status, created_at, updated_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new connection pool.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// `UPDATE .. RETURNING`, optionally conditional on the stored status so
    /// the transition check and the write are one statement.
    async fn run_update(
        &self,
        id: Uuid,
        expected: Option<AppointmentStatus>,
        patch: &AppointmentPatch,
    ) -> Result<Option<Appointment>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE appointments SET updated_at = NOW()");

        if let Some(service_id) = patch.service_id {
            query.push(", service_id = ").push_bind(service_id);
        }
        if let Some(user_id) = patch.user_id {
            query.push(", user_id = ").push_bind(user_id);
        }
        if let Some(customer_id) = patch.business_customer_id {
            query.push(", business_customer_id = ").push_bind(customer_id);
        }
        if let Some(staff_id) = patch.staff_id {
            query.push(", staff_id = ").push_bind(staff_id);
        }
        if let Some(start) = patch.start_time {
            query.push(", start_time = ").push_bind(start);
        }
        if let Some(end) = patch.end_time {
            query.push(", end_time = ").push_bind(end);
        }
        if let Some(status) = patch.status {
            query.push(", status = ").push_bind(status.as_str());
        }

        query.push(" WHERE id = ").push_bind(id);
        if let Some(expected) = expected {
            query.push(" AND status = ").push_bind(expected.as_str());
        }
        query.push(" RETURNING ").push(APPOINTMENT_COLUMNS);

        let row = query
            .build_query_as::<AppointmentRow>()
            .fetch_optional(&self.pool)
            .await?;

        row.map(Appointment::try_from).transpose()
    }
}

/// Row shape of the `appointments` table.
#[derive(Debug, FromRow)]
struct AppointmentRow {
    id: Uuid,
    business_id: Uuid,
    service_id: Uuid,
    user_id: Option<Uuid>,
    business_customer_id: Option<Uuid>,
    staff_id: Option<Uuid>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = SalonError;

    fn try_from(row: AppointmentRow) -> Result<Self> {
        let status: AppointmentStatus = row.status.parse().map_err(|e| {
            SalonError::internal(format!("appointment {} has a corrupt status: {}", row.id, e))
        })?;

        Ok(Appointment {
            id: row.id,
            business_id: row.business_id,
            service_id: row.service_id,
            user_id: row.user_id,
            business_customer_id: row.business_customer_id,
            staff_id: row.staff_id,
            start_time: row.start_time,
            end_time: row.end_time,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_appointments(rows: Vec<AppointmentRow>) -> Result<Vec<Appointment>> {
    rows.into_iter().map(Appointment::try_from).collect()
}

#[async_trait]
impl BookingStore for PgStore {
    async fn find_business(&self, id: Uuid) -> Result<Option<Business>> {
        let row = sqlx::query_as::<_, Business>("SELECT id, name FROM businesses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_service(&self, id: Uuid) -> Result<Option<Service>> {
        let row = sqlx::query_as::<_, Service>(
            "SELECT id, business_id, name FROM services WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query_as::<_, Profile>("SELECT id, display_name FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_business_customer(&self, id: Uuid) -> Result<Option<BusinessCustomer>> {
        let row = sqlx::query_as::<_, BusinessCustomer>(
            "SELECT id, business_id, name FROM business_customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {} FROM appointments WHERE id = $1",
            APPOINTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Appointment::try_from).transpose()
    }

    async fn list_appointments(&self, business_id: Uuid) -> Result<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {} FROM appointments WHERE business_id = $1 ORDER BY start_time, created_at",
            APPOINTMENT_COLUMNS
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        into_appointments(rows)
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<Appointment> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            r#"
            INSERT INTO appointments ({columns})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {columns}
            "#,
            columns = APPOINTMENT_COLUMNS
        ))
        .bind(appointment.id)
        .bind(appointment.business_id)
        .bind(appointment.service_id)
        .bind(appointment.user_id)
        .bind(appointment.business_customer_id)
        .bind(appointment.staff_id)
        .bind(appointment.start_time)
        .bind(appointment.end_time)
        .bind(appointment.status.as_str())
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Appointment::try_from(row)
    }

    async fn update_appointment(&self, id: Uuid, patch: &AppointmentPatch) -> Result<Option<Appointment>> {
        if patch.is_empty() {
            return self.find_appointment(id).await;
        }
        self.run_update(id, None, patch).await
    }

    async fn update_appointment_from(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        patch: &AppointmentPatch,
    ) -> Result<Option<Appointment>> {
        self.run_update(id, Some(expected), patch).await
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_overlapping(&self, business_id: Uuid, window: &TimeWindow) -> Result<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            r#"
            SELECT {}
            FROM appointments
            WHERE business_id = $1
              AND status <> 'cancelled'
              AND start_time < $3
              AND $2 < end_time
            "#,
            APPOINTMENT_COLUMNS
        ))
        .bind(business_id)
        .bind(window.start())
        .bind(window.end())
        .fetch_all(&self.pool)
        .await?;

        into_appointments(rows)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
