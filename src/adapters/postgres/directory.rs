//! PostgreSQL implementation of the Directory port.
//!
//! Reads the studio's members, services, trainers and locations.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::rows::db_error;
use crate::domain::foundation::{DomainError, EmployeeId, LocationId, MemberId, ServiceId};
use crate::ports::{Directory, LocationRecord, MemberRecord, ServiceRecord, TrainerRecord};

pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PersonRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    location_id: Option<Uuid>,
}

impl PersonRow {
    fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: Uuid,
    name: String,
    price_cents: i64,
    location_id: Uuid,
}

#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    id: Uuid,
    name: String,
}

#[async_trait]
impl Directory for PostgresDirectory {
    async fn find_member(&self, id: &MemberId) -> Result<Option<MemberRecord>, DomainError> {
        let row: Option<PersonRow> = sqlx::query_as(
            "SELECT id, first_name, last_name, location_id FROM members WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find member", e))?;

        Ok(row.map(|row| MemberRecord {
            id: MemberId::from_uuid(row.id),
            display_name: row.display_name(),
        }))
    }

    async fn find_service(&self, id: &ServiceId) -> Result<Option<ServiceRecord>, DomainError> {
        let row: Option<ServiceRow> = sqlx::query_as(
            "SELECT id, name, price_cents, location_id FROM fitness_services WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find service", e))?;

        Ok(row.map(|row| ServiceRecord {
            id: ServiceId::from_uuid(row.id),
            name: row.name,
            price_cents: row.price_cents,
            location_id: LocationId::from_uuid(row.location_id),
        }))
    }

    async fn find_trainer(&self, id: &EmployeeId) -> Result<Option<TrainerRecord>, DomainError> {
        let row: Option<PersonRow> = sqlx::query_as(
            "SELECT id, first_name, last_name, location_id FROM employees WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find trainer", e))?;

        Ok(row.and_then(|row| {
            let location_id = row.location_id?;
            Some(TrainerRecord {
                id: EmployeeId::from_uuid(row.id),
                display_name: row.display_name(),
                location_id: LocationId::from_uuid(location_id),
            })
        }))
    }

    async fn find_location(&self, id: &LocationId) -> Result<Option<LocationRecord>, DomainError> {
        let row: Option<LocationRow> =
            sqlx::query_as("SELECT id, name FROM locations WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find location", e))?;

        Ok(row.map(|row| LocationRecord {
            id: LocationId::from_uuid(row.id),
            name: row.name,
        }))
    }
}
