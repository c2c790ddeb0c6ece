//! Directory port for studio reference data.
//!
//! Members, fitness services, trainers, and locations are managed elsewhere;
//! the booking engine only reads them.

use crate::domain::foundation::{DomainError, EmployeeId, LocationId, MemberId, ServiceId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Read-only lookups into the studio directory.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_member(&self, id: &MemberId) -> Result<Option<MemberRecord>, DomainError>;

    async fn find_service(&self, id: &ServiceId) -> Result<Option<ServiceRecord>, DomainError>;

    async fn find_trainer(&self, id: &EmployeeId) -> Result<Option<TrainerRecord>, DomainError>;

    async fn find_location(&self, id: &LocationId)
        -> Result<Option<LocationRecord>, DomainError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: MemberId,
    pub display_name: String,
}

/// A bookable fitness service offered at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: ServiceId,
    pub name: String,
    /// Price of one credit in minor units.
    pub price_cents: i64,
    pub location_id: LocationId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerRecord {
    pub id: EmployeeId,
    pub display_name: String,
    pub location_id: LocationId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: LocationId,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_is_object_safe() {
        fn _accepts_dyn(_directory: &dyn Directory) {}
    }
}
