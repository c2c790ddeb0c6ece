//! In-Memory Directory Adapter
//!
//! Holds members, services, trainers, and locations in memory.
//! Useful for testing and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, EmployeeId, LocationId, MemberId, ServiceId};
use crate::ports::{Directory, LocationRecord, MemberRecord, ServiceRecord, TrainerRecord};

#[derive(Debug, Default)]
struct DirectoryState {
    members: HashMap<MemberId, MemberRecord>,
    services: HashMap<ServiceId, ServiceRecord>,
    trainers: HashMap<EmployeeId, TrainerRecord>,
    locations: HashMap<LocationId, LocationRecord>,
}

/// In-memory studio directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_location(&self, name: &str) -> LocationRecord {
        let record = LocationRecord {
            id: LocationId::new(),
            name: name.to_string(),
        };
        self.state
            .write()
            .await
            .locations
            .insert(record.id, record.clone());
        record
    }

    pub async fn add_member(&self, display_name: &str) -> MemberRecord {
        let record = MemberRecord {
            id: MemberId::new(),
            display_name: display_name.to_string(),
        };
        self.state
            .write()
            .await
            .members
            .insert(record.id, record.clone());
        record
    }

    pub async fn add_service(
        &self,
        name: &str,
        price_cents: i64,
        location_id: LocationId,
    ) -> ServiceRecord {
        let record = ServiceRecord {
            id: ServiceId::new(),
            name: name.to_string(),
            price_cents,
            location_id,
        };
        self.state
            .write()
            .await
            .services
            .insert(record.id, record.clone());
        record
    }

    pub async fn add_trainer(&self, display_name: &str, location_id: LocationId) -> TrainerRecord {
        let record = TrainerRecord {
            id: EmployeeId::new(),
            display_name: display_name.to_string(),
            location_id,
        };
        self.state
            .write()
            .await
            .trainers
            .insert(record.id, record.clone());
        record
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn find_member(&self, id: &MemberId) -> Result<Option<MemberRecord>, DomainError> {
        Ok(self.state.read().await.members.get(id).cloned())
    }

    async fn find_service(&self, id: &ServiceId) -> Result<Option<ServiceRecord>, DomainError> {
        Ok(self.state.read().await.services.get(id).cloned())
    }

    async fn find_trainer(&self, id: &EmployeeId) -> Result<Option<TrainerRecord>, DomainError> {
        Ok(self.state.read().await.trainers.get(id).cloned())
    }

    async fn find_location(
        &self,
        id: &LocationId,
    ) -> Result<Option<LocationRecord>, DomainError> {
        Ok(self.state.read().await.locations.get(id).cloned())
    }
}
