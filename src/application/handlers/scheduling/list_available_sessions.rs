//! ListAvailableSessionsHandler - Query handler for bookable sessions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::foundation::{BookingError, LocationId, ServiceId};
use crate::domain::scheduling::Session;
use crate::ports::{BookingReader, Directory, SessionFilter};

#[derive(Debug, Clone, Default)]
pub struct ListAvailableSessionsQuery {
    pub service_id: Option<ServiceId>,
    pub date: Option<NaiveDate>,
}

/// Session card shown to members.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableSessionView {
    #[serde(flatten)]
    pub session: Session,
    pub current_bookings: i64,
    pub remaining_seats: i64,
    pub service_name: Option<String>,
    pub location_name: Option<String>,
    pub price_cents: Option<i64>,
}

/// Lists scheduled sessions with their current booking counts.
///
/// Counts are read without locks and may trail concurrent bookings.
pub struct ListAvailableSessionsHandler {
    reader: Arc<dyn BookingReader>,
    directory: Arc<dyn Directory>,
}

impl ListAvailableSessionsHandler {
    pub fn new(reader: Arc<dyn BookingReader>, directory: Arc<dyn Directory>) -> Self {
        Self { reader, directory }
    }

    pub async fn handle(
        &self,
        query: ListAvailableSessionsQuery,
    ) -> Result<Vec<AvailableSessionView>, BookingError> {
        let filter = SessionFilter {
            service_id: query.service_id,
            date: query.date,
        };
        let available = self.reader.list_available_sessions(&filter).await?;

        let mut services: HashMap<ServiceId, Option<(String, i64)>> = HashMap::new();
        let mut locations: HashMap<LocationId, Option<String>> = HashMap::new();
        let mut views = Vec::with_capacity(available.len());

        for entry in available {
            let session = entry.session;
            if !services.contains_key(&session.service_id) {
                let service = self
                    .directory
                    .find_service(&session.service_id)
                    .await?
                    .map(|s| (s.name, s.price_cents));
                services.insert(session.service_id, service);
            }
            if !locations.contains_key(&session.location_id) {
                let location = self
                    .directory
                    .find_location(&session.location_id)
                    .await?
                    .map(|l| l.name);
                locations.insert(session.location_id, location);
            }

            let service = services.get(&session.service_id).cloned().flatten();
            let location_name = locations.get(&session.location_id).cloned().flatten();
            views.push(AvailableSessionView {
                current_bookings: entry.active_count,
                remaining_seats: session.remaining_seats(entry.active_count),
                service_name: service.as_ref().map(|(name, _)| name.clone()),
                price_cents: service.map(|(_, price)| price),
                location_name,
                session,
            });
        }

        Ok(views)
    }
}
