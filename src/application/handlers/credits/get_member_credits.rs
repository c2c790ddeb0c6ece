//! GetMemberCreditsHandler - Query handler for a member's credit balances.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{Actor, BookingError, MemberId, ServiceId};
use crate::ports::{BookingReader, Directory};

#[derive(Debug, Clone)]
pub struct GetMemberCreditsQuery {
    pub actor: Actor,
    pub member_id: MemberId,
}

/// Balance for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCredits {
    pub service_id: ServiceId,
    pub service_name: Option<String>,
    pub available_credits: i32,
}

/// Total across services plus the per-service breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberCreditsView {
    pub member_id: MemberId,
    pub total_credits: i64,
    pub credits_by_service: Vec<ServiceCredits>,
}

pub struct GetMemberCreditsHandler {
    reader: Arc<dyn BookingReader>,
    directory: Arc<dyn Directory>,
}

impl GetMemberCreditsHandler {
    pub fn new(reader: Arc<dyn BookingReader>, directory: Arc<dyn Directory>) -> Self {
        Self { reader, directory }
    }

    pub async fn handle(
        &self,
        query: GetMemberCreditsQuery,
    ) -> Result<MemberCreditsView, BookingError> {
        query.actor.ensure_can_act_for(&query.member_id)?;

        let credits = self.reader.list_credits_for_member(&query.member_id).await?;
        let mut credits_by_service = Vec::with_capacity(credits.len());
        for credit in &credits {
            let service_name = self
                .directory
                .find_service(&credit.service_id)
                .await?
                .map(|s| s.name);
            credits_by_service.push(ServiceCredits {
                service_id: credit.service_id,
                service_name,
                available_credits: credit.available_credits,
            });
        }

        Ok(MemberCreditsView {
            member_id: query.member_id,
            total_credits: credits.iter().map(|c| c.available_credits as i64).sum(),
            credits_by_service,
        })
    }
}
