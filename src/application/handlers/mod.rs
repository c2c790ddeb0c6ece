//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations. Commands
//! run in one booking transaction each; queries read without locks.

pub mod credits;
pub mod payment;
pub mod reservation;
pub mod scheduling;

#[cfg(test)]
pub(crate) mod test_support;

pub use credits::{GetMemberCreditsHandler, GetMemberCreditsQuery, MemberCreditsView, ServiceCredits};
pub use payment::{
    CheckoutSettings, ConfirmPaymentCommand, ConfirmPaymentHandler, ConfirmPaymentResult,
    CreatePaymentCommand, CreatePaymentHandler, CreatePaymentResult, ExpireStalePaymentsCommand,
    ExpireStalePaymentsHandler, ExpireStalePaymentsResult, GetPaymentHandler, GetPaymentQuery,
    HandleGatewayWebhookCommand, HandleGatewayWebhookHandler, HandleGatewayWebhookResult,
    ListPaymentsHandler, ListPaymentsQuery, MarkPaymentPaidCommand, MarkPaymentPaidHandler,
    MarkPaymentPaidResult, Settlement, UpdatePaymentCommand, UpdatePaymentHandler,
};
pub use reservation::{
    BookSessionCommand, BookSessionHandler, BookingConfirmation, CancelReservationCommand,
    CancelReservationHandler, CancelReservationResult, CreateReservationCommand,
    CreateReservationHandler, CreateReservationResult, GetReservationHandler,
    GetReservationQuery, ListMemberReservationsHandler, ListMemberReservationsQuery,
    ListReservationsHandler, ListReservationsQuery, UpdateReservationCommand,
    UpdateReservationHandler,
};
pub use scheduling::{
    AvailableSessionView, CancelSessionCommand, CancelSessionHandler, CancelSessionResult,
    ListAvailableSessionsHandler, ListAvailableSessionsQuery, RescheduleSessionCommand,
    RescheduleSessionHandler, RescheduleSessionResult, ScheduleSessionCommand,
    ScheduleSessionHandler, ScheduleSessionResult,
};
