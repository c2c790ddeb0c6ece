//! Reservation engine handlers.

mod book_session;
mod cancel_reservation;
mod create_reservation;
mod get_reservation;
mod seat;
mod update_reservation;

pub use book_session::{BookSessionCommand, BookSessionHandler, BookingConfirmation};
pub use cancel_reservation::{
    CancelReservationCommand, CancelReservationHandler, CancelReservationResult,
};
pub use create_reservation::{
    CreateReservationCommand, CreateReservationHandler, CreateReservationResult,
};
pub use get_reservation::{
    GetReservationHandler, GetReservationQuery, ListMemberReservationsHandler,
    ListMemberReservationsQuery, ListReservationsHandler, ListReservationsQuery,
};
pub use update_reservation::{UpdateReservationCommand, UpdateReservationHandler};
