//! Payment domain module.
//!
//! Credit purchases and their fulfilment state.
//!
//! # Module Structure
//!
//! - `aggregate` - Payment aggregate, staff edits, checkout line
//! - `status` - PaymentStatus state machine

mod aggregate;
mod status;

pub use aggregate::{
    normalize_currency, CheckoutLine, Payment, PaymentTerms, DEFAULT_CURRENCY, MAX_QUANTITY,
};
pub use status::PaymentStatus;
