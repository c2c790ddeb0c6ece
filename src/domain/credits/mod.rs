//! Credits domain module.
//!
//! Per (member, service) balances that members spend to book sessions.

mod aggregate;

pub use aggregate::MemberCredit;
