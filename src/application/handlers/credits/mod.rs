//! Credit balance queries.

mod get_member_credits;

pub use get_member_credits::{
    GetMemberCreditsHandler, GetMemberCreditsQuery, MemberCreditsView, ServiceCredits,
};
