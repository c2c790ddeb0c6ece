//! HTTP middleware for axum.
//!
//! - `actor` - Resolves the calling identity from proxy headers

pub mod actor;

pub use actor::{
    actor_middleware, resolve_actor, ActorRejection, RequireActor, EMPLOYEE_ID_HEADER,
    MEMBER_ID_HEADER, ROLES_HEADER,
};
