//! Identity middleware and extractor for axum.
//!
//! Authentication happens upstream. The proxy in front of the service sets:
//!
//! - `X-Member-Id` - UUID of the calling member, or
//! - `X-Employee-Id` - UUID of the calling staff account
//! - `X-Roles` - comma-separated roles of the staff account (`admin`, `employee`)
//!
//! ```text
//! Request → actor_middleware → injects Actor into extensions
//!                                      ↓
//!                              Handler → RequireActor extractor reads from extensions
//! ```
//!
//! Requests without identity headers pass through untouched so that the
//! webhook and health endpoints stay reachable; handlers that need an actor
//! use `RequireActor`.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::{Actor, EmployeeId, MemberId};

use super::super::error::ErrorResponse;

pub const MEMBER_ID_HEADER: &str = "x-member-id";
pub const EMPLOYEE_ID_HEADER: &str = "x-employee-id";
pub const ROLES_HEADER: &str = "x-roles";

/// Identity middleware.
///
/// Malformed identity headers are rejected with 401 before reaching any
/// handler.
pub async fn actor_middleware(mut request: Request, next: Next) -> Response {
    match resolve_actor(request.headers()) {
        Ok(Some(actor)) => {
            request.extensions_mut().insert(actor);
            next.run(request).await
        }
        Ok(None) => next.run(request).await,
        Err(rejection) => rejection.into_response(),
    }
}

/// Read the acting identity from proxy headers.
///
/// Returns `Ok(None)` when no identity header is present.
pub fn resolve_actor(headers: &HeaderMap) -> Result<Option<Actor>, ActorRejection> {
    let member = header_str(headers, MEMBER_ID_HEADER)?;
    let employee = header_str(headers, EMPLOYEE_ID_HEADER)?;

    match (member, employee) {
        (None, None) => Ok(None),
        (Some(_), Some(_)) => Err(ActorRejection::Ambiguous),
        (Some(raw), None) => {
            let member_id: MemberId = raw
                .parse()
                .map_err(|_| ActorRejection::Malformed(MEMBER_ID_HEADER))?;
            Ok(Some(Actor::member(member_id)))
        }
        (None, Some(raw)) => {
            let employee_id: EmployeeId = raw
                .parse()
                .map_err(|_| ActorRejection::Malformed(EMPLOYEE_ID_HEADER))?;
            let is_admin = header_str(headers, ROLES_HEADER)?
                .map(|roles| {
                    roles
                        .split(',')
                        .any(|role| role.trim().eq_ignore_ascii_case("admin"))
                })
                .unwrap_or(false);

            Ok(Some(if is_admin {
                Actor::admin(employee_id)
            } else {
                Actor::employee(employee_id)
            }))
        }
    }
}

fn header_str<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<Option<&'a str>, ActorRejection> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|s| Some(s.trim()))
            .map_err(|_| ActorRejection::Malformed(name)),
    }
}

/// Extractor that requires an identified caller.
///
/// # Example
///
/// ```ignore
/// async fn my_handler(RequireActor(actor): RequireActor) -> impl IntoResponse {
///     format!("{:?}", actor.member_id())
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireActor(pub Actor);

impl<S> axum::extract::FromRequestParts<S> for RequireActor
where
    S: Send + Sync,
{
    type Rejection = ActorRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            parts
                .extensions
                .get::<Actor>()
                .copied()
                .map(RequireActor)
                .ok_or(ActorRejection::Unauthenticated)
        })
    }
}

/// Rejection type for identity failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorRejection {
    /// No identity header was provided.
    Unauthenticated,
    /// Header present but not a valid value.
    Malformed(&'static str),
    /// Both a member and an employee header were provided.
    Ambiguous,
}

impl IntoResponse for ActorRejection {
    fn into_response(self) -> Response {
        let message = match self {
            ActorRejection::Unauthenticated => "Authentication required".to_string(),
            ActorRejection::Malformed(header) => format!("Malformed {} header", header),
            ActorRejection::Ambiguous => {
                "Request carries both member and employee identity".to_string()
            }
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("UNAUTHENTICATED", message)),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use crate::domain::foundation::StaffRole;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn no_headers_means_anonymous() {
        assert_eq!(resolve_actor(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn member_header_resolves_member() {
        let member_id = MemberId::new();
        let actor = resolve_actor(&headers(&[(MEMBER_ID_HEADER, &member_id.to_string())]))
            .unwrap()
            .unwrap();
        assert_eq!(actor, Actor::member(member_id));
    }

    #[test]
    fn employee_without_roles_is_plain_staff() {
        let employee_id = EmployeeId::new();
        let actor = resolve_actor(&headers(&[(EMPLOYEE_ID_HEADER, &employee_id.to_string())]))
            .unwrap()
            .unwrap();
        assert_eq!(
            actor,
            Actor::Staff {
                employee_id,
                role: StaffRole::Employee
            }
        );
    }

    #[test]
    fn admin_role_is_case_insensitive() {
        let employee_id = EmployeeId::new();
        let actor = resolve_actor(&headers(&[
            (EMPLOYEE_ID_HEADER, &employee_id.to_string()),
            (ROLES_HEADER, "employee, ADMIN"),
        ]))
        .unwrap()
        .unwrap();
        assert!(actor.is_admin());
    }

    #[test]
    fn malformed_id_is_rejected() {
        assert_eq!(
            resolve_actor(&headers(&[(MEMBER_ID_HEADER, "not-a-uuid")])),
            Err(ActorRejection::Malformed(MEMBER_ID_HEADER))
        );
    }

    #[test]
    fn both_identities_are_rejected() {
        let result = resolve_actor(&headers(&[
            (MEMBER_ID_HEADER, &MemberId::new().to_string()),
            (EMPLOYEE_ID_HEADER, &EmployeeId::new().to_string()),
        ]));
        assert_eq!(result, Err(ActorRejection::Ambiguous));
    }

    #[test]
    fn rejection_is_unauthorized() {
        let response = ActorRejection::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
