//! Acting identity passed explicitly into every core operation.
//!
//! The upstream authentication proxy resolves who is calling; the core only
//! receives the result as an `Actor` value. Nothing in the core looks up the
//! current identity on its own.
//!
//! # Example
//!
//! ```ignore
//! let actor = Actor::member(member_id);
//! actor.ensure_can_act_for(&reservation.member_id)?;
//! ```

use serde::{Deserialize, Serialize};

use super::{BookingError, EmployeeId, MemberId};

/// Authorization role of a staff account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Front desk and trainers.
    Employee,
    /// Studio administration.
    Admin,
}

/// Who is performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// A member acting for themselves.
    Member(MemberId),
    /// A staff account acting on behalf of members.
    Staff { employee_id: EmployeeId, role: StaffRole },
}

impl Actor {
    pub fn member(member_id: MemberId) -> Self {
        Actor::Member(member_id)
    }

    pub fn employee(employee_id: EmployeeId) -> Self {
        Actor::Staff {
            employee_id,
            role: StaffRole::Employee,
        }
    }

    pub fn admin(employee_id: EmployeeId) -> Self {
        Actor::Staff {
            employee_id,
            role: StaffRole::Admin,
        }
    }

    /// Member id when the actor is a member.
    pub fn member_id(&self) -> Option<MemberId> {
        match self {
            Actor::Member(id) => Some(*id),
            Actor::Staff { .. } => None,
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Actor::Staff { .. })
    }

    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Actor::Staff {
                role: StaffRole::Admin,
                ..
            }
        )
    }

    /// Members may act only for themselves; staff may act for anyone.
    pub fn ensure_can_act_for(&self, member_id: &MemberId) -> Result<(), BookingError> {
        match self {
            Actor::Staff { .. } => Ok(()),
            Actor::Member(id) if id == member_id => Ok(()),
            Actor::Member(_) => Err(BookingError::forbidden(
                "Members may only act on their own bookings and payments",
            )),
        }
    }

    pub fn require_staff(&self) -> Result<(), BookingError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(BookingError::forbidden("Staff role required"))
        }
    }

    pub fn require_admin(&self) -> Result<(), BookingError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(BookingError::forbidden("Admin role required"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_can_act_for_self_only() {
        let me = MemberId::new();
        let other = MemberId::new();
        let actor = Actor::member(me);

        assert!(actor.ensure_can_act_for(&me).is_ok());
        assert!(matches!(
            actor.ensure_can_act_for(&other),
            Err(BookingError::Forbidden(_))
        ));
    }

    #[test]
    fn staff_can_act_for_any_member() {
        let actor = Actor::employee(EmployeeId::new());
        assert!(actor.ensure_can_act_for(&MemberId::new()).is_ok());
        assert!(actor.require_staff().is_ok());
        assert!(actor.require_admin().is_err());
    }

    #[test]
    fn admin_passes_all_role_checks() {
        let actor = Actor::admin(EmployeeId::new());
        assert!(actor.is_staff());
        assert!(actor.require_admin().is_ok());
        assert_eq!(actor.member_id(), None);
    }

    #[test]
    fn member_fails_staff_checks() {
        let actor = Actor::member(MemberId::new());
        assert!(actor.require_staff().is_err());
        assert!(actor.require_admin().is_err());
    }
}
