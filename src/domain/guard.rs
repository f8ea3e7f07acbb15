//! Department/role scoping rules. ADMIN acts anywhere, MANAGER only
//! inside their own department, EMPLOYEE only on their own requests.

use crate::domain::error::LeaveError;
use crate::model::employee::Employee;
use crate::model::role::Role;

/// Resolved actor identity, threaded explicitly into every workflow
/// operation (no ambient security context).
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
    pub department: Option<String>,
}

impl Actor {
    pub fn employee_id(&self) -> Result<u64, LeaveError> {
        self.employee_id
            .ok_or_else(|| LeaveError::Forbidden("No employee profile".into()))
    }

    fn department(&self) -> Result<&str, LeaveError> {
        match self.department.as_deref() {
            Some(d) if !d.trim().is_empty() => Ok(d),
            _ => Err(LeaveError::IllegalState(
                "Manager must be assigned to a department".into(),
            )),
        }
    }
}

/// Which slice of the leave requests a listing call may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    All,
    Department(String),
    Own(u64),
}

pub fn list_scope(actor: &Actor) -> Result<ListScope, LeaveError> {
    match actor.role {
        Role::Admin => Ok(ListScope::All),
        Role::Manager => Ok(ListScope::Department(actor.department()?.to_string())),
        Role::Employee => Ok(ListScope::Own(actor.employee_id()?)),
    }
}

/// May the actor approve or reject a request owned by `employee`?
pub fn can_decide(actor: &Actor, employee: &Employee) -> Result<(), LeaveError> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Manager => {
            let manager_department = actor.department()?;
            match employee.department.as_deref() {
                Some(d) if d == manager_department => Ok(()),
                other => Err(LeaveError::Forbidden(format!(
                    "You can only act on leaves from your department ({}). This leave is from {} department.",
                    manager_department,
                    other.unwrap_or("no")
                ))),
            }
        }
        Role::Employee => Err(LeaveError::Forbidden(
            "Only ADMIN and MANAGER can approve or reject leaves".into(),
        )),
    }
}

/// May the actor view a request owned by `employee`?
pub fn can_view(actor: &Actor, employee: &Employee) -> Result<(), LeaveError> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Manager => can_decide(actor, employee),
        Role::Employee => ensure_owner(actor, employee.id),
    }
}

/// Only the owning employee passes; used for cancel.
pub fn ensure_owner(actor: &Actor, employee_id: u64) -> Result<(), LeaveError> {
    if actor.employee_id()? == employee_id {
        Ok(())
    } else {
        Err(LeaveError::Forbidden(
            "You can only act on your own leaves".into(),
        ))
    }
}

pub fn require_admin(actor: &Actor) -> Result<(), LeaveError> {
    if actor.role == Role::Admin {
        Ok(())
    } else {
        Err(LeaveError::Forbidden("Admin only".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, employee_id: Option<u64>, department: Option<&str>) -> Actor {
        Actor {
            user_id: 1,
            username: "user".into(),
            role,
            employee_id,
            department: department.map(String::from),
        }
    }

    fn employee(id: u64, department: Option<&str>) -> Employee {
        Employee {
            id,
            name: "Emp".into(),
            email: "emp@company.com".into(),
            department: department.map(String::from),
        }
    }

    #[test]
    fn admin_can_decide_across_departments() {
        let admin = actor(Role::Admin, None, None);
        assert!(can_decide(&admin, &employee(5, Some("Sales"))).is_ok());
        assert!(can_decide(&admin, &employee(6, Some("Engineering"))).is_ok());
    }

    #[test]
    fn manager_is_scoped_to_own_department() {
        let manager = actor(Role::Manager, Some(2), Some("Sales"));
        assert!(can_decide(&manager, &employee(5, Some("Sales"))).is_ok());
        let err = can_decide(&manager, &employee(6, Some("Engineering"))).unwrap_err();
        assert!(matches!(err, LeaveError::Forbidden(_)));
    }

    #[test]
    fn manager_without_department_is_an_illegal_state() {
        let manager = actor(Role::Manager, Some(2), None);
        assert!(matches!(
            can_decide(&manager, &employee(5, Some("Sales"))).unwrap_err(),
            LeaveError::IllegalState(_)
        ));
        assert!(matches!(
            list_scope(&manager).unwrap_err(),
            LeaveError::IllegalState(_)
        ));
    }

    #[test]
    fn employee_cannot_decide_but_views_own() {
        let emp = actor(Role::Employee, Some(5), Some("Sales"));
        assert!(matches!(
            can_decide(&emp, &employee(5, Some("Sales"))).unwrap_err(),
            LeaveError::Forbidden(_)
        ));
        assert!(can_view(&emp, &employee(5, Some("Sales"))).is_ok());
        assert!(can_view(&emp, &employee(6, Some("Sales"))).is_err());
    }

    #[test]
    fn list_scope_follows_role() {
        assert_eq!(list_scope(&actor(Role::Admin, None, None)).unwrap(), ListScope::All);
        assert_eq!(
            list_scope(&actor(Role::Manager, Some(2), Some("Sales"))).unwrap(),
            ListScope::Department("Sales".into())
        );
        assert_eq!(
            list_scope(&actor(Role::Employee, Some(5), None)).unwrap(),
            ListScope::Own(5)
        );
    }
}
