use crate::{
    auth::AuthUser,
    error::AppError,
    models::{Admin, Role},
};

/// Authorization Policy
///
/// State-free decision functions over the acting identity and (where one
/// exists) the target admin record. Handlers resolve the target first, so a
/// missing id surfaces as NotFound before any of these run; a disallowed
/// action on an existing target surfaces as Unauthorized.

/// Gate for create/list/delete admin: super_admin only.
pub fn ensure_super_admin(actor: &AuthUser) -> Result<(), AppError> {
    match actor.role {
        Role::SuperAdmin => Ok(()),
        Role::Admin => Err(AppError::Unauthorized(
            "super admin privileges required".to_string(),
        )),
    }
}

/// check_update
///
/// Decision table for PUT /admin/{id}:
/// - super_admin may update itself and any admin-role record (all fields);
/// - super_admin may never touch a *different* super_admin's record;
/// - an ordinary admin may update only its own record, and only
///   username/password — a payload carrying `sites` is denied outright.
pub fn check_update(actor: &AuthUser, target: &Admin, touches_sites: bool) -> Result<(), AppError> {
    match actor.role {
        Role::SuperAdmin => {
            if target.role == Role::SuperAdmin && target.id != actor.id {
                Err(AppError::Unauthorized(
                    "cannot modify another super admin".to_string(),
                ))
            } else {
                Ok(())
            }
        }
        Role::Admin => {
            if target.id != actor.id {
                Err(AppError::Unauthorized(
                    "admins may only update their own record".to_string(),
                ))
            } else if touches_sites {
                Err(AppError::Unauthorized(
                    "admins may not change their own site scope".to_string(),
                ))
            } else {
                Ok(())
            }
        }
    }
}

/// check_delete
///
/// Super_admin rows can never be deleted through the API, regardless of the
/// caller; everything else requires a super_admin caller.
pub fn check_delete(actor: &AuthUser, target: &Admin) -> Result<(), AppError> {
    if target.role == Role::SuperAdmin {
        return Err(AppError::Unauthorized(
            "super admin accounts cannot be deleted".to_string(),
        ));
    }
    ensure_super_admin(actor)
}
