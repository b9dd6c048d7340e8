//! Pure authorization decisions over already-fetched identity and resource
//! data. No I/O happens here; callers load the user and resource first.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Permission, User},
};

/// Fails with `Forbidden` unless the held set intersects `allowed`.
pub fn ensure_permission(held: &[Permission], allowed: &[Permission]) -> AppResult<()> {
    if held.iter().any(|p| allowed.contains(p)) {
        return Ok(());
    }
    Err(AppError::Forbidden {
        required: allowed.to_vec(),
    })
}

/// Ownership and role are combined with OR: the owner can always act on
/// their own resource, anyone else needs one of `allowed`.
pub fn ensure_owner_or_permission(
    owner_id: Uuid,
    caller: &User,
    allowed: &[Permission],
) -> AppResult<()> {
    if caller.id == owner_id {
        return Ok(());
    }
    ensure_permission(&caller.permissions, allowed)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user_with(permissions: Vec<Permission>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@example.com".into(),
            name: "Test".into(),
            password_hash: String::new(),
            permissions,
            reset_token: None,
            reset_token_expiry: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn permission_intersection_grants() {
        assert!(
            ensure_permission(
                &[Permission::User, Permission::Admin],
                &[Permission::Admin, Permission::ItemDelete],
            )
            .is_ok()
        );
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let err = ensure_permission(&[Permission::User], &[Permission::Admin]).unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[test]
    fn empty_held_set_is_forbidden() {
        assert!(ensure_permission(&[], &[Permission::Admin]).is_err());
    }

    #[test]
    fn owner_always_allowed() {
        let caller = user_with(vec![Permission::User]);
        assert!(
            ensure_owner_or_permission(caller.id, &caller, &[Permission::Admin]).is_ok()
        );
    }

    #[test]
    fn non_owner_needs_role() {
        let caller = user_with(vec![Permission::User]);
        let other = Uuid::new_v4();
        assert!(
            ensure_owner_or_permission(other, &caller, &[Permission::Admin, Permission::ItemDelete])
                .is_err()
        );

        let privileged = user_with(vec![Permission::User, Permission::ItemDelete]);
        assert!(
            ensure_owner_or_permission(
                other,
                &privileged,
                &[Permission::Admin, Permission::ItemDelete]
            )
            .is_ok()
        );
    }
}
