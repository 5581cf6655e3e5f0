//! Role rules for user management and expense visibility.
//!
//! Privilege ordering is `User < Superuser < Root`; every admin decision
//! funnels through one of the functions below instead of re-deriving flag
//! combinations at the call site.

use uuid::Uuid;

use crate::error::ApiError;
use crate::users::repo::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    User,
    Superuser,
    Root,
}

impl Role {
    pub fn of(user: &User) -> Self {
        if user.is_root {
            Role::Root
        } else if user.is_superuser {
            Role::Superuser
        } else {
            Role::User
        }
    }
}

/// Which expenses a listing may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    Own(Uuid),
    All,
}

pub fn list_scope(actor: &User) -> ListScope {
    if Role::of(actor) >= Role::Superuser {
        ListScope::All
    } else {
        ListScope::Own(actor.id)
    }
}

/// Expense read/update/delete is ownership-gated for every role; superusers
/// get no per-item override, only the wider listing scope.
pub fn ensure_owner(actor: &User, owner_id: Uuid) -> Result<(), ApiError> {
    if actor.id == owner_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden("not enough permissions"))
    }
}

pub fn ensure_superuser(actor: &User) -> Result<(), ApiError> {
    if Role::of(actor) >= Role::Superuser {
        Ok(())
    } else {
        Err(ApiError::Forbidden("not enough permissions"))
    }
}

/// Only root may mint another root account.
pub fn ensure_can_create_user(actor: &User, wants_root: bool) -> Result<(), ApiError> {
    ensure_superuser(actor)?;
    if wants_root && Role::of(actor) < Role::Root {
        return Err(ApiError::Forbidden("not enough privileges to create a root user"));
    }
    Ok(())
}

/// Status flags of a root account may only be touched by another root.
pub fn ensure_can_update_status(actor: &User, target: &User) -> Result<(), ApiError> {
    ensure_superuser(actor)?;
    if target.is_root && Role::of(actor) < Role::Root {
        return Err(ApiError::Forbidden("not enough privileges to modify a root user"));
    }
    Ok(())
}

/// Root accounts cannot be deleted through the admin path, whoever asks.
pub fn ensure_can_delete_user(actor: &User, target: &User) -> Result<(), ApiError> {
    ensure_superuser(actor)?;
    if target.is_root {
        return Err(ApiError::Forbidden("root users cannot be deleted"));
    }
    Ok(())
}

pub fn ensure_can_delete_self(actor: &User) -> Result<(), ApiError> {
    if actor.is_root {
        return Err(ApiError::Forbidden("root users cannot delete themselves"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(is_superuser: bool, is_root: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: "hash".into(),
            is_active: true,
            is_superuser,
            is_root,
        }
    }

    #[test]
    fn role_ordering() {
        assert!(Role::User < Role::Superuser);
        assert!(Role::Superuser < Role::Root);
        assert_eq!(Role::of(&user_with(false, false)), Role::User);
        assert_eq!(Role::of(&user_with(true, false)), Role::Superuser);
        assert_eq!(Role::of(&user_with(true, true)), Role::Root);
    }

    #[test]
    fn listing_scope_widens_for_admins() {
        let plain = user_with(false, false);
        assert_eq!(list_scope(&plain), ListScope::Own(plain.id));
        assert_eq!(list_scope(&user_with(true, false)), ListScope::All);
        assert_eq!(list_scope(&user_with(true, true)), ListScope::All);
    }

    #[test]
    fn expense_access_ignores_role() {
        let owner_id = Uuid::new_v4();
        let root = user_with(true, true);
        assert!(ensure_owner(&root, owner_id).is_err());
        let mut owner = user_with(false, false);
        owner.id = owner_id;
        assert!(ensure_owner(&owner, owner_id).is_ok());
    }

    #[test]
    fn plain_users_cannot_manage_accounts() {
        let plain = user_with(false, false);
        assert!(ensure_superuser(&plain).is_err());
        assert!(ensure_can_create_user(&plain, false).is_err());
    }

    #[test]
    fn root_flag_requires_root_actor() {
        let superuser = user_with(true, false);
        let root = user_with(true, true);
        assert!(ensure_can_create_user(&superuser, true).is_err());
        assert!(ensure_can_create_user(&superuser, false).is_ok());
        assert!(ensure_can_create_user(&root, true).is_ok());
    }

    #[test]
    fn root_target_shields_status_updates() {
        let superuser = user_with(true, false);
        let root = user_with(true, true);
        let root_target = user_with(true, true);
        assert!(ensure_can_update_status(&superuser, &root_target).is_err());
        assert!(ensure_can_update_status(&root, &root_target).is_ok());
        assert!(ensure_can_update_status(&superuser, &user_with(false, false)).is_ok());
    }

    #[test]
    fn nobody_deletes_a_root_account() {
        let root = user_with(true, true);
        let superuser = user_with(true, false);
        let root_target = user_with(true, true);
        assert!(ensure_can_delete_user(&root, &root_target).is_err());
        assert!(ensure_can_delete_user(&superuser, &root_target).is_err());
        assert!(ensure_can_delete_user(&superuser, &user_with(false, false)).is_ok());
    }

    #[test]
    fn root_cannot_self_delete() {
        assert!(ensure_can_delete_self(&user_with(true, true)).is_err());
        assert!(ensure_can_delete_self(&user_with(false, false)).is_ok());
        assert!(ensure_can_delete_self(&user_with(true, false)).is_ok());
    }
}
