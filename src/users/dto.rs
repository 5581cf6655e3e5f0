use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo::User;

/// Public part of a user returned to clients; never carries the hash.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_root: bool,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            is_root: user.is_root,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub data: Vec<PublicUser>,
    pub count: i64,
}

/// Admin user creation; flags default to a plain active account.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub is_root: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Typed status patch; absent fields leave the stored flag untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UserStatusPatch {
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_root: Option<bool>,
}

impl UserStatusPatch {
    /// Merges the patch over the stored flags. Granting root always grants
    /// superuser as well.
    pub fn apply(&self, user: &User) -> (bool, bool, bool) {
        let is_active = self.is_active.unwrap_or(user.is_active);
        let is_root = self.is_root.unwrap_or(user.is_root);
        let is_superuser = self.is_superuser.unwrap_or(user.is_superuser) || is_root;
        (is_active, is_superuser, is_root)
    }
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(is_active: bool, is_superuser: bool, is_root: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@example.com".into(),
            password_hash: "hash".into(),
            is_active,
            is_superuser,
            is_root,
        }
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let user = stored(true, true, false);
        assert_eq!(UserStatusPatch::default().apply(&user), (true, true, false));
    }

    #[test]
    fn granting_root_implies_superuser() {
        let user = stored(true, false, false);
        let patch = UserStatusPatch {
            is_root: Some(true),
            ..Default::default()
        };
        assert_eq!(patch.apply(&user), (true, true, true));
    }

    #[test]
    fn explicit_superuser_false_loses_to_root() {
        let user = stored(true, false, false);
        let patch = UserStatusPatch {
            is_superuser: Some(false),
            is_root: Some(true),
            ..Default::default()
        };
        assert_eq!(patch.apply(&user), (true, true, true));
    }

    #[test]
    fn deactivation_keeps_other_flags() {
        let user = stored(true, true, true);
        let patch = UserStatusPatch {
            is_active: Some(false),
            ..Default::default()
        };
        assert_eq!(patch.apply(&user), (false, true, true));
    }

    #[test]
    fn create_request_defaults() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"email":"a@b.co","password":"longenough"}"#).unwrap();
        assert!(req.is_active);
        assert!(!req.is_superuser);
        assert!(!req.is_root);
    }
}
