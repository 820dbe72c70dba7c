//! The signed-in user.

use serde::{Deserialize, Serialize};

/// User record returned by the login endpoint and kept in the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// User identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,

    /// Login email.
    pub email: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_user_roundtrip() {
        let user = AuthUser {
            id: "u1".to_owned(),
            email: "maria@example.com".to_owned(),
            name: Some("Maria".to_owned()),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert_eq!(
            json,
            r#"{"_id":"u1","email":"maria@example.com","name":"Maria"}"#
        );
        let back: AuthUser = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_auth_user_without_name() {
        let user: AuthUser =
            serde_json::from_str(r#"{"id":"u1","email":"maria@example.com"}"#).unwrap();
        assert_eq!(user.name, None);
    }
}
