//! Auth session persistence.
//!
//! The login flow stores three values: the bearer token, the signed-in user
//! as JSON, and an access flag recording that the user passed the entry
//! screen. Logging out removes all three.

use dine_core::AuthUser;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "@auth_token";

/// Key holding the signed-in user as JSON.
pub const USER_KEY: &str = "@auth_user";

/// Key holding the access flag.
pub const ACCESS_KEY: &str = "@access_granted";

/// Typed access to the auth session over any [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Stores the bearer token.
    pub async fn save_token(&self, token: &str) -> Result<(), StoreError> {
        self.store.set(TOKEN_KEY, token.to_owned()).await
    }

    /// Returns the stored bearer token.
    pub async fn token(&self) -> Result<Option<String>, StoreError> {
        self.store.get(TOKEN_KEY).await
    }

    /// Removes the bearer token.
    pub async fn clear_token(&self) -> Result<(), StoreError> {
        self.store.remove(TOKEN_KEY).await
    }

    /// Stores the signed-in user.
    pub async fn save_user(&self, user: &AuthUser) -> Result<(), StoreError> {
        let json = serde_json::to_string(user)?;
        self.store.set(USER_KEY, json).await
    }

    /// Returns the stored user.
    ///
    /// A value that does not decode as a user is logged and treated as
    /// absent.
    pub async fn user(&self) -> Result<Option<AuthUser>, StoreError> {
        let Some(raw) = self.store.get(USER_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed stored user");
                Ok(None)
            }
        }
    }

    /// Removes the stored user.
    pub async fn clear_user(&self) -> Result<(), StoreError> {
        self.store.remove(USER_KEY).await
    }

    /// Stores the access flag.
    pub async fn save_access(&self, access: &str) -> Result<(), StoreError> {
        self.store.set(ACCESS_KEY, access.to_owned()).await
    }

    /// Returns the stored access flag.
    pub async fn access(&self) -> Result<Option<String>, StoreError> {
        self.store.get(ACCESS_KEY).await
    }

    /// Removes the access flag.
    pub async fn clear_access(&self) -> Result<(), StoreError> {
        self.store.remove(ACCESS_KEY).await
    }

    /// Removes the token, the user, and the access flag.
    ///
    /// Stops at the first failure; keys removed before it stay removed.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.clear_token().await?;
        self.clear_user().await?;
        self.clear_access().await?;
        tracing::debug!("Cleared auth session");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn user() -> AuthUser {
        AuthUser {
            id: "u1".to_owned(),
            email: "maria@example.com".to_owned(),
            name: Some("Maria".to_owned()),
        }
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let session = SessionStore::new(MemoryStore::new());
        assert_eq!(session.token().await.unwrap(), None);

        session.save_token("abc").await.unwrap();
        assert_eq!(session.token().await.unwrap().as_deref(), Some("abc"));
        assert_eq!(session.inner().snapshot(TOKEN_KEY).as_deref(), Some("abc"));

        session.clear_token().await.unwrap();
        assert_eq!(session.token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_user_lifecycle() {
        let session = SessionStore::new(MemoryStore::new());
        session.save_user(&user()).await.unwrap();
        assert_eq!(session.user().await.unwrap(), Some(user()));

        session.clear_user().await.unwrap();
        assert_eq!(session.user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_user_reads_none() {
        let session = SessionStore::new(MemoryStore::with_entries([(USER_KEY, "{oops")]));
        assert_eq!(session.user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_access_lifecycle() {
        let session = SessionStore::new(MemoryStore::new());
        session.save_access("true").await.unwrap();
        assert_eq!(session.access().await.unwrap().as_deref(), Some("true"));

        session.clear_access().await.unwrap();
        assert_eq!(session.access().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let session = SessionStore::new(MemoryStore::with_entries([("@other", "kept")]));
        session.save_token("abc").await.unwrap();
        session.save_user(&user()).await.unwrap();
        session.save_access("true").await.unwrap();

        session.clear().await.unwrap();

        assert_eq!(session.token().await.unwrap(), None);
        assert_eq!(session.user().await.unwrap(), None);
        assert_eq!(session.access().await.unwrap(), None);
        assert_eq!(session.inner().snapshot("@other").as_deref(), Some("kept"));
    }
}
