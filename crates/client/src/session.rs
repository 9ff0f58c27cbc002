//! Authenticated session: access token plus the signed-in user's profile.
//!
//! A [`Session`] is passed explicitly to every authenticated call. It is
//! persisted under [`ACCESS_TOKEN_KEY`] and [`PROFILE_KEY`] so that a later
//! process can pick it up again.

use jsonwebtoken::{DecodingKey, Validation};
use musicly_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::storage::{DurableStorage, StorageError};

/// Storage key of the raw access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key of the JSON-serialized user profile.
pub const PROFILE_KEY: &str = "profile";

/// The user object returned by sign-in. Only `id` is required; everything
/// else is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn email(&self) -> Option<&str> {
        self.extra.get("email").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        ["name", "fullName", "username"]
            .iter()
            .find_map(|key| self.extra.get(*key).and_then(Value::as_str))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    token: String,
    user: UserProfile,
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    exp: Option<i64>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    /// Value of the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Write the profile and then the token to `storage`.
    ///
    /// When the token cannot be written the profile is removed again, so a
    /// failed persist leaves no session behind.
    pub fn persist(&self, storage: &dyn DurableStorage) -> Result<(), StorageError> {
        let profile = serde_json::to_string(&self.user)?;
        storage.set(PROFILE_KEY, &profile)?;
        if let Err(err) = storage.set(ACCESS_TOKEN_KEY, &self.token) {
            if let Err(cleanup) = storage.remove(PROFILE_KEY) {
                tracing::warn!(error = %cleanup, "Failed to remove profile after token write failed");
            }
            return Err(err);
        }
        Ok(())
    }

    /// Read a previously persisted session. Both keys must be present.
    pub fn restore(storage: &dyn DurableStorage) -> Result<Option<Self>, StorageError> {
        let Some(token) = storage.get(ACCESS_TOKEN_KEY)?.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        let Some(profile) = storage.get(PROFILE_KEY)? else {
            return Ok(None);
        };
        let user = serde_json::from_str(&profile)?;
        Ok(Some(Self { token, user }))
    }

    /// Remove both session keys.
    pub fn clear(storage: &dyn DurableStorage) -> Result<(), StorageError> {
        storage.remove(ACCESS_TOKEN_KEY)?;
        storage.remove(PROFILE_KEY)?;
        Ok(())
    }

    /// Expiry read from the token's `exp` claim.
    ///
    /// The signature is not checked; the server remains the authority. Opaque
    /// (non-JWT) tokens have no known expiry.
    pub fn expires_at(&self) -> Option<Timestamp> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<TokenClaims>(
            &self.token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )
        .ok()?;
        chrono::DateTime::from_timestamp(data.claims.exp?, 0)
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;
    use crate::storage::MemoryStorage;

    fn profile() -> UserProfile {
        serde_json::from_value(serde_json::json!({ "id": 1, "email": "test@example.com" })).unwrap()
    }

    fn jwt_expiring_at(exp: i64) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            &serde_json::json!({ "sub": "1", "exp": exp }),
            &EncodingKey::from_secret(b"server-secret"),
        )
        .unwrap()
    }

    #[test]
    fn persist_then_restore() {
        let storage = MemoryStorage::new();
        let session = Session::new("abc", profile());
        session.persist(&storage).unwrap();

        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("abc"));
        let restored = Session::restore(&storage).unwrap().unwrap();
        assert_eq!(restored, session);
        assert_eq!(restored.user().email(), Some("test@example.com"));
        assert_eq!(restored.bearer(), "Bearer abc");
    }

    /// Accepts every write except the token.
    struct TokenWriteFails(MemoryStorage);

    impl DurableStorage for TokenWriteFails {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == ACCESS_TOKEN_KEY {
                return Err(StorageError::Io(std::io::Error::other("disk full")));
            }
            self.0.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
    }

    #[test]
    fn failed_persist_leaves_nothing_behind() {
        let storage = TokenWriteFails(MemoryStorage::new());

        let err = Session::new("abc", profile()).persist(&storage).unwrap_err();

        assert!(matches!(err, StorageError::Io(_)));
        assert!(storage.0.get(PROFILE_KEY).unwrap().is_none());
        assert!(storage.0.is_empty());
        assert!(Session::restore(&storage).unwrap().is_none());
    }

    #[test]
    fn restore_requires_both_keys() {
        let storage = MemoryStorage::new();
        storage.set(ACCESS_TOKEN_KEY, "abc").unwrap();
        assert!(Session::restore(&storage).unwrap().is_none());
    }

    #[test]
    fn clear_removes_both_keys() {
        let storage = MemoryStorage::new();
        Session::new("abc", profile()).persist(&storage).unwrap();
        Session::clear(&storage).unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn expiry_is_read_from_jwt_claims() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let session = Session::new(jwt_expiring_at(exp), profile());

        assert_eq!(session.expires_at().map(|t| t.timestamp()), Some(exp));
        assert!(!session.is_expired(Utc::now()));
        assert!(session.is_expired(Utc::now() + Duration::hours(2)));
    }

    #[test]
    fn opaque_token_has_no_expiry() {
        let session = Session::new("abc", profile());
        assert!(session.expires_at().is_none());
        assert!(!session.is_expired(Utc::now()));
    }
}
