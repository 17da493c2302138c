//! Account service: registration, login, and guest resolution.
//!
//! Credentials use a salted SHA-256 digest stored as `salt$hex`. Guests are
//! resolved (and lazily created) from the device fingerprint derived from
//! the opaque device cookie.

use std::sync::Arc;

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::user::{Actor, DeviceFingerprint, EmailAddress, User};
use crate::domain::Error;

/// Bytes of random salt per password digest.
const SALT_LEN: usize = 16;

/// Hash a password with a fresh random salt into `salt$digest` form.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0_u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);
    format!("{salt_hex}${}", digest_with_salt(&salt_hex, password))
}

/// Verify a password against a stored `salt$digest` value.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest)) = stored.split_once('$') else {
        return false;
    };
    // Fixed-width hex comparison; both sides are digests of equal length.
    digest_with_salt(salt_hex, password) == digest
}

fn digest_with_salt(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Registration, login, and actor resolution over the user repository.
#[derive(Clone)]
pub struct AccountsService {
    users: Arc<dyn UserRepository>,
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => Error::service_unavailable(message),
        UserPersistenceError::Query { message } => Error::internal(message),
        UserPersistenceError::DuplicateEmail => Error::conflict("email is already registered"),
    }
}

impl AccountsService {
    /// Create the service over a user repository.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Register a new account.
    ///
    /// Duplicate emails surface as a conflict, whether detected by the
    /// pre-check or by the unique index at insert time.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<User, Error> {
        let email = EmailAddress::new(email).map_err(|e| Error::invalid_request(e.to_string()))?;
        if password.len() < 6 {
            return Err(Error::invalid_request(
                "password must be at least 6 characters",
            ));
        }

        if self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_user_error)?
            .is_some()
        {
            return Err(Error::conflict("email is already registered"));
        }

        let user = User::new_registered(email, hash_password(password), display_name.trim())
            .map_err(|e| Error::invalid_request(e.to_string()))?;
        self.users.insert(&user).await.map_err(map_user_error)?;
        Ok(user)
    }

    /// Authenticate an email/password pair.
    ///
    /// All failure shapes (unknown email, guest row, wrong password) collapse
    /// into one `invalid credentials` outcome.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, Error> {
        let invalid = || Error::unauthorized("invalid credentials");

        let email = EmailAddress::new(email).map_err(|_| invalid())?;
        let user = self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_user_error)?
            .ok_or_else(invalid)?;

        match &user.password_digest {
            Some(digest) if verify_password(password, digest) => Ok(user),
            _ => Err(invalid()),
        }
    }

    /// Resolve the actor to a user row.
    ///
    /// Authenticated actors must exist; device actors are looked up by
    /// fingerprint and created as guests on first contact; anonymous actors
    /// resolve to `None`.
    pub async fn resolve_actor(&self, actor: &Actor) -> Result<Option<User>, Error> {
        match actor {
            Actor::User(id) => {
                let user = self
                    .users
                    .find_by_id(id)
                    .await
                    .map_err(map_user_error)?
                    .ok_or_else(|| Error::unauthorized("session user no longer exists"))?;
                Ok(Some(user))
            }
            Actor::Device(device_id) => {
                let fingerprint = DeviceFingerprint::from_device_id(device_id);
                if let Some(existing) = self
                    .users
                    .find_by_device_fingerprint(&fingerprint)
                    .await
                    .map_err(map_user_error)?
                {
                    return Ok(Some(existing));
                }
                let guest = User::new_guest(fingerprint);
                self.users.insert(&guest).await.map_err(map_user_error)?;
                Ok(Some(guest))
            }
            Actor::Anonymous => Ok(None),
        }
    }

    /// Look up a guest by raw device id without creating one.
    pub async fn find_guest(&self, device_id: &str) -> Result<Option<User>, Error> {
        let fingerprint = DeviceFingerprint::from_device_id(device_id);
        self.users
            .find_by_device_fingerprint(&fingerprint)
            .await
            .map_err(map_user_error)
    }

    /// Fetch a user by id, failing with `unauthorized` when missing.
    pub async fn require_user(&self, id: &crate::domain::UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized("session user no longer exists"))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rstest::rstest;

    use super::*;
    use crate::domain::user::UserId;
    use crate::domain::ErrorCode;

    #[derive(Default)]
    struct StubUserRepository {
        rows: Mutex<HashMap<UserId, User>>,
        fail_with: Mutex<Option<UserPersistenceError>>,
    }

    impl StubUserRepository {
        fn seeded(user: User) -> Self {
            let repo = Self::default();
            repo.rows
                .lock()
                .expect("rows lock")
                .insert(user.id, user);
            repo
        }

        fn set_failure(&self, failure: UserPersistenceError) {
            *self.fail_with.lock().expect("failure lock") = Some(failure);
        }

        fn check_failure(&self) -> Result<(), UserPersistenceError> {
            self.fail_with
                .lock()
                .expect("failure lock")
                .clone()
                .map_or(Ok(()), Err)
        }

        fn row_count(&self) -> usize {
            self.rows.lock().expect("rows lock").len()
        }
    }

    #[async_trait]
    impl UserRepository for StubUserRepository {
        async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
            self.check_failure()?;
            let mut rows = self.rows.lock().expect("rows lock");
            if user.email.is_some() && rows.values().any(|u| u.email == user.email) {
                return Err(UserPersistenceError::DuplicateEmail);
            }
            rows.insert(user.id, user.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
            self.check_failure()?;
            Ok(self.rows.lock().expect("rows lock").get(id).cloned())
        }

        async fn find_by_email(
            &self,
            email: &EmailAddress,
        ) -> Result<Option<User>, UserPersistenceError> {
            self.check_failure()?;
            Ok(self
                .rows
                .lock()
                .expect("rows lock")
                .values()
                .find(|u| u.email.as_ref() == Some(email))
                .cloned())
        }

        async fn find_by_device_fingerprint(
            &self,
            fingerprint: &DeviceFingerprint,
        ) -> Result<Option<User>, UserPersistenceError> {
            self.check_failure()?;
            Ok(self
                .rows
                .lock()
                .expect("rows lock")
                .values()
                .find(|u| u.device_fingerprint.as_ref() == Some(fingerprint))
                .cloned())
        }

        async fn store_progress(
            &self,
            id: &UserId,
            xp: u32,
            level: u32,
        ) -> Result<(), UserPersistenceError> {
            self.check_failure()?;
            let mut rows = self.rows.lock().expect("rows lock");
            if let Some(user) = rows.get_mut(id) {
                user.xp = xp;
                user.level = level;
            }
            Ok(())
        }
    }

    fn service(repo: Arc<StubUserRepository>) -> AccountsService {
        AccountsService::new(repo)
    }

    #[rstest]
    fn password_digest_round_trips() {
        let digest = hash_password("hunter22");
        assert!(verify_password("hunter22", &digest));
        assert!(!verify_password("hunter23", &digest));
    }

    #[rstest]
    fn password_digests_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[rstest]
    fn malformed_stored_digest_never_verifies() {
        assert!(!verify_password("anything", "no-separator"));
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let repo = Arc::new(StubUserRepository::default());
        let svc = service(repo.clone());

        let user = svc
            .register(" Ada@Example.com ", "secret1", "Ada")
            .await
            .expect("registration succeeds");
        assert_eq!(
            user.email.as_ref().map(EmailAddress::as_str),
            Some("ada@example.com")
        );

        let back = svc
            .authenticate("ada@example.com", "secret1")
            .await
            .expect("authentication succeeds");
        assert_eq!(back.id, user.id);
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let repo = Arc::new(StubUserRepository::default());
        let svc = service(repo.clone());
        svc.register("a@b.com", "secret1", "A")
            .await
            .expect("first registration");

        let err = svc
            .register("A@B.com", "secret2", "B")
            .await
            .expect_err("duplicate rejected");
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(repo.row_count(), 1);
    }

    #[rstest]
    #[case("bad-email", "secret1")]
    #[case("a@b.com", "short")]
    #[tokio::test]
    async fn register_validates_input(#[case] email: &str, #[case] password: &str) {
        let svc = service(Arc::new(StubUserRepository::default()));
        let err = svc
            .register(email, password, "Name")
            .await
            .expect_err("validation failure");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn authenticate_collapses_failures_into_one_outcome() {
        let repo = Arc::new(StubUserRepository::default());
        let svc = service(repo.clone());
        svc.register("a@b.com", "secret1", "A")
            .await
            .expect("registration");

        for (email, password) in [("a@b.com", "wrong"), ("missing@b.com", "secret1")] {
            let err = svc
                .authenticate(email, password)
                .await
                .expect_err("must fail");
            assert_eq!(err.code(), ErrorCode::Unauthorized);
            assert_eq!(err.message(), "invalid credentials");
        }
    }

    #[tokio::test]
    async fn device_actor_creates_a_guest_once() {
        let repo = Arc::new(StubUserRepository::default());
        let svc = service(repo.clone());
        let actor = Actor::Device("device-1".to_owned());

        let first = svc
            .resolve_actor(&actor)
            .await
            .expect("resolution succeeds")
            .expect("guest created");
        assert!(first.is_guest());

        let second = svc
            .resolve_actor(&actor)
            .await
            .expect("resolution succeeds")
            .expect("guest found");
        assert_eq!(first.id, second.id);
        assert_eq!(repo.row_count(), 1);
    }

    #[tokio::test]
    async fn anonymous_actor_resolves_to_none() {
        let svc = service(Arc::new(StubUserRepository::default()));
        let resolved = svc
            .resolve_actor(&Actor::Anonymous)
            .await
            .expect("resolution succeeds");
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn connection_failures_map_to_service_unavailable() {
        let repo = Arc::new(StubUserRepository::default());
        repo.set_failure(UserPersistenceError::connection("database unavailable"));
        let svc = service(repo);

        let err = svc
            .authenticate("a@b.com", "secret1")
            .await
            .expect_err("failure surfaces");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }

    #[tokio::test]
    async fn stale_session_user_is_unauthorized() {
        let guest = User::new_guest(DeviceFingerprint::from_device_id("d"));
        let repo = Arc::new(StubUserRepository::seeded(guest));
        let svc = service(repo);

        let err = svc
            .resolve_actor(&Actor::User(UserId::random()))
            .await
            .expect_err("missing session user rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}
