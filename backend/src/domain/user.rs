//! User identity: authenticated accounts and cookie-identified guests.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SHA-256 fingerprint of an opaque device identifier, stored as lowercase hex.
///
/// The raw device id never reaches the database; only this digest does, so a
/// leaked table cannot be replayed into a device cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceFingerprint(String);

impl DeviceFingerprint {
    /// Derive the fingerprint for a raw device identifier.
    pub fn from_device_id(device_id: &str) -> Self {
        let digest = Sha256::digest(device_id.as_bytes());
        Self(hex::encode(digest))
    }

    /// Wrap an already-hex-encoded digest, e.g. when loading from storage.
    pub fn from_hex(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    /// Borrow the hex digest.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DeviceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors for user-supplied account fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Email is missing an `@` or is blank after trimming.
    #[error("email address is not valid")]
    InvalidEmail,
    /// Display name is blank after trimming.
    #[error("display name must not be empty")]
    EmptyDisplayName,
}

/// Normalised email address (trimmed, lowercased).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Normalise and validate an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.is_empty() || !normalised.contains('@') {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }

    /// Borrow the normalised address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application user: an authenticated account or an anonymous guest.
///
/// ## Invariants
/// - Authenticated users carry an email and password digest; guests carry a
///   device fingerprint instead.
/// - `xp` only decreases when the row is deleted during a merge.
/// - `level` is derived from `xp` and the tier list; it is recomputed by the
///   reward engine whenever `xp` changes.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Stable identifier.
    pub id: UserId,
    /// Login email; `None` for guests.
    pub email: Option<EmailAddress>,
    /// Salted password digest; `None` for guests.
    pub password_digest: Option<String>,
    /// Name shown on reviews and dashboards.
    pub display_name: String,
    /// Device fingerprint; `None` for authenticated accounts.
    pub device_fingerprint: Option<DeviceFingerprint>,
    /// Accrued experience points.
    pub xp: u32,
    /// Derived reward level (1-based).
    pub level: u32,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh guest user for the given device fingerprint.
    pub fn new_guest(fingerprint: DeviceFingerprint) -> Self {
        Self {
            id: UserId::random(),
            email: None,
            password_digest: None,
            display_name: "Guest".to_owned(),
            device_fingerprint: Some(fingerprint),
            xp: 0,
            level: 1,
            created_at: Utc::now(),
        }
    }

    /// Build a fresh registered user from validated parts.
    pub fn new_registered(
        email: EmailAddress,
        password_digest: String,
        display_name: impl Into<String>,
    ) -> Result<Self, UserValidationError> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        Ok(Self {
            id: UserId::random(),
            email: Some(email),
            password_digest: Some(password_digest),
            display_name,
            device_fingerprint: None,
            xp: 0,
            level: 1,
            created_at: Utc::now(),
        })
    }

    /// Whether this row represents an anonymous guest.
    pub fn is_guest(&self) -> bool {
        self.email.is_none()
    }
}

/// The identity a handler resolved from the request before calling services.
///
/// Services receive this explicitly instead of consulting ambient session
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// An authenticated account.
    User(UserId),
    /// An anonymous visitor identified by the raw device cookie value.
    Device(String),
    /// No identity at all (no session, no device cookie yet).
    Anonymous,
}
