//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::user::{DeviceFingerprint, EmailAddress, User, UserId};

use super::diesel_helpers::{classify, from_db_i32, to_db_i32, StoreFailure};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            UserPersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    match classify(error) {
        StoreFailure::Connection(message) => UserPersistenceError::connection(message),
        StoreFailure::UniqueViolation(constraint) if constraint.contains("email") => {
            UserPersistenceError::DuplicateEmail
        }
        StoreFailure::UniqueViolation(constraint) => {
            UserPersistenceError::query(format!("unique constraint violated: {constraint}"))
        }
        StoreFailure::Query(message) => UserPersistenceError::query(message),
    }
}

pub(crate) fn row_to_user(row: UserRow) -> User {
    let email = row.email.as_deref().and_then(|raw| {
        EmailAddress::new(raw)
            .map_err(|_| warn!(user_id = %row.id, "stored email fails validation, treating as absent"))
            .ok()
    });

    User {
        id: UserId::from_uuid(row.id),
        email,
        password_digest: row.password_digest,
        display_name: row.display_name,
        device_fingerprint: row.device_fingerprint.map(DeviceFingerprint::from_hex),
        xp: from_db_i32(row.xp),
        level: from_db_i32(row.level),
        created_at: row.created_at,
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewUserRow {
            id: *user.id.as_uuid(),
            email: user.email.as_ref().map(EmailAddress::as_str),
            password_digest: user.password_digest.as_deref(),
            display_name: &user.display_name,
            device_fingerprint: user
                .device_fingerprint
                .as_ref()
                .map(DeviceFingerprint::as_str),
            xp: to_db_i32(user.xp),
            level: to_db_i32(user.level),
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_user))
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_user))
    }

    async fn find_by_device_fingerprint(
        &self,
        fingerprint: &DeviceFingerprint,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::device_fingerprint.eq(fingerprint.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_user))
    }

    async fn store_progress(
        &self,
        id: &UserId,
        xp: u32,
        level: u32,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set((
                users::xp.eq(to_db_i32(xp)),
                users::level.eq(to_db_i32(level)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
