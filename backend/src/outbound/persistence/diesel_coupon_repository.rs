//! PostgreSQL-backed `CouponRepository` implementation using Diesel ORM.
//!
//! Redemption inserts surface unique-index rejections on the code column as
//! [`CouponPersistenceError::DuplicateCode`]; at-most-once-per-user remains
//! an application-level existence check by design.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::coupons::{Coupon, CouponId, CouponRedemption, RedemptionStatus};
use crate::domain::ports::{CouponPersistenceError, CouponRepository};
use crate::domain::restaurant::RestaurantId;
use crate::domain::user::UserId;

use super::diesel_helpers::{classify, from_db_i32, to_db_i32, StoreFailure};
use super::models::{CouponRow, CouponUpdate, NewCouponRow, NewRedemptionRow};
use super::pool::{DbPool, PoolError};
use super::schema::{coupon_redemptions, coupons};

/// Diesel-backed implementation of the `CouponRepository` port.
#[derive(Clone)]
pub struct DieselCouponRepository {
    pool: DbPool,
}

impl DieselCouponRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CouponPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            CouponPersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> CouponPersistenceError {
    match classify(error) {
        StoreFailure::Connection(message) => CouponPersistenceError::connection(message),
        StoreFailure::UniqueViolation(constraint) if constraint.contains("code") => {
            CouponPersistenceError::DuplicateCode
        }
        StoreFailure::UniqueViolation(constraint) => {
            CouponPersistenceError::query(format!("unique constraint violated: {constraint}"))
        }
        StoreFailure::Query(message) => CouponPersistenceError::query(message),
    }
}

fn row_to_coupon(row: CouponRow) -> Coupon {
    Coupon {
        id: CouponId::from_uuid(row.id),
        restaurant_id: RestaurantId::from_uuid(row.restaurant_id),
        title: row.title,
        description: row.description,
        required_xp: from_db_i32(row.required_xp),
        active: row.active,
        expires_at: row.expires_at,
        created_at: row.created_at,
    }
}

#[async_trait]
impl CouponRepository for DieselCouponRepository {
    async fn find_by_id(&self, id: &CouponId) -> Result<Option<Coupon>, CouponPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<CouponRow> = coupons::table
            .filter(coupons::id.eq(id.as_uuid()))
            .select(CouponRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_coupon))
    }

    async fn list_for_restaurant(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<Coupon>, CouponPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CouponRow> = coupons::table
            .filter(coupons::restaurant_id.eq(restaurant_id.as_uuid()))
            .order(coupons::created_at.desc())
            .select(CouponRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_coupon).collect())
    }

    async fn unlocked_for_restaurant(
        &self,
        restaurant_id: &RestaurantId,
        xp: u32,
    ) -> Result<Vec<Coupon>, CouponPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CouponRow> = coupons::table
            .filter(coupons::restaurant_id.eq(restaurant_id.as_uuid()))
            .filter(coupons::active.eq(true))
            .filter(coupons::required_xp.le(to_db_i32(xp)))
            .order(coupons::required_xp.asc())
            .select(CouponRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_coupon).collect())
    }

    async fn insert(&self, coupon: &Coupon) -> Result<(), CouponPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(coupons::table)
            .values(&NewCouponRow {
                id: *coupon.id.as_uuid(),
                restaurant_id: *coupon.restaurant_id.as_uuid(),
                title: &coupon.title,
                description: coupon.description.as_deref(),
                required_xp: to_db_i32(coupon.required_xp),
                active: coupon.active,
                expires_at: coupon.expires_at,
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, coupon: &Coupon) -> Result<(), CouponPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(coupons::table.filter(coupons::id.eq(coupon.id.as_uuid())))
            .set(&CouponUpdate {
                title: &coupon.title,
                description: coupon.description.as_deref(),
                required_xp: to_db_i32(coupon.required_xp),
                active: coupon.active,
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn delete(&self, id: &CouponId) -> Result<(), CouponPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::delete(coupons::table.filter(coupons::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn redemption_exists(
        &self,
        coupon_id: &CouponId,
        user_id: &UserId,
    ) -> Result<bool, CouponPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(exists(
            coupon_redemptions::table
                .filter(coupon_redemptions::coupon_id.eq(coupon_id.as_uuid()))
                .filter(coupon_redemptions::user_id.eq(user_id.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn code_exists(&self, code: &str) -> Result<bool, CouponPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(exists(
            coupon_redemptions::table.filter(coupon_redemptions::code.eq(code)),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn insert_redemption(
        &self,
        redemption: &CouponRedemption,
    ) -> Result<(), CouponPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(coupon_redemptions::table)
            .values(&NewRedemptionRow {
                id: redemption.id,
                coupon_id: *redemption.coupon_id.as_uuid(),
                user_id: *redemption.user_id.as_uuid(),
                code: &redemption.code,
                status: RedemptionStatus::as_str(redemption.status),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
