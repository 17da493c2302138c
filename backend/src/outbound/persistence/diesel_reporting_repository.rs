//! PostgreSQL-backed `ReportingRepository` implementation using Diesel ORM.
//!
//! Sums, counts, and per-staff grouping run in SQL; per-day bucketing is
//! done by the domain over the raw timestamped rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, sum};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::activity::{Review, Tip};
use crate::domain::ports::{RatingStats, ReportingPersistenceError, ReportingRepository};
use crate::domain::reporting::Transfer;
use crate::domain::restaurant::{RestaurantId, StaffId};

use super::diesel_activity_repository::{attach_media, row_to_tip};
use super::diesel_helpers::{classify, StoreFailure};
use super::models::{NewTransferRow, ReviewRow, TipRow, TransferRow};
use super::pool::{DbPool, PoolError};
use super::schema::{reviews, tips, transfers};

/// Diesel-backed implementation of the `ReportingRepository` port.
#[derive(Clone)]
pub struct DieselReportingRepository {
    pool: DbPool,
}

impl DieselReportingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ReportingPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            ReportingPersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> ReportingPersistenceError {
    match classify(error) {
        StoreFailure::Connection(message) => ReportingPersistenceError::connection(message),
        StoreFailure::UniqueViolation(constraint) => {
            ReportingPersistenceError::query(format!("unique constraint violated: {constraint}"))
        }
        StoreFailure::Query(message) => ReportingPersistenceError::query(message),
    }
}

fn row_to_transfer(row: TransferRow) -> Transfer {
    Transfer {
        id: row.id,
        restaurant_id: RestaurantId::from_uuid(row.restaurant_id),
        staff_id: row.staff_id.map(StaffId::from_uuid),
        amount_cents: row.amount_cents,
        status: row.status,
        created_at: row.created_at,
    }
}

fn staff_totals(rows: Vec<(Option<Uuid>, Option<i64>)>) -> Vec<(StaffId, i64)> {
    rows.into_iter()
        .filter_map(|(staff_id, total)| {
            staff_id.map(|id| (StaffId::from_uuid(id), total.unwrap_or(0)))
        })
        .collect()
}

#[async_trait]
impl ReportingRepository for DieselReportingRepository {
    async fn tip_total_since(
        &self,
        restaurant_id: &RestaurantId,
        staff_id: Option<&StaffId>,
        since: DateTime<Utc>,
    ) -> Result<i64, ReportingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = tips::table
            .filter(tips::restaurant_id.eq(restaurant_id.as_uuid()))
            .filter(tips::created_at.ge(since))
            .select(sum(tips::amount_cents))
            .into_boxed();
        if let Some(staff) = staff_id {
            query = query.filter(tips::staff_id.eq(*staff.as_uuid()));
        }

        let total: Option<i64> = query
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(total.unwrap_or(0))
    }

    async fn tip_rows_between(
        &self,
        restaurant_id: &RestaurantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, i64)>, ReportingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(DateTime<Utc>, i32)> = tips::table
            .filter(tips::restaurant_id.eq(restaurant_id.as_uuid()))
            .filter(tips::created_at.ge(from))
            .filter(tips::created_at.lt(to))
            .select((tips::created_at, tips::amount_cents))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .map(|(at, cents)| (at, i64::from(cents)))
            .collect())
    }

    async fn rating_stats(
        &self,
        restaurant_id: &RestaurantId,
        staff_id: Option<&StaffId>,
    ) -> Result<RatingStats, ReportingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = reviews::table
            .filter(reviews::restaurant_id.eq(restaurant_id.as_uuid()))
            .select((count_star(), sum(reviews::rating)))
            .into_boxed();
        if let Some(staff) = staff_id {
            query = query.filter(reviews::staff_id.eq(*staff.as_uuid()));
        }

        let (count, rating_total): (i64, Option<i64>) = query
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(RatingStats {
            count: u64::try_from(count).unwrap_or(0),
            rating_total: rating_total.unwrap_or(0),
        })
    }

    async fn tip_totals_by_staff(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<(StaffId, i64)>, ReportingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(Option<Uuid>, Option<i64>)> = tips::table
            .filter(tips::restaurant_id.eq(restaurant_id.as_uuid()))
            .filter(tips::staff_id.is_not_null())
            .group_by(tips::staff_id)
            .select((tips::staff_id, sum(tips::amount_cents)))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(staff_totals(rows))
    }

    async fn transfer_totals_by_staff(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<(StaffId, i64)>, ReportingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(Option<Uuid>, Option<i64>)> = transfers::table
            .filter(transfers::restaurant_id.eq(restaurant_id.as_uuid()))
            .filter(transfers::staff_id.is_not_null())
            .group_by(transfers::staff_id)
            .select((transfers::staff_id, sum(transfers::amount_cents)))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(staff_totals(rows))
    }

    async fn recent_tips(
        &self,
        restaurant_id: &RestaurantId,
        staff_id: Option<&StaffId>,
        limit: u32,
    ) -> Result<Vec<Tip>, ReportingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = tips::table
            .filter(tips::restaurant_id.eq(restaurant_id.as_uuid()))
            .select(TipRow::as_select())
            .into_boxed();
        if let Some(staff) = staff_id {
            query = query.filter(tips::staff_id.eq(*staff.as_uuid()));
        }

        let rows: Vec<TipRow> = query
            .order(tips::created_at.desc())
            .limit(i64::from(limit))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_tip).collect())
    }

    async fn recent_reviews(
        &self,
        restaurant_id: &RestaurantId,
        staff_id: Option<&StaffId>,
        limit: u32,
    ) -> Result<Vec<Review>, ReportingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = reviews::table
            .filter(reviews::restaurant_id.eq(restaurant_id.as_uuid()))
            .select(ReviewRow::as_select())
            .into_boxed();
        if let Some(staff) = staff_id {
            query = query.filter(reviews::staff_id.eq(*staff.as_uuid()));
        }

        let rows: Vec<ReviewRow> = query
            .order(reviews::created_at.desc())
            .limit(i64::from(limit))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        attach_media(&mut conn, rows).await.map_err(map_diesel_error)
    }

    async fn insert_transfer(
        &self,
        transfer: &Transfer,
    ) -> Result<(), ReportingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(transfers::table)
            .values(&NewTransferRow {
                id: transfer.id,
                restaurant_id: *transfer.restaurant_id.as_uuid(),
                staff_id: transfer.staff_id.map(|s| *s.as_uuid()),
                amount_cents: transfer.amount_cents,
                status: &transfer.status,
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn recent_transfers(
        &self,
        restaurant_id: &RestaurantId,
        limit: u32,
    ) -> Result<Vec<Transfer>, ReportingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<TransferRow> = transfers::table
            .filter(transfers::restaurant_id.eq(restaurant_id.as_uuid()))
            .order(transfers::created_at.desc())
            .limit(i64::from(limit))
            .select(TransferRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_transfer).collect())
    }
}
